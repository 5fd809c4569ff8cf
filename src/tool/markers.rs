//! Classification of the archive tool's captured text.
//!
//! Matching substrings of tool output is brittle across tool versions and
//! locales, so the markers live in an ordered rule list rather than in the
//! control flow. The first rule whose needle occurs in the output decides.

use std::borrow::Cow;

/// What the captured text says about a finished `t` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure,
    /// Neither a success nor a failure marker was found.
    Inconclusive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRule {
    pub needle: Cow<'static, str>,
    pub verdict: Verdict,
}

impl MarkerRule {
    pub fn new(needle: impl Into<Cow<'static, str>>, verdict: Verdict) -> Self {
        Self {
            needle: needle.into(),
            verdict,
        }
    }
}

const SUCCESS_MARKERS: &[&str] = &["Everything is Ok"];

const FAILURE_MARKERS: &[&str] = &[
    "Wrong password",
    "Cannot open encrypted archive",
    "Can not open encrypted archive",
    "Data Error in encrypted file",
    "Can't open as archive",
    "Headers Error",
    "Archives with Errors",
    "ERROR:",
];

#[derive(Debug, Clone)]
pub struct OutputClassifier {
    rules: Vec<MarkerRule>,
}

impl Default for OutputClassifier {
    /// 7-Zip's English markers: success first, then the failure family.
    fn default() -> Self {
        let rules = SUCCESS_MARKERS
            .iter()
            .map(|m| MarkerRule::new(*m, Verdict::Success))
            .chain(FAILURE_MARKERS.iter().map(|m| MarkerRule::new(*m, Verdict::Failure)))
            .collect();
        Self { rules }
    }
}

impl OutputClassifier {
    pub fn from_rules(rules: Vec<MarkerRule>) -> Self {
        Self { rules }
    }

    /// Appends a rule with the lowest precedence.
    pub fn with_rule(mut self, rule: MarkerRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[MarkerRule] {
        &self.rules
    }

    pub fn classify(&self, output: &str) -> Verdict {
        self.rules
            .iter()
            .find(|rule| output.contains(rule.needle.as_ref()))
            .map(|rule| rule.verdict)
            .unwrap_or(Verdict::Inconclusive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_markers() {
        let c = OutputClassifier::default();
        assert_eq!(c.classify("Testing archive: a.7z\n\nEverything is Ok\n"), Verdict::Success);
        assert_eq!(
            c.classify("ERROR: a.7z\nCan not open encrypted archive. Wrong password?\n"),
            Verdict::Failure
        );
        assert_eq!(c.classify("ERROR: Data Error in encrypted file. Wrong password? : x.bin"), Verdict::Failure);
        assert_eq!(c.classify("Sub items Errors: 1\n\nArchives with Errors: 1\n"), Verdict::Failure);
        assert_eq!(c.classify("7-Zip 23.01\nScanning the drive for archives:\n"), Verdict::Inconclusive);
        assert_eq!(c.classify(""), Verdict::Inconclusive);
    }

    #[test]
    fn success_marker_has_precedence() {
        let c = OutputClassifier::default();
        assert_eq!(c.classify("WARNING: ERROR: ignored\nEverything is Ok"), Verdict::Success);
    }

    #[test]
    fn custom_rules_extend_the_list() {
        let c = OutputClassifier::default().with_rule(MarkerRule::new("Falsches Kennwort", Verdict::Failure));
        assert_eq!(c.classify("Falsches Kennwort?"), Verdict::Failure);

        let only_ok = OutputClassifier::from_rules(vec![MarkerRule::new("OK", Verdict::Success)]);
        assert_eq!(only_ok.classify("Wrong password"), Verdict::Inconclusive);
        assert_eq!(only_ok.rules().len(), 1);
    }
}
