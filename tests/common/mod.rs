//! Shared helpers: a shell script standing in for the 7-Zip executable.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PASSWORD: &str = "hunter2";

/// Writes an executable fake tool into `dir`.
///
/// `t` succeeds only for [`PASSWORD`] and logs every `-p` argument to
/// `calls.log`. `x` accepts [`PASSWORD`] or no password, creates the `-o`
/// directory and drops `payload.txt` in it.
pub fn fake_tool(dir: &Path) -> PathBuf {
    let log = dir.join("calls.log");
    let script = format!(
        r#"#!/bin/sh
case "$1" in
  t)
    echo "$2" >> "{log}"
    if [ "$2" = "-p{pw}" ]; then
      echo "Everything is Ok"
    else
      echo "ERROR: Wrong password"
      exit 2
    fi
    ;;
  x)
    if [ "$3" != "-p{pw}" ] && [ "$3" != "-p" ]; then
      echo "ERROR: Wrong password" >&2
      exit 2
    fi
    out="${{4#-o}}"
    mkdir -p "$out"
    echo "payload" > "$out/payload.txt"
    echo "Everything is Ok"
    ;;
esac
"#,
        log = log.display(),
        pw = PASSWORD
    );
    write_script(dir, "fake7z", &script)
}

/// Fake tool whose `t` never finishes; its pid lands in `pid`.
pub fn hanging_tool(dir: &Path) -> PathBuf {
    let pid = dir.join("pid");
    let script = format!("#!/bin/sh\necho $$ > \"{}\"\nexec sleep 30\n", pid.display());
    write_script(dir, "hang7z", &script)
}

/// Fake tool that wraps the real work without `exec`, the way a shell shim
/// around 7z would. The grandchild's pid lands in `grandchild`.
pub fn wrapping_tool(dir: &Path) -> PathBuf {
    let pid = dir.join("grandchild");
    let script = format!(
        "#!/bin/sh\nsh -c 'echo $$ > \"{}\"; exec sleep 30'\n",
        pid.display()
    );
    write_script(dir, "shim7z", &script)
}

/// Fake tool that rejects the password at once but leaves a background
/// process holding its stdout open. That process's pid lands in `straggler`.
pub fn lingering_tool(dir: &Path) -> PathBuf {
    let pid = dir.join("straggler");
    let script = format!(
        "#!/bin/sh\nsleep 30 &\necho $! > \"{}\"\necho \"ERROR: Wrong password\"\nexit 2\n",
        pid.display()
    );
    write_script(dir, "linger7z", &script)
}

/// Fake tool printing `text` for every call and exiting 0.
pub fn printing_tool(dir: &Path, text: &str) -> PathBuf {
    write_script(dir, "say7z", &format!("#!/bin/sh\necho \"{}\"\n", text))
}

/// Reads a pid written by one of the fake tools, waiting briefly for it.
pub fn read_pid(path: &Path) -> u32 {
    for _ in 0..50 {
        if let Some(pid) = fs::read_to_string(path).ok().and_then(|s| s.trim().parse().ok()) {
            return pid;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("no pid in {}", path.display());
}

/// Whether `pid` is still a live process. Zombies count as gone.
pub fn process_alive(pid: u32) -> bool {
    let proc_stat = PathBuf::from(format!("/proc/{}/stat", pid));
    if Path::new("/proc/self/stat").exists() {
        return match fs::read_to_string(&proc_stat) {
            // The state letter follows the parenthesised command name.
            Ok(stat) => stat
                .rsplit_once(')')
                .map(|(_, rest)| !rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => false,
        };
    }
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Polls `process_alive` for up to two seconds; signals are asynchronous.
pub fn wait_until_gone(pid: u32) -> bool {
    for _ in 0..100 {
        if !process_alive(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

/// `-p` arguments the fake tool's `t` saw, in order, prefix stripped.
pub fn logged_passwords(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(|l| l.trim_start_matches("-p").to_string())
        .collect()
}

/// An archive-looking file; content is irrelevant to the fake tool.
pub fn dummy_archive(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"not really an archive").unwrap();
    path
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
