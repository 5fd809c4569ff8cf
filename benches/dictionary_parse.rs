use archcrack::dictionary::{decode, parse_lines, DictionaryLoader, PasswordSet};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// Dictionary text with some duplicates, blank lines and CRLF endings.
fn generate_dictionary(lines: usize) -> String {
    let mut content = String::from("\u{feff}");
    for i in 0..lines {
        match i % 10 {
            0 => content.push_str("\r\n"),
            1 => content.push_str(&format!("pass{}\r\n", i / 2)),
            _ => content.push_str(&format!("password-{:06}\n", i)),
        }
    }
    content
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_lines");
    for size in [1_000usize, 100_000] {
        let text = generate_dictionary(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| {
                let set: PasswordSet = parse_lines(black_box(text)).into_iter().collect();
                black_box(set.len())
            })
        });
    }
    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let utf8 = generate_dictionary(50_000).into_bytes();
    // "密码" in GBK followed by ASCII lines, not valid UTF-8.
    let mut gbk = vec![0xC3, 0xDC, 0xC2, 0xEB, b'\n'];
    gbk.extend_from_slice(&utf8[3..]);

    let mut group = c.benchmark_group("decode");
    group.bench_function("utf8", |b| b.iter(|| black_box(decode(black_box(&utf8))).len()));
    group.bench_function("gbk_fallback", |b| b.iter(|| black_box(decode(black_box(&gbk))).len()));
    group.finish();
}

fn benchmark_load(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("passwd.txt");
    std::fs::write(&path, generate_dictionary(100_000)).unwrap();
    let loader = DictionaryLoader::new(vec![path.clone(), path]);
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("load_all_100k", |b| {
        b.to_async(&runtime).iter(|| async { black_box(loader.load_all().await.provenance.total) })
    });
}

criterion_group!(benches, benchmark_parse, benchmark_decode, benchmark_load);
criterion_main!(benches);
