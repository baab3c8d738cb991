#![allow(dead_code)]

use cscope_nav::{Config, ConfigStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A fake indexer: `body` runs under `/bin/sh` with the real cscope arguments
/// in `$@` (`$1` is `-Rb` for builds and `-dL` for queries).
///
/// Every invocation appends its arguments to `calls.log` in `dir`.
pub fn fake_cscope(dir: &Path, body: &str) -> ConfigStore {
    let script = dir.join("fake-cscope.sh");
    let log = calls_log(dir);
    fs::write(
        &script,
        format!("echo \"$@\" >> '{}'\n{}\n", log.display(), body),
    )
    .unwrap();

    ConfigStore::new(Config {
        cscope: "/bin/sh".to_string(),
        build_args: format!("{} -Rb", script.display()),
        query_args: format!("{} -dL", script.display()),
        ..Config::default()
    })
}

/// Indexer that creates the database on builds and prints `records` on queries
pub fn fake_cscope_with_records(dir: &Path, records: &[&str]) -> ConfigStore {
    let mut body = String::from("case \"$1\" in\n  -Rb) touch cscope.out ;;\n  *)\n");
    for record in records {
        body.push_str(&format!("    echo '{}'\n", record));
    }
    body.push_str("    ;;\nesac");
    fake_cscope(dir, &body)
}

pub fn calls_log(dir: &Path) -> PathBuf {
    dir.join("calls.log")
}

/// Argument lines of every fake indexer run so far
pub fn calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(calls_log(dir))
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn build_calls(dir: &Path) -> usize {
    calls(dir).iter().filter(|call| call.starts_with("-Rb")).count()
}

/// Poll `condition` until it holds or five seconds pass
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}

pub fn write_source(dir: &Path, name: &str, lines: &[&str]) {
    fs::write(dir.join(name), lines.join("\n") + "\n").unwrap();
}
