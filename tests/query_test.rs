#![cfg(unix)]

mod common;

use async_trait::async_trait;
use common::{calls, fake_cscope, fake_cscope_with_records, write_source};
use cscope_nav::{Config, ConfigStore, Cscope, Error, QueryType, Result, SourceReader};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_query_resolves_column_from_source() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let mut lines = vec!["/* header */"; 9];
    lines.push("  int main(void) {");
    write_source(root, "foo.c", &lines);

    let config = fake_cscope_with_records(root, &["foo.c main 10 int main() {"]);
    let results = Cscope::new(config).query(QueryType::Definition, "main", root).await?;

    assert_eq!(results.len(), 1);
    let item = &results[0];
    assert_eq!(item.record.source_file, "foo.c");
    assert_eq!(item.record.symbol, "main");
    assert_eq!(item.record.line_number, 9);
    assert_eq!(item.record.matched_text, "int main() {");
    assert_eq!(item.line_text, "  int main(void) {");
    assert_eq!(item.span.start_line, 9);
    assert_eq!(item.span.start_column, 6);
    assert_eq!(item.span.end_column, 10);
    assert_eq!(item.column(), 6);

    Ok(())
}

#[tokio::test]
async fn test_query_passes_flags_database_and_word() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let config = fake_cscope(root, "exit 0");

    let results = Cscope::new(config).query(QueryType::Caller, "helper", root).await?;
    assert!(results.is_empty());
    assert_eq!(calls(root), vec!["-dL -f cscope.out -3 helper".to_string()]);

    Ok(())
}

#[test]
fn test_query_invocation_layout() {
    let config = ConfigStore::new(Config {
        query_args: "-d -L -k".to_string(),
        database: "tags.out".to_string(),
        ..Config::default()
    });
    let cscope = Cscope::new(config);
    let invocation = cscope.query_invocation(QueryType::Include, "stdio.h", Path::new("/proj"));

    assert_eq!(invocation.program, "cscope");
    assert_eq!(invocation.args, vec!["-d", "-L", "-k", "-f", "tags.out", "-7", "stdio.h"]);
    assert_eq!(invocation.cwd, PathBuf::from("/proj"));
}

#[tokio::test]
async fn test_query_failure_reports_trimmed_stderr() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let config = fake_cscope(root, "echo 'cscope: no such file' >&2\nexit 1");

    let err = Cscope::new(config)
        .query(QueryType::Symbol, "main", root)
        .await
        .unwrap_err();

    match err {
        Error::ProcessExit { code, stderr } => {
            assert_eq!(code, Some(1));
            assert_eq!(stderr, "cscope: no such file");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_query_failure_discards_printed_lines() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_source(root, "a.c", &["int a;"]);
    let config = fake_cscope(root, "echo 'a.c a 1 int a;'\necho broken >&2\nexit 2");

    let result = Cscope::new(config).query(QueryType::Symbol, "a", root).await;
    assert!(matches!(result, Err(Error::ProcessExit { code: Some(2), .. })));
}

#[tokio::test]
async fn test_missing_executable_is_spawn_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = ConfigStore::new(Config {
        cscope: temp_dir.path().join("no-such-cscope").display().to_string(),
        ..Config::default()
    });

    let err = Cscope::new(config)
        .query(QueryType::Symbol, "main", temp_dir.path())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProcessSpawn { .. }));
}

#[tokio::test]
async fn test_malformed_lines_are_skipped() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_source(root, "a.c", &["int first;", "int second;"]);

    let config = fake_cscope_with_records(
        root,
        &["a.c first 1 int first;", "garbage", "a.c x notanumber text", "a.c second 2 int second;"],
    );
    let results = Cscope::new(config).query(QueryType::Symbol, "int", root).await?;

    let symbols: Vec<&str> = results.iter().map(|r| r.record.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["first", "second"]);
    Ok(())
}

#[tokio::test]
async fn test_non_utf8_output_line_does_not_fail_query() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_source(root, "a.c", &["int first;", "int second;"]);

    let config = fake_cscope(
        root,
        "printf 'a.c first 1 int first;\\na.c x 2 /* caf\\351 */\\na.c second 2 int second;\\n'",
    );
    let results = Cscope::new(config).query(QueryType::Symbol, "int", root).await?;

    let symbols: Vec<&str> = results.iter().map(|r| r.record.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["first", "x", "second"]);
    assert_eq!(results[1].record.matched_text, "/* caf\u{FFFD} */");
    Ok(())
}

#[tokio::test]
async fn test_unreadable_file_drops_only_that_result() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_source(root, "a.c", &["void helper(void);"]);
    write_source(root, "b.c", &["  helper();"]);

    let config = fake_cscope_with_records(
        root,
        &["a.c helper 1 void helper(void);", "gone.c helper 4 helper();", "b.c run 1 helper();"],
    );
    let results = Cscope::new(config).query(QueryType::Symbol, "helper", root).await?;

    let files: Vec<&str> = results.iter().map(|r| r.record.source_file.as_str()).collect();
    assert_eq!(files, vec!["a.c", "b.c"]);
    assert_eq!(results[1].column(), 2);
    Ok(())
}

#[tokio::test]
async fn test_line_past_end_of_file_resolves_to_column_zero() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_source(root, "short.c", &["int x;"]);

    let config = fake_cscope_with_records(root, &["short.c x 40 int x;"]);
    let results = Cscope::new(config).query(QueryType::Symbol, "x", root).await?;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].column(), 0);
    assert_eq!(results[0].line_text, "");
    Ok(())
}

#[tokio::test]
async fn test_callee_query_locates_symbol_not_word() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_source(root, "main.c", &["int main(void) {", "    setup(); run();"]);

    let config = fake_cscope_with_records(root, &["main.c run 2 setup(); run();"]);
    let results = Cscope::new(config).query(QueryType::Callee, "main", root).await?;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].column(), 13);
    Ok(())
}

#[tokio::test]
async fn test_absolute_paths_are_read_as_is() -> Result<()> {
    let project = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    write_source(elsewhere.path(), "lib.h", &["extern int counter;"]);
    let header = elsewhere.path().join("lib.h");

    let record = format!("{} counter 1 extern int counter;", header.display());
    let config = fake_cscope_with_records(project.path(), &[record.as_str()]);
    let results = Cscope::new(config)
        .query(QueryType::Symbol, "counter", project.path())
        .await?;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].column(), 11);
    Ok(())
}

/// Reader whose latency is chosen per file
struct DelayedReader {
    delays: HashMap<String, u64>,
}

#[async_trait]
impl SourceReader for DelayedReader {
    async fn read_line(&self, path: &Path, _line: usize) -> std::io::Result<Option<String>> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        let delay = self.delays.get(&name).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(Some(format!("int {};", name)))
    }
}

#[tokio::test]
async fn test_results_keep_output_order_regardless_of_latency() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let names = ["f0.c", "f1.c", "f2.c", "f3.c", "f4.c"];
    let records: Vec<String> = names.iter().map(|n| format!("{} sym 1 int x;", n)).collect();
    let record_refs: Vec<&str> = records.iter().map(String::as_str).collect();
    let config = fake_cscope_with_records(root, &record_refs);

    // Earlier lines take longest to resolve.
    let delays = names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.to_string(), (names.len() - i) as u64 * 60))
        .collect();
    let cscope = Cscope::with_reader(config, Arc::new(DelayedReader { delays }));

    let results = cscope.query(QueryType::Symbol, "sym", root).await?;
    let files: Vec<&str> = results.iter().map(|r| r.record.source_file.as_str()).collect();
    assert_eq!(files, names.to_vec());
    Ok(())
}

#[tokio::test]
async fn test_overlapping_queries_keep_their_own_results() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_source(root, "a.c", &["alpha beta"]);

    // Echo the looked-up word back as the symbol, slowly.
    let config = fake_cscope(root, "sleep 0.2\nfor w in \"$5\"; do echo \"a.c $w 1 alpha beta\"; done");
    let cscope = Cscope::new(config);

    let (first, second) = tokio::join!(
        cscope.query(QueryType::Symbol, "alpha", root),
        cscope.query(QueryType::Symbol, "beta", root),
    );
    let (first, second) = (first?, second?);

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].record.symbol, "alpha");
    assert_eq!(first[0].column(), 0);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].record.symbol, "beta");
    assert_eq!(second[0].column(), 6);
    Ok(())
}
