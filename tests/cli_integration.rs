use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

const LEGAL_PAGE: &str = "\
---
title: Legal Notices
last_updated: 2024-03-01
---

# Legal

Please read these documents carefully.

## Privacy

We collect the data you give us and nothing more.

## Terms

Any dispute is resolved by binding arbitration. Arbitration happens in a.b county.

## Cookies

We use cookies to keep you signed in.
";

struct Fixture {
    _tmp: TempDir,
    page: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let page = tmp.path().join("legal.md");
        fs::write(&page, LEGAL_PAGE).expect("write legal page");
        Self { _tmp: tmp, page }
    }

    fn page_arg(&self) -> &str {
        self.page.to_str().expect("utf-8 temp path")
    }
}

fn bin_path() -> String {
    std::env::var("CARGO_BIN_EXE_lexpage").expect("CARGO_BIN_EXE_lexpage is set by cargo test")
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("run lexpage {args:?} failed: {e}"))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn search_prints_single_matching_section() {
    let fx = Fixture::new();
    let out = run(&["search", fx.page_arg(), "arbitration"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2, "got: {text}");
    assert_eq!(lines[0], "Terms (#terms)");
    assert!(lines[1].starts_with("    ..."));
    assert!(lines[1].contains("binding arbitration"));
    assert!(lines[1].ends_with("..."));
}

#[test]
fn search_logs_match_counts_to_stderr() {
    let fx = Fixture::new();
    let out = run(&["search", fx.page_arg(), "arbitration"]);
    let err = stderr(&out);
    assert!(err.contains("[parse]"), "stderr: {err}");
    assert!(err.contains("matches=1"), "stderr: {err}");
    assert!(err.contains("highlights=2"), "stderr: {err}");
}

#[test]
fn search_json_reports_highlights() {
    let fx = Fixture::new();
    let out = run(&["search", "--json", fx.page_arg(), "WE"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let value: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid JSON");
    let items = value.as_array().expect("JSON array");
    let headings: Vec<&str> = items
        .iter()
        .filter_map(|i| i["heading"].as_str())
        .collect();
    assert_eq!(headings, vec!["Privacy", "Cookies"]);

    for item in items {
        let highlights = item["highlights"].as_array().expect("highlights array");
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0]["node"], 1);
        assert_eq!(highlights[0]["start"], 0);
        assert_eq!(highlights[0]["end"], 2);
        let snippet = item["snippet"].as_str().expect("snippet string");
        assert!(snippet.starts_with("...") && snippet.ends_with("..."));
    }
}

#[test]
fn search_without_matches_says_so() {
    let fx = Fixture::new();
    let out = run(&["search", fx.page_arg(), "refund"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "No results found");
}

#[test]
fn short_query_prints_nothing() {
    let fx = Fixture::new();
    let out = run(&["search", fx.page_arg(), "a"]);
    assert!(out.status.success());
    assert!(stdout(&out).is_empty());

    let out = run(&["search", "--json", fx.page_arg(), "a"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "[]");
}

#[test]
fn pattern_characters_are_literal() {
    let fx = Fixture::new();
    let out = run(&["search", fx.page_arg(), "a.b"]);
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("Terms (#terms)"));

    let out = run(&["search", fx.page_arg(), "a.*"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "No results found");
}

#[test]
fn toc_lists_sections_in_order() {
    let fx = Fixture::new();
    let out = run(&["toc", fx.page_arg()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Legal Notices");
    assert_eq!(lines.len(), 4, "got: {text}");
    assert!(lines[1].trim_start().starts_with("privacy"));
    assert!(lines[2].trim_start().starts_with("terms"));
    assert!(lines[3].trim_start().starts_with("cookies"));
}

#[test]
fn section_level_flag_changes_sections() {
    let fx = Fixture::new();
    let out = run(&["toc", "--section-level", "1", fx.page_arg()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    // Only the H1 starts a section; the H2s are body blocks inside it.
    assert_eq!(text.lines().count(), 2, "got: {text}");
    assert!(text.contains("legal"));
}

#[test]
fn invalid_section_level_rejected() {
    let fx = Fixture::new();
    let out = run(&["search", "--section-level", "9", fx.page_arg(), "terms"]);
    assert!(!out.status.success());
}

#[test]
fn unrecognized_extension_exits_with_error() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let path = tmp.path().join("notes.txt");
    fs::write(&path, "## Terms\n").expect("write txt");

    let out = run(&["search", path.to_str().expect("utf-8 path"), "terms"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("not a recognized markdown extension"));
}

#[test]
fn missing_file_exits_with_error() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let path = tmp.path().join("missing.md");

    let out = run(&["toc", path.to_str().expect("utf-8 path")]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("file not found"));
}
