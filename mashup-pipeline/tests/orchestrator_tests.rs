//! Orchestrator Integration Tests
//! Test File: orchestrator_tests.rs
//! Covers: end-to-end run, stage guards, search fallback, resume

mod helpers;

use helpers::{build_orchestrator, result, MockCodec, MockDownloader, MockMedia, MockSearch};
use mashup_common::RunParameters;
use mashup_pipeline::models::{SearchResult, WorkDirs};
use mashup_pipeline::{PipelineError, RunState};
use tempfile::TempDir;

fn params(clip_count: &str, clip_seconds: &str) -> RunParameters {
    RunParameters::parse("X", clip_count, clip_seconds, "mix").unwrap()
}

fn search_results(count: usize) -> Vec<SearchResult> {
    (0..count)
        .map(|i| result(&format!("vid{:02}", i), Some(180.0 + i as f64)))
        .collect()
}

fn states(report: &mashup_pipeline::RunReport) -> Vec<RunState> {
    report.run.transitions.iter().map(|t| t.new_state).collect()
}

/// TC-E2E-001: singer="X", num=15, duration=25, output="mix"
/// → output/mix.mp3 of 15 × 25 s
#[test]
fn tc_e2e_001_full_run() {
    let temp_dir = TempDir::new().unwrap();
    let search = MockSearch::returning(search_results(50));
    let downloader = MockDownloader::new();
    let codec = MockCodec::new();
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let report = orchestrator.execute(&params("15", "25"));

    assert!(report.is_success(), "failure: {:?}", report.failure);
    let output = temp_dir.path().join("output").join("mix.mp3");
    assert_eq!(report.output_path.as_deref(), Some(output.as_path()));
    assert_eq!(MockMedia::read(&output).unwrap().duration_ms(), 15 * 25_000);

    assert_eq!(
        states(&report),
        vec![
            RunState::Selecting,
            RunState::Acquiring,
            RunState::Normalizing,
            RunState::Trimming,
            RunState::Merging,
            RunState::Done,
        ]
    );
    // 3x oversampling of the search
    assert_eq!(search.calls.entries(), vec!["search:X:45"]);
    assert_eq!(downloader.calls.count_prefix("fetch:"), 15);
    assert_eq!(report.statistics.merging.merged, 15);
}

/// TC-E2E-002: Failed downloads shrink the output, they do not fail the run
#[test]
fn tc_e2e_002_partial_failures_tolerated() {
    let temp_dir = TempDir::new().unwrap();
    let search = MockSearch::returning(search_results(50));
    let mut downloader = MockDownloader::new();
    downloader.failing_ids.insert("vid03".to_string());
    downloader.corrupt_ids.insert("vid07".to_string());
    downloader.seconds.insert("vid11".to_string(), 10);
    let codec = MockCodec::new();
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let report = orchestrator.execute(&params("15", "25"));

    assert!(report.is_success());
    let output = MockMedia::read(&temp_dir.path().join("output/mix.mp3")).unwrap();
    // 13 usable clips, one of them only 10 s long
    assert_eq!(output.duration_ms(), 12 * 25_000 + 10_000);
    assert_eq!(report.statistics.acquiring.failed, 1);
    assert_eq!(report.statistics.normalizing.failed, 1);
}

/// TC-E2E-003: Zero raw files → run fails at Acquiring, later stages never run
#[test]
fn tc_e2e_003_zero_propagation() {
    let temp_dir = TempDir::new().unwrap();
    let results = search_results(20);
    let search = MockSearch::returning(results.clone());
    let mut downloader = MockDownloader::new();
    downloader.failing_ids = results.iter().map(|r| r.id.clone()).collect();
    let codec = MockCodec::new();
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let report = orchestrator.execute(&params("11", "21"));

    assert!(!report.is_success());
    assert_eq!(report.run.state, RunState::Failed);
    assert_eq!(report.run.failed_stage, Some(RunState::Acquiring));
    assert!(matches!(
        report.failure,
        Some(PipelineError::StageEmpty { stage: RunState::Acquiring })
    ));
    assert_eq!(codec.calls.len(), 0, "normalization ran after an empty acquisition");
    assert!(!temp_dir.path().join("output/mix.mp3").exists());
}

/// TC-E2E-004: Every raw file corrupt → run fails at Normalizing
#[test]
fn tc_e2e_004_normalizing_empty() {
    let temp_dir = TempDir::new().unwrap();
    let results = search_results(12);
    let search = MockSearch::returning(results.clone());
    let mut downloader = MockDownloader::new();
    downloader.corrupt_ids = results.iter().map(|r| r.id.clone()).collect();
    let codec = MockCodec::new();
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let report = orchestrator.execute(&params("11", "21"));

    assert_eq!(report.run.failed_stage, Some(RunState::Normalizing));
    assert_eq!(codec.calls.count_prefix("load_head:"), 0);
    assert_eq!(codec.calls.count_prefix("load:"), 0);
}

/// TC-E2E-005: Search failure falls back to fetching by query
#[test]
fn tc_e2e_005_search_failure_fallback() {
    let temp_dir = TempDir::new().unwrap();
    let search = MockSearch::failing();
    let downloader = MockDownloader {
        query_ids: (0..20).map(|i| format!("q{:02}", i)).collect(),
        ..MockDownloader::new()
    };
    let codec = MockCodec::new();
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let report = orchestrator.execute(&params("12", "25"));

    assert!(report.is_success());
    assert!(report.statistics.selecting.search_failed);
    assert!(report.statistics.acquiring.used_fallback);
    assert_eq!(downloader.calls.entries(), vec!["query:X:12"]);
    assert_eq!(report.statistics.merging.merged, 12);
}

/// TC-E2E-006: Search returning nothing also uses the fallback
#[test]
fn tc_e2e_006_empty_search_fallback() {
    let temp_dir = TempDir::new().unwrap();
    let search = MockSearch::returning(Vec::new());
    let downloader = MockDownloader {
        query_ids: vec!["only".to_string()],
        ..MockDownloader::new()
    };
    let codec = MockCodec::new();
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let report = orchestrator.execute(&params("11", "30"));

    assert!(report.is_success());
    assert_eq!(downloader.calls.count_prefix("query:"), 1);
    assert_eq!(report.statistics.merging.duration_ms, 30_000);
}

/// TC-E2E-007: A second run reuses every materialized asset
#[test]
fn tc_e2e_007_resume_skips_materialized() {
    let temp_dir = TempDir::new().unwrap();
    let search = MockSearch::returning(search_results(40));
    let downloader = MockDownloader::new();
    let codec = MockCodec::new();
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let first = orchestrator.execute(&params("11", "25"));
    assert!(first.is_success());
    let fetches = downloader.calls.count_prefix("fetch:");
    let transcodes = codec.calls.count_prefix("open:") + codec.calls.count_prefix("transcode:");

    let second = orchestrator.execute(&params("11", "25"));

    assert!(second.is_success());
    assert_eq!(downloader.calls.count_prefix("fetch:"), fetches);
    assert_eq!(
        codec.calls.count_prefix("open:") + codec.calls.count_prefix("transcode:"),
        transcodes
    );
    assert_eq!(second.statistics.acquiring.already_present, 11);
    assert_eq!(second.statistics.normalizing.already_present, 11);
    assert_eq!(second.statistics.trimming.already_present, 11);
    assert_eq!(second.statistics.trimming.processed, 0);
}

/// TC-E2E-008: Missing downloader aborts the run instead of skipping items
#[test]
fn tc_e2e_008_tool_missing_aborts() {
    let temp_dir = TempDir::new().unwrap();
    let search = MockSearch::returning(search_results(40));
    let downloader = MockDownloader {
        tool_missing: true,
        ..MockDownloader::new()
    };
    let codec = MockCodec::new();
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let report = orchestrator.execute(&params("11", "25"));

    assert_eq!(report.run.failed_stage, Some(RunState::Acquiring));
    assert!(matches!(report.failure, Some(PipelineError::Backend(_))));
}

/// TC-E2E-009: Long results are only used when short ones run out
#[test]
fn tc_e2e_009_prefers_short_results() {
    let temp_dir = TempDir::new().unwrap();
    let mut results: Vec<SearchResult> = (0..5)
        .map(|i| result(&format!("long{}", i), Some(3600.0)))
        .collect();
    results.extend((0..12).map(|i| result(&format!("short{:02}", i), Some(200.0))));
    let search = MockSearch::returning(results);
    let downloader = MockDownloader::new();
    let codec = MockCodec::new();
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let report = orchestrator.execute(&params("11", "25"));

    assert!(report.is_success());
    assert!(downloader
        .calls
        .entries()
        .iter()
        .all(|call| call.starts_with("fetch:short")));
    assert_eq!(report.statistics.selecting.tiers.preferred, 11);
}

/// TC-E2E-010: Every normalized file unreadable → run fails at Trimming
#[test]
fn tc_e2e_010_trimming_empty() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = WorkDirs::new(temp_dir.path());
    let search = MockSearch::returning(search_results(30));
    let downloader = MockDownloader::new();
    let codec = MockCodec {
        unreadable_dirs: vec![dirs.normalized.clone()],
        ..MockCodec::new()
    };
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let report = orchestrator.execute(&params("11", "25"));

    assert!(!report.is_success());
    assert_eq!(report.run.state, RunState::Failed);
    assert_eq!(report.run.failed_stage, Some(RunState::Trimming));
    assert!(matches!(
        report.failure,
        Some(PipelineError::StageEmpty { stage: RunState::Trimming })
    ));
    assert_eq!(report.statistics.trimming.failed, 11);
    assert_eq!(codec.calls.count_prefix("load:"), 0, "merge ran after an empty trim");
    assert!(!dirs.output_path("mix.mp3").exists());
}

/// TC-E2E-011: Every trimmed file unreadable → run fails at Merging
#[test]
fn tc_e2e_011_merging_empty() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = WorkDirs::new(temp_dir.path());
    let search = MockSearch::returning(search_results(30));
    let downloader = MockDownloader::new();
    let codec = MockCodec {
        unreadable_dirs: vec![dirs.trimmed.clone()],
        ..MockCodec::new()
    };
    let orchestrator = build_orchestrator(temp_dir.path(), &search, &downloader, &codec);

    let report = orchestrator.execute(&params("11", "25"));

    assert!(!report.is_success());
    assert_eq!(report.run.state, RunState::Failed);
    assert_eq!(report.run.failed_stage, Some(RunState::Merging));
    assert!(matches!(
        report.failure,
        Some(PipelineError::StageEmpty { stage: RunState::Merging })
    ));
    assert!(report.output_path.is_none());
    assert_eq!(report.statistics.trimming.processed, 11);
    assert!(std::fs::read_dir(&dirs.output).unwrap().next().is_none());
}
