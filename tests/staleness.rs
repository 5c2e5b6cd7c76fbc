// tests/staleness.rs

mod common;
use crate::common::builders::MockTreeBuilder;
use crate::common::{init_tracing, write_file_at};

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use buildscan::errors::BuildscanError;
use buildscan::fs::RealFileSystem;
use buildscan::fs::mock::MockFileSystem;
use buildscan::stale::{
    StaleChecker, StaleReason, Staleness, any_stale, exclude_dir_pattern, is_stale,
};

fn src() -> PathBuf {
    PathBuf::from("/proj/src")
}

fn out() -> PathBuf {
    PathBuf::from("/proj/out")
}

/// `x.ts` compiled to `x.js`, `x.d.ts` copied as-is, all at `out_secs`.
fn compiled_project(src_secs: u64, out_secs: u64) -> MockFileSystem {
    let fs = MockTreeBuilder::new("/proj/src")
        .file_at("x.ts", src_secs)
        .file_at("x.d.ts", src_secs)
        .build();
    MockTreeBuilder::on(&fs, "/proj/out")
        .file_at("x.js", out_secs)
        .file_at("x.d.ts", out_secs);
    fs
}

async fn check(fs: &MockFileSystem, excludes: &[String]) -> Staleness {
    StaleChecker::new(Arc::new(fs.clone()), excludes)
        .unwrap()
        .check(&src(), &out())
        .await
        .unwrap()
}

#[tokio::test]
async fn compiled_project_is_fresh() {
    init_tracing();

    let fs = compiled_project(10, 20);

    assert_eq!(check(&fs, &[]).await, Staleness::Fresh);
}

#[tokio::test]
async fn touching_a_source_makes_it_stale() {
    init_tracing();

    let fs = compiled_project(10, 20);
    fs.add_file_at("/proj/src/x.ts", "changed", 30);

    let verdict = check(&fs, &[]).await;

    assert_eq!(
        verdict,
        Staleness::Stale(StaleReason::SourceNewer {
            source: src().join("x.ts"),
            output: out().join("x.js"),
        })
    );
}

#[tokio::test]
async fn equal_mtimes_count_as_fresh() {
    init_tracing();

    let fs = compiled_project(20, 20);

    assert!(!check(&fs, &[]).await.is_stale());
}

#[tokio::test]
async fn missing_output_directory_is_stale() {
    init_tracing();

    let fs = MockTreeBuilder::new("/proj/src").file("x.ts").build();

    let verdict = check(&fs, &[]).await;

    assert_eq!(
        verdict,
        Staleness::Stale(StaleReason::OutputDirMissing { output: out() })
    );
}

#[tokio::test]
async fn missing_compiled_output_is_stale() {
    init_tracing();

    let fs = compiled_project(10, 20);
    MockTreeBuilder::on(&fs, "/proj/src").file_at("lib/new.ts", 5);

    let verdict = check(&fs, &[]).await;

    match verdict.reason() {
        Some(StaleReason::OutputMissing { source, output }) => {
            assert_eq!(source, &src().join("lib/new.ts"));
            assert_eq!(output, &out().join("lib/new.js"));
        }
        other => panic!("expected OutputMissing, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_declaration_copy_is_stale() {
    init_tracing();

    let fs = compiled_project(10, 20);
    fs.remove("/proj/out/x.d.ts");

    let verdict = check(&fs, &[]).await;

    assert!(matches!(
        verdict.reason(),
        Some(StaleReason::OutputMissing { output, .. }) if output == &out().join("x.d.ts")
    ));
}

#[tokio::test]
async fn non_compilable_files_are_ignored() {
    init_tracing();

    let fs = compiled_project(10, 20);
    MockTreeBuilder::on(&fs, "/proj/src")
        .file_at("README.md", 99)
        .file_at("assets/logo.svg", 99);

    assert_eq!(check(&fs, &[]).await, Staleness::Fresh);
}

#[tokio::test]
async fn excluded_directories_are_ignored() {
    init_tracing();

    let fs = compiled_project(10, 20);
    MockTreeBuilder::on(&fs, "/proj/src")
        .file_at("fixtures/sample.ts", 99)
        .file_at("deep/fixtures/other.ts", 99);

    let excludes = vec![exclude_dir_pattern("fixtures")];

    assert_eq!(check(&fs, &excludes).await, Staleness::Fresh);
    assert!(check(&fs, &[]).await.is_stale());
}

#[tokio::test]
async fn missing_source_directory_is_not_found() {
    init_tracing();

    let fs = MockTreeBuilder::new("/proj/out").build_shared();

    let err = is_stale(fs, &src(), &out(), &[], false).await.unwrap_err();

    assert!(matches!(err, BuildscanError::NotFound(path) if path == src()));
}

#[tokio::test]
async fn unreadable_output_metadata_is_an_error() {
    init_tracing();

    let fs = compiled_project(10, 20);
    fs.fail_with("/proj/out/x.js", io::ErrorKind::PermissionDenied);

    let err = StaleChecker::new(Arc::new(fs), &[])
        .unwrap()
        .check(&src(), &out())
        .await
        .unwrap_err();

    match err {
        BuildscanError::Io { path, source } => {
            assert_eq!(path, Path::new("/proj/out/x.js"));
            assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
        }
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[tokio::test]
async fn directory_at_output_path_is_not_a_compiled_file() {
    init_tracing();

    let fs = compiled_project(10, 20);
    fs.remove("/proj/out/x.js");
    fs.add_dir("/proj/out/x.js");

    let verdict = check(&fs, &[]).await;

    assert_eq!(
        verdict,
        Staleness::Stale(StaleReason::OutputMissing {
            source: src().join("x.ts"),
            output: out().join("x.js"),
        })
    );
}

#[tokio::test]
async fn fresh_directory_does_not_stand_in_for_an_output_file() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let (src_dir, out_dir) = (dir.path().join("src"), dir.path().join("out"));
    write_file_at(&src_dir, "x.ts", 100);
    std::fs::create_dir_all(out_dir.join("x.js")).unwrap();

    let stale = is_stale(Arc::new(RealFileSystem), &src_dir, &out_dir, &[], false)
        .await
        .unwrap();

    assert!(stale);
}

#[tokio::test]
async fn real_filesystem_mtimes_drive_the_verdict() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let (src_dir, out_dir) = (dir.path().join("src"), dir.path().join("out"));
    write_file_at(&src_dir, "x.ts", 1_000);
    write_file_at(&src_dir, "x.d.ts", 1_000);
    write_file_at(&out_dir, "x.js", 2_000);
    write_file_at(&out_dir, "x.d.ts", 2_000);

    let fs = Arc::new(RealFileSystem);
    assert!(!is_stale(fs.clone(), &src_dir, &out_dir, &[], true).await.unwrap());

    write_file_at(&src_dir, "x.ts", 3_000);
    assert!(is_stale(fs.clone(), &src_dir, &out_dir, &[], true).await.unwrap());

    std::fs::remove_dir_all(&out_dir).unwrap();
    assert!(is_stale(fs, &src_dir, &out_dir, &[], false).await.unwrap());
}

#[tokio::test]
async fn any_stale_rejects_mismatched_lists() {
    let fs = compiled_project(10, 20);

    let err = any_stale(Arc::new(fs), &[src()], &[], &[], false)
        .await
        .unwrap_err();

    assert!(matches!(err, BuildscanError::InvalidArgument(_)));
}

#[tokio::test]
async fn any_stale_stops_at_first_stale_pair() {
    init_tracing();

    // The second pair's source does not exist; reaching it would be an error.
    let fs = compiled_project(30, 20);
    let sources = vec![src(), PathBuf::from("/nowhere/src")];
    let outputs = vec![out(), PathBuf::from("/nowhere/out")];

    let stale = any_stale(Arc::new(fs), &sources, &outputs, &[], false)
        .await
        .unwrap();

    assert!(stale);
}

#[tokio::test]
async fn any_stale_is_false_when_every_pair_is_fresh() {
    init_tracing();

    let fs = compiled_project(10, 20);
    MockTreeBuilder::on(&fs, "/lib/src").file_at("y.ts", 1);
    MockTreeBuilder::on(&fs, "/lib/out").file_at("y.js", 2);

    let sources = vec![src(), PathBuf::from("/lib/src")];
    let outputs = vec![out(), PathBuf::from("/lib/out")];

    assert!(
        !any_stale(Arc::new(fs), &sources, &outputs, &[], false)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn empty_pair_lists_are_fresh() {
    let fs = MockFileSystem::new();

    assert!(!any_stale(Arc::new(fs), &[], &[], &[], false).await.unwrap());
}
