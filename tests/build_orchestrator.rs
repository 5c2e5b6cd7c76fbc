// tests/build_orchestrator.rs

mod common;
use crate::common::builders::{BuildOptionsBuilder, MockTreeBuilder};
use crate::common::init_tracing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use buildscan::build::{BuildOutcome, compile_project};
use buildscan::errors::BuildscanError;
use buildscan::fs::FileSystem;
use buildscan::fs::mock::{MockFileSystem, mtime};
use buildscan::stale::StaleReason;
use buildscan_test_utils::fake_compiler::FakeCompiler;

/// Sources at t=10 with a public declaration and a nested module.
fn project() -> MockFileSystem {
    MockTreeBuilder::new("/proj/src")
        .file_at("index.ts", 10)
        .file_at("types.d.ts", 10)
        .file_at("util/strings.ts", 10)
        .file_at("util/strings.d.ts", 10)
        .build()
}

#[tokio::test]
async fn fresh_project_skips_the_compiler() {
    init_tracing();

    let fs = project();
    MockTreeBuilder::on(&fs, "/proj/out")
        .file_at("index.js", 20)
        .file_at("types.d.ts", 20)
        .file_at("util/strings.js", 20)
        .file_at("util/strings.d.ts", 20);
    let compiler = FakeCompiler::succeeding();
    let options = BuildOptionsBuilder::new()
        .pair("/proj/src", "/proj/out")
        .build();

    let outcome = compile_project(Arc::new(fs), &compiler, &options)
        .await
        .unwrap();

    assert_eq!(outcome, BuildOutcome::UpToDate);
    assert!(compiler.calls().is_empty());
}

#[tokio::test]
async fn stale_project_compiles_then_copies_declarations() {
    init_tracing();

    let fs = project();
    let compiler = FakeCompiler::emitting(&fs, &[("/proj/src", "/proj/out")], 20);
    let options = BuildOptionsBuilder::new()
        .pair("/proj/src", "/proj/out")
        .tsconfig("/proj/tsconfig.json")
        .verbose(true)
        .build();
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());

    let outcome = compile_project(Arc::clone(&shared), &compiler, &options)
        .await
        .unwrap();

    match outcome {
        BuildOutcome::Compiled {
            reason,
            declarations_copied,
        } => {
            assert_eq!(
                reason,
                StaleReason::OutputDirMissing {
                    output: PathBuf::from("/proj/out")
                }
            );
            assert_eq!(declarations_copied, 2);
        }
        other => panic!("expected a compilation, got {other:?}"),
    }

    let calls = compiler.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tsconfig, PathBuf::from("/proj/tsconfig.json"));

    assert_eq!(
        fs.contents("/proj/out/util/strings.d.ts").as_deref(),
        Some(&b"util/strings.d.ts"[..])
    );
    assert_eq!(
        shared.modified(Path::new("/proj/out/types.d.ts")).unwrap(),
        mtime(10)
    );
    assert!(shared.is_file(Path::new("/proj/out/index.js")));

    // Copied declarations keep their mtime, which is not newer than the
    // source, so the next run has nothing to do.
    let again = compile_project(shared, &compiler, &options).await.unwrap();
    assert_eq!(again, BuildOutcome::UpToDate);
    assert_eq!(compiler.calls().len(), 1);
}

#[tokio::test]
async fn compiler_failure_is_reported_and_nothing_is_copied() {
    init_tracing();

    let fs = project();
    let compiler = FakeCompiler::failing(2);
    let options = BuildOptionsBuilder::new()
        .pair("/proj/src", "/proj/out")
        .build();

    let err = compile_project(Arc::new(fs.clone()), &compiler, &options)
        .await
        .unwrap_err();

    assert!(matches!(err, BuildscanError::CompilerFailed(2)));
    assert_eq!(compiler.calls().len(), 1);
    assert!(fs.contents("/proj/out/types.d.ts").is_none());
}

#[tokio::test]
async fn mismatched_source_and_out_lists_are_rejected() {
    let fs = project();
    let compiler = FakeCompiler::succeeding();
    let options = BuildOptionsBuilder::new()
        .source("/proj/src")
        .source("/proj/lib")
        .out("/proj/out")
        .build();

    let err = compile_project(Arc::new(fs), &compiler, &options)
        .await
        .unwrap_err();

    assert!(matches!(err, BuildscanError::InvalidArgument(_)));
    assert!(compiler.calls().is_empty());
}

#[tokio::test]
async fn excluded_directories_do_not_trigger_a_build() {
    init_tracing();

    let fs = project();
    MockTreeBuilder::on(&fs, "/proj/out")
        .file_at("index.js", 20)
        .file_at("types.d.ts", 20)
        .file_at("util/strings.js", 20)
        .file_at("util/strings.d.ts", 20);
    MockTreeBuilder::on(&fs, "/proj/src").file_at("fixtures/broken.ts", 99);
    let compiler = FakeCompiler::succeeding();
    let options = BuildOptionsBuilder::new()
        .pair("/proj/src", "/proj/out")
        .exclude("fixtures")
        .concurrency(2)
        .build();

    let outcome = compile_project(Arc::new(fs), &compiler, &options)
        .await
        .unwrap();

    assert_eq!(outcome, BuildOutcome::UpToDate);
}

#[tokio::test]
async fn one_stale_pair_rebuilds_the_whole_project() {
    init_tracing();

    let fs = project();
    MockTreeBuilder::on(&fs, "/proj/out")
        .file_at("index.js", 20)
        .file_at("types.d.ts", 20)
        .file_at("util/strings.js", 20)
        .file_at("util/strings.d.ts", 20);
    MockTreeBuilder::on(&fs, "/proj/tools").file_at("cli.ts", 50);
    MockTreeBuilder::on(&fs, "/proj/tools-out").file_at("cli.js", 20);
    let compiler = FakeCompiler::succeeding();
    let options = BuildOptionsBuilder::new()
        .pair("/proj/src", "/proj/out")
        .pair("/proj/tools", "/proj/tools-out")
        .build();

    let outcome = compile_project(Arc::new(fs), &compiler, &options)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        BuildOutcome::Compiled {
            reason: StaleReason::SourceNewer { .. },
            declarations_copied: 2,
        }
    ));
    assert_eq!(compiler.calls().len(), 1);
}
