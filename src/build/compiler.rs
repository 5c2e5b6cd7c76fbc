// src/build/compiler.rs

//! Pluggable compiler invocation.
//!
//! The orchestrator talks to a `CompilerBackend` instead of spawning a
//! process directly, so tests can swap in a fake that records requests and
//! writes outputs into a mock filesystem.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::Result;

/// What to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Compiler executable (or shell snippet), e.g. `node_modules/.bin/tsc`.
    pub tsc: String,
    /// Project file passed as `-p <tsconfig>`.
    pub tsconfig: PathBuf,
}

impl CompileRequest {
    /// Full shell command line for this request.
    pub fn command_line(&self) -> String {
        format!("{} -p {}", self.tsc, self.tsconfig.display())
    }
}

/// Trait abstracting how the compiler is run.
///
/// Implementations resolve to the compiler's exit code; the orchestrator maps
/// non-zero codes to [`BuildscanError::CompilerFailed`](crate::errors::BuildscanError::CompilerFailed).
pub trait CompilerBackend: Send + Sync {
    fn compile<'a>(
        &'a self,
        request: &'a CompileRequest,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>>;
}

/// Runs the compiler as a shell subprocess.
///
/// Stdout is logged at `info`, stderr at `warn`, line by line.
#[derive(Debug, Clone, Default)]
pub struct ProcessCompiler;

impl CompilerBackend for ProcessCompiler {
    fn compile<'a>(
        &'a self,
        request: &'a CompileRequest,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move { Ok(run_compiler(request).await?) })
    }
}

async fn run_compiler(request: &CompileRequest) -> anyhow::Result<i32> {
    let line = request.command_line();
    info!(cmd = %line, "starting compiler");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&line);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning compiler process '{line}'"))?;

    let stdout = child.stdout.take().map(|out| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(out).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!("tsc: {}", line);
            }
        })
    });

    let stderr = child.stderr.take().map(|err| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(err).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!("tsc stderr: {}", line);
            }
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for compiler process '{line}'"))?;

    // Let the readers drain what is left in the pipes.
    for reader in [stdout, stderr].into_iter().flatten() {
        if let Err(e) = reader.await {
            debug!(error = %e, "compiler output reader ended abnormally");
        }
    }

    let code = status.code().unwrap_or(-1);
    info!(exit_code = code, success = status.success(), "compiler exited");
    Ok(code)
}
