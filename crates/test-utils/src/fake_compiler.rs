use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use buildscan::build::{CompileRequest, CompilerBackend};
use buildscan::errors::Result;
use buildscan::fs::mock::MockFileSystem;
use buildscan::fs::{EntryKind, FileSystem};
use buildscan::stale::CompileRules;

/// Where a fake compilation writes its artifacts.
#[derive(Clone)]
struct EmitPlan {
    fs: MockFileSystem,
    pairs: Vec<(PathBuf, PathBuf)>,
    mtime: u64,
}

/// A fake compiler that:
/// - records every request it receives
/// - returns a fixed exit code
/// - optionally "compiles" by writing `<stem>.js` for every non-declaration
///   `.ts` file of the given source dirs into a mock filesystem.
#[derive(Clone)]
pub struct FakeCompiler {
    calls: Arc<Mutex<Vec<CompileRequest>>>,
    exit_code: i32,
    emit: Option<EmitPlan>,
}

impl FakeCompiler {
    /// Succeeds without writing anything.
    pub fn succeeding() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            exit_code: 0,
            emit: None,
        }
    }

    pub fn failing(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::succeeding()
        }
    }

    /// On success, emit outputs for each `(source, out)` pair with the given
    /// modification time.
    pub fn emitting(fs: &MockFileSystem, pairs: &[(&str, &str)], mtime: u64) -> Self {
        Self {
            emit: Some(EmitPlan {
                fs: fs.clone(),
                pairs: pairs
                    .iter()
                    .map(|(s, o)| (PathBuf::from(s), PathBuf::from(o)))
                    .collect(),
                mtime,
            }),
            ..Self::succeeding()
        }
    }

    pub fn calls(&self) -> Vec<CompileRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn emit_outputs(plan: &EmitPlan) {
        let rules = CompileRules::default();
        for (source, out) in &plan.pairs {
            for file in walk(&plan.fs, source) {
                let rel = file.strip_prefix(source).unwrap();
                let name = rel.to_string_lossy();
                if !name.ends_with(".ts") || rules.is_declaration(rel) {
                    continue;
                }
                plan.fs
                    .add_file_at(out.join(rules.output_path(rel)), "compiled", plan.mtime);
            }
        }
    }
}

/// Every file under `root` in the mock filesystem.
fn walk(fs: &MockFileSystem, root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs.list_children(&dir).unwrap_or_default() {
            match entry.kind {
                EntryKind::Dir => stack.push(entry.path),
                EntryKind::File => files.push(entry.path),
                EntryKind::Other => {}
            }
        }
    }

    files
}

impl CompilerBackend for FakeCompiler {
    fn compile<'a>(
        &'a self,
        request: &'a CompileRequest,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(request.clone());
            if self.exit_code == 0 {
                if let Some(plan) = &self.emit {
                    Self::emit_outputs(plan);
                }
            }
            Ok(self.exit_code)
        })
    }
}
