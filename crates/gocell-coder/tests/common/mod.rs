#![allow(dead_code)]

use gocell_coder::error::ToolchainError;
use gocell_coder::{Coder, CoderConfig, ProcessOutput, Toolchain};
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

type Script = Box<dyn Fn(&str) -> ProcessOutput>;

#[derive(Default)]
struct Inner {
    programs: RefCell<Vec<String>>,
    mains: RefCell<Vec<PathBuf>>,
    scripts: RefCell<Vec<Script>>,
    types: RefCell<HashMap<String, String>>,
}

/// Stands in for `go`: records every program it is asked to run, persists
/// the `_Serialize` calls of successful runs, and answers from a queue of
/// scripted outputs (empty stdout once the queue runs dry).
#[derive(Clone, Default)]
pub struct FakeToolchain {
    inner: Rc<Inner>,
}

impl FakeToolchain {
    /// Queues the output for the next run.
    pub fn then(&self, script: impl Fn(&str) -> ProcessOutput + 'static) -> &Self {
        self.inner.scripts.borrow_mut().push(Box::new(script));
        self
    }

    pub fn then_ok(&self, stdout: &'static str) -> &Self {
        self.then(move |_| ProcessOutput::ok(stdout))
    }

    /// Fails with a diagnostic pointing at the first line containing `needle`.
    pub fn then_fail_at(&self, needle: &'static str, message: &'static str) -> &Self {
        self.then(move |program| {
            let line = program
                .lines()
                .position(|l| l.contains(needle))
                .map(|i| i + 1)
                .unwrap_or(1);
            ProcessOutput::failed(format!(
                "# command-line-arguments\n./main.go:{}:2: {}",
                line, message
            ))
        })
    }

    /// Type tag written for `name` (default `int`).
    pub fn with_type(&self, name: &str, ty: &str) -> &Self {
        self.inner
            .types
            .borrow_mut()
            .insert(name.to_string(), ty.to_string());
        self
    }

    pub fn programs(&self) -> Vec<String> {
        self.inner.programs.borrow().clone()
    }

    /// Program paths the toolchain was handed, in call order.
    pub fn mains(&self) -> Vec<PathBuf> {
        self.inner.mains.borrow().clone()
    }

    pub fn last_program(&self) -> String {
        self.programs().last().cloned().unwrap_or_default()
    }

    fn persist(&self, program: &str, store: &Path) {
        let re = Regex::new(r#"_Serialize\("var-(\w+)""#).unwrap();
        fs::create_dir_all(store).unwrap();
        for caps in re.captures_iter(program) {
            let name = &caps[1];
            let ty = self
                .inner
                .types
                .borrow()
                .get(name)
                .cloned()
                .unwrap_or_else(|| "int".to_string());
            fs::write(store.join(format!("var-{}", name)), b"blob").unwrap();
            fs::write(store.join(format!("var-{}.type", name)), ty).unwrap();
        }
    }
}

impl Toolchain for FakeToolchain {
    fn fix_imports(&self, _path: &Path) -> Result<ProcessOutput, ToolchainError> {
        Ok(ProcessOutput::ok(""))
    }

    fn run(&self, main: &Path, _siblings: &[PathBuf]) -> Result<ProcessOutput, ToolchainError> {
        let program = fs::read_to_string(main).unwrap();
        self.inner.programs.borrow_mut().push(program.clone());
        self.inner.mains.borrow_mut().push(main.to_path_buf());
        let script = {
            let mut scripts = self.inner.scripts.borrow_mut();
            if scripts.is_empty() {
                None
            } else {
                Some(scripts.remove(0))
            }
        };
        let output = match script {
            Some(script) => script(&program),
            None => ProcessOutput::ok(""),
        };
        if output.success {
            self.persist(&program, &main.parent().unwrap().join("store"));
        }
        Ok(output)
    }

    fn build(&self, _dir: &Path) -> Result<ProcessOutput, ToolchainError> {
        Ok(ProcessOutput::ok(""))
    }
}

pub fn config(root: &Path) -> CoderConfig {
    CoderConfig {
        probe_external: false,
        session_id: Some("test".to_string()),
        ..CoderConfig::default()
    }
    .with_workspace_root(root)
}

pub fn coder() -> (TempDir, FakeToolchain, Coder<FakeToolchain>) {
    let dir = TempDir::new().unwrap();
    let toolchain = FakeToolchain::default();
    let coder = Coder::with_toolchain(config(dir.path()), toolchain.clone()).unwrap();
    (dir, toolchain, coder)
}

pub fn names(coder: &Coder<FakeToolchain>) -> Vec<String> {
    coder.session().captured_names.clone()
}
