use crate::config::CoderConfig;
use crate::error::CoderResult;
use crate::toolchain::{ProcessOutput, Toolchain};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Diagnostics of a failed run, before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub text: String,
    /// Matches an allow-listed diagnostic: reported, but the session is kept.
    pub benign: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stdout: String,
    /// The program as it stands on disk after the import fixer touched it.
    pub program: String,
    /// The process itself exited successfully, whatever it wrote to stderr.
    pub exited_ok: bool,
    pub failure: Option<RunFailure>,
}

/// Every other non-test `.go` file next to `main`, sorted.
pub fn siblings(main: &Path) -> std::io::Result<Vec<PathBuf>> {
    let dir = match main.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let main_name = main.file_name();
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| p.extension().is_some_and(|ext| ext == "go"))
        .filter(|p| {
            !p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("_test.go"))
        })
        .filter(|p| p.file_name() != main_name)
        .collect();
    files.sort();
    Ok(files)
}

pub struct Driver<'a, T: Toolchain> {
    toolchain: &'a T,
    config: &'a CoderConfig,
}

impl<'a, T: Toolchain> Driver<'a, T> {
    pub fn new(toolchain: &'a T, config: &'a CoderConfig) -> Self {
        Driver { toolchain, config }
    }

    /// Writes `program` to `path`, fixes its imports and runs it.
    pub fn run(&self, program: &str, path: &Path) -> CoderResult<RunReport> {
        fs::write(path, program)?;
        let fixed = self.toolchain.fix_imports(path)?;
        if !fixed.success {
            error!("import fixer failed:\n{}", fixed.stderr);
            return Ok(RunReport {
                stdout: String::new(),
                program: fs::read_to_string(path)?,
                exited_ok: false,
                failure: Some(self.failure(&fixed.stderr)),
            });
        }
        self.run_file(path)
    }

    /// Runs an existing file as it is, together with its siblings.
    pub fn run_file(&self, path: &Path) -> CoderResult<RunReport> {
        let siblings = siblings(path)?;
        let output = self.toolchain.run(path, &siblings)?;
        let program = fs::read_to_string(path)?;
        Ok(self.report(output, program))
    }

    fn report(&self, output: ProcessOutput, program: String) -> RunReport {
        let failure = if output.stderr.is_empty() && output.success {
            info!("run ok: {} bytes of output", output.stdout.len());
            None
        } else {
            let text = if output.stderr.is_empty() {
                "program exited with a failure status".to_string()
            } else {
                output.stderr.clone()
            };
            error!("run failed:\n{}", text);
            Some(self.failure(&text))
        };
        RunReport {
            stdout: output.stdout,
            program,
            exited_ok: output.success,
            failure,
        }
    }

    fn failure(&self, text: &str) -> RunFailure {
        RunFailure {
            text: text.to_string(),
            benign: self.config.is_benign(text),
        }
    }
}
