use crate::config::CoderConfig;
use crate::error::ToolchainError;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Captured result of one external process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl ProcessOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        ProcessOutput {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        ProcessOutput {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
        }
    }
}

/// The external compiler and import fixer.
///
/// Every call blocks until the process exits; there is no timeout.
pub trait Toolchain {
    /// Rewrites the import block of `path` in place.
    fn fix_imports(&self, path: &Path) -> Result<ProcessOutput, ToolchainError>;

    /// Compiles and runs `main` together with `siblings`.
    fn run(&self, main: &Path, siblings: &[PathBuf]) -> Result<ProcessOutput, ToolchainError>;

    /// Builds the package in `dir` without running it.
    fn build(&self, dir: &Path) -> Result<ProcessOutput, ToolchainError>;
}

#[derive(Debug, Clone)]
pub struct GoToolchain {
    go: String,
    import_fixer: String,
}

impl Default for GoToolchain {
    fn default() -> Self {
        GoToolchain::new(&CoderConfig::default())
    }
}

impl GoToolchain {
    pub fn new(config: &CoderConfig) -> Self {
        GoToolchain {
            go: config.go_bin.clone(),
            import_fixer: config.import_fixer.clone(),
        }
    }
}

/// Runs a program and captures its trimmed output.
pub fn command<I, S>(program: &str, args: I, dir: &Path) -> Result<ProcessOutput, ToolchainError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| ToolchainError::Spawn {
            program: program.to_string(),
            source,
        })?;
    let result = ProcessOutput {
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        success: output.status.success(),
    };
    debug!(
        "{} exited {} (stderr {} bytes)",
        program,
        if result.success { "ok" } else { "with failure" },
        result.stderr.len()
    );
    Ok(result)
}

fn parent(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

impl Toolchain for GoToolchain {
    fn fix_imports(&self, path: &Path) -> Result<ProcessOutput, ToolchainError> {
        command(&self.import_fixer, [Path::new("-w"), path], parent(path))
    }

    fn run(&self, main: &Path, siblings: &[PathBuf]) -> Result<ProcessOutput, ToolchainError> {
        let mut args: Vec<&Path> = vec![Path::new("run"), main];
        args.extend(siblings.iter().map(|p| p.as_path()));
        command(&self.go, args, parent(main))
    }

    fn build(&self, dir: &Path) -> Result<ProcessOutput, ToolchainError> {
        if !dir.join("go.mod").exists() {
            let init = command(&self.go, ["mod", "init", "gocell"], dir)?;
            if !init.success {
                return Ok(init);
            }
        }
        command(&self.go, ["build", "."], dir)
    }
}
