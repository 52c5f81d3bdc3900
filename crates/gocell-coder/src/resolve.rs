use crate::error::ResolveError;
use crate::recover::parse_diagnostics;
use crate::syntax::{apply_edits, SourceView, TextEdit};
use crate::toolchain::Toolchain;
use crate::workspace::{Workspace, PROGRAM_FILE};
use log::warn;
use regex::Regex;
use std::fs;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct Resolved {
    pub program: String,
    /// Names that received a discard statement.
    pub unused: Vec<String>,
    /// Set when the program is returned unpatched; never fatal.
    pub error: Option<ResolveError>,
}

impl Resolved {
    fn unpatched(program: &str, error: Option<ResolveError>) -> Self {
        Resolved {
            program: program.to_string(),
            unused: Vec::new(),
            error,
        }
    }
}

fn unused_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            match Regex::new(r"declared and not used: (\w+)\s*$|\b(\w+) declared (?:and|but) not used") {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("unused-binding pattern rejected: {}", e);
                    None
                }
            }
        })
        .as_ref()
}

/// One `declared and not used` diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedReport {
    pub name: String,
    /// Line of the build file it points at, when it carries a location.
    pub line: Option<usize>,
}

/// Every `declared and not used` diagnostic in `stderr`, in report order.
pub fn unused_reports(stderr: &str) -> Vec<UnusedReport> {
    let Some(re) = unused_pattern() else {
        return Vec::new();
    };
    stderr
        .lines()
        .filter_map(|text| {
            let caps = re.captures(text.trim_end())?;
            let name = caps.get(1).or_else(|| caps.get(2))?.as_str().to_string();
            let line = parse_diagnostics(text).first().map(|d| d.line);
            Some(UnusedReport { name, line })
        })
        .collect()
}

/// Names of reports that point into a top-level statement of `main` binding
/// that name. `built` is the program text the line numbers refer to.
fn top_level_unused(built: &str, reports: &[UnusedReport]) -> Vec<String> {
    let view = SourceView::new(built);
    let Some(entry) = view.entry_point() else {
        return Vec::new();
    };
    let statements: Vec<(RangeInclusive<usize>, Vec<String>)> = view
        .body_statements(&entry)
        .iter()
        .map(|s| {
            let lines = view.tokens[s.first].pos.line..=view.tokens[s.last].pos.line;
            let names: Vec<String> = view.bindings(s).into_iter().map(|b| b.name).collect();
            (lines, names)
        })
        .filter(|(_, names)| !names.is_empty())
        .collect();
    let mut unused: Vec<String> = Vec::new();
    for report in reports {
        let bound_here = statements.iter().any(|(lines, names)| {
            names.contains(&report.name) && report.line.map_or(true, |l| lines.contains(&l))
        });
        if bound_here && !unused.contains(&report.name) {
            unused.push(report.name.clone());
        }
    }
    unused
}

/// Trial-builds the program and discards every unused top-level binding of `main`.
pub fn resolve<T: Toolchain>(program: &str, workspace: &Workspace, toolchain: &T) -> Resolved {
    let view = SourceView::new(program);
    let Some(entry) = view.entry_point() else {
        return Resolved::unpatched(program, Some(ResolveError::NoEntryPoint));
    };

    let (built, stderr) = match trial_build(program, workspace, toolchain) {
        Ok(None) => return Resolved::unpatched(program, None),
        Ok(Some(failed)) => failed,
        Err(e) => return Resolved::unpatched(program, Some(e)),
    };

    let unused = top_level_unused(&built, &unused_reports(&stderr));
    if unused.is_empty() {
        return Resolved::unpatched(program, Some(ResolveError::TrialBuild(stderr)));
    }

    let discards: String = unused.iter().map(|n| format!("\t_ = {}\n", n)).collect();
    let program = apply_edits(program, vec![TextEdit::insert(entry.body_end, discards)]);
    Resolved {
        program,
        unused,
        error: None,
    }
}

/// `Ok(None)` when the build succeeds, otherwise the built text (imports
/// fixed) and its diagnostics.
fn trial_build<T: Toolchain>(
    program: &str,
    workspace: &Workspace,
    toolchain: &T,
) -> Result<Option<(String, String)>, ResolveError> {
    let scratch = workspace
        .scratch()
        .map_err(|e| ResolveError::TrialBuild(e.to_string()))?;
    let main = scratch.path().join(PROGRAM_FILE);
    fs::write(&main, program).map_err(|e| ResolveError::TrialBuild(e.to_string()))?;
    toolchain.fix_imports(&main)?;
    let output = toolchain.build(scratch.path())?;
    if output.success {
        return Ok(None);
    }
    let built = fs::read_to_string(&main).map_err(|e| ResolveError::TrialBuild(e.to_string()))?;
    Ok(Some((built, output.stderr)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoderConfig;
    use crate::error::ToolchainError;
    use crate::toolchain::ProcessOutput;
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Build fails with fixed diagnostics.
    struct FailingBuild(&'static str);

    impl Toolchain for FailingBuild {
        fn fix_imports(&self, _path: &Path) -> Result<ProcessOutput, ToolchainError> {
            Ok(ProcessOutput::ok(""))
        }

        fn run(&self, _main: &Path, _siblings: &[PathBuf]) -> Result<ProcessOutput, ToolchainError> {
            Ok(ProcessOutput::ok(""))
        }

        fn build(&self, _dir: &Path) -> Result<ProcessOutput, ToolchainError> {
            Ok(ProcessOutput::failed(self.0))
        }
    }

    fn workspace() -> (TempDir, Workspace) {
        let root = TempDir::new().unwrap();
        let config = CoderConfig {
            session_id: Some("resolve".to_string()),
            ..CoderConfig::default()
        }
        .with_workspace_root(root.path());
        let ws = Workspace::open(&config).unwrap();
        (root, ws)
    }

    #[test]
    fn test_patterns_compile() {
        assert!(unused_pattern().is_some());
    }

    #[test]
    fn test_unused_reports() {
        let stderr = "# gocell\n./main.go:4:2: declared and not used: a\n./main.go:5:2: declared and not used: b\nc declared but not used\n./main.go:3:1: undefined: x";
        assert_eq!(
            unused_reports(stderr),
            vec![
                UnusedReport { name: "a".into(), line: Some(4) },
                UnusedReport { name: "b".into(), line: Some(5) },
                UnusedReport { name: "c".into(), line: None },
            ]
        );
    }

    #[test]
    fn test_discards_top_level_binding() {
        let (_root, ws) = workspace();
        let program = "package main\n\nfunc main() {\n\tx := 1\n\ty := x\n}\n";
        let toolchain = FailingBuild("# gocell\n./main.go:5:2: declared and not used: y");
        let resolved = resolve(program, &ws, &toolchain);
        assert!(resolved.error.is_none());
        assert_eq!(resolved.unused, vec!["y"]);
        assert_eq!(
            resolved.program,
            "package main\n\nfunc main() {\n\tx := 1\n\ty := x\n\t_ = y\n}\n"
        );
    }

    #[test]
    fn test_nested_shadow_left_alone() {
        let (_root, ws) = workspace();
        let program = "package main\n\nfunc main() {\n\tx := 1\n\tif x > 0 {\n\t\tx := 2\n\t}\n\ty := 3\n}\n";
        let toolchain = FailingBuild(
            "# gocell\n./main.go:6:3: declared and not used: x\n./main.go:8:2: declared and not used: y",
        );
        let resolved = resolve(program, &ws, &toolchain);
        assert_eq!(resolved.unused, vec!["y"]);
        assert!(!resolved.program.contains("_ = x"));
        assert!(resolved.program.contains("\t_ = y\n}"));
    }

    #[test]
    fn test_only_nested_reports_leave_program() {
        let (_root, ws) = workspace();
        let program = "package main\n\nfunc main() {\n\tx := 1\n\tif x > 0 {\n\t\tx := 2\n\t}\n}\n";
        let toolchain = FailingBuild("./main.go:6:3: declared and not used: x");
        let resolved = resolve(program, &ws, &toolchain);
        assert_eq!(resolved.program, program);
        assert!(resolved.unused.is_empty());
        assert!(matches!(resolved.error, Some(ResolveError::TrialBuild(_))));
    }
}
