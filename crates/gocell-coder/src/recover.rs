//! Error recovery: evict session state implicated by a failed run and
//! rewrite the toolchain's diagnostics in terms of the user's source lines.

use crate::driver::RunFailure;
use crate::session::Session;
use crate::syntax::identifiers;
use log::{info, warn};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: String,
    pub line: usize,
    pub column: Option<usize>,
    pub message: String,
}

fn location_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| match Regex::new(r"^(.+?):(\d+)(?::(\d+))?:\s*(.*)$") {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("diagnostic location pattern rejected: {}", e);
                None
            }
        })
        .as_ref()
}

fn parse_line(line: &str) -> Option<Diagnostic> {
    let caps = location_pattern()?.captures(line.trim_end())?;
    Some(Diagnostic {
        location: caps.get(1)?.as_str().trim().to_string(),
        line: caps.get(2)?.as_str().parse().ok()?,
        column: caps.get(3).and_then(|m| m.as_str().parse().ok()),
        message: caps.get(4).map(|m| m.as_str().to_string()).unwrap_or_default(),
    })
}

pub fn parse_diagnostics(text: &str) -> Vec<Diagnostic> {
    text.lines().filter_map(parse_line).collect()
}

/// Source line a diagnostic points at: from `program` when it names the
/// program file, otherwise read from the referenced file.
fn source_line(diag: &Diagnostic, program: &str, program_path: &Path) -> Option<String> {
    let location = Path::new(&diag.location);
    let is_program = location.file_name() == program_path.file_name();
    let from_program = || program.lines().nth(diag.line.checked_sub(1)?).map(|l| l.to_string());
    if is_program {
        if let Some(line) = from_program() {
            return Some(line);
        }
    }
    let path = if location.is_absolute() {
        location.to_path_buf()
    } else {
        program_path
            .parent()
            .map(|dir| dir.join(location))
            .unwrap_or_else(|| location.to_path_buf())
    };
    let text = fs::read_to_string(path).ok()?;
    text.lines().nth(diag.line.checked_sub(1)?).map(|l| l.to_string())
}

/// Evicts tracked names found on implicated lines and returns the formatted
/// diagnostics. Benign failures leave the session untouched.
pub fn recover(
    session: &mut Session,
    program: &str,
    program_path: &Path,
    failure: &RunFailure,
) -> String {
    if !failure.benign {
        let tracked = session.tracked_names();
        let mut evict: Vec<String> = Vec::new();
        for diag in parse_diagnostics(&failure.text) {
            let Some(line) = source_line(&diag, program, program_path) else {
                continue;
            };
            for ident in identifiers(&line) {
                if tracked.contains(&ident) && !evict.contains(&ident) {
                    evict.push(ident);
                }
            }
        }
        if !evict.is_empty() {
            info!("evicting {:?} after failed run", evict);
            session.evict(&evict);
        }
    }
    format_failure(&failure.text, program, program_path)
}

/// Drops the leading `# package` banner and replaces `file:line:col:`
/// prefixes with the source line they point at.
pub fn format_failure(text: &str, program: &str, program_path: &Path) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.first().is_some_and(|l| l.starts_with("# ")) {
        lines.remove(0);
    }
    lines
        .iter()
        .map(|line| match parse_line(line) {
            Some(diag) => match source_line(&diag, program, program_path) {
                Some(code) if !code.trim().is_empty() => {
                    format!("{}: {}", code.trim(), diag.message)
                }
                _ => format!("line {}: {}", diag.line, diag.message),
            },
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
