use crate::assemble::{assemble, strip_sentinel, INPUT_SENTINEL};
use crate::completion::{CompletionItem, CompletionProvider, CompletionRequest, SessionCompletion};
use crate::config::CoderConfig;
use crate::display::analyze;
use crate::driver::{Driver, RunReport};
use crate::error::{CoderResult, TurnError};
use crate::oracle::{LayeredOracle, ProbeOracle};
use crate::plan::plan;
use crate::recover::{format_failure, recover};
use crate::resolve::resolve;
use crate::session::Session;
use crate::toolchain::{GoToolchain, Toolchain};
use crate::workspace::Workspace;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Drives one session: every turn becomes a complete program that is
/// built and run as its own process.
pub struct Coder<T: Toolchain = GoToolchain> {
    config: CoderConfig,
    workspace: Workspace,
    toolchain: T,
    session: Session,
    arity_cache: HashMap<String, Option<usize>>,
}

impl Coder<GoToolchain> {
    /// Opens the workspace; with a configured session id the previous
    /// session snapshot is loaded when there is one.
    pub fn new(config: CoderConfig) -> CoderResult<Self> {
        let toolchain = GoToolchain::new(&config);
        Coder::with_toolchain(config, toolchain)
    }
}

impl<T: Toolchain> Coder<T> {
    pub fn with_toolchain(config: CoderConfig, toolchain: T) -> CoderResult<Self> {
        let workspace = Workspace::open(&config)?;
        let session = match Session::load(workspace.store()) {
            Ok(Some(session)) => {
                info!(
                    "resumed session {} with {} names",
                    workspace.id(),
                    session.captured_names.len()
                );
                session
            }
            Ok(None) => Session::default(),
            Err(e) => {
                warn!("ignoring unreadable session snapshot: {}", e);
                Session::default()
            }
        };
        Ok(Coder {
            config,
            workspace,
            toolchain,
            session,
            arity_cache: HashMap::new(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &CoderConfig {
        &self.config
    }

    /// Runs one turn. `Ok` carries the program's stdout.
    pub fn input_and_run(&mut self, input: &str) -> Result<String, TurnError> {
        let assembled = assemble(&self.session, self.workspace.store(), input);
        debug!("assembled:\n{}", assembled.program);

        let analyzed = {
            let probe = if self.config.probe_external {
                Some(ProbeOracle::new(
                    &self.workspace,
                    &self.toolchain,
                    &mut self.arity_cache,
                ))
            } else {
                None
            };
            let mut oracle = LayeredOracle::new(probe);
            analyze(&assembled.program, &mut oracle)
        };
        let program = strip_sentinel(&analyzed);

        let resolved = resolve(&program, &self.workspace, &self.toolchain);
        if let Some(e) = &resolved.error {
            debug!("unused-binding pass skipped: {}", e);
        } else if !resolved.unused.is_empty() {
            debug!("discarded unused {:?}", resolved.unused);
        }
        let planned = plan(&resolved.program);
        let program = match &planned {
            Some(p) => p.program.clone(),
            None => resolved.program,
        };
        debug!("planned:\n{}", program);

        let path = self.workspace.program_path();
        let report = Driver::new(&self.toolchain, &self.config).run(&program, &path)?;
        if report.exited_ok {
            if let Some(plan) = &planned {
                self.session.commit(plan);
            }
            self.session.add_declarations(&assembled.declarations);
        }
        self.finish(report, &path)
    }

    fn finish(&mut self, report: RunReport, path: &Path) -> Result<String, TurnError> {
        let RunReport {
            stdout,
            program,
            failure,
            ..
        } = report;
        let result = match failure {
            None => Ok(stdout),
            Some(failure) => {
                let text = recover(&mut self.session, &program, path, &failure);
                Err(TurnError::Run {
                    stdout,
                    text,
                    benign: failure.benign,
                })
            }
        };
        self.save();
        result
    }

    fn save(&self) {
        if let Err(e) = self.session.save(self.workspace.store()) {
            warn!("failed to save session snapshot: {}", e);
        }
    }

    /// Runs an existing Go file with its sibling files; the session is not involved.
    pub fn run_file(&self, path: &Path) -> Result<String, TurnError> {
        let report = Driver::new(&self.toolchain, &self.config).run_file(path)?;
        match report.failure {
            None => Ok(report.stdout),
            Some(failure) => Err(TurnError::Run {
                stdout: report.stdout,
                text: format_failure(&failure.text, &report.program, path),
                benign: failure.benign,
            }),
        }
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.arity_cache.clear();
        self.save();
    }

    /// Captured names with their stored type, function literals marked as such.
    pub fn variables(&self) -> Vec<(String, String)> {
        self.session
            .captured_names
            .iter()
            .map(|name| {
                let detail = if self.session.literal(name).is_some() {
                    "func literal".to_string()
                } else {
                    match self.workspace.store().type_tag(name) {
                        Ok(tag) => tag.as_str().to_string(),
                        Err(e) => format!("<{}>", e),
                    }
                };
                (name.clone(), detail)
            })
            .collect()
    }

    /// The program file of the last turn.
    pub fn last_program(&self) -> Option<String> {
        fs::read_to_string(self.workspace.program_path()).ok()
    }

    /// The program `input` would produce, with the cursor located in it.
    pub fn completion_request(&self, input: &str, cursor: usize) -> CompletionRequest {
        const CURSOR: &str = "__gocell_cursor__";
        let cursor = if input.is_char_boundary(cursor) {
            cursor
        } else {
            input.len()
        };
        let marked = format!("{}{}{}", &input[..cursor], CURSOR, &input[cursor..]);
        let assembled = assemble(&self.session, self.workspace.store(), &marked);
        let program = assembled.program.replace(INPUT_SENTINEL, "");
        let offset = program.find(CURSOR).unwrap_or(program.len());
        let program = program.replacen(CURSOR, "", 1);
        let mut declarations = crate::session::merge_declarations(
            &self.session.declarations,
            &assembled.declarations,
        );
        declarations.retain(|d| !d.key.contains(CURSOR));
        CompletionRequest::new(
            program,
            offset,
            self.session.tracked_names(),
            declarations.into_iter().map(|d| (d.kind, d.key)).collect(),
        )
    }

    pub fn complete(&self, input: &str, cursor: usize) -> Vec<CompletionItem> {
        SessionCompletion.complete(&self.completion_request(input, cursor))
    }
}
