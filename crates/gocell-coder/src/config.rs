use crate::error::{CoderError, CoderResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Diagnostics that are reported to the user but never evict session state.
pub const BENIGN_DIAGNOSTICS: [&str; 1] = ["no new variables on left side of :="];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoderConfig {
    /// Directory that holds the hidden `.gocell` workspace.
    pub workspace_root: PathBuf,
    pub go_bin: String,
    pub import_fixer: String,
    pub benign_diagnostics: Vec<String>,
    /// Fall back to a reflection probe for callees the static table does not know.
    pub probe_external: bool,
    /// Reuse an existing session (and its snapshot) instead of starting a new one.
    pub session_id: Option<String>,
}

impl Default for CoderConfig {
    fn default() -> Self {
        CoderConfig {
            workspace_root: PathBuf::from("."),
            go_bin: "go".to_string(),
            import_fixer: "goimports".to_string(),
            benign_diagnostics: BENIGN_DIAGNOSTICS.iter().map(|s| s.to_string()).collect(),
            probe_external: true,
            session_id: None,
        }
    }
}

impl CoderConfig {
    /// Reads a JSON config file; missing keys keep their defaults.
    pub fn load(path: &Path) -> CoderResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| CoderError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `GOCELL_SESSION_ID`, `GOCELL_GO` and `GOCELL_GOIMPORTS`.
    pub fn with_env(mut self) -> Self {
        if let Ok(id) = env::var("GOCELL_SESSION_ID") {
            if !id.trim().is_empty() {
                self.session_id = Some(id.trim().to_string());
            }
        }
        if let Ok(go) = env::var("GOCELL_GO") {
            if !go.is_empty() {
                self.go_bin = go;
            }
        }
        if let Ok(fixer) = env::var("GOCELL_GOIMPORTS") {
            if !fixer.is_empty() {
                self.import_fixer = fixer;
            }
        }
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    pub fn is_benign(&self, text: &str) -> bool {
        self.benign_diagnostics
            .iter()
            .any(|needle| text.contains(needle.as_str()))
    }
}
