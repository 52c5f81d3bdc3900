use crate::config::CoderConfig;
use crate::error::CoderResult;
use crate::store::ValueStore;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

pub const WORKSPACE_DIR: &str = ".gocell";
pub const PROGRAM_FILE: &str = "main.go";
pub const BUILTIN_FILE: &str = "builtin.go";
pub const SESSION_FILE: &str = "session.go";

/// Value store primitives compiled into every generated program.
pub const BUILTIN_GO: &str = include_str!("../assets/builtin.go");

pub fn new_session_id() -> String {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros())
        .unwrap_or_default();
    format!("GC{}", micros)
}

/// `<root>/.gocell`
pub fn base_dir(root: &Path) -> PathBuf {
    root.join(WORKSPACE_DIR)
}

/// Per-session directory: the program file, the helper files and the store.
#[derive(Debug, Clone)]
pub struct Workspace {
    id: String,
    dir: PathBuf,
    store: ValueStore,
}

impl Workspace {
    /// The session directory `config` names, without touching the disk.
    ///
    /// The root is made absolute against the current directory: the
    /// toolchain runs inside the session directory, and `session.go` hands
    /// the store path to the generated programs.
    pub fn locate(config: &CoderConfig) -> CoderResult<Self> {
        let id = config.session_id.clone().unwrap_or_else(new_session_id);
        let root = std::path::absolute(&config.workspace_root)?;
        let dir = base_dir(&root).join(&id);
        let store = ValueStore::new(dir.join("store"));
        Ok(Workspace { id, dir, store })
    }

    /// Creates (or reopens) the session directory and writes the helper files.
    pub fn open(config: &CoderConfig) -> CoderResult<Self> {
        let workspace = Workspace::locate(config)?;
        fs::create_dir_all(workspace.store.dir())?;
        workspace.write_helpers(&workspace.dir)?;
        info!("session {} at {}", workspace.id, workspace.dir.display());
        Ok(workspace)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn program_path(&self) -> PathBuf {
        self.dir.join(PROGRAM_FILE)
    }

    fn builtin_source(&self) -> String {
        format!(
            "{}\nconst _gocellHostPID = {}\n",
            BUILTIN_GO,
            std::process::id()
        )
    }

    fn session_source(&self) -> String {
        let quote = |s: &str| serde_json::to_string(s).unwrap_or_else(|_| format!("{:?}", s));
        let store_dir = self.store.dir().to_string_lossy();
        format!(
            "// Code generated by gocell. DO NOT EDIT.\n\npackage main\n\nfunc init() {{\n\tSessionID = {}\n\tStoreDir = {}\n}}\n",
            quote(&self.id),
            quote(&store_dir)
        )
    }

    fn write_helpers(&self, dir: &Path) -> CoderResult<()> {
        fs::write(dir.join(BUILTIN_FILE), self.builtin_source())?;
        fs::write(dir.join(SESSION_FILE), self.session_source())?;
        Ok(())
    }

    /// Disposable directory holding copies of the helper files.
    pub fn scratch(&self) -> CoderResult<TempDir> {
        let scratch = tempfile::Builder::new().prefix("gocell-").tempdir()?;
        self.write_helpers(scratch.path())?;
        debug!("scratch dir {}", scratch.path().display());
        Ok(scratch)
    }

    /// Deletes the whole session directory, store included. `false` when
    /// there was nothing to delete.
    pub fn remove(&self) -> CoderResult<bool> {
        if !self.dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.dir)?;
        info!("removed session {}", self.id);
        Ok(true)
    }
}
