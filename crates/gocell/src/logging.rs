use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;

/// `<data_local_dir>/gocell/log/gocell.log`
pub fn log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("gocell").join("log").join("gocell.log"))
}

/// Logs go to a file so the REPL output stays clean. `GOCELL_LOG` sets the
/// filter (default `info`); `verbose` forces `debug`.
pub fn init(verbose: bool) -> io::Result<()> {
    let path = log_path().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no local data directory")
    })?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut builder = Builder::from_env(Env::default().filter_or("GOCELL_LOG", "info"));
    builder.target(Target::Pipe(Box::new(file)));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.try_init().map_err(io::Error::other)
}

/// Last `n` lines of the log file.
pub fn tail(n: usize) -> io::Result<Vec<String>> {
    let Some(path) = log_path() else {
        return Ok(Vec::new());
    };
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(n);
    Ok(lines[skip..].iter().map(|l| l.to_string()).collect())
}
