mod logging;
mod repl;

use clap::{Parser, Subcommand};
use gocell_coder::workspace::{base_dir, Workspace};
use gocell_coder::{Coder, CoderConfig};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory that holds the `.gocell` workspace
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,
    /// Resume (or create) the session with this id
    #[arg(long, global = true)]
    session: Option<String>,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Interactive Go session")]
    Repl,
    #[command(about = "Run a Go file, or a snippet as one turn")]
    Run { code: String },
    #[command(about = "Show the last lines of the log file")]
    Log {
        #[arg(short, default_value_t = 20)]
        n: usize,
    },
    #[command(about = "Delete the session workspace")]
    Clean,
}

fn load_config(cli: &Cli) -> Result<CoderConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => CoderConfig::load(path)?,
        None => CoderConfig::default(),
    }
    .with_env();
    if let Some(root) = &cli.workspace {
        config = config.with_workspace_root(root);
    }
    if let Some(id) = &cli.session {
        config.session_id = Some(id.clone());
    }
    Ok(config)
}

/// Removes the named session, or every session under the root.
fn clean(config: &CoderConfig) -> Result<(), Box<dyn Error>> {
    if config.session_id.is_some() {
        let workspace = Workspace::locate(config)?;
        if workspace.remove()? {
            println!("removed {}", workspace.dir().display());
        } else {
            println!("nothing to clean at {}", workspace.dir().display());
        }
        return Ok(());
    }
    let base = base_dir(&config.workspace_root);
    if base.exists() {
        fs::remove_dir_all(&base)?;
        println!("removed {}", base.display());
    } else {
        println!("nothing to clean at {}", base.display());
    }
    Ok(())
}

fn run(config: CoderConfig, code: &str) -> Result<(), Box<dyn Error>> {
    let mut coder = Coder::new(config)?;
    let path = Path::new(code);
    let result = if path.is_file() {
        coder.run_file(path)
    } else {
        coder.input_and_run(code)
    };
    let failed = result.is_err();
    repl::print_turn(result);
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("logging disabled: {}", e);
    }
    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Run { code }) => run(config, &code)?,
        Some(Commands::Log { n }) => {
            for line in logging::tail(n)? {
                println!("{}", line);
            }
        }
        Some(Commands::Clean) => clean(&config)?,
        Some(Commands::Repl) | None => {
            let coder = Coder::new(config)?;
            repl::main_loop(coder)?;
        }
    }

    Ok(())
}
