use gocell_coder::session::render_declarations;
use gocell_coder::token::TokenKind;
use gocell_coder::workspace::base_dir;
use gocell_coder::{tokenize, Coder, TurnError};
use miette::{MietteHandlerOpts, Report};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Editor, Helper};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

const PROMPT: &str = ">>> ";
const HISTORY_FILE: &str = "history.txt";

enum CmdResult {
    Exit,
    Continue,
}

type SharedCoder = Rc<RefCell<Coder>>;

struct GoHelper {
    coder: SharedCoder,
}

impl Completer for GoHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let Ok(coder) = self.coder.try_borrow() else {
            return Ok((pos, Vec::new()));
        };
        let items = coder.complete(line, pos);
        let start = line[..pos]
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
            .last()
            .map(|(i, _)| i)
            .unwrap_or(pos);
        let pairs = items
            .into_iter()
            .map(|item| Pair {
                display: format!("{}  ({})", item.label, item.detail),
                replacement: item.label,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for GoHelper {
    type Hint = String;
}

impl Highlighter for GoHelper {}

/// Keeps reading lines while brackets are open.
impl Validator for GoHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        if input.trim_start().starts_with(':') {
            return Ok(ValidationResult::Valid(None));
        }
        let mut depth: i64 = 0;
        for token in tokenize(input) {
            if token.kind.opens() {
                depth += 1;
            } else if token.kind.closes() {
                depth -= 1;
            } else if token.kind == TokenKind::EOF {
                break;
            }
        }
        if depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

impl Helper for GoHelper {}

fn print_help() {
    println!(":help          show this help");
    println!(":quit, :q      exit");
    println!(":vars          captured variables and their stored types");
    println!(":decls         accumulated imports, functions and types");
    println!(":program       the program generated for the last turn");
    println!(":reset         forget all session state");
    println!();
    println!("Anything else is Go code, run as the body of main.");
    println!("Open braces continue the input on the next line.");
}

fn try_command(line: &str, coder: &SharedCoder) -> CmdResult {
    match line {
        ":help" | ":h" => print_help(),
        ":q" | ":quit" => return CmdResult::Exit,
        ":vars" => {
            let vars = coder.borrow().variables();
            if vars.is_empty() {
                println!("no variables");
            }
            for (name, detail) in vars {
                println!("{}: {}", name, detail);
            }
        }
        ":decls" => {
            let coder = coder.borrow();
            let decls = &coder.session().declarations;
            if decls.is_empty() {
                println!("no declarations");
            } else {
                print!("{}", render_declarations(decls));
            }
        }
        ":program" => match coder.borrow().last_program() {
            Some(program) => print!("{}", program),
            None => println!("nothing has run yet"),
        },
        ":reset" => {
            coder.borrow_mut().reset();
            println!("session cleared");
        }
        _ => {
            let result = coder.borrow_mut().input_and_run(line);
            print_turn(result);
        }
    }
    CmdResult::Continue
}

/// Prints stdout first, then the diagnostics of a failed turn.
pub fn print_turn(result: Result<String, TurnError>) {
    match result {
        Ok(stdout) => {
            if !stdout.is_empty() {
                println!("{}", stdout);
            }
        }
        Err(err) => {
            if let TurnError::Run { stdout, .. } = &err {
                if !stdout.is_empty() {
                    println!("{}", stdout);
                }
            }
            print_miette_error(err);
        }
    }
}

pub fn print_miette_error(err: impl miette::Diagnostic + Send + Sync + 'static) {
    miette::set_hook(Box::new(|_| {
        Box::new(MietteHandlerOpts::new().terminal_links(false).build())
    }))
    .ok();
    eprintln!("{:?}", Report::new(err));
}

fn history_path(coder: &SharedCoder) -> PathBuf {
    base_dir(&coder.borrow().config().workspace_root).join(HISTORY_FILE)
}

pub fn main_loop(coder: Coder) -> rustyline::Result<()> {
    let coder: SharedCoder = Rc::new(RefCell::new(coder));
    let mut rl: Editor<GoHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(GoHelper {
        coder: Rc::clone(&coder),
    }));
    let history = history_path(&coder);
    if rl.load_history(&history).is_err() {
        log::debug!("no history at {}", history.display());
    }
    println!(
        "gocell session {} (:help for commands)",
        coder.borrow().workspace().id()
    );
    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                match try_command(line, &coder) {
                    CmdResult::Exit => break,
                    CmdResult::Continue => continue,
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!("Goodbye");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(&history)?;
    Ok(())
}
