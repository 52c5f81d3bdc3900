//! Arity oracle: how many results does a callee return?
//!
//! The static layer answers from the program text itself: package-level
//! function declarations, closures bound earlier in `main`, builtins and
//! conversions. Anything else (library functions, methods on library
//! types) goes to a probe: a throwaway program that prints
//! `reflect.TypeOf(callee).NumOut()`.

use crate::lexer::tokenize;
use crate::syntax::{identifiers, is_func_literal, SourceView, Statement};
use crate::toolchain::Toolchain;
use crate::token::TokenKind;
use crate::workspace::{Workspace, PROGRAM_FILE};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;

pub const PROBE_MARKER: &str = "__gocell_arity__";

const BUILTINS_ONE: [&str; 12] = [
    "len", "cap", "append", "make", "new", "complex", "real", "imag", "min", "max", "copy",
    "recover",
];
const BUILTINS_ZERO: [&str; 6] = ["print", "println", "panic", "close", "delete", "clear"];
const PREDECLARED_TYPES: [&str; 22] = [
    "bool", "byte", "rune", "string", "error", "any", "int", "int8", "int16", "int32", "int64",
    "uint", "uint8", "uint16", "uint32", "uint64", "uintptr", "float32", "float64", "complex64",
    "complex128", "comparable",
];

/// The call being analyzed, with the program around it.
#[derive(Debug, Clone, Copy)]
pub struct ArityQuery<'a> {
    pub callee: &'a str,
    pub program: &'a str,
    /// Byte offset just past `func main() {`.
    pub body_start: usize,
    /// Byte offset where the analyzed statement begins.
    pub statement_start: usize,
}

impl<'a> ArityQuery<'a> {
    fn preceding(&self) -> &'a str {
        &self.program[self.body_start..self.statement_start]
    }
}

pub trait ArityOracle {
    /// `None` when the count cannot be determined.
    fn result_count(&mut self, query: &ArityQuery) -> Option<usize>;
}

// ============================================================================
// Static table
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct StaticOracle;

impl ArityOracle for StaticOracle {
    fn result_count(&mut self, query: &ArityQuery) -> Option<usize> {
        let callee = query.callee.trim();
        let head = SourceView::new(callee);
        match head.kind(0) {
            TokenKind::LSquare | TokenKind::Map | TokenKind::Chan => return Some(1),
            TokenKind::Op if head.token_text(0) == "*" => return Some(1),
            TokenKind::Func => {
                let close = head.matching(1)?;
                return Some(head.result_count(close + 1));
            }
            _ => {}
        }

        let program = SourceView::new(query.program);
        let decls = program.func_decls();
        if let Some((_, method)) = callee.rsplit_once('.') {
            let counts: Vec<usize> = decls
                .iter()
                .filter(|d| d.receiver && d.name == method)
                .map(|d| d.results)
                .collect();
            return match counts.split_first() {
                Some((first, rest)) if rest.iter().all(|c| c == first) => Some(*first),
                _ => None,
            };
        }

        let name = callee;
        if let Some(closure) = closure_before(query, name) {
            return Some(closure);
        }
        if let Some(decl) = decls.iter().find(|d| !d.receiver && d.name == name) {
            return Some(decl.results);
        }
        if BUILTINS_ONE.contains(&name) || PREDECLARED_TYPES.contains(&name) {
            return Some(1);
        }
        if BUILTINS_ZERO.contains(&name) {
            return Some(0);
        }
        if declared_type(&program, name) {
            return Some(1);
        }
        None
    }
}

/// Latest `name := func(...) R {...}` among the statements before the query.
fn closure_before(query: &ArityQuery, name: &str) -> Option<usize> {
    let view = SourceView::new(query.preceding());
    view.all_statements()
        .iter()
        .filter_map(|s| view.closure_arity(s))
        .filter(|(bound, _)| bound == name)
        .map(|(_, results)| results)
        .last()
}

fn declared_type(view: &SourceView, name: &str) -> bool {
    view.all_statements().iter().any(|s| {
        view.kind(s.first) == TokenKind::Type
            && view.kind(s.first + 1) == TokenKind::Ident
            && view.token_text(s.first + 1) == name
    })
}

// ============================================================================
// Reflection probe
// ============================================================================

pub struct ProbeOracle<'a, T: Toolchain> {
    workspace: &'a Workspace,
    toolchain: &'a T,
    cache: &'a mut HashMap<String, Option<usize>>,
}

impl<'a, T: Toolchain> ProbeOracle<'a, T> {
    pub fn new(
        workspace: &'a Workspace,
        toolchain: &'a T,
        cache: &'a mut HashMap<String, Option<usize>>,
    ) -> Self {
        ProbeOracle {
            workspace,
            toolchain,
            cache,
        }
    }

    fn probe(&self, query: &ArityQuery) -> Option<usize> {
        let program = probe_program(query);
        let scratch = match self.workspace.scratch() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("arity probe: {}", e);
                return None;
            }
        };
        let main = scratch.path().join(PROGRAM_FILE);
        if let Err(e) = fs::write(&main, &program) {
            warn!("arity probe: {}", e);
            return None;
        }
        let siblings = crate::driver::siblings(&main).unwrap_or_default();
        let output = self
            .toolchain
            .fix_imports(&main)
            .and_then(|_| self.toolchain.run(&main, &siblings));
        match output {
            Ok(out) => {
                let count = parse_marker(&out.stdout);
                if count.is_none() {
                    debug!("arity probe for `{}` failed: {}", query.callee, out.stderr);
                }
                count
            }
            Err(e) => {
                warn!("arity probe: {}", e);
                None
            }
        }
    }
}

impl<'a, T: Toolchain> ArityOracle for ProbeOracle<'a, T> {
    fn result_count(&mut self, query: &ArityQuery) -> Option<usize> {
        let cacheable = is_package_qualified(query);
        if cacheable {
            if let Some(hit) = self.cache.get(query.callee.trim()) {
                return *hit;
            }
        }
        let count = self.probe(query);
        debug!("probed arity of `{}`: {:?}", query.callee, count);
        if cacheable {
            self.cache.insert(query.callee.trim().to_string(), count);
        }
        count
    }
}

/// `pkg.Func` where `pkg` is not a name bound in `main`.
fn is_package_qualified(query: &ArityQuery) -> bool {
    let callee = query.callee.trim();
    let Some((pkg, member)) = callee.split_once('.') else {
        return false;
    };
    let simple = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_');
    simple(pkg) && simple(member) && !SourceView::new(query.preceding()).mentions_anywhere(pkg)
}

/// A statement that only brings a stored value back into scope: a
/// `_Deserialize` rehydration or a function literal bound to a name.
/// Running one twice has no effect outside the process.
fn is_replay(view: &SourceView, stmt: &Statement) -> bool {
    let bindings = view.bindings(stmt);
    let Some(first) = bindings.first() else {
        return false;
    };
    if !first.define {
        return false;
    }
    match (first.value, first.rhs) {
        (Some(value), _) if bindings.len() == 1 => is_func_literal(view.slice(value)),
        (None, Some(rhs)) => view.slice(rhs).trim_start().starts_with("_Deserialize["),
        _ => false,
    }
}

/// Identifier the callee starts with: `r` in `r.Len`, `f` in `f`.
fn callee_head(callee: &str) -> Option<String> {
    let tokens = tokenize(callee.trim());
    tokens
        .first()
        .filter(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text.clone())
}

/// Package-level source, the replayed bindings the callee depends on,
/// then the probe line. Nothing else from `main` is copied, so the turn's
/// own statements never run here.
pub fn probe_program(query: &ArityQuery) -> String {
    let view = SourceView::new(query.preceding());
    let replays: Vec<Statement> = view
        .all_statements()
        .into_iter()
        .filter(|s| is_replay(&view, s))
        .collect();

    let mut wanted: Vec<String> = callee_head(query.callee).into_iter().collect();
    let mut included = vec![false; replays.len()];
    let mut next = 0;
    while next < wanted.len() {
        let name = wanted[next].clone();
        next += 1;
        let Some(idx) = replays
            .iter()
            .rposition(|s| view.bindings(s).iter().any(|b| b.name == name))
        else {
            continue;
        };
        if included[idx] {
            continue;
        }
        included[idx] = true;
        for ident in identifiers(view.slice(replays[idx].span)) {
            if ident != "_" && !wanted.contains(&ident) {
                wanted.push(ident);
            }
        }
    }

    let mut body = String::new();
    let mut discards = String::new();
    for (stmt, _) in replays.iter().zip(&included).filter(|(_, inc)| **inc) {
        body.push_str(&format!("\t{}\n", view.slice(stmt.span).trim()));
        for binding in view.bindings(stmt) {
            if binding.name != "_" {
                discards.push_str(&format!("\t_ = {}\n", binding.name));
            }
        }
    }
    format!(
        "{}\n{}{}\tfmt.Println(\"{}\", reflect.TypeOf({}).NumOut())\n}}\n",
        &query.program[..query.body_start],
        body,
        discards,
        PROBE_MARKER,
        query.callee.trim()
    )
}

pub fn parse_marker(stdout: &str) -> Option<usize> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix(PROBE_MARKER))
        .and_then(|rest| rest.trim().parse().ok())
}

/// Static answers first, then the probe when enabled.
pub struct LayeredOracle<'a, T: Toolchain> {
    probe: Option<ProbeOracle<'a, T>>,
}

impl<'a, T: Toolchain> LayeredOracle<'a, T> {
    pub fn new(probe: Option<ProbeOracle<'a, T>>) -> Self {
        LayeredOracle { probe }
    }
}

impl<'a, T: Toolchain> ArityOracle for LayeredOracle<'a, T> {
    fn result_count(&mut self, query: &ArityQuery) -> Option<usize> {
        if let Some(count) = StaticOracle.result_count(query) {
            return Some(count);
        }
        self.probe.as_mut().and_then(|p| p.result_count(query))
    }
}
