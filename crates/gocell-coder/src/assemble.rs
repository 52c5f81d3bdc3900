//! Code assembler: builds one complete program per turn.
//!
//! The program is the package clause, the accumulated declarations, and a
//! `main` whose body rehydrates every captured name before the new input.
//! The input's last line carries [`INPUT_SENTINEL`] so the analyzer can find
//! it again; it is stripped before the program is written.

use crate::session::{merge_declarations, render_declarations, DeclKind, Declaration, Session};
use crate::store::ValueStore;
use crate::syntax::{apply_edits, SourceView, Statement, TextEdit};
use crate::token::TokenKind;
use log::{debug, warn};
use std::collections::HashSet;

pub const INPUT_SENTINEL: &str = "// :INPUT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub program: String,
    /// Package-level declarations found in the input, not yet committed.
    pub declarations: Vec<Declaration>,
}

pub fn assemble(session: &Session, store: &ValueStore, input: &str) -> Assembled {
    let (declarations, body) = split_declarations(input);
    let view = SourceView::new(&body);
    let stmts = view.all_statements();

    let redeclared = redeclarations(&view, &stmts, session);
    let mut edits = Vec::new();
    let mut skipped: HashSet<&str> = HashSet::new();
    for redecl in &redeclared {
        if redecl.needed {
            if let Some(edit) = &redecl.demote {
                edits.push(edit.clone());
            }
        } else {
            skipped.extend(redecl.names.iter().map(|s| s.as_str()));
        }
    }
    let body = apply_edits(&body, edits);

    let mut rehydrations = String::new();
    for name in &session.captured_names {
        if skipped.contains(name.as_str()) {
            debug!("`{}` is declared again by the input, not rehydrated", name);
            continue;
        }
        match store.rehydration(name, session.literal(name)) {
            Ok(stmt) => {
                rehydrations.push('\t');
                rehydrations.push_str(&stmt);
                rehydrations.push('\n');
            }
            Err(e) => warn!("skip rehydration of `{}`: {}", name, e),
        }
    }

    let decls = merge_declarations(&session.declarations, &declarations);
    let program = format!(
        "package main\n\n{}func main() {{\n{}\t{} {}\n}}\n",
        render_declarations(&decls),
        rehydrations,
        body.trim(),
        INPUT_SENTINEL
    );
    Assembled {
        program,
        declarations,
    }
}

pub fn strip_sentinel(program: &str) -> String {
    program
        .replace(&format!(" {}", INPUT_SENTINEL), "")
        .replace(INPUT_SENTINEL, "")
}

/// Routes `import`, named `func` and `type` statements out of the input.
pub fn split_declarations(input: &str) -> (Vec<Declaration>, String) {
    let view = SourceView::new(input);
    let mut decls = Vec::new();
    let mut edits = Vec::new();
    for stmt in view.all_statements() {
        if let Some(decl) = declaration(&view, &stmt) {
            edits.push(TextEdit::delete(stmt.span));
            decls.push(decl);
        }
    }
    if decls.is_empty() {
        return (decls, input.to_string());
    }
    (decls, apply_edits(input, edits))
}

fn declaration(view: &SourceView, stmt: &Statement) -> Option<Declaration> {
    let source = view.slice(stmt.span).to_string();
    let first = stmt.first;
    let (kind, key) = match view.kind(first) {
        TokenKind::Import => (DeclKind::Import, source.clone()),
        TokenKind::Type if view.kind(first + 1) == TokenKind::Ident => {
            (DeclKind::Type, view.token_text(first + 1).to_string())
        }
        TokenKind::Type => (DeclKind::Type, source.clone()),
        TokenKind::Func if view.kind(first + 1) == TokenKind::Ident => {
            (DeclKind::Func, view.token_text(first + 1).to_string())
        }
        TokenKind::Func if view.kind(first + 1) == TokenKind::LParen => {
            let close = view.matching(first + 1)?;
            if view.kind(close + 1) != TokenKind::Ident || view.kind(close + 2) != TokenKind::LParen
            {
                return None;
            }
            let receiver = (first + 2..close)
                .rev()
                .find(|&i| view.kind(i) == TokenKind::Ident && view.kind(i + 1) != TokenKind::Op)
                .map(|i| view.token_text(i).to_string())
                .unwrap_or_default();
            (
                DeclKind::Func,
                format!("{}.{}", receiver, view.token_text(close + 1)),
            )
        }
        _ => return None,
    };
    Some(Declaration { kind, key, source })
}

/// A top-level declaration in the input of names that are already live.
struct Redeclaration {
    names: Vec<String>,
    /// The old value is read before (or while) the name is declared again.
    needed: bool,
    /// `:=` to `=` rewrite, when every name on the left is live.
    demote: Option<TextEdit>,
}

fn redeclarations(view: &SourceView, stmts: &[Statement], session: &Session) -> Vec<Redeclaration> {
    let live: HashSet<&str> = session.captured_names.iter().map(|s| s.as_str()).collect();
    let mut out = Vec::new();
    for stmt in stmts {
        let bindings = view.bindings(stmt);
        let is_var = view.kind(stmt.first) == TokenKind::Var;
        if bindings.is_empty() || !(is_var || bindings.iter().any(|b| b.define)) {
            continue;
        }
        let names: Vec<String> = bindings
            .iter()
            .map(|b| b.name.clone())
            .filter(|n| live.contains(n.as_str()))
            .collect();
        if names.is_empty() {
            continue;
        }
        let first_pos = bindings.iter().map(|b| b.pos).min().unwrap_or(stmt.span.start);
        let needed = names.iter().any(|name| {
            let before = view.tokens[..stmt.first]
                .iter()
                .any(|t| t.is_ident(name) && t.pos.pos < first_pos);
            let in_rhs = bindings
                .iter()
                .filter_map(|b| b.rhs)
                .any(|rhs| view.mentions(rhs, name));
            let in_literal = session
                .function_literals
                .iter()
                .any(|(owner, source)| owner != name && SourceView::new(source).mentions_anywhere(name));
            before || in_rhs || in_literal
        });
        let all_live = bindings
            .iter()
            .all(|b| b.name == "_" || live.contains(b.name.as_str()));
        let demote = if !is_var && all_live {
            stmt.tokens()
                .find(|&i| view.kind(i) == TokenKind::Define)
                .map(|i| TextEdit::replace(view.span_of(i, i), "="))
        } else {
            None
        };
        out.push(Redeclaration {
            names,
            needed,
            demote,
        });
    }
    out
}
