//! Capture planner.
//!
//! Finds the bindings of `main`'s top-level statements and appends one
//! `_Serialize` call per capturable name. The resulting [`Plan`] is only
//! committed to the session after the program ran successfully.

use crate::store::{var_key, VAR_PREFIX};
use crate::syntax::{apply_edits, is_func_literal, SourceView, Statement, TextEdit};
use crate::token::TokenKind;
use indexmap::IndexMap;
use log::debug;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub program: String,
    /// Emitted order, then persisted names the scan did not rediscover.
    pub captured_names: Vec<String>,
    pub function_literals: IndexMap<String, String>,
}

#[derive(Debug)]
struct Capture {
    name: String,
    pos: usize,
    literal: Option<String>,
}

pub fn plan(program: &str) -> Option<Plan> {
    let view = SourceView::new(program);
    let entry = view.entry_point()?;
    let stmts = view.body_statements(&entry);

    let mut edits = Vec::new();
    let mut persisted: Vec<(String, String)> = Vec::new();
    for stmt in stmts.iter().filter(|s| view.is_persist_call(s)) {
        edits.push(TextEdit::delete(stmt.span));
        if let Some(name) = persisted_name(&view, stmt) {
            persisted.push((name, view.slice(stmt.span).to_string()));
        }
    }

    let mut seen = HashSet::new();
    let mut captures = Vec::new();
    for stmt in stmts.iter().filter(|s| !view.is_persist_call(s)) {
        for binding in view.bindings(stmt) {
            if binding.name == "_" || seen.contains(&binding.name) {
                continue;
            }
            let literal = match (binding.value, binding.rhs) {
                (Some(value), _) => {
                    let text = view.slice(value);
                    if text.trim() == "nil" {
                        continue;
                    }
                    is_func_literal(text).then(|| text.to_string())
                }
                // tuple right-hand side: every name gets a value
                (None, Some(_)) => None,
                (None, None) => continue,
            };
            seen.insert(binding.name.clone());
            captures.push(Capture {
                name: binding.name,
                pos: binding.pos,
                literal,
            });
        }
    }
    captures.sort_by_key(|c| c.pos);

    let mut tail = String::new();
    let mut emitted: HashSet<&str> = HashSet::new();
    for (name, source) in &persisted {
        tail.push_str(&format!("\t{}\n", source));
        emitted.insert(name);
    }
    for capture in &captures {
        if emitted.insert(&capture.name) {
            tail.push_str(&format!(
                "\t_Serialize(\"{}\", {})\n",
                var_key(&capture.name),
                capture.name
            ));
        }
    }
    edits.push(TextEdit::insert(entry.body_end, tail));

    let mut captured_names: Vec<String> = captures.iter().map(|c| c.name.clone()).collect();
    for (name, _) in &persisted {
        if !captured_names.contains(name) {
            captured_names.push(name.clone());
        }
    }
    let function_literals: IndexMap<String, String> = captures
        .into_iter()
        .filter_map(|c| c.literal.map(|lit| (c.name, lit)))
        .collect();
    debug!("captured {:?}", captured_names);

    Some(Plan {
        program: apply_edits(program, edits),
        captured_names,
        function_literals,
    })
}

/// Name persisted by `_Serialize("var-x", x)`; `None` for a `nil` value.
fn persisted_name(view: &SourceView, stmt: &Statement) -> Option<String> {
    let args = stmt.first + 2..stmt.last;
    if args.clone().any(|i| view.tokens[i].is_ident("nil")) {
        return None;
    }
    let ident = args
        .clone()
        .filter(|&i| view.kind(i) == TokenKind::Ident)
        .last()
        .map(|i| view.token_text(i).to_string());
    let from_key = args
        .filter(|&i| view.kind(i) == TokenKind::Str)
        .map(|i| view.token_text(i).trim_matches('"').to_string())
        .find_map(|key| key.strip_prefix(VAR_PREFIX).map(|s| s.to_string()));
    ident.or(from_key)
}
