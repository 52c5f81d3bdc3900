//! Auto-print analyzer.
//!
//! The statement that ends on the sentinel line is wrapped in
//! `fmt.Println(...)` when it yields a value, and only the lexically last
//! top-level display call of `main` is kept.

use crate::assemble::INPUT_SENTINEL;
use crate::oracle::{ArityOracle, ArityQuery};
use crate::syntax::{apply_edits, EntryPoint, SourceView, Span, Statement, StmtKind, TextEdit};
use log::debug;

pub fn analyze(program: &str, oracle: &mut dyn ArityOracle) -> String {
    let Some(sentinel) = program.rfind(INPUT_SENTINEL) else {
        return program.to_string();
    };
    let view = SourceView::new(program);
    let Some(entry) = view.entry_point() else {
        return program.to_string();
    };
    let stmts = view.body_statements(&entry);
    let line_start = program[..sentinel].rfind('\n').map(|i| i + 1).unwrap_or(0);

    let mut edits = Vec::new();
    let marked = stmts
        .iter()
        .rev()
        .find(|s| s.span.end <= sentinel)
        .filter(|s| s.span.end >= line_start);
    let mut wrapped = None;
    if let Some(stmt) = marked {
        if needs_display(&view, &entry, stmt, oracle) {
            let text = view.slice(stmt.span);
            debug!("display `{}`", text);
            edits.push(TextEdit::replace(stmt.span, format!("fmt.Println({})", text)));
            wrapped = Some(stmt.span);
        }
    }

    let mut displays: Vec<&Statement> = stmts.iter().filter(|s| view.is_display(s)).collect();
    if wrapped.is_none() {
        displays.pop();
    }
    for stmt in displays {
        if Some(stmt.span) == wrapped {
            continue;
        }
        edits.push(TextEdit::delete(deletion_span(&view, stmt)));
    }
    apply_edits(program, edits)
}

fn needs_display(
    view: &SourceView,
    entry: &EntryPoint,
    stmt: &Statement,
    oracle: &mut dyn ArityOracle,
) -> bool {
    match view.classify(stmt) {
        StmtKind::Expr => true,
        StmtKind::Call { callee } => {
            let query = ArityQuery {
                callee: view.slice(callee),
                program: view.text,
                body_start: entry.body_start,
                statement_start: stmt.span.start,
            };
            matches!(oracle.result_count(&query), Some(n) if n > 0)
        }
        StmtKind::Empty
        | StmtKind::Display
        | StmtKind::Assign
        | StmtKind::Send
        | StmtKind::Decl
        | StmtKind::Control => false,
    }
}

/// The statement plus a written `;` after it, so `a(); b()` loses `a();` cleanly.
fn deletion_span(view: &SourceView, stmt: &Statement) -> Span {
    match stmt.terminator {
        Some(semi) if !view.tokens[semi].is_inserted_semi() => {
            let end = view.tokens[semi].pos.end();
            let blank = view.text[end..]
                .bytes()
                .take_while(|b| *b == b' ' || *b == b'\t')
                .count();
            Span::new(stmt.span.start, end + blank)
        }
        _ => stmt.span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct Table(HashMap<&'static str, usize>);

    impl ArityOracle for Table {
        fn result_count(&mut self, query: &ArityQuery) -> Option<usize> {
            self.0.get(query.callee).copied()
        }
    }

    fn table() -> Table {
        Table(HashMap::from([("f", 1), ("g", 0), ("two", 2)]))
    }

    fn program(body: &str) -> String {
        format!("package main\n\nfunc main() {{\n\t{} // :INPUT\n}}\n", body)
    }

    fn run(body: &str) -> String {
        analyze(&program(body), &mut table())
    }

    #[test]
    fn test_wraps_expression() {
        assert_eq!(run("a + 1"), program("fmt.Println(a + 1)"));
        assert_eq!(run("x"), program("fmt.Println(x)"));
    }

    #[test]
    fn test_call_uses_arity() {
        assert_eq!(run("f(1)"), program("fmt.Println(f(1))"));
        assert_eq!(run("two()"), program("fmt.Println(two())"));
        assert_eq!(run("g()"), program("g()"));
        assert_eq!(run("unknown()"), program("unknown()"));
    }

    #[test]
    fn test_not_wrapped() {
        for body in [
            "a := 1",
            "a = f(1)",
            "i++",
            "var v = 2",
            "if a > 1 { g() }",
            "for i := 0; i < 2; i++ { g() }",
            "ch <- 1",
            "fmt.Printf(\"%d\", 1)",
        ] {
            assert_eq!(run(body), program(body), "{}", body);
        }
    }

    #[test]
    fn test_only_last_segment() {
        assert_eq!(run("a := 1; a + 1"), program("a := 1; fmt.Println(a + 1)"));
    }

    #[test]
    fn test_last_display_survives() {
        assert_eq!(
            run("fmt.Println(1); fmt.Println(2); f(3)"),
            program("fmt.Println(f(3))")
        );
        assert_eq!(
            run("fmt.Println(1); fmt.Println(2); a := 3"),
            program("fmt.Println(2); a := 3")
        );
        // nested display calls are left alone
        assert_eq!(
            run("for i := 0; i < 2; i++ { fmt.Println(i) }; x"),
            program("for i := 0; i < 2; i++ { fmt.Println(i) }; fmt.Println(x)")
        );
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(run(""), program(""));
    }

    #[test]
    fn test_multiline_input() {
        let code = "package main\n\nfunc main() {\n\tx := 2\n\tx *\n\t\t3 // :INPUT\n}\n";
        let out = analyze(code, &mut table());
        assert_eq!(
            out,
            "package main\n\nfunc main() {\n\tx := 2\n\tfmt.Println(x *\n\t\t3) // :INPUT\n}\n"
        );
    }
}
