//! Structured view over Go source text.
//!
//! Nothing here is a parser in the full sense: the view knows where the
//! entry point is, how its body splits into statements, and enough about
//! each statement's shape for the assembler, analyzer and planner. All
//! edits go through byte offsets recorded from the token stream.

use crate::lexer::tokenize;
use crate::token::{Token, TokenKind};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// `func main() { ... }` located by token index and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub open: usize,
    pub close: usize,
    /// Byte offset just past the opening brace.
    pub body_start: usize,
    /// Byte offset of the closing brace.
    pub body_end: usize,
}

/// One statement: an inclusive token range plus its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub first: usize,
    pub last: usize,
    pub span: Span,
    /// Index of the `;` that ends the statement, inserted or written.
    pub terminator: Option<usize>,
}

impl Statement {
    pub fn tokens(&self) -> Range<usize> {
        self.first..self.last + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    Empty,
    /// Already a `fmt.Print*` call.
    Display,
    /// `=`, `:=`, `op=`, `++` and `--`.
    Assign,
    Send,
    /// `var`, `const`, `type`, `import` and `func` declarations.
    Decl,
    /// Control-flow headers, labels and bare blocks.
    Control,
    /// Call expression; the span covers the callee.
    Call { callee: Span },
    /// Anything else that yields a value.
    Expr,
}

/// A name introduced or assigned by a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    /// Byte offset of the name.
    pub pos: usize,
    /// Right-hand side for this name; `None` when there is none or the
    /// value comes from a tuple (multi-value call, comma-ok form).
    pub value: Option<Span>,
    /// The whole right-hand side expression list.
    pub rhs: Option<Span>,
    pub define: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub name: String,
    pub receiver: bool,
    pub results: usize,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Span,
    pub text: String,
}

impl TextEdit {
    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        TextEdit {
            span,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        TextEdit::replace(Span::new(at, at), text)
    }

    pub fn delete(span: Span) -> Self {
        TextEdit::replace(span, "")
    }
}

/// Applies non-overlapping edits, last offset first so earlier offsets stay valid.
pub fn apply_edits(text: &str, mut edits: Vec<TextEdit>) -> String {
    edits.sort_by(|a, b| (b.span.start, b.span.end).cmp(&(a.span.start, a.span.end)));
    let mut out = text.to_string();
    for edit in edits {
        out.replace_range(edit.span.start..edit.span.end, &edit.text);
    }
    out
}

pub struct SourceView<'a> {
    pub text: &'a str,
    pub tokens: Vec<Token>,
}

impl<'a> SourceView<'a> {
    pub fn new(text: &'a str) -> Self {
        SourceView {
            text,
            tokens: tokenize(text),
        }
    }

    pub fn token_text(&self, idx: usize) -> &str {
        &self.tokens[idx].text
    }

    pub fn kind(&self, idx: usize) -> TokenKind {
        self.tokens
            .get(idx)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::EOF)
    }

    /// Index of the bracket closing the one opened at `open`.
    pub fn matching(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(open) {
            if token.kind.opens() {
                depth += 1;
            } else if token.kind.closes() {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    pub fn span_of(&self, first: usize, last: usize) -> Span {
        Span::new(self.tokens[first].pos.pos, self.tokens[last].pos.end())
    }

    pub fn slice(&self, span: Span) -> &'a str {
        span.slice(self.text)
    }

    pub fn entry_point(&self) -> Option<EntryPoint> {
        let mut depth = 0usize;
        let mut i = 0;
        while i < self.tokens.len() {
            let kind = self.tokens[i].kind;
            if kind.opens() {
                depth += 1;
            } else if kind.closes() {
                depth = depth.saturating_sub(1);
            } else if depth == 0
                && kind == TokenKind::Func
                && self.tokens.get(i + 1).is_some_and(|t| t.is_ident("main"))
                && self.kind(i + 2) == TokenKind::LParen
                && self.kind(i + 3) == TokenKind::RParen
                && self.kind(i + 4) == TokenKind::LBrace
            {
                let open = i + 4;
                let close = self.matching(open)?;
                return Some(EntryPoint {
                    open,
                    close,
                    body_start: self.tokens[open].pos.end(),
                    body_end: self.tokens[close].pos.pos,
                });
            }
            i += 1;
        }
        None
    }

    /// Splits a token range on `;` at its own nesting level.
    ///
    /// Semicolons inside a `for`/`if`/`switch` header belong to the header.
    pub fn statements(&self, range: Range<usize>) -> Vec<Statement> {
        let mut stmts = Vec::new();
        let mut depth = 0usize;
        let mut first: Option<usize> = None;
        let mut last = 0;
        let mut header = false;
        for i in range {
            let kind = self.tokens[i].kind;
            match kind {
                TokenKind::EOF => break,
                TokenKind::Semi if depth == 0 && !header => {
                    if let Some(start) = first.take() {
                        stmts.push(self.statement(start, last, Some(i)));
                    }
                    continue;
                }
                TokenKind::LBrace if depth == 0 => {
                    header = false;
                    depth += 1;
                }
                TokenKind::If | TokenKind::For | TokenKind::Switch | TokenKind::Select
                    if first.is_none() =>
                {
                    header = true
                }
                TokenKind::Else if depth == 0 => header = true,
                k if k.opens() => depth += 1,
                k if k.closes() => depth = depth.saturating_sub(1),
                _ => {}
            }
            if first.is_none() {
                first = Some(i);
            }
            last = i;
        }
        if let Some(start) = first {
            stmts.push(self.statement(start, last, None));
        }
        stmts
    }

    fn statement(&self, first: usize, last: usize, terminator: Option<usize>) -> Statement {
        Statement {
            first,
            last,
            span: self.span_of(first, last),
            terminator,
        }
    }

    /// Top-level statements of the entry-point body.
    pub fn body_statements(&self, entry: &EntryPoint) -> Vec<Statement> {
        self.statements(entry.open + 1..entry.close)
    }

    /// Every top-level statement of a fragment that has no entry point.
    pub fn all_statements(&self) -> Vec<Statement> {
        self.statements(0..self.tokens.len())
    }

    /// Token indices of a statement that sit at its own top nesting level.
    fn top_level(&self, stmt: &Statement) -> Vec<usize> {
        let mut out = Vec::new();
        let mut depth = 0usize;
        for i in stmt.tokens() {
            let kind = self.tokens[i].kind;
            if kind.closes() {
                depth = depth.saturating_sub(1);
            }
            if depth == 0 {
                out.push(i);
            }
            if kind.opens() {
                depth += 1;
            }
        }
        out
    }

    pub fn is_display(&self, stmt: &Statement) -> bool {
        let i = stmt.first;
        self.tokens[i].is_ident("fmt")
            && self.kind(i + 1) == TokenKind::Dot
            && self.kind(i + 2) == TokenKind::Ident
            && self.token_text(i + 2).starts_with("Print")
            && self.kind(i + 3) == TokenKind::LParen
    }

    /// `_Serialize(...)` persistence call.
    pub fn is_persist_call(&self, stmt: &Statement) -> bool {
        self.tokens[stmt.first].is_ident("_Serialize")
            && self.kind(stmt.first + 1) == TokenKind::LParen
            && self.kind(stmt.last) == TokenKind::RParen
    }

    pub fn classify(&self, stmt: &Statement) -> StmtKind {
        let first = &self.tokens[stmt.first];
        match first.kind {
            TokenKind::EOF | TokenKind::Semi => return StmtKind::Empty,
            TokenKind::Var
            | TokenKind::Const
            | TokenKind::Type
            | TokenKind::Import
            | TokenKind::Package => return StmtKind::Decl,
            TokenKind::Func if self.kind(stmt.first + 1) == TokenKind::Ident => {
                return StmtKind::Decl
            }
            TokenKind::Func
                if self.kind(stmt.first + 1) == TokenKind::LParen
                    && self.is_method_decl(stmt.first) =>
            {
                return StmtKind::Decl
            }
            TokenKind::LBrace => return StmtKind::Control,
            k if k.is_control() => return StmtKind::Control,
            TokenKind::Ident if self.kind(stmt.first + 1) == TokenKind::Colon => {
                return StmtKind::Control
            }
            _ => {}
        }
        if self.is_display(stmt) {
            return StmtKind::Display;
        }
        let top = self.top_level(stmt);
        if matches!(self.kind(stmt.last), TokenKind::Inc | TokenKind::Dec) {
            return StmtKind::Assign;
        }
        if top.iter().any(|&i| {
            matches!(
                self.tokens[i].kind,
                TokenKind::Define | TokenKind::Asn | TokenKind::OpAsn
            )
        }) {
            return StmtKind::Assign;
        }
        if top
            .iter()
            .any(|&i| i != stmt.first && self.tokens[i].kind == TokenKind::Arrow)
        {
            return StmtKind::Send;
        }
        if self.kind(stmt.last) == TokenKind::RParen {
            if let Some(open) = self.call_open(stmt) {
                if open > stmt.first && self.is_callee(stmt.first, open - 1) {
                    return StmtKind::Call {
                        callee: self.span_of(stmt.first, open - 1),
                    };
                }
            }
        }
        StmtKind::Expr
    }

    /// `func (r T) Name(` as opposed to a function literal `func(x int) ...`.
    fn is_method_decl(&self, func: usize) -> bool {
        match self.matching(func + 1) {
            Some(close) => {
                self.kind(close + 1) == TokenKind::Ident
                    && matches!(
                        self.kind(close + 2),
                        TokenKind::LParen | TokenKind::LSquare
                    )
            }
            None => false,
        }
    }

    /// The `(` whose matching `)` ends the statement.
    fn call_open(&self, stmt: &Statement) -> Option<usize> {
        let mut depth = 0usize;
        for i in (stmt.first..=stmt.last).rev() {
            let kind = self.tokens[i].kind;
            if kind.closes() {
                depth += 1;
            } else if kind.opens() {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// An operand chain: names, selectors, index and call groups, no operators.
    fn is_callee(&self, first: usize, last: usize) -> bool {
        let mut depth = 0usize;
        for i in first..=last {
            let kind = self.tokens[i].kind;
            if kind.closes() {
                depth = depth.saturating_sub(1);
                continue;
            }
            if kind.opens() {
                depth += 1;
                continue;
            }
            if depth > 0 {
                continue;
            }
            match kind {
                TokenKind::Ident
                | TokenKind::Dot
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Func => {}
                TokenKind::Op if self.token_text(i) == "*" && i == first => {}
                _ => return false,
            }
        }
        true
    }

    /// Assignment and declaration forms of one statement, in source order.
    pub fn bindings(&self, stmt: &Statement) -> Vec<Binding> {
        let first = self.tokens[stmt.first].kind;
        match first {
            TokenKind::Var | TokenKind::Const => {
                if self.kind(stmt.first + 1) == TokenKind::LParen {
                    let close = match self.matching(stmt.first + 1) {
                        Some(close) => close,
                        None => return Vec::new(),
                    };
                    self.statements(stmt.first + 2..close)
                        .iter()
                        .flat_map(|spec| self.value_spec(spec.first, spec.last))
                        .collect()
                } else {
                    self.value_spec(stmt.first + 1, stmt.last)
                }
            }
            _ => self.assignment(stmt),
        }
    }

    /// `a, b T = x, y` inside a `var`/`const` declaration.
    fn value_spec(&self, first: usize, last: usize) -> Vec<Binding> {
        let mut names = Vec::new();
        let mut i = first;
        while i <= last && self.kind(i) == TokenKind::Ident {
            names.push(i);
            if self.kind(i + 1) == TokenKind::Comma {
                i += 2;
            } else {
                break;
            }
        }
        let asn = (first..=last).find(|&i| {
            self.tokens[i].kind == TokenKind::Asn && self.depth_at(first, i) == 0
        });
        let rhs = asn.and_then(|a| (a < last).then(|| (a + 1, last)));
        self.pair(&names, rhs, true)
    }

    fn assignment(&self, stmt: &Statement) -> Vec<Binding> {
        let top = self.top_level(stmt);
        let op = top.iter().copied().find(|&i| {
            matches!(
                self.tokens[i].kind,
                TokenKind::Define | TokenKind::Asn | TokenKind::OpAsn
            )
        });
        let op = match op {
            Some(op) => op,
            None => return Vec::new(),
        };
        let kind = self.tokens[op].kind;
        if kind == TokenKind::OpAsn {
            return Vec::new();
        }
        // Only plain names on the left: `a.b = x` and `m[k] = v` mutate, they do not bind.
        let mut names = Vec::new();
        let mut i = stmt.first;
        while i < op {
            if self.kind(i) != TokenKind::Ident {
                return Vec::new();
            }
            names.push(i);
            match self.kind(i + 1) {
                TokenKind::Comma => i += 2,
                _ if i + 1 == op => break,
                _ => return Vec::new(),
            }
        }
        let rhs = (op < stmt.last).then(|| (op + 1, stmt.last));
        self.pair(&names, rhs, kind == TokenKind::Define)
    }

    fn pair(&self, names: &[usize], rhs: Option<(usize, usize)>, define: bool) -> Vec<Binding> {
        let (values, rhs_span) = match rhs {
            Some((first, last)) => (self.split_commas(first, last), Some(self.span_of(first, last))),
            None => (Vec::new(), None),
        };
        names
            .iter()
            .enumerate()
            .map(|(n, &i)| {
                let value = (values.len() == names.len())
                    .then(|| values[n])
                    .map(|(a, b)| self.span_of(a, b));
                Binding {
                    name: self.tokens[i].text.clone(),
                    pos: self.tokens[i].pos.pos,
                    value,
                    rhs: rhs_span,
                    define,
                }
            })
            .collect()
    }

    fn split_commas(&self, first: usize, last: usize) -> Vec<(usize, usize)> {
        let mut parts = Vec::new();
        let mut depth = 0usize;
        let mut start = first;
        for i in first..=last {
            let kind = self.tokens[i].kind;
            if kind.opens() {
                depth += 1;
            } else if kind.closes() {
                depth = depth.saturating_sub(1);
            } else if kind == TokenKind::Comma && depth == 0 {
                if i > start {
                    parts.push((start, i - 1));
                }
                start = i + 1;
            }
        }
        if start <= last {
            parts.push((start, last));
        }
        parts
    }

    fn depth_at(&self, first: usize, idx: usize) -> usize {
        let mut depth = 0usize;
        for i in first..idx {
            let kind = self.tokens[i].kind;
            if kind.opens() {
                depth += 1;
            } else if kind.closes() {
                depth = depth.saturating_sub(1);
            }
        }
        depth
    }

    /// Top-level `func` declarations with their declared result count.
    pub fn func_decls(&self) -> Vec<FuncDecl> {
        self.all_statements()
            .iter()
            .filter(|s| self.kind(s.first) == TokenKind::Func)
            .filter_map(|s| self.func_decl(s))
            .collect()
    }

    fn func_decl(&self, stmt: &Statement) -> Option<FuncDecl> {
        let mut i = stmt.first + 1;
        let receiver = self.kind(i) == TokenKind::LParen;
        if receiver {
            i = self.matching(i)? + 1;
        }
        if self.kind(i) != TokenKind::Ident {
            return None;
        }
        let name = self.token_text(i).to_string();
        let mut params = i + 1;
        if self.kind(params) == TokenKind::LSquare {
            params = self.matching(params)? + 1;
        }
        if self.kind(params) != TokenKind::LParen {
            return None;
        }
        let after = self.matching(params)? + 1;
        Some(FuncDecl {
            name,
            receiver,
            results: self.result_count(after),
            span: stmt.span,
        })
    }

    /// Result count of a signature whose parameter list ends just before `at`.
    pub fn result_count(&self, at: usize) -> usize {
        match self.kind(at) {
            TokenKind::LBrace | TokenKind::Semi | TokenKind::EOF | TokenKind::RParen => 0,
            TokenKind::LParen => {
                let close = match self.matching(at) {
                    Some(close) => close,
                    None => return 0,
                };
                if close == at + 1 {
                    return 0;
                }
                let groups = self.split_commas(at + 1, close - 1);
                // `(a, b int)` names two results, `(int, error)` lists two types.
                groups.len()
            }
            _ => 1,
        }
    }

    /// Names of top-level entry-point closures bound as `name := func(...) R {`.
    pub fn closure_arity(&self, stmt: &Statement) -> Option<(String, usize)> {
        let bindings = self.assignment(stmt);
        let binding = bindings.first()?;
        let value = binding.value?;
        let func = (stmt.first..=stmt.last).find(|&i| self.tokens[i].pos.pos == value.start)?;
        if self.kind(func) != TokenKind::Func || self.kind(func + 1) != TokenKind::LParen {
            return None;
        }
        let after = self.matching(func + 1)? + 1;
        Some((binding.name.clone(), self.result_count(after)))
    }

    /// True when the identifier occurs as a token inside `span`.
    pub fn mentions(&self, span: Span, name: &str) -> bool {
        self.tokens
            .iter()
            .filter(|t| t.pos.pos >= span.start && t.pos.end() <= span.end)
            .any(|t| t.is_ident(name))
    }

    pub fn mentions_anywhere(&self, name: &str) -> bool {
        self.tokens.iter().any(|t| t.is_ident(name))
    }
}

/// Identifier tokens of an arbitrary text line.
pub fn identifiers(line: &str) -> Vec<String> {
    tokenize(line)
        .into_iter()
        .filter(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text)
        .collect()
}

/// True when the span's text is a function literal `func(...) ... { ... }`.
pub fn is_func_literal(text: &str) -> bool {
    let tokens = tokenize(text);
    let meaningful: Vec<&Token> = tokens
        .iter()
        .filter(|t| !matches!(t.kind, TokenKind::EOF) && !t.is_inserted_semi())
        .collect();
    matches!(meaningful.first(), Some(t) if t.kind == TokenKind::Func)
        && matches!(meaningful.get(1), Some(t) if t.kind == TokenKind::LParen)
        && matches!(meaningful.last(), Some(t) if t.kind == TokenKind::RBrace)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "package main\n\nimport \"fmt\"\n\nfunc add(a, b int) int { return a + b }\n\nfunc main() {\n\tx := 1; y := add(x, 2)\n\tif x > 0 {\n\t\tz := 3\n\t\t_ = z\n\t}\n\tfmt.Println(y)\n}\n";

    #[test]
    fn test_entry_point() {
        let view = SourceView::new(PROGRAM);
        let entry = view.entry_point().unwrap();
        assert_eq!(&PROGRAM[entry.body_end..], "}\n");
        assert!(PROGRAM[..entry.body_start].ends_with("func main() {"));
    }

    #[test]
    fn test_missing_entry_point() {
        let view = SourceView::new("package main\n\nfunc helper() {}\n");
        assert!(view.entry_point().is_none());
    }

    #[test]
    fn test_body_statements() {
        let view = SourceView::new(PROGRAM);
        let entry = view.entry_point().unwrap();
        let stmts: Vec<&str> = view
            .body_statements(&entry)
            .iter()
            .map(|s| view.slice(s.span))
            .collect();
        assert_eq!(
            stmts,
            vec![
                "x := 1",
                "y := add(x, 2)",
                "if x > 0 {\n\t\tz := 3\n\t\t_ = z\n\t}",
                "fmt.Println(y)",
            ]
        );
    }

    #[test]
    fn test_header_semicolons() {
        let code = "for i := 0; i < 3; i++ {\n\ts += i\n}\nif v := f(); v > 0 {\n} else if w := g(); w {\n}\nn := s";
        let view = SourceView::new(code);
        let stmts: Vec<&str> = view
            .all_statements()
            .iter()
            .map(|s| view.slice(s.span))
            .collect();
        assert_eq!(stmts.len(), 3);
        assert!(stmts[0].starts_with("for i := 0;"));
        assert!(stmts[1].ends_with("w {\n}"));
        assert_eq!(stmts[2], "n := s");
    }

    fn kind_of(code: &str) -> StmtKind {
        let view = SourceView::new(code);
        let stmts = view.all_statements();
        match stmts.first() {
            Some(stmt) => view.classify(stmt),
            None => StmtKind::Empty,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(kind_of(""), StmtKind::Empty);
        assert_eq!(kind_of("fmt.Printf(\"%d\", 1)"), StmtKind::Display);
        assert_eq!(kind_of("a := 1"), StmtKind::Assign);
        assert_eq!(kind_of("a, b = b, a"), StmtKind::Assign);
        assert_eq!(kind_of("m[\"k\"] = f(1)"), StmtKind::Assign);
        assert_eq!(kind_of("i++"), StmtKind::Assign);
        assert_eq!(kind_of("n += 2"), StmtKind::Assign);
        assert_eq!(kind_of("ch <- 1"), StmtKind::Send);
        assert_eq!(kind_of("var a = 1"), StmtKind::Decl);
        assert_eq!(kind_of("func f() int { return 1 }"), StmtKind::Decl);
        assert_eq!(kind_of("func (p *P) Name() string { return \"\" }"), StmtKind::Decl);
        assert_eq!(kind_of("for i := 0; i < 3; i++ {}"), StmtKind::Control);
        assert_eq!(kind_of("defer f()"), StmtKind::Control);
        assert_eq!(kind_of("outer:"), StmtKind::Control);
        assert_eq!(kind_of("a + 1"), StmtKind::Expr);
        assert_eq!(kind_of("a"), StmtKind::Expr);
        assert_eq!(kind_of("<-ch"), StmtKind::Expr);
    }

    #[test]
    fn test_classify_call() {
        let code = "strings.Repeat(\"a\", 3)";
        match kind_of(code) {
            StmtKind::Call { callee } => assert_eq!(callee.slice(code), "strings.Repeat"),
            other => panic!("unexpected {:?}", other),
        }
        let code = "xs[0](1)";
        match kind_of(code) {
            StmtKind::Call { callee } => assert_eq!(callee.slice(code), "xs[0]"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(kind_of("f(1) + g(2)"), StmtKind::Expr);
    }

    #[test]
    fn test_bindings() {
        let code = "a, b := 1, f(2)";
        let view = SourceView::new(code);
        let stmt = &view.all_statements()[0];
        let bindings = view.bindings(stmt);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].name, "a");
        assert!(bindings[0].define);
        assert_eq!(bindings[1].value.unwrap().slice(code), "f(2)");

        let code = "v, ok := m[k]";
        let view = SourceView::new(code);
        let bindings = view.bindings(&view.all_statements()[0]);
        assert_eq!(bindings.len(), 2);
        assert!(bindings[0].value.is_none());
        assert_eq!(bindings[0].rhs.unwrap().slice(code), "m[k]");

        let code = "var (\n\tx int = 3\n\ty = \"s\"\n)";
        let view = SourceView::new(code);
        let names: Vec<String> = view
            .bindings(&view.all_statements()[0])
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["x", "y"]);

        let view = SourceView::new("p.x = 3");
        assert!(view.bindings(&view.all_statements()[0]).is_empty());
    }

    #[test]
    fn test_func_decls() {
        let code = "func a() {}\nfunc b() int { return 1 }\nfunc c() (int, error) { return 0, nil }\nfunc (s S) d(x int) (n, m int) { return }\nfunc e[T any](v T) T { return v }\n";
        let view = SourceView::new(code);
        let decls: Vec<(String, bool, usize)> = view
            .func_decls()
            .into_iter()
            .map(|d| (d.name, d.receiver, d.results))
            .collect();
        assert_eq!(
            decls,
            vec![
                ("a".to_string(), false, 0),
                ("b".to_string(), false, 1),
                ("c".to_string(), false, 2),
                ("d".to_string(), true, 2),
                ("e".to_string(), false, 1),
            ]
        );
    }

    #[test]
    fn test_closure_arity() {
        let view = SourceView::new("sq := func(x int) int { return x * x }");
        let stmt = &view.all_statements()[0];
        assert_eq!(view.closure_arity(stmt), Some(("sq".to_string(), 1)));
    }

    #[test]
    fn test_apply_edits() {
        let text = "abcdef";
        let out = apply_edits(
            text,
            vec![
                TextEdit::insert(0, ">"),
                TextEdit::replace(Span::new(2, 4), "XY"),
                TextEdit::delete(Span::new(5, 6)),
            ],
        );
        assert_eq!(out, ">abXYe");
    }

    #[test]
    fn test_func_literal() {
        assert!(is_func_literal("func(a int) int { return a }"));
        assert!(!is_func_literal("func(a int) int { return a }(3)"));
        assert!(!is_func_literal("f(1)"));
    }
}
