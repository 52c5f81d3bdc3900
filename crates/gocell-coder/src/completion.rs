use crate::session::DeclKind;

const GO_KEYWORDS: [&str; 25] = [
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range", "return",
    "select", "struct", "switch", "type", "var",
];

/// What a completion provider sees: the program the input would produce and
/// the cursor inside it, plus the session's names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub program: String,
    /// Byte offset of the cursor in `program`.
    pub offset: usize,
    /// Zero-based cursor line and column.
    pub line: usize,
    pub column: usize,
    /// Identifier characters directly before the cursor.
    pub prefix: String,
    pub captured_names: Vec<String>,
    pub declarations: Vec<(DeclKind, String)>,
}

impl CompletionRequest {
    pub fn new(
        program: String,
        offset: usize,
        captured_names: Vec<String>,
        declarations: Vec<(DeclKind, String)>,
    ) -> Self {
        let offset = offset.min(program.len());
        let before = &program[..offset];
        let line = before.matches('\n').count();
        let column = before.len() - before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let prefix: String = before
            .chars()
            .rev()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        CompletionRequest {
            program,
            offset,
            line,
            column,
            prefix,
            captured_names,
            declarations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    pub detail: String,
}

pub trait CompletionProvider {
    fn complete(&self, request: &CompletionRequest) -> Vec<CompletionItem>;
}

/// Offers session variables, accumulated declarations and Go keywords.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionCompletion;

impl CompletionProvider for SessionCompletion {
    fn complete(&self, request: &CompletionRequest) -> Vec<CompletionItem> {
        let prefix = request.prefix.as_str();
        if prefix.is_empty() {
            return Vec::new();
        }
        let mut items: Vec<CompletionItem> = Vec::new();
        let mut push = |label: &str, detail: &str| {
            if label.starts_with(prefix) && !items.iter().any(|i| i.label == label) {
                items.push(CompletionItem {
                    label: label.to_string(),
                    detail: detail.to_string(),
                });
            }
        };
        for name in &request.captured_names {
            push(name, "variable");
        }
        for (kind, name) in &request.declarations {
            let detail = match kind {
                DeclKind::Func => "func",
                DeclKind::Type => "type",
                DeclKind::Import => "package",
            };
            push(name, detail);
        }
        for keyword in GO_KEYWORDS {
            push(keyword, "keyword");
        }
        items
    }
}
