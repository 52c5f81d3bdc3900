use crate::token::{Pos, Token, TokenKind};
use std::iter::Peekable;
use std::str::CharIndices;

/// Go tokenizer.
///
/// Comments are dropped, and a `Semi` token with text `"\n"` is emitted
/// wherever Go's automatic semicolon rule would insert one, so callers can
/// split statements without caring about line structure.
pub struct Lexer<'a> {
    code: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    col: usize,
    last: Option<TokenKind>,
}

const OPERATORS: [&str; 25] = [
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^",
];

impl<'a> Lexer<'a> {
    pub fn new(code: &'a str) -> Self {
        Lexer {
            code,
            chars: code.char_indices().peekable(),
            line: 1,
            col: 1,
            last: None,
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.code.len())
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn token(&self, kind: TokenKind, start: usize, line: usize, col: usize) -> Token {
        let end = self.chars_offset();
        let pos = Pos {
            line,
            col,
            pos: start,
            len: end - start,
        };
        Token::new(kind, pos, &self.code[start..end])
    }

    fn chars_offset(&self) -> usize {
        let mut probe = self.chars.clone();
        probe.peek().map(|(i, _)| *i).unwrap_or(self.code.len())
    }

    fn inserted_semi(&self, at: usize) -> Token {
        let pos = Pos {
            line: self.line,
            col: self.col,
            pos: at,
            len: 0,
        };
        Token::new(TokenKind::Semi, pos, "\n")
    }

    fn wants_semi(&self) -> bool {
        self.last.map(|k| k.ends_statement()).unwrap_or(false)
    }
}

// Lexer methods for the individual token classes
impl<'a> Lexer<'a> {
    fn identifier(&mut self) -> Token {
        let (start, line, col) = (self.offset(), self.line, self.col);
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.code[start..self.chars_offset()];
        let kind = TokenKind::keyword(text).unwrap_or(TokenKind::Ident);
        self.token(kind, start, line, col)
    }

    fn number(&mut self) -> Token {
        let (start, line, col) = (self.offset(), self.line, self.col);
        let mut kind = TokenKind::Int;
        let mut prev = ' ';
        let hex = self.code[start..].starts_with("0x") || self.code[start..].starts_with("0X");
        while let Some(c) = self.peek_char() {
            let exponent = if hex { matches!(prev, 'p' | 'P') } else { matches!(prev, 'e' | 'E') };
            let exponent_sign = (c == '+' || c == '-') && exponent;
            if c == '.' || exponent_sign {
                kind = TokenKind::Float;
            } else if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            prev = c;
            self.bump();
        }
        let text = &self.code[start..self.chars_offset()];
        if text.ends_with('i') {
            kind = TokenKind::Imag;
        } else if !hex && (text.contains('e') || text.contains('E')) {
            kind = TokenKind::Float;
        }
        self.token(kind, start, line, col)
    }

    fn quoted(&mut self, quote: char, kind: TokenKind) -> Token {
        let (start, line, col) = (self.offset(), self.line, self.col);
        self.bump(); // opening quote
        while let Some(c) = self.peek_char() {
            if c == '\n' && quote != '`' {
                break;
            }
            self.bump();
            if c == '\\' && quote != '`' {
                self.bump();
            } else if c == quote {
                break;
            }
        }
        self.token(kind, start, line, col)
    }

    fn operator(&mut self) -> Token {
        let (start, line, col) = (self.offset(), self.line, self.col);
        let code = self.code;
        let rest = &code[start..];
        let text = OPERATORS
            .iter()
            .find(|op| rest.starts_with(*op))
            .copied()
            .unwrap_or_else(|| {
                let len = rest.chars().next().map(|c| c.len_utf8()).unwrap_or(0);
                &rest[..len]
            });
        for _ in text.chars() {
            self.bump();
        }
        let kind = match text {
            "(" => TokenKind::LParen,
            ")" => TokenKind::RParen,
            "[" => TokenKind::LSquare,
            "]" => TokenKind::RSquare,
            "{" => TokenKind::LBrace,
            "}" => TokenKind::RBrace,
            "," => TokenKind::Comma,
            ";" => TokenKind::Semi,
            "." => TokenKind::Dot,
            "..." => TokenKind::Ellipsis,
            ":" => TokenKind::Colon,
            ":=" => TokenKind::Define,
            "=" => TokenKind::Asn,
            "++" => TokenKind::Inc,
            "--" => TokenKind::Dec,
            "<-" => TokenKind::Arrow,
            "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" | "&^=" => {
                TokenKind::OpAsn
            }
            _ => TokenKind::Op,
        };
        self.token(kind, start, line, col)
    }

    /// Skips a comment; returns true when it spanned a line break.
    fn comment(&mut self) -> bool {
        self.bump(); // '/'
        match self.bump() {
            Some('/') => {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
                false
            }
            _ => {
                let mut newline = false;
                let mut prev = ' ';
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        newline = true;
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                newline
            }
        }
    }

    fn starts_comment(&self) -> bool {
        let mut probe = self.chars.clone();
        matches!(probe.next(), Some((_, '/'))) && matches!(probe.next(), Some((_, '/' | '*')))
    }
}

impl<'a> Lexer<'a> {
    pub fn next(&mut self) -> Token {
        let token = self.next_step();
        if token.kind != TokenKind::EOF {
            self.last = Some(token.kind);
        }
        token
    }

    fn next_step(&mut self) -> Token {
        while let Some(c) = self.peek_char() {
            match c {
                '\n' => {
                    let at = self.offset();
                    if self.wants_semi() {
                        let semi = self.inserted_semi(at);
                        self.bump();
                        return semi;
                    }
                    self.bump();
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.starts_comment() => {
                    let at = self.offset();
                    if self.comment() && self.wants_semi() {
                        return self.inserted_semi(at);
                    }
                }
                '"' => return self.quoted('"', TokenKind::Str),
                '`' => return self.quoted('`', TokenKind::RawStr),
                '\'' => return self.quoted('\'', TokenKind::Char),
                c if c.is_alphabetic() || c == '_' => return self.identifier(),
                c if c.is_ascii_digit() => return self.number(),
                '.' => {
                    let mut probe = self.chars.clone();
                    probe.next();
                    if matches!(probe.peek(), Some((_, d)) if d.is_ascii_digit()) {
                        return self.number();
                    }
                    return self.operator();
                }
                _ => return self.operator(),
            }
        }
        let end = self.code.len();
        if self.wants_semi() {
            self.last = Some(TokenKind::Semi);
            return self.inserted_semi(end);
        }
        Token::eof(Pos {
            line: self.line,
            col: self.col,
            pos: end,
            len: 0,
        })
    }
}

/// Scans the whole text, the trailing EOF token included.
pub fn tokenize(code: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(code);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next();
        let done = token.kind == TokenKind::EOF;
        tokens.push(token);
        if done {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(code: &str) -> String {
        tokenize(code)
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("")
    }

    #[test]
    fn test_define() {
        assert_eq!(kinds("a := 1"), "<ident:a><:=><int:1><nl><eof>");
    }

    #[test]
    fn test_semicolon_insertion() {
        let code = "x := f(\n  1,\n)\ny++\nreturn";
        assert_eq!(
            kinds(code),
            "<ident:x><:=><ident:f><(><int:1><,><)><nl><ident:y><inc><nl><return><nl><eof>"
        );
    }

    #[test]
    fn test_comments_dropped() {
        let code = "a // note\n/* block\n */ b";
        assert_eq!(kinds(code), "<ident:a><nl><ident:b><nl><eof>");
    }

    #[test]
    fn test_strings() {
        let tokens = tokenize(r#"s := "a\"b" + `raw
line`"#);
        assert_eq!(tokens[2].kind, TokenKind::Str);
        assert_eq!(tokens[2].text, r#""a\"b""#);
        assert_eq!(tokens[4].kind, TokenKind::RawStr);
        assert_eq!(tokens[4].text, "`raw\nline`");
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("1.5e-3 0x1F 2i .5");
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].text, "1.5e-3");
        assert_eq!(tokens[1].kind, TokenKind::Int);
        assert_eq!(tokens[2].kind, TokenKind::Imag);
        assert_eq!(tokens[3].kind, TokenKind::Float);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a <<= 2; ch <- v; x &^ y"),
            "<ident:a><op_asn:<<=><int:2><;><ident:ch><arrow><ident:v><;><ident:x><op:&^><ident:y><nl><eof>"
        );
    }

    #[test]
    fn test_byte_offsets() {
        let code = "名 := \"é\"; b";
        let tokens = tokenize(code);
        for t in tokens.iter().filter(|t| t.pos.len > 0) {
            assert_eq!(&code[t.pos.pos..t.pos.end()], t.text);
        }
        assert_eq!(tokens[0].text, "名");
    }
}
