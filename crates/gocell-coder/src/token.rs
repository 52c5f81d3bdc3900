use std::fmt;
use strum_macros;

/// Location of a token inside the scanned text.
///
/// `pos` is a byte offset so spans can be sliced straight out of the
/// source; `line` and `col` are 1-based and only used for diagnostics.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
    pub pos: usize,
    pub len: usize,
}

impl Pos {
    pub fn end(&self) -> usize {
        self.pos + self.len
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TokenKind {
    // Literals
    Ident,
    Int,
    Float,
    Imag,
    Char,
    Str,
    RawStr,

    // Delimiters
    LParen,   // (
    RParen,   // )
    LSquare,  // [
    RSquare,  // ]
    LBrace,   // {
    RBrace,   // }
    Comma,    // ,
    Semi,     // ; or an inserted newline
    Dot,      // .
    Ellipsis, // ...
    Colon,    // :

    // Assignment family
    Define, // :=
    Asn,    // =
    OpAsn,  // += -= *= /= %= &= |= ^= <<= >>= &^=
    Inc,    // ++
    Dec,    // --

    Arrow, // <-
    Op,    // any other operator, kept verbatim in the token text

    // Keywords
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    EOF,
}

impl TokenKind {
    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "chan" => TokenKind::Chan,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "defer" => TokenKind::Defer,
            "else" => TokenKind::Else,
            "fallthrough" => TokenKind::Fallthrough,
            "for" => TokenKind::For,
            "func" => TokenKind::Func,
            "go" => TokenKind::Go,
            "goto" => TokenKind::Goto,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "interface" => TokenKind::Interface,
            "map" => TokenKind::Map,
            "package" => TokenKind::Package,
            "range" => TokenKind::Range,
            "return" => TokenKind::Return,
            "select" => TokenKind::Select,
            "struct" => TokenKind::Struct,
            "switch" => TokenKind::Switch,
            "type" => TokenKind::Type,
            "var" => TokenKind::Var,
            _ => return None,
        };
        Some(kind)
    }

    /// Tokens after which a newline terminates the statement.
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Imag
                | TokenKind::Char
                | TokenKind::Str
                | TokenKind::RawStr
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RSquare
                | TokenKind::RBrace
        )
    }

    pub fn opens(&self) -> bool {
        matches!(self, TokenKind::LParen | TokenKind::LSquare | TokenKind::LBrace)
    }

    pub fn closes(&self) -> bool {
        matches!(self, TokenKind::RParen | TokenKind::RSquare | TokenKind::RBrace)
    }

    /// Statement-level keywords that introduce control flow.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            TokenKind::If
                | TokenKind::For
                | TokenKind::Switch
                | TokenKind::Select
                | TokenKind::Go
                | TokenKind::Defer
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Goto
                | TokenKind::Fallthrough
                | TokenKind::Else
                | TokenKind::Case
                | TokenKind::Default
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
    pub text: String,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            TokenKind::Semi if self.text == "\n" => write!(f, "<nl>"),
            TokenKind::Semi => write!(f, "<;>"),
            TokenKind::LParen => write!(f, "<(>"),
            TokenKind::RParen => write!(f, "<)>"),
            TokenKind::LSquare => write!(f, "<[>"),
            TokenKind::RSquare => write!(f, "<]>"),
            TokenKind::LBrace => write!(f, "<{{>"),
            TokenKind::RBrace => write!(f, "<}}>"),
            TokenKind::Comma => write!(f, "<,>"),
            TokenKind::Dot => write!(f, "<.>"),
            TokenKind::Define => write!(f, "<:=>"),
            TokenKind::Asn => write!(f, "<=>"),
            TokenKind::EOF => write!(f, "<eof>"),
            TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Imag
            | TokenKind::Char
            | TokenKind::Str
            | TokenKind::RawStr
            | TokenKind::Op
            | TokenKind::OpAsn => write!(f, "<{}:{}>", self.kind, self.text),
            _ => write!(f, "<{}>", self.kind),
        }
    }
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos, text: impl Into<String>) -> Self {
        Token {
            kind,
            pos,
            text: text.into(),
        }
    }

    pub fn eof(pos: Pos) -> Self {
        Token::new(TokenKind::EOF, pos, "")
    }

    /// Semicolon produced by a line break rather than written by the user.
    pub fn is_inserted_semi(&self) -> bool {
        self.kind == TokenKind::Semi && self.text == "\n"
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == name
    }
}
