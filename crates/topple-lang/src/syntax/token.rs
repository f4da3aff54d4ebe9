#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Ident(String),

    // Keywords
    Fun,
    Return,
    If,
    Else,
    Loop,
    Break,
    Match,
    Enum,
    Draw,
    Update,
    Prototype,
    And,
    Or,
    Underscore, // bare `_`, the wildcard pattern

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    StarStar,   // **
    PlusPlus,   // ++
    MinusMinus, // --
    Eq,         // =
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    PercentEq,  // %=
    AmpEq,      // &=
    PipeEq,     // |=
    CaretEq,    // ^=
    EqEq,       // ==
    BangEq,     // !=
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    LtLt,       // <<
    GtGt,       // >>
    AmpAmp,     // &&
    PipePipe,   // ||
    Bang,       // !
    Tilde,      // ~
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    FatArrow,   // =>

    // Punctuation
    Colon,      // :
    Comma,      // ,
    Semicolon,  // ;
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    // Layout: kept by the lexer for tooling, dropped before parsing
    Newline,
    Foundation, // one per `#`
    Comment(String),

    Eof,
}

impl TokenKind {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Str(_) | Self::Bool(_) | Self::Null)
    }

    pub fn is_compound_assign(&self) -> bool {
        matches!(
            self,
            Self::PlusEq | Self::MinusEq | Self::StarEq | Self::SlashEq
            | Self::PercentEq | Self::AmpEq | Self::PipeEq | Self::CaretEq
        )
    }

    /// Tokens that never reach the parser.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Self::Newline | Self::Foundation | Self::Comment(_))
    }

    /// Keywords that can only begin a statement.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            Self::Fun | Self::Return | Self::If | Self::Loop | Self::Break
            | Self::Enum | Self::Draw | Self::Update
        )
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "fun"       => TokenKind::Fun,
        "return"    => TokenKind::Return,
        "if"        => TokenKind::If,
        "else"      => TokenKind::Else,
        "loop"      => TokenKind::Loop,
        "break"     => TokenKind::Break,
        "match"     => TokenKind::Match,
        "enum"      => TokenKind::Enum,
        "draw"      => TokenKind::Draw,
        "update"    => TokenKind::Update,
        "prototype" => TokenKind::Prototype,
        "and"       => TokenKind::And,
        "or"        => TokenKind::Or,
        "true"      => TokenKind::Bool(true),
        "false"     => TokenKind::Bool(false),
        "null"      => TokenKind::Null,
        "_"         => TokenKind::Underscore,
        _           => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text the token was read from.
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Self { kind, lexeme: lexeme.into(), line, column }
    }
}
