use thiserror::Error as ThisError;

/// Error codes prefixed by phase: L = lexer, P = parser, R = runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unterminated string literal
    L002, // unexpected character

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // invalid assignment target
    P004, // invalid increment/decrement target
    P005, // positional argument after keyword argument

    // Runtime
    R001, // undefined variable
    R002, // value is not callable
    R003, // index or member access on unsupported value
    R004, // operand type mismatch
    R005, // unknown keyword argument
    R006, // non-exhaustive match
    R007, // break outside loop
    R008, // return outside function
    R009, // index out of bounds
    R010, // bad native argument
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
            Self::P005 => "P005",
            Self::R001 => "R001",
            Self::R002 => "R002",
            Self::R003 => "R003",
            Self::R004 => "R004",
            Self::R005 => "R005",
            Self::R006 => "R006",
            Self::R007 => "R007",
            Self::R008 => "R008",
            Self::R009 => "R009",
            Self::R010 => "R010",
        }
    }

    pub fn is_lexical(&self) -> bool { self.as_str().starts_with('L') }
    pub fn is_syntactic(&self) -> bool { self.as_str().starts_with('P') }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexing or parsing error, positioned in the processed (post-fall) source.
#[derive(Debug, Clone, ThisError)]
#[error("[{code}] {line}:{column}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, ThisError)]
#[error("[runtime {code}] line {line}: {message}")]
pub struct RuntimeError {
    pub code: ErrorCode,
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new(code: ErrorCode, line: usize, message: impl Into<String>) -> Self {
        Self { code, line, message: message.into() }
    }
}
