use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self { source: source.chars().collect(), pos: 0, line: 1, column: 1 }
    }

    /// Produces every token including newlines, foundations and comments.
    /// Bad characters are collected so tooling can report all of them at once.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Error>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, "", self.line, self.column));
                break;
            }

            match self.next_token() {
                Ok(tok) => tokens.push(tok),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn next_token(&mut self) -> Result<Token, Error> {
        let line = self.line;
        let col = self.column;
        let start = self.pos;
        let ch = self.advance();

        let kind = match ch {
            '\n' => TokenKind::Newline,
            '#'  => TokenKind::Foundation,

            '+' => {
                if self.matches('+') { TokenKind::PlusPlus }
                else if self.matches('=') { TokenKind::PlusEq }
                else { TokenKind::Plus }
            }
            '-' => {
                if self.matches('-') { TokenKind::MinusMinus }
                else if self.matches('=') { TokenKind::MinusEq }
                else { TokenKind::Minus }
            }
            '*' => {
                if self.matches('*') { TokenKind::StarStar }
                else if self.matches('=') { TokenKind::StarEq }
                else { TokenKind::Star }
            }
            '/' => {
                if self.peek() == '/' {
                    self.skip_line();
                    let text: String = self.source[start + 2..self.pos].iter().collect();
                    TokenKind::Comment(text)
                }
                else if self.matches('=') { TokenKind::SlashEq }
                else { TokenKind::Slash }
            }
            '%' => if self.matches('=') { TokenKind::PercentEq } else { TokenKind::Percent },
            '=' => {
                if self.matches('=') { TokenKind::EqEq }
                else if self.matches('>') { TokenKind::FatArrow }
                else { TokenKind::Eq }
            }
            '!' => if self.matches('=') { TokenKind::BangEq } else { TokenKind::Bang },
            '<' => {
                if self.matches('<') { TokenKind::LtLt }
                else if self.matches('=') { TokenKind::LtEq }
                else { TokenKind::Lt }
            }
            '>' => {
                if self.matches('>') { TokenKind::GtGt }
                else if self.matches('=') { TokenKind::GtEq }
                else { TokenKind::Gt }
            }
            '&' => {
                if self.matches('&') { TokenKind::AmpAmp }
                else if self.matches('=') { TokenKind::AmpEq }
                else { TokenKind::Amp }
            }
            '|' => {
                if self.matches('|') { TokenKind::PipePipe }
                else if self.matches('=') { TokenKind::PipeEq }
                else { TokenKind::Pipe }
            }
            '^' => if self.matches('=') { TokenKind::CaretEq } else { TokenKind::Caret },
            '~' => TokenKind::Tilde,

            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,

            '"' => TokenKind::Str(self.read_string(line, col)?),
            '0'..='9' => TokenKind::Number(self.read_number(ch)),
            'a'..='z' | 'A'..='Z' | '_' => keyword_or_ident(self.read_ident(ch)),

            other => {
                return Err(Error::new(ErrorCode::L002, line, col,
                    format!("unexpected character `{other}`")));
            }
        };

        let lexeme: String = self.source[start..self.pos].iter().collect();
        Ok(Token::new(kind, lexeme, line, col))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> char {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == '\n' { self.line += 1; self.column = 1; }
        else { self.column += 1; }
        ch
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() == expected { self.advance(); true } else { false }
    }

    fn peek(&self) -> char {
        if self.is_at_end() { '\0' } else { self.source[self.pos] }
    }

    fn peek_next(&self) -> char {
        self.source.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Newlines are tokens, so only horizontal blanks are skipped.
    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), ' ' | '\t' | '\r') && !self.is_at_end() {
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' { self.advance(); }
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    /// No escape processing: everything up to the closing quote is literal.
    fn read_string(&mut self, start_line: usize, start_col: usize) -> Result<String, Error> {
        let mut s = String::new();
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(Error::new(ErrorCode::L001, start_line, start_col,
                    format!("unterminated string literal starting on line {start_line}")));
            }
            let ch = self.advance();
            if ch == '"' { break; }
            s.push(ch);
        }
        Ok(s)
    }

    fn read_number(&mut self, first: char) -> f64 {
        if first == '0' {
            if matches!(self.peek(), 'x' | 'X') && self.peek_next().is_ascii_hexdigit() {
                self.advance();
                return self.read_radix(16);
            }
            if matches!(self.peek(), 'b' | 'B') && matches!(self.peek_next(), '0' | '1') {
                self.advance();
                return self.read_radix(2);
            }
        }

        let mut s = String::new();
        s.push(first);
        while self.peek().is_ascii_digit() {
            s.push(self.advance());
        }
        // consume decimal only if followed by at least one digit
        // (keeps `xs[0].length` and `1..` out of the number)
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            s.push(self.advance());
            while self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
        }
        if matches!(self.peek(), 'e' | 'E') {
            let sign = matches!(self.peek_next(), '+' | '-');
            let digit_at = if sign { self.pos + 2 } else { self.pos + 1 };
            if self.source.get(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                s.push(self.advance());
                if sign { s.push(self.advance()); }
                while self.peek().is_ascii_digit() {
                    s.push(self.advance());
                }
            }
        }
        s.parse().unwrap_or(0.0)
    }

    fn read_radix(&mut self, radix: u32) -> f64 {
        let mut value = 0.0;
        while let Some(d) = self.peek().to_digit(radix) {
            self.advance();
            value = value * radix as f64 + d as f64;
        }
        value
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            s.push(self.advance());
        }
        s
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn lex_err(src: &str) -> Vec<Error> {
        Lexer::new(src).tokenize().unwrap_err()
    }

    #[test]
    fn empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn scenario_assignment_over_foundation() {
        assert_eq!(
            lex("x = 10\n###"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Eq,
                TokenKind::Number(10.0),
                TokenKind::Newline,
                TokenKind::Foundation,
                TokenKind::Foundation,
                TokenKind::Foundation,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn decimal_numbers() {
        assert_eq!(lex("3.25"), vec![TokenKind::Number(3.25), TokenKind::Eof]);
        assert_eq!(lex("1e3"), vec![TokenKind::Number(1000.0), TokenKind::Eof]);
        assert_eq!(lex("2.5E-1"), vec![TokenKind::Number(0.25), TokenKind::Eof]);
    }

    #[test]
    fn exponent_needs_digits() {
        assert_eq!(
            lex("2e"),
            vec![TokenKind::Number(2.0), TokenKind::Ident("e".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn hex_and_binary_numbers() {
        assert_eq!(lex("0xff"), vec![TokenKind::Number(255.0), TokenKind::Eof]);
        assert_eq!(lex("0b101"), vec![TokenKind::Number(5.0), TokenKind::Eof]);
    }

    #[test]
    fn dot_not_consumed_by_number() {
        assert_eq!(
            lex("xs[0].length"),
            vec![
                TokenKind::Ident("xs".into()), TokenKind::LBracket, TokenKind::Number(0.0),
                TokenKind::RBracket, TokenKind::Dot, TokenKind::Ident("length".into()), TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords() {
        assert_eq!(lex("fun"),       vec![TokenKind::Fun,       TokenKind::Eof]);
        assert_eq!(lex("loop"),      vec![TokenKind::Loop,      TokenKind::Eof]);
        assert_eq!(lex("match"),     vec![TokenKind::Match,     TokenKind::Eof]);
        assert_eq!(lex("enum"),      vec![TokenKind::Enum,      TokenKind::Eof]);
        assert_eq!(lex("prototype"), vec![TokenKind::Prototype, TokenKind::Eof]);
        assert_eq!(lex("null"),      vec![TokenKind::Null,      TokenKind::Eof]);
        assert_eq!(lex("and or"),    vec![TokenKind::And, TokenKind::Or, TokenKind::Eof]);
    }

    #[test]
    fn underscore_is_wildcard_not_ident() {
        assert_eq!(lex("_"), vec![TokenKind::Underscore, TokenKind::Eof]);
        assert_eq!(lex("_x"), vec![TokenKind::Ident("_x".into()), TokenKind::Eof]);
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(lex("+ ++ +="), vec![TokenKind::Plus, TokenKind::PlusPlus, TokenKind::PlusEq, TokenKind::Eof]);
        assert_eq!(lex("* ** *="), vec![TokenKind::Star, TokenKind::StarStar, TokenKind::StarEq, TokenKind::Eof]);
        assert_eq!(lex("= == =>"), vec![TokenKind::Eq, TokenKind::EqEq, TokenKind::FatArrow, TokenKind::Eof]);
        assert_eq!(lex("& && &="), vec![TokenKind::Amp, TokenKind::AmpAmp, TokenKind::AmpEq, TokenKind::Eof]);
        assert_eq!(lex("| || |="), vec![TokenKind::Pipe, TokenKind::PipePipe, TokenKind::PipeEq, TokenKind::Eof]);
        assert_eq!(lex("< << <="), vec![TokenKind::Lt, TokenKind::LtLt, TokenKind::LtEq, TokenKind::Eof]);
        assert_eq!(lex("> >> >="), vec![TokenKind::Gt, TokenKind::GtGt, TokenKind::GtEq, TokenKind::Eof]);
        assert_eq!(lex("^ ^= ~ !"), vec![TokenKind::Caret, TokenKind::CaretEq, TokenKind::Tilde, TokenKind::Bang, TokenKind::Eof]);
    }

    #[test]
    fn comment_token_keeps_text() {
        assert_eq!(
            lex("// hello\n1"),
            vec![TokenKind::Comment(" hello".into()), TokenKind::Newline, TokenKind::Number(1.0), TokenKind::Eof]
        );
    }

    #[test]
    fn string_has_no_escapes() {
        assert_eq!(lex(r#""a\nb""#), vec![TokenKind::Str(r"a\nb".into()), TokenKind::Eof]);
    }

    #[test]
    fn hash_inside_string_is_not_foundation() {
        assert_eq!(lex("\"#f00\""), vec![TokenKind::Str("#f00".into()), TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_reports_start_line() {
        let errs = lex_err("x\n  \"oops");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L001);
        assert_eq!(errs[0].line, 2);
        assert_eq!(errs[0].column, 3);
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let errs = lex_err("x @ y $");
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().all(|e| e.code == ErrorCode::L002));
    }

    #[test]
    fn line_and_column_tracking() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn lexeme_is_source_text() {
        let tokens = Lexer::new("0x1F \"s\"").tokenize().unwrap();
        assert_eq!(tokens[0].lexeme, "0x1F");
        assert_eq!(tokens[1].lexeme, "\"s\"");
    }

    #[test]
    fn token_kind_helpers() {
        assert!(TokenKind::Number(1.0).is_literal());
        assert!(TokenKind::CaretEq.is_compound_assign());
        assert!(TokenKind::Foundation.is_trivia());
        assert!(TokenKind::Loop.starts_statement());
        assert!(!TokenKind::Ident("x".into()).starts_statement());
    }
}
