use std::rc::Rc;

use crate::syntax::ast::*;
use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind};

/// Recursive-descent parser. Newlines, foundations and comments are dropped up
/// front, so statement boundaries come from the grammar alone.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens: Vec<Token> = tokens.into_iter().filter(|t| !t.kind.is_trivia()).collect();
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let (line, column) = tokens.last().map(|t| (t.line, t.column)).unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, "", line, column));
        }
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Program, Vec<Error>> {
        let mut errors = Vec::new();
        let mut body = Vec::new();

        while !self.is_at_end() {
            let pos_before = self.pos;

            if self.matches(TokenKind::Semicolon) { continue; }
            match self.parse_stmt() {
                Ok(stmt) => body.push(fold_top_level(stmt)),
                Err(e) => { errors.push(e); self.recover(); }
            }

            // guarantee progress on unrecognised tokens
            if self.pos == pos_before {
                self.advance();
            }
        }

        if errors.is_empty() {
            Ok(Program { body })
        } else {
            Err(errors)
        }
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        let stmt = match self.peek_kind() {
            TokenKind::Fun    => self.parse_fn_decl()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::If     => self.parse_if()?,
            TokenKind::Loop   => self.parse_loop()?,
            TokenKind::Break  => {
                let span = self.span();
                self.advance();
                Stmt::Break(span)
            }
            TokenKind::Enum   => self.parse_enum()?,
            TokenKind::Draw   => self.parse_draw()?,
            TokenKind::Update => self.parse_update()?,
            TokenKind::LBrace => Stmt::Block(self.parse_block()?),
            _ => Stmt::Expr(self.parse_expr()?),
        };
        self.matches(TokenKind::Semicolon);
        Ok(stmt)
    }

    fn parse_block(&mut self) -> Result<Block, Error> {
        let span = self.span();
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.matches(TokenKind::Semicolon) { continue; }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Block { stmts, span })
    }

    fn parse_fn_decl(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Fun)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            params.push(self.expect_ident()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?.stmts;
        Ok(Stmt::FnDecl(Rc::new(FnDecl { name, params, body, span })))
    }

    fn parse_return(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Return)?;
        let kind = self.peek_kind();
        let bare = matches!(kind, TokenKind::RBrace | TokenKind::Semicolon | TokenKind::Eof)
            || kind.starts_statement();
        let value = if bare { None } else { Some(self.parse_expr()?) };
        Ok(Stmt::Return(value, span))
    }

    fn parse_if(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::If)?;
        let condition = self.parse_expr()?;
        let then_block = self.parse_block()?;
        let else_branch = if self.matches(TokenKind::Else) {
            if self.check(TokenKind::If) {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block()?)))
            }
        } else {
            None
        };
        Ok(Stmt::If(IfStmt { condition, then_block, else_branch, span }))
    }

    fn parse_loop(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Loop)?;
        let body = self.parse_block()?;
        Ok(Stmt::Loop(LoopStmt { body, span }))
    }

    fn parse_enum(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Enum)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;
        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let variant = self.expect_ident()?;
            let mut fields = Vec::new();
            if self.matches(TokenKind::LParen) {
                while !self.check(TokenKind::RParen) && !self.is_at_end() {
                    fields.push(self.expect_ident()?);
                    if !self.matches(TokenKind::Comma) { break; }
                }
                self.expect(TokenKind::RParen)?;
            }
            variants.push(VariantDecl { name: variant, fields });
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt::Enum(EnumDecl { name, variants, span }))
    }

    fn parse_draw(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Draw)?;
        let body = self.parse_block()?.stmts;
        Ok(Stmt::Draw(Rc::new(FrameBlock { param: None, body, span })))
    }

    fn parse_update(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Update)?;
        let param = if self.matches(TokenKind::LParen) {
            let name = self.expect_ident()?;
            self.expect(TokenKind::RParen)?;
            Some(name)
        } else {
            None
        };
        let body = self.parse_block()?.stmts;
        Ok(Stmt::Update(Rc::new(FrameBlock { param, body, span })))
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────

    pub(crate) fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, Error> {
        let target = self.parse_or()?;
        let op = match self.peek_kind() {
            TokenKind::Eq        => AssignOp::Assign,
            TokenKind::PlusEq    => AssignOp::Add,
            TokenKind::MinusEq   => AssignOp::Sub,
            TokenKind::StarEq    => AssignOp::Mul,
            TokenKind::SlashEq   => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Mod,
            TokenKind::AmpEq     => AssignOp::BitAnd,
            TokenKind::PipeEq    => AssignOp::BitOr,
            TokenKind::CaretEq   => AssignOp::BitXor,
            _ => return Ok(target),
        };
        let tok = self.advance();
        if !target.is_place() {
            return Err(Error::new(ErrorCode::P003, tok.line, tok.column,
                format!("invalid assignment target before `{}`", tok.lexeme)));
        }
        // right-associative: `a = b = c`
        let value = self.parse_assignment()?;
        let span = target.span();
        Ok(Expr::Assign { target: Box::new(target), op, value: Box::new(value), span })
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_and()?;
        while matches!(self.peek_kind(), TokenKind::PipePipe | TokenKind::Or) {
            let span = left.span();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Logical { left: Box::new(left), op: LogicalOp::Or, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_bit_or()?;
        while matches!(self.peek_kind(), TokenKind::AmpAmp | TokenKind::And) {
            let span = left.span();
            self.advance();
            let right = self.parse_bit_or()?;
            left = Expr::Logical { left: Box::new(left), op: LogicalOp::And, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_bit_or(&mut self) -> Result<Expr, Error> {
        self.parse_binary_level(Self::parse_bit_xor, |k| match k {
            TokenKind::Pipe => Some(BinOp::BitOr),
            _ => None,
        })
    }

    fn parse_bit_xor(&mut self) -> Result<Expr, Error> {
        self.parse_binary_level(Self::parse_bit_and, |k| match k {
            TokenKind::Caret => Some(BinOp::BitXor),
            _ => None,
        })
    }

    fn parse_bit_and(&mut self) -> Result<Expr, Error> {
        self.parse_binary_level(Self::parse_equality, |k| match k {
            TokenKind::Amp => Some(BinOp::BitAnd),
            _ => None,
        })
    }

    fn parse_equality(&mut self) -> Result<Expr, Error> {
        self.parse_binary_level(Self::parse_relational, |k| match k {
            TokenKind::EqEq   => Some(BinOp::Eq),
            TokenKind::BangEq => Some(BinOp::NotEq),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<Expr, Error> {
        self.parse_binary_level(Self::parse_shift, |k| match k {
            TokenKind::Lt   => Some(BinOp::Lt),
            TokenKind::LtEq => Some(BinOp::LtEq),
            TokenKind::Gt   => Some(BinOp::Gt),
            TokenKind::GtEq => Some(BinOp::GtEq),
            _ => None,
        })
    }

    fn parse_shift(&mut self) -> Result<Expr, Error> {
        self.parse_binary_level(Self::parse_additive, |k| match k {
            TokenKind::LtLt => Some(BinOp::Shl),
            TokenKind::GtGt => Some(BinOp::Shr),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, Error> {
        self.parse_binary_level(Self::parse_multiplicative, |k| match k {
            TokenKind::Plus  => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Error> {
        self.parse_binary_level(Self::parse_exponent, |k| match k {
            TokenKind::Star    => Some(BinOp::Mul),
            TokenKind::Slash   => Some(BinOp::Div),
            TokenKind::Percent => Some(BinOp::Mod),
            _ => None,
        })
    }

    /// One left-associative level: `next (op next)*`.
    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, Error>,
        op_for: fn(&TokenKind) -> Option<BinOp>,
    ) -> Result<Expr, Error> {
        let mut left = next(self)?;
        while let Some(op) = op_for(&self.peek_kind()) {
            let span = left.span();
            self.advance();
            let right = next(self)?;
            left = Expr::BinOp { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_exponent(&mut self) -> Result<Expr, Error> {
        let base = self.parse_unary()?;
        if self.matches(TokenKind::StarStar) {
            let span = base.span();
            // right-associative: `2 ** 3 ** 2` is `2 ** 9`
            let exponent = self.parse_exponent()?;
            return Ok(Expr::BinOp { left: Box::new(base), op: BinOp::Pow, right: Box::new(exponent), span });
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        let op = match self.peek_kind() {
            TokenKind::Bang  => Some(UnOp::Not),
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Tilde => Some(UnOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::UnOp { op, operand: Box::new(operand), span });
        }

        let update = match self.peek_kind() {
            TokenKind::PlusPlus   => Some(UpdateOp::Inc),
            TokenKind::MinusMinus => Some(UpdateOp::Dec),
            _ => None,
        };
        if let Some(op) = update {
            let tok = self.advance();
            let target = self.parse_unary()?;
            if !target.is_place() {
                return Err(Error::new(ErrorCode::P004, tok.line, tok.column,
                    format!("invalid operand for prefix `{}`", tok.lexeme)));
            }
            return Ok(Expr::Update { target: Box::new(target), op, prefix: true, span });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        let expr = self.parse_call_chain()?;
        let op = match self.peek_kind() {
            TokenKind::PlusPlus   => UpdateOp::Inc,
            TokenKind::MinusMinus => UpdateOp::Dec,
            _ => return Ok(expr),
        };
        let tok = self.advance();
        if !expr.is_place() {
            return Err(Error::new(ErrorCode::P004, tok.line, tok.column,
                format!("invalid operand for postfix `{}`", tok.lexeme)));
        }
        let span = expr.span();
        Ok(Expr::Update { target: Box::new(expr), op, prefix: false, span })
    }

    fn parse_call_chain(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    let span = expr.span();
                    self.advance();
                    let (args, named_args) = self.parse_call_args()?;
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::Call { callee: Box::new(expr), args, named_args, span };
                }

                TokenKind::Dot => {
                    let span = expr.span();
                    self.advance();
                    let property = self.expect_name()?;
                    expr = Expr::Member { object: Box::new(expr), property, span };
                }

                // index `xs[i]` or slice `xs[a:b]`, `xs[a:]`, `xs[:b]`, `xs[:]`
                TokenKind::LBracket => {
                    let span = expr.span();
                    self.advance();
                    if self.matches(TokenKind::Colon) {
                        let end = self.parse_slice_bound()?;
                        self.expect(TokenKind::RBracket)?;
                        expr = Expr::Slice { object: Box::new(expr), start: None, end, span };
                    } else {
                        let first = self.parse_expr()?;
                        if self.matches(TokenKind::Colon) {
                            let end = self.parse_slice_bound()?;
                            self.expect(TokenKind::RBracket)?;
                            expr = Expr::Slice { object: Box::new(expr), start: Some(Box::new(first)), end, span };
                        } else {
                            self.expect(TokenKind::RBracket)?;
                            expr = Expr::Index { object: Box::new(expr), index: Box::new(first), span };
                        }
                    }
                }

                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_slice_bound(&mut self) -> Result<Option<Box<Expr>>, Error> {
        if self.check(TokenKind::RBracket) {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.parse_expr()?)))
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        match tok.kind {
            TokenKind::Number(v) => { self.advance(); Ok(Expr::Number(v, span)) }
            TokenKind::Str(s)    => { self.advance(); Ok(Expr::Str(s, span)) }
            TokenKind::Bool(v)   => { self.advance(); Ok(Expr::Bool(v, span)) }
            TokenKind::Null      => { self.advance(); Ok(Expr::Null(span)) }
            TokenKind::Ident(s)  => { self.advance(); Ok(Expr::Ident(s, span)) }

            TokenKind::Prototype => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Prototype(span))
            }

            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(TokenKind::RBracket) && !self.is_at_end() {
                    items.push(self.parse_expr()?);
                    if !self.matches(TokenKind::Comma) { break; }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::Array(items, span))
            }

            TokenKind::LBrace => self.parse_object(),
            TokenKind::Match  => self.parse_match(),

            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_object(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let key = match self.peek_kind() {
                TokenKind::Str(s) => { self.advance(); s }
                _ => self.expect_name()?,
            };
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Object(entries, span))
    }

    // ─── Argument lists ──────────────────────────────────────────────────────

    /// Positional + keyword args: `rect(0, 0, 10, 10, color = "#fff")`.
    /// Keyword args must come after positional args.
    fn parse_call_args(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), Error> {
        let mut args = Vec::new();
        let mut named = Vec::new();

        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            // keyword arg: ident `=` expr (a `==` is a separate token)
            if let TokenKind::Ident(name) = self.peek_kind() {
                if self.peek_next_is(TokenKind::Eq) {
                    self.advance();
                    self.advance();
                    let val = self.parse_expr()?;
                    named.push((name, val));
                    if !self.matches(TokenKind::Comma) { break; }
                    continue;
                }
            }
            if !named.is_empty() {
                let tok = self.peek();
                return Err(Error::new(ErrorCode::P005, tok.line, tok.column,
                    "positional argument after keyword argument"));
            }
            args.push(self.parse_expr()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok((args, named))
    }

    // ─── Match ───────────────────────────────────────────────────────────────

    fn parse_match(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::Match)?;
        let subject = self.parse_expr()?;
        self.expect(TokenKind::LBrace)?;

        let mut arms = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let arm_span = self.span();
            let pattern = self.parse_pattern()?;
            self.expect(TokenKind::FatArrow)?;
            let body = if self.check(TokenKind::LBrace) && !self.is_object_literal_start() {
                ArmBody::Block(self.parse_block()?)
            } else {
                ArmBody::Expr(self.parse_expr()?)
            };
            arms.push(MatchArm { pattern, body, span: arm_span });
            while self.matches(TokenKind::Comma) || self.matches(TokenKind::Semicolon) {}
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Match(Box::new(MatchExpr { subject, arms, span })))
    }

    /// After `=>`, a `{` opens an object literal only when it is followed by
    /// `key :`. Empty braces, keywords and any other statement start open a block.
    fn is_object_literal_start(&self) -> bool {
        let key = self.tokens.get(self.pos + 1).map(|t| &t.kind);
        let colon = self.tokens.get(self.pos + 2).map(|t| &t.kind);
        matches!(key, Some(TokenKind::Ident(_)) | Some(TokenKind::Str(_)))
            && matches!(colon, Some(TokenKind::Colon))
    }

    fn parse_pattern(&mut self) -> Result<Pattern, Error> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        match tok.kind {
            TokenKind::Underscore => { self.advance(); Ok(Pattern::Wildcard(span)) }
            TokenKind::Number(n)  => { self.advance(); Ok(Pattern::Literal(Literal::Number(n), span)) }
            TokenKind::Str(s)     => { self.advance(); Ok(Pattern::Literal(Literal::Str(s), span)) }
            TokenKind::Bool(b)    => { self.advance(); Ok(Pattern::Literal(Literal::Bool(b), span)) }
            TokenKind::Null       => { self.advance(); Ok(Pattern::Literal(Literal::Null, span)) }

            TokenKind::Minus => {
                self.advance();
                match self.advance().kind {
                    TokenKind::Number(n) => Ok(Pattern::Literal(Literal::Number(-n), span)),
                    _ => Err(self.error_at(&tok, "expected number after `-` in pattern")),
                }
            }

            TokenKind::Ident(first) => {
                self.advance();
                let (enum_name, name) = if self.matches(TokenKind::Dot) {
                    (Some(first), self.expect_ident()?)
                } else {
                    (None, first)
                };
                if self.matches(TokenKind::LParen) {
                    let mut bindings = Vec::new();
                    while !self.check(TokenKind::RParen) && !self.is_at_end() {
                        if self.matches(TokenKind::Underscore) {
                            bindings.push("_".to_string());
                        } else {
                            bindings.push(self.expect_ident()?);
                        }
                        if !self.matches(TokenKind::Comma) { break; }
                    }
                    self.expect(TokenKind::RParen)?;
                    Ok(Pattern::Variant { enum_name, name, bindings, span })
                } else if enum_name.is_some() {
                    Ok(Pattern::Variant { enum_name, name, bindings: Vec::new(), span })
                } else {
                    Ok(Pattern::Binding(name, span))
                }
            }

            _ => Err(self.unexpected("pattern")),
        }
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn peek_next_is(&self, kind: TokenKind) -> bool {
        self.tokens.get(self.pos + 1).is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::new(
                ErrorCode::P002,
                tok.line,
                tok.column,
                format!("expected {:?}, found {:?}", kind, tok.kind),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Ident(s) => Ok(s),
            _ => Err(self.error_at(&tok, "expected identifier")),
        }
    }

    /// Property and object-key names may also be keywords: `p.draw`, `{ loop: 1 }`.
    fn expect_name(&mut self) -> Result<String, Error> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Ident(s) => Ok(s),
            _ if !tok.lexeme.is_empty() && tok.lexeme.chars().all(|c| c.is_ascii_alphabetic()) => {
                Ok(tok.lexeme)
            }
            _ => Err(self.error_at(&tok, "expected property name")),
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        Error::new(
            ErrorCode::P001,
            tok.line,
            tok.column,
            format!("expected {}, found {:?}", expected, tok.kind),
        )
    }

    fn error_at(&self, tok: &Token, msg: &str) -> Error {
        Error::new(ErrorCode::P001, tok.line, tok.column, format!("{msg}, found `{}`", tok.lexeme))
    }

    /// Skip tokens until something that can only start a statement.
    /// A stray `}` is consumed so it is not reported twice.
    fn recover(&mut self) {
        loop {
            let kind = self.peek_kind();
            if kind == TokenKind::Eof || kind.starts_statement() { break; }
            self.advance();
            if kind == TokenKind::RBrace { break; }
        }
    }
}

/// A top-level plain `name = expr` declares `name`; compound forms and
/// member/index targets stay assignments.
fn fold_top_level(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Expr(Expr::Assign { target, op: AssignOp::Assign, value, span }) => match *target {
            Expr::Ident(name, _) => Stmt::VarDecl(VarDecl { name, value: *value, span }),
            other => Stmt::Expr(Expr::Assign { target: Box::new(other), op: AssignOp::Assign, value, span }),
        },
        other => other,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn parse_expr_src(src: &str) -> Expr {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let mut p = Parser::new(tokens);
        p.parse_expr().expect("parse_expr failed")
    }

    fn parse_err(src: &str) -> Vec<Error> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect_err("expected parse error")
    }

    // ── declarations ─────────────────────────────────────────────────────────

    #[test]
    fn top_level_assignment_becomes_declaration() {
        let p = parse("x = 10\n###");
        assert_eq!(p.body.len(), 1);
        match &p.body[0] {
            Stmt::VarDecl(v) => {
                assert_eq!(v.name, "x");
                assert!(matches!(v.value, Expr::Number(n, _) if n == 10.0));
            }
            other => panic!("expected VarDecl, got {other:?}"),
        }
    }

    #[test]
    fn compound_assignment_stays_expression() {
        let p = parse("x += 1");
        assert!(matches!(&p.body[0], Stmt::Expr(Expr::Assign { op: AssignOp::Add, .. })));
    }

    #[test]
    fn nested_assignment_is_not_folded() {
        let p = parse("fun f() { y = 2 }");
        let Stmt::FnDecl(f) = &p.body[0] else { panic!("expected FnDecl") };
        assert!(matches!(&f.body[0], Stmt::Expr(Expr::Assign { op: AssignOp::Assign, .. })));
    }

    #[test]
    fn member_assignment_is_not_folded() {
        let p = parse("p.x = 1");
        assert!(matches!(&p.body[0], Stmt::Expr(Expr::Assign { .. })));
    }

    #[test]
    fn fn_decl() {
        let p = parse("fun add(a, b) { return a + b }");
        match &p.body[0] {
            Stmt::FnDecl(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.params, vec!["a", "b"]);
                assert!(matches!(&f.body[0], Stmt::Return(Some(_), _)));
            }
            _ => panic!("expected FnDecl"),
        }
    }

    #[test]
    fn return_bare() {
        let p = parse("fun f() { return }");
        let Stmt::FnDecl(f) = &p.body[0] else { panic!("expected FnDecl") };
        assert!(matches!(&f.body[0], Stmt::Return(None, _)));
    }

    #[test]
    fn statements_need_no_separators() {
        let p = parse("count=0; fun inc(){count=count+1; return count}; c=inc() c()");
        assert_eq!(p.body.len(), 4);
    }

    #[test]
    fn enum_decl() {
        let p = parse("enum S { Idle, Run(speed), Jump(dx, dy) }");
        match &p.body[0] {
            Stmt::Enum(e) => {
                assert_eq!(e.name, "S");
                assert_eq!(e.variants.len(), 3);
                assert!(e.variants[0].fields.is_empty());
                assert_eq!(e.variants[2].fields, vec!["dx", "dy"]);
            }
            _ => panic!("expected Enum"),
        }
    }

    #[test]
    fn draw_and_update_blocks() {
        let p = parse("update(t) { x += t } draw { clear(\"#000\") } update { }");
        match (&p.body[0], &p.body[1], &p.body[2]) {
            (Stmt::Update(u), Stmt::Draw(d), Stmt::Update(bare)) => {
                assert_eq!(u.param.as_deref(), Some("t"));
                assert_eq!(d.body.len(), 1);
                assert!(bare.param.is_none());
            }
            other => panic!("unexpected statements {other:?}"),
        }
    }

    // ── control flow ─────────────────────────────────────────────────────────

    #[test]
    fn if_else_if_chain() {
        let p = parse("if (x>10) {y=1} else if (x>5) {y=2} else {y=0}");
        let Stmt::If(outer) = &p.body[0] else { panic!("expected If") };
        let Some(inner) = outer.else_branch.as_deref() else { panic!("missing else") };
        let Stmt::If(inner) = inner else { panic!("expected nested If") };
        assert!(matches!(inner.else_branch.as_deref(), Some(Stmt::Block(b)) if b.stmts.len() == 1));
    }

    #[test]
    fn loop_with_break() {
        let p = parse("loop { i += 1 if i > 3 { break } }");
        let Stmt::Loop(l) = &p.body[0] else { panic!("expected Loop") };
        assert_eq!(l.body.stmts.len(), 2);
    }

    // ── expressions ──────────────────────────────────────────────────────────

    #[test]
    fn mul_binds_tighter_than_add() {
        let e = parse_expr_src("1 + 2 * 3");
        match e {
            Expr::BinOp { op: BinOp::Add, right, .. } => {
                assert!(matches!(*right, Expr::BinOp { op: BinOp::Mul, .. }));
            }
            other => panic!("expected Add, got {other:?}"),
        }
    }

    #[test]
    fn exponent_is_right_associative() {
        let e = parse_expr_src("2 ** 3 ** 2");
        match e {
            Expr::BinOp { op: BinOp::Pow, left, right, .. } => {
                assert!(matches!(*left, Expr::Number(n, _) if n == 2.0));
                assert!(matches!(*right, Expr::BinOp { op: BinOp::Pow, .. }));
            }
            other => panic!("expected Pow, got {other:?}"),
        }
    }

    #[test]
    fn shift_binds_tighter_than_relational() {
        let e = parse_expr_src("1 << 2 < 8");
        assert!(matches!(e, Expr::BinOp { op: BinOp::Lt, .. }));
    }

    #[test]
    fn bitwise_levels() {
        // `|` is loosest, then `^`, then `&`
        let e = parse_expr_src("a | b ^ c & d");
        match e {
            Expr::BinOp { op: BinOp::BitOr, right, .. } => match *right {
                Expr::BinOp { op: BinOp::BitXor, right, .. } => {
                    assert!(matches!(*right, Expr::BinOp { op: BinOp::BitAnd, .. }));
                }
                other => panic!("expected Xor, got {other:?}"),
            },
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn logical_keywords_and_symbols() {
        let e = parse_expr_src("a and b || c");
        match e {
            Expr::Logical { op: LogicalOp::Or, left, .. } => {
                assert!(matches!(*left, Expr::Logical { op: LogicalOp::And, .. }));
            }
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let e = parse_expr_src("a = b = 3");
        match e {
            Expr::Assign { value, .. } => assert!(matches!(*value, Expr::Assign { .. })),
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn prefix_and_postfix_update() {
        assert!(matches!(parse_expr_src("++x"), Expr::Update { op: UpdateOp::Inc, prefix: true, .. }));
        assert!(matches!(parse_expr_src("xs[0]--"), Expr::Update { op: UpdateOp::Dec, prefix: false, .. }));
    }

    #[test]
    fn unary_ops() {
        assert!(matches!(parse_expr_src("!a"), Expr::UnOp { op: UnOp::Not, .. }));
        assert!(matches!(parse_expr_src("-a"), Expr::UnOp { op: UnOp::Neg, .. }));
        assert!(matches!(parse_expr_src("~a"), Expr::UnOp { op: UnOp::BitNot, .. }));
    }

    #[test]
    fn index_versus_slice() {
        assert!(matches!(parse_expr_src("xs[1]"), Expr::Index { .. }));
        assert!(matches!(parse_expr_src("xs[1:3]"), Expr::Slice { start: Some(_), end: Some(_), .. }));
        assert!(matches!(parse_expr_src("xs[1:]"), Expr::Slice { start: Some(_), end: None, .. }));
        assert!(matches!(parse_expr_src("xs[:3]"), Expr::Slice { start: None, end: Some(_), .. }));
        assert!(matches!(parse_expr_src("xs[:]"), Expr::Slice { start: None, end: None, .. }));
    }

    #[test]
    fn call_member_index_chain() {
        let e = parse_expr_src("a.b(1)[2].c");
        match e {
            Expr::Member { object, property, .. } => {
                assert_eq!(property, "c");
                assert!(matches!(*object, Expr::Index { .. }));
            }
            other => panic!("expected Member, got {other:?}"),
        }
    }

    #[test]
    fn keyword_property_names() {
        assert!(matches!(parse_expr_src("p.draw"), Expr::Member { ref property, .. } if property == "draw"));
    }

    #[test]
    fn keyword_arguments() {
        match parse_expr_src("rect(1, 2, w = 3, color = \"#fff\")") {
            Expr::Call { args, named_args, .. } => {
                assert_eq!(args.len(), 2);
                assert_eq!(named_args.len(), 2);
                assert_eq!(named_args[0].0, "w");
                assert_eq!(named_args[1].0, "color");
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn equality_in_argument_is_positional() {
        match parse_expr_src("f(a == 1)") {
            Expr::Call { args, named_args, .. } => {
                assert_eq!(args.len(), 1);
                assert!(named_args.is_empty());
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn positional_after_keyword_is_error() {
        let errs = parse_err("f(a = 1, 2)");
        assert_eq!(errs[0].code, ErrorCode::P005);
    }

    #[test]
    fn literals_and_collections() {
        assert!(matches!(parse_expr_src("null"), Expr::Null(_)));
        assert!(matches!(parse_expr_src("prototype()"), Expr::Prototype(_)));
        assert!(matches!(parse_expr_src("[1, 2, 3,]"), Expr::Array(ref xs, _) if xs.len() == 3));
        match parse_expr_src("{ x: 1, \"y\": 2 }") {
            Expr::Object(entries, _) => {
                assert_eq!(entries[0].0, "x");
                assert_eq!(entries[1].0, "y");
            }
            other => panic!("expected Object, got {other:?}"),
        }
    }

    // ── match ────────────────────────────────────────────────────────────────

    fn match_of(src: &str) -> MatchExpr {
        match parse_expr_src(src) {
            Expr::Match(m) => *m,
            other => panic!("expected Match, got {other:?}"),
        }
    }

    #[test]
    fn match_patterns() {
        let m = match_of("match v { _ => 0, 1 => 1, -2 => 2, \"s\" => 3, true => 4, null => 5, n => 6, Run(a, _) => 7, S.Idle => 8 }");
        assert!(matches!(m.arms[0].pattern, Pattern::Wildcard(_)));
        assert!(matches!(m.arms[1].pattern, Pattern::Literal(Literal::Number(n), _) if n == 1.0));
        assert!(matches!(m.arms[2].pattern, Pattern::Literal(Literal::Number(n), _) if n == -2.0));
        assert!(matches!(m.arms[3].pattern, Pattern::Literal(Literal::Str(_), _)));
        assert!(matches!(m.arms[4].pattern, Pattern::Literal(Literal::Bool(true), _)));
        assert!(matches!(m.arms[5].pattern, Pattern::Literal(Literal::Null, _)));
        assert!(matches!(m.arms[6].pattern, Pattern::Binding(ref n, _) if n == "n"));
        match &m.arms[7].pattern {
            Pattern::Variant { enum_name, name, bindings, .. } => {
                assert!(enum_name.is_none());
                assert_eq!(name, "Run");
                assert_eq!(bindings, &vec!["a".to_string(), "_".to_string()]);
            }
            other => panic!("expected Variant, got {other:?}"),
        }
        assert!(matches!(&m.arms[8].pattern,
            Pattern::Variant { enum_name: Some(e), bindings, .. } if e == "S" && bindings.is_empty()));
    }

    #[test]
    fn match_arm_block_versus_object() {
        let m = match_of("match v { 1 => { x = 1 }, 2 => { x: 1 }, 3 => { }, 4 => { return 5 } }");
        assert!(matches!(m.arms[0].body, ArmBody::Block(_)));
        assert!(matches!(m.arms[1].body, ArmBody::Expr(Expr::Object(..))));
        assert!(matches!(m.arms[2].body, ArmBody::Block(ref b) if b.stmts.is_empty()));
        assert!(matches!(m.arms[3].body, ArmBody::Block(_)));
    }

    // ── errors ───────────────────────────────────────────────────────────────

    #[test]
    fn invalid_assignment_target() {
        let errs = parse_err("1 = 2");
        assert_eq!(errs[0].code, ErrorCode::P003);
    }

    #[test]
    fn invalid_increment_target() {
        assert_eq!(parse_err("5++")[0].code, ErrorCode::P004);
        assert_eq!(parse_err("++f()")[0].code, ErrorCode::P004);
    }

    #[test]
    fn missing_brace_is_error() {
        let errs = parse_err("fun f() { ");
        assert_eq!(errs[0].code, ErrorCode::P002);
    }

    #[test]
    fn error_recovery_continues_after_bad_stmt() {
        let errs = parse_err("x = )\nfun f( { }\ny = ]");
        assert!(errs.len() >= 2);
    }

    #[test]
    fn trivia_is_dropped_before_parsing() {
        let p = parse("// comment\nx = 1 // trailing\n#####");
        assert_eq!(p.body.len(), 1);
    }
}
