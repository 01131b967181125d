use std::rc::Rc;

use tracing::debug;

use crate::error::{ErrorCode, ParseError};
use crate::stack;
use crate::syntax::ast::*;
use crate::syntax::token::{Token, TokenKind};

/// Upper bound on call arguments and function parameters.
pub const MAX_ARITY: usize = 255;

/// Deepest nesting of blocks, statement bodies and sub-expressions accepted.
pub const MAX_NESTING: usize = 255;

/// Recursive-descent parser. Stops at the first error: there is no
/// resynchronisation, so one parse attempt reports exactly one problem.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.iter().any(|t| t.kind == TokenKind::Eof) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenKind::Eof, "", line));
        }
        Self { tokens, pos: 0, depth: 0 }
    }

    pub fn parse(mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_declaration()?);
        }

        // anything past the terminating Eof was never consumed
        if self.pos + 1 < self.tokens.len() {
            let tok = self.tokens[self.pos + 1].clone();
            return Err(ParseError::new(ErrorCode::P004, tok, "Unexpected tokens after end of program."));
        }

        debug!(statements = statements.len(), "parse finished");
        Ok(Program { statements })
    }

    // ─── Declarations ────────────────────────────────────────────────────────

    fn parse_declaration(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::Var => { self.advance(); self.parse_var_decl() }
            TokenKind::Fun => { self.advance(); self.parse_function() }
            _ => self.parse_stmt(),
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, ParseError> {
        let name = self.expect_ident("Expect variable name.")?;
        let initializer = if self.matches(TokenKind::Equal) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn parse_function(&mut self) -> Result<Stmt, ParseError> {
        let name = self.expect_ident("Expect function name.")?;
        self.expect(TokenKind::LeftParen, "Expect '(' after function name.")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARITY {
                    return Err(self.error_at_current(ErrorCode::P001,
                        format!("Can't have more than {MAX_ARITY} parameters.")));
                }
                params.push(self.expect_ident("Expect parameter name.")?);
                if !self.matches(TokenKind::Comma) { break; }
            }
        }
        self.expect(TokenKind::RightParen, "Expect ')' after parameters.")?;

        self.expect(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.nested(Self::parse_block)?;
        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::Print  => { self.advance(); self.parse_print() }
            TokenKind::If     => { self.advance(); self.parse_if() }
            TokenKind::While  => { self.advance(); self.parse_while() }
            TokenKind::For    => { self.advance(); self.parse_for() }
            TokenKind::Return => self.parse_return(),
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.parse_block()?))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon, "Expect ';' after expression.")?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    /// Statements up to the closing brace; the opening brace is already consumed.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.nested(Self::parse_declaration)?);
        }
        self.expect(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(stmts)
    }

    fn parse_print(&mut self) -> Result<Stmt, ParseError> {
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.nested(Self::parse_stmt)?);
        // a dangling else binds to the nearest if
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.nested(Self::parse_stmt)?))
        } else {
            None
        };
        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.nested(Self::parse_stmt)?);
        Ok(Stmt::While { condition, body })
    }

    /// `for` has no AST node of its own. It is rewritten here as
    ///
    /// ```text
    /// { init; while (cond) { body; incr; } }
    /// ```
    ///
    /// with `cond` defaulting to `true` and the inner block only built when
    /// there is an increment.
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = match self.peek_kind() {
            TokenKind::Semicolon => { self.advance(); None }
            TokenKind::Var => { self.advance(); Some(self.parse_var_decl()?) }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon, "Expect ';' after loop initializer.")?;
                Some(Stmt::Expression(expr))
            }
        };

        let condition = if self.check(TokenKind::Semicolon) {
            Expr::Literal(Literal::Bool(true))
        } else {
            self.parse_expr()?
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.nested(Self::parse_stmt)?;
        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let mut outer = Vec::with_capacity(2);
        outer.extend(initializer);
        outer.push(Stmt::While { condition, body: Box::new(body) });
        Ok(Stmt::Block(outer))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────

    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_assignment)
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let target = self.parse_or()?;

        if self.check(TokenKind::Equal) {
            let equals = self.advance();
            // right-associative: `a = b = c` is `a = (b = c)`
            let value = self.parse_expr()?;
            return match target {
                Expr::Variable(name) => Ok(Expr::Assign { name, value: Box::new(value) }),
                _ => Err(ParseError::new(ErrorCode::P003, equals, "Invalid assignment target.")),
            };
        }

        Ok(target)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.matches(TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expr::Logical { left: Box::new(left), op: LogicalOp::Or, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while self.matches(TokenKind::And) {
            let right = self.parse_equality()?;
            left = Expr::Logical { left: Box::new(left), op: LogicalOp::And, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqualEqual => BinaryOp::Equal,
                TokenKind::BangEqual  => BinaryOp::NotEqual,
                _ => break,
            };
            let operator = self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary { left: Box::new(left), op, operator, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less         => BinaryOp::Less,
                TokenKind::LessEqual    => BinaryOp::LessEqual,
                TokenKind::Greater      => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };
            let operator = self.advance();
            let right = self.parse_term()?;
            left = Expr::Binary { left: Box::new(left), op, operator, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus  => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let operator = self.advance();
            let right = self.parse_factor()?;
            left = Expr::Binary { left: Box::new(left), op, operator, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star  => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            let operator = self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary { left: Box::new(left), op, operator, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Bang  => UnaryOp::Not,
            _ => return self.parse_call(),
        };
        let operator = self.advance();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary { op, operator, operand: Box::new(operand) })
    }

    fn parse_call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        while self.matches(TokenKind::LeftParen) {
            let args = self.parse_arg_list()?;
            let paren = self.expect(TokenKind::RightParen, "Expect ')' after arguments.")?;
            expr = Expr::Call { callee: Box::new(expr), paren, args };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let literal = match self.peek_kind() {
            TokenKind::False     => Literal::Bool(false),
            TokenKind::True      => Literal::Bool(true),
            TokenKind::Nil       => Literal::Nil,
            TokenKind::Number(n) => Literal::Number(n),
            TokenKind::String(s) => Literal::String(s),

            TokenKind::Identifier(_) => return Ok(Expr::Variable(self.advance())),

            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::Grouping(Box::new(inner)));
            }

            _ => return Err(self.error_at_current(ErrorCode::P001, "Expect expression.")),
        };
        self.advance();
        Ok(Expr::Literal(literal))
    }

    // ─── Argument lists ──────────────────────────────────────────────────────

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.check(TokenKind::RightParen) {
            return Ok(args);
        }
        loop {
            if args.len() >= MAX_ARITY {
                return Err(self.error_at_current(ErrorCode::P001,
                    format!("Can't have more than {MAX_ARITY} arguments.")));
            }
            args.push(self.parse_expr()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(args)
    }

    // ─── Nesting ─────────────────────────────────────────────────────────────

    /// Runs one level of recursive descent, failing once `MAX_NESTING`
    /// levels are open.
    fn nested<T>(&mut self, parse: fn(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at_current(ErrorCode::P001, "Too much nesting."));
        }
        self.depth += 1;
        let result = stack::guard(|| parse(self));
        self.depth -= 1;
        result
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    /// Never moves past the terminating Eof.
    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if !self.is_at_end() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(ErrorCode::P002, message))
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<Token, ParseError> {
        match self.peek_kind() {
            TokenKind::Identifier(_) => Ok(self.advance()),
            _ => Err(self.error_at_current(ErrorCode::P002, message)),
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn error_at_current(&self, code: ErrorCode, message: impl Into<String>) -> ParseError {
        ParseError::new(code, self.peek().clone(), message)
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

    fn parse_err(src: &str) -> ParseError {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect_err("expected parse error")
    }

    fn num(e: &Expr) -> f64 {
        match e {
            Expr::Literal(Literal::Number(n)) => *n,
            other => panic!("expected number literal, got {other:?}"),
        }
    }

    // ── literals ─────────────────────────────────────────────────────────────

    #[test]
    fn literals() {
        assert!(matches!(parse_expr_src("nil"),   Expr::Literal(Literal::Nil)));
        assert!(matches!(parse_expr_src("true"),  Expr::Literal(Literal::Bool(true))));
        assert!(matches!(parse_expr_src("false"), Expr::Literal(Literal::Bool(false))));
        assert_eq!(num(&parse_expr_src("12.5")), 12.5);
        match parse_expr_src("\"aoeu\"") {
            Expr::Literal(Literal::String(s)) => assert_eq!(s, "aoeu"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn grouping() {
        match parse_expr_src("(1)") {
            Expr::Grouping(inner) => assert_eq!(num(&inner), 1.0),
            other => panic!("expected Grouping, got {other:?}"),
        }
    }

    // ── operators ────────────────────────────────────────────────────────────

    #[test]
    fn factor_binds_tighter_than_term() {
        // 2 + 3 * 4 → 2 + (3 * 4)
        match parse_expr_src("2 + 3 * 4") {
            Expr::Binary { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected Add at top level, got {other:?}"),
        }
    }

    #[test]
    fn binary_is_left_associative() {
        // 1 - 2 - 3 → (1 - 2) - 3
        match parse_expr_src("1 - 2 - 3") {
            Expr::Binary { op: BinaryOp::Sub, left, right, .. } => {
                assert_eq!(num(&right), 3.0);
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
            }
            other => panic!("expected Sub, got {other:?}"),
        }
    }

    #[test]
    fn comparison_below_equality() {
        // 1 < 2 == true → (1 < 2) == true
        match parse_expr_src("1 < 2 == true") {
            Expr::Binary { op: BinaryOp::Equal, left, .. } => {
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Less, .. }));
            }
            other => panic!("expected Equal, got {other:?}"),
        }
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // a or b and c → a or (b and c)
        match parse_expr_src("a or b and c") {
            Expr::Logical { op: LogicalOp::Or, right, .. } => {
                assert!(matches!(*right, Expr::Logical { op: LogicalOp::And, .. }));
            }
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn unary_nests() {
        match parse_expr_src("!!true") {
            Expr::Unary { op: UnaryOp::Not, operand, .. } => {
                assert!(matches!(*operand, Expr::Unary { op: UnaryOp::Not, .. }));
            }
            other => panic!("expected Not, got {other:?}"),
        }
        assert!(matches!(parse_expr_src("-1"), Expr::Unary { op: UnaryOp::Negate, .. }));
    }

    // ── assignment ───────────────────────────────────────────────────────────

    #[test]
    fn assignment_is_right_associative() {
        match parse_expr_src("a = b = 1") {
            Expr::Assign { name, value } => {
                assert_eq!(name.lexeme, "a");
                assert!(matches!(*value, Expr::Assign { .. }));
            }
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn invalid_assignment_target() {
        let err = parse_err("1 + 2 = 3;");
        assert_eq!(err.code, ErrorCode::P003);
        assert_eq!(err.token.kind, TokenKind::Equal);
        assert_eq!(err.message, "Invalid assignment target.");
    }

    #[test]
    fn grouped_variable_is_not_a_target() {
        assert_eq!(parse_err("(a) = 3;").code, ErrorCode::P003);
    }

    // ── calls ────────────────────────────────────────────────────────────────

    #[test]
    fn call_with_args() {
        match parse_expr_src("add(1, 2)") {
            Expr::Call { callee, args, paren } => {
                assert!(matches!(*callee, Expr::Variable(_)));
                assert_eq!(args.len(), 2);
                assert_eq!(paren.kind, TokenKind::RightParen);
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn curried_call() {
        match parse_expr_src("make()(1)") {
            Expr::Call { callee, args, .. } => {
                assert_eq!(args.len(), 1);
                assert!(matches!(*callee, Expr::Call { .. }));
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn too_many_arguments() {
        let args = vec!["1"; MAX_ARITY + 1].join(", ");
        let err = parse_err(&format!("f({args});"));
        assert!(err.message.contains("arguments"));
    }

    // ── statements ───────────────────────────────────────────────────────────

    #[test]
    fn var_decl_without_initializer() {
        let p = parse("var a;");
        match &p.statements[0] {
            Stmt::Var { name, initializer } => {
                assert_eq!(name.lexeme, "a");
                assert!(initializer.is_none());
            }
            other => panic!("expected Var, got {other:?}"),
        }
    }

    #[test]
    fn function_decl() {
        let p = parse("fun add(a, b) { return a + b; }");
        match &p.statements[0] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name.lexeme, "add");
                let params: Vec<_> = decl.params.iter().map(|t| t.lexeme.as_str()).collect();
                assert_eq!(params, vec!["a", "b"]);
                assert!(matches!(decl.body[0], Stmt::Return { value: Some(_), .. }));
            }
            other => panic!("expected Function, got {other:?}"),
        }
    }

    #[test]
    fn bare_return() {
        let p = parse("fun f() { return; }");
        match &p.statements[0] {
            Stmt::Function(decl) => assert!(matches!(decl.body[0], Stmt::Return { value: None, .. })),
            other => panic!("expected Function, got {other:?}"),
        }
    }

    #[test]
    fn if_else_binds_to_nearest_if() {
        let p = parse("if (a) if (b) print 1; else print 2;");
        match &p.statements[0] {
            Stmt::If { then_branch, else_branch, .. } => {
                assert!(else_branch.is_none());
                assert!(matches!(**then_branch, Stmt::If { else_branch: Some(_), .. }));
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn while_loop() {
        let p = parse("while (a < 5) a = a + 1;");
        assert!(matches!(p.statements[0], Stmt::While { .. }));
    }

    // ── for desugaring ───────────────────────────────────────────────────────

    #[test]
    fn for_desugars_to_block_with_while() {
        let p = parse("for (var a = 1; a <= 5; a = a + 1) print a;");
        let Stmt::Block(outer) = &p.statements[0] else { panic!("expected outer Block") };
        assert_eq!(outer.len(), 2);
        assert!(matches!(outer[0], Stmt::Var { .. }));
        let Stmt::While { body, .. } = &outer[1] else { panic!("expected While") };
        let Stmt::Block(inner) = body.as_ref() else { panic!("expected body Block") };
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn for_without_clauses() {
        let p = parse("for (;;) print 1;");
        let Stmt::Block(outer) = &p.statements[0] else { panic!("expected outer Block") };
        assert_eq!(outer.len(), 1);
        let Stmt::While { condition, body } = &outer[0] else { panic!("expected While") };
        assert!(matches!(condition, Expr::Literal(Literal::Bool(true))));
        // no increment → body left as written
        assert!(matches!(**body, Stmt::Print(_)));
    }

    #[test]
    fn for_with_expression_initializer() {
        let p = parse("for (i = 0; i < 2;) print i;");
        let Stmt::Block(outer) = &p.statements[0] else { panic!("expected outer Block") };
        assert!(matches!(outer[0], Stmt::Expression(Expr::Assign { .. })));
    }

    // ── errors ───────────────────────────────────────────────────────────────

    #[test]
    fn malformed_expression_fails() {
        let err = parse_err("1 + + 1;");
        assert_eq!(err.code, ErrorCode::P001);
        assert_eq!(err.token.kind, TokenKind::Plus);
    }

    #[test]
    fn missing_semicolon() {
        let err = parse_err("print 1");
        assert_eq!(err.code, ErrorCode::P002);
        assert_eq!(err.token.kind, TokenKind::Eof);
    }

    #[test]
    fn first_error_wins() {
        // two broken statements → only the first is reported
        let err = parse_err("print ;\nvar = 2;");
        assert_eq!(err.token.line, 1);
    }

    #[test]
    fn unclosed_block() {
        assert_eq!(parse_err("{ print 1;").code, ErrorCode::P002);
    }

    #[test]
    fn class_is_not_part_of_the_grammar() {
        assert_eq!(parse_err("class Foo {}").code, ErrorCode::P001);
    }

    // ── nesting ──────────────────────────────────────────────────────────────

    #[test]
    fn deep_parentheses_fail_cleanly() {
        let src = format!("print {}1{};", "(".repeat(10_000), ")".repeat(10_000));
        let err = parse_err(&src);
        assert_eq!(err.code, ErrorCode::P001);
        assert_eq!(err.message, "Too much nesting.");
        assert_eq!(err.token.kind, TokenKind::LeftParen);
    }

    #[test]
    fn deep_unary_chain_fails_cleanly() {
        let src = format!("print {}true;", "!".repeat(10_000));
        assert_eq!(parse_err(&src).message, "Too much nesting.");
    }

    #[test]
    fn deep_blocks_fail_cleanly() {
        let src = format!("{}{}", "{".repeat(10_000), "}".repeat(10_000));
        assert_eq!(parse_err(&src).message, "Too much nesting.");
    }

    #[test]
    fn deep_statement_bodies_fail_cleanly() {
        let src = format!("{}print 1;", "while (true) ".repeat(10_000));
        assert_eq!(parse_err(&src).message, "Too much nesting.");
    }

    #[test]
    fn nesting_below_limit_parses() {
        let depth = MAX_NESTING - 10;
        let src = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));
        let p = parse(&src);
        let Stmt::Print(mut expr) = p.statements[0].clone() else { panic!("expected Print") };
        let mut groups = 0;
        while let Expr::Grouping(inner) = expr {
            groups += 1;
            expr = *inner;
        }
        assert_eq!(groups, depth);
        assert_eq!(num(&expr), 1.0);
    }

    #[test]
    fn tokens_after_eof_are_leftover() {
        let mut tokens = Lexer::new("print 1;").tokenize().unwrap();
        tokens.push(Token::new(TokenKind::Semicolon, ";", 1));
        let err = Parser::new(tokens).parse().unwrap_err();
        assert_eq!(err.code, ErrorCode::P004);
    }

    #[test]
    fn missing_eof_is_tolerated() {
        let tokens = vec![
            Token::new(TokenKind::Print, "print", 1),
            Token::new(TokenKind::Number(1.0), "1", 1),
            Token::new(TokenKind::Semicolon, ";", 1),
        ];
        let p = Parser::new(tokens).parse().unwrap();
        assert_eq!(p.statements.len(), 1);
    }
}
