//! Recursive-descent parser with panic-mode error recovery.
//!
//! Every parse function that can fail returns `Result<_, ParseError>`.
//! `ParseError` carries no data — the diagnostic itself was already
//! recorded on the [`ErrorCollector`] at the point of failure, so the
//! error value only needs to unwind the call stack back to
//! [`Parser::parse_program`], which is the only place that calls
//! [`Parser::synchronize`].

use crate::ast::{Block, Expr, Parameter, Stmt};
use vlpc_lex::{Token, TokenKind};
use vlpc_util::{ErrorCollector, SourceLocation};

/// Marker type: the diagnostic has already been recorded, this only
/// signals "stop parsing this declaration."
#[derive(Debug)]
pub struct ParseError;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    filename: String,
    errors: &'a mut ErrorCollector,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, filename: impl Into<String>, errors: &'a mut ErrorCollector) -> Self {
        Self {
            tokens,
            pos: 0,
            filename: filename.into(),
            errors,
        }
    }

    pub fn parse_program(&mut self) -> Vec<Stmt> {
        let mut program = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(Some(stmt)) => program.push(stmt),
                Ok(None) => {}
                Err(ParseError) => self.synchronize(),
            }
        }
        program
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::EndOfFile
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.current().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn location(&self) -> SourceLocation {
        self.current().location(self.filename.clone())
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let loc = self.location();
        self.errors.error(loc, message);
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<(), ParseError> {
        if self.match_kind(kind) {
            Ok(())
        } else {
            self.error_here(message);
            Err(ParseError)
        }
    }

    /// Skip tokens until the statement boundary just consumed was a `;`,
    /// or the next token starts a new declaration.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.pos > 0 && self.tokens[self.pos - 1].kind == TokenKind::Semicolon {
                return;
            }
            match self.current().kind {
                TokenKind::Fx
                | TokenKind::Var
                | TokenKind::Const
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn declaration(&mut self) -> Result<Option<Stmt>, ParseError> {
        if self.match_kind(TokenKind::Mod) {
            return self.module_import();
        }
        if self.match_kind(TokenKind::Fx) {
            return self.function_definition();
        }
        if self.match_kind(TokenKind::Var) {
            return self.var_declaration(false);
        }
        if self.match_kind(TokenKind::Const) {
            return self.var_declaration(true);
        }
        self.statement().map(Some)
    }

    fn module_import(&mut self) -> Result<Option<Stmt>, ParseError> {
        self.expect(TokenKind::LeftParen, "expected '(' after mod")?;
        if self.current().kind != TokenKind::StringLit {
            self.error_here("expected string path in module import");
            return Err(ParseError);
        }
        let path = self.current().lexeme.clone();
        self.advance();
        self.expect(TokenKind::RightParen, "expected ')' after module path")?;
        self.expect(TokenKind::ColonColon, "expected '::' for module alias")?;
        if self.current().kind != TokenKind::Identifier {
            self.error_here("expected module alias identifier");
            return Err(ParseError);
        }
        let alias = self.current().lexeme.clone();
        self.advance();
        self.expect(TokenKind::Semicolon, "expected ';' after module import")?;
        Ok(Some(Stmt::ModuleImport { path, alias }))
    }

    fn function_definition(&mut self) -> Result<Option<Stmt>, ParseError> {
        if self.current().kind != TokenKind::Identifier {
            self.error_here("expected function name");
            return Err(ParseError);
        }
        let name = self.current().lexeme.clone();
        self.advance();
        self.expect(TokenKind::LeftParen, "expected '(' after function name")?;

        let mut parameters = Vec::new();
        if !self.match_kind(TokenKind::RightParen) {
            loop {
                if self.current().kind != TokenKind::Identifier {
                    self.error_here("expected parameter type");
                    return Err(ParseError);
                }
                let ty = self.current().lexeme.clone();
                self.advance();
                let name = if self.match_kind(TokenKind::Colon) {
                    if self.current().kind != TokenKind::Identifier {
                        self.error_here("expected parameter name");
                        return Err(ParseError);
                    }
                    let n = self.current().lexeme.clone();
                    self.advance();
                    n
                } else {
                    format!("p{}", parameters.len())
                };
                parameters.push(Parameter { ty, name });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightParen, "expected ')' after parameters")?;
        }

        let mut return_type = "void".to_string();
        if self.match_kind(TokenKind::Arrow) {
            if self.current().kind != TokenKind::Identifier {
                self.error_here("expected return type");
                return Err(ParseError);
            }
            return_type = self.current().lexeme.clone();
            self.advance();
        }

        if self.match_kind(TokenKind::Semicolon) {
            // Prototype only: parsed and discarded, same as the reference parser.
            return Ok(None);
        }

        let body = self.block()?;
        Ok(Some(Stmt::FunctionDef {
            name,
            return_type,
            parameters,
            body,
        }))
    }

    fn var_declaration(&mut self, is_const: bool) -> Result<Option<Stmt>, ParseError> {
        let mut ty = String::new();
        if self.match_kind(TokenKind::ColonColon) {
            if self.current().kind != TokenKind::Identifier {
                self.error_here("expected type after '::'");
                return Err(ParseError);
            }
            ty = self.current().lexeme.clone();
            self.advance();
        }
        if self.current().kind != TokenKind::Identifier {
            self.error_here("expected variable name");
            return Err(ParseError);
        }
        let name = self.current().lexeme.clone();
        self.advance();

        let initializer = if self.match_kind(TokenKind::Assign) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "expected ';' after variable declaration")?;
        Ok(Some(Stmt::VarDecl {
            name,
            ty,
            is_const,
            initializer,
        }))
    }

    fn block(&mut self) -> Result<Block, ParseError> {
        self.expect(TokenKind::LeftBrace, "expected '{'")?;
        let mut statements = Vec::new();
        while !self.is_at_end() && self.current().kind != TokenKind::RightBrace {
            if let Some(stmt) = self.declaration()? {
                statements.push(stmt);
            }
        }
        self.expect(TokenKind::RightBrace, "expected '}'")?;
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.match_kind(TokenKind::If) {
            return self.if_statement();
        }
        if self.match_kind(TokenKind::For) {
            return self.for_statement();
        }
        if self.match_kind(TokenKind::While) {
            return self.while_statement();
        }
        if self.match_kind(TokenKind::Return) {
            return self.return_statement();
        }
        if self.match_kind(TokenKind::Print) {
            return self.print_statement();
        }
        if self.match_kind(TokenKind::Gather) {
            return self.gather_statement();
        }
        if self.current().kind == TokenKind::LeftBrace {
            return Ok(Stmt::Block(self.block()?));
        }

        let expr = self.expression()?;
        self.expect(TokenKind::Semicolon, "expected ';' after expression")?;
        Ok(Stmt::ExprStmt(expr))
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LeftParen, "expected '(' after if")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RightParen, "expected ')' after condition")?;
        let then_branch = self.block()?;
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(self.block()?)
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        if self.current().kind != TokenKind::Identifier {
            self.error_here("expected iterator name");
            return Err(ParseError);
        }
        let iterator = self.current().lexeme.clone();
        self.advance();
        self.expect(TokenKind::In, "expected 'in' after iterator")?;
        let start = self.expression()?;
        self.expect(TokenKind::DotDot, "expected '..' in range")?;
        let end = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::For {
            iterator,
            start,
            end,
            body,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LeftParen, "expected '(' after while")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RightParen, "expected ')' after condition")?;
        let body = self.block()?;
        Ok(Stmt::While { condition, body })
    }

    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = if self.current().kind != TokenKind::Semicolon {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "expected ';' after return")?;
        Ok(Stmt::Return(expr))
    }

    fn print_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LeftParen, "expected '(' after print")?;
        let mut args = Vec::new();
        if !self.match_kind(TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightParen, "expected ')' after print arguments")?;
        }
        self.expect(TokenKind::Semicolon, "expected ';' after print")?;

        let (formatted, format, real_args) = match args.split_first() {
            Some((Expr::StringLit(s), rest)) => (true, s.clone(), rest.to_vec()),
            Some((first, _)) => (false, "{}".to_string(), vec![first.clone()]),
            None => (false, String::new(), Vec::new()),
        };
        Ok(Stmt::Print {
            format,
            args: real_args,
            formatted,
        })
    }

    fn gather_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LeftParen, "expected '(' after gather")?;
        let mut names = Vec::new();
        if !self.match_kind(TokenKind::RightParen) {
            loop {
                if self.current().kind != TokenKind::Identifier {
                    self.error_here("expected identifier in gather");
                    return Err(ParseError);
                }
                names.push(self.current().lexeme.clone());
                self.advance();
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightParen, "expected ')' after gather list")?;
        }
        self.expect(TokenKind::Semicolon, "expected ';' after gather")?;
        Ok(Stmt::Gather { names })
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.comparison()?;
        if self.match_kind(TokenKind::Assign) {
            if let Expr::Variable(name) = expr {
                let value = self.assignment()?;
                return Ok(Expr::Assignment {
                    name,
                    value: Box::new(value),
                });
            }
            self.error_here("invalid assignment target");
            return Err(ParseError);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        loop {
            let kind = self.current().kind;
            if matches!(
                kind,
                TokenKind::Equals
                    | TokenKind::NotEquals
                    | TokenKind::Less
                    | TokenKind::LessEq
                    | TokenKind::Greater
                    | TokenKind::GreaterEq
            ) {
                let op = self.current().lexeme.clone();
                self.advance();
                let right = self.term()?;
                expr = Expr::Binary {
                    left: Box::new(expr),
                    op,
                    right: Box::new(right),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        while matches!(self.current().kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.current().lexeme.clone();
            self.advance();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        while matches!(self.current().kind, TokenKind::Star | TokenKind::Slash) {
            let op = self.current().lexeme.clone();
            self.advance();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_kind(TokenKind::Minus) {
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op: "-".to_string(),
                operand: Box::new(operand),
            });
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.current().kind {
            TokenKind::Number => {
                let value: i32 = self.current().lexeme.parse().unwrap_or(0);
                self.advance();
                Ok(Expr::Number(value))
            }
            TokenKind::Float => {
                let value: f64 = self.current().lexeme.parse().unwrap_or(0.0);
                self.advance();
                Ok(Expr::Float(value))
            }
            TokenKind::StringLit => {
                let value = self.current().lexeme.clone();
                self.advance();
                Ok(Expr::StringLit(value))
            }
            TokenKind::True | TokenKind::False => {
                let value = self.current().kind == TokenKind::True;
                self.advance();
                Ok(Expr::Bool(value))
            }
            TokenKind::Identifier => {
                let mut name = self.current().lexeme.clone();
                self.advance();

                let mut ns = String::new();
                if self.match_kind(TokenKind::Dot) {
                    if self.current().kind != TokenKind::Identifier {
                        self.error_here("expected member after '.'");
                        return Err(ParseError);
                    }
                    ns = name;
                    name = self.current().lexeme.clone();
                    self.advance();
                }

                if self.match_kind(TokenKind::LeftParen) {
                    let mut args = Vec::new();
                    if !self.match_kind(TokenKind::RightParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.match_kind(TokenKind::Comma) {
                                break;
                            }
                        }
                        self.expect(TokenKind::RightParen, "expected ')' after arguments")?;
                    }
                    return Ok(Expr::Call { name, args, ns });
                }

                if !ns.is_empty() {
                    self.error_here("namespaced value must be a call");
                    return Err(ParseError);
                }
                Ok(Expr::Variable(name))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(TokenKind::RightParen, "expected ')'")?;
                Ok(expr)
            }
            _ => {
                self.error_here("unexpected token");
                Err(ParseError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlpc_lex::lex;

    fn parse(source: &str) -> (Vec<Stmt>, ErrorCollector) {
        let mut errors = ErrorCollector::new(source, "test.vlp");
        let program = {
            let mut parser = Parser::new(lex(source), "test.vlp", &mut errors);
            parser.parse_program()
        };
        (program, errors)
    }

    #[test]
    fn parses_var_declaration_with_type() {
        let (program, errors) = parse("::int x = 5;");
        assert!(!errors.has_errors());
        assert_eq!(program.len(), 1);
        match &program[0] {
            Stmt::VarDecl { name, ty, is_const, .. } => {
                assert_eq!(name, "x");
                assert_eq!(ty, "int");
                assert!(!is_const);
            }
            other => panic!("expected VarDecl, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_with_return_type() {
        let (program, errors) = parse("fx add(int: a, int: b) -> int { return a + b; }");
        assert!(!errors.has_errors());
        match &program[0] {
            Stmt::FunctionDef { name, return_type, parameters, body } => {
                assert_eq!(name, "add");
                assert_eq!(return_type, "int");
                assert_eq!(parameters.len(), 2);
                assert_eq!(parameters[0].name, "a");
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected FunctionDef, got {other:?}"),
        }
    }

    #[test]
    fn function_prototype_is_discarded() {
        let (program, errors) = parse("fx foo();");
        assert!(!errors.has_errors());
        assert!(program.is_empty());
    }

    #[test]
    fn print_with_string_literal_is_formatted() {
        let (program, _) = parse(r#"print("x = {}", 1);"#);
        match &program[0] {
            Stmt::Print { format, args, formatted } => {
                assert!(*formatted);
                assert_eq!(format, "x = {}");
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected Print, got {other:?}"),
        }
    }

    #[test]
    fn print_without_string_literal_uses_default_format() {
        let (program, _) = parse("print(42);");
        match &program[0] {
            Stmt::Print { format, formatted, .. } => {
                assert!(!*formatted);
                assert_eq!(format, "{}");
            }
            other => panic!("expected Print, got {other:?}"),
        }
    }

    #[test]
    fn namespaced_call_parses() {
        let (program, errors) = parse(r#"math.sqrt(4);"#);
        assert!(!errors.has_errors());
        match &program[0] {
            Stmt::ExprStmt(Expr::Call { name, ns, .. }) => {
                assert_eq!(name, "sqrt");
                assert_eq!(ns, "math");
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn namespaced_value_without_call_is_an_error() {
        let (_, errors) = parse("math.pi;");
        assert!(errors.has_errors());
    }

    #[test]
    fn missing_semicolon_recovers_at_next_statement() {
        let (program, errors) = parse("var x = 1\nvar y = 2;");
        assert!(errors.has_errors());
        assert_eq!(program.len(), 1);
        match &program[0] {
            Stmt::VarDecl { name, .. } => assert_eq!(name, "y"),
            other => panic!("expected VarDecl, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_parses_range() {
        let (program, errors) = parse("for i in 0..5 { print(i); }");
        assert!(!errors.has_errors());
        match &program[0] {
            Stmt::For { iterator, .. } => assert_eq!(iterator, "i"),
            other => panic!("expected For, got {other:?}"),
        }
    }
}
