use crate::ast::{
    join, Expr, ExprAssign, ExprCall, ExprGet, ExprInfix, ExprLiteral, ExprPrefix, ExprS, ExprSet, ExprVar, OpInfix,
    OpPrefix, Param, Program, Stmt, StmtArray, StmtArraySet, StmtBlock, StmtClass, StmtDoWhile, StmtExpr, StmtFor,
    StmtForIter, StmtFun, StmtIf, StmtImport, StmtInterface, StmtPrint, StmtRead, StmtReturn, StmtS, StmtStep,
    StmtSwitch, StmtVar, StmtWhile, Var,
};
use crate::lexer::{Block, Fixity, Token, TokenKind};
use crate::types::{plural_type, separate_type, type_name, Type};

use fim_common::error::{Error, ParseError, Result};
use fim_common::types::{Span, Spanned};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

use std::rc::Rc;

/// A name ending in a whole number, such as "cake 1".
static INDEXED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*\S)\s+([0-9]+)$").expect("invalid index pattern"));

type Operators = [(TokenKind, OpInfix)];

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Names declared anywhere in the program. A name that ends in a number
    /// is only read as an array index when it was never declared whole.
    names: FxHashSet<String>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = tokens.into_iter().filter(|token| token.kind != TokenKind::Comment).collect::<Vec<_>>();
        if tokens.last().map_or(true, |token| token.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(0, |token| token.span.end);
            tokens.push(Token::new(TokenKind::Eof, "", Block::None, Fixity::None, end..end));
        }
        let names = declared_names(&tokens);
        Self { tokens, current: 0, names }
    }

    pub fn parse(mut self) -> Result<Program> {
        let mut stmts = Vec::new();
        loop {
            self.skip_punctuation();
            if self.is_at_end() {
                break;
            }
            stmts.push(self.declaration()?);
        }
        Ok(Program { stmts })
    }

    fn declaration(&mut self) -> Result<StmtS> {
        let token = self.peek();
        match token.kind {
            TokenKind::Import => self.import(),
            TokenKind::Report if token.block == Block::Begin => self.class(),
            TokenKind::Name if self.peek_next().kind == TokenKind::Punctuation && self.peek_next().text == ":" => {
                self.interface()
            }
            _ => self.statement(),
        }
    }

    fn import(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let name = self.eat_name("the name of the module to import")?;
        let span = start..self.prev_end();
        self.end_sentence()?;
        Ok((Stmt::Import(StmtImport { name: name.text }), span))
    }

    fn class(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let super_ = self.eat_name("the name of the class to learn from")?;
        let mut interfaces = Vec::new();
        while self.eat_if(TokenKind::And, Block::None).is_some() {
            let interface = self.eat_name("the name of an interface")?;
            interfaces.push((interface.text, interface.span));
        }
        self.eat(TokenKind::Punctuation, Block::None, "punctuation after the recipient")?;
        let name = self.eat_name("the name of the class")?;
        self.end_sentence()?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        loop {
            self.skip_punctuation();
            let token = self.peek();
            match (token.kind, token.block) {
                (TokenKind::Report, Block::End) => break,
                (TokenKind::Paragraph | TokenKind::ManeParagraph, Block::Begin) => methods.push(self.function()?),
                (TokenKind::Var, Block::BeginPartner) => {
                    let field = self.var_decl()?;
                    self.end_sentence()?;
                    fields.push(Rc::new(field));
                }
                _ => return Err(self.unexpected(r#"a paragraph, a variable or "Your faithful student,""#)),
            }
        }
        self.advance();
        // The closing name signs the letter and need not match the class name.
        let author = self.eat_name("your name")?;
        let span = start..self.prev_end();

        let super_ = (Var::new(&super_.text, None), super_.span);
        let class = StmtClass { name: name.text, super_, interfaces, fields, methods, author: author.text };
        Ok((Stmt::Class(Rc::new(class)), span))
    }

    fn interface(&mut self) -> Result<StmtS> {
        let name = self.advance();
        let start = name.span.start;
        self.advance();

        let mut methods = Vec::new();
        loop {
            self.skip_punctuation();
            if self.eat_if(TokenKind::Paragraph, Block::Begin).is_none() {
                break;
            }
            let method = self.eat_name("the name of a paragraph")?;
            methods.push((method.text, method.span));
            if self.eat_if(TokenKind::ReturnType, Block::None).is_some() {
                self.eat_name("a type")?;
            }
            if self.eat_if(TokenKind::Parameters, Block::None).is_some() {
                self.eat_name("a parameter name")?;
                while self.eat_if(TokenKind::And, Block::None).is_some() {
                    self.eat_name("a parameter name")?;
                }
            }
        }
        self.eat(TokenKind::Report, Block::End, r#""Your faithful student,""#)?;
        self.eat_name("your name")?;
        let span = start..self.prev_end();
        Ok((Stmt::Interface(StmtInterface { name: name.text, methods }), span))
    }

    fn function(&mut self) -> Result<Spanned<Rc<StmtFun>>> {
        let token = self.advance();
        let start = token.span.start;
        let is_main = token.kind == TokenKind::ManeParagraph;
        let name = self.eat_name("the name of the paragraph")?;

        let return_type = match self.eat_if(TokenKind::ReturnType, Block::None) {
            Some(_) => Some(parse_type(&self.eat_name("a type")?.text)),
            None => None,
        };
        let mut params = Vec::new();
        if self.eat_if(TokenKind::Parameters, Block::None).is_some() {
            loop {
                let param = self.eat_name("a parameter name")?;
                let (type_, name) = separate_type(&param.text);
                params.push(Param { name: name.to_string(), type_ });
                if self.eat_if(TokenKind::And, Block::None).is_none() {
                    break;
                }
            }
        }
        self.end_sentence()?;

        let body = self.block(&[(TokenKind::Paragraph, Block::End)])?;
        self.eat(TokenKind::Paragraph, Block::End, r#""That's all about""#)?;
        let close = self.eat_name("the name of the paragraph")?;
        if close.text != name.text {
            return Err(Error::ParseError(ParseError::MismatchedName {
                kind: "paragraph".to_string(),
                open: name.text,
                close: close.text,
                span: close.span,
            }));
        }

        let span = start..self.prev_end();
        Ok((Rc::new(StmtFun { name: name.text, params, return_type, body, is_main }), span))
    }

    fn statement(&mut self) -> Result<StmtS> {
        let token = self.peek();
        match (token.kind, token.block) {
            (TokenKind::Var, Block::BeginPartner) => {
                let stmt = self.var_decl()?;
                self.end_sentence()?;
                Ok(stmt)
            }
            (TokenKind::Print, _) => self.print(),
            (TokenKind::Read, _) => self.read(),
            (TokenKind::Run, _) => self.run(),
            (TokenKind::Return, _) => self.return_(),
            (TokenKind::Increment | TokenKind::Decrement, _) if token.fixity == Fixity::Prefix => {
                let stmt = self.step()?;
                self.end_sentence()?;
                Ok(stmt)
            }
            (TokenKind::If, Block::BeginPartner) => self.if_(),
            (TokenKind::While, Block::Begin) => self.while_(),
            (TokenKind::DoWhile, Block::Begin) => self.do_while(),
            (TokenKind::For, Block::BeginPartner) => self.for_(),
            (TokenKind::Switch, Block::Begin) => self.switch(),
            (TokenKind::Paragraph | TokenKind::ManeParagraph, Block::Begin) => {
                let (fun, span) = self.function()?;
                Ok((Stmt::Fun(fun), span))
            }
            (TokenKind::Name, _) => self.name_statement(),
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn var_decl(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let name = self.eat_name("a name for the new variable")?.text;
        self.eat(TokenKind::Var, Block::EndPartner, r#""is", "has" or "likes""#)?;
        let constant = self.eat_if(TokenKind::Const, Block::None).is_some();

        if let Some(many) = self.eat_if(TokenKind::Array, Block::None) {
            let elem = self.eat_name(r#"a plural type such as "words" after "many""#)?;
            let elem_type = (elem.text, many.span.start..elem.span.end);
            let stmt = StmtArray { name, elem_type, value: None, constant };
            return Ok((Stmt::Array(stmt), start..self.prev_end()));
        }

        let next = self.peek().clone();
        if next.kind == TokenKind::Name && plural_type(&next.text).is_some() && !self.next_ends_sentence() {
            self.advance();
            let value = self.expr()?;
            let stmt = StmtArray { name, elem_type: (next.text, next.span), value: Some(value), constant };
            return Ok((Stmt::Array(stmt), start..self.prev_end()));
        }

        let declared = match next.kind {
            TokenKind::Name => type_name(&next.text),
            _ => None,
        };
        let stmt = match declared {
            Some(type_) => {
                self.advance();
                let value = if self.at_sentence_end() { None } else { Some(self.expr()?) };
                StmtVar { name, type_: Some(type_), value, constant }
            }
            None => StmtVar { name, type_: None, value: Some(self.expr()?), constant },
        };
        Ok((Stmt::Var(stmt), start..self.prev_end()))
    }

    fn print(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let value = self.expr()?;
        let span = start..self.prev_end();
        self.end_sentence()?;
        Ok((Stmt::Print(StmtPrint { value }), span))
    }

    fn read(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let token = self.eat_name("a variable to read into")?;
        let (type_, name) = self.separate_type(&token.text);
        let var = (Var::new(name, type_), token.span);
        let prompt = if self.at_sentence_end() { None } else { Some(self.expr()?) };
        let span = start..self.prev_end();
        self.end_sentence()?;
        Ok((Stmt::Read(StmtRead { var, prompt }), span))
    }

    fn run(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let token = self.peek();
        if matches!(token.kind, TokenKind::Increment | TokenKind::Decrement) && token.fixity == Fixity::Prefix {
            let (stmt, span) = self.step()?;
            self.end_sentence()?;
            return Ok((stmt, start..span.end));
        }
        let value = self.expr()?;
        let span = start..self.prev_end();
        self.end_sentence()?;
        Ok((Stmt::Expr(StmtExpr { value }), span))
    }

    fn return_(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let value = self.expr()?;
        let span = start..self.prev_end();
        self.end_sentence()?;
        Ok((Stmt::Return(StmtReturn { value }), span))
    }

    /// "There was one more X", "There was one less X" or "add N to X".
    fn step(&mut self) -> Result<StmtS> {
        let token = self.advance();
        let start = token.span.start;
        let step = if token.block == Block::BeginPartner {
            let amount = self.expr()?;
            self.eat(TokenKind::Increment, Block::EndPartner, r#""to""#)?;
            StmtStep { target: self.target()?, amount: Some(amount) }
        } else {
            StmtStep { target: self.target()?, amount: None }
        };
        let stmt = match token.kind {
            TokenKind::Decrement => Stmt::Decrement(step),
            _ => Stmt::Increment(step),
        };
        Ok((stmt, start..self.prev_end()))
    }

    fn target(&mut self) -> Result<ExprS> {
        if !self.check(TokenKind::Name) {
            return Err(self.unexpected("a variable to change"));
        }
        let target = self.call()?;
        match target.0 {
            Expr::Var(_) | Expr::Get(_) => Ok(target),
            _ => Err(self.unexpected_at("a variable to change", &target.1)),
        }
    }

    /// Statements that start with a name: assignment, element assignment,
    /// postfix increments and bare calls.
    fn name_statement(&mut self) -> Result<StmtS> {
        let start = self.peek().span.start;
        let target = self.call()?;
        let token = self.peek().clone();
        let stmt = match token.kind {
            TokenKind::Assign => {
                self.advance();
                let value = self.expr()?;
                Stmt::Expr(StmtExpr { value: self.assign(target, value)? })
            }
            TokenKind::Equal => match target.0 {
                Expr::Get(get) => {
                    self.advance();
                    let value = self.expr()?;
                    Stmt::ArraySet(Box::new(StmtArraySet { array: get.object, index: get.accessor, value }))
                }
                _ => return Err(self.unexpected(r#""is now""#)),
            },
            TokenKind::Increment | TokenKind::Decrement if token.fixity == Fixity::Postfix => {
                self.advance();
                let step = StmtStep { target, amount: None };
                match token.kind {
                    TokenKind::Decrement => Stmt::Decrement(step),
                    _ => Stmt::Increment(step),
                }
            }
            _ => match target.0 {
                Expr::Call(_) => Stmt::Expr(StmtExpr { value: target }),
                _ => return Err(self.unexpected(r#""is now", "got one more" or "using""#)),
            },
        };
        let span = start..self.prev_end();
        self.end_sentence()?;
        Ok((stmt, span))
    }

    fn if_(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let cond = self.expr()?;
        self.eat_if(TokenKind::If, Block::EndPartner);
        let then = self.block(&[(TokenKind::Else, Block::None), (TokenKind::If, Block::End)])?;
        let else_ = match self.eat_if(TokenKind::Else, Block::None) {
            Some(_) => Some(self.block(&[(TokenKind::If, Block::End)])?),
            None => None,
        };
        self.eat(TokenKind::If, Block::End, r#""That's what I would do""#)?;
        Ok((Stmt::If(Box::new(StmtIf { cond, then, else_ })), start..self.prev_end()))
    }

    fn while_(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let cond = self.expr()?;
        let body = self.block(&[(TokenKind::EndLoop, Block::End)])?;
        self.eat(TokenKind::EndLoop, Block::End, r#""That's what I did""#)?;
        Ok((Stmt::While(Box::new(StmtWhile { cond, body })), start..self.prev_end()))
    }

    fn do_while(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let body = self.block(&[(TokenKind::DoWhile, Block::End)])?;
        self.eat(TokenKind::DoWhile, Block::End, r#""I did this as long as""#)?;
        let cond = self.expr()?;
        let span = start..self.prev_end();
        self.end_sentence()?;
        Ok((Stmt::DoWhile(Box::new(StmtDoWhile { body, cond })), span))
    }

    fn for_(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let token = self.eat_name("a name for the loop variable")?;
        let (type_, name) = separate_type(&token.text);
        let var = Param { name: name.to_string(), type_ };
        let ends = [(TokenKind::EndLoop, Block::End)];

        if self.eat_if(TokenKind::Iter, Block::BeginPartner).is_some() {
            let from = self.expr()?;
            self.eat(TokenKind::Iter, Block::EndPartner, r#""to""#)?;
            let to = self.expr()?;
            let mut body = self.block(&ends)?;
            self.eat(TokenKind::EndLoop, Block::End, r#""That's what I did""#)?;

            let counter = || (Expr::Var(ExprVar { var: Var::new(&var.name, None) }), token.span.clone());
            let cond_span = join(&token.span, &to.1);
            let cond = (Expr::Infix(Box::new(ExprInfix { lt: counter(), op: OpInfix::LessEqual, rt: to })), cond_span);
            let step = StmtStep { target: counter(), amount: None };
            body.stmts.push((Stmt::Increment(step), token.span.clone()));
            let init = StmtVar { name: var.name, type_: var.type_, value: Some(from), constant: false };
            let stmt = StmtFor { init: (init, token.span), cond, body };
            return Ok((Stmt::For(Box::new(stmt)), start..self.prev_end()));
        }

        if self.eat_if(TokenKind::For, Block::EndPartner).is_some() {
            let iterable = self.expr()?;
            let body = self.block(&ends)?;
            self.eat(TokenKind::EndLoop, Block::End, r#""That's what I did""#)?;
            let stmt = StmtForIter { var, iterable, body };
            return Ok((Stmt::ForIter(Box::new(stmt)), start..self.prev_end()));
        }

        Err(self.unexpected(r#""from" or "in""#))
    }

    fn switch(&mut self) -> Result<StmtS> {
        let start = self.advance().span.start;
        let value = self.expr()?;
        let ends = [
            (TokenKind::Case, Block::BeginPartner),
            (TokenKind::Default, Block::None),
            (TokenKind::EndLoop, Block::End),
        ];

        let mut cases = Vec::new();
        let mut default = None;
        loop {
            self.skip_punctuation();
            if self.eat_if(TokenKind::Case, Block::BeginPartner).is_some() {
                let key = self.primary()?;
                self.eat(TokenKind::Case, Block::EndPartner, r#""hoof""#)?;
                cases.push((key, self.block(&ends)?));
            } else if self.eat_if(TokenKind::Default, Block::None).is_some() {
                default = Some(self.block(&ends)?);
            } else {
                break;
            }
        }
        self.eat(TokenKind::EndLoop, Block::End, r#""That's what I did""#)?;
        Ok((Stmt::Switch(Box::new(StmtSwitch { value, cases, default })), start..self.prev_end()))
    }

    /// Statements up to (not including) one of `ends`.
    fn block(&mut self, ends: &[(TokenKind, Block)]) -> Result<StmtBlock> {
        let mut stmts = Vec::new();
        loop {
            self.skip_punctuation();
            let token = self.peek();
            if token.kind == TokenKind::Eof || ends.iter().any(|&(kind, block)| token.is(kind, block)) {
                break;
            }
            stmts.push(self.statement()?);
        }
        Ok(StmtBlock { stmts })
    }

    fn expr(&mut self) -> Result<ExprS> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<ExprS> {
        let target = self.xor()?;
        if self.eat_if(TokenKind::Assign, Block::None).is_none() {
            return Ok(target);
        }
        let value = self.assignment()?;
        self.assign(target, value)
    }

    fn assign(&self, target: ExprS, value: ExprS) -> Result<ExprS> {
        let span = join(&target.1, &value.1);
        let expr = match target.0 {
            Expr::Var(var) => Expr::Assign(Box::new(ExprAssign { var: var.var, value })),
            Expr::Get(get) => Expr::Set(Box::new(ExprSet { object: get.object, accessor: get.accessor, value })),
            _ => return Err(self.unexpected_at("a variable to change", &target.1)),
        };
        Ok((expr, span))
    }

    fn xor(&mut self) -> Result<ExprS> {
        if !self.check_block(TokenKind::Xor, Block::BeginPartner) {
            return self.or();
        }
        let start = self.advance().span.start;
        let lt = self.or()?;
        self.eat(TokenKind::Xor, Block::EndPartner, r#""or""#)?;
        let rt = self.or()?;
        let span = start..rt.1.end;
        Ok((Expr::Infix(Box::new(ExprInfix { lt, op: OpInfix::Xor, rt })), span))
    }

    fn or(&mut self) -> Result<ExprS> {
        self.infix(&[(TokenKind::Or, OpInfix::Or)], Self::and)
    }

    fn and(&mut self) -> Result<ExprS> {
        self.infix(&[(TokenKind::And, OpInfix::And)], Self::equality)
    }

    fn equality(&mut self) -> Result<ExprS> {
        let ops = [(TokenKind::Equal, OpInfix::Equal), (TokenKind::NotEqual, OpInfix::NotEqual)];
        self.infix(&ops, Self::comparison)
    }

    fn comparison(&mut self) -> Result<ExprS> {
        let ops = [
            (TokenKind::GreaterThan, OpInfix::Greater),
            (TokenKind::GreaterThanOrEqual, OpInfix::GreaterEqual),
            (TokenKind::LessThan, OpInfix::Less),
            (TokenKind::LessThanOrEqual, OpInfix::LessEqual),
        ];
        self.infix(&ops, Self::term)
    }

    fn term(&mut self) -> Result<ExprS> {
        let ops = [(TokenKind::Addition, OpInfix::Add), (TokenKind::Subtraction, OpInfix::Subtract)];
        self.arithmetic(&ops, Self::factor)
    }

    fn factor(&mut self) -> Result<ExprS> {
        let ops = [
            (TokenKind::Multiplication, OpInfix::Multiply),
            (TokenKind::Division, OpInfix::Divide),
            (TokenKind::Modulo, OpInfix::Modulo),
        ];
        self.arithmetic(&ops, Self::unary)
    }

    /// An arithmetic level, written either infix ("X plus Y") or with a
    /// prefix and a closing partner of the same kind ("add X and Y").
    fn arithmetic(&mut self, ops: &Operators, operand: fn(&mut Self) -> Result<ExprS>) -> Result<ExprS> {
        let token = self.peek().clone();
        let prefix = ops.iter().find(|(kind, _)| *kind == token.kind && token.block == Block::BeginPartner);
        let (kind, op) = match prefix {
            Some(&prefix) => prefix,
            None => return self.infix(ops, operand),
        };

        self.advance();
        let lt = self.arithmetic(ops, operand)?;
        let closer = self.eat(kind, Block::EndPartner, &format!(r#"the word that finishes "{}""#, token.text))?;
        let rt = self.arithmetic(ops, operand)?;
        // "subtract X from Y" takes X away from Y.
        let (lt, rt) = if closer.text == "from" { (rt, lt) } else { (lt, rt) };
        let span = token.span.start..self.prev_end();
        Ok((Expr::Infix(Box::new(ExprInfix { lt, op, rt })), span))
    }

    fn infix(&mut self, ops: &Operators, operand: fn(&mut Self) -> Result<ExprS>) -> Result<ExprS> {
        let mut lt = operand(self)?;
        while let Some(op) = self.infix_op(ops) {
            self.advance();
            let rt = operand(self)?;
            let span = join(&lt.1, &rt.1);
            lt = (Expr::Infix(Box::new(ExprInfix { lt, op, rt })), span);
        }
        Ok(lt)
    }

    fn infix_op(&self, ops: &Operators) -> Option<OpInfix> {
        let token = self.peek();
        if token.block != Block::None {
            return None;
        }
        ops.iter().find(|(kind, _)| *kind == token.kind).map(|&(_, op)| op)
    }

    fn unary(&mut self) -> Result<ExprS> {
        if !self.check(TokenKind::Not) {
            return self.concat();
        }
        let start = self.advance().span.start;
        let rt = self.unary()?;
        let span = start..rt.1.end;
        Ok((Expr::Prefix(Box::new(ExprPrefix { op: OpPrefix::Not, rt })), span))
    }

    /// Values written next to each other are joined as text.
    fn concat(&mut self) -> Result<ExprS> {
        let mut lt = self.call()?;
        while self.check(TokenKind::Name) || self.peek().kind.is_literal() {
            let rt = self.call()?;
            let span = join(&lt.1, &rt.1);
            lt = (Expr::Infix(Box::new(ExprInfix { lt, op: OpInfix::Concat, rt })), span);
        }
        Ok(lt)
    }

    fn call(&mut self) -> Result<ExprS> {
        let mut expr = self.primary()?;
        loop {
            match self.peek().kind {
                TokenKind::Access => {
                    self.advance();
                    let token = self.peek().clone();
                    let accessor = match token.kind {
                        TokenKind::Name => {
                            self.advance();
                            let (type_, name) = self.separate_type(&token.text);
                            (Expr::Var(ExprVar { var: Var::new(name, type_) }), token.span)
                        }
                        TokenKind::Number => self.primary()?,
                        _ => return Err(self.unexpected(r#"a name after "`s""#)),
                    };
                    let span = join(&expr.1, &accessor.1);
                    expr = (Expr::Get(Box::new(ExprGet { object: expr, accessor })), span);
                }
                TokenKind::Parameters => {
                    self.advance();
                    let mut args = vec![self.equality()?];
                    while self.eat_if(TokenKind::And, Block::None).is_some() {
                        args.push(self.equality()?);
                    }
                    let span = expr.1.start..self.prev_end();
                    expr = (Expr::Call(Box::new(ExprCall { callee: expr, args })), span);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<ExprS> {
        let token = self.peek().clone();
        let literal = match token.kind {
            TokenKind::Name => return self.variable(),
            TokenKind::Number => match separate_type(&token.text).1.parse() {
                Ok(number) => ExprLiteral::Number(number),
                Err(_) => return Err(self.unexpected("a number")),
            },
            TokenKind::String => ExprLiteral::String(unquote(&token.text).to_string()),
            TokenKind::Char => match token.text.chars().rev().nth(1) {
                Some(c) => ExprLiteral::Char(c),
                None => return Err(self.unexpected("a letter")),
            },
            TokenKind::True => ExprLiteral::Bool(true),
            TokenKind::False => ExprLiteral::Bool(false),
            TokenKind::Null => ExprLiteral::Null,
            _ => return Err(self.unexpected("a value")),
        };
        self.advance();
        Ok((Expr::Literal(literal), token.span))
    }

    fn variable(&mut self) -> Result<ExprS> {
        let token = self.advance();
        if token.text.contains(is_quote) {
            return Err(Error::ParseError(ParseError::UnterminatedString { text: token.text, span: token.span }));
        }
        let (type_, name) = self.separate_type(&token.text);
        if !self.names.contains(name) {
            if let Some((base, index)) = split_index(name) {
                let object = (Expr::Var(ExprVar { var: Var::new(base, type_) }), token.span.clone());
                let accessor = (Expr::Literal(ExprLiteral::Number(index)), token.span.clone());
                return Ok((Expr::Get(Box::new(ExprGet { object, accessor })), token.span));
            }
        }
        Ok((Expr::Var(ExprVar { var: Var::new(name, type_) }), token.span))
    }

    /// A declared name is used whole even when it starts with a type word.
    fn separate_type<'t>(&self, text: &'t str) -> (Option<Type>, &'t str) {
        if self.names.contains(text) {
            return (None, text);
        }
        separate_type(text)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.current + 1).min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_block(&self, kind: TokenKind, block: Block) -> bool {
        self.peek().is(kind, block)
    }

    fn at_sentence_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Punctuation | TokenKind::Eof)
    }

    fn next_ends_sentence(&self) -> bool {
        matches!(self.peek_next().kind, TokenKind::Punctuation | TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn prev_end(&self) -> usize {
        match self.current {
            0 => 0,
            current => self.tokens[current - 1].span.end,
        }
    }

    fn eat(&mut self, kind: TokenKind, block: Block, expected: &str) -> Result<Token> {
        if self.check_block(kind, block) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn eat_name(&mut self, expected: &str) -> Result<Token> {
        self.eat(TokenKind::Name, Block::None, expected)
    }

    fn eat_if(&mut self, kind: TokenKind, block: Block) -> Option<Token> {
        self.check_block(kind, block).then(|| self.advance())
    }

    fn skip_punctuation(&mut self) {
        while self.check(TokenKind::Punctuation) {
            self.advance();
        }
    }

    /// Sentences end in punctuation, except for the last one in the program.
    fn end_sentence(&mut self) -> Result<()> {
        match self.peek().kind {
            TokenKind::Punctuation => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("punctuation to end the sentence")),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = self.peek();
        let expected = expected.to_string();
        let span = token.span.clone();
        match token.kind {
            TokenKind::Eof => Error::ParseError(ParseError::UnexpectedEof { expected, span }),
            _ => Error::ParseError(ParseError::UnexpectedToken { expected, found: token.text.clone(), span }),
        }
    }

    fn unexpected_at(&self, expected: &str, span: &Span) -> Error {
        let found = self
            .tokens
            .iter()
            .filter(|token| token.span.start >= span.start && token.span.end <= span.end)
            .map(|token| token.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Error::ParseError(ParseError::UnexpectedToken { expected: expected.to_string(), found, span: span.clone() })
    }
}

/// Collects the names introduced by variable declarations, loop headers and
/// paragraph headers. Loop variables and parameters lose their type prefix.
fn declared_names(tokens: &[Token]) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    let mut in_header = false;
    for pair in tokens.windows(2) {
        let (token, next) = (&pair[0], &pair[1]);
        if next.kind != TokenKind::Name {
            in_header &= token.kind != TokenKind::Punctuation;
            continue;
        }
        match (token.kind, token.block) {
            (TokenKind::Paragraph | TokenKind::ManeParagraph, Block::Begin) => {
                in_header = true;
                names.insert(next.text.clone());
            }
            (TokenKind::Punctuation, _) => in_header = false,
            (TokenKind::Var, Block::BeginPartner) => {
                names.insert(next.text.clone());
            }
            (TokenKind::For, Block::BeginPartner) => {
                names.insert(separate_type(&next.text).1.to_string());
            }
            (TokenKind::Parameters | TokenKind::And, _) if in_header => {
                names.insert(separate_type(&next.text).1.to_string());
            }
            _ => (),
        }
    }
    names
}

fn split_index(name: &str) -> Option<(&str, f64)> {
    let captures = INDEXED.captures(name)?;
    let base = captures.get(1)?.as_str();
    let index = captures.get(2)?.as_str().parse().ok()?;
    Some((base, index))
}

fn parse_type(text: &str) -> Type {
    type_name(text).or_else(|| plural_type(text)).unwrap_or_else(|| Type::Class(text.to_string()))
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '“' | '”')
}

/// The text between the first and the last quote.
fn unquote(text: &str) -> &str {
    let start = text.find(is_quote).map_or(0, |idx| idx + text[idx..].chars().next().map_or(0, char::len_utf8));
    let end = text.rfind(is_quote).unwrap_or(text.len());
    text.get(start..end).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Vec<Stmt>> {
        let program = Parser::new(tokenize(source)).parse()?;
        Ok(program.stmts.into_iter().map(|(stmt, _)| stmt).collect())
    }

    fn number(value: f64) -> Expr {
        Expr::Literal(ExprLiteral::Number(value))
    }

    fn printed(source: &str) -> Expr {
        match parse(source).unwrap().into_iter().next() {
            Some(Stmt::Print(print)) => print.value.0,
            stmt => panic!("expected a print statement, got {stmt:?}"),
        }
    }

    fn infix(expr: &Expr) -> &ExprInfix {
        match expr {
            Expr::Infix(infix) => infix,
            _ => panic!("expected an infix expression, got {expr:?}"),
        }
    }

    fn var_name(expr: &Expr) -> &str {
        match expr {
            Expr::Var(var) => &var.var.name,
            _ => panic!("expected a variable, got {expr:?}"),
        }
    }

    #[test]
    fn parse_prefix_addition() {
        let expr = printed("I said add 2 and 3.");
        let infix = infix(&expr);
        assert_eq!(OpInfix::Add, infix.op);
        assert_eq!(number(2.0), infix.lt.0);
        assert_eq!(number(3.0), infix.rt.0);
    }

    #[test]
    fn parse_subtract_from_swaps_operands() {
        let expr = printed("I said subtract 5 from 7.");
        let infix = infix(&expr);
        assert_eq!(OpInfix::Subtract, infix.op);
        assert_eq!(number(7.0), infix.lt.0);
        assert_eq!(number(5.0), infix.rt.0);

        let expr = printed("I said subtract 5 and 7.");
        assert_eq!(number(5.0), self::infix(&expr).lt.0);
    }

    #[test]
    fn parse_multiplication_binds_tighter() {
        let expr = printed("I said 2 plus 3 times 4.");
        let add = infix(&expr);
        assert_eq!(OpInfix::Add, add.op);
        assert_eq!(number(2.0), add.lt.0);
        assert_eq!(OpInfix::Multiply, infix(&add.rt.0).op);
    }

    #[test]
    fn parse_xor() {
        let expr = printed("I said either true or false.");
        let xor = infix(&expr);
        assert_eq!(OpInfix::Xor, xor.op);
        assert_eq!(Expr::Literal(ExprLiteral::Bool(true)), xor.lt.0);
        assert_eq!(Expr::Literal(ExprLiteral::Bool(false)), xor.rt.0);
    }

    #[test]
    fn parse_concatenation() {
        let expr = printed(r#"I said "Hello " Applejack "!"."#);
        let outer = infix(&expr);
        assert_eq!(OpInfix::Concat, outer.op);
        assert_eq!(Expr::Literal(ExprLiteral::String("!".to_string())), outer.rt.0);
        let inner = infix(&outer.lt.0);
        assert_eq!(Expr::Literal(ExprLiteral::String("Hello ".to_string())), inner.lt.0);
        assert_eq!("Applejack", var_name(&inner.rt.0));
    }

    #[test]
    fn parse_method_call() {
        let expr = printed("I said Math`s minimum using 42 and 69!");
        let call = match &expr {
            Expr::Call(call) => call,
            _ => panic!("expected a call, got {expr:?}"),
        };
        let get = match &call.callee.0 {
            Expr::Get(get) => get,
            callee => panic!("expected a member access, got {callee:?}"),
        };
        assert_eq!("Math", var_name(&get.object.0));
        assert_eq!(Some("minimum"), get.name());
        let args = call.args.iter().map(|(arg, _)| arg).collect::<Vec<_>>();
        assert_eq!(vec![&number(42.0), &number(69.0)], args);
    }

    #[test]
    fn parse_declarations() {
        let stmts = parse("Did you know that Applejack likes the number 99? Did you know that Pi is always 3.14?").unwrap();
        match &stmts[..] {
            [Stmt::Var(applejack), Stmt::Var(pi)] => {
                assert_eq!("Applejack", applejack.name);
                assert_eq!(Some(&number(99.0)), applejack.value.as_ref().map(|(value, _)| value));
                assert!(!applejack.constant);
                assert_eq!("Pi", pi.name);
                assert!(pi.constant);
            }
            _ => panic!("expected two declarations, got {stmts:?}"),
        }
    }

    #[test]
    fn parse_typed_declaration_without_value() {
        let stmts = parse("Did you know that string is a word?").unwrap();
        assert_eq!(
            vec![Stmt::Var(StmtVar { name: "string".to_string(), type_: Some(Type::String), value: None, constant: false })],
            stmts
        );
    }

    #[test]
    fn declared_names_keep_type_words() {
        let stmts = parse("Did you know that word count is 5? I said word count.").unwrap();
        match &stmts[..] {
            [Stmt::Var(var), Stmt::Print(print)] => {
                assert_eq!("word count", var.name);
                assert_eq!(None, var.type_);
                assert_eq!("word count", var_name(&print.value.0));
            }
            _ => panic!("expected a declaration and a print, got {stmts:?}"),
        }
    }

    #[test]
    fn parse_arrays_and_indices() {
        let stmts = parse(
            r#"Did you know that cake has many words?
            cake 1 is the word "Mango Cake".
            Did you know that Apples has words "Gala" and "Red Delicious"?"#,
        )
        .unwrap();
        match &stmts[..] {
            [Stmt::Array(cake), Stmt::ArraySet(set), Stmt::Array(apples)] => {
                assert_eq!("cake", cake.name);
                assert_eq!("words", cake.elem_type.0);
                assert!(cake.value.is_none());
                assert_eq!("cake", var_name(&set.array.0));
                assert_eq!(number(1.0), set.index.0);
                assert_eq!(Expr::Literal(ExprLiteral::String("Mango Cake".to_string())), set.value.0);
                assert_eq!(OpInfix::And, infix(&apples.value.as_ref().unwrap().0).op);
            }
            _ => panic!("unexpected statements {stmts:?}"),
        }
    }

    #[test]
    fn parse_declared_name_with_number_is_not_an_index() {
        let expr = match parse("Did you know that string 2 is nothing? I said string 2.").unwrap().pop() {
            Some(Stmt::Print(print)) => print.value.0,
            stmt => panic!("expected a print statement, got {stmt:?}"),
        };
        assert_eq!("string 2", var_name(&expr));
    }

    #[test]
    fn parse_for_loop_desugars() {
        let stmts = parse("For every number x from 1 to 5, I said x! That's what I did.").unwrap();
        let stmt = match &stmts[..] {
            [Stmt::For(stmt)] => stmt,
            _ => panic!("expected a for loop, got {stmts:?}"),
        };
        assert_eq!("x", stmt.init.0.name);
        assert_eq!(Some(Type::Number), stmt.init.0.type_);
        let cond = infix(&stmt.cond.0);
        assert_eq!(OpInfix::LessEqual, cond.op);
        assert_eq!(number(5.0), cond.rt.0);
        assert!(matches!(stmt.body.stmts.last(), Some((Stmt::Increment(_), _))));
        assert_eq!(2, stmt.body.stmts.len());
    }

    #[test]
    fn parse_if_else() {
        let stmts = parse("If x is 5, I said 1. Otherwise, I said 2. I said 3. That's what I would do.").unwrap();
        match &stmts[..] {
            [Stmt::If(stmt)] => {
                assert_eq!(OpInfix::Equal, infix(&stmt.cond.0).op);
                assert_eq!(1, stmt.then.stmts.len());
                assert_eq!(2, stmt.else_.as_ref().unwrap().stmts.len());
            }
            _ => panic!("expected an if statement, got {stmts:?}"),
        }
    }

    #[test]
    fn parse_switch() {
        let stmts = parse(
            "In regards to tail:
            On the 1st hoof... I said 1.
            On the 2nd hoof... I said 2. I said 3.
            If all else fails... I said 0.
            That's what I did.",
        )
        .unwrap();
        match &stmts[..] {
            [Stmt::Switch(stmt)] => {
                assert_eq!(2, stmt.cases.len());
                assert_eq!(number(2.0), stmt.cases[1].0 .0);
                assert_eq!(2, stmt.cases[1].1.stmts.len());
                assert!(stmt.default.is_some());
            }
            _ => panic!("expected a switch, got {stmts:?}"),
        }
    }

    #[test]
    fn parse_class() {
        let stmts = parse(
            "Dear Princess Celestia and Flying: Letter.
            Did you know that x is 1?
            I learned how to fly to get a number using the height.
                Then you get x.
            That's all about how to fly.
            Your faithful student, Twilight Sparkle.",
        )
        .unwrap();
        let class = match &stmts[..] {
            [Stmt::Class(class)] => class,
            _ => panic!("expected a class, got {stmts:?}"),
        };
        assert_eq!("Letter", class.name);
        assert_eq!("Princess Celestia", class.super_.0.name);
        assert_eq!(vec!["Flying"], class.interfaces.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>());
        assert_eq!(1, class.fields.len());
        assert_eq!("Twilight Sparkle", class.author);

        let method = &class.methods[0].0;
        assert_eq!("how to fly", method.name);
        assert_eq!(Some(Type::Number), method.return_type);
        assert_eq!(vec![Param { name: "the height".to_string(), type_: None }], method.params);
        assert!(!method.is_main);
    }

    #[test]
    fn class_is_signed_by_its_author() {
        let stmts = parse("Dear Princess Celestia: Letter. Your faithful student, Spike.").unwrap();
        match &stmts[..] {
            [Stmt::Class(class)] => assert_eq!(("Letter", "Spike"), (class.name.as_str(), class.author.as_str())),
            _ => panic!("expected a class, got {stmts:?}"),
        }
    }

    #[test]
    fn parse_interface() {
        let stmts = parse("Flying:\nI learned how to fly.\nI learned how to land.\nYour faithful student, Luna.").unwrap();
        match &stmts[..] {
            [Stmt::Interface(interface)] => {
                assert_eq!("Flying", interface.name);
                let methods = interface.methods.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
                assert_eq!(vec!["how to fly", "how to land"], methods);
            }
            _ => panic!("expected an interface, got {stmts:?}"),
        }
    }

    #[test]
    fn parse_steps() {
        let stmts = parse("There was one more x. x got one less. I would add 5 to x.").unwrap();
        match &stmts[..] {
            [Stmt::Increment(first), Stmt::Decrement(second), Stmt::Increment(third)] => {
                assert!(first.amount.is_none());
                assert_eq!("x", var_name(&second.target.0));
                assert_eq!(Some(&number(5.0)), third.amount.as_ref().map(|(amount, _)| amount));
            }
            _ => panic!("unexpected statements {stmts:?}"),
        }
    }

    #[test]
    fn parse_error_mismatched_paragraph_name() {
        let err = parse("I learned flying. I said 1. That's all about flight.").unwrap_err();
        assert_eq!(
            "ParseError: the paragraph \"flying\" must end with its own name, not \"flight\"",
            err.to_string()
        );
    }

    #[test]
    fn parse_error_missing_terminator() {
        let err = parse("If x is 5, I said x.").unwrap_err();
        assert_eq!(
            "ParseError: expected \"That's what I would do\", found the end of the program",
            err.to_string()
        );
    }

    #[test]
    fn parse_error_unterminated_string() {
        let err = parse(r#"I said "Hello."#).unwrap_err();
        assert_eq!(r#"ParseError: unterminated quote in "Hello"#, err.to_string());
    }

    #[test]
    fn parse_error_unexpected_token() {
        let err = parse("Did you know that x?").unwrap_err();
        assert_eq!(r#"ParseError: expected "is", "has" or "likes", found "?""#, err.to_string());
    }
}
