use std::mem;

use fim_common::error::{Error, ResolveError, Result};
use fim_common::types::Span;
use fim_syntax::ast::{
    Expr, ExprLiteral, ExprS, OpInfix, Program, Stmt, StmtArray, StmtBlock, StmtClass, StmtFun, StmtS, StmtStep,
    StmtVar, Var, VarId,
};
use fim_syntax::types::{plural_type, Type};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::object::ROOT_CLASS;

/// Scope distance of every name reference that resolved to a frame below the
/// globals.
pub type Locals = FxHashMap<VarId, usize>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FunctionType {
    None,
    Function,
    Method,
}

#[derive(Debug)]
struct Binding {
    defined: bool,
    type_: Option<Type>,
    constant: bool,
}

/// A class that promised an interface before the interface was declared.
#[derive(Debug)]
struct PendingCheck {
    class: String,
    methods: FxHashSet<String>,
    span: Span,
}

#[derive(Debug)]
pub struct Resolver {
    scopes: Vec<FxHashMap<String, Binding>>,
    locals: Locals,
    function: FunctionType,
    return_type: Option<Type>,
    in_class: bool,
    main: Option<String>,
    interfaces: FxHashMap<String, Vec<String>>,
    pending: FxHashMap<String, Vec<PendingCheck>>,
}

impl Default for Resolver {
    fn default() -> Self {
        let mut resolver = Self {
            scopes: Vec::new(),
            locals: Locals::default(),
            function: FunctionType::None,
            return_type: None,
            in_class: false,
            main: None,
            interfaces: FxHashMap::default(),
            pending: FxHashMap::default(),
        };
        resolver.begin_scope();
        resolver.define(ROOT_CLASS, Some(Type::Class(ROOT_CLASS.to_string())), true);
        resolver
    }
}

impl Resolver {
    pub fn resolve(mut self, program: &Program) -> Result<Locals> {
        // Classes and imported modules can be named before they are written.
        for (stmt, span) in &program.stmts {
            match stmt {
                Stmt::Class(class) => self.declare_define(&class.name, Some(Type::Class(class.name.clone())), span)?,
                Stmt::Import(import) => {
                    self.declare_define(&import.name, Some(Type::Class(import.name.clone())), span)?
                }
                _ => (),
            }
        }
        for stmt_s in &program.stmts {
            self.resolve_stmt(stmt_s)?;
        }

        let unknown = self
            .pending
            .into_iter()
            .flat_map(|(interface, checks)| checks.into_iter().map(move |check| (interface.clone(), check)))
            .min_by_key(|(_, check)| check.span.start);
        if let Some((interface, check)) = unknown {
            return Err(Error::ResolveError(ResolveError::UnknownInterface {
                class: check.class,
                interface,
                span: check.span,
            }));
        }

        tracing::debug!(locals = self.locals.len(), "resolved program");
        Ok(self.locals)
    }

    fn resolve_stmt(&mut self, stmt_s: &StmtS) -> Result<()> {
        let (stmt, span) = stmt_s;
        match stmt {
            Stmt::Array(array) => self.resolve_array(array, span),
            Stmt::ArraySet(set) => {
                self.resolve_expr(&set.array)?;
                self.resolve_expr(&set.index)?;
                self.resolve_expr(&set.value)?;
                match self.infer(&set.array) {
                    Some(Type::Array(elem)) => self.check_type(&elem, &set.value),
                    Some(Type::Class(_)) | None => Ok(()),
                    Some(_) => Err(Error::ResolveError(ResolveError::NotAnArray {
                        name: describe(&set.array),
                        span: set.array.1.clone(),
                    })),
                }
            }
            Stmt::Class(class) => self.resolve_class(class, span),
            Stmt::Decrement(step) | Stmt::Increment(step) => self.resolve_step(step),
            Stmt::DoWhile(do_while) => {
                self.resolve_block(&do_while.body)?;
                self.resolve_expr(&do_while.cond)
            }
            Stmt::Expr(expr) => self.resolve_expr(&expr.value),
            Stmt::For(for_) => {
                self.begin_scope();
                let (init, init_span) = &for_.init;
                self.resolve_var_decl(init, init_span)?;
                self.resolve_expr(&for_.cond)?;
                self.resolve_block(&for_.body)?;
                self.end_scope();
                Ok(())
            }
            Stmt::ForIter(for_) => {
                self.resolve_expr(&for_.iterable)?;
                let elem = match self.infer(&for_.iterable) {
                    Some(Type::Array(elem)) => Some(*elem),
                    Some(Type::String) => Some(Type::Char),
                    Some(Type::Class(_)) | None => None,
                    Some(type_) => {
                        return Err(Error::ResolveError(ResolveError::NotIterable {
                            type_: type_.to_string(),
                            span: for_.iterable.1.clone(),
                        }));
                    }
                };
                if let (Some(declared), Some(elem)) = (&for_.var.type_, &elem) {
                    if !compatible(declared, elem) {
                        return Err(Error::ResolveError(ResolveError::TypeMismatch {
                            expected: declared.to_string(),
                            found: elem.to_string(),
                            span: for_.iterable.1.clone(),
                        }));
                    }
                }
                self.begin_scope();
                self.declare_define(&for_.var.name, for_.var.type_.clone().or(elem), span)?;
                self.resolve_block(&for_.body)?;
                self.end_scope();
                Ok(())
            }
            Stmt::Fun(fun) => {
                self.declare_define(&fun.name, fun.return_type.clone(), span)?;
                self.resolve_fun(fun, span, FunctionType::Function)
            }
            Stmt::If(if_) => {
                self.resolve_expr(&if_.cond)?;
                self.resolve_block(&if_.then)?;
                if let Some(else_) = &if_.else_ {
                    self.resolve_block(else_)?;
                }
                Ok(())
            }
            Stmt::Import(_) => Ok(()),
            Stmt::Interface(interface) => {
                let required = interface.methods.iter().map(|(method, _)| method.to_string()).collect::<Vec<_>>();
                for check in self.pending.remove(&interface.name).unwrap_or_default() {
                    check_interface(&check.class, &interface.name, &required, &check.methods, &check.span)?;
                }
                self.interfaces.insert(interface.name.to_string(), required);
                Ok(())
            }
            Stmt::Print(print) => self.resolve_expr(&print.value),
            Stmt::Read(read) => {
                let (var, var_span) = &read.var;
                self.resolve_var(var, var_span)?;
                self.check_assign(var, var_span)?;
                if let Some(prompt) = &read.prompt {
                    self.resolve_expr(prompt)?;
                }
                Ok(())
            }
            Stmt::Return(return_) => {
                if self.function == FunctionType::None {
                    return Err(Error::ResolveError(ResolveError::ReturnOutsideFunction { span: span.clone() }));
                }
                self.resolve_expr(&return_.value)?;
                match self.return_type.clone() {
                    Some(return_type) => self.check_type(&return_type, &return_.value),
                    None => Ok(()),
                }
            }
            Stmt::Switch(switch) => {
                self.resolve_expr(&switch.value)?;
                for (key, body) in &switch.cases {
                    self.resolve_expr(key)?;
                    self.resolve_block(body)?;
                }
                if let Some(default) = &switch.default {
                    self.resolve_block(default)?;
                }
                Ok(())
            }
            Stmt::Var(var) => self.resolve_var_decl(var, span),
            Stmt::While(while_) => {
                self.resolve_expr(&while_.cond)?;
                self.resolve_block(&while_.body)
            }
        }
    }

    fn resolve_expr(&mut self, expr_s: &ExprS) -> Result<()> {
        let (expr, span) = expr_s;
        match expr {
            Expr::Assign(assign) => {
                self.resolve_expr(&assign.value)?;
                self.resolve_var(&assign.var, span)?;
                self.check_assign(&assign.var, span)?;
                match self.lookup_type(&assign.var.name) {
                    Some(type_) => self.check_type(&type_, &assign.value),
                    None => Ok(()),
                }
            }
            Expr::Call(call) => {
                self.resolve_expr(&call.callee)?;
                for arg in &call.args {
                    self.resolve_expr(arg)?;
                }
                Ok(())
            }
            Expr::Get(get) => {
                self.resolve_expr(&get.object)?;
                self.resolve_accessor(&get.accessor)
            }
            Expr::Infix(infix) => {
                self.resolve_expr(&infix.lt)?;
                self.resolve_expr(&infix.rt)
            }
            Expr::Literal(_) => Ok(()),
            Expr::Prefix(prefix) => self.resolve_expr(&prefix.rt),
            Expr::Set(set) => {
                self.resolve_expr(&set.value)?;
                self.resolve_expr(&set.object)?;
                self.resolve_accessor(&set.accessor)
            }
            Expr::Var(var) => {
                let var = &var.var;
                if let Some(scope) = self.scopes.last() {
                    if matches!(scope.get(&var.name), Some(Binding { defined: false, .. })) {
                        return Err(Error::ResolveError(ResolveError::AccessInsideInitializer {
                            name: var.name.clone(),
                            span: span.clone(),
                        }));
                    }
                }
                self.resolve_var(var, span)?;
                if let (Some(declared), Some(bound)) = (&var.type_, self.lookup_type(&var.name)) {
                    if !compatible(declared, &bound) {
                        return Err(Error::ResolveError(ResolveError::TypeMismatch {
                            expected: declared.to_string(),
                            found: bound.to_string(),
                            span: span.clone(),
                        }));
                    }
                }
                Ok(())
            }
        }
    }

    fn resolve_array(&mut self, array: &StmtArray, span: &Span) -> Result<()> {
        let (elem_type, elem_span) = &array.elem_type;
        let type_ = plural_type(elem_type).ok_or_else(|| {
            Error::ResolveError(ResolveError::NotPlural { name: elem_type.to_string(), span: elem_span.clone() })
        })?;
        self.declare(&array.name, span)?;
        if let Some(value) = &array.value {
            self.resolve_expr(value)?;
            if let Type::Array(elem) = &type_ {
                for value in array_elems(value) {
                    self.check_type(elem, value)?;
                }
            }
        }
        self.define(&array.name, Some(type_), array.constant);
        Ok(())
    }

    fn resolve_class(&mut self, class: &StmtClass, span: &Span) -> Result<()> {
        let (super_, super_span) = &class.super_;
        if super_.name == class.name {
            return Err(Error::ResolveError(ResolveError::InheritFromSelf {
                name: class.name.clone(),
                span: super_span.clone(),
            }));
        }
        self.resolve_var(super_, super_span)?;
        if !self.is_declared(&class.name) {
            self.declare_define(&class.name, Some(Type::Class(class.name.clone())), span)?;
        }

        let methods = class.methods.iter().map(|(method, _)| method.name.to_string()).collect::<FxHashSet<_>>();
        for (interface, interface_span) in &class.interfaces {
            match self.interfaces.get(interface) {
                Some(required) => check_interface(&class.name, interface, required, &methods, interface_span)?,
                None => self.pending.entry(interface.to_string()).or_default().push(PendingCheck {
                    class: class.name.to_string(),
                    methods: methods.clone(),
                    span: interface_span.clone(),
                }),
            }
        }

        let in_class = mem::replace(&mut self.in_class, true);
        self.begin_scope();
        self.declare_define("this", Some(Type::Class(class.name.clone())), span)?;
        for field in &class.fields {
            self.begin_scope();
            self.resolve_stmt(field)?;
            self.end_scope();
        }
        for (method, span) in &class.methods {
            self.resolve_fun(method, span, FunctionType::Method)?;
        }
        self.end_scope();
        self.in_class = in_class;
        Ok(())
    }

    fn resolve_fun(&mut self, fun: &StmtFun, span: &Span, type_: FunctionType) -> Result<()> {
        if fun.is_main {
            if self.main.is_some() {
                return Err(Error::ResolveError(ResolveError::DuplicateMain { name: fun.name.clone(), span: span.clone() }));
            }
            self.main = Some(fun.name.clone());
        }

        let function = mem::replace(&mut self.function, type_);
        let return_type = mem::replace(&mut self.return_type, fun.return_type.clone());
        self.begin_scope();
        for param in &fun.params {
            self.declare_define(&param.name, param.type_.clone(), span)?;
        }
        self.resolve_block(&fun.body)?;
        self.end_scope();
        self.function = function;
        self.return_type = return_type;
        Ok(())
    }

    fn resolve_block(&mut self, block: &StmtBlock) -> Result<()> {
        self.begin_scope();
        for stmt_s in &block.stmts {
            self.resolve_stmt(stmt_s)?;
        }
        self.end_scope();
        Ok(())
    }

    fn resolve_var_decl(&mut self, var: &StmtVar, span: &Span) -> Result<()> {
        self.declare(&var.name, span)?;
        if let Some(value) = &var.value {
            self.resolve_expr(value)?;
            if let Some(type_) = &var.type_ {
                self.check_type(type_, value)?;
            }
        }
        let type_ = var.type_.clone().or_else(|| var.value.as_ref().and_then(|value| self.infer(value)));
        self.define(&var.name, type_, var.constant);
        Ok(())
    }

    fn resolve_step(&mut self, step: &StmtStep) -> Result<()> {
        self.resolve_expr(&step.target)?;
        if let Some(amount) = &step.amount {
            self.resolve_expr(amount)?;
            self.check_type(&Type::Number, amount)?;
        }
        if let Expr::Var(var) = &step.target.0 {
            self.check_assign(&var.var, &step.target.1)?;
        }
        self.check_type(&Type::Number, &step.target)
    }

    /// A name after "`s" may be a variable holding an index, or the name of
    /// a field that no scope knows about.
    fn resolve_accessor(&mut self, accessor: &ExprS) -> Result<()> {
        match &accessor.0 {
            Expr::Var(var) => {
                if let Some(depth) = self.depth_of(&var.var.name) {
                    self.record(&var.var, depth);
                }
                Ok(())
            }
            _ => self.resolve_expr(accessor),
        }
    }

    fn resolve_var(&mut self, var: &Var, span: &Span) -> Result<()> {
        match self.depth_of(&var.name) {
            Some(depth) => {
                self.record(var, depth);
                Ok(())
            }
            // Inside a class, unknown names may still be fields or methods.
            None if self.in_class => Ok(()),
            None => Err(Error::ResolveError(ResolveError::NotDefined { name: var.name.clone(), span: span.clone() })),
        }
    }

    fn depth_of(&self, name: &str) -> Option<usize> {
        self.scopes.iter().rev().position(|scope| scope.contains_key(name))
    }

    /// Names bound in the outermost scope are looked up as globals.
    fn record(&mut self, var: &Var, depth: usize) {
        if depth + 1 < self.scopes.len() {
            self.locals.insert(var.id, depth);
        }
    }

    fn check_assign(&self, var: &Var, span: &Span) -> Result<()> {
        match self.scopes.iter().rev().find_map(|scope| scope.get(&var.name)) {
            Some(Binding { constant: true, .. }) => {
                Err(Error::ResolveError(ResolveError::AssignToConstant { name: var.name.clone(), span: span.clone() }))
            }
            _ => Ok(()),
        }
    }

    fn check_type(&self, expected: &Type, expr: &ExprS) -> Result<()> {
        match self.infer(expr) {
            Some(found) if !compatible(expected, &found) => Err(Error::ResolveError(ResolveError::TypeMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
                span: expr.1.clone(),
            })),
            _ => Ok(()),
        }
    }

    /// Static type of `expr`, where it can be told without running it.
    fn infer(&self, expr_s: &ExprS) -> Option<Type> {
        match &expr_s.0 {
            Expr::Assign(assign) => self.infer(&assign.value),
            Expr::Call(call) => match &call.callee.0 {
                Expr::Var(var) => self.lookup_type(&var.var.name),
                _ => None,
            },
            Expr::Get(get) => match self.infer(&get.object) {
                Some(Type::Array(elem)) => Some(*elem),
                _ => None,
            },
            Expr::Infix(infix) => match infix.op {
                OpInfix::Add | OpInfix::And => match (self.infer(&infix.lt), self.infer(&infix.rt)) {
                    (Some(Type::Number), Some(Type::Number)) => Some(Type::Number),
                    (Some(Type::String), Some(Type::String)) if infix.op == OpInfix::Add => Some(Type::String),
                    (Some(Type::Bool), Some(Type::Bool)) if infix.op == OpInfix::And => Some(Type::Bool),
                    _ => None,
                },
                OpInfix::Concat => Some(Type::String),
                op if op.is_arithmetic() => Some(Type::Number),
                _ => Some(Type::Bool),
            },
            Expr::Literal(literal) => match literal {
                ExprLiteral::Bool(_) => Some(Type::Bool),
                ExprLiteral::Char(_) => Some(Type::Char),
                ExprLiteral::Null => None,
                ExprLiteral::Number(_) => Some(Type::Number),
                ExprLiteral::String(_) => Some(Type::String),
            },
            Expr::Prefix(_) => Some(Type::Bool),
            Expr::Set(_) => None,
            Expr::Var(var) => var.var.type_.clone().or_else(|| self.lookup_type(&var.var.name)),
        }
    }

    fn lookup_type(&self, name: &str) -> Option<Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name)).and_then(|binding| binding.type_.clone())
    }

    fn is_declared(&self, name: &str) -> bool {
        self.scopes.last().map_or(false, |scope| scope.contains_key(name))
    }

    fn declare_define(&mut self, name: &str, type_: Option<Type>, span: &Span) -> Result<()> {
        self.declare(name, span)?;
        self.define(name, type_, false);
        Ok(())
    }

    fn declare(&mut self, name: &str, span: &Span) -> Result<()> {
        let scope = self.scopes.last_mut().unwrap_or_else(|| unreachable!("resolver has no scope to declare in"));
        if scope.contains_key(name) {
            return Err(Error::ResolveError(ResolveError::AlreadyDefined { name: name.to_string(), span: span.clone() }));
        }
        scope.insert(name.to_string(), Binding { defined: false, type_: None, constant: false });
        Ok(())
    }

    fn define(&mut self, name: &str, type_: Option<Type>, constant: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), Binding { defined: true, type_, constant });
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn end_scope(&mut self) {
        self.scopes.pop().unwrap_or_else(|| unreachable!("attempted to pop global scope"));
    }
}

/// The values of an array literal, which are joined by "and".
pub fn array_elems(expr_s: &ExprS) -> Vec<&ExprS> {
    match &expr_s.0 {
        Expr::Infix(infix) if infix.op == OpInfix::And => {
            let mut elems = array_elems(&infix.lt);
            elems.extend(array_elems(&infix.rt));
            elems
        }
        _ => vec![expr_s],
    }
}

fn check_interface(
    class: &str,
    interface: &str,
    required: &[String],
    methods: &FxHashSet<String>,
    span: &Span,
) -> Result<()> {
    match required.iter().find(|method| !methods.contains(*method)) {
        Some(method) => Err(Error::ResolveError(ResolveError::MissingInterfaceMethod {
            class: class.to_string(),
            interface: interface.to_string(),
            method: method.to_string(),
            span: span.clone(),
        })),
        None => Ok(()),
    }
}

/// Class types are checked when the program runs, not before.
fn compatible(expected: &Type, found: &Type) -> bool {
    match (expected, found) {
        (Type::Class(_), _) | (_, Type::Class(_)) => true,
        (Type::Array(expected), Type::Array(found)) => compatible(expected, found),
        (expected, found) => expected == found,
    }
}

fn describe(expr_s: &ExprS) -> String {
    match &expr_s.0 {
        Expr::Var(var) => var.var.name.to_string(),
        _ => "this value".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn resolve(source: &str) -> Result<(Program, Locals)> {
        let program = fim_syntax::parse(source)?;
        let locals = Resolver::default().resolve(&program)?;
        Ok((program, locals))
    }

    fn resolve_err(source: &str) -> String {
        match resolve(source) {
            Ok(_) => panic!("expected {source:?} to fail"),
            Err(e) => e.to_string(),
        }
    }

    /// Every variable named `name` in `stmts`, in source order.
    fn vars<'a>(stmts: &'a [StmtS], name: &str, found: &mut Vec<&'a Var>) {
        for (stmt, _) in stmts {
            match stmt {
                Stmt::Print(print) => expr_vars(&print.value, name, found),
                Stmt::If(if_) => {
                    expr_vars(&if_.cond, name, found);
                    vars(&if_.then.stmts, name, found);
                }
                Stmt::Fun(fun) => vars(&fun.body.stmts, name, found),
                Stmt::While(while_) => {
                    expr_vars(&while_.cond, name, found);
                    vars(&while_.body.stmts, name, found);
                }
                _ => (),
            }
        }
    }

    fn expr_vars<'a>(expr: &'a ExprS, name: &str, found: &mut Vec<&'a Var>) {
        match &expr.0 {
            Expr::Var(var) if var.var.name == name => found.push(&var.var),
            Expr::Infix(infix) => {
                expr_vars(&infix.lt, name, found);
                expr_vars(&infix.rt, name, found);
            }
            _ => (),
        }
    }

    #[test]
    fn globals_are_not_recorded() {
        let (program, locals) = resolve("Did you know that x is 1? I said x.").unwrap();
        let mut found = Vec::new();
        vars(&program.stmts, "x", &mut found);
        assert_eq!(1, found.len());
        assert_eq!(None, locals.get(&found[0].id));
    }

    #[test]
    fn distance_counts_enclosing_frames() {
        let (program, locals) = resolve(
            "I learned counting.
                Did you know that x is 1?
                I said x.
                If x is 1, I said x.
                    If true, I said x. That's what I would do.
                That's what I would do.
            That's all about counting.",
        )
        .unwrap();
        let mut found = Vec::new();
        vars(&program.stmts, "x", &mut found);
        let depths = found.iter().map(|var| locals.get(&var.id).copied()).collect::<Vec<_>>();
        assert_eq!(vec![Some(0), Some(0), Some(1), Some(2)], depths);
    }

    #[test]
    fn parameters_are_one_frame_above_the_body() {
        let (program, locals) =
            resolve("I learned doubling using the number n. I said n plus n. That's all about doubling.").unwrap();
        let mut found = Vec::new();
        vars(&program.stmts, "n", &mut found);
        assert_eq!(2, found.len());
        assert!(found.iter().all(|var| locals.get(&var.id) == Some(&1)));
    }

    #[test]
    fn undefined_name() {
        assert_eq!(r#"ResolveError: name "Spike" is not defined"#, resolve_err("I said Spike."));
    }

    #[test]
    fn unknown_names_are_allowed_inside_classes() {
        let source = "Dear Princess Celestia: Letter.
            Today I learned writing. I said greeting. That's all about writing.
            Did you know that greeting is \"Hi\"?
            Your faithful student, Twilight.";
        assert!(resolve(source).is_ok());
    }

    #[test]
    fn redeclaration_in_one_scope() {
        assert_eq!(
            r#"ResolveError: name "x" is already defined"#,
            resolve_err("Did you know that x is 1? Did you know that x is 2?")
        );
    }

    #[test]
    fn access_inside_initializer() {
        assert_eq!(
            r#"ResolveError: cannot read "x" inside its own declaration"#,
            resolve_err("Did you know that x is x plus 1?")
        );
    }

    #[test]
    fn return_outside_paragraph() {
        assert_eq!(r#"ResolveError: "Then you get" outside a paragraph"#, resolve_err("Then you get 1."));
    }

    #[test]
    fn assign_to_constant() {
        assert_eq!(
            r#"ResolveError: "Pi" is always the same and cannot change"#,
            resolve_err("Did you know that Pi is always 3? Pi is now 4.")
        );
    }

    #[test]
    fn type_mismatch_on_assignment() {
        assert_eq!(
            "ResolveError: expected a number, found a word",
            resolve_err("Did you know that x is 1? x is now \"one\".")
        );
    }

    #[test]
    fn inherit_from_self() {
        let source = "Dear Letter: Letter. Your faithful student, Twilight.";
        assert_eq!(r#"ResolveError: class "Letter" cannot inherit from itself"#, resolve_err(source));
    }

    #[test]
    fn duplicate_main() {
        let source = "Today I learned one. I said 1. That's all about one.
            Today I learned two. I said 2. That's all about two.";
        assert_eq!(r#"ResolveError: there can only be one mane paragraph, but "two" is another"#, resolve_err(source));
    }

    #[test]
    fn interface_declared_after_class() {
        let source = "Dear Princess Celestia and Flying: Bird.
            I learned how to fly. I said 1. That's all about how to fly.
            Your faithful student, Fluttershy.
            Flying:
            I learned how to fly.
            I learned how to land.
            Your faithful student, Rainbow Dash.";
        assert_eq!(
            r#"ResolveError: class "Bird" does not implement "how to land" from interface "Flying""#,
            resolve_err(source)
        );
    }

    #[test]
    fn interface_never_declared() {
        let source = "Dear Princess Celestia and Swimming: Fish. Your faithful student, Fluttershy.";
        assert_eq!(
            r#"ResolveError: class "Fish" implements an unknown interface "Swimming""#,
            resolve_err(source)
        );
    }

    #[test]
    fn array_type_must_be_plural() {
        assert_eq!(
            r#"ResolveError: array type "cupcakes" must be plural"#,
            resolve_err("Did you know that cake has many cupcakes?")
        );
    }

    #[test]
    fn array_elements_match_the_declared_type() {
        assert_eq!(
            "ResolveError: expected a word, found a number",
            resolve_err(r#"Did you know that Apples has words "Gala" and 5?"#)
        );
    }

    #[test]
    fn index_into_a_number() {
        assert_eq!(
            r#"ResolveError: "x" is not an array"#,
            resolve_err("Did you know that x is 5? Did you know that y is 1? x`s y is 2.")
        );
    }

    #[test]
    fn iterate_characters_over_numbers() {
        let source = "Did you know that A likes many numbers?
            For every character c in A... I said c. That's what I did.";
        assert_eq!("ResolveError: expected a letter, found a number", resolve_err(source));
    }

    #[test]
    fn iterate_over_a_number() {
        let source = "Did you know that A is 5? For every number c in A... I said c. That's what I did.";
        assert_eq!("ResolveError: cannot iterate over a number", resolve_err(source));
    }

    #[test]
    fn array_elems_keep_source_order() {
        let program = fim_syntax::parse(r#"I said "Gala" and "Red Delicious" and "Mcintosh"."#).unwrap();
        let value = match &program.stmts[0].0 {
            Stmt::Print(print) => &print.value,
            stmt => panic!("expected a print statement, got {stmt:?}"),
        };
        let elems = array_elems(value)
            .into_iter()
            .map(|(expr, _)| match expr {
                Expr::Literal(ExprLiteral::String(string)) => string.as_str(),
                expr => panic!("expected a string, got {expr:?}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(vec!["Gala", "Red Delicious", "Mcintosh"], elems);
    }
}
