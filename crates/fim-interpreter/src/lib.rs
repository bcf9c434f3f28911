mod env;
mod object;
mod resolver;

use std::cmp::Ordering;
use std::fs;
use std::io::{BufRead, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use fim_common::error::{Error, IoError, RecursionError, Result, RuntimeError};
use fim_common::types::Span;
use fim_syntax::ast::{
    Expr, ExprLiteral, ExprS, OpInfix, OpPrefix, Program, Stmt, StmtArray, StmtBlock, StmtClass, StmtS, StmtStep,
    Var,
};
use fim_syntax::types::Type;
use rustc_hash::FxHashMap;
use walkdir::WalkDir;

pub use crate::env::Env;
pub use crate::object::{Array, Callable, Class, Function, Instance, Object, MAX_LEN, ROOT_CLASS};
pub use crate::resolver::{array_elems, Locals, Resolver};

/// Deepest nesting of calls and instantiations before a program is stopped
/// with a recursion error.
pub const MAX_DEPTH: usize = 512;

/// Extension of program and module files.
pub const EXTENSION: &str = "fpp";

/// Runs a program from source, writing what it says to `stdout` and reading
/// what it hears from `stdin`. Modules are searched for under `base_dir`.
pub fn interpret(source: &str, base_dir: &Path, stdout: &mut dyn Write, stdin: &mut dyn BufRead) -> Result<()> {
    let program = fim_syntax::parse(source)?;
    Interpreter::new(stdout, stdin).with_base_dir(base_dir).run(&program)
}

pub struct Interpreter<'io> {
    globals: Env,
    locals: Locals,
    /// Root classes that have been declared but not built yet.
    pending: FxHashMap<String, Rc<StmtClass>>,
    stdout: &'io mut dyn Write,
    stdin: &'io mut dyn BufRead,
    base_dir: PathBuf,
    depth: usize,
}

impl<'io> Interpreter<'io> {
    pub fn new(stdout: &'io mut dyn Write, stdin: &'io mut dyn BufRead) -> Self {
        let mut globals = Env::default();
        globals.insert_unchecked(ROOT_CLASS, Class::root().into());
        Self {
            globals,
            locals: Locals::default(),
            pending: FxHashMap::default(),
            stdout,
            stdin,
            base_dir: PathBuf::from("."),
            depth: 0,
        }
    }

    pub fn with_base_dir(mut self, base_dir: &Path) -> Self {
        self.base_dir = base_dir.to_path_buf();
        self
    }

    pub fn run(&mut self, program: &Program) -> Result<()> {
        let locals = Resolver::default().resolve(program)?;
        self.locals.extend(locals);

        for (stmt, _) in &program.stmts {
            if let Stmt::Class(class) = stmt {
                self.pending.insert(class.name.to_string(), Rc::clone(class));
            }
        }
        for (stmt, span) in &program.stmts {
            if let Stmt::Import(import) = stmt {
                self.import(&import.name, span)?;
            }
        }
        for (stmt, span) in &program.stmts {
            if let Stmt::Class(class) = stmt {
                // Building an earlier class may have built this one already.
                if self.pending.contains_key(&class.name) {
                    self.realize(class, span)?;
                }
            }
        }

        let mut globals = self.globals.clone();
        for stmt_s in &program.stmts {
            if let Stmt::Class(_) | Stmt::Import(_) | Stmt::Interface(_) = &stmt_s.0 {
                continue;
            }
            if self.run_stmt(&mut globals, None, stmt_s)?.is_break() {
                break;
            }
        }

        let main = program.stmts.iter().find_map(|(stmt, span)| match stmt {
            Stmt::Fun(fun) if fun.is_main => Some((fun, span)),
            _ => None,
        });
        if let Some((fun, span)) = main {
            Function::new(fun, &self.globals).call(self, Vec::new(), span)?;
        }
        Ok(())
    }

    pub(crate) fn enter(&mut self, span: &Span) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::RecursionError(RecursionError::MaxDepthExceeded {
                depth: MAX_DEPTH,
                span: span.clone(),
            }));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.depth -= 1;
    }

    /// Builds a declared class, then runs its mane paragraph if it has one.
    fn realize(&mut self, decl: &Rc<StmtClass>, span: &Span) -> Result<Class> {
        self.pending.remove(&decl.name);
        let (super_, super_span) = &decl.super_;
        let globals = self.globals.clone();
        let super_ = match self.global(&globals, &super_.name, super_span)? {
            Object::Class(class) => class,
            object => {
                return Err(Error::RuntimeError(RuntimeError::SuperclassInvalidType {
                    type_: object.type_(),
                    span: super_span.clone(),
                }));
            }
        };

        let class = Class::new(decl, super_, &globals);
        self.globals.insert_unchecked(&decl.name, class.clone().into());
        tracing::debug!(class = %decl.name, "realized class");

        if let Some(main) = class.main() {
            let instance = class.instantiate(self)?;
            main.bind(&instance).call(self, Vec::new(), span)?;
        }
        Ok(class)
    }

    /// Looks up a name in the outermost frame of `env`, building a pending
    /// class on first use.
    fn global(&mut self, env: &Env, name: &str, span: &Span) -> Result<Object> {
        if let Some(object) = env.globals().get(name) {
            return Ok(object);
        }
        match self.pending.get(name).cloned() {
            Some(decl) => Ok(self.realize(&decl, span)?.into()),
            None => Err(Error::RuntimeError(RuntimeError::NotDefined { name: name.to_string(), span: span.clone() })),
        }
    }

    /// Runs `<name>.fpp` in a fresh interpreter and takes the class of the
    /// same name from it.
    fn import(&mut self, name: &str, span: &Span) -> Result<()> {
        let file_name = format!("{name}.{EXTENSION}");
        let path = WalkDir::new(&self.base_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name.as_str())
            .map(|entry| entry.into_path())
            .ok_or_else(|| {
                Error::IoError(IoError::ModuleNotFound { name: name.to_string(), span: span.clone() })
            })?;
        let source = fs::read_to_string(&path).map_err(|_| {
            Error::IoError(IoError::ReadError { file: path.display().to_string(), span: span.clone() })
        })?;
        tracing::debug!(module = %name, path = %path.display(), "importing module");
        let program = fim_syntax::parse(&source)?;

        self.enter(span)?;
        let result = {
            let stdout: &mut dyn Write = &mut *self.stdout;
            let stdin: &mut dyn BufRead = &mut *self.stdin;
            let mut module = Interpreter::new(stdout, stdin).with_base_dir(&self.base_dir);
            module.depth = self.depth;
            module.run(&program).map(|()| (module.globals, module.locals))
        };
        self.exit();
        let (globals, locals) = result?;

        match globals.get(name) {
            Some(class @ Object::Class(_)) => {
                self.locals.extend(locals);
                self.globals.insert_unchecked(name, class);
                Ok(())
            }
            _ => Err(Error::IoError(IoError::ModuleWithoutClass { name: name.to_string(), span: span.clone() })),
        }
    }

    pub(crate) fn run_stmts(
        &mut self,
        env: &mut Env,
        this: Option<&Instance>,
        stmts: &[StmtS],
    ) -> Result<ControlFlow<Object>> {
        for stmt_s in stmts {
            if let flow @ ControlFlow::Break(_) = self.run_stmt(env, this, stmt_s)? {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn run_block(&mut self, env: &Env, this: Option<&Instance>, block: &StmtBlock) -> Result<ControlFlow<Object>> {
        let env = &mut Env::with_parent(env);
        self.run_stmts(env, this, &block.stmts)
    }

    fn run_stmt(&mut self, env: &mut Env, this: Option<&Instance>, stmt_s: &StmtS) -> Result<ControlFlow<Object>> {
        let (stmt, span) = stmt_s;
        match stmt {
            Stmt::Array(array) => {
                let value = self.array(env, this, array)?;
                env.define(&array.name, value, span)?;
            }
            Stmt::ArraySet(set) => {
                let value = self.eval(env, this, &set.value)?;
                match self.eval(env, this, &set.array)? {
                    Object::Array(array) => {
                        let index = self.index(env, this, &set.index)?;
                        array.set(index, value).map_err(|max| too_large(index, max, &set.index.1))?;
                    }
                    object => {
                        return Err(Error::RuntimeError(RuntimeError::NotAnArray {
                            value: object.to_string(),
                            span: set.array.1.clone(),
                        }));
                    }
                }
            }
            Stmt::Class(_) | Stmt::Import(_) | Stmt::Interface(_) => (),
            Stmt::Decrement(step) => self.step(env, this, step, OpInfix::Subtract, span)?,
            Stmt::DoWhile(do_while) => loop {
                if let flow @ ControlFlow::Break(_) = self.run_block(env, this, &do_while.body)? {
                    return Ok(flow);
                }
                if !self.eval(env, this, &do_while.cond)?.bool() {
                    break;
                }
            },
            Stmt::Expr(expr) => {
                self.eval(env, this, &expr.value)?;
            }
            Stmt::For(for_) => {
                let env = &mut Env::with_parent(env);
                let (init, init_span) = &for_.init;
                let value = match &init.value {
                    Some(value) => self.eval(env, this, value)?,
                    None => Object::Nil,
                };
                env.define(&init.name, value, init_span)?;
                while self.eval(env, this, &for_.cond)?.bool() {
                    if let flow @ ControlFlow::Break(_) = self.run_block(env, this, &for_.body)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::ForIter(for_) => {
                let items = match self.eval(env, this, &for_.iterable)? {
                    Object::Array(array) => array.elems(),
                    Object::String(string) => string.chars().map(Object::Char).collect(),
                    object => {
                        return Err(Error::RuntimeError(RuntimeError::NotIterable {
                            type_: object.type_(),
                            span: for_.iterable.1.clone(),
                        }));
                    }
                };
                let env = &mut Env::with_parent(env);
                env.define(&for_.var.name, Object::Nil, span)?;
                for item in items {
                    env.insert_unchecked(&for_.var.name, item);
                    if let flow @ ControlFlow::Break(_) = self.run_block(env, this, &for_.body)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::Fun(fun) => {
                let function = Function::new(fun, env);
                env.define(&fun.name, function.into(), span)?;
            }
            Stmt::If(if_) => {
                let flow = if self.eval(env, this, &if_.cond)?.bool() {
                    self.run_block(env, this, &if_.then)?
                } else if let Some(else_) = &if_.else_ {
                    self.run_block(env, this, else_)?
                } else {
                    ControlFlow::Continue(())
                };
                return Ok(flow);
            }
            Stmt::Increment(step) => self.step(env, this, step, OpInfix::Add, span)?,
            Stmt::Print(print) => {
                let value = self.eval(env, this, &print.value)?;
                writeln!(self.stdout, "{value}").map_err(|_| write_err(span))?;
            }
            Stmt::Read(read) => {
                if let Some(prompt) = &read.prompt {
                    let prompt = self.eval(env, this, prompt)?;
                    write!(self.stdout, "{prompt}")
                        .and_then(|()| self.stdout.flush())
                        .map_err(|_| write_err(span))?;
                }
                let mut line = String::new();
                self.stdin.read_line(&mut line).map_err(|_| {
                    Error::IoError(IoError::ReadError { file: "stdin".to_string(), span: span.clone() })
                })?;
                let line = line.trim_end_matches(&['\r', '\n'][..]);

                let (var, var_span) = &read.var;
                let type_ = match &var.type_ {
                    Some(type_) => Some(type_.clone()),
                    None => match self.lookup(env, this, var, var_span) {
                        Ok(Object::Bool(_)) => Some(Type::Bool),
                        Ok(Object::Char(_)) => Some(Type::Char),
                        Ok(Object::Number(_)) => Some(Type::Number),
                        _ => None,
                    },
                };
                let value = parse_input(line, type_.as_ref(), var_span)?;
                self.assign(env, this, var, value, var_span)?;
            }
            Stmt::Return(return_) => {
                let value = self.eval(env, this, &return_.value)?;
                return Ok(ControlFlow::Break(value));
            }
            Stmt::Switch(switch) => {
                let value = self.eval(env, this, &switch.value)?;
                let mut keys = Vec::with_capacity(switch.cases.len());
                for (key, _) in &switch.cases {
                    keys.push(self.eval(env, this, key)?);
                }
                // A repeated case label is overridden by its last occurrence.
                let body = keys
                    .iter()
                    .rposition(|key| *key == value)
                    .map(|idx| &switch.cases[idx].1)
                    .or(switch.default.as_ref());
                if let Some(body) = body {
                    return self.run_block(env, this, body);
                }
            }
            Stmt::Var(var) => {
                let value = match &var.value {
                    Some(value) => self.eval(env, this, value)?,
                    None => Object::Nil,
                };
                env.define(&var.name, value, span)?;
            }
            Stmt::While(while_) => {
                while self.eval(env, this, &while_.cond)?.bool() {
                    if let flow @ ControlFlow::Break(_) = self.run_block(env, this, &while_.body)? {
                        return Ok(flow);
                    }
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Sets one field of a new instance from its declaration in the class.
    pub(crate) fn init_field(&mut self, env: &Env, instance: &Instance, field: &StmtS) -> Result<()> {
        let mut this_env = Env::with_parent(env);
        this_env.insert_unchecked("this", instance.clone().into());
        let env = &mut Env::with_parent(&this_env);
        let this = Some(instance);

        let (name, value) = match &field.0 {
            Stmt::Var(var) => {
                let value = match &var.value {
                    Some(value) => self.eval(env, this, value)?,
                    None => Object::Nil,
                };
                (&var.name, value)
            }
            Stmt::Array(array) => (&array.name, self.array(env, this, array)?),
            stmt => unreachable!("class field is not a declaration: {stmt:?}"),
        };
        instance.set(name, value);
        Ok(())
    }

    fn array(&mut self, env: &mut Env, this: Option<&Instance>, array: &StmtArray) -> Result<Object> {
        let mut elems = Vec::new();
        if let Some(value) = &array.value {
            for elem in array_elems(value) {
                elems.push(self.eval(env, this, elem)?);
            }
        }
        Ok(Array::new(elems).into())
    }

    fn step(&mut self, env: &mut Env, this: Option<&Instance>, step: &StmtStep, op: OpInfix, span: &Span) -> Result<()> {
        let amount = match &step.amount {
            Some(amount) => self.eval(env, this, amount)?,
            None => Object::Number(1.0),
        };
        let value = match (self.eval(env, this, &step.target)?, amount) {
            (Object::Number(value), Object::Number(amount)) => match op {
                OpInfix::Subtract => Object::Number(value - amount),
                _ => Object::Number(value + amount),
            },
            (value, amount) => {
                return Err(Error::RuntimeError(RuntimeError::UnsupportedOperandInfix {
                    op: op.to_string(),
                    lt: value.to_string(),
                    rt: amount.to_string(),
                    span: span.clone(),
                }));
            }
        };

        let (target, target_span) = &step.target;
        match target {
            Expr::Var(var) => self.assign(env, this, &var.var, value, target_span),
            Expr::Get(get) => match self.eval(env, this, &get.object)? {
                Object::Array(array) => {
                    let index = self.index(env, this, &get.accessor)?;
                    array.set(index, value).map_err(|max| too_large(index, max, &get.accessor.1))
                }
                object => self.set_field(object, get.name(), value, target_span),
            },
            expr => unreachable!("step target is not a variable: {expr:?}"),
        }
    }

    fn eval(&mut self, env: &mut Env, this: Option<&Instance>, expr_s: &ExprS) -> Result<Object> {
        let (expr, span) = expr_s;
        match expr {
            Expr::Assign(assign) => {
                let value = self.eval(env, this, &assign.value)?;
                self.assign(env, this, &assign.var, value.clone(), span)?;
                Ok(value)
            }
            Expr::Call(call) => {
                let callee = self.eval_callee(env, this, &call.callee)?;
                let args = call.args.iter().map(|arg| self.eval(env, this, arg)).collect::<Result<Vec<_>>>()?;
                callee.call(self, args, span)
            }
            Expr::Get(_) | Expr::Var(_) => self.eval_callee(env, this, expr_s)?.invoke_bare(self, span),
            Expr::Infix(infix) => {
                let lt = self.eval(env, this, &infix.lt)?;
                if infix.op == OpInfix::Or && lt.bool() {
                    return Ok(Object::Bool(true));
                }
                let rt = self.eval(env, this, &infix.rt)?;
                eval_infix(infix.op, lt, rt, span)
            }
            Expr::Literal(literal) => Ok(match literal {
                ExprLiteral::Bool(bool) => Object::Bool(*bool),
                ExprLiteral::Char(char) => Object::Char(*char),
                ExprLiteral::Null => Object::Nil,
                ExprLiteral::Number(number) => Object::Number(*number),
                ExprLiteral::String(string) => Object::String(string.clone()),
            }),
            Expr::Prefix(prefix) => {
                let rt = self.eval(env, this, &prefix.rt)?;
                match prefix.op {
                    OpPrefix::Not => Ok(Object::Bool(!rt.bool())),
                }
            }
            Expr::Set(set) => {
                let value = self.eval(env, this, &set.value)?;
                let object = self.eval(env, this, &set.object)?;
                self.set_field(object, set.name(), value.clone(), span)?;
                Ok(value)
            }
        }
    }

    /// Evaluates names and member accesses without calling what they refer
    /// to, so that an argument list can be applied.
    fn eval_callee(&mut self, env: &mut Env, this: Option<&Instance>, expr_s: &ExprS) -> Result<Object> {
        let (expr, span) = expr_s;
        match expr {
            Expr::Var(var) => self.lookup(env, this, &var.var, span),
            Expr::Get(get) => match self.eval(env, this, &get.object)? {
                Object::Array(array) => {
                    let index = self.index(env, this, &get.accessor)?;
                    Ok(array.get(index))
                }
                Object::Instance(instance) => {
                    let name = get.name().unwrap_or_default();
                    if let Some(value) = instance.get(name) {
                        return Ok(value);
                    }
                    let class = instance.class();
                    match class.method(name, &instance) {
                        Some(method) => Ok(method.into()),
                        None => Err(Error::RuntimeError(RuntimeError::NoSuchAttribute {
                            type_: class.name().to_string(),
                            name: name.to_string(),
                            span: get.accessor.1.clone(),
                        })),
                    }
                }
                object => Err(Error::RuntimeError(RuntimeError::NotAnInstance {
                    value: object.to_string(),
                    name: get.name().unwrap_or_default().to_string(),
                    span: span.clone(),
                })),
            },
            _ => self.eval(env, this, expr_s),
        }
    }

    fn lookup(&mut self, env: &Env, this: Option<&Instance>, var: &Var, span: &Span) -> Result<Object> {
        if let Some(&depth) = self.locals.get(&var.id) {
            return env.get_at(&var.name, depth).ok_or_else(|| not_defined(&var.name, span));
        }
        if let Some(this) = this {
            if let Some(value) = this.get(&var.name) {
                return Ok(value);
            }
            if let Some(method) = this.class().method(&var.name, this) {
                return Ok(method.into());
            }
        }
        self.global(env, &var.name, span)
    }

    fn assign(&mut self, env: &mut Env, this: Option<&Instance>, var: &Var, value: Object, span: &Span) -> Result<()> {
        if let Some(&depth) = self.locals.get(&var.id) {
            return env.set_at(&var.name, value, depth).map_err(|()| not_defined(&var.name, span));
        }
        // With a receiver, a name that is not local is always a field.
        if let Some(this) = this {
            this.set(&var.name, value);
            return Ok(());
        }
        let mut globals = env.globals();
        if !globals.contains(&var.name) {
            return Err(not_defined(&var.name, span));
        }
        globals.insert_unchecked(&var.name, value);
        Ok(())
    }

    fn set_field(&mut self, object: Object, name: Option<&str>, value: Object, span: &Span) -> Result<()> {
        let name = name.unwrap_or_default();
        match object {
            Object::Instance(instance) => {
                instance.set(name, value);
                Ok(())
            }
            object => Err(Error::RuntimeError(RuntimeError::NotAnInstance {
                value: object.to_string(),
                name: name.to_string(),
                span: span.clone(),
            })),
        }
    }

    /// Array positions are whole numbers counted from 0, below [`MAX_LEN`].
    fn index(&mut self, env: &mut Env, this: Option<&Instance>, accessor: &ExprS) -> Result<usize> {
        match self.eval(env, this, accessor)? {
            Object::Number(number) if number >= MAX_LEN as f64 && number.fract() == 0.0 => {
                Err(Error::RuntimeError(RuntimeError::IndexTooLarge {
                    index: Object::Number(number).to_string(),
                    max: MAX_LEN,
                    span: accessor.1.clone(),
                }))
            }
            Object::Number(number) if number >= 0.0 && number.fract() == 0.0 => Ok(number as usize),
            object => Err(Error::RuntimeError(RuntimeError::InvalidIndex {
                index: object.to_string(),
                span: accessor.1.clone(),
            })),
        }
    }
}

fn too_large(index: usize, max: usize, span: &Span) -> Error {
    Error::RuntimeError(RuntimeError::IndexTooLarge { index: index.to_string(), max, span: span.clone() })
}

fn eval_infix(op: OpInfix, lt: Object, rt: Object, span: &Span) -> Result<Object> {
    match (op, lt, rt) {
        // "and" between two numbers adds them.
        (OpInfix::Add | OpInfix::And, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a + b)),
        (OpInfix::Add, Object::String(a), Object::String(b)) => Ok(Object::String(a + &b)),
        (OpInfix::And, a, b) => Ok(Object::Bool(a.bool() && b.bool())),
        (OpInfix::Or, a, b) => Ok(Object::Bool(a.bool() || b.bool())),
        (OpInfix::Xor, a, b) => Ok(Object::Bool(a.bool() != b.bool())),
        (OpInfix::Concat, a, b) => Ok(Object::String(format!("{a}{b}"))),
        (OpInfix::Subtract, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a - b)),
        (OpInfix::Multiply, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a * b)),
        (OpInfix::Divide, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a / b)),
        // The remainder takes the sign of the divisor.
        (OpInfix::Modulo, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a - b * (a / b).floor())),
        (OpInfix::Equal, a, b) => Ok(Object::Bool(a == b)),
        (OpInfix::NotEqual, a, b) => Ok(Object::Bool(a != b)),
        (op @ (OpInfix::Greater | OpInfix::GreaterEqual | OpInfix::Less | OpInfix::LessEqual), a, b) => {
            match compare(&a, &b) {
                Some(ordering) => Ok(Object::Bool(match op {
                    OpInfix::Greater => ordering == Ordering::Greater,
                    OpInfix::GreaterEqual => ordering != Ordering::Less,
                    OpInfix::Less => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                })),
                None => Err(unsupported(op, &a, &b, span)),
            }
        }
        (op, a, b) => Err(unsupported(op, &a, &b, span)),
    }
}

fn compare(lt: &Object, rt: &Object) -> Option<Ordering> {
    match (lt, rt) {
        (Object::Number(a), Object::Number(b)) => a.partial_cmp(b),
        (Object::String(a), Object::String(b)) => Some(a.cmp(b)),
        (Object::Char(a), Object::Char(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn parse_input(line: &str, type_: Option<&Type>, span: &Span) -> Result<Object> {
    let invalid = |type_: &Type| {
        Error::RuntimeError(RuntimeError::InvalidInput {
            input: line.to_string(),
            type_: type_.to_string(),
            span: span.clone(),
        })
    };
    match type_ {
        Some(type_ @ Type::Number) => line.trim().parse().map(Object::Number).map_err(|_| invalid(type_)),
        Some(type_ @ Type::Char) => line.chars().next().map(Object::Char).ok_or_else(|| invalid(type_)),
        Some(type_ @ Type::Bool) => match line.trim() {
            "yes" | "true" | "right" | "correct" => Ok(Object::Bool(true)),
            "no" | "false" | "wrong" | "incorrect" => Ok(Object::Bool(false)),
            _ => Err(invalid(type_)),
        },
        _ => Ok(Object::String(line.to_string())),
    }
}

fn unsupported(op: OpInfix, lt: &Object, rt: &Object, span: &Span) -> Error {
    Error::RuntimeError(RuntimeError::UnsupportedOperandInfix {
        op: op.to_string(),
        lt: lt.to_string(),
        rt: rt.to_string(),
        span: span.clone(),
    })
}

fn not_defined(name: &str, span: &Span) -> Error {
    Error::RuntimeError(RuntimeError::NotDefined { name: name.to_string(), span: span.clone() })
}

fn write_err(span: &Span) -> Error {
    Error::IoError(IoError::WriteError { file: "stdout".to_string(), span: span.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::thread;

    use pretty_assertions::assert_eq;

    fn run_with_input(source: &str, input: &str) -> Result<String> {
        let mut stdout = Vec::new();
        interpret(source, Path::new("."), &mut stdout, &mut input.as_bytes())?;
        Ok(String::from_utf8(stdout).unwrap())
    }

    fn run(source: &str) -> String {
        let mut stdout = Vec::new();
        interpret(source, Path::new("."), &mut stdout, &mut io::empty()).unwrap();
        String::from_utf8(stdout).unwrap()
    }

    fn run_err(source: &str) -> String {
        let mut stdout = Vec::new();
        match interpret(source, Path::new("."), &mut stdout, &mut io::empty()) {
            Ok(()) => panic!("expected {source:?} to fail"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn arithmetic() {
        assert_eq!("5\n", run("I said add 2 and 3."));
        assert_eq!("12\n", run("Did you know that ten is 10? Did you know that twelve is 2 plus ten? I said twelve!"));
        assert_eq!("-2\n", run("I said subtract 5 and 7."));
        assert_eq!("2\n", run("I said subtract 5 from 7."));
        assert_eq!(format!("{}\n", 2.0 / 9.0), run("I said divide 2 by 9."));
        assert_eq!("1\n", run("I said the remainder of 7 and 3."));
    }

    #[test]
    fn names_may_start_with_a_type_word() {
        assert_eq!("5\n", run("Did you know that word count is 5? I said word count."));
    }

    #[test]
    fn and_between_numbers_adds() {
        assert_eq!("37\n", run("I wrote 8 and 7 plus 3 added to 19."));
        assert_eq!("false\n", run("I said true and false."));
    }

    #[test]
    fn xor() {
        assert_eq!("false\n", run("I said either true or true."));
        assert_eq!("true\n", run("I said either false or true."));
    }

    #[test]
    fn concatenation() {
        let source = r#"Did you know that Applejack is "Apple"? I said "Hello " Applejack "!"."#;
        assert_eq!("Hello Apple!\n", run(source));
    }

    #[test]
    fn unsupported_operands() {
        assert_eq!(
            r#"RuntimeError: unsupported operands for plus: "1" and "pie""#,
            run_err(r#"I said 1 plus "pie"."#)
        );
    }

    #[test]
    fn bare_paragraph_reference_calls_it() {
        let source = "I learned the answer to get a number. Then you get 42. That's all about the answer.
            I said the answer.";
        assert_eq!("42\n", run(source));
    }

    #[test]
    fn return_leaves_loops() {
        let source = "I learned first big to get a number.
                For every number x from 1 to 10,
                    If x is greater than 3, Then you get x. That's what I would do.
                That's what I did.
                Then you get 0.
            That's all about first big.
            I said first big.";
        assert_eq!("4\n", run(source));
    }

    #[test]
    fn arity_mismatch() {
        let source = "I learned doubling to get a number using the number n. Then you get n plus n. That's all about doubling.
            I said doubling using 1 and 2.";
        assert_eq!(r#"RuntimeError: "doubling" takes 1 arguments but 2 were given"#, run_err(source));
    }

    #[test]
    fn closures_see_their_parameters() {
        let source = "I learned doubling to get a number using the number n. Then you get n plus n. That's all about doubling.
            I said doubling using 21.";
        assert_eq!("42\n", run(source));
    }

    #[test]
    fn recursion_limit() {
        let handle = thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| run_err("I learned forever. I would forever. That's all about forever. I would forever."))
            .unwrap();
        assert_eq!("RecursionError: maximum recursion depth of 512 exceeded", handle.join().unwrap());
    }

    #[test]
    fn loops() {
        assert_eq!("1\n2\n3\n", run("For every number x from 1 to 3, I said x! That's what I did."));
        let source = "Did you know that x is 3?
            As long as x is greater than 0, I said x. x got one less. That's what I did.";
        assert_eq!("3\n2\n1\n", run(source));
        let source = "Did you know that x is 5?
            Here's what I did. I said x. I did this as long as x is less than 3.";
        assert_eq!("5\n", run(source));
    }

    #[test]
    fn iterate_over_text_and_arrays() {
        let source = "Did you know that Berry Punch likes the phrase “Pony”?
            For every character c in Berry Punch... I said c. That’s what I did.";
        assert_eq!("P\no\nn\ny\n", run(source));
        let source = "Did you know that A likes many numbers?
            A 0 is 0, A 1 is 42, A 2 is 69.
            For every number c in A... I said c. That’s what I did.";
        assert_eq!("0\n42\n69\n", run(source));
    }

    #[test]
    fn arrays_pad_with_nothing() {
        let source = r#"Did you know that cake has many words? cake 2 is "Mango Cake". I said cake."#;
        assert_eq!("nothing, nothing, Mango Cake\n", run(source));
        let source = r#"Did you know that Apples has words "Gala" and "Red Delicious"? I said Apples 1."#;
        assert_eq!("Red Delicious\n", run(source));
    }

    #[test]
    fn invalid_index() {
        let source = "Did you know that A has many numbers? A 0 is 1. Did you know that i is 0.5? I said A`s i.";
        assert_eq!(r#"RuntimeError: array index must be a whole number, not "0.5""#, run_err(source));
    }

    #[test]
    fn huge_index() {
        let source = r#"Did you know that cake has many words? cake 100000000000000000000 is "Mango Cake"."#;
        assert_eq!(
            "RuntimeError: array index 100000000000000000000 is too large, the limit is 16777216",
            run_err(source)
        );
        let source = "Did you know that A has many numbers? Did you know that i is 16777216? I said A`s i.";
        assert_eq!("RuntimeError: array index 16777216 is too large, the limit is 16777216", run_err(source));
    }

    #[test]
    fn switch() {
        let program = |tail: u32| {
            format!(
                "Did you know that Pinkie’s Tail is {tail}?
                In regards to Pinkie’s Tail:
                On the 1st hoof... I said “That’s impossible!”.
                On the 4th hoof... I said “Why does this happen?!”.
                If all else fails... I said “She’s just being Pinkie Pie.”.
                That’s what I did."
            )
        };
        assert_eq!("Why does this happen?!\n", run(&program(4)));
        assert_eq!("She’s just being Pinkie Pie.\n", run(&program(5)));
    }

    #[test]
    fn switch_takes_the_last_repeated_case() {
        let source = "Did you know that Pinkie’s Tail is 4?
            In regards to Pinkie’s Tail:
            On the 4th hoof... I said “first”.
            On the 4th hoof... I said “second”.
            That’s what I did.";
        assert_eq!("second\n", run(source));
    }

    #[test]
    fn read_into_a_number() {
        let source = "Did you know that x is 1? I heard x. I said x plus 1.";
        assert_eq!("42\n", run_with_input(source, "41\n").unwrap());
        assert_eq!(
            r#"RuntimeError: cannot read "pony" as a number"#,
            run_with_input(source, "pony\n").unwrap_err().to_string()
        );
    }

    #[test]
    fn read_into_logic() {
        let source = "Did you know that Spike is false? I heard Spike. I said Spike.";
        assert_eq!("true\n", run_with_input(source, "yes\n").unwrap());
        assert_eq!("true\n", run_with_input(source, "true\n").unwrap());
        assert_eq!("false\n", run_with_input(source, "wrong\n").unwrap());
        assert_eq!(
            r#"RuntimeError: cannot read "maybe" as a logic"#,
            run_with_input(source, "maybe\n").unwrap_err().to_string()
        );
    }

    #[test]
    fn read_into_a_letter() {
        let source = "Did you know that Rarity is 'a'? I heard Rarity. I said Rarity.";
        assert_eq!("Z\n", run_with_input(source, "Zebra\n").unwrap());
        assert_eq!(
            r#"RuntimeError: cannot read "" as a letter"#,
            run_with_input(source, "\n").unwrap_err().to_string()
        );
    }

    #[test]
    fn read_with_prompt() {
        let source = r#"Did you know that guest is "nobody"? I asked guest "Who are you? ". I said "Hi " guest."#;
        assert_eq!("Who are you? Hi Twilight\n", run_with_input(source, "Twilight\n").unwrap());
    }

    #[test]
    fn class_without_members() {
        let program = fim_syntax::parse("Dear Princess Celestia: A. Your faithful student, Twilight. I said A.").unwrap();
        let mut stdout = Vec::new();
        let mut stdin = io::empty();
        let mut interpreter = Interpreter::new(&mut stdout, &mut stdin);
        interpreter.run(&program).unwrap();
        let class = match interpreter.globals.get("A") {
            Some(Object::Class(class)) => class,
            object => panic!("expected a class, got {object:?}"),
        };
        assert_eq!("A", class.name());
        assert_eq!(Some(ROOT_CLASS), class.super_.as_ref().map(|super_| super_.name()));
        drop(interpreter);
        assert_eq!("A instance\n", String::from_utf8(stdout).unwrap());
    }

    #[test]
    fn fields_methods_and_inheritance() {
        let source = r#"Dear Princess Celestia: Pony.
            Did you know that title is "Pony"?
            I learned greeting to get a word. Then you get "Hi, " title. That's all about greeting.
            Your faithful student, Twilight.

            Dear Pony: Unicorn.
            Did you know that title is "Unicorn"?
            Your faithful student, Twilight.

            I said Pony`s greeting.
            I said Unicorn`s greeting."#;
        assert_eq!("Hi, Pony\nHi, Unicorn\n", run(source));
    }

    #[test]
    fn mane_paragraph_of_a_class_runs() {
        let source = "Dear Princess Celestia: Hello World!
            Today I learned how to say Hello World!
            I said “Hello World”!
            That’s all about how to say Hello World!
            Your faithful student, Kyli Rouge.";
        assert_eq!("Hello World\n", run(source));
    }

    #[test]
    fn top_level_mane_paragraph_runs_last() {
        let source = "Today I learned the finale. I said 2. That's all about the finale. I said 1.";
        assert_eq!("1\n2\n", run(source));
    }

    #[test]
    fn missing_attribute() {
        let source = "Dear Princess Celestia: Pony. Your faithful student, Twilight. I said Pony`s wings.";
        assert_eq!(r#"RuntimeError: Pony has no attribute "wings""#, run_err(source));
    }

    #[test]
    fn assignment_in_a_method_sets_a_field() {
        let source = "Did you know that counter is 0?
            Dear Princess Celestia: Tally.
            I learned bump to get a number. counter is now 5. Then you get counter. That's all about bump.
            Your faithful student, Twilight.
            I said Tally`s bump.
            I said counter.";
        assert_eq!("5\n0\n", run(source));
    }

    #[test]
    fn field_of_a_number() {
        let source = "Did you know that x is 1? x`s wings is now 2.";
        assert_eq!(r#"RuntimeError: "1" is not an instance, so it has no field "wings""#, run_err(source));
    }

    #[test]
    fn missing_module() {
        assert_eq!(r#"IOError: module "Nowhere" not found"#, run_err("Remember when I wrote about Nowhere."));
    }
}
