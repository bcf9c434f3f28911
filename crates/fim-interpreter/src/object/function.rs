use crate::env::Env;
use crate::object::{Callable, Instance, Object};
use crate::Interpreter;

use fim_common::error::Result;
use fim_common::types::Span;
use fim_syntax::ast::{Param, StmtFun};
use gc::{Finalize, Gc, Trace};

use std::fmt::{self, Display, Formatter};
use std::ops::{ControlFlow, Deref};
use std::rc::Rc;

#[derive(Clone, Debug, Finalize, Trace)]
pub struct Function(Gc<FunctionImpl>);

impl Function {
    pub fn new(decl: &Rc<StmtFun>, env: &Env) -> Self {
        Function(Gc::new(FunctionImpl { decl: Rc::clone(decl), env: env.clone(), this: None }))
    }

    pub fn params(&self) -> &[Param] {
        &self.decl.params
    }

    pub fn is_main(&self) -> bool {
        self.decl.is_main
    }

    /// Returns a copy of this paragraph whose body sees `this` as its
    /// receiver.
    pub fn bind(&self, this: &Instance) -> Function {
        let mut env = Env::with_parent(&self.env);
        env.insert_unchecked("this", this.clone().into());
        Function(Gc::new(FunctionImpl { decl: Rc::clone(&self.decl), env, this: Some(this.clone()) }))
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn name(&self) -> &str {
        &self.decl.name
    }

    fn call_unchecked(&self, interpreter: &mut Interpreter, args: Vec<Object>, span: &Span) -> Result<Object> {
        let mut env = Env::with_parent(&self.env);
        for (param, arg) in self.params().iter().zip(args) {
            env.insert_unchecked(&param.name, arg);
        }
        let env = &mut Env::with_parent(&env);
        interpreter.enter(span)?;
        let result = interpreter.run_stmts(env, self.this.as_ref(), &self.decl.body.stmts);
        interpreter.exit();
        Ok(match result? {
            ControlFlow::Break(object) => object,
            ControlFlow::Continue(()) => Object::Nil,
        })
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Deref for Function {
    type Target = FunctionImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Eq for Function {}

#[allow(clippy::from_over_into)]
impl Into<Object> for Function {
    fn into(self) -> Object {
        Object::Function(self)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Finalize, Trace)]
pub struct FunctionImpl {
    #[unsafe_ignore_trace]
    pub decl: Rc<StmtFun>,
    pub env: Env,
    pub this: Option<Instance>,
}
