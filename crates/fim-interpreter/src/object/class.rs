use std::fmt::{self, Display, Formatter};
use std::ops::Deref;
use std::rc::Rc;

use fim_common::error::Result;
use fim_common::types::Span;
use fim_syntax::ast::StmtClass;
use gc::{Finalize, Gc, Trace};
use rustc_hash::FxHashMap;

use crate::env::Env;
use crate::object::{Callable, Function, Instance, Object};
use crate::Interpreter;

/// Name of the class every other class descends from.
pub const ROOT_CLASS: &str = "Princess Celestia";

#[derive(Clone, Debug, Finalize, Trace)]
pub struct Class(Gc<ClassImpl>);

impl Class {
    pub fn root() -> Self {
        let class = ClassImpl {
            name: ROOT_CLASS.to_string(),
            decl: None,
            super_: None,
            methods: FxHashMap::default(),
            env: Env::default(),
        };
        Self(Gc::new(class))
    }

    pub fn new(decl: &Rc<StmtClass>, super_: Class, env: &Env) -> Self {
        let methods = decl.methods.iter().map(|(fun, _)| (fun.name.to_string(), Function::new(fun, env))).collect();
        let class = ClassImpl {
            name: decl.name.to_string(),
            decl: Some(Rc::clone(decl)),
            super_: Some(super_),
            methods,
            env: env.clone(),
        };
        Self(Gc::new(class))
    }

    /// Looks `name` up along the inheritance chain and binds it to `this`.
    pub fn method(&self, name: &str, this: &Instance) -> Option<Function> {
        let function = self.method_helper(name)?;
        Some(function.bind(this))
    }

    fn method_helper(&self, name: &str) -> Option<&Function> {
        if let Some(method) = self.methods.get(name) {
            Some(method)
        } else if let Some(super_) = &self.super_ {
            super_.method_helper(name)
        } else {
            None
        }
    }

    /// The mane paragraph, if this class declares one.
    pub fn main(&self) -> Option<&Function> {
        self.methods.values().find(|method| method.is_main())
    }

    pub fn instantiate(&self, interpreter: &mut Interpreter) -> Result<Instance> {
        let instance = Instance::new(self);
        self.init(interpreter, &instance)?;
        Ok(instance)
    }

    /// Evaluates field initializers, the superclass's first, so a subclass
    /// can override an inherited default.
    fn init(&self, interpreter: &mut Interpreter, instance: &Instance) -> Result<()> {
        if let Some(super_) = &self.super_ {
            super_.init(interpreter, instance)?;
        }
        if let Some(decl) = &self.decl {
            for field in &decl.fields {
                interpreter.init_field(&self.env, instance, field)?;
            }
        }
        Ok(())
    }
}

impl Callable for Class {
    fn arity(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        &self.0.name
    }

    fn call_unchecked(&self, interpreter: &mut Interpreter, _args: Vec<Object>, span: &Span) -> Result<Object> {
        // A field that builds its own class would otherwise never finish.
        interpreter.enter(span)?;
        let instance = self.instantiate(interpreter);
        interpreter.exit();
        Ok(instance?.into())
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Deref for Class {
    type Target = ClassImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Eq for Class {}

#[allow(clippy::from_over_into)]
impl Into<Object> for Class {
    fn into(self) -> Object {
        Object::Class(self)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Finalize, Trace)]
pub struct ClassImpl {
    pub name: String,
    #[unsafe_ignore_trace]
    pub decl: Option<Rc<StmtClass>>,
    pub super_: Option<Class>,
    pub methods: FxHashMap<String, Function>,
    pub env: Env,
}
