mod array;
mod callable;
mod class;
mod function;
mod instance;

use std::fmt::{self, Display, Formatter};

pub use array::{Array, MAX_LEN};
pub use callable::Callable;
pub use class::{Class, ROOT_CLASS};
use fim_common::error::{Error, Result, RuntimeError};
use fim_common::types::Span;
pub use function::Function;
use gc::{Finalize, Trace};
pub use instance::Instance;

use crate::Interpreter;

#[derive(Clone, Debug, Finalize, Trace)]
pub enum Object {
    Array(Array),
    Bool(bool),
    Char(char),
    Class(Class),
    Function(Function),
    Instance(Instance),
    Nil,
    Number(f64),
    String(String),
}

impl Object {
    pub fn bool(&self) -> bool {
        !matches!(self, Object::Nil | Object::Bool(false))
    }

    pub fn type_(&self) -> String {
        match self {
            Object::Array(_) => "array".to_string(),
            Object::Bool(_) => "logic".to_string(),
            Object::Char(_) => "letter".to_string(),
            Object::Class(_) => "class".to_string(),
            Object::Function(_) => "paragraph".to_string(),
            Object::Instance(instance) => instance.class().name().to_string(),
            Object::Nil => "nothing".to_string(),
            Object::Number(_) => "number".to_string(),
            Object::String(_) => "word".to_string(),
        }
    }

    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Object>, span: &Span) -> Result<Object> {
        match &self {
            Object::Class(class) => class.call(interpreter, args, span),
            Object::Function(function) => function.call(interpreter, args, span),
            object => {
                Err(Error::RuntimeError(RuntimeError::NotCallable { type_: object.type_(), span: span.clone() }))
            }
        }
    }

    /// Calls paragraphs and classes that take nothing, and returns every
    /// other value as it is.
    pub fn invoke_bare(self, interpreter: &mut Interpreter, span: &Span) -> Result<Object> {
        let arity = match &self {
            Object::Class(class) => Some(class.arity()),
            Object::Function(function) => Some(function.arity()),
            _ => None,
        };
        match arity {
            Some(0) => self.call(interpreter, Vec::new(), span),
            _ => Ok(self),
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Object::Array(array) => write!(f, "{array}"),
            Object::Bool(bool) => write!(f, "{bool}"),
            Object::Char(char) => write!(f, "{char}"),
            Object::Class(class) => write!(f, "{class}"),
            Object::Function(function) => write!(f, "{function}"),
            Object::Instance(instance) => write!(f, "{instance}"),
            Object::Nil => write!(f, "nothing"),
            Object::Number(number) => write!(f, "{number}"),
            Object::String(string) => write!(f, "{string}"),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Array(a1), Object::Array(a2)) => a1 == a2,
            (Object::Bool(b1), Object::Bool(b2)) => b1 == b2,
            (Object::Char(c1), Object::Char(c2)) => c1 == c2,
            (Object::Class(c1), Object::Class(c2)) => c1 == c2,
            (Object::Function(f1), Object::Function(f2)) => f1 == f2,
            (Object::Instance(i1), Object::Instance(i2)) => i1 == i2,
            (Object::Nil, Object::Nil) => true,
            (Object::Number(n1), Object::Number(n2)) => n1 == n2,
            (Object::String(s1), Object::String(s2)) => s1 == s2,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn stringify() {
        assert_eq!("5", Object::Number(5.0).to_string());
        assert_eq!("-1", Object::Number(-1.0).to_string());
        assert_eq!("2.5", Object::Number(2.5).to_string());
        assert_eq!("true", Object::Bool(true).to_string());
        assert_eq!("nothing", Object::Nil.to_string());
        assert_eq!("T", Object::Char('T').to_string());
    }

    #[test]
    fn stringify_whole_numbers_round_trip() {
        for number in [0.0, 1.0, -42.0, 5050.0, 1e15] {
            let text = Object::Number(number).to_string();
            assert!(!text.contains('.'));
            let parsed = text.parse::<f64>().unwrap();
            assert_eq!(text, Object::Number(parsed).to_string());
        }
    }

    #[test]
    fn truthiness() {
        assert!(!Object::Nil.bool());
        assert!(!Object::Bool(false).bool());
        assert!(Object::Number(0.0).bool());
        assert!(Object::String(String::new()).bool());
    }

    #[test]
    fn equality_is_by_value_for_primitives() {
        assert_eq!(Object::String("Gala".to_string()), Object::String("Gala".to_string()));
        assert!(Object::Number(1.0) != Object::String("1".to_string()));
        assert!(Object::Char('a') != Object::String("a".to_string()));
    }
}
