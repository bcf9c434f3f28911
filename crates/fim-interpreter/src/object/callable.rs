use fim_common::error::{Error, Result, RuntimeError};
use fim_common::types::Span;

use crate::object::Object;
use crate::Interpreter;

pub trait Callable {
    fn arity(&self) -> usize;

    fn name(&self) -> &str;

    fn call_unchecked(&self, interpreter: &mut Interpreter, args: Vec<Object>, span: &Span) -> Result<Object>;

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Object>, span: &Span) -> Result<Object> {
        let exp_args = self.arity();
        let got_args = args.len();
        if exp_args != got_args {
            return Err(Error::RuntimeError(RuntimeError::ArityMismatch {
                name: self.name().to_string(),
                exp_args,
                got_args,
                span: span.clone(),
            }));
        }
        self.call_unchecked(interpreter, args, span)
    }
}
