use std::ops::Deref;

use fim_common::error::{Error, Result, RuntimeError};
use fim_common::types::Span;
use gc::{Finalize, Gc, GcCell, Trace};
use rustc_hash::FxHashMap;

use crate::object::Object;

/// One frame of the runtime scope chain.
#[derive(Clone, Debug, Default, Finalize, Trace)]
pub struct Env(Gc<GcCell<EnvImpl>>);

impl Deref for Env {
    type Target = Gc<GcCell<EnvImpl>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Env {
    pub fn with_parent(parent: &Env) -> Self {
        let env = EnvImpl { map: FxHashMap::default(), parent: Some(parent.clone()) };
        Self(Gc::new(GcCell::new(env)))
    }

    /// The outermost frame of the chain.
    pub fn globals(&self) -> Env {
        match &self.borrow().parent {
            Some(parent) => parent.globals(),
            None => self.clone(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.borrow().map.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        self.borrow().map.get(name).cloned()
    }

    pub fn get_at(&self, name: &str, depth: usize) -> Option<Object> {
        if depth == 0 {
            self.get(name)
        } else {
            self.borrow()
                .parent
                .as_ref()
                .unwrap_or_else(|| unreachable!("variable pointed to invalid scope: {name:?}"))
                .get_at(name, depth - 1)
        }
    }

    /// Binds a new name in this frame. A name can only be bound once per
    /// frame.
    pub fn define(&mut self, name: &str, value: Object, span: &Span) -> Result<()> {
        let mut env = self.borrow_mut();
        if env.map.contains_key(name) {
            return Err(Error::RuntimeError(RuntimeError::AlreadyDefined {
                name: name.to_string(),
                span: span.clone(),
            }));
        }
        env.map.insert(name.to_string(), value);
        Ok(())
    }

    pub fn set(&mut self, name: &str, value: Object) -> Result<(), ()> {
        match self.borrow_mut().map.get_mut(name) {
            Some(entry) => {
                *entry = value;
                Ok(())
            }
            None => Err(()),
        }
    }

    pub fn set_at(&mut self, name: &str, value: Object, depth: usize) -> Result<(), ()> {
        if depth == 0 {
            self.set(name, value)
        } else {
            self.borrow_mut()
                .parent
                .as_mut()
                .unwrap_or_else(|| unreachable!("variable pointed to invalid scope: {name:?}"))
                .set_at(name, value, depth - 1)
        }
    }

    pub fn insert_unchecked(&mut self, name: &str, value: Object) {
        self.borrow_mut().map.insert(name.to_string(), value);
    }
}

#[derive(Debug, Default, Finalize, Trace)]
pub struct EnvImpl {
    map: FxHashMap<String, Object>,
    parent: Option<Env>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn nest(env: &Env, depth: usize) -> Env {
        (0..depth).fold(env.clone(), |env, _| Env::with_parent(&env))
    }

    #[test]
    fn get_at_walks_up_the_chain() {
        for depth in 0..5 {
            let mut globals = Env::default();
            globals.define("Applejack", Object::Number(99.0), &(0..0)).unwrap();
            let env = nest(&globals, depth);
            assert_eq!(Some(Object::Number(99.0)), env.get_at("Applejack", depth));
        }
    }

    #[test]
    fn set_at_then_get_at() {
        for depth in 0..5 {
            let mut globals = Env::default();
            globals.define("Applejack", Object::Number(99.0), &(0..0)).unwrap();
            let mut env = nest(&globals, depth);
            env.set_at("Applejack", Object::String("apples".to_string()), depth).unwrap();
            assert_eq!(Some(Object::String("apples".to_string())), env.get_at("Applejack", depth));
            assert_eq!(Some(Object::String("apples".to_string())), globals.get("Applejack"));
        }
    }

    #[test]
    fn define_twice_in_one_frame() {
        let mut env = Env::default();
        env.define("Rarity", Object::Nil, &(0..0)).unwrap();
        let err = env.define("Rarity", Object::Nil, &(3..9)).unwrap_err();
        assert_eq!(r#"RuntimeError: name "Rarity" is already defined"#, err.to_string());

        let mut child = Env::with_parent(&env);
        assert!(child.define("Rarity", Object::Bool(true), &(0..0)).is_ok());
        assert_eq!(Some(Object::Nil), env.get("Rarity"));
    }

    #[test]
    fn set_unknown_name_fails() {
        let mut env = Env::with_parent(&Env::default());
        assert_eq!(Err(()), env.set("Spike", Object::Nil));
    }

    #[test]
    fn globals_is_the_outermost_frame() {
        let mut globals = Env::default();
        globals.insert_unchecked("Celestia", Object::Bool(true));
        let env = nest(&globals, 3);
        assert!(env.globals().contains("Celestia"));
        assert!(!env.contains("Celestia"));
    }
}
