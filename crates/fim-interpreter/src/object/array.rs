use std::fmt::{self, Display, Formatter};

use gc::{Finalize, Gc, GcCell, Trace};

use crate::object::Object;

/// Longest an array may grow through writes.
pub const MAX_LEN: usize = 1 << 24;

/// A growable array. Writes past the end pad the gap with nothing.
#[derive(Clone, Debug, Finalize, Trace)]
pub struct Array(Gc<GcCell<Vec<Object>>>);

impl Array {
    pub fn new(elems: Vec<Object>) -> Self {
        Self(Gc::new(GcCell::new(elems)))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Reading past the end yields nothing.
    pub fn get(&self, index: usize) -> Object {
        self.0.borrow().get(index).cloned().unwrap_or(Object::Nil)
    }

    /// Fails with the limit when the write would grow the array past [`MAX_LEN`].
    pub fn set(&self, index: usize, value: Object) -> Result<(), usize> {
        let len = index.checked_add(1).filter(|&len| len <= MAX_LEN).ok_or(MAX_LEN)?;
        let mut elems = self.0.borrow_mut();
        if len > elems.len() {
            elems.resize(len, Object::Nil);
        }
        elems[index] = value;
        Ok(())
    }

    pub fn elems(&self) -> Vec<Object> {
        self.0.borrow().clone()
    }
}

impl Display for Array {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let elems = self.0.borrow();
        for (idx, elem) in elems.iter().enumerate() {
            if idx != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{elem}")?;
        }
        Ok(())
    }
}

impl Eq for Array {}

#[allow(clippy::from_over_into)]
impl Into<Object> for Array {
    fn into(self) -> Object {
        Object::Array(self)
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn set_pads_with_nothing() {
        let array = Array::new(Vec::new());
        array.set(2, Object::String("Mango Cake".to_string())).unwrap();
        assert_eq!(3, array.len());
        assert_eq!(Object::Nil, array.get(0));
        assert_eq!(Object::String("Mango Cake".to_string()), array.get(2));
        assert_eq!("nothing, nothing, Mango Cake", array.to_string());
    }

    #[test]
    fn get_past_the_end() {
        let array = Array::new(vec![Object::Number(42.0)]);
        assert_eq!(Object::Number(42.0), array.get(0));
        assert_eq!(Object::Nil, array.get(7));
        assert!(!array.is_empty());
    }

    #[test]
    fn arrays_are_shared() {
        let array = Array::new(vec![Object::Number(0.0)]);
        let alias = array.clone();
        alias.set(0, Object::Number(69.0)).unwrap();
        assert_eq!(Object::Number(69.0), array.get(0));
        assert_eq!(array, alias);
        assert!(array != Array::new(vec![Object::Number(69.0)]));
    }

    #[test]
    fn set_past_the_limit() {
        let array = Array::new(vec![Object::Number(1.0)]);
        assert_eq!(Err(MAX_LEN), array.set(MAX_LEN, Object::Nil));
        assert_eq!(Err(MAX_LEN), array.set(usize::MAX, Object::Nil));
        assert_eq!(1, array.len());
    }
}
