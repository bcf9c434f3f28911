use once_cell::sync::Lazy;
use regex::Regex;

use std::fmt::{self, Display, Formatter};

/// Static type of a value, as far as spelled-out type names reveal it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    Array(Box<Type>),
    Bool,
    Char,
    Class(String),
    Number,
    String,
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::Array(elem) => write!(f, "{elem} array"),
            Type::Bool => write!(f, "logic"),
            Type::Char => write!(f, "letter"),
            Type::Class(name) => write!(f, "{name}"),
            Type::Number => write!(f, "number"),
            Type::String => write!(f, "word"),
        }
    }
}

pub(crate) const SINGULAR: &str = "number|letter|character|word|sentence|phrase|quote|name|logic|argument";
const PLURAL: &str = "numbers|letters|characters|words|sentences|phrases|quotes|names|logics|arguments";

static TYPE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:(?:a|an|the)\s+)?({SINGULAR})(?:\s+(.+))?$")).expect("invalid type prefix pattern")
});

static PLURAL_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:(?:the|many)\s+)?({PLURAL})$")).expect("invalid plural type pattern")
});

fn singular(word: &str) -> Option<Type> {
    match word.trim_end_matches('s') {
        "number" => Some(Type::Number),
        "letter" | "character" => Some(Type::Char),
        "word" | "sentence" | "phrase" | "quote" | "name" => Some(Type::String),
        "logic" | "argument" => Some(Type::Bool),
        _ => None,
    }
}

/// Splits a spelled-out type prefix off `text`.
///
/// `"the number 99"` becomes `(Some(Number), "99")`. When nothing follows
/// the prefix the whole text is kept as the name, so `"the number"` becomes
/// `(Some(Number), "the number")`.
pub fn separate_type(text: &str) -> (Option<Type>, &str) {
    match TYPE_PREFIX.captures(text) {
        Some(captures) => {
            let type_ = captures.get(1).and_then(|word| singular(word.as_str()));
            let rest = captures.get(2).map_or(text, |rest| rest.as_str());
            (type_, rest)
        }
        None => (None, text),
    }
}

/// Returns the type named by `text` when the whole text is a type name,
/// such as `"a word"` or `"the number"`.
pub fn type_name(text: &str) -> Option<Type> {
    match separate_type(text) {
        (Some(type_), rest) if rest == text => Some(type_),
        _ => None,
    }
}

/// Returns the array type named by a plural type name, such as `"words"`.
pub fn plural_type(text: &str) -> Option<Type> {
    let captures = PLURAL_TYPE.captures(text)?;
    let elem = singular(captures.get(1)?.as_str())?;
    Some(Type::Array(Box::new(elem)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn separate_type_strips_prefix() {
        assert_eq!((Some(Type::Number), "99"), separate_type("the number 99"));
        assert_eq!((Some(Type::Number), "x"), separate_type("number x"));
        assert_eq!((Some(Type::String), "\"Trixie\""), separate_type("the name \"Trixie\""));
        assert_eq!((Some(Type::Char), "'T'"), separate_type("a letter 'T'"));
        assert_eq!((Some(Type::Bool), "yes"), separate_type("the logic yes"));
    }

    #[test]
    fn separate_type_keeps_bare_type_names() {
        assert_eq!((Some(Type::Number), "the number"), separate_type("the number"));
        assert_eq!((Some(Type::String), "a word"), separate_type("a word"));
        assert_eq!((None, "first number"), separate_type("first number"));
        assert_eq!((None, "numbers"), separate_type("numbers"));
        assert_eq!((None, "Applejack"), separate_type("Applejack"));
    }

    #[test]
    fn type_name_requires_whole_text() {
        assert_eq!(Some(Type::String), type_name("a word"));
        assert_eq!(Some(Type::Number), type_name("a number"));
        assert_eq!(None, type_name("the number 5"));
        assert_eq!(None, type_name("Pinkie Pie"));
    }

    #[test]
    fn plural_type_names_arrays() {
        assert_eq!(Some(Type::Array(Box::new(Type::String))), plural_type("words"));
        assert_eq!(Some(Type::Array(Box::new(Type::Number))), plural_type("many numbers"));
        assert_eq!(Some(Type::Array(Box::new(Type::Char))), plural_type("the letters"));
        assert_eq!(None, plural_type("word"));
        assert_eq!(None, plural_type("cupcakes"));
    }
}
