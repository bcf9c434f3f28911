use crate::types::Span;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::{self, SimpleFile};
use codespan_reporting::term;
use termcolor::WriteColor;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("IOError: {0}")]
    IoError(IoError),
    #[error("ParseError: {0}")]
    ParseError(ParseError),
    #[error("RecursionError: {0}")]
    RecursionError(RecursionError),
    #[error("ResolveError: {0}")]
    ResolveError(ResolveError),
    #[error("RuntimeError: {0}")]
    RuntimeError(RuntimeError),
}

impl Error {
    pub fn span(&self) -> Span {
        self.as_diagnostic()
            .labels
            .first()
            .map_or(0..0, |label| label.range.clone())
    }
}

impl AsDiagnostic for Error {
    fn as_diagnostic(&self) -> Diagnostic<()> {
        match self {
            Error::IoError(e) => e.as_diagnostic(),
            Error::ParseError(e) => e.as_diagnostic(),
            Error::RecursionError(e) => e.as_diagnostic(),
            Error::ResolveError(e) => e.as_diagnostic(),
            Error::RuntimeError(e) => e.as_diagnostic(),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum IoError {
    #[error("module {name:?} not found")]
    ModuleNotFound { name: String, span: Span },
    #[error("module {name:?} does not define a class named {name:?}")]
    ModuleWithoutClass { name: String, span: Span },
    #[error("unable to read from file: {file:?}")]
    ReadError { file: String, span: Span },
    #[error("unable to write to file: {file:?}")]
    WriteError { file: String, span: Span },
}

impl AsDiagnostic for IoError {
    fn as_diagnostic(&self) -> Diagnostic<()> {
        match self {
            IoError::ModuleNotFound { span, .. }
            | IoError::ModuleWithoutClass { span, .. }
            | IoError::ReadError { span, .. }
            | IoError::WriteError { span, .. } => Diagnostic::error()
                .with_code("IOError")
                .with_message(self.to_string())
                .with_labels(vec![Label::primary((), span.clone())]),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error("the {kind} {open:?} must end with its own name, not {close:?}")]
    MismatchedName { kind: String, open: String, close: String, span: Span },
    #[error("expected {expected}, found the end of the program")]
    UnexpectedEof { expected: String, span: Span },
    #[error("expected {expected}, found {found:?}")]
    UnexpectedToken { expected: String, found: String, span: Span },
    #[error("unterminated quote in {text}")]
    UnterminatedString { text: String, span: Span },
}

impl AsDiagnostic for ParseError {
    fn as_diagnostic(&self) -> Diagnostic<()> {
        match self {
            ParseError::MismatchedName { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::UnterminatedString { span, .. } => Diagnostic::error()
                .with_code("ParseError")
                .with_message(self.to_string())
                .with_labels(vec![Label::primary((), span.clone())]),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RecursionError {
    #[error("maximum recursion depth of {depth} exceeded")]
    MaxDepthExceeded { depth: usize, span: Span },
}

impl AsDiagnostic for RecursionError {
    fn as_diagnostic(&self) -> Diagnostic<()> {
        match self {
            RecursionError::MaxDepthExceeded { span, .. } => Diagnostic::error()
                .with_code("RecursionError")
                .with_message(self.to_string())
                .with_labels(vec![Label::primary((), span.clone())]),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ResolveError {
    #[error("cannot read {name:?} inside its own declaration")]
    AccessInsideInitializer { name: String, span: Span },
    #[error("name {name:?} is already defined")]
    AlreadyDefined { name: String, span: Span },
    #[error("{name:?} is always the same and cannot change")]
    AssignToConstant { name: String, span: Span },
    #[error("there can only be one mane paragraph, but {name:?} is another")]
    DuplicateMain { name: String, span: Span },
    #[error("class {name:?} cannot inherit from itself")]
    InheritFromSelf { name: String, span: Span },
    #[error("class {class:?} does not implement {method:?} from interface {interface:?}")]
    MissingInterfaceMethod { class: String, interface: String, method: String, span: Span },
    #[error("{name:?} is not an array")]
    NotAnArray { name: String, span: Span },
    #[error("name {name:?} is not defined")]
    NotDefined { name: String, span: Span },
    #[error("cannot iterate over a {type_}")]
    NotIterable { type_: String, span: Span },
    #[error("array type {name:?} must be plural")]
    NotPlural { name: String, span: Span },
    #[error(r#""Then you get" outside a paragraph"#)]
    ReturnOutsideFunction { span: Span },
    #[error("expected a {expected}, found a {found}")]
    TypeMismatch { expected: String, found: String, span: Span },
    #[error("class {class:?} implements an unknown interface {interface:?}")]
    UnknownInterface { class: String, interface: String, span: Span },
}

impl AsDiagnostic for ResolveError {
    fn as_diagnostic(&self) -> Diagnostic<()> {
        match self {
            ResolveError::AccessInsideInitializer { span, .. }
            | ResolveError::AlreadyDefined { span, .. }
            | ResolveError::AssignToConstant { span, .. }
            | ResolveError::DuplicateMain { span, .. }
            | ResolveError::InheritFromSelf { span, .. }
            | ResolveError::MissingInterfaceMethod { span, .. }
            | ResolveError::NotAnArray { span, .. }
            | ResolveError::NotDefined { span, .. }
            | ResolveError::NotIterable { span, .. }
            | ResolveError::NotPlural { span, .. }
            | ResolveError::ReturnOutsideFunction { span }
            | ResolveError::TypeMismatch { span, .. }
            | ResolveError::UnknownInterface { span, .. } => Diagnostic::error()
                .with_code("ResolveError")
                .with_message(self.to_string())
                .with_labels(vec![Label::primary((), span.clone())]),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RuntimeError {
    #[error("name {name:?} is already defined")]
    AlreadyDefined { name: String, span: Span },
    #[error("{name:?} takes {exp_args} arguments but {got_args} were given")]
    ArityMismatch { name: String, exp_args: usize, got_args: usize, span: Span },
    #[error("array index {index} is too large, the limit is {max}")]
    IndexTooLarge { index: String, max: usize, span: Span },
    #[error("array index must be a whole number, not {index:?}")]
    InvalidIndex { index: String, span: Span },
    #[error("cannot read {input:?} as a {type_}")]
    InvalidInput { input: String, type_: String, span: Span },
    #[error("{type_} has no attribute {name:?}")]
    NoSuchAttribute { type_: String, name: String, span: Span },
    #[error("{value:?} is not an array")]
    NotAnArray { value: String, span: Span },
    #[error("{value:?} is not an instance, so it has no field {name:?}")]
    NotAnInstance { value: String, name: String, span: Span },
    #[error("{type_} is not callable")]
    NotCallable { type_: String, span: Span },
    #[error("name {name:?} is not defined")]
    NotDefined { name: String, span: Span },
    #[error("cannot iterate over a {type_}")]
    NotIterable { type_: String, span: Span },
    #[error("superclass should be a class, not {type_}")]
    SuperclassInvalidType { type_: String, span: Span },
    #[error("unsupported operands for {op}: {lt:?} and {rt:?}")]
    UnsupportedOperandInfix { op: String, lt: String, rt: String, span: Span },
}

impl AsDiagnostic for RuntimeError {
    fn as_diagnostic(&self) -> Diagnostic<()> {
        match self {
            RuntimeError::AlreadyDefined { span, .. }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::IndexTooLarge { span, .. }
            | RuntimeError::InvalidIndex { span, .. }
            | RuntimeError::InvalidInput { span, .. }
            | RuntimeError::NoSuchAttribute { span, .. }
            | RuntimeError::NotAnArray { span, .. }
            | RuntimeError::NotAnInstance { span, .. }
            | RuntimeError::NotCallable { span, .. }
            | RuntimeError::NotDefined { span, .. }
            | RuntimeError::NotIterable { span, .. }
            | RuntimeError::SuperclassInvalidType { span, .. }
            | RuntimeError::UnsupportedOperandInfix { span, .. } => Diagnostic::error()
                .with_code("RuntimeError")
                .with_message(self.to_string())
                .with_labels(vec![Label::primary((), span.clone())]),
        }
    }
}

pub trait AsDiagnostic {
    fn as_diagnostic(&self) -> Diagnostic<()>;
}

/// Renders `e` against the program text it was raised for.
pub fn report_err(
    writer: &mut dyn WriteColor,
    name: &str,
    source: &str,
    e: &Error,
) -> Result<(), files::Error> {
    let file = SimpleFile::new(name, source);
    let config = term::Config::default();
    let diagnostic = e.as_diagnostic();
    term::emit(writer, &config, &file, &diagnostic)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use termcolor::NoColor;

    #[test]
    fn display_prefixes_category() {
        let e = Error::RuntimeError(RuntimeError::NotDefined { name: "Spike".to_string(), span: 7..12 });
        assert_eq!(r#"RuntimeError: name "Spike" is not defined"#, e.to_string());
        assert_eq!(7..12, e.span());
    }

    #[test]
    fn report_points_at_line() {
        let source = "I said 1.\nI said Spike.\n";
        let e = Error::ResolveError(ResolveError::NotDefined { name: "Spike".to_string(), span: 17..22 });
        let mut writer = NoColor::new(Vec::new());
        report_err(&mut writer, "letter.fpp", source, &e).unwrap();
        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.contains("error[ResolveError]"));
        assert!(output.contains("letter.fpp:2:8"));
    }
}
