use crate::types::Type;

use fim_common::types::{Span, Spanned};

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type StmtS = Spanned<Stmt>;
pub type ExprS = Spanned<Expr>;

#[derive(Debug, Default)]
pub struct Program {
    pub stmts: Vec<StmtS>,
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Array(StmtArray),
    ArraySet(Box<StmtArraySet>),
    Class(Rc<StmtClass>),
    Decrement(StmtStep),
    DoWhile(Box<StmtDoWhile>),
    Expr(StmtExpr),
    For(Box<StmtFor>),
    ForIter(Box<StmtForIter>),
    Fun(Rc<StmtFun>),
    If(Box<StmtIf>),
    Import(StmtImport),
    Increment(StmtStep),
    Interface(StmtInterface),
    Print(StmtPrint),
    Read(StmtRead),
    Return(StmtReturn),
    Switch(Box<StmtSwitch>),
    Var(StmtVar),
    While(Box<StmtWhile>),
}

/// An array declaration, either empty ("has many words") or filled from a
/// chain of "and"-joined values ("has words X and Y").
#[derive(Debug, PartialEq)]
pub struct StmtArray {
    pub name: String,
    pub elem_type: Spanned<String>,
    pub value: Option<ExprS>,
    pub constant: bool,
}

#[derive(Debug, PartialEq)]
pub struct StmtArraySet {
    pub array: ExprS,
    pub index: ExprS,
    pub value: ExprS,
}

#[derive(Debug, Default, PartialEq)]
pub struct StmtBlock {
    pub stmts: Vec<StmtS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtClass {
    pub name: String,
    pub super_: Spanned<Var>,
    pub interfaces: Vec<Spanned<String>>,
    pub fields: Vec<Rc<StmtS>>,
    pub methods: Vec<Spanned<Rc<StmtFun>>>,
    pub author: String,
}

#[derive(Debug, PartialEq)]
pub struct StmtDoWhile {
    pub body: StmtBlock,
    pub cond: ExprS,
}

/// An expression statement evaluates an expression and discards the result.
#[derive(Debug, PartialEq)]
pub struct StmtExpr {
    pub value: ExprS,
}

/// A counted loop, already rewritten as an initializer, a condition and a
/// body that ends by incrementing the counter.
#[derive(Debug, PartialEq)]
pub struct StmtFor {
    pub init: Spanned<StmtVar>,
    pub cond: ExprS,
    pub body: StmtBlock,
}

#[derive(Debug, PartialEq)]
pub struct StmtForIter {
    pub var: Param,
    pub iterable: ExprS,
    pub body: StmtBlock,
}

#[derive(Debug, PartialEq)]
pub struct StmtFun {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub body: StmtBlock,
    pub is_main: bool,
}

#[derive(Debug, PartialEq)]
pub struct StmtIf {
    pub cond: ExprS,
    pub then: StmtBlock,
    pub else_: Option<StmtBlock>,
}

#[derive(Debug, PartialEq)]
pub struct StmtImport {
    pub name: String,
}

#[derive(Debug, PartialEq)]
pub struct StmtInterface {
    pub name: String,
    pub methods: Vec<Spanned<String>>,
}

#[derive(Debug, PartialEq)]
pub struct StmtPrint {
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct StmtRead {
    pub var: Spanned<Var>,
    pub prompt: Option<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtReturn {
    pub value: ExprS,
}

/// Increment or decrement of a variable, field or array element.
#[derive(Debug, PartialEq)]
pub struct StmtStep {
    pub target: ExprS,
    pub amount: Option<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtSwitch {
    pub value: ExprS,
    pub cases: Vec<(ExprS, StmtBlock)>,
    pub default: Option<StmtBlock>,
}

#[derive(Debug, PartialEq)]
pub struct StmtVar {
    pub name: String,
    pub type_: Option<Type>,
    pub value: Option<ExprS>,
    pub constant: bool,
}

#[derive(Debug, PartialEq)]
pub struct StmtWhile {
    pub cond: ExprS,
    pub body: StmtBlock,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_: Option<Type>,
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Assign(Box<ExprAssign>),
    Call(Box<ExprCall>),
    Get(Box<ExprGet>),
    Infix(Box<ExprInfix>),
    Literal(ExprLiteral),
    Prefix(Box<ExprPrefix>),
    Set(Box<ExprSet>),
    Var(ExprVar),
}

#[derive(Debug, PartialEq)]
pub struct ExprAssign {
    pub var: Var,
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct ExprCall {
    pub callee: ExprS,
    pub args: Vec<ExprS>,
}

/// Member access. The accessor is a name for fields and methods, or a
/// number (or a name holding one) when the object is an array.
#[derive(Debug, PartialEq)]
pub struct ExprGet {
    pub object: ExprS,
    pub accessor: ExprS,
}

impl ExprGet {
    pub fn name(&self) -> Option<&str> {
        match &self.accessor.0 {
            Expr::Var(var) => Some(&var.var.name),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct ExprInfix {
    pub lt: ExprS,
    pub op: OpInfix,
    pub rt: ExprS,
}

#[derive(Debug, PartialEq)]
pub enum ExprLiteral {
    Bool(bool),
    Char(char),
    Null,
    Number(f64),
    String(String),
}

#[derive(Debug, PartialEq)]
pub struct ExprPrefix {
    pub op: OpPrefix,
    pub rt: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct ExprSet {
    pub object: ExprS,
    pub accessor: ExprS,
    pub value: ExprS,
}

impl ExprSet {
    pub fn name(&self) -> Option<&str> {
        match &self.accessor.0 {
            Expr::Var(var) => Some(&var.var.name),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct ExprVar {
    pub var: Var,
}

/// Identity of a single name reference in the tree. Identities are unique
/// across every program parsed by the process, so the tables keyed by them
/// can be merged when one program imports another.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VarId(usize);

impl VarId {
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Var {
    pub id: VarId,
    pub name: String,
    /// Type spelled out in front of the name, as in "the number x".
    pub type_: Option<Type>,
}

impl Var {
    pub fn new(name: &str, type_: Option<Type>) -> Self {
        Self { id: VarId::fresh(), name: name.to_string(), type_ }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpInfix {
    Add,
    And,
    Concat,
    Divide,
    Equal,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Modulo,
    Multiply,
    NotEqual,
    Or,
    Subtract,
    Xor,
}

impl OpInfix {
    pub fn is_arithmetic(self) -> bool {
        matches!(self, OpInfix::Add | OpInfix::Divide | OpInfix::Modulo | OpInfix::Multiply | OpInfix::Subtract)
    }
}

impl Display for OpInfix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            OpInfix::Add => "plus",
            OpInfix::And => "and",
            OpInfix::Concat => "concatenation",
            OpInfix::Divide => "divided by",
            OpInfix::Equal => "is",
            OpInfix::Greater => "is greater than",
            OpInfix::GreaterEqual => "is no less than",
            OpInfix::Less => "is less than",
            OpInfix::LessEqual => "is no more than",
            OpInfix::Modulo => "modulo",
            OpInfix::Multiply => "times",
            OpInfix::NotEqual => "is not",
            OpInfix::Or => "or",
            OpInfix::Subtract => "minus",
            OpInfix::Xor => "either or",
        };
        write!(f, "{op}")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpPrefix {
    Not,
}

impl Display for OpPrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OpPrefix::Not => write!(f, "not"),
        }
    }
}

/// Span covering both ends of a pair of spans.
pub fn join(start: &Span, end: &Span) -> Span {
    start.start..end.end
}
