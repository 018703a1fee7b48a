//! Abstract Syntax Tree definitions for Starlight
//!
//! Every construct is a tagged sum type; there is no node inheritance. Children are owned
//! exclusively by their parent, so the tree has no cycles.
//!
//! Some fields are *decorations*: they are `None` after parsing and filled in by later stages.
//! - `symbol` fields are set by the scope resolver.
//! - `ty` / `resolved` fields, `call_kind` and `dispatch` are set by the type checker.

use serde::Serialize;
use starlight_core::lang::builtins::BuiltinFnId;
use starlight_core::lang::members::MemberId;
use starlight_core::types::Type;

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Ident = String;

/// Handle to a symbol in the resolver's symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A compilation unit: top-level declarations and statements in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub declarations: Vec<Spanned<Declaration>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Declaration {
    Function(FunctionDecl),
    Class(ClassDecl),
    Data(DataClassDecl),
    Interface(InterfaceDecl),
    Extension(ExtensionDecl),
    Statement(Statement),
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: Ident,
    pub name_span: Span,
    pub is_async: bool,
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeExpr>>,
    pub body: FunctionBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    /// Declared or inferred return type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_return: Option<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "body", content = "value", rename_all = "snake_case")]
pub enum FunctionBody {
    Block(Block),
    /// `fun f(x: int) = x * 2`
    Expr(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: Ident,
    pub span: Span,
    pub ty: Option<Spanned<TypeExpr>>,
    pub default: Option<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Type>,
}

/// A field introduced in a class or data-class header: `data Point(x: int, y: int)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldParam {
    pub name: Ident,
    pub span: Span,
    pub ty: Spanned<TypeExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDecl {
    pub name: Ident,
    pub name_span: Span,
    pub fields: Vec<FieldParam>,
    pub supertypes: Vec<Spanned<Ident>>,
    pub members: Vec<ClassMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "member", content = "value", rename_all = "snake_case")]
pub enum ClassMember {
    Field(Spanned<VarDecl>),
    Method(Spanned<FunctionDecl>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataClassDecl {
    pub name: Ident,
    pub name_span: Span,
    pub fields: Vec<FieldParam>,
    pub supertypes: Vec<Spanned<Ident>>,
    pub methods: Vec<Spanned<FunctionDecl>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceDecl {
    pub name: Ident,
    pub name_span: Span,
    pub methods: Vec<Spanned<MethodSig>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSig {
    pub name: Ident,
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeExpr>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
}

/// `extend string { fun shout() -> string = this + "!" }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionDecl {
    pub receiver: Spanned<TypeExpr>,
    pub functions: Vec<Spanned<FunctionDecl>>,
    /// Key under which the functions are registered (`string`, `List`, `Point`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_key: Option<String>,
    /// Receiver type, set by the type checker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_receiver: Option<Type>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub statements: Vec<Spanned<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Statement {
    Var(VarDecl),
    Block(Block),
    If(IfStmt),
    While(WhileStmt),
    ForIn(ForInStmt),
    ForC(ForCStmt),
    Return(ReturnStmt),
    Break,
    Continue,
    Expr(ExprStmt),
}

/// `val x: int = 1` / `var y = 2`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarDecl {
    pub mutable: bool,
    pub name: Ident,
    pub name_span: Span,
    pub ty: Option<Spanned<TypeExpr>>,
    pub init: Option<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfStmt {
    pub condition: Expression,
    pub then_block: Block,
    /// Either another `If` statement (`else if`) or a `Block`.
    pub else_branch: Option<Box<Spanned<Statement>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhileStmt {
    pub condition: Expression,
    pub body: Block,
}

/// `for x in items { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForInStmt {
    pub var: Ident,
    pub var_span: Span,
    pub iterable: Expression,
    pub body: Block,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Type>,
}

/// `for (var i = 0; i < n; i++) { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForCStmt {
    pub init: Option<Box<Spanned<Statement>>>,
    pub condition: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnStmt {
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExprStmt {
    pub expr: Expression,
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression node together with its span and (after type checking) its type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub kind: ExprKind,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
}

impl Expression {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span, ty: None }
    }

    /// Type recorded by the checker, or `Unresolved` if the node was never typed.
    pub fn ty(&self) -> Type {
        self.ty.clone().unwrap_or(Type::Unresolved)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum ExprKind {
    Literal(Literal),
    Ident(IdentRef),
    This,
    /// Interpolated string, before desugaring.
    Template(TemplateExpr),
    List(ListExpr),
    Map(MapExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Postfix(PostfixExpr),
    Assign(AssignExpr),
    Conditional(ConditionalExpr),
    Call(CallExpr),
    MethodCall(MethodCallExpr),
    Member(MemberExpr),
    NonNull(NonNullExpr),
    Index(IndexExpr),
    Range(RangeExpr),
    Await(AwaitExpr),
    Lambda(LambdaExpr),
    Comprehension(Box<Comprehension>),
    Match(Box<MatchExpr>),
    /// Statements followed by a value. Produced by desugaring and block-bodied match arms.
    Block(Box<BlockExpr>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "literal", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Long(i64),
    Float(f64),
    Double(f64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentRef {
    pub name: Ident,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateExpr {
    pub parts: Vec<TemplatePart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "part", content = "value", rename_all = "snake_case")]
pub enum TemplatePart {
    Text(String),
    Expr(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListExpr {
    pub elements: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapExpr {
    pub entries: Vec<(Expression, Expression)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod)
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::NotEq)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryExpr {
    pub left: Box<Expression>,
    pub op: BinaryOp,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostfixOp {
    Increment,
    Decrement,
}

impl PostfixOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PostfixOp::Increment => "++",
            PostfixOp::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostfixExpr {
    pub operand: Box<Expression>,
    pub op: PostfixOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
        }
    }

    /// Arithmetic operator behind a compound assignment.
    pub fn binary_op(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
            AssignOp::ModAssign => Some(BinaryOp::Mod),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignExpr {
    pub target: Box<Expression>,
    pub op: AssignOp,
    pub value: Box<Expression>,
}

/// `cond ? a : b`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalExpr {
    pub condition: Box<Expression>,
    pub then_expr: Box<Expression>,
    pub else_expr: Box<Expression>,
}

/// How a call is dispatched, decided by the type checker.
#[derive(Debug, Clone, PartialEq)]
pub enum CallKind {
    /// Call to a declared top-level function.
    Function,
    /// Call to a builtin free function.
    Builtin(BuiltinFnId),
    /// `Point(1, 2)`: construct a class or data-class instance.
    Constructor(Ident),
    /// Call through a value of function type.
    Closure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallExpr {
    pub callee: Box<Expression>,
    pub args: Vec<Expression>,
    #[serde(skip)]
    pub call_kind: Option<CallKind>,
}

/// How a method call is dispatched, decided by the type checker.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodDispatch {
    /// Member of a class, data class or interface.
    Instance,
    /// Member of a builtin type (`string`, `List`, `Map`).
    Builtin(MemberId),
    /// Extension function registered under a receiver key.
    Extension { receiver_key: String },
    /// Call through a function-typed field.
    FieldClosure,
}

/// `receiver.method(args)` / `receiver?.method(args)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodCallExpr {
    pub receiver: Box<Expression>,
    pub method: Ident,
    pub method_span: Span,
    pub args: Vec<Expression>,
    pub safe: bool,
    #[serde(skip)]
    pub dispatch: Option<MethodDispatch>,
}

/// `object.field` / `object?.field`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberExpr {
    pub object: Box<Expression>,
    pub field: Ident,
    pub field_span: Span,
    pub safe: bool,
}

/// `value!!`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonNullExpr {
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexExpr {
    pub object: Box<Expression>,
    pub index: Box<Expression>,
}

/// `start..end` (end exclusive)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeExpr {
    pub start: Box<Expression>,
    pub end: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AwaitExpr {
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LambdaExpr {
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeExpr>>,
    pub body: LambdaBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "body", content = "value", rename_all = "snake_case")]
pub enum LambdaBody {
    Expr(Box<Expression>),
    Block(Block),
}

/// `[element | for var in iterable if condition]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comprehension {
    pub element: Expression,
    pub var: Ident,
    pub var_span: Span,
    pub iterable: Expression,
    pub condition: Option<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchExpr {
    pub scrutinee: Expression,
    pub arms: Vec<MatchArm>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchArm {
    pub pattern: Spanned<Pattern>,
    pub guard: Option<Expression>,
    pub body: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockExpr {
    pub statements: Vec<Spanned<Statement>>,
    /// Trailing value; `None` makes the block `void`.
    pub value: Option<Expression>,
}

// ============================================================================
// Patterns
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum Pattern {
    Literal(LiteralPattern),
    /// `Point(x, _)`
    Constructor(ConstructorPattern),
    /// `{x, y}` matched positionally against the scrutinee's data-class fields.
    Destructure(DestructurePattern),
    /// `n: int`
    Typed(TypedPattern),
    Wildcard,
    Binding(BindingPattern),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralPattern {
    pub value: Literal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorPattern {
    pub name: Ident,
    pub args: Vec<Spanned<Pattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestructurePattern {
    pub elements: Vec<Spanned<Pattern>>,
    /// Data class the pattern destructures, set by the type checker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_class: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedPattern {
    pub name: Ident,
    pub ty: Spanned<TypeExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingPattern {
    pub name: Ident,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
}

// ============================================================================
// Type expressions
// ============================================================================

/// A type as written in source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeExpr {
    /// `int`, `Point`, `List<int>`
    Named { name: Ident, args: Vec<Spanned<TypeExpr>> },
    /// `T?`
    Nullable { inner: Box<Spanned<TypeExpr>> },
    /// `(A, B) -> R`
    Function {
        params: Vec<Spanned<TypeExpr>>,
        ret: Box<Spanned<TypeExpr>>,
    },
    /// `A | B`
    Union { members: Vec<Spanned<TypeExpr>> },
    /// `A & B`
    Intersection { members: Vec<Spanned<TypeExpr>> },
}

impl TypeExpr {
    pub fn named(name: impl Into<Ident>) -> Self {
        TypeExpr::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }
}
