//! The syntax tree is a plain, immutable algebraic data type. Every node
//! carries an optional [`Location`] and a [`NodeKind`] describing what it is.
//! Structural fields hold either a single child (`Box<Node>`), an optional
//! child, or an ordered sequence of children; all other fields are plain data.
//!
//! Nodes never refer to their parents. Passes that need ancestry reconstruct
//! it during traversal.

mod children;
mod pretty;

pub use self::pretty::Prettier;

use std::fmt;

use crate::source::Location;

/// A node in the syntax tree with the location of the text it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub location: Option<Location>,
}

impl Node {
    pub fn new(kind: NodeKind, location: Location) -> Self {
        Self {
            kind,
            location: Some(location),
        }
    }

    /// A node without any location, typically produced by a rewrite.
    pub fn synthetic(kind: NodeKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    /// An empty statement at the given location.
    pub fn nop(location: Option<Location>) -> Self {
        Self {
            kind: NodeKind::Nop,
            location,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::ExpressionStatement { .. }
                | NodeKind::Block { .. }
                | NodeKind::If { .. }
                | NodeKind::While { .. }
                | NodeKind::DoWhile { .. }
                | NodeKind::For { .. }
                | NodeKind::Foreach { .. }
                | NodeKind::Switch { .. }
                | NodeKind::Break { .. }
                | NodeKind::Continue { .. }
                | NodeKind::Return { .. }
                | NodeKind::Throw { .. }
                | NodeKind::Try { .. }
                | NodeKind::Echo { .. }
                | NodeKind::Global { .. }
                | NodeKind::StaticVariables { .. }
                | NodeKind::Unset { .. }
                | NodeKind::InlineHtml { .. }
                | NodeKind::Nop
                | NodeKind::Label { .. }
                | NodeKind::Goto { .. }
                | NodeKind::Namespace { .. }
                | NodeKind::Use { .. }
                | NodeKind::ConstDeclaration { .. }
                | NodeKind::Declare { .. }
                | NodeKind::FunctionDeclaration { .. }
                | NodeKind::ClassDeclaration { .. }
                | NodeKind::InterfaceDeclaration { .. }
                | NodeKind::TraitDeclaration { .. }
                | NodeKind::EnumDeclaration { .. }
        )
    }

    /// Render this node and its children as an indented S-expression.
    pub fn pretty(&self, width: usize) -> String {
        let prettier = Prettier::new().with_width(width);
        prettier.pretty(self)
    }

    /// Whether this node introduces a loop or a `switch`, i.e. something a
    /// `break` or `continue` may target.
    pub fn is_breakable(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::While { .. }
                | NodeKind::DoWhile { .. }
                | NodeKind::For { .. }
                | NodeKind::Foreach { .. }
                | NodeKind::Switch { .. }
        )
    }

    /// Whether this node starts a new function scope.
    pub fn is_function_like(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::FunctionDeclaration { .. }
                | NodeKind::Method { .. }
                | NodeKind::Closure { .. }
                | NodeKind::ArrowFunction { .. }
        )
    }

    /// Whether this node is a class, interface, trait or enum declaration.
    pub fn is_class_like(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::ClassDeclaration { .. }
                | NodeKind::InterfaceDeclaration { .. }
                | NodeKind::TraitDeclaration { .. }
                | NodeKind::EnumDeclaration { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// The root of every parsed file.
    Program { statements: Vec<Node> },

    // Statements
    /// An expression followed by a `;`.
    ExpressionStatement { expression: Box<Node> },
    /// `{ statements }`
    Block { statements: Vec<Node> },
    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_ifs: Vec<Node>,
        else_branch: Option<Box<Node>>,
    },
    ElseIf {
        condition: Box<Node>,
        body: Box<Node>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    DoWhile {
        body: Box<Node>,
        condition: Box<Node>,
    },
    For {
        init: Vec<Node>,
        condition: Vec<Node>,
        update: Vec<Node>,
        body: Box<Node>,
    },
    Foreach {
        subject: Box<Node>,
        key: Option<Box<Node>>,
        value: Box<Node>,
        by_ref: bool,
        body: Box<Node>,
    },
    Switch {
        subject: Box<Node>,
        cases: Vec<Node>,
    },
    /// A `case` or, without a test, a `default` arm of a switch.
    Case {
        test: Option<Box<Node>>,
        body: Vec<Node>,
    },
    Break { levels: Option<Box<Node>> },
    Continue { levels: Option<Box<Node>> },
    Return { value: Option<Box<Node>> },
    /// `throw`, either as a statement or as an expression.
    Throw { expression: Box<Node> },
    Try {
        body: Box<Node>,
        catches: Vec<Node>,
        finally: Option<Box<Node>>,
    },
    Catch {
        types: Vec<Node>,
        variable: Option<Box<Node>>,
        body: Box<Node>,
    },
    Echo { expressions: Vec<Node> },
    Global { variables: Vec<Node> },
    /// `static $a = 1, $b;`
    StaticVariables { variables: Vec<Node> },
    StaticVariable {
        variable: Box<Node>,
        default: Option<Box<Node>>,
    },
    Unset { variables: Vec<Node> },
    /// Text outside of the PHP tags.
    InlineHtml { value: String },
    /// The empty statement.
    Nop,
    Label { name: String },
    Goto { label: String },
    Namespace {
        name: Option<String>,
        statements: Vec<Node>,
        braced: bool,
    },
    Use {
        kind: UseKind,
        items: Vec<UseItem>,
    },
    /// `const A = 1, B = 2;`
    ConstDeclaration { constants: Vec<Node> },
    /// A single `NAME = value` pair, in constant declarations and `declare`.
    Const { name: String, value: Box<Node> },
    Declare {
        directives: Vec<Node>,
        body: Option<Box<Node>>,
    },

    // Declarations
    FunctionDeclaration {
        name: String,
        params: Vec<Node>,
        return_type: Option<TypeHint>,
        body: Box<Node>,
        by_ref: bool,
    },
    Parameter {
        name: String,
        type_hint: Option<TypeHint>,
        default: Option<Box<Node>>,
        by_ref: bool,
        variadic: bool,
        /// Constructor promotion modifiers.
        modifiers: Vec<Modifier>,
    },
    /// A class declaration. Anonymous classes have no name.
    ClassDeclaration {
        name: Option<String>,
        modifiers: Vec<Modifier>,
        extends: Option<Box<Node>>,
        implements: Vec<Node>,
        members: Vec<Node>,
    },
    InterfaceDeclaration {
        name: String,
        extends: Vec<Node>,
        members: Vec<Node>,
    },
    TraitDeclaration { name: String, members: Vec<Node> },
    EnumDeclaration {
        name: String,
        backing_type: Option<TypeHint>,
        implements: Vec<Node>,
        members: Vec<Node>,
    },
    /// A method. Abstract and interface methods have no body.
    Method {
        name: String,
        modifiers: Vec<Modifier>,
        params: Vec<Node>,
        return_type: Option<TypeHint>,
        body: Option<Box<Node>>,
        by_ref: bool,
    },
    Property {
        name: String,
        modifiers: Vec<Modifier>,
        type_hint: Option<TypeHint>,
        default: Option<Box<Node>>,
    },
    ClassConstant {
        name: String,
        modifiers: Vec<Modifier>,
        value: Box<Node>,
    },
    TraitUse { traits: Vec<Node> },
    EnumCase {
        name: String,
        value: Option<Box<Node>>,
    },

    // Expressions
    Assignment {
        operator: AssignOp,
        target: Box<Node>,
        value: Box<Node>,
        by_ref: bool,
    },
    Binary {
        operator: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Node>,
    },
    /// `++` or `--`, either prefix or postfix.
    Update {
        operator: UpdateOp,
        prefix: bool,
        operand: Box<Node>,
    },
    Cast {
        cast: CastKind,
        expression: Box<Node>,
    },
    /// `a ? b : c`, or `a ?: c` with no consequent.
    Conditional {
        condition: Box<Node>,
        consequent: Option<Box<Node>>,
        alternate: Box<Node>,
    },
    Call {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    Argument {
        name: Option<String>,
        value: Box<Node>,
        spread: bool,
    },
    /// The `...` in a first-class callable like `strlen(...)`.
    VariadicPlaceholder,
    /// `$object->property` or `$object?->property`.
    Member {
        object: Box<Node>,
        property: Box<Node>,
        nullsafe: bool,
    },
    /// `Class::$property`, `Class::CONSTANT` or `Class::method`.
    StaticMember {
        class: Box<Node>,
        member: Box<Node>,
    },
    /// `$array[index]`, or `$array[]` without an index.
    Index {
        object: Box<Node>,
        index: Option<Box<Node>>,
    },
    Array {
        elements: Vec<Node>,
        /// Whether the `array(...)` spelling was used.
        legacy: bool,
    },
    ArrayElement {
        key: Option<Box<Node>>,
        value: Box<Node>,
        by_ref: bool,
        spread: bool,
    },
    /// `list(...)`. Skipped slots are `Nop` nodes.
    List { elements: Vec<Node> },
    Closure {
        params: Vec<Node>,
        uses: Vec<Node>,
        return_type: Option<TypeHint>,
        body: Box<Node>,
        by_ref: bool,
        is_static: bool,
    },
    ClosureUse { name: String, by_ref: bool },
    ArrowFunction {
        params: Vec<Node>,
        return_type: Option<TypeHint>,
        body: Box<Node>,
        by_ref: bool,
        is_static: bool,
    },
    New {
        class: Box<Node>,
        arguments: Vec<Node>,
    },
    Clone { expression: Box<Node> },
    Yield {
        key: Option<Box<Node>>,
        value: Option<Box<Node>>,
    },
    YieldFrom { expression: Box<Node> },
    Match {
        subject: Box<Node>,
        arms: Vec<Node>,
    },
    /// A match arm. The `default` arm has no conditions.
    MatchArm {
        conditions: Vec<Node>,
        body: Box<Node>,
    },
    /// `include`, `include_once`, `require` or `require_once`.
    Include {
        kind: IncludeKind,
        path: Box<Node>,
    },
    Isset { variables: Vec<Node> },
    Empty { expression: Box<Node> },
    Eval { expression: Box<Node> },
    /// `exit` or `die`.
    Exit { value: Option<Box<Node>> },
    Print { expression: Box<Node> },
    /// A backtick string.
    ShellExec { parts: Vec<Node> },

    // Literals and names
    NumberLiteral { value: Number },
    StringLiteral { value: String, quote: Quote },
    /// A double-quoted string with interpolated parts.
    InterpolatedString { parts: Vec<Node> },
    Heredoc {
        label: String,
        nowdoc: bool,
        parts: Vec<Node>,
    },
    BooleanLiteral { value: bool },
    NullLiteral,
    /// A bare identifier, such as a property or method name.
    Identifier { name: String },
    /// `$name`, stored without the dollar sign.
    Variable { name: String },
    /// `$$name` or `${expression}`.
    VariableVariable { expression: Box<Node> },
    /// A possibly qualified name used as an expression, such as a constant,
    /// function or class name.
    Name { name: String, kind: NameKind },
}

/// A numeric value, following PHP's distinction between integers and floats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Quote {
    Single,
    Double,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    /// `&&`
    BooleanAnd,
    /// `||`
    BooleanOr,
    /// `and`
    LogicalAnd,
    /// `or`
    LogicalOr,
    /// `xor`
    LogicalXor,
    Coalesce,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Spaceship,
    Instanceof,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Concat => ".",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BooleanAnd => "&&",
            Self::BooleanOr => "||",
            Self::LogicalAnd => "and",
            Self::LogicalOr => "or",
            Self::LogicalXor => "xor",
            Self::Coalesce => "??",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Identical => "===",
            Self::NotIdentical => "!==",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Spaceship => "<=>",
            Self::Instanceof => "instanceof",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryOp {
    Not,
    Plus,
    Minus,
    BitNot,
    /// The error suppression operator `@`.
    Silence,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::BitNot => "~",
            Self::Silence => "@",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Increment => "++",
            Self::Decrement => "--",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Coalesce,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Mod => "%=",
            Self::Pow => "**=",
            Self::Concat => ".=",
            Self::BitAnd => "&=",
            Self::BitOr => "|=",
            Self::BitXor => "^=",
            Self::Shl => "<<=",
            Self::Shr => ">>=",
            Self::Coalesce => "??=",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CastKind {
    Int,
    Bool,
    Float,
    String,
    Array,
    Object,
    Unset,
}

impl CastKind {
    /// Get the cast for a spelling like `integer` or `double`, if any.
    pub fn from_spelling(spelling: &str) -> Option<Self> {
        Some(match spelling.to_ascii_lowercase().as_str() {
            "int" | "integer" => Self::Int,
            "bool" | "boolean" => Self::Bool,
            "float" | "double" | "real" => Self::Float,
            "string" | "binary" => Self::String,
            "array" => Self::Array,
            "object" => Self::Object,
            "unset" => Self::Unset,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Unset => "unset",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IncludeKind {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

impl IncludeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::IncludeOnce => "include_once",
            Self::Require => "require",
            Self::RequireOnce => "require_once",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NameKind {
    /// `Foo`
    Unqualified,
    /// `Foo\Bar`
    Qualified,
    /// `\Foo\Bar`
    FullyQualified,
    /// `namespace\Foo`
    Relative,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Readonly,
    /// The legacy `var` property modifier.
    Var,
}

impl Modifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
            Self::Static => "static",
            Self::Abstract => "abstract",
            Self::Final => "final",
            Self::Readonly => "readonly",
            Self::Var => "var",
        }
    }
}

/// A type annotation on a parameter, property or return value.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum TypeHint {
    Named(String),
    Nullable(Box<TypeHint>),
    Union(Vec<TypeHint>),
    Intersection(Vec<TypeHint>),
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, types: &[TypeHint], sep: &str) -> fmt::Result {
            for (i, ty) in types.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{ty}")?;
            }
            Ok(())
        }

        match self {
            Self::Named(name) => f.write_str(name),
            Self::Nullable(inner) => write!(f, "?{inner}"),
            Self::Union(types) => join(f, types, "|"),
            Self::Intersection(types) => join(f, types, "&"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UseKind {
    Normal,
    Function,
    Const,
}

/// A single imported name in a `use` statement.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct UseItem {
    pub name: String,
    pub alias: Option<String>,
}
