//! Syntax tree for configuration files
//!
//! A file is a body of statements. Statements are either blocks
//! (`name "label" { ... }`) or attributes (`name = expr`).

use std::fmt;

use serde::{Deserialize, Serialize};

/* ===================== Spans ===================== */

/// Source location span for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset
    pub end: usize,
    /// Start line (0-indexed)
    pub start_line: usize,
    /// Start column (0-indexed)
    pub start_col: usize,
    /// End line (0-indexed)
    pub end_line: usize,
    /// End column (0-indexed)
    pub end_col: usize,
}

impl Span {
    pub fn new(
        start: usize,
        end: usize,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            start,
            end,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Smallest span covering both spans.
    pub fn merge(&self, other: &Span) -> Span {
        let (first, last) = (
            if self.start <= other.start { self } else { other },
            if self.end >= other.end { self } else { other },
        );
        Span {
            start: first.start,
            end: last.end,
            start_line: first.start_line,
            start_col: first.start_col,
            end_line: last.end_line,
            end_col: last.end_col,
        }
    }

    /// A default span carries no location.
    pub fn is_unknown(&self) -> bool {
        *self == Span::default()
    }

    pub fn start_pos(&self) -> Position {
        if self.is_unknown() {
            return Position::default();
        }
        Position::new(self.start_line + 1, self.start_col + 1)
    }

    pub fn end_pos(&self) -> Position {
        if self.is_unknown() {
            return Position::default();
        }
        Position::new(self.end_line + 1, self.end_col + 1)
    }
}

fn is_default_span(span: &Span) -> bool {
    span.is_unknown()
}

/// A 1-indexed line and column. Line 0 means the position is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/* ===================== Statements ===================== */

/// A parsed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct File {
    pub body: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Stmt {
    Block(BlockStmt),
    Attribute(AttributeStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(block) => block.span,
            Stmt::Attribute(attr) => attr.span,
        }
    }
}

/// `name.segments "label" { body }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockStmt {
    pub name: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub body: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

impl BlockStmt {
    pub fn full_name(&self) -> String {
        self.name.join(".")
    }
}

/// `name = value`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeStmt {
    pub name: String,
    pub value: Expr,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/* ===================== Expressions ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Null,
    Number,
    String,
    Bool,
}

/// A literal with its raw text. String literals hold the unescaped text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub kind: LiteralKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Expr {
    Literal(Literal),
    /// Dotted reference such as `env.home`
    Identifier {
        name: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Array {
        elements: Vec<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Object {
        fields: Vec<(String, Expr)>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(lit) => lit.span,
            Expr::Identifier { span, .. }
            | Expr::Array { span, .. }
            | Expr::Object { span, .. }
            | Expr::Binary { span, .. } => *span,
        }
    }
}
