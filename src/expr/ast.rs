use std::fmt;

/// Expression types for conditions, interpolations and attribute values
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String literal
    String(String),

    /// Number literal
    Number(f64),

    /// Boolean literal
    Boolean(bool),

    /// Null value
    Null,

    /// Variable reference
    Variable(String),

    /// Property access (e.g., data.user.name); numeric segments index arrays
    PropertyAccess {
        object: Box<Expr>,
        property: String,
    },

    /// Binary operation
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },

    /// Ternary operation (condition ? then_expr : else_expr)
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Logical
    And,
    Or,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
}

impl Expr {
    /// Create a property access expression from a dotted path
    pub fn from_path(path: &str) -> Self {
        let mut parts = path.split('.');
        let mut expr = match parts.next() {
            Some(root) if !root.is_empty() => Expr::Variable(root.to_string()),
            _ => return Expr::Null,
        };

        for part in parts {
            expr = Expr::PropertyAccess {
                object: Box::new(expr),
                property: part.to_string(),
            };
        }

        expr
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Equal => "===",
            BinaryOperator::NotEqual => "!==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::String(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Boolean(b) => write!(f, "{}", b),
            Expr::Null => write!(f, "null"),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::PropertyAccess { object, property } => write!(f, "{}.{}", object, property),
            Expr::BinaryOp { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::UnaryOp { op, operand } => match op {
                UnaryOperator::Not => write!(f, "!{}", operand),
                UnaryOperator::Minus => write!(f, "-{}", operand),
            },
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => write!(f, "{} ? {} : {}", condition, then_expr, else_expr),
        }
    }
}
