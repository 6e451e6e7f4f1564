use super::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{Error, Result};

/// Parse a template expression from its source text.
///
/// The language covers literals, dotted paths, unary `!`/`-`, the usual
/// comparison/logical/arithmetic binary operators and the ternary operator.
/// Anything statement-shaped is rejected.
pub fn parse_expression(input: &str) -> Result<Expr> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(Error::expression("Empty expression"));
    }

    // Ternary has the lowest precedence of all.
    if let Some((cond, then_part, else_part)) = split_ternary(trimmed) {
        return Ok(Expr::Ternary {
            condition: Box::new(parse_expression(cond)?),
            then_expr: Box::new(parse_expression(then_part)?),
            else_expr: Box::new(parse_expression(else_part)?),
        });
    }

    // Handle parentheses for grouping
    if trimmed.starts_with('(') && trimmed.ends_with(')') {
        let inner = &trimmed[1..trimmed.len() - 1];
        if is_balanced(inner) {
            return parse_expression(inner);
        }
    }

    // Check for binary operators, lowest precedence level first so the
    // split point is the operator evaluated last.
    if let Some((pos, op, op_len)) = find_operator(trimmed) {
        let left = trimmed[..pos].trim();
        let right = trimmed[pos + op_len..].trim();
        if left.is_empty() || right.is_empty() {
            return Err(Error::expression(format!(
                "Dangling operator in expression: `{}`",
                trimmed
            )));
        }
        return Ok(Expr::BinaryOp {
            left: Box::new(parse_expression(left)?),
            op,
            right: Box::new(parse_expression(right)?),
        });
    }

    // Check for unary operators
    if let Some(rest) = trimmed.strip_prefix('!') {
        return Ok(Expr::UnaryOp {
            op: UnaryOperator::Not,
            operand: Box::new(parse_expression(rest)?),
        });
    }

    if let Some(rest) = trimmed.strip_prefix('-') {
        if !rest.trim_start().starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Minus,
                operand: Box::new(parse_expression(rest)?),
            });
        }
    }

    parse_value(trimmed)
}

/// Parse a simple value: literal, quoted string, or dotted path
fn parse_value(trimmed: &str) -> Result<Expr> {
    if trimmed == "true" {
        return Ok(Expr::Boolean(true));
    }
    if trimmed == "false" {
        return Ok(Expr::Boolean(false));
    }
    if trimmed == "null" || trimmed == "undefined" {
        return Ok(Expr::Null);
    }

    if let Ok(num) = trimmed.parse::<f64>() {
        return Ok(Expr::Number(num));
    }

    if (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
        || (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
    {
        let content = &trimmed[1..trimmed.len() - 1];
        return Ok(Expr::String(unescape_string(content)));
    }

    // Otherwise, it must be a variable or dotted path
    for (i, segment) in trimmed.split('.').enumerate() {
        if !is_valid_segment(segment, i == 0) {
            return Err(Error::expression(format!(
                "Invalid expression: `{}`",
                trimmed
            )));
        }
    }

    Ok(Expr::from_path(trimmed))
}

/// A path root must be an identifier; later segments may also be numeric
/// array indexes.
fn is_valid_segment(segment: &str, is_root: bool) -> bool {
    if segment.is_empty() {
        return false;
    }
    if !is_root && segment.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn unescape_string(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Split a top-level ternary into its three parts, if present.
fn split_ternary(expr: &str) -> Option<(&str, &str, &str)> {
    let mut tracker = DepthTracker::new();
    let mut question = None;
    for (i, ch) in expr.char_indices() {
        if !tracker.step(ch) && ch == '?' {
            question = Some(i);
            break;
        }
    }
    let question = question?;

    // Find the matching colon, skipping over nested ternaries.
    let mut tracker = DepthTracker::new();
    let mut nesting = 0usize;
    for (i, ch) in expr.char_indices().skip_while(|(i, _)| *i <= question) {
        if tracker.step(ch) {
            continue;
        }
        match ch {
            '?' => nesting += 1,
            ':' if nesting == 0 => {
                return Some((&expr[..question], &expr[question + 1..i], &expr[i + 1..]));
            }
            ':' => nesting -= 1,
            _ => {}
        }
    }
    None
}

/// Tracks quote and parenthesis state while walking an expression, so
/// operator searches ignore anything nested or quoted.
struct DepthTracker {
    paren_depth: i32,
    in_single_quote: bool,
    in_double_quote: bool,
    escaped: bool,
}

impl DepthTracker {
    fn new() -> Self {
        Self {
            paren_depth: 0,
            in_single_quote: false,
            in_double_quote: false,
            escaped: false,
        }
    }

    /// Advance over one character; returns true when the position is
    /// inside quotes or parentheses and must be skipped.
    fn step(&mut self, ch: char) -> bool {
        if self.escaped {
            self.escaped = false;
            return true;
        }
        if ch == '\\' && (self.in_single_quote || self.in_double_quote) {
            self.escaped = true;
            return true;
        }
        if ch == '\'' && !self.in_double_quote {
            self.in_single_quote = !self.in_single_quote;
            return true;
        }
        if ch == '"' && !self.in_single_quote {
            self.in_double_quote = !self.in_double_quote;
            return true;
        }
        if self.in_single_quote || self.in_double_quote {
            return true;
        }
        if ch == '(' {
            self.paren_depth += 1;
            return true;
        }
        if ch == ')' {
            self.paren_depth -= 1;
            return true;
        }
        self.paren_depth > 0
    }
}

// Operator precedence levels, lowest first: the split point must be the
// operator evaluated last.
const PRECEDENCE_LEVELS: &[&[(&str, BinaryOperator)]] = &[
    &[("||", BinaryOperator::Or)],
    &[("&&", BinaryOperator::And)],
    &[
        ("===", BinaryOperator::Equal),
        ("!==", BinaryOperator::NotEqual),
        ("==", BinaryOperator::Equal),
        ("!=", BinaryOperator::NotEqual),
    ],
    &[
        ("<=", BinaryOperator::LessThanOrEqual),
        (">=", BinaryOperator::GreaterThanOrEqual),
        ("<", BinaryOperator::LessThan),
        (">", BinaryOperator::GreaterThan),
    ],
    &[("+", BinaryOperator::Add), ("-", BinaryOperator::Subtract)],
    &[
        ("*", BinaryOperator::Multiply),
        ("/", BinaryOperator::Divide),
        ("%", BinaryOperator::Modulo),
    ],
];

fn find_operator(expr: &str) -> Option<(usize, BinaryOperator, usize)> {
    for operators in PRECEDENCE_LEVELS {
        if let Some(found) = find_operator_at_level(expr, operators) {
            return Some(found);
        }
    }
    None
}

/// Find the rightmost operator of a precedence level at depth zero, which
/// keeps same-level chains left-associative.
fn find_operator_at_level(
    expr: &str,
    operators: &[(&str, BinaryOperator)],
) -> Option<(usize, BinaryOperator, usize)> {
    let bytes = expr.as_bytes();
    let mut tracker = DepthTracker::new();
    let mut best: Option<(usize, BinaryOperator, usize)> = None;

    for (i, ch) in expr.char_indices() {
        if tracker.step(ch) {
            continue;
        }
        for (symbol, op) in operators {
            if !expr[i..].starts_with(symbol) {
                continue;
            }
            // Reject partial matches of longer operators.
            let before_ok = i == 0 || !matches!(bytes[i - 1], b'=' | b'!' | b'<' | b'>');
            let end = i + symbol.len();
            let after_ok = end >= bytes.len() || !matches!(bytes[end], b'=' | b'&' | b'|');
            if !before_ok || !after_ok {
                continue;
            }
            // `+`/`-` directly after another operator (or at the start)
            // is a sign, not a binary operator.
            if matches!(*symbol, "+" | "-") && !has_operand_before(expr, i) {
                continue;
            }
            best = Some((i, *op, symbol.len()));
            break;
        }
    }
    best
}

fn has_operand_before(expr: &str, pos: usize) -> bool {
    match expr[..pos].trim_end().chars().last() {
        None => false,
        Some(c) => !matches!(
            c,
            '(' | ',' | '?' | ':' | '&' | '|' | '=' | '!' | '<' | '>' | '+' | '-' | '*' | '/' | '%'
        ),
    }
}

fn is_balanced(s: &str) -> bool {
    let mut tracker = DepthTracker::new();
    for ch in s.chars() {
        tracker.step(ch);
        if tracker.paren_depth < 0 {
            return false;
        }
    }
    tracker.paren_depth == 0
}
