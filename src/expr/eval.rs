use super::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{Error, Result};
use serde_json::Value;

/// One iteration frame of an active loop
#[derive(Debug, Clone)]
pub struct LoopFrame {
    pub item_name: String,
    pub item: Value,
    pub index_name: String,
    pub index: usize,
}

/// Name resolution context for a single render call.
///
/// Roots resolve in order: innermost loop frame bindings first, then the
/// configured data variable. Anything else is an evaluation error.
pub struct Scope<'a> {
    data_name: &'a str,
    data: &'a Value,
    frames: Vec<LoopFrame>,
}

impl<'a> Scope<'a> {
    pub fn new(data_name: &'a str, data: &'a Value) -> Self {
        Self {
            data_name,
            data,
            frames: Vec::new(),
        }
    }

    pub fn data(&self) -> &Value {
        self.data
    }

    pub fn push_frame(&mut self, frame: LoopFrame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Resolve a root identifier to its value
    fn resolve(&self, name: &str) -> Result<Value> {
        for frame in self.frames.iter().rev() {
            if frame.item_name == name {
                return Ok(frame.item.clone());
            }
            if frame.index_name == name {
                return Ok(Value::Number(serde_json::Number::from(frame.index)));
            }
        }

        if name == self.data_name {
            return Ok(self.data.clone());
        }

        Err(Error::evaluation(format!("Unknown variable: {}", name)))
    }
}

/// Evaluate an expression to a value
pub fn evaluate(expr: &Expr, scope: &Scope<'_>) -> Result<Value> {
    match expr {
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Number(n) => Ok(number_value(*n)),
        Expr::Boolean(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),

        Expr::Variable(name) => scope.resolve(name),

        Expr::PropertyAccess { object, property } => {
            let obj_value = evaluate(object, scope)?;
            access_property(&obj_value, property, object)
        }

        Expr::BinaryOp { left, op, right } => match op {
            // Logical operators short-circuit.
            BinaryOperator::And => {
                let left_val = evaluate(left, scope)?;
                if !is_truthy(&left_val) {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(is_truthy(&evaluate(right, scope)?)))
            }
            BinaryOperator::Or => {
                let left_val = evaluate(left, scope)?;
                if is_truthy(&left_val) {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(is_truthy(&evaluate(right, scope)?)))
            }
            _ => {
                let left_val = evaluate(left, scope)?;
                let right_val = evaluate(right, scope)?;
                evaluate_binary_op(&left_val, *op, &right_val)
            }
        },

        Expr::UnaryOp { op, operand } => {
            let operand_val = evaluate(operand, scope)?;
            match op {
                UnaryOperator::Not => Ok(Value::Bool(!is_truthy(&operand_val))),
                UnaryOperator::Minus => {
                    if let Value::Number(n) = &operand_val {
                        Ok(number_value(-n.as_f64().unwrap_or(0.0)))
                    } else {
                        Ok(Value::Null)
                    }
                }
            }
        }

        Expr::Ternary {
            condition,
            then_expr,
            else_expr,
        } => {
            let cond_value = evaluate(condition, scope)?;
            if is_truthy(&cond_value) {
                evaluate(then_expr, scope)
            } else {
                evaluate(else_expr, scope)
            }
        }
    }
}

fn access_property(value: &Value, property: &str, object: &Expr) -> Result<Value> {
    match value {
        Value::Object(map) => Ok(map.get(property).cloned().unwrap_or(Value::Null)),
        Value::Array(arr) => match property {
            "length" | "size" => Ok(Value::Number(serde_json::Number::from(arr.len()))),
            _ => {
                if let Ok(index) = property.parse::<usize>() {
                    Ok(arr.get(index).cloned().unwrap_or(Value::Null))
                } else {
                    Ok(Value::Null)
                }
            }
        },
        Value::String(s) => match property {
            "length" | "size" => Ok(Value::Number(serde_json::Number::from(s.chars().count()))),
            _ => Ok(Value::Null),
        },
        Value::Null => Err(Error::evaluation(format!(
            "Cannot read property '{}' of null (`{}`)",
            property, object
        ))),
        _ => Err(Error::evaluation(format!(
            "Cannot read property '{}' of {} (`{}`)",
            property, value, object
        ))),
    }
}

fn evaluate_binary_op(left: &Value, op: BinaryOperator, right: &Value) -> Result<Value> {
    match op {
        BinaryOperator::Equal => Ok(Value::Bool(loose_eq(left, right))),
        BinaryOperator::NotEqual => Ok(Value::Bool(!loose_eq(left, right))),

        BinaryOperator::LessThan => Ok(Value::Bool(compare_numbers(left, right, |l, r| l < r))),
        BinaryOperator::LessThanOrEqual => {
            Ok(Value::Bool(compare_numbers(left, right, |l, r| l <= r)))
        }
        BinaryOperator::GreaterThan => Ok(Value::Bool(compare_numbers(left, right, |l, r| l > r))),
        BinaryOperator::GreaterThanOrEqual => {
            Ok(Value::Bool(compare_numbers(left, right, |l, r| l >= r)))
        }

        BinaryOperator::And => Ok(Value::Bool(is_truthy(left) && is_truthy(right))),
        BinaryOperator::Or => Ok(Value::Bool(is_truthy(left) || is_truthy(right))),

        BinaryOperator::Add => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(number_value(
                l.as_f64().unwrap_or(0.0) + r.as_f64().unwrap_or(0.0),
            )),
            (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!(
                "{}{}",
                value_to_string(left),
                value_to_string(right)
            ))),
            _ => Ok(Value::Null),
        },

        BinaryOperator::Subtract => arithmetic(left, right, |l, r| Some(l - r)),
        BinaryOperator::Multiply => arithmetic(left, right, |l, r| Some(l * r)),
        BinaryOperator::Divide => {
            arithmetic(left, right, |l, r| if r == 0.0 { None } else { Some(l / r) })
        }
        BinaryOperator::Modulo => {
            arithmetic(left, right, |l, r| if r == 0.0 { None } else { Some(l % r) })
        }
    }
}

fn arithmetic(left: &Value, right: &Value, f: impl Fn(f64, f64) -> Option<f64>) -> Result<Value> {
    if let (Value::Number(l), Value::Number(r)) = (left, right) {
        match f(l.as_f64().unwrap_or(0.0), r.as_f64().unwrap_or(0.0)) {
            Some(result) => Ok(number_value(result)),
            None => Ok(Value::Null),
        }
    } else {
        Ok(Value::Null)
    }
}

fn compare_numbers(left: &Value, right: &Value, f: impl Fn(f64, f64) -> bool) -> bool {
    if let (Value::Number(l), Value::Number(r)) = (left, right) {
        f(l.as_f64().unwrap_or(0.0), r.as_f64().unwrap_or(0.0))
    } else {
        false
    }
}

/// Equality with numeric widening, so `1` and `1.0` compare equal
fn loose_eq(left: &Value, right: &Value) -> bool {
    if let (Value::Number(l), Value::Number(r)) = (left, right) {
        return l.as_f64() == r.as_f64();
    }
    left == right
}

fn number_value(n: f64) -> Value {
    // Keep integral results as integers so they print without a fraction.
    if n.fract() == 0.0 && n.is_finite() && n.abs() < (i64::MAX as f64) {
        Value::Number(serde_json::Number::from(n as i64))
    } else {
        Value::Number(
            serde_json::Number::from_f64(n).unwrap_or_else(|| serde_json::Number::from(0)),
        )
    }
}

/// Check if a value is truthy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Array(_) => true,
        Value::Object(_) => true,
    }
}

/// Convert a value to the string handed to the rendering primitives
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}
