use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A type error raised by an operator. Carries the operand type names so VM
/// error messages can point at the offending values.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum TypeError {
    #[error("cannot apply `{op}` to values of type {lhs} and {rhs}")]
    Binary {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("cannot apply `{op}` to a value of type {operand}")]
    Unary {
        op: &'static str,
        operand: &'static str,
    },
}

/// A runtime value.
///
/// Values are what dialogue scripts compute with: everything on the VM stack,
/// in variable storage, and passed to library functions is a `Value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Number(f32),
    String(String),
    Bool(bool),
    /// An unevaluated variable reference. Compiled code resolves variables
    /// through storage before they reach the stack; this variant only appears
    /// in values a host constructs itself. It coerces like `Null`.
    Variable(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Variable(_) => "variable",
        }
    }

    /// Numeric coercion: strings parse as floats (unparsable strings are 0),
    /// `true` is 1, `false`, `Null` and `Variable` are 0.
    pub fn as_number(&self) -> f32 {
        match self {
            Value::Number(value) => *value,
            Value::String(value) => value.trim().parse::<f32>().unwrap_or(0.0),
            Value::Bool(value) => {
                if *value {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Null | Value::Variable(_) => 0.0,
        }
    }

    /// Boolean coercion: numbers are true when they are neither NaN nor zero,
    /// strings when non-empty.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Number(value) => !value.is_nan() && *value != 0.0,
            Value::String(value) => !value.is_empty(),
            Value::Bool(value) => *value,
            Value::Null | Value::Variable(_) => false,
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Number(value) => value.to_string(),
            Value::String(value) => value.clone(),
            Value::Bool(value) => value.to_string(),
            Value::Variable(name) => name.clone(),
        }
    }

    fn is_null_like(&self) -> bool {
        matches!(self, Value::Null | Value::Variable(_))
    }

    /// `+`: string concatenation when either side is a string, numeric
    /// addition otherwise.
    pub fn add(&self, rhs: &Value) -> Result<Value, TypeError> {
        match (self, rhs) {
            (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!(
                "{}{}",
                self.as_string(),
                rhs.as_string()
            ))),
            (Value::Number(_), _) | (Value::Bool(_), _) | (Value::Null, _)
                if matches!(rhs, Value::Number(_) | Value::Bool(_) | Value::Null) =>
            {
                Ok(Value::Number(self.as_number() + rhs.as_number()))
            }
            _ => Err(self.binary_error("+", rhs)),
        }
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value, TypeError> {
        self.arithmetic("-", rhs, |a, b| a - b)
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value, TypeError> {
        self.arithmetic("*", rhs, |a, b| a * b)
    }

    /// Division by zero is not an error: the result is the IEEE infinity or
    /// NaN the underlying float produces.
    pub fn div(&self, rhs: &Value) -> Result<Value, TypeError> {
        self.arithmetic("/", rhs, |a, b| a / b)
    }

    pub fn modulo(&self, rhs: &Value) -> Result<Value, TypeError> {
        self.arithmetic("%", rhs, |a, b| a % b)
    }

    /// `-`, `*`, `/`, `%` accept only numbers and null (null coerces to 0).
    fn arithmetic(
        &self,
        op: &'static str,
        rhs: &Value,
        apply: fn(f32, f32) -> f32,
    ) -> Result<Value, TypeError> {
        match (self, rhs) {
            (Value::Number(_), Value::Number(_))
            | (Value::Number(_), Value::Null)
            | (Value::Null, Value::Number(_))
            | (Value::Null, Value::Null) => {
                Ok(Value::Number(apply(self.as_number(), rhs.as_number())))
            }
            _ => Err(self.binary_error(op, rhs)),
        }
    }

    pub fn neg(&self) -> Result<Value, TypeError> {
        match self {
            Value::Number(value) => Ok(Value::Number(-value)),
            Value::Null => Ok(Value::Number(0.0)),
            _ => Err(TypeError::Unary {
                op: "-",
                operand: self.type_name(),
            }),
        }
    }

    pub fn not(&self) -> Value {
        Value::Bool(!self.as_bool())
    }

    pub fn and(&self, rhs: &Value) -> Value {
        Value::Bool(self.as_bool() && rhs.as_bool())
    }

    pub fn or(&self, rhs: &Value) -> Value {
        Value::Bool(self.as_bool() || rhs.as_bool())
    }

    pub fn xor(&self, rhs: &Value) -> Value {
        Value::Bool(self.as_bool() ^ rhs.as_bool())
    }

    /// Comparisons compare directly when the types match, and compare the
    /// string renditions otherwise.
    fn compare(&self, rhs: &Value) -> Option<std::cmp::Ordering> {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Null, Value::Null) => Some(std::cmp::Ordering::Equal),
            _ => Some(self.as_string().cmp(&rhs.as_string())),
        }
    }

    pub fn greater_than(&self, rhs: &Value) -> Value {
        Value::Bool(self.compare(rhs) == Some(std::cmp::Ordering::Greater))
    }

    pub fn greater_than_or_equal(&self, rhs: &Value) -> Value {
        Value::Bool(matches!(
            self.compare(rhs),
            Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
        ))
    }

    pub fn less_than(&self, rhs: &Value) -> Value {
        Value::Bool(self.compare(rhs) == Some(std::cmp::Ordering::Less))
    }

    pub fn less_than_or_equal(&self, rhs: &Value) -> Value {
        Value::Bool(matches!(
            self.compare(rhs),
            Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
        ))
    }

    fn binary_error(&self, op: &'static str, rhs: &Value) -> TypeError {
        TypeError::Binary {
            op,
            lhs: self.type_name(),
            rhs: rhs.type_name(),
        }
    }
}

/// Equality keeps a legacy quirk for script compatibility: `Null` compares
/// equal to any value whose numeric coercion is 0 or whose boolean coercion
/// is false — so `null == 0`, `null == false`, and `null == ""` all hold.
/// Hosts that need strict equality should compare [`Value::type_name`] first.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_null_like() && b.is_null_like() => true,
            (Value::Null, other) | (other, Value::Null) => {
                other.as_number() == 0.0 || !other.as_bool()
            }
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (a, b) => a.as_string() == b.as_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn add_concatenates_when_either_side_is_string() {
        let result = Value::from("gold: ").add(&Value::from(3.0)).unwrap();
        assert_eq!(result, Value::from("gold: 3"));

        let result = Value::from(3.0).add(&Value::from(" coins")).unwrap();
        assert_eq!(result, Value::from("3 coins"));
    }

    #[test]
    fn add_coerces_bools_and_null() {
        let result = Value::from(2.0).add(&Value::from(true)).unwrap();
        assert_relative_eq!(result.as_number(), 3.0);

        let result = Value::Null.add(&Value::from(2.5)).unwrap();
        assert_relative_eq!(result.as_number(), 2.5);
    }

    #[test]
    fn arithmetic_rejects_bools() {
        Value::from(2.0).sub(&Value::from(true)).unwrap_err();
        Value::from(true).mul(&Value::from(2.0)).unwrap_err();
    }

    #[test]
    fn type_errors_name_both_operands() {
        let err = Value::from(2.0).sub(&Value::from("x")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot apply `-` to values of type number and string"
        );
    }

    #[test]
    fn division_by_zero_is_ieee() {
        let result = Value::from(1.0).div(&Value::from(0.0)).unwrap();
        assert!(result.as_number().is_infinite());

        let result = Value::from(0.0).div(&Value::from(0.0)).unwrap();
        assert!(result.as_number().is_nan());
    }

    #[test]
    fn string_coercions() {
        assert_relative_eq!(Value::from("2.5").as_number(), 2.5);
        assert_relative_eq!(Value::from("not a number").as_number(), 0.0);
        assert!(Value::from("x").as_bool());
        assert!(!Value::from("").as_bool());
    }

    #[test]
    fn bool_coercions() {
        assert!(!Value::Number(f32::NAN).as_bool());
        assert!(!Value::Number(0.0).as_bool());
        assert!(Value::Number(-1.0).as_bool());
        assert!(!Value::Null.as_bool());
    }

    #[test]
    fn equality_quirk_null_equals_zeroish() {
        assert_eq!(Value::Null, Value::Number(0.0));
        assert_eq!(Value::Null, Value::Bool(false));
        assert_eq!(Value::Null, Value::String(String::new()));
        assert_eq!(Value::Null, Value::Null);

        assert_ne!(Value::Null, Value::Number(1.0));
        assert_ne!(Value::Null, Value::Bool(true));
        assert_ne!(Value::Null, Value::String("x".to_string()));
    }

    #[test]
    fn equality_is_reflexive_and_symmetric() {
        let values = [
            Value::Number(3.0),
            Value::Bool(true),
            Value::from("three"),
            Value::Null,
        ];

        for a in &values {
            assert_eq!(a, a);
            for b in &values {
                assert_eq!(a == b, b == a);
            }
        }
    }

    #[test]
    fn cross_type_equality_compares_strings() {
        assert_eq!(Value::from(3.0), Value::from("3"));
        assert_ne!(Value::from(3.0), Value::from("3.5"));
        assert_eq!(Value::from(true), Value::from("true"));
    }

    #[test]
    fn comparisons_follow_same_type_ordering() {
        assert_eq!(
            Value::from(2.0).greater_than(&Value::from(1.0)),
            Value::Bool(true)
        );
        assert_eq!(
            Value::from("abc").less_than(&Value::from("abd")),
            Value::Bool(true)
        );
        assert_eq!(
            Value::from(2.0).less_than_or_equal(&Value::from(2.0)),
            Value::Bool(true)
        );
    }

    #[test]
    fn nan_comparisons_are_false() {
        let nan = Value::Number(f32::NAN);
        assert_eq!(nan.greater_than(&Value::from(0.0)), Value::Bool(false));
        assert_eq!(nan.less_than(&Value::from(0.0)), Value::Bool(false));
    }

    #[test]
    fn logic_coerces_operands() {
        assert_eq!(
            Value::from(1.0).and(&Value::from("x")),
            Value::Bool(true)
        );
        assert_eq!(Value::Null.or(&Value::from(true)), Value::Bool(true));
        assert_eq!(
            Value::from(true).xor(&Value::from(true)),
            Value::Bool(false)
        );
        assert_eq!(Value::from(0.0).not(), Value::Bool(true));
    }
}
