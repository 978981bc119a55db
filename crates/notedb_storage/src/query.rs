//! Query predicates.
//!
//! Predicates describe record filters without tying callers to a backend.
//! Backends may translate them into native queries; [`Predicate::matches`]
//! is the reference evaluation used by the in-memory backend.
//!
//! ```rust
//! use notedb_storage::{and, field};
//!
//! let live_work = and([field("deleted").is_false(), field("title").eq("work")]);
//! ```

use crate::record::Record;
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison operator for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

/// A boolean filter over records.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record.
    Always,
    /// Compares one field against a value.
    Compare {
        /// Field name or dotted path.
        field: String,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand side.
        value: Value,
    },
    /// Field equals any of the values.
    In {
        /// Field name or dotted path.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Field is absent, null or `false`.
    IsFalse(String),
    /// Field is `true`.
    IsTrue(String),
    /// All sub-predicates hold (an empty list holds).
    And(Vec<Predicate>),
    /// Any sub-predicate holds (an empty list does not hold).
    Or(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Evaluates the predicate against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Always => true,
            Self::Compare { field, op, value } => match record.get(field) {
                Some(actual) => compare(actual, value).is_some_and(|ord| op.holds(ord)),
                // Missing fields only satisfy `!=`.
                None => *op == CompareOp::Ne,
            },
            Self::In { field, values } => record.get(field).is_some_and(|actual| {
                values
                    .iter()
                    .any(|v| compare(actual, v) == Some(Ordering::Equal))
            }),
            Self::IsFalse(field) => matches!(
                record.get(field),
                None | Some(Value::Null) | Some(Value::Bool(false))
            ),
            Self::IsTrue(field) => matches!(record.get(field), Some(Value::Bool(true))),
            Self::And(parts) => parts.iter().all(|p| p.matches(record)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(record)),
            Self::Not(inner) => !inner.matches(record),
        }
    }

    /// Combines this predicate with another using `and`.
    #[must_use]
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Self::Always, p) | (p, Self::Always) => p,
            (Self::And(mut parts), Self::And(more)) => {
                parts.extend(more);
                Self::And(parts)
            }
            (Self::And(mut parts), p) => {
                parts.push(p);
                Self::And(parts)
            }
            (p, q) => Self::And(vec![p, q]),
        }
    }

    /// Combines this predicate with another using `or`.
    #[must_use]
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Self::Or(mut parts), Self::Or(more)) => {
                parts.extend(more);
                Self::Or(parts)
            }
            (Self::Or(mut parts), p) => {
                parts.push(p);
                Self::Or(parts)
            }
            (p, q) => Self::Or(vec![p, q]),
        }
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::Always
    }
}

/// A field reference used to build comparisons.
#[derive(Debug, Clone)]
pub struct Field(String);

/// Starts a predicate on `name` (a field name or dotted path).
pub fn field(name: impl Into<String>) -> Field {
    Field(name.into())
}

impl Field {
    fn compare(self, op: CompareOp, value: impl Into<Value>) -> Predicate {
        Predicate::Compare {
            field: self.0,
            op,
            value: value.into(),
        }
    }

    /// `field == value`
    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    /// `field != value`
    pub fn ne(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    /// `field < value`
    pub fn lt(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Lt, value)
    }

    /// `field <= value`
    pub fn le(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Le, value)
    }

    /// `field > value`
    pub fn gt(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Gt, value)
    }

    /// `field >= value`
    pub fn ge(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ge, value)
    }

    /// `field IN (values...)`
    pub fn is_in<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::In {
            field: self.0,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Field is absent, null or `false`.
    pub fn is_false(self) -> Predicate {
        Predicate::IsFalse(self.0)
    }

    /// Field is `true`.
    pub fn is_true(self) -> Predicate {
        Predicate::IsTrue(self.0)
    }
}

/// All predicates must hold.
pub fn and(parts: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::And(parts.into_iter().collect())
}

/// At least one predicate must hold.
pub fn or(parts: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::Or(parts.into_iter().collect())
}

/// Negates a predicate.
pub fn not(inner: Predicate) -> Predicate {
    Predicate::Not(Box::new(inner))
}

/// Orders two JSON values of the same kind. Mixed kinds are incomparable.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            (left == right).then_some(Ordering::Equal)
        }
        _ => None,
    }
}
