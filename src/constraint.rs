//! Constraints and the handles used to track them.
//!
//! A [`ConstraintId`] is handed out whenever a constraint is registered with
//! a [`crate::query::PathQuery`]. Handles come from a process-wide counter,
//! so two queries never share one, and a duplicated query hands back a
//! translation table from the old handles to the new ones.

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use seahash::SeaHasher;
use serde::Serialize;

use crate::error::{Result, TemplateError};

pub type ConstraintHasher = BuildHasherDefault<SeaHasher>;
pub type ConstraintMap<V> = HashMap<ConstraintId, V, ConstraintHasher>;
/// Old handle to new handle, produced when a query is duplicated.
pub type IdTranslation = ConstraintMap<ConstraintId>;

static NEXT_CONSTRAINT_ID: AtomicU64 = AtomicU64::new(1);

// ------------- ConstraintId -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(u64);

impl ConstraintId {
    pub(crate) fn allocate() -> Self {
        Self(NEXT_CONSTRAINT_ID.fetch_add(1, Ordering::Relaxed))
    }
    pub fn value(&self) -> u64 {
        self.0
    }
}
impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ------------- ConstraintOp -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintOp {
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    Contains,
    Like,
    NotLike,
    Lookup,
    OneOf,
    NoneOf,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    IsA,
}

const ALL_OPS: [ConstraintOp; 17] = [
    ConstraintOp::Equals,
    ConstraintOp::NotEquals,
    ConstraintOp::LessThan,
    ConstraintOp::LessThanEquals,
    ConstraintOp::GreaterThan,
    ConstraintOp::GreaterThanEquals,
    ConstraintOp::Contains,
    ConstraintOp::Like,
    ConstraintOp::NotLike,
    ConstraintOp::Lookup,
    ConstraintOp::OneOf,
    ConstraintOp::NoneOf,
    ConstraintOp::In,
    ConstraintOp::NotIn,
    ConstraintOp::IsNull,
    ConstraintOp::IsNotNull,
    ConstraintOp::IsA,
];

impl ConstraintOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintOp::Equals => "=",
            ConstraintOp::NotEquals => "!=",
            ConstraintOp::LessThan => "<",
            ConstraintOp::LessThanEquals => "<=",
            ConstraintOp::GreaterThan => ">",
            ConstraintOp::GreaterThanEquals => ">=",
            ConstraintOp::Contains => "CONTAINS",
            ConstraintOp::Like => "LIKE",
            ConstraintOp::NotLike => "NOT LIKE",
            ConstraintOp::Lookup => "LOOKUP",
            ConstraintOp::OneOf => "ONE OF",
            ConstraintOp::NoneOf => "NONE OF",
            ConstraintOp::In => "IN",
            ConstraintOp::NotIn => "NOT IN",
            ConstraintOp::IsNull => "IS NULL",
            ConstraintOp::IsNotNull => "IS NOT NULL",
            ConstraintOp::IsA => "ISA",
        }
    }
    fn is_attribute_op(&self) -> bool {
        matches!(
            self,
            ConstraintOp::Equals
                | ConstraintOp::NotEquals
                | ConstraintOp::LessThan
                | ConstraintOp::LessThanEquals
                | ConstraintOp::GreaterThan
                | ConstraintOp::GreaterThanEquals
                | ConstraintOp::Contains
                | ConstraintOp::Like
                | ConstraintOp::NotLike
        )
    }
}
impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
impl FromStr for ConstraintOp {
    type Err = TemplateError;
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        ALL_OPS
            .iter()
            .find(|op| op.as_str() == normalized)
            .copied()
            .ok_or_else(|| TemplateError::InvalidArgument(format!("Unknown operator '{}'", s)))
    }
}

// ------------- ConstraintValue -------------
/// Either a single string or a flat list of strings, as projected to JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ConstraintValue {
    Single(String),
    List(Vec<String>),
}

// ------------- PathConstraint -------------
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathConstraint {
    Attribute { path: String, op: ConstraintOp, value: String },
    Null { path: String, op: ConstraintOp },
    Lookup { path: String, value: String, extra_value: Option<String> },
    Bag { path: String, op: ConstraintOp, bag: String },
    MultiValue { path: String, op: ConstraintOp, values: Vec<String> },
    Subclass { path: String, type_name: String },
    Loop { path: String, op: ConstraintOp, loop_path: String },
}

impl PathConstraint {
    pub fn attribute(
        path: impl Into<String>,
        op: ConstraintOp,
        value: impl Into<String>,
    ) -> Result<Self> {
        let constraint = PathConstraint::Attribute {
            path: path.into(),
            op,
            value: value.into(),
        };
        constraint.validate()?;
        Ok(constraint)
    }
    pub fn equals(path: impl Into<String>, value: impl Into<String>) -> Self {
        PathConstraint::Attribute {
            path: path.into(),
            op: ConstraintOp::Equals,
            value: value.into(),
        }
    }
    pub fn is_null(path: impl Into<String>) -> Self {
        PathConstraint::Null {
            path: path.into(),
            op: ConstraintOp::IsNull,
        }
    }
    pub fn is_not_null(path: impl Into<String>) -> Self {
        PathConstraint::Null {
            path: path.into(),
            op: ConstraintOp::IsNotNull,
        }
    }
    pub fn lookup(
        path: impl Into<String>,
        value: impl Into<String>,
        extra_value: Option<String>,
    ) -> Self {
        PathConstraint::Lookup {
            path: path.into(),
            value: value.into(),
            extra_value,
        }
    }
    pub fn bag(path: impl Into<String>, op: ConstraintOp, bag: impl Into<String>) -> Result<Self> {
        let constraint = PathConstraint::Bag {
            path: path.into(),
            op,
            bag: bag.into(),
        };
        constraint.validate()?;
        Ok(constraint)
    }
    pub fn multi_value(
        path: impl Into<String>,
        op: ConstraintOp,
        values: Vec<String>,
    ) -> Result<Self> {
        let constraint = PathConstraint::MultiValue {
            path: path.into(),
            op,
            values,
        };
        constraint.validate()?;
        Ok(constraint)
    }
    pub fn subclass(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        PathConstraint::Subclass {
            path: path.into(),
            type_name: type_name.into(),
        }
    }
    pub fn loop_constraint(
        path: impl Into<String>,
        op: ConstraintOp,
        loop_path: impl Into<String>,
    ) -> Result<Self> {
        let constraint = PathConstraint::Loop {
            path: path.into(),
            op,
            loop_path: loop_path.into(),
        };
        constraint.validate()?;
        Ok(constraint)
    }

    /// Checks that the operator fits the kind of constraint.
    pub fn validate(&self) -> Result<()> {
        let valid = match self {
            PathConstraint::Attribute { op, .. } => op.is_attribute_op(),
            PathConstraint::Null { op, .. } => {
                matches!(op, ConstraintOp::IsNull | ConstraintOp::IsNotNull)
            }
            PathConstraint::Lookup { .. } | PathConstraint::Subclass { .. } => true,
            PathConstraint::Bag { op, .. } => matches!(op, ConstraintOp::In | ConstraintOp::NotIn),
            PathConstraint::MultiValue { op, values, .. } => {
                if values.is_empty() {
                    return Err(TemplateError::InvalidArgument(format!(
                        "{} constraint on {} needs at least one value",
                        op,
                        self.path()
                    )));
                }
                matches!(op, ConstraintOp::OneOf | ConstraintOp::NoneOf)
            }
            PathConstraint::Loop { op, .. } => {
                matches!(op, ConstraintOp::Equals | ConstraintOp::NotEquals)
            }
        };
        if valid {
            Ok(())
        } else {
            Err(TemplateError::InvalidArgument(format!(
                "Operator {} is not allowed for a {} constraint",
                self.op(),
                self.kind()
            )))
        }
    }
    pub fn path(&self) -> &str {
        match self {
            PathConstraint::Attribute { path, .. }
            | PathConstraint::Null { path, .. }
            | PathConstraint::Lookup { path, .. }
            | PathConstraint::Bag { path, .. }
            | PathConstraint::MultiValue { path, .. }
            | PathConstraint::Subclass { path, .. }
            | PathConstraint::Loop { path, .. } => path,
        }
    }
    pub fn op(&self) -> ConstraintOp {
        match self {
            PathConstraint::Attribute { op, .. }
            | PathConstraint::Null { op, .. }
            | PathConstraint::Bag { op, .. }
            | PathConstraint::MultiValue { op, .. }
            | PathConstraint::Loop { op, .. } => *op,
            PathConstraint::Lookup { .. } => ConstraintOp::Lookup,
            PathConstraint::Subclass { .. } => ConstraintOp::IsA,
        }
    }
    pub fn value(&self) -> Option<ConstraintValue> {
        match self {
            PathConstraint::Attribute { value, .. } | PathConstraint::Lookup { value, .. } => {
                Some(ConstraintValue::Single(value.clone()))
            }
            PathConstraint::Bag { bag, .. } => Some(ConstraintValue::Single(bag.clone())),
            PathConstraint::MultiValue { values, .. } => {
                Some(ConstraintValue::List(values.clone()))
            }
            PathConstraint::Subclass { type_name, .. } => {
                Some(ConstraintValue::Single(type_name.clone()))
            }
            PathConstraint::Loop { loop_path, .. } => {
                Some(ConstraintValue::Single(loop_path.clone()))
            }
            PathConstraint::Null { .. } => None,
        }
    }
    pub fn extra_value(&self) -> Option<&str> {
        match self {
            PathConstraint::Lookup { extra_value, .. } => extra_value.as_deref(),
            _ => None,
        }
    }
    pub fn kind(&self) -> &'static str {
        match self {
            PathConstraint::Attribute { .. } => "attribute",
            PathConstraint::Null { .. } => "null",
            PathConstraint::Lookup { .. } => "lookup",
            PathConstraint::Bag { .. } => "bag",
            PathConstraint::MultiValue { .. } => "multi-value",
            PathConstraint::Subclass { .. } => "subclass",
            PathConstraint::Loop { .. } => "loop",
        }
    }
    /// True for subclass casts and loops, which never carry a switchable value.
    pub fn is_structural(&self) -> bool {
        matches!(self, PathConstraint::Subclass { .. } | PathConstraint::Loop { .. })
    }
}

impl fmt::Display for PathConstraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.value() {
            None => write!(f, "{} {}", self.path(), self.op()),
            Some(ConstraintValue::Single(value)) => {
                write!(f, "{} {} {}", self.path(), self.op(), value)
            }
            Some(ConstraintValue::List(values)) => {
                write!(f, "{} {} [{}]", self.path(), self.op(), values.join(", "))
            }
        }
    }
}
