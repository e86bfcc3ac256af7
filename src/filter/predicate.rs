use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use polars::prelude::{col, lit, Expr};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layer::LayerKind;

/// Errors produced while parsing or applying record filters.
#[derive(Error, Debug)]
pub enum FilterError {
    /// A predicate referenced a field the layer does not carry.
    #[error("unknown field {field:?} on the {kind} layer")]
    UnknownField { kind: LayerKind, field: String },

    /// A predicate referenced a field that is not numeric.
    #[error("field {field:?} is not numeric (found {dtype})")]
    NonNumericField { field: String, dtype: String },

    /// A distance threshold that is not a positive, finite number.
    #[error("invalid distance threshold {value}")]
    InvalidThreshold { value: f64 },

    /// A predicate string that does not parse.
    #[error("cannot parse predicate {0:?}")]
    Parse(String),
}

/// Comparison operator of an attribute predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text {
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            "=" | "==" => Some(Self::Eq),
            _ => None,
        }
    }
}

/// A single attribute comparison against a numeric field, e.g. `farms > 500`.
///
/// Serializes as its display string, so configuration files read the way the
/// predicate is spoken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Predicate {
    pub field: String,
    pub cmp: Comparator,
    pub value: f64,
}

impl Predicate {
    /// The polars expression this predicate evaluates to. Null attribute
    /// values never satisfy a comparison.
    pub fn expr(&self) -> Expr {
        let field = col(self.field.as_str());
        let value = lit(self.value);
        match self.cmp {
            Comparator::Gt => field.gt(value),
            Comparator::Ge => field.gt_eq(value),
            Comparator::Lt => field.lt(value),
            Comparator::Le => field.lt_eq(value),
            Comparator::Eq => field.eq(value),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.cmp.as_str(), self.value)
    }
}

impl FromStr for Predicate {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(
                r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(>=|<=|==|=|>|<)\s*([-+]?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)\s*$",
            )
            .expect("valid regex")
        });
        let caps = re.captures(s).ok_or_else(|| FilterError::Parse(s.to_string()))?;
        let cmp = Comparator::parse(&caps[2]).ok_or_else(|| FilterError::Parse(s.to_string()))?;
        let value = caps[3].parse::<f64>().map_err(|_| FilterError::Parse(s.to_string()))?;
        Ok(Self { field: caps[1].to_string(), cmp, value })
    }
}

impl TryFrom<String> for Predicate {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Predicate> for String {
    fn from(value: Predicate) -> Self {
        value.to_string()
    }
}
