//! Typed task option schemas.
//!
//! Every task option declares a closed type (`integer`, `number`, `string`,
//! `boolean`, or a choice-constrained variant of each) and a default value
//! that must match it. Validation happens at construction time, never at use
//! time: an option that constructs successfully can always be resolved.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ContractError, Result};

static RX_OPTION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+\.task_options\.[A-Za-z0-9_]+$").expect("valid option id pattern")
});

/// Validate an option id against the `<namespace>.task_options.<name>` pattern.
pub fn validate_option_id(option_id: &str) -> Result<()> {
    if RX_OPTION_ID.is_match(option_id) {
        Ok(())
    } else {
        Err(ContractError::InvalidOptionId(option_id.to_string()))
    }
}

/// A literal option value.
///
/// Serializes untagged, i.e. as the plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    Str(String),
}

impl OptionValue {
    /// Schema type tag of this value.
    pub fn type_tag(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "boolean",
            OptionValue::Int(_) => "integer",
            OptionValue::Float(_) => "number",
            OptionValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(v) => write!(f, "{v}"),
            OptionValue::Int(v) => write!(f, "{v}"),
            OptionValue::Float(v) => write!(f, "{v}"),
            OptionValue::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Float(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Str(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Str(v)
    }
}

/// Declared type of a task option: plain or choice-constrained.
///
/// Choice variants carry their allowed value set; a mixed-type choice set is
/// unrepresentable by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionType {
    /// Plain integer.
    Int,
    /// Plain floating point number.
    Float,
    /// Plain string.
    Str,
    /// Plain boolean.
    Bool,
    /// Integer restricted to an enumerated set.
    ChoiceInt(Vec<i64>),
    /// Number restricted to an enumerated set.
    ChoiceFloat(Vec<f64>),
    /// String restricted to an enumerated set.
    ChoiceStr(Vec<String>),
}

impl OptionType {
    /// Wire tag for this type, e.g. `"integer"` or `"choice_string"`.
    pub fn type_tag(&self) -> &'static str {
        match self {
            OptionType::Int => "integer",
            OptionType::Float => "number",
            OptionType::Str => "string",
            OptionType::Bool => "boolean",
            OptionType::ChoiceInt(_) => "choice_integer",
            OptionType::ChoiceFloat(_) => "choice_number",
            OptionType::ChoiceStr(_) => "choice_string",
        }
    }

    /// Whether this is a choice-constrained type.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            OptionType::ChoiceInt(_) | OptionType::ChoiceFloat(_) | OptionType::ChoiceStr(_)
        )
    }

    /// The allowed choice values, if any, as literal option values.
    pub fn choices(&self) -> Option<Vec<OptionValue>> {
        match self {
            OptionType::ChoiceInt(vs) => Some(vs.iter().map(|v| OptionValue::Int(*v)).collect()),
            OptionType::ChoiceFloat(vs) => Some(vs.iter().map(|v| OptionValue::Float(*v)).collect()),
            OptionType::ChoiceStr(vs) => {
                Some(vs.iter().map(|v| OptionValue::Str(v.clone())).collect())
            }
            _ => None,
        }
    }
}

/// A task option schema: id, display metadata, declared type, and default.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOption {
    option_id: String,
    name: String,
    description: String,
    option_type: OptionType,
    default: OptionValue,
}

impl TaskOption {
    /// Create a task option, validating the id pattern and that the default
    /// matches the declared type (including choice membership).
    ///
    /// An integer default is accepted for a number-typed option and widened;
    /// the converse is rejected.
    pub fn new(
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        option_type: OptionType,
        default: OptionValue,
    ) -> Result<Self> {
        let option_id = option_id.into();
        validate_option_id(&option_id)?;
        let mut option = Self {
            option_id,
            name: name.into(),
            description: description.into(),
            option_type,
            default,
        };
        option.default = option.validate_value(option.default.clone())?;
        Ok(option)
    }

    /// Integer option.
    pub fn int(
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: i64,
    ) -> Result<Self> {
        Self::new(option_id, name, description, OptionType::Int, default.into())
    }

    /// Number option.
    pub fn float(
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: f64,
    ) -> Result<Self> {
        Self::new(option_id, name, description, OptionType::Float, default.into())
    }

    /// String option.
    pub fn str(
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<String>,
    ) -> Result<Self> {
        Self::new(option_id, name, description, OptionType::Str, default.into().into())
    }

    /// Boolean option.
    pub fn boolean(
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: bool,
    ) -> Result<Self> {
        Self::new(option_id, name, description, OptionType::Bool, default.into())
    }

    /// Integer option constrained to an enumerated set.
    pub fn choice_int(
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        choices: Vec<i64>,
        default: i64,
    ) -> Result<Self> {
        Self::new(option_id, name, description, OptionType::ChoiceInt(choices), default.into())
    }

    /// Number option constrained to an enumerated set.
    pub fn choice_float(
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        choices: Vec<f64>,
        default: f64,
    ) -> Result<Self> {
        Self::new(option_id, name, description, OptionType::ChoiceFloat(choices), default.into())
    }

    /// String option constrained to an enumerated set.
    pub fn choice_str(
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        choices: Vec<String>,
        default: impl Into<String>,
    ) -> Result<Self> {
        Self::new(
            option_id,
            name,
            description,
            OptionType::ChoiceStr(choices),
            default.into().into(),
        )
    }

    /// Fully-qualified option id.
    pub fn option_id(&self) -> &str {
        &self.option_id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared type.
    pub fn option_type(&self) -> &OptionType {
        &self.option_type
    }

    /// Default value.
    pub fn default(&self) -> &OptionValue {
        &self.default
    }

    /// Validate a value against this option's declared type, returning the
    /// (possibly widened) value.
    ///
    /// Used both for the default at construction time and for overrides at
    /// resolution time.
    pub fn validate_value(&self, value: OptionValue) -> Result<OptionValue> {
        match (&self.option_type, value) {
            (OptionType::Int, OptionValue::Int(v)) => Ok(OptionValue::Int(v)),
            (OptionType::Float, OptionValue::Float(v)) => Ok(OptionValue::Float(v)),
            // Numeric widening: int is acceptable where a number is declared.
            (OptionType::Float, OptionValue::Int(v)) => Ok(OptionValue::Float(v as f64)),
            (OptionType::Str, OptionValue::Str(v)) => Ok(OptionValue::Str(v)),
            (OptionType::Bool, OptionValue::Bool(v)) => Ok(OptionValue::Bool(v)),
            (OptionType::ChoiceInt(allowed), OptionValue::Int(v)) => {
                self.check_choice(allowed.contains(&v), OptionValue::Int(v))
            }
            (OptionType::ChoiceFloat(allowed), OptionValue::Float(v)) => {
                self.check_choice(allowed.contains(&v), OptionValue::Float(v))
            }
            (OptionType::ChoiceFloat(allowed), OptionValue::Int(v)) => {
                let widened = v as f64;
                self.check_choice(allowed.contains(&widened), OptionValue::Float(widened))
            }
            (OptionType::ChoiceStr(allowed), OptionValue::Str(v)) => {
                self.check_choice(allowed.contains(&v), OptionValue::Str(v))
            }
            (expected, actual) => Err(ContractError::OptionTypeMismatch {
                option_id: self.option_id.clone(),
                expected: expected.type_tag().to_string(),
                actual: actual.type_tag().to_string(),
            }),
        }
    }

    fn check_choice(&self, is_member: bool, value: OptionValue) -> Result<OptionValue> {
        if is_member {
            Ok(value)
        } else {
            Err(ContractError::ChoiceNotAllowed {
                option_id: self.option_id.clone(),
                value: value.to_string(),
            })
        }
    }
}
