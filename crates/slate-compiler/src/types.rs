use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Void,
    Boolean,
    Integer,
    String,
    // Result of a failed inference; suppresses further diagnostics and emission.
    Undefined,
}

impl ValueType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "void" => Some(ValueType::Void),
            "boolean" => Some(ValueType::Boolean),
            "integer" => Some(ValueType::Integer),
            "string" => Some(ValueType::String),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Void => "void",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::String => "string",
            ValueType::Undefined => "undefined",
        }
    }

    pub fn is_defined(self) -> bool { self != ValueType::Undefined }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

pub const TYPE_NAMES: [&str; 4] = ["integer", "boolean", "string", "void"];

use ValueType::{Boolean, Integer};

/// `(left, operator, right) -> result`. Any key missing here is a type error.
const BINARY_RULES: &[(ValueType, &str, ValueType, ValueType)] = &[
    (Integer, "+", Integer, Integer),
    (Integer, "-", Integer, Integer),
    (Integer, "*", Integer, Integer),
    (Integer, "/", Integer, Integer),
    (Integer, "<", Integer, Boolean),
    (Integer, ">", Integer, Boolean),
    (Integer, "<=", Integer, Boolean),
    (Integer, ">=", Integer, Boolean),
    (Integer, "==", Integer, Boolean),
    (Integer, "!=", Integer, Boolean),
    (Boolean, "==", Boolean, Boolean),
    (Boolean, "!=", Boolean, Boolean),
];

const UNARY_RULES: &[(&str, ValueType)] = &[("-", Integer), ("!", Boolean)];

pub fn binary_result(left: ValueType, op: &str, right: ValueType) -> Option<ValueType> {
    BINARY_RULES.iter().find(|(l, o, r, _)| *l == left && *o == op && *r == right).map(|rule| rule.3)
}

/// Unary operators keep their operand's type when the pair is allowed.
pub fn unary_result(op: &str, operand: ValueType) -> Option<ValueType> {
    UNARY_RULES.iter().any(|(o, t)| *o == op && *t == operand).then_some(operand)
}

pub fn is_relational(op: &str) -> bool { matches!(op, "<" | ">" | "<=" | ">=" | "==" | "!=") }
