use thiserror::Error;

use crate::util::split_values;

#[derive(Debug, Error, PartialEq)]
pub enum PreferenceError {
    #[error("Unknown preference type: {0}")]
    UnknownType(String),

    #[error("Unknown preference scope: {0}")]
    UnknownScope(String),

    #[error("Invalid {kind} preference value: {value}")]
    InvalidValue { kind: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceScope {
    Global,
    Workbench,
}

impl PreferenceScope {
    pub fn name(self) -> &'static str {
        match self {
            PreferenceScope::Global => "global",
            PreferenceScope::Workbench => "workbench",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, PreferenceError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(PreferenceScope::Global),
            "workbench" | "eclipse" => Ok(PreferenceScope::Workbench),
            other => Err(PreferenceError::UnknownScope(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceValue {
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Text(String),
    Integers(Vec<i32>),
    Longs(Vec<i64>),
    Strings(Vec<String>),
}

impl PreferenceValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PreferenceValue::Boolean(_) => "boolean",
            PreferenceValue::Integer(_) => "integer",
            PreferenceValue::Long(_) => "long",
            PreferenceValue::Text(_) => "string",
            PreferenceValue::Integers(_) => "integers",
            PreferenceValue::Longs(_) => "longs",
            PreferenceValue::Strings(_) => "strings",
        }
    }

    /// Text form; list values are comma separated.
    pub fn to_text(&self) -> String {
        fn join<T: ToString>(values: &[T]) -> String {
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        }

        match self {
            PreferenceValue::Boolean(value) => value.to_string(),
            PreferenceValue::Integer(value) => value.to_string(),
            PreferenceValue::Long(value) => value.to_string(),
            PreferenceValue::Text(value) => value.clone(),
            PreferenceValue::Integers(values) => join(values),
            PreferenceValue::Longs(values) => join(values),
            PreferenceValue::Strings(values) => join(values),
        }
    }

    pub fn from_text(kind: &str, text: &str) -> Result<Self, PreferenceError> {
        fn parse<T: std::str::FromStr>(kind: &'static str, text: &str) -> Result<T, PreferenceError> {
            text.trim().parse().map_err(|_| PreferenceError::InvalidValue {
                kind,
                value: text.to_owned(),
            })
        }
        fn parse_list<T: std::str::FromStr>(
            kind: &'static str,
            text: &str,
        ) -> Result<Vec<T>, PreferenceError> {
            split_values(text).map(|part| parse(kind, part)).collect()
        }

        Ok(match kind.trim().to_ascii_lowercase().as_str() {
            "boolean" => PreferenceValue::Boolean(parse("boolean", text)?),
            "integer" => PreferenceValue::Integer(parse("integer", text)?),
            "long" => PreferenceValue::Long(parse("long", text)?),
            "string" => PreferenceValue::Text(text.to_owned()),
            "integers" => PreferenceValue::Integers(parse_list("integers", text)?),
            "longs" => PreferenceValue::Longs(parse_list("longs", text)?),
            "strings" => PreferenceValue::Strings(split_values(text).map(str::to_owned).collect()),
            other => return Err(PreferenceError::UnknownType(other.to_owned())),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preference {
    pub key: String,
    pub scope: PreferenceScope,
    pub value: PreferenceValue,
}

impl Preference {
    pub fn new(key: impl Into<String>, scope: PreferenceScope, value: PreferenceValue) -> Self {
        Self {
            key: key.into(),
            scope,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_values_parse() {
        assert_eq!(
            PreferenceValue::from_text("boolean", "true"),
            Ok(PreferenceValue::Boolean(true))
        );
        assert_eq!(
            PreferenceValue::from_text("longs", "1, 2,3"),
            Ok(PreferenceValue::Longs(vec![1, 2, 3]))
        );
        assert_eq!(
            PreferenceValue::from_text("strings", "a,b").map(|v| v.to_text()),
            Ok("a,b".to_owned())
        );
        assert!(PreferenceValue::from_text("integer", "ten").is_err());
        assert_eq!(
            PreferenceValue::from_text("color", "red"),
            Err(PreferenceError::UnknownType("color".to_owned()))
        );
    }

    #[test]
    fn test_scope_names() {
        assert_eq!(PreferenceScope::from_name("Workbench"), Ok(PreferenceScope::Workbench));
        assert!(PreferenceScope::from_name("project").is_err());
    }
}
