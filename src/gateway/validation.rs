//! Declarative parameter schemas.
//!
//! # Responsibilities
//! - Describe the fields a route expects in `params`
//! - Check required fields, JSON types and emptiness
//! - Optionally reject fields the schema does not name
//!
//! # Design Decisions
//! - Returns all violations, not just the first
//! - Validation is a pure function: (schema, params) → Result<(), Vec<String>>
//! - A JSON `null` counts as absent

use serde::Serialize;
use serde_json::Value;

use crate::gateway::request::Params;

/// Expected JSON type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Bool,
    Object,
    Array,
    Any,
}

impl FieldKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
            FieldKind::Any => true,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Bool => "boolean",
            FieldKind::Object => "object",
            FieldKind::Array => "array",
            FieldKind::Any => "any",
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One field constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRule {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub non_empty: bool,
}

/// Schema a route declares for its parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParamSchema {
    fields: Vec<FieldRule>,
    deny_unknown: bool,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(name.into(), kind, true)
    }

    pub fn optional(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(name.into(), kind, false)
    }

    /// Require the most recently added field to be a non-empty string or array.
    pub fn non_empty(mut self) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.non_empty = true;
        }
        self
    }

    /// Reject parameters the schema does not name.
    pub fn deny_unknown(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    fn field(mut self, name: String, kind: FieldKind, required: bool) -> Self {
        self.fields.push(FieldRule {
            name,
            kind,
            required,
            non_empty: false,
        });
        self
    }

    /// Check `params`, collecting every violated constraint.
    pub fn validate(&self, params: &Params) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        for rule in &self.fields {
            let value = params.get(&rule.name).filter(|v| !v.is_null());
            let Some(value) = value else {
                if rule.required {
                    violations.push(format!("missing required field '{}'", rule.name));
                }
                continue;
            };

            if !rule.kind.accepts(value) {
                violations.push(format!(
                    "field '{}' expected {}, got {}",
                    rule.name,
                    rule.kind.name(),
                    json_type(value)
                ));
                continue;
            }

            if rule.non_empty {
                let empty = match value {
                    Value::String(s) => s.trim().is_empty(),
                    Value::Array(a) => a.is_empty(),
                    Value::Object(o) => o.is_empty(),
                    _ => false,
                };
                if empty {
                    violations.push(format!("field '{}' must not be empty", rule.name));
                }
            }
        }

        if self.deny_unknown {
            for key in params.keys() {
                if !self.fields.iter().any(|f| &f.name == key) {
                    violations.push(format!("unknown field '{}'", key));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    fn upload_schema() -> ParamSchema {
        ParamSchema::new()
            .required("filename", FieldKind::String)
            .non_empty()
            .optional("options", FieldKind::Object)
            .optional("size", FieldKind::Integer)
    }

    #[test]
    fn test_valid_params() {
        let p = params(json!({"filename": "a.csv", "options": {"x": 1}, "size": 10}));
        assert_eq!(upload_schema().validate(&p), Ok(()));
    }

    #[test]
    fn test_collects_all_violations() {
        let p = params(json!({"options": "nope", "size": 1.5}));
        let violations = upload_schema().validate(&p).unwrap_err();
        assert_eq!(
            violations,
            vec![
                "missing required field 'filename'".to_string(),
                "field 'options' expected object, got string".to_string(),
                "field 'size' expected integer, got number".to_string(),
            ]
        );
    }

    #[test]
    fn test_null_counts_as_missing() {
        let p = params(json!({"filename": null}));
        let violations = upload_schema().validate(&p).unwrap_err();
        assert_eq!(violations, vec!["missing required field 'filename'".to_string()]);
    }

    #[test]
    fn test_non_empty() {
        let p = params(json!({"filename": "  "}));
        let violations = upload_schema().validate(&p).unwrap_err();
        assert_eq!(violations, vec!["field 'filename' must not be empty".to_string()]);
    }

    #[test]
    fn test_deny_unknown() {
        let schema = upload_schema().deny_unknown();
        let p = params(json!({"filename": "a", "extra": true}));
        assert_eq!(
            schema.validate(&p).unwrap_err(),
            vec!["unknown field 'extra'".to_string()]
        );

        // Unknown fields are allowed by default.
        assert_eq!(upload_schema().validate(&p), Ok(()));
    }
}
