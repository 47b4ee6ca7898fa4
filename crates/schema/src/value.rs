//! Target types for schema-value resolution.
//!
//! When the engine resolves an embedded expression or coerces a scalar, it
//! may know the *target type* the result should take: the declared input
//! type of an action, the element type of an array field, or the primitive
//! named inline in an expression prefix. [`TypeHint`] is that knowledge,
//! made explicit as a tagged descriptor instead of runtime reflection.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Error coercing a schema value to a [`TypeHint`].
#[derive(Debug, thiserror::Error)]
#[error("cannot coerce `{value}` to {target}")]
pub struct CoerceError {
    /// String form of the offending value.
    pub value: String,
    /// Name of the target type.
    pub target: &'static str,
}

impl CoerceError {
    fn new(value: &Value, target: &'static str) -> Self {
        Self {
            value: value.to_string(),
            target,
        }
    }
}

/// Field shape of an object-typed target.
///
/// Built once per known type and shared; maps field names to the hint each
/// field's value is resolved under. Fields absent from the descriptor are
/// resolved unhinted.
#[derive(Debug, Clone, Default)]
pub struct TypeDescriptor {
    fields: HashMap<String, TypeHint>,
}

impl TypeDescriptor {
    /// An empty descriptor (every field unhinted).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field's target type.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, hint: TypeHint) -> Self {
        self.fields.insert(name.into(), hint);
        self
    }

    /// Look up a field's declared hint.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeHint> {
        self.fields.get(name)
    }
}

/// The target type of one schema-value resolution.
#[derive(Debug, Clone)]
pub enum TypeHint {
    /// A boolean.
    Bool,
    /// A signed integer.
    Integer,
    /// A floating-point number.
    Float,
    /// A string.
    String,
    /// The action-response envelope: an object whose `status` field is a string.
    Response,
    /// An object with per-field hints.
    Object(Arc<TypeDescriptor>),
    /// An array with a uniform element hint.
    Array(Box<TypeHint>),
}

impl TypeHint {
    /// An object hint over the given descriptor.
    #[must_use]
    pub fn object(descriptor: TypeDescriptor) -> Self {
        Self::Object(Arc::new(descriptor))
    }

    /// An array hint over the given element type.
    #[must_use]
    pub fn array(element: TypeHint) -> Self {
        Self::Array(Box::new(element))
    }

    /// Resolve a primitive type name embedded in an expression prefix.
    ///
    /// Accepts the host-standard names (`Boolean`, `Int32`, `Double`,
    /// `String`, ...) along with their lowercase aliases. Unknown names
    /// return `None`; the caller reports them as evaluation failures.
    #[must_use]
    pub fn parse_primitive(name: &str) -> Option<Self> {
        match name {
            "Boolean" | "bool" => Some(Self::Bool),
            "Byte" | "SByte" | "Int16" | "UInt16" | "Int32" | "UInt32" | "Int64" | "UInt64"
            | "int" | "uint" | "long" | "ulong" | "short" | "byte" => Some(Self::Integer),
            "Single" | "Double" | "Decimal" | "float" | "double" | "decimal" => Some(Self::Float),
            "String" | "string" => Some(Self::String),
            _ => None,
        }
    }

    /// Human-readable target name, used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "Boolean",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::String => "String",
            Self::Response => "ActionResponse",
            Self::Object(_) => "Object",
            Self::Array(_) => "Array",
        }
    }

    /// The hint a named field resolves under, for object-shaped hints.
    #[must_use]
    pub fn field_hint(&self, field: &str) -> Option<&TypeHint> {
        match self {
            Self::Object(descriptor) => descriptor.get(field),
            // The response envelope requires a string `status`; every other
            // field is opaque.
            Self::Response => (field == "status").then_some(&Self::String),
            _ => None,
        }
    }
}

/// Coerce a scalar schema value to a hinted target.
///
/// Idempotent on already-conforming values. `Null` passes through under
/// every hint. Container hints (`Object`, `Array`, `Response`) reject
/// scalars: shaping containers is the evaluator's job, not coercion's.
pub fn coerce(value: &Value, hint: &TypeHint) -> Result<Value, CoerceError> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match hint {
        TypeHint::Bool => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim() {
                "true" | "True" => Ok(Value::Bool(true)),
                "false" | "False" => Ok(Value::Bool(false)),
                _ => Err(CoerceError::new(value, "Boolean")),
            },
            _ => Err(CoerceError::new(value, "Boolean")),
        },

        TypeHint::Integer => match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::from(i))
                } else if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 {
                        Ok(Value::from(f as i64))
                    } else {
                        Err(CoerceError::new(value, "Integer"))
                    }
                } else {
                    Err(CoerceError::new(value, "Integer"))
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| CoerceError::new(value, "Integer")),
            _ => Err(CoerceError::new(value, "Integer")),
        },

        TypeHint::Float => match value {
            Value::Number(n) => n
                .as_f64()
                .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
                .ok_or_else(|| CoerceError::new(value, "Float")),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
                .ok_or_else(|| CoerceError::new(value, "Float")),
            _ => Err(CoerceError::new(value, "Float")),
        },

        TypeHint::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(CoerceError::new(value, "String")),
        },

        TypeHint::Response | TypeHint::Object(_) => {
            if value.is_object() {
                Ok(value.clone())
            } else {
                Err(CoerceError::new(value, hint.name()))
            }
        }

        TypeHint::Array(_) => {
            if value.is_array() {
                Ok(value.clone())
            } else {
                Err(CoerceError::new(value, "Array"))
            }
        }
    }
}
