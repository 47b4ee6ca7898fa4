//! The dynamic property evaluator.
//!
//! Schema values reach the engine as plain JSON with expressions embedded
//! in strings. Before anything is handed to a callback or an action, the
//! evaluator resolves those strings (through the expression executor or a
//! prefix-matched external executor) and coerces scalars toward the known
//! target type, recursing through objects and arrays.

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::trace;

use forge_schema::{TypeHint, coerce};

use crate::error::{BoxError, EvaluateError, WalkError};
use crate::expression::{SessionView, parse_expression};
use crate::session::SessionInner;

fn wrap(value: impl ToString, hint: Option<&TypeHint>, source: impl Into<BoxError>) -> WalkError {
    WalkError::Evaluate(EvaluateError::new(value, hint.map(TypeHint::name), source))
}

impl SessionInner {
    /// Resolve one schema value against an optional known target type.
    ///
    /// Idempotent on already-evaluated scalars; literal `null` passes
    /// through untouched. Every failure except cancellation wraps into
    /// [`EvaluateError`].
    pub(crate) fn evaluate(
        &self,
        value: Value,
        hint: Option<TypeHint>,
    ) -> BoxFuture<'_, Result<Value, WalkError>> {
        Box::pin(async move {
            match value {
                Value::Null => Ok(Value::Null),

                Value::String(s) => self.evaluate_string(s, hint).await,

                Value::Object(map) => match hint {
                    Some(h @ (TypeHint::Object(_) | TypeHint::Response)) => {
                        let mut out = serde_json::Map::with_capacity(map.len());
                        for (field, field_value) in map {
                            let field_hint = h.field_hint(&field).cloned();
                            out.insert(field, self.evaluate(field_value, field_hint).await?);
                        }
                        Ok(Value::Object(out))
                    }
                    Some(h) => Err(wrap(
                        Value::Object(map),
                        Some(&h),
                        "object value cannot take a scalar target type",
                    )),
                    None => {
                        let mut out = serde_json::Map::with_capacity(map.len());
                        for (field, field_value) in map {
                            out.insert(field, self.evaluate(field_value, None).await?);
                        }
                        Ok(Value::Object(out))
                    }
                },

                Value::Array(items) => match hint {
                    Some(TypeHint::Array(element)) => {
                        let mut out = Vec::with_capacity(items.len());
                        for item in items {
                            out.push(self.evaluate(item, Some((*element).clone())).await?);
                        }
                        Ok(Value::Array(out))
                    }
                    Some(h) => Err(wrap(
                        Value::Array(items),
                        Some(&h),
                        "array value requires an array target type",
                    )),
                    None => {
                        let mut out = Vec::with_capacity(items.len());
                        for item in items {
                            out.push(self.evaluate(item, None).await?);
                        }
                        Ok(Value::Array(out))
                    }
                },

                scalar => match hint {
                    Some(h) => coerce(&scalar, &h).map_err(|e| wrap(&scalar, Some(&h), e)),
                    None => Ok(scalar),
                },
            }
        })
    }

    async fn evaluate_string(
        &self,
        value: String,
        hint: Option<TypeHint>,
    ) -> Result<Value, WalkError> {
        if let Some(expr) = parse_expression(&value) {
            // Effective target: the caller's known type wins over the
            // embedded name; bare expressions default to string.
            let effective = match (&hint, expr.type_name) {
                (Some(h), _) => (*h).clone(),
                (None, Some(name)) => TypeHint::parse_primitive(name).ok_or_else(|| {
                    wrap(&value, None, format!("unknown primitive type `{name}`"))
                })?,
                (None, None) => TypeHint::String,
            };

            let Some(executor) = &self.expressions else {
                return Err(wrap(
                    &value,
                    Some(&effective),
                    "no expression executor configured",
                ));
            };

            if self.cancellation.is_cancelled() {
                return Err(WalkError::Cancelled);
            }
            trace!(source = expr.source, hint = effective.name(), "evaluating expression");
            return match executor
                .execute(expr.source, Some(&effective), self as &dyn SessionView)
                .await
            {
                Ok(result) => Ok(result),
                Err(_) if self.cancellation.is_cancelled() => Err(WalkError::Cancelled),
                Err(e) => Err(wrap(&value, Some(&effective), e)),
            };
        }

        for (prefix, executor) in &self.externals {
            if let Some(payload) = value.strip_prefix(prefix.as_str()) {
                trace!(prefix = prefix.as_str(), "invoking external executor");
                let result = match executor.execute(payload, &self.cancellation).await {
                    Ok(result) => result,
                    Err(_) if self.cancellation.is_cancelled() => return Err(WalkError::Cancelled),
                    Err(e) => return Err(wrap(&value, hint.as_ref(), e)),
                };
                return match &hint {
                    Some(h) => coerce(&result, h).map_err(|e| wrap(&result, Some(h), e)),
                    None => Ok(result),
                };
            }
        }

        // Plain string: returned unchanged, hinted or not.
        Ok(Value::String(value))
    }

    /// Evaluate an optional timeout value to milliseconds; absent means
    /// infinite (`-1`), as does any negative result.
    pub(crate) async fn evaluate_timeout(
        &self,
        value: Option<&Value>,
    ) -> Result<i64, WalkError> {
        let Some(value) = value else { return Ok(-1) };
        let evaluated = self
            .evaluate(value.clone(), Some(TypeHint::Integer))
            .await?;
        evaluated.as_i64().ok_or_else(|| {
            wrap(
                &evaluated,
                Some(&TypeHint::Integer),
                "timeout must evaluate to an integer",
            )
        })
    }
}
