//! The expression-executor port and the embedded-expression grammar.

use async_trait::async_trait;
use forge_action::ActionResponse;
use forge_core::{SessionId, UserContext};
use forge_schema::TypeHint;

use crate::error::BoxError;

/// Marker a schema string carries to be treated as an expression.
pub const EXPRESSION_TAG: &str = "C#";

/// A parsed embedded expression: `C#|<expr>` or `C#<Typename>|<expr>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionRef<'a> {
    /// The primitive type name embedded in the prefix, if any.
    pub type_name: Option<&'a str>,
    /// The expression source, prefix stripped.
    pub source: &'a str,
}

/// Parse a schema string as an embedded expression.
///
/// Returns `None` for plain strings. The embedded type name, when present,
/// is returned verbatim; resolving it against the primitive namespace is
/// the caller's job (unknown names are evaluation failures, not plain
/// strings).
#[must_use]
pub fn parse_expression(value: &str) -> Option<ExpressionRef<'_>> {
    let rest = value.strip_prefix(EXPRESSION_TAG)?;
    if let Some(source) = rest.strip_prefix('|') {
        return Some(ExpressionRef {
            type_name: None,
            source,
        });
    }
    let typed = rest.strip_prefix('<')?;
    let (type_name, source) = typed.split_once(">|")?;
    Some(ExpressionRef {
        type_name: Some(type_name),
        source,
    })
}

/// The read surface expressions get on the running session.
///
/// Lets an expression reference the outputs of earlier actions and the
/// host-supplied dependencies value.
#[async_trait]
pub trait SessionView: Send + Sync {
    /// The session's identity.
    fn session_id(&self) -> SessionId;

    /// The committed response of an action, if any.
    async fn output(&self, action_key: &str) -> Option<ActionResponse>;

    /// The response committed most recently, if any.
    async fn last_action_response(&self) -> Option<ActionResponse>;

    /// The opaque dependencies value supplied at session construction.
    fn dependencies(&self) -> Option<&UserContext>;
}

/// Compiles and evaluates expression sources.
///
/// Injected at session construction; the engine strips the expression
/// prefix, chooses the effective target type, and hands over the bare
/// source. The executor is expected to produce a value conforming to the
/// hint (the engine does not re-coerce expression results).
#[async_trait]
pub trait ExpressionExecutor: Send + Sync {
    /// Evaluate `source`, producing a value of the hinted type.
    async fn execute(
        &self,
        source: &str,
        hint: Option<&TypeHint>,
        session: &dyn SessionView,
    ) -> Result<serde_json::Value, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn untyped_expression() {
        let parsed = parse_expression("C#|1 + 1").unwrap();
        assert_eq!(parsed.type_name, None);
        assert_eq!(parsed.source, "1 + 1");
    }

    #[test]
    fn typed_expression() {
        let parsed = parse_expression("C#<Boolean>|false").unwrap();
        assert_eq!(parsed.type_name, Some("Boolean"));
        assert_eq!(parsed.source, "false");
    }

    #[test]
    fn expression_source_may_contain_pipes() {
        let parsed = parse_expression("C#|a | b").unwrap();
        assert_eq!(parsed.source, "a | b");

        let parsed = parse_expression("C#<Int32>|x >| y").unwrap();
        assert_eq!(parsed.type_name, Some("Int32"));
        assert_eq!(parsed.source, "x >| y");
    }

    #[test]
    fn empty_source_is_still_an_expression() {
        let parsed = parse_expression("C#|").unwrap();
        assert_eq!(parsed.source, "");
    }

    #[test]
    fn plain_strings_are_not_expressions() {
        assert_eq!(parse_expression("hello"), None);
        assert_eq!(parse_expression(""), None);
        assert_eq!(parse_expression("c#|lowercase tag"), None);
        // Tag without a separator is not an expression.
        assert_eq!(parse_expression("C#"), None);
        assert_eq!(parse_expression("C#<Unclosed"), None);
    }
}
