//! The structured instruction contract returned by the admin agent.
//!
//! The model is asked to answer with one JSON object whose `action` field
//! selects the shape:
//!
//! ```text
//! {"action":"none","message":"..."}
//! {"action":"add","data":{<product, id optional>},"message":"..."}
//! {"action":"update","id":"...","changes":{<partial product>},"message":"..."}
//! {"action":"delete","id":"...","message":"..."}
//! {"action":"modify_data","products":[...],"siteConfig":{...},"explanation":"..."}
//! ```
//!
//! Anything else is rejected here, before the admin panel touches state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::product::Product;
use super::site::SiteConfig;

/// Action names the agent may use, in prompt order.
pub const KNOWN_ACTIONS: [&str; 5] = ["none", "add", "update", "delete", "modify_data"];

/// Placeholder id used only to validate an `add` payload that has none.
const DRAFT_ID: &str = "__draft__";

/// Errors produced while turning agent output into an [`AgentInstruction`].
#[derive(Debug, thiserror::Error)]
pub enum InstructionError {
    /// The text is not valid JSON.
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON is not an object with a string `action` field.
    #[error("response has no string \"action\" field")]
    MissingAction,

    /// The `action` value is not one of [`KNOWN_ACTIONS`].
    #[error("unknown action \"{0}\"")]
    UnknownAction(String),

    /// The action is known but its payload does not match the contract.
    #[error("invalid \"{action}\" payload: {reason}")]
    Shape {
        /// Action whose payload was rejected.
        action: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl InstructionError {
    /// Whether this error should be treated as a warning-level no-op rather
    /// than a failed command.
    #[must_use]
    pub const fn is_unknown_action(&self) -> bool {
        matches!(self, Self::UnknownAction(_))
    }
}

/// A validated instruction from the admin agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AgentInstruction {
    /// Nothing to change; the message is shown to the operator.
    None {
        #[serde(default)]
        message: Option<String>,
    },
    /// Append a catalog entry. `data` is a product object whose `id` may be
    /// missing.
    Add {
        data: Map<String, Value>,
        #[serde(default)]
        message: Option<String>,
    },
    /// Shallow-merge `changes` over the entry with `id`.
    Update {
        id: ProductId,
        changes: Map<String, Value>,
        #[serde(default)]
        message: Option<String>,
    },
    /// Remove every entry with `id`.
    Delete {
        id: ProductId,
        #[serde(default)]
        message: Option<String>,
    },
    /// Replace the catalog and/or the site configuration wholesale.
    ModifyData {
        #[serde(default)]
        products: Option<Vec<Product>>,
        #[serde(default, rename = "siteConfig")]
        site_config: Option<SiteConfig>,
        #[serde(default, alias = "message")]
        explanation: Option<String>,
    },
}

impl AgentInstruction {
    /// Parse raw model output.
    ///
    /// Surrounding code fences are stripped first. The `action` tag is checked
    /// against [`KNOWN_ACTIONS`] before the payload is decoded, so an unknown
    /// action is reported as such rather than as a shape error.
    ///
    /// # Errors
    ///
    /// Returns [`InstructionError`] when the text is not JSON, has no action,
    /// names an unknown action, or carries a payload that does not match.
    pub fn parse(raw: &str) -> Result<Self, InstructionError> {
        let value: Value = serde_json::from_str(&strip_code_fences(raw))?;
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .ok_or(InstructionError::MissingAction)?
            .to_string();

        if !KNOWN_ACTIONS.contains(&action.as_str()) {
            return Err(InstructionError::UnknownAction(action));
        }

        let instruction: Self =
            serde_json::from_value(value).map_err(|e| InstructionError::Shape {
                action: action.clone(),
                reason: e.to_string(),
            })?;
        instruction.validate()?;
        Ok(instruction)
    }

    /// The action name, as it appears in the `action` field.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::None { .. } => "none",
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::ModifyData { .. } => "modify_data",
        }
    }

    /// Human-readable text supplied by the agent, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        let text = match self {
            Self::None { message }
            | Self::Add { message, .. }
            | Self::Update { message, .. }
            | Self::Delete { message, .. } => message.as_deref(),
            Self::ModifyData { explanation, .. } => explanation.as_deref(),
        };
        text.map(str::trim).filter(|t| !t.is_empty())
    }

    fn validate(&self) -> Result<(), InstructionError> {
        let shape = |reason: String| InstructionError::Shape {
            action: self.action().to_string(),
            reason,
        };

        match self {
            Self::Add { data, .. } => {
                let mut draft = data.clone();
                let has_id = draft
                    .get("id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| !id.trim().is_empty());
                if !has_id {
                    draft.insert("id".to_string(), Value::String(DRAFT_ID.to_string()));
                }
                serde_json::from_value::<Product>(Value::Object(draft))
                    .map(|_| ())
                    .map_err(|e| shape(e.to_string()))
            }
            Self::Update { id, .. } | Self::Delete { id, .. } if id.is_blank() => {
                Err(shape("id cannot be empty".to_string()))
            }
            Self::ModifyData {
                products: None,
                site_config: None,
                ..
            } => Err(shape(
                "expected \"products\" and/or \"siteConfig\"".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Strip a Markdown code fence wrapped around a model response.
///
/// Handles an optional info string (```` ```json ````) and fences on a single
/// line. Text without a leading fence is returned trimmed.
///
/// ```
/// use prodigital_core::strip_code_fences;
///
/// assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
/// assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
/// ```
#[must_use]
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    let body = match rest.split_once('\n') {
        Some((_info, body)) => body,
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update() {
        let instruction =
            AgentInstruction::parse(r#"{"action":"update","id":"a","changes":{"rating":5}}"#)
                .unwrap();
        match instruction {
            AgentInstruction::Update { id, changes, .. } => {
                assert_eq!(id.as_str(), "a");
                assert_eq!(changes["rating"], 5);
            }
            other => panic!("unexpected instruction: {other:?}"),
        }
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"action\":\"delete\",\"id\":\"kinsta-review\"}\n```";
        let instruction = AgentInstruction::parse(raw).unwrap();
        assert_eq!(instruction.action(), "delete");
    }

    #[test]
    fn test_parse_single_line_fence() {
        let raw = "```json {\"action\":\"none\",\"message\":\"ok\"}```";
        let instruction = AgentInstruction::parse(raw).unwrap();
        assert_eq!(instruction.message(), Some("ok"));
    }

    #[test]
    fn test_parse_not_json() {
        let err = AgentInstruction::parse("Sure! I deleted it.").unwrap_err();
        assert!(matches!(err, InstructionError::Json(_)));
    }

    #[test]
    fn test_parse_missing_action() {
        let err = AgentInstruction::parse(r#"{"id":"a"}"#).unwrap_err();
        assert!(matches!(err, InstructionError::MissingAction));

        let err = AgentInstruction::parse("[1,2,3]").unwrap_err();
        assert!(matches!(err, InstructionError::MissingAction));
    }

    #[test]
    fn test_parse_unknown_action() {
        let err = AgentInstruction::parse(r#"{"action":"rename","id":"a"}"#).unwrap_err();
        assert!(err.is_unknown_action());
        assert_eq!(err.to_string(), "unknown action \"rename\"");
    }

    #[test]
    fn test_update_requires_object_changes() {
        let err = AgentInstruction::parse(r#"{"action":"update","id":"a","changes":"rating=5"}"#)
            .unwrap_err();
        assert!(matches!(err, InstructionError::Shape { .. }));
    }

    #[test]
    fn test_delete_requires_non_blank_id() {
        let err = AgentInstruction::parse(r#"{"action":"delete","id":" "}"#).unwrap_err();
        assert!(matches!(err, InstructionError::Shape { .. }));
    }

    #[test]
    fn test_add_without_id_is_accepted() {
        let instruction =
            AgentInstruction::parse(r#"{"action":"add","data":{"name":"Notion","rating":4.5}}"#)
                .unwrap();
        assert_eq!(instruction.action(), "add");
    }

    #[test]
    fn test_add_with_invalid_rating_is_rejected() {
        let err = AgentInstruction::parse(r#"{"action":"add","data":{"name":"Bad","rating":9}}"#)
            .unwrap_err();
        assert!(matches!(err, InstructionError::Shape { .. }));
    }

    #[test]
    fn test_modify_data_requires_a_payload() {
        let err = AgentInstruction::parse(r#"{"action":"modify_data","explanation":"nothing"}"#)
            .unwrap_err();
        assert!(matches!(err, InstructionError::Shape { .. }));
    }

    #[test]
    fn test_modify_data_accepts_message_alias() {
        let raw = r#"{"action":"modify_data","products":[],"message":"Cleared catalog"}"#;
        let instruction = AgentInstruction::parse(raw).unwrap();
        assert_eq!(instruction.message(), Some("Cleared catalog"));
    }

    #[test]
    fn test_blank_message_is_none() {
        let instruction = AgentInstruction::parse(r#"{"action":"none","message":"  "}"#).unwrap();
        assert_eq!(instruction.message(), None);
    }

    #[test]
    fn test_strip_code_fences_without_language() {
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    }
}
