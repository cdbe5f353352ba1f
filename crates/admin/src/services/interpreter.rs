//! Prompt construction for admin commands and site scans.
//!
//! Parsing the reply lives in [`prodigital_core::AgentInstruction::parse`];
//! this module only decides what the model sees.

use prodigital_core::{Product, SiteConfig};
use serde::Serialize;

use super::executor::CompletionRequest;

/// MIME type requested for command replies.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Characters of an unparseable reply quoted back to the operator.
pub const PREVIEW_CHARS: usize = 120;

const RESPONSE_SHAPES: &str = r#"{"action":"none","message":"why nothing changed"}
{"action":"add","data":{<product object; "id" optional>},"message":"status message"}
{"action":"update","id":"<product id>","changes":{<only the fields to change>},"message":"status message"}
{"action":"delete","id":"<product id>","message":"status message"}
{"action":"modify_data","products":[<full replacement catalog>],"siteConfig":{<full replacement site config>},"explanation":"status message"}"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot<'a> {
    products: &'a [Product],
    site_config: &'a SiteConfig,
}

#[derive(Serialize)]
struct ScanRow<'a> {
    name: &'a str,
    rating: f64,
    category: &'a str,
}

/// Prompt asking the model to turn `command` into one JSON instruction.
///
/// # Errors
///
/// Returns an error if the state snapshot cannot be serialized.
pub fn command_prompt(
    products: &[Product],
    site_config: &SiteConfig,
    command: &str,
) -> Result<String, serde_json::Error> {
    let snapshot = serde_json::to_string(&Snapshot {
        products,
        site_config,
    })?;
    let command = serde_json::to_string(command)?;

    Ok(format!(
        "You are the System Admin of the ProDigital Reviews website.\n\
         Current Data: {snapshot}\n\
         User Command: {command}\n\n\
         Return ONLY valid JSON, with no prose and no code fences, using exactly one of these shapes:\n\
         {RESPONSE_SHAPES}\n\n\
         For \"modify_data\" include \"products\", \"siteConfig\", or both. \
         Product fields use camelCase as in Current Data. \
         The contact email cannot be changed."
    ))
}

/// Prompt for the AI site monitor.
///
/// Only name, rating and category of each product are sent.
///
/// # Errors
///
/// Returns an error if the summary cannot be serialized.
pub fn scan_prompt(products: &[Product]) -> Result<String, serde_json::Error> {
    let rows: Vec<ScanRow<'_>> = products
        .iter()
        .map(|p| ScanRow {
            name: &p.name,
            rating: p.rating.value(),
            category: &p.category,
        })
        .collect();
    let summary = serde_json::to_string(&rows)?;

    Ok(format!(
        "Analyze the current product data of this website: {summary}. \
         Answer briefly. 1. Who is the target audience? \
         2. How profitable is it likely to be? 3. One short suggestion."
    ))
}

/// Build the completion request for an admin command.
#[must_use]
pub fn command_request(model: &str, prompt: String) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        prompt,
        response_mime_type: Some(JSON_MIME_TYPE.to_string()),
    }
}

/// Build the completion request for a site scan.
#[must_use]
pub fn scan_request(model: &str, prompt: String) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        prompt,
        response_mime_type: None,
    }
}

/// First `max` characters of `text` on one line, with an ellipsis when cut.
#[must_use]
pub fn preview(text: &str, max: usize) -> String {
    let flat: String = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use prodigital_core::seed_products;

    use super::*;

    #[test]
    fn test_command_prompt_embeds_state_and_command() {
        let products = seed_products();
        let config = SiteConfig::default();

        let prompt = command_prompt(&products, &config, "bump rating of \"a\" to 5").unwrap();

        assert!(prompt.contains(r#""siteConfig":{"siteTitle":"ProDigital Reviews""#));
        assert!(prompt.contains(products[0].id.as_str()));
        assert!(prompt.contains(r#"User Command: "bump rating of \"a\" to 5""#));
        assert!(prompt.contains("Return ONLY valid JSON"));
        for action in prodigital_core::KNOWN_ACTIONS {
            assert!(prompt.contains(&format!(r#""action":"{action}""#)));
        }
    }

    #[test]
    fn test_scan_prompt_is_compact() {
        let products = seed_products();
        let prompt = scan_prompt(&products).unwrap();

        assert!(prompt.contains(&format!(r#""name":"{}""#, products[0].name)));
        assert!(!prompt.contains("fullDescription"));
        assert!(!prompt.contains("affiliateLink"));
    }

    #[test]
    fn test_requests() {
        let command = command_request("m", "p".to_string());
        assert_eq!(command.response_mime_type.as_deref(), Some(JSON_MIME_TYPE));

        let scan = scan_request("m", "p".to_string());
        assert!(scan.response_mime_type.is_none());
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("short\n  text", 120), "short text");

        let long = "x".repeat(300);
        let cut = preview(&long, PREVIEW_CHARS);
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 1);
        assert!(cut.ends_with('…'));
    }
}
