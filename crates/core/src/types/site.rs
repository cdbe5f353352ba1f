//! Site-wide configuration.

use serde::{Deserialize, Serialize};

/// Singleton record of editable site-wide text.
///
/// Replaced wholesale by the admin agent, never patched field by field. The
/// contact address is protected and re-imposed by the admin panel after every
/// replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub site_title: String,
    pub hero_headline: String,
    pub hero_subheadline: String,
    /// Missing in agent replies more often than not; the panel fills it in.
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub is_verification_mode: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_title: "ProDigital Reviews".to_string(),
            hero_headline: "Build Your Stack with Confidence.".to_string(),
            hero_subheadline: "We test thousands of digital tools so you can pick the best one."
                .to_string(),
            contact_email: "contact@prodigitalreviews.com".to_string(),
            is_verification_mode: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_with_camel_case() {
        let json = serde_json::to_value(SiteConfig::default()).unwrap();
        assert_eq!(json["siteTitle"], "ProDigital Reviews");
        assert_eq!(json["isVerificationMode"], false);

        let back: SiteConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, SiteConfig::default());
    }

    #[test]
    fn test_verification_mode_defaults_to_false() {
        let config: SiteConfig = serde_json::from_str(
            r#"{"siteTitle":"T","heroHeadline":"H","heroSubheadline":"S","contactEmail":"a@b.co"}"#,
        )
        .unwrap();
        assert!(!config.is_verification_mode);
    }
}
