//! Safety Escalation
//!
//! Crisis-resource resolution and supportive-message rendering. Any
//! ambiguous or risk-flagged model response ends up here; resolution must
//! never fail closed, so every path bottoms out in a built-in resource set.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mindflow_core::Result;
use mindflow_core::contract::SafetyStatus;

/// Contact channels for crisis support
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisResources {
    /// Phone/text lines, most relevant first
    pub phone: Vec<String>,

    pub website: Option<String>,

    /// ISO country code the resources apply to, when known
    pub region: Option<String>,
}

impl CrisisResources {
    pub fn is_empty(&self) -> bool {
        self.phone.is_empty() && self.website.is_none()
    }
}

/// International defaults used whenever location is unknown or lookup fails.
pub fn default_resources() -> CrisisResources {
    CrisisResources {
        phone: vec!["988".into(), "741741".into()],
        website: Some("https://findahelpline.com".into()),
        region: None,
    }
}

/// Region-specific crisis lines, keyed by ISO country code.
pub fn regional_resources(country_code: &str) -> Option<CrisisResources> {
    let (phone, website): (Vec<&str>, &str) = match country_code {
        "US" => (vec!["988", "741741"], "https://988lifeline.org"),
        "CA" => (vec!["988"], "https://talksuicide.ca"),
        "GB" => (vec!["116 123"], "https://www.samaritans.org"),
        "AU" => (vec!["13 11 14"], "https://www.lifeline.org.au"),
        "NZ" => (vec!["1737"], "https://1737.org.nz"),
        "IN" => (vec!["9152987821"], "https://icallhelpline.org"),
        "IE" => (vec!["116 123"], "https://www.samaritans.org/ireland"),
        _ => return None,
    };

    Some(CrisisResources {
        phone: phone.into_iter().map(String::from).collect(),
        website: Some(website.into()),
        region: Some(country_code.into()),
    })
}

/// Resolves crisis resources, optionally localized by caller IP.
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    /// Must tolerate a missing or invalid IP by returning a default,
    /// non-empty resource set.
    async fn resolve(&self, ip: Option<&str>) -> Result<CrisisResources>;
}

/// Lookup that always returns the built-in defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticResourceLookup;

#[async_trait]
impl ResourceLookup for StaticResourceLookup {
    async fn resolve(&self, _ip: Option<&str>) -> Result<CrisisResources> {
        Ok(default_resources())
    }
}

/// Lookup that geolocates the caller's IP and maps the country to a
/// regional resource set, falling back to defaults on any failure.
pub struct GeoResourceLookup {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct GeoResponse {
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
}

impl Default for GeoResourceLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoResourceLookup {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "http://ip-api.com/json".into(),
        }
    }

    async fn country_for(&self, ip: &str) -> Option<String> {
        let url = format!("{}/{}?fields=countryCode", self.base_url, ip);
        let response = self.client.get(url).send().await.ok()?;
        let decoded: GeoResponse = response.json().await.ok()?;
        decoded.country_code
    }
}

#[async_trait]
impl ResourceLookup for GeoResourceLookup {
    async fn resolve(&self, ip: Option<&str>) -> Result<CrisisResources> {
        let Some(ip) = ip.filter(|ip| !ip.is_empty()) else {
            return Ok(default_resources());
        };

        match self.country_for(ip).await {
            Some(country) => Ok(regional_resources(&country).unwrap_or_else(default_resources)),
            None => {
                tracing::warn!(ip, "geolocation lookup failed, using default resources");
                Ok(default_resources())
            }
        }
    }
}

/// Render the supportive message shown in place of normal tutoring output.
/// Every non-empty resource set yields at least one actionable contact
/// channel.
pub fn compose_supportive_message(resources: &CrisisResources) -> String {
    let mut message = String::from(
        "It sounds like you might be going through a difficult time. \
         You don't have to face this alone, and support is available right now.\n",
    );

    for phone in &resources.phone {
        let digits: String = phone
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        message.push_str(&format!("\n- Call or text [{phone}](tel:{digits})"));
    }

    if let Some(website) = &resources.website {
        message.push_str(&format!("\n- Visit [{website}]({website})"));
    }

    if resources.is_empty() {
        message.push_str("\nPlease reach out to someone you trust, or to local emergency services.");
    }

    message.push_str(
        "\n\nWhenever you're ready, I'm here to keep learning with you. \
         There's no rush.",
    );
    message
}

/// Composite response substituted for normal output on safety escalation.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyReport {
    pub status: SafetyStatus,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supportive_message: Option<String>,
    pub suggested_resources: Vec<String>,
}

impl SafetyReport {
    pub fn safe(explanation: impl Into<String>) -> Self {
        Self {
            status: SafetyStatus::Safe,
            explanation: explanation.into(),
            supportive_message: None,
            suggested_resources: Vec::new(),
        }
    }

    pub fn escalated(
        status: SafetyStatus,
        explanation: impl Into<String>,
        resources: &CrisisResources,
    ) -> Self {
        let mut suggested: Vec<String> = resources.phone.clone();
        if let Some(website) = &resources.website {
            suggested.push(website.clone());
        }
        Self {
            status,
            explanation: explanation.into(),
            supportive_message: Some(compose_supportive_message(resources)),
            suggested_resources: suggested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resources_are_non_empty() {
        assert!(!default_resources().is_empty());
    }

    #[test]
    fn test_regional_table_hits_and_misses() {
        assert_eq!(regional_resources("GB").unwrap().phone, vec!["116 123"]);
        assert!(regional_resources("ZZ").is_none());
    }

    #[test]
    fn test_supportive_message_has_tel_link() {
        let message = compose_supportive_message(&default_resources());
        assert!(message.contains("tel:988"));
        assert!(message.contains("https://findahelpline.com"));
    }

    #[test]
    fn test_tel_link_strips_formatting() {
        let resources = regional_resources("GB").unwrap();
        let message = compose_supportive_message(&resources);
        assert!(message.contains("tel:116123"));
    }

    #[test]
    fn test_escalated_report_bundles_channels() {
        let report = SafetyReport::escalated(
            SafetyStatus::NeedsHelp,
            "crisis signals",
            &default_resources(),
        );
        assert!(!report.suggested_resources.is_empty());
        assert!(report.supportive_message.unwrap().contains("tel:"));
    }

    #[tokio::test]
    async fn test_static_lookup_ignores_ip() {
        let lookup = StaticResourceLookup;
        let with_ip = lookup.resolve(Some("203.0.113.7")).await.unwrap();
        let without = lookup.resolve(None).await.unwrap();
        assert_eq!(with_ip, without);
    }
}
