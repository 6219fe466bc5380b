//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

/// Root configuration for the maintenance gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream receiving requests outside maintenance.
    pub upstream: UpstreamConfig,

    /// Maintenance mode settings.
    pub maintenance: MaintenanceConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream authority (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Maintenance mode configuration.
///
/// Accepts both `query_filter` and `queryFilter`. `content` and
/// `query_filter` take a list or a comma-separated string.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Answer in-scope requests with 503 maintenance responses.
    #[serde(deserialize_with = "lenient_bool")]
    pub enabled: bool,

    /// Glob patterns locating maintenance pages.
    #[serde(deserialize_with = "string_or_list")]
    pub content: Vec<String>,

    /// Host filters; empty means every request is in scope.
    #[serde(alias = "queryFilter", deserialize_with = "string_or_list")]
    pub query_filter: Vec<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Accepts `true`/`false` as well as `"yes"`, `"no"`, `"1"`, `"0"` in any case.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientBool;

    impl<'de> Visitor<'de> for LenientBool {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean or one of true/false/yes/no/1/0")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            match v.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }
    }

    deserializer.deserialize_any(LenientBool)
}

/// Accepts a list of strings or a single comma-separated string.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrList;

    impl<'de> Visitor<'de> for StringOrList {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a list of strings or a comma-separated string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut values = Vec::new();
            while let Some(value) = seq.next_element::<String>()? {
                values.push(value);
            }
            Ok(values)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrList)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_full() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [upstream]
            address = "backend:3000"

            [maintenance]
            enabled = true
            content = ["/srv/maintenance/*.html", "/srv/maintenance/*.json"]
            query_filter = ["example.com"]
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.upstream.address, "backend:3000");
        assert!(config.maintenance.enabled);
        assert_eq!(config.maintenance.content.len(), 2);
        assert_eq!(config.maintenance.query_filter, vec!["example.com"]);
        assert_eq!(config.timeouts, TimeoutConfig::default());
    }

    #[test]
    fn test_defaults_disable_maintenance() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert!(!config.maintenance.enabled);
        assert!(config.maintenance.content.is_empty());
    }

    #[test]
    fn test_json_lenient_fields() {
        let config: MaintenanceConfig = serde_json::from_str(
            r#"{"enabled": "yes", "content": "/a/*.html, /b/*", "queryFilter": ["example.com"]}"#,
        )
        .unwrap();

        assert!(config.enabled);
        assert_eq!(config.content, vec!["/a/*.html", "/b/*"]);
        assert_eq!(config.query_filter, vec!["example.com"]);

        let config: MaintenanceConfig = serde_json::from_str(r#"{"enabled": "FALSE"}"#).unwrap();
        assert!(!config.enabled);

        let config: MaintenanceConfig = serde_json::from_str(r#"{"enabled": 1}"#).unwrap();
        assert!(config.enabled);
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let result: Result<MaintenanceConfig, _> = serde_json::from_str(r#"{"enabled": "maybe"}"#);
        assert!(result.is_err());
    }
}
