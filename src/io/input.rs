use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::DocumentFormat;

/// Parse structured data in any supported format into a `serde_json::Value`.
pub fn parse_document_str(contents: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(contents).with_context(|| "failed to parse JSON document")
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Value>(contents).with_context(|| "failed to parse YAML document")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => contents
            .parse::<toml::Value>()
            .with_context(|| "failed to parse TOML document")
            .and_then(|value| {
                serde_json::to_value(value).context("failed to convert TOML to JSON")
            }),
    }
}

/// Parse and then deserialize into a typed record.
pub fn decode_document_str<T: DeserializeOwned>(contents: &str, format: DocumentFormat) -> Result<T> {
    let value = parse_document_str(contents, format)?;
    serde_json::from_value(value).with_context(|| format!("{format} document has an unexpected shape"))
}
