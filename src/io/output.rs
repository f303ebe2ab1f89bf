use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use super::DocumentFormat;

/// Where an exported document is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDestination {
    Stdout,
    File(PathBuf),
}

impl OutputDestination {
    pub fn file(path: impl AsRef<Path>) -> Self {
        OutputDestination::File(path.as_ref().to_path_buf())
    }

    fn describe(&self) -> String {
        match self {
            OutputDestination::Stdout => "stdout".to_string(),
            OutputDestination::File(path) => format!("file {}", path.display()),
        }
    }
}

/// How documents are rendered when they leave a session.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: DocumentFormat,
    pub pretty: bool,
    pub destinations: Vec<OutputDestination>,
}

impl OutputOptions {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            pretty: true,
            destinations: vec![OutputDestination::Stdout],
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_destinations(mut self, destinations: Vec<OutputDestination>) -> Self {
        self.destinations = destinations;
        self
    }
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self::new(DocumentFormat::Json)
    }
}

/// Render `document` once and write it to every configured destination.
///
/// Accepts session documents (`Layout`, `AppConfig`, `ImageProfiles`) as well as raw
/// values read back from a store.
pub fn emit<T: Serialize + ?Sized>(document: &T, options: &OutputOptions) -> Result<()> {
    if options.destinations.is_empty() {
        return Ok(());
    }
    let value = serde_json::to_value(document).context("document is not serializable")?;
    let mut payload = serialize_document(&value, options.format, options.pretty)?;
    if !payload.ends_with('\n') {
        payload.push('\n');
    }
    for destination in &options.destinations {
        write_to(destination, &payload)
            .with_context(|| format!("failed to write to {}", destination.describe()))?;
    }
    Ok(())
}

/// Render a stored document in `format`. TOML has no null, so null members (absent
/// lists, unset keys) are left out of TOML output.
pub fn serialize_document(value: &Value, format: DocumentFormat, pretty: bool) -> Result<String> {
    match format {
        DocumentFormat::Json if pretty => {
            serde_json::to_string_pretty(value).context("failed to serialize JSON")
        }
        DocumentFormat::Json => serde_json::to_string(value).context("failed to serialize JSON"),
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::to_string(value).context("failed to serialize YAML"),
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => {
            let value = without_nulls(value);
            let rendered = if pretty {
                toml::to_string_pretty(&value)
            } else {
                toml::to_string(&value)
            };
            rendered.context("failed to serialize TOML")
        }
    }
}

#[cfg(feature = "toml")]
fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, item)| !item.is_null())
                .map(|(key, item)| (key.clone(), without_nulls(item)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(without_nulls)
                .collect(),
        ),
        other => other.clone(),
    }
}

fn write_to(destination: &OutputDestination, payload: &str) -> io::Result<()> {
    match destination {
        OutputDestination::Stdout => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(payload.as_bytes())?;
            stdout.flush()
        }
        OutputDestination::File(path) => fs::write(path, payload),
    }
}
