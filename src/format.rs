use clap::ValueEnum;
use serde_json::Value;
use std::{fmt, path::Path};

use crate::{
    error::Error,
    value::{toml_to_json, yaml_to_json, YamlNode},
};

/// JSON output indentation, one unit per nesting level.
const INDENT: &[u8] = b"  ";

#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, ValueEnum)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    pub fn from_ext(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Format implied by the extension of `path`, if it has a known one.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_ext)
    }

    /// Parses a whole document into the generic value tree.
    pub fn decode(self, input: &str, path: &Path) -> Result<Value, Error> {
        let malformed = |msg: String| Error::MalformedSource {
            path: path.to_path_buf(),
            format: self,
            msg,
        };
        match self {
            FileFormat::Json => {
                serde_json::from_str::<Value>(input).map_err(|e| malformed(e.to_string()))
            }
            FileFormat::Yaml => {
                let yaml = serde_yaml::from_str::<YamlNode>(input)
                    .map_err(|e| malformed(e.to_string()))?;
                yaml_to_json(yaml)
            }
            FileFormat::Toml => {
                let toml = input
                    .parse::<toml::Value>()
                    .map_err(|e| malformed(e.to_string()))?;
                toml_to_json(toml)
            }
        }
    }

    /// Serializes the value tree; nothing is written until this succeeds.
    pub fn encode(self, value: &Value) -> Result<String, Error> {
        let failed = |msg: String| Error::Serialization(self, msg);
        match self {
            FileFormat::Json => {
                let mut out = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
                let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
                serde::Serialize::serialize(value, &mut ser).map_err(|e| failed(e.to_string()))?;
                String::from_utf8(out).map_err(|e| failed(e.to_string()))
            }
            FileFormat::Yaml => serde_yaml::to_string(value).map_err(|e| failed(e.to_string())),
            FileFormat::Toml => {
                let toml = toml::Value::try_from(value)
                    .map_err(|e| Error::Unrepresentable(format!("{} in TOML", e)))?;
                if !toml.is_table() {
                    return Err(Error::Unrepresentable(
                        "TOML document root must be a table".to_string(),
                    ));
                }
                toml::to_string(&toml).map_err(|e| failed(e.to_string()))
            }
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Json => "JSON",
            FileFormat::Yaml => "YAML",
            FileFormat::Toml => "TOML",
        })
    }
}
