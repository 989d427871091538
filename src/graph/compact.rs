//! Compact graph representation.
//!
//! The compact form is what a graph is saved as: a map from node display
//! identity (`"<name> [<Type>]"`) to that node's settings, plus an ordered list
//! of connection descriptors (`"<src>.<port> -> <dst>.<port>"`).
//!
//! ```text
//! {
//!   "Nodes": { "Macro: noop [Macro]": { "path": "noop.json", "name": "Macro: noop" },
//!              "source [ValueSource]": { "data": [100] } },
//!   "Inputs": [ "source [ValueSource].any -> Macro: noop [Macro].Noop_any" ]
//! }
//! ```

use crate::error::{MacroError, Result};
use crate::graph::node::Settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Serialized form of a graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactGraph {
    #[serde(rename = "Nodes", default)]
    pub nodes: BTreeMap<String, Settings>,
    #[serde(rename = "Inputs", default)]
    pub inputs: Vec<String>,
}

/// On-disk encodings of a compact graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Toml,
}

impl DefinitionFormat {
    /// Pick the format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DefinitionFormat::Toml,
            _ => DefinitionFormat::Json,
        }
    }
}

impl CompactGraph {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| MacroError::Serialization(format!("Invalid compact graph JSON: {}", e)))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MacroError::Serialization(format!("Failed to encode JSON: {}", e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| MacroError::Serialization(format!("Invalid compact graph TOML: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MacroError::Serialization(format!("Failed to encode TOML: {}", e)))
    }

    pub fn parse(content: &str, format: DefinitionFormat) -> Result<Self> {
        match format {
            DefinitionFormat::Json => Self::from_json_str(content),
            DefinitionFormat::Toml => Self::from_toml_str(content),
        }
    }

    pub fn encode(&self, format: DefinitionFormat) -> Result<String> {
        match format {
            DefinitionFormat::Json => self.to_json_string(),
            DefinitionFormat::Toml => self.to_toml_string(),
        }
    }

    /// Save to disk, choosing the encoding from the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = self.encode(DefinitionFormat::from_path(path))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Number of node entries carrying a given type tag.
    pub fn count_type(&self, type_tag: &str) -> usize {
        self.nodes
            .keys()
            .filter_map(|key| split_display(key))
            .filter(|(_, tag)| *tag == type_tag)
            .count()
    }
}

/// Split `"<name> [<Type>]"` into name and type tag.
pub fn split_display(display: &str) -> Option<(&str, &str)> {
    let inner = display.strip_suffix(']')?;
    let (name, tag) = inner.rsplit_once(" [")?;
    if tag.is_empty() {
        return None;
    }
    Some((name, tag))
}

/// Build `"<name> [<Type>]"`.
pub fn format_display(name: &str, type_tag: &str) -> String {
    format!("{} [{}]", name, type_tag)
}

/// A parsed connection descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub emit_display: String,
    pub emit_port: String,
    pub recv_display: String,
    pub recv_port: String,
}

impl Descriptor {
    pub fn new(
        emit_display: impl Into<String>,
        emit_port: impl Into<String>,
        recv_display: impl Into<String>,
        recv_port: impl Into<String>,
    ) -> Self {
        Self {
            emit_display: emit_display.into(),
            emit_port: emit_port.into(),
            recv_display: recv_display.into(),
            recv_port: recv_port.into(),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.emit_display, self.emit_port, self.recv_display, self.recv_port
        )
    }
}

impl FromStr for Descriptor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (emit, recv) = s
            .split_once(" -> ")
            .ok_or_else(|| format!("missing ' -> ' in connection descriptor '{}'", s))?;
        let (emit_display, emit_port) = emit
            .rsplit_once('.')
            .ok_or_else(|| format!("missing emit port in '{}'", s))?;
        let (recv_display, recv_port) = recv
            .rsplit_once('.')
            .ok_or_else(|| format!("missing receive port in '{}'", s))?;
        if emit_port.is_empty() || recv_port.is_empty() {
            return Err(format!("empty port key in '{}'", s));
        }
        Ok(Self::new(emit_display, emit_port, recv_display, recv_port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_display() {
        assert_eq!(split_display("Noop [Noop]"), Some(("Noop", "Noop")));
        assert_eq!(
            split_display("Macro: noop [Macro]"),
            Some(("Macro: noop", "Macro"))
        );
        assert_eq!(split_display("a [b] [Macro]"), Some(("a [b]", "Macro")));
        assert_eq!(split_display("Noop"), None);
        assert_eq!(split_display("Noop []"), None);
    }

    #[test]
    fn test_descriptor_parse_and_display() {
        let text = "source [ValueSource].any -> Macro: noop [Macro].Noop_any";
        let desc: Descriptor = text.parse().unwrap();
        assert_eq!(desc.emit_display, "source [ValueSource]");
        assert_eq!(desc.emit_port, "any");
        assert_eq!(desc.recv_display, "Macro: noop [Macro]");
        assert_eq!(desc.recv_port, "Noop_any");
        assert_eq!(desc.to_string(), text);
    }

    #[test]
    fn test_descriptor_rejects_garbage() {
        assert!("a.b => c.d".parse::<Descriptor>().is_err());
        assert!("a -> c.d".parse::<Descriptor>().is_err());
        assert!("a. -> c.d".parse::<Descriptor>().is_err());
    }

    #[test]
    fn test_json_shape() {
        let mut graph = CompactGraph::default();
        let mut settings = Settings::new();
        settings.insert("data".to_string(), json!([1, 2]));
        graph.nodes.insert("src [ValueSource]".to_string(), settings);
        graph.inputs.push("src [ValueSource].any -> sink [Collector].any".to_string());

        let text = graph.to_json_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("Nodes").is_some());
        assert!(value.get("Inputs").is_some());
        assert_eq!(CompactGraph::from_json_str(&text).unwrap(), graph);
    }

    #[test]
    fn test_toml_decodes() {
        let text = r#"
Inputs = ["src [ValueSource].any -> Noop [Noop].any"]

[Nodes."Noop [Noop]"]

[Nodes."src [ValueSource]"]
data = [1, 2, 3]
"#;
        let graph = CompactGraph::from_toml_str(text).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.inputs.len(), 1);
        assert_eq!(graph.count_type("Noop"), 1);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DefinitionFormat::from_path(Path::new("a/b.toml")),
            DefinitionFormat::Toml
        );
        assert_eq!(
            DefinitionFormat::from_path(Path::new("a/b.json")),
            DefinitionFormat::Json
        );
        assert_eq!(
            DefinitionFormat::from_path(Path::new("noop")),
            DefinitionFormat::Json
        );
    }
}
