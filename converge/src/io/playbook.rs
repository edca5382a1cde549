//! Playbook loading: file → schema check → one decoded action per entry.
//!
//! A playbook is TOML (or JSON, by `.json` extension) with an `action` array:
//!
//! ```toml
//! [[action]]
//! module = "command"
//! execute = "touch /tmp/marker"
//! creates = "/tmp/marker"
//! ```
//!
//! Document structure errors fail the whole load. Entry-level decode errors are
//! kept per entry so the rest of the playbook can still be applied.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::actions::{Action, DecodeError, UNKNOWN_MODULE};

const PLAYBOOK_SCHEMA: &str = include_str!("../../schemas/playbook.schema.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybookFormat {
    Toml,
    Json,
}

impl PlaybookFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => PlaybookFormat::Json,
            _ => PlaybookFormat::Toml,
        }
    }
}

/// One playbook entry, decoded or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookEntry {
    /// Position in the playbook (0-based).
    pub index: usize,
    /// The declared `module` value, if it was a string.
    pub module: Option<String>,
    pub action: Result<Action, DecodeError>,
}

impl PlaybookEntry {
    /// Name to report in results; never empty.
    pub fn module_name(&self) -> &str {
        match self.module.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNKNOWN_MODULE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playbook {
    pub entries: Vec<PlaybookEntry>,
}

impl Playbook {
    pub fn decode_errors(&self) -> impl Iterator<Item = (&PlaybookEntry, &DecodeError)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.action.as_ref().err().map(|err| (entry, err)))
    }
}

/// Load, schema-check and decode a playbook file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_playbook(path: &Path) -> Result<Playbook> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read playbook {}", path.display()))?;
    parse_playbook(&contents, PlaybookFormat::from_path(path))
        .with_context(|| format!("load playbook {}", path.display()))
}

pub fn parse_playbook(contents: &str, format: PlaybookFormat) -> Result<Playbook> {
    let document: Value = match format {
        PlaybookFormat::Json => serde_json::from_str(contents).context("parse playbook json")?,
        PlaybookFormat::Toml => {
            let table: toml::Table = toml::from_str(contents).context("parse playbook toml")?;
            serde_json::to_value(table).context("convert playbook toml")?
        }
    };
    validate_schema(&document)?;

    let entries = document
        .get("action")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().enumerate().map(decode_entry).collect())
        .unwrap_or_default();
    let playbook = Playbook { entries };
    debug!(entries = playbook.entries.len(), "playbook decoded");
    Ok(playbook)
}

fn decode_entry((index, entry): (usize, &Value)) -> PlaybookEntry {
    PlaybookEntry {
        index,
        module: entry
            .get("module")
            .and_then(Value::as_str)
            .map(str::to_string),
        action: Action::decode_entry(entry),
    }
}

fn validate_schema(document: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(PLAYBOOK_SCHEMA).context("parse playbook schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    let messages = compiled
        .iter_errors(document)
        .map(|err| err.to_string())
        .collect::<Vec<_>>();
    if !messages.is_empty() {
        return Err(anyhow!(
            "playbook schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::CommandAction;

    #[test]
    fn parses_toml_entries_in_order() {
        let playbook = parse_playbook(
            r#"
[[action]]
module = "command"
execute = "mkdir -p /tmp/a"
creates = "/tmp/a"

[[action]]
module = "command"
execute = "rm /tmp/b"
removes = "/tmp/b"
"#,
            PlaybookFormat::Toml,
        )
        .expect("parse");

        assert_eq!(playbook.entries.len(), 2);
        assert_eq!(
            playbook.entries[0].action,
            Ok(Action::Command(
                CommandAction::new("mkdir -p /tmp/a").with_creates("/tmp/a")
            ))
        );
        assert_eq!(playbook.entries[1].index, 1);
        assert_eq!(playbook.decode_errors().count(), 0);
    }

    #[test]
    fn parses_json() {
        let playbook = parse_playbook(
            r#"{"action": [{"module": "command", "execute": "true"}]}"#,
            PlaybookFormat::Json,
        )
        .expect("parse");
        assert_eq!(
            playbook.entries[0].action,
            Ok(Action::Command(CommandAction::new("true")))
        );
    }

    /// Verifies a bad entry is kept as a decode error and does not hide its neighbours.
    #[test]
    fn bad_entries_are_isolated() {
        let playbook = parse_playbook(
            r#"
[[action]]
module = "package"
name = "curl"

[[action]]
execute = "true"

[[action]]
module = "command"
execute = "true"
"#,
            PlaybookFormat::Toml,
        )
        .expect("parse");

        let errors: Vec<_> = playbook.decode_errors().collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].0.module_name(), "package");
        assert_eq!(errors[1].0.module_name(), UNKNOWN_MODULE);
        assert!(playbook.entries[2].action.is_ok());
    }

    #[test]
    fn schema_rejects_unknown_top_level_keys() {
        let err = parse_playbook(
            "[[actions]]\nmodule = \"command\"\nexecute = \"true\"\n",
            PlaybookFormat::Toml,
        )
        .unwrap_err();
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn schema_requires_table_entries() {
        let err = parse_playbook(r#"{"action": ["true"]}"#, PlaybookFormat::Json).unwrap_err();
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            PlaybookFormat::from_path(Path::new("site.json")),
            PlaybookFormat::Json
        );
        assert_eq!(
            PlaybookFormat::from_path(Path::new("site.toml")),
            PlaybookFormat::Toml
        );
        assert_eq!(
            PlaybookFormat::from_path(Path::new("playbook")),
            PlaybookFormat::Toml
        );
    }
}
