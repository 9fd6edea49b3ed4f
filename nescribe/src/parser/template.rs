//! TextFSM template loading and single-template parsing.

use std::path::PathBuf;

use log::{trace, warn};
use textfsm_rust::{Template as TextFsm, Value};

/// A template definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// File name up to the first `.`; the key results are stored under.
    pub name: String,

    /// Location of the definition.
    pub path: PathBuf,
}

impl Template {
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();
        Self { name, path }
    }
}

/// Parser output for one template: field names and row values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }
}

/// Parse `raw` with the template stored at `template.path`.
///
/// Unreadable or malformed templates and unmatched text yield zero rows.
pub fn parse_one(template: &Template, raw: &str) -> ParsedTable {
    match std::fs::read_to_string(&template.path) {
        Ok(definition) => parse_definition(&template.name, &definition, raw),
        Err(e) => {
            warn!("cannot read template {}: {}", template.path.display(), e);
            ParsedTable::default()
        }
    }
}

/// Parse `raw` with an in-memory template definition.
///
/// The header keeps the field names as declared by the template's `Value`
/// lines.
pub fn parse_definition(name: &str, definition: &str, raw: &str) -> ParsedTable {
    let compiled = match TextFsm::parse_str(definition) {
        Ok(compiled) => compiled,
        Err(e) => {
            warn!("template '{}' is malformed: {}", name, e);
            return ParsedTable::default();
        }
    };

    let header: Vec<String> = compiled.header().into_iter().map(str::to_string).collect();

    let mut parser = compiled.parser();
    let rows = match parser.parse_text(raw) {
        Ok(rows) => rows
            .iter()
            .map(|row| row.iter().map(Value::as_string).collect())
            .collect::<Vec<Vec<String>>>(),
        Err(e) => {
            warn!("template '{}' failed on input: {}", name, e);
            Vec::new()
        }
    };

    trace!("template '{}' produced {} rows", name, rows.len());
    ParsedTable::new(header, rows)
}
