//! Reshaping parser output into records and aggregating across templates.

use indexmap::IndexMap;

use super::template::ParsedTable;
use crate::error::ParseError;

/// One parsed row: field name → value.
pub type Record = IndexMap<String, String>;

/// Template name → parsed rows.
pub type Results = IndexMap<String, Vec<Record>>;

/// Input to [`Parser::aggregate`](super::Parser::aggregate).
#[derive(Debug, Clone)]
pub enum ParseInput<'a> {
    /// Raw command output to run through the templates.
    Raw(&'a str),

    /// Output already parsed elsewhere, keyed by template name.
    Parsed(IndexMap<String, ParsedTable>),
}

impl<'a> From<&'a str> for ParseInput<'a> {
    fn from(raw: &'a str) -> Self {
        ParseInput::Raw(raw)
    }
}

/// A template whose output could not be reshaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFailure {
    pub template: String,
    pub error: ParseError,
}

impl std::fmt::Display for TemplateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "template '{}': {}", self.template, self.error)
    }
}

/// Outcome of aggregating every template of one command.
///
/// Templates that failed are absent from `results` and listed in `errors`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub results: Results,
    pub errors: Vec<TemplateFailure>,
}

impl Aggregation {
    /// Whether every template was reshaped.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// The results, or the first failure if any template failed.
    pub fn into_result(self) -> Result<Results, ParseError> {
        match self.errors.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.results),
        }
    }
}

/// Pair each row's values with the header's field names.
pub fn zip(header: &[String], rows: &[Vec<String>]) -> Result<Vec<Record>, ParseError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            if row.len() != header.len() {
                return Err(ParseError::Arity {
                    row: index,
                    expected: header.len(),
                    found: row.len(),
                });
            }
            Ok(header.iter().cloned().zip(row.iter().cloned()).collect::<Record>())
        })
        .collect()
}
