//! Template-based output parsing.
//!
//! Command output is converted into structured records by TextFSM
//! templates. The [`TemplateRegistry`] decides which templates apply to a
//! (domain, command) pair; [`Parser::aggregate`] runs them all and collects
//! the rows under each template's name.

mod aggregate;
mod registry;
mod template;

pub use aggregate::{Aggregation, ParseInput, Record, Results, TemplateFailure, zip};
pub use registry::{Domain, DomainTemplates, TemplateRegistry, normalize};
pub use template::{ParsedTable, Template, parse_definition, parse_one};

use std::path::PathBuf;

use indexmap::IndexMap;
use log::error;

/// Resolves templates for commands and aggregates their parsed output.
#[derive(Debug, Clone)]
pub struct Parser {
    registry: TemplateRegistry,
}

impl Parser {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self { registry }
    }

    /// Parser over the built-in command catalogue rooted at `base`.
    pub fn builtin(base: impl Into<PathBuf>) -> Self {
        Self::new(TemplateRegistry::builtin(base))
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.registry
    }

    /// Templates that apply to `command` in `domain`, in order.
    pub fn resolve_templates(&self, command: &str, domain: Domain) -> Vec<Template> {
        self.registry.resolve_templates(command, domain)
    }

    /// Parse `raw` with a single template.
    pub fn parse_one(&self, template: &Template, raw: &str) -> ParsedTable {
        parse_one(template, raw)
    }

    /// Parse `input` with every template of `command` and collect the rows.
    ///
    /// The `na` domain skips parsing. Pre-parsed input is reshaped without
    /// running any template. A template that fails to reshape is left out of
    /// the results and reported in [`Aggregation::errors`].
    pub fn aggregate<'a>(
        &self,
        command: &str,
        input: impl Into<ParseInput<'a>>,
        domain: Domain,
    ) -> Aggregation {
        let mut aggregation = Aggregation::default();
        if domain == Domain::Na {
            return aggregation;
        }

        let tables: IndexMap<String, ParsedTable> = match input.into() {
            ParseInput::Raw(raw) => self
                .resolve_templates(command, domain)
                .iter()
                .map(|template| (template.name.clone(), parse_one(template, raw)))
                .collect(),
            ParseInput::Parsed(tables) => tables,
        };

        for (name, table) in tables {
            match zip(&table.header, &table.rows) {
                Ok(records) => {
                    aggregation.results.insert(name, records);
                }
                Err(e) => {
                    error!("template '{}' for '{}' is broken: {}", name, command, e);
                    aggregation.errors.push(TemplateFailure {
                        template: name,
                        error: e,
                    });
                }
            }
        }

        aggregation
    }
}
