//! Command → template registry.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::template::Template;

/// Command namespace selecting which template set applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Domain {
    /// Superuser Linux shell on the element.
    Root,
    /// Network element CLI.
    Ne,
    /// Debug cut-through shell.
    DbgCutThru,
    /// No domain; parsing is skipped.
    Na,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Root => "root",
            Domain::Ne => "ne",
            Domain::DbgCutThru => "dbgCutThru",
            Domain::Na => "na",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static SHOW_CARD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"show card \d+/\d+").unwrap());
static SHOW_CARD_INV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"show card inv \d+/\d+").unwrap());
static SHOW_PF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"show pf \d+/\d+").unwrap());

/// Canonicalize a command before template lookup.
///
/// Slot/port-qualified variants collapse onto their unqualified key, and
/// aliases map onto the command whose output they share.
pub fn normalize(command: &str) -> Cow<'_, str> {
    let canonical = if command == "alm" {
        "show condition"
    } else if command.contains(".bm.power") {
        "bm.power"
    } else if command.contains(".bm.report") {
        "bm.report"
    } else if command.contains(".bm.status") {
        "bm.status"
    } else if SHOW_CARD.is_match(command) {
        "show card"
    } else if SHOW_CARD_INV.is_match(command) {
        "show card inv"
    } else if SHOW_PF.is_match(command) {
        "show pf"
    } else if command.contains("uptime") {
        "uptime"
    } else {
        return Cow::Borrowed(command);
    };
    Cow::Borrowed(canonical)
}

/// Templates for one domain: a directory and a command → template name map.
#[derive(Debug, Clone, Default)]
pub struct DomainTemplates {
    /// Directory relative to the registry base.
    pub directory: PathBuf,

    /// Command string → template file or directory name.
    pub commands: HashMap<String, String>,
}

impl DomainTemplates {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            commands: HashMap::new(),
        }
    }

    /// Map a command onto a template of the same name.
    pub fn with_command(self, command: &str) -> Self {
        self.with_alias(command, command)
    }

    /// Map a command onto a differently named template.
    pub fn with_alias(mut self, command: impl Into<String>, template: impl Into<String>) -> Self {
        self.commands.insert(command.into(), template.into());
        self
    }
}

/// Two-level mapping: domain → command → template(s).
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    base: PathBuf,
    domains: HashMap<Domain, DomainTemplates>,
}

impl TemplateRegistry {
    /// Create an empty registry rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            domains: HashMap::new(),
        }
    }

    /// Registry with the built-in root, ne and dbgCutThru mappings.
    pub fn builtin(base: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new(base);
        registry.register(Domain::Root, root_templates());
        registry.register(Domain::Ne, ne_templates());
        registry.register(Domain::DbgCutThru, DomainTemplates::new(Path::new("root").join("dbgCutThru")));
        registry
    }

    /// Register (or replace) the templates of a domain.
    pub fn register(&mut self, domain: Domain, templates: DomainTemplates) {
        self.domains.insert(domain, templates);
    }

    /// Base directory of the template tree.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Template name mapped to `command` in `domain`, after normalization.
    pub fn template_name(&self, command: &str, domain: Domain) -> Option<&str> {
        let templates = self.domains.get(&domain)?;
        templates
            .commands
            .get(normalize(command).as_ref())
            .map(String::as_str)
    }

    /// Resolve the templates that parse `command`'s output in `domain`.
    ///
    /// Unknown domains, unmapped commands and missing files all resolve to
    /// an empty list.
    pub fn resolve_templates(&self, command: &str, domain: Domain) -> Vec<Template> {
        let (Some(templates), Some(name)) =
            (self.domains.get(&domain), self.template_name(command, domain))
        else {
            return Vec::new();
        };

        let path = self.base.join(&templates.directory).join(name);
        if path.is_file() {
            return vec![Template::from_path(path)];
        }
        if !path.is_dir() {
            debug!("template {} for '{}' not found", path.display(), command);
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = match std::fs::read_dir(&path) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .collect(),
            Err(e) => {
                debug!("cannot list template directory {}: {}", path.display(), e);
                return Vec::new();
            }
        };
        files.sort();
        files.into_iter().map(Template::from_path).collect()
    }
}

fn root_templates() -> DomainTemplates {
    let mut templates = DomainTemplates::new(Path::new("root").join("linux"));
    for command in [
        "bootcmd r",
        "bm.power",
        "bm.report",
        "bm.status",
        "last",
        "ls -l",
        "pwd",
        "uptime",
        "vlan_setm r ilan",
        "vlan_setm r net",
        "who",
    ] {
        templates = templates.with_command(command);
    }
    for variant in ["last reboot", "last shutdown", "last -x reboot", "last -x shutdown"] {
        templates = templates.with_alias(variant, "last");
    }
    templates.with_alias("ls -al", "ls -l")
}

fn ne_templates() -> DomainTemplates {
    let mut templates = DomainTemplates::new("ne");
    for command in [
        "paging status",
        "show card",
        "show card inv",
        "show card inv *",
        "show condition",
        "show firmware ne",
        "show interface brief",
        "show interface topology *",
        "show odukxc brief",
        "show pf",
        "show slot *",
        "show software ne brief",
        "show version",
        "show xc *",
        "who",
    ] {
        templates = templates.with_command(command);
    }
    templates
}
