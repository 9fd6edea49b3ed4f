//! Login roles and their prompt signatures.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::channel::patterns::compile_prompt_pattern;
use crate::parser::Domain;

/// The account a session logs in as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Superuser shell.
    Root,
    /// Network element administrative CLI.
    Admin,
    /// Debug cut-through shell reached from the root shell.
    DbgCutThru,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Root => "root",
            Role::Admin => "admin",
            Role::DbgCutThru => "dbgCutThru",
        }
    }

    /// Login name for this role.
    pub fn username(&self) -> &'static str {
        self.as_str()
    }

    /// Role name as used in environment variable keys.
    pub fn env_key(&self) -> &'static str {
        match self {
            Role::Root => "ROOT",
            Role::Admin => "ADMIN",
            Role::DbgCutThru => "DBGCUTTHRU",
        }
    }

    /// Template domain for commands run in this role.
    pub fn domain(&self) -> Domain {
        match self {
            Role::Root => Domain::Root,
            Role::Admin => Domain::Ne,
            Role::DbgCutThru => Domain::DbgCutThru,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static ROOT_PROMPT: LazyLock<Regex> = LazyLock::new(|| compile_prompt_pattern(r"#").unwrap());
static ROOT_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"root@\S*").unwrap());
static ADMIN_PROMPT: LazyLock<Regex> =
    LazyLock::new(|| compile_prompt_pattern(r"\s*\S+#\s*$").unwrap());
static DBG_PROMPT: LazyLock<Regex> = LazyLock::new(|| compile_prompt_pattern(r"dbgCut>").unwrap());

/// Prompt configuration for one role, computed once.
#[derive(Debug, Clone)]
pub struct RoleProfile {
    pub role: Role,

    /// Domain commands are parsed in.
    pub domain: Domain,

    /// Pattern signalling the role's prompt is ready for input.
    pub prompt: Regex,

    /// Pattern an observed prompt must match to confirm the role.
    pub signature: Regex,
}

impl RoleProfile {
    pub fn for_role(role: Role) -> Self {
        let (prompt, signature) = match role {
            Role::Root => (&*ROOT_PROMPT, &*ROOT_SIGNATURE),
            Role::Admin => (&*ADMIN_PROMPT, &*ADMIN_PROMPT),
            Role::DbgCutThru => (&*DBG_PROMPT, &*DBG_PROMPT),
        };

        Self {
            role,
            domain: role.domain(),
            prompt: prompt.clone(),
            signature: signature.clone(),
        }
    }

    /// Check if an observed prompt belongs to this role.
    pub fn matches(&self, prompt: &str) -> bool {
        self.signature.is_match(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_prompt() {
        let admin = RoleProfile::for_role(Role::Admin);
        assert_eq!(admin.domain, Domain::Ne);
        assert!(admin.prompt.is_match("output\nNE-1# "));
        assert!(admin.matches("NE-1#"));
        assert!(!admin.matches("NE-1>"));
    }

    #[test]
    fn test_root_prompt() {
        let root = RoleProfile::for_role(Role::Root);
        assert_eq!(root.domain, Domain::Root);
        assert!(root.prompt.is_match("root@ne1:~# "));
        assert!(root.matches("root@ne1:~#"));
        assert!(!root.matches("admin@ne1:~#"));
    }

    #[test]
    fn test_dbg_prompt() {
        let dbg = RoleProfile::for_role(Role::DbgCutThru);
        assert!(dbg.prompt.is_match("dbgCut> "));
        assert!(!dbg.matches("root@ne1:~#"));
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::DbgCutThru.env_key(), "DBGCUTTHRU");
        assert_eq!(serde_json::to_string(&Role::DbgCutThru).unwrap(), "\"dbgCutThru\"");
    }
}
