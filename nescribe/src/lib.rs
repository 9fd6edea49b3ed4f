//! # Nescribe
//!
//! Async CLI automation and event logging for network elements.
//!
//! Nescribe drives interactive SSH sessions on network elements, records
//! every exchange in a per-host JSON event log, and parses command output
//! into structured records with TextFSM templates.
//!
//! ## Features
//!
//! - Async SSH sessions via russh
//! - Prompt-driven command completion with continuation-page handling
//! - Role-aware prompt verification (root, admin, debug cut-through)
//! - Append-safe JSON array event logs shared between sessions
//! - TextFSM output parsing keyed by command and domain
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nescribe::{EventLog, LogConfig, OpenMode, Role, RunContext, SessionBuilder, SshConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nescribe::Error> {
//!     let log = EventLog::open("192.168.1.1", OpenMode::Create, &LogConfig::default(), RunContext::new())?
//!         .shared();
//!
//!     let mut session = SessionBuilder::new("192.168.1.1")
//!         .role(Role::Admin)
//!         .open(&SshConnector::default(), log.clone())
//!         .await?;
//!
//!     let entry = session.execute("show card").await?;
//!     for (template, records) in &entry.results {
//!         println!("{}: {} records", template, records.len());
//!     }
//!
//!     session.close().await?;
//!     log.lock().unwrap().close()?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod eventlog;
pub mod parser;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use error::Error;
pub use eventlog::{EventLog, LogConfig, LogEntry, OpenMode, RunContext, SharedEventLog};
pub use parser::{Domain, Parser, TemplateRegistry};
pub use session::{Command, Role, Session, SessionBuilder, SessionConfig};
pub use transport::{Connector, SshConfig, SshConnector, Transport};
