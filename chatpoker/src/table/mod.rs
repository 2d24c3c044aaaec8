//! Session actors and the registry that routes chat intents to them.
//!
//! Each session runs in its own Tokio task with an mpsc inbox and is the
//! only code that mutates its [`Session`](crate::game::Session). The
//! [`SessionRegistry`] creates sessions and resolves ids to handles, and the
//! [`TimeoutSweeper`] nudges every session so stalled turns get played.
//!
//! ## Example
//!
//! ```no_run
//! use chatpoker::game::Action;
//! use chatpoker::ledger::InMemoryLedger;
//! use chatpoker::table::{SessionConfig, SessionRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = SessionRegistry::new(Arc::new(InMemoryLedger::new(10_000)));
//!     let handle = registry.open_session(SessionConfig::default()).await?;
//!
//!     handle.join(1, "alice", 1_000).await?;
//!     handle.join(2, "bob", 1_000).await?;
//!     handle.start().await?;
//!     handle.act(2, Action::Call).await?;
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod messages;
pub mod registry;
pub mod sweeper;

pub use actor::{SessionActor, SessionHandle};
pub use config::SessionConfig;
pub use errors::{TableError, TableResult};
pub use messages::{SessionEvent, SessionMessage};
pub use registry::SessionRegistry;
pub use sweeper::TimeoutSweeper;
