//! Client runtime for server-driven UI: applies DOM patches streamed from a
//! server and reports user interactions back to it.

pub mod config;
pub mod dom;
pub mod error;
pub mod forwarder;
pub mod interpreter;
pub mod ledger;
pub mod patch;
pub mod registry;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use error::{ConfigError, LedgerError, PatchError, TransportError};
pub use forwarder::{EventForwarder, Forwarded, Outbound};
pub use interpreter::{ApplySummary, PatchInterpreter};
pub use ledger::Ledger;
pub use patch::Patch;
pub use registry::ListenerRegistry;
pub use session::{Interaction, Session};
