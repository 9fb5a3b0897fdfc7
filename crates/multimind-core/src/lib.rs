//! multimind-core - multi-provider AI-completion dispatch
//!
//! This crate provides functionality for:
//! - Querying heterogeneous text-generation providers behind one trait
//! - Falling back across model candidates when a backend rejects a model id
//! - Probing provider connectivity without consuming generation quota
//! - Running a dispatch round tolerant of per-provider failure
//! - Persisting the collected answers as a single report file

pub mod cascade;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod probe;
pub mod providers;
pub mod question;
pub mod report;
pub mod types;

pub use config::Config;
pub use dispatch::DispatchOrchestrator;
pub use error::{DispatchError, PersistError, QueryError};
pub use probe::{ConnectivityProbe, StatusStore};
pub use providers::{ProviderAdapter, ProviderRegistry};
pub use question::read_question;
pub use types::{ConnectionStatus, CredentialPolicy, ProviderIdentity, RequestOutcome, ResultSet};
