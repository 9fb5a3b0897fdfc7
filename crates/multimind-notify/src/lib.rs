//! Notification forwarding for multimind
//!
//! Best-effort delivery of a saved report to a chat sink. Forwarding
//! failures are surfaced to the caller but never invalidate the artifact
//! that was already persisted.

pub mod telegram;

pub use telegram::{ForwardError, TelegramNotifier};
