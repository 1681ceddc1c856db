//! automerge-bot: propagates pushes along configured merge directions
//!
//! When a commit lands on a branch that has merge directions configured, the
//! bot opens a pull request from a temporary branch into each destination and
//! merges it. Conflicts are handed over to the author with instructions, and
//! pull requests left open too long trigger reminders.

pub mod automerge;
pub mod cleanup;
pub mod config;
pub mod directions;
pub mod error;
pub mod governor;
pub mod notify;
pub mod platform;
pub mod server;
pub mod types;
pub mod webhook;

pub use error::{Error, Result};
