//! CLI commands

pub mod context;
pub mod inspect;
pub mod serve;

pub use inspect::{run_check_config, run_graph};
pub use serve::run_serve;
