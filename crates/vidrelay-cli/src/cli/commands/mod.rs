//! CLI command handlers, one per file.

mod check;
mod fetch;
mod serve;

pub use check::run_check;
pub use fetch::run_fetch;
pub use serve::run_serve;
