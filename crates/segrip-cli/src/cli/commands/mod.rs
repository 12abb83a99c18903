//! CLI command handlers, one file per command.

mod check;
mod encoders;
mod fetch;

pub use check::run_check;
pub use encoders::run_encoders;
pub use fetch::run_fetch;
