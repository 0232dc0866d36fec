//! CLI command handlers module
//!
//! One handler per subcommand:
//! - **train**: offline classifier training
//! - **run**: the bot pass, once or on an interval

pub mod run;
pub mod train;

pub use run::*;
pub use train::*;
