//! pagediff command-line front end: configuration, commands and the
//! change-description client.

pub mod commands;
pub mod config;
pub mod describer;

pub use commands::Context;
pub use config::{resolve_output_dir, DescriberConfig};
pub use describer::{DescribeError, DescriptionClient};
