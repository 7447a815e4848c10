pub mod annotations;
pub mod config;
pub mod error;
pub mod rename;
pub mod utils;

pub use config::{get_config, init, set_config, Config};
pub use rename::RenameSettings;

#[cfg(test)]
pub mod test_utils;
