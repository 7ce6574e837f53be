pub mod analysis;

pub use analysis::{Config, read_config_file};
