//! Configuration module

mod settings;

pub use settings::Config;
pub use settings::ContentConfig;
pub use settings::ServerConfig;
