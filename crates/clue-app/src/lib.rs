pub mod cgi;
pub mod config;
pub mod logging;
pub mod shell;

pub use cgi::CgiTransport;
pub use config::{AppConfig, ConfigError, ValidationError};
pub use shell::{Shell, ShellOptions};
