pub mod check_config;
pub mod sanitize_url;
pub mod script;
pub mod simulate;

pub use check_config::CheckConfigCommand;
pub use sanitize_url::SanitizeUrlCommand;
pub use simulate::SimulateCommand;
