pub mod config;
pub mod ping;
pub mod run;
pub mod serve;

// Re-export command functions for convenience
pub use config::{load_config, show_config};
pub use ping::ping;
pub use run::run;
pub use serve::serve;
