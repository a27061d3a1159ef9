// Configuration management module
// TOML settings on disk plus per-session credentials held in memory

pub mod credentials;
pub mod interactive;
pub mod settings;

pub use credentials::{Credentials, CredentialsError, PartialCredentials};
pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, OpenAiConfig, PineconeConfig, RecommendConfig};

