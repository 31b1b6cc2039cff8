//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, path from --config)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CanaryConfig (validated, immutable)
//!     → consumed as plain data by the canary subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets are redacted before the config is logged

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::CanaryConfig;
pub use schema::{MetricsConfig, MySqlConfig, NotificationsConfig, SwitchboardConfig, TlsConfig};
