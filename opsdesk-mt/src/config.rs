//! Service identity and configuration constants
//!
//! Root folder resolution itself lives in `opsdesk_common::config`; this
//! module pins the values that identify opsdesk-mt within the suite.

/// Fixed HTTP port for the Model Trainer service
pub const SERVICE_PORT: u16 = 5727;

/// Database file created inside the resolved root folder
pub const DATABASE_FILE: &str = "opsdesk-mt.db";

/// Environment variable consulted when no CLI root argument is given
pub const ROOT_FOLDER_ENV_VAR: &str = "OPSDESK_ROOT_FOLDER";

/// Broadcast capacity of the service event bus
pub const EVENT_BUS_CAPACITY: usize = 100;
