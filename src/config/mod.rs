//! Layered configuration.
//!
//! Tiers, lowest to highest, merged field by field:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/kanban/config.yaml`
//! 3. **User** - `~/.kanban/config.yaml`
//! 4. **Environment** - `KANBAN_*` variables
//!
//! ## Environment Variables
//! - `KANBAN_CONFIG_PATH` - Explicit config file (overrides all tiers)
//! - `KANBAN_DB_PATH` - Database path
//! - `KANBAN_HOST` - Bind host
//! - `KANBAN_PORT` - Bind port
//! - `KANBAN_LOG_LEVEL` - Log level
//! - `KANBAN_USER_DIR` - User config dir (default: `~/.kanban`)
//! - `KANBAN_PROJECT_DIR` - Project config dir (default: `./kanban`)

mod loader;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use types::*;
