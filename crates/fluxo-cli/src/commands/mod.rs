//! Command implementations

mod import;
mod serve;
mod status;

pub use import::cmd_import;
pub use serve::cmd_serve;
pub use status::{cmd_init, cmd_status};

use std::path::Path;

use anyhow::{Context, Result};
use fluxo_core::db::Database;

pub(crate) fn open_db(path: &Path) -> Result<Database> {
    Database::new(&path.to_string_lossy())
        .with_context(|| format!("Failed to open database: {}", path.display()))
}
