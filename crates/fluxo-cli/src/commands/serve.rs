//! Server command implementation

use std::path::Path;

use anyhow::Result;
use fluxo_core::ai::AiClient;

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Fluxo web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    let db = open_db(db_path)?;
    let ai = AiClient::from_env();

    let static_dir = static_dir.map(|p| p.to_string_lossy().into_owned());
    let app = fluxo_server::create_router(db, ai, static_dir.as_deref());

    fluxo_server::serve(app, &format!("{}:{}", host, port)).await
}
