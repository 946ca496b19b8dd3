//! `souschef pantry`: print the pantry straight from the memory bank.

use souschef_config::AppConfig;
use souschef_core::memory::StateStore;
use souschef_memory::JsonFileStore;

use crate::render;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = JsonFileStore::new(config.memory.resolved_path());
    let bank = store
        .load()
        .await
        .map_err(|e| format!("Failed to read memory bank: {e}"))?;

    println!("Pantry ({} items)", bank.pantry.len());
    println!("{}", render::pantry(bank.pantry.iter()));

    Ok(())
}
