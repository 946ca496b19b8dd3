//! `souschef status`: show configuration and memory bank summary.

use souschef_config::AppConfig;
use souschef_core::memory::{Sentiment, StateStore};
use souschef_memory::JsonFileStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let memory_path = config.memory.resolved_path();

    println!("Sous-Chef Status");
    println!("================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", souschef_providers::resolve_model(&config));
    println!("  Temperature:  {}", config.default_temperature);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  User:         {}", config.user_id);
    println!("  Tool retries: {}", config.dispatch.max_tool_retries);
    println!("  History:      {} messages", config.dispatch.history_limit);
    println!("  Calendars:    {}", config.calendar.resolved_dir().display());
    println!("  Memory bank:  {}", memory_path.display());

    match JsonFileStore::new(&memory_path).load().await {
        Ok(bank) => {
            println!("  Pantry:       {} items", bank.pantry.len());
            println!(
                "  Feedback:     {} liked, {} disliked",
                bank.recipes_with(Sentiment::Liked).len(),
                bank.recipes_with(Sentiment::Disliked).len()
            );
        }
        Err(e) => println!("\n  ⚠️  Memory bank unreadable: {e}"),
    }

    // Check config file existence
    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, run `souschef onboard` first");
    }

    Ok(())
}
