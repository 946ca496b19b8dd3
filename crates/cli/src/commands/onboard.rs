//! `souschef onboard`: first-time setup.

use souschef_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🍳 Sous-Chef: First-Time Setup");
    println!("==============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Edit {} and add your API key", config_path.display());
        println!("      (or export GEMINI_API_KEY)");
        println!("   2. Run: souschef chat");
        println!("   3. Tell it what's in your kitchen!\n");
    }

    // Data directories for the memory bank and exported calendars
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    for dir in [
        config.memory.resolved_path().parent().map(|p| p.to_path_buf()),
        Some(config.calendar.resolved_dir()),
    ]
    .into_iter()
    .flatten()
    {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            println!("✅ Created {}", dir.display());
        }
    }

    println!("🎉 Setup complete! Run `souschef chat` to start cooking.\n");

    Ok(())
}
