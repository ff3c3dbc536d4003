//! `perspective config` — Configuration management commands.

use perspective_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   Config parsed successfully");

            if !config.has_api_key() {
                println!();
                println!(
                    "   Warning: no API key set (set PERSPECTIVE_API_KEY or CLOUDHEALTH_API_KEY, or pass --api-key)"
                );
            }

            println!();
            println!("   API:        {}", config.api.base_url);
            println!("   Timeout:    {}s", config.api.timeout_secs);
            println!("   Separator:  {}", config.report.separator_width);
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}
