use anyhow::Result;
use colored::Colorize;
use thio_core::ChatConfig;
use thio_interaction::OllamaAdapter;

use super::is_active_model;

pub async fn list(config: &ChatConfig) -> Result<()> {
    let adapter = OllamaAdapter::from_config(config);
    let models = adapter.list_available_models().await;

    if models.is_empty() {
        println!(
            "{}",
            format!("No models found at {}", config.ollama.base_url).bright_black()
        );
        return Ok(());
    }

    let active = adapter.model();
    for model in models {
        if is_active_model(&model, &active) {
            println!("{} {}", "*".green(), model.green());
        } else {
            println!("  {}", model);
        }
    }
    Ok(())
}
