use anyhow::Result;

use crate::cli::output::create_spinner;
use crate::domain::ports::TextGenerator;
use crate::infrastructure::gemini::GeminiClient;

/// Probe the configured model with a minimal request and report whether
/// quota remains. On exhaustion, probe the catalog for an alternative.
pub async fn execute(config_path: Option<&str>, json: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let client = GeminiClient::new(&config.generator, &config.retry, &config.rate_limit)?;

    let spinner = create_spinner(format!("检测模型 {} 的配额...", config.generator.model));
    let status = client.check_quota().await?;
    spinner.finish_and_clear();

    let alternative = if status.available {
        None
    } else {
        let spinner = create_spinner("配额已用尽，正在探测可用的替代模型...");
        let found = client.find_available_model().await;
        spinner.finish_and_clear();
        found
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "model": status.model,
                "available": status.available,
                "message": status.message,
                "alternative": alternative,
            })
        );
    } else if status.available {
        println!("✅ 模型 {} 可用", status.model);
    } else {
        println!("❌ 模型 {} 配额已用尽", status.model);
        println!("   {}", status.message);
        match alternative {
            Some(model) => println!("   可改用模型：{model}"),
            None => println!("   当前没有可用的替代模型，请等待配额重置"),
        }
    }
    Ok(())
}
