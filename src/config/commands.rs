//! Config command handlers

use anyhow::{Context, Result};
use colored::Colorize;

use super::Config;
use crate::translate::llm::SafetyThreshold;
use crate::translate::orchestrator::FanoutPolicy;
use crate::cli::{ConfigAction, ConfigArgs};

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(),
        ConfigAction::Init { force } => init_config(force),
        ConfigAction::Set { key, value } => set_config(&key, &value),
        ConfigAction::Get { key } => get_config(&key),
        ConfigAction::Path => show_path(),
        ConfigAction::Edit => edit_config(),
    }
}

fn show_config() -> Result<()> {
    let mut config = Config::load()?;
    for key in [
        &mut config.api.gemini_api_key,
        &mut config.api.openai_api_key,
        &mut config.api.anthropic_api_key,
    ] {
        *key = key.as_deref().map(mask_key);
    }
    let content = toml::to_string_pretty(&config)?;

    println!("{}", "[Config]".green());
    if let Some(path) = Config::config_path() {
        println!("  {}", path.display().to_string().dimmed());
    }
    println!("{}", content);

    let settings = config.translation.settings();
    println!(
        "  Chunked above {} chars, {} chars per chunk, {} attempt(s), {:?} fan-out",
        settings.chunk_threshold, settings.chunk_budget, settings.retry.max_attempts, settings.fanout
    );

    Ok(())
}

fn init_config(force: bool) -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if path.exists() && !force {
        println!(
            "{}",
            format!("Config file already exists: {}", path.display()).yellow()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = Config::default();
    let saved_path = config.save()?;

    println!("{}", "[Config] Initialized".green());
    println!("  Created: {}", saved_path.display());
    println!();
    println!("Edit the config file to set your API keys, or export GEMINI_API_KEY:");
    println!("  htmltrans config edit");

    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .ok()
        .with_context(|| format!("{} expects a number, got '{}'", key, value))
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;

    // Parse key path (e.g., "api.gemini_api_key")
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "output_dir"] => config.general.output_dir = optional(value),
        ["general", "verbose"] => config.general.verbose = value.parse().unwrap_or(false),
        ["api", "provider"] => config.api.provider = value.to_lowercase(),
        ["api", "gemini_api_key"] => config.api.gemini_api_key = optional(value),
        ["api", "gemini_api_base"] => config.api.gemini_api_base = optional(value),
        ["api", "gemini_model"] => config.api.gemini_model = optional(value),
        ["api", "openai_api_key"] => config.api.openai_api_key = optional(value),
        ["api", "openai_api_base"] => config.api.openai_api_base = optional(value),
        ["api", "openai_model"] => config.api.openai_model = optional(value),
        ["api", "anthropic_api_key"] => config.api.anthropic_api_key = optional(value),
        ["api", "anthropic_api_base"] => config.api.anthropic_api_base = optional(value),
        ["api", "anthropic_model"] => config.api.anthropic_model = optional(value),
        ["api", "safety"] => {
            config.api.safety = SafetyThreshold::parse(value).with_context(|| {
                format!(
                    "{} expects block_none, block_only_high or block_medium_and_above, got '{}'",
                    key, value
                )
            })?
        }
        ["api", "ollama_api_base"] => config.api.ollama_api_base = value.to_string(),
        ["api", "ollama_model"] => config.api.ollama_model = value.to_string(),
        ["translation", "default_language"] => {
            config.translation.default_language = value.to_string()
        }
        ["translation", "domain_hint"] => config.translation.domain_hint = optional(value),
        ["translation", "chunk_threshold"] => {
            config.translation.chunk_threshold = number(key, value)?
        }
        ["translation", "chunk_budget"] => config.translation.chunk_budget = number(key, value)?,
        ["translation", "max_attempts"] => config.translation.max_attempts = number(key, value)?,
        ["translation", "retry_base_delay_ms"] => {
            config.translation.retry_base_delay_ms = number(key, value)?
        }
        ["translation", "chunk_delay_ms"] => {
            config.translation.chunk_delay_ms = number(key, value)?
        }
        ["translation", "request_timeout_secs"] => {
            config.translation.request_timeout_secs = number(key, value)?
        }
        ["translation", "document_timeout_secs"] => {
            config.translation.document_timeout_secs = number(key, value)?
        }
        ["translation", "fanout"] => {
            config.translation.fanout = FanoutPolicy::parse(value).with_context(|| {
                format!("{} expects sequential or parallel, got '{}'", key, value)
            })?
        }
        ["translation", "cache"] => config.translation.cache = value.parse().unwrap_or(true),
        ["translation", "job_attempts"] => {
            config.translation.job_attempts = number(key, value)?
        }
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }

    config.save()?;
    let shown = if key.ends_with("_api_key") {
        mask_key(value)
    } else {
        value.to_string()
    };
    println!("{}", format!("[Config] Set {} = {}", key, shown).green());

    Ok(())
}

fn get_config(key: &str) -> Result<()> {
    let config = Config::load()?;
    let parts: Vec<&str> = key.split('.').collect();
    let t = &config.translation;

    let value: Option<String> = match parts.as_slice() {
        ["general", "output_dir"] => config.general.output_dir.clone(),
        ["general", "verbose"] => Some(config.general.verbose.to_string()),
        ["api", "provider"] => Some(config.api.provider.clone()),
        ["api", "gemini_api_key"] => config.api.gemini_api_key.as_deref().map(mask_key),
        ["api", "gemini_api_base"] => config.api.gemini_api_base.clone(),
        ["api", "gemini_model"] => config.api.gemini_model.clone(),
        ["api", "openai_api_key"] => config.api.openai_api_key.as_deref().map(mask_key),
        ["api", "openai_api_base"] => config.api.openai_api_base.clone(),
        ["api", "openai_model"] => config.api.openai_model.clone(),
        ["api", "anthropic_api_key"] => config.api.anthropic_api_key.as_deref().map(mask_key),
        ["api", "anthropic_api_base"] => config.api.anthropic_api_base.clone(),
        ["api", "anthropic_model"] => config.api.anthropic_model.clone(),
        ["api", "safety"] => Some(config.api.safety.name().to_string()),
        ["api", "ollama_api_base"] => Some(config.api.ollama_api_base.clone()),
        ["api", "ollama_model"] => Some(config.api.ollama_model.clone()),
        ["translation", "default_language"] => Some(t.default_language.clone()),
        ["translation", "domain_hint"] => t.domain_hint.clone(),
        ["translation", "chunk_threshold"] => Some(t.chunk_threshold.to_string()),
        ["translation", "chunk_budget"] => Some(t.chunk_budget.to_string()),
        ["translation", "max_attempts"] => Some(t.max_attempts.to_string()),
        ["translation", "retry_base_delay_ms"] => Some(t.retry_base_delay_ms.to_string()),
        ["translation", "chunk_delay_ms"] => Some(t.chunk_delay_ms.to_string()),
        ["translation", "request_timeout_secs"] => Some(t.request_timeout_secs.to_string()),
        ["translation", "document_timeout_secs"] => Some(t.document_timeout_secs.to_string()),
        ["translation", "fanout"] => Some(format!("{:?}", t.fanout).to_lowercase()),
        ["translation", "cache"] => Some(t.cache.to_string()),
        ["translation", "job_attempts"] => Some(t.job_attempts.to_string()),
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    };

    match value {
        Some(v) => println!("{} = {}", key, v),
        None => println!("{} = (not set)", key),
    }

    Ok(())
}

fn show_path() -> Result<()> {
    match Config::config_path() {
        Some(path) => {
            println!("{}", path.display());
            if path.exists() {
                println!("{}", "(exists)".green());
            } else {
                println!("{}", "(not created)".yellow());
            }
        }
        None => {
            println!("{}", "Could not determine config path".red());
        }
    }
    Ok(())
}

fn edit_config() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    // Create default config if it doesn't exist
    if !path.exists() {
        let config = Config::default();
        config.save()?;
        println!("{}", "[Config] Created default config".green());
    }

    // Get editor from environment
    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Opening config with: {}", editor);
    println!("Path: {}", path.display());

    std::process::Command::new(&editor)
        .arg(&path)
        .status()
        .context(format!("Failed to open editor: {}", editor))?;

    Ok(())
}

fn mask_key(key: &str) -> String {
    if key.len() <= 8 {
        "*".repeat(key.len())
    } else {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "*****");
        assert_eq!(mask_key("AIzaSyExampleKey1234"), "AIza...1234");
    }

    #[test]
    fn test_number_rejects_text() {
        assert_eq!(number::<u32>("translation.max_attempts", "4").unwrap(), 4);
        let err = number::<u32>("translation.max_attempts", "four").unwrap_err();
        assert!(err.to_string().contains("expects a number"));
    }

    #[test]
    fn test_policy_names_are_checked() {
        assert_eq!(FanoutPolicy::parse("Parallel"), Some(FanoutPolicy::Parallel));
        assert_eq!(FanoutPolicy::parse("sideways"), None);
        assert_eq!(
            SafetyThreshold::parse("block_only_high"),
            Some(SafetyThreshold::BlockOnlyHigh)
        );
        assert_eq!(SafetyThreshold::parse("strict"), None);
    }

    #[test]
    fn test_optional_empty_clears() {
        assert_eq!(optional(""), None);
        assert_eq!(optional("travel").as_deref(), Some("travel"));
    }
}
