//! `ragchat config` handlers

use crate::cli::{load_config_with_overrides, ConfigInitArgs, ConfigShowArgs};
use crate::config::EXAMPLE_CONFIG;
use std::fs;

/// Write the annotated example configuration to `args.output`.
///
/// Missing parent directories are created. An existing file is only
/// replaced with `--force`.
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Edit [backend] url to point at your RAG backend, then run:");
    println!("  ragchat -c {} chat", args.output.display());

    Ok(())
}

/// Render the configuration a backend command would run with.
pub fn handle_config_show(args: &ConfigShowArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.connection)?;
    let body = toml::to_string_pretty(&config)?;
    let source = if args.connection.config.exists() {
        args.connection.config.display().to_string()
    } else {
        "defaults".to_string()
    };
    Ok(format!("# effective configuration ({})\n{}", source, body))
}
