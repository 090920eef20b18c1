use super::Workspace;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use hmap_core::config::WarnLevel;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration and any warnings
    Show,
    /// Store the AI service API key
    SetKey {
        /// The key (reads HMAP_API_KEY when omitted)
        #[arg(env = "HMAP_API_KEY", hide_env_values = true)]
        key: String,
    },
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        ConfigSubcommand::Show => {
            let warnings = ws.config.validate();
            let has_key = ws.preferences().api_key().is_some();
            if json {
                print_json(&serde_json::json!({
                    "config": ws.config,
                    "warnings": warnings,
                    "api_key_set": has_key,
                }))?;
                return Ok(());
            }
            let yaml = serde_yaml::to_string(&ws.config).context("failed to render config")?;
            print!("{yaml}");
            println!("# api key: {}", if has_key { "set" } else { "not set" });
            for w in &warnings {
                let level = match w.level {
                    WarnLevel::Error => "error",
                    WarnLevel::Warning => "warning",
                };
                println!("# {level}: {}", w.message);
            }
            Ok(())
        }
        ConfigSubcommand::SetKey { key } => {
            if key.trim().is_empty() {
                anyhow::bail!("API key is empty");
            }
            if !ws.preferences().set_api_key(&key) {
                anyhow::bail!("failed to store the API key");
            }
            if json {
                print_json(&serde_json::json!({ "api_key_set": true }))?;
            } else {
                println!("API key stored in {}", hmap_core::paths::STORE_DIR);
            }
            Ok(())
        }
    }
}
