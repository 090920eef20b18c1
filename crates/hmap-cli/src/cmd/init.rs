use crate::output::print_json;
use anyhow::Context;
use hmap_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    for dir in [paths::HMAP_DIR, paths::STORE_DIR, paths::EXPORTS_DIR] {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let created = !paths::config_path(root).exists();
    if created {
        Config::new()
            .save(root)
            .context("failed to write config.yaml")?;
    }

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "config_created": created,
        }))?;
    } else {
        println!("Initializing hmap in: {}", root.display());
        if created {
            println!("  created: {}", paths::CONFIG_FILE);
        } else {
            println!("  exists:  {}", paths::CONFIG_FILE);
        }
        println!("  store:   {}", paths::STORE_DIR);
        println!("\nNext: hmap project create <id> --name <name> --start <date> --end <date>");
    }
    Ok(())
}
