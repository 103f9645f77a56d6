use std::path::Path;

use anyhow::{anyhow, Result};

use scrollcue_core::MotionConfig;

/// Print the effective configuration, or write defaults with `init`
pub fn run(config: &MotionConfig, path: &Path, init: bool) -> Result<()> {
    if init {
        if path.exists() {
            return Err(anyhow!(
                "Config file already exists at {}. Remove it first to regenerate.",
                path.display()
            ));
        }
        MotionConfig::default().save_to(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    print!("{}", config.to_toml()?);
    Ok(())
}
