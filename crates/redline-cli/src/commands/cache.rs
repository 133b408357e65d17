//! Cache command - inspect or clear a result cache file.

use std::path::PathBuf;

use colored::Colorize;
use redline::{CacheConfig, ResultCache};

use crate::cli::CacheAction;

pub fn run(action: CacheAction, path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Cache file not found: {}", path.display()).into());
    }

    let cache = ResultCache::open(&path, CacheConfig::default());
    if !cache.stats().persistent {
        return Err(format!("Cache file is unreadable: {}", path.display()).into());
    }

    match action {
        CacheAction::Stats => {
            println!(
                "{} {}",
                "Cache".cyan().bold(),
                path.display().to_string().white()
            );
            println!("  Entries: {}", cache.len().to_string().white());
        }
        CacheAction::Clear => {
            let count = cache.len();
            cache.clear()?;
            println!(
                "{} {} entries from {}",
                "Cleared".green().bold(),
                count,
                path.display()
            );
        }
    }

    Ok(())
}
