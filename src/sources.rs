use anyhow::Result;

use crate::config::Config;

/// Print the configured data sources and their health.
pub fn list_sources(config: &Config) -> Result<()> {
    let catalog_status = if config.catalog.path.exists() {
        ("OK".to_string(), true)
    } else if config.catalog.seed_fallback {
        ("SEED FIXTURE (catalog file missing)".to_string(), true)
    } else {
        ("NOT FOUND".to_string(), false)
    };

    let storage_status = match &config.storage {
        Some(storage) => {
            let creds = std::env::var("AWS_ACCESS_KEY_ID").is_ok()
                && std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
            if creds {
                (format!("OK (bucket {})", storage.bucket), true)
            } else {
                ("NO CREDENTIALS (set AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY)".to_string(), false)
            }
        }
        None => ("NOT CONFIGURED (in-memory fallback)".to_string(), false),
    };

    println!("{:<10} {:<56} HEALTHY", "SOURCE", "STATUS");
    println!("{:<10} {:<56} {}", "catalog", catalog_status.0, catalog_status.1);
    println!("{:<10} {:<56} {}", "storage", storage_status.0, storage_status.1);

    println!();
    println!(
        "viewer chain: {}",
        config.viewer.strategies.join(" -> ")
    );

    Ok(())
}
