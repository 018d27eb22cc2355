//! Administrative commands run against the gallery database.

use std::path::Path;

use chrono::{DateTime, Utc};
use gallery_core::ItemPool;
use gallery_db::{Gallery, effective_page_size};

type CliResult = Result<(), Box<dyn std::error::Error>>;

pub async fn seed(gallery: &Gallery, path: &Path) -> CliResult {
    let pool = ItemPool::load(path)?;
    gallery.seed_pool(&pool).await?;
    println!("Seeded {} items from {}.", pool.len(), path.display());
    Ok(())
}

pub async fn create_api_key(gallery: &Gallery, name: &str) -> CliResult {
    let raw_key = gallery.auth_store().create_api_key(name).await?;

    println!("API key for '{}':\n", name.trim());
    println!("  {raw_key}\n");
    println!("Store it now. It cannot be shown again.");
    Ok(())
}

pub async fn list_api_keys(gallery: &Gallery) -> CliResult {
    let keys = gallery.auth_store().list_api_keys().await?;
    if keys.is_empty() {
        println!("No API keys.");
        return Ok(());
    }

    for key in keys {
        let status = if key.is_active { "active" } else { "revoked" };
        let last_used = key
            .last_used_at
            .map(|at| format_time(&at))
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  {} {} [{}] created {} / last used {}",
            key.id,
            key.name,
            status,
            format_time(&key.created_at),
            last_used
        );
    }
    Ok(())
}

pub async fn list_items(gallery: &Gallery) -> CliResult {
    let items = gallery.display_pool_items().await?;
    if items.is_empty() {
        println!("The item catalog is empty. Run `gallery-cli seed` first.");
        return Ok(());
    }

    for item in items {
        let equippable = if item.equippable { " (equippable)" } else { "" };
        println!(
            "  {} {} [{}] rarity {}{}",
            item.id, item.name, item.item_type, item.rarity, equippable
        );
    }
    Ok(())
}

pub async fn list_characters(gallery: &Gallery, page: u32, limit: u32) -> CliResult {
    let result = gallery.get_all(page, limit).await?;
    let limit = effective_page_size(limit);
    let pages = result.total.div_ceil(u64::from(limit));

    println!(
        "=== Characters (page {} of {}, {} total) ===",
        page.saturating_add(1),
        pages.max(1),
        result.total
    );
    for character in result.characters {
        println!(
            "  {} {} - {} {} ({})",
            character.id, character.name, character.species, character.class, character.body_type
        );
    }
    Ok(())
}

fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
