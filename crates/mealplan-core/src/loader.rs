//! Bulk loading of catalog foods from a JSON data file.
//!
//! The file holds an array of food objects:
//!
//! ```json
//! [{"name": "Apple", "category": "Fruit", "calories": 52, "allergens": []}]
//! ```
//!
//! A missing file can be replaced by a generated starter catalog, see
//! [`crate::seed`].

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{debug, info};

use mealplan_db::queries::foods;

use crate::catalog::service::{FoodInput, create_food};
use crate::embedding::Embedder;
use crate::seed;

/// Outcome of a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: usize,
    /// Records whose name was already in the catalog.
    pub skipped: usize,
}

/// Parse the contents of a food data file.
pub fn parse_food_records(json: &str) -> Result<Vec<FoodInput>> {
    serde_json::from_str(json).context("failed to parse food records")
}

/// Insert `records`, skipping any whose name already exists in the catalog.
///
/// Records are processed in order, so a name repeated within `records` is
/// inserted once.
pub async fn load_foods(
    pool: &PgPool,
    embedder: &dyn Embedder,
    records: &[FoodInput],
) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();

    for record in records {
        let name = record.name.trim();
        if foods::get_food_by_name(pool, name).await?.is_some() {
            debug!(name, "food already present, skipping");
            summary.skipped += 1;
            continue;
        }
        create_food(pool, embedder, record)
            .await
            .with_context(|| format!("failed to load food {name:?}"))?;
        summary.inserted += 1;
    }

    info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        "loaded foods"
    );
    Ok(summary)
}

/// Read a food data file and load it.
pub async fn load_foods_from_file(
    pool: &PgPool,
    embedder: &dyn Embedder,
    path: &Path,
) -> Result<LoadSummary> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records = parse_food_records(&json).with_context(|| format!("in {}", path.display()))?;
    load_foods(pool, embedder, &records).await
}

/// Generate a starter catalog and write it to `path`, creating parent
/// directories. Returns the number of records written.
pub async fn write_generated_foods(path: &Path) -> Result<usize> {
    let records = seed::generate_food_records(&mut rand::rng());
    let json = seed::render_food_records(&records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(count = records.len(), path = %path.display(), "generated food data file");
    Ok(records.len())
}

/// Like [`load_foods_from_file`], but a missing file is first generated
/// with [`write_generated_foods`].
pub async fn load_or_generate_foods(
    pool: &PgPool,
    embedder: &dyn Embedder,
    path: &Path,
) -> Result<LoadSummary> {
    let exists = tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("failed to check {}", path.display()))?;
    if !exists {
        info!(path = %path.display(), "food data file not found, generating one");
        write_generated_foods(path).await?;
    }
    load_foods_from_file(pool, embedder, path).await
}
