//! Ingredient catalog service.

use std::collections::HashSet;
use std::io::Read;

use foodgram_common::{AppError, AppResult, IdGenerator};
use foodgram_db::{entities::ingredient, repositories::IngredientRepository};
use sea_orm::Set;

/// Rows per bulk insert statement.
const INSERT_CHUNK: usize = 1000;

/// Result of a catalog import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The catalog already had entries; nothing was imported.
    Skipped,
    /// This many entries were inserted.
    Loaded(u64),
}

/// Ingredient service for catalog lookups and bulk loading.
#[derive(Clone)]
pub struct IngredientService {
    ingredient_repo: IngredientRepository,
    id_gen: IdGenerator,
}

impl IngredientService {
    /// Create a new ingredient service.
    #[must_use]
    pub const fn new(ingredient_repo: IngredientRepository) -> Self {
        Self {
            ingredient_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Catalog entries whose name starts with `name` (case-insensitive).
    pub async fn search(&self, name: Option<&str>) -> AppResult<Vec<ingredient::Model>> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        self.ingredient_repo.search(name).await
    }

    /// Get an ingredient by ID.
    pub async fn get(&self, id: &str) -> AppResult<ingredient::Model> {
        self.ingredient_repo.get_by_id(id).await
    }

    /// Import a headerless `name,measurement_unit` CSV into an empty catalog.
    ///
    /// A non-empty catalog is left untouched. Duplicate rows within the file
    /// are imported once.
    pub async fn load_csv<R: Read>(&self, reader: R) -> AppResult<LoadOutcome> {
        let existing = self.ingredient_repo.count().await?;
        if existing > 0 {
            tracing::info!(existing, "Ingredient catalog already populated, skipping import");
            return Ok(LoadOutcome::Skipped);
        }

        let rows = parse_catalog(reader)?;
        let mut loaded = 0;
        for chunk in rows.chunks(INSERT_CHUNK) {
            let models = chunk
                .iter()
                .map(|(name, unit)| ingredient::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    name: Set(name.clone()),
                    measurement_unit: Set(unit.clone()),
                })
                .collect();
            loaded += self.ingredient_repo.insert_many(models).await?;
        }

        tracing::info!(loaded, "Ingredient catalog imported");
        Ok(LoadOutcome::Loaded(loaded))
    }
}

fn parse_catalog<R: Read>(reader: R) -> AppResult<Vec<(String, String)>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for (line, record) in csv_reader.records().enumerate() {
        let record = record
            .map_err(|e| AppError::BadRequest(format!("Invalid CSV at row {}: {e}", line + 1)))?;

        let (Some(name), Some(unit)) = (record.get(0), record.get(1)) else {
            return Err(AppError::BadRequest(format!(
                "Row {} must have a name and a measurement unit",
                line + 1
            )));
        };
        if name.is_empty() || unit.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Row {} has an empty name or measurement unit",
                line + 1
            )));
        }

        let entry = (name.to_string(), unit.to_string());
        if seen.insert(entry.clone()) {
            rows.push(entry);
        }
    }

    Ok(rows)
}
