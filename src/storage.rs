//! Catalog persistence.
//!
//! The catalog lives in a single pretty-printed JSON file holding the
//! `categories` and `products` collections. Writes go to a temporary file in
//! the same directory which then replaces the target, so a crash mid-write
//! never leaves a truncated catalog behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::errors::{ShopError, ShopResult};

/// Persistence collaborator used by the catalog store
pub trait CatalogStorage: Send {
    fn load(&self) -> ShopResult<Catalog>;
    fn save(&self, catalog: &Catalog) -> ShopResult<()>;
}

/// Catalog stored as a JSON file on disk
#[derive(Debug, Clone)]
pub struct JsonCatalogFile {
    path: PathBuf,
}

impl JsonCatalogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogStorage for JsonCatalogFile {
    /// Read the catalog, creating an empty one on first start
    fn load(&self) -> ShopResult<Catalog> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No catalog file found, creating an empty catalog");
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let catalog = Catalog::default();
            self.save(&catalog)?;
            return Ok(catalog);
        }

        let content = fs::read_to_string(&self.path)?;
        let catalog: Catalog = serde_json::from_str(&content)?;
        catalog
            .check_integrity()
            .map_err(|reason| ShopError::Storage(format!("{}: {reason}", self.path.display())))?;
        debug!(path = %self.path.display(), "Catalog file parsed");
        Ok(catalog)
    }

    fn save(&self, catalog: &Catalog) -> ShopResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp_file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(temp_file.as_file_mut(), catalog)?;
        temp_file.as_file_mut().write_all(b"\n")?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(&self.path)
            .map_err(|e| ShopError::Storage(e.error.to_string()))?;

        debug!(
            path = %self.path.display(),
            categories = catalog.categories.len(),
            products = catalog.products.len(),
            "Catalog saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("catalog.json");
        let storage = JsonCatalogFile::new(&path);

        let catalog = storage.load().unwrap();
        assert_eq!(catalog, Catalog::default());
        assert!(path.exists());
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "{ not json").unwrap();

        let result = JsonCatalogFile::new(&path).load();
        assert!(matches!(result, Err(ShopError::Storage(_))));
    }

    #[test]
    fn test_load_accepts_missing_collections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "{}").unwrap();

        let catalog = JsonCatalogFile::new(&path).load().unwrap();
        assert!(catalog.categories.is_empty());
        assert!(catalog.products.is_empty());
    }

    #[test]
    fn test_load_rejects_orphan_products_and_duplicate_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        let broken = [
            r#"{"categories": [], "products": [
                {"id": "prod_1", "category_id": "cat_gone", "name": "Cola", "description": "", "price": 2}
            ]}"#,
            r#"{"categories": [
                {"id": "cat_1", "name": "A", "description": ""},
                {"id": "cat_1", "name": "B", "description": ""}
            ], "products": []}"#,
            r#"{"categories": [{"id": "cat_1", "name": "A", "description": ""}], "products": [
                {"id": "prod_1", "category_id": "cat_1", "name": "Cola", "description": "", "price": 2},
                {"id": "prod_1", "category_id": "cat_1", "name": "Tea", "description": "", "price": 1}
            ]}"#,
        ];

        for content in broken {
            fs::write(&path, content).unwrap();
            let result = JsonCatalogFile::new(&path).load();
            assert!(matches!(result, Err(ShopError::Storage(_))), "{content}");
        }
    }
}
