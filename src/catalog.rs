//! # Catalog Module
//!
//! In-memory representation of the shop catalog and the mutation API used by
//! the admin flows. Every mutation is staged on a copy of the catalog, saved
//! through the [`CatalogStorage`] collaborator and only then swapped in, so a
//! failed write leaves the live catalog untouched.

use std::collections::HashSet;

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{ShopError, ShopResult};
use crate::storage::CatalogStorage;

/// Highest accepted product price, in whole currency units
pub const MAX_PRICE: u32 = 1_000_000;
/// Prices carry at most cents
pub const PRICE_DECIMALS: u32 = 2;

/// Prices are stored as JSON numbers: the bounds keep them exact through an `f64`.
pub fn is_valid_price(price: Decimal) -> bool {
    price >= Decimal::ZERO
        && price <= Decimal::from(MAX_PRICE)
        && price.normalize().scale() <= PRICE_DECIMALS
}

/// A named grouping of products
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Kind of media attached to a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

/// Opaque transport file handle plus its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    pub kind: MediaKind,
}

/// A catalog item belonging to exactly one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ProductRecord", into = "ProductRecord")]
pub struct Product {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub media: Option<Media>,
    /// `None` means stock is not tracked
    pub stock: Option<u32>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock.map_or(true, |stock| stock > 0)
    }
}

/// On-disk layout of a product: media is stored as two flat nullable fields
/// and the price as a JSON number.
#[derive(Serialize, Deserialize)]
struct ProductRecord {
    id: String,
    category_id: String,
    name: String,
    description: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    #[serde(default)]
    media_id: Option<String>,
    #[serde(default)]
    media_type: Option<MediaKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stock: Option<u32>,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        let media = record.media_id.map(|id| Media {
            id,
            kind: record.media_type.unwrap_or(MediaKind::Photo),
        });
        Product {
            id: record.id,
            category_id: record.category_id,
            name: record.name,
            description: record.description,
            price: record.price,
            media,
            stock: record.stock,
        }
    }
}

impl From<Product> for ProductRecord {
    fn from(product: Product) -> Self {
        let (media_id, media_type) = match product.media {
            Some(media) => (Some(media.id), Some(media.kind)),
            None => (None, None),
        };
        ProductRecord {
            id: product.id,
            category_id: product.category_id,
            name: product.name,
            description: product.description,
            price: product.price,
            media_id,
            media_type,
            stock: product.stock,
        }
    }
}

/// Fields collected by the product creation dialogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub media: Option<Media>,
}

/// Aggregate root: categories and products in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn find_category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn find_product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Products of a category, in display order. Empty for unknown ids.
    pub fn products_in_category(&self, category_id: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.category_id == category_id)
            .collect()
    }

    pub fn price_of(&self, product_id: &str) -> Option<Decimal> {
        self.find_product(product_id).map(|p| p.price)
    }

    /// First broken invariant found: duplicate ids, orphan products or an
    /// out-of-range price
    pub fn check_integrity(&self) -> Result<(), String> {
        let mut category_ids = HashSet::new();
        for category in &self.categories {
            if !category_ids.insert(category.id.as_str()) {
                return Err(format!("duplicate category id {}", category.id));
            }
        }

        let mut product_ids = HashSet::new();
        for product in &self.products {
            if !product_ids.insert(product.id.as_str()) {
                return Err(format!("duplicate product id {}", product.id));
            }
            if !category_ids.contains(product.category_id.as_str()) {
                return Err(format!(
                    "product {} references unknown category {}",
                    product.id, product.category_id
                ));
            }
            if !is_valid_price(product.price) {
                return Err(format!("product {} has invalid price {}", product.id, product.price));
            }
        }
        Ok(())
    }
}

/// Generate `<prefix>_<8 hex digits>` not yet used in the catalog
fn fresh_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id = format!("{prefix}_{:08x}", rng.gen::<u32>());
        if !taken(&id) {
            return id;
        }
        debug!(id = %id, "Generated identifier already taken, retrying");
    }
}

/// Owner of the catalog lifecycle
pub struct CatalogStore {
    catalog: Catalog,
    storage: Box<dyn CatalogStorage>,
}

impl CatalogStore {
    /// Load the catalog through `storage` and keep it as the write target
    pub fn open(storage: impl CatalogStorage + 'static) -> ShopResult<Self> {
        let catalog = storage.load()?;
        info!(
            categories = catalog.categories.len(),
            products = catalog.products.len(),
            "Catalog loaded"
        );
        Ok(Self::new(catalog, storage))
    }

    pub fn new(catalog: Catalog, storage: impl CatalogStorage + 'static) -> Self {
        Self {
            catalog,
            storage: Box::new(storage),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn find_category(&self, id: &str) -> Option<&Category> {
        self.catalog.find_category(id)
    }

    pub fn find_product(&self, id: &str) -> Option<&Product> {
        self.catalog.find_product(id)
    }

    pub fn products_in_category(&self, category_id: &str) -> Vec<&Product> {
        self.catalog.products_in_category(category_id)
    }

    fn commit(&mut self, staged: Catalog) -> ShopResult<()> {
        self.storage.save(&staged)?;
        self.catalog = staged;
        Ok(())
    }

    pub fn create_category(&mut self, name: &str) -> ShopResult<Category> {
        let id = fresh_id("cat", |id| self.catalog.find_category(id).is_some());
        let category = Category {
            id,
            name: name.to_string(),
            description: format!("Catégorie {name}"),
        };

        let mut staged = self.catalog.clone();
        staged.categories.push(category.clone());
        self.commit(staged)?;

        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Remove a category together with all of its products.
    ///
    /// Returns the removed category and the number of products dropped with it.
    pub fn delete_category(&mut self, id: &str) -> ShopResult<(Category, usize)> {
        let category = self
            .catalog
            .find_category(id)
            .cloned()
            .ok_or_else(|| ShopError::category_not_found(id))?;

        let mut staged = self.catalog.clone();
        let before = staged.products.len();
        staged.products.retain(|p| p.category_id != id);
        let removed = before - staged.products.len();
        staged.categories.retain(|c| c.id != id);
        self.commit(staged)?;

        info!(category_id = %id, products_removed = removed, "Category deleted");
        Ok((category, removed))
    }

    pub fn create_product(&mut self, fields: NewProduct) -> ShopResult<Product> {
        if self.catalog.find_category(&fields.category_id).is_none() {
            return Err(ShopError::Validation(format!(
                "unknown category {}",
                fields.category_id
            )));
        }
        if !is_valid_price(fields.price) {
            return Err(ShopError::Validation(format!("price out of range: {}", fields.price)));
        }

        let product = Product {
            id: fresh_id("prod", |id| self.catalog.find_product(id).is_some()),
            category_id: fields.category_id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            media: fields.media,
            stock: None,
        };

        let mut staged = self.catalog.clone();
        staged.products.push(product.clone());
        self.commit(staged)?;

        info!(
            product_id = %product.id,
            category_id = %product.category_id,
            price = %product.price,
            "Product created"
        );
        Ok(product)
    }

    pub fn delete_product(&mut self, id: &str) -> ShopResult<Product> {
        let product = self
            .catalog
            .find_product(id)
            .cloned()
            .ok_or_else(|| ShopError::product_not_found(id))?;

        let mut staged = self.catalog.clone();
        staged.products.retain(|p| p.id != id);
        self.commit(staged)?;

        info!(product_id = %id, "Product deleted");
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonCatalogFile;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> CatalogStore {
        CatalogStore::new(
            Catalog::default(),
            JsonCatalogFile::new(dir.path().join("catalog.json")),
        )
    }

    fn new_product(category_id: &str, name: &str, price: &str) -> NewProduct {
        NewProduct {
            category_id: category_id.to_string(),
            name: name.to_string(),
            description: format!("{name} description"),
            price: Decimal::from_str(price).unwrap(),
            media: None,
        }
    }

    #[test]
    fn test_create_category_generates_prefixed_id() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let category = store.create_category("Drinks").unwrap();
        assert!(category.id.starts_with("cat_"));
        assert_eq!(category.id.len(), "cat_".len() + 8);
        assert_eq!(category.description, "Catégorie Drinks");
        assert_eq!(store.catalog().categories, vec![category]);
    }

    #[test]
    fn test_delete_category_cascades_to_products() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let drinks = store.create_category("Drinks").unwrap();
        let snacks = store.create_category("Snacks").unwrap();
        store.create_product(new_product(&drinks.id, "Cola", "2.50")).unwrap();
        store.create_product(new_product(&drinks.id, "Water", "1")).unwrap();
        let chips = store.create_product(new_product(&snacks.id, "Chips", "3")).unwrap();

        let (deleted, removed) = store.delete_category(&drinks.id).unwrap();
        assert_eq!(deleted.name, "Drinks");
        assert_eq!(removed, 2);
        assert!(store.products_in_category(&drinks.id).is_empty());
        assert!(store
            .catalog()
            .products
            .iter()
            .all(|p| p.category_id != drinks.id));
        assert_eq!(store.catalog().products, vec![chips]);
    }

    #[test]
    fn test_delete_unknown_entities_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        assert!(matches!(
            store.delete_category("cat_missing"),
            Err(ShopError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_product("prod_missing"),
            Err(ShopError::NotFound { .. })
        ));
    }

    #[test]
    fn test_create_product_requires_existing_category() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let result = store.create_product(new_product("cat_ghost", "Cola", "2"));
        assert!(matches!(result, Err(ShopError::Validation(_))));
        assert!(store.catalog().products.is_empty());
    }

    #[test]
    fn test_create_product_rejects_negative_price() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let drinks = store.create_category("Drinks").unwrap();

        let result = store.create_product(new_product(&drinks.id, "Cola", "-1"));
        assert!(matches!(result, Err(ShopError::Validation(_))));

        let free = store.create_product(new_product(&drinks.id, "Tap water", "0"));
        assert!(free.is_ok());
    }

    #[test]
    fn test_create_product_rejects_out_of_range_prices() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let drinks = store.create_category("Drinks").unwrap();

        for price in ["1000000.01", "79228162514264337593543950335", "1.999"] {
            let result = store.create_product(new_product(&drinks.id, "Cola", price));
            assert!(matches!(result, Err(ShopError::Validation(_))), "{price}");
        }
        assert_eq!(store.catalog().products.len(), 0);

        assert!(store.create_product(new_product(&drinks.id, "Gold", "1000000")).is_ok());
        assert!(store.create_product(new_product(&drinks.id, "Gum", "0.10")).is_ok());
    }

    #[test]
    fn test_integrity_check_reports_broken_invariants() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let drinks = store.create_category("Drinks").unwrap();
        store.create_product(new_product(&drinks.id, "Cola", "2")).unwrap();
        assert_eq!(store.catalog().check_integrity(), Ok(()));

        let mut duplicated = store.catalog().clone();
        duplicated.categories.push(drinks.clone());
        assert!(duplicated.check_integrity().unwrap_err().contains("duplicate category"));

        let mut orphaned = store.catalog().clone();
        orphaned.products[0].category_id = "cat_gone".to_string();
        assert!(orphaned.check_integrity().unwrap_err().contains("unknown category"));

        let mut twice = store.catalog().clone();
        twice.products.push(twice.products[0].clone());
        assert!(twice.check_integrity().unwrap_err().contains("duplicate product"));

        let mut pricey = store.catalog().clone();
        pricey.products[0].price = Decimal::MAX;
        assert!(pricey.check_integrity().unwrap_err().contains("invalid price"));
    }

    #[test]
    fn test_lookups_return_none_on_miss() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.find_category("cat_nope").is_none());
        assert!(store.find_product("prod_nope").is_none());
        assert!(store.products_in_category("cat_nope").is_empty());
    }

    #[test]
    fn test_failed_save_leaves_catalog_untouched() {
        let dir = TempDir::new().unwrap();
        let unwritable = dir.path().join("missing-dir").join("catalog.json");
        let mut store = CatalogStore::new(Catalog::default(), JsonCatalogFile::new(unwritable));

        let result = store.create_category("Drinks");
        assert!(matches!(result, Err(ShopError::Storage(_))));
        assert!(store.catalog().categories.is_empty());
    }

    #[test]
    fn test_product_record_keeps_flat_media_fields() {
        let json = r#"{
            "id": "prod_00000001",
            "category_id": "cat_00000001",
            "name": "Cola",
            "description": "Fizzy",
            "price": 2.5,
            "media_id": "AgADBAAD",
            "media_type": "video"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(
            product.media,
            Some(Media {
                id: "AgADBAAD".to_string(),
                kind: MediaKind::Video
            })
        );
        assert!(product.in_stock());

        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["media_type"], "video");
        assert!(value.get("stock").is_none());
    }

    #[test]
    fn test_zero_stock_is_out_of_stock() {
        let json = r#"{"id":"prod_1","category_id":"cat_1","name":"A","description":"B",
            "price":1,"media_id":null,"media_type":null,"stock":0}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.media.is_none());
        assert!(!product.in_stock());
    }
}
