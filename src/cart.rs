//! Per-user shopping carts.
//!
//! Carts live in memory only and are created lazily on first access. A cart
//! line always has a quantity of at least one: removing the last unit drops
//! the line.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::catalog::{Catalog, Product};
use crate::errors::{ShopError, ShopResult};

pub type ShopperId = u64;

/// `price × quantity`, refused when it does not fit a `Decimal`
pub fn line_total(price: Decimal, quantity: u32) -> ShopResult<Decimal> {
    price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| ShopError::Validation("cart amount out of range".to_string()))
}

/// Sum of line totals, refused on overflow
pub fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> ShopResult<Decimal> {
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total
            .checked_add(amount)
            .ok_or_else(|| ShopError::Validation("cart amount out of range".to_string()))
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
}

/// A shopper's selection, lines kept in the order they were first added
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
    last_updated: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    fn add(&mut self, product_id: &str, quantity: u32) -> u32 {
        self.last_updated = Utc::now();
        match self.lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity);
                line.quantity
            }
            None => {
                self.lines.push(CartLine {
                    product_id: product_id.to_string(),
                    quantity,
                });
                quantity
            }
        }
    }

    fn remove(&mut self, product_id: &str, quantity: u32) -> u32 {
        let Some(index) = self.lines.iter().position(|line| line.product_id == product_id) else {
            return 0;
        };
        self.last_updated = Utc::now();

        let remaining = self.lines[index].quantity.saturating_sub(quantity);
        if remaining == 0 {
            self.lines.remove(index);
        } else {
            self.lines[index].quantity = remaining;
        }
        remaining
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.last_updated = Utc::now();
    }

    /// Lines whose product still exists, paired with it
    pub fn available_lines<'a>(&'a self, catalog: &'a Catalog) -> Vec<(&'a Product, u32)> {
        self.lines
            .iter()
            .filter_map(|line| catalog.find_product(&line.product_id).map(|p| (p, line.quantity)))
            .collect()
    }

    /// Σ quantity × price. Lines whose price no longer resolves are skipped.
    pub fn total(&self, price_lookup: impl Fn(&str) -> Option<Decimal>) -> ShopResult<Decimal> {
        let amounts = self
            .lines
            .iter()
            .filter_map(|line| price_lookup(&line.product_id).map(|p| line_total(p, line.quantity)))
            .collect::<ShopResult<Vec<_>>>()?;
        sum_amounts(amounts)
    }
}

/// Owner of all carts, keyed by shopper
#[derive(Debug, Default)]
pub struct CartStore {
    carts: HashMap<ShopperId, Cart>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cart(&self, user_id: ShopperId) -> Option<&Cart> {
        self.carts.get(&user_id)
    }

    /// Add `quantity` units of a catalog product, returning the new line quantity
    pub fn add_item(
        &mut self,
        user_id: ShopperId,
        product_id: &str,
        quantity: u32,
        catalog: &Catalog,
    ) -> ShopResult<u32> {
        if catalog.find_product(product_id).is_none() {
            return Err(ShopError::product_not_found(product_id));
        }
        if quantity == 0 {
            return Err(ShopError::Validation("quantity must be at least 1".to_string()));
        }

        let new_quantity = self.carts.entry(user_id).or_default().add(product_id, quantity);
        debug!(user_id, product_id, quantity = new_quantity, "Cart line updated");
        Ok(new_quantity)
    }

    /// Remove up to `quantity` units, returning what is left of the line
    pub fn remove_item(&mut self, user_id: ShopperId, product_id: &str, quantity: u32) -> u32 {
        let remaining = self
            .carts
            .get_mut(&user_id)
            .map_or(0, |cart| cart.remove(product_id, quantity));
        debug!(user_id, product_id, quantity = remaining, "Cart line reduced");
        remaining
    }

    pub fn clear(&mut self, user_id: ShopperId) {
        self.carts.entry(user_id).or_default().clear();
        debug!(user_id, "Cart cleared");
    }

    pub fn total(
        &self,
        user_id: ShopperId,
        price_lookup: impl Fn(&str) -> Option<Decimal>,
    ) -> ShopResult<Decimal> {
        match self.carts.get(&user_id) {
            Some(cart) => cart.total(price_lookup),
            None => Ok(Decimal::ZERO),
        }
    }
}
