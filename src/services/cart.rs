//! Point-of-sale cart.
//!
//! The cart is never persisted. A websocket session keeps one in memory;
//! REST clients hold their own and submit the lines at checkout. Quantities
//! are capped by the stock seen when the product was added, and checkout
//! re-checks against the database anyway.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::inventory::Product;
use super::sales::CheckoutLine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    /// Stock on hand when the line was last touched.
    pub available: i32,
}

impl CartLine {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add one unit of `product`. Returns `false` when the product is out of
    /// stock or the line is already at the stock cap. A line found above the
    /// fresh stock level is trimmed to it.
    pub fn add(&mut self, product: &Product) -> bool {
        if let Some(pos) = self.lines.iter().position(|l| l.product_id == product.id) {
            let line = &mut self.lines[pos];
            line.available = product.stock_quantity;
            line.unit_price = product.price;
            if line.quantity >= line.available {
                line.quantity = line.available;
                if line.quantity <= 0 {
                    self.lines.remove(pos);
                }
                return false;
            }
            line.quantity += 1;
            return true;
        }

        if product.stock_quantity <= 0 {
            return false;
        }
        self.lines.push(CartLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            available: product.stock_quantity,
        });
        true
    }

    /// Shift a line's quantity by `delta`, never below one. Returns `false`
    /// if the line is missing or an increase would exceed available stock.
    /// Decreases always apply, so a line left above stock can be walked down.
    pub fn update_quantity(&mut self, product_id: Uuid, delta: i32) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) else {
            return false;
        };
        let next = line.quantity.saturating_add(delta).max(1);
        if delta > 0 && next > line.available {
            return false;
        }
        line.quantity = next;
        true
    }

    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    #[must_use]
    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Apply a live stock change to the matching line, trimming its quantity
    /// if stock fell below it. A product that sold out is dropped.
    pub fn sync_available(&mut self, product: &Product) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.available = product.stock_quantity;
            line.unit_price = product.price;
            line.name.clone_from(&product.name);
            line.quantity = line.quantity.min(line.available);
        }
        self.lines.retain(|l| l.quantity > 0);
    }

    /// Quantities to submit; prices are resolved server-side.
    #[must_use]
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.lines
            .iter()
            .map(|l| CheckoutLine { product_id: l.product_id, quantity: l.quantity })
            .collect()
    }
}

#[cfg(test)]
#[path = "cart_test.rs"]
mod tests;
