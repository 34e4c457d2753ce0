//! Cart projection.
//!
//! The line list is the only stored state. `item_count` and `total` are
//! recomputed by full summation on every read, so they cannot drift from the
//! lines no matter which sequence of edits produced them.

use rust_decimal::Decimal;
use storefront_sync_core::{CurrencyCode, Price, ProductId};

use crate::backend::types::CartLine;

/// Ordered list of cart lines, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line_for(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total as a [`Price`] in the given currency.
    #[must_use]
    pub fn total_price(&self, currency: CurrencyCode) -> Price {
        Price::new(self.total(), currency)
    }

    /// Add `quantity` of a line's product.
    ///
    /// If the product already has a line its quantity is incremented;
    /// otherwise the line is appended with `quantity`.
    pub fn add(&mut self, line: CartLine, quantity: u32) {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine { quantity, ..line });
        }
    }

    /// Remove the line whose line id or product id is `id`.
    ///
    /// Unknown ids leave the cart unchanged.
    pub fn remove(&mut self, id: &str) {
        self.lines
            .retain(|l| l.line_id.as_str() != id && l.product_id.as_str() != id);
    }

    /// Replace the quantity of a product's line. Absent products are ignored.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| &l.product_id == product_id)
        {
            line.quantity = quantity;
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Replace all lines with the backend's authoritative list.
    pub fn replace_from_server(&mut self, lines: Vec<CartLine>) {
        self.lines = lines;
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }
}
