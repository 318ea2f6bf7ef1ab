use serde::{Deserialize, Serialize};

use super::Cents;

pub type ProductId = i64;

/// Units of stock. Signed so that non-positive requests can be rejected rather than unrepresentable.
pub type Quantity = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Units currently in stock (never negative)
    pub quantity: Quantity,
    /// Price per unit in cents (always positive)
    pub unit_price_cents: Cents,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        quantity: Quantity,
        unit_price_cents: Cents,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            quantity,
            unit_price_cents,
        }
    }

    /// Value of the units on hand. Saturates instead of wrapping on absurd inputs.
    pub fn stock_value(&self) -> Cents {
        self.quantity.saturating_mul(self.unit_price_cents)
    }
}
