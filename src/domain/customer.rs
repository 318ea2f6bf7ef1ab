use serde::{Deserialize, Serialize};

use super::Cents;

pub type CustomerId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// Accumulated spend in cents, floored at zero on undo
    pub total_spent_cents: Cents,
}

impl Customer {
    pub fn new(id: CustomerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            total_spent_cents: 0,
        }
    }

    pub(crate) fn refund(&mut self, amount_cents: Cents) {
        self.total_spent_cents = (self.total_spent_cents - amount_cents).max(0);
    }
}
