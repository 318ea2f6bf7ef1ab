use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, CustomerId, ProductId, Quantity};

pub type SaleId = i64;

/// A recorded sale. Product and customer names are copied at sale time so
/// the history reads correctly without looking the entities up again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    /// Units sold (always positive)
    pub quantity: Quantity,
    /// quantity × unit price at the moment of the sale
    pub amount_cents: Cents,
    pub product_name: String,
    pub customer_name: String,
    /// When the sale was recorded
    pub recorded_at: DateTime<Utc>,
}
