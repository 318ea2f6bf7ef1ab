use std::collections::{BTreeMap, HashSet, VecDeque};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cents, Customer, CustomerId, Product, ProductId, Quantity, Sale, SaleId};

/// Reason a ledger operation was refused. A rejected operation never changes state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Product name cannot be empty")]
    EmptyProductName,

    #[error("Customer name cannot be empty")]
    EmptyCustomerName,

    #[error("Quantity must be greater than zero (got {0})")]
    NonPositiveQuantity(Quantity),

    #[error("Price must be greater than zero (got {0} cents)")]
    NonPositivePrice(Cents),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: Quantity,
        requested: Quantity,
    },

    #[error("Sale amount is too large to record")]
    AmountOverflow,

    #[error("No pending sales in the queue")]
    EmptyQueue,

    #[error("No operation to undo")]
    EmptyHistory,
}

/// Reason a snapshot could not be turned back into a ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Duplicate {entity} id: {id}")]
    DuplicateId { entity: &'static str, id: i64 },

    #[error("Invalid product {0}: {1}")]
    InvalidProduct(ProductId, String),

    #[error("Invalid customer {0}: {1}")]
    InvalidCustomer(CustomerId, String),

    #[error("Invalid sale {0}: {1}")]
    InvalidSale(SaleId, String),

    #[error("Pending sale {0} is missing from the history")]
    PendingNotInHistory(SaleId),

    #[error("Pending sale {id} is queued after sale {after}")]
    PendingOutOfOrder { id: SaleId, after: SaleId },

    #[error("Next {entity} id {next} must be greater than the highest id in use ({max})")]
    StaleCounter {
        entity: &'static str,
        next: i64,
        max: i64,
    },

    #[error("Total sales value cannot be negative: {0}")]
    NegativeTotal(Cents),
}

/// Owned, serializable copy of the whole ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    /// Oldest first
    pub pending: Vec<Sale>,
    /// Bottom of the stack first
    pub history: Vec<Sale>,
    pub total_sales_cents: Cents,
    pub next_product_id: ProductId,
    pub next_customer_id: CustomerId,
    pub next_sale_id: SaleId,
}

/// The inventory and sales state machine.
///
/// Holds products and customers, a FIFO queue of sales awaiting fulfillment
/// and a LIFO history of recorded sales used for undo. Every sale lives in the
/// history until undone, and in the queue until fulfilled or undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    // Ids are handed out in increasing order, so key order is insertion order.
    products: BTreeMap<ProductId, Product>,
    customers: BTreeMap<CustomerId, Customer>,
    pending: VecDeque<Sale>,
    history: Vec<Sale>,
    total_sales_cents: Cents,
    next_product_id: ProductId,
    next_customer_id: CustomerId,
    next_sale_id: SaleId,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            products: BTreeMap::new(),
            customers: BTreeMap::new(),
            pending: VecDeque::new(),
            history: Vec::new(),
            total_sales_cents: 0,
            next_product_id: 1,
            next_customer_id: 1,
            next_sale_id: 1,
        }
    }

    // ========================
    // Registration
    // ========================

    pub fn register_product(
        &mut self,
        name: &str,
        quantity: Quantity,
        unit_price_cents: Cents,
    ) -> Result<Product, Rejection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Rejection::EmptyProductName);
        }
        if quantity <= 0 {
            return Err(Rejection::NonPositiveQuantity(quantity));
        }
        if unit_price_cents <= 0 {
            return Err(Rejection::NonPositivePrice(unit_price_cents));
        }

        let id = self.next_product_id;
        self.next_product_id += 1;

        let product = Product::new(id, name, quantity, unit_price_cents);
        self.products.insert(id, product.clone());
        Ok(product)
    }

    pub fn register_customer(&mut self, name: &str) -> Result<Customer, Rejection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Rejection::EmptyCustomerName);
        }

        let id = self.next_customer_id;
        self.next_customer_id += 1;

        let customer = Customer::new(id, name);
        self.customers.insert(id, customer.clone());
        Ok(customer)
    }

    // ========================
    // Reads
    // ========================

    /// Products in registration order.
    pub fn list_products(&self) -> Vec<&Product> {
        self.products.values().collect()
    }

    pub fn find_product_by_id(&self, id: ProductId) -> Result<&Product, Rejection> {
        self.products.get(&id).ok_or(Rejection::ProductNotFound(id))
    }

    /// Customers in registration order.
    pub fn list_customers(&self) -> Vec<&Customer> {
        self.customers.values().collect()
    }

    /// Customers with their accumulated spend, for reporting.
    pub fn customers_with_spend(&self) -> Vec<&Customer> {
        self.list_customers()
    }

    /// Pending sales, oldest first.
    pub fn view_pending_queue(&self) -> Vec<&Sale> {
        self.pending.iter().collect()
    }

    /// Recorded sales from the bottom of the undo stack to the top.
    pub fn history(&self) -> &[Sale] {
        &self.history
    }

    /// Value of everything on the shelves, recomputed on every call.
    pub fn total_stock_value(&self) -> Cents {
        self.products
            .values()
            .fold(0, |total: Cents, p| total.saturating_add(p.stock_value()))
    }

    pub fn total_sales_value(&self) -> Cents {
        self.total_sales_cents
    }

    // ========================
    // Sales lifecycle
    // ========================

    /// Record a sale, moving stock to the customer and queueing it for fulfillment.
    pub fn record_sale(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
        customer_id: CustomerId,
    ) -> Result<Sale, Rejection> {
        let product = self
            .products
            .get(&product_id)
            .ok_or(Rejection::ProductNotFound(product_id))?;
        let customer = self
            .customers
            .get(&customer_id)
            .ok_or(Rejection::CustomerNotFound(customer_id))?;

        if quantity <= 0 {
            return Err(Rejection::NonPositiveQuantity(quantity));
        }
        if quantity > product.quantity {
            return Err(Rejection::InsufficientStock {
                product_id,
                available: product.quantity,
                requested: quantity,
            });
        }

        // Everything is computed before anything is written.
        let amount_cents = quantity
            .checked_mul(product.unit_price_cents)
            .ok_or(Rejection::AmountOverflow)?;
        let customer_total = customer
            .total_spent_cents
            .checked_add(amount_cents)
            .ok_or(Rejection::AmountOverflow)?;
        let sales_total = self
            .total_sales_cents
            .checked_add(amount_cents)
            .ok_or(Rejection::AmountOverflow)?;

        let sale = Sale {
            id: self.next_sale_id,
            product_id,
            customer_id,
            quantity,
            amount_cents,
            product_name: product.name.clone(),
            customer_name: customer.name.clone(),
            recorded_at: Utc::now(),
        };

        if let Some(product) = self.products.get_mut(&product_id) {
            product.quantity -= quantity;
        }
        if let Some(customer) = self.customers.get_mut(&customer_id) {
            customer.total_spent_cents = customer_total;
        }
        self.total_sales_cents = sales_total;
        self.next_sale_id += 1;

        self.pending.push_back(sale.clone());
        self.history.push(sale.clone());
        Ok(sale)
    }

    /// Take the oldest pending sale off the queue. Stock and spend are left as they are.
    pub fn fulfill_next_sale(&mut self) -> Result<Sale, Rejection> {
        self.pending.pop_front().ok_or(Rejection::EmptyQueue)
    }

    /// Reverse the most recent sale and drop it from both the history and the queue.
    ///
    /// Adjustments for a product or customer that no longer exists are skipped.
    /// Spend and the sales total are floored at zero. A sale that was already
    /// fulfilled is simply absent from the queue, which is not an error.
    pub fn undo_last_operation(&mut self) -> Result<Sale, Rejection> {
        let sale = self.history.pop().ok_or(Rejection::EmptyHistory)?;

        if let Some(product) = self.products.get_mut(&sale.product_id) {
            product.quantity = product.quantity.saturating_add(sale.quantity);
        }
        if let Some(customer) = self.customers.get_mut(&sale.customer_id) {
            customer.refund(sale.amount_cents);
        }
        self.total_sales_cents = (self.total_sales_cents - sale.amount_cents).max(0);

        if let Some(pos) = self.pending.iter().position(|s| s.id == sale.id) {
            self.pending.remove(pos);
        }

        Ok(sale)
    }

    // ========================
    // Snapshots
    // ========================

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            products: self.products.values().cloned().collect(),
            customers: self.customers.values().cloned().collect(),
            pending: self.pending.iter().cloned().collect(),
            history: self.history.clone(),
            total_sales_cents: self.total_sales_cents,
            next_product_id: self.next_product_id,
            next_customer_id: self.next_customer_id,
            next_sale_id: self.next_sale_id,
        }
    }

    /// Rebuild a ledger from a snapshot, refusing any snapshot that breaks a ledger invariant.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self, SnapshotError> {
        let mut products = BTreeMap::new();
        for product in snapshot.products {
            if product.id < 1 {
                return Err(SnapshotError::InvalidProduct(
                    product.id,
                    "id must be positive".into(),
                ));
            }
            if let Some(reason) = name_problem(&product.name) {
                return Err(SnapshotError::InvalidProduct(product.id, reason.into()));
            }
            if product.quantity < 0 {
                return Err(SnapshotError::InvalidProduct(
                    product.id,
                    format!("negative quantity {}", product.quantity),
                ));
            }
            if product.unit_price_cents <= 0 {
                return Err(SnapshotError::InvalidProduct(
                    product.id,
                    format!("non-positive price {}", product.unit_price_cents),
                ));
            }
            let id = product.id;
            if products.insert(id, product).is_some() {
                return Err(SnapshotError::DuplicateId { entity: "product", id });
            }
        }

        let mut customers = BTreeMap::new();
        for customer in snapshot.customers {
            if customer.id < 1 {
                return Err(SnapshotError::InvalidCustomer(
                    customer.id,
                    "id must be positive".into(),
                ));
            }
            if let Some(reason) = name_problem(&customer.name) {
                return Err(SnapshotError::InvalidCustomer(customer.id, reason.into()));
            }
            if customer.total_spent_cents < 0 {
                return Err(SnapshotError::InvalidCustomer(
                    customer.id,
                    format!("negative spend {}", customer.total_spent_cents),
                ));
            }
            let id = customer.id;
            if customers.insert(id, customer).is_some() {
                return Err(SnapshotError::DuplicateId { entity: "customer", id });
            }
        }

        let mut history_ids = HashSet::new();
        let mut previous_id = 0;
        for sale in &snapshot.history {
            if sale.id < 1 {
                return Err(SnapshotError::InvalidSale(
                    sale.id,
                    "id must be positive".into(),
                ));
            }
            if !history_ids.insert(sale.id) {
                return Err(SnapshotError::DuplicateId { entity: "sale", id: sale.id });
            }
            // Sales enter the history in id order
            if sale.id < previous_id {
                return Err(SnapshotError::InvalidSale(
                    sale.id,
                    format!("recorded after sale {}", previous_id),
                ));
            }
            previous_id = sale.id;
            if sale.quantity <= 0 {
                return Err(SnapshotError::InvalidSale(sale.id, "non-positive quantity".into()));
            }
            let Some(product) = products.get(&sale.product_id) else {
                return Err(SnapshotError::InvalidSale(
                    sale.id,
                    format!("unknown product {}", sale.product_id),
                ));
            };
            // Prices never change, so the amount is fixed by the product
            let expected = sale.quantity.checked_mul(product.unit_price_cents);
            if expected != Some(sale.amount_cents) {
                return Err(SnapshotError::InvalidSale(
                    sale.id,
                    format!(
                        "amount {} does not match {} x {}",
                        sale.amount_cents, sale.quantity, product.unit_price_cents
                    ),
                ));
            }
            if !customers.contains_key(&sale.customer_id) {
                return Err(SnapshotError::InvalidSale(
                    sale.id,
                    format!("unknown customer {}", sale.customer_id),
                ));
            }
        }

        let mut pending_ids = HashSet::new();
        let mut previous_id = 0;
        for sale in &snapshot.pending {
            if !pending_ids.insert(sale.id) {
                return Err(SnapshotError::DuplicateId { entity: "pending sale", id: sale.id });
            }
            if !snapshot.history.iter().any(|s| s == sale) {
                return Err(SnapshotError::PendingNotInHistory(sale.id));
            }
            // The queue keeps the order in which sales were recorded
            if sale.id < previous_id {
                return Err(SnapshotError::PendingOutOfOrder {
                    id: sale.id,
                    after: previous_id,
                });
            }
            previous_id = sale.id;
        }

        check_counter("product", snapshot.next_product_id, products.keys().copied())?;
        check_counter("customer", snapshot.next_customer_id, customers.keys().copied())?;
        check_counter("sale", snapshot.next_sale_id, history_ids.iter().copied())?;

        if snapshot.total_sales_cents < 0 {
            return Err(SnapshotError::NegativeTotal(snapshot.total_sales_cents));
        }

        Ok(Self {
            products,
            customers,
            pending: snapshot.pending.into(),
            history: snapshot.history,
            total_sales_cents: snapshot.total_sales_cents,
            next_product_id: snapshot.next_product_id,
            next_customer_id: snapshot.next_customer_id,
            next_sale_id: snapshot.next_sale_id,
        })
    }
}

fn name_problem(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        Some("empty name")
    } else if name != name.trim() {
        Some("name has surrounding whitespace")
    } else {
        None
    }
}

fn check_counter(
    entity: &'static str,
    next: i64,
    ids: impl Iterator<Item = i64>,
) -> Result<(), SnapshotError> {
    // Ids start at 1, so an empty collection behaves as if the max were 0.
    let max = ids.max().unwrap_or(0).max(0);
    if next <= max || next < 1 {
        return Err(SnapshotError::StaleCounter { entity, next, max });
    }
    Ok(())
}
