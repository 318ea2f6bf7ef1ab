use tracing::{debug, info, warn};

use crate::domain::{
    Cents, Customer, CustomerId, Ledger, LedgerSnapshot, Product, ProductId, Quantity,
    Rejection, Sale,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, exporters, tests).
///
/// Every mutating call loads the stored ledger, applies one operation and
/// saves the result. A rejected operation saves nothing.
pub struct LedgerService {
    repo: Repository,
}

/// Both ledger totals at a glance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTotals {
    pub stock_value: Cents,
    pub sales_value: Cents,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        info!(database = database_path, "ledger database initialized");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        debug!(database = database_path, "connected to ledger database");
        Ok(Self::new(repo))
    }

    /// Load, apply one ledger operation, and save only if it succeeded.
    async fn apply<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Ledger) -> Result<T, Rejection>,
    ) -> Result<T, AppError> {
        let mut ledger = self.repo.load_ledger().await?;
        match f(&mut ledger) {
            Ok(value) => {
                self.repo.save_ledger(&ledger).await?;
                Ok(value)
            }
            Err(rejection) => {
                warn!(operation, %rejection, "operation rejected");
                Err(rejection.into())
            }
        }
    }

    // ========================
    // Product operations
    // ========================

    /// Register a new product.
    pub async fn register_product(
        &self,
        name: &str,
        quantity: Quantity,
        unit_price_cents: Cents,
    ) -> Result<Product, AppError> {
        let product = self
            .apply("register_product", |ledger| {
                ledger.register_product(name, quantity, unit_price_cents)
            })
            .await?;

        info!(
            product_id = product.id,
            name = %product.name,
            quantity = product.quantity,
            unit_price_cents = product.unit_price_cents,
            "product registered"
        );
        Ok(product)
    }

    /// List all products in registration order.
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let ledger = self.ledger().await?;
        Ok(ledger.list_products().into_iter().cloned().collect())
    }

    /// Get a product by ID.
    pub async fn find_product_by_id(&self, id: ProductId) -> Result<Product, AppError> {
        let ledger = self.ledger().await?;
        Ok(ledger.find_product_by_id(id)?.clone())
    }

    // ========================
    // Customer operations
    // ========================

    /// Register a new customer.
    pub async fn register_customer(&self, name: &str) -> Result<Customer, AppError> {
        let customer = self
            .apply("register_customer", |ledger| ledger.register_customer(name))
            .await?;

        info!(customer_id = customer.id, name = %customer.name, "customer registered");
        Ok(customer)
    }

    /// List all customers in registration order.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let ledger = self.ledger().await?;
        Ok(ledger.list_customers().into_iter().cloned().collect())
    }

    /// List customers with their accumulated spend.
    pub async fn customers_with_spend(&self) -> Result<Vec<Customer>, AppError> {
        let ledger = self.ledger().await?;
        Ok(ledger.customers_with_spend().into_iter().cloned().collect())
    }

    // ========================
    // Sale operations
    // ========================

    /// Record a sale and queue it for fulfillment.
    pub async fn record_sale(
        &self,
        product_id: ProductId,
        quantity: Quantity,
        customer_id: CustomerId,
    ) -> Result<Sale, AppError> {
        let sale = self
            .apply("record_sale", |ledger| {
                ledger.record_sale(product_id, quantity, customer_id)
            })
            .await?;

        info!(
            sale_id = sale.id,
            product_id = sale.product_id,
            customer_id = sale.customer_id,
            quantity = sale.quantity,
            amount_cents = sale.amount_cents,
            "sale recorded"
        );
        Ok(sale)
    }

    /// Pending sales, oldest first.
    pub async fn view_pending_queue(&self) -> Result<Vec<Sale>, AppError> {
        let ledger = self.ledger().await?;
        Ok(ledger.view_pending_queue().into_iter().cloned().collect())
    }

    /// Recorded sales, bottom of the undo stack first.
    pub async fn history(&self) -> Result<Vec<Sale>, AppError> {
        let ledger = self.ledger().await?;
        Ok(ledger.history().to_vec())
    }

    /// Fulfill the oldest pending sale.
    pub async fn fulfill_next_sale(&self) -> Result<Sale, AppError> {
        let sale = self
            .apply("fulfill_next_sale", |ledger| ledger.fulfill_next_sale())
            .await?;

        info!(sale_id = sale.id, "sale fulfilled");
        Ok(sale)
    }

    /// Undo the most recent sale.
    pub async fn undo_last_operation(&self) -> Result<Sale, AppError> {
        let sale = self
            .apply("undo_last_operation", |ledger| ledger.undo_last_operation())
            .await?;

        info!(
            sale_id = sale.id,
            product_id = sale.product_id,
            customer_id = sale.customer_id,
            quantity = sale.quantity,
            amount_cents = sale.amount_cents,
            "sale undone"
        );
        Ok(sale)
    }

    // ========================
    // Totals
    // ========================

    pub async fn total_stock_value(&self) -> Result<Cents, AppError> {
        Ok(self.ledger().await?.total_stock_value())
    }

    pub async fn total_sales_value(&self) -> Result<Cents, AppError> {
        Ok(self.ledger().await?.total_sales_value())
    }

    /// Both totals from a single load.
    pub async fn totals(&self) -> Result<LedgerTotals, AppError> {
        let ledger = self.ledger().await?;
        Ok(LedgerTotals {
            stock_value: ledger.total_stock_value(),
            sales_value: ledger.total_sales_value(),
        })
    }

    // ========================
    // Whole-ledger access
    // ========================

    /// The full current ledger.
    pub async fn ledger(&self) -> Result<Ledger, AppError> {
        Ok(self.repo.load_ledger().await?)
    }

    /// Overwrite the stored ledger.
    pub async fn replace_ledger(&self, ledger: &Ledger) -> Result<(), AppError> {
        self.repo.save_ledger(ledger).await?;
        info!(
            products = ledger.list_products().len(),
            customers = ledger.list_customers().len(),
            sales = ledger.history().len(),
            "ledger replaced"
        );
        Ok(())
    }

    /// Validate a snapshot and, unless `dry_run`, make it the stored ledger.
    pub async fn restore_snapshot(
        &self,
        snapshot: LedgerSnapshot,
        dry_run: bool,
    ) -> Result<Ledger, AppError> {
        let ledger = Ledger::restore(snapshot).inspect_err(|error| {
            warn!(%error, "snapshot rejected");
        })?;
        if !dry_run {
            self.replace_ledger(&ledger).await?;
        }
        Ok(ledger)
    }
}
