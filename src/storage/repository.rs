use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{Customer, Ledger, LedgerSnapshot, Product, Sale};

use super::MIGRATION_001_INITIAL;

/// Repository persisting the ledger snapshot to SQLite.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Snapshot operations
    // ========================

    /// Load the stored ledger. The rows are validated through `Ledger::restore`.
    pub async fn load_ledger(&self) -> Result<Ledger> {
        let state = sqlx::query(
            r#"
            SELECT total_sales_cents, next_product_id, next_customer_id, next_sale_id
            FROM ledger_state
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch ledger state")?
        .ok_or_else(|| anyhow::anyhow!("Ledger state row is missing; run `init` first"))?;

        let products = sqlx::query(
            "SELECT id, name, quantity, unit_price_cents FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list products")?
        .iter()
        .map(Self::row_to_product)
        .collect();

        let customers = sqlx::query(
            "SELECT id, name, total_spent_cents FROM customers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list customers")?
        .iter()
        .map(Self::row_to_customer)
        .collect();

        let sale_rows = sqlx::query(
            r#"
            SELECT id, product_id, customer_id, quantity, amount_cents, product_name,
                   customer_name, recorded_at, history_position, queue_position
            FROM sales
            ORDER BY history_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list sales")?;

        let mut history = Vec::with_capacity(sale_rows.len());
        let mut queued: Vec<(i64, Sale)> = Vec::new();
        for row in &sale_rows {
            let sale = Self::row_to_sale(row)?;
            let queue_position: Option<i64> = row.get("queue_position");
            if let Some(position) = queue_position {
                queued.push((position, sale.clone()));
            }
            history.push(sale);
        }
        queued.sort_by_key(|(position, _)| *position);

        let snapshot = LedgerSnapshot {
            products,
            customers,
            pending: queued.into_iter().map(|(_, sale)| sale).collect(),
            history,
            total_sales_cents: state.get("total_sales_cents"),
            next_product_id: state.get("next_product_id"),
            next_customer_id: state.get("next_customer_id"),
            next_sale_id: state.get("next_sale_id"),
        };

        Ledger::restore(snapshot).context("Stored ledger is inconsistent")
    }

    /// Replace the stored snapshot with the given ledger in a single transaction.
    pub async fn save_ledger(&self, ledger: &Ledger) -> Result<()> {
        let snapshot = ledger.snapshot();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        // Children first so foreign keys stay satisfied
        for table in ["sales", "products", "customers"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to clear {}", table))?;
        }

        for product in &snapshot.products {
            sqlx::query(
                "INSERT INTO products (id, name, quantity, unit_price_cents) VALUES (?, ?, ?, ?)",
            )
            .bind(product.id)
            .bind(&product.name)
            .bind(product.quantity)
            .bind(product.unit_price_cents)
            .execute(&mut *tx)
            .await
            .context("Failed to save product")?;
        }

        for customer in &snapshot.customers {
            sqlx::query("INSERT INTO customers (id, name, total_spent_cents) VALUES (?, ?, ?)")
                .bind(customer.id)
                .bind(&customer.name)
                .bind(customer.total_spent_cents)
                .execute(&mut *tx)
                .await
                .context("Failed to save customer")?;
        }

        for (history_position, sale) in snapshot.history.iter().enumerate() {
            let queue_position = snapshot
                .pending
                .iter()
                .position(|pending| pending.id == sale.id)
                .map(|p| p as i64);

            sqlx::query(
                r#"
                INSERT INTO sales (id, product_id, customer_id, quantity, amount_cents, product_name,
                                   customer_name, recorded_at, history_position, queue_position)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(sale.id)
            .bind(sale.product_id)
            .bind(sale.customer_id)
            .bind(sale.quantity)
            .bind(sale.amount_cents)
            .bind(&sale.product_name)
            .bind(&sale.customer_name)
            .bind(sale.recorded_at.to_rfc3339())
            .bind(history_position as i64)
            .bind(queue_position)
            .execute(&mut *tx)
            .await
            .context("Failed to save sale")?;
        }

        sqlx::query(
            r#"
            INSERT INTO ledger_state (id, total_sales_cents, next_product_id, next_customer_id, next_sale_id)
            VALUES (1, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                total_sales_cents = excluded.total_sales_cents,
                next_product_id = excluded.next_product_id,
                next_customer_id = excluded.next_customer_id,
                next_sale_id = excluded.next_sale_id
            "#,
        )
        .bind(snapshot.total_sales_cents)
        .bind(snapshot.next_product_id)
        .bind(snapshot.next_customer_id)
        .bind(snapshot.next_sale_id)
        .execute(&mut *tx)
        .await
        .context("Failed to save ledger state")?;

        tx.commit().await.context("Failed to commit ledger snapshot")?;
        Ok(())
    }

    fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Product {
        Product {
            id: row.get("id"),
            name: row.get("name"),
            quantity: row.get("quantity"),
            unit_price_cents: row.get("unit_price_cents"),
        }
    }

    fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Customer {
        Customer {
            id: row.get("id"),
            name: row.get("name"),
            total_spent_cents: row.get("total_spent_cents"),
        }
    }

    fn row_to_sale(row: &sqlx::sqlite::SqliteRow) -> Result<Sale> {
        let recorded_at_str: String = row.get("recorded_at");

        Ok(Sale {
            id: row.get("id"),
            product_id: row.get("product_id"),
            customer_id: row.get("customer_id"),
            quantity: row.get("quantity"),
            amount_cents: row.get("amount_cents"),
            product_name: row.get("product_name"),
            customer_name: row.get("customer_name"),
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
