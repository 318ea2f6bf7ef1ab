use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{LedgerSnapshot, Sale};

/// Full ledger snapshot for export/import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerExport {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub ledger: LedgerSnapshot,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export products to CSV format
    pub async fn export_products_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let products = self.service.list_products().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "name", "quantity", "unit_price_cents"])?;

        for product in &products {
            csv_writer.write_record(&[
                product.id.to_string(),
                product.name.clone(),
                product.quantity.to_string(),
                product.unit_price_cents.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(products.len())
    }

    /// Export customers with their spend to CSV format
    pub async fn export_customers_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let customers = self.service.customers_with_spend().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "name", "total_spent_cents"])?;

        for customer in &customers {
            csv_writer.write_record(&[
                customer.id.to_string(),
                customer.name.clone(),
                customer.total_spent_cents.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(customers.len())
    }

    /// Export the sales history (oldest first) to CSV format
    pub async fn export_sales_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let sales = self.service.history().await?;
        write_sales_csv(writer, &sales)
    }

    /// Export the pending queue (oldest first) to CSV format
    pub async fn export_queue_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let sales = self.service.view_pending_queue().await?;
        write_sales_csv(writer, &sales)
    }

    /// Export the whole ledger as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerExport> {
        let ledger = self.service.ledger().await?;

        let export = LedgerExport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            ledger: ledger.snapshot(),
        };

        let json = serde_json::to_string_pretty(&export)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(export)
    }
}

fn write_sales_csv<W: Write>(writer: W, sales: &[Sale]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "id",
        "recorded_at",
        "product_id",
        "product_name",
        "customer_id",
        "customer_name",
        "quantity",
        "amount_cents",
    ])?;

    for sale in sales {
        csv_writer.write_record(&[
            sale.id.to_string(),
            sale.recorded_at.to_rfc3339(),
            sale.product_id.to_string(),
            sale.product_name.clone(),
            sale.customer_id.to_string(),
            sale.customer_name.clone(),
            sale.quantity.to_string(),
            sale.amount_cents.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(sales.len())
}
