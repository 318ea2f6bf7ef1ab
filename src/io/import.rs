use anyhow::{Context, Result};
use std::io::Read;

use crate::application::LedgerService;
use crate::io::export::LedgerExport;

/// Result of an import operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub products: usize,
    pub customers: usize,
    pub sales: usize,
    pub pending: usize,
    /// False when the snapshot was only validated
    pub written: bool,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
}

/// Importer for loading a ledger snapshot into the database
pub struct Importer<'a> {
    service: &'a LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Import a full JSON snapshot, replacing the stored ledger.
    /// The snapshot must satisfy every ledger invariant or nothing is written.
    pub async fn import_full_json<R: Read>(
        &self,
        mut reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut json = String::new();
        reader
            .read_to_string(&mut json)
            .context("Failed to read import data")?;

        let export: LedgerExport =
            serde_json::from_str(&json).context("Failed to parse ledger snapshot JSON")?;
        let ledger = self
            .service
            .restore_snapshot(export.ledger, options.dry_run)
            .await
            .context("Failed to restore ledger snapshot")?;

        let result = ImportResult {
            products: ledger.list_products().len(),
            customers: ledger.list_customers().len(),
            sales: ledger.history().len(),
            pending: ledger.view_pending_queue().len(),
            written: !options.dry_run,
        };

        Ok(result)
    }
}
