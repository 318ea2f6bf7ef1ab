// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use stockledger::application::LedgerService;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Path of the database inside a test directory
pub fn db_path(temp_dir: &TempDir) -> String {
    temp_dir.path().join("test.db").to_str().unwrap().to_string()
}

/// Test fixture: a small shop
pub struct StandardShop;

impl StandardShop {
    /// Widget (10 @ 2.50), Gadget (4 @ 19.99); Alice, Bob
    pub async fn create(service: &LedgerService) -> Result<()> {
        service.register_product("Widget", 10, 250).await?;
        service.register_product("Gadget", 4, 1999).await?;
        service.register_customer("Alice").await?;
        service.register_customer("Bob").await?;
        Ok(())
    }
}
