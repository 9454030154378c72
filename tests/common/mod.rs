// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;
use vouchers::application::VoucherService;
use vouchers::storage::InMemoryVoucherStore;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(VoucherService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = VoucherService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to create a service over an in-memory store
pub fn memory_service() -> VoucherService {
    VoucherService::new(Arc::new(InMemoryVoucherStore::new()))
}

/// Test fixture: a few vouchers with different discounts
pub struct StandardVouchers;

impl StandardVouchers {
    pub async fn create(service: &VoucherService) -> Result<()> {
        service.create_voucher("ABC123", 20).await?;
        service.create_voucher("WELCOME5", 5).await?;
        service.create_voucher("HALFOFF", 50).await?;
        Ok(())
    }
}
