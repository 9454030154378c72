use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{NewVoucher, Voucher, VoucherId};

use super::{StoreError, VoucherStore};

#[derive(Default)]
struct Inner {
    next_id: VoucherId,
    by_code: HashMap<String, Voucher>,
}

/// Voucher store held in process memory. Used by tests and by callers that
/// do not need durability.
#[derive(Default)]
pub struct InMemoryVoucherStore {
    inner: Mutex<Inner>,
}

impl InMemoryVoucherStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("voucher store lock poisoned"))
    }
}

#[async_trait]
impl VoucherStore for InMemoryVoucherStore {
    async fn get_voucher_by_code(&self, code: &str) -> Result<Option<Voucher>> {
        Ok(self.lock()?.by_code.get(code).cloned())
    }

    async fn create_voucher(&self, voucher: &NewVoucher) -> Result<Voucher> {
        let mut inner = self.lock()?;
        if inner.by_code.contains_key(&voucher.code) {
            return Err(StoreError::DuplicateCode(voucher.code.clone()).into());
        }

        inner.next_id += 1;
        let stored = Voucher {
            id: inner.next_id,
            code: voucher.code.clone(),
            discount: voucher.discount,
            used: false,
            created_at: voucher.created_at,
            used_at: None,
        };
        inner.by_code.insert(stored.code.clone(), stored.clone());
        Ok(stored)
    }

    async fn use_voucher(&self, code: &str) -> Result<Option<Voucher>> {
        let mut inner = self.lock()?;
        match inner.by_code.get_mut(code) {
            Some(voucher) if !voucher.used => {
                voucher.used = true;
                voucher.used_at = Some(Utc::now());
                Ok(Some(voucher.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_vouchers(&self) -> Result<Vec<Voucher>> {
        let mut vouchers: Vec<Voucher> = self.lock()?.by_code.values().cloned().collect();
        vouchers.sort_by_key(|v| v.id);
        Ok(vouchers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_assigned_in_order() -> Result<()> {
        let store = InMemoryVoucherStore::new();
        let a = store.create_voucher(&NewVoucher::new("A", 5)).await?;
        let b = store.create_voucher(&NewVoucher::new("B", 5)).await?;
        assert_eq!((a.id, b.id), (1, 2));

        let codes: Vec<_> = store
            .list_vouchers()
            .await?
            .into_iter()
            .map(|v| v.code)
            .collect();
        assert_eq!(codes, vec!["A", "B"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_use_is_compare_and_set() -> Result<()> {
        let store = InMemoryVoucherStore::new();
        store.create_voucher(&NewVoucher::new("X", 10)).await?;

        assert!(store.use_voucher("X").await?.is_some());
        assert!(store.use_voucher("X").await?.is_none());
        assert!(store.get_voucher_by_code("X").await?.unwrap().used);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_rejected() -> Result<()> {
        let store = InMemoryVoucherStore::new();
        store.create_voucher(&NewVoucher::new("X", 10)).await?;
        let err = store.create_voucher(&NewVoucher::new("X", 10)).await.unwrap_err();
        assert!(err.downcast_ref::<StoreError>().is_some());
        Ok(())
    }
}
