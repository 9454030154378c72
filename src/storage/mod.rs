mod memory;
mod repository;

pub use memory::*;
pub use repository::*;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NewVoucher, Voucher};

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Failures a store reports in a form callers can match on.
/// They travel inside the `anyhow::Error` chain; use `downcast_ref`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("voucher code already stored: {0}")]
    DuplicateCode(String),
}

/// Durable keyed storage of vouchers.
///
/// `use_voucher` must be an atomic conditional update: it flips `used` from
/// `false` to `true` only if the row is still unused, and returns `None`
/// when the code is unknown or the voucher was already used. Two concurrent
/// calls for the same code never both return `Some`.
#[async_trait]
pub trait VoucherStore: Send + Sync {
    /// Look a voucher up by its exact (case-sensitive) code.
    async fn get_voucher_by_code(&self, code: &str) -> Result<Option<Voucher>>;

    /// Persist a new, unused voucher and return it with its assigned id.
    /// Fails with [`StoreError::DuplicateCode`] if the code is taken.
    async fn create_voucher(&self, voucher: &NewVoucher) -> Result<Voucher>;

    /// Mark the voucher as used, if it is still unused.
    async fn use_voucher(&self, code: &str) -> Result<Option<Voucher>>;

    /// All vouchers, ordered by id.
    async fn list_vouchers(&self) -> Result<Vec<Voucher>>;
}
