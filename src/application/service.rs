use std::sync::Arc;

use crate::domain::{ApplyResult, Cents, NewVoucher, Voucher, qualifies_for_discount};
use crate::storage::{SqliteVoucherStore, StoreError, VoucherStore};

use super::AppError;

/// Application service for creating and redeeming vouchers.
/// This is the primary interface for any client (CLI, API, tests).
pub struct VoucherService {
    store: Arc<dyn VoucherStore>,
}

/// Which vouchers `list_vouchers` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoucherFilter {
    #[default]
    All,
    Unused,
    Used,
}

impl VoucherFilter {
    fn matches(&self, voucher: &Voucher) -> bool {
        match self {
            VoucherFilter::All => true,
            VoucherFilter::Unused => !voucher.used,
            VoucherFilter::Used => voucher.used,
        }
    }
}

impl VoucherService {
    /// Create a new voucher service over the given store.
    pub fn new(store: Arc<dyn VoucherStore>) -> Self {
        Self { store }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = SqliteVoucherStore::init(&db_url).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = SqliteVoucherStore::connect(&db_url).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Create a voucher. Fails with a conflict if the code is already taken.
    pub async fn create_voucher(&self, code: &str, discount: i64) -> Result<Voucher, AppError> {
        if code.is_empty() {
            return Err(AppError::BadRequest(
                "Voucher code must not be empty".to_string(),
            ));
        }

        if self.store.get_voucher_by_code(code).await?.is_some() {
            tracing::info!(code, "voucher code already exists");
            return Err(AppError::voucher_already_exists());
        }

        // The lookup above can race with another creator; the store's own
        // uniqueness check is the final word.
        let voucher = match self.store.create_voucher(&NewVoucher::new(code, discount)).await {
            Ok(voucher) => voucher,
            Err(err) if err.downcast_ref::<StoreError>().is_some() => {
                tracing::info!(code, "voucher code taken concurrently");
                return Err(AppError::voucher_already_exists());
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(id = voucher.id, code, discount, "voucher created");
        Ok(voucher)
    }

    /// Apply a voucher to `amount`.
    ///
    /// Unknown codes, used vouchers and amounts at or below the threshold
    /// are not errors: the amount comes back unchanged with
    /// `applied == false`. Only storage failures return `Err`.
    pub async fn apply_voucher(&self, code: &str, amount: Cents) -> Result<ApplyResult, AppError> {
        let Some(voucher) = self.store.get_voucher_by_code(code).await? else {
            tracing::debug!(code, "no voucher for code");
            return Ok(ApplyResult::not_applied(amount, 0));
        };

        if voucher.used {
            tracing::debug!(code, "voucher already used");
            return Ok(ApplyResult::not_applied(amount, voucher.discount));
        }

        if !qualifies_for_discount(amount) {
            tracing::debug!(code, amount, "amount below discount threshold");
            return Ok(ApplyResult::not_applied(amount, voucher.discount));
        }

        match self.store.use_voucher(code).await? {
            Some(used) => {
                let result = ApplyResult::applied(amount, used.discount);
                tracing::info!(
                    code,
                    amount,
                    final_amount = result.final_amount,
                    "voucher applied"
                );
                Ok(result)
            }
            None => {
                // Someone else used it between our lookup and the update.
                tracing::info!(code, "voucher used concurrently");
                Ok(ApplyResult::not_applied(amount, voucher.discount))
            }
        }
    }

    /// Get a voucher by code.
    pub async fn get_voucher(&self, code: &str) -> Result<Voucher, AppError> {
        self.store
            .get_voucher_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(code.to_string()))
    }

    /// List vouchers, ordered by id.
    pub async fn list_vouchers(&self, filter: VoucherFilter) -> Result<Vec<Voucher>, AppError> {
        let vouchers = self.store.list_vouchers().await?;
        Ok(vouchers.into_iter().filter(|v| filter.matches(v)).collect())
    }
}
