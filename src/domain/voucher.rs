use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

pub type VoucherId = i64;

/// Amounts must be strictly greater than this to qualify for a discount.
/// 10_000 cents = 100.00.
pub const MIN_AMOUNT_FOR_DISCOUNT: Cents = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: VoucherId,
    pub code: String,
    /// Percentage taken off the amount. Not range checked.
    pub discount: i64,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// A voucher that has not been persisted yet. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub code: String,
    pub discount: i64,
    pub created_at: DateTime<Utc>,
}

impl NewVoucher {
    pub fn new(code: impl Into<String>, discount: i64) -> Self {
        Self {
            code: code.into(),
            discount,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of applying a voucher to an amount. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub amount: Cents,
    pub discount: i64,
    pub final_amount: Cents,
    pub applied: bool,
}

impl ApplyResult {
    /// The amount passes through untouched.
    pub fn not_applied(amount: Cents, discount: i64) -> Self {
        Self {
            amount,
            discount,
            final_amount: amount,
            applied: false,
        }
    }

    pub fn applied(amount: Cents, discount: i64) -> Self {
        Self {
            amount,
            discount,
            final_amount: discounted_amount(amount, discount),
            applied: true,
        }
    }

    /// How much was taken off.
    pub fn savings(&self) -> Cents {
        self.amount - self.final_amount
    }
}

/// Returns `true` if `amount` is large enough for a voucher to be applied.
pub fn qualifies_for_discount(amount: Cents) -> bool {
    amount > MIN_AMOUNT_FOR_DISCOUNT
}

/// `amount - amount * discount / 100`, with the deducted part truncated
/// toward zero to whole cents. Out-of-range discounts saturate at the
/// `Cents` bounds instead of wrapping.
pub fn discounted_amount(amount: Cents, discount: i64) -> Cents {
    let amount = i128::from(amount);
    let deducted = amount * i128::from(discount) / 100;
    let discounted = amount - deducted;
    Cents::try_from(discounted).unwrap_or(if discounted < 0 {
        Cents::MIN
    } else {
        Cents::MAX
    })
}
