//! Payment Models

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    domain::bookings::models::{BookingId, BookingStatus},
    ids::TypedId,
};

pub type PaymentTransactionId = TypedId<PaymentTransaction>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment status {0:?}")]
pub struct UnknownPaymentStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            other => Err(UnknownPaymentStatus(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTransaction {
    pub id: PaymentTransactionId,
    pub txn_ref: String,
    pub booking_id: BookingId,
    /// Minor units, as sent to the gateway.
    pub amount: i64,
    pub status: PaymentStatus,
    pub gateway_response_code: Option<String>,
    pub gateway_transaction_no: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentTransaction {
    /// Whether the gateway's answer for this attempt is still unrecorded.
    ///
    /// Superseded attempts are FAILED without a response code; the payer may
    /// still complete them, so a late callback is reconciled like a pending one.
    #[must_use]
    pub fn awaiting_gateway(&self) -> bool {
        match self.status {
            PaymentStatus::Pending => true,
            PaymentStatus::Failed => self.gateway_response_code.is_none(),
            PaymentStatus::Success => false,
        }
    }
}

/// Outcome reported by the gateway for a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResult<'a> {
    pub status: PaymentStatus,
    pub response_code: &'a str,
    pub transaction_no: Option<&'a str>,
}

/// The parts of a booking the payment flow needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookingSnapshot {
    pub id: BookingId,
    pub status: BookingStatus,
    #[serde(alias = "TotalPrice", with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

/// Time-based reference the gateway echoes back on its callback.
#[must_use]
pub fn new_txn_ref(now: Timestamp) -> String {
    now.as_nanosecond().to_string()
}

/// Price scaled to the gateway's integer amount (x100, half away from zero).
#[must_use]
pub fn amount_minor_units(price: Decimal) -> Option<i64> {
    if price.is_sign_negative() {
        return None;
    }

    price
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}
