//! Booking Models

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::resources::models::ResourceId,
    ids::{TypedId, UserId},
};

pub type BookingId = TypedId<Booking>;

const SECONDS_PER_HOUR: i64 = 3_600;
const NANOS_SCALE: u32 = 9;
const PRICE_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Only PENDING bookings move; CONFIRMED and CANCELLED are terminal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
        )
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown booking status {0:?}")]
pub struct UnknownBookingStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownBookingStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(UnknownBookingStatus(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("booking end time must be after its start time")]
pub struct InvalidTimeRange;

/// Half-open `[start, end)` interval with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: Timestamp,
    end: Timestamp,
}

impl TimeRange {
    /// # Errors
    ///
    /// Returns [`InvalidTimeRange`] when `end <= start`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, InvalidTimeRange> {
        if end <= start {
            return Err(InvalidTimeRange);
        }

        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// Ranges that merely touch (`a.end == b.start`) do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Length of the range in (possibly fractional) hours.
    #[must_use]
    pub fn hours(&self) -> Decimal {
        let duration = self.end.duration_since(self.start);

        let seconds = Decimal::from(duration.as_secs())
            + Decimal::new(i64::from(duration.subsec_nanos()), NANOS_SCALE);

        seconds / Decimal::from(SECONDS_PER_HOUR)
    }
}

/// Price of holding a resource for `range` at `unit_price` per hour, rounded to
/// cents.
#[must_use]
pub fn total_price(range: &TimeRange, unit_price: Decimal) -> Decimal {
    (range.hours() * unit_price)
        .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub resource_id: ResourceId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status: BookingStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: UserId,
    pub resource_id: ResourceId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}
