//! Resource Models

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::ids::TypedId;

pub type ResourceId = TypedId<Resource>;

/// A bookable unit as priced by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,

    /// Price per hour.
    pub unit_price: Decimal,
}

/// Venue service response envelope for a single space.
#[derive(Debug, Deserialize)]
pub(crate) struct SpaceEnvelope {
    pub(crate) data: SpaceRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpaceRecord {
    #[serde(rename = "ID")]
    pub(crate) id: i64,

    #[serde(rename = "Name")]
    pub(crate) name: String,

    #[serde(rename = "Price", with = "rust_decimal::serde::float")]
    pub(crate) price: Decimal,
}

impl From<SpaceRecord> for Resource {
    fn from(record: SpaceRecord) -> Self {
        Self {
            id: record.id.into(),
            name: record.name,
            unit_price: record.price,
        }
    }
}
