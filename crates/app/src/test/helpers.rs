//! Test Helpers

use jiff::SignedDuration;
use rust_decimal::Decimal;

use crate::domain::{
    payments::{
        errors::InvalidSecret,
        vnpay::{VnpayConfig, VnpayGateway},
    },
    resources::{MockResourceCatalog, models::Resource},
};

/// Catalog that prices every resource as "Room A" at `unit_price` per hour.
pub(crate) fn catalog_with_room(unit_price: Decimal) -> MockResourceCatalog {
    let mut catalog = MockResourceCatalog::new();

    catalog.expect_get_resource().returning(move |id| {
        Ok(Resource {
            id,
            name: "Room A".to_owned(),
            unit_price,
        })
    });

    catalog
}

pub(crate) fn test_gateway() -> Result<VnpayGateway, InvalidSecret> {
    VnpayGateway::new(VnpayConfig {
        tmn_code: "COWORK01".to_owned(),
        hash_secret: "test-hash-secret".to_owned(),
        pay_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_owned(),
        return_url: "https://cowork.example/payments/return".to_owned(),
        expiry: SignedDuration::from_mins(15),
    })
}
