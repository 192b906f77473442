//! VNPAY request signing and callback verification.
//!
//! Parameters are sorted by key, joined as `key=form_urlencode(value)` with `&`
//! and signed with HMAC-SHA512 over the shared secret. The signature travels
//! as uppercase hex in `vnp_SecureHash`.

use std::{
    collections::BTreeMap,
    fmt::{Debug, Formatter, Result as FmtResult},
};

use hmac::{Hmac, Mac};
use jiff::{
    SignedDuration, Timestamp,
    tz::{self, TimeZone},
};
use sha2::Sha512;
use url::form_urlencoded::byte_serialize;

use crate::domain::{
    bookings::models::BookingId,
    payments::errors::{InvalidSecret, SignatureError},
};

pub const SECURE_HASH: &str = "vnp_SecureHash";
pub const SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
pub const TXN_REF: &str = "vnp_TxnRef";
pub const RESPONSE_CODE: &str = "vnp_ResponseCode";
pub const TRANSACTION_NO: &str = "vnp_TransactionNo";

/// Response code the gateway reports for a completed payment.
pub const SUCCESS_CODE: &str = "00";

const VERSION: &str = "2.1.0";
const COMMAND: &str = "pay";
const CURRENCY: &str = "VND";
const ORDER_TYPE: &str = "other";
const LOCALE: &str = "vn";
const DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// The gateway reads and writes dates in Vietnam time.
const GATEWAY_UTC_OFFSET_HOURS: i8 = 7;

type HmacSha512 = Hmac<Sha512>;

/// Canonical string the signature covers. The signature fields themselves are
/// excluded.
#[must_use]
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(key, _)| key.as_str() != SECURE_HASH && key.as_str() != SECURE_HASH_TYPE)
        .map(|(key, value)| {
            format!(
                "{key}={}",
                byte_serialize(value.as_bytes()).collect::<String>()
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Clone)]
pub struct VnpaySigner {
    mac: HmacSha512,
}

impl VnpaySigner {
    /// # Errors
    ///
    /// Returns [`InvalidSecret`] for an empty secret.
    pub fn new(secret: &str) -> Result<Self, InvalidSecret> {
        if secret.is_empty() {
            return Err(InvalidSecret);
        }

        let mac = HmacSha512::new_from_slice(secret.as_bytes())
            .map_err(|_invalid_length| InvalidSecret)?;

        Ok(Self { mac })
    }

    #[must_use]
    pub fn sign(&self, params: &BTreeMap<String, String>) -> String {
        let digest = self
            .mac
            .clone()
            .chain_update(canonical_query(params))
            .finalize()
            .into_bytes();

        hex::encode_upper(digest)
    }

    /// Checks `vnp_SecureHash` against the other parameters in constant time.
    /// Hex case is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the signature is absent or wrong.
    pub fn verify(&self, params: &BTreeMap<String, String>) -> Result<(), SignatureError> {
        let supplied = params.get(SECURE_HASH).ok_or(SignatureError::Missing)?;

        let supplied = hex::decode(supplied).map_err(|_not_hex| SignatureError::Mismatch)?;

        self.mac
            .clone()
            .chain_update(canonical_query(params))
            .verify_slice(&supplied)
            .map_err(|_mac_error| SignatureError::Mismatch)
    }
}

impl Debug for VnpaySigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VnpaySigner").finish_non_exhaustive()
    }
}

/// Append the signature for `params` to `base_url`.
#[must_use]
pub fn build_payment_url(
    base_url: &str,
    params: &BTreeMap<String, String>,
    signer: &VnpaySigner,
) -> String {
    format!(
        "{base_url}?{}&{SECURE_HASH}={}",
        canonical_query(params),
        signer.sign(params)
    )
}

/// Format `at` the way the gateway expects: `yyyyMMddHHmmss` at UTC+7.
#[must_use]
pub fn gateway_datetime(at: Timestamp) -> String {
    at.to_zoned(TimeZone::fixed(tz::offset(GATEWAY_UTC_OFFSET_HOURS)))
        .strftime(DATE_FORMAT)
        .to_string()
}

#[derive(Clone)]
pub struct VnpayConfig {
    pub tmn_code: String,
    pub hash_secret: String,
    pub pay_url: String,
    /// Merchant landing page the payer is sent back to.
    pub return_url: String,
    /// How long a payment URL stays valid.
    pub expiry: SignedDuration,
}

impl Debug for VnpayConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VnpayConfig")
            .field("tmn_code", &self.tmn_code)
            .field("hash_secret", &"<redacted>")
            .field("pay_url", &self.pay_url)
            .field("return_url", &self.return_url)
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// A payment the payer is about to be redirected to the gateway for.
#[derive(Debug, Clone, Copy)]
pub struct PaymentRequest<'a> {
    pub txn_ref: &'a str,
    pub booking: BookingId,
    pub amount: i64,
    pub client_ip: &'a str,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct VnpayGateway {
    tmn_code: String,
    pay_url: String,
    return_url: String,
    expiry: SignedDuration,
    signer: VnpaySigner,
}

impl VnpayGateway {
    /// # Errors
    ///
    /// Returns [`InvalidSecret`] if the hash secret can't key the HMAC.
    pub fn new(config: VnpayConfig) -> Result<Self, InvalidSecret> {
        Ok(Self {
            signer: VnpaySigner::new(&config.hash_secret)?,
            tmn_code: config.tmn_code,
            pay_url: config.pay_url,
            return_url: config.return_url,
            expiry: config.expiry,
        })
    }

    #[must_use]
    pub fn return_url(&self) -> &str {
        &self.return_url
    }

    #[must_use]
    pub const fn expiry(&self) -> SignedDuration {
        self.expiry
    }

    /// # Errors
    ///
    /// Returns an error if the expiry date overflows.
    pub fn payment_params(
        &self,
        payment: &PaymentRequest<'_>,
    ) -> Result<BTreeMap<String, String>, jiff::Error> {
        let expires_at = payment.created_at.checked_add(self.expiry)?;

        Ok([
            ("vnp_Version", VERSION.to_owned()),
            ("vnp_Command", COMMAND.to_owned()),
            ("vnp_TmnCode", self.tmn_code.clone()),
            ("vnp_Amount", payment.amount.to_string()),
            ("vnp_CurrCode", CURRENCY.to_owned()),
            (TXN_REF, payment.txn_ref.to_owned()),
            ("vnp_OrderInfo", format!("Booking #{}", payment.booking)),
            ("vnp_OrderType", ORDER_TYPE.to_owned()),
            ("vnp_Locale", LOCALE.to_owned()),
            ("vnp_ReturnUrl", self.return_url.clone()),
            ("vnp_IpAddr", payment.client_ip.to_owned()),
            ("vnp_CreateDate", gateway_datetime(payment.created_at)),
            ("vnp_ExpireDate", gateway_datetime(expires_at)),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect())
    }

    /// Signed redirect URL for `payment`.
    ///
    /// # Errors
    ///
    /// Returns an error if the expiry date overflows.
    pub fn payment_url(&self, payment: &PaymentRequest<'_>) -> Result<String, jiff::Error> {
        let params = self.payment_params(payment)?;

        Ok(build_payment_url(&self.pay_url, &params, &self.signer))
    }

    /// # Errors
    ///
    /// Returns [`SignatureError`] when the callback wasn't signed with our secret.
    pub fn verify(&self, params: &BTreeMap<String, String>) -> Result<(), SignatureError> {
        self.signer.verify(params)
    }
}
