//! Payment Transactions Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    bookings::models::BookingId,
    payments::models::{GatewayResult, PaymentStatus, PaymentTransaction, PaymentTransactionId},
};

const CREATE_TRANSACTION_SQL: &str = include_str!("sql/create_transaction.sql");
const SUPERSEDE_EXPIRED_TRANSACTIONS_SQL: &str =
    include_str!("sql/supersede_expired_transactions.sql");
const RELEASE_PENDING_TRANSACTIONS_SQL: &str =
    include_str!("sql/release_pending_transactions.sql");
const LOCK_TRANSACTION_BY_TXN_REF_SQL: &str = include_str!("sql/lock_transaction_by_txn_ref.sql");
const COMPLETE_TRANSACTION_SQL: &str = include_str!("sql/complete_transaction.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPaymentsRepository;

impl PgPaymentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_transaction(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        txn_ref: &str,
        booking: BookingId,
        amount: i64,
        created_at: Timestamp,
    ) -> Result<PaymentTransaction, sqlx::Error> {
        query_as::<Postgres, PaymentTransaction>(CREATE_TRANSACTION_SQL)
            .bind(txn_ref)
            .bind(booking.into_inner())
            .bind(amount)
            .bind(SqlxTimestamp::from(created_at))
            .fetch_one(&mut **tx)
            .await
    }

    /// Fail PENDING transactions for `booking` created before `cutoff`.
    pub(crate) async fn supersede_expired(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingId,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SUPERSEDE_EXPIRED_TRANSACTIONS_SQL)
            .bind(booking.into_inner())
            .bind(SqlxTimestamp::from(cutoff))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Fail every PENDING transaction for `booking` other than `keep`.
    pub(crate) async fn release_pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingId,
        keep: PaymentTransactionId,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RELEASE_PENDING_TRANSACTIONS_SQL)
            .bind(booking.into_inner())
            .bind(keep.into_inner())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn lock_by_txn_ref(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        txn_ref: &str,
    ) -> Result<PaymentTransaction, sqlx::Error> {
        query_as::<Postgres, PaymentTransaction>(LOCK_TRANSACTION_BY_TXN_REF_SQL)
            .bind(txn_ref)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn complete_transaction(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        transaction: PaymentTransactionId,
        result: &GatewayResult<'_>,
    ) -> Result<PaymentTransaction, sqlx::Error> {
        query_as::<Postgres, PaymentTransaction>(COMPLETE_TRANSACTION_SQL)
            .bind(transaction.into_inner())
            .bind(result.status.as_str())
            .bind(result.response_code)
            .bind(result.transaction_no)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for PaymentTransaction {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status = status
            .parse::<PaymentStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: PaymentTransactionId::new(row.try_get("id")?),
            txn_ref: row.try_get("txn_ref")?,
            booking_id: BookingId::new(row.try_get("booking_id")?),
            amount: row.try_get("amount")?,
            status,
            gateway_response_code: row.try_get("gateway_response_code")?,
            gateway_transaction_no: row.try_get("gateway_transaction_no")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
