//! Payments service.

use std::{
    collections::BTreeMap,
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{debug, error, info, warn};

use crate::{
    database::Db,
    domain::{
        bookings::models::{BookingId, BookingStatus},
        payments::{
            BookingsClient,
            errors::PaymentsServiceError,
            models::{
                GatewayResult, PaymentStatus, PaymentTransaction, amount_minor_units, new_txn_ref,
            },
            repository::PgPaymentsRepository,
            vnpay::{
                PaymentRequest, RESPONSE_CODE, SUCCESS_CODE, TRANSACTION_NO, TXN_REF,
                VnpayGateway,
            },
        },
    },
};

#[derive(Clone)]
pub struct PgPaymentsService {
    db: Db,
    repository: PgPaymentsRepository,
    bookings: Arc<dyn BookingsClient>,
    gateway: Arc<VnpayGateway>,
}

impl PgPaymentsService {
    #[must_use]
    pub fn new(db: Db, bookings: Arc<dyn BookingsClient>, gateway: Arc<VnpayGateway>) -> Self {
        Self {
            db,
            repository: PgPaymentsRepository::new(),
            bookings,
            gateway,
        }
    }
}

impl Debug for PgPaymentsService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PgPaymentsService")
            .field("db", &self.db)
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl PgPaymentsService {
    /// Record the gateway's answer on a transaction still awaiting it.
    ///
    /// A success for a superseded attempt releases the newer pending attempts
    /// of the same booking first, since only one live transaction may exist.
    async fn reconcile(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        transaction: PaymentTransaction,
        response_code: &str,
        transaction_no: Option<&str>,
    ) -> Result<PaymentTransaction, PaymentsServiceError> {
        let status = if response_code == SUCCESS_CODE {
            PaymentStatus::Success
        } else {
            PaymentStatus::Failed
        };

        let superseded = transaction.status == PaymentStatus::Failed;

        if superseded && status == PaymentStatus::Success {
            let released = self
                .repository
                .release_pending(tx, transaction.booking_id, transaction.id)
                .await?;

            warn!(released, "late payment for a superseded attempt");
        }

        let completed = self
            .repository
            .complete_transaction(
                tx,
                transaction.id,
                &GatewayResult {
                    status,
                    response_code,
                    transaction_no,
                },
            )
            .await;

        match completed.map_err(PaymentsServiceError::from) {
            Ok(completed) => {
                info!(
                    status = %completed.status,
                    response_code = %response_code,
                    superseded,
                    "payment reconciled"
                );

                Ok(completed)
            }
            Err(PaymentsServiceError::PaymentInProgress) => {
                error!(
                    booking_id = %transaction.booking_id,
                    transaction_no = ?transaction_no,
                    "booking was paid twice, refund the late attempt"
                );

                Err(PaymentsServiceError::AlreadyPaid)
            }
            Err(other) => Err(other),
        }
    }
}

#[async_trait]
impl PaymentsService for PgPaymentsService {
    #[tracing::instrument(
        name = "payments.service.create_payment_url",
        skip(self, client_ip),
        fields(txn_ref = tracing::field::Empty),
        err
    )]
    async fn create_payment_url(
        &self,
        booking: BookingId,
        client_ip: &str,
    ) -> Result<String, PaymentsServiceError> {
        let snapshot = self.bookings.get_booking(booking).await?;

        if snapshot.status != BookingStatus::Pending {
            return Err(PaymentsServiceError::AlreadyProcessed);
        }

        let amount =
            amount_minor_units(snapshot.total_price).ok_or(PaymentsServiceError::InvalidAmount)?;

        let now = Timestamp::now();
        let cutoff = now.checked_sub(self.gateway.expiry())?;

        let mut tx = self.db.begin_transaction().await?;

        let superseded = self
            .repository
            .supersede_expired(&mut tx, booking, cutoff)
            .await?;

        if superseded > 0 {
            info!(superseded, "expired payment attempts marked failed");
        }

        let transaction = self
            .repository
            .create_transaction(&mut tx, &new_txn_ref(now), booking, amount, now)
            .await?;

        let url = self.gateway.payment_url(&PaymentRequest {
            txn_ref: &transaction.txn_ref,
            booking,
            amount,
            client_ip,
            created_at: now,
        })?;

        tx.commit().await?;

        tracing::Span::current().record("txn_ref", tracing::field::display(&transaction.txn_ref));

        info!(amount, "payment transaction created");

        Ok(url)
    }

    #[tracing::instrument(
        name = "payments.service.handle_return",
        skip(self, params),
        fields(txn_ref = tracing::field::Empty),
        err
    )]
    async fn handle_return(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<String, PaymentsServiceError> {
        let txn_ref = params
            .get(TXN_REF)
            .ok_or(PaymentsServiceError::MissingParameter(TXN_REF))?;

        tracing::Span::current().record("txn_ref", tracing::field::display(txn_ref));

        let response_code = params
            .get(RESPONSE_CODE)
            .ok_or(PaymentsServiceError::MissingParameter(RESPONSE_CODE))?;

        let mut tx = self.db.begin_transaction().await?;

        let transaction = self.repository.lock_by_txn_ref(&mut tx, txn_ref).await?;

        let transaction = if transaction.awaiting_gateway() {
            let completed = self
                .reconcile(
                    &mut tx,
                    transaction,
                    response_code,
                    params.get(TRANSACTION_NO).map(String::as_str),
                )
                .await?;

            tx.commit().await?;

            completed
        } else {
            tx.commit().await?;

            debug!(status = %transaction.status, "callback for settled transaction");

            transaction
        };

        if transaction.status != PaymentStatus::Success {
            return Err(PaymentsServiceError::PaymentFailed {
                response_code: transaction.gateway_response_code.unwrap_or_default(),
            });
        }

        if let Err(confirm_error) = self.bookings.confirm_booking(transaction.booking_id).await {
            error!(
                booking_id = %transaction.booking_id,
                error = %confirm_error,
                "paid booking could not be confirmed"
            );
        }

        Ok(self.gateway.return_url().to_owned())
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Record a PENDING transaction for a PENDING booking and return the signed
    /// gateway URL to redirect the payer to.
    async fn create_payment_url(
        &self,
        booking: BookingId,
        client_ip: &str,
    ) -> Result<String, PaymentsServiceError>;

    /// Reconcile a gateway callback whose signature has already been checked.
    /// Returns the merchant landing page on success.
    async fn handle_return(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<String, PaymentsServiceError>;
}
