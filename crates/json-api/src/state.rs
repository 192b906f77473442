//! State

use std::sync::Arc;

use cowork_app::{
    auth::AuthService,
    context::{BookingAppContext, PaymentAppContext},
    domain::{
        bookings::BookingsService,
        payments::{PaymentsService, vnpay::VnpayGateway},
    },
};

/// Shared state of the booking service routes.
#[derive(Clone)]
pub(crate) struct BookingState {
    pub(crate) bookings: Arc<dyn BookingsService>,
    pub(crate) auth: Arc<dyn AuthService>,
}

impl BookingState {
    #[must_use]
    pub(crate) fn new(bookings: Arc<dyn BookingsService>, auth: Arc<dyn AuthService>) -> Self {
        Self { bookings, auth }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: &BookingAppContext) -> Arc<Self> {
        Arc::new(Self::new(Arc::clone(&app.bookings), Arc::clone(&app.auth)))
    }
}

/// Shared state of the payment service routes.
#[derive(Clone)]
pub(crate) struct PaymentState {
    pub(crate) payments: Arc<dyn PaymentsService>,
    pub(crate) gateway: Arc<VnpayGateway>,
}

impl PaymentState {
    #[must_use]
    pub(crate) fn new(payments: Arc<dyn PaymentsService>, gateway: Arc<VnpayGateway>) -> Self {
        Self { payments, gateway }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: PaymentAppContext) -> Arc<Self> {
        Arc::new(Self::new(app.payments, app.gateway))
    }
}
