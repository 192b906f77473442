//! Test helpers.

use std::sync::Arc;

use cowork_app::{
    auth::{MockAuthService, Principal, Role},
    domain::{
        bookings::{
            MockBookingsService,
            models::{Booking, BookingId, BookingStatus},
        },
        payments::{
            MockPaymentsService,
            vnpay::{VnpayConfig, VnpayGateway},
        },
        resources::models::ResourceId,
    },
    ids::UserId,
};
use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use salvo::{affix_state::inject, prelude::*};

use crate::{
    extensions::*,
    state::{BookingState, PaymentState},
};

pub(crate) const TEST_USER_ID: UserId = UserId::new(1);

pub(crate) const TEST_HASH_SECRET: &str = "test-hash-secret";

pub(crate) const TEST_RETURN_URL: &str = "https://cowork.example/payments/return";

#[salvo::handler]
pub(crate) async fn inject_principal(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(Principal {
        user_id: TEST_USER_ID,
        email: "ada@example.com".to_owned(),
        role: Role::User,
    });

    ctrl.call_next(req, depot, res).await;
}

/// PENDING two hour booking of resource 10 by [`TEST_USER_ID`].
pub(crate) fn make_booking(id: i64) -> Booking {
    Booking {
        id: BookingId::new(id),
        user_id: TEST_USER_ID,
        resource_id: ResourceId::new(10),
        start_time: Timestamp::from_second(1_735_725_600).unwrap_or(Timestamp::UNIX_EPOCH),
        end_time: Timestamp::from_second(1_735_732_800).unwrap_or(Timestamp::UNIX_EPOCH),
        status: BookingStatus::Pending,
        total_price: Decimal::from(100),
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

fn strict_auth_mock() -> MockAuthService {
    let mut auth = MockAuthService::new();

    auth.expect_authenticate_bearer().never();

    auth
}

fn strict_bookings_mock() -> MockBookingsService {
    let mut bookings = MockBookingsService::new();

    bookings.expect_book_resource().never();
    bookings.expect_update_status().never();
    bookings.expect_get_booking().never();
    bookings.expect_list_user_bookings().never();
    bookings.expect_list_bookings().never();
    bookings.expect_check_availability().never();

    bookings
}

pub(crate) fn booking_state(
    bookings: MockBookingsService,
    auth: MockAuthService,
) -> Arc<BookingState> {
    Arc::new(BookingState::new(Arc::new(bookings), Arc::new(auth)))
}

pub(crate) fn state_with_bookings(bookings: MockBookingsService) -> Arc<BookingState> {
    booking_state(bookings, strict_auth_mock())
}

pub(crate) fn state_with_auth(auth: MockAuthService) -> Arc<BookingState> {
    booking_state(strict_bookings_mock(), auth)
}

/// Booking routes as seen by an authenticated [`TEST_USER_ID`].
pub(crate) fn booking_service(bookings: MockBookingsService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_bookings(bookings)))
            .hoop(inject_principal)
            .push(route),
    )
}

pub(crate) fn test_gateway() -> Arc<VnpayGateway> {
    #[expect(clippy::expect_used, reason = "static test configuration")]
    let gateway = VnpayGateway::new(VnpayConfig {
        tmn_code: "COWORK01".to_owned(),
        hash_secret: TEST_HASH_SECRET.to_owned(),
        pay_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_owned(),
        return_url: TEST_RETURN_URL.to_owned(),
        expiry: SignedDuration::from_mins(15),
    })
    .expect("test gateway secret is non-empty");

    Arc::new(gateway)
}

pub(crate) fn payment_service(payments: MockPaymentsService, route: Router) -> Service {
    let state = Arc::new(PaymentState::new(Arc::new(payments), test_gateway()));

    Service::new(Router::new().hoop(inject(state)).push(route))
}
