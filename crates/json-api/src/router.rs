//! App Routers
//!
//! Each service mounts its API under `/api/v1`. Health, metrics and documentation routes
//! are added by `main`.

use salvo::Router;

use crate::{auth, bookings, payments};

const API_PREFIX: &str = "api/v1";

/// Booking service API. Literal segments are registered before `{id:num}` so
/// `me` and `check-availability` never reach the id matcher. The availability
/// check is also served under `internal/` for the venue service.
pub(crate) fn booking_router() -> Router {
    Router::with_path(API_PREFIX)
        .push(
            Router::with_path("internal/bookings/check-availability")
                .post(bookings::check_availability::handler),
        )
        .push(
            Router::with_path("bookings")
                .push(
                    Router::with_path("check-availability")
                        .post(bookings::check_availability::handler),
                )
                .push(
                    Router::with_path("me")
                        .hoop(auth::middleware::handler)
                        .hoop(auth::roles::USER)
                        .get(bookings::mine::handler),
                )
                .push(
                    Router::with_path("{id:num}")
                        .get(bookings::get::handler)
                        .push(Router::with_path("status").put(bookings::update_status::handler)),
                )
                .push(
                    Router::new()
                        .hoop(auth::middleware::handler)
                        .push(
                            Router::new()
                                .hoop(auth::roles::USER)
                                .post(bookings::create::handler),
                        )
                        .push(
                            Router::new()
                                .hoop(auth::roles::STAFF)
                                .get(bookings::index::handler),
                        ),
                ),
        )
}

/// Payment service API.
pub(crate) fn payment_router() -> Router {
    Router::with_path(API_PREFIX).push(
        Router::with_path("payments")
            .push(Router::with_path("create").get(payments::create::handler))
            .push(Router::with_path("vnpay/callback").get(payments::callback::handler)),
    )
}

#[cfg(test)]
mod tests {
    use cowork_app::{
        auth::{MockAuthService, Principal, Role},
        domain::bookings::MockBookingsService,
    };
    use salvo::{
        affix_state::inject,
        http::{StatusCode, header::AUTHORIZATION},
        prelude::*,
        test::TestClient,
    };
    use testresult::TestResult;

    use crate::test_helpers::{TEST_USER_ID, booking_state, make_booking};

    use super::*;

    fn authenticated_as(role: Role) -> MockAuthService {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer().returning(move |_| {
            Ok(Principal {
                user_id: TEST_USER_ID,
                email: "ada@example.com".to_owned(),
                role: role.clone(),
            })
        });

        auth
    }

    fn make_service(bookings: MockBookingsService, auth: MockAuthService) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(booking_state(bookings, auth)))
                .push(booking_router()),
        )
    }

    #[tokio::test]
    async fn me_is_not_parsed_as_a_booking_id() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings.expect_get_booking().never();
        bookings
            .expect_list_user_bookings()
            .once()
            .return_once(|_| Ok(vec![make_booking(1)]));

        let res = TestClient::get("http://example.com/api/v1/bookings/me")
            .add_header(AUTHORIZATION, "Bearer token", true)
            .send(&make_service(bookings, authenticated_as(Role::User)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn availability_is_served_on_both_paths() -> TestResult {
        for path in [
            "bookings/check-availability",
            "internal/bookings/check-availability",
        ] {
            let mut bookings = MockBookingsService::new();

            bookings
                .expect_check_availability()
                .once()
                .return_once(|_, _, _| Ok(Vec::new()));

            let res = TestClient::post(format!("http://example.com/api/v1/{path}"))
                .json(&serde_json::json!({
                    "resource_ids": [10],
                    "start_time": "2025-01-01T12:00:00Z",
                    "end_time": "2025-01-01T13:00:00Z",
                }))
                .send(&make_service(bookings, MockAuthService::new()))
                .await;

            assert_eq!(res.status_code, Some(StatusCode::OK), "POST {path}");
        }

        Ok(())
    }

    #[tokio::test]
    async fn listing_every_booking_needs_a_staff_role() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings.expect_list_bookings().never();

        let res = TestClient::get("http://example.com/api/v1/bookings")
            .add_header(AUTHORIZATION, "Bearer token", true)
            .send(&make_service(bookings, authenticated_as(Role::User)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        let mut bookings = MockBookingsService::new();

        bookings
            .expect_list_bookings()
            .once()
            .return_once(|| Ok(Vec::new()));

        let res = TestClient::get("http://example.com/api/v1/bookings")
            .add_header(AUTHORIZATION, "Bearer token", true)
            .send(&make_service(bookings, authenticated_as(Role::Admin)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn internal_lookup_needs_no_token() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings
            .expect_get_booking()
            .once()
            .return_once(|_| Ok(make_booking(7)));

        let res = TestClient::get("http://example.com/api/v1/bookings/7")
            .send(&make_service(bookings, MockAuthService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn creating_a_booking_needs_a_token() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings.expect_book_resource().never();

        let res = TestClient::post("http://example.com/api/v1/bookings")
            .json(&serde_json::json!({
                "resource_id": 10,
                "start_time": "2025-01-01T10:00:00Z",
                "end_time": "2025-01-01T12:00:00Z",
            }))
            .send(&make_service(bookings, MockAuthService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
