//! Role guard.

use cowork_app::auth::Role;
use salvo::prelude::*;

use crate::extensions::*;

/// Lets the request through only when the authenticated caller holds one of
/// the listed roles. Must run after the auth middleware.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequireRoles(pub(crate) &'static [Role]);

pub(crate) const USER: RequireRoles = RequireRoles(&[Role::User]);

pub(crate) const STAFF: RequireRoles = RequireRoles(&[Role::Admin, Role::Moderator]);

#[salvo::handler]
impl RequireRoles {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let principal = match depot.principal_or_401() {
            Ok(principal) => principal,
            Err(error) => {
                res.render(error);

                return;
            }
        };

        if !principal.has_any_role(self.0) {
            res.render(StatusError::forbidden().brief(format!(
                "role {} may not access this resource",
                principal.role
            )));

            return;
        }

        ctrl.call_next(req, depot, res).await;
    }
}

#[cfg(test)]
mod tests {
    use cowork_app::{auth::Principal, ids::UserId};
    use salvo::test::TestClient;
    use testresult::TestResult;

    use super::*;

    fn as_role(role: Role) -> impl Handler {
        salvo::affix_state::inject(Principal {
            user_id: UserId::new(1),
            email: "ada@example.com".to_owned(),
            role,
        })
    }

    fn make_service(role: Option<Role>, guard: RequireRoles) -> Service {
        let mut router = Router::new();

        if let Some(role) = role {
            router = router.hoop(as_role(role));
        }

        Service::new(router.hoop(guard).push(Router::new().get(ok)))
    }

    #[salvo::handler]
    async fn ok() -> &'static str {
        "ok"
    }

    #[tokio::test]
    async fn test_matching_role_passes() -> TestResult {
        let res = TestClient::get("http://example.com")
            .send(&make_service(Some(Role::Moderator), STAFF))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_other_role_returns_403() -> TestResult {
        let res = TestClient::get("http://example.com")
            .send(&make_service(Some(Role::Admin), USER))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn test_unauthenticated_request_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .send(&make_service(None, USER))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
