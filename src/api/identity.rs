//! Caller identity from the gateway-injected `x-user-id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::db::profiles;
use crate::error::AppError;
use crate::services::Actor;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    // Header is read synchronously so the returned future owns everything it touches.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let db = state.db.clone();

        async move {
            let user_id = user_id.ok_or(AppError::Unauthorized)?;
            let profile = profiles::find_profile(&db, &user_id)
                .await?
                .ok_or(AppError::Unauthorized)?;
            Ok(Actor::new(profile))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    use crate::db::connect_in_memory;
    use crate::models::{NewProfileRequest, UserRole};

    async fn extract_actor(state: &AppState, user_id: Option<&str>) -> Result<Actor, AppError> {
        let mut builder = Request::builder().method("GET").uri("/me");
        if let Some(id) = user_id {
            builder = builder.header(USER_ID_HEADER, id);
        }
        let (mut parts, _body) = builder.body(()).unwrap().into_parts();
        Actor::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn should_resolve_known_profile() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        profiles::insert_profile(
            &pool,
            NewProfileRequest {
                id: "p1".to_string(),
                email: "p1@example.com".to_string(),
                role: Some(UserRole::TenuredProfessor),
                full_name: None,
                phone: None,
            },
        )
        .await
        .unwrap();
        let state = AppState::offline(pool);

        let actor = extract_actor(&state, Some("p1")).await.unwrap();
        assert_eq!(actor.role(), UserRole::TenuredProfessor);
    }

    #[tokio::test]
    async fn should_reject_missing_or_unknown_user() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let state = AppState::offline(pool);

        assert!(matches!(extract_actor(&state, None).await, Err(AppError::Unauthorized)));
        assert!(matches!(extract_actor(&state, Some("  ")).await, Err(AppError::Unauthorized)));
        assert!(matches!(extract_actor(&state, Some("ghost")).await, Err(AppError::Unauthorized)));
    }
}
