// ==============================================================================
// handlers/users.rs - User Handlers
// ==============================================================================
// Description: List users and register on first sign-in
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::ExistingUserResponse,
    state::AppState,
    store::{Collection, Document, Filter, FindOptions, StoreError},
};

const EMAIL_FIELD: &str = "email";

/// List all users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<Document>>, AppError> {
    let users = state
        .store()
        .find(Collection::Users, Filter::All, FindOptions::default())
        .await
        .map_err(AppError::storage("Failed to fetch users"))?;

    Ok(Json(users))
}

/// Register a user unless the email is already known
///
/// Only a string `email` identifies a user. Bodies without one (or with a
/// null or non-string email) are always inserted. A concurrent registration
/// for the same email loses at the unique index; the loser re-reads and
/// answers exactly as if it had seen the user first.
pub async fn create_user(
    State(state): State<AppState>,
    Json(user): Json<Document>,
) -> Result<Response, AppError> {
    const MESSAGE: &str = "Failed to create user";

    let email = user
        .get(EMAIL_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(email) = &email {
        let existing = state
            .store()
            .find_one(Collection::Users, Filter::eq(EMAIL_FIELD, email.clone()))
            .await
            .map_err(AppError::storage(MESSAGE))?;

        if let Some(existing) = existing {
            info!("User {} already registered", email);
            return Ok(Json(ExistingUserResponse::new(existing)).into_response());
        }
    }

    match state.store().insert_one(Collection::Users, user).await {
        Ok(ack) => {
            info!("Registered user {}", email.as_deref().unwrap_or("without email"));
            Ok(Json(ack).into_response())
        }
        Err(source @ StoreError::Duplicate { .. }) => {
            warn!("Concurrent registration for {:?}", email);
            let existing = match email {
                Some(email) => state
                    .store()
                    .find_one(Collection::Users, Filter::eq(EMAIL_FIELD, email))
                    .await
                    .map_err(AppError::storage(MESSAGE))?,
                None => None,
            };
            match existing {
                Some(existing) => Ok(Json(ExistingUserResponse::new(existing)).into_response()),
                None => Err(AppError::storage(MESSAGE)(source)),
            }
        }
        Err(e) => Err(AppError::storage(MESSAGE)(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use crate::store::Collection;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_register_then_list() {
        let app = TestApp::new();

        let (status, body) = app
            .send(
                Method::POST,
                "/users",
                Some(json!({"email": "a@x.com", "name": "Ann", "image": "a.png"})),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["acknowledged"], true);
        assert_eq!(body["insertedId"].as_str().unwrap().len(), 24);

        let (status, body) = app.send(Method::GET, "/users", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Ann");
    }

    #[tokio::test]
    async fn test_duplicate_email_returns_existing_without_insert() {
        let app = TestApp::new();
        let id = app
            .seed(Collection::Users, json!({"email": "a@x.com", "name": "Original"}))
            .await;

        let (status, body) = app
            .send(
                Method::POST,
                "/users",
                Some(json!({"email": "a@x.com", "name": "Impostor"})),
                None,
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User already exists");
        assert_eq!(body["user"]["_id"], id.as_str());
        assert_eq!(body["user"]["name"], "Original");
        assert_eq!(app.store.len(Collection::Users).await, 1);
    }

    #[tokio::test]
    async fn test_users_without_email_always_inserted() {
        let app = TestApp::new();
        app.seed(Collection::Users, json!({"email": "a@x.com", "name": "Ann"}))
            .await;

        for body in [
            json!({"name": "first"}),
            json!({"name": "second"}),
            json!({"email": null, "name": "third"}),
            json!({"email": null, "name": "fourth"}),
        ] {
            let (status, body) = app.send(Method::POST, "/users", Some(body), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["acknowledged"], true);
            assert!(body.get("user").is_none());
        }

        assert_eq!(app.store.len(Collection::Users).await, 5);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_insert_once() {
        let app = TestApp::new();
        let body = json!({"email": "race@x.com"});

        let (first, second) = tokio::join!(
            app.send(Method::POST, "/users", Some(body.clone()), None),
            app.send(Method::POST, "/users", Some(body.clone()), None),
        );

        assert_eq!(first.0, StatusCode::OK);
        assert_eq!(second.0, StatusCode::OK);
        assert_eq!(app.store.len(Collection::Users).await, 1);
    }
}
