use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{debug, info, instrument};

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{MessageResponse, UserRequest},
        repo_types::User,
        services::into_draft,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(payload) = payload?;
    let draft = into_draft(payload)?;

    let user = state.store.create(draft).await?;
    info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.store.list().await?;
    debug!(count = users.len(), "users listed");
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(payload) = payload?;
    let draft = into_draft(payload)?;

    let user = state
        .store
        .update(&id, draft)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(user_id = %user.id, "user updated");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.delete(&id).await?;
    info!(user_id = %id, "user deleted");
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json_body(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(app: &axum::Router, name: &str, email: &str) -> Value {
        let res = send(
            app,
            Method::POST,
            "/api/users",
            Some(json!({ "name": name, "email": email })),
        )
        .await;
        assert_eq!(res.status(), 201);
        json_body(res).await
    }

    #[tokio::test]
    async fn create_and_fetch_user() {
        let app = build_app(AppState::fake());

        let created = create(&app, "Alice", "alice@example.com").await;
        assert_eq!(created["name"], "Alice");
        assert_eq!(created["email"], "alice@example.com");
        assert_eq!(created["created_at"], created["updated_at"]);

        let id = created["id"].as_str().unwrap();
        let res = send(&app, Method::GET, &format!("/api/users/{id}"), None).await;
        assert_eq!(res.status(), 200);
        assert_eq!(json_body(res).await, created);
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields() {
        let app = build_app(AppState::fake());

        let res = send(
            &app,
            Method::POST,
            "/api/users",
            Some(json!({ "name": "", "email": "a@b.com" })),
        )
        .await;
        assert_eq!(res.status(), 400);
        assert_eq!(json_body(res).await["error"], "name is required");

        let res = send(
            &app,
            Method::POST,
            "/api/users",
            Some(json!({ "name": "x", "email": "no-at-sign" })),
        )
        .await;
        assert_eq!(res.status(), 400);
    }

    #[tokio::test]
    async fn create_rejects_malformed_json() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), 400);
        assert_eq!(json_body(res).await["error"], "Invalid request payload");
    }

    #[tokio::test]
    async fn list_returns_all_users_newest_first() {
        let app = build_app(AppState::fake());

        let res = send(&app, Method::GET, "/api/users", None).await;
        assert_eq!(res.status(), 200);
        assert_eq!(json_body(res).await, json!([]));

        let a = create(&app, "A", "a@x.io").await;
        let b = create(&app, "B", "b@x.io").await;
        let c = create(&app, "C", "c@x.io").await;

        let res = send(&app, Method::GET, "/api/users", None).await;
        let listed = json_body(res).await;
        assert_eq!(listed, json!([c, b, a]));
    }

    #[tokio::test]
    async fn update_user_flow() {
        let app = build_app(AppState::fake());
        let created = create(&app, "Alice", "alice@example.com").await;
        let id = created["id"].as_str().unwrap();
        let uri = format!("/api/users/{id}");

        let res = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "name": "Alicia", "email": "alicia@example.com" })),
        )
        .await;
        assert_eq!(res.status(), 200);
        let updated = json_body(res).await;
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["name"], "Alicia");
        assert_eq!(updated["created_at"], created["created_at"]);

        let res = send(&app, Method::GET, &uri, None).await;
        assert_eq!(json_body(res).await, updated);

        let res = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "name": "Alicia", "email": "" })),
        )
        .await;
        assert_eq!(res.status(), 400);

        let res = send(
            &app,
            Method::PUT,
            "/api/users/999",
            Some(json!({ "name": "Ghost", "email": "ghost@example.com" })),
        )
        .await;
        assert_eq!(res.status(), 404);
    }

    #[tokio::test]
    async fn delete_user_flow() {
        let app = build_app(AppState::fake());
        let created = create(&app, "Alice", "alice@example.com").await;
        let uri = format!("/api/users/{}", created["id"].as_str().unwrap());

        let res = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(res.status(), 200);
        assert_eq!(
            json_body(res).await,
            json!({ "message": "User deleted successfully" })
        );

        let res = send(&app, Method::GET, &uri, None).await;
        assert_eq!(res.status(), 404);
        assert_eq!(json_body(res).await, json!({ "error": "User not found" }));

        let res = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(res.status(), 404);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = build_app(AppState::fake());
        let res = send(&app, Method::GET, "/api/users/does-not-exist", None).await;
        assert_eq!(res.status(), 404);
    }

    #[tokio::test]
    async fn put_with_non_numeric_id_is_not_found() {
        let app = build_app(AppState::fake());
        let res = send(
            &app,
            Method::PUT,
            "/api/users/abc",
            Some(json!({ "name": "Ghost", "email": "ghost@example.com" })),
        )
        .await;
        assert_eq!(res.status(), 404);
        assert_eq!(json_body(res).await, json!({ "error": "User not found" }));
    }

    #[tokio::test]
    async fn delete_with_non_numeric_id_is_not_found() {
        let app = build_app(AppState::fake());
        let res = send(&app, Method::DELETE, "/api/users/abc", None).await;
        assert_eq!(res.status(), 404);
        assert_eq!(json_body(res).await, json!({ "error": "User not found" }));
    }

    #[tokio::test]
    async fn aliased_ids_never_reach_the_stored_user() {
        let app = build_app(AppState::fake());
        let created = create(&app, "Alice", "alice@example.com").await;
        assert_eq!(created["id"], "1");

        for alias in ["01", "+1", "0001"] {
            let uri = format!("/api/users/{alias}");

            let res = send(&app, Method::GET, &uri, None).await;
            assert_eq!(res.status(), 404, "GET {alias}");

            let res = send(
                &app,
                Method::PUT,
                &uri,
                Some(json!({ "name": "Mallory", "email": "m@example.com" })),
            )
            .await;
            assert_eq!(res.status(), 404, "PUT {alias}");

            let res = send(&app, Method::DELETE, &uri, None).await;
            assert_eq!(res.status(), 404, "DELETE {alias}");
        }

        let res = send(&app, Method::GET, "/api/users/1", None).await;
        assert_eq!(res.status(), 200);
        assert_eq!(json_body(res).await, created);
    }

    #[tokio::test]
    async fn put_rejects_malformed_json() {
        let app = build_app(AppState::fake());
        let created = create(&app, "Alice", "alice@example.com").await;
        let req = Request::builder()
            .method(Method::PUT)
            .uri(format!("/api/users/{}", created["id"].as_str().unwrap()))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), 400);
        assert_eq!(json_body(res).await["error"], "Invalid request payload");
    }

    #[tokio::test]
    async fn missing_fields_fail_validation() {
        let app = build_app(AppState::fake());
        let res = send(&app, Method::POST, "/api/users", Some(json!({}))).await;
        assert_eq!(res.status(), 400);
        assert_eq!(
            json_body(res).await["error"],
            "name is required; email is required"
        );
    }

    #[tokio::test]
    async fn post_without_content_type_is_bad_request() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .body(Body::from(
                json!({ "name": "Alice", "email": "alice@example.com" }).to_string(),
            ))
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), 400);
        assert_eq!(json_body(res).await["error"], "Invalid request payload");
    }
}
