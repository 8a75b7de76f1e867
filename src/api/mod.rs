//! HTTP API.
//!
//! An axum router over [`Database`]. Handlers run the synchronous database
//! call directly and map failures through [`crate::error::ApiError`].

mod assignments;
mod boards;
mod comments;
mod lists;
mod projects;
mod tags;
mod tasks;
mod users;

use axum::{
    Router,
    extract::{FromRequest, Request},
    response::{IntoResponse, Json},
    routing::{delete, get, patch, post, put},
};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::Database;
use crate::error::ApiError;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    db: Arc<Database>,
}

impl ApiServer {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get the database reference.
    pub fn db(&self) -> &Database {
        &self.db
    }
}

/// JSON body extractor whose rejection is an [`ApiError`].
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// API root - returns available endpoints.
async fn api_root() -> impl IntoResponse {
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "users": "/api/users",
            "projects": "/api/projects",
            "boards": "/api/boards",
            "lists": "/api/lists/board/{board_id}",
            "tasks": "/api/tasks/list/{list_id}",
            "tags": "/api/tags",
            "comments": "/api/tasks/{task_id}/comments",
            "assignments": "/api/assignments/task/{task_id}",
        }
    }))
}

/// Build the router with all routes.
pub fn build_router(state: ApiServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api", get(api_root))
        .route("/api/health", get(health))
        // Users
        .route("/api/users", get(users::list).post(users::create))
        .route(
            "/api/users/{id}",
            get(users::get_one)
                .put(users::update)
                .delete(users::delete),
        )
        .route("/api/users/{id}/deactivate", patch(users::deactivate))
        .route("/api/users/{id}/reactivate", patch(users::reactivate))
        .route("/api/users/{id}/boards", get(boards::list_for_user))
        // Projects
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/{id}",
            get(projects::get_one)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/api/projects/{id}/deactivate", patch(projects::deactivate))
        .route("/api/projects/{id}/reactivate", patch(projects::reactivate))
        // Boards and members
        .route("/api/boards", get(boards::list).post(boards::create))
        .route(
            "/api/boards/{id}",
            get(boards::get_one)
                .put(boards::update)
                .delete(boards::delete),
        )
        .route("/api/boards/{id}/deactivate", patch(boards::deactivate))
        .route("/api/boards/{id}/reactivate", patch(boards::reactivate))
        .route(
            "/api/boards/{id}/members",
            get(boards::list_members).post(boards::add_member),
        )
        .route(
            "/api/boards/{id}/members/{user_id}",
            put(boards::update_member).delete(boards::remove_member),
        )
        // Lists
        .route(
            "/api/lists/board/{board_id}",
            get(lists::list_for_board).post(lists::create),
        )
        .route("/api/lists/board/{board_id}/reorder", put(lists::reorder))
        .route(
            "/api/lists/{id}",
            get(lists::get_one).put(lists::update).delete(lists::delete),
        )
        .route("/api/lists/{id}/move", put(lists::move_list))
        // Tasks
        .route(
            "/api/tasks/list/{list_id}",
            get(tasks::list_for_list).post(tasks::create),
        )
        .route("/api/tasks/list/{list_id}/reorder", put(tasks::reorder))
        .route(
            "/api/tasks/{id}",
            get(tasks::get_one).put(tasks::update).delete(tasks::delete),
        )
        .route("/api/tasks/{id}/move", put(tasks::move_task))
        .route("/api/tasks/{id}/assignees", put(tasks::set_assignees))
        .route(
            "/api/tasks/{id}/tags",
            get(tags::list_for_task)
                .post(tags::add_to_task)
                .delete(tags::remove_from_task),
        )
        .route(
            "/api/tasks/{id}/comments",
            get(comments::list_for_task).post(comments::create_for_task),
        )
        // Tags
        .route("/api/tags", get(tags::list).post(tags::create))
        .route(
            "/api/tags/{id}",
            get(tags::get_one).put(tags::update).delete(tags::delete),
        )
        .route("/api/tags/{id}/tasks", get(tags::tasks_with_tag))
        // Comments
        .route("/api/comments", post(comments::create))
        .route(
            "/api/comments/{id}",
            get(comments::get_one)
                .put(comments::update)
                .delete(comments::delete),
        )
        // Assignments
        .route(
            "/api/assignments/task/{task_id}",
            get(assignments::list_for_task).post(assignments::assign),
        )
        .route(
            "/api/assignments/user/{user_id}",
            get(assignments::list_for_user),
        )
        .route("/api/assignments/{id}", delete(assignments::remove))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(db: Arc<Database>, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(ApiServer::new(db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;
    info!("Kanban API listening on http://{}", bound_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Kanban API shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn test_router() -> (Arc<Database>, Router) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        (db.clone(), build_router(ApiServer::new(db)))
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }

    #[test]
    fn test_router_builds() {
        let _ = test_router();
    }

    #[tokio::test]
    async fn test_mistyped_body_is_structured_400() {
        let (_db, router) = test_router();
        let response = router
            .oneshot(json_request("POST", "/api/users", r#"{"full_name": 5}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("application/json"));
        let body = read_json(response).await;
        assert_eq!(body["code"], "INVALID_FIELD_VALUE");
        assert_eq!(body["field"], "body");
        assert!(body["details"].as_str().unwrap().contains("full_name"));
    }

    #[tokio::test]
    async fn test_malformed_reorder_body_is_structured_400() {
        let (db, router) = test_router();
        let owner = db
            .create_user(crate::db::users::NewUser {
                full_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                avatar: None,
            })
            .unwrap();
        let board = db
            .create_board(crate::db::boards::NewBoard {
                name: "Sprint".to_string(),
                description: None,
                visibility: None,
                owner_id: owner.id,
                project_id: None,
            })
            .unwrap();

        let uri = format!("/api/lists/board/{}/reorder", board.board.id);
        let response = router
            .oneshot(json_request("PUT", &uri, r#"{"listIds": "x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["code"], "INVALID_FIELD_VALUE");
    }

    #[tokio::test]
    async fn test_valid_body_creates_user() {
        let (_db, router) = test_router();
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/users",
                r#"{"full_name": "Ada", "email": "ada@example.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["full_name"], "Ada");
    }

    #[tokio::test]
    async fn test_advertised_collection_routes_answer_get() {
        let (_db, router) = test_router();
        let root = router
            .clone()
            .oneshot(Request::builder().uri("/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let root = read_json(root).await;
        assert_eq!(root["endpoints"]["comments"], "/api/tasks/{task_id}/comments");

        let response = router
            .oneshot(Request::builder().uri("/api/tags").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
