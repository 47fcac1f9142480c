use std::fmt::Debug;

use aide::axum::routing::{get, post, ApiMethodRouter};
use aide::axum::ApiRouter;
use aide::gen::GenContext;
use aide::openapi::{Info, OpenApi, Operation, Response as ApiResponse};
use aide::redoc::Redoc;
use aide::OperationOutput;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, Router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{instrument, Level};

use crate::errors::ApiError;
use crate::extractors::ValidatedJson;
use crate::models::{NewUser, StoredUser};
use crate::operations::UserStorage;

const API_TITLE: &str = "ManageMe API";
const API_DOCUMENT: &str = "/swagger/api.json";

#[derive(Serialize, Deserialize, Debug, JsonSchema)]
struct Message {
    message: String,
}

#[derive(Serialize, Deserialize, Debug, JsonSchema)]
struct UserCreated<Id> {
    message: String,
    user: StoredUser<Id>,
}

#[derive(Serialize, Deserialize, Debug, JsonSchema)]
struct UserList<Id> {
    message: String,
    users: Vec<StoredUser<Id>>,
}

/// JSON body sent with `201 Created`.
struct Created<T>(T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

impl<T: Serialize + JsonSchema> OperationOutput for Created<T> {
    type Inner = T;

    fn operation_response(ctx: &mut GenContext, operation: &mut Operation) -> Option<ApiResponse> {
        Json::<T>::operation_response(ctx, operation)
    }

    fn inferred_responses(
        ctx: &mut GenContext,
        operation: &mut Operation,
    ) -> Vec<(Option<u16>, ApiResponse)> {
        Self::operation_response(ctx, operation)
            .map(|response| vec![(Some(StatusCode::CREATED.as_u16()), response)])
            .unwrap_or_default()
    }
}

#[instrument(level = "info")]
async fn ping() -> Json<Message> {
    Json(Message {
        message: "pong".to_string(),
    })
}

#[instrument(level = "info", skip(state))]
async fn register<Storage>(
    State(state): State<Storage>,
    ValidatedJson(user): ValidatedJson<NewUser>,
) -> Result<Created<UserCreated<Storage::Id>>, ApiError>
where
    Storage: UserStorage,
{
    let user = state.insert(user).await?;

    Ok(Created(UserCreated {
        message: "User created successfully".to_string(),
        user,
    }))
}

#[instrument(level = "info", skip(state))]
async fn list_users<Storage>(
    State(state): State<Storage>,
) -> Result<Json<UserList<Storage::Id>>, ApiError>
where
    Storage: UserStorage,
{
    let users = state.list().await?;

    Ok(Json(UserList {
        message: "Users retrieved successfully".to_string(),
        users,
    }))
}

fn docs_ui<S>() -> ApiMethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    Redoc::new(API_DOCUMENT).with_title(API_TITLE).axum_route()
}

async fn serve_api(Extension(api): Extension<OpenApi>) -> Json<OpenApi> {
    Json(api)
}

pub fn routes<S>(state: S) -> Router
where
    S: UserStorage + Clone + Sync + Send + 'static + Debug,
{
    aide::gen::infer_responses(true);

    let mut api = OpenApi {
        info: Info {
            title: API_TITLE.to_string(),
            version: "1.0".to_string(),
            ..Info::default()
        },
        ..OpenApi::default()
    };

    ApiRouter::new()
        .api_route("/api/v1/ping", get(ping))
        .api_route("/api/v1/register", post(register::<S>))
        .api_route("/register", post(register::<S>))
        .api_route("/api/v1/all", get(list_users::<S>))
        .route("/swagger", docs_ui())
        .route("/swagger/", docs_ui())
        .route("/swagger/index.html", docs_ui())
        .finish_api(&mut api)
        .route(API_DOCUMENT, axum::routing::get(serve_api))
        .layer(Extension(api))
        .with_state(state)
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .include_headers(true)
                            .latency_unit(LatencyUnit::Micros),
                    ),
            ),
        )
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::operations::user_storage::in_memory::InMemoryUserStorage;

    const STORAGE_ERROR: &str = "Internal Server Error. Please try again later.";

    #[derive(Clone, Debug)]
    struct UnavailableStorage;

    #[async_trait::async_trait]
    impl UserStorage for UnavailableStorage {
        type Id = u64;

        async fn insert(&self, _user: NewUser) -> anyhow::Result<StoredUser<Self::Id>> {
            anyhow::bail!("connection refused")
        }

        async fn list(&self) -> anyhow::Result<Vec<StoredUser<Self::Id>>> {
            anyhow::bail!("could not decode user documents")
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn ping_pongs() {
        let app = routes(InMemoryUserStorage::new());
        let (status, body) = send(&app, get("/api/v1/ping")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "pong" }));
    }

    #[tokio::test]
    async fn registers_a_user() {
        let storage = InMemoryUserStorage::new();
        let app = routes(storage.clone());

        let (status, body) = send(
            &app,
            post_json(
                "/api/v1/register",
                r#"{"firstName":"A","lastName":"B","email":"a@b.com","password":"x"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body,
            json!({
                "message": "User created successfully",
                "user": {
                    "id": 1,
                    "firstName": "A",
                    "lastName": "B",
                    "email": "a@b.com",
                    "password": "x"
                }
            })
        );
        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn register_is_also_served_at_the_root() {
        let app = routes(InMemoryUserStorage::new());
        let (status, body) = send(
            &app,
            post_json(
                "/register",
                r#"{"firstName":"A","lastName":"B","email":"a@b.com","password":"x"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["id"], json!(1));
    }

    #[tokio::test]
    async fn rejects_missing_fields_without_storing() {
        let storage = InMemoryUserStorage::new();
        let app = routes(storage.clone());

        let (status, body) = send(&app, post_json("/api/v1/register", r#"{"firstName":"A"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required fields" }));
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_malformed_bodies() {
        let storage = InMemoryUserStorage::new();
        let app = routes(storage.clone());

        let (status, body) = send(&app, post_json("/api/v1/register", "{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid request body" }));
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_registered_users_in_order() {
        let app = routes(InMemoryUserStorage::new());

        let (status, body) = send(&app, get("/api/v1/all")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "message": "Users retrieved successfully", "users": [] })
        );

        for name in ["ada", "grace", "barbara"] {
            let payload = json!({
                "firstName": name,
                "lastName": "L",
                "email": format!("{}@example.com", name),
                "password": "pw"
            });
            let (status, _) = send(&app, post_json("/api/v1/register", &payload.to_string())).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, first) = send(&app, get("/api/v1/all")).await;
        assert_eq!(status, StatusCode::OK);

        let users = first["users"].as_array().unwrap();
        let names: Vec<_> = users.iter().map(|u| u["firstName"].clone()).collect();
        let ids: Vec<_> = users.iter().map(|u| u["id"].clone()).collect();
        assert_eq!(names, vec![json!("ada"), json!("grace"), json!("barbara")]);
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);

        let (_, second) = send(&app, get("/api/v1/all")).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn rejects_null_fields_as_missing() {
        let storage = InMemoryUserStorage::new();
        let app = routes(storage.clone());

        let (status, body) = send(
            &app,
            post_json(
                "/api/v1/register",
                r#"{"firstName":"A","lastName":null,"email":"a@b.com","password":"x"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required fields" }));
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failures_are_server_errors() {
        let app = routes(UnavailableStorage);

        let (status, body) = send(
            &app,
            post_json(
                "/api/v1/register",
                r#"{"firstName":"A","lastName":"B","email":"a@b.com","password":"x"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": STORAGE_ERROR }));

        let (status, body) = send(&app, get("/api/v1/all")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": STORAGE_ERROR }));
    }

    #[tokio::test]
    async fn validation_runs_before_a_failing_store() {
        let app = routes(UnavailableStorage);
        let (status, body) = send(&app, post_json("/register", "{}")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required fields" }));
    }

    #[tokio::test]
    async fn serves_the_docs_ui() {
        let app = routes(InMemoryUserStorage::new());

        for uri in ["/swagger", "/swagger/", "/swagger/index.html"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);

            let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
            assert!(content_type.starts_with("text/html"), "{}", uri);
        }
    }

    #[tokio::test]
    async fn serves_the_api_document() {
        let app = routes(InMemoryUserStorage::new());
        let (status, body) = send(&app, get(API_DOCUMENT)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["info"]["title"], json!(API_TITLE));
        for path in ["/api/v1/ping", "/api/v1/register", "/api/v1/all"] {
            assert!(body["paths"].get(path).is_some(), "missing {}", path);
        }
    }
}
