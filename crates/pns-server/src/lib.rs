//! HTTP gateway for the Public Name System.
//!
//! Exposes name registration, service registration, storage provisioning
//! and URI resolution over JSON. Requests carrying a bearer token act with an
//! authorized session; anonymous requests get a read-only one.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{AllowAllAuth, AuthProvider, Credentials, StaticTokenAuth};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::PnsServer;
pub use state::{AppState, Persistence};

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use pns_types::ContainerAddress;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app() -> Router {
        PnsServer::open(ServerConfig::default()).unwrap().router()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, "Bearer test-token")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send(&app(), get("/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn info_endpoint() {
        let (status, body) = send(&app(), get("/v1/info")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default_scheme"], "safe");
    }

    #[tokio::test]
    async fn register_and_resolve_name() {
        let app = app();
        let (status, created) = send(&app, post("/v1/names", json!({ "name": "happybeing" }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, resolved) = send(&app, get("/v1/names/happybeing")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resolved["services_container"], created["services_container"]);

        let (status, body) = send(&app, post("/v1/names", json!({ "name": "happybeing" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "conflict");
    }

    #[tokio::test]
    async fn unknown_name_is_404() {
        let (status, body) = send(&app(), get("/v1/names/nobody")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn mutations_require_a_token() {
        let req = Request::builder()
            .method("POST")
            .uri("/v1/names")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": "alice" }).to_string()))
            .unwrap();
        let (status, _) = send(&app(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn blank_name_is_400() {
        let (status, body) = send(&app(), post("/v1/names", json!({ "name": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }

    #[tokio::test]
    async fn services_round_trip() {
        let app = app();
        send(&app, post("/v1/names", json!({ "name": "happybeing" }))).await;
        let resource = ContainerAddress::from_hash([9; 32]).to_hex();

        let (status, registered) = send(
            &app,
            post(
                "/v1/names/happybeing/services",
                json!({ "sub_name": "blog", "resource": resource }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(registered["key"], "blog");
        assert_eq!(registered["version"], 0);

        let (status, body) = send(&app, get("/v1/names/happybeing/services/blog")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resource"], resource.as_str());

        let (status, body) = send(&app, get("/v1/resolve?uri=safe://blog.happybeing")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resource"], resource.as_str());

        let (_, list) = send(&app, get("/v1/names/happybeing/services")).await;
        assert_eq!(list.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn reserved_service_filled_later() {
        let app = app();
        send(&app, post("/v1/names", json!({ "name": "happybeing" }))).await;
        let (status, body) = send(
            &app,
            post("/v1/names/happybeing/reservations", json!({ "sub_name": "files" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["key"], "files");

        let resource = ContainerAddress::from_hash([4; 32]).to_hex();
        let (status, registered) = send(
            &app,
            post(
                "/v1/names/happybeing/services",
                json!({ "sub_name": "files", "resource": resource }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(registered["version"], 1);
    }

    #[tokio::test]
    async fn provision_storage_endpoint() {
        let app = app();
        let (status, body) = send(
            &app,
            post(
                "/v1/storage",
                json!({ "identity_uri": "safe://happybeing", "hosting_sub_name": "files" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["uri"], "safe://files.files-happybeing");

        let (status, resolved) = send(&app, get("/v1/resolve?uri=safe://files.files-happybeing")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resolved["resource"], body["folder"]);
    }

    #[tokio::test]
    async fn provisioning_publishes_to_profile() {
        let app = app();
        let (status, created) = send(
            &app,
            post(
                "/v1/profiles",
                json!({ "uri": "safe://happybeing", "nick": "happybeing" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let address = created["address"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            post(
                "/v1/storage",
                json!({
                    "identity_uri": "safe://happybeing",
                    "hosting_sub_name": "files",
                    "profile": address,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, get(&format!("/v1/profiles/{address}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["storage"], "safe://files.files-happybeing");
        assert_eq!(body["version"], 1);
    }

    #[tokio::test]
    async fn profiles_list_and_update() {
        let app = app();
        let (_, created) = send(
            &app,
            post("/v1/profiles", json!({ "uri": "safe://happybeing", "nick": "hb" })),
        )
        .await;
        let address = created["address"].as_str().unwrap().to_string();

        let mut list = get("/v1/profiles");
        list.headers_mut()
            .insert(header::AUTHORIZATION, "Bearer test-token".parse().unwrap());
        let (status, listed) = send(&app, list).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        assert_eq!(listed[0]["address"], address.as_str());

        let (_, anonymous) = send(&app, get("/v1/profiles")).await;
        assert_eq!(anonymous.as_array().map(Vec::len), Some(0));

        let update = |version: u64| {
            Request::builder()
                .method("PUT")
                .uri(format!("/v1/profiles/{address}"))
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .body(Body::from(
                    json!({
                        "profile": { "uri": "safe://happybeing", "nick": "hb", "name": "Mark" },
                        "version": version,
                    })
                    .to_string(),
                ))
                .unwrap()
        };
        let (status, body) = send(&app, update(0)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], 1);

        let (status, body) = send(&app, update(0)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "conflict");

        let (_, fetched) = send(&app, get(&format!("/v1/profiles/{address}"))).await;
        assert_eq!(fetched["profile"]["name"], "Mark");
    }

    #[tokio::test]
    async fn anonymous_reads_can_be_disabled() {
        let config = ServerConfig {
            allow_anonymous_read: false,
            ..Default::default()
        };
        let app = PnsServer::open(config).unwrap().router();
        let (status, _) = send(&app, get("/v1/names")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mutations_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let config = ServerConfig {
            state_file: Some(path.clone()),
            ..Default::default()
        };
        let app = PnsServer::open(config.clone()).unwrap().router();
        let (status, _) = send(&app, post("/v1/names", json!({ "name": "kept" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(path.exists());

        let reopened = PnsServer::open(config).unwrap().router();
        let (status, _) = send(&reopened, get("/v1/names/kept")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_all_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let config = ServerConfig {
            state_file: Some(path.clone()),
            ..Default::default()
        };
        let app = PnsServer::open(config).unwrap().router();

        let mut handles = Vec::new();
        for i in 0..32 {
            let app = app.clone();
            handles.push(tokio::spawn(async move {
                send(&app, post("/v1/names", json!({ "name": format!("name-{i}") }))).await
            }));
        }
        for h in handles {
            let (status, _) = h.await.unwrap();
            assert_eq!(status, StatusCode::CREATED);
        }

        let network = pns_store::InMemoryNetwork::load(&path).unwrap();
        let pns = pns_registry::Pns::new(
            std::sync::Arc::new(network),
            pns_registry::RegistryConfig::default(),
        );
        let names = pns
            .directory
            .list_names(&pns_store::Session::unregistered("test"))
            .await
            .unwrap();
        assert_eq!(names.len(), 32);
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
