use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use pns_registry::{ProfileSummary, ProvisionedStorage, RegisteredService, ServiceRecord};
use pns_types::{ContainerAddress, IdentityProfile, HOSTING_SERVICE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

fn default_service() -> String {
    HOSTING_SERVICE.to_string()
}

fn parse_address(raw: &str) -> ServerResult<ContainerAddress> {
    ContainerAddress::from_hex(raw).map_err(|e| ServerError::BadRequest(e.to_string()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NameView {
    pub name: String,
    pub services_container: ContainerAddress,
}

#[derive(Debug, Deserialize)]
pub struct RegisterNameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterServiceRequest {
    pub sub_name: String,
    #[serde(default = "default_service")]
    pub service_name: String,
    pub resource: ContainerAddress,
}

#[derive(Debug, Deserialize)]
pub struct ReserveServiceRequest {
    pub sub_name: String,
    #[serde(default = "default_service")]
    pub service_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ServiceQuery {
    #[serde(default = "default_service")]
    pub service: String,
}

#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    pub identity_uri: String,
    pub hosting_sub_name: String,
    #[serde(default)]
    pub storage_prefix: Option<String>,
    /// Profile container that receives the storage URI.
    #[serde(default)]
    pub profile: Option<ContainerAddress>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub profile: IdentityProfile,
    /// Version the caller read the profile at.
    pub version: u64,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub uri: String,
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "pns-server",
        "version": env!("CARGO_PKG_VERSION"),
        "default_scheme": state.pns.config.default_scheme,
        "anonymous_read": state.allow_anonymous_read,
    }))
}

pub async fn list_names(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<Json<Vec<NameView>>> {
    let session = state.reader(&headers).await?;
    let names = state.pns.directory.list_names(&session).await?;
    Ok(Json(
        names
            .into_iter()
            .map(|(name, services_container)| NameView {
                name: name.to_string(),
                services_container,
            })
            .collect(),
    ))
}

pub async fn register_name(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterNameRequest>,
) -> ServerResult<(StatusCode, Json<NameView>)> {
    let session = state.writer(&headers).await?;
    let services_container = state.pns.directory.register_name(&session, &req.name).await?;
    state.persist().await;
    Ok((
        StatusCode::CREATED,
        Json(NameView {
            name: req.name.trim().to_string(),
            services_container,
        }),
    ))
}

pub async fn resolve_name(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> ServerResult<Json<NameView>> {
    let session = state.reader(&headers).await?;
    let services_container = state.pns.directory.resolve_name(&session, &name).await?;
    Ok(Json(NameView {
        name,
        services_container,
    }))
}

pub async fn list_services(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> ServerResult<Json<Vec<ServiceRecord>>> {
    let session = state.reader(&headers).await?;
    Ok(Json(state.pns.services.list_services(&session, &name).await?))
}

pub async fn register_service(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(req): Json<RegisterServiceRequest>,
) -> ServerResult<(StatusCode, Json<RegisteredService>)> {
    let session = state.writer(&headers).await?;
    let registered = state
        .pns
        .services
        .register_service(&session, &name, &req.sub_name, &req.service_name, &req.resource)
        .await?;
    state.persist().await;
    Ok((StatusCode::CREATED, Json(registered)))
}

pub async fn reserve_service(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(req): Json<ReserveServiceRequest>,
) -> ServerResult<(StatusCode, Json<Value>)> {
    let session = state.writer(&headers).await?;
    let key = state
        .pns
        .services
        .reserve_service(&session, &name, &req.sub_name, &req.service_name)
        .await?;
    state.persist().await;
    Ok((StatusCode::CREATED, Json(json!({ "key": key }))))
}

pub async fn resolve_service(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((name, sub_name)): Path<(String, String)>,
    Query(query): Query<ServiceQuery>,
) -> ServerResult<Json<Value>> {
    let session = state.reader(&headers).await?;
    let resource = state
        .pns
        .services
        .resolve_service(&session, &name, &sub_name, &query.service)
        .await?;
    Ok(Json(json!({ "resource": resource })))
}

pub async fn provision_storage(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ProvisionRequest>,
) -> ServerResult<(StatusCode, Json<ProvisionedStorage>)> {
    let session = state.writer(&headers).await?;
    let provisioner = &state.pns.provisioner;
    let prefix = req.storage_prefix.as_deref();
    let result = match &req.profile {
        Some(profile) => {
            provisioner
                .provision_and_publish(
                    &session,
                    &req.identity_uri,
                    &req.hosting_sub_name,
                    prefix,
                    &state.pns.profiles,
                    profile,
                )
                .await
        }
        None => {
            provisioner
                .provision_storage(&session, &req.identity_uri, &req.hosting_sub_name, prefix)
                .await
        }
    };
    // Partial progress is committed either way.
    state.persist().await;
    Ok((StatusCode::CREATED, Json(result?)))
}

pub async fn resolve_uri(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ResolveQuery>,
) -> ServerResult<Json<Value>> {
    let session = state.reader(&headers).await?;
    let resource = state
        .pns
        .services
        .resolve_uri(&session, &query.uri, &state.pns.config.default_scheme)
        .await?;
    Ok(Json(json!({ "uri": query.uri, "resource": resource })))
}

pub async fn create_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(profile): Json<IdentityProfile>,
) -> ServerResult<(StatusCode, Json<Value>)> {
    let session = state.writer(&headers).await?;
    let address = state.pns.profiles.create_profile(&session, profile).await?;
    state.persist().await;
    Ok((StatusCode::CREATED, Json(json!({ "address": address }))))
}

pub async fn fetch_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(address): Path<String>,
) -> ServerResult<Json<Value>> {
    let session = state.reader(&headers).await?;
    let address = parse_address(&address)?;
    let (profile, version) = state.pns.profiles.fetch_profile(&session, &address).await?;
    Ok(Json(json!({ "profile": profile, "version": version })))
}

pub async fn list_profiles(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<Json<Vec<ProfileSummary>>> {
    let session = state.reader(&headers).await?;
    Ok(Json(state.pns.profiles.list_profiles(&session).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(address): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> ServerResult<Json<Value>> {
    let session = state.writer(&headers).await?;
    let address = parse_address(&address)?;
    let version = state
        .pns
        .profiles
        .update_profile(&session, &address, req.profile, req.version)
        .await?;
    state.persist().await;
    Ok(Json(json!({ "address": address, "version": version })))
}
