use crate::core::engine;
use crate::core::error::GenerateError;
use crate::core::model::ArtifactKind;
use crate::core::params::{ParamInfo, ParameterSet};
use crate::report::zip::{bundle_bytes, bundle_file_name};
use crate::server::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

const DISABLED: &str = "SSH/job submission disabled in this build";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed request: {0}")]
    Body(#[from] serde_json::Error),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("bundle task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl ApiResponse {
    fn failure(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        })
    }
}

fn reject(route: &'static str, err: ApiError) -> Json<ApiResponse> {
    warn!(route, error = %err, "request failed");
    ApiResponse::failure(err.to_string())
}

#[derive(Deserialize)]
struct LoadRequest {
    config_id: String,
}

#[derive(Deserialize)]
struct PreviewRequest {
    filename: String,
    #[serde(default)]
    params: Value,
}

#[derive(Deserialize)]
struct DownloadRequest {
    #[serde(default)]
    params: Value,
}

/// An empty body decodes like `{}`.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}

#[derive(Serialize)]
pub struct ArtifactSchema {
    pub name: &'static str,
    pub path: &'static str,
    pub parameters: Vec<ParamInfo>,
}

pub async fn schema() -> Json<Vec<ArtifactSchema>> {
    Json(
        ArtifactKind::ALL
            .into_iter()
            .map(|kind| ArtifactSchema {
                name: kind.file_name(),
                path: kind.path(),
                parameters: engine::schema(kind),
            })
            .collect(),
    )
}

pub async fn save_config(State(state): State<AppState>, body: Bytes) -> Json<ApiResponse> {
    let saved = decode::<Value>(&body)
        .and_then(|value| Ok(ParameterSet::from_value(value)?))
        .map(|params| state.store.put(params));
    match saved {
        Ok(id) => {
            info!(config_id = %id, stored = state.store.len(), "configuration saved");
            Json(ApiResponse {
                success: true,
                config_id: Some(id.to_string()),
                ..ApiResponse::default()
            })
        }
        Err(e) => reject("save_config", e),
    }
}

pub async fn load_config(State(state): State<AppState>, body: Bytes) -> Json<ApiResponse> {
    let loaded = decode::<LoadRequest>(&body)
        .and_then(|req| Ok(state.store.load(&req.config_id)?));
    match loaded {
        Ok(params) => Json(ApiResponse {
            success: true,
            config: Some(params.into_value()),
            ..ApiResponse::default()
        }),
        Err(e) => {
            if let ApiError::Generate(GenerateError::ConfigNotFound(id)) = &e {
                info!(config_id = %id, "unknown configuration id");
            }
            reject("load_config", e)
        }
    }
}

pub async fn generate_config_preview(body: Bytes) -> Json<ApiResponse> {
    let rendered = decode::<PreviewRequest>(&body).and_then(|req| {
        let params = ParameterSet::from_value(req.params)?;
        Ok(engine::preview(&req.filename, &params)?)
    });
    match rendered {
        Ok(content) => Json(ApiResponse {
            success: true,
            content: Some(content),
            ..ApiResponse::default()
        }),
        Err(e) => reject("generate_config_preview", e),
    }
}

pub async fn download_configs_zip(State(state): State<AppState>, body: Bytes) -> Response {
    match build_bundle(&state, &body).await {
        Ok(bytes) => {
            let name = bundle_file_name(Local::now().naive_local());
            info!(file = %name, bytes = bytes.len(), "bundle downloaded");
            (
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", name),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => reject("download_configs_zip", e).into_response(),
    }
}

async fn build_bundle(state: &AppState, body: &[u8]) -> Result<Vec<u8>, ApiError> {
    let req: DownloadRequest = decode(body)?;
    let params = ParameterSet::from_value(req.params)?;
    let layout = Arc::clone(&state.layout);
    let bytes = tokio::task::spawn_blocking(move || {
        let configs = engine::generate_configs(&params)?;
        bundle_bytes(&layout, &configs)
    })
    .await??;
    Ok(bytes)
}

pub async fn disabled() -> Json<ApiResponse> {
    ApiResponse::failure(DISABLED)
}

#[cfg(test)]
mod tests {
    use crate::report::zip::BundleLayout;
    use crate::server::{AppState, build_router};
    use crate::store::InMemoryConfigStore;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use std::io::{Cursor, Read};
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(root: &Path) -> Router {
        let state = AppState::new(Arc::new(InMemoryConfigStore::new()), BundleLayout::new(root));
        build_router(state)
    }

    async fn post_raw(app: &Router, uri: &str, body: String) -> (StatusCode, String, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, bytes.to_vec())
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> Value {
        let (status, _, bytes) = post_raw(app, uri, body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let config = json!({ "protein_name": "ubq", "nstlim": "40000", "enable_gpu_parallelization": true });
        let saved = post_json(&app, "/api/save_config", config.clone()).await;
        assert_eq!(saved["success"], true);
        let id = saved["config_id"].as_str().unwrap().to_string();

        let loaded = post_json(&app, "/api/load_config", json!({ "config_id": id })).await;
        assert_eq!(loaded["success"], true);
        assert_eq!(loaded["config"], config);
    }

    #[tokio::test]
    async fn loading_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let resp = post_json(&app, "/api/load_config", json!({ "config_id": "missing" })).await;
        assert_eq!(resp["success"], false);
        assert_eq!(resp["error"], "Configuration not found");
    }

    #[tokio::test]
    async fn preview_renders_requested_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let resp = post_json(
            &app,
            "/api/generate_config_preview",
            json!({ "filename": "west.cfg", "params": { "nstlim": "50000", "ntpr": "500" } }),
        )
        .await;
        assert_eq!(resp["success"], true);
        assert!(resp["content"].as_str().unwrap().contains("pcoord_len: 101\n"));

        let resp = post_json(
            &app,
            "/api/generate_config_preview",
            json!({ "filename": "runseg.sh", "params": { "enable_gpu_parallelization": false } }),
        )
        .await;
        assert!(!resp["content"].as_str().unwrap().contains("CUDA_DEVICES"));
    }

    #[tokio::test]
    async fn preview_of_unknown_file_names_it() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let resp = post_json(
            &app,
            "/api/generate_config_preview",
            json!({ "filename": "md.in", "params": {} }),
        )
        .await;
        assert_eq!(resp["success"], false);
        assert_eq!(resp["error"], "Configuration file md.in not found");
    }

    #[tokio::test]
    async fn malformed_bodies_get_structured_failures() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let (status, _, bytes) =
            post_raw(&app, "/api/save_config", "{not json".to_string()).await;
        assert_eq!(status, StatusCode::OK);
        let resp: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(resp["success"], false);
        assert!(resp["error"].as_str().unwrap().starts_with("malformed request"));

        let resp = post_json(&app, "/api/load_config", json!({})).await;
        assert_eq!(resp["success"], false);
    }

    #[tokio::test]
    async fn download_overrides_static_copies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("westpa_scripts")).unwrap();
        std::fs::write(dir.path().join("westpa_scripts/runseg.sh"), "STATIC").unwrap();
        std::fs::write(dir.path().join("init.sh"), "init").unwrap();
        let app = app(dir.path());

        let (status, content_type, bytes) = post_raw(
            &app,
            "/api/download_configs_zip",
            json!({ "params": { "protein_name": "RENDERED" } }).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/zip");

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 6);
        let mut runseg = String::new();
        archive
            .by_name("westpa_scripts/runseg.sh")
            .unwrap()
            .read_to_string(&mut runseg)
            .unwrap();
        assert!(runseg.contains("common_files/RENDERED.prmtop"));
        assert!(!runseg.contains("STATIC"));
        assert!(archive.by_name("init.sh").is_ok());
    }

    #[tokio::test]
    async fn download_with_bad_parameter_reports_it() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let resp = post_json(
            &app,
            "/api/download_configs_zip",
            json!({ "params": { "nstlim": "abc" } }),
        )
        .await;
        assert_eq!(resp["success"], false);
        assert!(resp["error"].as_str().unwrap().contains("nstlim"));
    }

    #[tokio::test]
    async fn job_control_routes_are_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        for uri in ["/api/setup_experiment", "/api/get_job_status"] {
            let resp = post_json(&app, uri, json!({})).await;
            assert_eq!(resp["success"], false);
            assert_eq!(resp["error"], "SSH/job submission disabled in this build");
        }
    }
}
