//! Depot REST API server binary.
//!
//! ## Purpose
//! Thin HTTP transport over the Depot core: uploads and replaces go through
//! the ingest pipeline, downloads, deletions, and listings go straight to the
//! artifact store. No core logic lives here.
//!
//! ## Intended use
//! Run with `DEPOT_DATA_DIR` pointing at the artifact directory (created on
//! startup if absent) and `DEPOT_REST_ADDR` for the bind address. OpenAPI
//! documentation is served at `/swagger-ui`.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use depot_core::config::{resolve_artifact_dir, CoreConfig};
use depot_core::ingest::{IngestPipeline, IngestReceipt, WriteMode};
use depot_core::{ArtifactStore, CoreError, StoreError, JSON_EXTENSION};

mod payloads;
use payloads::{FileInfo, HealthRes, UploadFileResponse};

/// Uploads larger than this are rejected by the transport before ingest.
const UPLOAD_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Application state for the REST API server
///
/// Holds the ingest pipeline (and through it the artifact store) shared by
/// all request handlers.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<IngestPipeline>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        upload_file,
        replace_file,
        download_file,
        delete_file,
        files_by_owner,
        files_by_kind,
        files_by_date,
    ),
    components(schemas(UploadFileResponse, FileInfo, HealthRes))
)]
struct ApiDoc;

/// Main entry point for the Depot REST API server
///
/// # Environment Variables
/// - `DEPOT_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `DEPOT_DATA_DIR`: Artifact store root (default: "artifact_data")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the artifact store root cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("depot_api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("DEPOT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting Depot REST API on {}", addr);

    let artifact_dir =
        resolve_artifact_dir(std::env::var("DEPOT_DATA_DIR").ok().map(PathBuf::from));
    let cfg = CoreConfig::new(artifact_dir);
    let store = ArtifactStore::open(cfg.artifact_dir())?;
    tracing::info!("-- Artifact store at {}", store.root().display());

    let state = AppState {
        pipeline: Arc::new(IngestPipeline::new(store)),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/files", axum::routing::post(upload_file).put(replace_file))
        .route("/files/:name", get(download_file).delete(delete_file))
        .route("/files/by-owner/:owner", get(files_by_owner))
        .route("/files/by-kind/:kind", get(files_by_kind))
        .route("/files/by-date/:date", get(files_by_date))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Depot REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/files",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File converted and stored", body = UploadFileResponse),
        (status = 400, description = "Unsafe filename or malformed request"),
        (status = 409, description = "An artifact with this name already exists"),
        (status = 422, description = "Filename or document failed validation"),
        (status = 500, description = "Internal server error")
    )
)]
/// Upload a new XML document
///
/// Validates the uploaded filename against the naming convention, converts
/// the XML records to JSON, and stores the result under the derived name.
/// Refuses to overwrite an existing artifact; use the `PUT` route for that.
#[axum::debug_handler]
async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (name, bytes) = read_upload_part(multipart).await?;
    let receipt = state
        .pipeline
        .ingest(&name, &bytes, WriteMode::Create)
        .map_err(reject)?;

    Ok((StatusCode::CREATED, Json(upload_response(receipt))))
}

#[utoipa::path(
    put,
    path = "/files",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File converted and stored, replacing any previous artifact", body = UploadFileResponse),
        (status = 400, description = "Unsafe filename or malformed request"),
        (status = 422, description = "Filename or document failed validation"),
        (status = 500, description = "Internal server error")
    )
)]
/// Replace an artifact with a re-uploaded XML document
///
/// Same pipeline as upload, but persists with overwrite semantics: the
/// converted artifact replaces any existing one under the derived name.
#[axum::debug_handler]
async fn replace_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (name, bytes) = read_upload_part(multipart).await?;
    let receipt = state
        .pipeline
        .ingest(&name, &bytes, WriteMode::Overwrite)
        .map_err(reject)?;

    Ok((StatusCode::OK, Json(upload_response(receipt))))
}

#[utoipa::path(
    get,
    path = "/files/{name}",
    params(("name" = String, Path, description = "Artifact filename")),
    responses(
        (status = 200, description = "Artifact bytes as an attachment"),
        (status = 400, description = "Unsafe filename"),
        (status = 404, description = "No artifact with this name"),
        (status = 500, description = "Internal server error")
    )
)]
/// Download an artifact by filename
#[axum::debug_handler]
async fn download_file(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.pipeline.store().get(&name) {
        Ok(Some(bytes)) => {
            let content_type = detect_content_type(&name, &bytes);
            let disposition = format!("attachment; filename=\"{name}\"");
            Ok((
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            ))
        }
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("file not found: {name}"))),
        Err(e) => Err(reject_store(&e)),
    }
}

#[utoipa::path(
    delete,
    path = "/files/{name}",
    params(("name" = String, Path, description = "Artifact filename")),
    responses(
        (status = 200, description = "Artifact removed"),
        (status = 400, description = "Unsafe filename"),
        (status = 404, description = "No artifact with this name"),
        (status = 500, description = "Internal server error")
    )
)]
/// Delete an artifact by filename
#[axum::debug_handler]
async fn delete_file(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.pipeline.store().delete(&name) {
        Ok(true) => Ok((StatusCode::OK, format!("{name} was successfully deleted"))),
        Ok(false) => Err((StatusCode::NOT_FOUND, format!("{name} cannot be deleted"))),
        Err(e) => Err(reject_store(&e)),
    }
}

#[utoipa::path(
    get,
    path = "/files/by-owner/{owner}",
    params(("owner" = String, Path, description = "Owner substring to match")),
    responses(
        (status = 200, description = "Matching artifacts", body = [FileInfo]),
        (status = 500, description = "Internal server error")
    )
)]
/// List artifacts whose name contains the owner segment
#[axum::debug_handler]
async fn files_by_owner(
    State(state): State<AppState>,
    AxumPath(owner): AxumPath<String>,
) -> Result<Json<Vec<FileInfo>>, (StatusCode, String)> {
    list_files(&state, &owner)
}

#[utoipa::path(
    get,
    path = "/files/by-kind/{kind}",
    params(("kind" = String, Path, description = "Kind tag substring to match")),
    responses(
        (status = 200, description = "Matching artifacts", body = [FileInfo]),
        (status = 500, description = "Internal server error")
    )
)]
/// List artifacts whose name contains the kind tag
#[axum::debug_handler]
async fn files_by_kind(
    State(state): State<AppState>,
    AxumPath(kind): AxumPath<String>,
) -> Result<Json<Vec<FileInfo>>, (StatusCode, String)> {
    list_files(&state, &kind)
}

#[utoipa::path(
    get,
    path = "/files/by-date/{date}",
    params(("date" = String, Path, description = "Date substring to match")),
    responses(
        (status = 200, description = "Matching artifacts", body = [FileInfo]),
        (status = 500, description = "Internal server error")
    )
)]
/// List artifacts whose name contains the date
#[axum::debug_handler]
async fn files_by_date(
    State(state): State<AppState>,
    AxumPath(date): AxumPath<String>,
) -> Result<Json<Vec<FileInfo>>, (StatusCode, String)> {
    list_files(&state, &date)
}

/// All three listing dimensions are the same plain substring match over
/// stored filenames; the store treats them identically.
fn list_files(state: &AppState, filter: &str) -> Result<Json<Vec<FileInfo>>, (StatusCode, String)> {
    let names = state
        .pipeline
        .store()
        .list(filter)
        .map_err(|e| reject_store(&e))?;

    let infos = names
        .into_iter()
        .map(|file_name| FileInfo {
            file_download_uri: download_uri(&file_name),
            file_name,
        })
        .collect();

    Ok(Json(infos))
}

/// Extracts the `file` part of a multipart upload.
async fn read_upload_part(
    mut multipart: Multipart,
) -> Result<(String, Vec<u8>), (StatusCode, String)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid multipart body: {e}"),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().map(str::to_owned).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "multipart field `file` has no filename".to_owned(),
            )
        })?;

        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("failed to read upload: {e}"),
            )
        })?;

        return Ok((name, bytes.to_vec()));
    }

    Err((
        StatusCode::BAD_REQUEST,
        "missing multipart field `file`".to_owned(),
    ))
}

fn upload_response(receipt: IngestReceipt) -> UploadFileResponse {
    UploadFileResponse {
        file_download_uri: download_uri(&receipt.stored_name),
        file_type: "application/json".to_owned(),
        file_name: receipt.stored_name,
        size_bytes: receipt.size_bytes,
    }
}

fn download_uri(name: &str) -> String {
    format!("/files/{name}")
}

/// Converted artifacts are JSON; anything else is sniffed best-effort.
fn detect_content_type(name: &str, bytes: &[u8]) -> String {
    let is_json = name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext == JSON_EXTENSION);
    if is_json {
        return "application/json".to_owned();
    }

    infer::get(bytes)
        .map(|kind| kind.mime_type().to_owned())
        .unwrap_or_else(|| "application/octet-stream".to_owned())
}

/// Maps a core pipeline failure onto an HTTP status and message.
fn reject(err: CoreError) -> (StatusCode, String) {
    let status = match &err {
        CoreError::PathTraversal(_) => StatusCode::BAD_REQUEST,
        CoreError::InvalidName(_)
        | CoreError::Xml(_)
        | CoreError::MissingRoot
        | CoreError::MissingField { .. }
        | CoreError::InvalidFieldValue { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::JsonEncode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CoreError::Store(store_err) => return reject_store(store_err),
    };

    if status.is_server_error() {
        tracing::error!("ingest failed: {err}");
    } else {
        tracing::warn!("ingest rejected: {err}");
    }
    (status, err.to_string())
}

/// Maps a store failure onto an HTTP status and message.
fn reject_store(err: &StoreError) -> (StatusCode, String) {
    let status = match err {
        StoreError::PathViolation(_) => StatusCode::BAD_REQUEST,
        StoreError::AlreadyExists(_) => StatusCode::CONFLICT,
        StoreError::InvalidRoot(_) | StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("store operation failed: {err}");
    } else {
        tracing::warn!("store operation rejected: {err}");
    }
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "depot-test-boundary";

    fn test_state(temp: &TempDir) -> AppState {
        let store = ArtifactStore::open(&temp.path().join("artifacts")).unwrap();
        AppState {
            pipeline: Arc::new(IngestPipeline::new(store)),
        }
    }

    fn seed_store(temp: &TempDir) -> ArtifactStore {
        ArtifactStore::open(&temp.path().join("artifacts")).unwrap()
    }

    fn multipart_upload(method: &str, filename: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/xml\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method(method)
            .uri("/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    const UPLOAD: &str = "<records><record>\
        <category>fiction</category>\
        <creator>A. Writer</creator>\
        <label>The Label</label>\
        <year>2021</year>\
        </record></records>";

    #[tokio::test]
    async fn health_responds_ok() {
        let temp = TempDir::new().unwrap();
        let res = app(test_state(&temp))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn upload_converts_and_stores() {
        let temp = TempDir::new().unwrap();
        let res = app(test_state(&temp))
            .oneshot(multipart_upload("POST", "inv_person_2021-07-04.xml", UPLOAD))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::CREATED);
        let json = body_json(res).await;
        assert_eq!(json["file_name"], "inv_person_2021-07-04.json");
        assert_eq!(json["file_download_uri"], "/files/inv_person_2021-07-04.json");
        assert_eq!(json["file_type"], "application/json");

        let stored = seed_store(&temp)
            .get("inv_person_2021-07-04.json")
            .unwrap()
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&stored).unwrap();
        assert_eq!(body[0]["label"], "The Label");
    }

    #[tokio::test]
    async fn upload_conflict_is_409() {
        let temp = TempDir::new().unwrap();
        let state = test_state(&temp);

        let res = app(state.clone())
            .oneshot(multipart_upload("POST", "inv_person_2021-07-04.xml", UPLOAD))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = app(state)
            .oneshot(multipart_upload("POST", "inv_person_2021-07-04.xml", UPLOAD))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn replace_overwrites() {
        let temp = TempDir::new().unwrap();
        let state = test_state(&temp);

        let res = app(state.clone())
            .oneshot(multipart_upload("POST", "inv_person_2021-07-04.xml", UPLOAD))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let updated = UPLOAD.replace("2021", "1999");
        let res = app(state)
            .oneshot(multipart_upload("PUT", "inv_person_2021-07-04.xml", &updated))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let stored = seed_store(&temp)
            .get("inv_person_2021-07-04.json")
            .unwrap()
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&stored).unwrap();
        assert_eq!(body[0]["year"], 1999);
    }

    #[tokio::test]
    async fn upload_invalid_name_is_422() {
        let temp = TempDir::new().unwrap();
        let res = app(test_state(&temp))
            .oneshot(multipart_upload("POST", "inv_alien_2021-07-04.xml", UPLOAD))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn download_found_and_absent() {
        let temp = TempDir::new().unwrap();
        seed_store(&temp)
            .put("a_person_2020-01-01.json", b"[]")
            .unwrap();
        let state = test_state(&temp);

        let res = app(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/files/a_person_2020-01-01.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(res
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("attachment"));

        let res = app(state)
            .oneshot(
                Request::builder()
                    .uri("/files/missing_person_2020-01-01.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_found_and_absent() {
        let temp = TempDir::new().unwrap();
        seed_store(&temp)
            .put("a_person_2020-01-01.json", b"[]")
            .unwrap();
        let state = test_state(&temp);

        let res = app(state.clone())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/files/a_person_2020-01-01.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app(state)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/files/a_person_2020-01-01.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_routes_share_the_substring_filter() {
        let temp = TempDir::new().unwrap();
        let store = seed_store(&temp);
        store.put("a_person_2020-01-01.json", b"[]").unwrap();
        store.put("b_company_2021-01-01.json", b"[]").unwrap();
        let state = test_state(&temp);

        for (uri, expected) in [
            ("/files/by-owner/a_", "a_person_2020-01-01.json"),
            ("/files/by-kind/company", "b_company_2021-01-01.json"),
            ("/files/by-date/2020", "a_person_2020-01-01.json"),
        ] {
            let res = app(state.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);

            let json = body_json(res).await;
            let names: Vec<&str> = json
                .as_array()
                .unwrap()
                .iter()
                .map(|info| info["file_name"].as_str().unwrap())
                .collect();
            assert_eq!(names, vec![expected], "unexpected listing for {uri}");
        }
    }
}
