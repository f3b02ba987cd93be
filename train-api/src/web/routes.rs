//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, Uri, header},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::domain::{Location, TimeTable};

use super::auth::{AUTHORIZATION_SCHEME, require_token};
use super::dto::*;
use super::state::AppState;

/// Path prefix of the current API version, e.g. `/api/v0`.
pub fn api_base_path() -> String {
    format!("/api/v{}", VersionInfo::current().major)
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/hello", get(hello))
        .route("/status", get(status))
        .route("/locations", get(locations))
        .route("/operators", get(operators))
        .route("/journeys", get(journeys));

    let powered_by = HeaderValue::from_str(&format!("Train API v{}", VersionInfo::current()))
        .unwrap_or_else(|_| HeaderValue::from_static("Train API"));

    Router::new()
        .route("/", get(redirect_root))
        .nest(&api_base_path(), api)
        .route("/api/*path", get(redirect_unversioned))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-powered-by"),
            powered_by,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::USER_AGENT,
                ]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn redirect_root() -> Redirect {
    Redirect::temporary(&api_base_path())
}

/// Send `/api/<path>` to the current version's `/api/v<major>/<path>`.
async fn redirect_unversioned(Path(path): Path<String>, uri: Uri) -> Result<Redirect, AppError> {
    let versioned = path
        .strip_prefix(['v', 'V'])
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit());
    if versioned || path.is_empty() {
        return Err(AppError::NotFound(uri.path().to_string()));
    }

    let target = match uri.query() {
        Some(query) => format!("{}/{path}?{query}", api_base_path()),
        None => format!("{}/{path}", api_base_path()),
    };
    Ok(Redirect::temporary(&target))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

async fn hello() -> Json<ApiResponse<HelloData>> {
    Json(ApiResponse::success(HelloData {
        version: VersionInfo::current(),
    }))
}

async fn status(State(state): State<AppState>) -> Json<ApiResponse<StatusData>> {
    Json(ApiResponse::success(StatusData {
        ready: state.refresher.published().is_ready().await,
        refresh: state.refresher.status().await,
    }))
}

async fn locations(
    State(state): State<AppState>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<ApiResponse<LocationsData>>, AppError> {
    let timetable = state.timetable().await?;

    let stations_only = match query.kind.as_deref() {
        None => false,
        Some("station") => true,
        Some("") => return Err(AppError::EmptyQueryParameter("type")),
        Some(other) => {
            return Err(AppError::InvalidQueryParameter {
                name: "type",
                value: other.to_string(),
            });
        }
    };

    let locations = timetable
        .locations()
        .iter()
        .filter(|location| !stations_only || location.is_station())
        .map(|location| LocationResult::from_location(location))
        .collect();

    Ok(Json(ApiResponse::success(LocationsData {
        kind: query.kind,
        locations,
    })))
}

async fn operators(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OperatorsData>>, AppError> {
    let timetable = state.timetable().await?;
    let operators = timetable
        .operators()
        .iter()
        .map(|operator| OperatorResult::from_operator(operator))
        .collect();
    Ok(Json(ApiResponse::success(OperatorsData { operators })))
}

async fn journeys(
    State(state): State<AppState>,
    Query(query): Query<JourneysQuery>,
) -> Result<Json<ApiResponse<JourneysData>>, AppError> {
    let timetable = state.timetable().await?;

    let from = resolve_location(&timetable, "from", query.from.as_deref())?;
    let to = resolve_location(&timetable, "to", query.to.as_deref())?;

    let journeys = timetable
        .journeys_between(from.tiploc.as_str(), to.tiploc.as_str())
        .into_iter()
        .map(|journey| JourneyResult::from_journey(journey, &timetable))
        .collect();

    Ok(Json(ApiResponse::success(JourneysData {
        from: from.tiploc.as_str().to_string(),
        to: to.tiploc.as_str().to_string(),
        journeys,
    })))
}

/// Look up a query parameter as a TIPLOC, then as a station's CRS code.
fn resolve_location(
    timetable: &TimeTable,
    name: &'static str,
    value: Option<&str>,
) -> Result<Arc<Location>, AppError> {
    let value = match value {
        None => return Err(AppError::MissingQueryParameter(name)),
        Some("") => return Err(AppError::EmptyQueryParameter(name)),
        Some(value) => value,
    };

    let upper = value.to_ascii_uppercase();
    timetable
        .location(&upper)
        .or_else(|| timetable.location_by_crs(&upper))
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("location '{value}'")))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    InvalidAuthorizationHeader(String),
    BadAuthorization,
    NotReady,
    EmptyQueryParameter(&'static str),
    InvalidQueryParameter { name: &'static str, value: String },
    MissingQueryParameter(&'static str),
    NotFound(String),
}

impl AppError {
    fn status(&self) -> (StatusCode, ApiStatus) {
        match self {
            AppError::InvalidAuthorizationHeader(_) => (
                StatusCode::UNAUTHORIZED,
                ApiStatus::InvalidAuthorizationHeader,
            ),
            AppError::BadAuthorization => (StatusCode::UNAUTHORIZED, ApiStatus::BadAuthorization),
            AppError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiStatus::TimeTableNotReady,
            ),
            AppError::EmptyQueryParameter(_) => (
                StatusCode::BAD_REQUEST,
                ApiStatus::OmitEmptyQueryParameters,
            ),
            AppError::InvalidQueryParameter { .. } => (
                StatusCode::BAD_REQUEST,
                ApiStatus::InvalidQueryParameterValue,
            ),
            AppError::MissingQueryParameter(_) => {
                (StatusCode::BAD_REQUEST, ApiStatus::MissingQueryParameter)
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ApiStatus::NotFound),
        }
    }

    fn reason(&self) -> String {
        match self {
            AppError::InvalidAuthorizationHeader(reason) => reason.clone(),
            AppError::BadAuthorization => {
                "Invalid Authorization HTTP request header token".to_string()
            }
            AppError::NotReady => {
                "Initially loading Darwin Push Port time-table, try again soon.".to_string()
            }
            AppError::EmptyQueryParameter(name) => {
                format!("Omit query parameter '{name}' with empty value.")
            }
            AppError::InvalidQueryParameter { name, value } => {
                format!("Value '{value}' is not valid for query parameter '{name}'.")
            }
            AppError::MissingQueryParameter(name) => {
                format!("Query parameter '{name}' is required.")
            }
            AppError::NotFound(what) => format!("Not found: {what}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, api_status) = self.status();
        let reason = self.reason();

        if status.is_server_error() {
            warn!(%status, %reason, "request failed");
        } else {
            debug!(%status, %reason, "request rejected");
        }

        let body = Json(ApiResponse {
            status: api_status,
            data: ErrorData { reason },
        });

        match self {
            AppError::InvalidAuthorizationHeader(_) | AppError::BadAuthorization => (
                status,
                [(header::WWW_AUTHENTICATE, AUTHORIZATION_SCHEME)],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{HeaderMap, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::cache::{CacheKeys, KeyValueCache, MemoryCache};
    use crate::ingest::{DEFAULT_NAMESPACE, SnapshotSelector, SyncConfig, Synchronizer};
    use crate::published::PublishedTimeTable;
    use crate::refresh::Refresher;
    use crate::store::MemoryStore;
    use crate::test_fixtures::{REFERENCE_NAME, REFERENCE_XML, TIMETABLE_NAME, TIMETABLE_XML};

    const TOKEN: &str = "Token secret";

    async fn app(ready: bool) -> Router {
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                format!("PPTimetable/{TIMETABLE_NAME}.xml"),
                TIMETABLE_XML,
                Some("\"t\""),
                None,
            )
            .await;
        store
            .put(
                format!("PPTimetable/{REFERENCE_NAME}.xml"),
                REFERENCE_XML,
                Some("\"r\""),
                None,
            )
            .await;

        let cache: Arc<dyn KeyValueCache> = Arc::new(MemoryCache::default());
        let keys = CacheKeys::default();
        let synchronizer =
            Synchronizer::new(store, cache.clone(), keys.clone(), SyncConfig::default());
        let selector = SnapshotSelector::new(cache, keys, DEFAULT_NAMESPACE);
        let refresher = Arc::new(Refresher::new(
            synchronizer,
            selector,
            PublishedTimeTable::new(),
        ));
        if ready {
            refresher.refresh().await.unwrap();
        }
        create_router(AppState::new(refresher, "secret"))
    }

    async fn send(
        app: Router,
        uri: &str,
        authorization: Option<&str>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut request = Request::builder().uri(uri);
        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn api(path: &str) -> String {
        format!("{}{path}", api_base_path())
    }

    #[tokio::test]
    async fn hello_reports_version() {
        let (status, headers, body) = send(app(false).await, &api("/hello"), Some(TOKEN)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], 0);
        assert_eq!(
            body["data"]["version"]["major"],
            VersionInfo::current().major
        );
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert!(
            headers["x-powered-by"]
                .to_str()
                .unwrap()
                .starts_with("Train API v")
        );
    }

    #[tokio::test]
    async fn missing_authorization_header() {
        let (status, headers, body) = send(app(false).await, &api("/hello"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 1);
        assert_eq!(headers[header::WWW_AUTHENTICATE], "Token");
    }

    #[tokio::test]
    async fn wrong_scheme() {
        let (status, _, body) = send(app(false).await, &api("/hello"), Some("Bearer secret")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 1);
    }

    #[tokio::test]
    async fn wrong_token() {
        let (status, headers, body) =
            send(app(false).await, &api("/hello"), Some("Token nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 2);
        assert_eq!(headers[header::WWW_AUTHENTICATE], "Token");
    }

    #[tokio::test]
    async fn redirects_to_current_version() {
        let (status, headers, _) = send(app(false).await, "/", Some(TOKEN)).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(headers[header::LOCATION], api_base_path().as_str());

        let (status, headers, _) = send(app(false).await, "/api/hello?x=1", Some(TOKEN)).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(headers[header::LOCATION], api("/hello?x=1").as_str());
    }

    #[tokio::test]
    async fn unknown_versioned_route_is_not_found() {
        let (status, _, body) = send(app(false).await, "/api/v99/hello", Some(TOKEN)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 7);
    }

    #[tokio::test]
    async fn not_ready_before_first_refresh() {
        let app = app(false).await;

        let (status, _, body) = send(
            app.clone(),
            &api("/journeys?from=PADTLL&to=PLYMTH"),
            Some(TOKEN),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], 3);

        let (status, _, body) = send(app, &api("/status"), Some(TOKEN)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["ready"], false);
        assert_eq!(body["data"]["refresh"]["state"], "idle");
    }

    #[tokio::test]
    async fn status_after_refresh() {
        let (_, _, body) = send(app(true).await, &api("/status"), Some(TOKEN)).await;
        assert_eq!(body["data"]["ready"], true);
        assert_eq!(body["data"]["refresh"]["timetable_id"], "20240315020000");
        assert!(body["data"]["refresh"]["last_success"].is_string());
    }

    #[tokio::test]
    async fn locations_filtering() {
        let app = app(true).await;

        let (status, _, body) = send(app.clone(), &api("/locations"), Some(TOKEN)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["locations"].as_array().unwrap().len(), 5);

        let (_, _, body) = send(app.clone(), &api("/locations?type=station"), Some(TOKEN)).await;
        let tiplocs: Vec<&str> = body["data"]["locations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["tiploc"].as_str().unwrap())
            .collect();
        assert_eq!(body["data"]["type"], "station");
        assert!(!tiplocs.contains(&"ROYAOJN"));
        assert_eq!(tiplocs.len(), 4);

        let (status, _, body) = send(app.clone(), &api("/locations?type="), Some(TOKEN)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 4);

        let (status, _, body) = send(app, &api("/locations?type=junction"), Some(TOKEN)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 5);
    }

    #[tokio::test]
    async fn operators_listed() {
        let (_, _, body) = send(app(true).await, &api("/operators"), Some(TOKEN)).await;
        let codes: Vec<&str> = body["data"]["operators"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes, ["GW", "XC"]);
    }

    #[tokio::test]
    async fn journeys_between_locations() {
        let app = app(true).await;
        let rids = |body: &Value| -> Vec<String> {
            body["data"]["journeys"]
                .as_array()
                .unwrap()
                .iter()
                .map(|j| j["rid"].as_str().unwrap().to_string())
                .collect()
        };

        let (status, _, body) =
            send(app.clone(), &api("/journeys?from=PADTLL&to=PLYMTH"), Some(TOKEN)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rids(&body), ["202403157800002", "202403157800001"]);

        // CRS codes resolve to their stations
        let (_, _, body) = send(app.clone(), &api("/journeys?from=pad&to=PLY"), Some(TOKEN)).await;
        assert_eq!(body["data"]["from"], "PADTLL");
        assert_eq!(rids(&body), ["202403157800002", "202403157800001"]);

        let (status, _, body) = send(app.clone(), &api("/journeys?from=PADTLL"), Some(TOKEN)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 6);

        let (status, _, body) =
            send(app, &api("/journeys?from=PADTLL&to=NOWHERE"), Some(TOKEN)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 7);
    }

    #[tokio::test]
    async fn cors_preflight_skips_authorization() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(api("/hello"))
            .header(header::ORIGIN, "https://example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app(false).await.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
