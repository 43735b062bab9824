//! REST API for the idol planner.
//!
//! Provides HTTP endpoints for the board UI: manual placement, bulk packing,
//! modifier summaries and idol generation. Uses Axum and supports CORS.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::aggregator::{MatchPattern, StackedModifier, aggregate, render_summary};
use crate::catalog::Catalog;
use crate::config::{ApiConfig, OptimizerConfig};
use crate::generator::{
    DesiredModifier, Fulfillment, GenerationOutcome, GenerationRequest, generate,
};
use crate::grid::{Grid, PlacementFailure};
use crate::model::{Footprint, Idol, IdolId, Modifier, ModifierClass, ValidationError};
use crate::optimizer::{
    PackingConfig, PackingResult, PackingStrategy, optimize, optimize_with_progress,
};
use crate::types::CellPos;

#[derive(Clone)]
struct ApiState {
    catalog: Arc<Catalog>,
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>idol-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis],
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// One idol on the board, keyed by its top-left anchor.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GridPlacement {
    pub position: CellPos,
    pub idol: Idol,
}

/// Board snapshot as exchanged with the UI.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "placements": [
        {
            "position": {"row": 5, "col": 0},
            "idol": {
                "id": 1,
                "type_id": "conqueror",
                "name": "Teeming Conqueror Idol",
                "prefixes": [{
                    "id": "pack_size",
                    "name": "Teeming",
                    "text": "3% increased Pack size in your Maps",
                    "class": "prefix"
                }]
            }
        }
    ]
}))]
pub struct GridPayload {
    #[serde(default)]
    pub placements: Vec<GridPlacement>,
}

impl GridPayload {
    fn from_grid(grid: &Grid) -> Self {
        Self {
            placements: grid
                .placed_idols()
                .into_iter()
                .map(|(position, idol)| GridPlacement {
                    position,
                    idol: (*idol).clone(),
                })
                .collect(),
        }
    }

    fn to_grid(&self, catalog: &Catalog) -> Result<Grid, RequestError> {
        for placement in &self.placements {
            placement.idol.validate().map_err(RequestError::InvalidIdol)?;
        }
        Grid::from_placements(
            &catalog.footprints,
            self.placements.iter().map(|p| (p.position, &p.idol)),
        )
        .map_err(|(id, failure)| RequestError::InvalidGrid(id, failure))
    }
}

/// Board snapshot plus a cell matrix of idol ids for rendering.
#[derive(Debug, Serialize, ToSchema)]
pub struct GridResponse {
    pub placements: Vec<GridPlacement>,
    /// 7 rows of 6 cells; `null` for empty and blocked cells.
    pub cells: Vec<Vec<Option<IdolId>>>,
    pub filled_cells: usize,
}

impl GridResponse {
    fn from_grid(grid: &Grid) -> Self {
        Self {
            placements: GridPayload::from_grid(grid).placements,
            cells: grid.id_matrix(),
            filled_cells: grid.filled_cells(),
        }
    }
}

/// Request for validating or placing one idol.
#[derive(Deserialize, ToSchema)]
pub struct PlaceRequest {
    #[serde(default)]
    pub grid: GridPayload,
    pub idol: Idol,
    pub position: CellPos,
}

#[derive(Deserialize, ToSchema)]
pub struct RemoveRequest {
    #[serde(default)]
    pub grid: GridPayload,
    /// Anchor of the idol to remove
    pub position: CellPos,
}

#[derive(Deserialize, ToSchema)]
pub struct MoveRequest {
    #[serde(default)]
    pub grid: GridPayload,
    pub from: CellPos,
    pub to: CellPos,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationResponse {
    pub valid: bool,
    pub reason_code: Option<String>,
    pub reason: Option<String>,
}

impl ValidationResponse {
    fn from_outcome(outcome: Result<(), PlacementFailure>) -> Self {
        match outcome {
            Ok(()) => Self {
                valid: true,
                reason_code: None,
                reason: None,
            },
            Err(failure) => Self {
                valid: false,
                reason_code: Some(failure.code().to_string()),
                reason: Some(failure.to_string()),
            },
        }
    }
}

/// Outcome of a place or move; a rejected change returns the board unchanged.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceResponse {
    pub placed: bool,
    pub reason_code: Option<String>,
    pub reason: Option<String>,
    pub grid: GridResponse,
}

impl PlaceResponse {
    fn from_outcome(outcome: Result<Grid, PlacementFailure>, unchanged: &Grid) -> Self {
        match outcome {
            Ok(grid) => Self {
                placed: true,
                reason_code: None,
                reason: None,
                grid: GridResponse::from_grid(&grid),
            },
            Err(failure) => Self {
                placed: false,
                reason_code: Some(failure.code().to_string()),
                reason: Some(failure.to_string()),
                grid: GridResponse::from_grid(unchanged),
            },
        }
    }
}

/// Request for the packing optimizer. Optional fields override the server configuration.
#[derive(Deserialize, ToSchema)]
#[schema(example = json!({
    "grid": {"placements": []},
    "idols": [
        {
            "id": 1,
            "type_id": "minor",
            "name": "Teeming Minor Idol",
            "prefixes": [{
                "id": "pack_size",
                "name": "Teeming",
                "text": "3% increased Pack size in your Maps",
                "class": "prefix"
            }]
        }
    ],
    "strategy": "auto",
    "seed": 7
}))]
pub struct OptimizeRequest {
    #[serde(default)]
    pub grid: GridPayload,
    pub idols: Vec<Idol>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub strategy: Option<PackingStrategy>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub seed: Option<u64>,
    /// Capped at the configured restart count.
    #[serde(default)]
    #[schema(nullable = true)]
    pub restarts: Option<usize>,
}

impl OptimizeRequest {
    fn apply_overrides(&self, mut config: PackingConfig) -> PackingConfig {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(restarts) = self.restarts {
            config.restarts = restarts.clamp(1, config.restarts.max(1));
        }
        config
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotPlacedIdol {
    pub id: IdolId,
    pub name: String,
    pub type_id: String,
    pub reason_code: String,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OptimizeResponse {
    pub grid: GridResponse,
    pub placed_count: usize,
    pub not_placed_count: usize,
    pub not_placed_idols: Vec<NotPlacedIdol>,
    pub is_complete: bool,
    pub strategy: PackingStrategy,
}

impl OptimizeResponse {
    pub fn from_packing_result(result: PackingResult) -> Self {
        let placed_count = result.placed_count();
        let not_placed_count = result.not_placed_count();
        let is_complete = result.is_complete();
        let PackingResult {
            grid,
            unplaced,
            strategy,
            ..
        } = result;

        Self {
            grid: GridResponse::from_grid(&grid),
            placed_count,
            not_placed_count,
            not_placed_idols: unplaced
                .into_iter()
                .map(|entry| NotPlacedIdol {
                    id: entry.idol.id,
                    name: entry.idol.name,
                    type_id: entry.idol.type_id,
                    reason_code: entry.reason.code().to_string(),
                    reason: entry.reason.to_string(),
                })
                .collect(),
            is_complete,
            strategy,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AggregateRequest {
    #[serde(default)]
    pub grid: GridPayload,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AggregateResponse {
    pub modifiers: Vec<StackedModifier>,
    /// Plain-text export, one line per entry
    pub summary: String,
}

#[derive(Serialize, ToSchema)]
pub struct CatalogResponse {
    pub footprints: Vec<Footprint>,
    pub modifiers: Vec<Modifier>,
    pub exclusive_families: Vec<String>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

/// Reasons a request body is rejected after it parsed as JSON.
#[derive(Debug)]
enum RequestError {
    InvalidIdol(ValidationError),
    InvalidGrid(IdolId, PlacementFailure),
    DuplicateIdol(IdolId),
    Generation(ValidationError),
}

impl RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::InvalidIdol(err) => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid input data",
                err.to_string(),
            ),
            RequestError::InvalidGrid(id, failure) => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid grid snapshot",
                format!("idol {}: {}", id, failure),
            ),
            RequestError::DuplicateIdol(id) => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid input data",
                format!("idol id {} appears more than once", id),
            ),
            RequestError::Generation(err) => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Generation failed",
                err.to_string(),
            ),
        }
    }
}

fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(value)| value).map_err(json_deserialize_error)
}

fn run_validate(
    catalog: &Catalog,
    request: &PlaceRequest,
) -> Result<ValidationResponse, RequestError> {
    request.idol.validate().map_err(RequestError::InvalidIdol)?;
    let grid = request.grid.to_grid(catalog)?;
    Ok(ValidationResponse::from_outcome(grid.validate(
        &catalog.footprints,
        &request.idol,
        request.position,
    )))
}

fn run_place(catalog: &Catalog, request: &PlaceRequest) -> Result<PlaceResponse, RequestError> {
    request.idol.validate().map_err(RequestError::InvalidIdol)?;
    let grid = request.grid.to_grid(catalog)?;
    let outcome = grid.try_place(&catalog.footprints, &request.idol, request.position);
    Ok(PlaceResponse::from_outcome(outcome, &grid))
}

fn run_remove(catalog: &Catalog, request: &RemoveRequest) -> Result<GridResponse, RequestError> {
    let grid = request.grid.to_grid(catalog)?;
    Ok(GridResponse::from_grid(
        &grid.remove(&catalog.footprints, request.position),
    ))
}

fn run_move(catalog: &Catalog, request: &MoveRequest) -> Result<PlaceResponse, RequestError> {
    let grid = request.grid.to_grid(catalog)?;
    let outcome = grid.move_idol(&catalog.footprints, request.from, request.to);
    Ok(PlaceResponse::from_outcome(outcome, &grid))
}

/// Validated optimizer input: start board, idols and effective configuration.
fn prepare_optimize(
    catalog: &Catalog,
    base: PackingConfig,
    request: OptimizeRequest,
) -> Result<(Grid, Vec<Idol>, PackingConfig), RequestError> {
    let mut seen = HashSet::new();
    for idol in &request.idols {
        idol.validate().map_err(RequestError::InvalidIdol)?;
        if !seen.insert(idol.id) {
            return Err(RequestError::DuplicateIdol(idol.id));
        }
    }
    let grid = request.grid.to_grid(catalog)?;
    let config = request.apply_overrides(base);
    Ok((grid, request.idols, config))
}

fn run_aggregate(
    catalog: &Catalog,
    request: &AggregateRequest,
) -> Result<AggregateResponse, RequestError> {
    let grid = request.grid.to_grid(catalog)?;
    let modifiers = aggregate(&grid);
    let summary = render_summary(&modifiers);
    Ok(AggregateResponse { modifiers, summary })
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_validate,
        handle_place,
        handle_remove,
        handle_move,
        handle_optimize,
        handle_optimize_stream,
        handle_aggregate,
        handle_generate,
        handle_catalog
    ),
    components(
        schemas(
            CellPos,
            Footprint,
            Modifier,
            ModifierClass,
            Idol,
            GridPlacement,
            GridPayload,
            GridResponse,
            PlaceRequest,
            RemoveRequest,
            MoveRequest,
            ValidationResponse,
            PlaceResponse,
            OptimizeRequest,
            OptimizeResponse,
            NotPlacedIdol,
            PackingStrategy,
            AggregateRequest,
            AggregateResponse,
            StackedModifier,
            MatchPattern,
            GenerationRequest,
            DesiredModifier,
            GenerationOutcome,
            Fulfillment,
            CatalogResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "board", description = "Manual placement on the idol board"),
        (name = "packing", description = "Bulk arrangement of idols"),
        (name = "modifiers", description = "Modifier summaries and idol generation")
    )
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from the frontend.
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    optimizer_config: OptimizerConfig,
    catalog: Catalog,
) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        catalog: Arc::new(catalog),
        optimizer_config,
    };

    let app = Router::new()
        .route("/validate", post(handle_validate))
        .route("/place", post(handle_place))
        .route("/remove", post(handle_remove))
        .route("/move", post(handle_move))
        .route("/optimize", post(handle_optimize))
        .route("/optimize_stream", post(handle_optimize_stream))
        .route("/aggregate", post(handle_aggregate))
        .route("/generate", post(handle_generate))
        .route("/catalog", get(handle_catalog))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    println!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    for endpoint in [
        "POST /validate",
        "POST /place",
        "POST /remove",
        "POST /move",
        "POST /optimize",
        "POST /optimize_stream",
        "POST /aggregate",
        "POST /generate",
        "GET /catalog",
    ] {
        println!("   - {}", endpoint);
    }
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /validate: checks a placement without changing the board.
#[utoipa::path(
    post,
    path = "/validate",
    request_body = PlaceRequest,
    responses(
        (status = 200, description = "Placement verdict", body = ValidationResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid board or idol", body = ErrorResponse)
    ),
    tag = "board"
)]
async fn handle_validate(
    State(state): State<ApiState>,
    payload: Result<Json<PlaceRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match run_validate(&state.catalog, &request) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handler for POST /place.
///
/// A rejected placement is a normal answer: `placed` is false and the board
/// comes back unchanged together with the reason.
#[utoipa::path(
    post,
    path = "/place",
    request_body = PlaceRequest,
    responses(
        (status = 200, description = "Placement outcome and resulting board", body = PlaceResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid board or idol", body = ErrorResponse)
    ),
    tag = "board"
)]
async fn handle_place(
    State(state): State<ApiState>,
    payload: Result<Json<PlaceRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match run_place(&state.catalog, &request) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handler for POST /remove. Removing from an empty anchor is a no-op.
#[utoipa::path(
    post,
    path = "/remove",
    request_body = RemoveRequest,
    responses(
        (status = 200, description = "Resulting board", body = GridResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid board", body = ErrorResponse)
    ),
    tag = "board"
)]
async fn handle_remove(
    State(state): State<ApiState>,
    payload: Result<Json<RemoveRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match run_remove(&state.catalog, &request) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/move",
    request_body = MoveRequest,
    responses(
        (status = 200, description = "Move outcome and resulting board", body = PlaceResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid board", body = ErrorResponse)
    ),
    tag = "board"
)]
async fn handle_move(
    State(state): State<ApiState>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match run_move(&state.catalog, &request) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handler for POST /optimize endpoint.
///
/// Arranges the given idols on top of the submitted board.
///
/// # Returns
/// JSON response with the best board found and every idol that did not fit
#[utoipa::path(
    post,
    path = "/optimize",
    request_body = OptimizeRequest,
    responses(
        (status = 200, description = "Successfully arranged idols", body = OptimizeResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid board or idols", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_optimize(
    State(state): State<ApiState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let base = state.optimizer_config.packing_config();
    let (grid, idols, config) = match prepare_optimize(&state.catalog, base, request) {
        Ok(prepared) => prepared,
        Err(err) => return err.into_response(),
    };

    println!(
        "📥 New optimize request: {} idols, {} already on the board, strategy {}",
        idols.len(),
        grid.placed_idols().len(),
        config.strategy.code()
    );
    let catalog = Arc::clone(&state.catalog);
    let joined =
        tokio::task::spawn_blocking(move || optimize(idols, &grid, &catalog.footprints, config))
            .await;
    let result = match joined {
        Ok(result) => result,
        Err(err) => {
            eprintln!("❌ Optimizer task failed: {err}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Optimization failed",
                err.to_string(),
            );
        }
    };
    println!(
        "📦 Result: {} placed, {} not placed ({})",
        result.placed_count(),
        result.not_placed_count(),
        result.strategy.code()
    );

    (StatusCode::OK, Json(OptimizeResponse::from_packing_result(result))).into_response()
}

/// Handler for POST /optimize_stream endpoint (SSE).
///
/// Streams optimizer events as Server-Sent Events. The last event is named
/// `result` and carries the same body as POST /optimize.
#[utoipa::path(
    post,
    path = "/optimize_stream",
    request_body = OptimizeRequest,
    responses(
        (
            status = 200,
            description = "Streams optimizer events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid board or idols", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_optimize_stream(
    State(state): State<ApiState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let base = state.optimizer_config.packing_config();
    let (grid, idols, config) = match prepare_optimize(&state.catalog, base, request) {
        Ok(prepared) => prepared,
        Err(err) => return err.into_response(),
    };

    let (tx, rx) = mpsc::channel::<Event>(32);
    let catalog = Arc::clone(&state.catalog);

    tokio::task::spawn_blocking(move || {
        let result = optimize_with_progress(idols, &grid, &catalog.footprints, config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver only means the client went away.
                let _ = tx.blocking_send(Event::default().data(json));
            }
        });
        let response = OptimizeResponse::from_packing_result(result);
        if let Ok(json) = serde_json::to_string(&response) {
            let _ = tx.blocking_send(Event::default().event("result").data(json));
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok::<_, std::convert::Infallible>);
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /aggregate: stacked modifier lines of the board.
#[utoipa::path(
    post,
    path = "/aggregate",
    request_body = AggregateRequest,
    responses(
        (status = 200, description = "Stacked modifiers and text summary", body = AggregateResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid board", body = ErrorResponse)
    ),
    tag = "modifiers"
)]
async fn handle_aggregate(
    State(state): State<ApiState>,
    payload: Result<Json<AggregateRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match run_aggregate(&state.catalog, &request) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handler for POST /generate.
///
/// Partial fulfillment is a successful response; compare `requested` and
/// `achieved` per modifier.
#[utoipa::path(
    post,
    path = "/generate",
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "Generated idols and fulfillment report", body = GenerationOutcome),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "modifiers"
)]
async fn handle_generate(
    State(state): State<ApiState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    println!(
        "📥 New generate request: {} modifiers",
        request.desired.len()
    );
    match generate(&request, &state.catalog) {
        Ok(outcome) => {
            println!(
                "📦 Result: {} idols, complete: {}",
                outcome.idols.len(),
                outcome.is_complete
            );
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(err) => RequestError::Generation(err).into_response(),
    }
}

/// Handler for GET /catalog: footprints and every modifier that can roll.
#[utoipa::path(
    get,
    path = "/catalog",
    responses((status = 200, description = "Loaded catalog", body = CatalogResponse)),
    tag = "modifiers"
)]
async fn handle_catalog(State(state): State<ApiState>) -> impl IntoResponse {
    Json(CatalogResponse {
        footprints: state.catalog.footprints.iter().cloned().collect(),
        modifiers: state.catalog.modifiers().cloned().collect(),
        exclusive_families: state.catalog.exclusive_families.clone(),
    })
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
