use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lap_evolution::{
    analyze_participation, circuit_lap_time_evolution, collect_circuit_lap_data, constructor_flow,
    find_qualifying_circuits, load_dataset, summarize_circuit, CircuitId, CircuitSummary, ConstructorFlow, Dataset,
    Era, EraInfo, ParticipationAnalysis, QualifyingCircuit, TableFiles, YearlyFastestLap,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc};

// ---------- Derived snapshot ----------

/// Everything derived from one load of the tables.
pub struct Snapshot {
    pub dataset: Dataset,
    pub qualifying: Vec<QualifyingCircuit>,
    pub participation: ParticipationAnalysis,
    pub flow: ConstructorFlow,
}

impl Snapshot {
    pub fn build(dataset: Dataset) -> Self {
        let qualifying = find_qualifying_circuits(&dataset.circuits, &dataset.races);
        let lap_data = collect_circuit_lap_data(&qualifying, &dataset.races, &dataset.lap_times);
        let participation = analyze_participation(&lap_data);
        let flow = constructor_flow(&dataset.races, &dataset.constructors, &dataset.constructor_results);
        Self { dataset, qualifying, participation, flow }
    }

    fn qualifying_circuit(&self, id: &CircuitId) -> Option<&QualifyingCircuit> {
        self.qualifying.iter().find(|c| c.circuit_id() == id)
    }
}

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
    data_dir: Arc<PathBuf>,
    tables: Arc<TableFiles>,
}

impl AppState {
    pub fn new(snapshot: Snapshot, data_dir: PathBuf, tables: TableFiles) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
            data_dir: Arc::new(data_dir),
            tables: Arc::new(tables),
        }
    }

    /// Cheap handle to the current snapshot; never held across an await.
    fn current(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": msg.into() })))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitLaps {
    pub summary: CircuitSummary,
    pub laps: Vec<YearlyFastestLap>,
}

// ---------- Handlers ----------

async fn health(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.current();
    Json(json!({
        "status": "ok",
        "counts": snapshot.dataset.counts(),
        "qualifyingCircuits": snapshot.qualifying.len(),
    }))
}

async fn eras() -> Json<Vec<EraInfo>> {
    Json(Era::ALL.into_iter().map(Era::info).collect())
}

async fn circuits(State(state): State<AppState>) -> Json<Vec<QualifyingCircuit>> {
    Json(state.current().qualifying.clone())
}

async fn circuit_laps(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<CircuitLaps>, ApiError> {
    let id = CircuitId::parse(&raw_id)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, format!("invalid circuit id `{raw_id}`")))?;
    let snapshot = state.current();
    let circuit = snapshot
        .qualifying_circuit(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("circuit {id} is not a qualifying circuit")))?;

    let laps = circuit_lap_time_evolution(&id, &snapshot.dataset.races, &snapshot.dataset.lap_times);
    tracing::debug!("{}: {} seasons of lap data", circuit.display_name, laps.len());
    let summary = summarize_circuit(circuit, &laps);
    Ok(Json(CircuitLaps { summary, laps }))
}

async fn participation(State(state): State<AppState>) -> Json<ParticipationAnalysis> {
    Json(state.current().participation.clone())
}

async fn flow(State(state): State<AppState>) -> Json<ConstructorFlow> {
    Json(state.current().flow.clone())
}

/// Re-reads the tables and swaps in a freshly derived snapshot.
async fn reload(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let dataset = load_dataset(&state.data_dir, &state.tables).await.map_err(|e| {
        tracing::warn!("reload failed: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let snapshot = tokio::task::spawn_blocking(move || Snapshot::build(dataset))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let counts = snapshot.dataset.counts();
    let qualifying = snapshot.qualifying.len();
    *state.snapshot.write() = Arc::new(snapshot);
    tracing::info!("reloaded tables; {qualifying} qualifying circuits");
    Ok(Json(json!({ "status": "reloaded", "counts": counts, "qualifyingCircuits": qualifying })))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/eras", get(eras))
        .route("/circuits", get(circuits))
        .route("/circuits/:circuit_id/laps", get(circuit_laps))
        .route("/participation", get(participation))
        .route("/constructors/flow", get(flow))
        .route("/reload", post(reload))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use lap_evolution::{Circuit, Constructor, ConstructorResult, LapTime, Race};
    use tower::ServiceExt;

    fn dataset() -> Dataset {
        let circuits = vec![Circuit {
            circuit_id: CircuitId::Id(9),
            circuit_ref: Some("hungaroring".into()),
            name: Some("Hungaroring".into()),
            location: Some("Budapest".into()),
            country: Some("Hungary".into()),
            lat: Some(47.5789),
            lng: Some(19.2486),
        }];
        let races: Vec<Race> = (0..20)
            .map(|i| Race { race_id: i + 1, year: 1990 + i as i32, circuit_id: Some(CircuitId::Id(9)) })
            .collect();
        let lap_times: Vec<LapTime> = races
            .iter()
            .filter(|r| r.year >= 1996)
            .map(|r| LapTime {
                race_id: r.race_id,
                driver_id: Some(1),
                lap: Some(10),
                milliseconds: Some(90_000 - i64::from(r.year - 1996) * 500),
                time: None,
            })
            .collect();
        let constructors = vec![Constructor { constructor_id: 1, name: "Williams".into() }];
        let constructor_results = races
            .iter()
            .chain(races.iter())
            .chain(races.iter())
            .map(|r| ConstructorResult { race_id: r.race_id, constructor_id: 1, points: Some(3.0) })
            .collect();
        Dataset { races, circuits, lap_times, constructors, constructor_results }
    }

    fn app() -> Router {
        router(AppState::new(Snapshot::build(dataset()), PathBuf::from("/nonexistent"), TableFiles::default()))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn lists_qualifying_circuits() {
        let (status, body) = get_json(app(), "/circuits").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["displayName"], "Hungaroring");
        assert_eq!(body[0]["raceCount"], 20);
        assert_eq!(body[0]["circuitId"], 9);
    }

    #[tokio::test]
    async fn circuit_laps_with_summary() {
        let (status, body) = get_json(app(), "/circuits/9/laps").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["laps"].as_array().unwrap().len(), 14);
        assert_eq!(body["laps"][0]["year"], 1996);
        assert_eq!(body["laps"][0]["era"], "v10");
        assert_eq!(body["summary"]["missingYears"].as_array().unwrap().len(), 6);
        assert_eq!(body["summary"]["fastestLapMs"], 83_500);
    }

    #[tokio::test]
    async fn unknown_circuit_is_404() {
        let (status, body) = get_json(app(), "/circuits/77/laps").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("77"));
    }

    #[tokio::test]
    async fn participation_and_flow() {
        let (_, body) = get_json(app(), "/participation").await;
        assert_eq!(body["circuitAnalysis"][0]["shortName"], "Hungary");
        assert_eq!(body["circuitAnalysis"][0]["recordHolder"], "v8");
        assert_eq!(body["globalEraStats"]["v8"]["recordCount"], 1);

        let (_, body) = get_json(app(), "/constructors/flow").await;
        assert_eq!(body["nodes"][0]["id"], "constructor_1");
        assert_eq!(body["nodes"][0]["stage"], 0);
        assert_eq!(body["nodes"][12]["stage"], 3);
        assert_eq!(body["nodes"].as_array().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn eras_in_order() {
        let (_, body) = get_json(app(), "/eras").await;
        let tags: Vec<_> = body.as_array().unwrap().iter().map(|e| e["era"].as_str().unwrap().to_string()).collect();
        assert_eq!(tags, ["early", "v10", "v8", "hybrid"]);
        assert_eq!(body[3]["avgHp"], 1000);
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::builder().method("POST").uri("/reload").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["qualifyingCircuits"], 1);
    }
}
