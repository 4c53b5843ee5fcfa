//! HTTP client against a throwaway backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tokio::sync::Mutex;

use bus_finder::api::{ApiConfig, ApiError, BoardSource, BusApi, BusApiClient};
use bus_finder::domain::{Coordinate, StationKey};

type Requests = Arc<Mutex<Vec<String>>>;

async fn spawn_backend() -> (BusApiClient, Requests) {
    let requests = Requests::default();

    let app = Router::new()
        .route("/api/buses", get(default_board))
        .route("/api/buses/:station_id", get(board))
        .route("/api/address/search", get(search))
        .route("/api/stations/nearby", get(nearby))
        .with_state(requests.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = BusApiClient::new(
        ApiConfig::default()
            .with_base_url(format!("http://{addr}"))
            .with_timeout(1),
    )
    .unwrap();
    (client, requests)
}

fn board_json(station_id: u64) -> serde_json::Value {
    json!({
        "station_id": station_id,
        "buses": [
            {
                "bus_number": "18",
                "company_name": "Dan",
                "destination": "Bat Yam",
                "arrival_times": [3, 11, 24],
                "description": "",
                "next_arrival_minutes": 3
            },
            {
                "bus_number": "61",
                "company_name": "Dan",
                "destination": "Ramat Gan",
                "arrival_times": [],
                "description": "",
                "next_arrival_minutes": 8
            }
        ],
        "last_updated": "2024-05-01T08:04:09",
        "total_buses": 2
    })
}

async fn default_board(State(requests): State<Requests>) -> Json<serde_json::Value> {
    requests.lock().await.push("GET /api/buses".into());
    Json(board_json(21472))
}

async fn board(State(requests): State<Requests>, Path(station_id): Path<u64>) -> Response {
    requests
        .lock()
        .await
        .push(format!("GET /api/buses/{station_id}"));

    match station_id {
        404 => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Station not found"})),
        )
            .into_response(),
        500 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
        999 => "this is not json".into_response(),
        777 => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(board_json(station_id)).into_response()
        }
        _ => Json(board_json(station_id)).into_response(),
    }
}

async fn search(
    State(requests): State<Requests>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let q = params.get("q").cloned().unwrap_or_default();
    let limit = params.get("limit").cloned().unwrap_or_default();
    requests.lock().await.push(format!("search q={q} limit={limit}"));

    if q.len() < 2 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "detail": [{
                    "loc": ["query", "q"],
                    "msg": "String should have at least 2 characters"
                }]
            })),
        )
            .into_response();
    }

    Json(json!({
        "query": q,
        "addresses": [
            {"display_name": "Dizengoff 50, Tel Aviv", "lat": "32.0779", "lon": "34.7744",
             "place_id": 1001, "importance": 0.7},
            {"display_name": "Dizengoff Square, Tel Aviv", "lat": "32.0780", "lon": "34.7740"}
        ]
    }))
    .into_response()
}

async fn nearby(
    State(requests): State<Requests>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let lat: f64 = params["lat"].parse().unwrap();
    let lng: f64 = params["lng"].parse().unwrap();
    requests.lock().await.push(format!(
        "nearby lat={} lng={} radius={}",
        params["lat"], params["lng"], params["radius"]
    ));

    Json(json!({
        "stations": [
            {"Name": "Dizengoff/Frishman", "EnglishName": "Dizengoff/Frishman", "Makat": 21472,
             "Longitude": 34.7741, "Latitude": 32.0790, "Distance": 120.4,
             "LineList": [{"LineNumber": "5"}, {"LineNumber": "18"}, {"Shilut": "61"}]},
            {"Name": "Frishman/Ben Yehuda", "Makat": 21473,
             "Longitude": 34.7712, "Latitude": 32.0801, "Distance": 260.0}
        ],
        "center_lat": lat,
        "center_lng": lng,
        "radius": params["radius"].parse::<u32>().unwrap(),
        "total_stations": 2
    }))
}

#[tokio::test]
async fn fetches_station_board() {
    let (client, requests) = spawn_backend().await;
    let key = StationKey::new(21472).unwrap();

    let board = client.arrivals(BoardSource::Station(key)).await.unwrap();

    assert_eq!(board.station_id, key);
    assert_eq!(board.arrivals.len(), 2);
    assert_eq!(board.arrivals[0].arrival_minutes(), [3, 11, 24]);
    // Empty arrival_times falls back to next_arrival_minutes
    assert_eq!(board.arrivals[1].arrival_minutes(), [8]);
    assert_eq!(*requests.lock().await, ["GET /api/buses/21472"]);
}

#[tokio::test]
async fn fetches_default_board() {
    let (client, requests) = spawn_backend().await;

    let board = client.arrivals(BoardSource::Default).await.unwrap();

    assert_eq!(board.station_id.get(), 21472);
    assert_eq!(*requests.lock().await, ["GET /api/buses"]);
}

#[tokio::test]
async fn not_found_carries_backend_detail() {
    let (client, _) = spawn_backend().await;
    let key = StationKey::new(404).unwrap();

    let err = client.arrivals(BoardSource::Station(key)).await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    let shown = err.to_network_error("Failed to fetch bus data");
    assert_eq!(shown.message, "Station not found");
    assert_eq!(shown.status, Some(404));
}

#[tokio::test]
async fn plain_text_error_body() {
    let (client, _) = spawn_backend().await;
    let key = StationKey::new(500).unwrap();

    let err = client.arrivals(BoardSource::Station(key)).await.unwrap_err();

    assert!(matches!(
        &err,
        ApiError::Api { status: 500, message } if message == "Internal Server Error"
    ));
}

#[tokio::test]
async fn malformed_body_is_json_error() {
    let (client, _) = spawn_backend().await;
    let key = StationKey::new(999).unwrap();

    let err = client.arrivals(BoardSource::Station(key)).await.unwrap_err();

    let ApiError::Json { body, .. } = &err else {
        panic!("expected JSON error, got {err}");
    };
    assert_eq!(body.as_deref(), Some("this is not json"));
    assert_eq!(
        err.to_network_error("Failed to fetch bus data").message,
        "Failed to fetch bus data"
    );
}

#[tokio::test]
async fn slow_backend_times_out() {
    let (client, _) = spawn_backend().await;
    let key = StationKey::new(777).unwrap();

    let err = client.arrivals(BoardSource::Station(key)).await.unwrap_err();

    assert!(matches!(err, ApiError::Timeout));
}

#[tokio::test]
async fn address_search_sends_query_and_limit() {
    let (client, requests) = spawn_backend().await;

    let matches = client.search_addresses("Dizengoff 50", 5).await.unwrap();

    assert_eq!(matches.query, "Dizengoff 50");
    assert_eq!(matches.addresses.len(), 2);
    assert_eq!(matches.addresses[0].place_id.as_deref(), Some("1001"));
    assert_eq!(
        matches.addresses[1].coordinate().unwrap(),
        Coordinate::new(32.0780, 34.7740).unwrap()
    );
    assert_eq!(*requests.lock().await, ["search q=Dizengoff 50 limit=5"]);
}

#[tokio::test]
async fn validation_error_detail_list() {
    let (client, _) = spawn_backend().await;

    let err = client.search_addresses("d", 5).await.unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(
        err.to_network_error("Failed to search addresses").message,
        "String should have at least 2 characters"
    );
}

#[tokio::test]
async fn nearby_stations_round_trip() {
    let (client, requests) = spawn_backend().await;
    let center = Coordinate::new(32.0779, 34.7744).unwrap();

    let nearby = client.nearby_stations(center, 300).await.unwrap();

    assert_eq!(nearby.center, center);
    assert_eq!(nearby.radius, 300);
    assert_eq!(nearby.stations.len(), 2);
    assert_eq!(nearby.stations[0].lines, ["5", "18", "61"]);
    assert_eq!(nearby.nearest().map(|s| s.key.get()), Some(21472));
    assert_eq!(
        *requests.lock().await,
        ["nearby lat=32.0779 lng=34.7744 radius=300"]
    );
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        BusApiClient::new(ApiConfig::default().with_base_url(format!("http://{addr}"))).unwrap();
    let err = client.arrivals(BoardSource::Default).await.unwrap_err();

    assert!(matches!(err, ApiError::Http(_)));
    assert_eq!(err.status(), None);
}
