use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use platerank_core::{Cuisines, RestaurantRecord};
use platerank_server::config::Config;
use platerank_server::{create_router, AppState, RecommendResponse};
use platerank_storage::{Catalog, JsonlSource, RecordSource, StaticSource};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn rec(name: &str, rating: f64, n: u64, cost: f64, cuisines: &[&str], area: &str) -> RestaurantRecord {
    RestaurantRecord::new(name, rating, n, cost, Cuisines::new(cuisines.iter().copied()), area)
}

fn records() -> Vec<RestaurantRecord> {
    vec![
        rec("Toit", 4.7, 9000, 1500.0, &["Continental", "Italian"], "Indiranagar"),
        rec("Empire", 4.0, 4000, 600.0, &["North Indian", "Chinese"], "Koramangala"),
        rec("Chinita", 4.2, 800, 1200.0, &["Mexican"], "Indiranagar"),
        rec("Mainland China", 4.1, 2000, 1600.0, &["Chinese"], "Koramangala"),
        rec("CTR", 4.6, 5000, 150.0, &["South Indian"], "Malleshwaram"),
        rec("Meghana Foods", 4.4, 7000, 600.0, &["Biryani", "Andhra"], "Koramangala"),
    ]
}

fn test_config() -> Config {
    Config::from_lookup(|k| match k {
        "PLATERANK_DATA" => Some("/unused".to_string()),
        "MAX_TOP_N" => Some("10".to_string()),
        _ => None,
    })
    .unwrap()
}

fn app_with(source: Arc<dyn RecordSource>) -> Router {
    let catalog = Catalog::from_source(source.as_ref()).unwrap();
    create_router(AppState::new(catalog, source, test_config()))
}

fn app() -> Router {
    app_with(Arc::new(StaticSource::new(records())))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn names(v: &Value) -> Vec<String> {
    let resp: RecommendResponse = serde_json::from_value(v.clone()).unwrap();
    resp.results.into_iter().map(|r| r.record.name).collect()
}

#[tokio::test]
async fn health_is_ok() {
    let resp = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_body_returns_default_top_five() {
    let (status, body) = send(app(), "POST", "/v1/recommend", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
    assert_eq!(names(&body)[0], "Toit");
}

#[tokio::test]
async fn filters_and_area_priority_apply() {
    let (status, body) = send(
        app(),
        "POST",
        "/v1/recommend",
        Some(json!({
            "cuisines": ["Chinese", "Mexican"],
            "cost_range": [500, 1600],
            "area": "Indiranagar",
            "top_n": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body)[0], "Chinita");
    assert_eq!(body["results"][0]["area_match"], true);
    assert_eq!(body["count"], 3);
    assert!(body["results"][1]["weighted_rating"].as_f64().unwrap()
        >= body["results"][2]["weighted_rating"].as_f64().unwrap());
}

#[tokio::test]
async fn no_match_is_an_empty_success() {
    let (status, body) = send(
        app(),
        "POST",
        "/v1/recommend",
        Some(json!({"cuisines": ["Ethiopian"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn invalid_parameters_are_rejected() {
    for bad in [
        json!({"top_n": 0}),
        json!({"top_n": -2}),
        json!({"top_n": 11}),
        json!({"cost_range": [900, 100]}),
    ] {
        let (status, body) = send(app(), "POST", "/v1/recommend", Some(bad.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", bad);
        assert!(body["error"].as_str().unwrap().contains("invalid parameter"));
    }
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    for bad in [
        json!({"top_n": 2.5}),
        json!({"cost_range": [100]}),
        json!({"cuisine": ["Thai"]}),
        json!({"cuisines": "Thai"}),
    ] {
        let (status, body) = send(app(), "POST", "/v1/recommend", Some(bad.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", bad);
        assert!(
            body["error"].as_str().unwrap().starts_with("invalid request body"),
            "{}",
            bad
        );
    }

    // a body that is not JSON at all still answers in the error shape
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/recommend")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn options_list_filter_choices() {
    let (status, body) = send(app(), "GET", "/v1/options", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["areas"], json!(["Indiranagar", "Koramangala", "Malleshwaram"]));
    assert_eq!(body["cuisines"][0], "Andhra");
    assert_eq!(body["cost_min"], 150.0);
    assert_eq!(body["cost_max"], 1600.0);
}

#[tokio::test]
async fn catalog_reports_smoothing_inputs() {
    let (status, body) = send(app(), "GET", "/v1/catalog", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"], 6);
    assert_eq!(body["median_num_ratings"], 4500.0);
    assert_eq!(body["fingerprint"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn reload_picks_up_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("restaurants.jsonl");
    let line = |r: &RestaurantRecord| {
        let mut v = serde_json::to_value(r).unwrap();
        v["online_order"] = json!(0);
        v["table_booking"] = json!(0);
        format!("{}\n", v)
    };
    let all: String = records().iter().map(line).collect();
    std::fs::write(&path, &all).unwrap();

    let app = app_with(Arc::new(JsonlSource::new(&path)));
    let (_, body) = send(app.clone(), "POST", "/admin/reload", None).await;
    assert_eq!(body["swapped"], false);

    let fewer: String = records().iter().take(2).map(line).collect();
    std::fs::write(&path, fewer).unwrap();
    let (status, body) = send(app.clone(), "POST", "/admin/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["swapped"], true);
    assert_eq!(body["records"], 2);

    std::fs::write(&path, "not json\n").unwrap();
    let (status, _) = send(app.clone(), "POST", "/admin/reload", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, body) = send(app, "GET", "/v1/catalog", None).await;
    assert_eq!(body["records"], 2);
}
