mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

async fn create(router: &axum::Router, description: &str, location: &str) -> serde_json::Value {
    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/incidents",
            json!({ "description": description, "location": location }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn test_root_and_health() {
    let (router, _) = test_app();

    let response = router.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Waste Incident Reporting & AI Insight Platform");
    assert_eq!(body["status"], "operational");

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(body_json(response).await, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_create_and_get_incident() {
    let (router, _) = test_app();

    let created = create(
        &router,
        "Plastic bottles and bags scattered near the park",
        "Lumpini Park",
    )
    .await;
    assert_eq!(created["waste_type"], "plastic");
    assert!(created["waste_type_confidence"].as_f64().unwrap() <= 1.0);
    assert!(created.get("embedding").is_none());
    assert!(!created["keywords"].as_array().unwrap().is_empty());

    let id = created["id"].as_str().unwrap();
    let response = router
        .oneshot(get(&format!("/api/incidents/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["location"], "Lumpini Park");
}

#[tokio::test]
async fn test_create_validation_error() {
    let (router, _) = test_app();

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/incidents",
            json!({ "description": "too short", "location": "Park", "latitude": 95.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["status"], 422);
}

#[tokio::test]
async fn test_unknown_incident_is_404() {
    let (router, _) = test_app();

    let response = router
        .oneshot(get(&format!("/api/incidents/{}", Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_with_pagination_and_filters() {
    let (router, _) = test_app();

    for i in 0..3 {
        create(
            &router,
            &format!("Overflowing garbage bins on street {}", i),
            "Silom Road",
        )
        .await;
    }
    create(&router, "Broken glass bottles on the pavement", "Khao San").await;

    let response = router
        .clone()
        .oneshot(get("/api/incidents?page=2&page_size=3"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 4);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["page"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let response = router
        .clone()
        .oneshot(get("/api/incidents?location=silom"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["total"], 3);

    let response = router
        .oneshot(get("/api/incidents?page_size=101"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_and_delete() {
    let (router, _) = test_app();
    let created = create(&router, "Old mattress dumped beside the canal", "Khlong Toei").await;
    let uri = format!("/api/incidents/{}", created["id"].as_str().unwrap());

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &uri,
            json!({ "location": "Khlong Toei Market" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["location"], "Khlong Toei Market");
    assert_eq!(updated["description"], created["description"]);
    assert_eq!(updated["waste_type"], created["waste_type"]);

    let delete = axum::http::Request::builder()
        .method(Method::DELETE)
        .uri(&uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = router.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_semantic_search() {
    let (router, _) = test_app();
    create(&router, "Leaking paint cans and solvent drums", "Industrial Estate").await;
    create(&router, "Food scraps rotting in the open market", "Chatuchak").await;

    let response = router
        .oneshot(get(
            "/api/incidents/search/semantic?query=Leaking%20paint%20cans%20and%20solvent%20drums%20Industrial%20Estate",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let results = body_json(response).await;
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["location"], "Industrial Estate");
}

#[tokio::test]
async fn test_ai_endpoints() {
    let (router, _) = test_app();

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/ai/classify",
            json!({ "description": "Leaking paint cans and solvent" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["waste_type"], "hazardous");
    assert_eq!(body["description"], "Leaking paint cans and solvent");

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/ai/extract-keywords",
            json!({ "text": "Textile scraps and old clothes, more clothes", "top_n": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await["keywords"],
        json!(["clothes", "textile"])
    );

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/ai/extract-keywords",
            json!({ "text": "Textile scraps everywhere", "top_n": 21 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_similar_incidents_excludes_requested_id() {
    let (router, _) = test_app();
    let text = "Abandoned television and computer monitors";
    let first = create(&router, text, "Bang Rak").await;
    let second = create(&router, text, "Bang Rak").await;

    assert_eq!(second["similar_incident_ids"], json!([first["id"]]));

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/ai/similar-incidents",
            json!({
                "incident_id": first["id"],
                "description": format!("{} Bang Rak", text),
            }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;

    assert_eq!(body["count"], 1);
    assert_eq!(body["similar_incidents"][0]["id"], second["id"]);
    assert_eq!(body["incident_id"], first["id"]);
}

#[tokio::test]
async fn test_analytics_endpoints() {
    let (router, _) = test_app();
    create(&router, "Plastic bottles and bags scattered near the park", "Lumpini Park").await;
    create(&router, "Plastic wrappers and straws on the beach", "Lumpini Park").await;

    let response = router
        .clone()
        .oneshot(get("/api/analytics/summary"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_incidents"], 2);
    assert_eq!(body["recent_incidents_7d"], 2);
    assert_eq!(body["top_locations"][0]["location"], "Lumpini Park");

    let response = router
        .clone()
        .oneshot(get("/api/analytics/time-series?days=7&group_by=day"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["group_by"], "day");
    assert_eq!(body["days"], 7);

    let response = router
        .clone()
        .oneshot(get("/api/analytics/keywords?limit=3"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["keywords"][0]["keyword"], "plastic");
    assert_eq!(body["keywords"][0]["count"], 2);

    let response = router
        .clone()
        .oneshot(get("/api/analytics/trends?days=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .clone()
        .oneshot(get("/api/analytics/admin-summary"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["period_days"], 7);
    assert_eq!(body["insights"][0]["type"], "overview");
    assert!(body["executive_summary"]
        .as_str()
        .unwrap()
        .starts_with("In the past 7 days, 2 waste incidents were reported"));

    for uri in [
        "/api/analytics/waste-type-trends",
        "/api/analytics/heatmap",
        "/api/analytics/anomalies?threshold_multiplier=1.5",
    ] {
        let response = router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn test_metrics_endpoint() {
    waste_incident_platform::metrics::init_metrics().unwrap();
    let (router, _) = test_app();

    router.clone().oneshot(get("/health")).await.unwrap();

    let response = router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let text = body_text(response).await;
    let metrics = parse_prometheus_output(&text);
    assert!(metrics.contains_key("waste_incident_platform_http_requests_total"));
}

async fn assert_validation_envelope(response: axum::response::Response) {
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["status"], 422);
    assert!(!body["error"]["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_extractor_rejections_use_error_envelope() {
    let (router, _) = test_app();

    // Body missing a required field
    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/incidents",
            json!({ "description": "Plastic bottles and bags scattered near the park" }),
        ))
        .await
        .unwrap();
    assert_validation_envelope(response).await;

    // Malformed id in the path
    let response = router
        .clone()
        .oneshot(get("/api/incidents/not-a-uuid"))
        .await
        .unwrap();
    assert_validation_envelope(response).await;

    // Query value of the wrong type
    let response = router
        .clone()
        .oneshot(get("/api/incidents?page=-1"))
        .await
        .unwrap();
    assert_validation_envelope(response).await;

    // Unknown enum variant in the query
    let response = router
        .oneshot(get("/api/analytics/time-series?group_by=year"))
        .await
        .unwrap();
    assert_validation_envelope(response).await;
}

#[tokio::test]
async fn test_nan_thresholds_are_rejected() {
    let (router, _) = test_app();

    let response = router
        .clone()
        .oneshot(get("/api/analytics/anomalies?threshold_multiplier=NaN"))
        .await
        .unwrap();
    assert_validation_envelope(response).await;

    let response = router
        .oneshot(get("/api/incidents/search/semantic?query=plastic&threshold=NaN"))
        .await
        .unwrap();
    assert_validation_envelope(response).await;
}

#[tokio::test]
async fn test_update_with_null_clears_coordinates() {
    let (router, _) = test_app();

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/incidents",
            json!({
                "description": "Broken glass scattered across the playground",
                "location": "Benjakitti Park",
                "latitude": 13.73,
                "longitude": 100.56,
            }),
        ))
        .await
        .unwrap();
    let created = body_json(response).await;
    let uri = format!("/api/incidents/{}", created["id"].as_str().unwrap());

    let response = router
        .clone()
        .oneshot(json_request(Method::PUT, &uri, json!({ "latitude": null })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert!(updated["latitude"].is_null());
    assert_eq!(updated["longitude"], 100.56);

    let response = router
        .oneshot(json_request(Method::PUT, &uri, json!({ "longitude": 200.0 })))
        .await
        .unwrap();
    assert_validation_envelope(response).await;
}
