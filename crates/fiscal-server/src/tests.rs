//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use fiscal_core::{
    test_utils::MockModelServer, AIClient, AssistantConfig, MockBackend, OpenAICompatibleBackend,
    PromptLibrary,
};
use http_body_util::BodyExt;
use std::fs;
use tempfile::TempDir;
use tower::ServiceExt;

const RECORDS: &str = "year,ministry,category,expenditure,revenue
2022,Ministry of Defence,Capital Outlay,500,0
2022,Ministry of Health and Family Welfare,Revenue,200,0
2022,Ministry of Finance,Tax Revenue,0,600
2023,Ministry of Defence,Capital Outlay,450,0
2023,Ministry of Health and Family Welfare,Revenue,260,0
2023,Ministry of Education,Revenue,130,0
2023,Ministry of Finance,Tax Revenue,0,700
";

const SUMMARY: &str = "year,gdp_nominal_in_crores,fiscal_deficit_as_gdp_pct
2022,10000,6.4
2023,11000,5.9
";

const SPEECHES: &str = "year,ai_summary
2023,Capital investment raised; health mission expanded.
";

fn load_state(assistant: Option<Assistant>) -> AppState {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("budget_records.csv"), RECORDS).unwrap();
    fs::write(dir.path().join("budget_summary.csv"), SUMMARY).unwrap();
    fs::write(dir.path().join("speeches.csv"), SPEECHES).unwrap();
    let (store, report) = BudgetStore::load(dir.path()).unwrap();
    AppState::new(store, report, assistant)
}

fn mock_assistant(backend: MockBackend) -> Assistant {
    Assistant::new(AIClient::Mock(backend), &AssistantConfig::default())
        .with_prompts(PromptLibrary::embedded_only())
}

fn app_with(assistant: Option<Assistant>) -> Router {
    create_router(
        Arc::new(load_state(assistant)),
        None,
        &ServerConfig::default(),
    )
}

fn setup_test_app() -> Router {
    app_with(Some(mock_assistant(MockBackend::with_reply("Defence leads."))))
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

// ========== Status ==========

#[tokio::test]
async fn test_health() {
    let response = get(setup_test_app(), "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_status_reports_missing_files() {
    let response = get(setup_test_app(), "/api/status").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["years"], serde_json::json!([2022, 2023]));
    assert_eq!(json["assistant"]["configured"], true);
    assert_eq!(json["assistant"]["backend"], "mock");
    assert_eq!(json["assistant"]["available"], true);

    let missing = json["report"]["missing"].as_array().unwrap();
    assert!(missing.contains(&serde_json::json!("revenue_sources")));
    assert!(missing.contains(&serde_json::json!("schemes")));
}

#[tokio::test]
async fn test_status_assistant_availability() {
    let app = app_with(Some(mock_assistant(MockBackend::unhealthy())));
    let json = get_body_json(get(app, "/api/status").await).await;
    assert_eq!(json["assistant"]["configured"], true);
    assert_eq!(json["assistant"]["available"], false);

    let json = get_body_json(get(app_with(None), "/api/status").await).await;
    assert_eq!(json["assistant"]["configured"], false);
    assert_eq!(json["assistant"]["available"], false);
}

#[tokio::test]
async fn test_security_headers() {
    let response = get(setup_test_app(), "/api/health").await;
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("content-security-policy"));
}

// ========== Years ==========

#[tokio::test]
async fn test_list_years() {
    let json = get_body_json(get(setup_test_app(), "/api/years").await).await;
    assert_eq!(json["years"], serde_json::json!([2022, 2023]));
    assert_eq!(json["latest"], 2023);
}

#[tokio::test]
async fn test_summary_deficit() {
    let response = get(setup_test_app(), "/api/years/2022/summary").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_expenditure"], 700.0);
    assert_eq!(json["total_revenue"], 600.0);
    assert_eq!(json["deficit"], 100.0);
    assert_eq!(json["fiscal_deficit_pct"], 6.4);
}

#[tokio::test]
async fn test_unknown_year_is_404() {
    let response = get(setup_test_app(), "/api/years/2019/summary").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("2019"));
}

#[tokio::test]
async fn test_overview() {
    let json = get_body_json(get(setup_test_app(), "/api/years/2023/overview").await).await;
    assert_eq!(json["summary"]["year"], 2023);
    assert_eq!(json["top_ministries"][0]["ministry"], "Ministry of Defence");
    assert_eq!(json["fiscal_health"]["deficit_trend"], "improving");
    assert!(json["speech_summary"].as_str().is_some());
}

#[tokio::test]
async fn test_split_falls_back_to_records() {
    let json = get_body_json(get(setup_test_app(), "/api/years/2023/split").await).await;
    assert_eq!(json["total_revenue"], 700.0);
    let sources = json["revenue_sources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
}

// ========== Ministries ==========

#[tokio::test]
async fn test_list_ministries_with_limit() {
    let json =
        get_body_json(get(setup_test_app(), "/api/years/2023/ministries?limit=2").await).await;
    let ministries = json.as_array().unwrap();
    assert_eq!(ministries.len(), 2);
    assert_eq!(ministries[0]["rank"], 1);
    assert_eq!(ministries[0]["ministry"], "Ministry of Defence");
}

#[tokio::test]
async fn test_get_ministry_partial_name() {
    let response = get(setup_test_app(), "/api/years/2023/ministries/education").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["ministry"], "Ministry of Education");
    assert_eq!(json["expenditure"], 130.0);
}

#[tokio::test]
async fn test_ministry_absent_in_year_is_404() {
    let response = get(setup_test_app(), "/api/years/2022/ministries/Education").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Compare ==========

#[tokio::test]
async fn test_compare_years() {
    let response = get(setup_test_app(), "/api/compare?years=2023,2022").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let summaries = json["summaries"].as_array().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0]["year"], 2022);
    assert_eq!(summaries[1]["year"], 2023);
}

#[tokio::test]
async fn test_compare_bad_input() {
    let response = get(setup_test_app(), "/api/compare?years=20x2").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(setup_test_app(), "/api/compare").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(setup_test_app(), "/api/compare?years=2022,2030").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Insights & Search ==========

#[tokio::test]
async fn test_insights() {
    let json = get_body_json(get(setup_test_app(), "/api/insights").await).await;
    assert!(!json["key_findings"].as_array().unwrap().is_empty());
    assert!(json["fiscal_analysis"]["trend"].is_string());
}

#[tokio::test]
async fn test_search() {
    let json = get_body_json(get(setup_test_app(), "/api/search?q=health").await).await;
    assert_eq!(
        json["ministries"][0]["name"],
        "Ministry of Health and Family Welfare"
    );

    let response = get(setup_test_app(), "/api/search?q=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Assistant ==========

#[tokio::test]
async fn test_suggestions() {
    let json = get_body_json(get(setup_test_app(), "/api/suggestions?year=2023").await).await;
    let questions = json.as_array().unwrap();
    assert_eq!(questions.len(), 8);
    assert!(questions[0].as_str().unwrap().contains("2023"));
}

#[tokio::test]
async fn test_ask() {
    let response = post_json(
        setup_test_app(),
        "/api/ask",
        serde_json::json!({ "question": "Who spends most?", "year": 2023 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["answer"], "Defence leads.");
    assert_eq!(json["year"], 2023);
}

#[tokio::test]
async fn test_ask_with_history() {
    let app = app_with(Some(mock_assistant(MockBackend::new())));
    let response = post_json(
        app,
        "/api/ask",
        serde_json::json!({
            "question": "And education?",
            "history": [
                { "role": "user", "content": "Who spends most?" },
                { "role": "assistant", "content": "Defence." }
            ]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert!(json["answer"]
        .as_str()
        .unwrap()
        .starts_with("Mock answer (2 prior messages)"));
}

#[tokio::test]
async fn test_ask_empty_question_is_400() {
    let response = post_json(
        setup_test_app(),
        "/api/ask",
        serde_json::json!({ "question": "   " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ask_without_assistant_is_503() {
    let response = post_json(
        app_with(None),
        "/api/ask",
        serde_json::json!({ "question": "Who spends most?" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_ask_backend_failure_is_503_without_details() {
    let server = MockModelServer::builder().fail_times(1, 500).start().await;
    let client = AIClient::OpenAICompatible(OpenAICompatibleBackend::new(&server.url(), "test"));
    let assistant = Assistant::new(client, &AssistantConfig::default())
        .with_prompts(PromptLibrary::embedded_only());

    let response = post_json(
        app_with(Some(assistant)),
        "/api/ask",
        serde_json::json!({ "question": "Who spends most?" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "The assistant is currently unavailable");
}

#[tokio::test]
async fn test_speech_analysis() {
    let response = post_json(
        setup_test_app(),
        "/api/years/2023/speech-analysis",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["analysis"], "Defence leads.");

    let response = post_json(
        setup_test_app(),
        "/api/years/2022/speech-analysis",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Errors ==========

#[test]
fn test_error_status_mapping() {
    use fiscal_core::Error;

    assert_eq!(
        AppError::from(Error::NotFound("x".into())).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::from(Error::InvalidData("x".into())).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::from(Error::AssistantUnavailable("x".into())).status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        AppError::from(Error::Config("x".into())).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
