use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use biosearch_core::{count_words, Article, ArticleId, ContentType, SearchEngine};
use biosearch_server::build_app;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn article(id: ArticleId, title: &str, content: &str) -> Article {
    Article {
        article_id: id,
        url: format!("https://www.ncbi.nlm.nih.gov/pmc/articles/PMC{:06}/", id),
        title: title.to_string(),
        content: content.to_string(),
        word_count: count_words(content),
        content_type: ContentType::Html,
        file_path: format!("scraped_articles/article_{id}.txt"),
    }
}

fn seeded_app(admin_token: Option<&str>) -> Router {
    let engine = SearchEngine::new();
    engine.upsert(article(1, "Bone loss in orbit", "Microgravity microgravity accelerates bone loss."));
    engine.upsert(article(2, "Muscle atrophy", "Microgravity also drives muscle atrophy."));
    engine.upsert(article(3, "Plant growth", "Arabidopsis grows differently aboard the station."));
    build_app(Arc::new(engine), admin_token.map(String::from))
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let app = seeded_app(None);
    let (status, json) = get_json(&app, "/api/search?q=microgravity&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    let results = json["results"].as_array().unwrap();
    // Article 1 mentions the term twice and ranks first.
    assert_eq!(results[0]["article_id"], 1);
    assert_eq!(results[1]["article_id"], 2);
    assert!(results[0]["snippet"].as_str().unwrap().contains("<mark>"));
}

#[tokio::test]
async fn empty_query_browses_all() {
    let app = seeded_app(None);
    let (status, json) = get_json(&app, "/api/search").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    let ids: Vec<u64> =
        json["results"].as_array().unwrap().iter().map(|r| r["article_id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn limit_zero_is_bad_request() {
    let app = seeded_app(None);
    let (status, json) = get_json(&app, "/api/search?q=microgravity&limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn paginated_search_reports_has_more() {
    let engine = SearchEngine::new();
    for id in 1..=25 {
        engine.upsert(article(id, "T", "spaceflight stress response"));
    }
    let app = build_app(Arc::new(engine), None);

    let (status, p1) = get_json(&app, "/search?q=spaceflight&page=1&per_page=20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(p1["results"].as_array().unwrap().len(), 20);
    assert_eq!(p1["has_more"], true);

    let (_, p2) = get_json(&app, "/search?q=spaceflight&page=2&per_page=20").await;
    assert_eq!(p2["results"].as_array().unwrap().len(), 5);
    assert_eq!(p2["has_more"], false);
}

#[tokio::test]
async fn stats_reflect_the_corpus() {
    let app = seeded_app(None);
    let (status, json) = get_json(&app, "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_articles"], 3);
    assert_eq!(json["content_types"]["HTML"], 3);
}

#[tokio::test]
async fn article_lookup_and_not_found() {
    let app = seeded_app(None);
    let (status, json) = get_json(&app, "/article/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Muscle atrophy");
    assert_eq!(json["content_type"], "HTML");

    let (status, json) = get_json(&app, "/article/999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn admin_endpoints_require_token() {
    let app = seeded_app(Some("sekrit"));

    let body = serde_json::json!({
        "article_id": 9,
        "url": "https://example.org/9",
        "content": "Tardigrades tolerate desiccation and radiation.",
        "content_type": "PDF"
    });

    // No token: rejected.
    let resp = app
        .clone()
        .oneshot(
            Request::post("/api/articles")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Valid token: upserted, then immediately searchable.
    let resp = app
        .clone()
        .oneshot(
            Request::post("/api/articles")
                .header("content-type", "application/json")
                .header("X-ADMIN-TOKEN", "sekrit")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, json) = get_json(&app, "/api/search?q=tardigrades").await;
    assert_eq!(json["count"], 1);
    let (_, json) = get_json(&app, "/article/9").await;
    // Title was omitted from the payload and fell back.
    assert_eq!(json["title"], "Biology Research Article");
    assert_eq!(json["word_count"], 5);

    // Delete with the token retracts the article.
    let resp = app
        .clone()
        .oneshot(
            Request::delete("/api/articles/9")
                .header("X-ADMIN-TOKEN", "sekrit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let (status, _) = get_json(&app, "/article/9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_disabled_when_token_unset() {
    let app = seeded_app(None);
    let resp = app
        .clone()
        .oneshot(
            Request::delete("/api/articles/1")
                .header("X-ADMIN-TOKEN", "anything")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_endpoint() {
    let app = seeded_app(None);
    let resp = app.clone().oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
