//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! listing -> detail -> alternate cycle end-to-end through the real HTTP
//! fetcher.

use recipe_harvest::config::{
    Config, CrawlConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use recipe_harvest::crawler::{harvest, Coordinator, HttpFetcher};
use recipe_harvest::output::{CrawlSummary, MemorySink};
use recipe_harvest::{CanonicalRecord, HarvestError};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at the given listing URL
fn create_test_config(start_url: &str) -> Config {
    Config {
        crawl: CrawlConfig {
            start_url: start_url.to_string(),
            results_wanted: None,
            max_pages: 10,
            collect_details: true,
            dedupe: true,
            recipe_type: "main".to_string(),
            max_concurrency: 4,
        },
        site: SiteConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            proxy_url: None,
            timeout_secs: 5,
        },
        output: OutputConfig::default(),
    }
}

async fn run_crawl(config: &Config) -> (CrawlSummary, Vec<CanonicalRecord>) {
    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent).expect("Failed to build fetcher"));
    let sink = Arc::new(MemorySink::new());

    let summary = Coordinator::new(config, fetcher, sink.clone())
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    (summary, sink.records())
}

fn html(status: u16, body: String) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

/// Listing page whose JSON-LD lists `structured` ids and whose markup links `anchors` ids
fn listing_page(
    base_url: &str,
    structured: impl Iterator<Item = u32>,
    anchors: impl Iterator<Item = u32>,
    next: Option<&str>,
) -> String {
    let items: Vec<String> = structured
        .enumerate()
        .map(|(i, id)| {
            format!(
                r#"{{"@type": "ListItem", "position": {}, "url": "{}/recipe/{}/dish-{}"}}"#,
                i + 1,
                base_url,
                id,
                id
            )
        })
        .collect();
    let links: String = anchors
        .map(|id| format!(r#"<a href="/recipe/{id}/dish-{id}?utm_source=list">Dish {id}</a>"#))
        .collect();
    let next = next
        .map(|href| format!(r#"<a rel="next" href="{}">Next page</a>"#, href))
        .unwrap_or_default();

    format!(
        r#"<html><head>
        <script type="application/ld+json">{{"@context": "https://schema.org", "@type": "ItemList", "itemListElement": [{}]}}</script>
        </head><body>{}{}</body></html>"#,
        items.join(","),
        links,
        next
    )
}

#[tokio::test]
async fn test_listing_union_counts_distinct_locators() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(html(200, listing_page(&base_url, 1..=20, 1..=15, None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/recipes", base_url));
    config.crawl.collect_details = false;

    let (summary, records) = run_crawl(&config).await;

    assert_eq!(records.len(), 20);
    assert_eq!(summary.records_emitted, 20);
    assert_eq!(summary.listing_pages_visited, 1);

    // Structured order is discovery order; tracking params never leak in
    assert_eq!(records[0].url, format!("{}/recipe/1/dish-1", base_url));
    assert_eq!(records[19].url, format!("{}/recipe/20/dish-20", base_url));
    assert!(records.iter().all(|r| !r.url.contains("utm_")));
}

#[tokio::test]
async fn test_budget_without_details_skips_detail_fetches() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(html(200, listing_page(&base_url, 1..=20, 0..0, None)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/recipe/1/dish-1"))
        .respond_with(html(200, "<html></html>".to_string()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/recipes", base_url));
    config.crawl.results_wanted = Some(5);
    config.crawl.collect_details = false;

    let (summary, records) = run_crawl(&config).await;

    assert_eq!(records.len(), 5);
    assert_eq!(summary.minimal_records, 5);
    assert_eq!(records[4].title, "Dish 5");
    assert!(records.iter().all(|r| r.ingredients_count == 0));
    assert!(records.iter().all(|r| r.recipe_type == "main"));
}

#[tokio::test]
async fn test_detail_merges_structured_and_markup() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(html(200, listing_page(&base_url, 1..=1, 0..0, None)))
        .mount(&mock_server)
        .await;

    let detail = r#"<html><head>
        <script type="application/ld+json">
        {"@context": "https://schema.org", "@graph": [
            {"@type": "WebPage", "name": "Site"},
            {"@type": "Recipe", "name": "Weeknight Chili",
             "recipeIngredient": ["1 lb beans", "2 tomatoes"],
             "recipeCuisine": ["Mexican", "Tex-Mex"],
             "aggregateRating": {"ratingValue": "4.6", "reviewCount": "87"}}
        ]}
        </script></head><body>
        <h1>Chili</h1>
        <ol class="recipe-directions"><li>Brown the onions.</li><li>Simmer an hour.</li></ol>
        </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/recipe/1/dish-1"))
        .respond_with(html(200, detail.to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/recipes", base_url));
    let (summary, records) = run_crawl(&config).await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.title, "Weeknight Chili");
    assert_eq!(record.ingredients, vec!["1 lb beans", "2 tomatoes"]);
    assert_eq!(record.ingredients_count, 2);
    assert_eq!(record.instructions, vec!["Brown the onions.", "Simmer an hour."]);
    assert_eq!(record.cuisine.as_deref(), Some("Mexican, Tex-Mex"));
    assert_eq!(record.rating_count, Some(serde_json::json!("87")));
    assert!(record.is_core_complete());
    assert_eq!(summary.complete_records, 1);
    assert_eq!(summary.alternate_fetches, 0);
}

#[tokio::test]
async fn test_empty_detail_falls_back_after_alternates() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let listing = format!(
        r#"<html><body><a href="{}/recipe/1/mystery-dish">?</a></body></html>"#,
        base_url
    );
    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(html(200, listing))
        .mount(&mock_server)
        .await;

    // Detail page and every alternate answer without content
    Mock::given(method("GET"))
        .and(path("/recipe/1/mystery-dish"))
        .respond_with(html(500, String::new()))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/recipes", base_url));
    let (summary, records) = run_crawl(&config).await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.title, "Mystery Dish");
    assert!(record.ingredients.is_empty());
    assert!(record.instructions.is_empty());
    assert_eq!(record.instructions_text, "");
    assert!(!record.is_core_complete());
    assert_eq!(summary.partial_records, 1);
    assert_eq!(summary.alternate_fetches, 4);

    let requests = mock_server.received_requests().await.expect("Request recording disabled");
    let detail_requests = requests
        .iter()
        .filter(|r| r.url.path().starts_with("/recipe/1/mystery-dish"))
        .count();
    // Primary fetch plus bare, print, single-page and AMP alternates
    assert_eq!(detail_requests, 5);
    assert!(requests
        .iter()
        .any(|r| r.url.path() == "/recipe/1/mystery-dish/amp"));
}

#[tokio::test]
async fn test_max_pages_stops_pagination() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(html(
            200,
            listing_page(&base_url, 1..=3, 0..0, Some("/recipes/page/2")),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/recipes/page/2"))
        .respond_with(html(200, listing_page(&base_url, 4..=6, 0..0, None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/recipes", base_url));
    config.crawl.max_pages = 1;
    config.crawl.collect_details = false;

    let (summary, records) = run_crawl(&config).await;

    assert_eq!(records.len(), 3);
    assert_eq!(summary.listing_pages_visited, 1);
}

#[tokio::test]
async fn test_follows_next_page_until_budget() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(html(
            200,
            listing_page(&base_url, 1..=3, 0..0, Some("/recipes/page/2")),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/recipes/page/2"))
        .respond_with(html(
            200,
            listing_page(&base_url, 3..=6, 0..0, Some("/recipes/page/3")),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/recipes/page/3"))
        .respond_with(html(200, listing_page(&base_url, 7..=9, 0..0, None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/recipes", base_url));
    config.crawl.results_wanted = Some(6);
    config.crawl.collect_details = false;

    let (summary, records) = run_crawl(&config).await;

    assert_eq!(records.len(), 6);
    assert_eq!(summary.listing_pages_visited, 2);
    assert_eq!(records[5].url, format!("{}/recipe/6/dish-6", base_url));
}

#[tokio::test]
async fn test_unreachable_start_page_fails() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&format!("{}/recipes", mock_server.uri()));

    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent).unwrap());
    let sink = Arc::new(MemorySink::new());
    let result = Coordinator::new(&config, fetcher, sink.clone())
        .unwrap()
        .run()
        .await;

    assert!(matches!(result, Err(HarvestError::StartupFetch { .. })));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_harvest_writes_json_lines() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().unwrap();
    let records_path = dir.path().join("out").join("recipes.jsonl");

    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(html(200, listing_page(&base_url, 1..=4, 0..0, None)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/recipes", base_url));
    config.crawl.collect_details = false;
    config.output.records_path = records_path.display().to_string();

    let summary = harvest(&config).await.expect("Harvest failed");
    assert_eq!(summary.records_emitted, 4);

    let content = std::fs::read_to_string(&records_path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["title"], "Dish 1");
    assert_eq!(lines[0]["recipe_type"], "main");
    assert!(lines[0]["scraped_at"].is_string());
}
