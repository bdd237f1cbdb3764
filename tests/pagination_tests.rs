//! Integration tests for lazy pagination over a mock list endpoint.
//!
//! The list function drives the query endpoint with numeric start positions
//! behind the opaque page token, the way resource services consume the
//! pagination engine.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use quickbooks_api::pagination::{ListPager, Page, PageFuture, PageRequest, PageToken};
use quickbooks_api::{
    ApiClient, ApiRequest, AuthScopes, ClientId, ClientSecret, CompanyId, Credential, HttpMethod,
    QuickBooksConfig, RetryPolicy, TokenSource,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY_PATH: &str = "/v3/company/4620816365/query";

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct Invoice {
    #[serde(rename = "Id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "QueryResponse")]
    query_response: InvoicePage,
}

#[derive(Debug, Deserialize)]
struct InvoicePage {
    #[serde(rename = "Invoice", default)]
    invoices: Vec<Invoice>,
}

fn invoice_body(ids: &[&str]) -> serde_json::Value {
    let invoices: Vec<serde_json::Value> =
        ids.iter().map(|id| serde_json::json!({"Id": id})).collect();
    serde_json::json!({"QueryResponse": {"Invoice": invoices}})
}

fn build_client(server_uri: &str, credential: Credential, margin: Duration) -> Arc<ApiClient> {
    let config = QuickBooksConfig::builder()
        .client_id(ClientId::new("test-client-id").unwrap())
        .client_secret(ClientSecret::new("test-secret").unwrap())
        .api_host(server_uri)
        .retry_policy(
            RetryPolicy::default()
                .with_max_attempts(3)
                .with_initial_backoff(StdDuration::from_millis(10))
                .with_jitter(0.0),
        )
        .build()
        .unwrap();

    let source = Arc::new(
        TokenSource::new(Arc::new(config.clone()), credential).with_safety_margin(margin),
    );

    Arc::new(ApiClient::new(
        &config,
        CompanyId::new("4620816365").unwrap(),
        source,
    ))
}

fn long_lived_credential() -> Credential {
    Credential::new(
        "valid-access-token".to_string(),
        "refresh-token".to_string(),
        Utc::now() + Duration::hours(1),
        AuthScopes::accounting(),
    )
}

/// Builds a pager that lists invoices page by page.
///
/// The opaque token carries the 1-based start position; the page size falls
/// back to 100 like the provider default when the caller sets none.
fn invoice_pager(
    client: Arc<ApiClient>,
    cancel: CancellationToken,
) -> ListPager<Invoice, impl FnMut(PageRequest, CancellationToken) -> PageFuture<Invoice>> {
    ListPager::new(
        move |request: PageRequest, cancel| {
            let client = Arc::clone(&client);
            Box::pin(async move {
                let start: u32 = request
                    .token
                    .as_ref()
                    .map_or(1, |token| token.as_str().parse().unwrap_or(1));
                let limit = request.limit.unwrap_or(100);

                let api_request = ApiRequest::builder(HttpMethod::Get, "query")
                    .query_param(
                        "query",
                        format!(
                            "select * from Invoice STARTPOSITION {start} MAXRESULTS {limit}"
                        ),
                    )
                    .build()?;

                let response: QueryResponse = client.execute(api_request, &cancel).await?;
                let invoices = response.query_response.invoices;

                // A short page means there is nothing further to fetch
                let full = invoices.len() as u32 == limit;
                let next =
                    full.then(|| PageToken::new((start + limit).to_string()));

                Ok(Page::new(invoices, next))
            }) as PageFuture<Invoice>
        },
        cancel,
    )
}

fn page_query(start: u32, limit: u32) -> String {
    format!("select * from Invoice STARTPOSITION {start} MAXRESULTS {limit}")
}

#[tokio::test]
async fn test_three_pages_yield_all_items_in_order() {
    let server = MockServer::start().await;
    let client = build_client(&server.uri(), long_lived_credential(), Duration::seconds(60));

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("query", page_query(1, 2)))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice_body(&["1", "2"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("query", page_query(3, 2)))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice_body(&["3", "4"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("query", page_query(5, 2)))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice_body(&["5"])))
        .expect(1)
        .mount(&server)
        .await;

    let mut pager = invoice_pager(client, CancellationToken::new()).with_page_size(2);

    let mut ids = Vec::new();
    while pager.advance().await {
        ids.push(pager.current().unwrap().id.clone());
    }

    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    assert!(pager.error().is_none());

    // Exhaustion is terminal
    assert!(!pager.advance().await);
    assert!(pager.error().is_none());
}

#[tokio::test]
async fn test_failing_first_page_surfaces_attempt_count() {
    let server = MockServer::start().await;
    let client = build_client(&server.uri(), long_lived_credential(), Duration::seconds(60));

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .expect(3)
        .mount(&server)
        .await;

    let mut pager =
        invoice_pager(client, CancellationToken::new()).with_page_size(2);

    assert!(!pager.advance().await);

    let error = pager.error().unwrap();
    assert_eq!(error.status(), Some(500));
    assert_eq!(error.attempts(), Some(3));

    // The error is stable across calls
    assert!(!pager.advance().await);
    assert_eq!(pager.error().unwrap().status(), Some(500));
}

#[tokio::test]
async fn test_token_refresh_between_pages_is_invisible_to_the_caller() {
    let server = MockServer::start().await;

    // Token valid for the first page only, with no safety margin
    let credential = Credential::new(
        "first-page-token".to_string(),
        "refresh-token".to_string(),
        Utc::now() + Duration::milliseconds(300),
        AuthScopes::accounting(),
    );
    let client = build_client(&server.uri(), credential, Duration::zero());

    Mock::given(method("POST"))
        .and(path("/oauth2/v1/tokens/bearer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "second-page-token",
            "refresh_token": "rotated-refresh-token",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("query", page_query(1, 2)))
        .and(header("authorization", "Bearer first-page-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice_body(&["1", "2"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("query", page_query(3, 2)))
        .and(header("authorization", "Bearer second-page-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice_body(&["3"])))
        .expect(1)
        .mount(&server)
        .await;

    let mut pager = invoice_pager(client, CancellationToken::new()).with_page_size(2);

    // Page 1 with the original token
    assert!(pager.advance().await);
    assert!(pager.advance().await);

    // Let the access token expire before the page 2 fetch
    tokio::time::sleep(StdDuration::from_millis(400)).await;

    // Page 2 triggers exactly one refresh and still arrives
    assert!(pager.advance().await);
    assert_eq!(pager.current().unwrap().id, "3");

    assert!(!pager.advance().await);
    assert!(pager.error().is_none());
}

#[tokio::test]
async fn test_cancellation_after_first_item_stops_fetching() {
    let server = MockServer::start().await;
    let client = build_client(&server.uri(), long_lived_credential(), Duration::seconds(60));

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("query", page_query(1, 2)))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice_body(&["1", "2"])))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let mut pager = invoice_pager(client, cancel.clone()).with_page_size(2);

    // Receive page 1 item 1 of 2, then cancel
    assert!(pager.advance().await);
    assert_eq!(pager.current().unwrap().id, "1");
    cancel.cancel();

    assert!(!pager.advance().await);
    assert!(pager.error().unwrap().is_cancelled());

    // Only the single page-1 request ever went out (expect(1) verifies on
    // drop), and the terminal state is stable
    assert!(!pager.advance().await);
    assert!(pager.error().unwrap().is_cancelled());
}
