use super::setup;
use crate::aggregator::Aggregator;
use crate::cache::SkipSet;
use crate::config::{Config, ProviderConfig};
use crate::models::{ProviderId, ProviderStatus};
use crate::provider::{DataProvider, HttpProvider, ProviderError};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const WALLET: &str = "0x9a006c4de3b93989aa1d16ea78015cec2ebef112";
const API_KEY: &str = "secret";
const TOKEN: &str = "session-1";

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str, api_key: &str) -> HttpProvider {
    let provider_config = ProviderConfig {
        enabled: true,
        base_url: base_url.to_string(),
        api_key: Some(api_key.to_string()),
    };
    HttpProvider::new(ProviderId::One, &provider_config, &Config::default()).unwrap()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["api_key"] == API_KEY {
        Json(json!({ "token": TOKEN })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "bad key").into_response()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

/// Addresses endpoint that answers with `status` for the first `failures`
/// calls and with one address afterwards
fn flaky_addresses(hits: Arc<AtomicUsize>, failures: usize, status: StatusCode, body: &'static str) -> Router {
    Router::new().route("/auth", post(login)).route(
        "/wallets/{wallet}/addresses",
        get(move |headers: HeaderMap| {
            let hits = hits.clone();
            async move {
                if !authorized(&headers) {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                if hits.fetch_add(1, Ordering::SeqCst) < failures {
                    return (status, body).into_response();
                }
                Json(json!({ "addresses": [{ "address": "0xAA", "has_content": true }] })).into_response()
            }
        }),
    )
}

#[tokio::test]
async fn outage_is_retried_until_it_clears() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_addresses(hits.clone(), 1, StatusCode::SERVICE_UNAVAILABLE, "warming up")).await;
    let provider = client(&base_url, API_KEY);

    let credential = provider.authenticate().await.unwrap();
    let batch = provider
        .fetch_addresses(&credential, WALLET, &SkipSet::default())
        .await
        .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(batch.total, 1);
    assert_eq!(batch.addresses[0].address, "0xaa");
}

#[tokio::test]
async fn persistent_outage_gives_up_after_retry_budget() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_addresses(hits.clone(), usize::MAX, StatusCode::BAD_GATEWAY, "down")).await;
    let provider = client(&base_url, API_KEY);

    let credential = provider.authenticate().await.unwrap();
    let result = provider.fetch_addresses(&credential, WALLET, &SkipSet::default()).await;

    assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    // One attempt plus the default two retries
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn undecodable_body_is_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_addresses(hits.clone(), usize::MAX, StatusCode::OK, "<html>oops</html>")).await;
    let provider = client(&base_url, API_KEY);

    let credential = provider.authenticate().await.unwrap();
    let result = provider.fetch_addresses(&credential, WALLET, &SkipSet::default()).await;

    assert!(matches!(result, Err(ProviderError::Malformed(_))));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rate_limit_is_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_addresses(hits.clone(), usize::MAX, StatusCode::TOO_MANY_REQUESTS, "slow down")).await;
    let provider = client(&base_url, API_KEY);

    let credential = provider.authenticate().await.unwrap();
    let result = provider.fetch_addresses(&credential, WALLET, &SkipSet::default()).await;

    assert!(matches!(result, Err(ProviderError::RateLimited(_))));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_api_key_is_an_auth_error() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_addresses(hits.clone(), 0, StatusCode::OK, "")).await;
    let provider = client(&base_url, "wrong");

    assert!(matches!(provider.authenticate().await, Err(ProviderError::Auth(_))));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bad_transfer_record_does_not_sink_an_http_provider() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = flaky_addresses(hits, 0, StatusCode::OK, "").route(
        "/wallets/{wallet}/transfers",
        get(|| async {
            Json(json!({
                "transfers": [
                    {
                        "blockNum": "0x10",
                        "uniqueId": "0xhash:log:0",
                        "hash": "0xhash",
                        "from": WALLET,
                        "to": "0x000000000000000000000000000000000000dead",
                        "tokenId": "",
                        "category": "erc20"
                    },
                    {
                        "blockNum": "0x11",
                        "uniqueId": "0xhash:log:1",
                        "from": WALLET,
                        "tokenId": ""
                    }
                ]
            }))
        }),
    );
    let base_url = serve(router).await;

    let state = setup(&[ProviderId::One]).await;
    let provider: Arc<dyn DataProvider> = Arc::new(client(&base_url, API_KEY));
    let aggregator = Aggregator::new(state, vec![provider]);

    let outcome = aggregator.aggregate(WALLET, &CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.result.providers[&ProviderId::One].status, ProviderStatus::Succeeded);
    assert_eq!(outcome.result.dropped_transactions, 1);
    assert_eq!(outcome.data.transactions.len(), 1);
    assert_eq!(outcome.data.addresses_for(ProviderId::One)[0].address, "0xaa");
}
