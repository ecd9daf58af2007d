// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use serde_json::json;
use tradelens::ai::{AiError, GeminiClient, GenerateRequest, ImagePart, VisionModel};
use tradelens::market::{QuoteProvider, YahooClient};
use tradelens::utils::http_client;
use tradelens::error::AppError;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn yahoo(server: &MockServer) -> YahooClient {
    YahooClient::new(http_client(5).unwrap(), server.uri())
}

#[tokio::test]
async fn yahoo_quotes_are_batched_into_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .and(query_param("symbols", "INFY.NS,TCS.NS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quoteResponse": {
                "result": [
                    {
                        "symbol": "INFY.NS",
                        "shortName": "INFOSYS LIMITED",
                        "regularMarketPrice": 1500.5,
                        "regularMarketChange": 12.0,
                        "regularMarketChangePercent": 0.81,
                        "regularMarketVolume": 123456
                    },
                    { "symbol": "TCS.NS", "longName": "Tata Consultancy Services" }
                ],
                "error": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let quotes = yahoo(&server)
        .quotes(&["INFY.NS".to_string(), "TCS.NS".to_string()])
        .await
        .unwrap();
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0].regular_market_price, Some(1500.5));
    assert_eq!(quotes[0].regular_market_volume, Some(123456));
    assert_eq!(quotes[1].display_name(), "Tata Consultancy Services");
    assert_eq!(quotes[1].regular_market_price, None);
}

#[tokio::test]
async fn yahoo_search_keeps_indian_listings_matching_the_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/finance/search"))
        .and(query_param("q", "infy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quotes": [
                { "symbol": "INFY.NS", "shortname": "INFOSYS LIMITED", "exchange": "NSI", "exchDisp": "NSE" },
                { "symbol": "INFY.BO", "longname": "Infosys Limited", "exchange": "BSE", "exchDisp": "Bombay" },
                { "symbol": "INFY", "shortname": "Infosys Limited", "exchange": "NYQ", "exchDisp": "NYSE" },
                { "symbol": "WIPRO.NS", "shortname": "WIPRO LTD", "exchange": "NSI", "exchDisp": "NSE" }
            ]
        })))
        .mount(&server)
        .await;

    let hits = yahoo(&server).search("infy").await.unwrap();
    let symbols: Vec<&str> = hits.iter().map(|h| h.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["INFY.NS", "INFY.BO"]);
    assert_eq!(hits[1].name, "Infosys Limited");
}

#[tokio::test]
async fn yahoo_history_skips_null_closes() {
    let server = MockServer::start().await;
    // 2025-01-01, 2025-01-02, 2025-01-03 at 03:45 UTC (NSE open)
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/INFY.NS"))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {
                "result": [{
                    "timestamp": [1735703100, 1735789500, 1735875900],
                    "indicators": { "quote": [{ "close": [1900.0, null, 1925.5] }] }
                }],
                "error": null
            }
        })))
        .mount(&server)
        .await;

    let points = yahoo(&server)
        .history("INFY.NS", d("2025-01-01"), d("2025-01-03"))
        .await
        .unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].date, d("2025-01-01"));
    assert_eq!(points[1].date, d("2025-01-03"));
    assert_eq!(points[1].price, 1925.5);
}

#[tokio::test]
async fn yahoo_unknown_symbol_history_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/NOPE.NS"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        })))
        .mount(&server)
        .await;

    let points = yahoo(&server)
        .history("NOPE.NS", d("2025-01-01"), d("2025-01-31"))
        .await
        .unwrap();
    assert!(points.is_empty());
}

#[tokio::test]
async fn gemini_sends_images_and_joins_text_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "1. *Summary" }, { "text": " & Portfolio*" }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(
        http_client(5).unwrap(),
        server.uri(),
        "gemini-1.5-flash",
        Some("test-key".into()),
    );
    let text = client
        .generate(GenerateRequest {
            prompt: "analyse".into(),
            images: vec![ImagePart {
                mime_type: "image/png".into(),
                data: vec![1, 2, 3],
            }],
            config: None,
        })
        .await
        .unwrap();
    assert_eq!(text, "1. *Summary & Portfolio*");

    let received = server.received_requests().await.unwrap();
    assert!(received[0].url.query().is_none());
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["contents"][0]["parts"][1]["inline_data"]["data"], "AQID");
}

#[tokio::test]
async fn gemini_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(
        http_client(5).unwrap(),
        server.uri(),
        "gemini-1.5-flash",
        Some("k".into()),
    );
    let err = client.generate(GenerateRequest::text("hi")).await.unwrap_err();
    match err {
        AiError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn gemini_without_key_is_not_configured() {
    let client = GeminiClient::new(
        http_client(5).unwrap(),
        "http://127.0.0.1:9",
        "gemini-1.5-flash",
        None,
    );
    assert!(!client.is_configured());
    let err = client.generate(GenerateRequest::text("hi")).await.unwrap_err();
    assert!(matches!(err, AiError::NotConfigured));
}

#[tokio::test]
async fn gemini_transport_errors_do_not_expose_the_key() {
    let client = GeminiClient::new(
        http_client(5).unwrap(),
        "http://127.0.0.1:9",
        "gemini-1.5-flash",
        Some("SECRET_KEY_123".into()),
    );
    let err = client.generate(GenerateRequest::text("hi")).await.unwrap_err();
    assert!(matches!(err, AiError::Http(_)));
    assert!(!err.to_string().contains("SECRET_KEY_123"));

    let shown = AppError::upstream("Failed to analyze screenshot.", err).to_string();
    assert!(!shown.contains("SECRET_KEY_123"), "leaked in: {shown}");
    assert!(!shown.contains("127.0.0.1:9/models"));
}
