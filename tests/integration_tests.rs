use ads_keyword_metrics::{app, AppConfig, CliConfig, PipelineError};
use chrono::Datelike;
use clap::Parser;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const ADS_PATH: &str = "/v21/customers/1234567890:generateKeywordIdeas";

fn app_config(server: &MockServer, extra: &[&str]) -> AppConfig {
    let ads_base = server.base_url();
    let token_url = server.url("/token");
    let sheets_base = server.url("/v4");
    let mut args = vec![
        "ads-keyword-metrics",
        "--ads-developer-token",
        "dev-token",
        "--ads-client-id",
        "client-id",
        "--ads-client-secret",
        "client-secret",
        "--ads-refresh-token",
        "refresh-token",
        "--ads-client-customer-id",
        "123-456-7890",
        "--ads-api-base",
        ads_base.as_str(),
        "--oauth-token-url",
        token_url.as_str(),
        "--sheets-api-base",
        sheets_base.as_str(),
        "--ads-max-retries",
        "0",
    ];
    args.extend_from_slice(extra);
    CliConfig::try_parse_from(args)
        .unwrap()
        .into_app_config()
        .unwrap()
}

fn mock_ads_token(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/token")
            .body_contains("grant_type=refresh_token");
        then.status(200).json_body(json!({
            "access_token": "ads-access-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        }));
    })
}

#[tokio::test]
async fn test_csv_source_end_to_end_without_sheet() {
    let temp_dir = TempDir::new().unwrap();
    let mut csv = String::from("id,keyword\n");
    for i in 0..150 {
        csv.push_str(&format!("{},kw-{:03}\n", i, i));
    }
    // duplicates and blanks are dropped before batching
    csv.push_str("150,kw-000\n151,  \n152, kw-001 \n");
    std::fs::write(temp_dir.path().join("keywords.csv"), csv).unwrap();

    let server = MockServer::start();
    let token = mock_ads_token(&server);
    let first_batch = server.mock(|when, then| {
        when.method(POST)
            .path(ADS_PATH)
            .header("developer-token", "dev-token")
            .body_contains("\"kw-000\"")
            .body_contains("\"includeAdultKeywords\":false");
        then.status(200).json_body(json!({
            "results": [
                {"text": "kw-000", "keywordIdeaMetrics": {"avgMonthlySearches": "90", "competition": "LOW"}},
                {"text": "kw-001"}
            ]
        }));
    });
    let second_batch = server.mock(|when, then| {
        when.method(POST).path(ADS_PATH).body_contains("\"kw-100\"");
        then.status(200).json_body(json!({
            "results": [
                {"text": "kw-100", "keywordIdeaMetrics": {
                    "avgMonthlySearches": "5400",
                    "competition": "HIGH",
                    "lowTopOfPageBidMicros": "250000",
                    "highTopOfPageBidMicros": "1900000"
                }}
            ]
        }));
    });

    let config = app_config(&server, &["--sheet-id", ""]);
    assert!(config.sheets.is_none());

    let summary = app::run(config, temp_dir.path(), false).await.unwrap();

    token.assert_hits(1);
    first_batch.assert_hits(1);
    second_batch.assert_hits(1);
    assert_eq!(summary.keywords, 150);
    assert_eq!(summary.records, 3);

    let bytes = std::fs::read(temp_dir.path().join("output/ads_keyword_metrics.csv")).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.trim_start_matches('\u{FEFF}').lines().collect();
    assert_eq!(
        lines,
        vec![
            "keyword,avg_monthly_searches,competition,low_top_of_page_bid_micros,high_top_of_page_bid_micros",
            "kw-100,5400,HIGH,250000,1900000",
            "kw-000,90,LOW,,",
            "kw-001,,UNKNOWN,,",
        ]
    );
}

#[tokio::test]
async fn test_sheet_source_and_sink_with_service_account() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let service_account = json!({
        "type": "service_account",
        "client_email": "metrics@test-project.iam.gserviceaccount.com",
        "private_key": include_str!("fixtures/test_service_account_key.pem"),
        "token_uri": server.url("/sa-token")
    })
    .to_string();

    let ads_token = mock_ads_token(&server);
    let sa_token = server.mock(|when, then| {
        when.method(POST)
            .path("/sa-token")
            .body_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer");
        then.status(200).json_body(json!({
            "access_token": "sheets-access-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        }));
    });
    let titles = server.mock(|when, then| {
        when.method(GET)
            .path("/v4/spreadsheets/sheet-xyz")
            .header("authorization", "Bearer sheets-access-token");
        then.status(200)
            .json_body(json!({"sheets": [{"properties": {"title": "Keywords"}}]}));
    });
    let read = server.mock(|when, then| {
        when.method(GET)
            .path_contains("/v4/spreadsheets/sheet-xyz/values/")
            .path_contains("Keywords");
        then.status(200).json_body(json!({
            "values": [["Keyword"], ["shoes"], ["Shoes"], [" boots "], ["shoes"], []]
        }));
    });
    let ads = server.mock(|when, then| {
        when.method(POST)
            .path(ADS_PATH)
            .header("authorization", "Bearer ads-access-token")
            .json_body_partial(r#"{"keywordSeed": {"keywords": ["shoes", "Shoes", "boots"]}, "keywordPlanNetwork": "GOOGLE_SEARCH"}"#);
        then.status(200).json_body(json!({
            "results": [
                {"text": "boots", "keywordIdeaMetrics": {"avgMonthlySearches": "880", "competition": 3}},
                {"text": "shoes", "keywordIdeaMetrics": {"avgMonthlySearches": "12100", "competition": 4}}
            ]
        }));
    });
    let add_tab = server.mock(|when, then| {
        when.method(POST)
            .path("/v4/spreadsheets/sheet-xyz:batchUpdate")
            .body_contains("\"Metrics\"");
        then.status(200).json_body(json!({"replies": [{}]}));
    });
    let header = server.mock(|when, then| {
        when.method(POST)
            .path_contains(":append")
            .body_contains("\"date_yyyy\"");
        then.status(200).json_body(json!({}));
    });
    let today = chrono::Local::now().date_naive();
    let (yyyy, mm, dd) = (today.year(), today.month(), today.day());
    let rows = server.mock(|when, then| {
        when.method(POST).path_contains(":append").json_body(json!({
            "majorDimension": "ROWS",
            "values": [
                ["boots", "DE", "de", 880, "MEDIUM", 0, 0, "2276,2040", "1001", yyyy, mm, dd],
                ["shoes", "DE", "de", 12100, "HIGH", 0, 0, "2276,2040", "1001", yyyy, mm, dd]
            ]
        }));
        then.status(200).json_body(json!({}));
    });

    let config = app_config(
        &server,
        &[
            "--sheet-id",
            "sheet-xyz",
            "--out-tab",
            "Metrics",
            "--country",
            "DE",
            "--lang-tag",
            "de",
            "--language-id",
            "1001",
            "--location-ids",
            "2276,2040",
            "--service-account-json",
            service_account.as_str(),
        ],
    );

    let summary = app::run(config, temp_dir.path(), false).await.unwrap();

    ads_token.assert_hits(1);
    sa_token.assert_hits(1);
    read.assert_hits(1);
    ads.assert_hits(1);
    add_tab.assert_hits(1);
    header.assert_hits(1);
    rows.assert_hits(1);
    assert!(titles.hits() >= 2);
    assert_eq!(summary.keywords, 3);
    assert_eq!(summary.records, 2);

    // the CSV is sorted by volume while the sheet keeps provider order
    let csv = std::fs::read_to_string(temp_dir.path().join("output/ads_keyword_metrics.csv")).unwrap();
    let first_row = csv.lines().nth(1).unwrap();
    assert!(first_row.starts_with("shoes,12100,HIGH"));
}

#[tokio::test]
async fn test_provider_failure_aborts_before_output() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("keywords.csv"), "keyword\nshoes\n").unwrap();

    let server = MockServer::start();
    mock_ads_token(&server);
    server.mock(|when, then| {
        when.method(POST).path(ADS_PATH);
        then.status(403).json_body(json!({
            "error": {
                "code": 403,
                "message": "The caller does not have permission",
                "status": "PERMISSION_DENIED",
                "details": [{
                    "@type": "type.googleapis.com/google.ads.googleads.v21.errors.GoogleAdsFailure",
                    "errors": [{
                        "errorCode": {"authorizationError": "DEVELOPER_TOKEN_NOT_APPROVED"},
                        "message": "The developer token is only approved for use with test accounts."
                    }],
                    "requestId": "abc123"
                }]
            }
        }));
    });

    let config = app_config(&server, &["--sheet-id", ""]);
    let err = app::run(config, temp_dir.path(), false).await.unwrap_err();

    assert_eq!(err.exit_code(), 3);
    match &err {
        PipelineError::ProviderError { status, details, .. } => {
            assert_eq!(status, "PERMISSION_DENIED");
            assert!(details
                .iter()
                .any(|d| d.contains("DEVELOPER_TOKEN_NOT_APPROVED")));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!temp_dir
        .path()
        .join("output/ads_keyword_metrics.csv")
        .exists());
}

#[tokio::test]
async fn test_empty_keyword_csv_is_configuration_error() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("keywords.csv"), "keyword\n\n   \n").unwrap();

    let server = MockServer::start();
    let token = mock_ads_token(&server);

    let config = app_config(&server, &["--sheet-id", ""]);
    let err = app::run(config, temp_dir.path(), false).await.unwrap_err();

    assert!(matches!(err, PipelineError::EmptyKeywords));
    assert_eq!(err.exit_code(), 2);
    token.assert_hits(0);
}

#[test]
fn test_missing_credentials_rejected_at_startup() {
    let err = CliConfig::try_parse_from([
        "ads-keyword-metrics",
        "--ads-developer-token",
        "dev-token",
        "--ads-client-id",
        "client-id",
    ])
    .unwrap()
    .into_app_config()
    .unwrap_err();

    assert!(matches!(err, PipelineError::MissingConfigError { .. }));
    assert_eq!(err.exit_code(), 2);
}
