use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use rublebot::bot::Bot;
use rublebot::core::config::AppConfig;
use rublebot::core::{CurrencyCode, CurrencyRateProvider, FetchStage};
use rublebot::providers::{CachingRateProvider, CbrRateProvider};

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn daily_response(usd: f64) -> String {
        format!(
            r#"{{
        "Date": "2024-05-08T11:30:00+03:00",
        "Valute": {{
            "USD": {{"CharCode": "USD", "Nominal": 1, "Name": "Доллар США", "Value": {usd}}},
            "EUR": {{"CharCode": "EUR", "Nominal": 1, "Name": "Евро", "Value": 98.7858}},
            "CNY": {{"CharCode": "CNY", "Nominal": 1, "Name": "Китайский юань", "Value": 12.6761}},
            "HKD": {{"CharCode": "HKD", "Nominal": 1, "Name": "Гонконгский доллар", "Value": 11.7405}}
        }}
    }}"#
        )
    }

    pub async fn create_cbr_mock_server(mock_response: &str, expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/daily_json.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;

        mock_server
    }
}

fn config_for(base_url: &str, ttl_secs: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.providers.cbr = Some(rublebot::core::config::CbrProviderConfig {
        base_url: base_url.to_string(),
    });
    config.cache_ttl_secs = ttl_secs;
    config
}

#[test_log::test(tokio::test)]
async fn test_bot_answers_from_cache_within_ttl() {
    // Two questions about the same currency, one upstream request
    let mock_server =
        test_utils::create_cbr_mock_server(&test_utils::daily_response(91.7791), 1).await;
    let bot = Bot::from_config(&config_for(&mock_server.uri(), 300)).expect("Failed to build bot");

    let first = bot.on_message("Хочу купить Доллар США [RUB/USD]").await;
    let second = bot.on_message("Доллар США [RUB/USD]").await;

    assert_eq!(first, "cost of 1 USD = 91.7791 ₽");
    assert_eq!(first, second);
    assert_eq!(
        bot.on_message("случайный текст").await,
        "I don't understand what you want"
    );
}

#[test_log::test(tokio::test)]
async fn test_rate_is_refetched_after_ttl() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily_json.js"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(test_utils::daily_response(91.7791)),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/daily_json.js"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(test_utils::daily_response(92.0)),
        )
        .mount(&mock_server)
        .await;

    let upstream = CbrRateProvider::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();
    let provider = CachingRateProvider::new(upstream, Duration::from_millis(50));

    assert_eq!(provider.get_rate(CurrencyCode::Usd).await.unwrap(), 91.7791);
    assert_eq!(provider.get_rate(CurrencyCode::Usd).await.unwrap(), 91.7791);

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(provider.get_rate(CurrencyCode::Usd).await.unwrap(), 92.0);
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        provider.cache().peek(CurrencyCode::Usd).await.unwrap().value,
        92.0
    );
}

#[test_log::test(tokio::test)]
async fn test_upstream_failure_is_not_cached() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily_json.js"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/daily_json.js"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(test_utils::daily_response(91.7791)),
        )
        .mount(&mock_server)
        .await;

    let upstream = CbrRateProvider::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();
    let provider = Arc::new(CachingRateProvider::new(upstream, Duration::from_secs(300)));

    let err = provider.get_rate(CurrencyCode::Eur).await.unwrap_err();
    assert_eq!(err.stage, FetchStage::HttpStatus);
    assert!(provider.cache().peek(CurrencyCode::Eur).await.is_none());

    // The user sees a friendly reply, and the next request recovers
    let bot = Bot::with_provider(&AppConfig::default(), provider.clone()).unwrap();
    assert_eq!(
        bot.on_message("Евро [RUB/EUR]").await,
        "cost of 1 EUR = 98.7858 ₽"
    );
}

#[test_log::test(tokio::test)]
async fn test_unavailable_reply_on_malformed_feed() {
    let mock_server = test_utils::create_cbr_mock_server("not json", 1).await;
    let bot = Bot::from_config(&config_for(&mock_server.uri(), 300)).unwrap();

    assert_eq!(
        bot.on_message("Китайский Юань [RUB/CNY]").await,
        "The CNY rate is temporarily unavailable, please try again later"
    );
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server =
        test_utils::create_cbr_mock_server(&test_utils::daily_response(91.7791), 1).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();
    let config_content = format!(
        r#"
providers:
  cbr:
    base_url: {}
cache_ttl_secs: 60
http_timeout_secs: 5
"#,
        mock_server.uri()
    );
    fs::write(config_path, &config_content).expect("Failed to write config file");

    let result = rublebot::run_command(
        rublebot::AppCommand::Ask("Гонконгский доллар [RUB/HKD]".to_string()),
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Main function failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_invalid_phrase_table_fails_at_startup() {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        config_file.path(),
        "phrases:\n  - pattern: \"RUB/GBP\"\n    currency: \"GBP\"\n",
    )
    .expect("Failed to write config file");

    let result = rublebot::run_command(
        rublebot::AppCommand::Ask("RUB/GBP".to_string()),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    let err = result.expect_err("startup should fail");
    assert_eq!(err.root_cause().to_string(), "unknown currency code: GBP");
}

#[test_log::test(tokio::test)]
#[ignore = "talks to the live CBR feed"]
async fn test_real_cbr_api() {
    let provider =
        CbrRateProvider::new("https://www.cbr-xml-daily.ru", Duration::from_secs(10)).unwrap();

    for code in CurrencyCode::ALL {
        info!(%code, "Fetching rate from the CBR feed");
        match provider.get_rate(code).await {
            Ok(rate) => {
                info!(?rate, "Received successful rate response");
                assert!(rate > 0.0, "Currency rate should be positive");
            }
            Err(e) => {
                error!("Currency rate API request failed: {e}\n{e:?}");
                panic!("Currency rate API request failed: {e}");
            }
        }
    }
}
