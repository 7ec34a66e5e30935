use fxcast::core::FxError;
use fxcast::{AppCommand, OutputFormat};
use std::fs;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_rates_mock_server(day: &str, rate: f64) -> MockServer {
        let mock_server = MockServer::start().await;
        mount_day(&mock_server, day, rate).await;
        mock_server
    }

    pub async fn mount_day(mock_server: &MockServer, day: &str, rate: f64) {
        let body = format!(
            r#"{{"success": true, "historical": true, "date": "{day}", "base": "EUR", "rates": {{"COP": {rate}}}}}"#
        );
        Mock::given(method("GET"))
            .and(path(format!("/v1/{day}")))
            .and(query_param("base", "EUR"))
            .and(query_param("symbols", "COP"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(mock_server)
            .await;
    }

    /// Answers every daily request with the same body and checks the request count on drop.
    pub async fn create_any_day_mock_server(status: u16, body: &str, expected: u64) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v1/\d{4}-\d{2}-\d{2}$"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(expected)
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub fn write_config(config_file: &tempfile::NamedTempFile, rates_uri: &str, extra: &str) {
        let config_content = format!(
            r#"
providers:
  exchangerates:
    base_url: {rates_uri}
    access_key: "test-key"
  exchangerate:
    base_url: {rates_uri}
    api_key: "test-key"
history:
  request_delay_ms: 1000
{extra}
"#
        );
        std::fs::write(config_file.path(), config_content).expect("Failed to write config file");
    }
}

fn fx_code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<FxError>()
        .unwrap_or_else(|| panic!("expected a typed failure, got: {err:#}"))
        .code()
}

#[test_log::test(tokio::test)]
async fn test_full_history_flow_with_mock() {
    let mock_server = test_utils::create_rates_mock_server("2024-03-01", 4201.5).await;
    test_utils::mount_day(&mock_server, "2024-03-02", 4210.0).await;
    test_utils::mount_day(&mock_server, "2024-03-03", 4198.25).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri(), "");

    let result = fxcast::run_command(
        AppCommand::History {
            origin: "EUR".to_string(),
            destination: "COP".to_string(),
            start_date: "2024-03-01".to_string(),
            end_date: "2024-03-03".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Json,
    )
    .await;
    assert!(
        result.is_ok(),
        "History command failed with: {:?}",
        result.err()
    );

    let requests = mock_server.received_requests().await.unwrap();
    let paths: Vec<_> = requests.iter().map(|r| r.url.path().to_string()).collect();
    info!(?paths, "Received daily requests");
    assert_eq!(paths, vec!["/v1/2024-03-01", "/v1/2024-03-02", "/v1/2024-03-03"]);
}

#[test_log::test(tokio::test)]
async fn test_history_substitutes_provider_base() {
    let mock_server = test_utils::create_rates_mock_server("2024-03-01", 4201.5).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri(), "");

    let result = fxcast::run_command(
        AppCommand::History {
            origin: "USD".to_string(),
            destination: "COP".to_string(),
            start_date: "2024-03-01".to_string(),
            end_date: "2024-03-01".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Table,
    )
    .await;
    assert!(result.is_ok(), "History command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_history_base_mismatch_rejected_by_policy() {
    let mock_server = test_utils::create_any_day_mock_server(200, "{}", 0).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri(), "  base_policy: reject");

    let err = fxcast::run_command(
        AppCommand::History {
            origin: "USD".to_string(),
            destination: "COP".to_string(),
            start_date: "2024-03-01".to_string(),
            end_date: "2024-03-02".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Table,
    )
    .await
    .unwrap_err();
    assert_eq!(fx_code(&err), "UNSUPPORTED_BASE");
}

#[test_log::test(tokio::test)]
async fn test_history_range_validation_happens_before_requests() {
    let mock_server = test_utils::create_any_day_mock_server(200, "{}", 0).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri(), "");

    for (start, end, expected) in [
        ("2099-01-01", "2099-01-02", "FUTURE_DATE"),
        ("2024-03-10", "2024-03-01", "INVERTED_RANGE"),
        ("2024-03-01", "2024-03-10", "RANGE_TOO_WIDE"),
    ] {
        let err = fxcast::run_command(
            AppCommand::History {
                origin: "EUR".to_string(),
                destination: "COP".to_string(),
                start_date: start.to_string(),
                end_date: end.to_string(),
            },
            Some(config_file.path().to_str().unwrap()),
            OutputFormat::Json,
        )
        .await
        .unwrap_err();
        assert_eq!(fx_code(&err), expected);
    }
}

#[test_log::test(tokio::test)]
async fn test_full_forecast_flow_with_mock() {
    let body = r#"{"success": true, "historical": true, "base": "EUR", "rates": {"USD": 1.0842}}"#;
    let mock_server = test_utils::create_any_day_mock_server(200, body, 5).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri(), "");

    let result = fxcast::run_command(
        AppCommand::Forecast {
            origin: "EUR".to_string(),
            destination: "USD".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Table,
    )
    .await;
    assert!(
        result.is_ok(),
        "Forecast command failed with: {:?}",
        result.err()
    );

    let today = chrono::Utc::now().date_naive();
    let requests = mock_server.received_requests().await.unwrap();
    let last = requests.last().unwrap().url.path().to_string();
    assert_eq!(
        last,
        format!("/v1/{}", today.pred_opt().unwrap().format("%Y-%m-%d"))
    );
}

#[test_log::test(tokio::test)]
async fn test_forecast_stops_on_first_failed_day() {
    let mock_server = test_utils::create_any_day_mock_server(500, "", 1).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri(), "");

    let err = fxcast::run_command(
        AppCommand::Forecast {
            origin: "EUR".to_string(),
            destination: "USD".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Json,
    )
    .await
    .unwrap_err();

    assert_eq!(fx_code(&err), "FETCH_FAILED");
    let fx = err.downcast_ref::<FxError>().unwrap();
    assert_eq!(fx.status_code(), 422);
    assert!(matches!(fx, FxError::Stage { .. }));
}

#[test_log::test(tokio::test)]
async fn test_forecast_with_short_window_has_insufficient_data() {
    let body = r#"{"rates": {"USD": 1.0842}}"#;
    let mock_server = test_utils::create_any_day_mock_server(200, body, 2).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(
        &config_file,
        &mock_server.uri(),
        "forecast:\n  window_days: 2",
    );

    let err = fxcast::run_command(
        AppCommand::Forecast {
            origin: "EUR".to_string(),
            destination: "USD".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Json,
    )
    .await
    .unwrap_err();
    assert_eq!(fx_code(&err), "INSUFFICIENT_DATA");
}

#[test_log::test(tokio::test)]
async fn test_full_convert_flow_with_mock() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v6/test-key/pair/EUR/USD/25.000"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"result": "success", "conversion_rate": 1.0842, "conversion_result": 27.105}"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri(), "");

    let result = fxcast::run_command(
        AppCommand::Convert {
            origin: "eur".to_string(),
            destination: "usd".to_string(),
            amount: 25.0,
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Table,
    )
    .await;
    assert!(
        result.is_ok(),
        "Convert command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_unknown_currency_is_rejected() {
    let mock_server = test_utils::create_any_day_mock_server(200, "{}", 0).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri(), "");

    let err = fxcast::run_command(
        AppCommand::Forecast {
            origin: "EUR".to_string(),
            destination: "JPY".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Table,
    )
    .await
    .unwrap_err();
    assert_eq!(fx_code(&err), "UNKNOWN_CURRENCY");

    let err = fxcast::run_command(
        AppCommand::Destinations {
            origin: "EURO".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Table,
    )
    .await
    .unwrap_err();
    assert_eq!(fx_code(&err), "INVALID_CURRENCY");
}

#[test_log::test(tokio::test)]
async fn test_destinations_flow() {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(config_file.path(), "{}").expect("Failed to write config file");

    let result = fxcast::run_command(
        AppCommand::Destinations {
            origin: "EUR".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Json,
    )
    .await;
    assert!(result.is_ok(), "Destinations failed with: {:?}", result.err());
}
