//! Refresh against a mock rule-data service: version check, bundle fetch,
//! validation, caching and promotion.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use takehome::core::{TaxCalculationEngine, TaxCalculationInput, UsState};
use takehome::rules::{
    DataFreshness, DataTier, HttpRemoteSource, ProviderConfig, RefreshError, RefreshOutcome,
    RemoteSource, RuleDataProvider, ValidationError, embedded,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bundle(version: &str) -> serde_json::Value {
    let mut rules = embedded::load().expect("embedded rules");
    rules.version = version.to_string();
    serde_json::to_value(rules).expect("bundle json")
}

async fn mount_version(server: &MockServer, has_update: bool, latest: &str) {
    Mock::given(method("GET"))
        .and(path("/tax-data/2024/version"))
        .and(query_param("current", "2024.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hasUpdate": has_update,
            "latestVersion": latest,
            "isRequired": false,
            "changeLog": null
        })))
        .mount(server)
        .await;
}

fn provider(
    server: &MockServer,
    cache_dir: Option<&TempDir>,
    timeout: Duration,
) -> RuleDataProvider {
    let remote = HttpRemoteSource::new(server.uri(), timeout).expect("remote source");
    let config = ProviderConfig {
        cache_dir: cache_dir.map(|d| d.path().to_path_buf()),
        fetch_timeout: timeout,
        ..ProviderConfig::default()
    };
    RuleDataProvider::new(config, Some(Arc::new(remote) as Arc<dyn RemoteSource>))
        .expect("provider")
}

#[tokio::test]
async fn refresh_promotes_remote_data_and_persists_it() {
    let server = MockServer::start().await;
    mount_version(&server, true, "2024.2").await;

    let mut body = bundle("2024.2");
    // A changed rate makes the new snapshot observable in calculations.
    body["states"]["states"]["PA"]["incomeTax"]["rate"] = serde_json::json!("0.04");
    Mock::given(method("GET"))
        .and(path("/tax-data/2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("tempdir");
    let provider = provider(&server, Some(&dir), Duration::from_secs(5));
    let input = TaxCalculationInput {
        gross_income: dec!(50000),
        state: UsState::Pennsylvania,
        ..TaxCalculationInput::default()
    };
    let before = provider.rules();

    let outcome = provider.refresh().await;
    assert!(matches!(outcome, RefreshOutcome::Updated { ref version } if version == "2024.2"));
    assert_eq!(provider.tier(), DataTier::Remote);
    assert_eq!(provider.freshness(), DataFreshness::Fresh);

    let after = provider.rules();
    let old_tax = TaxCalculationEngine::new(before.as_ref())
        .calculate(&input)
        .expect("old rules")
        .state
        .income_tax;
    let new_tax = TaxCalculationEngine::new(after.as_ref())
        .calculate(&input)
        .expect("new rules")
        .state
        .income_tax;
    assert_eq!(old_tax, dec!(1535));
    assert_eq!(new_tax, dec!(2000));

    assert!(dir.path().join("tax_data_2024.json").exists());
    assert!(dir.path().join("tax_data_2024.meta.json").exists());

    let restarted = RuleDataProvider::new(
        ProviderConfig {
            cache_dir: Some(dir.path().to_path_buf()),
            ..ProviderConfig::default()
        },
        None,
    )
    .expect("restarted provider");
    assert_eq!(restarted.tier(), DataTier::Cached);
    assert_eq!(restarted.version(), "2024.2");
}

#[tokio::test]
async fn empty_jurisdiction_map_leaves_tier_unchanged() {
    let server = MockServer::start().await;
    mount_version(&server, true, "2024.3").await;

    let mut body = bundle("2024.3");
    body["states"]["states"] = serde_json::json!({});
    Mock::given(method("GET"))
        .and(path("/tax-data/2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("tempdir");
    let provider = provider(&server, Some(&dir), Duration::from_secs(5));
    let outcome = provider.refresh().await;

    assert!(matches!(
        outcome,
        RefreshOutcome::Failed(RefreshError::Validation(ValidationError::NoStates))
    ));
    assert_eq!(provider.tier(), DataTier::Embedded);
    assert_eq!(provider.version(), "2024.1");
    assert!(!dir.path().join("tax_data_2024.json").exists());
}

#[tokio::test]
async fn up_to_date_service_is_not_asked_for_the_bundle() {
    let server = MockServer::start().await;
    mount_version(&server, false, "2024.1").await;
    Mock::given(method("GET"))
        .and(path("/tax-data/2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bundle("2024.9")))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider(&server, None, Duration::from_secs(5));
    assert!(matches!(provider.refresh().await, RefreshOutcome::UpToDate));
    assert_eq!(provider.tier(), DataTier::Embedded);
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    mount_version(&server, true, "2024.2").await;
    Mock::given(method("GET"))
        .and(path("/tax-data/2024"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(bundle("2024.2"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let provider = provider(&server, None, Duration::from_millis(200));
    let outcome = provider.refresh().await;
    assert!(matches!(
        outcome,
        RefreshOutcome::Failed(RefreshError::Timeout(_) | RefreshError::Network(_))
    ));
    assert_eq!(provider.tier(), DataTier::Embedded);
    assert!(matches!(provider.freshness(), DataFreshness::Stale { .. }));
}

#[tokio::test]
async fn server_error_is_only_a_freshness_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let provider = Arc::new(provider(&server, None, Duration::from_secs(5)));
    let outcome = provider.spawn_refresh().await.expect("join");
    assert!(matches!(outcome, RefreshOutcome::Failed(RefreshError::Network(_))));
    assert_eq!(provider.tier(), DataTier::Embedded);

    let rules = provider.rules();
    let result = TaxCalculationEngine::new(rules.as_ref())
        .calculate(&TaxCalculationInput {
            gross_income: dec!(100000),
            state: UsState::Texas,
            ..TaxCalculationInput::default()
        })
        .expect("embedded floor still answers");
    assert!(result.net > dec!(0));
}
