use aws_mpm_connector::{Connector, ConnectionConfig, GlobalRegion, Region, WorkerPool};
use serde_json::json;
use std::time::Duration;

// nothing listens on port 1, so every call fails in transport
const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:1";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn init_with_basic_credentials() {
    init_logger();
    let pool = WorkerPool::new(1).unwrap();
    let connector = Connector::init(
        &json!({
            "region": "us-east-1",
            "auth": {"accessKeyId": "AKIAEXAMPLE", "secretAccessKey": "secret"}
        }),
        &pool,
    )
    .unwrap();
    connector.close().unwrap();
    pool.shutdown(Duration::from_secs(1));
}

#[test]
fn init_with_global_region_and_session() {
    init_logger();
    let pool = WorkerPool::new(1).unwrap();
    let config = ConnectionConfig::from_value(&json!({
        "region": "aws-global",
        "auth": {"accessKeyId": "ASIAEXAMPLE", "secretAccessKey": "secret", "sessionToken": "token"}
    }))
    .unwrap();
    assert_eq!(&Region::Global(GlobalRegion::Aws), config.region());
    let connector = Connector::with_config(&config, &pool);
    connector.close().unwrap();
}

#[test]
fn init_rejects_incomplete_config() {
    init_logger();
    let pool = WorkerPool::new(1).unwrap();
    let err = Connector::init(
        &json!({"region": "us-east-1", "auth": {"secretAccessKey": "secret"}}),
        &pool,
    )
    .unwrap_err();
    assert!(err
        .message()
        .starts_with("Failed to initialize the marketplace metering client"));
    assert!(err.message().contains("accessKeyId"));
    assert!(err.details().is_empty());
}

#[test]
fn transport_failure_is_reported_and_connector_survives() {
    init_logger();
    let pool = WorkerPool::new(2).unwrap();
    let connector = Connector::init(
        &json!({
            "region": "us-east-1",
            "auth": {"accessKeyId": "AKIAEXAMPLE", "secretAccessKey": "secret"},
            "endpointUrl": UNREACHABLE_ENDPOINT,
            "maxAttempts": 1
        }),
        &pool,
    )
    .unwrap();

    let err = pool
        .block_on(connector.resolve_customer("token-123"))
        .unwrap_err();
    assert!(err
        .message()
        .starts_with("Failed to execute resolve-customer operation"));
    assert!(err.details().is_empty());

    let err = pool
        .block_on(connector.batch_meter_usage(&json!({
            "productCode": "prod-1",
            "usageRecords": [{
                "customerIdentifier": "cust-1",
                "dimension": "seats",
                "timestamp": "2024-05-01T12:00:00Z",
                "quantity": 1
            }]
        })))
        .unwrap_err();
    assert!(err
        .message()
        .starts_with("Failed to execute batch-meter-usage operation"));

    connector.close().unwrap();
    pool.shutdown(Duration::from_secs(1));
}
