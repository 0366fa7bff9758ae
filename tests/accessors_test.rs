//! Typed accessor coercion and default fallback

mod common;

use common::{yaml, StubRepository};
use remote_config::value::ValueKind;
use remote_config::{AccessError, Client};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DOCUMENT: &str = r#"
name: billing
port: 8080
ratio: 0.75
whole_float: 3.0
enabled: true
hosts: [alpha, beta]
mixed: [a, b, 3]
empty_list: []
database:
  host: db.internal
  port: 5432
  replicas: [r1, r2]
"#;

async fn client() -> Client {
    Client::builder(StubRepository::new(yaml(DOCUMENT)))
        .parent(CancellationToken::new())
        .refresh_interval(Duration::from_secs(3600))
        .register_default(false)
        .build()
        .await
        .unwrap()
}

fn not_found(key: &str) -> Option<AccessError> {
    Some(AccessError::NotFound { key: key.to_string() })
}

fn mismatch(key: &str, expected: ValueKind, found: ValueKind) -> Option<AccessError> {
    Some(AccessError::TypeMismatch {
        key: key.to_string(),
        expected,
        found,
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Database {
    host: String,
    port: u16,
    replicas: Vec<String>,
}

#[tokio::test]
async fn test_matching_types_are_returned() {
    let client = client().await;

    let name = client.get_config_string("name", "x");
    assert_eq!((name.value.as_str(), name.error), ("billing", None));

    assert_eq!(client.get_config_int("port", 0).into_result(), Ok(8080));
    assert_eq!(client.get_config_float("ratio", 0.0).into_result(), Ok(0.75));
    assert_eq!(client.get_config_bool("enabled", false).into_result(), Ok(true));
    assert_eq!(
        client
            .get_config_array_of_strings("hosts", vec![])
            .into_result(),
        Ok(vec!["alpha".to_string(), "beta".to_string()])
    );
    assert_eq!(
        client
            .get_config_array_of_strings("empty_list", vec!["d".into()])
            .into_result(),
        Ok(vec![])
    );
}

#[tokio::test]
async fn test_absent_keys_return_default_and_not_found() {
    let client = client().await;

    let s = client.get_config_string("missing", "dflt");
    assert_eq!(s.value, "dflt");
    assert_eq!(s.error, not_found("missing"));

    let i = client.get_config_int("missing", 42);
    assert_eq!(i.value, 42);
    assert_eq!(i.error, not_found("missing"));

    let f = client.get_config_float("missing", 1.5);
    assert_eq!(f.value, 1.5);
    assert_eq!(f.error, not_found("missing"));

    let b = client.get_config_bool("missing", true);
    assert!(b.value);
    assert_eq!(b.error, not_found("missing"));

    let list = client.get_config_array_of_strings("missing", vec!["x".into()]);
    assert_eq!(list.value, vec!["x".to_string()]);
    assert_eq!(list.error, not_found("missing"));

    let default_db = Database {
        host: "localhost".into(),
        port: 5432,
        replicas: vec![],
    };
    let db = client.get_config("missing", default_db.clone());
    assert_eq!(db.value, default_db);
    assert_eq!(db.error, not_found("missing"));
}

#[tokio::test]
async fn test_type_mismatch_returns_default_not_zero_value() {
    let client = client().await;

    let i = client.get_config_int("name", 9);
    assert_eq!(i.value, 9);
    assert_eq!(i.error, mismatch("name", ValueKind::Integer, ValueKind::String));

    let s = client.get_config_string("port", "dflt");
    assert_eq!(s.value, "dflt");
    assert_eq!(s.error, mismatch("port", ValueKind::String, ValueKind::Integer));

    let b = client.get_config_bool("name", false);
    assert!(!b.value);
    assert_eq!(b.error, mismatch("name", ValueKind::Bool, ValueKind::String));

    let list = client.get_config_array_of_strings("name", vec!["d".into()]);
    assert_eq!(list.value, vec!["d".to_string()]);
    assert_eq!(
        list.error,
        mismatch("name", ValueKind::StringSequence, ValueKind::String)
    );
}

#[tokio::test]
async fn test_numeric_kinds_are_not_interchangeable() {
    let client = client().await;

    // An integral float is still a float
    let i = client.get_config_int("whole_float", -1);
    assert_eq!(i.value, -1);
    assert_eq!(i.error, mismatch("whole_float", ValueKind::Integer, ValueKind::Float));

    // An integer is not a float, even though it converts losslessly
    let f = client.get_config_float("port", -1.0);
    assert_eq!(f.value, -1.0);
    assert_eq!(f.error, mismatch("port", ValueKind::Float, ValueKind::Integer));
}

#[tokio::test]
async fn test_array_of_strings_is_all_or_nothing() {
    let client = client().await;

    let default = vec!["fallback".to_string()];
    let lookup = client.get_config_array_of_strings("mixed", default.clone());
    assert_eq!(lookup.value, default);
    assert_eq!(
        lookup.error,
        mismatch("mixed", ValueKind::StringSequence, ValueKind::Sequence)
    );
}

#[tokio::test]
async fn test_structured_decode() {
    let client = client().await;

    let db = client
        .get_config(
            "database",
            Database {
                host: String::new(),
                port: 0,
                replicas: vec![],
            },
        )
        .into_result()
        .unwrap();
    assert_eq!(db.host, "db.internal");
    assert_eq!(db.port, 5432);
    assert_eq!(db.replicas, vec!["r1", "r2"]);

    let hosts: Vec<String> = client.get_config("hosts", vec![]).into_value();
    assert_eq!(hosts, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn test_structured_decode_failure_returns_default() {
    let client = client().await;

    let default_db = Database {
        host: "localhost".into(),
        port: 1,
        replicas: vec!["local".into()],
    };
    let lookup = client.get_config("name", default_db.clone());

    assert!(lookup.is_default());
    assert_eq!(lookup.value, default_db);
    assert!(matches!(
        lookup.error,
        Some(AccessError::Decode { ref key, .. }) if key == "name"
    ));
}

#[tokio::test]
async fn test_raw_value_and_lookup_helpers() {
    let client = client().await;

    assert_eq!(client.get_value("port").unwrap().as_i64(), Some(8080));
    assert_eq!(
        client.get_value("nope"),
        Err(AccessError::NotFound { key: "nope".into() })
    );

    let (value, error) = client.get_config_int("nope", 5).into_parts();
    assert_eq!(value, 5);
    assert!(error.is_some());
    assert_eq!(
        error.unwrap().to_string(),
        "config not found: nope"
    );

    let lookup = client.get_config_int("port", 0);
    assert!(!lookup.is_default());
    assert_eq!(*lookup.value(), 8080);
    assert!(lookup.error().is_none());
}
