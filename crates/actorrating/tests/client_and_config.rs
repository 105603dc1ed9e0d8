use actorrating::api::client::{client_id, UNKNOWN_CLIENT};
use actorrating::config::{parse_policy_override, retention_from_hours};
use actorrating::ratelimit::{ActionKind, FailurePolicy};
use axum::http::{HeaderMap, HeaderValue};
use chrono::TimeDelta;

#[test]
fn client_id_prefers_first_forwarded_hop() {
    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
    headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
    assert_eq!(client_id(&headers), "203.0.113.7");
}

#[test]
fn client_id_falls_back_to_real_ip_then_unknown() {
    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", HeaderValue::from_static(""));
    headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
    assert_eq!(client_id(&headers), "198.51.100.2");

    assert_eq!(client_id(&HeaderMap::new()), UNKNOWN_CLIENT);
}

#[test]
fn policy_override_keeps_reference_fail_policy() {
    let p = parse_policy_override(ActionKind::Signup, "3/60000").unwrap();
    assert_eq!(p.max_requests, 3);
    assert_eq!(p.window_ms, 60_000);
    assert_eq!(p.on_store_failure, FailurePolicy::Closed);

    let p = parse_policy_override(ActionKind::Rating, " 25 / 1000 ").unwrap();
    assert_eq!(p.max_requests, 25);
    assert_eq!(p.on_store_failure, FailurePolicy::Open);
}

#[test]
fn malformed_policy_overrides_are_rejected() {
    for raw in ["10", "ten/1000", "10/0", "-1/1000", "10/abc"] {
        assert!(
            parse_policy_override(ActionKind::Signin, raw).is_err(),
            "{raw} should be rejected"
        );
    }
}

#[test]
fn retention_must_be_positive_and_representable() {
    assert_eq!(retention_from_hours(24).unwrap(), TimeDelta::hours(24));
    assert!(retention_from_hours(0).is_err());
    assert!(retention_from_hours(-1).is_err());
    assert!(retention_from_hours(i64::MAX / 1000).is_err());
}
