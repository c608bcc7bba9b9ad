//! Action registry: state machine, version clock, fuzzy suppression, concurrency.

mod common;

use serde_json::Value;
use std::sync::Arc;
use twin_advisor::config::SuggestionsConfig;
use twin_advisor::suggestions::SuggestionGenerator;
use twin_advisor::{ActionRegistry, SuggestionPayload, ValidationError};

fn payload(id: &str, key: &str, savings: f64) -> SuggestionPayload {
    SuggestionPayload {
        id: id.to_string(),
        kind: "hvac_schedule".to_string(),
        description: "Night setback".to_string(),
        estimated_savings_kwh: savings,
        dedupe_key: Some(key.to_string()),
        ..SuggestionPayload::default()
    }
}

#[test]
fn apply_dismiss_apply_ends_applied_with_three_bumps() {
    let reg = ActionRegistry::new();
    let base = reg.get_version("b1");
    let p = payload("s1", "k1", 10.0);

    reg.apply("b1", &p).unwrap();
    assert!(reg.is_applied("b1", "s1") && !reg.is_dismissed("b1", "s1"));
    reg.dismiss("b1", "s1", Some(&p)).unwrap();
    assert!(!reg.is_applied("b1", "s1") && reg.is_dismissed("b1", "s1"));
    reg.apply("b1", &p).unwrap();

    assert!(reg.is_applied("b1", "s1"));
    assert!(!reg.is_dismissed("b1", "s1"));
    assert!(reg.dismissed_keys("b1").is_empty());
    assert_eq!(reg.get_version("b1"), base + 3);
}

#[test]
fn validation_errors_leave_state_untouched() {
    let reg = ActionRegistry::new();
    assert_eq!(reg.apply("b1", &payload("", "k", 1.0)), Err(ValidationError::MissingSuggestionId));
    assert_eq!(reg.apply("", &payload("s1", "k", 1.0)), Err(ValidationError::MissingBuildingId));
    assert_eq!(reg.dismiss("b1", "", None), Err(ValidationError::MissingSuggestionId));
    assert_eq!(reg.dismiss("", "s1", None), Err(ValidationError::MissingBuildingId));
    assert_eq!(reg.get_version("b1"), 0);
    assert!(reg.get_applied("b1").is_empty());
}

#[test]
fn unseen_building_reads_empty() {
    let reg = ActionRegistry::new();
    assert!(reg.get_applied("nowhere").is_empty());
    assert_eq!(reg.get_version("nowhere"), 0);
    assert!(!reg.should_suppress("nowhere", &payload("s1", "k1", 1.0)));
    assert!(reg.dismissed_ids("nowhere").is_empty());
}

#[test]
fn dismiss_with_payload_suppresses_sibling() {
    let reg = ActionRegistry::new();
    let a = payload("hvac_schedule:b1:aaaa", "K", 10.0);
    let b = payload("hvac_schedule:b1:bbbb", "K", 10.4);
    reg.dismiss("b1", &a.id, Some(&a)).unwrap();
    assert!(reg.should_suppress("b1", &a));
    assert!(reg.should_suppress("b1", &b));
    assert!(!reg.should_suppress("b1", &payload("other", "K2", 3.0)));
}

#[test]
fn dismiss_without_payload_only_suppresses_id() {
    let reg = ActionRegistry::new();
    let a = payload("a", "K", 10.0);
    let b = payload("b", "K", 10.0);
    reg.dismiss("b1", "a", None).unwrap();
    assert!(reg.should_suppress("b1", &a));
    assert!(!reg.should_suppress("b1", &b));
}

#[test]
fn applied_dedupe_key_suppresses_sibling() {
    let reg = ActionRegistry::new();
    reg.apply("b1", &payload("a", "K", 10.0)).unwrap();
    assert!(reg.should_suppress("b1", &payload("b", "K", 11.0)));
    assert_eq!(reg.get_version("b1"), 1);
}

#[test]
fn apply_clears_dismissed_key() {
    let reg = ActionRegistry::new();
    let a = payload("a", "K", 10.0);
    reg.dismiss("b1", "a", Some(&a)).unwrap();
    reg.apply("b1", &payload("b", "K", 12.0)).unwrap();
    assert!(reg.dismissed_keys("b1").is_empty());
    assert_eq!(reg.dismissed_ids("b1"), vec!["a".to_string()]);
    assert!(reg.should_suppress("b1", &payload("c", "K", 9.0)));
}

#[test]
fn reapply_overwrites_without_duplicating() {
    let reg = ActionRegistry::new();
    let first = reg.apply("b1", &payload("s1", "k1", 10.0)).unwrap();
    let second = reg.apply("b1", &payload("s1", "k1", 12.0)).unwrap();
    let applied = reg.get_applied("b1");
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].estimated_savings_kwh, 12.0);
    assert!(second.applied_at >= first.applied_at);
    assert_eq!(reg.get_version("b1"), 2);
}

#[test]
fn missing_params_and_identity_are_derived() {
    let reg = ActionRegistry::new();
    let p = SuggestionPayload {
        id: "setpoint_change:b1:x".into(),
        kind: "setpoint_change".into(),
        description: "Raise setpoint to 24.5°C overnight".into(),
        ..SuggestionPayload::default()
    };
    let action = reg.apply("b1", &p).unwrap();
    assert_eq!(action.params["setpoint_c_target"], Value::from(24.5));
    assert_eq!(action.dedupe_key.len(), 12);
    assert_eq!(action.signature.len(), 12);
    assert_ne!(action.dedupe_key, action.signature);

    // Same type and inferred params, different wording: same derived key.
    let sibling = SuggestionPayload {
        id: "setpoint_change:b1:y".into(),
        description: "Consider 24.5 C".into(),
        ..p.clone()
    };
    assert!(reg.should_suppress("b1", &sibling));
}

#[test]
fn generated_suggestion_roundtrips_through_registry() {
    let generator = SuggestionGenerator::new(SuggestionsConfig::default());
    let first = generator.generate("b1", &[]);
    let reg = ActionRegistry::new();
    let picked = SuggestionPayload::from(&first[0]);
    let action = reg.apply("b1", &picked).unwrap();
    assert_eq!(action.dedupe_key, first[0].dedupe_key);
    assert_eq!(action.signature, first[0].signature);
    assert_eq!(action.params, first[0].params);

    let again = generator.generate("b1", &[]);
    let shown: Vec<_> = again
        .iter()
        .filter(|s| !reg.should_suppress("b1", &SuggestionPayload::from(*s)))
        .collect();
    assert_eq!(shown.len(), 1);
    assert_ne!(shown[0].id, first[0].id);
}

#[test]
fn buildings_are_isolated() {
    let reg = ActionRegistry::new();
    reg.apply("b1", &payload("s1", "k1", 1.0)).unwrap();
    assert_eq!(reg.get_version("b2"), 0);
    assert!(!reg.should_suppress("b2", &payload("s1", "k1", 1.0)));
}

#[test]
fn concurrent_mutations_never_lose_a_bump() {
    let reg = Arc::new(ActionRegistry::new());
    let threads: Vec<_> = (0..8)
        .map(|t| {
            let reg = reg.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    let p = payload(&format!("s-{t}-{i}"), &format!("k-{t}-{i}"), 1.0);
                    reg.apply("shared", &p).unwrap();
                    if i % 5 == 0 {
                        reg.dismiss("shared", &p.id, Some(&p)).unwrap();
                    }
                    reg.apply(&format!("own-{t}"), &p).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    // 400 applies + 80 dismisses
    assert_eq!(reg.get_version("shared"), 480);
    assert_eq!(reg.get_applied("shared").len(), 320);
    assert_eq!(reg.dismissed_ids("shared").len(), 80);
    for t in 0..8 {
        assert_eq!(reg.get_version(&format!("own-{t}")), 50);
    }
}
