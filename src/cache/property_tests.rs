//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the engine against a plain `HashMap` model and the
//! error envelope against its wire contract.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::cache::{sentinel_linear_search, Cache, Dict, List, Value};
use crate::error::CacheError;

// == Strategies ==
/// Generates cache keys (non-empty by caller contract)
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,16}"
}

/// Generates list elements and dictionary entries
fn element_strategy() -> impl Strategy<Value = String> {
    "[a-z]{0,4}"
}

fn list_strategy() -> impl Strategy<Value = List> {
    prop::collection::vec(element_strategy(), 0..12)
}

fn dict_strategy() -> impl Strategy<Value = Dict> {
    prop::collection::hash_map(element_strategy(), element_strategy(), 0..8)
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,32}".prop_map(Value::String),
        any::<i64>().prop_map(Value::Int),
        list_strategy().prop_map(Value::List),
        dict_strategy().prop_map(Value::Dict),
    ]
}

/// A sequence of mutations applied to both the cache and the model
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Value },
    Remove { key: String },
    Append { key: String, element: String },
    RemoveFromList { key: String, element: String },
    RemoveFromDict { key: String, dict_key: String },
    Increment { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // A small key space so operations collide
    let key = "[abc]";
    prop_oneof![
        (key, value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Remove { key }),
        (key, element_strategy()).prop_map(|(key, element)| CacheOp::Append { key, element }),
        (key, element_strategy())
            .prop_map(|(key, element)| CacheOp::RemoveFromList { key, element }),
        (key, element_strategy())
            .prop_map(|(key, dict_key)| CacheOp::RemoveFromDict { key, dict_key }),
        key.prop_map(|key| CacheOp::Increment { key }),
    ]
}

/// Applies `op` to the model, returning whether it should succeed.
fn apply_to_model(model: &mut HashMap<String, Value>, op: &CacheOp) -> bool {
    match op {
        CacheOp::Set { key, value } => {
            model.insert(key.clone(), value.clone());
            true
        }
        CacheOp::Remove { key } => {
            model.remove(key);
            true
        }
        CacheOp::Append { key, element } => match model.get_mut(key) {
            Some(Value::List(list)) => {
                list.push(element.clone());
                true
            }
            _ => false,
        },
        CacheOp::RemoveFromList { key, element } => match model.get_mut(key) {
            Some(Value::List(list)) => {
                if let Some(i) = list.iter().position(|e| e == element) {
                    list.remove(i);
                }
                true
            }
            _ => false,
        },
        CacheOp::RemoveFromDict { key, dict_key } => match model.get_mut(key) {
            Some(Value::Dict(dict)) => {
                dict.remove(dict_key);
                true
            }
            _ => false,
        },
        CacheOp::Increment { key } => match model.get_mut(key) {
            Some(Value::Int(n)) => {
                *n = n.wrapping_add(1);
                true
            }
            _ => false,
        },
    }
}

fn apply_to_cache(cache: &Cache, op: &CacheOp) -> bool {
    match op {
        CacheOp::Set { key, value } => {
            cache.set(key.clone(), value.clone());
            true
        }
        CacheOp::Remove { key } => {
            cache.remove(key);
            true
        }
        CacheOp::Append { key, element } => cache.append_to_list(key, element.clone()).is_ok(),
        CacheOp::RemoveFromList { key, element } => cache.remove_from_list(key, element).is_ok(),
        CacheOp::RemoveFromDict { key, dict_key } => {
            cache.remove_from_dict(key, dict_key).is_ok()
        }
        CacheOp::Increment { key } => cache.increment(key).is_ok(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing any value and reading it back yields a structurally equal value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let cache = Cache::new();
        cache.set(key.clone(), value.clone());
        prop_assert_eq!(cache.get(&key).unwrap(), value);
    }

    // Keys never written are reported as not found.
    #[test]
    fn prop_unknown_key_not_found(written in key_strategy(), probe in key_strategy()) {
        prop_assume!(written != probe);
        let cache = Cache::new();
        cache.set_int(written, 1);
        prop_assert_eq!(cache.get(&probe), Err(CacheError::KeyNotFound(probe.clone())));
    }

    // The engine behaves like a map under any sequence of mutations,
    // including failed ones which must leave state untouched.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache = Cache::new();
        let mut model: HashMap<String, Value> = HashMap::new();

        for op in &ops {
            let expected_ok = apply_to_model(&mut model, op);
            let actual_ok = apply_to_cache(&cache, op);
            prop_assert_eq!(actual_ok, expected_ok, "outcome mismatch for {:?}", op);
        }

        prop_assert_eq!(cache.len(), model.len());
        for (key, value) in &model {
            prop_assert_eq!(&cache.get(key).unwrap(), value);
        }
    }

    // removeFromList reports the first matching index and removes only it.
    #[test]
    fn prop_remove_from_list_first_match(items in list_strategy(), target in element_strategy()) {
        let cache = Cache::new();
        cache.set_list("l", items.clone());

        let expected = items.iter().position(|e| *e == target);
        prop_assert_eq!(cache.remove_from_list("l", &target).unwrap(), expected);

        let mut remaining = items.clone();
        if let Some(i) = expected {
            remaining.remove(i);
        }
        prop_assert_eq!(cache.get("l").unwrap(), Value::List(remaining));
    }

    // The sentinel search agrees with an ordinary scan and restores the slice.
    #[test]
    fn prop_sentinel_search_matches_position(mut items in list_strategy(), target in element_strategy()) {
        let before = items.clone();
        let found = sentinel_linear_search(&mut items, &target);
        prop_assert_eq!(found, before.iter().position(|e| *e == target));
        prop_assert_eq!(items, before);
    }

    // Index reads succeed exactly inside 0..len.
    #[test]
    fn prop_list_index_bounds(items in list_strategy(), index in -5i64..20) {
        let cache = Cache::new();
        cache.set_list("l", items.clone());

        let result = cache.get_list_element("l", index);
        if index >= 0 && (index as usize) < items.len() {
            prop_assert_eq!(result.unwrap(), items[index as usize].clone());
        } else {
            prop_assert_eq!(result, Err(CacheError::IndexOutOfBounds { index, len: items.len() }));
        }
    }

    // update* returns exactly the previous value of the same shape.
    #[test]
    fn prop_update_returns_previous(old in list_strategy(), new in list_strategy()) {
        let cache = Cache::new();
        cache.set_list("l", old.clone());
        prop_assert_eq!(cache.update_list("l", new.clone()).unwrap(), old);
        prop_assert_eq!(cache.get("l").unwrap(), Value::List(new));
    }
}

// == Property Test for Error Response Format ==
// This tests the CacheError -> HTTP response conversion

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Every error leaves the API as JSON carrying its numeric code and message.
    #[test]
    fn prop_error_response_format(
        detail in "[a-zA-Z0-9 _-]{1,100}",
        index in any::<i64>(),
        ttl in i64::MIN..0,
    ) {
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            CacheError::KeyNotFound(detail.clone()),
            CacheError::DictKeyNotFound(detail.clone()),
            CacheError::WrongType {
                key: detail.clone(),
                expected: crate::cache::ValueKind::List,
                found: crate::cache::ValueKind::Int,
            },
            CacheError::IndexOutOfBounds { index, len: 3 },
            CacheError::InvalidTtl(ttl),
            CacheError::BadRequest(detail.clone()),
        ];

        let rt = tokio::runtime::Runtime::new().unwrap();
        for error in error_variants {
            let expected_code = error.code();
            let expected_msg = error.to_string();
            let expected_status = error.status();
            let response = error.into_response();

            prop_assert_eq!(response.status(), expected_status);
            let content_type = response.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let bytes = rt.block_on(async {
                to_bytes(response.into_body(), usize::MAX).await.unwrap()
            });
            let json: serde_json::Value = serde_json::from_slice(&bytes)
                .expect("Response body should be valid JSON");

            prop_assert_eq!(json["error_code"].as_u64(), Some(expected_code as u64));
            prop_assert_eq!(json["error_message"].as_str(), Some(expected_msg.as_str()));
        }
    }
}
