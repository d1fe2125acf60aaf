// Property tests for query key canonicalization

use pawhub_sync::api::pets;
use pawhub_sync::models::{PetFilters, PetSearchParams};
use pawhub_sync::query::QueryKey;
use pawhub_sync::transport::Request;
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn params_strategy() -> impl Strategy<Value = PetSearchParams> {
    (
        prop::option::of("[a-z]{1,8}"),
        prop::option::of("[A-Za-z ]{1,10}"),
        prop::option::of(0_u64..100_000),
        prop::option::of(any::<bool>()),
        prop::option::of(1_u32..50),
        prop::option::of(prop::sample::select(vec!["price", "-price", "-created_at"])),
    )
        .prop_map(|(search, breed, max_price, is_featured, page, ordering)| PetSearchParams {
            filters: PetFilters {
                search,
                breed,
                max_price,
                is_featured,
                ..PetFilters::default()
            },
            page,
            ordering: ordering.map(str::to_string),
            ..PetSearchParams::default()
        })
}

/// The same parameters as a JSON object, built back to front and without
/// unset members.
fn reversed_object(params: &PetSearchParams) -> Value {
    let Value::Object(map) = serde_json::to_value(params).expect("params serialize") else {
        unreachable!("params serialize to an object");
    };
    let mut reversed = Map::new();
    for (key, value) in map.into_iter().rev().filter(|(_, v)| !v.is_null()) {
        reversed.insert(key, value);
    }
    Value::Object(reversed)
}

proptest! {
    #[test]
    fn prop_key_ignores_field_order_and_nulls(params in params_strategy()) {
        let from_struct = QueryKey::derive("getPets", &params).expect("key");
        let from_object = QueryKey::derive("getPets", &reversed_object(&params)).expect("key");
        prop_assert_eq!(from_struct, from_object);
    }

    #[test]
    fn prop_request_key_ignores_param_order(params in params_strategy()) {
        let forward = Request::get("/pets").params(params.to_params());
        let backward = Request::get("/pets").params(params.to_params().into_iter().rev());
        prop_assert_eq!(QueryKey::from_request(&forward), QueryKey::from_request(&backward));
        prop_assert_eq!(pets::list(&params).key(), QueryKey::from_request(&forward));
    }

    #[test]
    fn prop_different_pages_have_different_keys(page in 1_u32..1000) {
        let a = PetSearchParams { page: Some(page), ..PetSearchParams::default() };
        let b = PetSearchParams { page: Some(page + 1), ..PetSearchParams::default() };
        prop_assert_ne!(pets::list(&a).key(), pets::list(&b).key());
    }
}

#[test]
fn test_nested_objects_are_canonical() {
    let a = json!({ "filters": { "breed": "Poodle", "gender": null, "page": 1 }, "sort": "name" });
    let b = json!({ "sort": "name", "filters": { "page": 1, "breed": "Poodle" } });
    assert_eq!(
        QueryKey::derive("getPets", &a).expect("key"),
        QueryKey::derive("getPets", &b).expect("key")
    );
}

#[test]
fn test_empty_params_collapse_to_endpoint() {
    let key = QueryKey::derive("getCategories", &json!({ "search": null })).expect("key");
    assert_eq!(key.as_str(), "getCategories");
}
