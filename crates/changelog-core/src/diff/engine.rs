//! Produces change records for update, insert, and delete events.

use std::collections::HashSet;

use serde_json::Value;

use crate::diff::custom_fields::{CustomField, CustomFieldCache};
use crate::entry::LogData;
use crate::record::ChangeRecord;
use crate::traits::TrackedEntity;
use crate::value::{storage_form, values_differ, Snapshot};

/// Diff the touched attributes of an entity against their pre-change
/// values, then merge the computed-fields diff.
///
/// `touched` carries the old values as reported by the caller's dirty
/// tracking; it is an input, never recomputed here. Comparison is
/// float-safe on both sides; excluded names are dropped after comparison
/// (exact match). The computed-fields sub-diff is never subject to
/// exclusion.
pub fn update_diff(
    entity: &dyn TrackedEntity,
    touched: &Snapshot,
    excluded: &HashSet<String>,
    custom_fields: &[CustomField],
    cache: &CustomFieldCache,
    force_custom: bool,
) -> ChangeRecord {
    let mut diff = ChangeRecord::new();

    for (name, old) in touched {
        let new = entity.attribute(name).unwrap_or(Value::Null);
        if values_differ(old, &new) {
            diff.push(name.clone(), storage_form(old), storage_form(&new));
        }
    }

    diff.exclude(excluded);
    diff.set_custom_fields(custom_fields_diff(entity, custom_fields, cache, force_custom));
    diff
}

/// Diff every computed field against its cached last-observed value.
///
/// An entry is emitted when the values differ, when `force` is set (delete
/// path), or when the individual spec carries the force suffix. Emitted
/// keys always have the suffix stripped; an absent cache entry compares as
/// null, so it diffs against any non-null current value.
pub fn custom_fields_diff(
    entity: &dyn TrackedEntity,
    specs: &[CustomField],
    cache: &CustomFieldCache,
    force: bool,
) -> ChangeRecord {
    let mut sub = ChangeRecord::new();

    for spec in specs {
        let current = spec.resolve(entity);
        let cached = cache.get(spec.key()).cloned().unwrap_or(Value::Null);

        if force || spec.is_forced() || values_differ(&cached, &current) {
            sub.push(spec.key(), cached, current);
        }
    }

    sub
}

/// Capture an entity's state at delete time.
///
/// With `include_data` unset this is the empty-data sentinel — "no data
/// captured", deliberately distinct from an empty diff. Otherwise every
/// non-excluded current attribute is recorded as `[value, null]` and the
/// computed fields are force-merged.
pub fn delete_snapshot(
    entity: &dyn TrackedEntity,
    excluded: &HashSet<String>,
    custom_fields: &[CustomField],
    cache: &CustomFieldCache,
    include_data: bool,
) -> LogData {
    if !include_data {
        return LogData::Empty;
    }

    let mut diff = ChangeRecord::new();
    for (name, value) in entity.attributes() {
        diff.push(name, storage_form(&value), Value::Null);
    }

    diff.exclude(excluded);
    diff.set_custom_fields(custom_fields_diff(entity, custom_fields, cache, true));
    LogData::Diff(diff)
}

/// Eagerly resolve and store every computed field's current value.
///
/// Run once after the entity is loaded, so the first diff compares against
/// a real baseline instead of an absent (null) cache entry that would
/// always read as changed.
pub fn cache_custom_fields(entity: &dyn TrackedEntity, specs: &[CustomField]) -> CustomFieldCache {
    let mut cache = CustomFieldCache::new();
    for spec in specs {
        cache.insert(spec.key(), spec.resolve(entity));
    }
    cache
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{FieldLookup, PathNode};
    use serde_json::json;

    struct Person {
        attrs: Snapshot,
    }

    impl Person {
        fn new(attrs: Value) -> Self {
            match attrs {
                Value::Object(map) => Self { attrs: map },
                _ => panic!("attrs must be an object"),
            }
        }
    }

    impl FieldLookup for Person {
        fn field(&self, name: &str) -> Option<PathNode<'_>> {
            self.attrs.get(name).cloned().map(PathNode::Value)
        }
    }

    impl TrackedEntity for Person {
        fn object_type(&self) -> String {
            "person".to_string()
        }

        fn object_id(&self) -> Option<String> {
            Some("1".to_string())
        }

        fn attributes(&self) -> Snapshot {
            self.attrs.clone()
        }
    }

    fn touched(entries: Value) -> Snapshot {
        match entries {
            Value::Object(map) => map,
            _ => panic!("touched must be an object"),
        }
    }

    fn no_exclusions() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn records_changed_attribute_with_old_and_new() {
        let person = Person::new(json!({"name": "Bob", "age": 31}));
        let diff = update_diff(
            &person,
            &touched(json!({"age": 30})),
            &no_exclusions(),
            &[],
            &CustomFieldCache::new(),
            false,
        );

        assert_eq!(diff.len(), 1);
        assert_eq!(diff.get("age"), Some((&json!(30), &json!(31))));
    }

    #[test]
    fn equal_float_representations_produce_no_entry() {
        let person = Person::new(json!({"price": 1.5}));
        let diff = update_diff(
            &person,
            &touched(json!({"price": "1.50"})),
            &no_exclusions(),
            &[],
            &CustomFieldCache::new(),
            false,
        );
        assert!(diff.is_empty());
    }

    #[test]
    fn floats_are_stored_in_canonical_string_form() {
        let person = Person::new(json!({"price": 2.5}));
        let diff = update_diff(
            &person,
            &touched(json!({"price": 1.5})),
            &no_exclusions(),
            &[],
            &CustomFieldCache::new(),
            false,
        );
        assert_eq!(diff.get("price"), Some((&json!("1.5"), &json!("2.5"))));
    }

    #[test]
    fn excluded_attributes_never_appear_even_when_changed() {
        let person = Person::new(json!({"name": "Bob", "age": 31}));
        let excluded: HashSet<String> = ["age".to_string()].into();
        let diff = update_diff(
            &person,
            &touched(json!({"age": 30, "name": "Alice"})),
            &excluded,
            &[],
            &CustomFieldCache::new(),
            false,
        );

        assert!(!diff.contains("age"));
        assert_eq!(diff.get("name"), Some((&json!("Alice"), &json!("Bob"))));
    }

    #[test]
    fn untouched_attributes_are_not_compared() {
        let person = Person::new(json!({"name": "Bob", "age": 31}));
        let diff = update_diff(
            &person,
            &touched(json!({})),
            &no_exclusions(),
            &[],
            &CustomFieldCache::new(),
            false,
        );
        assert!(diff.is_empty());
    }

    #[test]
    fn touched_attribute_missing_from_entity_diffs_to_null() {
        let person = Person::new(json!({"name": "Bob"}));
        let diff = update_diff(
            &person,
            &touched(json!({"nickname": "Bobby"})),
            &no_exclusions(),
            &[],
            &CustomFieldCache::new(),
            false,
        );
        assert_eq!(diff.get("nickname"), Some((&json!("Bobby"), &Value::Null)));
    }

    #[test]
    fn custom_field_with_empty_cache_diffs_from_null() {
        let person = Person::new(json!({"status": "x"}));
        let sub = custom_fields_diff(
            &person,
            &[CustomField::path("status")],
            &CustomFieldCache::new(),
            false,
        );
        assert_eq!(sub.get("status"), Some((&Value::Null, &json!("x"))));
    }

    #[test]
    fn custom_field_matching_cache_emits_nothing_unless_forced() {
        let person = Person::new(json!({"status": "x"}));
        let mut cache = CustomFieldCache::new();
        cache.insert("status", json!("x"));

        let quiet = custom_fields_diff(&person, &[CustomField::path("status")], &cache, false);
        assert!(quiet.is_empty());

        let forced = custom_fields_diff(&person, &[CustomField::path("status")], &cache, true);
        assert_eq!(forced.get("status"), Some((&json!("x"), &json!("x"))));
    }

    #[test]
    fn force_suffixed_spec_always_emits_with_stripped_key() {
        let person = Person::new(json!({"status": "x"}));
        let mut cache = CustomFieldCache::new();
        cache.insert("status", json!("x"));

        let sub = custom_fields_diff(&person, &[CustomField::path("status!")], &cache, false);
        assert_eq!(sub.get("status"), Some((&json!("x"), &json!("x"))));
        assert!(!sub.contains("status!"));
    }

    #[test]
    fn custom_field_comparison_is_float_safe() {
        let person = Person::new(json!({"balance": 1.5}));
        let mut cache = CustomFieldCache::new();
        cache.insert("balance", json!("1.50"));

        let sub = custom_fields_diff(&person, &[CustomField::path("balance")], &cache, false);
        assert!(sub.is_empty());
    }

    #[test]
    fn function_specs_receive_the_entity() {
        let person = Person::new(json!({"name": "Bob", "age": 31}));
        let spec = CustomField::computed("display", |e: &dyn TrackedEntity| {
            json!(format!(
                "{} ({})",
                e.attribute("name").unwrap_or_default().as_str().unwrap_or(""),
                e.attribute("age").unwrap_or_default()
            ))
        });

        let sub = custom_fields_diff(&person, &[spec], &CustomFieldCache::new(), false);
        assert_eq!(sub.get("display"), Some((&Value::Null, &json!("Bob (31)"))));
    }

    #[test]
    fn delete_without_data_returns_the_sentinel() {
        let person = Person::new(json!({"name": "Bob", "age": 30}));
        let data = delete_snapshot(
            &person,
            &no_exclusions(),
            &[],
            &CustomFieldCache::new(),
            false,
        );
        assert_eq!(data, LogData::Empty);
    }

    #[test]
    fn delete_with_data_snapshots_every_non_excluded_attribute() {
        let person = Person::new(json!({"name": "Bob", "age": 30}));
        let excluded: HashSet<String> = ["age".to_string()].into();
        let data = delete_snapshot(&person, &excluded, &[], &CustomFieldCache::new(), true);

        let LogData::Diff(diff) = data else {
            panic!("expected snapshot diff")
        };
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.get("name"), Some((&json!("Bob"), &Value::Null)));
    }

    #[test]
    fn delete_snapshot_force_merges_custom_fields() {
        let person = Person::new(json!({"status": "x"}));
        let mut cache = CustomFieldCache::new();
        cache.insert("status", json!("x"));

        let data = delete_snapshot(
            &person,
            &no_exclusions(),
            &[CustomField::path("status")],
            &cache,
            true,
        );
        let LogData::Diff(diff) = data else {
            panic!("expected snapshot diff")
        };
        let custom = diff.custom_fields().expect("custom fields present");
        assert_eq!(custom.get("status"), Some((&json!("x"), &json!("x"))));
    }

    #[test]
    fn cache_custom_fields_primes_the_baseline() {
        let person = Person::new(json!({"status": "x"}));
        let cache = cache_custom_fields(&person, &[CustomField::path("status")]);

        // Primed cache: an unchanged value no longer reads as changed.
        let sub = custom_fields_diff(&person, &[CustomField::path("status")], &cache, false);
        assert!(sub.is_empty());
    }

    #[test]
    fn forced_custom_field_scenario_from_nested_path() {
        struct Profile;
        impl FieldLookup for Profile {
            fn field(&self, name: &str) -> Option<PathNode<'_>> {
                (name == "email").then(|| PathNode::Value(json!("a@x.com")))
            }
        }
        struct User {
            profile: Profile,
        }
        impl FieldLookup for User {
            fn field(&self, name: &str) -> Option<PathNode<'_>> {
                (name == "profile").then(|| PathNode::Object(&self.profile as _))
            }
        }
        impl TrackedEntity for User {
            fn object_type(&self) -> String {
                "user".to_string()
            }
            fn object_id(&self) -> Option<String> {
                Some("1".to_string())
            }
            fn attributes(&self) -> Snapshot {
                Snapshot::new()
            }
        }

        let user = User { profile: Profile };
        let sub = custom_fields_diff(
            &user,
            &[CustomField::path("profile.email!")],
            &CustomFieldCache::new(),
            false,
        );
        assert_eq!(
            sub.get("profile.email"),
            Some((&Value::Null, &json!("a@x.com")))
        );
    }
}
