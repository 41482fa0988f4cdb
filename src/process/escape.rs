use ::log::debug;
use ::std::collections::HashMap;

use super::walk::Traverse;
use crate::object::key;
use crate::object::key::KEY_STASH_ESCAPE;
use crate::object::map::Map;
use crate::object::Value;

/// Whether downstream resolvers must treat the object as opaque user
/// data. Only the base marker key counts; an object carrying nothing
/// but underscore-extended markers is not escaped.
pub fn is_escaped(value: &Value) -> bool {
    value
        .as_map()
        .map_or(false, |map| map.contains_key(KEY_STASH_ESCAPE))
}

/// Marks the value when it is a plain data object owning at least one
/// reserved key name, and returns the same reference. Anything else
/// passes through untouched. Repeated calls on one object stack marker
/// layers; callers wanting one marker per object go through
/// [`ObjectEscaper`].
pub fn escape(value: &Value) -> &Value {
    if let Some(map) = value.as_map() {
        if map.keys().iter().any(|map_key| key::is_reserved(map_key)) {
            escape_map(map);
        }
    }
    value
}

/// Removes one marker layer from the value, if it is a plain data
/// object carrying the base marker key, and returns the same
/// reference. Safe on values that were never escaped.
pub fn unescape(value: &Value) -> &Value {
    if let Some(map) = value.as_map() {
        unescape_map(map);
    }
    value
}

/// The first marker key name, counting up from the base form, that the
/// map does not already own. Never overwrites an existing property.
fn next_escape_key(map: &Map) -> String {
    let mut escape_key = String::from(KEY_STASH_ESCAPE);
    while map.contains_key(&escape_key) {
        escape_key.insert(0, '_');
    }
    if escape_key.len() > KEY_STASH_ESCAPE.len() {
        debug!("Escape: base marker key taken, allocated {}", escape_key);
    }
    escape_key
}

fn escape_map(map: &Map) {
    map.insert(next_escape_key(map), true);
}

fn unescape_map(map: &Map) {
    if !map.contains_key(KEY_STASH_ESCAPE) {
        return;
    }
    let mut escape_key = String::from(KEY_STASH_ESCAPE);
    while map.contains_key(&escape_key) {
        escape_key.insert(0, '_');
    }
    // The loop stopped at the first name the map does not own; the
    // marker to drop sits one underscore short of it.
    map.remove(&escape_key[1..]);
}

/// Tracks which objects were marked over one serialize-then-restore
/// pass. The cache keys on object identity and holds a handle to each
/// tracked object, keeping its storage (and thereby its address)
/// alive until the session unescapes it.
#[derive(Debug, Default)]
pub struct ObjectEscaper {
    cache: HashMap<usize, Map>,
}

impl ObjectEscaper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session-scoped escape: marks the object at most once, no matter
    /// how many times the same reference comes through. Non-objects
    /// and objects without reserved key names pass through untracked.
    pub fn escape<'value>(&mut self, value: &'value Value) -> &'value Value {
        if let Some(map) = value.as_map() {
            if map.keys().iter().any(|map_key| key::is_reserved(map_key)) {
                let addr = map.addr();
                if !self.cache.contains_key(&addr) {
                    debug!("ObjectEscaper: tracking object at {:#x}", addr);
                    self.cache.insert(addr, map.clone());
                    escape_map(map);
                }
            }
        }
        value
    }

    /// Walks everything reachable from the root and adopts every
    /// escaped object into the cache, including objects that arrived
    /// already marked. Returns whether this walk found any.
    pub fn find_escapes(&mut self, root: &Value) -> bool {
        let mut found = false;
        Traverse::breadth_first().for_each(root, |value| {
            if let Some(map) = value.as_map() {
                if map.contains_key(KEY_STASH_ESCAPE) {
                    self.cache.insert(map.addr(), map.clone());
                    found = true;
                }
            }
        });
        found
    }

    /// Removes one marker layer from every tracked object and empties
    /// the cache, leaving the session ready for another pass.
    pub fn unescape_all(&mut self) {
        debug!(
            "ObjectEscaper: unescaping {} tracked object(s)",
            self.cache.len()
        );
        for map in self.cache.values() {
            unescape_map(map);
        }
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use ::serde_json::json;

    use super::*;
    use crate::assert_json_eq;
    use crate::object::array::Array;

    #[test]
    fn escape_leaves_safe_objects_alone() {
        let value = Value::from(json!({"a": 1, "b": "two"}));
        escape(&value);
        assert!(!is_escaped(&value));
        assert_json_eq!(value, json!({"a": 1, "b": "two"}));
    }

    #[test]
    fn escape_marks_reserved_keys() {
        let value = Value::from(json!({"a": 1, "_stashRef": "x"}));
        escape(&value);
        assert!(is_escaped(&value));
        assert_json_eq!(value, json!({"a": 1, "_stashRef": "x", "_stashEscape": true}));

        unescape(&value);
        assert!(!is_escaped(&value));
        assert_json_eq!(value, json!({"a": 1, "_stashRef": "x"}));
    }

    #[test]
    fn escape_each_reserved_key_name() {
        for reserved in ["_stashRef", "_stashType", "_stashEscape"] {
            let map = Map::from_iter([(reserved, 1)]);
            let value = Value::from(map);
            escape(&value);
            assert!(is_escaped(&value));
        }
    }

    #[test]
    fn escape_skips_occupied_marker_keys() {
        let value = Value::from(json!({"_stashEscape": false, "_stashRef": "x"}));
        escape(&value);
        assert_json_eq!(
            value,
            json!({"_stashEscape": false, "_stashRef": "x", "__stashEscape": true})
        );

        unescape(&value);
        assert_json_eq!(value, json!({"_stashEscape": false, "_stashRef": "x"}));
    }

    #[test]
    fn escape_marker_is_true() {
        let value = Value::from(json!({"_stashType": "Date"}));
        escape(&value);
        let map = value.as_map().cloned().unwrap_or_default();
        assert_eq!(map.get("_stashEscape"), Some(Value::Bool(true)));
    }

    #[test]
    fn escape_passes_non_objects_through() {
        for value in [
            Value::Null,
            Value::Bool(true),
            Value::Int(3),
            Value::from("_stashRef"),
            Value::from(Array::from_iter(["_stashRef"])),
        ] {
            assert_eq!(escape(&value), &value);
            assert!(!is_escaped(&value));
            assert_eq!(unescape(&value), &value);
        }
    }

    #[test]
    fn escape_looks_at_one_object_only() {
        // Escaping is per object; nested objects are the session's job
        // to feed through one at a time.
        let value = Value::from(json!({"outer": {"_stashRef": "x"}}));
        escape(&value);
        assert!(!is_escaped(&value));
        assert_json_eq!(value, json!({"outer": {"_stashRef": "x"}}));
    }

    #[test]
    fn marker_allocation_counts_underscores() {
        let map = Map::from_iter([("_stashEscape", 1), ("__stashEscape", 2)]);
        assert_eq!(next_escape_key(&map), "___stashEscape");
        assert_eq!(next_escape_key(&Map::new()), "_stashEscape");
    }

    #[test]
    fn is_escaped_tests_presence_not_truth() {
        let value = Value::from(json!({"_stashEscape": false}));
        assert!(is_escaped(&value));
    }

    #[test]
    fn is_escaped_requires_base_marker() {
        let value = Value::from(json!({"__stashEscape": true}));
        assert!(!is_escaped(&value));
    }

    #[test]
    fn unescape_without_base_marker_is_noop() {
        let value = Value::from(json!({"__stashEscape": true}));
        unescape(&value);
        assert_json_eq!(value, json!({"__stashEscape": true}));
    }

    #[test]
    fn unescape_strips_markers_last_in_first_out() {
        let value = Value::from(json!({"_stashRef": "x"}));
        escape(&value);
        escape(&value);
        assert_json_eq!(
            value,
            json!({"_stashRef": "x", "_stashEscape": true, "__stashEscape": true})
        );

        unescape(&value);
        assert_json_eq!(value, json!({"_stashRef": "x", "_stashEscape": true}));
        unescape(&value);
        assert_json_eq!(value, json!({"_stashRef": "x"}));
    }

    #[test]
    fn unescape_stops_at_gap_in_marker_run() {
        let value = Value::from(json!({"_stashEscape": true, "___stashEscape": true}));
        unescape(&value);
        // The run of owned names ends at the missing "__stashEscape",
        // so the base marker is the one removed.
        assert_json_eq!(value, json!({"___stashEscape": true}));
    }

    #[test]
    fn unescape_keeps_later_mutations() {
        let value = Value::from(json!({"_stashRef": "x"}));
        escape(&value);
        let map = value.as_map().cloned().unwrap_or_default();
        map.insert("added", 2);
        map.remove("_stashRef");
        unescape(&value);
        assert_json_eq!(value, json!({"added": 2}));
    }

    #[test]
    fn session_escapes_once_per_reference() {
        let mut escaper = ObjectEscaper::new();
        let value = Value::from(json!({"_stashRef": "x"}));
        escaper.escape(&value);
        escaper.escape(&value);
        escaper.escape(&value);
        assert_json_eq!(value, json!({"_stashRef": "x", "_stashEscape": true}));
        assert_eq!(escaper.cache.len(), 1);
    }

    #[test]
    fn session_ignores_safe_values() {
        let mut escaper = ObjectEscaper::new();
        let plain = Value::from(json!({"a": 1}));
        let number = Value::Int(3);
        escaper.escape(&plain);
        escaper.escape(&number);
        assert!(escaper.cache.is_empty());
        assert_json_eq!(plain, json!({"a": 1}));
    }

    #[test]
    fn session_round_trip() {
        let mut escaper = ObjectEscaper::new();
        let value = Value::from(json!({"a": 1, "_stashType": "Thing"}));
        escaper.escape(&value);
        assert!(is_escaped(&value));

        escaper.unescape_all();
        assert!(!is_escaped(&value));
        assert_json_eq!(value, json!({"a": 1, "_stashType": "Thing"}));
        assert!(escaper.cache.is_empty());
    }

    #[test]
    fn find_escapes_reaches_deep_markers() {
        let marked = Map::from_iter([("_stashRef", "x"), ("_stashEscape", "true")]);
        let value = Value::from(json!({"level1": {"level2": []}}));
        let level1 = value
            .as_map()
            .and_then(|map| map.get("level1"))
            .unwrap_or_default();
        let level2 = level1
            .as_map()
            .and_then(|map| map.get("level2"))
            .unwrap_or_default();
        if let Some(array) = level2.as_array() {
            array.push(marked.clone());
        }

        let mut escaper = ObjectEscaper::new();
        assert!(escaper.find_escapes(&value));
        assert_eq!(escaper.cache.len(), 1);

        escaper.unescape_all();
        assert!(!marked.contains_key("_stashEscape"));
        assert!(marked.contains_key("_stashRef"));
    }

    #[test]
    fn find_escapes_reports_clean_trees() {
        let mut escaper = ObjectEscaper::new();
        let value = Value::from(json!({"a": [1, {"b": 2}]}));
        assert!(!escaper.find_escapes(&value));
        assert!(escaper.cache.is_empty());
    }

    #[test]
    fn find_escapes_terminates_on_cycles() {
        let root = Map::new();
        root.insert("_stashRef", "x");
        root.insert("this", root.clone());
        escape(&Value::from(root.clone()));

        let mut escaper = ObjectEscaper::new();
        assert!(escaper.find_escapes(&Value::from(root.clone())));
        escaper.unescape_all();
        assert!(!root.contains_key("_stashEscape"));

        // Break the cycle so the storage can be reclaimed.
        root.clear();
    }

    #[test]
    fn find_escapes_result_is_per_call() {
        let mut escaper = ObjectEscaper::new();
        let marked = Value::from(json!({"_stashRef": "x"}));
        escaper.escape(&marked);
        assert!(escaper.find_escapes(&marked));

        let clean = Value::from(json!({"a": 1}));
        assert!(!escaper.find_escapes(&clean));
        // The earlier discovery is still tracked.
        assert_eq!(escaper.cache.len(), 1);
    }

    #[test]
    fn session_reusable_after_unescape_all() {
        let mut escaper = ObjectEscaper::new();
        let value = Value::from(json!({"_stashRef": "x"}));
        escaper.escape(&value);
        escaper.unescape_all();

        escaper.escape(&value);
        assert!(is_escaped(&value));
        assert_eq!(escaper.cache.len(), 1);
        escaper.unescape_all();
        assert_json_eq!(value, json!({"_stashRef": "x"}));
    }

    #[test]
    fn unescape_all_survives_manual_marker_removal() {
        let mut escaper = ObjectEscaper::new();
        let value = Value::from(json!({"_stashRef": "x"}));
        escaper.escape(&value);
        if let Some(map) = value.as_map() {
            map.remove("_stashEscape");
        }
        escaper.unescape_all();
        assert_json_eq!(value, json!({"_stashRef": "x"}));
    }

    #[test]
    fn escaped_objects_survive_serialization_boundary() {
        // An escaped tree exported to JSON and ingested back still
        // identifies its markers through a fresh session.
        let value = Value::from(json!({"user": {"_stashType": "custom", "n": 1}}));
        let mut escaper = ObjectEscaper::new();
        let user = value
            .as_map()
            .and_then(|map| map.get("user"))
            .unwrap_or_default();
        escaper.escape(&user);

        let exported = ::serde_json::Value::try_from(&value).unwrap_or_default();
        let restored = Value::from(exported);

        let mut restorer = ObjectEscaper::new();
        assert!(restorer.find_escapes(&restored));
        restorer.unescape_all();
        assert_json_eq!(restored, json!({"user": {"_stashType": "custom", "n": 1}}));
    }
}
