#![forbid(unsafe_code)]

//! Tracking data bags and the recursive deep merge.
//!
//! [`TrackingData`] is an ordered mapping from string keys to JSON values —
//! the accumulated bag of analytics attributes associated with a point in a
//! component tree. Bags are combined with [`TrackingData::merged_with`], a
//! pure structural merge defined once here and reused by every layer above.
//!
//! # Merge contract
//!
//! For `base.merged_with(&overlay)`:
//!
//! 1. Keys from both sides are preserved; no key is ever lost.
//! 2. When both sides hold an object at the same key, the merge recurses.
//! 3. For any other conflict (scalar, array, or mixed), the overlay wins.
//! 4. Neither operand is mutated; the result is a fresh bag.
//!
//! Arrays are deliberately treated as scalars (rule 3): an overlay's array
//! replaces the base's wholesale.
//!
//! # Example
//!
//! ```
//! use treemetry::tracking_data;
//!
//! let base = tracking_data! { "page": "home", "ctx": { "a": 1, "b": 2 } };
//! let overlay = tracking_data! { "ctx": { "b": 3 }, "event": "click" };
//!
//! let merged = base.merged_with(&overlay);
//! assert_eq!(merged.get("page").unwrap(), "home");
//! assert_eq!(merged.get("event").unwrap(), "click");
//! assert_eq!(merged.get("ctx").unwrap()["a"], 1);
//! assert_eq!(merged.get("ctx").unwrap()["b"], 3);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A bag of analytics attributes: string keys mapped to JSON values.
///
/// Cheap to create empty, cloned liberally by the layers above. Insertion
/// order is preserved when `serde_json` is built with its default map type
/// ordering for this crate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingData(Map<String, Value>);

impl TrackingData {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a bag from a JSON value.
    ///
    /// Non-object values degrade to an empty bag rather than erroring; the
    /// layers above treat "no usable data" as "empty data" throughout.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    /// Insert a key/value pair, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a key/value pair in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the bag holds no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of top-level attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over top-level key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// View the bag as a JSON object value (clones the map).
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Borrow the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Deep-merge `overlay` on top of `self`, overlay keys winning.
    ///
    /// See the module docs for the full merge contract. Neither operand is
    /// mutated.
    #[must_use]
    pub fn merged_with(&self, overlay: &TrackingData) -> TrackingData {
        let mut out = self.0.clone();
        for (key, overlay_value) in &overlay.0 {
            let merged = match out.get(key) {
                Some(base_value) => merge_value(base_value, overlay_value),
                None => overlay_value.clone(),
            };
            out.insert(key.clone(), merged);
        }
        Self(out)
    }
}

impl From<Map<String, Value>> for TrackingData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Value> for TrackingData {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl IntoIterator for TrackingData {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Merge two JSON values: recurse when both are objects, overlay wins
/// otherwise.
fn merge_value(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut out = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let merged = match out.get(key) {
                    Some(base_value) => merge_value(base_value, overlay_value),
                    None => overlay_value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Build a [`TrackingData`] bag with JSON-literal syntax.
///
/// # Examples
///
/// ```
/// use treemetry::tracking_data;
///
/// let data = tracking_data! { "page": "search", "depth": 2 };
/// assert_eq!(data.len(), 2);
///
/// let empty = tracking_data! {};
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! tracking_data {
    () => {
        $crate::data::TrackingData::new()
    };
    ($($body:tt)+) => {
        $crate::data::TrackingData::from_value($crate::__serde_json::json!({ $($body)+ }))
    };
}
