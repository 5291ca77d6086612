//! Canonical request signatures.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

use super::request::Method;

/// Deterministic, field-order-independent fingerprint of a request's
/// method, path, and body.
///
/// One signature serves as both the cache key and the queue dedup key, so
/// two requests that share a path but differ in body are never merged.
/// The method and path are embedded verbatim (invalidation patterns match
/// against them); the body contributes a digest of its canonical
/// serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestSignature {
    key: String,
}

impl RequestSignature {
    pub fn compute(method: Method, path: &str, body: Option<&Value>) -> Self {
        let key = match body {
            Some(body) => format!("{method} {path}#{:016x}", body_digest(body)),
            None => format!("{method} {path}"),
        };
        Self { key }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Hash of the canonical body serialization.
///
/// Uses `DefaultHasher` (SipHash), deterministic within a process
/// lifetime — sufficient for an in-memory cache and dedup table. A
/// persistent or distributed backend would need a stable digest instead.
fn body_digest(body: &Value) -> u64 {
    let mut canonical = String::new();
    write_canonical(body, &mut canonical);
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

/// Serialize with object keys sorted recursively, so the order a body map
/// was built in never changes the signature.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
