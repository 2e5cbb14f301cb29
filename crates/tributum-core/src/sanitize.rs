// ABOUTME: Recursive redaction of sensitive fields, headers and free text before logging
// ABOUTME: Guarantees no raw secret survives in nested JSON, bounded by depth and size guards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! Sanitization of data destined for logs, spans and API responses
//!
//! A key is sensitive when its name matches one of the built-in patterns
//! (case-insensitive) or contains one of the configured extra field names.
//! Only the value under a sensitive key is replaced; siblings are untouched.
//!
//! ```rust
//! use serde_json::json;
//! use tributum_core::sanitize::Sanitizer;
//!
//! let sanitizer = Sanitizer::default();
//! let clean = sanitizer.sanitize_value(&json!({"user": {"name": "ada", "password": "x"}}));
//! assert_eq!(clean["user"]["password"], "[REDACTED]");
//! assert_eq!(clean["user"]["name"], "ada");
//! ```

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Replacement for sensitive values
pub const REDACTED: &str = "[REDACTED]";

/// Replacement for containers nested deeper than [`MAX_SANITIZE_DEPTH`]
pub const MAX_DEPTH_MARKER: &str = "[MAX_DEPTH_EXCEEDED]";

/// Appended when a container is cut at [`MAX_SANITIZE_ITEMS`]
pub const TRUNCATED_MARKER: &str = "[TRUNCATED]";

/// Maximum nesting depth that is walked
pub const MAX_SANITIZE_DEPTH: usize = 32;

/// Maximum entries kept per object or array
pub const MAX_SANITIZE_ITEMS: usize = 1000;

/// Key recording how many object entries were dropped by the size guard
const TRUNCATED_KEY: &str = "_truncated";

/// Built-in sensitive field name patterns, matched against the key after
/// camelCase words are split with `_` and the result is lowercased
const SENSITIVE_FIELD_PATTERNS: &[&str] = &[
    r"passw(or)?d",
    r"^pwd$",
    r"secret",
    r"token",
    r"api[_-]?key",
    r"private[_-]?key",
    r"access[_-]?key",
    r"encryption[_-]?key",
    r"(^|[_-])key$",
    r"credential",
    r"(^|[_-])auth([_-]|$)",
    r"^auth(key|token)",
    r"auth$",
    r"authoriz",
    r"authentic",
    r"session",
    r"cookie",
    r"(^|[_-])ssn([_-]|$)",
    r"social[_-]?security",
    r"credit[_-]?card",
    r"card[_-]?number",
    r"^cv[cv]\d?$",
    r"(^|[_-])pin$",
];

/// Used only if the pattern set fails to compile
const FALLBACK_FIELDS: &[&str] = &[
    "password", "secret", "token", "key", "auth", "credential", "session", "cookie",
];

/// Header names that are always redacted
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
    "x-access-token",
    "x-csrf-token",
    "proxy-authorization",
    "www-authenticate",
];

fn field_pattern() -> Option<&'static Regex> {
    static FIELD_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    FIELD_REGEX
        .get_or_init(|| Regex::new(&format!("(?i){}", SENSITIVE_FIELD_PATTERNS.join("|"))).ok())
        .as_ref()
}

fn bearer_pattern() -> Option<&'static Regex> {
    static BEARER_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    BEARER_REGEX
        .get_or_init(|| Regex::new(r"(?i)bearer\s+[A-Za-z0-9\-._~+/]+=*").ok())
        .as_ref()
}

fn assignment_pattern() -> Option<&'static Regex> {
    static ASSIGNMENT_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    ASSIGNMENT_REGEX
        .get_or_init(|| Regex::new(r#"([A-Za-z0-9_\-]+)(\s*[=:]\s*)("[^"]*"|[^\s&,;]+)"#).ok())
        .as_ref()
}

/// Lowercase `name`, inserting `_` where a camelCase word starts
/// (`signingKey` becomes `signing_key`)
fn split_words(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;
    for c in name.chars() {
        if c.is_uppercase() && previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            out.push('_');
        }
        out.extend(c.to_lowercase());
        previous = Some(c);
    }
    out
}

/// Redacts sensitive values from structures, headers and text
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    extra_fields: Vec<String>,
}

impl Sanitizer {
    /// Sanitizer that also treats any key containing one of `extra_fields` as sensitive
    #[must_use]
    pub fn new<I, S>(extra_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra_fields: extra_fields
                .into_iter()
                .map(|field| field.as_ref().trim().to_lowercase())
                .filter(|field| !field.is_empty())
                .collect(),
        }
    }

    /// Whether a field name should have its value redacted
    #[must_use]
    pub fn is_sensitive_field(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        if self.extra_fields.iter().any(|f| lower.contains(f.as_str())) {
            return true;
        }
        field_pattern().map_or_else(
            || FALLBACK_FIELDS.iter().any(|f| lower.contains(f)),
            |re| re.is_match(&split_words(name)),
        )
    }

    /// Whether a header should have its value redacted
    #[must_use]
    pub fn is_sensitive_header(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        SENSITIVE_HEADERS.contains(&lower.as_str()) || self.is_sensitive_field(&lower)
    }

    /// Recursively redact every value stored under a sensitive key
    #[must_use]
    pub fn sanitize_value(&self, value: &Value) -> Value {
        self.sanitize_at(value, 0)
    }

    /// Sanitize an object map
    #[must_use]
    pub fn sanitize_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        self.sanitize_object(map, 0)
    }

    /// Sanitize header pairs into a JSON object, joining repeated names with `", "`
    #[must_use]
    pub fn sanitize_headers<'a, I>(&self, headers: I) -> Map<String, Value>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut out = Map::new();
        for (name, value) in headers.into_iter().take(MAX_SANITIZE_ITEMS) {
            let name = name.to_lowercase();
            let value = if self.is_sensitive_header(&name) {
                REDACTED.to_owned()
            } else {
                value.to_owned()
            };
            match out.get_mut(&name) {
                Some(Value::String(existing)) => {
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
                _ => {
                    out.insert(name, Value::String(value));
                }
            }
        }
        out
    }

    /// Redact bearer tokens and `key=value` / `key: value` pairs with sensitive keys
    #[must_use]
    pub fn sanitize_text(&self, text: &str) -> String {
        let mut result = bearer_pattern().map_or_else(
            || text.to_owned(),
            |re| re.replace_all(text, format!("Bearer {REDACTED}")).into_owned(),
        );
        if let Some(re) = assignment_pattern() {
            result = re
                .replace_all(&result, |caps: &regex::Captures<'_>| {
                    if self.is_sensitive_field(&caps[1]) {
                        format!("{}{}{REDACTED}", &caps[1], &caps[2])
                    } else {
                        caps[0].to_owned()
                    }
                })
                .into_owned();
        }
        result
    }

    fn sanitize_at(&self, value: &Value, depth: usize) -> Value {
        match value {
            Value::Object(_) | Value::Array(_) if depth >= MAX_SANITIZE_DEPTH => {
                Value::String(MAX_DEPTH_MARKER.to_owned())
            }
            Value::Object(map) => Value::Object(self.sanitize_object(map, depth)),
            Value::Array(items) => {
                let mut out: Vec<Value> = items
                    .iter()
                    .take(MAX_SANITIZE_ITEMS)
                    .map(|item| self.sanitize_at(item, depth + 1))
                    .collect();
                if items.len() > MAX_SANITIZE_ITEMS {
                    out.push(Value::String(TRUNCATED_MARKER.to_owned()));
                }
                Value::Array(out)
            }
            scalar => scalar.clone(),
        }
    }

    fn sanitize_object(&self, map: &Map<String, Value>, depth: usize) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in map.iter().take(MAX_SANITIZE_ITEMS) {
            let clean = if self.is_sensitive_field(key) {
                Value::String(REDACTED.to_owned())
            } else {
                self.sanitize_at(value, depth + 1)
            };
            out.insert(key.clone(), clean);
        }
        if map.len() > MAX_SANITIZE_ITEMS {
            out.insert(
                TRUNCATED_KEY.to_owned(),
                Value::String(TRUNCATED_MARKER.to_owned()),
            );
        }
        out
    }
}
