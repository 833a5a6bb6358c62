use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLVED VALUES
// ═══════════════════════════════════════════════════════════════════════════════

/// Static type of a resolved expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    String,
    Boolean,
    Object,
    Array,
    Function,
    Unknown,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::Function => "function",
            ValueType::Unknown => "unknown",
        }
    }
}

/// The statically determined value behind an expression.
///
/// `raw` always holds the text used for display: source text for numbers and
/// anything that could not be reduced, canonical JSON for strings, objects
/// and arrays. `value` is `None` whenever the expression is not reducible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedValue {
    #[serde(rename = "type")]
    pub kind: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    pub raw: String,
    pub member: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_object: Option<Properties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_array: Option<Vec<ResolvedValue>>,
}

impl ResolvedValue {
    fn scalar(kind: ValueType, value: Option<serde_json::Value>, raw: String) -> Self {
        Self {
            kind,
            value,
            raw,
            member: false,
            raw_object: None,
            raw_array: None,
        }
    }

    pub fn string(value: &str) -> Self {
        let raw = serde_json::Value::String(value.to_string()).to_string();
        Self::scalar(
            ValueType::String,
            Some(serde_json::Value::String(value.to_string())),
            raw,
        )
    }

    /// `raw` is the literal exactly as written (`0x10`, `1e3`, `-2`).
    pub fn number(value: f64, raw: &str) -> Self {
        Self::scalar(ValueType::Number, number_to_json(value), raw.to_string())
    }

    pub fn boolean(value: bool) -> Self {
        Self::scalar(
            ValueType::Boolean,
            Some(serde_json::Value::Bool(value)),
            value.to_string(),
        )
    }

    pub fn null() -> Self {
        Self::scalar(
            ValueType::Object,
            Some(serde_json::Value::Null),
            "null".to_string(),
        )
    }

    pub fn function(source: &str) -> Self {
        Self::scalar(ValueType::Function, None, source.to_string())
    }

    /// Unresolvable expression; `raw` is its source text or bare name.
    pub fn unknown(raw: &str) -> Self {
        Self::scalar(ValueType::Unknown, None, raw.to_string())
    }

    /// Result of projecting through something that is not a known object.
    pub fn member_unknown(raw: &str) -> Self {
        Self {
            member: true,
            ..Self::unknown(raw)
        }
    }

    pub fn undefined() -> Self {
        Self::unknown("undefined")
    }

    pub fn object(properties: Properties) -> Self {
        let mut map = serde_json::Map::new();
        let mut parts = Vec::with_capacity(properties.len());
        for (key, value) in properties.iter() {
            map.insert(
                key.to_string(),
                value.value.clone().unwrap_or(serde_json::Value::Null),
            );
            parts.push(format!(
                "{}:{}",
                serde_json::Value::String(key.to_string()),
                value.raw
            ));
        }
        Self {
            kind: ValueType::Object,
            value: Some(serde_json::Value::Object(map)),
            raw: format!("{{{}}}", parts.join(",")),
            member: false,
            raw_object: Some(properties),
            raw_array: None,
        }
    }

    pub fn array(items: Vec<ResolvedValue>) -> Self {
        let value = items
            .iter()
            .map(|item| item.value.clone().unwrap_or(serde_json::Value::Null))
            .collect();
        let raw = format!(
            "[{}]",
            items
                .iter()
                .map(|item| item.raw.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );
        Self {
            kind: ValueType::Array,
            value: Some(serde_json::Value::Array(value)),
            raw,
            member: false,
            raw_object: None,
            raw_array: Some(items),
        }
    }

    pub fn with_member(mut self, member: bool) -> Self {
        self.member = member;
        self
    }

    /// True for the `undefined` identifier, which destructuring treats as absent.
    pub fn is_undefined(&self) -> bool {
        self.kind == ValueType::Unknown && !self.member && self.raw == "undefined"
    }

    pub fn as_str(&self) -> Option<&str> {
        match (&self.kind, &self.value) {
            (ValueType::String, Some(serde_json::Value::String(s))) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.value {
            Some(serde_json::Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Own property of an object value.
    pub fn property(&self, key: &str) -> Option<&ResolvedValue> {
        self.raw_object.as_ref().and_then(|props| props.get(key))
    }
}

fn number_to_json(value: f64) -> Option<serde_json::Value> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Some(serde_json::Value::from(value as i64));
    }
    serde_json::Number::from_f64(value).map(serde_json::Value::Number)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORDERED PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════════

/// Insertion-ordered property map. A repeated key replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, ResolvedValue)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: ResolvedValue) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ResolvedValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ResolvedValue)> for Properties {
    fn from_iter<T: IntoIterator<Item = (String, ResolvedValue)>>(iter: T) -> Self {
        let mut props = Properties::new();
        for (key, value) in iter {
            props.insert(key, value);
        }
        props
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BINDINGS & SCOPE TABLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub key: String,
    /// Property name before a destructuring rename (`{ a: b }` binds `b` with source `a`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub value: ResolvedValue,
}

/// Outcome of a scope lookup.
#[derive(Debug, PartialEq)]
pub enum Lookup<'t> {
    Bound(&'t Binding),
    Unresolved,
}

/// Arena of bindings partitioned into nested frames.
///
/// Lookup scans from the newest binding backwards, so inner frames shadow
/// outer ones and a later declaration of the same name shadows an earlier one.
#[derive(Debug, Default)]
pub struct ScopeTable {
    bindings: Vec<Binding>,
    frames: Vec<usize>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self) {
        self.frames.push(self.bindings.len());
    }

    /// Drops every binding declared since the matching `push_frame`.
    pub fn pop_frame(&mut self) {
        if let Some(start) = self.frames.pop() {
            self.bindings.truncate(start);
        }
    }

    pub fn insert(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    pub fn lookup(&self, name: &str) -> Lookup<'_> {
        match self.bindings.iter().rev().find(|b| b.key == name) {
            Some(binding) => Lookup::Bound(binding),
            None => Lookup::Unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_raw_is_json_quoted() {
        let v = ResolvedValue::string("chaka");
        assert_eq!(v.raw, "\"chaka\"");
        assert_eq!(v.as_str(), Some("chaka"));
        assert_eq!(v.kind, ValueType::String);
    }

    #[test]
    fn test_object_raw_follows_insertion_order() {
        let props: Properties = vec![
            ("b".to_string(), ResolvedValue::number(2.0, "2")),
            ("a".to_string(), ResolvedValue::number(1.0, "1")),
        ]
        .into_iter()
        .collect();
        let v = ResolvedValue::object(props);
        assert_eq!(v.raw, r#"{"b":2,"a":1}"#);
        assert_eq!(v.property("a").map(|p| p.raw.as_str()), Some("1"));
    }

    #[test]
    fn test_number_keeps_source_text() {
        let v = ResolvedValue::number(16.0, "0x10");
        assert_eq!(v.raw, "0x10");
        assert_eq!(v.value, Some(serde_json::json!(16)));
    }

    #[test]
    fn test_scope_frames_shadow_and_pop() {
        let mut table = ScopeTable::new();
        table.insert(Binding {
            key: "x".into(),
            source: None,
            value: ResolvedValue::number(1.0, "1"),
        });
        table.push_frame();
        table.insert(Binding {
            key: "x".into(),
            source: None,
            value: ResolvedValue::number(2.0, "2"),
        });
        match table.lookup("x") {
            Lookup::Bound(b) => assert_eq!(b.value.raw, "2"),
            Lookup::Unresolved => panic!("x should be bound"),
        }
        table.pop_frame();
        match table.lookup("x") {
            Lookup::Bound(b) => assert_eq!(b.value.raw, "1"),
            Lookup::Unresolved => panic!("x should be bound"),
        }
        assert_eq!(table.lookup("y"), Lookup::Unresolved);
    }

    #[test]
    fn test_repeated_key_replaces_in_place() {
        let mut props = Properties::new();
        props.insert("a".into(), ResolvedValue::boolean(true));
        props.insert("b".into(), ResolvedValue::boolean(true));
        props.insert("a".into(), ResolvedValue::boolean(false));
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(props.get("a").and_then(|v| v.as_bool()), Some(false));
    }
}
