use crate::emitter::Channel;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED DOCUMENTATION TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

/// A generic `@tag description` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub name: String,
    pub description: String,
}

/// A single type or an ordered union of types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypeName {
    Single(String),
    Union(Vec<String>),
}

impl TypeName {
    pub fn unknown() -> Self {
        TypeName::Single("unknown".to_string())
    }

    pub fn from_list(mut types: Vec<String>) -> Self {
        if types.len() == 1 {
            TypeName::Single(types.remove(0))
        } else {
            TypeName::Union(types)
        }
    }

    pub fn is(&self, name: &str) -> bool {
        matches!(self, TypeName::Single(t) if t == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            TypeName::Single(t) => t == name,
            TypeName::Union(types) => types.iter().any(|t| t == name),
        }
    }

    /// `a|b` rendering used in synthesized signatures.
    pub fn display(&self) -> String {
        match self {
            TypeName::Single(t) => t.clone(),
            TypeName::Union(types) => types.join(" | "),
        }
    }
}

/// A function or event parameter. Nested shapes use dotted paths
/// (`employee.name`) and array element shapes use `[]` (`employees[].name`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TypeName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub optional: bool,
    pub rest: bool,
}

impl Parameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeName::unknown(),
            description: None,
            default_value: None,
            optional: false,
            rest: false,
        }
    }

    /// Name of the top-level parameter this entry belongs to.
    pub fn root_name(&self) -> &str {
        let end = self
            .name
            .find(|c| c == '.' || c == '[')
            .unwrap_or(self.name.len());
        &self.name[..end]
    }

    pub fn is_nested(&self) -> bool {
        self.root_name().len() != self.name.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Returns {
    #[serde(rename = "type")]
    pub kind: TypeName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Returns {
    pub fn of(kind: &str) -> Self {
        Self {
            kind: TypeName::Single(kind.to_string()),
            description: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRIES
// ═══════════════════════════════════════════════════════════════════════════════

/// Fields shared by every member-level entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Member {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub keywords: Vec<Keyword>,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Member {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelEntry {
    #[serde(flatten)]
    pub member: Member,
    pub prop: String,
    pub event: String,
}

/// Structured form of a prop whose default is a documented function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub keywords: Vec<Keyword>,
    pub syntax: Vec<String>,
    pub params: Vec<Parameter>,
    pub returns: Returns,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropEntry {
    #[serde(flatten)]
    pub member: Member,
    #[serde(rename = "type")]
    pub kind: TypeName,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub describe_model: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEntry {
    #[serde(flatten)]
    pub member: Member,
    #[serde(rename = "type")]
    pub kind: TypeName,
    pub initial_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedEntry {
    #[serde(flatten)]
    pub member: Member,
    #[serde(rename = "type")]
    pub kind: TypeName,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodEntry {
    #[serde(flatten)]
    pub member: Member,
    pub params: Vec<Parameter>,
    pub returns: Returns,
    pub syntax: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventEntry {
    #[serde(flatten)]
    pub member: Member,
    pub arguments: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotEntry {
    #[serde(flatten)]
    pub member: Member,
    pub props: Vec<Parameter>,
}

/// One emitted unit of documentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    Name { value: String },
    Description { value: String },
    Keywords { value: Vec<Keyword> },
    Model(ModelEntry),
    Prop(PropEntry),
    Data(DataEntry),
    Computed(ComputedEntry),
    Method(MethodEntry),
    Event(EventEntry),
    Slot(SlotEntry),
}

impl Entry {
    pub fn channel(&self) -> Channel {
        match self {
            Entry::Name { .. } => Channel::Name,
            Entry::Description { .. } => Channel::Description,
            Entry::Keywords { .. } => Channel::Keywords,
            Entry::Model(_) => Channel::Model,
            Entry::Prop(_) => Channel::Prop,
            Entry::Data(_) => Channel::Data,
            Entry::Computed(_) => Channel::Computed,
            Entry::Method(_) => Channel::Method,
            Entry::Event(_) => Channel::Event,
            Entry::Slot(_) => Channel::Slot,
        }
    }

    pub fn member(&self) -> Option<&Member> {
        match self {
            Entry::Model(e) => Some(&e.member),
            Entry::Prop(e) => Some(&e.member),
            Entry::Data(e) => Some(&e.member),
            Entry::Computed(e) => Some(&e.member),
            Entry::Method(e) => Some(&e.member),
            Entry::Event(e) => Some(&e.member),
            Entry::Slot(e) => Some(&e.member),
            Entry::Name { .. } | Entry::Description { .. } | Entry::Keywords { .. } => None,
        }
    }

    /// Component-level entries carry no visibility and are always public.
    pub fn visibility(&self) -> Visibility {
        self.member().map(|m| m.visibility).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_root_name() {
        assert_eq!(Parameter::new("employees[].name").root_name(), "employees");
        assert_eq!(Parameter::new("employee.name").root_name(), "employee");
        assert!(!Parameter::new("plain").is_nested());
    }

    #[test]
    fn test_entry_serializes_with_kind_tag() {
        let entry = Entry::Data(DataEntry {
            member: Member::named("enabled"),
            kind: TypeName::Single("boolean".into()),
            initial_value: "false".into(),
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "data");
        assert_eq!(json["name"], "enabled");
        assert_eq!(json["type"], "boolean");
        assert_eq!(json["initialValue"], "false");
        assert_eq!(json["visibility"], "public");
    }

    #[test]
    fn test_union_type_serializes_as_list() {
        let t = TypeName::from_list(vec!["string".into(), "number".into()]);
        assert_eq!(serde_json::to_value(&t).unwrap(), serde_json::json!(["string", "number"]));
        assert!(t.contains("number"));
    }
}
