use crate::entry::{Keyword, Member, Parameter, Returns, TypeName, Visibility};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DECORATION_RE: Regex = Regex::new(r"^\s*\* ?").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"^@([A-Za-z][\w-]*)\s*(.*)$").unwrap();
    static ref BUILTIN_TYPE_RE: Regex =
        Regex::new(r"^(Object|String|Number|Boolean|Array|Function|Symbol|BigInt)((?:\[\])*)$")
            .unwrap();
}

/// A parsed documentation comment.
///
/// Tags with a structural meaning are lifted into dedicated fields; every
/// other tag stays in `keywords` in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocComment {
    pub description: Option<String>,
    pub keywords: Vec<Keyword>,
    pub visibility: Option<Visibility>,
    pub params: Vec<Parameter>,
    pub props: Vec<Parameter>,
    pub returns: Option<Returns>,
    pub type_override: Option<String>,
    pub default_override: Option<String>,
    pub model: bool,
    pub event: Option<String>,
    pub kind: Option<String>,
    pub syntax: Vec<String>,
    pub slots: Vec<SlotTag>,
    pub category: Option<String>,
    pub version: Option<String>,
    pub hidden: bool,
    /// Union types with an empty member, e.g. `{string|}`.
    pub malformed_unions: Vec<String>,
}

/// `@slot name - description` declared on the component itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotTag {
    pub name: String,
    pub description: Option<String>,
}

impl DocComment {
    /// Parses a comment body with its `/*`, `*/` or `//` delimiters removed.
    pub fn parse(body: &str) -> Self {
        let mut doc = DocComment::default();
        let mut description = Vec::new();
        let mut tags: Vec<(String, Vec<String>)> = Vec::new();

        // A tag value continues on indented lines only; anything else closes it.
        let mut open = false;
        for raw in body.lines() {
            let (line, decorated) = match DECORATION_RE.find(raw) {
                Some(star) => (&raw[star.end()..], true),
                None => (raw, false),
            };
            let line = line.trim_end();
            if let Some(caps) = TAG_RE.captures(line.trim_start()) {
                tags.push((caps[1].to_string(), vec![caps[2].to_string()]));
                open = true;
            } else if let Some((_, value)) = tags.last_mut() {
                if open && line.starts_with([' ', '\t']) {
                    value.push(line.trim().to_string());
                } else {
                    open = false;
                }
            } else if decorated {
                description.push(line.to_string());
            } else {
                description.push(line.trim_start().to_string());
            }
        }

        let text = description.join("\n");
        let text = text.trim();
        if !text.is_empty() {
            doc.description = Some(text.to_string());
        }

        for (name, lines) in tags {
            let value = lines.join("\n").trim().to_string();
            doc.apply_tag(&name, value);
        }
        doc
    }

    fn apply_tag(&mut self, name: &str, value: String) {
        match name {
            "param" | "arg" | "argument" => {
                let param = self.parse_param(&value);
                self.params.push(param);
            }
            "prop" => {
                let param = self.parse_param(&value);
                self.props.push(param);
            }
            "return" | "returns" => self.returns = Some(self.parse_returns(&value)),
            "type" => self.type_override = Some(strip_braces(&value).to_string()),
            "default" => self.default_override = Some(value),
            "model" => self.model = true,
            "event" => {
                if !value.is_empty() {
                    self.event = Some(value);
                }
            }
            "slot" => self.slots.push(parse_slot_tag(&value)),
            "kind" => self.kind = Some(value),
            "syntax" => self.syntax.push(value),
            "category" => self.category = Some(value),
            "version" => self.version = Some(value),
            "hidden" => self.hidden = true,
            "public" | "protected" | "private" => self.visibility = Visibility::parse(name),
            _ => self.keywords.push(Keyword {
                name: name.to_string(),
                description: value,
            }),
        }
    }

    /// Parses `{type} [name=default] - description`; every part is optional.
    pub fn parse_param(&mut self, text: &str) -> Parameter {
        let mut rest = text.trim();
        let mut param = Parameter::new("");

        if rest.starts_with('{') {
            if let Some(end) = balanced_end(rest, '{', '}') {
                let raw_type = rest[1..end - 1].trim();
                rest = rest[end..].trim_start();
                let mut raw_type = raw_type;
                if let Some(stripped) = raw_type.strip_prefix("...") {
                    param.rest = true;
                    raw_type = stripped;
                }
                if let Some(stripped) = raw_type.strip_suffix('=') {
                    param.optional = true;
                    raw_type = stripped;
                }
                param.kind = self.parse_type(raw_type);
            }
        }

        let name_token = if rest.starts_with('[') {
            match balanced_end(rest, '[', ']') {
                Some(end) => {
                    let inner = &rest[1..end - 1];
                    rest = rest[end..].trim_start();
                    param.optional = true;
                    match inner.split_once('=') {
                        Some((name, default)) => {
                            let default = default.trim();
                            if !default.is_empty() {
                                param.default_value = Some(default.to_string());
                            }
                            name.trim().to_string()
                        }
                        None => inner.trim().to_string(),
                    }
                }
                None => String::new(),
            }
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let token = rest[..end].to_string();
            rest = rest[end..].trim_start();
            token
        };

        param.name = match name_token.strip_prefix("...") {
            Some(stripped) => {
                param.rest = true;
                stripped.to_string()
            }
            None => name_token,
        };
        param.description = description_after_dash(rest);
        param
    }

    fn parse_returns(&mut self, text: &str) -> Returns {
        let text = text.trim();
        let mut returns = Returns::of("unknown");
        let mut rest = text;
        if text.starts_with('{') {
            if let Some(end) = balanced_end(text, '{', '}') {
                returns.kind = self.parse_type(text[1..end - 1].trim());
                rest = text[end..].trim_start();
            }
        }
        returns.description = description_after_dash(rest);
        returns
    }

    /// `(A|B)` and `A|B` become unions; built-in constructor names are lower-cased.
    pub fn parse_type(&mut self, raw: &str) -> TypeName {
        let raw = raw.trim();
        let inner = raw
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(raw);
        if !inner.contains('|') {
            return TypeName::Single(normalize_type(inner));
        }
        let members: Vec<&str> = inner.split('|').map(str::trim).collect();
        if members.iter().any(|m| m.is_empty()) {
            self.malformed_unions.push(raw.to_string());
        }
        TypeName::from_list(
            members
                .into_iter()
                .filter(|m| !m.is_empty())
                .map(normalize_type)
                .collect(),
        )
    }

    pub fn visibility_or_default(&self) -> Visibility {
        self.visibility.unwrap_or_default()
    }

    /// Shared entry fields for a member called `name` documented by this comment.
    pub fn member(&self, name: &str) -> Member {
        Member {
            name: name.to_string(),
            description: self.description.clone(),
            keywords: self.keywords.clone(),
            visibility: self.visibility_or_default(),
            category: self.category.clone(),
            version: self.version.clone(),
        }
    }

    /// Keywords for the component itself, without tags that describe
    /// something other than the component.
    pub fn component_keywords(&self) -> Vec<Keyword> {
        self.keywords
            .iter()
            .filter(|k| !matches!(k.name.as_str(), "name" | "slot" | "mixin"))
            .cloned()
            .collect()
    }

    /// Documentation for the parameter at `index` named `name`. Name matches
    /// win over position.
    pub fn param_for(&self, name: Option<&str>, index: usize) -> Option<&Parameter> {
        let top_level: Vec<&Parameter> = self.params.iter().filter(|p| !p.is_nested()).collect();
        if let Some(name) = name {
            if let Some(found) = top_level.iter().find(|p| p.name == name) {
                return Some(*found);
            }
        }
        top_level.get(index).copied()
    }

    /// Nested `@param` paths (`employee.name`) documented under `root`.
    pub fn nested_params_of(&self, root: &str) -> Vec<Parameter> {
        self.params
            .iter()
            .filter(|p| p.is_nested() && p.root_name() == root)
            .cloned()
            .collect()
    }
}

pub fn normalize_type(raw: &str) -> String {
    let raw = raw.trim();
    if BUILTIN_TYPE_RE.is_match(raw) {
        raw.to_lowercase()
    } else {
        raw.to_string()
    }
}

fn strip_braces(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .map(str::trim)
        .unwrap_or(value)
}

fn description_after_dash(text: &str) -> Option<String> {
    let text = text.trim();
    let text = text.strip_prefix('-').map(str::trim_start).unwrap_or(text);
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn parse_slot_tag(value: &str) -> SlotTag {
    let value = value.trim();
    let end = value.find(char::is_whitespace).unwrap_or(value.len());
    let name = &value[..end];
    SlotTag {
        name: if name.is_empty() { "default" } else { name }.to_string(),
        description: description_after_dash(&value[end..]),
    }
}

/// Byte offset just past the delimiter closing the one at position 0.
fn balanced_end(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i + c.len_utf8());
            }
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMENT LOCATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Body of the comment directly preceding byte offset `start`, ignoring
/// whitespace in between. A block comment wins; otherwise a run of
/// consecutive `//` lines is joined.
pub fn leading_comment(source: &str, start: usize) -> Option<String> {
    let prefix = source.get(..start)?;
    let trimmed = prefix.trim_end();

    if let Some(before_end) = trimmed.strip_suffix("*/") {
        let open = before_end.rfind("/*")?;
        let body = &before_end[open + 2..];
        let body = body.strip_prefix('*').unwrap_or(body);
        return Some(body.to_string());
    }

    let mut lines = Vec::new();
    let mut remaining = trimmed;
    loop {
        let line_start = remaining.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line = remaining[line_start..].trim();
        match line.strip_prefix("//") {
            Some(text) => {
                let text = text.strip_prefix('/').unwrap_or(text);
                lines.push(text.strip_prefix(' ').unwrap_or(text).to_string());
                if line_start == 0 {
                    break;
                }
                remaining = remaining[..line_start - 1].trim_end_matches([' ', '\t', '\r']);
                if remaining.ends_with('\n') || remaining.is_empty() {
                    break;
                }
            }
            None => break,
        }
    }
    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    Some(lines.join("\n"))
}

/// Parsed comment preceding `start`, or an empty comment.
pub fn doc_before(source: &str, start: usize) -> DocComment {
    leading_comment(source, start)
        .map(|body| DocComment::parse(&body))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_and_keywords() {
        let doc = DocComment::parse(
            "*\n * First line\n *\n * Second paragraph\n * @author Arya\n * @since 1.0\n ",
        );
        assert_eq!(
            doc.description.as_deref(),
            Some("First line\n\nSecond paragraph")
        );
        assert_eq!(doc.keywords.len(), 2);
        assert_eq!(doc.keywords[0].name, "author");
        assert_eq!(doc.keywords[0].description, "Arya");
    }

    #[test]
    fn test_optional_param_with_default() {
        let doc = DocComment::parse("@param {string} [somebody=John Doe] - Somebody's name.");
        let p = &doc.params[0];
        assert_eq!(p.name, "somebody");
        assert!(p.kind.is("string"));
        assert!(p.optional);
        assert_eq!(p.default_value.as_deref(), Some("John Doe"));
        assert_eq!(p.description.as_deref(), Some("Somebody's name."));
    }

    #[test]
    fn test_optional_param_without_default() {
        let doc = DocComment::parse("@param {string} [somebody=] - Somebody's name.");
        assert!(doc.params[0].optional);
        assert_eq!(doc.params[0].default_value, None);
    }

    #[test]
    fn test_param_type_union_and_builtins() {
        let doc = DocComment::parse("@param {(Object[]|String)} value the value");
        match &doc.params[0].kind {
            TypeName::Union(types) => assert_eq!(types, &vec!["object[]", "string"]),
            other => panic!("expected union, got {:?}", other),
        }
        assert_eq!(doc.params[0].description.as_deref(), Some("the value"));
    }

    #[test]
    fn test_malformed_union_is_recorded() {
        let doc = DocComment::parse("@param {string|} value");
        assert_eq!(doc.malformed_unions, vec!["string|".to_string()]);
        assert!(doc.params[0].kind.is("string"));
    }

    #[test]
    fn test_rest_param() {
        let doc = DocComment::parse("@param {...number} nums - numbers");
        assert!(doc.params[0].rest);
        assert!(doc.params[0].kind.is("number"));
    }

    #[test]
    fn test_returns_strips_dash() {
        let doc = DocComment::parse("@returns {Boolean} - whether it worked");
        let r = doc.returns.unwrap();
        assert!(r.kind.is("boolean"));
        assert_eq!(r.description.as_deref(), Some("whether it worked"));
    }

    #[test]
    fn test_type_and_default_last_wins() {
        let doc = DocComment::parse("@type string\n@type {number}\n@default 1\n@default 2");
        assert_eq!(doc.type_override.as_deref(), Some("number"));
        assert_eq!(doc.default_override.as_deref(), Some("2"));
    }

    #[test]
    fn test_visibility_and_structured_tags() {
        let doc = DocComment::parse("@protected\n@model\n@event changed\n@kind function");
        assert_eq!(doc.visibility, Some(Visibility::Protected));
        assert!(doc.model);
        assert_eq!(doc.event.as_deref(), Some("changed"));
        assert_eq!(doc.kind.as_deref(), Some("function"));
        assert!(doc.keywords.is_empty());
    }

    #[test]
    fn test_multiline_tag_value() {
        let doc = DocComment::parse("@note first\n  second");
        assert_eq!(doc.keywords[0].description, "first\nsecond");
    }

    #[test]
    fn test_unindented_or_blank_line_ends_tag_value() {
        let doc = DocComment::parse("*\n * @note first\n *   second\n *\n *   stray\n * @author me\n * loose line\n ");
        assert_eq!(doc.keywords[0].description, "first\nsecond");
        assert_eq!(doc.keywords[1].name, "author");
        assert_eq!(doc.keywords[1].description, "me");
    }

    #[test]
    fn test_component_keywords_filter() {
        let doc = DocComment::parse("@name Foo\n@mixin\n@author me");
        let kws = doc.component_keywords();
        assert_eq!(kws.len(), 1);
        assert_eq!(kws[0].name, "author");
    }

    #[test]
    fn test_leading_block_comment() {
        let src = "const a = 1;\n/** The thing */\n  thing: 1";
        let start = src.find("thing:").unwrap();
        assert_eq!(leading_comment(src, start).as_deref(), Some(" The thing "));
    }

    #[test]
    fn test_leading_line_comments() {
        let src = "x: 1,\n// first\n// second\ny: 2";
        let start = src.find("y:").unwrap();
        assert_eq!(leading_comment(src, start).as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn test_trailing_comment_on_code_line_is_not_leading() {
        let src = "x: 1, // about x\ny: 2";
        let start = src.find("y:").unwrap();
        assert_eq!(leading_comment(src, start), None);
    }
}
