use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref SCRIPT_REGEX: Regex =
        Regex::new(r"(?is)<script\b([^>]*)>([\s\S]*?)</script\s*>").unwrap();
    static ref STYLE_REGEX: Regex =
        Regex::new(r"(?is)<style\b[^>]*>[\s\S]*?</style\s*>").unwrap();
    static ref TEMPLATE_OPEN_REGEX: Regex = Regex::new(r"(?i)<template\b[^>]*>").unwrap();
    static ref TEMPLATE_CLOSE_REGEX: Regex = Regex::new(r"(?i)</template\s*>").unwrap();
    static ref ATTR_REGEX: Regex =
        Regex::new(r#"(?i)([a-z0-9:@-]+)(?:=(?:"([^"]*)"|'([^']*)'|([^>\s]+)))?"#).unwrap();
}

/// One top-level block of a single-file component.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<'s> {
    pub content: &'s str,
    /// Byte offset of `content` within the whole file.
    pub offset: usize,
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections<'s> {
    pub template: Option<Section<'s>>,
    pub script: Option<Section<'s>>,
}

/// Splits a component file into its template and script blocks.
///
/// A file without any `<template>` or `<script>` block is taken to be a
/// plain script module.
pub fn split(source: &str) -> Sections<'_> {
    let script = SCRIPT_REGEX.captures(source).and_then(|caps| {
        let body = caps.get(2)?;
        Some(Section {
            content: body.as_str(),
            offset: body.start(),
            attributes: parse_attributes(caps.get(1).map(|m| m.as_str()).unwrap_or("")),
        })
    });

    let masked = mask_blocks(source);
    let template = TEMPLATE_OPEN_REGEX.find(&masked).and_then(|open| {
        let close = TEMPLATE_CLOSE_REGEX
            .find_iter(&masked)
            .filter(|m| m.start() >= open.end())
            .last()?;
        Some(Section {
            content: &source[open.end()..close.start()],
            offset: open.end(),
            attributes: parse_attributes(
                masked[open.start()..open.end()]
                    .trim_start_matches(|c: char| c != ' ' && c != '>')
                    .trim_end_matches('>'),
            ),
        })
    });

    if script.is_none() && template.is_none() && !looks_like_markup(source) {
        return Sections {
            template: None,
            script: Some(Section {
                content: source,
                offset: 0,
                attributes: HashMap::new(),
            }),
        };
    }

    Sections { template, script }
}

/// Replaces script and style blocks with spaces so markup searches skip
/// them without shifting offsets.
fn mask_blocks(source: &str) -> String {
    let mut masked = source.to_string();
    for re in [&*SCRIPT_REGEX, &*STYLE_REGEX] {
        for m in re.find_iter(source) {
            masked.replace_range(m.start()..m.end(), &" ".repeat(m.end() - m.start()));
        }
    }
    masked
}

fn looks_like_markup(source: &str) -> bool {
    source.trim_start().starts_with('<')
}

fn parse_attributes(attr_string: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for caps in ATTR_REGEX.captures_iter(attr_string) {
        if let Some(name) = caps.get(1) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "true".to_string());
            attributes.insert(name.as_str().to_string(), value);
        }
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sections() {
        let src = "<template>\n  <div><template v-if=\"x\"><slot/></template></div>\n</template>\n<script lang=\"ts\">export default {}</script>";
        let sections = split(src);
        let template = sections.template.unwrap();
        assert!(template.content.contains("<template v-if=\"x\">"));
        assert!(template.content.trim_end().ends_with("</div>"));
        let script = sections.script.unwrap();
        assert_eq!(script.content, "export default {}");
        assert_eq!(script.attributes.get("lang"), Some(&"ts".to_string()));
        assert_eq!(&src[script.offset..script.offset + 6], "export");
    }

    #[test]
    fn test_template_inside_script_is_ignored() {
        let src = "<script>const t = '<template>x</template>';</script>";
        let sections = split(src);
        assert!(sections.template.is_none());
        assert!(sections.script.is_some());
    }

    #[test]
    fn test_plain_script_module() {
        let src = "export default { name: 'plain' }";
        let sections = split(src);
        assert!(sections.template.is_none());
        assert_eq!(sections.script.unwrap().content, src);
    }

    #[test]
    fn test_template_only() {
        let sections = split("<template><p>hi</p></template>");
        assert!(sections.script.is_none());
        assert_eq!(sections.template.unwrap().content, "<p>hi</p>");
    }
}
