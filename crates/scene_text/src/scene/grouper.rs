//! Grouping of scene text fragments into a descriptive sentence

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, SceneTextError};

/// Separator placed between rendered position groups
pub const GROUP_SEPARATOR: &str = ". ";

/// A piece of text detected in an image, tagged with where it was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneTextItem {
    pub position: String,
    pub text: String,
}

impl SceneTextItem {
    pub fn new(position: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            text: text.into(),
        }
    }

    /// Copy of this item with newlines in `text` replaced by spaces
    pub fn cleaned(&self) -> Self {
        Self {
            position: self.position.clone(),
            text: clean_text(&self.text),
        }
    }
}

/// Texts grouped by position, in first-seen position order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedResult {
    groups: Vec<(String, Vec<String>)>,
    /// Position -> index into `groups`
    index: HashMap<String, usize>,
}

impl GroupedResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text to its position group, opening the group if it is new
    pub fn push(&mut self, position: &str, text: String) {
        match self.index.get(position) {
            Some(&i) => self.groups[i].1.push(text),
            None => {
                self.index.insert(position.to_string(), self.groups.len());
                self.groups.push((position.to_string(), vec![text]));
            }
        }
    }

    pub fn get(&self, position: &str) -> Option<&[String]> {
        self.index
            .get(position)
            .map(|&i| self.groups[i].1.as_slice())
    }

    pub fn positions(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(p, _)| p.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(p, texts)| (p.as_str(), texts.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Per-position sentence templates, each with a single `{}` slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptionTemplates {
    templates: HashMap<String, String>,
}

impl DescriptionTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template for a position
    pub fn with(mut self, position: impl Into<String>, template: impl Into<String>) -> Self {
        self.insert(position, template);
        self
    }

    pub fn insert(&mut self, position: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(position.into(), template.into());
    }

    pub fn get(&self, position: &str) -> Option<&str> {
        self.templates.get(position).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Substitute `rendered` into the position's template
    ///
    /// See `fill_template` for the placeholder rules.
    pub fn format(&self, position: &str, rendered: &str) -> Result<String> {
        let template = self
            .get(position)
            .ok_or_else(|| SceneTextError::UnknownPosition(position.to_string()))?;
        Ok(fill_template(template, rendered))
    }

    /// Load templates from a JSON object file (`{"position": "template"}`)
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DescriptionTemplates {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            templates: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Fill a format-string template
///
/// The first `{}` receives `rendered`, `{{` and `}}` become literal braces.
/// Any other brace, including a second `{}`, is copied as is. `rendered`
/// itself is never unescaped.
pub fn fill_template(template: &str, rendered: &str) -> String {
    let mut out = String::with_capacity(template.len() + rendered.len());
    let mut filled = false;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) if !filled => {
                chars.next();
                out.push_str(rendered);
                filled = true;
            }
            _ => out.push(c),
        }
    }
    out
}

/// Replace newlines with single spaces, leaving other characters alone
pub fn clean_text(text: &str) -> String {
    text.replace('\n', " ")
}

/// Group texts by position, keeping first-seen position order and insertion order within each group
pub fn group_by_position(items: &[SceneTextItem]) -> GroupedResult {
    let mut grouped = GroupedResult::new();
    for item in items {
        grouped.push(&item.position, clean_text(&item.text));
    }
    grouped
}

/// Render texts as a JSON array (`", "` separated, non-ASCII kept literal)
pub fn render_json_array(texts: &[String]) -> Result<String> {
    let elements = texts
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(format!("[{}]", elements.join(", ")))
}

/// Render a group as its JSON array without the wrapping brackets
pub fn render_group(texts: &[String]) -> Result<String> {
    let array = render_json_array(texts)?;
    let inner = array.strip_prefix('[').unwrap_or(&array);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    Ok(inner.to_string())
}

/// Build one sentence from scene text items using per-position templates
///
/// Fails with `UnknownPosition` if any item's position has no template.
pub fn group_and_format(
    items: &[SceneTextItem],
    templates: &DescriptionTemplates,
) -> Result<String> {
    let grouped = group_by_position(items);
    let mut sentences = Vec::with_capacity(grouped.len());
    for (position, texts) in grouped.iter() {
        let rendered = render_group(texts)?;
        sentences.push(templates.format(position, &rendered)?);
    }
    Ok(sentences.join(GROUP_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top_bottom() -> DescriptionTemplates {
        DescriptionTemplates::new()
            .with("top", "T:{}")
            .with("bottom", "B:{}")
    }

    #[test]
    fn test_group_and_format_empty() {
        assert_eq!(group_and_format(&[], &top_bottom()).unwrap(), "");
        assert_eq!(
            group_and_format(&[], &DescriptionTemplates::new()).unwrap(),
            ""
        );
    }

    #[test]
    fn test_group_and_format_single_position() {
        let items = vec![
            SceneTextItem::new("top", "A\nB"),
            SceneTextItem::new("top", "C"),
        ];
        let templates = DescriptionTemplates::new().with("top", "Top says: {}");
        assert_eq!(
            group_and_format(&items, &templates).unwrap(),
            r#"Top says: "A B", "C""#
        );
    }

    #[test]
    fn test_group_and_format_two_positions() {
        let items = vec![
            SceneTextItem::new("top", "X"),
            SceneTextItem::new("bottom", "Y"),
        ];
        assert_eq!(
            group_and_format(&items, &top_bottom()).unwrap(),
            r#"T:"X". B:"Y""#
        );
    }

    #[test]
    fn test_group_and_format_first_seen_order() {
        let items = vec![
            SceneTextItem::new("bottom", "1"),
            SceneTextItem::new("top", "2"),
            SceneTextItem::new("bottom", "3"),
        ];
        assert_eq!(
            group_and_format(&items, &top_bottom()).unwrap(),
            r#"B:"1", "3". T:"2""#
        );
    }

    #[test]
    fn test_group_and_format_unknown_position() {
        let items = vec![
            SceneTextItem::new("top", "X"),
            SceneTextItem::new("left", "Y"),
        ];
        let err = group_and_format(&items, &top_bottom()).unwrap_err();
        assert!(matches!(err, SceneTextError::UnknownPosition(ref p) if p == "left"));
    }

    #[test]
    fn test_group_by_position_preserves_order() {
        let items = vec![
            SceneTextItem::new("a", "1"),
            SceneTextItem::new("b", "2"),
            SceneTextItem::new("a", "3"),
            SceneTextItem::new("c", "4"),
            SceneTextItem::new("b", "5"),
        ];
        let grouped = group_by_position(&items);
        assert_eq!(grouped.positions().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(grouped.get("a").unwrap(), ["1", "3"]);
        assert_eq!(grouped.get("b").unwrap(), ["2", "5"]);
        assert_eq!(grouped.get("c").unwrap(), ["4"]);
        assert!(grouped.get("d").is_none());
    }

    #[test]
    fn test_clean_text_only_touches_newlines() {
        assert_eq!(clean_text("a\nb\n\nc"), "a b  c");
        assert_eq!(clean_text("tab\there  two"), "tab\there  two");
        assert_eq!(clean_text("cr\r\nlf"), "cr\r lf");
    }

    #[test]
    fn test_render_group_keeps_quotes_for_single_text() {
        assert_eq!(render_group(&["foo".to_string()]).unwrap(), r#""foo""#);
    }

    #[test]
    fn test_render_group_strips_only_outer_brackets() {
        let texts = vec!["[sale]".to_string(), "a]b".to_string()];
        assert_eq!(render_group(&texts).unwrap(), r#""[sale]", "a]b""#);
    }

    #[test]
    fn test_render_group_keeps_non_ascii() {
        let texts = vec!["出口".to_string(), "café".to_string()];
        assert_eq!(render_group(&texts).unwrap(), r#""出口", "café""#);
    }

    #[test]
    fn test_render_group_escapes_quotes() {
        let texts = vec![r#"say "hi""#.to_string()];
        assert_eq!(render_group(&texts).unwrap(), r#""say \"hi\"""#);
    }

    #[test]
    fn test_template_without_slot() {
        let templates = DescriptionTemplates::new().with("top", "fixed");
        assert_eq!(templates.format("top", r#""x""#).unwrap(), "fixed");
    }

    #[test]
    fn test_template_escaped_braces() {
        let templates = DescriptionTemplates::new().with("top", "Sign {{x}}: {}");
        assert_eq!(templates.format("top", r#""A""#).unwrap(), r#"Sign {x}: "A""#);
    }

    #[test]
    fn test_fill_template_leaves_rendered_text_alone() {
        assert_eq!(fill_template("{}!", r#""{{a}}""#), r#""{{a}}"!"#);
        assert_eq!(fill_template("{} and {}", "X"), "X and {}");
        assert_eq!(fill_template("{{}}", "X"), "{}");
        assert_eq!(fill_template("lone { and }", "X"), "lone { and }");
    }

    #[test]
    fn test_group_by_position_many_positions() {
        let items: Vec<SceneTextItem> = (0..500)
            .map(|i| SceneTextItem::new(format!("p{}", i % 50), i.to_string()))
            .collect();
        let grouped = group_by_position(&items);

        assert_eq!(grouped.len(), 50);
        assert_eq!(grouped.positions().next(), Some("p0"));
        assert_eq!(grouped.positions().last(), Some("p49"));
        assert_eq!(grouped.get("p7").unwrap().len(), 10);
        assert_eq!(grouped.get("p7").unwrap()[1], "57");
    }

    #[test]
    fn test_templates_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        std::fs::write(&path, r#"{"top": "T:{}", "bottom": "B:{}"}"#).unwrap();

        let templates = DescriptionTemplates::from_json_file(&path).unwrap();
        assert_eq!(templates, top_bottom());
    }

    #[test]
    fn test_scene_text_item_cleaned() {
        let item = SceneTextItem::new("top", "line1\nline2");
        assert_eq!(item.cleaned(), SceneTextItem::new("top", "line1 line2"));
    }
}
