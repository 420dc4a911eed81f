//! Text and context extraction from the document.
//!
//! Every function here is a pure read of a [`Document`]; masking is applied
//! afterwards by the recorder.

use scry_core::host::{Document, NodeId};
use scry_core::{CaptureError, CaptureResult};
use scry_privacy::ElementRole;
use std::collections::BTreeMap;
use url::Url;

use crate::types::DomNode;

/// Tags whose click, keydown and change events are recorded.
pub const CAPTURED_TAGS: &[&str] = &["button", "a", "select", "textarea", "input"];

/// Attributes copied into DOM context nodes.
pub const SAFE_ATTRIBUTES: &[&str] = &["id", "class", "name", "type", "role", "aria-label"];

/// Target plus at most this many ancestors.
pub const MAX_DOM_CONTEXT: usize = 6;

pub fn is_captured_tag(tag: &str) -> bool {
    CAPTURED_TAGS.contains(&tag)
}

pub fn element_role(doc: &Document, id: NodeId) -> CaptureResult<ElementRole> {
    let tag = doc.tag_name(id).ok_or(CaptureError::NotAnElement(id))?;
    Ok(ElementRole::from_tag(tag, doc.attribute(id, "type")))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

// Child node text, skipping nested selects so their options don't leak in.
fn label_text(doc: &Document, label: NodeId) -> Option<String> {
    let parts: Vec<String> = doc
        .child_nodes(label)
        .iter()
        .filter(|child| doc.node_name(**child) != Some("select"))
        .map(|child| doc.text_content(*child).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    let text = parts.join(" ");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Accessible label of an input, select or textarea.
///
/// Tries, in order: a wrapping `<label>`, `<label for=id>`, `aria-label`, and
/// the element named by `aria-labelledby`.
pub fn find_label(doc: &Document, id: NodeId) -> Option<String> {
    if !matches!(doc.tag_name(id), Some("input" | "select" | "textarea")) {
        return None;
    }

    if let Some(text) = doc.closest(id, "label").and_then(|label| label_text(doc, label)) {
        return Some(text);
    }

    if let Some(element_id) = doc.attribute(id, "id").filter(|v| !v.is_empty()) {
        if let Some(text) = doc.label_for(element_id).and_then(|label| label_text(doc, label)) {
            return Some(text);
        }
    }

    if let Some(aria_label) = doc.attribute(id, "aria-label").filter(|v| !v.is_empty()) {
        return Some(aria_label.trim().to_string());
    }

    let labelled_by = doc.attribute(id, "aria-labelledby").filter(|v| !v.is_empty())?;
    let referenced = doc.element_by_id(labelled_by)?;
    let text = doc.text_content(referenced);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn label_or_placeholder(doc: &Document, id: NodeId) -> Option<String> {
    find_label(doc, id).or_else(|| non_empty(doc.attribute(id, "placeholder")))
}

fn resolve_attribute(doc: &Document, id: NodeId, name: &str, location: &Url) -> String {
    match doc.attribute(id, name) {
        Some(raw) => location
            .join(raw)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => String::new(),
    }
}

/// Unmasked text describing a click on `id`.
pub fn click_text(doc: &Document, id: NodeId, role: &ElementRole, location: &Url) -> Option<String> {
    match role {
        ElementRole::Input { .. } | ElementRole::TextArea => label_or_placeholder(doc, id),
        ElementRole::Select => find_label(doc, id).or_else(|| {
            let value = doc.value(id).unwrap_or_default();
            let selected = doc.selected_option_text(id).unwrap_or_default();
            Some(format!("{} ({})", value, selected))
        }),
        ElementRole::Button => Some(doc.inner_text(id)),
        ElementRole::Anchor => Some(resolve_attribute(doc, id, "href", location)),
        ElementRole::Image => Some(resolve_attribute(doc, id, "src", location)),
        ElementRole::Other => None,
    }
}

/// Unmasked text describing a key press in `id`.
pub fn keydown_text(doc: &Document, id: NodeId, role: &ElementRole) -> Option<String> {
    match role {
        ElementRole::Input { .. } | ElementRole::TextArea => label_or_placeholder(doc, id),
        _ => None,
    }
}

/// Unmasked text describing a change of `id`.
pub fn change_text(doc: &Document, id: NodeId, role: &ElementRole) -> Option<String> {
    match role {
        ElementRole::Select => doc.selected_option_text(id),
        _ => None,
    }
}

pub fn dom_node(doc: &Document, id: NodeId) -> Option<DomNode> {
    let tag = doc.tag_name(id)?.to_string();
    let attrs: BTreeMap<String, String> = SAFE_ATTRIBUTES
        .iter()
        .filter_map(|name| {
            doc.attribute(id, name)
                .filter(|v| !v.is_empty())
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect();
    Some(DomNode { tag, attrs })
}

/// `id` followed by its ancestors, nearest first.
pub fn dom_context(doc: &Document, id: NodeId) -> Vec<DomNode> {
    std::iter::successors(Some(id), |current| doc.parent_element(*current))
        .take(MAX_DOM_CONTEXT)
        .filter_map(|node| dom_node(doc, node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Url {
        Url::parse("https://shop.test/products/").unwrap()
    }

    #[test]
    fn test_wrapping_label_skips_select_options() {
        let mut doc = Document::new();
        let label = doc.create_element_with(doc.body(), "label", &[]);
        doc.append_text(label, "  Country ");
        let select = doc.create_element_with(label, "select", &[]);
        let option = doc.create_element_with(select, "option", &[("value", "pt")]);
        doc.append_text(option, "Portugal");
        doc.append_text(label, " (required)");

        assert_eq!(find_label(&doc, select).as_deref(), Some("Country (required)"));
    }

    #[test]
    fn test_label_for_then_aria_fallbacks() {
        let mut doc = Document::new();
        let body = doc.body();
        let label = doc.create_element_with(body, "label", &[("for", "q")]);
        doc.append_text(label, "Search");
        let search = doc.create_element_with(body, "input", &[("id", "q")]);
        let aria = doc.create_element_with(body, "input", &[("aria-label", " Quantity ")]);
        let heading = doc.create_element_with(body, "h2", &[("id", "billing")]);
        doc.append_text(heading, " Billing address ");
        let labelled = doc.create_element_with(body, "textarea", &[("aria-labelledby", "billing")]);
        let bare = doc.create_element_with(body, "input", &[("placeholder", "Name")]);

        assert_eq!(find_label(&doc, search).as_deref(), Some("Search"));
        assert_eq!(find_label(&doc, aria).as_deref(), Some("Quantity"));
        assert_eq!(find_label(&doc, labelled).as_deref(), Some("Billing address"));
        assert_eq!(find_label(&doc, bare), None);
        assert_eq!(label_or_placeholder(&doc, bare).as_deref(), Some("Name"));
    }

    #[test]
    fn test_click_text_per_role() {
        let mut doc = Document::new();
        let body = doc.body();
        let link = doc.create_element_with(body, "a", &[("href", "../sale?id=3")]);
        let button = doc.create_element_with(body, "button", &[]);
        doc.append_text(button, " Add   to cart ");
        let select = doc.create_element_with(body, "select", &[]);
        for (value, text) in [("s", "Small"), ("m", "Medium")] {
            let option = doc.create_element_with(select, "option", &[("value", value)]);
            doc.append_text(option, text);
        }
        doc.select_option(select, 1);

        let loc = location();
        let text = |doc: &Document, id| click_text(doc, id, &element_role(doc, id).unwrap(), &loc);
        assert_eq!(text(&doc, link).as_deref(), Some("https://shop.test/sale?id=3"));
        assert_eq!(text(&doc, button).as_deref(), Some("Add to cart"));
        assert_eq!(text(&doc, select).as_deref(), Some("m (Medium)"));
        assert_eq!(
            change_text(&doc, select, &ElementRole::Select).as_deref(),
            Some("Medium")
        );
    }

    #[test]
    fn test_dom_context_is_capped_and_filters_attributes() {
        let mut doc = Document::new();
        let mut parent = doc.body();
        for depth in 0..8 {
            let class = format!("level-{}", depth);
            parent = doc.create_element_with(parent, "div", &[("class", class.as_str()), ("style", "color: red")]);
        }
        let button = doc.create_element_with(parent, "button", &[("id", "go"), ("data-secret", "x"), ("name", "")]);

        let context = dom_context(&doc, button);
        assert_eq!(context.len(), MAX_DOM_CONTEXT);
        assert_eq!(context[0].tag, "button");
        assert_eq!(
            context[0].attrs,
            BTreeMap::from([("id".to_string(), "go".to_string())])
        );
        assert_eq!(context[1].attrs.get("class").map(String::as_str), Some("level-7"));
        assert!(context[1].attrs.get("style").is_none());
    }

    #[test]
    fn test_element_role_rejects_text_nodes() {
        let mut doc = Document::new();
        let text = doc.append_text(doc.body(), "hello").unwrap();
        assert!(matches!(element_role(&doc, text), Err(CaptureError::NotAnElement(_))));
    }
}
