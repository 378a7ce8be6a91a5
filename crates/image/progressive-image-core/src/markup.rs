//! Minimal element tree used for server rendering, first paint and the
//! in-memory host.
//!
//! Attribute order is preserved so that serializing the same tree always yields
//! the same bytes.

use serde::{Deserialize, Serialize};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &["img", "source", "br", "hr", "input", "meta", "link"];

/// Lowercase ASCII tag name (`[a-z][a-z0-9-]*`) that can hold children.
pub fn is_container_tag(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !VOID_ELEMENTS.contains(&name)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: append (or replace) an attribute.
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append an attribute only when a value is present.
    pub fn attr_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.attr(name, v),
            None => self,
        }
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children.into_iter().map(Node::Element));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Set one declaration inside the inline `style` attribute.
    pub fn set_style(&mut self, property: &str, value: &str) {
        let mut decls = parse_style(self.get_attr("style").unwrap_or_default());
        match decls.iter_mut().find(|(k, _)| k == property) {
            Some(slot) => slot.1 = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        self.set_attr("style", format_style(&decls));
    }

    pub fn style_value(&self, property: &str) -> Option<String> {
        parse_style(self.get_attr("style")?)
            .into_iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Depth-first search including `self`.
    pub fn find<P>(&self, pred: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool + Copy,
    {
        if pred(self) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find(pred))
    }

    pub fn find_mut<P>(&mut self, pred: P) -> Option<&mut Element>
    where
        P: Fn(&Element) -> bool + Copy,
    {
        if pred(self) {
            return Some(self);
        }
        for child in self.children.iter_mut() {
            if let Node::Element(e) = child {
                if let Some(found) = e.find_mut(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn find_marked(&self, marker: &str) -> Option<&Element> {
        self.find(|e| e.has_attr(marker))
    }

    pub fn find_marked_mut(&mut self, marker: &str) -> Option<&mut Element> {
        self.find_mut(|e| e.has_attr(marker))
    }

    /// Visit every element (including `self`) mutably.
    pub fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in self.children.iter_mut() {
            if let Node::Element(e) = child {
                e.for_each_mut(f);
            }
        }
    }

    /// Remove the first descendant carrying `marker`. Returns whether one was removed.
    pub fn remove_marked(&mut self, marker: &str) -> bool {
        if let Some(idx) = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.has_attr(marker)))
        {
            self.children.remove(idx);
            return true;
        }
        self.children.iter_mut().any(|n| match n {
            Node::Element(e) => e.remove_marked(marker),
            Node::Text(_) => false,
        })
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            escape_into(v, true, out);
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_html(out),
                Node::Text(t) => escape_into(t, false, out),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn escape_into(raw: &str, attribute: bool, out: &mut String) {
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

pub(crate) fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}

pub(crate) fn format_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Attributes and load status of an element already present in the page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementSnapshot {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// The browser reports the image request as finished (`HTMLImageElement.complete`).
    pub complete: bool,
}

impl ElementSnapshot {
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn from_element(el: &Element) -> Self {
        Self {
            tag: el.tag.clone(),
            attrs: el.attrs.clone(),
            complete: false,
        }
    }
}

/// Read access to markup that may already exist inside a container.
pub trait MarkupSource {
    /// First element inside the container carrying the `marker` attribute.
    fn find_marked(&self, marker: &str) -> Option<ElementSnapshot>;
}

impl MarkupSource for Element {
    fn find_marked(&self, marker: &str) -> Option<ElementSnapshot> {
        Element::find_marked(self, marker).map(ElementSnapshot::from_element)
    }
}
