#![forbid(unsafe_code)]

//! Shared rendering utilities for C14N output.

use ssoguard_core::{ns, Error};
use ssoguard_xml::tag::{self, StartTag};

/// A namespace declaration to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    /// The prefix ("" for default namespace).
    pub prefix: String,
    /// The namespace URI ("" undeclares the default namespace).
    pub uri: String,
}

impl NsDecl {
    pub fn render(&self, out: &mut Vec<u8>) {
        if self.prefix.is_empty() {
            out.extend_from_slice(b" xmlns=\"");
        } else {
            out.extend_from_slice(b" xmlns:");
            out.extend_from_slice(self.prefix.as_bytes());
            out.extend_from_slice(b"=\"");
        }
        push_escaped(out, &self.uri, Context::Attribute);
        out.push(b'"');
    }
}

impl Ord for NsDecl {
    // Default namespace first, then by prefix.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => self.prefix.cmp(&other.prefix),
        }
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// The namespace URI of the attribute ("" for no namespace).
    pub ns_uri: String,
    pub local_name: String,
    /// The name as written (`prefix:local` or `local`).
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn render(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        out.extend_from_slice(self.qualified_name.as_bytes());
        out.extend_from_slice(b"=\"");
        push_escaped(out, &self.value, Context::Attribute);
        out.push(b'"');
    }

    pub fn prefix(&self) -> &str {
        tag::prefix_of(&self.qualified_name)
    }
}

impl Ord for Attr {
    // Unqualified attributes first by local name, then by (namespace URI, local name).
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.ns_uri.is_empty(), other.ns_uri.is_empty()) {
            (true, true) => self.local_name.cmp(&other.local_name),
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            (false, false) => self
                .ns_uri
                .cmp(&other.ns_uri)
                .then(self.local_name.cmp(&other.local_name)),
        }
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// The attributes of an element with the qualified names they were written with.
pub fn element_attrs(node: roxmltree::Node<'_, '_>, start: &StartTag<'_>) -> Result<Vec<Attr>, Error> {
    let mut attrs = Vec::new();
    for (attr, qname) in tag::qualified_attributes(node, start)? {
        attrs.push(Attr {
            ns_uri: attr.namespace().unwrap_or("").to_owned(),
            local_name: attr.name().to_owned(),
            qualified_name: qname.to_owned(),
            value: attr.value().to_owned(),
        });
    }
    Ok(attrs)
}

/// `xml:*` attributes inherited from ancestors that `node` does not set itself.
///
/// The nearest ancestor wins.
pub fn inherited_xml_attrs(node: roxmltree::Node<'_, '_>, own: &[Attr]) -> Vec<Attr> {
    let mut inherited: Vec<Attr> = Vec::new();
    for ancestor in node.ancestors().skip(1).filter(|n| n.is_element()) {
        for attr in ancestor.attributes() {
            if attr.namespace() != Some(ns::XML) {
                continue;
            }
            let taken = own
                .iter()
                .chain(inherited.iter())
                .any(|a| a.ns_uri == ns::XML && a.local_name == attr.name());
            if !taken {
                inherited.push(Attr {
                    ns_uri: ns::XML.to_owned(),
                    local_name: attr.name().to_owned(),
                    qualified_name: format!("xml:{}", attr.name()),
                    value: attr.value().to_owned(),
                });
            }
        }
    }
    inherited
}

/// Where a run of character data is written; each place escapes a different set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Text,
    Attribute,
    Instruction,
}

fn push_escaped(out: &mut Vec<u8>, s: &str, context: Context) {
    let mut start = 0;
    for (i, b) in s.bytes().enumerate() {
        let entity: &[u8] = match (b, context) {
            (b'\r', _) => b"&#xD;",
            (_, Context::Instruction) => continue,
            (b'&', _) => b"&amp;",
            (b'<', _) => b"&lt;",
            (b'>', Context::Text) => b"&gt;",
            (b'"', Context::Attribute) => b"&quot;",
            (b'\t', Context::Attribute) => b"&#x9;",
            (b'\n', Context::Attribute) => b"&#xA;",
            _ => continue,
        };
        out.extend_from_slice(&s.as_bytes()[start..i]);
        out.extend_from_slice(entity);
        start = i + 1;
    }
    out.extend_from_slice(&s.as_bytes()[start..]);
}

/// Text node content: `&`, `<`, `>` and carriage returns become references.
pub fn render_text(out: &mut Vec<u8>, text: &str) {
    push_escaped(out, text, Context::Text);
}

pub fn render_start_tag(out: &mut Vec<u8>, qname: &str, decls: &[NsDecl], attrs: &[Attr]) {
    out.push(b'<');
    out.extend_from_slice(qname.as_bytes());
    for decl in decls {
        decl.render(out);
    }
    for attr in attrs {
        attr.render(out);
    }
    out.push(b'>');
}

pub fn render_end_tag(out: &mut Vec<u8>, qname: &str) {
    out.extend_from_slice(b"</");
    out.extend_from_slice(qname.as_bytes());
    out.push(b'>');
}

/// Render a comment or processing instruction.
///
/// Outside the document element these are separated from it by a line feed.
pub fn render_misc(node: roxmltree::Node<'_, '_>, out: &mut Vec<u8>) {
    let at_top_level = node.parent().is_some_and(|p| p.is_root());
    if at_top_level && node.prev_siblings().skip(1).any(|n| n.is_element()) {
        out.push(b'\n');
    }

    if node.is_comment() {
        out.extend_from_slice(b"<!--");
        out.extend_from_slice(node.text().unwrap_or("").as_bytes());
        out.extend_from_slice(b"-->");
    } else if let Some(pi) = node.pi() {
        out.extend_from_slice(b"<?");
        out.extend_from_slice(pi.target.as_bytes());
        if let Some(value) = pi.value.filter(|v| !v.is_empty()) {
            out.push(b' ');
            push_escaped(out, value, Context::Instruction);
        }
        out.extend_from_slice(b"?>");
    }

    if at_top_level && node.next_siblings().skip(1).any(|n| n.is_element()) {
        out.push(b'\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(ns_uri: &str, local: &str) -> Attr {
        Attr {
            ns_uri: ns_uri.into(),
            local_name: local.into(),
            qualified_name: local.into(),
            value: String::new(),
        }
    }

    #[test]
    fn test_attr_ordering() {
        let mut attrs = vec![attr("urn:b", "a"), attr("", "z"), attr("urn:a", "z"), attr("", "b")];
        attrs.sort();
        let order: Vec<_> = attrs.iter().map(|a| (a.ns_uri.as_str(), a.local_name.as_str())).collect();
        assert_eq!(order, vec![("", "b"), ("", "z"), ("urn:a", "z"), ("urn:b", "a")]);
    }

    #[test]
    fn test_text_escaping() {
        let mut out = Vec::new();
        render_text(&mut out, "alice@example.com a&b<c>d \"q\" line\rend");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "alice@example.com a&amp;b&lt;c&gt;d \"q\" line&#xD;end"
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let mut out = Vec::new();
        Attr {
            ns_uri: String::new(),
            local_name: "ID".into(),
            qualified_name: "ID".into(),
            value: "a&b\"c<d>\te\nf\rg".into(),
        }
        .render(&mut out);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#" ID="a&amp;b&quot;c&lt;d>&#x9;e&#xA;f&#xD;g""#
        );
    }

    #[test]
    fn test_processing_instruction_keeps_markup() {
        let doc = roxmltree::Document::parse("<?pi a<b&c?><r/>").unwrap();
        let pi = doc.root().first_child().unwrap();
        let mut out = Vec::new();
        render_misc(pi, &mut out);
        assert_eq!(String::from_utf8(out).unwrap(), "<?pi a<b&c?>\n");
    }

    #[test]
    fn test_ns_decl_ordering_and_render() {
        let mut decls = vec![
            NsDecl { prefix: "saml".into(), uri: "urn:s".into() },
            NsDecl { prefix: String::new(), uri: String::new() },
            NsDecl { prefix: "ds".into(), uri: "urn:d".into() },
        ];
        decls.sort();
        let mut out = Vec::new();
        for d in &decls {
            d.render(&mut out);
        }
        assert_eq!(String::from_utf8(out).unwrap(), r#" xmlns="" xmlns:ds="urn:d" xmlns:saml="urn:s""#);
    }
}
