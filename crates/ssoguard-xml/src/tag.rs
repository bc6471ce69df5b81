#![forbid(unsafe_code)]

//! Lexical details of element start tags.
//!
//! roxmltree resolves names to (namespace, local name) pairs and does not
//! keep the prefixes that were written in the source.  Canonical XML has to
//! reproduce those prefixes exactly, so they are recovered here by scanning
//! the raw start tag of an element.

use ssoguard_core::Error;
use std::collections::BTreeMap;

/// The raw start tag of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag<'input> {
    /// Qualified element name as written (`saml:Assertion`).
    pub qname: &'input str,
    /// Qualified names of the non-namespace attributes, in source order.
    pub attributes: Vec<&'input str>,
    /// Prefixes declared on this tag; `""` stands for a default namespace declaration.
    pub declared_prefixes: Vec<&'input str>,
    /// Byte offset in the document just past the element name.
    pub name_end: usize,
    /// Byte offset in the document just past the closing `>` of the start tag.
    pub end: usize,
    pub self_closing: bool,
}

impl<'input> StartTag<'input> {
    pub fn prefix(&self) -> &'input str {
        prefix_of(self.qname)
    }
}

/// The prefix part of a qualified name, `""` when unprefixed.
pub fn prefix_of(qname: &str) -> &str {
    qname.split_once(':').map_or("", |(prefix, _)| prefix)
}

/// Scan the start tag of an element node.
pub fn start_tag<'input>(node: roxmltree::Node<'_, 'input>) -> Result<StartTag<'input>, Error> {
    if !node.is_element() {
        return Err(Error::XmlStructure("start tag requested for a non-element node".into()));
    }
    let text = node.document().input_text();
    let bytes = text.as_bytes();
    let start = node.range().start;
    if bytes.get(start) != Some(&b'<') {
        return Err(Error::XmlStructure(format!("no start tag at offset {start}")));
    }

    let mut pos = start + 1;
    while pos < bytes.len() && !is_name_end(bytes[pos]) {
        pos += 1;
    }
    let qname = &text[start + 1..pos];
    let name_end = pos;

    let mut attributes = Vec::new();
    let mut declared_prefixes = Vec::new();
    loop {
        pos = skip_whitespace(bytes, pos);
        match bytes.get(pos) {
            None => break,
            Some(b'>') => {
                return Ok(StartTag {
                    qname,
                    attributes,
                    declared_prefixes,
                    name_end,
                    end: pos + 1,
                    self_closing: false,
                });
            }
            Some(b'/') if bytes.get(pos + 1) == Some(&b'>') => {
                return Ok(StartTag {
                    qname,
                    attributes,
                    declared_prefixes,
                    name_end,
                    end: pos + 2,
                    self_closing: true,
                });
            }
            Some(_) => {
                let attr_start = pos;
                while pos < bytes.len() && bytes[pos] != b'=' && !bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                let attr_name = &text[attr_start..pos];
                pos = skip_whitespace(bytes, pos);
                if bytes.get(pos) != Some(&b'=') {
                    break;
                }
                pos = skip_whitespace(bytes, pos + 1);
                let quote = match bytes.get(pos) {
                    Some(q @ (b'"' | b'\'')) => *q,
                    _ => break,
                };
                let value_len = match bytes[pos + 1..].iter().position(|b| *b == quote) {
                    Some(len) => len,
                    None => break,
                };
                pos += value_len + 2;

                if attr_name == "xmlns" {
                    declared_prefixes.push("");
                } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                    declared_prefixes.push(prefix);
                } else {
                    attributes.push(attr_name);
                }
            }
        }
    }

    Err(Error::XmlStructure(format!("malformed start tag for <{qname}>")))
}

/// Pair every attribute of `node` with the qualified name it was written with.
pub fn qualified_attributes<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    tag: &StartTag<'input>,
) -> Result<Vec<(roxmltree::Attribute<'a, 'input>, &'input str)>, Error> {
    let attrs: Vec<_> = node.attributes().collect();
    if attrs.len() != tag.attributes.len() {
        return Err(Error::XmlStructure(format!(
            "attribute count mismatch on <{}>: parsed {}, scanned {}",
            tag.qname,
            attrs.len(),
            tag.attributes.len()
        )));
    }
    Ok(attrs.into_iter().zip(tag.attributes.iter().copied()).collect())
}

/// All namespace bindings in scope at an element, keyed by prefix (`""` = default).
///
/// The implicit `xml` binding is not included.
pub fn in_scope_namespaces(node: roxmltree::Node<'_, '_>) -> BTreeMap<String, String> {
    node.namespaces()
        .filter(|ns| ns.name() != Some("xml") && !ns.uri().is_empty())
        .map(|ns| (ns.name().unwrap_or("").to_owned(), ns.uri().to_owned()))
        .collect()
}

fn is_name_end(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'>' || b == b'/'
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}
