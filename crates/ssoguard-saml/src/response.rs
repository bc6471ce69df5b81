#![forbid(unsafe_code)]

//! Structured model of a `<samlp:Response>`.
//!
//! Values are read as text; timestamps in particular are kept verbatim so
//! the validator alone decides how to interpret them.

use ssoguard_core::{ns, Error};
use ssoguard_xml::document::{find_child_element, find_child_elements, is_element};

use crate::status::StatusCode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub id: String,
    pub destination: Option<String>,
    pub in_response_to: Option<String>,
    pub issue_instant: Option<String>,
    pub issuer: Option<String>,
    pub status: Status,
    pub assertion: Option<Assertion>,
}

/// `<samlp:Status>`: raw code URIs and optional message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub code: String,
    pub sub_code: Option<String>,
    pub message: Option<String>,
}

impl Status {
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_uri(&self.code)
    }

    pub fn sub_status_code(&self) -> Option<StatusCode> {
        self.sub_code.as_deref().and_then(StatusCode::from_uri)
    }

    /// Human-readable account of the status, preferring the IdP's own message.
    pub fn description(&self) -> String {
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            return message.to_owned();
        }
        let top = match self.status_code() {
            Some(code) => format!("{code}: {}", code.description()),
            None => format!("unrecognized status {:?}", self.code),
        };
        match self.sub_status_code() {
            Some(sub) => format!("{top} ({sub}: {})", sub.description()),
            None => top,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assertion {
    pub id: String,
    pub issue_instant: Option<String>,
    pub issuer: Option<String>,
    pub subject: Subject,
    pub conditions: Conditions,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    pub name_id: Option<NameId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameId {
    pub format: Option<String>,
    pub value: String,
}

/// `<saml:Conditions>`; absent bounds are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    pub not_before: String,
    pub not_on_or_after: String,
    pub audiences: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub friendly_name: Option<String>,
    pub values: Vec<String>,
}

impl Response {
    /// Parse a `<samlp:Response>` document.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let doc = ssoguard_xml::parse(xml)?;
        Self::from_element(doc.root_element())
    }

    pub fn from_element(root: roxmltree::Node<'_, '_>) -> Result<Self, Error> {
        if !is_element(root, ns::SAMLP, ns::node::RESPONSE) {
            return Err(Error::XmlStructure(format!(
                "expected samlp:Response, found {}",
                root.tag_name().name()
            )));
        }

        let assertion = match find_child_elements(root, ns::SAML, ns::node::ASSERTION).as_slice() {
            [] => None,
            [one] => Some(parse_assertion(*one)),
            many => {
                return Err(Error::XmlStructure(format!(
                    "expected at most one Assertion, found {}",
                    many.len()
                )))
            }
        };

        Ok(Self {
            id: root.attribute(ns::attr::ID).unwrap_or_default().to_owned(),
            destination: attr(root, ns::attr::DESTINATION),
            in_response_to: attr(root, ns::attr::IN_RESPONSE_TO),
            issue_instant: attr(root, ns::attr::ISSUE_INSTANT),
            issuer: child_text(root, ns::SAML, ns::node::ISSUER),
            status: find_child_element(root, ns::SAMLP, ns::node::STATUS)
                .map(parse_status)
                .unwrap_or_default(),
            assertion,
        })
    }

    /// First attribute of the assertion with the given `Name` or `FriendlyName`.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.assertion
            .as_ref()?
            .attributes
            .iter()
            .find(|a| a.name == name || a.friendly_name.as_deref() == Some(name))
    }

    /// Subject NameID with surrounding whitespace removed; empty when absent.
    pub fn name_id(&self) -> &str {
        self.assertion
            .as_ref()
            .and_then(|a| a.subject.name_id.as_ref())
            .map(|n| n.value.trim())
            .unwrap_or_default()
    }
}

/// Read only the `<samlp:Status>` of a response, without any other checks.
pub fn parse_status_only(xml: &str) -> Result<Status, Error> {
    let doc = ssoguard_xml::parse(xml)?;
    let root = doc.root_element();
    if !is_element(root, ns::SAMLP, ns::node::RESPONSE) {
        return Err(Error::XmlStructure(format!(
            "expected samlp:Response, found {}",
            root.tag_name().name()
        )));
    }
    let status = find_child_element(root, ns::SAMLP, ns::node::STATUS)
        .ok_or_else(|| Error::MissingElement("Status".into()))?;
    Ok(parse_status(status))
}

fn parse_status(node: roxmltree::Node<'_, '_>) -> Status {
    let code_node = find_child_element(node, ns::SAMLP, ns::node::STATUS_CODE);
    Status {
        code: code_node
            .and_then(|c| c.attribute(ns::attr::VALUE))
            .unwrap_or_default()
            .trim()
            .to_owned(),
        sub_code: code_node
            .and_then(|c| find_child_element(c, ns::SAMLP, ns::node::STATUS_CODE))
            .and_then(|c| c.attribute(ns::attr::VALUE))
            .map(|v| v.trim().to_owned()),
        message: child_text(node, ns::SAMLP, ns::node::STATUS_MESSAGE),
    }
}

fn parse_assertion(node: roxmltree::Node<'_, '_>) -> Assertion {
    let name_id = find_child_element(node, ns::SAML, ns::node::SUBJECT)
        .and_then(|s| find_child_element(s, ns::SAML, ns::node::NAME_ID))
        .map(|n| NameId {
            format: attr(n, ns::attr::FORMAT),
            value: text_content(n),
        });

    let conditions = find_child_element(node, ns::SAML, ns::node::CONDITIONS)
        .map(|c| Conditions {
            not_before: c.attribute(ns::attr::NOT_BEFORE).unwrap_or_default().to_owned(),
            not_on_or_after: c.attribute(ns::attr::NOT_ON_OR_AFTER).unwrap_or_default().to_owned(),
            audiences: find_child_elements(c, ns::SAML, ns::node::AUDIENCE_RESTRICTION)
                .into_iter()
                .flat_map(|r| find_child_elements(r, ns::SAML, ns::node::AUDIENCE))
                .map(|a| text_content(a).trim().to_owned())
                .collect(),
        })
        .unwrap_or_default();

    let attributes = find_child_elements(node, ns::SAML, ns::node::ATTRIBUTE_STATEMENT)
        .into_iter()
        .flat_map(|s| find_child_elements(s, ns::SAML, ns::node::ATTRIBUTE))
        .map(|a| Attribute {
            name: a.attribute(ns::attr::NAME).unwrap_or_default().to_owned(),
            friendly_name: attr(a, ns::attr::FRIENDLY_NAME),
            values: find_child_elements(a, ns::SAML, ns::node::ATTRIBUTE_VALUE)
                .into_iter()
                .map(text_content)
                .collect(),
        })
        .collect();

    Assertion {
        id: node.attribute(ns::attr::ID).unwrap_or_default().to_owned(),
        issue_instant: attr(node, ns::attr::ISSUE_INSTANT),
        issuer: child_text(node, ns::SAML, ns::node::ISSUER),
        subject: Subject { name_id },
        conditions,
        attributes,
    }
}

fn attr(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_owned)
}

fn child_text(node: roxmltree::Node<'_, '_>, ns_uri: &str, local_name: &str) -> Option<String> {
    find_child_element(node, ns_uri, local_name).map(|n| text_content(n).trim().to_owned())
}

/// Concatenated text of all descendant text nodes.
fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}
