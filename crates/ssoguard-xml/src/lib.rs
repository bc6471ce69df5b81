#![forbid(unsafe_code)]

//! XML document handling for the ssoguard validation stack.
//!
//! Provides hardened parsing over `roxmltree`, ID registration, recovery of
//! lexical details the parsed tree drops (prefixes, namespace declarations),
//! `NodeSet` operations for canonicalization, and the subtree detach/splice
//! primitives used when assertions are verified one at a time.

pub mod document;
pub mod nodeset;
pub mod tag;
pub mod writer;

pub use nodeset::NodeSet;

/// Return roxmltree parsing options that reject DTDs.
///
/// Identity provider responses are attacker-controlled input and never
/// legitimately carry a document type declaration.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    }
}

/// Parse `text` with [`parsing_options`].
pub fn parse(text: &str) -> Result<roxmltree::Document<'_>, ssoguard_core::Error> {
    roxmltree::Document::parse_with_options(text, parsing_options())
        .map_err(|e| ssoguard_core::Error::XmlParse(e.to_string()))
}
