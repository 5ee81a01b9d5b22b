//! CycloneDX bill-of-materials queries.
//!
//! Elements are matched by local name, so documents with or without the
//! CycloneDX namespace read the same.

use roxmltree::{Document, Node};

pub use roxmltree::Error as ParseError;

/// Outcome of looking up one dependency's licences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseLookup {
    /// The component's `<licenses>` element, as it appears in the document.
    Found(String),
    /// The component exists but carries no licence entries.
    Unlicensed,
    NotFound,
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

/// `<component>` elements under the top-level `<components>`.
fn components<'a, 'input>(doc: &'a Document<'input>) -> Vec<Node<'a, 'input>> {
    child(doc.root_element(), "components")
        .map(|list| elements(list).collect())
        .unwrap_or_default()
}

fn component_name<'a>(component: Node<'a, '_>) -> Option<&'a str> {
    child(component, "name").and_then(|n| n.text())
}

/// Names of every listed component, in document order.
pub fn dependency_names(xml: &str) -> Result<Vec<String>, ParseError> {
    let doc = Document::parse(xml)?;
    Ok(components(&doc)
        .into_iter()
        .filter_map(component_name)
        .map(str::to_string)
        .collect())
}

/// Find the first component whose name equals `dependency` lower-cased.
pub fn dependency_licenses(xml: &str, dependency: &str) -> Result<LicenseLookup, ParseError> {
    let doc = Document::parse(xml)?;
    let wanted = dependency.to_lowercase();

    let Some(component) = components(&doc)
        .into_iter()
        .find(|c| component_name(*c) == Some(wanted.as_str()))
    else {
        return Ok(LicenseLookup::NotFound);
    };

    Ok(match child(component, "licenses") {
        Some(licenses) if elements(licenses).next().is_some() => {
            LicenseLookup::Found(xml[licenses.range()].to_string())
        }
        _ => LicenseLookup::Unlicensed,
    })
}
