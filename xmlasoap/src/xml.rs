//! Helpers de navigation dans un arbre `xmltree`
//!
//! Les nœuds texte (indentation, espaces) sont ignorés partout : seules les
//! balises comptent.

use crate::names::ElementName;
use xmltree::{Element, XMLNode};

/// Enfants directs de type élément, dans l'ordre du document
pub fn child_elements(parent: &Element) -> impl Iterator<Item = &Element> {
    parent.children.iter().filter_map(XMLNode::as_element)
}

/// Enfants directs portant le nom qualifié `name`, dans l'ordre du document
pub fn children_named<'a>(
    parent: &'a Element,
    name: &'a ElementName,
) -> impl Iterator<Item = &'a Element> + 'a {
    child_elements(parent).filter(move |e| name.matches(e))
}

/// Premier enfant direct portant le nom qualifié `name`
pub fn find_child<'a>(parent: &'a Element, name: &ElementName) -> Option<&'a Element> {
    child_elements(parent).find(|e| name.matches(e))
}

/// Premier enfant direct dont le nom local vaut `local`, quel que soit son namespace
pub fn find_child_local<'a>(parent: &'a Element, local: &str) -> Option<&'a Element> {
    child_elements(parent).find(|e| e.name == local)
}

/// Texte d'un élément (chaîne vide si l'élément n'a pas de texte)
pub fn element_text(element: &Element) -> String {
    element
        .get_text()
        .map(|t| t.into_owned())
        .unwrap_or_default()
}

/// Valeur d'un attribut sans préfixe
pub fn attribute<'a>(element: &'a Element, local: &str) -> Option<&'a str> {
    element.attributes.get(local).map(String::as_str)
}

/// Valeur de l'attribut `local` appartenant au namespace `namespace`.
///
/// Le préfixe de la clé (`xsi:type`) est résolu contre les namespaces en
/// vigueur sur l'élément ; l'arbre doit venir de [`crate::parse_element`].
pub fn attribute_ns<'a>(element: &'a Element, namespace: &str, local: &str) -> Option<&'a str> {
    let scope = element.namespaces.as_ref()?;
    element.attributes.iter().find_map(|(key, value)| {
        let (prefix, key_local) = key.split_once(':')?;
        (key_local == local && scope.get(prefix) == Some(namespace)).then_some(value.as_str())
    })
}
