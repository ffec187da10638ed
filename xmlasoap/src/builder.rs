//! Construction des requêtes XML/A

use crate::names::{SOAP_ENCODING_URI, SOAP_ENVELOPE_URI, XMLA_URI};
use xmltree::{Element, XMLNode};

/// Méthode XML/A portée par le corps de la requête
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlaMethod {
    Discover,
    Execute,
}

impl XmlaMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            XmlaMethod::Discover => "Discover",
            XmlaMethod::Execute => "Execute",
        }
    }

    /// Valeur de l'en-tête HTTP `SOAPAction` (guillemets compris)
    pub fn soap_action(&self) -> String {
        format!(r#""{}:{}""#, XMLA_URI, self.as_str())
    }
}

fn build_soap_envelope_with_body(body_child: Element) -> Result<String, xmltree::Error> {
    // Body
    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(body_child));

    // Envelope
    let mut envelope = Element::new("s:Envelope");
    envelope
        .attributes
        .insert("xmlns:s".to_string(), SOAP_ENVELOPE_URI.to_string());
    envelope
        .attributes
        .insert("s:encodingStyle".to_string(), SOAP_ENCODING_URI.to_string());
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(true)
        .indent_string("  ");
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn text_element(name: &str, text: &str) -> Element {
    let mut elem = Element::new(name);
    elem.children.push(XMLNode::Text(text.to_string()));
    elem
}

/// `<Properties><PropertyList>…</PropertyList></Properties>` et son jumeau
/// `Restrictions/RestrictionList` : une balise par clé, la valeur en texte.
fn parameter_list(type_name: &str, list_name: &str, params: &[(&str, &str)]) -> Element {
    let mut list = Element::new(list_name);
    for (name, value) in params {
        list.children
            .push(XMLNode::Element(text_element(name, value)));
    }

    let mut wrapper = Element::new(type_name);
    wrapper.children.push(XMLNode::Element(list));
    wrapper
}

fn method_element(method: XmlaMethod) -> Element {
    let mut elem = Element::new(method.as_str());
    elem.attributes
        .insert("xmlns".to_string(), XMLA_URI.to_string());
    elem
}

/// Construit une requête SOAP `Discover`
///
/// # Arguments
///
/// * `request_type` - Rowset demandé (ex: "MDSCHEMA_CUBES")
/// * `restrictions` - Filtres ; `None` omet complètement le bloc
///   `Restrictions`, `Some(&[])` produit une `RestrictionList` vide
/// * `properties` - Propriétés XML/A (toujours émises, éventuellement vides)
///
/// # Returns
///
/// XML SOAP formaté en String
pub fn build_discover_request(
    request_type: &str,
    restrictions: Option<&[(&str, &str)]>,
    properties: &[(&str, &str)],
) -> Result<String, xmltree::Error> {
    let mut discover = method_element(XmlaMethod::Discover);
    discover
        .children
        .push(XMLNode::Element(text_element("RequestType", request_type)));

    if let Some(restrictions) = restrictions {
        discover.children.push(XMLNode::Element(parameter_list(
            "Restrictions",
            "RestrictionList",
            restrictions,
        )));
    }
    discover.children.push(XMLNode::Element(parameter_list(
        "Properties",
        "PropertyList",
        properties,
    )));

    build_soap_envelope_with_body(discover)
}

/// Construit une requête SOAP `Execute`
///
/// Le texte de la requête MDX est transmis tel quel dans
/// `Command/Statement`, sans validation.
pub fn build_execute_request(
    statement: &str,
    properties: &[(&str, &str)],
) -> Result<String, xmltree::Error> {
    let mut command = Element::new("Command");
    command
        .children
        .push(XMLNode::Element(text_element("Statement", statement)));

    let mut execute = method_element(XmlaMethod::Execute);
    execute.children.push(XMLNode::Element(command));
    execute.children.push(XMLNode::Element(parameter_list(
        "Properties",
        "PropertyList",
        properties,
    )));

    build_soap_envelope_with_body(execute)
}
