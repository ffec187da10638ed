//! Parcours d'une réponse Execute multidimensionnelle.
//!
//! Le walker ne construit rien : il émet une suite ordonnée d'événements
//! vers un [`CellsetHandler`] (voir [`crate::cellset::CellsetBuilder`] pour
//! l'implémentation fournie).

use std::collections::HashMap;

use xmlasoap::names::{ElementName, MDD_URI, XSI_URI};
use xmlasoap::xml::{
    attribute, attribute_ns, child_elements, children_named, element_text, find_child,
};
use xmltree::Element;

use crate::errors::{Operation, Result, XmlaError};

/// Nom de l'axe de filtre
pub const SLICER_AXIS: &str = "SlicerAxis";

/// Ordinal attribué à l'axe de filtre
pub const SLICER_ORDINAL: i32 = -1;

const OLAP_INFO: ElementName = ElementName::qualified("OlapInfo", MDD_URI);
const AXES_INFO: ElementName = ElementName::qualified("AxesInfo", MDD_URI);
const AXIS_INFO: ElementName = ElementName::qualified("AxisInfo", MDD_URI);
const HIERARCHY_INFO: ElementName = ElementName::qualified("HierarchyInfo", MDD_URI);
const AXES: ElementName = ElementName::qualified("Axes", MDD_URI);
const AXIS: ElementName = ElementName::qualified("Axis", MDD_URI);
const TUPLES: ElementName = ElementName::qualified("Tuples", MDD_URI);
const TUPLE: ElementName = ElementName::qualified("Tuple", MDD_URI);
const MEMBER: ElementName = ElementName::qualified("Member", MDD_URI);
const CELL_DATA: ElementName = ElementName::qualified("CellData", MDD_URI);
const CELL: ElementName = ElementName::qualified("Cell", MDD_URI);
const VALUE: ElementName = ElementName::qualified("Value", MDD_URI);
const FMT_VALUE: ElementName = ElementName::qualified("FmtValue", MDD_URI);
const FONT_SIZE: ElementName = ElementName::qualified("FontSize", MDD_URI);

const INTEGER_TYPES: &[&str] = &[
    "int",
    "integer",
    "long",
    "short",
    "byte",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
];
const DOUBLE_TYPES: &[&str] = &["double", "float"];

/// Valeur décodée d'une cellule
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Double(f64),
    String(String),
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Double(d) => Some(*d),
            CellValue::String(_) => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Double(d) => write!(f, "{}", d),
            CellValue::String(s) => f.write_str(s),
        }
    }
}

/// Membre d'un tuple, tel que renvoyé par le serveur
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberRef {
    pub unique_name: String,
    pub caption: String,
    pub level_unique_name: String,
    pub display_info: Option<u32>,
    /// Toutes les autres balises du membre
    pub properties: HashMap<String, String>,
}

/// Capacités attendues par le walker Execute.
///
/// Les appels arrivent strictement dans cet ordre : tous les `axis_info` /
/// `hier_info`, puis pour chaque axe `axis` suivi de ses `tuple` / `member`,
/// enfin `cell_data_begin` et les `cell`.
pub trait CellsetHandler {
    fn axis_info(&mut self, name: &str, ordinal: i32);
    fn hier_info(&mut self, hierarchy: &str, axis_ordinal: i32, number: usize);
    fn axis(&mut self, name: &str, ordinal: i32);
    fn tuple(&mut self, axis_ordinal: i32, position_ordinal: usize);
    fn member(
        &mut self,
        member: MemberRef,
        axis_ordinal: i32,
        position_ordinal: usize,
        index: usize,
    );
    fn cell_data_begin(&mut self);
    fn cell(
        &mut self,
        ordinal: usize,
        value: Option<CellValue>,
        formatted_value: String,
        font_size: Option<String>,
    );
}

/// Attribution des ordinaux d'axes dans l'ordre du document
#[derive(Debug, Default)]
struct AxisOrdinals {
    next: i32,
}

impl AxisOrdinals {
    fn assign(&mut self, name: &str) -> i32 {
        if name == SLICER_AXIS {
            SLICER_ORDINAL
        } else {
            let ordinal = self.next;
            self.next += 1;
            ordinal
        }
    }
}

fn required<'a>(
    parent: &'a Element,
    name: &ElementName,
    operation: &Operation,
) -> Result<&'a Element> {
    find_child(parent, name).ok_or_else(|| {
        XmlaError::protocol(
            operation,
            format!("<{}> has no {} element", parent.name, name.local),
        )
    })
}

fn name_attribute<'a>(element: &'a Element, operation: &Operation) -> Result<&'a str> {
    attribute(element, "name").ok_or_else(|| {
        XmlaError::protocol(operation, format!("<{}> has no name attribute", element.name))
    })
}

/// Parcourt `root` (mddataset) et pilote `handler`.
///
/// Les événements déjà émis restent acquis si une erreur survient en cours
/// de route.
pub fn walk_execute<H>(root: &Element, handler: &mut H) -> Result<()>
where
    H: CellsetHandler + ?Sized,
{
    let operation = Operation::Execute;

    // 1. OlapInfo / AxesInfo
    let olap_info = required(root, &OLAP_INFO, &operation)?;
    let axes_info = required(olap_info, &AXES_INFO, &operation)?;
    let mut ordinals = AxisOrdinals::default();
    for axis_info in children_named(axes_info, &AXIS_INFO) {
        let name = name_attribute(axis_info, &operation)?;
        let ordinal = ordinals.assign(name);
        handler.axis_info(name, ordinal);

        for (number, hierarchy) in children_named(axis_info, &HIERARCHY_INFO).enumerate() {
            let hierarchy_name = name_attribute(hierarchy, &operation)?;
            handler.hier_info(hierarchy_name, ordinal, number);
        }
    }

    // 2. Axes / Tuples / Members
    let axes = required(root, &AXES, &operation)?;
    let mut ordinals = AxisOrdinals::default();
    for axis in children_named(axes, &AXIS) {
        let name = name_attribute(axis, &operation)?;
        let ordinal = ordinals.assign(name);
        handler.axis(name, ordinal);

        let Some(tuples) = find_child(axis, &TUPLES) else {
            continue;
        };
        for (position, tuple) in children_named(tuples, &TUPLE).enumerate() {
            handler.tuple(ordinal, position);
            for (index, member) in children_named(tuple, &MEMBER).enumerate() {
                let member = parse_member(member);
                handler.member(member, ordinal, position, index);
            }
        }
    }

    // 3. CellData
    handler.cell_data_begin();
    let cell_data = required(root, &CELL_DATA, &operation)?;
    for cell in children_named(cell_data, &CELL) {
        let ordinal = attribute(cell, "CellOrdinal").ok_or_else(|| {
            XmlaError::protocol(&operation, "Cell has no CellOrdinal attribute")
        })?;
        let ordinal = ordinal.trim().parse::<usize>().map_err(|_| {
            XmlaError::protocol(&operation, format!("invalid CellOrdinal '{}'", ordinal))
        })?;

        let value = find_child(cell, &VALUE)
            .map(|v| decode_value(v, &operation))
            .transpose()?;
        let formatted_value = find_child(cell, &FMT_VALUE)
            .map(element_text)
            .unwrap_or_default();
        let font_size = find_child(cell, &FONT_SIZE).map(element_text);

        handler.cell(ordinal, value, formatted_value, font_size);
    }

    Ok(())
}

fn parse_member(member: &Element) -> MemberRef {
    let mut parsed = MemberRef::default();
    for child in child_elements(member) {
        let text = element_text(child);
        match child.name.as_str() {
            "UName" => parsed.unique_name = text,
            "Caption" => parsed.caption = text,
            "LName" => parsed.level_unique_name = text,
            // simple indication d'affichage : une valeur illisible reste en propriété
            "DisplayInfo" => match text.trim().parse::<u32>() {
                Ok(info) => parsed.display_info = Some(info),
                Err(_) if text.trim().is_empty() => {}
                Err(_) => {
                    parsed.properties.insert("DisplayInfo".to_string(), text);
                }
            },
            other => {
                parsed.properties.insert(other.to_string(), text);
            }
        }
    }
    parsed
}

/// Décode une `Value` selon la partie locale de son `xsi:type`.
///
/// Seul l'attribut `type` du namespace XML Schema instance compte.
fn decode_value(value: &Element, operation: &Operation) -> Result<CellValue> {
    let text = element_text(value);
    let declared =
        attribute_ns(value, XSI_URI, "type").map(|t| t.rsplit(':').next().unwrap_or(t));

    match declared {
        Some(t) if INTEGER_TYPES.contains(&t) => text
            .trim()
            .parse::<i64>()
            .map(CellValue::Integer)
            .map_err(|_| XmlaError::protocol(operation, format!("invalid {} value '{}'", t, text))),
        Some(t) if DOUBLE_TYPES.contains(&t) => text
            .trim()
            .parse::<f64>()
            .map(CellValue::Double)
            .map_err(|_| XmlaError::protocol(operation, format!("invalid {} value '{}'", t, text))),
        _ => Ok(CellValue::String(text)),
    }
}
