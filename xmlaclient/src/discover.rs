//! Discover : types de requêtes, tables de colonnes par type de métadonnée
//! et parcours des lignes d'une réponse.

use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;

use xmlasoap::names::{ElementName, ROWS_URI};
use xmlasoap::xml::{child_elements, children_named, element_text};
use xmltree::Element;

use crate::dialect::Dialect;

/// Request types Discover utilisés par le client
pub mod request_types {
    pub const DISCOVER_DATASOURCES: &str = "DISCOVER_DATASOURCES";
    pub const DISCOVER_PROPERTIES: &str = "DISCOVER_PROPERTIES";
    pub const DBSCHEMA_CATALOGS: &str = "DBSCHEMA_CATALOGS";
    pub const MDSCHEMA_CUBES: &str = "MDSCHEMA_CUBES";
    pub const MDSCHEMA_DIMENSIONS: &str = "MDSCHEMA_DIMENSIONS";
    pub const MDSCHEMA_HIERARCHIES: &str = "MDSCHEMA_HIERARCHIES";
    pub const MDSCHEMA_LEVELS: &str = "MDSCHEMA_LEVELS";
    pub const MDSCHEMA_MEMBERS: &str = "MDSCHEMA_MEMBERS";
    pub const MDSCHEMA_PROPERTIES: &str = "MDSCHEMA_PROPERTIES";
    pub const SAP_VARIABLES: &str = "SAP_VARIABLES";
}

const ROW: ElementName = ElementName::qualified("row", ROWS_URI);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    DataSource,
    DataSourceProperty,
    Catalog,
    Cube,
    Dimension,
    Hierarchy,
    Level,
    Member,
    Property,
    Variable,
}

/// Rôle d'une colonne dans un enregistrement de métadonnée
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Name,
    Caption,
    UniqueName,
    /// Nom, conservé aussi comme propriété
    NameAndProperty,
}

type TagTable = &'static [(&'static str, FieldRole)];

const DATASOURCE_TAGS: TagTable = &[];
const DATASOURCE_PROPERTY_TAGS: TagTable = &[("PropertyName", FieldRole::NameAndProperty)];
const CATALOG_TAGS: TagTable = &[("CATALOG_NAME", FieldRole::Name)];
const CUBE_TAGS: TagTable = &[("CUBE_NAME", FieldRole::Name)];
const DIMENSION_TAGS: TagTable = &[
    ("DIMENSION_NAME", FieldRole::Name),
    ("DIMENSION_CAPTION", FieldRole::Caption),
    ("DIMENSION_UNIQUE_NAME", FieldRole::UniqueName),
];
const HIERARCHY_TAGS: TagTable = &[
    ("HIERARCHY_NAME", FieldRole::Name),
    ("HIERARCHY_CAPTION", FieldRole::Caption),
    ("HIERARCHY_UNIQUE_NAME", FieldRole::UniqueName),
];
const LEVEL_TAGS: TagTable = &[
    ("LEVEL_NAME", FieldRole::Name),
    ("LEVEL_CAPTION", FieldRole::Caption),
    ("LEVEL_UNIQUE_NAME", FieldRole::UniqueName),
];
const MEMBER_TAGS: TagTable = &[
    ("MEMBER_NAME", FieldRole::Name),
    ("MEMBER_CAPTION", FieldRole::Caption),
    ("MEMBER_UNIQUE_NAME", FieldRole::UniqueName),
];
const PROPERTY_TAGS: TagTable = &[
    ("PROPERTY_NAME", FieldRole::Name),
    ("PROPERTY_CAPTION", FieldRole::Caption),
];
const VARIABLE_TAGS: TagTable = &[
    ("VARIABLE_NAME", FieldRole::Name),
    ("VARIABLE_CAPTION", FieldRole::Caption),
];

impl MetadataKind {
    /// Colonnes promues en champs pour ce type
    pub fn tag_table(&self) -> TagTable {
        match self {
            MetadataKind::DataSource => DATASOURCE_TAGS,
            MetadataKind::DataSourceProperty => DATASOURCE_PROPERTY_TAGS,
            MetadataKind::Catalog => CATALOG_TAGS,
            MetadataKind::Cube => CUBE_TAGS,
            MetadataKind::Dimension => DIMENSION_TAGS,
            MetadataKind::Hierarchy => HIERARCHY_TAGS,
            MetadataKind::Level => LEVEL_TAGS,
            MetadataKind::Member => MEMBER_TAGS,
            MetadataKind::Property => PROPERTY_TAGS,
            MetadataKind::Variable => VARIABLE_TAGS,
        }
    }

    pub fn role_of(&self, tag: &str) -> Option<FieldRole> {
        self.tag_table()
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, role)| *role)
    }

    /// Request type Discover qui renvoie ce type de ligne
    pub fn request_type(&self) -> &'static str {
        use request_types::*;
        match self {
            MetadataKind::DataSource => DISCOVER_DATASOURCES,
            MetadataKind::DataSourceProperty => DISCOVER_PROPERTIES,
            MetadataKind::Catalog => DBSCHEMA_CATALOGS,
            MetadataKind::Cube => MDSCHEMA_CUBES,
            MetadataKind::Dimension => MDSCHEMA_DIMENSIONS,
            MetadataKind::Hierarchy => MDSCHEMA_HIERARCHIES,
            MetadataKind::Level => MDSCHEMA_LEVELS,
            MetadataKind::Member => MDSCHEMA_MEMBERS,
            MetadataKind::Property => MDSCHEMA_PROPERTIES,
            MetadataKind::Variable => SAP_VARIABLES,
        }
    }
}

/// Une ligne de métadonnée, indépendante du dialecte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub kind: MetadataKind,
    pub name: Option<String>,
    pub caption: Option<String>,
    pub unique_name: Option<String>,
    /// Colonnes non promues, par nom de balise
    pub properties: HashMap<String, String>,
}

impl MetadataRow {
    pub fn new(kind: MetadataKind) -> Self {
        Self {
            kind,
            name: None,
            caption: None,
            unique_name: None,
            properties: HashMap::new(),
        }
    }

    pub fn property(&self, column: &str) -> Option<&str> {
        self.properties.get(column).map(String::as_str)
    }

    /// Caption, ou nom à défaut
    pub fn label(&self) -> Option<&str> {
        self.caption.as_deref().or(self.name.as_deref())
    }
}

impl fmt::Display for MetadataRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.kind, self.name.as_deref().unwrap_or("?"))?;
        if let Some(unique_name) = &self.unique_name {
            write!(f, " [{}]", unique_name)?;
        }
        if let Some(caption) = &self.caption {
            write!(f, " \"{}\"", caption)?;
        }
        Ok(())
    }
}

/// Convertit un élément `row` en enregistrement selon la table de `kind`.
///
/// Chaque colonne est lue dans l'ordre du document ; une balise répétée
/// écrase la précédente.
pub fn row_to_record(kind: MetadataKind, row: &Element) -> MetadataRow {
    let mut record = MetadataRow::new(kind);
    for column in child_elements(row) {
        let value = element_text(column);
        match kind.role_of(&column.name) {
            Some(FieldRole::Name) => record.name = Some(value),
            Some(FieldRole::Caption) => record.caption = Some(value),
            Some(FieldRole::UniqueName) => record.unique_name = Some(value),
            Some(FieldRole::NameAndProperty) => {
                record.name = Some(value.clone());
                record.properties.insert(column.name.clone(), value);
            }
            None => {
                record.properties.insert(column.name.clone(), value);
            }
        }
    }
    record
}

/// Consommateur des lignes d'une réponse Discover
pub trait RowHandler {
    fn handle_row(&mut self, row: &Element, dialect: Dialect);
}

impl<F> RowHandler for F
where
    F: FnMut(&Element, Dialect),
{
    fn handle_row(&mut self, row: &Element, dialect: Dialect) {
        self(row, dialect)
    }
}

/// Collecte les lignes d'un type de métadonnée
#[derive(Debug)]
pub struct MetadataCollector {
    kind: MetadataKind,
    rows: Vec<MetadataRow>,
}

impl MetadataCollector {
    pub fn new(kind: MetadataKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn into_rows(self) -> Vec<MetadataRow> {
        self.rows
    }
}

impl RowHandler for MetadataCollector {
    fn handle_row(&mut self, row: &Element, _dialect: Dialect) {
        self.rows.push(row_to_record(self.kind, row));
    }
}

/// Fusionne toutes les colonnes de toutes les lignes dans une seule table
/// (les lignes suivantes écrasent les précédentes)
#[derive(Debug, Default)]
pub struct PropertyMapCollector {
    rows: usize,
    properties: HashMap<String, String>,
}

impl PropertyMapCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.properties
    }
}

impl RowHandler for PropertyMapCollector {
    fn handle_row(&mut self, row: &Element, _dialect: Dialect) {
        self.rows += 1;
        for column in child_elements(row) {
            self.properties
                .insert(column.name.clone(), element_text(column));
        }
    }
}

/// Passe chaque `row` de `root` au handler, dans l'ordre du document.
///
/// Renvoie le nombre de lignes vues.
pub fn walk_discover<H>(root: &Element, dialect: Dialect, handler: &mut H) -> usize
where
    H: RowHandler + ?Sized,
{
    let mut count = 0;
    for row in children_named(root, &ROW) {
        handler.handle_row(row, dialect);
        count += 1;
    }
    count
}

/// Valeur TREE_OP pour MDSCHEMA_MEMBERS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeOp(u32);

impl TreeOp {
    pub const CHILDREN: TreeOp = TreeOp(1);
    pub const SIBLINGS: TreeOp = TreeOp(2);
    pub const PARENT: TreeOp = TreeOp(4);
    pub const SELF: TreeOp = TreeOp(8);
    pub const DESCENDANTS: TreeOp = TreeOp(16);
    pub const ANCESTORS: TreeOp = TreeOp(32);

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: TreeOp) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TreeOp {
    type Output = TreeOp;

    fn bitor(self, rhs: TreeOp) -> TreeOp {
        TreeOp(self.0 | rhs.0)
    }
}
