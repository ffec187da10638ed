//! Résultats tabulaires (drillthrough).

use std::collections::HashMap;

use xmlasoap::names::{ElementName, ROWS_URI};
use xmlasoap::xml::{child_elements, children_named, element_text};
use xmltree::Element;

use crate::errors::{Operation, Result, XmlaError};

const ROW: ElementName = ElementName::qualified("row", ROWS_URI);

/// Valeurs d'une ligne, par nom de colonne. Les colonnes nulles sont absentes.
pub type DrillRow = HashMap<String, String>;

/// Consommateur d'un résultat drillthrough
pub trait DrillthroughReceiver {
    /// Colonnes découvertes, nom → position
    fn drill_header(&mut self, columns: HashMap<String, usize>);
    fn drill_rows(&mut self, rows: Vec<DrillRow>);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrillthroughResult {
    pub columns: HashMap<String, usize>,
    pub rows: Vec<DrillRow>,
}

impl DrillthroughResult {
    /// Noms de colonnes dans l'ordre de leur position
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<(&str, usize)> = self
            .columns
            .iter()
            .map(|(name, position)| (name.as_str(), *position))
            .collect();
        names.sort_by_key(|(_, position)| *position);
        names.into_iter().map(|(name, _)| name).collect()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

impl DrillthroughReceiver for DrillthroughResult {
    fn drill_header(&mut self, columns: HashMap<String, usize>) {
        self.columns = columns;
    }

    fn drill_rows(&mut self, rows: Vec<DrillRow>) {
        self.rows = rows;
    }
}

/// Lit les lignes de `root` (rowset).
///
/// Les colonnes sont découvertes au fil des lignes : une balise inconnue
/// reçoit la position suivante.
pub fn walk_drillthrough(root: &Element) -> Result<DrillthroughResult> {
    let mut rows_iter = children_named(root, &ROW).peekable();
    if rows_iter.peek().is_none() {
        return Err(XmlaError::protocol(
            &Operation::ExecuteDrillthrough,
            "Drillthrough result has no row element",
        ));
    }

    let mut columns: HashMap<String, usize> = HashMap::new();
    let mut rows = Vec::new();
    for row in rows_iter {
        let mut values = DrillRow::new();
        for column in child_elements(row) {
            if !columns.contains_key(&column.name) {
                let next = columns.len();
                columns.insert(column.name.clone(), next);
            }
            values.insert(column.name.clone(), element_text(column));
        }
        rows.push(values);
    }

    Ok(DrillthroughResult { columns, rows })
}
