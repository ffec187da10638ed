//! Cellset en mémoire, construit à partir des événements du walker Execute.

use std::collections::BTreeMap;

use tracing::warn;

use crate::execute::{CellValue, CellsetHandler, MemberRef, SLICER_ORDINAL};

/// Une position (tuple) sur un axe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub ordinal: usize,
    pub members: Vec<MemberRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellsetAxis {
    pub name: String,
    pub ordinal: i32,
    pub hierarchies: Vec<String>,
    pub positions: Vec<Position>,
}

impl CellsetAxis {
    fn new(name: &str, ordinal: i32) -> Self {
        Self {
            name: name.to_string(),
            ordinal,
            hierarchies: Vec::new(),
            positions: Vec::new(),
        }
    }

    pub fn is_slicer(&self) -> bool {
        self.ordinal == SLICER_ORDINAL
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub ordinal: usize,
    pub value: Option<CellValue>,
    pub formatted_value: String,
    pub font_size: Option<String>,
}

/// Résultat multidimensionnel complet.
///
/// Les cellules sont indexées par ordinal ; l'espace des ordinaux peut être
/// creux.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cellset {
    axes: Vec<CellsetAxis>,
    slicer: Option<CellsetAxis>,
    cells: BTreeMap<usize, Cell>,
}

impl Cellset {
    /// Axes hors filtre, triés par ordinal
    pub fn axes(&self) -> &[CellsetAxis] {
        &self.axes
    }

    pub fn axis(&self, ordinal: i32) -> Option<&CellsetAxis> {
        if ordinal == SLICER_ORDINAL {
            return self.slicer.as_ref();
        }
        self.axes.iter().find(|a| a.ordinal == ordinal)
    }

    pub fn slicer(&self) -> Option<&CellsetAxis> {
        self.slicer.as_ref()
    }

    pub fn cell(&self, ordinal: usize) -> Option<&Cell> {
        self.cells.get(&ordinal)
    }

    /// Cellules présentes, par ordinal croissant
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Ordinal de la cellule aux coordonnées `coordinates` (une par axe).
    ///
    /// `Σ pos_i · Π len(axe_j), j < i` ; `None` si une coordonnée déborde ou
    /// si le nombre de coordonnées ne correspond pas au nombre d'axes.
    pub fn ordinal_of(&self, coordinates: &[usize]) -> Option<usize> {
        if coordinates.len() != self.axes.len() {
            return None;
        }
        let mut ordinal = 0;
        let mut stride = 1;
        for (axis, &position) in self.axes.iter().zip(coordinates) {
            let len = axis.positions.len();
            if position >= len {
                return None;
            }
            ordinal += position * stride;
            stride *= len;
        }
        Some(ordinal)
    }

    pub fn cell_at(&self, coordinates: &[usize]) -> Option<&Cell> {
        self.ordinal_of(coordinates).and_then(|o| self.cell(o))
    }
}

/// [`CellsetHandler`] qui assemble un [`Cellset`]
#[derive(Debug, Default)]
pub struct CellsetBuilder {
    axes: Vec<CellsetAxis>,
    slicer: Option<CellsetAxis>,
    cells: BTreeMap<usize, Cell>,
}

impl CellsetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn axis_entry(&mut self, name: &str, ordinal: i32) -> &mut CellsetAxis {
        if ordinal == SLICER_ORDINAL {
            return self
                .slicer
                .get_or_insert_with(|| CellsetAxis::new(name, ordinal));
        }
        match self.axes.iter().position(|a| a.ordinal == ordinal) {
            Some(index) => &mut self.axes[index],
            None => {
                self.axes.push(CellsetAxis::new(name, ordinal));
                let last = self.axes.len() - 1;
                &mut self.axes[last]
            }
        }
    }

    fn axis_mut(&mut self, ordinal: i32) -> Option<&mut CellsetAxis> {
        if ordinal == SLICER_ORDINAL {
            return self.slicer.as_mut();
        }
        self.axes.iter_mut().find(|a| a.ordinal == ordinal)
    }

    pub fn build(mut self) -> Cellset {
        self.axes.sort_by_key(|a| a.ordinal);
        Cellset {
            axes: self.axes,
            slicer: self.slicer,
            cells: self.cells,
        }
    }
}

impl CellsetHandler for CellsetBuilder {
    fn axis_info(&mut self, name: &str, ordinal: i32) {
        self.axis_entry(name, ordinal);
    }

    fn hier_info(&mut self, hierarchy: &str, axis_ordinal: i32, _number: usize) {
        match self.axis_mut(axis_ordinal) {
            Some(axis) => axis.hierarchies.push(hierarchy.to_string()),
            None => warn!(axis_ordinal, hierarchy, "hierarchy for an undeclared axis"),
        }
    }

    fn axis(&mut self, name: &str, ordinal: i32) {
        let axis = self.axis_entry(name, ordinal);
        axis.name = name.to_string();
    }

    fn tuple(&mut self, axis_ordinal: i32, position_ordinal: usize) {
        match self.axis_mut(axis_ordinal) {
            Some(axis) => axis.positions.push(Position {
                ordinal: position_ordinal,
                members: Vec::new(),
            }),
            None => warn!(axis_ordinal, position_ordinal, "tuple for an undeclared axis"),
        }
    }

    fn member(
        &mut self,
        member: MemberRef,
        axis_ordinal: i32,
        position_ordinal: usize,
        _index: usize,
    ) {
        let position = self
            .axis_mut(axis_ordinal)
            .and_then(|a| a.positions.iter_mut().rev().find(|p| p.ordinal == position_ordinal));
        match position {
            Some(position) => position.members.push(member),
            None => warn!(
                axis_ordinal,
                position_ordinal,
                member = %member.unique_name,
                "member outside of any tuple"
            ),
        }
    }

    fn cell_data_begin(&mut self) {}

    fn cell(
        &mut self,
        ordinal: usize,
        value: Option<CellValue>,
        formatted_value: String,
        font_size: Option<String>,
    ) {
        self.cells.insert(
            ordinal,
            Cell {
                ordinal,
                value,
                formatted_value,
                font_size,
            },
        );
    }
}
