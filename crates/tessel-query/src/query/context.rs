//! Per-statement build state.

use std::collections::BTreeSet;

use super::clause::{Clause, FromClause, Projection};
use crate::{expr::column::ColumnDef, traits::Expression};

pub(crate) type NodeId = usize;

pub(crate) struct Node {
    parent: Option<NodeId>,
    clause: Clause,
}

/// Arena owning every clause node of one statement.
///
/// Bind arguments and observed tables are collected when a node is attached,
/// so their order is the clause order of the statement: projection, FROM and
/// JOIN, WHERE, HAVING.
#[derive(Default)]
pub(crate) struct BuildContext {
    nodes: Vec<Node>,
    args: Vec<String>,
    observed_tables: BTreeSet<String>,
    projection: Option<NodeId>,
    from: Option<NodeId>,
    deep: bool,
}

impl BuildContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a node as the child of the current tail.
    pub(crate) fn push(&mut self, clause: Clause) -> NodeId {
        let id = self.nodes.len();
        match clause {
            Clause::Projection(_) => self.projection = Some(id),
            Clause::From(_) => self.from = Some(id),
            _ => {}
        }
        self.nodes.push(Node {
            parent: id.checked_sub(1),
            clause,
        });
        id
    }

    /// Clauses from the root to the tail.
    pub(crate) fn chain(&self) -> Vec<&Clause> {
        let mut chain = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.nodes.len().checked_sub(1);
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            chain.push(&node.clause);
            cursor = node.parent;
        }
        chain.reverse();
        chain
    }

    pub(crate) fn projection(&self) -> Option<&Projection> {
        match self.projection.map(|id| &self.nodes[id].clause) {
            Some(Clause::Projection(projection)) => Some(projection),
            _ => None,
        }
    }

    pub(crate) fn from_clause(&self) -> Option<&FromClause> {
        match self.from.map(|id| &self.nodes[id].clause) {
            Some(Clause::From(from)) => Some(from),
            _ => None,
        }
    }

    pub(crate) fn from_clause_mut(&mut self) -> Option<&mut FromClause> {
        match self.from.map(|id| &mut self.nodes[id].clause) {
            Some(Clause::From(from)) => Some(from),
            _ => None,
        }
    }

    pub(crate) fn args(&self) -> &[String] {
        &self.args
    }

    pub(crate) fn args_mut(&mut self) -> &mut Vec<String> {
        &mut self.args
    }

    pub(crate) fn observed_tables(&self) -> &BTreeSet<String> {
        &self.observed_tables
    }

    pub(crate) fn observed_tables_mut(&mut self) -> &mut BTreeSet<String> {
        &mut self.observed_tables
    }

    pub(crate) fn is_deep(&self) -> bool {
        self.deep
    }

    pub(crate) fn set_deep(&mut self) {
        self.deep = true;
    }

    pub(crate) fn add_column(&mut self, column: &ColumnDef) {
        column.add_args(&mut self.args);
        column.add_observed_tables(&mut self.observed_tables);
    }

    pub(crate) fn add_expression(&mut self, expr: &dyn Expression) {
        expr.add_args(&mut self.args);
        expr.add_observed_tables(&mut self.observed_tables);
    }
}
