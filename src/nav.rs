use crate::selection::{compute_counts, Counts};
use crate::tree::{Level, NodePath, NodeRef, OrgTree, Selection, TreeError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Crumb {
    pub level: Level,
    pub id: String,
    pub name: String,
}

/// One rendered row at the current drill level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub selected: bool,
    pub selection: Selection,
    pub child_count: usize,
    pub drillable: bool,
}

impl Row {
    fn from_node(node: NodeRef<'_>) -> Self {
        let detail = match node {
            NodeRef::Course(c) => c.instructor.clone(),
            NodeRef::Student(s) => s.email.clone(),
            NodeRef::Grade(_) | NodeRef::Class(_) => None,
        };
        Row {
            id: node.id().to_string(),
            name: node.name().to_string(),
            detail,
            selected: node.is_selected(),
            selection: node.selection(),
            child_count: node.child_count(),
            drillable: node.level().deeper().is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub level: Level,
    pub breadcrumbs: Vec<Crumb>,
    pub rows: Vec<Row>,
    pub counts: Counts,
}

/// Which level is on screen and which ancestors led there.
///
/// Starts at `grades`; `drill` goes one level deeper, `back` one level up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrillState {
    trail: Vec<Crumb>,
}

impl DrillState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> Level {
        Level::from_depth(self.trail.len()).unwrap_or(Level::Students)
    }

    pub fn breadcrumbs(&self) -> &[Crumb] {
        &self.trail
    }

    /// Ids of the recorded ancestors; scopes `select_all_at_level`.
    pub fn scope(&self) -> NodePath {
        self.trail.iter().map(|c| c.id.as_str()).collect()
    }

    /// Path of a row at the current level.
    pub fn path_to(&self, id: &str) -> NodePath {
        self.scope().child(id)
    }

    pub fn drill(&mut self, tree: &OrgTree, node_id: &str) -> Result<(), TreeError> {
        let level = self.level();
        if level.deeper().is_none() {
            return Err(TreeError::new(
                "leaf_level",
                "students are the deepest level",
            ));
        }
        let node = tree.node(level, &self.path_to(node_id))?;
        self.trail.push(Crumb {
            level,
            id: node.id().to_string(),
            name: node.name().to_string(),
        });
        Ok(())
    }

    /// Returns false when already at the top.
    pub fn back(&mut self) -> bool {
        self.trail.pop().is_some()
    }

    /// Drops recorded ancestors that no longer exist and refreshes names.
    pub fn reconcile(&mut self, tree: &OrgTree) {
        let mut path = NodePath::root();
        let mut keep = 0;
        for crumb in self.trail.iter_mut() {
            path = path.child(crumb.id.as_str());
            match tree.node(crumb.level, &path) {
                Ok(node) => {
                    crumb.name = node.name().to_string();
                    keep += 1;
                }
                Err(_) => break,
            }
        }
        self.trail.truncate(keep);
    }

    pub fn rows(&self, tree: &OrgTree) -> Result<Vec<Row>, TreeError> {
        Ok(tree
            .children_at(self.level(), &self.scope())?
            .into_iter()
            .map(Row::from_node)
            .collect())
    }

    pub fn view(&self, tree: &OrgTree) -> Result<View, TreeError> {
        Ok(View {
            level: self.level(),
            breadcrumbs: self.breadcrumbs().to_vec(),
            rows: self.rows(tree)?,
            counts: compute_counts(tree),
        })
    }
}
