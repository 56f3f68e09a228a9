//! Pure selection operations over [`OrgTree`].
//!
//! Every operation borrows the current tree and returns a new one; the input
//! is never touched. After a change at some node the flags of every ancestor
//! on its path are re-derived, so a parent reads as selected only when all of
//! its direct children are.

use crate::tree::{
    find_mut, ChildrenMut, Level, Node, NodePath, OrgTree, StudentEntry, TreeError, TreeNode,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub grades: usize,
    pub classes: usize,
    pub courses: usize,
    pub students: usize,
    pub total: usize,
}

/// Field edits for a course or student. `None` leaves a field alone; a
/// blank value clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub status: Option<String>,
    pub email: Option<String>,
}

impl NodePatch {
    fn fields(&self) -> [(&'static str, &Option<String>); 4] {
        [
            ("description", &self.description),
            ("instructor", &self.instructor),
            ("status", &self.status),
            ("email", &self.email),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_none())
    }

    fn check(&self, level: Level) -> Result<(), TreeError> {
        if self.is_empty() {
            return Err(TreeError::new("bad_params", "nothing to update"));
        }
        let allowed: &[&str] = match level {
            Level::Courses => &["description", "instructor", "status"],
            Level::Students => &["email"],
            Level::Grades | Level::Classes => &[],
        };
        for (field, value) in self.fields() {
            if value.is_some() && !allowed.contains(&field) {
                return Err(TreeError::new(
                    "bad_params",
                    format!("{level} have no {field} field"),
                )
                .with_details(serde_json::json!({ "level": level, "field": field })));
            }
        }
        Ok(())
    }
}

fn patch_field(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value {
        let v = v.trim();
        *slot = (!v.is_empty()).then(|| v.to_string());
    }
}

/// A user action, reduced by [`apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Toggle { level: Level, path: NodePath },
    SelectAll { level: Level, scope: NodePath },
    ToggleLeaf { student_id: String, course_path: NodePath },
    ClearAll,
    Insert { scope: NodePath, node: Node },
    Remove { level: Level, path: NodePath },
    Rename { level: Level, path: NodePath, name: String },
    Update { level: Level, path: NodePath, patch: NodePatch },
}

pub fn apply(tree: &OrgTree, action: &Action) -> Result<OrgTree, TreeError> {
    match action {
        Action::Toggle { level, path } => toggle_node(tree, *level, path),
        Action::SelectAll { level, scope } => select_all_at_level(tree, *level, scope),
        Action::ToggleLeaf {
            student_id,
            course_path,
        } => toggle_leaf_by_id(tree, student_id, course_path),
        Action::ClearAll => Ok(clear_all(tree)),
        Action::Insert { scope, node } => insert_node(tree, scope, node.clone()),
        Action::Remove { level, path } => remove_node(tree, *level, path),
        Action::Rename { level, path, name } => rename_node(tree, *level, path, name),
        Action::Update { level, path, patch } => update_node(tree, *level, path, patch),
    }
}

fn cascade_one(children: ChildrenMut<'_>, id: &str, selected: bool) -> Result<(), TreeError> {
    match children {
        ChildrenMut::Grades(v) => find_mut(v, id)?.cascade(selected),
        ChildrenMut::Classes(v) => find_mut(v, id)?.cascade(selected),
        ChildrenMut::Courses(v) => find_mut(v, id)?.cascade(selected),
        ChildrenMut::Students(v) => find_mut(v, id)?.cascade(selected),
    }
    Ok(())
}

fn cascade_every(children: ChildrenMut<'_>, selected: bool) {
    match children {
        ChildrenMut::Grades(v) => v.iter_mut().for_each(|n| n.cascade(selected)),
        ChildrenMut::Classes(v) => v.iter_mut().for_each(|n| n.cascade(selected)),
        ChildrenMut::Courses(v) => v.iter_mut().for_each(|n| n.cascade(selected)),
        ChildrenMut::Students(v) => v.iter_mut().for_each(|n| n.cascade(selected)),
    }
}

/// Flips the node at `path`, cascades the new value down, then re-derives
/// its ancestors.
pub fn toggle_node(tree: &OrgTree, level: Level, path: &NodePath) -> Result<OrgTree, TreeError> {
    let current = tree.node(level, path)?.is_selected();
    let Some((scope, id)) = path.split_last() else {
        return Err(TreeError::new("bad_path", "empty path"));
    };

    let mut next = tree.clone();
    cascade_one(next.children_mut(level, &scope)?, id, !current)?;
    next.recompute_along(&scope)?;
    Ok(next)
}

/// Selects every node at `level` under `scope`, and everything below them.
/// Nodes outside `scope` keep their flags.
pub fn select_all_at_level(
    tree: &OrgTree,
    level: Level,
    scope: &NodePath,
) -> Result<OrgTree, TreeError> {
    let mut next = tree.clone();
    cascade_every(next.children_mut(level, scope)?, true);
    next.recompute_along(scope)?;
    Ok(next)
}

/// Toggles one student addressed directly by its course, as a search
/// result click does.
pub fn toggle_leaf_by_id(
    tree: &OrgTree,
    student_id: &str,
    course_path: &NodePath,
) -> Result<OrgTree, TreeError> {
    toggle_node(tree, Level::Students, &course_path.child(student_id))
}

pub fn clear_all(tree: &OrgTree) -> OrgTree {
    let mut next = tree.clone();
    for g in &mut next.grades {
        g.cascade(false);
    }
    next
}

/// Adds `node` as the last child under `scope`; the node's level decides
/// which sibling list it joins.
pub fn insert_node(tree: &OrgTree, scope: &NodePath, node: Node) -> Result<OrgTree, TreeError> {
    let level = node.level();
    if tree
        .children_at(level, scope)?
        .iter()
        .any(|n| n.id() == node.id())
    {
        return Err(TreeError::new(
            "duplicate_id",
            format!("{} already has an entry with id {}", level, node.id()),
        ));
    }

    let mut next = tree.clone();
    match (next.children_mut(level, scope)?, node) {
        (ChildrenMut::Grades(v), Node::Grade(mut n)) => {
            n.settle();
            v.push(n);
        }
        (ChildrenMut::Classes(v), Node::Class(mut n)) => {
            n.settle();
            v.push(n);
        }
        (ChildrenMut::Courses(v), Node::Course(mut n)) => {
            n.settle();
            v.push(n);
        }
        (ChildrenMut::Students(v), Node::Student(n)) => v.push(n),
        _ => return Err(TreeError::new("bad_path", "node does not match scope level")),
    }
    next.recompute_along(scope)?;
    Ok(next)
}

/// Removes the node at `path` together with its subtree.
pub fn remove_node(tree: &OrgTree, level: Level, path: &NodePath) -> Result<OrgTree, TreeError> {
    tree.node(level, path)?;
    let Some((scope, id)) = path.split_last() else {
        return Err(TreeError::new("bad_path", "empty path"));
    };

    let mut next = tree.clone();
    match next.children_mut(level, &scope)? {
        ChildrenMut::Grades(v) => v.retain(|n| n.id != id),
        ChildrenMut::Classes(v) => v.retain(|n| n.id != id),
        ChildrenMut::Courses(v) => v.retain(|n| n.id != id),
        ChildrenMut::Students(v) => v.retain(|n| n.id != id),
    }
    next.recompute_along(&scope)?;
    Ok(next)
}

/// Gives the node at `path` a new display name. Selection is untouched.
pub fn rename_node(
    tree: &OrgTree,
    level: Level,
    path: &NodePath,
    name: &str,
) -> Result<OrgTree, TreeError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TreeError::new("bad_params", "name must not be blank"));
    }
    tree.node(level, path)?;
    let Some((scope, id)) = path.split_last() else {
        return Err(TreeError::new("bad_path", "empty path"));
    };

    let mut next = tree.clone();
    let name = name.to_string();
    match next.children_mut(level, &scope)? {
        ChildrenMut::Grades(v) => find_mut(v, id)?.rename(name),
        ChildrenMut::Classes(v) => find_mut(v, id)?.rename(name),
        ChildrenMut::Courses(v) => find_mut(v, id)?.rename(name),
        ChildrenMut::Students(v) => find_mut(v, id)?.rename(name),
    }
    Ok(next)
}

/// Edits the detail fields of a course or student.
pub fn update_node(
    tree: &OrgTree,
    level: Level,
    path: &NodePath,
    patch: &NodePatch,
) -> Result<OrgTree, TreeError> {
    patch.check(level)?;
    tree.node(level, path)?;
    let Some((scope, id)) = path.split_last() else {
        return Err(TreeError::new("bad_path", "empty path"));
    };

    let mut next = tree.clone();
    match next.children_mut(level, &scope)? {
        ChildrenMut::Courses(v) => {
            let c = find_mut(v, id)?;
            patch_field(&mut c.description, &patch.description);
            patch_field(&mut c.instructor, &patch.instructor);
            patch_field(&mut c.status, &patch.status);
        }
        ChildrenMut::Students(v) => patch_field(&mut find_mut(v, id)?.email, &patch.email),
        ChildrenMut::Grades(_) | ChildrenMut::Classes(_) => {}
    }
    Ok(next)
}

/// Counts selected flags at each level. `total` counts selected students
/// only; a grade's own flag never adds to it.
pub fn compute_counts(tree: &OrgTree) -> Counts {
    let mut counts = Counts::default();
    for g in &tree.grades {
        counts.grades += usize::from(g.selected);
        for c in &g.classes {
            counts.classes += usize::from(c.selected);
            for co in &c.courses {
                counts.courses += usize::from(co.selected);
                let picked = co.students.iter().filter(|s| s.selected).count();
                counts.students += picked;
                counts.total += picked;
            }
        }
    }
    counts
}

/// Case-insensitive substring search over student name, id and email.
/// Surrounding spaces are part of the term; an all-blank term finds nothing.
pub fn search(tree: &OrgTree, term: &str) -> Vec<StudentEntry> {
    if term.trim().is_empty() {
        return Vec::new();
    }
    let needle = term.to_lowercase();
    tree.all_students()
        .into_iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&needle)
                || s.id.to_lowercase().contains(&needle)
                || s
                    .email
                    .as_deref()
                    .map(|e| e.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .collect()
}
