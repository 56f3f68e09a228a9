use crate::selection::compute_counts;
use crate::tree::{OrgTree, StudentEntry, TreeError};
use serde::Serialize;
use std::collections::HashSet;

/// What the compose screen receives once a selection is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipients {
    pub students: Vec<StudentEntry>,
    pub recipient_count: usize,
    /// Distinct student ids; a student enrolled in two selected courses counts once.
    pub unique_count: usize,
    pub selected_grades: Vec<String>,
    pub selected_classes: Vec<String>,
}

pub fn ensure_any_selected(tree: &OrgTree) -> Result<(), TreeError> {
    if compute_counts(tree).total > 0 {
        return Ok(());
    }
    Err(TreeError::new(
        "no_recipients",
        "select at least one student before continuing",
    ))
}

pub fn collect(tree: &OrgTree) -> Result<Recipients, TreeError> {
    ensure_any_selected(tree)?;

    let students: Vec<StudentEntry> = tree
        .all_students()
        .into_iter()
        .filter(|s| s.selected)
        .collect();
    let unique_count = students
        .iter()
        .map(|s| s.id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let selected_grades = tree
        .grades
        .iter()
        .filter(|g| g.selected)
        .map(|g| g.name.clone())
        .collect();
    let selected_classes = tree
        .grades
        .iter()
        .flat_map(|g| g.classes.iter())
        .filter(|c| c.selected)
        .map(|c| c.name.clone())
        .collect();

    Ok(Recipients {
        recipient_count: students.len(),
        unique_count,
        students,
        selected_grades,
        selected_classes,
    })
}
