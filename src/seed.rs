//! Seed data for the org tree.
//!
//! Seeds arrive as loosely shaped JSON: ids may be numbers or strings and
//! `selected` may be missing. Everything is normalized here so the rest of
//! the crate only ever sees string ids and consistent flags.

use crate::tree::{Class, Course, Grade, Level, Node, OrgTree, Student, TreeError};
use serde::Deserialize;

const SAMPLE_SEED: &str = include_str!("../assets/sample_seed.json");

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl RawId {
    fn normalize(self) -> String {
        match self {
            RawId::Int(n) => n.to_string(),
            RawId::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawStudent {
    id: RawId,
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    selected: bool,
}

#[derive(Debug, Deserialize)]
struct RawCourse {
    id: RawId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    instructor: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    students: Vec<RawStudent>,
}

#[derive(Debug, Deserialize)]
struct RawClass {
    id: RawId,
    name: String,
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    courses: Vec<RawCourse>,
}

#[derive(Debug, Deserialize)]
struct RawGrade {
    id: RawId,
    name: String,
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    classes: Vec<RawClass>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSeed {
    Wrapped { grades: Vec<RawGrade> },
    Bare(Vec<RawGrade>),
}

impl From<RawStudent> for Student {
    fn from(r: RawStudent) -> Self {
        Student {
            id: r.id.normalize(),
            name: r.name,
            email: r.email.filter(|e| !e.trim().is_empty()),
            selected: r.selected,
        }
    }
}

impl From<RawCourse> for Course {
    fn from(r: RawCourse) -> Self {
        Course {
            id: r.id.normalize(),
            name: r.name,
            description: r.description,
            instructor: r.instructor,
            status: r.status,
            selected: r.selected,
            students: r.students.into_iter().map(Student::from).collect(),
        }
    }
}

impl From<RawClass> for Class {
    fn from(r: RawClass) -> Self {
        Class {
            id: r.id.normalize(),
            name: r.name,
            selected: r.selected,
            courses: r.courses.into_iter().map(Course::from).collect(),
        }
    }
}

impl From<RawGrade> for Grade {
    fn from(r: RawGrade) -> Self {
        Grade {
            id: r.id.normalize(),
            name: r.name,
            selected: r.selected,
            classes: r.classes.into_iter().map(Class::from).collect(),
        }
    }
}

fn bad_seed(e: serde_json::Error) -> TreeError {
    TreeError::new("bad_seed", e.to_string())
}

/// Builds a tree from a seed value (`{"grades": [...]}` or a bare array).
pub fn parse_value(raw: &serde_json::Value) -> Result<OrgTree, TreeError> {
    let seed = RawSeed::deserialize(raw).map_err(bad_seed)?;
    let grades = match seed {
        RawSeed::Wrapped { grades } | RawSeed::Bare(grades) => grades,
    };
    let mut tree = OrgTree::new(grades.into_iter().map(Grade::from).collect());
    tree.normalize();
    Ok(tree)
}

pub fn parse_str(raw: &str) -> Result<OrgTree, TreeError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(bad_seed)?;
    parse_value(&value)
}

/// Parses a single node of the given level, children included.
pub fn parse_node(level: Level, raw: &serde_json::Value) -> Result<Node, TreeError> {
    let node = match level {
        Level::Grades => Node::Grade(RawGrade::deserialize(raw).map_err(bad_seed)?.into()),
        Level::Classes => Node::Class(RawClass::deserialize(raw).map_err(bad_seed)?.into()),
        Level::Courses => Node::Course(RawCourse::deserialize(raw).map_err(bad_seed)?.into()),
        Level::Students => Node::Student(RawStudent::deserialize(raw).map_err(bad_seed)?.into()),
    };
    if node.id().is_empty() {
        return Err(TreeError::new("bad_seed", "node id must not be empty"));
    }
    Ok(node)
}

/// The noticeboard's built-in sample roster.
pub fn sample_tree() -> Result<OrgTree, TreeError> {
    parse_str(SAMPLE_SEED)
}
