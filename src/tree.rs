use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four levels of the org tree, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[serde(alias = "grade")]
    Grades,
    #[serde(alias = "class")]
    Classes,
    #[serde(alias = "course")]
    Courses,
    #[serde(alias = "student")]
    Students,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Grades, Level::Classes, Level::Courses, Level::Students];

    /// Number of ancestor ids needed to scope this level.
    pub fn depth(self) -> usize {
        match self {
            Level::Grades => 0,
            Level::Classes => 1,
            Level::Courses => 2,
            Level::Students => 3,
        }
    }

    pub fn from_depth(depth: usize) -> Option<Level> {
        Level::ALL.get(depth).copied()
    }

    pub fn deeper(self) -> Option<Level> {
        Level::from_depth(self.depth() + 1)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Grades => "grades",
            Level::Classes => "classes",
            Level::Courses => "courses",
            Level::Students => "students",
        }
    }

    pub fn parse(raw: &str) -> Option<Level> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "grades" | "grade" => Some(Level::Grades),
            "classes" | "class" => Some(Level::Classes),
            "courses" | "course" => Some(Level::Courses),
            "students" | "student" => Some(Level::Students),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state selection of a node, derived from the flags below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    Unselected,
    Partial,
    Selected,
}

impl Selection {
    pub fn from_flag(selected: bool) -> Self {
        if selected {
            Selection::Selected
        } else {
            Selection::Unselected
        }
    }

    /// Folds child states; a childless node falls back to its own flag.
    fn fold<I>(own_flag: bool, children: I) -> Self
    where
        I: IntoIterator<Item = Selection>,
    {
        let mut any = false;
        let mut all_selected = true;
        let mut all_unselected = true;
        for s in children {
            any = true;
            all_selected &= s == Selection::Selected;
            all_unselected &= s == Selection::Unselected;
        }
        if !any {
            return Selection::from_flag(own_flag);
        }
        if all_selected {
            Selection::Selected
        } else if all_unselected {
            Selection::Unselected
        } else {
            Selection::Partial
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl TreeError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for TreeError {}

/// Ancestor ids from the grade downward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<String>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn child(&self, id: impl Into<String>) -> Self {
        let mut ids = self.0.clone();
        ids.push(id.into());
        Self(ids)
    }

    /// Splits into the scope (parent path) and the last id.
    pub fn split_last(&self) -> Option<(NodePath, &str)> {
        let (last, rest) = self.0.split_last()?;
        Some((NodePath(rest.to_vec()), last.as_str()))
    }

    fn expect_len(&self, want: usize, what: &str) -> Result<(), TreeError> {
        if self.0.len() == want {
            return Ok(());
        }
        Err(TreeError::new(
            "bad_path",
            format!("{what} needs {want} ids, got {}", self.0.len()),
        )
        .with_details(serde_json::json!({ "path": self.0 })))
    }
}

impl<S: Into<String>> FromIterator<S> for NodePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub selected: bool,
    pub students: Vec<Student>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
    pub selected: bool,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    pub name: String,
    pub selected: bool,
    pub classes: Vec<Class>,
}

/// Shared behavior of the four node kinds.
pub(crate) trait TreeNode {
    const LEVEL: Level;

    fn id(&self) -> &str;
    fn rename(&mut self, name: String);
    /// Sets this node and every descendant.
    fn cascade(&mut self, selected: bool);
    /// Re-derives the flag from direct children; childless nodes keep theirs.
    fn recompute(&mut self);
    /// Recomputes the whole subtree bottom-up.
    fn settle(&mut self);
    fn selection(&self) -> Selection;
}

impl TreeNode for Student {
    const LEVEL: Level = Level::Students;

    fn id(&self) -> &str {
        &self.id
    }
    fn rename(&mut self, name: String) {
        self.name = name;
    }
    fn cascade(&mut self, selected: bool) {
        self.selected = selected;
    }
    fn recompute(&mut self) {}
    fn settle(&mut self) {}
    fn selection(&self) -> Selection {
        Selection::from_flag(self.selected)
    }
}

macro_rules! impl_parent_node {
    ($ty:ty, $level:expr, $children:ident) => {
        impl TreeNode for $ty {
            const LEVEL: Level = $level;

            fn id(&self) -> &str {
                &self.id
            }
            fn rename(&mut self, name: String) {
                self.name = name;
            }
            fn cascade(&mut self, selected: bool) {
                self.selected = selected;
                for c in self.$children.iter_mut() {
                    c.cascade(selected);
                }
            }
            fn recompute(&mut self) {
                if !self.$children.is_empty() {
                    self.selected = self.$children.iter().all(|c| c.selected);
                }
            }
            fn settle(&mut self) {
                for c in self.$children.iter_mut() {
                    c.settle();
                }
                self.recompute();
            }
            fn selection(&self) -> Selection {
                Selection::fold(self.selected, self.$children.iter().map(|c| c.selection()))
            }
        }
    };
}

impl_parent_node!(Course, Level::Courses, students);
impl_parent_node!(Class, Level::Classes, courses);
impl_parent_node!(Grade, Level::Grades, classes);

pub(crate) fn find<'a, T: TreeNode>(items: &'a [T], id: &str) -> Result<&'a T, TreeError> {
    items
        .iter()
        .find(|n| n.id() == id)
        .ok_or_else(|| not_found(T::LEVEL, id))
}

pub(crate) fn find_mut<'a, T: TreeNode>(items: &'a mut [T], id: &str) -> Result<&'a mut T, TreeError> {
    items
        .iter_mut()
        .find(|n| n.id() == id)
        .ok_or_else(|| not_found(T::LEVEL, id))
}

fn not_found(level: Level, id: &str) -> TreeError {
    TreeError::new("not_found", format!("no node {id} in {level}"))
        .with_details(serde_json::json!({ "level": level, "id": id }))
}

/// Borrowed view of a node at any level.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Grade(&'a Grade),
    Class(&'a Class),
    Course(&'a Course),
    Student(&'a Student),
}

impl<'a> NodeRef<'a> {
    pub fn level(&self) -> Level {
        match self {
            NodeRef::Grade(_) => Level::Grades,
            NodeRef::Class(_) => Level::Classes,
            NodeRef::Course(_) => Level::Courses,
            NodeRef::Student(_) => Level::Students,
        }
    }

    pub fn id(&self) -> &'a str {
        match *self {
            NodeRef::Grade(n) => &n.id,
            NodeRef::Class(n) => &n.id,
            NodeRef::Course(n) => &n.id,
            NodeRef::Student(n) => &n.id,
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            NodeRef::Grade(n) => &n.name,
            NodeRef::Class(n) => &n.name,
            NodeRef::Course(n) => &n.name,
            NodeRef::Student(n) => &n.name,
        }
    }

    pub fn is_selected(&self) -> bool {
        match self {
            NodeRef::Grade(n) => n.selected,
            NodeRef::Class(n) => n.selected,
            NodeRef::Course(n) => n.selected,
            NodeRef::Student(n) => n.selected,
        }
    }

    pub fn selection(&self) -> Selection {
        match self {
            NodeRef::Grade(n) => n.selection(),
            NodeRef::Class(n) => n.selection(),
            NodeRef::Course(n) => n.selection(),
            NodeRef::Student(n) => n.selection(),
        }
    }

    pub fn child_count(&self) -> usize {
        match self {
            NodeRef::Grade(n) => n.classes.len(),
            NodeRef::Class(n) => n.courses.len(),
            NodeRef::Course(n) => n.students.len(),
            NodeRef::Student(_) => 0,
        }
    }
}

/// Owned node used when inserting into the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Grade(Grade),
    Class(Class),
    Course(Course),
    Student(Student),
}

impl Node {
    pub fn level(&self) -> Level {
        match self {
            Node::Grade(_) => Level::Grades,
            Node::Class(_) => Level::Classes,
            Node::Course(_) => Level::Courses,
            Node::Student(_) => Level::Students,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Node::Grade(n) => &n.id,
            Node::Class(n) => &n.id,
            Node::Course(n) => &n.id,
            Node::Student(n) => &n.id,
        }
    }
}

/// A student flattened together with its ancestor path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEntry {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub selected: bool,
    pub grade_id: String,
    pub class_id: String,
    pub course_id: String,
    pub grade_name: String,
    pub class_name: String,
    pub course_name: String,
    /// Feeds straight into `toggle_leaf_by_id`.
    pub course_path: NodePath,
}

/// Mutable handle on one sibling list of the tree.
pub(crate) enum ChildrenMut<'a> {
    Grades(&'a mut Vec<Grade>),
    Classes(&'a mut Vec<Class>),
    Courses(&'a mut Vec<Course>),
    Students(&'a mut Vec<Student>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgTree {
    pub grades: Vec<Grade>,
}

impl OrgTree {
    pub fn new(grades: Vec<Grade>) -> Self {
        Self { grades }
    }

    pub fn all_students(&self) -> Vec<StudentEntry> {
        let mut out = Vec::new();
        for g in &self.grades {
            for c in &g.classes {
                for co in &c.courses {
                    for s in &co.students {
                        out.push(StudentEntry {
                            id: s.id.clone(),
                            name: s.name.clone(),
                            email: s.email.clone(),
                            selected: s.selected,
                            grade_id: g.id.clone(),
                            class_id: c.id.clone(),
                            course_id: co.id.clone(),
                            grade_name: g.name.clone(),
                            class_name: c.name.clone(),
                            course_name: co.name.clone(),
                            course_path: [&g.id, &c.id, &co.id].into_iter().cloned().collect(),
                        });
                    }
                }
            }
        }
        out
    }

    /// Ordered children at `level` under `scope` (`level.depth()` ids).
    pub fn children_at(&self, level: Level, scope: &NodePath) -> Result<Vec<NodeRef<'_>>, TreeError> {
        scope.expect_len(level.depth(), "scope")?;
        let ids = scope.ids();
        let rows: Vec<NodeRef<'_>> = match level {
            Level::Grades => self.grades.iter().map(NodeRef::Grade).collect(),
            Level::Classes => find(&self.grades, &ids[0])?
                .classes
                .iter()
                .map(NodeRef::Class)
                .collect(),
            Level::Courses => {
                let g = find(&self.grades, &ids[0])?;
                find(&g.classes, &ids[1])?
                    .courses
                    .iter()
                    .map(NodeRef::Course)
                    .collect()
            }
            Level::Students => {
                let g = find(&self.grades, &ids[0])?;
                let c = find(&g.classes, &ids[1])?;
                find(&c.courses, &ids[2])?
                    .students
                    .iter()
                    .map(NodeRef::Student)
                    .collect()
            }
        };
        Ok(rows)
    }

    /// The node at `level` addressed by `path` (`level.depth() + 1` ids).
    pub fn node(&self, level: Level, path: &NodePath) -> Result<NodeRef<'_>, TreeError> {
        path.expect_len(level.depth() + 1, "path")?;
        let Some((scope, id)) = path.split_last() else {
            return Err(TreeError::new("bad_path", "empty path"));
        };
        self.children_at(level, &scope)?
            .into_iter()
            .find(|n| n.id() == id)
            .ok_or_else(|| not_found(level, id))
    }

    pub(crate) fn children_mut(
        &mut self,
        level: Level,
        scope: &NodePath,
    ) -> Result<ChildrenMut<'_>, TreeError> {
        scope.expect_len(level.depth(), "scope")?;
        let ids = scope.ids();
        if level == Level::Grades {
            return Ok(ChildrenMut::Grades(&mut self.grades));
        }
        let g = find_mut(&mut self.grades, &ids[0])?;
        if level == Level::Classes {
            return Ok(ChildrenMut::Classes(&mut g.classes));
        }
        let c = find_mut(&mut g.classes, &ids[1])?;
        if level == Level::Courses {
            return Ok(ChildrenMut::Courses(&mut c.courses));
        }
        let co = find_mut(&mut c.courses, &ids[2])?;
        Ok(ChildrenMut::Students(&mut co.students))
    }

    /// Re-derives every non-leaf flag on `path`, deepest first.
    pub(crate) fn recompute_along(&mut self, path: &NodePath) -> Result<(), TreeError> {
        let ids = path.ids();
        let Some(gid) = ids.first() else {
            return Ok(());
        };
        let g = find_mut(&mut self.grades, gid)?;
        if let Some(cid) = ids.get(1) {
            let c = find_mut(&mut g.classes, cid)?;
            if let Some(coid) = ids.get(2) {
                find_mut(&mut c.courses, coid)?.recompute();
            }
            c.recompute();
        }
        g.recompute();
        Ok(())
    }

    /// Enforces upward consistency over the whole tree, bottom-up.
    pub(crate) fn normalize(&mut self) {
        for g in &mut self.grades {
            g.settle();
        }
    }
}
