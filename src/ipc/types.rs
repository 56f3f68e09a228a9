use std::collections::HashMap;
use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::nav::DrillState;
use crate::tree::OrgTree;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// One open recipient picker: the tree being edited and where the user is in it.
pub struct Session {
    pub tree: OrgTree,
    pub nav: DrillState,
    pub seed_key: Option<String>,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub sessions: HashMap<String, Session>,
}
