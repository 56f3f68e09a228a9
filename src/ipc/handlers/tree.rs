use crate::ipc::error::{err, ok, tree_err};
use crate::ipc::helpers::{
    commit, id_param, level_param, opt_str_param, path_param, session, view_response, Reply,
};
use crate::ipc::types::{AppState, Request, Session};
use crate::seed;
use crate::selection::{compute_counts, Action, NodePatch};
use crate::tree::{Level, NodePath};
use serde_json::json;

fn handle_tree_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    match session(state, req) {
        Ok(s) => view_response(req, s),
        Err(resp) => resp,
    }
}

/// `nodeId` addresses a row on screen; `level` + `path` address any node.
fn target(s: &Session, req: &Request) -> Reply<(Level, NodePath)> {
    if req.params.get("nodeId").filter(|v| !v.is_null()).is_some() {
        let id = id_param(req, "nodeId")?;
        return Ok((s.nav.level(), s.nav.path_to(&id)));
    }
    match (level_param(req, "level")?, path_param(req, "path")?) {
        (Some(level), Some(path)) => Ok((level, path)),
        _ => Err(err(
            &req.id,
            "bad_params",
            "pass nodeId, or level and path",
            None,
        )),
    }
}

fn toggle_action(state: &AppState, req: &Request) -> Reply<Action> {
    let (level, path) = target(session(state, req)?, req)?;
    Ok(Action::Toggle { level, path })
}

fn handle_tree_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    match toggle_action(state, req) {
        Ok(action) => commit(state, req, action),
        Err(resp) => resp,
    }
}

fn select_all_action(state: &AppState, req: &Request) -> Reply<Action> {
    let s = session(state, req)?;
    let level = level_param(req, "level")?.unwrap_or_else(|| s.nav.level());
    let scope = path_param(req, "scope")?.unwrap_or_else(|| s.nav.scope());
    Ok(Action::SelectAll { level, scope })
}

fn handle_tree_select_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    match select_all_action(state, req) {
        Ok(action) => commit(state, req, action),
        Err(resp) => resp,
    }
}

fn handle_tree_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    commit(state, req, Action::ClearAll)
}

fn handle_tree_counts(state: &mut AppState, req: &Request) -> serde_json::Value {
    match session(state, req) {
        Ok(s) => ok(&req.id, json!({ "counts": compute_counts(&s.tree) })),
        Err(resp) => resp,
    }
}

fn handle_tree_students(state: &mut AppState, req: &Request) -> serde_json::Value {
    match session(state, req) {
        Ok(s) => ok(&req.id, json!({ "students": s.tree.all_students() })),
        Err(resp) => resp,
    }
}

fn add_node_action(state: &AppState, req: &Request) -> Reply<Action> {
    let s = session(state, req)?;
    let Some(raw) = req.params.get("node") else {
        return Err(err(&req.id, "bad_params", "missing node", None));
    };
    let node = seed::parse_node(s.nav.level(), raw).map_err(|e| tree_err(&req.id, e))?;
    Ok(Action::Insert {
        scope: s.nav.scope(),
        node,
    })
}

fn handle_tree_add_node(state: &mut AppState, req: &Request) -> serde_json::Value {
    match add_node_action(state, req) {
        Ok(action) => commit(state, req, action),
        Err(resp) => resp,
    }
}

fn remove_node_action(state: &AppState, req: &Request) -> Reply<Action> {
    let s = session(state, req)?;
    let id = id_param(req, "nodeId")?;
    Ok(Action::Remove {
        level: s.nav.level(),
        path: s.nav.path_to(&id),
    })
}

fn handle_tree_remove_node(state: &mut AppState, req: &Request) -> serde_json::Value {
    match remove_node_action(state, req) {
        Ok(action) => commit(state, req, action),
        Err(resp) => resp,
    }
}

fn rename_node_action(state: &AppState, req: &Request) -> Reply<Action> {
    let (level, path) = target(session(state, req)?, req)?;
    // Blank names are rejected by the reducer.
    let Some(name) = opt_str_param(req, "name")? else {
        return Err(err(&req.id, "bad_params", "missing name", None));
    };
    Ok(Action::Rename { level, path, name })
}

fn handle_tree_rename_node(state: &mut AppState, req: &Request) -> serde_json::Value {
    match rename_node_action(state, req) {
        Ok(action) => commit(state, req, action),
        Err(resp) => resp,
    }
}

fn update_node_action(state: &AppState, req: &Request) -> Reply<Action> {
    let (level, path) = target(session(state, req)?, req)?;
    let patch = NodePatch {
        description: opt_str_param(req, "description")?,
        instructor: opt_str_param(req, "instructor")?,
        status: opt_str_param(req, "status")?,
        email: opt_str_param(req, "email")?,
    };
    Ok(Action::Update { level, path, patch })
}

fn handle_tree_update_node(state: &mut AppState, req: &Request) -> serde_json::Value {
    match update_node_action(state, req) {
        Ok(action) => commit(state, req, action),
        Err(resp) => resp,
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tree.view" => Some(handle_tree_view(state, req)),
        "tree.toggle" => Some(handle_tree_toggle(state, req)),
        "tree.selectAll" => Some(handle_tree_select_all(state, req)),
        "tree.clear" => Some(handle_tree_clear(state, req)),
        "tree.counts" => Some(handle_tree_counts(state, req)),
        "tree.students" => Some(handle_tree_students(state, req)),
        "tree.addNode" => Some(handle_tree_add_node(state, req)),
        "tree.removeNode" => Some(handle_tree_remove_node(state, req)),
        "tree.renameNode" => Some(handle_tree_rename_node(state, req)),
        "tree.updateNode" => Some(handle_tree_update_node(state, req)),
        _ => None,
    }
}
