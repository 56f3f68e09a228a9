use crate::ipc::error::tree_err;
use crate::ipc::helpers::{id_param, session_mut, view_response};
use crate::ipc::types::{AppState, Request};

fn handle_nav_drill(state: &mut AppState, req: &Request) -> serde_json::Value {
    let node_id = match id_param(req, "nodeId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session = match session_mut(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    if let Err(e) = session.nav.drill(&session.tree, &node_id) {
        return tree_err(&req.id, e);
    }
    view_response(req, session)
}

fn handle_nav_back(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    // Back at the top level is a no-op.
    session.nav.back();
    view_response(req, session)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "nav.drill" => Some(handle_nav_drill(state, req)),
        "nav.back" => Some(handle_nav_back(state, req)),
        _ => None,
    }
}
