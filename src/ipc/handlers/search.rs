use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{commit, id_param, path_param, session};
use crate::ipc::types::{AppState, Request};
use crate::selection::{search, Action};
use serde_json::json;

fn handle_search_query(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    // An empty or missing term clears the result list.
    let term = req
        .params
        .get("term")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let results = search(&s.tree, term);
    ok(
        &req.id,
        json!({ "term": term, "count": results.len(), "results": results }),
    )
}

fn handle_search_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match id_param(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_path = match path_param(req, "coursePath") {
        Ok(Some(p)) => p,
        Ok(None) => return err(&req.id, "bad_params", "missing coursePath", None),
        Err(resp) => return resp,
    };
    commit(
        state,
        req,
        Action::ToggleLeaf {
            student_id,
            course_path,
        },
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "search.query" => Some(handle_search_query(state, req)),
        "search.toggle" => Some(handle_search_toggle(state, req)),
        _ => None,
    }
}
