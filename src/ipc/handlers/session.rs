use crate::db;
use crate::ipc::error::{err, ok, tree_err};
use crate::ipc::handlers::seeds::blob_key;
use crate::ipc::helpers::{session_id, str_param};
use crate::ipc::types::{AppState, Request, Session};
use crate::nav::DrillState;
use crate::seed;
use crate::tree::OrgTree;
use log::info;
use serde_json::json;
use uuid::Uuid;

/// Resolves the seed for a new session: a stored key, an inline seed, or
/// the built-in sample when neither is given.
fn load_tree(state: &AppState, req: &Request) -> Result<(OrgTree, Option<String>), serde_json::Value> {
    if req.params.get("seedKey").filter(|v| !v.is_null()).is_some() {
        let key = str_param(req, "seedKey")?;
        let Some(conn) = state.db.as_ref() else {
            return Err(err(&req.id, "no_workspace", "select a workspace first", None));
        };
        let stored = db::blob_get(conn, &blob_key(key))
            .map_err(|e| err(&req.id, "db_query_failed", format!("{e:#}"), None))?;
        let Some((_, raw)) = stored else {
            return Err(err(
                &req.id,
                "not_found",
                "seed not found",
                Some(json!({ "key": key })),
            ));
        };
        let tree = seed::parse_value(&raw).map_err(|e| tree_err(&req.id, e))?;
        return Ok((tree, Some(key.to_string())));
    }

    if let Some(raw) = req.params.get("seed").filter(|v| !v.is_null()) {
        let tree = seed::parse_value(raw).map_err(|e| tree_err(&req.id, e))?;
        return Ok((tree, None));
    }

    let tree = seed::sample_tree().map_err(|e| tree_err(&req.id, e))?;
    Ok((tree, None))
}

fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (tree, seed_key) = match load_tree(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session = Session {
        tree,
        nav: DrillState::new(),
        seed_key,
    };
    let view = match session.nav.view(&session.tree) {
        Ok(v) => v,
        Err(e) => return tree_err(&req.id, e),
    };

    let session_id = Uuid::new_v4().to_string();
    info!(
        "session {} opened with {} students",
        session_id,
        session.tree.all_students().len()
    );
    let seed_key = session.seed_key.clone();
    state.sessions.insert(session_id.clone(), session);

    ok(
        &req.id,
        json!({ "sessionId": session_id, "seedKey": seed_key, "view": view }),
    )
}

fn handle_session_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let sid = match session_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let closed = state.sessions.remove(sid).is_some();
    if closed {
        info!("session {sid} closed");
    }
    ok(&req.id, json!({ "sessionId": sid, "closed": closed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.open" => Some(handle_session_open(state, req)),
        "session.close" => Some(handle_session_close(state, req)),
        _ => None,
    }
}
