use serde_json::json;

use crate::ipc::error::{err, ok, tree_err};
use crate::ipc::types::{AppState, Request, Session};
use crate::selection::{self, Action};
use crate::tree::{Level, NodePath};

/// Handlers return the error response itself on the `Err` side.
pub type Reply<T> = Result<T, serde_json::Value>;

pub fn str_param<'a>(req: &'a Request, key: &str) -> Reply<&'a str> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{key} must not be empty"),
            None,
        )),
        None => Err(err(&req.id, "bad_params", format!("missing {key}"), None)),
    }
}

/// An optional string field; absent or null reads as `None`.
pub fn opt_str_param(req: &Request, key: &str) -> Reply<Option<String>> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{key} must be a string"),
            None,
        )),
    }
}

/// Accepts a string or a number, since seed ids may be either.
pub fn id_param(req: &Request, key: &str) -> Reply<String> {
    match req.params.get(key) {
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(serde_json::Value::String(_)) => str_param(req, key).map(str::to_string),
        _ => Err(err(&req.id, "bad_params", format!("missing {key}"), None)),
    }
}

pub fn level_param(req: &Request, key: &str) -> Reply<Option<Level>> {
    let Some(raw) = req.params.get(key).filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    raw.as_str()
        .and_then(Level::parse)
        .map(Some)
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{key} must be one of grades|classes|courses|students"),
                None,
            )
        })
}

pub fn path_param(req: &Request, key: &str) -> Reply<Option<NodePath>> {
    let Some(raw) = req.params.get(key).filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let Some(items) = raw.as_array() else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{key} must be an array of ids"),
            None,
        ));
    };
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        match item {
            serde_json::Value::String(s) => ids.push(s.trim().to_string()),
            serde_json::Value::Number(n) => ids.push(n.to_string()),
            _ => {
                return Err(err(
                    &req.id,
                    "bad_params",
                    format!("{key} entries must be strings or numbers"),
                    None,
                ))
            }
        }
    }
    Ok(Some(ids.into_iter().collect()))
}

pub fn session_id(req: &Request) -> Reply<&str> {
    str_param(req, "sessionId")
}

pub fn session<'a>(state: &'a AppState, req: &Request) -> Reply<&'a Session> {
    let sid = session_id(req)?;
    state.sessions.get(sid).ok_or_else(|| unknown_session(req, sid))
}

pub fn session_mut<'a>(state: &'a mut AppState, req: &Request) -> Reply<&'a mut Session> {
    let sid = session_id(req)?;
    state
        .sessions
        .get_mut(sid)
        .ok_or_else(|| unknown_session(req, sid))
}

fn unknown_session(req: &Request, sid: &str) -> serde_json::Value {
    err(
        &req.id,
        "unknown_session",
        "session not open",
        Some(json!({ "sessionId": sid })),
    )
}

pub fn view_response(req: &Request, session: &Session) -> serde_json::Value {
    match session.nav.view(&session.tree) {
        Ok(view) => ok(&req.id, json!({ "view": view })),
        Err(e) => tree_err(&req.id, e),
    }
}

/// Reduces `action` into the session tree and replies with the fresh view.
pub fn commit(state: &mut AppState, req: &Request, action: Action) -> serde_json::Value {
    let session = match session_mut(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match selection::apply(&session.tree, &action) {
        Ok(next) => {
            session.tree = next;
            session.nav.reconcile(&session.tree);
            view_response(req, session)
        }
        Err(e) => tree_err(&req.id, e),
    }
}
