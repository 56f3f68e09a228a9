use crate::db;
use crate::ipc::error::{err, ok, tree_err};
use crate::ipc::helpers::str_param;
use crate::ipc::types::{AppState, Request};
use crate::seed;
use rusqlite::Connection;
use serde_json::json;

const SEED_PREFIX: &str = "seed/";

pub fn blob_key(key: &str) -> String {
    format!("{SEED_PREFIX}{key}")
}

fn conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn handle_seeds_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let key = match str_param(req, "key") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(raw) = req.params.get("seed") else {
        return err(&req.id, "bad_params", "missing seed", None);
    };

    // Reject seeds that would not open later.
    if let Err(e) = seed::parse_value(raw) {
        return tree_err(&req.id, e);
    }

    match db::blob_put(conn, &blob_key(key), raw) {
        Ok(meta) => ok(
            &req.id,
            json!({ "key": key, "digest": meta.digest, "updatedAt": meta.updated_at }),
        ),
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

fn handle_seeds_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "seeds": [] }));
    };
    match db::blob_list(conn, SEED_PREFIX) {
        Ok(metas) => {
            let seeds: Vec<_> = metas
                .into_iter()
                .map(|m| {
                    json!({
                        "key": m.key.strip_prefix(SEED_PREFIX).unwrap_or(&m.key),
                        "digest": m.digest,
                        "updatedAt": m.updated_at,
                    })
                })
                .collect();
            ok(&req.id, json!({ "seeds": seeds }))
        }
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

fn handle_seeds_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let key = match str_param(req, "key") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match db::blob_get(conn, &blob_key(key)) {
        Ok(Some((meta, value))) => ok(
            &req.id,
            json!({ "key": key, "digest": meta.digest, "updatedAt": meta.updated_at, "seed": value }),
        ),
        Ok(None) => err(
            &req.id,
            "not_found",
            "seed not found",
            Some(json!({ "key": key })),
        ),
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

fn handle_seeds_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let key = match str_param(req, "key") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match db::blob_delete(conn, &blob_key(key)) {
        Ok(deleted) => ok(&req.id, json!({ "key": key, "deleted": deleted })),
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "seeds.save" => Some(handle_seeds_save(state, req)),
        "seeds.list" => Some(handle_seeds_list(state, req)),
        "seeds.get" => Some(handle_seeds_get(state, req)),
        "seeds.delete" => Some(handle_seeds_delete(state, req)),
        _ => None,
    }
}
