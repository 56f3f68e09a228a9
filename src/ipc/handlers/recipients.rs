use crate::ipc::error::{ok, tree_err};
use crate::ipc::helpers::session;
use crate::ipc::types::{AppState, Request};
use crate::recipients;
use log::info;
use serde_json::json;

fn handle_recipients_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match recipients::collect(&s.tree) {
        Ok(out) => {
            info!(
                "exporting {} recipients ({} distinct)",
                out.recipient_count, out.unique_count
            );
            ok(&req.id, json!({ "recipients": out }))
        }
        Err(e) => tree_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "recipients.export" => Some(handle_recipients_export(state, req)),
        _ => None,
    }
}
