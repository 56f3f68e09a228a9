use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .env_remove("ROSTERD_WORKSPACE")
        .env_remove("ROSTERD_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn send(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = send(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = send(stdin, reader, id, method, params);
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false), "{method} should fail");
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn counts(view: &serde_json::Value) -> serde_json::Value {
    view.get("view")
        .and_then(|v| v.get("counts"))
        .cloned()
        .expect("counts")
}

fn row_selection(view: &serde_json::Value, name: &str) -> String {
    view.get("view")
        .and_then(|v| v.get("rows"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .find(|r| r.get("name").and_then(|v| v.as_str()) == Some(name))
        .and_then(|r| r.get("selection").and_then(|v| v.as_str()).map(str::to_string))
        .unwrap_or_else(|| panic!("row {name} missing"))
}

#[test]
fn drill_select_search_and_export() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let opened = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({}));
    let sid = opened
        .get("sessionId")
        .and_then(|v| v.as_str())
        .expect("sessionId")
        .to_string();
    assert_eq!(opened["view"]["level"], "grades");
    assert_eq!(opened["view"]["rows"].as_array().map(|r| r.len()), Some(2));

    let code = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "recipients.export",
        json!({ "sessionId": sid }),
    );
    assert_eq!(code, "no_recipients");

    let _ = request_ok(&mut stdin, &mut reader, "3", "nav.drill", json!({ "sessionId": sid, "nodeId": 1 }));
    let _ = request_ok(&mut stdin, &mut reader, "4", "nav.drill", json!({ "sessionId": sid, "nodeId": "1" }));
    let at_students = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "nav.drill",
        json!({ "sessionId": sid, "nodeId": "1" }),
    );
    assert_eq!(at_students["view"]["level"], "students");
    let crumbs: Vec<_> = at_students["view"]["breadcrumbs"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| c.get("name").and_then(|v| v.as_str()).map(str::to_string))
        .collect();
    assert_eq!(crumbs, vec!["Grade 1", "Class 1A", "Mathematics"]);

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "tree.selectAll",
        json!({ "sessionId": sid }),
    );
    assert_eq!(
        counts(&selected),
        json!({ "grades": 0, "classes": 0, "courses": 1, "students": 3, "total": 3 })
    );

    let code = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "nav.drill",
        json!({ "sessionId": sid, "nodeId": "ST001" }),
    );
    assert_eq!(code, "leaf_level");

    let courses = request_ok(&mut stdin, &mut reader, "8", "nav.back", json!({ "sessionId": sid }));
    assert_eq!(courses["view"]["level"], "courses");
    assert_eq!(row_selection(&courses, "Mathematics"), "selected");
    assert_eq!(row_selection(&courses, "Science"), "unselected");

    let found = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "search.query",
        json!({ "sessionId": sid, "term": "SARAH" }),
    );
    assert_eq!(found["count"], 2);
    let science_hit = found["results"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .find(|r| r["courseName"] == "Science")
        .expect("science hit");
    assert_eq!(science_hit["selected"], false);

    let toggled = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "search.toggle",
        json!({
            "sessionId": sid,
            "studentId": science_hit["id"],
            "coursePath": science_hit["coursePath"],
        }),
    );
    assert_eq!(counts(&toggled)["total"], 4);
    assert_eq!(row_selection(&toggled, "Science"), "partial");

    let science = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "nav.drill",
        json!({ "sessionId": sid, "nodeId": "2" }),
    );
    assert_eq!(row_selection(&science, "Sarah Davis"), "selected");
    assert_eq!(row_selection(&science, "John Doe"), "unselected");

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "recipients.export",
        json!({ "sessionId": sid }),
    );
    assert_eq!(exported["recipients"]["recipientCount"], 4);
    assert_eq!(exported["recipients"]["uniqueCount"], 3);
    assert_eq!(exported["recipients"]["selectedGrades"], json!([]));

    let cleared = request_ok(&mut stdin, &mut reader, "13", "tree.clear", json!({ "sessionId": sid }));
    assert_eq!(counts(&cleared)["total"], 0);

    let closed = request_ok(&mut stdin, &mut reader, "14", "session.close", json!({ "sessionId": sid }));
    assert_eq!(closed["closed"], true);
    let code = request_err(&mut stdin, &mut reader, "15", "tree.view", json!({ "sessionId": sid }));
    assert_eq!(code, "unknown_session");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn toggle_by_level_and_path_and_bad_params() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let opened = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({}));
    let sid = opened["sessionId"].as_str().expect("sessionId").to_string();

    let toggled = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "tree.toggle",
        json!({ "sessionId": sid, "level": "grade", "path": [2] }),
    );
    assert_eq!(
        counts(&toggled),
        json!({ "grades": 1, "classes": 1, "courses": 1, "students": 2, "total": 2 })
    );
    assert_eq!(row_selection(&toggled, "Grade 2"), "selected");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "tree.toggle",
        json!({ "sessionId": sid, "level": "courses", "path": [1] }),
    );
    assert_eq!(code, "bad_path");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "tree.toggle",
        json!({ "sessionId": sid, "level": "teachers", "path": [1] }),
    );
    assert_eq!(code, "bad_params");

    let code = request_err(&mut stdin, &mut reader, "5", "tree.toggle", json!({ "sessionId": sid }));
    assert_eq!(code, "bad_params");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "tree.toggle",
        json!({ "sessionId": sid, "nodeId": "404" }),
    );
    assert_eq!(code, "not_found");

    let scoped = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "tree.selectAll",
        json!({ "sessionId": sid, "level": "classes", "scope": ["1"] }),
    );
    assert_eq!(counts(&scoped)["total"], 9);
    assert_eq!(counts(&scoped)["grades"], 2);

    let toggled_again = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "tree.toggle",
        json!({ "sessionId": sid, "nodeId": "2" }),
    );
    assert_eq!(counts(&toggled_again)["total"], 7);
    assert_eq!(row_selection(&toggled_again, "Grade 2"), "unselected");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn add_and_remove_nodes_at_the_current_level() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let opened = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({}));
    let sid = opened["sessionId"].as_str().expect("sessionId").to_string();

    let _ = request_ok(&mut stdin, &mut reader, "2", "nav.drill", json!({ "sessionId": sid, "nodeId": "2" }));
    let _ = request_ok(&mut stdin, &mut reader, "3", "tree.selectAll", json!({ "sessionId": sid }));

    let added = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "tree.addNode",
        json!({ "sessionId": sid, "node": { "id": 5, "name": "Class 2B" } }),
    );
    assert_eq!(row_selection(&added, "Class 2B"), "unselected");
    assert_eq!(counts(&added)["grades"], 0);

    let code = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "tree.addNode",
        json!({ "sessionId": sid, "node": { "id": "5", "name": "Again" } }),
    );
    assert_eq!(code, "duplicate_id");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "tree.addNode",
        json!({ "sessionId": sid, "node": { "name": "No id" } }),
    );
    assert_eq!(code, "bad_seed");

    let _ = request_ok(&mut stdin, &mut reader, "7", "nav.drill", json!({ "sessionId": sid, "nodeId": "5" }));
    let back_up = request_ok(&mut stdin, &mut reader, "8", "nav.back", json!({ "sessionId": sid }));
    assert_eq!(back_up["view"]["level"], "classes");

    let removed = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "tree.removeNode",
        json!({ "sessionId": sid, "nodeId": "5" }),
    );
    assert_eq!(removed["view"]["rows"].as_array().map(|r| r.len()), Some(1));
    assert_eq!(counts(&removed)["grades"], 1);

    let deselected = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "tree.toggle",
        json!({ "sessionId": sid, "nodeId": "3" }),
    );
    assert_eq!(deselected["view"]["level"], "classes");
    assert_eq!(counts(&deselected)["grades"], 0);
    assert_eq!(counts(&deselected)["total"], 0);

    drop(stdin);
    let _ = child.wait();
}

fn crumb_names(view: &serde_json::Value) -> Vec<String> {
    view["view"]["breadcrumbs"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| c.get("name").and_then(|v| v.as_str()).map(str::to_string))
        .collect()
}

#[test]
fn rename_and_update_nodes_refresh_the_view() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let opened = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({}));
    let sid = opened["sessionId"].as_str().expect("sessionId").to_string();

    let _ = request_ok(&mut stdin, &mut reader, "2", "nav.drill", json!({ "sessionId": sid, "nodeId": "1" }));
    let courses = request_ok(&mut stdin, &mut reader, "3", "nav.drill", json!({ "sessionId": sid, "nodeId": "1" }));
    assert_eq!(crumb_names(&courses), vec!["Grade 1", "Class 1A"]);

    let renamed = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "tree.renameNode",
        json!({ "sessionId": sid, "nodeId": null, "level": "grades", "path": ["1"], "name": "First Grade" }),
    );
    assert_eq!(renamed["view"]["level"], "courses");
    assert_eq!(crumb_names(&renamed), vec!["First Grade", "Class 1A"]);

    let code = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "tree.renameNode",
        json!({ "sessionId": sid, "nodeId": "1", "name": "   " }),
    );
    assert_eq!(code, "bad_params");

    let renamed_row = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "tree.renameNode",
        json!({ "sessionId": sid, "nodeId": 2, "name": "Earth Science" }),
    );
    assert_eq!(row_selection(&renamed_row, "Earth Science"), "unselected");

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "tree.updateNode",
        json!({ "sessionId": sid, "nodeId": "1", "instructor": "Dr. Lee" }),
    );
    let math = updated["view"]["rows"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .find(|r| r["id"] == "1")
        .expect("math row");
    assert_eq!(math["detail"], "Dr. Lee");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "tree.updateNode",
        json!({ "sessionId": sid, "nodeId": "1", "email": "math@example.com" }),
    );
    assert_eq!(code, "bad_params");

    let students = request_ok(&mut stdin, &mut reader, "9", "tree.students", json!({ "sessionId": sid }));
    let first = &students["students"][0];
    assert_eq!(first["gradeName"], "First Grade");

    drop(stdin);
    let _ = child.wait();
}
