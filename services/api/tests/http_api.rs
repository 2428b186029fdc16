use api_lib::adapters::{memory::InMemoryStore, mentor::DesignatedMentorAdapter};
use api_lib::web::{build_router, state::AppState};
use dropout_tracker_core::domain::{Mentor, School, Student};
use dropout_tracker_core::ports::DatabaseService;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

struct TestServer {
    addr: SocketAddr,
    store: Arc<InMemoryStore>,
    school: School,
}

fn student(name: &str, email: &str, school_ids: Vec<Uuid>) -> Student {
    Student {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        contact_number: "9000000001".to_string(),
        parent_phone: "9000000002".to_string(),
        parent_email: format!("parent.{}", email),
        school_ids,
        attendance_percentage: 45.0,
        test_score: Some(35.0),
        reasons: None,
    }
}

async fn start() -> TestServer {
    let store = Arc::new(InMemoryStore::new());
    let school = School {
        id: Uuid::new_v4(),
        name: "Govt. High School".to_string(),
        email: "ghs@example.com".to_string(),
    };
    store.insert_school(school.clone()).await;
    store
        .insert_mentor(Mentor {
            id: Uuid::new_v4(),
            name: "Rohan Verma".to_string(),
            email: "rohan@example.com".to_string(),
        })
        .await;
    store
        .insert_student(student("Asha Patel", "asha@example.com", vec![school.id]))
        .await;

    let db: Arc<dyn DatabaseService> = store.clone();
    let state = Arc::new(AppState {
        db: db.clone(),
        mentors: Arc::new(DesignatedMentorAdapter::new(db, "Rohan Verma".to_string())),
        insights: None,
    });
    let app = build_router(state, 1024 * 1024);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    TestServer {
        addr,
        store,
        school,
    }
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> (u16, String) {
    let (status, _, body) = send_raw_with_head(addr, method, path, content_type, body).await;
    (status, body)
}

async fn send_raw_with_head(
    addr: SocketAddr,
    method: &str,
    path: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(content_type) = content_type {
        req.push_str(&format!("Content-Type: {content_type}\r\n"));
    }
    req.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

    let mut bytes = req.into_bytes();
    bytes.extend_from_slice(body);
    stream.write_all(&bytes).await.expect("write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

async fn send_json(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: serde_json::Value,
) -> (u16, serde_json::Value) {
    let (status, body) = send_raw(
        addr,
        method,
        path,
        Some("application/json"),
        body.to_string().as_bytes(),
    )
    .await;
    (status, serde_json::from_str(&body).expect("json body"))
}

async fn get_json(addr: SocketAddr, path: &str) -> (u16, serde_json::Value) {
    let (status, body) = send_raw(addr, "GET", path, None, b"").await;
    (status, serde_json::from_str(&body).expect("json body"))
}

fn multipart(boundary: &str, file_name: &str, content: &str) -> Vec<u8> {
    multipart_file(boundary, file_name, "text/csv", content.as_bytes())
}

fn multipart_file(boundary: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

fn assert_json_error(head: &str, body: &str, message: &str) -> serde_json::Value {
    assert!(
        head.to_ascii_lowercase().contains("content-type: application/json"),
        "not a json response: {head}"
    );
    let error: serde_json::Value = serde_json::from_str(body).expect("json body");
    assert_eq!(error["message"], message);
    error
}

#[tokio::test]
async fn health_reports_ok() {
    let server = start().await;
    let (status, body) = send_raw(server.addr, "GET", "/health", None, b"").await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn counselling_lifecycle_over_http() {
    let server = start().await;
    let addr = server.addr;

    let (status, created) = send_json(
        addr,
        "POST",
        "/meetrequest/asha@example.com",
        serde_json::json!({ "message": "Struggling with maths" }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(created["message"], "Counselling request created successfully");
    let request = &created["counselling"]["requests"][0];
    assert_eq!(created["counselling"]["school"], "ghs@example.com");
    assert_eq!(request["mentorName"], "Rohan Verma");
    assert_eq!(request["issue"], "Struggling with maths");
    assert_eq!(request["isContacted"], false);
    assert_eq!(request["scheduleDate"], serde_json::Value::Null);
    assert_eq!(request["stage"], "requested");

    let (status, scheduled) = send_json(
        addr,
        "PUT",
        "/schedule/asha@example.com",
        serde_json::json!({ "scheduleDate": "2025-03-01T10:30:00Z" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(scheduled["message"], "Meeting scheduled successfully");
    let request = &scheduled["counselling"]["requests"][0];
    assert_eq!(request["isContacted"], true);
    assert_eq!(request["stage"], "contacted");

    let (status, linked) = send_json(
        addr,
        "PUT",
        "/addlink/asha@example.com",
        serde_json::json!({ "meetingLink": "https://meet.example.com/abc" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        linked["counselling"]["requests"][0]["meetingLink"],
        "https://meet.example.com/abc"
    );

    let (status, concluded) = send_json(
        addr,
        "PUT",
        "/conclude/asha@example.com",
        serde_json::json!({ "concludedMsg": "Parents agreed to tuition support" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        concluded["counselling"]["requests"][0]["concludedMessage"],
        "Parents agreed to tuition support"
    );

    let (status, satisfied) = send_json(
        addr,
        "PUT",
        "/satisfaction/asha@example.com",
        serde_json::json!({ "isSatisfied": true }),
    )
    .await;
    assert_eq!(status, 200);
    let request = &satisfied["counselling"]["requests"][0];
    assert_eq!(request["isSatisfied"], true);
    assert_eq!(request["stage"], "satisfaction_recorded");

    let (status, record) = get_json(addr, "/school/ghs@example.com").await;
    assert_eq!(status, 200);
    assert_eq!(record["requests"].as_array().map(Vec::len), Some(1));
    assert_eq!(record["requests"][0]["studentDetails"]["name"], "Asha Patel");
}

#[tokio::test]
async fn meet_request_without_message_uses_empty_issue() {
    let server = start().await;
    let (status, created) = send_json(
        server.addr,
        "POST",
        "/meetrequest/asha@example.com",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(created["counselling"]["requests"][0]["issue"], "");
}

#[tokio::test]
async fn unknown_student_and_school_are_404() {
    let server = start().await;
    let addr = server.addr;

    let (status, body) = send_json(
        addr,
        "POST",
        "/meetrequest/nobody@example.com",
        serde_json::json!({ "message": "hi" }),
    )
    .await;
    assert_eq!(status, 404);
    assert!(body["message"].is_string());
    assert!(body.get("error").is_none());

    let (status, _) = send_json(
        addr,
        "PUT",
        "/schedule/asha@example.com",
        serde_json::json!({ "scheduleDate": "2025-03-01T10:30:00Z" }),
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = get_json(addr, "/school/unknown@example.com").await;
    assert_eq!(status, 404);
    assert_eq!(server.store.saves(), 0);
}

#[tokio::test]
async fn fee_upload_reconciles_and_reports_skips() {
    let server = start().await;
    let addr = server.addr;
    let school_id = server.school.id;

    let boundary = "X-FEE-BOUNDARY";
    let body = multipart(
        boundary,
        "fees.csv",
        "Name,Number of unpaid month\nAsha Patel,4\nGhost Student,2\n,1\n",
    );
    let (status, body) = send_raw(
        addr,
        "POST",
        &format!("/fees/{}/upload", school_id),
        Some(&format!("multipart/form-data; boundary={boundary}")),
        &body,
    )
    .await;
    assert_eq!(status, 200);
    let uploaded: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(uploaded["message"], "Fees data processed successfully");
    assert_eq!(uploaded["summary"]["added"], 1);
    assert_eq!(uploaded["summary"]["skipped"].as_array().map(Vec::len), Some(2));
    assert_eq!(uploaded["ledger"]["lineItems"][0]["studentName"], "Asha Patel");
    assert_eq!(uploaded["ledger"]["lineItems"][0]["unpaidMonths"], 4);

    let (status, ledger) = get_json(addr, &format!("/fees/{}", school_id)).await;
    assert_eq!(status, 200);
    assert_eq!(ledger["lineItems"].as_array().map(Vec::len), Some(1));

    let (status, risk) = get_json(addr, &format!("/risk/{}?fees_months_denom=4", school_id)).await;
    assert_eq!(status, 200);
    assert_eq!(risk["count"], 1);
    assert_eq!(risk["results"][0]["risk_score"], 100);
    assert_eq!(risk["results"][0]["risk_level"], "High");
    assert_eq!(risk["results"][0]["risk_color"], "Red");
    assert!(risk.get("insights").is_none());
}

#[tokio::test]
async fn fee_upload_without_file_is_400() {
    let server = start().await;
    let boundary = "X-EMPTY";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
    );
    let (status, body) = send_raw(
        server.addr,
        "POST",
        &format!("/fees/{}/upload", server.school.id),
        Some(&format!("multipart/form-data; boundary={boundary}")),
        body.as_bytes(),
    )
    .await;
    assert_eq!(status, 400);
    let error: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(error["message"], "No file uploaded");

    let (status, _) = get_json(server.addr, &format!("/fees/{}", server.school.id)).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn risk_insights_report_disabled_without_llm() {
    let server = start().await;
    let (status, risk) = get_json(
        server.addr,
        &format!("/risk/{}?with_insights=true", server.school.id),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(risk["insights"]["status"], "disabled");
}

#[tokio::test]
async fn notes_log_round_trip() {
    let server = start().await;
    let addr = server.addr;

    let (status, _) = send_json(
        addr,
        "POST",
        "/addCounselling",
        serde_json::json!({ "student_id": "S-17", "notes": "" }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, note) = send_json(
        addr,
        "POST",
        "/addCounselling",
        serde_json::json!({
            "student_id": "S-17",
            "date": "2025-02-05T09:00:00Z",
            "notes": "Home visit with parents"
        }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(note["student_id"], "S-17");

    let (status, notes) = get_json(addr, "/getCounsellings").await;
    assert_eq!(status, 200);
    assert_eq!(notes.as_array().map(Vec::len), Some(1));
    assert_eq!(notes[0]["notes"], "Home visit with parents");
}

#[tokio::test]
async fn xlsx_workbook_upload_is_reconciled() {
    let server = start().await;
    let school_id = server.school.id;
    let workbook = include_bytes!("fixtures/fees.xlsx");

    let boundary = "X-XLSX-BOUNDARY";
    let body = multipart_file(
        boundary,
        "fees.xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        workbook,
    );
    let (status, body) = send_raw(
        server.addr,
        "POST",
        &format!("/fees/{}/upload", school_id),
        Some(&format!("multipart/form-data; boundary={boundary}")),
        &body,
    )
    .await;
    assert_eq!(status, 200, "{body}");
    let uploaded: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(uploaded["summary"]["added"], 1);
    assert_eq!(uploaded["summary"]["skipped"][0]["studentName"], "Ghost Student");
    assert_eq!(uploaded["ledger"]["lineItems"][0]["studentName"], "Asha Patel");
    assert_eq!(uploaded["ledger"]["lineItems"][0]["unpaidMonths"], 4);
}

#[tokio::test]
async fn unreadable_json_bodies_get_json_400() {
    let server = start().await;
    let addr = server.addr;

    let (status, _) = send_json(
        addr,
        "POST",
        "/meetrequest/asha@example.com",
        serde_json::json!({ "message": "exam stress" }),
    )
    .await;
    assert_eq!(status, 201);

    // Date without a time or offset is not RFC 3339.
    let (status, head, body) = send_raw_with_head(
        addr,
        "PUT",
        "/schedule/asha@example.com",
        Some("application/json"),
        br#"{"scheduleDate":"2025-03-10"}"#,
    )
    .await;
    assert_eq!(status, 400);
    let error = assert_json_error(&head, &body, "Invalid request body");
    assert!(error["error"].is_string());

    let (status, head, body) =
        send_raw_with_head(addr, "PUT", "/satisfaction/asha@example.com", None, b"").await;
    assert_eq!(status, 400);
    assert_json_error(&head, &body, "Invalid request body");

    let (status, head, body) = send_raw_with_head(
        addr,
        "PUT",
        "/addlink/asha@example.com",
        Some("application/json"),
        b"{not json",
    )
    .await;
    assert_eq!(status, 400);
    assert_json_error(&head, &body, "Invalid request body");

    let (status, head, body) = send_raw_with_head(
        addr,
        "POST",
        "/addCounselling",
        Some("application/json"),
        br#"{"student_id": 17}"#,
    )
    .await;
    assert_eq!(status, 400);
    assert_json_error(&head, &body, "Invalid request body");

    let (status, record) = get_json(addr, "/school/ghs@example.com").await;
    assert_eq!(status, 200);
    assert_eq!(record["requests"][0]["stage"], "requested");
    assert_eq!(record["requests"][0]["meetingLink"], serde_json::Value::Null);
}

#[tokio::test]
async fn meet_request_body_is_optional_but_must_be_valid() {
    let server = start().await;
    let addr = server.addr;

    let (status, body) = send_raw(addr, "POST", "/meetrequest/asha@example.com", None, b"").await;
    assert_eq!(status, 201);
    let created: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(created["counselling"]["requests"][0]["issue"], "");

    let (status, head, body) = send_raw_with_head(
        addr,
        "POST",
        "/meetrequest/asha@example.com",
        Some("application/json"),
        b"[1, 2",
    )
    .await;
    assert_eq!(status, 400);
    assert_json_error(&head, &body, "Invalid request body");
    assert_eq!(server.store.saves(), 1);
}

#[tokio::test]
async fn fee_upload_rejections_are_json_and_leave_ledger_untouched() {
    let server = start().await;
    let addr = server.addr;
    let upload = format!("/fees/{}/upload", server.school.id);

    let (status, head, body) = send_raw_with_head(
        addr,
        "POST",
        &upload,
        Some("application/json"),
        br#"{"file":"fees.csv"}"#,
    )
    .await;
    assert_eq!(status, 400);
    assert_json_error(&head, &body, "Expected a multipart/form-data upload");

    let boundary = "X-HEADER-ONLY";
    let sheet = multipart(boundary, "fees.csv", "Name,Number of unpaid month
");
    let (status, head, body) = send_raw_with_head(
        addr,
        "POST",
        &upload,
        Some(&format!("multipart/form-data; boundary={boundary}")),
        &sheet,
    )
    .await;
    assert_eq!(status, 400);
    assert_json_error(&head, &body, "Sheet contains no data rows");

    let (status, head, body) =
        send_raw_with_head(addr, "GET", "/fees/not-a-uuid", None, b"").await;
    assert_eq!(status, 400);
    assert_json_error(&head, &body, "Invalid school id");

    let (status, _) = get_json(addr, &format!("/fees/{}", server.school.id)).await;
    assert_eq!(status, 404);
    assert_eq!(server.store.saves(), 0);
}

#[tokio::test]
async fn risk_rejects_malformed_query_as_json() {
    let server = start().await;
    let (status, head, body) = send_raw_with_head(
        server.addr,
        "GET",
        &format!("/risk/{}?with_insights=maybe", server.school.id),
        None,
        b"",
    )
    .await;
    assert_eq!(status, 400);
    assert_json_error(&head, &body, "Invalid query string");
}
