//! Integration tests for response emission.
//!
//! Tests cover: header assembly, cookies, redirects, JSON strictness,
//! streaming order, file chunking and HEAD handling, template events,
//! background task ordering, and the channel-backed sender.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use bytes::Bytes;
use http::{Method, StatusCode};
use serde_json::json;

use starling_core::{StarlingError, StarlingResult};
use starling_http::headers::RawHeaders;
use starling_http::scope::TEMPLATE_EXTENSION;
use starling_http::{
    BackgroundTask, Capabilities, Cookie, FileResponse, FileStat, JsonResponse, Message,
    PlainTextResponse, RedirectResponse, Respond, Response, ResponseHeaders, Scope, Sender,
    StreamingResponse, TemplateRenderer, TemplateResponse,
};

fn header<'a>(headers: &'a RawHeaders, name: &str) -> Option<&'a [u8]> {
    headers
        .iter()
        .find(|(k, _)| k.as_ref() == name.as_bytes())
        .map(|(_, v)| v.as_ref())
}

fn start_headers(events: &[Message]) -> &RawHeaders {
    match &events[0] {
        Message::Start { headers, .. } => headers,
        other => panic!("expected start event, got {other:?}"),
    }
}

fn body_events(events: &[Message]) -> Vec<(Bytes, bool)> {
    events
        .iter()
        .filter_map(|m| match m {
            Message::Body { body, more_body } => Some((body.clone(), *more_body)),
            _ => None,
        })
        .collect()
}

async fn emit(response: impl Into<Response>, scope: &Scope) -> StarlingResult<Vec<Message>> {
    let response: Response = response.into();
    let mut events: Vec<Message> = Vec::new();
    response.respond(scope, &mut events).await?;
    Ok(events)
}

/// A sender that records event kinds into a log shared with background tasks.
struct Recorder(Arc<Mutex<Vec<String>>>);

#[async_trait::async_trait]
impl Sender for Recorder {
    async fn send(&mut self, message: Message) -> StarlingResult<()> {
        self.0.lock().unwrap().push(message.kind().to_string());
        Ok(())
    }
}

struct Echo;

impl TemplateRenderer for Echo {
    fn render_template(&self, name: &str, context: &serde_json::Value) -> StarlingResult<String> {
        Ok(format!("{name}:{context}"))
    }
}

// ═════════════════════════════════════════════════════════════════════
// 1. Plain text: content-length and charset
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_plain_text_headers_and_body() {
    let events = emit(PlainTextResponse::new("hello"), &Scope::default())
        .await
        .unwrap();

    assert_eq!(events.len(), 2);
    let headers = start_headers(&events);
    assert_eq!(header(headers, "content-length"), Some(&b"5"[..]));
    assert_eq!(
        header(headers, "content-type"),
        Some(&b"text/plain; charset=utf-8"[..])
    );
    assert_eq!(events[1], Message::body(Bytes::from("hello"), false));
}

// ═════════════════════════════════════════════════════════════════════
// 2. Cookies: one header per cookie, in order
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_cookies_emit_separate_headers() {
    let mut resp = PlainTextResponse::new("ok");
    resp.set_cookie(&Cookie::new("a", "1"));
    resp.set_cookie(&Cookie::new("b", "2").max_age(60).secure(true));
    resp.delete_cookie("old", "/", None);

    let events = emit(resp, &Scope::default()).await.unwrap();
    let cookies: Vec<_> = start_headers(&events)
        .iter()
        .filter(|(k, _)| k.as_ref() == b"set-cookie")
        .map(|(_, v)| String::from_utf8(v.to_vec()).unwrap())
        .collect();

    assert_eq!(
        cookies,
        vec![
            "a=1; Path=/".to_string(),
            "b=2; Max-Age=60; Path=/; Secure".to_string(),
            "old=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/".to_string(),
        ]
    );
}

// ═════════════════════════════════════════════════════════════════════
// 3. Redirect: encoded Location, empty body
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_redirect_location_encoding() {
    let events = emit(RedirectResponse::new("/a b?x=1"), &Scope::default())
        .await
        .unwrap();

    let Message::Start { status, headers } = &events[0] else {
        panic!("expected start event");
    };
    assert_eq!(*status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(header(headers, "location"), Some(&b"/a%20b?x=1"[..]));
    assert_eq!(header(headers, "content-length"), Some(&b"0"[..]));
    assert_eq!(events[1], Message::end());
}

// ═════════════════════════════════════════════════════════════════════
// 4. JSON: compact output, non-finite floats rejected
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_json_compact_body() {
    let resp = JsonResponse::new(&Capabilities::detect(), &json!({"k": "v\u{e9}", "n": [1]})).unwrap();
    let events = emit(resp, &Scope::default()).await.unwrap();
    assert_eq!(
        body_events(&events)[0].0,
        Bytes::from("{\"k\":\"v\u{e9}\",\"n\":[1]}")
    );
    assert_eq!(
        header(start_headers(&events), "content-type"),
        Some(&b"application/json"[..])
    );
}

#[test]
fn test_json_nan_is_rejected() {
    let result = JsonResponse::new(&Capabilities::detect(), &vec![1.0, f64::NAN]);
    assert!(matches!(result, Err(StarlingError::SerializationError(_))));
}

// ═════════════════════════════════════════════════════════════════════
// 5. Streaming: one event per chunk plus the terminator
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_streaming_three_chunks() {
    let events = emit(
        StreamingResponse::from_iter(vec!["a", "b", "c"]),
        &Scope::default(),
    )
    .await
    .unwrap();

    assert!(header(start_headers(&events), "content-length").is_none());
    assert_eq!(
        body_events(&events),
        vec![
            (Bytes::from("a"), true),
            (Bytes::from("b"), true),
            (Bytes::from("c"), true),
            (Bytes::new(), false),
        ]
    );
}

// ═════════════════════════════════════════════════════════════════════
// 6. Files: chunk boundaries, HEAD, missing targets
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_file_exact_chunk_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("block.bin");
    std::fs::write(&path, vec![1u8; 4096]).unwrap();

    let resp = FileResponse::new(&Capabilities::detect(), &path)
        .unwrap()
        .with_chunk_size(4096);
    let events = emit(resp, &Scope::default()).await.unwrap();

    let bodies = body_events(&events);
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0].0.len(), 4096);
    assert!(bodies[0].1);
    assert_eq!(bodies[1], (Bytes::new(), false));
    assert_eq!(
        header(start_headers(&events), "content-length"),
        Some(&b"4096"[..])
    );
}

#[tokio::test]
async fn test_file_partial_last_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, vec![b'x'; 5000]).unwrap();

    let resp = FileResponse::new(&Capabilities::detect(), &path)
        .unwrap()
        .with_chunk_size(4096);
    let events = emit(resp, &Scope::default()).await.unwrap();

    let sizes: Vec<_> = body_events(&events)
        .iter()
        .map(|(b, more)| (b.len(), *more))
        .collect();
    assert_eq!(sizes, vec![(4096, true), (904, false)]);

    let headers = start_headers(&events);
    assert_eq!(
        header(headers, "content-type"),
        Some(&b"text/plain; charset=utf-8"[..])
    );
    assert!(header(headers, "last-modified").is_some());
    assert_eq!(header(headers, "etag").map(<[u8]>::len), Some(32));
}

#[tokio::test]
async fn test_file_head_request_from_scope() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.csv");
    std::fs::write(&path, vec![b'a'; 10_000]).unwrap();

    let scope = Scope::new(Method::HEAD, "/big.csv");
    let resp = FileResponse::new(&Capabilities::detect(), &path).unwrap();
    let events = emit(resp, &scope).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(
        header(start_headers(&events), "content-length"),
        Some(&b"10000"[..])
    );
    assert_eq!(events[1], Message::end());
}

#[tokio::test]
async fn test_file_missing_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut events: Vec<Message> = Vec::new();
    let err = FileResponse::new(&Capabilities::detect(), dir.path().join("nope.txt"))
        .unwrap()
        .respond(&Scope::default(), &mut events)
        .await
        .unwrap_err();

    assert!(matches!(err, StarlingError::NotFound(_)));
    assert_eq!(err.status_code(), 404);
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_file_directory_is_invalid_target() {
    let dir = tempfile::tempdir().unwrap();
    let mut events: Vec<Message> = Vec::new();
    let err = FileResponse::new(&Capabilities::detect(), dir.path())
        .unwrap()
        .respond(&Scope::default(), &mut events)
        .await
        .unwrap_err();

    assert!(matches!(err, StarlingError::InvalidTarget(_)));
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_file_vanished_after_precomputed_stat() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.txt");
    let stat = FileStat::new(3, SystemTime::now());

    let mut events: Vec<Message> = Vec::new();
    let err = FileResponse::new(&Capabilities::detect(), &path)
        .unwrap()
        .with_stat(stat)
        .respond(&Scope::default(), &mut events)
        .await
        .unwrap_err();

    assert!(matches!(err, StarlingError::IoError(_)));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), "http.response.start");
}

// ═════════════════════════════════════════════════════════════════════
// 7. Templates and background tasks: event ordering
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_template_event_precedes_start() {
    let scope = Scope::new(Method::GET, "/")
        .with_extension(TEMPLATE_EXTENSION)
        .with_app(Arc::new(Echo));
    let events = emit(TemplateResponse::new("index.html", json!({"a": 1})), &scope)
        .await
        .unwrap();

    let kinds: Vec<_> = events.iter().map(Message::kind).collect();
    assert_eq!(
        kinds,
        vec!["http.response.template", "http.response.start", "http.response.body"]
    );
    let Message::Start { headers, .. } = &events[1] else {
        panic!("expected start event");
    };
    assert_eq!(
        header(headers, "content-type"),
        Some(&b"text/html; charset=utf-8"[..])
    );
    assert_eq!(body_events(&events)[0].0, Bytes::from("index.html:{\"a\":1}"));
}

#[tokio::test]
async fn test_background_runs_after_final_body() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let task_log = log.clone();
    let task = BackgroundTask::new(move || async move {
        task_log.lock().unwrap().push("background".to_string());
        Ok(())
    });

    let mut recorder = Recorder(log.clone());
    StreamingResponse::from_iter(vec!["x"])
        .with_background(task)
        .respond(&Scope::default(), &mut recorder)
        .await
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "http.response.start",
            "http.response.body",
            "http.response.body",
            "background"
        ]
    );
}

// ═════════════════════════════════════════════════════════════════════
// 8. Channel sender
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_channel_sender_delivers_in_order() {
    let (mut tx, mut rx) = tokio::sync::mpsc::channel::<Message>(2);
    let producer = tokio::spawn(async move {
        StreamingResponse::from_iter((0..5).map(|i| i.to_string()))
            .respond(&Scope::default(), &mut tx)
            .await
    });

    let mut received = Vec::new();
    while let Some(message) = rx.recv().await {
        received.push(message);
    }
    producer.await.unwrap().unwrap();

    assert_eq!(received.len(), 7);
    let body: Vec<u8> = body_events(&received)
        .into_iter()
        .flat_map(|(b, _)| b.to_vec())
        .collect();
    assert_eq!(body, b"01234");
}

#[tokio::test]
async fn test_closed_channel_is_disconnected() {
    let (mut tx, rx) = tokio::sync::mpsc::channel::<Message>(1);
    drop(rx);
    let err = PlainTextResponse::new("late")
        .respond(&Scope::default(), &mut tx)
        .await
        .unwrap_err();
    assert!(matches!(err, StarlingError::Disconnected(_)));
    assert_eq!(err.status_code(), 499);
}
