#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use chatwire_client::{ChatClient, StaticToken, TurnOutcome};
use chatwire_core::{ChatwireError, ChatwireResult, FailureCategory, Role};
use chatwire_session::SessionUpdate;
use chatwire_transport::{
    Channel, Chunk, FrameDecoder, LineDecoder, OpenRequest, SocketDecoder, Transport,
    TransportKind,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
enum Item {
    Text(&'static str),
    Bytes(&'static [u8]),
    ReadError,
}

/// What one `open` call delivers.
#[derive(Clone)]
struct Reply {
    items: Vec<Item>,
    /// Keep the channel open after the items until it is closed.
    hold_open: bool,
}

impl Reply {
    fn ending(items: Vec<Item>) -> Self {
        Self {
            items,
            hold_open: false,
        }
    }

    fn held(items: Vec<Item>) -> Self {
        Self {
            items,
            hold_open: true,
        }
    }
}

/// In-memory transport replaying scripted replies, one per `open`.
struct ScriptedTransport {
    kind: TransportKind,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<OpenRequest>>,
    closed: Arc<AtomicBool>,
    refuse: bool,
}

impl ScriptedTransport {
    fn new(kind: TransportKind, replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            closed: Arc::new(AtomicBool::new(false)),
            refuse: false,
        })
    }

    fn refusing() -> Arc<Self> {
        Arc::new(Self {
            kind: TransportKind::Http,
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            closed: Arc::new(AtomicBool::new(false)),
            refuse: true,
        })
    }

    fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<OpenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn open(&self, request: &OpenRequest) -> ChatwireResult<Channel> {
        self.requests.lock().unwrap().push(request.clone());
        if self.refuse {
            return Err(ChatwireError::Transport("HTTP 401 Unauthorized".into()));
        }
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected open");
        let closed = Arc::clone(&self.closed);

        Ok(Channel::spawn(16, move |tx, close| async move {
            for item in reply.items {
                let chunk = match item {
                    Item::Text(t) => Ok(Chunk::Text(t.to_string())),
                    Item::Bytes(b) => Ok(Chunk::Bytes(b.to_vec())),
                    Item::ReadError => Err(ChatwireError::Transport("reset by peer".into())),
                };
                if tx.send(chunk).await.is_err() {
                    closed.store(true, Ordering::SeqCst);
                    return;
                }
            }
            if reply.hold_open && close.await.is_ok() {
                closed.store(true, Ordering::SeqCst);
            }
        }))
    }

    fn decoder(&self) -> Box<dyn FrameDecoder> {
        match self.kind {
            TransportKind::Socket => Box::new(SocketDecoder::new()),
            TransportKind::Http => Box::new(LineDecoder::new()),
        }
    }
}

fn client_for(transport: Arc<ScriptedTransport>) -> ChatClient {
    ChatClient::new(transport, Arc::new(StaticToken::new("tok")))
}

fn contents(client: &ChatClient) -> Vec<(Role, String)> {
    client
        .session()
        .transcript()
        .messages()
        .iter()
        .map(|m| (m.role, m.content.clone()))
        .collect()
}

fn system_count(client: &ChatClient) -> usize {
    contents(client)
        .iter()
        .filter(|(role, _)| *role == Role::System)
        .count()
}

#[tokio::test]
async fn test_socket_reply_streams_into_placeholder() {
    let transport = ScriptedTransport::new(
        TransportKind::Socket,
        vec![Reply::held(vec![
            Item::Text(r#"{"status":1,"content":"Hi"}"#),
            Item::Text(r#"{"status":2,"content":" there"}"#),
        ])],
    );
    let mut client = client_for(Arc::clone(&transport));

    assert_eq!(client.submit_question("hello").await.unwrap(), None);
    assert_eq!(
        contents(&client),
        vec![(Role::User, "hello".into()), (Role::Assistant, String::new())]
    );
    assert!(client.session().is_loading());

    assert_eq!(client.drive().await, Some(TurnOutcome::Completed));
    assert_eq!(
        contents(&client),
        vec![
            (Role::User, "hello".into()),
            (Role::Assistant, "Hi there".into())
        ]
    );
    assert!(!client.session().is_loading());
    assert!(!client.is_streaming());

    tokio::task::yield_now().await;
    assert!(transport.was_closed());

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(&requests[0].session_id, client.session().id());
    assert_eq!(requests[0].bearer_token.as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_http_line_split_across_chunks() {
    let transport = ScriptedTransport::new(
        TransportKind::Http,
        vec![Reply::held(vec![
            Item::Bytes(b"{\"type\":\"begin\"}\n{\"content\":\"A"),
            Item::Bytes(b"B\"}\n{\"type\":\"end\"}\n"),
        ])],
    );
    let mut client = client_for(transport);

    let outcome = client.ask("q").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(contents(&client)[1], (Role::Assistant, "AB".into()));
    assert_eq!(system_count(&client), 0);
}

#[tokio::test]
async fn test_http_graceful_end_flushes_remainder() {
    let transport = ScriptedTransport::new(
        TransportKind::Http,
        vec![Reply::ending(vec![Item::Bytes(
            b"data: {\"content\":\"par\"}\ndata: {\"content\":\"tial\"}",
        )])],
    );
    let mut client = client_for(transport);

    assert_eq!(client.ask("q").await.unwrap(), TurnOutcome::Completed);
    assert_eq!(contents(&client)[1], (Role::Assistant, "partial".into()));
    assert!(!client.session().is_loading());
}

#[tokio::test]
async fn test_server_error_yields_one_notice_and_stops() {
    let transport = ScriptedTransport::new(
        TransportKind::Socket,
        vec![Reply::held(vec![
            Item::Text(r#"{"status":1,"content":"par"}"#),
            Item::Text(r#"{"status":-1,"content":"quota exceeded"}"#),
            Item::Text(r#"{"status":1,"content":"late"}"#),
        ])],
    );
    let mut client = client_for(Arc::clone(&transport));

    let outcome = client.ask("q").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Failed(FailureCategory::Application));
    assert_eq!(
        contents(&client),
        vec![
            (Role::User, "q".into()),
            (Role::Assistant, "par".into()),
            (Role::System, "⚠️ quota exceeded".into()),
        ]
    );
    assert!(!client.session().is_loading());
    assert!(!client.is_streaming());
}

#[tokio::test]
async fn test_malformed_frame_is_decode_failure() {
    let transport = ScriptedTransport::new(
        TransportKind::Socket,
        vec![Reply::held(vec![Item::Text("{not json")])],
    );
    let mut client = client_for(transport);

    let outcome = client.ask("q").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Failed(FailureCategory::Decode));
    assert_eq!(system_count(&client), 1);
    assert_eq!(contents(&client)[1], (Role::Assistant, String::new()));
}

#[tokio::test]
async fn test_malformed_http_line_is_decode_failure() {
    let transport = ScriptedTransport::new(
        TransportKind::Http,
        vec![Reply::held(vec![
            Item::Bytes(b"{\"content\":\"x\"}\nnot json\n"),
            Item::Bytes(b"{\"content\":\"never applied\"}\n"),
        ])],
    );
    let mut client = client_for(Arc::clone(&transport));

    let outcome = client.ask("q").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Failed(FailureCategory::Decode));
    assert_eq!(
        contents(&client),
        vec![
            (Role::User, "q".into()),
            (Role::Assistant, "x".into()),
            (Role::System, "⚠️ Failed to parse the server reply".into()),
        ]
    );
    assert!(!client.session().is_loading());
    assert!(!client.is_streaming());

    tokio::task::yield_now().await;
    assert!(transport.was_closed());
}

#[tokio::test]
async fn test_read_error_is_transport_failure() {
    let transport = ScriptedTransport::new(
        TransportKind::Http,
        vec![Reply::ending(vec![
            Item::Bytes(b"{\"content\":\"x\"}\n"),
            Item::ReadError,
        ])],
    );
    let mut client = client_for(transport);

    let outcome = client.ask("q").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Failed(FailureCategory::Transport));
    assert_eq!(contents(&client)[1], (Role::Assistant, "x".into()));
    assert_eq!(system_count(&client), 1);
}

#[tokio::test]
async fn test_socket_close_before_end_reports_disconnect() {
    let transport = ScriptedTransport::new(
        TransportKind::Socket,
        vec![Reply::ending(vec![Item::Text(r#"{"status":1,"content":"half"}"#)])],
    );
    let mut client = client_for(transport);

    let outcome = client.ask("q").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Failed(FailureCategory::Transport));
    let (role, text) = contents(&client).pop().unwrap();
    assert_eq!(role, Role::System);
    assert!(text.contains("Connection lost"), "{text}");
}

#[tokio::test]
async fn test_open_failure_keeps_placeholder_and_adds_notice() {
    let transport = ScriptedTransport::refusing();
    let mut client = client_for(Arc::clone(&transport));

    let outcome = client.submit_question("q").await.unwrap();
    assert_eq!(outcome, Some(TurnOutcome::Failed(FailureCategory::Transport)));
    assert!(!client.session().is_loading());
    assert!(!client.is_streaming());
    assert_eq!(
        contents(&client),
        vec![
            (Role::User, "q".into()),
            (Role::Assistant, String::new()),
            (
                Role::System,
                "⚠️ Connection failed, check the token or network".into()
            ),
        ]
    );
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_overlapping_submission_is_rejected() {
    let transport = ScriptedTransport::new(
        TransportKind::Socket,
        vec![Reply::held(vec![Item::Text(r#"{"status":1,"content":"a"}"#)])],
    );
    let mut client = client_for(Arc::clone(&transport));

    client.submit_question("first").await.unwrap();
    assert_eq!(client.step().await, None);

    let err = client.submit_question("second").await.unwrap_err();
    assert!(matches!(err, ChatwireError::InvalidInput(_)));
    assert_eq!(client.session().transcript().len(), 2);
    assert_eq!(transport.requests().len(), 1);
    assert!(client.is_streaming());
}

#[tokio::test]
async fn test_start_session_closes_open_channel() {
    let transport = ScriptedTransport::new(
        TransportKind::Socket,
        vec![Reply::held(vec![Item::Text(r#"{"status":1,"content":"a"}"#)])],
    );
    let mut client = client_for(Arc::clone(&transport));
    let first_id = client.session().id().clone();

    client.submit_question("first").await.unwrap();
    client.step().await;

    let new_id = client.start_session();
    assert_ne!(new_id, first_id);
    assert!(client.session().transcript().is_empty());
    assert!(!client.session().is_loading());
    assert!(!client.is_streaming());

    tokio::task::yield_now().await;
    assert!(transport.was_closed());
}

#[tokio::test]
async fn test_cancel_keeps_partial_reply() {
    let transport = ScriptedTransport::new(
        TransportKind::Socket,
        vec![
            Reply::held(vec![Item::Text(r#"{"status":1,"content":"par"}"#)]),
            Reply::held(vec![Item::Text(r#"{"status":2,"content":"ok"}"#)]),
        ],
    );
    let mut client = client_for(transport);

    client.submit_question("first").await.unwrap();
    client.step().await;
    assert_eq!(client.cancel(), Some(TurnOutcome::Cancelled));
    assert_eq!(contents(&client)[1], (Role::Assistant, "par".into()));
    assert_eq!(system_count(&client), 0);
    assert!(!client.session().is_loading());

    assert_eq!(client.ask("second").await.unwrap(), TurnOutcome::Completed);
    assert_eq!(contents(&client)[3], (Role::Assistant, "ok".into()));
}

#[tokio::test]
async fn test_loading_lowers_once_per_turn() {
    let transport = ScriptedTransport::new(
        TransportKind::Socket,
        vec![Reply::held(vec![
            Item::Text(r#"{"status":2,"content":"done"}"#),
            Item::Text(r#"{"status":-1,"content":"after end"}"#),
        ])],
    );
    let mut client = client_for(transport);
    let mut updates = client.subscribe();

    client.ask("q").await.unwrap();

    let mut lowered = 0;
    while let Ok(update) = updates.try_recv() {
        if matches!(update, SessionUpdate::LoadingChanged { loading: false }) {
            lowered += 1;
        }
    }
    assert_eq!(lowered, 1);
    assert_eq!(system_count(&client), 0);
}

#[tokio::test]
async fn test_removed_placeholder_drops_deltas() {
    let transport = ScriptedTransport::new(
        TransportKind::Socket,
        vec![Reply::held(vec![
            Item::Text(r#"{"status":1,"content":"a"}"#),
            Item::Text(r#"{"status":2,"content":"b"}"#),
        ])],
    );
    let mut client = client_for(transport);

    client.submit_question("q").await.unwrap();
    let placeholder = client.session().transcript().last().unwrap().id;
    assert!(client.remove_message(placeholder));

    assert_eq!(client.drive().await, Some(TurnOutcome::Completed));
    assert_eq!(contents(&client), vec![(Role::User, "q".into())]);
    assert!(!client.session().is_loading());
}
