//! Scripted card and verification service doubles

#![allow(dead_code, unreachable_pub)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chipscan::{HttpClient, HttpError, HttpReply};
use chipscan_apdu_core::{Bytes, CardTransport, CardTransportFactory, TransportError};
use serde_json::Value;
use url::Url;

/// What a card does with the next command
#[derive(Debug, Clone)]
pub enum Reply {
    /// Payload followed by SW1 SW2
    Data(Vec<u8>, [u8; 2]),
    /// Raw response bytes, status word included
    Raw(Vec<u8>),
    /// The exchange fails
    Fault(TransportError),
}

/// Shared script and log of a simulated card
#[derive(Debug, Default)]
pub struct Card {
    replies: Mutex<VecDeque<Reply>>,
    commands: Mutex<Vec<Vec<u8>>>,
    opened: AtomicUsize,
    released: AtomicUsize,
}

impl Card {
    pub fn scripted(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    /// Commands received so far, as uppercase hex
    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(hex::encode_upper)
            .collect()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Transport session on a [`Card`]
#[derive(Debug)]
pub struct CardSession(Arc<Card>);

impl CardTransport for CardSession {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.0.commands.lock().unwrap().push(command.to_vec());
        match self.0.replies.lock().unwrap().pop_front() {
            Some(Reply::Data(mut payload, sw)) => {
                payload.extend_from_slice(&sw);
                Ok(Bytes::from(payload))
            }
            Some(Reply::Raw(bytes)) => Ok(Bytes::from(bytes)),
            Some(Reply::Fault(e)) => Err(e),
            None => Err(TransportError::Other("script exhausted".to_string())),
        }
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl Drop for CardSession {
    fn drop(&mut self) {
        self.0.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory opening sessions on one [`Card`]
#[derive(Debug, Clone)]
pub struct CardReader {
    pub name: &'static str,
    pub card: Arc<Card>,
}

impl CardReader {
    pub fn new(card: Arc<Card>) -> Self {
        Self {
            name: "Test Reader 0",
            card,
        }
    }
}

impl CardTransportFactory for CardReader {
    type Transport = CardSession;

    fn open(&self, reader: &str) -> Result<CardSession, TransportError> {
        if reader != self.name {
            return Err(TransportError::ReaderNotFound(reader.to_string()));
        }
        self.card.opened.fetch_add(1, Ordering::SeqCst);
        Ok(CardSession(Arc::clone(&self.card)))
    }
}

/// HTTP stub answering each endpoint path with a fixed status and body
#[derive(Debug, Default)]
pub struct StubServer {
    routes: HashMap<&'static str, (u16, String)>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl StubServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &'static str, status: u16, body: Value) -> Self {
        self.routes.insert(path, (status, body.to_string()));
        self
    }

    pub fn route_raw(mut self, path: &'static str, status: u16, body: &str) -> Self {
        self.routes.insert(path, (status, body.to_string()));
        self
    }

    /// The default happy-path replies
    pub fn happy() -> Self {
        Self::new()
            .route(
                "get-challenge",
                200,
                serde_json::json!({ "picc-challenge": "00112233" }),
            )
            .route(
                "pcd-challenge",
                200,
                serde_json::json!({ "pcd-response": "C0FFEE" }),
            )
            .route(
                "check-response",
                200,
                serde_json::json!({ "check-result": "pass", "result-data": "member 42" }),
            )
    }

    /// Number of requests made to `path`
    pub fn calls(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }

    /// Body of the first request made to `path`
    pub fn body(&self, path: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
    }
}

impl HttpClient for StubServer {
    fn post_json(&self, url: &Url, body: &Value) -> Result<HttpReply, HttpError> {
        let path = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();
        self.requests
            .lock()
            .unwrap()
            .push((path.clone(), body.clone()));

        match self.routes.get(path.as_str()) {
            Some((status, reply)) => Ok(HttpReply::new(*status, reply.clone())),
            None => Err(format!("no route for {path}").into()),
        }
    }
}

pub const OK: [u8; 2] = [0x90, 0x00];
pub const NOT_FOUND: [u8; 2] = [0x6A, 0x82];

/// UID as the reader returns it, least significant byte first
pub const RAW_UID: [u8; 7] = [0x80, 0x9E, 0x8D, 0x7C, 0x6B, 0x5A, 0x04];
pub const UID_HEX: &str = "045A6B7C8D9E80";
