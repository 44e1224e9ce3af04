use std::{
    cell::RefCell,
    collections::{
        HashMap,
        VecDeque,
    },
    thread,
    time::Duration,
};

use base64::{
    engine::general_purpose::STANDARD as BASE64,
    Engine,
};
use serde_json::Value;

use super::Transport;
use crate::Error;

type Reply = Result<Value, (i64, String)>;

/// Canned responses keyed by method, consumed in order
#[derive(Default)]
pub(crate) struct Fixture {
    replies: RefCell<HashMap<String, VecDeque<Reply>>>,
    calls: RefCell<Vec<(String, Value)>>,
    delays: HashMap<String, Duration>,
}

impl Fixture {
    pub fn new() -> Self { Self::default() }

    pub fn with(self, method: &str, result: Value) -> Self {
        self.push(method, Ok(result));
        self
    }

    pub fn with_json(self, method: &str, json: &str) -> Self { self.with(method, serde_json::from_str(json).unwrap()) }

    pub fn fail(self, method: &str, code: i64, message: &str) -> Self {
        self.push(method, Err((code, message.to_owned())));
        self
    }

    /// Blocks every request to `method` for `delay` before replying
    pub fn slow(mut self, method: &str, delay: Duration) -> Self {
        self.delays.insert(method.to_owned(), delay);
        self
    }

    pub fn push(&self, method: &str, reply: Reply) { self.replies.borrow_mut().entry(method.to_owned()).or_default().push_back(reply); }

    /// Params of every request made to `method`
    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.calls
            .borrow()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Decoded first param of each call to `method`, for dev-inspect/execute bytes
    pub fn submitted(&self, method: &str) -> Vec<Vec<u8>> {
        self.calls(method)
            .iter()
            .map(|p| BASE64.decode(p[if method == "sui_devInspectTransactionBlock" { 1 } else { 0 }].as_str().unwrap()).unwrap())
            .collect()
    }
}

impl Transport for Fixture {
    fn request(&self, method: &str, params: Value) -> Result<Value, Error> {
        self.calls.borrow_mut().push((method.to_owned(), params));
        if let Some(delay) = self.delays.get(method) {
            thread::sleep(*delay);
        }
        match self.replies.borrow_mut().get_mut(method).and_then(VecDeque::pop_front) {
            Some(Ok(result)) => Ok(result),
            Some(Err((code, message))) => Err(Error::Rpc { code, message }),
            None => Err(Error::Transport(format!("no fixture for {method}"))),
        }
    }
}
