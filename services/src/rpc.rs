//! Blocking JSON-RPC client for a Sui full node.

use std::{
    sync::atomic::{
        AtomicU64,
        Ordering,
    },
    thread,
    time::{
        Duration,
        Instant,
    },
};

use base64::{
    engine::general_purpose::STANDARD as BASE64,
    Engine,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use serde_json::{
    json,
    Value,
};
use tracing::debug;
use tunemint_core::{
    Address,
    ObjectId,
};

use crate::{
    de::u64_from_str_or_num,
    Error,
};

mod fields;
mod types;

pub use fields::Fields;
pub use types::*;

#[cfg(test)]
pub(crate) mod fixture;

/// Page size used when following cursors
pub const PAGE_SIZE: usize = 50;


/// Sends one JSON-RPC request and returns its `result`
pub trait Transport {
    /// # Errors
    ///
    /// Transport failures, or the node's error object as [`Error::Rpc`]
    fn request(&self, method: &str, params: Value) -> Result<Value, Error>;
}

pub struct HttpTransport {
    http: reqwest::blocking::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Fails if the HTTP client can not be built
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            http: reqwest::blocking::Client::builder().timeout(timeout).build()?,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn into_result(self) -> Result<Value, Error> {
        match self {
            Self { error: Some(RpcErrorObject { code, message }), .. } => Err(Error::Rpc { code, message }),
            Self { result: Some(result), .. } => Ok(result),
            Self { result: None, .. } => Ok(Value::Null),
        }
    }
}

impl Transport for HttpTransport {
    fn request(&self, method: &str, params: Value) -> Result<Value, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, %params, "rpc request");

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()?
            .error_for_status()?
            .json()?;
        response.into_result()
    }
}


pub struct SuiClient<T = HttpTransport> {
    transport: T,
}

impl SuiClient {
    /// # Errors
    ///
    /// Fails if the HTTP client can not be built
    pub fn connect(url: &str, timeout: Duration) -> Result<Self, Error> { HttpTransport::new(url, timeout).map(Self::new) }
}

impl<T: Transport> SuiClient<T> {
    pub fn new(transport: T) -> Self { Self { transport } }

    pub fn transport(&self) -> &T { &self.transport }

    fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, Error> {
        let result = self.transport.request(method, params)?;
        serde_json::from_value(result).map_err(|e| Error::Decode(format!("{method}: {e}")))
    }

    /// # Errors
    ///
    /// RPC failures, or the node reporting the object as missing or deleted
    pub fn get_object(&self, id: ObjectId, options: ObjectOptions) -> Result<SuiObjectData, Error> {
        self.call::<SuiObjectResponse>("sui_getObject", json!([id, options]))?.into_data()
    }

    /// # Errors
    ///
    /// RPC failures
    pub fn multi_get_objects(&self, ids: &[ObjectId], options: ObjectOptions) -> Result<Vec<SuiObjectResponse>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.call("sui_multiGetObjects", json!([ids, options]))
    }

    /// # Errors
    ///
    /// RPC failures
    pub fn get_dynamic_fields(&self, parent: ObjectId, cursor: Option<&Value>, limit: usize) -> Result<Page<DynamicFieldInfo, Value>, Error> {
        self.call("suix_getDynamicFields", json!([parent, cursor, limit]))
    }

    /// Every dynamic field of `parent`, following cursors
    ///
    /// # Errors
    ///
    /// RPC failures
    pub fn get_all_dynamic_fields(&self, parent: ObjectId) -> Result<Vec<DynamicFieldInfo>, Error> {
        let mut fields = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.get_dynamic_fields(parent, cursor.as_ref(), PAGE_SIZE)?;
            fields.extend(page.data);
            match page.next_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => break,
            }
        }
        debug!(%parent, count = fields.len(), "dynamic fields");
        Ok(fields)
    }

    /// Objects owned by `owner`, optionally limited to a struct type, following cursors
    ///
    /// # Errors
    ///
    /// RPC failures
    pub fn get_owned_objects(&self, owner: Address, struct_type: Option<&str>, options: ObjectOptions) -> Result<Vec<SuiObjectData>, Error> {
        let query = match struct_type {
            Some(ty) => json!({ "filter": { "StructType": ty }, "options": options }),
            None => json!({ "options": options }),
        };

        let mut objects = Vec::new();
        let mut cursor = Value::Null;
        loop {
            let page: Page<SuiObjectResponse, Value> = self.call("suix_getOwnedObjects", json!([owner, query, cursor, PAGE_SIZE]))?;
            objects.extend(page.data.into_iter().filter_map(|r| r.data));
            match page.next_cursor {
                Some(next) if page.has_next_page => cursor = next,
                _ => break,
            }
        }
        debug!(%owner, count = objects.len(), "owned objects");
        Ok(objects)
    }

    /// # Errors
    ///
    /// RPC failures
    pub fn query_events(&self, event_type: &str, limit: usize, descending: bool) -> Result<Page<SuiEvent, EventId>, Error> {
        self.call("suix_queryEvents", json!([{ "MoveEventType": event_type }, null, limit, descending]))
    }

    /// # Errors
    ///
    /// RPC failures, including the node not knowing the digest yet
    pub fn get_transaction_block(&self, digest: &str, options: TransactionOptions) -> Result<TransactionBlockResponse, Error> {
        self.call("sui_getTransactionBlock", json!([digest, options]))
    }

    /// Simulates a transaction kind without gas or signatures
    ///
    /// # Errors
    ///
    /// RPC failures
    pub fn dev_inspect(&self, sender: Address, tx_kind: &[u8]) -> Result<DevInspectResults, Error> {
        self.call("sui_devInspectTransactionBlock", json!([sender, BASE64.encode(tx_kind), null, null]))
    }

    /// # Errors
    ///
    /// RPC failures
    pub fn dry_run(&self, tx_data: &[u8]) -> Result<DryRunResponse, Error> {
        self.call("sui_dryRunTransactionBlock", json!([BASE64.encode(tx_data)]))
    }

    /// # Errors
    ///
    /// RPC failures, including the node rejecting the signature or inputs
    pub fn execute(&self, tx_data: &[u8], signature: &str) -> Result<TransactionBlockResponse, Error> {
        self.call(
            "sui_executeTransactionBlock",
            json!([BASE64.encode(tx_data), [signature], TransactionOptions::full(), "WaitForLocalExecution"]),
        )
    }

    /// # Errors
    ///
    /// RPC failures
    pub fn get_reference_gas_price(&self) -> Result<u64, Error> {
        #[derive(Deserialize)]
        struct Price(#[serde(deserialize_with = "u64_from_str_or_num")] u64);

        self.call::<Price>("suix_getReferenceGasPrice", json!([])).map(|Price(p)| p)
    }

    /// # Errors
    ///
    /// RPC failures
    pub fn get_coins(&self, owner: Address, coin_type: &str, cursor: Option<&Value>) -> Result<Page<Coin, Value>, Error> {
        self.call("suix_getCoins", json!([owner, coin_type, cursor, PAGE_SIZE]))
    }

    /// Polls until the node knows `digest`
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] once `timeout` elapses, or any non-RPC failure
    pub fn wait_for_transaction(&self, digest: &str, timeout: Duration, interval: Duration) -> Result<TransactionBlockResponse, Error> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.get_transaction_block(digest, TransactionOptions::full()) {
                Ok(tx) => return Ok(tx),
                Err(e @ Error::Rpc { .. }) if Instant::now() < deadline => debug!("{digest} not available yet: {e}"),
                Err(Error::Rpc { .. }) => return Err(Error::Timeout(format!("transaction {digest}"))),
                Err(e) => return Err(e),
            }
            thread::sleep(interval);
        }
    }
}
