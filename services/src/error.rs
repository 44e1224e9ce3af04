//! Error types for chain access.

use std::fmt;

use tunemint_core::Mist;

#[derive(Debug)]
pub enum Error {
    /// HTTP or connection failure
    Transport(String),
    /// JSON-RPC error object returned by the node
    Rpc { code: i64, message: String },
    /// Response did not have the expected shape
    Decode(String),
    /// Transaction bytes could not be built
    Encode(String),
    /// Owned SUI does not cover the gas budget and payments
    InsufficientBalance { required: u64, available: u64 },
    /// Transaction or dev-inspect aborted on chain
    Execution(String),
    /// Gave up polling
    Timeout(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(msg) => write!(f, "transport error: {msg}"),
            Error::Rpc { code, message } => write!(f, "rpc error {code}: {message}"),
            Error::Decode(msg) => write!(f, "unexpected response: {msg}"),
            Error::Encode(msg) => write!(f, "could not encode transaction: {msg}"),
            Error::InsufficientBalance { required, available } => {
                write!(f, "insufficient SUI balance: need {} SUI, have {} SUI", Mist(*required), Mist(*available))
            },
            Error::Execution(msg) => write!(f, "execution failed: {msg}"),
            Error::Timeout(msg) => write!(f, "timed out: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self { Error::Transport(e.to_string()) }
}

impl From<bcs::Error> for Error {
    fn from(e: bcs::Error) -> Self { Error::Encode(e.to_string()) }
}
