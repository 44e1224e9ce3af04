pub use tunemint_core::*;

pub mod config;
pub mod de;
mod error;
pub mod keystore;
pub mod rpc;
pub mod service;
pub mod tx;

pub use error::Error;
pub use service::{
    Context,
    Outcome,
};
