use serde::Serialize;

use crate::{
    ObjectId,
    TypeTag,
};

pub type EncodeError = bcs::Error;

/// A single argument to a contract entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveArg {
    Object { id: ObjectId, mutable: bool },
    /// BCS encoded value
    Pure(Vec<u8>),
    /// A coin holding the given MIST amount, split off the gas coin
    SplitGas(u64),
}

impl MoveArg {
    pub fn object(id: ObjectId) -> Self { Self::Object { id, mutable: true } }

    pub fn read_only(id: ObjectId) -> Self { Self::Object { id, mutable: false } }

    pub fn pure<T: Serialize + ?Sized>(value: &T) -> Result<Self, EncodeError> { bcs::to_bytes(value).map(Self::Pure) }
}

/// A call to `<package>::MODULE::FUNCTION`
///
/// Usually implemented with `#[derive(MoveCall)]`
pub trait MoveCall {
    const MODULE: &'static str;
    const FUNCTION: &'static str;

    fn type_arguments(&self) -> Vec<TypeTag> { Vec::new() }

    /// # Errors
    ///
    /// Fails if a pure argument can not be BCS encoded
    fn arguments(&self) -> Result<Vec<MoveArg>, EncodeError>;
}
