//! Programmable transaction building, gas selection and dev-inspect return values.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use tunemint_core::{
    Address,
    EncodeError,
    MoveArg,
    MoveCall,
    ObjectId,
};

use crate::{
    rpc::{
        DevInspectResults,
        ObjectOptions,
        Owner,
        SuiClient,
        Transport,
    },
    Error,
};

mod data;
pub use data::*;

#[cfg(test)]
mod tests;

pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// Inputs and commands are addressed by `u16`
fn index(position: usize) -> Result<u16, EncodeError> { u16::try_from(position).map_err(|_| EncodeError::ExceededMaxLen(position)) }


#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Pure(Vec<u8>),
    Object { id: ObjectId, mutable: bool },
}

/// Accumulates move calls into one programmable transaction
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    inputs: Vec<Input>,
    commands: Vec<Command>,
    gas_spend: u64,
}

impl TransactionBuilder {
    pub fn new() -> Self { Self::default() }

    /// MIST split off the gas coin for payments
    pub fn gas_spend(&self) -> u64 { self.gas_spend }

    pub fn is_empty(&self) -> bool { self.commands.is_empty() }

    /// Appends a call to `package::MODULE::FUNCTION`
    ///
    /// # Errors
    ///
    /// A pure argument failed to encode, or the transaction ran out of input or command indices
    pub fn move_call<C: MoveCall>(&mut self, package: ObjectId, call: &C) -> Result<&mut Self, EncodeError> {
        let arguments = call
            .arguments()?
            .into_iter()
            .map(|arg| match arg {
                MoveArg::Object { id, mutable } => self.object(id, mutable),
                MoveArg::Pure(bytes) => self.input(Input::Pure(bytes)),
                MoveArg::SplitGas(amount) => self.split_gas(amount),
            })
            .collect::<Result<_, _>>()?;

        self.commands.push(Command::MoveCall(Box::new(ProgrammableMoveCall {
            package,
            module: C::MODULE.to_owned(),
            function: C::FUNCTION.to_owned(),
            type_arguments: call.type_arguments(),
            arguments,
        })));
        Ok(self)
    }

    fn input(&mut self, input: Input) -> Result<Argument, EncodeError> {
        let index = index(self.inputs.len())?;
        self.inputs.push(input);
        Ok(Argument::Input(index))
    }

    /// Reuses an existing input for the same object, widening it to mutable if needed
    fn object(&mut self, id: ObjectId, mutable: bool) -> Result<Argument, EncodeError> {
        let existing = self.inputs.iter_mut().enumerate().find_map(|(i, input)| match input {
            Input::Object { id: other, mutable: m } if *other == id => Some((i, m)),
            _ => None,
        });
        match existing {
            Some((i, m)) => {
                *m |= mutable;
                Ok(Argument::Input(index(i)?))
            },
            None => self.input(Input::Object { id, mutable }),
        }
    }

    fn split_gas(&mut self, amount: u64) -> Result<Argument, EncodeError> {
        let command = index(self.commands.len())?;
        let input = self.input(Input::Pure(amount.to_le_bytes().to_vec()))?;
        self.gas_spend += amount;
        self.commands.push(Command::SplitCoins(Argument::GasCoin, vec![input]));
        Ok(Argument::NestedResult(command, 0))
    }

    /// Looks up object versions and ownership to produce the final inputs
    ///
    /// # Errors
    ///
    /// RPC failures, or an object that no longer exists
    pub fn resolve<T: Transport>(&self, client: &SuiClient<T>) -> Result<TransactionKind, Error> {
        let ids: Vec<ObjectId> = self
            .inputs
            .iter()
            .filter_map(|input| match input {
                Input::Object { id, .. } => Some(*id),
                Input::Pure(_) => None,
            })
            .collect();
        let mut objects = client
            .multi_get_objects(&ids, ObjectOptions::owner())?
            .into_iter()
            .map(|r| r.into_data());

        let inputs = self
            .inputs
            .iter()
            .map(|input| match input {
                Input::Pure(bytes) => Ok(CallArg::Pure(bytes.clone())),
                Input::Object { id, mutable } => {
                    let object = objects
                        .next()
                        .ok_or_else(|| Error::Decode(format!("object {id} missing from response")))??;
                    let arg = match object.owner {
                        Some(Owner::Shared { initial_shared_version }) => ObjectArg::SharedObject {
                            id: object.object_id,
                            initial_shared_version,
                            mutable: *mutable,
                        },
                        _ => ObjectArg::ImmOrOwnedObject((object.object_id, object.version, Digest::from_base58(&object.digest)?)),
                    };
                    Ok(CallArg::Object(arg))
                },
            })
            .collect::<Result<_, Error>>()?;

        Ok(TransactionKind::ProgrammableTransaction(ProgrammableTransaction {
            inputs,
            commands: self.commands.clone(),
        }))
    }

    /// BCS transaction kind, as sent to dev-inspect
    ///
    /// # Errors
    ///
    /// RPC failures
    pub fn inspect_kind<T: Transport>(&self, client: &SuiClient<T>) -> Result<Vec<u8>, Error> {
        Ok(bcs::to_bytes(&self.resolve(client)?)?)
    }
}


/// Owned SUI coins covering `required` MIST, largest first
///
/// # Errors
///
/// RPC failures, or [`Error::InsufficientBalance`]
pub fn select_gas<T: Transport>(client: &SuiClient<T>, owner: Address, required: u64) -> Result<Vec<ObjectRef>, Error> {
    let mut coins = Vec::new();
    let mut cursor: Option<Value> = None;
    loop {
        let page = client.get_coins(owner, SUI_COIN_TYPE, cursor.as_ref())?;
        coins.extend(page.data);
        match page.next_cursor {
            Some(next) if page.has_next_page => cursor = Some(next),
            _ => break,
        }
    }
    coins.sort_by(|a, b| b.balance.cmp(&a.balance));

    let mut total = 0u64;
    let mut payment = Vec::new();
    for coin in coins {
        if total >= required {
            break;
        }
        total = total.saturating_add(coin.balance);
        payment.push((coin.coin_object_id, coin.version, Digest::from_base58(&coin.digest)?));
    }
    debug!(%owner, required, total, coins = payment.len(), "gas selection");

    if total < required || payment.is_empty() {
        return Err(Error::InsufficientBalance { required, available: total });
    }
    Ok(payment)
}


/// Return values of the last call in a dev-inspected transaction
#[derive(Debug, Clone)]
pub struct ReturnValues(Vec<Vec<u8>>);

impl ReturnValues {
    /// # Errors
    ///
    /// The simulated call aborted
    pub fn from_results(results: DevInspectResults) -> Result<Self, Error> {
        if let Some(error) = results.error {
            return Err(Error::Execution(error));
        }
        if let Some(effects) = &results.effects {
            effects.status.check()?;
        }
        let values = results
            .results
            .into_iter()
            .last()
            .map(|r| r.return_values.into_iter().map(|(bytes, _)| bytes).collect())
            .unwrap_or_default();
        Ok(Self(values))
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// # Errors
    ///
    /// Missing value, or bytes that do not decode as `R`
    pub fn get<R: DeserializeOwned>(&self, index: usize) -> Result<R, Error> {
        let bytes = self
            .0
            .get(index)
            .ok_or_else(|| Error::Decode(format!("no return value at index {index}")))?;
        bcs::from_bytes(bytes).map_err(|e| Error::Decode(format!("return value {index}: {e}")))
    }

    /// # Errors
    ///
    /// See [`Self::get`]
    pub fn u64(&self, index: usize) -> Result<u64, Error> { self.get(index) }

    /// # Errors
    ///
    /// See [`Self::get`]
    pub fn bool(&self, index: usize) -> Result<bool, Error> { self.get(index) }

    /// # Errors
    ///
    /// See [`Self::get`]
    pub fn address(&self, index: usize) -> Result<Address, Error> { self.get(index) }
}
