use std::fmt;

use anyhow::{
    bail,
    Context as _,
    Result,
};
use serde::Deserialize;
use tracing::{
    debug,
    info,
    warn,
};
use tunemint_derive::MoveCall;

use super::{
    nft::OwnedNft,
    Context,
    Outcome,
};
use crate::{
    rpc::{
        HttpTransport,
        ObjectChange,
        ObjectOptions,
        SuiEvent,
        TransactionOptions,
        Transport,
    },
    tx::TransactionBuilder,
    Address,
    ObjectId,
    TypeTag,
};

pub const TRADE_REQUEST_TYPE: &str = "TradeRequest";
const EVENT_LIMIT: usize = 50;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
    Rejected,
    Unknown(u64),
}

impl From<u64> for TradeStatus {
    fn from(value: u64) -> Self {
        match value {
            0 => Self::Pending,
            1 => Self::Accepted,
            2 => Self::Completed,
            3 => Self::Cancelled,
            4 => Self::Rejected,
            n => Self::Unknown(n),
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Accepted => f.write_str("accepted"),
            Self::Completed => f.write_str("completed"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Rejected => f.write_str("rejected"),
            Self::Unknown(n) => write!(f, "unknown ({n})"),
        }
    }
}

/// Payload of `trade::TradeCreatedEvent`
#[derive(Debug, Clone, Deserialize)]
struct TradeCreated {
    initiator: Address,
    target: Address,
    initiator_nft_id: ObjectId,
    target_nft_id: ObjectId,
}

/// A swap offer the account takes part in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub trade_id: ObjectId,
    pub initiator: Address,
    pub target: Address,
    pub initiator_nft_id: ObjectId,
    pub target_nft_id: ObjectId,
    /// Type parameters of the `TradeRequest`: offered then requested
    pub nft_types: Option<(TypeTag, TypeTag)>,
    pub status: TradeStatus,
    pub created_ms: Option<u64>,
    pub is_initiator: bool,
    /// `None` when the NFT could not be fetched
    pub initiator_nft: Option<OwnedNft>,
    pub target_nft: Option<OwnedNft>,
}

impl Trade {
    fn types(&self) -> Result<(TypeTag, TypeTag)> { self.nft_types.clone().context("Cannot determine NFT types for this trade") }
}


#[derive(MoveCall)]
#[move_call(module = "trade", function = "create_trade")]
struct CreateTrade {
    #[type_arg]
    offered: TypeTag,
    #[type_arg]
    requested: TypeTag,
    #[object]
    initiator_nft: ObjectId,
    target: Address,
    target_nft_id: ObjectId,
    #[object(read_only)]
    clock: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "trade", function = "accept_trade")]
struct AcceptTrade {
    #[type_arg]
    offered: TypeTag,
    #[type_arg]
    requested: TypeTag,
    #[object]
    trade: ObjectId,
    #[object]
    target_nft: ObjectId,
    #[object(read_only)]
    clock: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "trade", function = "complete_trade")]
struct CompleteTrade {
    #[type_arg]
    offered: TypeTag,
    #[type_arg]
    requested: TypeTag,
    #[object]
    trade: ObjectId,
    #[object(read_only)]
    clock: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "trade", function = "reject_trade")]
struct RejectTrade {
    #[type_arg]
    offered: TypeTag,
    #[type_arg]
    requested: TypeTag,
    #[object]
    trade: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "trade", function = "cancel_trade")]
struct CancelTrade {
    #[type_arg]
    offered: TypeTag,
    #[type_arg]
    requested: TypeTag,
    #[object]
    trade: ObjectId,
}


pub struct Trading<'c, T = HttpTransport> {
    ctx: &'c Context<T>,
}

impl<T: Transport> Context<T> {
    pub fn trading(&self) -> Trading<'_, T> { Trading { ctx: self } }
}

impl<T: Transport> Trading<'_, T> {
    fn package(&self) -> ObjectId { self.ctx.config.trading.package_id }

    fn object_type(&self, id: ObjectId) -> Result<TypeTag> {
        let object = self.ctx.client.get_object(id, ObjectOptions::content())?;
        let ty = object.type_.with_context(|| format!("{id} has no type"))?;
        ty.parse().with_context(|| format!("Unsupported NFT type {ty}"))
    }

    /// Offers `offered` from the account's wallet for `requested` held by `target`
    pub fn create(&self, offered: ObjectId, target: Address, requested: ObjectId) -> Result<Outcome> {
        let call = CreateTrade {
            offered: self.object_type(offered).context("Failed to look up offered NFT")?,
            requested: self.object_type(requested).context("Failed to look up requested NFT")?,
            initiator_nft: offered,
            target,
            target_nft_id: requested,
            clock: ObjectId::CLOCK,
        };
        let outcome = self.ctx.call(self.package(), &call)?;
        if let Some(trade_id) = outcome.created_of_type(TRADE_REQUEST_TYPE) {
            info!(%trade_id, "Trade request created");
        }
        Ok(outcome)
    }

    /// Recent trades the account initiated or was offered, newest first
    pub fn trades(&self) -> Result<Vec<Trade>> {
        let account = self.ctx.require_account()?;
        let event_type = format!("{}::trade::TradeCreatedEvent", self.package());
        let events = self
            .ctx
            .client
            .query_events(&event_type, EVENT_LIMIT, true)
            .context("Failed to fetch trade events")?;

        let trades: Vec<_> = events
            .data
            .iter()
            .filter_map(|event| {
                let created: TradeCreated = match serde_json::from_value(event.parsed_json.clone()) {
                    Ok(created) => created,
                    Err(e) => {
                        warn!("Skipping malformed trade event {}: {e}", event.id.tx_digest);
                        return None;
                    },
                };
                if created.initiator != account && created.target != account {
                    return None;
                }
                match self.trade(event, created, account) {
                    Ok(trade) => trade,
                    Err(e) => {
                        warn!("Skipping trade from {}: {e:#}", event.id.tx_digest);
                        None
                    },
                }
            })
            .collect();
        debug!(events = events.data.len(), trades = trades.len(), "trades");
        Ok(trades)
    }

    fn trade(&self, event: &SuiEvent, created: TradeCreated, account: Address) -> Result<Option<Trade>> {
        let client = &self.ctx.client;
        let options = TransactionOptions {
            show_effects: true,
            show_object_changes: true,
            ..TransactionOptions::default()
        };
        let tx = client.get_transaction_block(&event.id.tx_digest, options)?;
        let Some((trade_id, trade_type)) = tx.object_changes.iter().find_map(|change| match change {
            ObjectChange::Created { object_id, object_type, .. } if object_type.contains(TRADE_REQUEST_TYPE) => {
                Some((*object_id, object_type.as_str()))
            },
            _ => None,
        }) else {
            return Ok(None);
        };

        let request = client.get_object(trade_id, ObjectOptions::content())?;
        let status = request
            .fields()
            .and_then(|f| f.u64("status"))
            .unwrap_or_default();

        Ok(Some(Trade {
            trade_id,
            initiator: created.initiator,
            target: created.target,
            initiator_nft_id: created.initiator_nft_id,
            target_nft_id: created.target_nft_id,
            nft_types: crate::split_type_params(trade_type),
            status: status.into(),
            created_ms: event.timestamp_ms,
            is_initiator: created.initiator == account,
            initiator_nft: self.nft(created.initiator_nft_id),
            target_nft: self.nft(created.target_nft_id),
        }))
    }

    fn nft(&self, id: ObjectId) -> Option<OwnedNft> {
        match self.ctx.client.get_object(id, ObjectOptions::display()) {
            Ok(object) => OwnedNft::from_object(&object),
            Err(e) => {
                debug!(%id, "NFT unavailable: {e}");
                None
            },
        }
    }

    fn with_status(&self, status: TradeStatus) -> Result<Vec<Trade>> {
        let mut trades = self.trades()?;
        trades.retain(|t| t.status == status);
        Ok(trades)
    }

    pub fn pending(&self) -> Result<Vec<Trade>> { self.with_status(TradeStatus::Pending) }

    pub fn accepted(&self) -> Result<Vec<Trade>> { self.with_status(TradeStatus::Accepted) }

    pub fn history(&self) -> Result<Vec<Trade>> { self.with_status(TradeStatus::Completed) }

    pub fn find(&self, trade_id: ObjectId) -> Result<Trade> {
        self.trades()?
            .into_iter()
            .find(|t| t.trade_id == trade_id)
            .with_context(|| format!("Trade {trade_id} not found among your recent trades"))
    }

    /// Accepts as the target, completing the swap in the same transaction unless `accept_only`
    pub fn accept(&self, trade: &Trade, accept_only: bool) -> Result<Outcome> {
        if trade.is_initiator {
            bail!("Only the receiving party can accept a trade");
        }
        let (offered, requested) = trade.types()?;
        let mut builder = TransactionBuilder::new();
        builder.move_call(self.package(), &AcceptTrade {
            offered: offered.clone(),
            requested: requested.clone(),
            trade: trade.trade_id,
            target_nft: trade.target_nft_id,
            clock: ObjectId::CLOCK,
        })?;
        if !accept_only {
            builder.move_call(self.package(), &CompleteTrade {
                offered,
                requested,
                trade: trade.trade_id,
                clock: ObjectId::CLOCK,
            })?;
        }
        self.ctx.execute(&builder)
    }

    /// Finishes a previously accepted trade
    pub fn complete(&self, trade: &Trade) -> Result<Outcome> {
        let (offered, requested) = trade.types()?;
        let call = CompleteTrade {
            offered,
            requested,
            trade: trade.trade_id,
            clock: ObjectId::CLOCK,
        };
        self.ctx.call(self.package(), &call)
    }

    pub fn reject(&self, trade: &Trade) -> Result<Outcome> {
        if trade.is_initiator {
            bail!("Only the receiving party can reject a trade; cancel it instead");
        }
        let (offered, requested) = trade.types()?;
        let call = RejectTrade {
            offered,
            requested,
            trade: trade.trade_id,
        };
        self.ctx.call(self.package(), &call)
    }

    pub fn cancel(&self, trade: &Trade) -> Result<Outcome> {
        if !trade.is_initiator {
            bail!("Only the initiator can cancel a trade; reject it instead");
        }
        let (offered, requested) = trade.types()?;
        let call = CancelTrade {
            offered,
            requested,
            trade: trade.trade_id,
        };
        self.ctx.call(self.package(), &call)
    }
}
