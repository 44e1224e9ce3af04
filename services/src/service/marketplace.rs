use anyhow::{
    bail,
    Context as _,
    Result,
};
use tracing::{
    debug,
    warn,
};
use tunemint_derive::MoveCall;

use super::{
    matches_query,
    nft::NftDetails,
    require_filled,
    Context,
    Outcome,
};
use crate::{
    rpc::{
        DynamicFieldInfo,
        HttpTransport,
        ObjectOptions,
        Transport,
    },
    Address,
    Mist,
    ObjectId,
    TypeTag,
};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub item_id: ObjectId,
    pub listing_id: ObjectId,
    pub ask: Mist,
    pub seller: Address,
    pub item_type: Option<String>,
    pub nft: NftDetails,
}

impl Listing {
    /// Name, item id or description contains `query`
    pub fn matches(&self, query: &str) -> bool {
        let id = self.item_id.to_string();
        matches_query(query, [self.nft.name.as_str(), id.as_str(), self.nft.description.as_str()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingView {
    pub ask: Mist,
    pub seller: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSummary {
    pub listing_count: u64,
    /// Only known with an account
    pub pending_payment: Option<Mist>,
}


#[derive(MoveCall)]
#[move_call(module = "marketplace", function = "list")]
struct List {
    #[type_arg]
    item_type: TypeTag,
    #[type_arg]
    coin_type: TypeTag,
    #[object]
    marketplace: ObjectId,
    #[object]
    item: ObjectId,
    ask: Mist,
}

#[derive(MoveCall)]
#[move_call(module = "marketplace", function = "buy_and_take")]
struct BuyAndTake {
    #[type_arg]
    item_type: TypeTag,
    #[type_arg]
    coin_type: TypeTag,
    #[object]
    marketplace: ObjectId,
    item_id: ObjectId,
    #[coin]
    paid: Mist,
}

#[derive(MoveCall)]
#[move_call(module = "marketplace", function = "delist_and_take")]
struct DelistAndTake {
    #[type_arg]
    item_type: TypeTag,
    #[type_arg]
    coin_type: TypeTag,
    #[object]
    marketplace: ObjectId,
    item_id: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "marketplace", function = "take_profits_and_keep")]
struct TakeProfitsAndKeep {
    #[type_arg]
    coin_type: TypeTag,
    #[object]
    marketplace: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "marketplace", function = "get_listing_count")]
struct GetListingCount {
    #[type_arg]
    coin_type: TypeTag,
    #[object(read_only)]
    marketplace: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "marketplace", function = "get_pending_payment")]
struct GetPendingPayment {
    #[type_arg]
    coin_type: TypeTag,
    #[object(read_only)]
    marketplace: ObjectId,
    account: Address,
}

#[derive(MoveCall)]
#[move_call(module = "marketplace", function = "listing_exists")]
struct ListingExists {
    #[type_arg]
    coin_type: TypeTag,
    #[object(read_only)]
    marketplace: ObjectId,
    item_id: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "marketplace", function = "view_listing")]
struct ViewListing {
    #[type_arg]
    coin_type: TypeTag,
    #[object(read_only)]
    marketplace: ObjectId,
    item_id: ObjectId,
}


pub struct Marketplace<'c, T = HttpTransport> {
    ctx: &'c Context<T>,
}

impl<T: Transport> Context<T> {
    pub fn marketplace(&self) -> Marketplace<'_, T> { Marketplace { ctx: self } }
}

impl<T: Transport> Marketplace<'_, T> {
    fn package(&self) -> ObjectId { self.ctx.config.marketplace.package_id }

    fn id(&self) -> ObjectId { self.ctx.config.marketplace.marketplace_id }

    fn coin_type(&self) -> TypeTag { self.ctx.config.marketplace.coin_type.clone() }

    pub fn listing_count(&self) -> Result<u64> {
        let call = GetListingCount {
            coin_type: self.coin_type(),
            marketplace: self.id(),
        };
        Ok(self.ctx.inspect(self.package(), &call)?.u64(0)?)
    }

    pub fn pending_payment(&self, account: Address) -> Result<Mist> {
        let call = GetPendingPayment {
            coin_type: self.coin_type(),
            marketplace: self.id(),
            account,
        };
        Ok(Mist(self.ctx.inspect(self.package(), &call)?.u64(0)?))
    }

    /// Listing count, plus the account's uncollected sales when there is one
    pub fn summary(&self) -> Result<MarketSummary> {
        Ok(MarketSummary {
            listing_count: self.listing_count().context("Failed to fetch listing count")?,
            pending_payment: self
                .ctx
                .account()
                .map(|a| self.pending_payment(a))
                .transpose()
                .context("Failed to fetch pending payment")?,
        })
    }

    pub fn listing_exists(&self, item_id: ObjectId) -> Result<bool> {
        let call = ListingExists {
            coin_type: self.coin_type(),
            marketplace: self.id(),
            item_id,
        };
        Ok(self.ctx.inspect(self.package(), &call)?.bool(0)?)
    }

    /// Ask and seller, or `None` when the item is not listed
    pub fn view_listing(&self, item_id: ObjectId) -> Result<Option<ListingView>> {
        if !self.listing_exists(item_id)? {
            return Ok(None);
        }
        let call = ViewListing {
            coin_type: self.coin_type(),
            marketplace: self.id(),
            item_id,
        };
        let values = self.ctx.inspect(self.package(), &call)?;
        Ok(Some(ListingView {
            ask: Mist(values.u64(0)?),
            seller: values.address(1)?,
        }))
    }

    /// Every listing in the marketplace bag, with the NFT held by each
    pub fn listings(&self) -> Result<Vec<Listing>> {
        let client = &self.ctx.client;
        let marketplace = client
            .get_object(self.id(), ObjectOptions::content())
            .context("Failed to fetch marketplace")?;
        let bag = marketplace
            .fields()
            .and_then(|f| f.nested("items"))
            .and_then(|f| f.uid())
            .context("Marketplace object has no `items` bag")?;

        let entries = client.get_all_dynamic_fields(bag)?;
        let listings: Vec<_> = entries
            .iter()
            .filter_map(|entry| match self.listing(entry) {
                Ok(listing) => listing,
                Err(e) => {
                    warn!("Skipping listing {}: {e:#}", entry.object_id);
                    None
                },
            })
            .collect();
        debug!(entries = entries.len(), listings = listings.len(), "marketplace listings");
        Ok(listings)
    }

    fn listing(&self, entry: &DynamicFieldInfo) -> Result<Option<Listing>> {
        let client = &self.ctx.client;
        let field = client.get_object(entry.object_id, ObjectOptions::content())?;
        let Some(listing) = field.fields().and_then(|f| f.nested("value")) else { return Ok(None) };

        let item_id = entry.name.as_id().context("Listing key is not an ID")?;
        let listing_id = listing.uid().context("Listing has no id")?;
        let ask = listing.u64("ask").context("Listing has no ask")?;
        let seller = listing.address("owner").context("Listing has no owner")?;

        let Some(held) = client.get_dynamic_fields(listing_id, None, 1)?.data.into_iter().next() else {
            return Ok(None);
        };
        let nft = client.get_object(held.object_id, ObjectOptions::content())?;
        let details = nft
            .fields()
            .and_then(|f| f.nested("value").filter(|v| v.contains("name")).or(Some(f)))
            .map(NftDetails::from_fields)
            .context("NFT has no content")?;

        Ok(Some(Listing {
            item_id,
            listing_id,
            ask: Mist(ask),
            seller,
            item_type: nft.type_,
            nft: details,
        }))
    }

    /// On-chain type of an item, for the type argument of list/buy/delist
    pub fn item_type(&self, item: ObjectId) -> Result<TypeTag> {
        let object = self.ctx.client.get_object(item, ObjectOptions::content())?;
        let ty = object.type_.with_context(|| format!("{item} has no type"))?;
        ty.parse().with_context(|| format!("Unsupported item type {ty}"))
    }

    pub fn list(&self, item: &str, item_type: &str, ask: &str) -> Result<Outcome> {
        require_filled(&[item, item_type, ask])?;
        let call = List {
            item_type: item_type.parse()?,
            coin_type: self.coin_type(),
            marketplace: self.id(),
            item: item.parse()?,
            ask: Mist::from_sui_str(ask)?,
        };
        self.ctx.call(self.package(), &call)
    }

    /// Pays `amount` SUI, split from the gas coin
    pub fn buy(&self, item_id: &str, item_type: &str, amount: &str) -> Result<Outcome> {
        require_filled(&[item_id, item_type, amount])?;
        let call = BuyAndTake {
            item_type: item_type.parse()?,
            coin_type: self.coin_type(),
            marketplace: self.id(),
            item_id: item_id.parse()?,
            paid: Mist::from_sui_str(amount)?,
        };
        self.ctx.call(self.package(), &call)
    }

    pub fn delist(&self, item_id: &str, item_type: &str) -> Result<Outcome> {
        require_filled(&[item_id, item_type])?;
        let call = DelistAndTake {
            item_type: item_type.parse()?,
            coin_type: self.coin_type(),
            marketplace: self.id(),
            item_id: item_id.parse()?,
        };
        self.ctx.call(self.package(), &call)
    }

    /// Withdraws sale proceeds; refused when nothing is pending
    pub fn take_profits(&self) -> Result<Outcome> {
        let account = self.ctx.require_account()?;
        if self.pending_payment(account)?.is_zero() {
            bail!("No pending payments to take");
        }
        let call = TakeProfitsAndKeep {
            coin_type: self.coin_type(),
            marketplace: self.id(),
        };
        self.ctx.call(self.package(), &call)
    }
}
