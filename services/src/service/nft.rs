use anyhow::{
    bail,
    Context as _,
    Result,
};
use tracing::{
    debug,
    info,
};
use tunemint_derive::MoveCall;

use super::{
    matches_query,
    Context,
    Outcome,
};
use crate::{
    rpc::{
        Fields,
        HttpTransport,
        ObjectOptions,
        SuiObjectData,
        Transport,
    },
    Address,
    ObjectId,
};

pub const MUSIC_NFT_TYPE: &str = "music_nft::MusicNFT";
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400";
pub const PLACEHOLDER_MUSIC: &str = "https://example.com/music.mp3";

const COIN_TYPE_PREFIX: &str = "0x2::coin::Coin";


/// Metadata common to every music NFT, with display fallbacks applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftDetails {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub music_url: Option<String>,
    pub creator: Option<Address>,
    pub attributes: Option<String>,
    /// Tier assigned at mint by the newer package
    pub rarity: Option<String>,
}

impl NftDetails {
    pub fn from_fields(fields: Fields<'_>) -> Self {
        let non_empty = |key| fields.str(key).filter(|s| !s.is_empty()).map(str::to_owned);
        Self {
            name: fields.str_or("name", "Unknown NFT"),
            description: fields.str_or("description", "No description"),
            image_url: non_empty("image_url"),
            music_url: non_empty("music_url"),
            creator: fields.address("creator"),
            attributes: non_empty("attributes"),
            rarity: fields.text("rarity"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicNft {
    pub id: ObjectId,
    pub type_: String,
    pub details: NftDetails,
}

impl MusicNft {
    fn from_object(object: &SuiObjectData) -> Option<Self> {
        let type_ = object.type_.as_deref().filter(|t| t.contains(MUSIC_NFT_TYPE))?;
        Some(Self {
            id: object.object_id,
            type_: type_.to_owned(),
            details: NftDetails::from_fields(object.fields()?),
        })
    }

    /// Name, id or description contains `query`
    pub fn matches(&self, query: &str) -> bool {
        let id = self.id.to_string();
        matches_query(query, [self.details.name.as_str(), id.as_str(), self.details.description.as_str()])
    }
}

/// Any NFT-like object, as offered in trades
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedNft {
    pub id: ObjectId,
    pub type_: String,
    pub name: String,
    pub image_url: Option<String>,
}

impl OwnedNft {
    pub(crate) fn from_object(object: &SuiObjectData) -> Option<Self> {
        let type_ = object
            .type_
            .as_deref()
            .filter(|t| t.contains("::") && !t.contains(COIN_TYPE_PREFIX))?;
        let fields = object.fields()?;

        let name = object
            .display_str("name")
            .or_else(|| fields.str("name").filter(|s| !s.is_empty()))
            .unwrap_or("Unnamed NFT");
        let image_url = ["image_url", "img_url"]
            .into_iter()
            .find_map(|key| object.display_str(key).or_else(|| fields.str(key).filter(|s| !s.is_empty())));

        Some(Self {
            id: object.object_id,
            type_: type_.to_owned(),
            name: name.to_owned(),
            image_url: image_url.map(str::to_owned),
        })
    }
}


/// Form input for minting; empty optional values take the package's defaults
#[derive(Debug, Clone, Default)]
pub struct MintForm {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub music_url: Option<String>,
    pub attributes: Option<String>,
    pub recipient: Option<Address>,
}

#[derive(Debug)]
pub struct Minted {
    pub outcome: Outcome,
    /// Absent when the effects report no object created into an account
    pub nft_id: Option<ObjectId>,
}

#[derive(MoveCall)]
#[move_call(module = "music_nft", function = "mint_to_sender")]
struct MintToSender<'a> {
    #[object]
    collection: ObjectId,
    name: &'a str,
    description: &'a str,
    image_url: &'a str,
    music_url: &'a str,
    attributes: &'a str,
}

#[derive(MoveCall)]
#[move_call(module = "music_nft", function = "mint")]
struct Mint<'a> {
    #[object]
    collection: ObjectId,
    name: &'a str,
    description: &'a str,
    image_url: &'a str,
    music_url: &'a str,
    attributes: &'a str,
    recipient: Address,
}


pub struct Nfts<'c, T = HttpTransport> {
    ctx: &'c Context<T>,
}

impl<T: Transport> Context<T> {
    pub fn nfts(&self) -> Nfts<'_, T> { Nfts { ctx: self } }
}

impl<T: Transport> Nfts<'_, T> {
    /// Mints to the sender from the rarity package, filling in placeholder urls
    pub fn quick_mint(&self, form: &MintForm) -> Result<Minted> {
        if form.name.trim().is_empty() || form.description.trim().is_empty() {
            bail!("Name and description are required");
        }
        let ids = &self.ctx.config.nft;
        let call = MintToSender {
            collection: ids.collection_id,
            name: &form.name,
            description: &form.description,
            image_url: or_default(&form.image_url, PLACEHOLDER_IMAGE),
            music_url: or_default(&form.music_url, PLACEHOLDER_MUSIC),
            attributes: or_default(&form.attributes, "none"),
        };
        self.finish(self.ctx.call(ids.package_id, &call)?)
    }

    /// Mints from the music package, to `form.recipient` when set
    pub fn mint(&self, form: &MintForm) -> Result<Minted> {
        let image_url = form.image_url.as_deref().unwrap_or_default();
        let music_url = form.music_url.as_deref().unwrap_or_default();
        if [form.name.as_str(), form.description.as_str(), image_url, music_url]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            bail!("Please fill in all required fields (name, description, image URL, music URL)");
        }

        let ids = &self.ctx.config.music;
        let attributes = or_default(&form.attributes, "{}");
        let outcome = match form.recipient {
            Some(recipient) => self.ctx.call(ids.package_id, &Mint {
                collection: ids.collection_id,
                name: &form.name,
                description: &form.description,
                image_url,
                music_url,
                attributes,
                recipient,
            }),
            None => self.ctx.call(ids.package_id, &MintToSender {
                collection: ids.collection_id,
                name: &form.name,
                description: &form.description,
                image_url,
                music_url,
                attributes,
            }),
        }?;
        self.finish(outcome)
    }

    fn finish(&self, outcome: Outcome) -> Result<Minted> {
        let nft_id = outcome.created_owned();
        match (nft_id, outcome.digest()) {
            (Some(id), _) => info!(%id, "Minted NFT"),
            (None, Some(digest)) => info!(digest, "Mint succeeded without a reported object"),
            (None, None) => {},
        }
        Ok(Minted { outcome, nft_id })
    }

    /// Music NFTs from any package owned by `owner`
    pub fn collection(&self, owner: Address) -> Result<Vec<MusicNft>> {
        let objects = self
            .ctx
            .client
            .get_owned_objects(owner, None, ObjectOptions::content())
            .context("Failed to fetch owned objects")?;
        let nfts: Vec<_> = objects.iter().filter_map(MusicNft::from_object).collect();
        debug!(total = objects.len(), music = nfts.len(), "collection");
        Ok(nfts)
    }

    /// NFT-like objects of `owner`, excluding coins
    pub fn owned(&self, owner: Address) -> Result<Vec<OwnedNft>> {
        let objects = self
            .ctx
            .client
            .get_owned_objects(owner, None, ObjectOptions::display())
            .with_context(|| format!("Failed to fetch objects of {owner}"))?;
        Ok(objects.iter().filter_map(OwnedNft::from_object).collect())
    }

    pub fn get(&self, id: ObjectId) -> Result<MusicNft> {
        let object = self.ctx.client.get_object(id, ObjectOptions::content())?;
        MusicNft::from_object(&object).with_context(|| format!("{id} is not a music NFT"))
    }
}

fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or(default)
}
