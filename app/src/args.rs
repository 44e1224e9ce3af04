use std::path::PathBuf;

use clap::{
    Parser,
    Subcommand,
};
use tunemint_services::{
    service::streaming::{
        parse_duration,
        DEFAULT_UPDATE_EVERY,
    },
    Address,
    ObjectId,
};

/// Mint, trade and stream music NFTs on Sui
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Args {
    /// Settings file [default: $CONFIG_DIR/tunemint/config.toml]
    #[arg(short, long, global = true, env = "TUNEMINT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fullnode JSON-RPC url
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Sui CLI keystore holding the signing key
    #[arg(long, global = true)]
    pub keystore: Option<PathBuf>,

    /// Account to act as
    #[arg(long, global = true)]
    pub address: Option<Address>,

    /// Gas budget in MIST
    #[arg(long, global = true)]
    pub gas_budget: Option<u64>,

    /// Simulate transactions instead of submitting them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log RPC traffic
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Show the account and deployment in use
    Info,
    /// Generic item marketplace
    #[command(subcommand)]
    Market(Market),
    /// Mint and browse music NFTs
    #[command(subcommand)]
    Nft(Nft),
    /// Listen-to-earn music marketplace
    #[command(subcommand)]
    Music(Music),
    /// Peer to peer NFT swaps
    #[command(subcommand)]
    Trade(Trade),
}

impl Command {
    /// Whether the command submits transactions
    pub fn submits(&self) -> bool {
        match self {
            Self::Info => false,
            Self::Market(m) => !matches!(m, Market::Stats | Market::Listings { .. } | Market::Show { .. }),
            Self::Nft(n) => matches!(n, Nft::Mint(_)),
            Self::Music(m) => !matches!(
                m,
                Music::Library { .. } | Music::MyListings | Music::Stats | Music::Session { .. }
            ),
            Self::Trade(t) => !matches!(t, Trade::Pending | Trade::Accepted | Trade::History),
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Market {
    /// Listing count and your uncollected sales
    Stats,
    /// Every active listing
    Listings {
        /// Only show listings whose name, id or description contains this
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Price and seller of a listed item
    Show { item_id: ObjectId },
    /// Offer an item for sale
    List {
        item_id: String,
        /// Asking price in SUI
        #[arg(short, long)]
        price: String,
        /// Move type of the item; looked up when omitted
        #[arg(short = 't', long = "type")]
        item_type: Option<String>,
    },
    /// Buy a listed item, paying from the gas coin
    Buy {
        item_id: String,
        /// Amount to pay in SUI
        #[arg(short, long)]
        price: String,
        #[arg(short = 't', long = "type")]
        item_type: Option<String>,
    },
    /// Withdraw your listing
    Delist {
        item_id: String,
        #[arg(short = 't', long = "type")]
        item_type: Option<String>,
    },
    /// Collect proceeds from your sales
    TakeProfits,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Nft {
    /// Mint a music NFT
    Mint(MintArgs),
    /// Music NFTs held by an account
    Collection {
        /// Defaults to your account
        #[arg(long)]
        owner: Option<Address>,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Every NFT-like object held by an account
    Owned {
        #[arg(long)]
        owner: Option<Address>,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct MintArgs {
    #[arg(short, long)]
    pub name: String,

    #[arg(short, long)]
    pub description: String,

    #[arg(long)]
    pub image_url: Option<String>,

    #[arg(long)]
    pub music_url: Option<String>,

    /// Free-form attributes, usually JSON
    #[arg(long)]
    pub attributes: Option<String>,

    /// Mint to this address instead of yourself
    #[arg(long, conflicts_with = "quick")]
    pub recipient: Option<Address>,

    /// Use the rarity package, with placeholder urls where none are given
    #[arg(short, long)]
    pub quick: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Music {
    /// Tracks available to listen to
    Library {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Tracks you listed
    MyListings,
    /// Add one of your music NFTs to the library
    List { nft_id: String },
    /// Take your track back out of the library
    Unlist { nft_id: String },
    /// Library totals and reward pool
    Stats,
    /// Current listening session
    Session {
        /// Defaults to your account
        #[arg(long)]
        listener: Option<Address>,
    },
    /// Open a listening session
    Start { nft_id: ObjectId },
    /// Report more listening time
    Update {
        #[arg(default_value_t = DEFAULT_UPDATE_EVERY)]
        seconds: u64,
    },
    /// Claim accrued rewards
    Claim,
    /// Close the listening session
    Stop,
    /// Report final time, claim and close in one transaction
    ClaimStop {
        #[arg(short, long, default_value_t = 0)]
        seconds: u64,
    },
    /// Listen for a while, reporting time as it passes, then claim
    Listen {
        nft_id: ObjectId,

        /// e.g. 90, 1m30s or 2h
        #[arg(short, long, default_value = "1m", value_parser = parse_duration)]
        duration: u64,

        /// Seconds between listening time reports; 0 reports once at the end
        #[arg(short, long, default_value_t = DEFAULT_UPDATE_EVERY)]
        update_every: u64,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum Trade {
    /// Offer one of your NFTs for one held by another account
    Create {
        /// Your NFT to give
        #[arg(long)]
        offer: ObjectId,
        /// Owner of the NFT you want
        #[arg(long)]
        target: Address,
        /// The NFT you want
        #[arg(long)]
        want: ObjectId,
    },
    /// Trades awaiting a response
    Pending,
    /// Trades accepted but not yet completed
    Accepted,
    /// Completed trades
    History,
    /// Accept a trade offered to you, completing it in the same transaction
    Accept {
        trade_id: ObjectId,
        /// Leave completion for a later `complete`
        #[arg(long)]
        accept_only: bool,
    },
    /// Complete an accepted trade
    Complete { trade_id: ObjectId },
    /// Turn down a trade offered to you
    Reject { trade_id: ObjectId },
    /// Withdraw a trade you offered
    Cancel { trade_id: ObjectId },
}


#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args { Args::try_parse_from(std::iter::once("tunemint").chain(args.iter().copied())).unwrap() }

    #[test]
    fn global_flags_after_subcommand() {
        let args = parse(&["market", "buy", "0x0a", "--price", "1.5", "--dry-run", "--gas-budget", "5000"]);

        assert!(args.dry_run);
        assert_eq!(args.gas_budget, Some(5000));
        assert!(args.command.submits());
        match args.command {
            Command::Market(Market::Buy { item_id, price, item_type }) => {
                assert_eq!((item_id.as_str(), price.as_str(), item_type), ("0x0a", "1.5", None));
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn listen_duration() {
        let args = parse(&["music", "listen", "0x0a", "-d", "2m30s"]);
        match args.command {
            Command::Music(Music::Listen { duration, update_every, .. }) => assert_eq!((duration, update_every), (150, 10)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(Args::try_parse_from(["tunemint", "music", "listen", "0x0a", "-d", "soon"]).is_err());
    }

    #[test]
    fn reads_do_not_submit() {
        assert!(!parse(&["trade", "pending"]).command.submits());
        assert!(!parse(&["music", "session"]).command.submits());
        assert!(!parse(&["nft", "collection", "--owner", "0x1"]).command.submits());
        assert!(parse(&["trade", "accept", "0x77", "--accept-only"]).command.submits());
    }

    #[test]
    fn quick_mint_has_no_recipient() {
        assert!(Args::try_parse_from(["tunemint", "nft", "mint", "-n", "a", "-d", "b", "--quick", "--recipient", "0x1"]).is_err());
    }

    #[test]
    fn cli_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
