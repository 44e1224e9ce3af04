use std::{
    fmt::Display,
    io::{
        self,
        Write,
    },
    process::ExitCode,
};

use anyhow::{
    bail,
    Result,
};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use tunemint_services::{
    config::Config,
    keystore,
    rpc::Transport,
    service::{
        nft::MintForm,
        streaming::{
            ListenPlan,
            MusicListing,
        },
        trading::Trade as TradeInfo,
    },
    Context,
    Outcome,
};

use crate::args::{
    Args,
    Command,
    Market,
    Music,
    Nft,
    Trade,
};

mod args;
mod render;


fn print_err<E: Display>(e: E) {
    eprintln!("{e:#}");
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse_from(wild::args_os());

    #[cfg(debug_assertions)]
    dbg!(&args);

    init_logging(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_err(e);
            ExitCode::FAILURE
        },
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = args.rpc_url {
        config.rpc_url = url;
    }
    if let Some(keystore) = args.keystore {
        config.keystore = keystore;
    }
    if args.address.is_some() {
        config.address = args.address;
    }
    if let Some(budget) = args.gas_budget {
        config.gas_budget = budget;
    }

    let signer = match keystore::load(&config.keystore, config.address) {
        Ok(signer) => Some(signer),
        Err(e) if args.command.submits() && !args.dry_run => return Err(e.context("This command needs a signing key")),
        Err(e) => {
            debug!("Continuing without a signer: {e:#}");
            None
        },
    };
    let ctx = Context::connect(config, signer)?.dry_run(args.dry_run);

    match args.command {
        Command::Info => info(&ctx),
        Command::Market(cmd) => market(&ctx, cmd),
        Command::Nft(cmd) => nft(&ctx, cmd),
        Command::Music(cmd) => music(&ctx, cmd),
        Command::Trade(cmd) => trade(&ctx, cmd),
    }
}

/// Prints the outcome, then the re-read state unless nothing was submitted
fn report<T: Transport>(ctx: &Context<T>, outcome: &Outcome, refresh: impl FnOnce() -> Result<String>) {
    println!("{}", render::outcome(outcome));
    if ctx.is_dry_run() {
        return;
    }
    match refresh() {
        Ok(state) => println!("\n{state}"),
        Err(e) => print_err(e.context("Failed to refresh")),
    }
}

fn info(ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    match ctx.account() {
        Some(account) => println!("Account: {account}"),
        None => println!("Account: none (read-only)"),
    }
    println!("RPC: {}", config.rpc_url);
    println!("Marketplace: {} ({})", config.marketplace.marketplace_id, config.marketplace.coin_type);
    println!("NFT package: {}", config.nft.package_id);
    println!("Music package: {}", config.music.package_id);
    println!("Trading package: {}", config.trading.package_id);
    if ctx.is_dry_run() {
        println!("Dry run: transactions are simulated only");
    }
    Ok(())
}

fn market(ctx: &Context, cmd: Market) -> Result<()> {
    let market = ctx.marketplace();
    let item_type = |item_id: &str, given: Option<String>| -> Result<String> {
        match given {
            Some(ty) => Ok(ty),
            None => Ok(market.item_type(item_id.parse()?)?.to_string()),
        }
    };
    let summary = || -> Result<String> { Ok(render::market_summary(&market.summary()?)) };

    match cmd {
        Market::Stats => println!("{}", summary()?),
        Market::Listings { search } => {
            let listings = market.listings()?;
            let query = search.unwrap_or_default();
            let shown: Vec<_> = listings.iter().filter(|l| l.matches(&query)).collect();
            if shown.is_empty() {
                println!("No listings found");
            }
            for listing in shown {
                println!("{}\n", render::listing(listing));
            }
        },
        Market::Show { item_id } => match market.view_listing(item_id)? {
            Some(view) => println!("Price: {} SUI\nSeller: {}", view.ask, view.seller),
            None => println!("Item {item_id} is not listed"),
        },
        Market::List { item_id, price, item_type: ty } => {
            let ty = item_type(&item_id, ty)?;
            report(ctx, &market.list(&item_id, &ty, &price)?, summary);
        },
        Market::Buy { item_id, price, item_type: ty } => {
            let ty = item_type(&item_id, ty)?;
            report(ctx, &market.buy(&item_id, &ty, &price)?, summary);
        },
        Market::Delist { item_id, item_type: ty } => {
            let ty = item_type(&item_id, ty)?;
            report(ctx, &market.delist(&item_id, &ty)?, summary);
        },
        Market::TakeProfits => report(ctx, &market.take_profits()?, summary),
    }
    Ok(())
}

fn nft(ctx: &Context, cmd: Nft) -> Result<()> {
    let nfts = ctx.nfts();
    match cmd {
        Nft::Mint(mint) => {
            let form = MintForm {
                name: mint.name,
                description: mint.description,
                image_url: mint.image_url,
                music_url: mint.music_url,
                attributes: mint.attributes,
                recipient: mint.recipient,
            };
            let minted = if mint.quick { nfts.quick_mint(&form)? } else { nfts.mint(&form)? };
            report(ctx, &minted.outcome, || -> Result<String> {
                match minted.nft_id {
                    Some(id) => Ok(format!("Minted NFT {id}\n{}", render::music_nft(&nfts.get(id)?))),
                    None => Ok(format!("Music NFTs held: {}", nfts.collection(ctx.require_account()?)?.len())),
                }
            });
            if let (true, Some(id)) = (ctx.is_dry_run(), minted.nft_id) {
                println!("Would mint NFT {id}");
            }
        },
        Nft::Collection { owner, search } => {
            let owner = owner.map_or_else(|| ctx.require_account(), Ok)?;
            let query = search.unwrap_or_default();
            let collection = nfts.collection(owner)?;
            let shown: Vec<_> = collection.iter().filter(|n| n.matches(&query)).collect();
            if shown.is_empty() {
                println!("No music NFTs found");
            }
            for nft in shown {
                println!("{}\n", render::music_nft(nft));
            }
        },
        Nft::Owned { owner } => {
            let owner = owner.map_or_else(|| ctx.require_account(), Ok)?;
            for nft in nfts.owned(owner)? {
                println!("{}\n", render::owned_nft(&nft));
            }
        },
    }
    Ok(())
}

fn music(ctx: &Context, cmd: Music) -> Result<()> {
    let music = ctx.music();
    let stats = || -> Result<String> { Ok(render::music_stats(&music.stats()?)) };
    let session = || -> Result<String> {
        Ok(match music.session(ctx.require_account()?)? {
            Some(session) => render::session(&session),
            None => "No active listening session".to_owned(),
        })
    };
    let print_tracks = |tracks: Vec<MusicListing>| {
        if tracks.is_empty() {
            println!("No tracks found");
        }
        for track in &tracks {
            println!("{}\n", render::track(track));
        }
    };

    match cmd {
        Music::Library { search } => {
            let query = search.unwrap_or_default();
            print_tracks(music.library()?.into_iter().filter(|t| t.matches(&query)).collect());
        },
        Music::MyListings => print_tracks(music.my_listings()?),
        Music::List { nft_id } => report(ctx, &music.list(&nft_id)?, stats),
        Music::Unlist { nft_id } => report(ctx, &music.unlist(&nft_id)?, stats),
        Music::Stats => println!("{}", stats()?),
        Music::Session { listener } => {
            let listener = listener.map_or_else(|| ctx.require_account(), Ok)?;
            match music.session(listener)? {
                Some(session) => println!("{}", render::session(&session)),
                None => println!("No active listening session"),
            }
        },
        Music::Start { nft_id } => report(ctx, &music.start(nft_id)?, session),
        Music::Update { seconds } => {
            if seconds == 0 {
                bail!("Nothing to report");
            }
            report(ctx, &music.update(seconds)?, session);
        },
        Music::Claim => report(ctx, &music.claim()?, stats),
        Music::Stop => report(ctx, &music.stop()?, session),
        Music::ClaimStop { seconds } => report(ctx, &music.claim_and_stop(seconds)?, stats),
        Music::Listen { nft_id, duration, update_every } => {
            let plan = ListenPlan {
                update_every,
                ..ListenPlan::new(duration)
            };
            let outcome = music.listen(nft_id, plan, |p| {
                print!("{}", render::progress(p, duration));
                let _ = io::stdout().flush();
            });
            println!();
            report(ctx, &outcome?, stats);
        },
    }
    Ok(())
}

fn trade(ctx: &Context, cmd: Trade) -> Result<()> {
    let trading = ctx.trading();
    let account = ctx.require_account()?;
    let print_trades = |trades: Vec<TradeInfo>, empty: &str| {
        if trades.is_empty() {
            println!("{empty}");
        }
        for trade in &trades {
            println!("{}\n", render::trade(trade, account));
        }
    };
    let pending = || -> Result<String> { Ok(format!("Pending trades: {}", trading.pending()?.len())) };

    match cmd {
        Trade::Create { offer, target, want } => {
            if target == account {
                bail!("Cannot trade with yourself");
            }
            report(ctx, &trading.create(offer, target, want)?, pending);
        },
        Trade::Pending => print_trades(trading.pending()?, "No pending trades"),
        Trade::Accepted => print_trades(trading.accepted()?, "No trades awaiting completion"),
        Trade::History => print_trades(trading.history()?, "No completed trades"),
        Trade::Accept { trade_id, accept_only } => {
            let trade = trading.find(trade_id)?;
            report(ctx, &trading.accept(&trade, accept_only)?, pending);
        },
        Trade::Complete { trade_id } => {
            let trade = trading.find(trade_id)?;
            report(ctx, &trading.complete(&trade)?, pending);
        },
        Trade::Reject { trade_id } => {
            let trade = trading.find(trade_id)?;
            report(ctx, &trading.reject(&trade)?, pending);
        },
        Trade::Cancel { trade_id } => {
            let trade = trading.find(trade_id)?;
            report(ctx, &trading.cancel(&trade)?, pending);
        },
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::Value;
    use tunemint_services::{
        rpc::{
            SuiClient,
            TransactionBlockResponse,
        },
        Error,
    };

    use super::*;

    struct Offline;

    impl Transport for Offline {
        fn request(&self, method: &str, _: Value) -> Result<Value, Error> { Err(Error::Transport(format!("offline: {method}"))) }
    }

    fn executed() -> Outcome {
        Outcome::Executed(TransactionBlockResponse {
            digest: "9tUnq1BuDjbbjkx6HszxyQw4VZyrkVAPQpsqoYS4H5mN".to_owned(),
            effects: None,
            object_changes: vec![],
            events: vec![],
        })
    }

    #[test]
    fn report_refreshes_after_submit() {
        let ctx = Context::new(SuiClient::new(Offline), Config::default(), None);
        let refreshed = Cell::new(0);

        report(&ctx, &executed(), || {
            refreshed.set(refreshed.get() + 1);
            Ok("No active listening session".to_owned())
        });
        report(&ctx, &executed(), || {
            refreshed.set(refreshed.get() + 1);
            anyhow::bail!("offline")
        });

        assert_eq!(refreshed.get(), 2);
    }

    #[test]
    fn report_skips_refresh_in_dry_run() {
        let ctx = Context::new(SuiClient::new(Offline), Config::default(), None).dry_run(true);
        let refreshed = Cell::new(false);

        report(&ctx, &executed(), || {
            refreshed.set(true);
            Ok(String::new())
        });

        assert!(!refreshed.get());
    }
}
