use time::{
    format_description::FormatItem,
    macros::format_description,
    UtcOffset,
};
use tunemint_services::{
    de::datetime_from_ms,
    service::{
        marketplace::{
            Listing,
            MarketSummary,
        },
        nft::{
            MusicNft,
            OwnedNft,
        },
        streaming::{
            format_duration,
            format_timer,
            ListenProgress,
            ListeningSession,
            MarketplaceStats,
            MusicListing,
        },
        trading::Trade,
    },
    Address,
    Outcome,
};

const TIMESTAMP: &[FormatItem] = format_description!("[year]-[month]-[day] [hour]:[minute]");


pub fn outcome(outcome: &Outcome) -> String {
    match outcome.digest() {
        Some(digest) => format!("Transaction {digest} succeeded"),
        None => "Dry run succeeded; nothing was submitted".to_owned(),
    }
}

/// Local time when the offset is known, UTC otherwise
pub fn timestamp(ms: u64) -> String {
    let Some(at) = datetime_from_ms(ms) else { return ms.to_string() };
    let at = UtcOffset::current_local_offset().map_or(at, |offset| at.to_offset(offset));
    at.format(TIMESTAMP).unwrap_or_else(|_| ms.to_string())
}

pub fn market_summary(summary: &MarketSummary) -> String {
    let mut out = format!("Active listings: {}", summary.listing_count);
    if let Some(pending) = summary.pending_payment {
        out.push_str(&format!("\nPending payments: {pending} SUI"));
    }
    out
}

pub fn listing(listing: &Listing) -> String {
    format!(
        "{} [{}]\n  {} SUI from {}\n  {}",
        listing.nft.name,
        listing.item_id.short_id(),
        listing.ask,
        listing.seller.short(),
        listing.nft.description
    )
}

pub fn music_nft(nft: &MusicNft) -> String {
    let mut out = format!("{} [{}]\n  {}", nft.details.name, nft.id, nft.details.description);
    if let Some(rarity) = &nft.details.rarity {
        out.push_str(&format!("\n  Rarity: {rarity}"));
    }
    if let Some(url) = &nft.details.music_url {
        out.push_str(&format!("\n  {url}"));
    }
    out
}

pub fn owned_nft(nft: &OwnedNft) -> String { format!("{} [{}]\n  {}", nft.name, nft.id, nft.type_) }

pub fn track(track: &MusicListing) -> String {
    let artist = track.details.creator.map_or_else(|| "Unknown".to_owned(), |c| c.short());
    format!(
        "{} by {artist} [{}]\n  {} listens, {} listened",
        track.details.name,
        track.nft_id,
        track.total_listens,
        format_duration(track.total_listen_seconds)
    )
}

pub fn music_stats(stats: &MarketplaceStats) -> String {
    format!(
        "Tracks: {}\nListens: {}\nRewards paid: {} SUI\nReward pool: {} SUI",
        stats.total_music,
        stats.total_listens,
        stats.total_rewards.precise(),
        stats.reward_pool
    )
}

pub fn session(session: &ListeningSession) -> String {
    format!(
        "Listening to {}\n  Since {}\n  Reported {}\n  Pending rewards: {} SUI",
        session.nft_id,
        timestamp(session.start_ms),
        format_timer(session.seconds),
        session.pending_reward.precise()
    )
}

/// Single status line, redrawn in place
pub fn progress(progress: &ListenProgress, duration_secs: u64) -> String {
    format!(
        "\r{} / {}  {} SUI pending",
        format_timer(progress.elapsed),
        format_timer(duration_secs),
        progress.pending_reward.precise()
    )
}

pub fn trade(trade: &Trade, account: Address) -> String {
    let name = |nft: &Option<OwnedNft>, id| nft.as_ref().map_or_else(|| format!("{id}"), |n| n.name.clone());
    let (give, get, other) = if trade.initiator == account {
        (name(&trade.initiator_nft, trade.initiator_nft_id), name(&trade.target_nft, trade.target_nft_id), trade.target)
    } else {
        (name(&trade.target_nft, trade.target_nft_id), name(&trade.initiator_nft, trade.initiator_nft_id), trade.initiator)
    };
    let mut out = format!(
        "Trade {} ({})\n  You give: {give}\n  You get: {get}\n  With: {}",
        trade.trade_id,
        trade.status,
        other.short()
    );
    if let Some(ms) = trade.created_ms {
        out.push_str(&format!("\n  Created: {}", timestamp(ms)));
    }
    out
}


#[cfg(test)]
mod tests {
    use tunemint_services::{
        service::{
            nft::NftDetails,
            trading::TradeStatus,
        },
        Mist,
        ObjectId,
    };

    use super::*;

    fn id(s: &str) -> ObjectId { s.parse().unwrap() }

    #[test]
    fn listing_lines() {
        let listing = Listing {
            item_id: id("0x0a"),
            listing_id: id("0x11"),
            ask: Mist(1_500_000_000),
            seller: id("0x7573c697fa68450f04fa0dee2d39dcdc8a5ccf5db547f3e47638a6f8eeeec110"),
            item_type: None,
            nft: NftDetails {
                name: "Midnight Drive".to_owned(),
                description: "No description".to_owned(),
                image_url: None,
                music_url: None,
                creator: None,
                attributes: None,
                rarity: None,
            },
        };

        assert_eq!(
            self::listing(&listing),
            "Midnight Drive [0x000000...00000a]\n  1.5000 SUI from 0x7573...c110\n  No description"
        );
    }

    #[test]
    fn summary_without_account() {
        let summary = MarketSummary {
            listing_count: 2,
            pending_payment: None,
        };
        assert_eq!(market_summary(&summary), "Active listings: 2");
    }

    #[test]
    fn summary_with_pending_payment() {
        let summary = MarketSummary {
            listing_count: 0,
            pending_payment: Some(Mist(2_000_000_000)),
        };
        assert_eq!(market_summary(&summary), "Active listings: 0\nPending payments: 2.0000 SUI");
    }

    #[test]
    fn music_nft_optional_lines() {
        let nft = MusicNft {
            id: id("0x0a"),
            type_: "0xef::music_nft::MusicNFT".to_owned(),
            details: NftDetails {
                name: "Epic Beat #1".to_owned(),
                description: "Drums".to_owned(),
                image_url: None,
                music_url: Some("https://example.com/music.mp3".to_owned()),
                creator: None,
                attributes: None,
                rarity: Some("Legendary".to_owned()),
            },
        };

        let text = music_nft(&nft);

        assert!(text.ends_with("\n  Drums\n  Rarity: Legendary\n  https://example.com/music.mp3"));
    }

    #[test]
    fn progress_line() {
        let progress = ListenProgress {
            nft_id: id("0x0a"),
            elapsed: 75,
            reported: 70,
            pending_reward: Mist(7_500),
        };
        assert_eq!(self::progress(&progress, 120), "\r1:15 / 2:00  0.00000750 SUI pending");
    }

    #[test]
    fn trade_from_targets_side() {
        let me = id("0xbb");
        let trade = Trade {
            trade_id: id("0x77"),
            initiator: id("0xaa"),
            target: me,
            initiator_nft_id: id("0x0a01"),
            target_nft_id: id("0x0b01"),
            nft_types: None,
            status: TradeStatus::Pending,
            created_ms: None,
            is_initiator: false,
            initiator_nft: Some(OwnedNft {
                id: id("0x0a01"),
                type_: "0xef::music_nft::MusicNFT".to_owned(),
                name: "Epic Beat #1".to_owned(),
                image_url: None,
            }),
            target_nft: None,
        };

        let text = self::trade(&trade, me);

        assert!(text.contains("(pending)"));
        assert!(text.contains("You give: 0x0000000000000000000000000000000000000000000000000000000000000b01"));
        assert!(text.contains("You get: Epic Beat #1"));
        assert!(text.ends_with("With: 0x0000...00aa"));
    }
}
