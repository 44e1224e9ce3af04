use std::{
    sync::LazyLock,
    thread,
    time::{
        Duration,
        Instant,
    },
};

use anyhow::{
    bail,
    Context as _,
    Result,
};
use regex::Regex;
use time::OffsetDateTime;
use tracing::{
    debug,
    info,
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
    de::datetime_from_ms,
    rpc::{
        DynamicFieldInfo,
        HttpTransport,
        ObjectOptions,
        Transport,
    },
    tx::TransactionBuilder,
    Address,
    Mist,
    ObjectId,
};

/// Estimated accrual used for the local reward counter
pub const REWARD_PER_SECOND: Mist = Mist(100);
pub const DEFAULT_UPDATE_EVERY: u64 = 10;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketplaceStats {
    pub total_music: u64,
    pub total_listens: u64,
    pub total_rewards: Mist,
    pub reward_pool: Mist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListeningSession {
    pub nft_id: ObjectId,
    pub start_ms: u64,
    /// Seconds reported so far
    pub seconds: u64,
    pub pending_reward: Mist,
}

impl ListeningSession {
    pub fn started_at(&self) -> Option<OffsetDateTime> { datetime_from_ms(self.start_ms) }
}

/// A track in the listen-to-earn library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicListing {
    pub nft_id: ObjectId,
    pub owner: Option<Address>,
    pub total_listens: u64,
    pub total_listen_seconds: u64,
    pub details: NftDetails,
}

impl MusicListing {
    pub fn matches(&self, query: &str) -> bool {
        let id = self.nft_id.to_string();
        matches_query(query, [self.details.name.as_str(), id.as_str(), self.details.description.as_str()])
    }
}

/// Local state of a running [`Music::listen`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenProgress {
    pub nft_id: ObjectId,
    pub elapsed: u64,
    pub reported: u64,
    pub pending_reward: Mist,
}

impl ListenProgress {
    pub fn unreported(&self) -> u64 { self.elapsed - self.reported }
}

#[derive(Debug, Clone, Copy)]
pub struct ListenPlan {
    pub duration_secs: u64,
    /// Report listening time after this many unreported seconds; 0 only reports at the end
    pub update_every: u64,
    pub tick: Duration,
}

impl ListenPlan {
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_secs,
            update_every: DEFAULT_UPDATE_EVERY,
            tick: Duration::from_secs(1),
        }
    }

    /// Whole ticks passed since `started`; one tick counts as one listened second
    fn ticks_since(&self, started: Instant) -> u64 {
        if self.tick.is_zero() {
            return 0;
        }
        u64::try_from(started.elapsed().as_nanos() / self.tick.as_nanos()).unwrap_or(u64::MAX)
    }
}


#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "list_music")]
struct ListMusic {
    #[object]
    marketplace: ObjectId,
    #[object]
    nft: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "unlist_music")]
struct UnlistMusic {
    #[object]
    marketplace: ObjectId,
    nft_id: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "start_listening")]
struct StartListening {
    #[object]
    marketplace: ObjectId,
    nft_id: ObjectId,
    #[object(read_only)]
    clock: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "update_listening")]
struct UpdateListening {
    #[object]
    marketplace: ObjectId,
    seconds: u64,
    #[object(read_only)]
    clock: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "claim_rewards")]
struct ClaimRewards {
    #[object]
    marketplace: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "stop_listening")]
struct StopListening {
    #[object]
    marketplace: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "get_marketplace_stats")]
struct GetMarketplaceStats {
    #[object(read_only)]
    marketplace: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "is_listening")]
struct IsListening {
    #[object(read_only)]
    marketplace: ObjectId,
    listener: Address,
}

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "get_listening_session")]
struct GetListeningSession {
    #[object(read_only)]
    marketplace: ObjectId,
    listener: Address,
}


pub struct Music<'c, T = HttpTransport> {
    ctx: &'c Context<T>,
}

impl<T: Transport> Context<T> {
    pub fn music(&self) -> Music<'_, T> { Music { ctx: self } }
}

impl<T: Transport> Music<'_, T> {
    fn package(&self) -> ObjectId { self.ctx.config.music.package_id }

    fn id(&self) -> ObjectId { self.ctx.config.music.marketplace_id }

    pub fn stats(&self) -> Result<MarketplaceStats> {
        let values = self.ctx.inspect(self.package(), &GetMarketplaceStats { marketplace: self.id() })?;
        Ok(MarketplaceStats {
            total_music: values.u64(0)?,
            total_listens: values.u64(1)?,
            total_rewards: Mist(values.u64(2)?),
            reward_pool: Mist(values.u64(3)?),
        })
    }

    pub fn is_listening(&self, listener: Address) -> Result<bool> {
        let call = IsListening {
            marketplace: self.id(),
            listener,
        };
        Ok(self.ctx.inspect(self.package(), &call)?.bool(0)?)
    }

    /// The listener's open session, if any
    pub fn session(&self, listener: Address) -> Result<Option<ListeningSession>> {
        if !self.is_listening(listener)? {
            return Ok(None);
        }
        let call = GetListeningSession {
            marketplace: self.id(),
            listener,
        };
        let values = self.ctx.inspect(self.package(), &call)?;
        Ok(Some(ListeningSession {
            nft_id: values.get(0)?,
            start_ms: values.u64(1)?,
            seconds: values.u64(2)?,
            pending_reward: Mist(values.u64(3)?),
        }))
    }

    /// Every track in the marketplace's `music_library` table
    pub fn library(&self) -> Result<Vec<MusicListing>> {
        let client = &self.ctx.client;
        let marketplace = client
            .get_object(self.id(), ObjectOptions::content())
            .context("Failed to fetch music marketplace")?;
        let table = marketplace
            .fields()
            .and_then(|f| f.nested("music_library"))
            .and_then(|f| f.uid())
            .context("Music marketplace has no `music_library` table")?;

        let entries = client.get_all_dynamic_fields(table)?;
        let library: Vec<_> = entries
            .iter()
            .filter_map(|entry| match self.track(entry) {
                Ok(track) => track,
                Err(e) => {
                    warn!("Skipping track {}: {e:#}", entry.object_id);
                    None
                },
            })
            .collect();
        debug!(entries = entries.len(), tracks = library.len(), "music library");
        Ok(library)
    }

    fn track(&self, entry: &DynamicFieldInfo) -> Result<Option<MusicListing>> {
        let field = self.ctx.client.get_object(entry.object_id, ObjectOptions::content())?;
        let Some(fields) = field.fields() else { return Ok(None) };
        let listing = fields.nested("value").unwrap_or(fields);
        let nft = listing.nested("nft").context("Listing holds no NFT")?;

        let nft_id = entry
            .name
            .as_id()
            .or_else(|| nft.uid())
            .context("Track has no NFT id")?;
        Ok(Some(MusicListing {
            nft_id,
            owner: listing.address("owner"),
            total_listens: listing.u64("total_listens").unwrap_or_default(),
            total_listen_seconds: listing.u64("total_listen_time_seconds").unwrap_or_default(),
            details: NftDetails::from_fields(nft),
        }))
    }

    /// Library tracks listed by the current account
    pub fn my_listings(&self) -> Result<Vec<MusicListing>> {
        let account = self.ctx.require_account()?;
        let mut library = self.library()?;
        library.retain(|t| t.owner == Some(account));
        Ok(library)
    }

    pub fn list(&self, nft: &str) -> Result<Outcome> {
        require_filled(&[nft])?;
        let call = ListMusic {
            marketplace: self.id(),
            nft: nft.parse()?,
        };
        self.ctx.call(self.package(), &call)
    }

    pub fn unlist(&self, nft_id: &str) -> Result<Outcome> {
        require_filled(&[nft_id])?;
        let call = UnlistMusic {
            marketplace: self.id(),
            nft_id: nft_id.parse()?,
        };
        self.ctx.call(self.package(), &call)
    }

    pub fn start(&self, nft_id: ObjectId) -> Result<Outcome> {
        let call = StartListening {
            marketplace: self.id(),
            nft_id,
            clock: ObjectId::CLOCK,
        };
        self.ctx.call(self.package(), &call)
    }

    /// Reports `seconds` more listening time on the open session
    pub fn update(&self, seconds: u64) -> Result<Outcome> {
        let call = UpdateListening {
            marketplace: self.id(),
            seconds,
            clock: ObjectId::CLOCK,
        };
        self.ctx.call(self.package(), &call)
    }

    pub fn claim(&self) -> Result<Outcome> { self.ctx.call(self.package(), &ClaimRewards { marketplace: self.id() }) }

    pub fn stop(&self) -> Result<Outcome> { self.ctx.call(self.package(), &StopListening { marketplace: self.id() }) }

    /// Reports the last `seconds`, claims and closes the session in one transaction
    pub fn claim_and_stop(&self, seconds: u64) -> Result<Outcome> {
        let (package, marketplace) = (self.package(), self.id());
        let mut builder = TransactionBuilder::new();
        if seconds > 0 {
            builder.move_call(package, &UpdateListening {
                marketplace,
                seconds,
                clock: ObjectId::CLOCK,
            })?;
        }
        builder
            .move_call(package, &ClaimRewards { marketplace })?
            .move_call(package, &StopListening { marketplace })?;
        self.ctx.execute(&builder)
    }

    /// Listens to `nft_id` for the planned duration, then claims and stops
    ///
    /// An open session for the same track is resumed. `on_tick` sees the local state once per tick.
    pub fn listen(&self, nft_id: ObjectId, plan: ListenPlan, mut on_tick: impl FnMut(&ListenProgress)) -> Result<Outcome> {
        if self.ctx.is_dry_run() {
            bail!("Listening sessions cannot be simulated");
        }
        if plan.duration_secs == 0 {
            bail!("Listening duration must be at least one second");
        }
        let account = self.ctx.require_account()?;

        let pending_reward = match self.session(account).context("Failed to read listening session")? {
            Some(session) if session.nft_id == nft_id => {
                info!(%nft_id, seconds = session.seconds, "Resuming listening session");
                session.pending_reward
            },
            Some(session) => bail!("Already listening to {}; stop that session first", session.nft_id),
            None => {
                self.start(nft_id).context("Failed to start listening")?;
                info!(%nft_id, "Listening session started");
                Mist::ZERO
            },
        };

        let mut progress = ListenProgress {
            nft_id,
            elapsed: 0,
            reported: 0,
            pending_reward,
        };
        let started = Instant::now();
        while progress.elapsed < plan.duration_secs {
            thread::sleep(plan.tick);
            // Wall clock, so time blocked in an update still counts
            let elapsed = plan.ticks_since(started).max(progress.elapsed + 1).min(plan.duration_secs);
            let gained = elapsed - progress.elapsed;
            progress.elapsed = elapsed;
            progress.pending_reward = Mist(progress.pending_reward.0.saturating_add(REWARD_PER_SECOND.0.saturating_mul(gained)));
            on_tick(&progress);

            if plan.update_every > 0 && progress.unreported() >= plan.update_every && progress.elapsed < plan.duration_secs {
                self.update(progress.unreported()).context("Failed to update listening time")?;
                progress.reported = progress.elapsed;
                debug!(reported = progress.reported, "listening time updated");
            }
        }

        self.claim_and_stop(progress.unreported())
            .context("Failed to claim rewards")
    }
}


/// `m:ss`
pub fn format_timer(seconds: u64) -> String { format!("{}:{:02}", seconds / 60, seconds % 60) }

/// `Xh Ym Zs`, dropping leading zero units
pub fn format_duration(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m {s}s"),
    }
}

/// Seconds from `90`, `1m30s`, `2h` and the like
pub fn parse_duration(s: &str) -> Result<u64> {
    static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^(?:(\d+)h)?\s*(?:(\d+)m)?\s*(?:(\d+)s?)?$"#).unwrap());

    let s = s.trim();
    let caps = DURATION_REGEX
        .captures(s)
        .filter(|_| !s.is_empty())
        .with_context(|| format!("Invalid duration {s:?}, expected e.g. 90, 1m30s or 2h"))?;
    [(1, 3600), (2, 60), (3, 1)].into_iter().try_fold(0u64, |total, (group, scale)| {
        let n: u64 = caps.get(group).map_or(Ok(0), |m| m.as_str().parse())?;
        Ok(total.saturating_add(n.saturating_mul(scale)))
    })
}
