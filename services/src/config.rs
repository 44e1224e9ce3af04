//! Layered settings: built-in deployment ids, then a TOML file, then `TUNEMINT_*` environment variables.

use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use anyhow::{
    Context,
    Result,
};
use config::{
    Environment,
    File,
};
use serde::Deserialize;
use serde_with::{
    serde_as,
    DisplayFromStr,
};
use tunemint_core::{
    Address,
    ObjectId,
    TypeTag,
};

pub const ENV_PREFIX: &str = "TUNEMINT";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::rpc_url")]
    pub rpc_url: String,

    #[serde(default = "defaults::keystore")]
    pub keystore: PathBuf,

    /// Account to act as; the first keystore key when unset
    #[serde(default)]
    pub address: Option<Address>,

    #[serde(default = "defaults::gas_budget")]
    pub gas_budget: u64,

    #[serde(default = "defaults::request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "defaults::confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,

    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub marketplace: MarketplaceIds,
    #[serde(default)]
    pub nft: NftIds,
    #[serde(default)]
    pub music: MusicIds,
    #[serde(default)]
    pub trading: TradingIds,
}

/// Generic item marketplace
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketplaceIds {
    pub package_id: ObjectId,
    pub marketplace_id: ObjectId,
    #[serde_as(as = "DisplayFromStr")]
    pub coin_type: TypeTag,
}

/// Quick-mint NFT package, and the one it replaced
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NftIds {
    pub package_id: ObjectId,
    pub collection_id: ObjectId,
    pub legacy_package_id: ObjectId,
    pub legacy_collection_id: ObjectId,
}

/// Listen-to-earn package
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MusicIds {
    pub package_id: ObjectId,
    pub marketplace_id: ObjectId,
    pub collection_id: ObjectId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingIds {
    pub package_id: ObjectId,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: defaults::rpc_url(),
            keystore: defaults::keystore(),
            address: None,
            gas_budget: defaults::gas_budget(),
            request_timeout_secs: defaults::request_timeout_secs(),
            confirm_timeout_secs: defaults::confirm_timeout_secs(),
            poll_interval_ms: defaults::poll_interval_ms(),
            marketplace: MarketplaceIds::default(),
            nft: NftIds::default(),
            music: MusicIds::default(),
            trading: TradingIds::default(),
        }
    }
}

impl Default for MarketplaceIds {
    fn default() -> Self {
        Self {
            package_id: defaults::id(defaults::MARKETPLACE_PACKAGE),
            marketplace_id: defaults::id(defaults::MARKETPLACE),
            coin_type: defaults::sui_coin_type(),
        }
    }
}

impl Default for NftIds {
    fn default() -> Self {
        Self {
            package_id: defaults::id(defaults::NFT_PACKAGE),
            collection_id: defaults::id(defaults::NFT_COLLECTION),
            legacy_package_id: defaults::id(defaults::MARKETPLACE_PACKAGE),
            legacy_collection_id: defaults::id(defaults::LEGACY_NFT_COLLECTION),
        }
    }
}

impl Default for MusicIds {
    fn default() -> Self {
        Self {
            package_id: defaults::id(defaults::MUSIC_PACKAGE),
            marketplace_id: defaults::id(defaults::MUSIC_MARKETPLACE),
            collection_id: defaults::id(defaults::MUSIC_COLLECTION),
        }
    }
}

impl Default for TradingIds {
    fn default() -> Self {
        Self {
            package_id: defaults::id(defaults::TRADING_PACKAGE),
        }
    }
}

impl Config {
    /// `$CONFIG_DIR/tunemint/config.toml`
    pub fn default_path() -> Option<PathBuf> { dirs::config_dir().map(|d| d.join("tunemint").join("config.toml")) }

    /// Reads `path` if given, otherwise the default file if present, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => match Self::default_path() {
                Some(path) => File::from(path).required(false),
                None => return Self::build(config::Config::builder().add_source(environment())),
            },
        };
        Self::build(config::Config::builder().add_source(file).add_source(environment()))
            .with_context(|| format!("Failed to load configuration{}", path.map(|p| format!(" from {}", p.display())).unwrap_or_default()))
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder.build()?.try_deserialize().context("Invalid configuration")
    }

    pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs) }

    pub fn confirm_timeout(&self) -> Duration { Duration::from_secs(self.confirm_timeout_secs) }

    pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}


mod defaults {
    use std::path::PathBuf;

    use tunemint_core::{
        ObjectId,
        StructTag,
        TypeTag,
    };

    pub const MARKETPLACE_PACKAGE: [u8; 32] = hex32("08ac46b00eb814de6e803b7abb60b42abbaf49712314f4ed188f4fea6d4ce3ec");
    pub const MARKETPLACE: [u8; 32] = hex32("b9aa59546415a92290e60ad5d90a9d0b013da1b3daa046aba44a0be113a83b84");
    pub const LEGACY_NFT_COLLECTION: [u8; 32] = hex32("07c09c81925e5f995479fac9caa6fdc0983863e800ee4b04831bcd44e4fb427a");
    pub const NFT_PACKAGE: [u8; 32] = hex32("ef31a73e2b31f94fc64fba29c65482857ef60c30a10932da7e86c74f9a9a4ac8");
    pub const NFT_COLLECTION: [u8; 32] = hex32("b0d2997345aed39db636afb6f66f96e660aef921f0eb7a440e412afe69285d05");
    pub const MUSIC_PACKAGE: [u8; 32] = hex32("989abceb5afcc1ee7f460b41e79f03ee4d3406191ee964da95db51a20fa95f27");
    pub const MUSIC_MARKETPLACE: [u8; 32] = hex32("c92b9ba2f210fadaa565de58660757916c48fd44521998296c4157d0764b5cac");
    pub const MUSIC_COLLECTION: [u8; 32] = hex32("4638a72793aea3c5ff3ca1f48ae5f88ff1b0c079448ee8995925264405c36f0c");
    pub const TRADING_PACKAGE: [u8; 32] = hex32("5281a724289520fadb5984c3686f8b63cf574d4820fcf584137a820516afa507");

    const fn hex32(s: &str) -> [u8; 32] {
        const fn nibble(c: u8) -> u8 {
            match c {
                b'0'..=b'9' => c - b'0',
                b'a'..=b'f' => c - b'a' + 10,
                _ => panic!("invalid hex digit"),
            }
        }

        let s = s.as_bytes();
        let mut out = [0; 32];
        let mut i = 0;
        while i < 32 {
            out[i] = nibble(s[2 * i]) << 4 | nibble(s[2 * i + 1]);
            i += 1;
        }
        out
    }

    pub fn id(bytes: [u8; 32]) -> ObjectId { ObjectId::new(bytes) }

    pub fn sui_coin_type() -> TypeTag {
        StructTag {
            address: ObjectId::FRAMEWORK,
            module: "sui".into(),
            name: "SUI".into(),
            type_params: vec![],
        }
        .into()
    }

    pub fn rpc_url() -> String { "https://fullnode.testnet.sui.io:443".into() }

    pub fn keystore() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".sui")
            .join("sui_config")
            .join("sui.keystore")
    }

    pub fn gas_budget() -> u64 { 100_000_000 }

    pub fn request_timeout_secs() -> u64 { 30 }

    pub fn confirm_timeout_secs() -> u64 { 60 }

    pub fn poll_interval_ms() -> u64 { 1_000 }
}


#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    const SAMPLE: &str = r#"
rpc_url = "http://127.0.0.1:9000"
gas_budget = 5000000

[marketplace]
coin_type = "0x2::sui::SUI"
marketplace_id = "0x42"

[music]
package_id = "0x98"
"#;

    fn load(sources: config::ConfigBuilder<config::builder::DefaultState>) -> Config { Config::build(sources).unwrap() }

    #[test]
    fn built_in_deployment() {
        let config = load(config::Config::builder());
        assert_eq!(
            config.marketplace.package_id.to_string(),
            "0x08ac46b00eb814de6e803b7abb60b42abbaf49712314f4ed188f4fea6d4ce3ec"
        );
        assert_eq!(config.trading.package_id.to_string(), "0x5281a724289520fadb5984c3686f8b63cf574d4820fcf584137a820516afa507");
        assert_eq!(config.nft.legacy_package_id, config.marketplace.package_id);
        assert_eq!(config.marketplace.coin_type.to_string(), "0x2::sui::SUI");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(config.keystore.ends_with("sui.keystore"));
        assert_eq!(config.address, None);
    }

    #[test]
    fn file_overrides_some_keys() {
        let config = load(config::Config::builder().add_source(File::from_str(SAMPLE, FileFormat::Toml)));

        assert_eq!(config.rpc_url, "http://127.0.0.1:9000");
        assert_eq!(config.gas_budget, 5_000_000);
        assert_eq!(config.marketplace.marketplace_id, "0x42".parse().unwrap());
        assert_eq!(config.marketplace.package_id, MarketplaceIds::default().package_id);
        assert_eq!(config.music.package_id, "0x98".parse().unwrap());
        assert_eq!(config.music.marketplace_id, MusicIds::default().marketplace_id);
    }

    #[test]
    fn environment_wins() {
        let env = config::Map::from([
            ("TUNEMINT_GAS_BUDGET".to_owned(), "7".to_owned()),
            ("TUNEMINT_ADDRESS".to_owned(), "0x6".to_owned()),
            ("TUNEMINT_TRADING__PACKAGE_ID".to_owned(), "0x52".to_owned()),
        ]);
        let config = load(
            config::Config::builder()
                .add_source(File::from_str(SAMPLE, FileFormat::Toml))
                .add_source(environment().source(Some(env))),
        );

        assert_eq!(config.gas_budget, 7);
        assert_eq!(config.address, Some(Address::CLOCK));
        assert_eq!(config.trading.package_id, "0x52".parse().unwrap());
        assert_eq!(config.rpc_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn bad_id() {
        let err = Config::build(config::Config::builder().add_source(File::from_str("[nft]\npackage_id = \"0xzz\"", FileFormat::Toml))).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid configuration"));
    }
}
