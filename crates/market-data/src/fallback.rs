//! Synthetic market data used when the upstream cannot answer.
//!
//! Output is a pure function of `(seed, request parameters)`, plus the UTC day
//! for chart series, so repeated calls within one process and one day return
//! identical payloads. A fresh seed per process is fine; nothing downstream
//! relies on cross-restart stability.

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{ChartPoint, MarketAsset};

const MS_PER_DAY: i64 = 86_400_000;
const IMAGE_BASE: &str = "https://coin-images.coingecko.com/coins/images";

/// Deterministic generator for schema-complete placeholder data.
#[derive(Clone, Debug)]
pub struct FallbackGenerator {
    seed: u64,
}

impl FallbackGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn rng_for(&self, key: &str) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ fnv1a(key.as_bytes()))
    }

    /// `limit` assets ordered by descending market cap.
    ///
    /// The first ten are the demo set; the rest are synthesised per position,
    /// so a shorter listing is always a prefix of a longer one.
    pub fn markets(&self, limit: u32) -> Vec<MarketAsset> {
        let mut assets = demo_assets();
        assets.truncate(limit as usize);

        let floor = assets
            .last()
            .map(|a| a.market_cap)
            .unwrap_or(dec!(8234567890));
        for position in assets.len()..limit as usize {
            assets.push(self.synthetic_asset(position, floor));
        }
        assets
    }

    fn synthetic_asset(&self, position: usize, cap_ceiling: Decimal) -> MarketAsset {
        let number = position + 1;
        let mut rng = self.rng_for(&format!("markets:{}", number));

        // Zipf-like: ceiling * 10 / rank. Neighbours differ by at least one
        // unit while rank^2 < ceiling * 10, i.e. for ~286k ranks.
        let market_cap = (cap_ceiling * Decimal::TEN / Decimal::from(number)).floor();

        let price = Decimal::new(rng.gen_range(1_000..=5_000_000), 4);
        let volume_bps: i64 = rng.gen_range(100..=1_000);
        let total_volume = (market_cap * Decimal::new(volume_bps, 4)).round_dp(0);
        let change = Decimal::new(rng.gen_range(-1_000..=1_000), 2);

        MarketAsset {
            id: format!("synthetic-{}", number),
            symbol: format!("syn{}", number),
            name: format!("Synthetic Asset {}", number),
            image: format!("{}/synthetic/{}.png", IMAGE_BASE, number),
            current_price: price,
            market_cap,
            total_volume,
            price_change_percentage_24h: change,
        }
    }

    /// Daily series of `days + 1` points ending today (UTC midnight), ascending.
    pub fn chart(&self, coin_id: &str, days: u32) -> Vec<ChartPoint> {
        self.chart_at(coin_id, days, Utc::now())
    }

    /// Same as [`chart`](Self::chart), ending on the UTC day containing `at`.
    ///
    /// Known demo coins start from their demo price; anything else, including
    /// identifiers the upstream rejected, gets a seeded starting price. The
    /// walk is keyed by the end day, so it changes once per day.
    pub fn chart_at(&self, coin_id: &str, days: u32, at: DateTime<Utc>) -> Vec<ChartPoint> {
        let days = days.max(1);
        let end_ms = utc_midnight_ms(at);
        let mut rng = self.rng_for(&format!("chart:{}:{}", coin_id, end_ms));

        let mut price = demo_assets()
            .into_iter()
            .find(|a| a.id == coin_id)
            .map(|a| a.current_price)
            .unwrap_or_else(|| Decimal::new(rng.gen_range(10_000..=10_000_000), 4));

        let start = end_ms - i64::from(days) * MS_PER_DAY;
        let mut points = Vec::with_capacity(days as usize + 1);
        for day in 0..=i64::from(days) {
            if day > 0 {
                // +/- 5% daily move
                let bps: i64 = rng.gen_range(-500..=500);
                price += price * Decimal::new(bps, 4);
            }
            points.push(ChartPoint::new(start + day * MS_PER_DAY, round_price(price)));
        }
        points
    }
}

fn utc_midnight_ms(at: DateTime<Utc>) -> i64 {
    at.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(at)
        .timestamp_millis()
}

fn round_price(price: Decimal) -> Decimal {
    if price >= Decimal::ONE {
        price.round_dp(2)
    } else {
        price.round_dp(6)
    }
}

/// 64-bit FNV-1a; stable across runs and platforms, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(PRIME)
    })
}

#[allow(clippy::too_many_arguments)]
fn demo_asset(
    id: &str,
    symbol: &str,
    name: &str,
    image_path: &str,
    current_price: Decimal,
    market_cap: Decimal,
    total_volume: Decimal,
    price_change_percentage_24h: Decimal,
) -> MarketAsset {
    MarketAsset {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        image: format!("{}/{}", IMAGE_BASE, image_path),
        current_price,
        market_cap,
        total_volume,
        price_change_percentage_24h,
    }
}

/// The ten-coin demo listing served when the upstream is unavailable.
#[rustfmt::skip]
pub fn demo_assets() -> Vec<MarketAsset> {
    vec![
        demo_asset("bitcoin", "btc", "Bitcoin", "1/large/bitcoin.png",
            dec!(67234.50), dec!(1324567890123), dec!(28456789012), dec!(2.45)),
        demo_asset("ethereum", "eth", "Ethereum", "279/large/ethereum.png",
            dec!(3456.78), dec!(415678901234), dec!(15678901234), dec!(1.23)),
        demo_asset("binancecoin", "bnb", "BNB", "825/large/bnb-icon2_2x.png",
            dec!(589.45), dec!(87654321098), dec!(1234567890), dec!(-0.85)),
        demo_asset("solana", "sol", "Solana", "4128/large/solana.png",
            dec!(145.67), dec!(65432109876), dec!(2345678901), dec!(5.67)),
        demo_asset("ripple", "xrp", "XRP", "44/large/xrp-symbol-white-128.png",
            dec!(0.5234), dec!(28765432109), dec!(987654321), dec!(-1.23)),
        demo_asset("cardano", "ada", "Cardano", "975/large/cardano.png",
            dec!(0.4567), dec!(16234567890), dec!(456789012), dec!(3.45)),
        demo_asset("dogecoin", "doge", "Dogecoin", "5/large/dogecoin.png",
            dec!(0.0834), dec!(12098765432), dec!(678901234), dec!(8.90)),
        demo_asset("tron", "trx", "TRON", "1094/large/tron-logo.png",
            dec!(0.1234), dec!(10876543210), dec!(345678901), dec!(-2.34)),
        demo_asset("polkadot", "dot", "Polkadot", "12171/large/polkadot.png",
            dec!(7.89), dec!(9876543210), dec!(234567890), dec!(1.56)),
        demo_asset("polygon", "matic", "Polygon", "4713/large/polygon.png",
            dec!(0.8765), dec!(8234567890), dec!(456789012), dec!(-3.21)),
    ]
}
