//! Fee estimation for the sweep transaction.
//!
//! The fee rate comes from an external "fastest confirmation" HTTP endpoint;
//! the size model is the legacy `180*in + 34*out + 10 + in` byte estimate
//! with exactly one output. Not a general-purpose size model: segwit inputs
//! would be heavily over-estimated.

use bitcoin::Amount;
use log::debug;
use serde::Deserialize;

use crate::Error;

pub const FEE_API_URL: &str = "https://bitcoinfees.earn.com/api/v1/fees/recommended";

/// A source of a satoshis-per-byte fee rate.
pub trait FeeRateSource {
    fn fastest_rate(&self) -> Result<u64, Error>;
}

#[derive(Debug, Deserialize)]
struct RecommendedFees {
    #[serde(rename = "fastestFee")]
    fastest_fee: u64,
}

/// The bitcoinfees.earn.com recommended-fees endpoint.
pub struct EarnFeeApi {
    url: String,
}

impl Default for EarnFeeApi {
    fn default() -> Self {
        EarnFeeApi {
            url: FEE_API_URL.to_string(),
        }
    }
}

impl FeeRateSource for EarnFeeApi {
    fn fastest_rate(&self) -> Result<u64, Error> {
        let fees: RecommendedFees = reqwest::blocking::get(&self.url)
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| Error::FeeServiceUnavailable(e.to_string()))?;
        debug!("fastest fee rate: {} sat/B", fees.fastest_fee);
        Ok(fees.fastest_fee)
    }
}

/// A caller-chosen constant rate, the documented fallback when the fee
/// service is down. Never substitutes a zero fee silently: construction
/// rejects a zero rate.
pub struct FixedFeeRate(u64);

impl FixedFeeRate {
    pub fn new(sat_per_byte: u64) -> Result<Self, Error> {
        if sat_per_byte == 0 {
            return Err(Error::FeeServiceUnavailable(
                "refusing a zero fallback fee rate".into(),
            ));
        }
        Ok(FixedFeeRate(sat_per_byte))
    }
}

impl FeeRateSource for FixedFeeRate {
    fn fastest_rate(&self) -> Result<u64, Error> {
        Ok(self.0)
    }
}

/// Converts the size estimate for `input_count` legacy inputs and one output
/// into an absolute fee at `sat_per_byte`.
pub fn estimate_fee(input_count: usize, sat_per_byte: u64) -> Amount {
    let size = 180 * input_count + 34 + 10 + input_count;
    Amount::from_sat(size as u64 * sat_per_byte)
}
