//! Miner state reported to JavaScript.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Mining statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiningStats {
    /// Total hashes computed.
    pub total_hashes: u64,
    /// Current hash rate (hashes per second).
    pub hash_rate: f64,
    /// Number of shares found.
    pub shares_found: u32,
    /// Whether a satisfying header was found.
    pub solved: bool,
    /// Next nonce to try.
    pub current_nonce: u64,
    /// Seconds the timestamp has been rolled forward.
    pub time_roll: u32,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: f64,
    /// Best hash found (lowest, display format).
    pub best_hash: Option<String>,
    /// Number of leading zeros in best hash.
    pub best_leading_zeros: u32,
}

impl MiningStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update hash rate based on elapsed time.
    pub fn update_hash_rate(&mut self) {
        if self.elapsed_ms > 0.0 {
            self.hash_rate = (self.total_hashes as f64) / (self.elapsed_ms / 1000.0);
        }
    }

    /// Format hash rate for display.
    pub fn format_hash_rate(&self) -> String {
        if self.hash_rate >= 1_000_000_000.0 {
            format!("{:.2} GH/s", self.hash_rate / 1_000_000_000.0)
        } else if self.hash_rate >= 1_000_000.0 {
            format!("{:.2} MH/s", self.hash_rate / 1_000_000.0)
        } else if self.hash_rate >= 1_000.0 {
            format!("{:.2} KH/s", self.hash_rate / 1_000.0)
        } else {
            format!("{:.2} H/s", self.hash_rate)
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

/// Mining order information for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInfo {
    /// Reference digest (display format).
    pub reference: String,
    /// Whether the message commits to a public key instead of a merkle root.
    pub identity: bool,
    /// Message timestamp (header mode only).
    pub timestamp: Option<u32>,
    /// Compact target.
    pub bits: u32,
    /// Difficulty as a number.
    pub difficulty: f64,
    /// Formatted difficulty string.
    pub difficulty_display: String,
    /// Average hashes needed at this difficulty.
    pub expected_hashes: f64,
}

impl OrderInfo {
    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

/// Result of one mining batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInfo {
    /// Whether the batch's best hash qualifies as a share.
    pub share_found: bool,
    /// Whether a satisfying header was found.
    pub solved: bool,
    /// The winning nonce (if solved).
    pub nonce: Option<u32>,
    /// The best hash of this batch (display format).
    pub hash: Option<String>,
    /// Number of leading zeros in that hash.
    pub leading_zeros: u32,
    /// Hashes computed in this batch.
    pub hashes_computed: u64,
}

impl BatchInfo {
    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
}
