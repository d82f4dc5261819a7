//! WebAssembly bindings for the proof-of-work header miner.
//!
//! This crate provides JavaScript-accessible APIs for:
//! - Loading mining orders from hex digests, timestamps and compact targets
//! - Mining in bounded batches with share detection and timestamp rolling
//! - Reading back the solved 80-byte header

use wasm_bindgen::prelude::*;

pub mod miner;
pub mod state;

// Re-export main types for JS access
pub use miner::Miner;

/// Initialize the WASM module with better panic messages.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Expand a compact target to its 256-bit threshold, as big-endian hex.
#[wasm_bindgen]
pub fn expand_target(bits: u32) -> Result<String, JsValue> {
    let target = pow_core::CompactTarget::from_bits(bits);
    if !target.valid() {
        return Err(JsValue::from_str("Invalid compact target"));
    }
    let pow_core::U256(words) = target.expand();
    Ok(words.iter().rev().map(|word| format!("{:016x}", word)).collect())
}
