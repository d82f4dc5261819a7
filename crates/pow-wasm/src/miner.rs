//! Mining controller for the WASM miner.

use wasm_bindgen::prelude::*;
use pow_core::{
    difficulty::{expected_hashes, format_difficulty},
    order::COMPRESSED_KEY_SIZE,
    params::{DEFAULT_VERSION, SHARE_MIN_LEADING_ZEROS},
    Candidate, CompactTarget, Digest, Message, MiningOrder, Search, WorkError,
};
use crate::state::{BatchInfo, MiningStats, OrderInfo};

const NONCE_SPACE: u64 = 1 << 32;

/// The main mining controller.
#[wasm_bindgen]
pub struct Miner {
    /// Header version packed into candidates.
    version: u32,
    /// The order as loaded, before any timestamp roll.
    order: Option<MiningOrder>,
    /// Whether the order's timestamp may be rolled (header mode).
    rollable: bool,
    /// Mining statistics.
    stats: MiningStats,
    /// Start time of mining.
    start_time: f64,
    /// Whether mining is active.
    is_mining: bool,
    /// Next nonce to try.
    current_nonce: u64,
    /// Seconds added to the order timestamp.
    time_roll: u32,
    /// Best hash found so far.
    best_hash: Option<Digest>,
    /// The satisfying header, once found.
    solution: Option<Candidate>,
}

#[wasm_bindgen]
impl Miner {
    /// Create a new miner instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Miner {
        Miner {
            version: DEFAULT_VERSION,
            order: None,
            rollable: false,
            stats: MiningStats::new(),
            start_time: 0.0,
            is_mining: false,
            current_nonce: 0,
            time_roll: 0,
            best_hash: None,
            solution: None,
        }
    }

    /// Header version used for new candidates.
    #[wasm_bindgen(getter)]
    pub fn header_version(&self) -> u32 {
        self.version
    }

    /// Set the header version used for new candidates.
    #[wasm_bindgen(setter)]
    pub fn set_header_version(&mut self, version: u32) {
        self.version = version;
    }

    /// Load a header-mode order.
    ///
    /// # Arguments
    /// * `reference` - The previous block hash (display byte order)
    /// * `merkle_root` - The merkle root (display byte order)
    /// * `timestamp` - The header timestamp (or 0 to use current time)
    /// * `bits` - The compact target
    #[wasm_bindgen]
    pub fn load_order(
        &mut self,
        reference: &str,
        merkle_root: &str,
        timestamp: u32,
        bits: u32,
    ) -> Result<JsValue, JsValue> {
        let reference = Digest::from_display_hex(reference).map_err(js_error)?;
        let merkle_root = Digest::from_display_hex(merkle_root).map_err(js_error)?;

        // Get timestamp (use provided or current time)
        let ts = if timestamp > 0 {
            timestamp
        } else {
            (js_sys::Date::now() / 1000.0) as u32
        };

        let order = MiningOrder::header(
            reference,
            &merkle_root,
            ts,
            CompactTarget::from_bits(bits),
        );
        self.load(order)
    }

    /// Load an identity-mode order committing to a compressed public key.
    ///
    /// # Arguments
    /// * `reference` - The reference digest (display byte order)
    /// * `public_key` - 33-byte compressed public key as hex
    /// * `bits` - The compact target
    #[wasm_bindgen]
    pub fn load_identity_order(
        &mut self,
        reference: &str,
        public_key: &str,
        bits: u32,
    ) -> Result<JsValue, JsValue> {
        let reference = Digest::from_display_hex(reference).map_err(js_error)?;
        let key = parse_compressed_key(public_key).map_err(js_error)?;

        let order = MiningOrder::new(
            reference,
            Message::compressed_key(&key),
            CompactTarget::from_bits(bits),
        );
        self.load(order)
    }

    /// Mine a batch of nonces.
    ///
    /// # Arguments
    /// * `batch_size` - Number of nonces to try in this batch
    ///
    /// # Returns
    /// Batch result with share/solution status. Fails once the nonce space
    /// cannot be extended any further.
    #[wasm_bindgen]
    pub fn mine_batch(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let order = self.order.ok_or_else(|| JsValue::from_str("No order loaded"))?;

        if let Some(solution) = self.solution {
            return BatchInfo {
                share_found: false,
                solved: true,
                nonce: Some(solution.nonce()),
                hash: Some(solution.hash().display_hex()),
                leading_zeros: solution.hash().leading_zero_bits(),
                hashes_computed: 0,
            }
            .to_js();
        }

        // Roll the timestamp once the nonce space is spent
        if self.current_nonce >= NONCE_SPACE {
            if !self.rollable {
                return Err(js_error(WorkError::Exhausted {
                    hashes: self.stats.total_hashes,
                }));
            }
            self.time_roll += 1;
            self.current_nonce = 0;
            self.stats.time_roll = self.time_roll;
        }

        let scan = Search::new()
            .version(self.version)
            .nonce_start(self.current_nonce as u32)
            .nonce_count(batch_size as u64)
            .scan(&order.rolled(self.time_roll))
            .map_err(js_error)?;

        // Update statistics
        self.stats.total_hashes += scan.hashes;
        self.current_nonce += scan.hashes;
        self.stats.current_nonce = self.current_nonce;

        // Update elapsed time
        if self.start_time > 0.0 {
            let now = js_sys::Date::now();
            self.stats.elapsed_ms = now - self.start_time;
            self.stats.update_hash_rate();
        }

        let mut info = BatchInfo {
            share_found: false,
            solved: scan.found.is_some(),
            nonce: scan.found.map(|c| c.nonce()),
            hash: None,
            leading_zeros: 0,
            hashes_computed: scan.hashes,
        };

        if let Some(best) = scan.best {
            let hash = best.hash();
            let leading_zeros = hash.leading_zero_bits();
            info.hash = Some(hash.display_hex());
            info.leading_zeros = leading_zeros;

            if leading_zeros >= SHARE_MIN_LEADING_ZEROS {
                info.share_found = true;
                self.stats.shares_found += 1;
            }

            // Update best hash if this is better
            let is_better = match &self.best_hash {
                None => true,
                Some(current) => hash.as_number() < current.as_number(),
            };

            if is_better {
                self.best_hash = Some(hash);
                self.stats.best_hash = Some(hash.display_hex());
                self.stats.best_leading_zeros = leading_zeros;
            }
        }

        if let Some(candidate) = scan.found {
            self.stats.solved = true;
            self.solution = Some(candidate);
            console_log(&format!("Solved header at nonce {}", candidate.nonce()));
        }

        info.to_js()
    }

    /// Start mining.
    #[wasm_bindgen]
    pub fn start_mining(&mut self) {
        self.is_mining = true;
        self.start_time = js_sys::Date::now();
    }

    /// Stop mining.
    #[wasm_bindgen]
    pub fn stop_mining(&mut self) {
        self.is_mining = false;
    }

    /// Check if mining is active.
    #[wasm_bindgen(getter)]
    pub fn is_mining(&self) -> bool {
        self.is_mining
    }

    /// Get current mining statistics.
    #[wasm_bindgen]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        self.stats.to_js()
    }

    /// Get the formatted hash rate.
    #[wasm_bindgen]
    pub fn get_hash_rate_display(&self) -> String {
        self.stats.format_hash_rate()
    }

    /// Get the solved 80-byte header as hex (if a solution was found).
    #[wasm_bindgen]
    pub fn get_header_hex(&self) -> Option<String> {
        self.solution.map(|candidate| candidate.to_hex())
    }

    /// Reset the miner for a new order.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.order = None;
        self.rollable = false;
        self.clear_progress();
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new()
    }
}

impl Miner {
    fn load(&mut self, order: MiningOrder) -> Result<JsValue, JsValue> {
        order.validate().map_err(js_error)?;
        let rollable = order.rollable();

        let difficulty = order.target.difficulty();
        let info = OrderInfo {
            reference: order.reference.display_hex(),
            identity: !rollable,
            timestamp: rollable.then(|| order.message.timestamp()),
            bits: order.target.bits(),
            difficulty,
            difficulty_display: format_difficulty(difficulty),
            expected_hashes: expected_hashes(difficulty),
        };

        self.order = Some(order);
        self.rollable = rollable;
        self.clear_progress();

        info.to_js()
    }

    fn clear_progress(&mut self) {
        self.stats = MiningStats::new();
        self.current_nonce = 0;
        self.time_roll = 0;
        self.start_time = 0.0;
        self.is_mining = false;
        self.best_hash = None;
        self.solution = None;
    }
}

/// Parse a 33-byte compressed public key from hex.
pub fn parse_compressed_key(s: &str) -> Result<[u8; COMPRESSED_KEY_SIZE], WorkError> {
    let bytes = hex::decode(s).map_err(WorkError::from)?;
    if bytes.len() != COMPRESSED_KEY_SIZE {
        return Err(WorkError::InvalidLength {
            expected: COMPRESSED_KEY_SIZE,
            got: bytes.len(),
        });
    }
    let mut key = [0u8; COMPRESSED_KEY_SIZE];
    key.copy_from_slice(&bytes);
    Ok(key)
}

fn js_error(err: WorkError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Log to the browser console.
#[wasm_bindgen]
pub fn console_log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}
