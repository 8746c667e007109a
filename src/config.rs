//! Widget configuration.
//!
//! Everything here is a compile-time default (`LuckyConfig::default()`); with the
//! `serde_json` feature a JSON document can override any subset of fields before
//! the widget boots. Overrides are validated the same way the defaults are.

use std::collections::BTreeMap;
use std::fmt;

use wasm_bindgen::JsValue;

use crate::particles::BurstSpec;
use crate::selector::{Amount, WeightMap};

/// Currency / unit label appended to every revealed amount.
pub const UNIT: &str = "K";
/// Fixed reward amounts; order defines the selection index.
pub const AMOUNTS: [Amount; 3] = [100, 200, 500];
/// Relative odds per amount (100 => 1%, 200 => 20%, 500 => 79%).
pub const WEIGHTS: [(Amount, f64); 3] = [(100, 1.0), (200, 20.0), (500, 79.0)];
/// Number of closed envelopes shown on screen.
pub const NUM_ENVELOPES: usize = 6;
/// Shake animation length before the amount is drawn.
pub const SHAKE_MS: u32 = 700;
/// Time after the reveal before the `opening` gate is released.
pub const SETTLE_MS: u32 = 1200;
/// Fireworks bursts per celebration.
pub const BURSTS: usize = 6;

pub const FIREWORK_PALETTE: [&str; 6] =
    ["#ff6b6b", "#ffd54f", "#ff8a65", "#ffccbc", "#ffd1dc", "#fff176"];
/// Alternating envelope face colours.
pub const FACE_PALETTE: [&str; 2] = ["#ffebee", "#ffccbc"];

/// User-facing strings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Texts {
    pub envelope_label: String,
    pub opening: String,
    pub congrats: String,
    pub received: String,
    pub reset: String,
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            envelope_label: "Lì xì".to_string(),
            opening: "Đang mở...".to_string(),
            congrats: "Chúc mừng!".to_string(),
            received: "Bạn nhận được".to_string(),
            reset: "Chơi lại".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LuckyConfig {
    pub unit: String,
    pub amounts: Vec<Amount>,
    pub weights: WeightMap,
    pub envelopes: usize,
    pub shake_ms: u32,
    pub settle_ms: u32,
    pub bursts: usize,
    pub firework_palette: Vec<String>,
    pub face_palette: Vec<String>,
    pub texts: Texts,
}

impl Default for LuckyConfig {
    fn default() -> Self {
        Self {
            unit: UNIT.to_string(),
            amounts: AMOUNTS.to_vec(),
            weights: WEIGHTS.iter().copied().collect::<BTreeMap<_, _>>(),
            envelopes: NUM_ENVELOPES,
            shake_ms: SHAKE_MS,
            settle_ms: SETTLE_MS,
            bursts: BURSTS,
            firework_palette: FIREWORK_PALETTE.iter().map(|c| c.to_string()).collect(),
            face_palette: FACE_PALETTE.iter().map(|c| c.to_string()).collect(),
            texts: Texts::default(),
        }
    }
}

impl LuckyConfig {
    /// Parse a JSON override and validate it. Missing fields keep their defaults.
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LuckyConfig =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.amounts.is_empty() {
            return Err(ConfigError::EmptyAmounts);
        }
        if self.envelopes == 0 {
            return Err(ConfigError::NoEnvelopes);
        }
        if let Some((&amount, &weight)) =
            self.weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ConfigError::InvalidWeight { amount, weight });
        }
        if self.firework_palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(())
    }

    /// `"<amount> <unit>"`, as written on an opened envelope.
    pub fn amount_label(&self, amount: Amount) -> String {
        format!("{} {}", amount, self.unit)
    }

    /// Face colour for the envelope at `index`; cycles through the face palette.
    pub fn face_color(&self, index: usize) -> &str {
        if self.face_palette.is_empty() {
            return FACE_PALETTE[index % FACE_PALETTE.len()];
        }
        &self.face_palette[index % self.face_palette.len()]
    }

    pub fn burst_spec(&self) -> BurstSpec {
        BurstSpec {
            bursts: self.bursts,
            palette: self.firework_palette.clone(),
            ..BurstSpec::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    EmptyAmounts,
    NoEnvelopes,
    InvalidWeight { amount: Amount, weight: f64 },
    EmptyPalette,
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyAmounts => write!(f, "amount list is empty"),
            ConfigError::NoEnvelopes => write!(f, "at least one envelope is required"),
            ConfigError::InvalidWeight { amount, weight } => {
                write!(f, "weight {} for amount {} must be a non-negative number", weight, amount)
            }
            ConfigError::EmptyPalette => write!(f, "firework palette is empty"),
            ConfigError::Parse(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for JsValue {
    fn from(err: ConfigError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
