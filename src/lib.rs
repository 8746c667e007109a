//! Lucky Envelopes core crate.
//!
//! A row of closed lì xì envelopes; the user opens one, it reveals an amount
//! drawn from a small weighted distribution and a fireworks burst plays on a
//! full-viewport canvas. One open per session, until reset.
//!
//! The pure logic (selector, particles, session, controller) is plain Rust and
//! tested natively; `dom` is the thin browser layer on top.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod controller;
pub mod particles;
pub mod rng;
pub mod selector;
pub mod session;

mod dom;

pub use config::{ConfigError, LuckyConfig, Texts};
pub use controller::{Controller, EnvelopeView, ManualScheduler, Scheduler, Step, TimerHandle};
pub use particles::{BurstSpec, Particle, ParticleEngine, Point, advance, create_burst};
pub use rng::{RandomSource, XorShift};
pub use selector::{Amount, WeightMap, pick_index, try_pick_index, weight_lookup};
pub use session::{ClickOutcome, EnvelopeState, Phase, RejectReason, Reveal, Session};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    console_log::init_with_level(log::Level::Debug).ok();
}

// -----------------------------------------------------------------------------
// JS entrypoints
// -----------------------------------------------------------------------------

/// Render the envelopes with the built-in amounts and odds.
#[wasm_bindgen]
pub fn start_lucky_envelopes() -> Result<(), JsValue> {
    dom::boot(LuckyConfig::default())
}

/// Like [`start_lucky_envelopes`] but with a JSON override of the defaults,
/// e.g. `{"unit":"đ","weights":{"100":10,"200":30,"500":60}}`.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_with_config(json: &str) -> Result<(), JsValue> {
    let config = LuckyConfig::from_json(json)?;
    dom::boot(config)
}

/// Same as pressing the reset control.
#[wasm_bindgen]
pub fn reset_envelopes() {
    dom::reset();
}

/// Probability of each configured amount, in amount-list order.
#[wasm_bindgen]
pub fn amount_odds() -> Vec<f64> {
    let config = LuckyConfig::default();
    selector::probabilities(&config.amounts, &config.weights)
}
