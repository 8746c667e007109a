//! Open sequence driver.
//!
//! `Controller` owns the session, the particle engine and the RNG, and talks to
//! the outside world through two seams: an [`EnvelopeView`] that draws things
//! and a [`Scheduler`] that delivers delayed [`Step`]s back via
//! [`Controller::on_step`]. The browser implements both in `dom`; tests use
//! a recording view and [`ManualScheduler`].

use crate::config::LuckyConfig;
use crate::particles::{Particle, ParticleEngine, Point};
use crate::rng::RandomSource;
use crate::selector::{pick_index, weight_lookup};
use crate::session::{ClickOutcome, EnvelopeState, Reveal, Session};

/// Delayed transitions of the open sequence, tagged with their session epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    ShakeDone { epoch: u64 },
    ReleaseGate { epoch: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerHandle(pub i32);

pub trait Scheduler {
    /// Deliver `step` after `delay_ms`. `None` if the timer could not be set.
    fn after(&mut self, delay_ms: u32, step: Step) -> Option<TimerHandle>;
    fn cancel(&mut self, handle: TimerHandle);
}

/// Everything the controller needs to show. Implementations only draw; all
/// decisions are made by the controller.
pub trait EnvelopeView {
    /// Replace every envelope with `count` fresh closed ones.
    fn render_envelopes(&mut self, count: usize);
    fn set_envelope_state(&mut self, index: usize, state: EnvelopeState);
    fn set_envelope_amount(&mut self, index: usize, text: &str);
    /// Short status line ("opening...") in the result region; empty clears it.
    fn set_status(&mut self, text: &str);
    fn show_result(&mut self, congrats: &str, received: &str, amount: &str);
    fn set_modal_visible(&mut self, visible: bool);
    fn set_reset_visible(&mut self, visible: bool);
    /// Drawing surface size in CSS pixels.
    fn surface_size(&self) -> (f64, f64);
    /// Ask for animation frames until [`Controller::frame`] returns false.
    fn request_frames(&mut self);
    fn draw_particles(&mut self, particles: &[Particle]);
    fn clear_surface(&mut self);
}

pub struct Controller<V, S, R> {
    config: LuckyConfig,
    session: Session,
    particles: ParticleEngine,
    view: V,
    scheduler: S,
    rng: R,
    pending: Vec<(TimerHandle, Step)>,
}

impl<V: EnvelopeView, S: Scheduler, R: RandomSource> Controller<V, S, R> {
    pub fn new(config: LuckyConfig, view: V, scheduler: S, rng: R) -> Self {
        let session = Session::new(config.envelopes);
        let particles = ParticleEngine::new(config.burst_spec());
        Self { config, session, particles, view, scheduler, rng, pending: Vec::new() }
    }

    /// First render: closed envelopes, hidden modal and reset control.
    pub fn init(&mut self) {
        self.view.set_reset_visible(false);
        self.view.set_modal_visible(false);
        self.view.render_envelopes(self.config.envelopes);
        log::info!("lucky envelopes ready: {} envelopes", self.config.envelopes);
    }

    pub fn click(&mut self, index: usize) -> ClickOutcome {
        let outcome = self.session.click(index);
        match outcome {
            ClickOutcome::Started { epoch } => {
                log::debug!("opening envelope {}", index);
                self.view.set_status(&self.config.texts.opening);
                self.view.set_envelope_state(index, EnvelopeState::Shaking);
                self.schedule(self.config.shake_ms, Step::ShakeDone { epoch });
            }
            ClickOutcome::Rejected(reason) => {
                log::debug!("click on envelope {} ignored: {:?}", index, reason);
            }
        }
        outcome
    }

    pub fn on_step(&mut self, step: Step) {
        self.pending.retain(|(_, s)| *s != step);
        match step {
            Step::ShakeDone { epoch } => {
                if let Some(reveal) = self.reveal(epoch) {
                    log::info!("envelope {} revealed {}", reveal.envelope, reveal.amount);
                    self.schedule(self.config.settle_ms, Step::ReleaseGate { epoch });
                } else {
                    log::debug!("stale shake step (epoch {}) ignored", epoch);
                }
            }
            Step::ReleaseGate { epoch } => {
                if !self.session.release_gate(epoch) {
                    log::debug!("stale gate release (epoch {}) ignored", epoch);
                }
            }
        }
    }

    fn reveal(&mut self, epoch: u64) -> Option<Reveal> {
        let amounts = &self.config.amounts;
        let weights = &self.config.weights;
        let rng = &mut self.rng;
        let reveal = self.session.reveal_with(epoch, || {
            let i = pick_index(amounts, weight_lookup(weights), rng);
            (i, amounts.get(i).copied().unwrap_or_default())
        })?;

        let label = self.config.amount_label(reveal.amount);
        self.view.set_envelope_amount(reveal.envelope, &label);
        for (i, state) in self.session.envelopes().iter().enumerate() {
            self.view.set_envelope_state(i, *state);
        }
        self.view.show_result(&self.config.texts.congrats, &self.config.texts.received, &label);
        self.view.set_modal_visible(true);
        self.view.set_reset_visible(true);
        self.celebrate();
        Some(reveal)
    }

    fn celebrate(&mut self) {
        let (w, h) = self.view.surface_size();
        // a bit above centre
        let origin = Point { x: w / 2.0, y: h / 3.0 };
        if self.particles.trigger(origin, &mut self.rng) {
            self.view.request_frames();
        }
    }

    /// One animation frame. Returns whether more frames are wanted.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        if self.particles.frame(now_ms) {
            self.view.draw_particles(self.particles.particles());
            true
        } else {
            self.view.clear_surface();
            false
        }
    }

    /// Start a new session: cancel pending timers, unlock, clear visuals.
    pub fn reset(&mut self) {
        for (handle, _) in self.pending.drain(..) {
            self.scheduler.cancel(handle);
        }
        let epoch = self.session.reset();
        self.particles.clear();
        self.view.clear_surface();
        self.view.set_status("");
        self.view.set_modal_visible(false);
        self.view.set_reset_visible(false);
        self.view.render_envelopes(self.config.envelopes);
        log::info!("session reset (epoch {})", epoch);
    }

    /// Hide the result modal; the session stays locked until reset.
    pub fn dismiss_result(&mut self) {
        self.view.set_modal_visible(false);
    }

    fn schedule(&mut self, delay_ms: u32, step: Step) {
        match self.scheduler.after(delay_ms, step) {
            Some(handle) => self.pending.push((handle, step)),
            None => {
                log::warn!("timer unavailable, running {:?} immediately", step);
                self.on_step(step);
            }
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn particles(&self) -> &ParticleEngine {
        &self.particles
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

/// Virtual-clock scheduler: steps become due when [`ManualScheduler::pop_due`]
/// is asked about a time at or past their deadline.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now_ms: u64,
    next_id: i32,
    queue: Vec<(u64, TimerHandle, Step)>,
}

impl ManualScheduler {
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Earliest step due at or before `until_ms`; advances the clock to it.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Step> {
        let (pos, _) = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, (due, _, _))| *due <= until_ms)
            .min_by_key(|(_, (due, handle, _))| (*due, handle.0))?;
        let (due, _, step) = self.queue.remove(pos);
        self.now_ms = self.now_ms.max(due);
        Some(step)
    }

    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl Scheduler for ManualScheduler {
    fn after(&mut self, delay_ms: u32, step: Step) -> Option<TimerHandle> {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.queue.push((self.now_ms + delay_ms as u64, handle, step));
        Some(handle)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.queue.retain(|(_, h, _)| *h != handle);
    }
}

impl<V: EnvelopeView, R: RandomSource> Controller<V, ManualScheduler, R> {
    /// Run every step due within the next `ms` of virtual time.
    pub fn advance_ms(&mut self, ms: u64) {
        let until = self.scheduler.now_ms() + ms;
        while let Some(step) = self.scheduler.pop_due(until) {
            self.on_step(step);
        }
        self.scheduler.set_now(until);
    }
}
