// Integration tests (native) for the `lucky-envelopes` crate.
// These drive the whole open sequence through a recording view and the manual
// scheduler, without any browser APIs.

use std::cell::Cell;
use std::rc::Rc;

use lucky_envelopes::{
    ClickOutcome, Controller, EnvelopeState, EnvelopeView, LuckyConfig, ManualScheduler,
    Particle, RandomSource, RejectReason, XorShift, advance,
};

#[derive(Default)]
struct PageView {
    states: Vec<EnvelopeState>,
    faces: Vec<Option<String>>,
    modal: bool,
    status: String,
    cleared: bool,
}

impl EnvelopeView for PageView {
    fn render_envelopes(&mut self, count: usize) {
        self.states = vec![EnvelopeState::Closed; count];
        self.faces = vec![None; count];
    }
    fn set_envelope_state(&mut self, index: usize, state: EnvelopeState) {
        self.states[index] = state;
    }
    fn set_envelope_amount(&mut self, index: usize, text: &str) {
        self.faces[index] = Some(text.to_string());
    }
    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
    }
    fn show_result(&mut self, _congrats: &str, _received: &str, amount: &str) {
        self.status = amount.to_string();
    }
    fn set_modal_visible(&mut self, visible: bool) {
        self.modal = visible;
    }
    fn set_reset_visible(&mut self, _visible: bool) {}
    fn surface_size(&self) -> (f64, f64) {
        (800.0, 600.0)
    }
    fn request_frames(&mut self) {}
    fn draw_particles(&mut self, _particles: &[Particle]) {
        self.cleared = false;
    }
    fn clear_surface(&mut self) {
        self.cleared = true;
    }
}

/// Counts every random draw so tests can prove a rejected click draws nothing.
struct CountingRng {
    inner: XorShift,
    draws: Rc<Cell<usize>>,
}

impl RandomSource for CountingRng {
    fn next_f64(&mut self) -> f64 {
        self.draws.set(self.draws.get() + 1);
        self.inner.next_f64()
    }
}

fn page(seed: u64) -> (Controller<PageView, ManualScheduler, CountingRng>, Rc<Cell<usize>>) {
    let draws = Rc::new(Cell::new(0));
    let rng = CountingRng { inner: XorShift::new(seed), draws: draws.clone() };
    let mut c = Controller::new(LuckyConfig::default(), PageView::default(), ManualScheduler::default(), rng);
    c.init();
    (c, draws)
}

#[test]
fn open_second_envelope_then_fourth_is_ignored() {
    let (mut c, draws) = page(2024);
    assert_eq!(c.view().states.len(), 6);

    assert!(matches!(c.click(1), ClickOutcome::Started { .. }));
    c.advance_ms(700);

    let face = c.view().faces[1].clone().expect("opened envelope shows an amount");
    assert!(["100 K", "200 K", "500 K"].contains(&face.as_str()));
    assert_eq!(c.view().states[1], EnvelopeState::Opened);
    for (i, s) in c.view().states.iter().enumerate() {
        if i != 1 {
            assert_eq!(*s, EnvelopeState::Disabled, "envelope {}", i);
        }
    }
    assert!(c.view().modal);

    c.advance_ms(1_200);
    let before = draws.get();
    let states = c.view().states.clone();
    assert_eq!(c.click(3), ClickOutcome::Rejected(RejectReason::AlreadyOpened));
    c.advance_ms(5_000);
    assert_eq!(draws.get(), before);
    assert_eq!(c.view().states, states);
    assert!(c.session().opened_once());
}

#[test]
fn click_during_shake_is_ignored() {
    let (mut c, _) = page(1);
    c.click(0);
    c.advance_ms(300);
    assert_eq!(c.click(2), ClickOutcome::Rejected(RejectReason::Opening));
    c.advance_ms(400);
    assert_eq!(c.view().states[0], EnvelopeState::Opened);
    assert_eq!(c.view().states[2], EnvelopeState::Disabled);
}

#[test]
fn reset_restores_initial_state() {
    let (mut c, _) = page(77);
    c.click(4);
    c.advance_ms(2_000);
    c.reset();
    assert!(!c.session().opened_once());
    assert!(!c.session().is_opening());
    assert!(c.view().cleared);
    assert!(!c.view().modal);
    assert!(c.view().status.is_empty());
    assert!(c.view().states.iter().all(|s| *s == EnvelopeState::Closed));
    assert!(c.view().faces.iter().all(Option::is_none));
    assert!(matches!(c.click(4), ClickOutcome::Started { .. }));
}

#[test]
fn reset_in_the_middle_of_the_shake_wins() {
    let (mut c, draws) = page(5);
    c.click(2);
    c.advance_ms(350);
    c.reset();
    let before = draws.get();
    c.advance_ms(10_000);
    assert_eq!(draws.get(), before);
    assert!(c.view().states.iter().all(|s| *s == EnvelopeState::Closed));
    assert!(!c.session().is_opening());
}

#[test]
fn celebration_particles_expire_in_finite_steps() {
    let (mut c, _) = page(3);
    c.click(0);
    c.advance_ms(700);
    let mut particles = c.particles().particles().to_vec();
    assert!(!particles.is_empty());
    let mut steps = 0;
    while !particles.is_empty() {
        let before = particles.len();
        particles = advance(particles, 1.0);
        assert!(particles.len() <= before);
        assert!(particles.iter().all(|p| p.life < p.ttl));
        steps += 1;
        assert!(steps <= 100);
    }
}
