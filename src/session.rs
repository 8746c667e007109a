//! Session state: which envelopes are open, and whether another open may start.
//!
//! Every transition is a plain method on [`Session`] so the open sequence can be
//! driven (and tested) without any timers. Timer-driven transitions carry the
//! epoch they were scheduled in; a reset bumps the epoch so stale steps are
//! ignored.

use crate::selector::Amount;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeState {
    Closed,
    Shaking,
    Opened,
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selecting,
    Revealed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyOpened,
    Opening,
    OutOfRange,
    NotClosed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Started { epoch: u64 },
    Rejected(RejectReason),
}

/// Result of a successful reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reveal {
    pub envelope: usize,
    pub amount_index: usize,
    pub amount: Amount,
}

#[derive(Clone, Debug)]
pub struct Session {
    envelopes: Vec<EnvelopeState>,
    opening: bool,
    opened_once: bool,
    shaking: Option<usize>,
    revealed: Option<Reveal>,
    epoch: u64,
}

impl Session {
    pub fn new(envelopes: usize) -> Self {
        Self {
            envelopes: vec![EnvelopeState::Closed; envelopes],
            opening: false,
            opened_once: false,
            shaking: None,
            revealed: None,
            epoch: 0,
        }
    }

    pub fn envelopes(&self) -> &[EnvelopeState] {
        &self.envelopes
    }

    pub fn envelope(&self, index: usize) -> Option<EnvelopeState> {
        self.envelopes.get(index).copied()
    }

    pub fn is_opening(&self) -> bool {
        self.opening
    }

    pub fn opened_once(&self) -> bool {
        self.opened_once
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn revealed(&self) -> Option<Reveal> {
        self.revealed
    }

    pub fn phase(&self) -> Phase {
        if self.opened_once {
            Phase::Revealed
        } else if self.opening {
            Phase::Selecting
        } else {
            Phase::Idle
        }
    }

    /// Begin opening envelope `index`. All guards are silent rejections.
    pub fn click(&mut self, index: usize) -> ClickOutcome {
        if self.opened_once {
            return ClickOutcome::Rejected(RejectReason::AlreadyOpened);
        }
        if self.opening {
            return ClickOutcome::Rejected(RejectReason::Opening);
        }
        match self.envelopes.get(index) {
            None => return ClickOutcome::Rejected(RejectReason::OutOfRange),
            Some(EnvelopeState::Closed) => {}
            Some(_) => return ClickOutcome::Rejected(RejectReason::NotClosed),
        }
        self.opening = true;
        self.shaking = Some(index);
        self.envelopes[index] = EnvelopeState::Shaking;
        ClickOutcome::Started { epoch: self.epoch }
    }

    /// Finish the shake: draw an amount with `pick` and open the shaking envelope,
    /// disabling all siblings. `pick` is only called when the step is current.
    pub fn reveal_with<F>(&mut self, epoch: u64, pick: F) -> Option<Reveal>
    where
        F: FnOnce() -> (usize, Amount),
    {
        if epoch != self.epoch || self.opened_once {
            return None;
        }
        let envelope = self.shaking.take()?;
        let (amount_index, amount) = pick();
        for (i, state) in self.envelopes.iter_mut().enumerate() {
            *state = if i == envelope { EnvelopeState::Opened } else { EnvelopeState::Disabled };
        }
        self.opened_once = true;
        let reveal = Reveal { envelope, amount_index, amount };
        self.revealed = Some(reveal);
        Some(reveal)
    }

    /// Clear the `opening` gate after the settle delay. `opened_once` stays set.
    pub fn release_gate(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch || !self.opening {
            return false;
        }
        self.opening = false;
        true
    }

    /// Start a fresh session and return its epoch.
    pub fn reset(&mut self) -> u64 {
        self.epoch += 1;
        self.opening = false;
        self.opened_once = false;
        self.shaking = None;
        self.revealed = None;
        self.envelopes.iter_mut().for_each(|s| *s = EnvelopeState::Closed);
        self.epoch
    }
}
