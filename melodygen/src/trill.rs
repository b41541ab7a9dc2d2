// Trill sub-state machine.
//
// Once armed, the scheduler owns the pitch output for a fixed number of
// alternations between the note that armed it (`low_pitch`) and the next
// scale step up (`high_pitch`). It advances one sample per engine tick. Every
// `interval` samples it flips: even flips go to the high pitch, odd flips go
// back to the low one, so eight alternations end on the starting note.
//
// The interval is recomputed each tick from the current trill-rate knob, so
// moving the knob mid-trill changes the speed of the remaining flips.

use crate::config::MAX_TRILL_RATE;

/// Alternations in one trill.
pub const TRILL_LENGTH: u32 = 8;

/// Samples between flips for a given trill-rate knob value.
///
/// `round((10 - trill_rate) * samples_per_unit)`, never less than one
/// sample, so a knob at 10 flips on every tick.
pub fn interval_samples(trill_rate: f32, samples_per_unit: f32) -> u32 {
    let rate = trill_rate.clamp(0.0, MAX_TRILL_RATE);
    let raw = ((MAX_TRILL_RATE - rate) * samples_per_unit).round();
    if raw.is_finite() && raw >= 1.0 {
        raw as u32
    } else {
        1
    }
}

/// Result of servicing one trill tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrillTick {
    /// Still trilling; drive this pitch.
    Running(f32),
    /// The final alternation happened on this tick; drive this pitch and
    /// resume normal processing on the next tick.
    Finished(f32),
}

impl TrillTick {
    pub fn pitch(self) -> f32 {
        match self {
            TrillTick::Running(p) | TrillTick::Finished(p) => p,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrillScheduler {
    pub active: bool,
    /// Flips completed so far, 0 to `TRILL_LENGTH`.
    pub alternation_count: u32,
    pub samples_since_flip: u32,
    pub high_pitch: f32,
    pub low_pitch: f32,
    /// Pitch the trill is currently driving.
    pub current_pitch: f32,
}

impl TrillScheduler {
    /// Start a trill. The current note keeps sounding until the first flip.
    pub fn arm(&mut self, low_pitch: f32, high_pitch: f32) {
        *self = TrillScheduler {
            active: true,
            alternation_count: 0,
            samples_since_flip: 0,
            high_pitch,
            low_pitch,
            current_pitch: low_pitch,
        };
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance one sample.
    ///
    /// Must only be called while active.
    pub fn tick(&mut self, interval: u32) -> TrillTick {
        debug_assert!(self.active, "tick on an idle trill");
        self.samples_since_flip += 1;
        if self.samples_since_flip >= interval {
            self.current_pitch = if self.alternation_count % 2 == 0 {
                self.high_pitch
            } else {
                self.low_pitch
            };
            self.samples_since_flip = 0;
            self.alternation_count += 1;
        }

        if self.alternation_count >= TRILL_LENGTH {
            let last = self.current_pitch;
            self.active = false;
            self.alternation_count = 0;
            self.samples_since_flip = 0;
            TrillTick::Finished(last)
        } else {
            TrillTick::Running(self.current_pitch)
        }
    }

    pub fn reset(&mut self) {
        *self = TrillScheduler::default();
    }
}
