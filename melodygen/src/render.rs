// Offline driver: runs an engine against a square-wave clock and collects
// the notes it would have played.
//
// This stands in for the host. It feeds a trigger each tick, applies the
// returned `StepOutput` the way a host applies voltages to jacks (an output
// that is not driven keeps its previous value), and records one `NoteEvent`
// per span during which the held gate is high and the held pitch is
// constant. A trill therefore shows up as a run of short events.

use melodygen_prng::RandomSource;
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::engine::{GATE_HIGH_VOLTS, SequencerEngine};
use crate::error::MelodyError;

/// Square-wave trigger source.
///
/// A deserialized clock can carry a zero period; it is read as one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockDriver {
    /// Samples per clock cycle.
    period_samples: u64,
    /// Fraction of each cycle the trigger is high, (0, 1].
    duty: f32,
}

impl ClockDriver {
    pub fn new(period_samples: u64, duty: f32) -> Self {
        ClockDriver {
            period_samples: period_samples.max(1),
            duty,
        }
    }

    /// A clock at `bpm` beats per minute, one trigger per beat.
    pub fn from_bpm(bpm: f32, sample_rate: f32, duty: f32) -> Result<Self, MelodyError> {
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(MelodyError::InvalidSettings(format!(
                "tempo must be a positive number of bpm, got {bpm}"
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(MelodyError::InvalidSettings(format!(
                "sample_rate must be positive, got {sample_rate}"
            )));
        }
        let period = (f64::from(sample_rate) * 60.0 / f64::from(bpm)).round();
        if period > u32::MAX as f64 {
            return Err(MelodyError::InvalidSettings(format!(
                "tempo {bpm} bpm is too slow for sample rate {sample_rate}"
            )));
        }
        Ok(ClockDriver::new(period as u64, duty))
    }

    pub fn period_samples(&self) -> u64 {
        self.period_samples.max(1)
    }

    /// Samples per cycle the trigger stays high. At least one, and at least
    /// one low sample per cycle when the period allows it.
    pub fn high_samples(&self) -> u64 {
        let period = self.period_samples();
        let high = (period as f32 * self.duty.clamp(0.0, 1.0)).round() as u64;
        let max_high = if period > 1 { period - 1 } else { 1 };
        high.clamp(1, max_high)
    }

    /// Trigger voltage at sample `n`.
    pub fn trigger_at(&self, n: u64) -> f32 {
        if n % self.period_samples() < self.high_samples() {
            GATE_HIGH_VOLTS
        } else {
            0.0
        }
    }
}

/// One sounding span of the rendered output, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub start: u64,
    pub length: u64,
    pub pitch_volts: f32,
}

/// Run `engine` for `samples` ticks under `clock` and collect note spans.
pub fn render_events<R: RandomSource>(
    engine: &mut SequencerEngine<R>,
    config: Configuration,
    clock: ClockDriver,
    samples: u64,
) -> Vec<NoteEvent> {
    let mut events = Vec::new();
    let mut gate = false;
    let mut pitch = 0.0f32;
    let mut open: Option<(u64, f32)> = None;

    for n in 0..samples {
        let out = engine.process(clock.trigger_at(n), config);
        if let Some(g) = out.gate {
            gate = g;
        }
        if let Some(p) = out.pitch {
            pitch = p;
        }

        match open {
            Some((start, held)) if !gate || held != pitch => {
                events.push(NoteEvent {
                    start,
                    length: n - start,
                    pitch_volts: held,
                });
                open = gate.then_some((n, pitch));
            }
            None if gate => open = Some((n, pitch)),
            _ => {}
        }
    }

    if let Some((start, held)) = open {
        events.push(NoteEvent {
            start,
            length: samples - start,
            pitch_volts: held,
        });
    }

    log::debug!("rendered {} events over {samples} samples", events.len());
    events
}
