// Per-tick sequencer engine.
//
// `SequencerEngine` owns all state that persists between ticks and the one
// long-lived random source. The host calls `process` once per sample with
// the trigger input voltage and the current `Configuration`, and applies the
// returned `StepOutput` to its two output jacks.
//
// Each tick runs the first matching rule below:
//   1. trill active        -> advance the trill, drive its pitch, stop
//   2. resting, trigger hi -> drive nothing, stop
//   3. resting, trigger lo -> leave the rest and continue
//   4. rising edge         -> pitch guard, then the decision pipeline
//                             (`modifiers::decide`); gate high on a note,
//                             low on a rest
//   5. falling edge        -> clear the gated flag, gate output stays HIGH
//   6. trigger lo, idle    -> gate low
// and then, unless it stopped early, drives the held pitch.
//
// Rule 5 drives the gate high on the falling edge itself; the gate output
// drops one tick later through rule 6.
//
// Outputs the engine does not drive on a tick are `None`; the host keeps
// whatever value the jack held before.
//
// The pitch guard (rule 4) resets every field to its seed value and drives
// nothing when the held pitch is outside `[0, guard_window_octaves)`.

use melodygen_prng::{MelodyRng, RandomSource};

use crate::config::{Configuration, EngineSettings};
use crate::error::MelodyError;
use crate::modifiers::{self, EdgeDecision};
use crate::trill::{self, TrillScheduler, TrillTick};

/// Voltage of a high gate, and the trigger threshold.
pub const GATE_HIGH_VOLTS: f32 = 10.0;

/// What the engine drives on one tick. `None` leaves the output unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutput {
    pub gate: Option<bool>,
    pub pitch: Option<f32>,
}

impl StepOutput {
    /// Gate as a voltage, if driven.
    pub fn gate_volts(&self) -> Option<f32> {
        self.gate.map(|high| if high { GATE_HIGH_VOLTS } else { 0.0 })
    }
}

/// State carried between ticks. `Default` is the seed state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineState {
    /// The previous tick saw the trigger high inside a note.
    pub gate_open: bool,
    /// Pre-gravity scale-step index of the latest note.
    pub last_note_index: usize,
    /// Pitch held between edges.
    pub last_pitch: f32,
    /// A rest is in effect until the trigger drops.
    pub skip_armed: bool,
    pub trill: TrillScheduler,
}

pub struct SequencerEngine<R: RandomSource = MelodyRng> {
    state: EngineState,
    settings: EngineSettings,
    samples_per_trill_unit: f32,
    rng: R,
}

impl SequencerEngine<MelodyRng> {
    /// Build an engine with the production PRNG, seeded from
    /// `settings.seed` or the clock.
    pub fn new(settings: EngineSettings) -> Result<Self, MelodyError> {
        let rng = match settings.seed {
            Some(seed) => MelodyRng::new(seed),
            None => MelodyRng::from_entropy(),
        };
        Self::with_source(settings, rng)
    }
}

impl<R: RandomSource> SequencerEngine<R> {
    /// Build an engine around any random source.
    pub fn with_source(settings: EngineSettings, rng: R) -> Result<Self, MelodyError> {
        settings.validate()?;
        log::debug!(
            "engine: sample_rate={} trill_unit_ms={} guard_window={}",
            settings.sample_rate,
            settings.trill_unit_ms,
            settings.guard_window_octaves
        );
        Ok(SequencerEngine {
            state: EngineState::default(),
            samples_per_trill_unit: settings.samples_per_trill_unit(),
            settings,
            rng,
        })
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Direct access for hosts restoring a snapshot, and for tests.
    pub fn state_mut(&mut self) -> &mut EngineState {
        &mut self.state
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Return every state field to its seed value. The random source keeps
    /// its position.
    pub fn reset(&mut self) {
        self.state = EngineState::default();
    }

    /// One tick, with the trigger given as a voltage.
    pub fn process(&mut self, trigger_volts: f32, config: Configuration) -> StepOutput {
        self.process_gate(trigger_volts >= GATE_HIGH_VOLTS, config)
    }

    /// One tick, with the trigger already thresholded.
    pub fn process_gate(&mut self, trigger_high: bool, config: Configuration) -> StepOutput {
        let resolved = config.resolve();

        if self.state.trill.is_active() {
            let interval =
                trill::interval_samples(resolved.trill_rate, self.samples_per_trill_unit);
            let tick = self.state.trill.tick(interval);
            if let TrillTick::Finished(_) = tick {
                log::trace!("trill finished");
            }
            return StepOutput {
                gate: None,
                pitch: Some(tick.pitch()),
            };
        }

        if self.state.skip_armed {
            if trigger_high {
                return StepOutput::default();
            }
            self.state.skip_armed = false;
        }

        let mut out = StepOutput::default();
        if trigger_high && !self.state.gate_open {
            if !self.pitch_in_window(self.state.last_pitch) {
                log::warn!(
                    "held pitch {} outside guard window [0, {}); resetting engine state",
                    self.state.last_pitch,
                    self.settings.guard_window_octaves
                );
                self.reset();
                return StepOutput::default();
            }

            match modifiers::decide(&resolved, self.state.last_note_index, &mut self.rng) {
                EdgeDecision::Rest => {
                    log::trace!("edge: rest");
                    self.state.skip_armed = true;
                    out.gate = Some(false);
                }
                EdgeDecision::Note(choice) => {
                    log::trace!(
                        "edge: index={} semitone={} snapped={} trill={}",
                        choice.index,
                        choice.semitone,
                        choice.snapped_to_root,
                        choice.trill.is_some()
                    );
                    self.state.last_note_index = choice.index;
                    self.state.last_pitch = choice.pitch;
                    self.state.gate_open = true;
                    out.gate = Some(true);
                    if let Some(pitches) = choice.trill {
                        self.state.trill.arm(pitches.low, pitches.high);
                    }
                }
            }
        } else if !trigger_high && self.state.gate_open {
            self.state.gate_open = false;
            out.gate = Some(true);
        } else if !self.state.gate_open {
            out.gate = Some(false);
        }

        out.pitch = Some(self.state.last_pitch);
        out
    }

    fn pitch_in_window(&self, pitch: f32) -> bool {
        (0.0..self.settings.guard_window_octaves).contains(&pitch)
    }
}
