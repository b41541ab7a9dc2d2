// Per-tick configuration snapshot and engine-level settings.
//
// `Configuration` is the knob state the host hands the engine every tick. It
// is `Copy` and consumed by value, so a host that edits knobs on a UI thread
// publishes whole snapshots and the engine can never observe a half-written
// one. `resolve()` clamps it into a `ResolvedConfig` that the decision
// pipeline can index with no further checks.
//
// `EngineSettings` holds what does not change per tick: sample rate, the
// trill timing unit, the pitch guard window and an optional PRNG seed. Both
// types load from JSON the same way (`from_json` string in, typed struct
// out; `load` reads a file first).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MelodyError;
use crate::scale::{self, Scale};

pub const MIN_OCTAVE_RANGE: u8 = 1;
pub const MAX_OCTAVE_RANGE: u8 = 5;
/// Top of the trill-rate knob. The trill interval is proportional to
/// `MAX_TRILL_RATE - trill_rate`.
pub const MAX_TRILL_RATE: f32 = 10.0;

/// Knob values read once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Index into the scale catalog (see `scale::ScaleId`).
    pub scale_index: usize,
    /// Key as a semitone offset above C, 0–11.
    pub key: u8,
    /// Octaves of the scale available to the selector, 1–5.
    pub octave_range: u8,
    /// 0 keeps the previous note, 1 allows a jump anywhere in the range.
    pub disjunction: f32,
    /// Chance that a trigger edge becomes a rest.
    pub rest_probability: f32,
    /// Chance that a new note starts a trill.
    pub trill_probability: f32,
    /// Chance that a repeated note is allowed to stand. Low values push the
    /// melody off repeats.
    #[serde(alias = "repeat_avoidance")]
    pub repeat_probability: f32,
    /// Chance that a note snaps to the nearest root.
    pub root_gravity: f32,
    /// 0–10; higher is a faster trill.
    pub trill_rate: f32,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            scale_index: 0,
            key: 0,
            octave_range: MIN_OCTAVE_RANGE,
            disjunction: 0.5,
            rest_probability: 0.0,
            trill_probability: 0.0,
            repeat_probability: 0.0,
            root_gravity: 0.0,
            trill_rate: 5.0,
        }
    }
}

impl Configuration {
    pub fn from_json(json: &str) -> Result<Self, MelodyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, MelodyError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Clamp every field into its valid range and look up the scale.
    pub fn resolve(&self) -> ResolvedConfig {
        let scale_index = scale::clamp_scale_index(self.scale_index);
        if scale_index != self.scale_index {
            log::trace!("scale index {} clamped to {scale_index}", self.scale_index);
        }
        let scale = scale::clamped(scale_index);
        let key = scale::clamp_key(self.key);
        let octave_range = self.octave_range.clamp(MIN_OCTAVE_RANGE, MAX_OCTAVE_RANGE);
        ResolvedConfig {
            scale,
            scale_index,
            key,
            octave_range,
            total_notes: scale.size() * usize::from(octave_range),
            disjunction: unit(self.disjunction),
            rest_probability: unit(self.rest_probability),
            trill_probability: unit(self.trill_probability),
            repeat_probability: unit(self.repeat_probability),
            root_gravity: unit(self.root_gravity),
            trill_rate: if self.trill_rate.is_nan() {
                0.0
            } else {
                self.trill_rate.clamp(0.0, MAX_TRILL_RATE)
            },
        }
    }
}

/// Clamp to [0, 1], mapping NaN to 0.
fn unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// A `Configuration` with every field inside its valid range.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedConfig {
    pub scale: &'static Scale,
    pub scale_index: usize,
    pub key: u8,
    pub octave_range: u8,
    /// `scale.size() * octave_range`, always at least 1.
    pub total_notes: usize,
    pub disjunction: f32,
    pub rest_probability: f32,
    pub trill_probability: f32,
    pub repeat_probability: f32,
    pub root_gravity: f32,
    pub trill_rate: f32,
}

/// Settings fixed for an engine's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Ticks per second.
    pub sample_rate: f32,
    /// Length in milliseconds of one trill-rate step. The trill flips every
    /// `(10 - trill_rate)` units.
    pub trill_unit_ms: f32,
    /// Upper bound, in octaves, of the held pitch accepted at a trigger
    /// edge. A held pitch outside `[0, guard_window_octaves)` resets the
    /// engine. The default of 1.0 is a single octave.
    pub guard_window_octaves: f32,
    /// PRNG seed. `None` seeds from the clock once at construction.
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            sample_rate: 48_000.0,
            trill_unit_ms: 5.0,
            guard_window_octaves: 1.0,
            seed: None,
        }
    }
}

impl EngineSettings {
    pub fn from_json(json: &str) -> Result<Self, MelodyError> {
        let settings: EngineSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, MelodyError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), MelodyError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(MelodyError::InvalidSettings(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if !(self.trill_unit_ms.is_finite() && self.trill_unit_ms > 0.0) {
            return Err(MelodyError::InvalidSettings(format!(
                "trill_unit_ms must be positive, got {}",
                self.trill_unit_ms
            )));
        }
        if self.guard_window_octaves.is_nan() || self.guard_window_octaves <= 0.0 {
            return Err(MelodyError::InvalidSettings(format!(
                "guard_window_octaves must be positive, got {}",
                self.guard_window_octaves
            )));
        }
        Ok(())
    }

    /// Samples in one trill-rate unit.
    pub fn samples_per_trill_unit(&self) -> f32 {
        self.sample_rate * self.trill_unit_ms / 1000.0
    }
}
