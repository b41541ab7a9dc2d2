// Host-facing parameter descriptors.
//
// The host registers one knob per `ParamId` using the range, default and
// snapping recorded in `PARAMS`, then hands the engine the raw knob values
// every tick. `configuration_from_knobs` turns that array into a
// `Configuration`. Snapped knobs (range, scale, key) are truncated toward
// zero the way the host's integer cast does, so a knob resting at 2.9
// still reads as 2.

use serde::Serialize;

use crate::config::{Configuration, MAX_OCTAVE_RANGE, MAX_TRILL_RATE, MIN_OCTAVE_RANGE};
use crate::scale::{KEY_NAMES, SCALE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamId {
    Range,
    Scale,
    Key,
    Disjunction,
    RestProbability,
    TrillProbability,
    RepeatProbability,
    RootGravity,
    TrillRate,
}

pub const PARAM_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub id: ParamId,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// Knob snaps to integer positions.
    pub snap: bool,
}

/// Descriptors in `ParamId` order.
pub const PARAMS: [ParamSpec; PARAM_COUNT] = [
    ParamSpec {
        id: ParamId::Range,
        name: "Octave Range",
        min: MIN_OCTAVE_RANGE as f32,
        max: MAX_OCTAVE_RANGE as f32,
        default: MIN_OCTAVE_RANGE as f32,
        snap: true,
    },
    ParamSpec {
        id: ParamId::Scale,
        name: "Scale",
        min: 0.0,
        max: (SCALE_COUNT - 1) as f32,
        default: 0.0,
        snap: true,
    },
    ParamSpec {
        id: ParamId::Key,
        name: "Key",
        min: 0.0,
        max: (KEY_NAMES.len() - 1) as f32,
        default: 0.0,
        snap: true,
    },
    ParamSpec {
        id: ParamId::Disjunction,
        name: "Disjunction",
        min: 0.0,
        max: 1.0,
        default: 0.5,
        snap: false,
    },
    ParamSpec {
        id: ParamId::RestProbability,
        name: "Rest Probability",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        snap: false,
    },
    ParamSpec {
        id: ParamId::TrillProbability,
        name: "Trill Probability",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        snap: false,
    },
    ParamSpec {
        id: ParamId::RepeatProbability,
        name: "Repeat Probability",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        snap: false,
    },
    ParamSpec {
        id: ParamId::RootGravity,
        name: "Root Gravity",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        snap: false,
    },
    ParamSpec {
        id: ParamId::TrillRate,
        name: "Trill Rate",
        min: 0.0,
        max: MAX_TRILL_RATE,
        default: 5.0,
        snap: false,
    },
];

impl ParamId {
    pub fn spec(self) -> &'static ParamSpec {
        &PARAMS[self as usize]
    }
}

/// Knob values at their registered defaults.
pub fn default_knobs() -> [f32; PARAM_COUNT] {
    PARAMS.map(|p| p.default)
}

/// Truncate a snapped knob to an integer, treating negatives and NaN as 0.
fn snapped(value: f32) -> usize {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value as usize
    }
}

/// Build a configuration snapshot from raw knob values in `ParamId` order.
pub fn configuration_from_knobs(knobs: &[f32; PARAM_COUNT]) -> Configuration {
    let knob = |id: ParamId| knobs[id as usize];
    Configuration {
        scale_index: snapped(knob(ParamId::Scale)),
        key: snapped(knob(ParamId::Key)).min(u8::MAX as usize) as u8,
        octave_range: snapped(knob(ParamId::Range)).min(u8::MAX as usize) as u8,
        disjunction: knob(ParamId::Disjunction),
        rest_probability: knob(ParamId::RestProbability),
        trill_probability: knob(ParamId::TrillProbability),
        repeat_probability: knob(ParamId::RepeatProbability),
        root_gravity: knob(ParamId::RootGravity),
        trill_rate: knob(ParamId::TrillRate),
    }
}
