// melodygen: gate-triggered melodic sequence generator.
//
// On every rising trigger edge the engine picks a note from a scale with
// weighted randomness, converts it to pitch CV (1 V/oct) and holds it until
// the next edge. Rest, repeat-avoidance, root-gravity and trill modifiers
// shape the line. The engine is a plain per-tick state machine with no host
// or GUI dependencies; a host plugin wraps it, supplies knob values and
// forwards the two outputs to its jacks.
//
// Architecture:
// - scale.rs:     Static scale catalog, key names, index-to-pitch conversion
// - selector.rs:  Disjunction-weighted note index selection
// - modifiers.rs: Rest / repeat / gravity / trill decision pipeline
// - trill.rs:     Timed alternation sub-state-machine
// - engine.rs:    SequencerEngine, the per-tick driver owning all state
// - config.rs:    Configuration snapshot + EngineSettings (JSON)
// - params.rs:    Host knob descriptors and knob-array conversion
// - render.rs:    Offline clock driver collecting note spans
// - midi.rs:      MIDI file output from rendered spans
// - error.rs:     MelodyError
//
// All randomness goes through `melodygen_prng::RandomSource`; a seeded
// engine produces the same melody on every platform.

pub mod config;
pub mod engine;
pub mod error;
pub mod midi;
pub mod modifiers;
pub mod params;
pub mod render;
pub mod scale;
pub mod selector;
pub mod trill;

pub use config::{Configuration, EngineSettings};
pub use engine::{EngineState, GATE_HIGH_VOLTS, SequencerEngine, StepOutput};
pub use error::MelodyError;
pub use melodygen_prng as prng;
pub use scale::{Scale, ScaleId};
