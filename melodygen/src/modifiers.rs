// The note decision pipeline run on every accepted trigger edge.
//
// Stages, in the order their random draws are consumed:
//   1. rest check     - one real draw; a rest ends the pipeline
//   2. selection      - one integer draw (see `selector.rs`)
//   3. repeat escape  - one real draw, plus one integer draw for the
//                       direction, only when the selection repeated
//   4. root gravity   - one real draw
//   5. trill arming   - one real draw
//
// Draw order is part of the contract: tests script a `ScriptedSource` in this
// order to pin every outcome.
//
// Root gravity changes the emitted pitch but not the scale index. The index
// that seeds the next edge's selection window and the trill's upper neighbour
// is always the pre-snap index.

use melodygen_prng::RandomSource;

use crate::config::ResolvedConfig;
use crate::scale::{OCTAVE_SEMITONES, semitone_to_pitch};
use crate::selector;

/// Outcome of one trigger edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeDecision {
    /// Suppress this edge: no new pitch, gate held low until release.
    Rest,
    Note(NoteChoice),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteChoice {
    /// Scale-step index after repeat avoidance, before gravity.
    pub index: usize,
    /// Emitted absolute semitone, after gravity.
    pub semitone: u32,
    /// Emitted pitch CV.
    pub pitch: f32,
    pub snapped_to_root: bool,
    /// Set when the trill roll succeeded.
    pub trill: Option<TrillPitches>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrillPitches {
    pub low: f32,
    pub high: f32,
}

/// Roll for a rest.
pub fn rolls_rest(rest_probability: f32, rng: &mut impl RandomSource) -> bool {
    rng.uniform_real01() < f64::from(rest_probability)
}

/// Move a repeated index one step away from `previous`, unless the repeat
/// roll lets it stand.
///
/// Only rolls when `candidate == previous`. A `repeat_probability` of 0
/// always escapes. Interior indices pick a direction at random; the
/// boundaries move inward.
pub fn avoid_repeat(
    candidate: usize,
    previous: usize,
    total_notes: usize,
    repeat_probability: f32,
    rng: &mut impl RandomSource,
) -> usize {
    if candidate != previous {
        return candidate;
    }
    let roll = rng.uniform_real01();
    let escape = repeat_probability == 0.0 || roll >= f64::from(repeat_probability);
    if !escape || total_notes <= 1 {
        return candidate;
    }

    let top = total_notes - 1;
    if candidate == 0 {
        1
    } else if candidate >= top {
        top - 1
    } else if rng.uniform_int(0, 1) == 0 {
        candidate - 1
    } else {
        candidate + 1
    }
}

/// The root position nearest to `semitone`, among `key + 12 * o` for
/// `o` in `0..octave_range`. Ties go to the lower root.
pub fn nearest_root(semitone: u32, key: u8, octave_range: u8) -> u32 {
    let mut best = u32::from(key);
    let mut best_distance = semitone.abs_diff(best);
    for octave in 1..u32::from(octave_range) {
        let root = u32::from(key) + OCTAVE_SEMITONES * octave;
        let distance = semitone.abs_diff(root);
        if distance < best_distance {
            best = root;
            best_distance = distance;
        }
    }
    best
}

/// Roll for root gravity. Returns the emitted semitone and whether it snapped.
pub fn apply_root_gravity(
    semitone: u32,
    key: u8,
    octave_range: u8,
    root_gravity: f32,
    rng: &mut impl RandomSource,
) -> (u32, bool) {
    let root = nearest_root(semitone, key, octave_range);
    if rng.uniform_real01() < f64::from(root_gravity) {
        (root, true)
    } else {
        (semitone, false)
    }
}

/// Run the whole pipeline for one rising edge.
pub fn decide(
    config: &ResolvedConfig,
    previous: usize,
    rng: &mut impl RandomSource,
) -> EdgeDecision {
    if rolls_rest(config.rest_probability, rng) {
        return EdgeDecision::Rest;
    }

    let total = config.total_notes;
    let previous = previous.min(total - 1);
    let selected = selector::select_index(previous, total, config.disjunction, rng);
    let index = avoid_repeat(selected, previous, total, config.repeat_probability, rng);

    let candidate = config.scale.semitone(index, config.key);
    let (semitone, snapped_to_root) = apply_root_gravity(
        candidate,
        config.key,
        config.octave_range,
        config.root_gravity,
        rng,
    );
    let pitch = semitone_to_pitch(semitone);

    let trill = if rng.uniform_real01() < f64::from(config.trill_probability) {
        Some(TrillPitches {
            low: pitch,
            high: config.scale.pitch(index + 1, config.key),
        })
    } else {
        None
    };

    EdgeDecision::Note(NoteChoice {
        index,
        semitone,
        pitch,
        snapped_to_root,
        trill,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::scale::ScaleId;
    use melodygen_prng::{MelodyRng, ScriptedSource};

    fn major(range: u8, key: u8) -> Configuration {
        Configuration {
            scale_index: ScaleId::Major.index(),
            key,
            octave_range: range,
            disjunction: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn rest_stops_before_selection() {
        let config = Configuration {
            rest_probability: 0.5,
            ..major(1, 0)
        }
        .resolve();
        let mut src = ScriptedSource::new().with_reals([0.1]);
        assert_eq!(decide(&config, 0, &mut src), EdgeDecision::Rest);
        assert!(src.int_requests.is_empty());
        assert_eq!(src.real_draws, 1);
    }

    #[test]
    fn repeat_escapes_by_one_inside_bounds() {
        let mut rng = MelodyRng::new(11);
        for total in [2usize, 8, 40] {
            for previous in 0..total {
                let next = avoid_repeat(previous, previous, total, 0.0, &mut rng);
                assert_eq!(next.abs_diff(previous), 1, "total={total} previous={previous}");
                assert!(next < total);
            }
        }
    }

    #[test]
    fn repeat_boundaries_move_inward_without_direction_draw() {
        let mut src = ScriptedSource::new().with_reals([0.9, 0.9]);
        assert_eq!(avoid_repeat(0, 0, 8, 0.0, &mut src), 1);
        assert_eq!(avoid_repeat(7, 7, 8, 0.0, &mut src), 6);
        assert!(src.int_requests.is_empty());
    }

    #[test]
    fn interior_repeat_direction_is_drawn() {
        let mut src = ScriptedSource::new().with_reals([0.9, 0.9]).with_ints([0, 1]);
        assert_eq!(avoid_repeat(4, 4, 8, 0.3, &mut src), 3);
        assert_eq!(avoid_repeat(4, 4, 8, 0.3, &mut src), 5);
        assert_eq!(src.int_requests, vec![(0, 1), (0, 1)]);
    }

    #[test]
    fn repeat_allowed_when_roll_under_probability() {
        let mut src = ScriptedSource::new().with_reals([0.2]);
        assert_eq!(avoid_repeat(4, 4, 8, 0.5, &mut src), 4);
        let mut rng = MelodyRng::new(5);
        for _ in 0..100 {
            assert_eq!(avoid_repeat(4, 4, 8, 1.0, &mut rng), 4);
        }
    }

    #[test]
    fn non_repeats_pass_through_without_draws() {
        let mut src = ScriptedSource::new();
        assert_eq!(avoid_repeat(3, 4, 8, 0.0, &mut src), 3);
        assert_eq!(src.real_draws, 0);
    }

    #[test]
    fn single_note_range_cannot_escape() {
        let mut src = ScriptedSource::new().with_reals([0.9]);
        assert_eq!(avoid_repeat(0, 0, 1, 0.0, &mut src), 0);
    }

    #[test]
    fn nearest_root_matches_brute_force() {
        for key in 0u8..12 {
            for range in 1u8..=5 {
                let roots: Vec<u32> = (0..u32::from(range))
                    .map(|o| u32::from(key) + 12 * o)
                    .collect();
                for semitone in 0u32..(12 * 6 + 12) {
                    let expected = *roots
                        .iter()
                        .min_by_key(|&&r| (semitone.abs_diff(r), r))
                        .unwrap();
                    assert_eq!(
                        nearest_root(semitone, key, range),
                        expected,
                        "semitone={semitone} key={key} range={range}"
                    );
                }
            }
        }
    }

    #[test]
    fn nearest_root_tie_goes_low() {
        // 6 is equidistant from 0 and 12.
        assert_eq!(nearest_root(6, 0, 2), 0);
        assert_eq!(nearest_root(7, 0, 2), 12);
    }

    #[test]
    fn gravity_snaps_pitch_but_not_index() {
        let config = Configuration {
            root_gravity: 1.0,
            ..major(2, 0)
        }
        .resolve();
        // rest roll, select index 4 (semitone 7), gravity roll, trill roll
        let mut src = ScriptedSource::new()
            .with_reals([0.5, 0.0, 0.5])
            .with_ints([4]);
        let EdgeDecision::Note(choice) = decide(&config, 0, &mut src) else {
            panic!("expected a note");
        };
        assert_eq!(choice.index, 4);
        assert_eq!(choice.semitone, 12);
        assert!(choice.snapped_to_root);
        assert!((choice.pitch - 1.0).abs() < 1e-6);
        assert!(src.is_exhausted());
    }

    #[test]
    fn trill_targets_next_scale_step() {
        let config = Configuration {
            trill_probability: 1.0,
            ..major(1, 2)
        }
        .resolve();
        let mut src = ScriptedSource::new()
            .with_reals([0.5, 0.5, 0.0])
            .with_ints([2]);
        let EdgeDecision::Note(choice) = decide(&config, 0, &mut src) else {
            panic!("expected a note");
        };
        let trill = choice.trill.expect("trill should be armed");
        // Index 2 in D major is F# (4 + 2 = 6); the next step is G (5 + 2 = 7).
        assert!((trill.low - 6.0 / 12.0).abs() < 1e-6);
        assert!((trill.high - 7.0 / 12.0).abs() < 1e-6);
    }

    #[test]
    fn trill_from_top_index_wraps_into_next_octave() {
        let config = Configuration {
            trill_probability: 1.0,
            ..major(1, 0)
        }
        .resolve();
        let mut src = ScriptedSource::new()
            .with_reals([0.5, 0.5, 0.0])
            .with_ints([7]);
        let EdgeDecision::Note(choice) = decide(&config, 0, &mut src) else {
            panic!("expected a note");
        };
        // Index 8 is offsets[0] one octave up.
        assert_eq!(choice.trill.map(|t| t.high), Some(1.0));
    }

    #[test]
    fn full_pipeline_draw_order_with_repeat() {
        let config = Configuration {
            disjunction: 0.0,
            ..major(1, 0)
        }
        .resolve();
        // rest, select (forced to previous), repeat roll, direction, gravity, trill
        let mut src = ScriptedSource::new()
            .with_reals([0.9, 0.9, 0.9, 0.9])
            .with_ints([3, 1]);
        let EdgeDecision::Note(choice) = decide(&config, 3, &mut src) else {
            panic!("expected a note");
        };
        assert_eq!(choice.index, 4);
        assert_eq!(choice.semitone, 7);
        assert_eq!(choice.trill, None);
        assert_eq!(src.int_requests, vec![(3, 3), (0, 1)]);
        assert!(src.is_exhausted());
    }
}
