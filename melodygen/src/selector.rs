// Proximity-biased note index selection.
//
// The selector draws the next scale-step index from a window around the
// previous one. The window extends `floor(previous * d)` steps below and
// `floor((total - previous - 1) * d)` steps above, where `d` is the
// disjunction knob, so at `d = 0` the window is just the previous index and
// at `d = 1` it covers every note in range. The draw inside the window is
// uniform.
//
// Escaping a `d = 0` repeat is the job of repeat avoidance in
// `modifiers.rs`, not of the selector.

use melodygen_prng::RandomSource;

/// The inclusive `(lower, upper)` index window for a draw.
///
/// `previous` is clamped into `[0, total_notes - 1]` first, because the
/// octave range may have shrunk since the previous note was chosen.
pub fn selection_window(previous: usize, total_notes: usize, disjunction: f32) -> (usize, usize) {
    debug_assert!(total_notes >= 1);
    let top = total_notes.saturating_sub(1);
    let previous = previous.min(top);
    let d = disjunction.clamp(0.0, 1.0);

    let below = (previous as f32 * d).floor() as usize;
    let above = ((top - previous) as f32 * d).floor() as usize;

    let lower = previous.saturating_sub(below);
    let upper = (previous + above).min(top);
    (lower, upper)
}

/// Draw a new note index near `previous`.
///
/// With a single note in range the answer is always 0 and no draw is made.
pub fn select_index(
    previous: usize,
    total_notes: usize,
    disjunction: f32,
    rng: &mut impl RandomSource,
) -> usize {
    if total_notes <= 1 {
        return 0;
    }
    let (lower, upper) = selection_window(previous, total_notes, disjunction);
    rng.uniform_int(lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use melodygen_prng::{MelodyRng, ScriptedSource};

    #[test]
    fn window_collapses_at_zero_disjunction() {
        assert_eq!(selection_window(5, 16, 0.0), (5, 5));
        assert_eq!(selection_window(0, 16, 0.0), (0, 0));
        assert_eq!(selection_window(15, 16, 0.0), (15, 15));
    }

    #[test]
    fn window_covers_everything_at_full_disjunction() {
        for previous in 0..16 {
            assert_eq!(selection_window(previous, 16, 1.0), (0, 15));
        }
    }

    #[test]
    fn window_scales_each_side_separately() {
        // 4 below, 11 above; half of each, floored.
        assert_eq!(selection_window(4, 16, 0.5), (2, 9));
        // 7 below, 0 above.
        assert_eq!(selection_window(7, 8, 0.5), (4, 7));
        // floor(3 * 0.3) = 0 below, floor(4 * 0.3) = 1 above.
        assert_eq!(selection_window(3, 8, 0.3), (3, 4));
    }

    #[test]
    fn stale_previous_is_clamped_into_range() {
        // Previous note came from a 3-octave range; range is now 1 octave.
        assert_eq!(selection_window(20, 8, 0.0), (7, 7));
        assert_eq!(selection_window(20, 8, 1.0), (0, 7));
    }

    #[test]
    fn single_note_range_always_returns_zero() {
        let mut src = ScriptedSource::new();
        assert_eq!(select_index(0, 1, 1.0, &mut src), 0);
        assert_eq!(select_index(3, 1, 0.5, &mut src), 0);
        assert!(src.int_requests.is_empty());
    }

    #[test]
    fn zero_disjunction_repeats_previous() {
        let mut rng = MelodyRng::new(3);
        for previous in 0..24 {
            assert_eq!(select_index(previous, 24, 0.0, &mut rng), previous);
        }
    }

    #[test]
    fn draws_inside_requested_window() {
        let mut src = ScriptedSource::new().with_ints([9]);
        let idx = select_index(4, 16, 0.5, &mut src);
        assert_eq!(idx, 9);
        assert_eq!(src.int_requests, vec![(2, 9)]);
    }

    #[test]
    fn full_disjunction_is_uniform() {
        // Chi-square goodness of fit over 8 bins, 7 degrees of freedom.
        // The 0.001 critical value is 24.32.
        const TOTAL: usize = 8;
        const TRIALS: usize = 80_000;
        let mut rng = MelodyRng::new(2024);
        let mut counts = [0usize; TOTAL];
        let mut previous = 0;
        for _ in 0..TRIALS {
            previous = select_index(previous, TOTAL, 1.0, &mut rng);
            counts[previous] += 1;
        }
        let expected = TRIALS as f64 / TOTAL as f64;
        let chi2: f64 = counts
            .iter()
            .map(|&c| {
                let diff = c as f64 - expected;
                diff * diff / expected
            })
            .sum();
        assert!(chi2 < 24.32, "chi-square {chi2:.2} too large: {counts:?}");
    }
}
