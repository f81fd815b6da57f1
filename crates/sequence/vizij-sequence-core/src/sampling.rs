//! Scalar key sampling for property tracks.

use crate::data::{Interp, Key};

/// Sample `keys` at time `t` (seconds). Holds the first/last value outside
/// the keyed range. None for an empty track or a non-finite `t`.
pub fn sample_keys(keys: &[Key], t: f32) -> Option<f32> {
    if !t.is_finite() {
        return None;
    }
    let first = keys.first()?;
    if t <= first.time {
        return Some(first.value);
    }
    let last = keys.last()?;
    if t >= last.time {
        return Some(last.value);
    }

    // first key strictly after t; 1 <= idx < len here
    let idx = keys.partition_point(|k| k.time <= t);
    let a = &keys[idx - 1];
    let b = &keys[idx];
    match a.interp {
        Interp::Step => Some(a.value),
        Interp::Linear => {
            let span = b.time - a.time;
            if span <= 0.0 {
                return Some(b.value);
            }
            let u = (t - a.time) / span;
            Some(a.value + (b.value - a.value) * u)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(time: f32, value: f32, interp: Interp) -> Key {
        Key {
            time,
            value,
            interp,
        }
    }

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() <= 1e-6, "left={a} right={b}");
    }

    #[test]
    fn empty_track_has_no_value() {
        assert_eq!(sample_keys(&[], 0.5), None);
    }

    #[test]
    fn non_finite_time_has_no_value() {
        let keys = [key(0.0, 1.0, Interp::Linear), key(1.0, 2.0, Interp::Linear)];
        assert_eq!(sample_keys(&keys, f32::NAN), None);
        assert_eq!(sample_keys(&keys, f32::INFINITY), None);
        assert_eq!(sample_keys(&keys, f32::NEG_INFINITY), None);
    }

    #[test]
    fn linear_interpolates_and_holds_ends() {
        let keys = [key(1.0, 0.0, Interp::Linear), key(3.0, 10.0, Interp::Linear)];
        approx(sample_keys(&keys, 0.0).unwrap(), 0.0);
        approx(sample_keys(&keys, 2.0).unwrap(), 5.0);
        approx(sample_keys(&keys, 2.5).unwrap(), 7.5);
        approx(sample_keys(&keys, 9.0).unwrap(), 10.0);
    }

    #[test]
    fn step_holds_until_next_key() {
        let keys = [
            key(0.0, 1.0, Interp::Step),
            key(1.0, 2.0, Interp::Step),
            key(2.0, 3.0, Interp::Linear),
        ];
        approx(sample_keys(&keys, 0.99).unwrap(), 1.0);
        approx(sample_keys(&keys, 1.0).unwrap(), 2.0);
        approx(sample_keys(&keys, 1.5).unwrap(), 2.0);
    }

    #[test]
    fn coincident_keys_jump_to_later_value() {
        let keys = [
            key(0.0, 0.0, Interp::Linear),
            key(1.0, 1.0, Interp::Linear),
            key(1.0, 5.0, Interp::Linear),
            key(2.0, 5.0, Interp::Linear),
        ];
        approx(sample_keys(&keys, 1.0).unwrap(), 5.0);
        approx(sample_keys(&keys, 0.5).unwrap(), 0.5);
    }
}
