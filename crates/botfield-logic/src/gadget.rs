//! Decorative object density throttle.
//!
//! Levels place many decorative objects; the gadget quantity setting (0..1)
//! keeps a fraction of them using a fixed pattern over the gadget rank, so
//! that the same objects survive every time a level is loaded.

const TABLE10: [bool; 10] = [false, true, false, false, false, false, false, false, false, false];
const TABLE20: [bool; 10] = [false, true, false, false, false, true, false, false, false, false];
const TABLE30: [bool; 10] = [false, true, false, true, false, true, false, false, false, false];
const TABLE40: [bool; 10] = [false, true, false, true, false, true, false, true, false, false];
const TABLE50: [bool; 10] = [false, true, false, true, false, true, false, true, false, true];
const TABLE60: [bool; 10] = [false, true, false, true, true, true, false, true, false, true];
const TABLE70: [bool; 10] = [false, true, false, true, true, true, false, true, true, true];
const TABLE80: [bool; 10] = [false, true, true, true, true, true, false, true, true, true];
const TABLE90: [bool; 10] = [false, true, true, true, true, true, true, true, true, true];

/// Whether the gadget with the given rank (0-based, counted over the gadgets
/// of the level) is created at density `quantity`.
pub fn keep_gadget(quantity: f32, rank: usize) -> bool {
    if quantity <= 0.0 {
        return false;
    }
    if quantity >= 1.0 {
        return true;
    }

    let table = if quantity <= 0.15 {
        &TABLE10
    } else if quantity <= 0.25 {
        &TABLE20
    } else if quantity <= 0.35 {
        &TABLE30
    } else if quantity <= 0.45 {
        &TABLE40
    } else if quantity <= 0.55 {
        &TABLE50
    } else if quantity <= 0.65 {
        &TABLE60
    } else if quantity <= 0.75 {
        &TABLE70
    } else if quantity <= 0.85 {
        &TABLE80
    } else {
        &TABLE90
    };
    table[rank % 10]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept(quantity: f32) -> usize {
        (0..100).filter(|rank| keep_gadget(quantity, *rank)).count()
    }

    #[test]
    fn test_extremes() {
        assert_eq!(kept(0.0), 0);
        assert_eq!(kept(1.0), 100);
    }

    #[test]
    fn test_density_steps() {
        assert_eq!(kept(0.1), 10);
        assert_eq!(kept(0.5), 50);
        assert_eq!(kept(0.9), 90);
        assert!(kept(0.3) < kept(0.7));
    }

    #[test]
    fn test_rank_zero_never_kept_below_full() {
        assert!(!keep_gadget(0.95, 0));
        assert!(keep_gadget(0.95, 1));
    }
}
