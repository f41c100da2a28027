//! CoW block-clone alignment arithmetic. Every clone offset and length
//! must be a whole multiple of [`GRANULARITY`]; this module is the only
//! place that does that rounding so the rule can't drift between the
//! encoder, decoder and engine.

/// Clone granularity of the filesystems this tool targets (btrfs, XFS
/// with reflink). Fixed, not probed — matching every variant of the
/// source this format was distilled from.
pub const GRANULARITY: u64 = 4096;

/// Smallest multiple of [`GRANULARITY`] that is `>= n`. `round_up(0)` is
/// defined as `0`, not `GRANULARITY`: an empty file consumes zero
/// payload bytes.
pub fn round_up(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    n.div_ceil(GRANULARITY) * GRANULARITY
}

/// Splits `n` into a clone-aligned prefix and a trailing tail that must
/// be byte-copied. `aligned + tail == n` always holds.
pub fn split(n: u64) -> (u64, u64) {
    let mask = GRANULARITY - 1;
    (n & !mask, n & mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_zero_is_zero() {
        assert_eq!(round_up(0), 0);
    }

    #[test]
    fn round_up_exact_multiple_is_unchanged() {
        assert_eq!(round_up(4096), 4096);
        assert_eq!(round_up(8192), 8192);
    }

    #[test]
    fn round_up_rounds_to_next_boundary() {
        assert_eq!(round_up(1), 4096);
        assert_eq!(round_up(4097), 8192);
        assert_eq!(round_up(4300), 8192);
    }

    #[test]
    fn round_up_never_undershoots_or_overshoots_by_a_block() {
        for n in [0u64, 1, 4095, 4096, 4097, 65536, 1_000_003] {
            let r = round_up(n);
            assert!(r >= n);
            assert!(r - n < GRANULARITY);
            assert_eq!(r % GRANULARITY, 0);
        }
    }

    #[test]
    fn split_recombines_to_original() {
        for n in [0u64, 1, 4095, 4096, 4097, 4300, 8300] {
            let (aligned, tail) = split(n);
            assert_eq!(aligned + tail, n);
            assert_eq!(aligned % GRANULARITY, 0);
            assert!(tail < GRANULARITY);
        }
    }

    #[test]
    fn split_4300_bytes() {
        assert_eq!(split(4300), (4096, 204));
    }
}
