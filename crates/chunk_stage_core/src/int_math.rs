/// Rounds up to the nearest multiple of a power of 2.
#[inline]
pub fn round_up_multiple_of_pow2(x: i32, power: i32) -> i32 {
    (x + power - 1) & -power
}

/// Rounds down to the nearest multiple of a power of 2.
#[inline]
pub fn round_down_multiple_of_pow2(x: i32, power: i32) -> i32 {
    x & -power
}

/// The least `n` such that `2^n >= x`. Zero for `x <= 1`.
#[inline]
pub fn ceil_log2(x: i32) -> u32 {
    if x <= 1 {
        0
    } else {
        32 - ((x - 1) as u32).leading_zeros()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_up_pow2() {
        assert_eq!(round_up_multiple_of_pow2(-3, 2), -2);
        assert_eq!(round_up_multiple_of_pow2(-1, 2), 0);
        assert_eq!(round_up_multiple_of_pow2(0, 2), 0);
        assert_eq!(round_up_multiple_of_pow2(3, 2), 4);

        assert_eq!(round_up_multiple_of_pow2(-3, 16), 0);
        assert_eq!(round_up_multiple_of_pow2(17, 16), 32);
    }

    #[test]
    fn round_down_pow2() {
        assert_eq!(round_down_multiple_of_pow2(-3, 2), -4);
        assert_eq!(round_down_multiple_of_pow2(-1, 2), -2);
        assert_eq!(round_down_multiple_of_pow2(1, 2), 0);

        assert_eq!(round_down_multiple_of_pow2(-1, 16), -16);
        assert_eq!(round_down_multiple_of_pow2(31, 16), 16);
    }

    #[test]
    fn ceil_log2_of_small_values() {
        assert_eq!(ceil_log2(0), 0);
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(16), 4);
        assert_eq!(ceil_log2(17), 5);
    }
}
