//! Alignment helpers.

/// The platform's maximum natural scalar alignment.
///
/// This is the default alignment for [`Arena::allocate`](crate::Arena::allocate)
/// and the minimum alignment of every block.
pub const MAX_ALIGN: usize = {
    let a = std::mem::align_of::<u128>();
    let b = std::mem::align_of::<f64>();
    let c = std::mem::align_of::<usize>();
    let ab = if a > b { a } else { b };
    if ab > c {
        ab
    } else {
        c
    }
};

/// Largest alignment the arena accepts. Larger requests are a programmer
/// error.
pub const MAX_BLOCK_ALIGN: usize = 4096;

/// Whether `align` is a usable alignment: a non-zero power of two.
pub const fn is_valid_alignment(align: usize) -> bool {
    align.is_power_of_two()
}

/// Round `value` up to the next multiple of `align`.
///
/// Returns `None` on overflow. `align` must be a power of two.
pub const fn align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    let mask = align - 1;
    match value.checked_add(mask) {
        Some(v) => Some(v & !mask),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_align_is_a_power_of_two() {
        assert!(is_valid_alignment(MAX_ALIGN));
        assert!(MAX_ALIGN >= std::mem::align_of::<u64>());
    }

    #[test]
    fn zero_and_non_powers_are_invalid() {
        assert!(!is_valid_alignment(0));
        assert!(!is_valid_alignment(3));
        assert!(!is_valid_alignment(24));
        assert!(is_valid_alignment(1));
        assert!(is_valid_alignment(64));
    }

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(0, 8), Some(0));
        assert_eq!(align_up(1, 8), Some(8));
        assert_eq!(align_up(8, 8), Some(8));
        assert_eq!(align_up(9, 16), Some(16));
        assert_eq!(align_up(100, 1), Some(100));
    }

    #[test]
    fn align_up_overflow_is_none() {
        assert_eq!(align_up(usize::MAX, 16), None);
        assert_eq!(align_up(usize::MAX - 3, 4), Some(usize::MAX - 3));
    }
}
