//! Numeric helpers for index arithmetic on array lengths and slice bounds.

#[inline]
#[must_use]
pub fn i64_to_usize(v: i64) -> Option<usize> {
    usize::try_from(v).ok()
}

#[inline]
#[must_use]
pub fn usize_to_i64(v: usize) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Clamp a possibly negative offset into `0..=len`.
#[inline]
#[must_use]
pub fn clamp_index(v: i64, len: usize) -> usize {
    i64_to_usize(v.max(0)).map_or(len, |i| i.min(len))
}

#[inline]
#[must_use]
pub fn usize_to_u64(v: usize) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_index_bounds() {
        assert_eq!(clamp_index(-3, 10), 0);
        assert_eq!(clamp_index(4, 10), 4);
        assert_eq!(clamp_index(40, 10), 10);
    }

    #[test]
    fn conversions() {
        assert_eq!(i64_to_usize(-1), None);
        assert_eq!(i64_to_usize(7), Some(7));
        assert_eq!(usize_to_i64(7), 7);
        assert_eq!(usize_to_u64(7), 7);
    }
}
