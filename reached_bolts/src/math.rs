//! Bucket and word arithmetic shared by the bitset and its storage providers

use crate::Error;

/// Integer division, rounding up.
///
/// ```rust
/// # extern crate reached_bolts;
/// use reached_bolts::math::div_ceil;
///
/// assert_eq!(div_ceil(0, 4), 0);
/// assert_eq!(div_ceil(9, 4), 3);
/// ```
#[must_use]
#[inline]
pub const fn div_ceil(value: usize, divisor: usize) -> usize {
    value / divisor + (value % divisor != 0) as usize
}

/// The number of `granularity`-sized buckets needed to cover `len` bytes.
#[must_use]
#[inline]
pub const fn buckets_for_bytes(len: usize, granularity: usize) -> usize {
    div_ceil(len, granularity)
}

/// The number of `bits_per_word`-wide words needed to hold `buckets` bits.
#[must_use]
#[inline]
pub const fn words_for_buckets(buckets: usize, bits_per_word: usize) -> usize {
    div_ceil(buckets, bits_per_word)
}

/// The number of words a bitset over the half-open window `[start, end)` needs,
/// one bit per `granularity` bytes.
///
/// Returns an [`Error::IllegalArgument`] if the window is inverted.
pub fn words_for_window(
    start: usize,
    end: usize,
    granularity: usize,
    bits_per_word: usize,
) -> Result<usize, Error> {
    if start > end {
        return Err(Error::illegal_argument(format!(
            "start address {start:#x} is above end address {end:#x}"
        )));
    }
    Ok(words_for_buckets(
        buckets_for_bytes(end - start, granularity),
        bits_per_word,
    ))
}

#[cfg(test)]
mod test {
    use super::{buckets_for_bytes, div_ceil, words_for_buckets, words_for_window};

    #[test]
    fn test_div_ceil() {
        assert_eq!(0, div_ceil(0, 1));
        assert_eq!(1, div_ceil(1, 4));
        assert_eq!(1, div_ceil(4, 4));
        assert_eq!(2, div_ceil(5, 4));
        assert_eq!(usize::MAX / 2 + 1, div_ceil(usize::MAX, 2));
    }

    #[test]
    fn test_window_words() {
        // 256 buckets of 4 bytes fit exactly into 8 words of 32 bits.
        assert_eq!(256, buckets_for_bytes(1024, 4));
        assert_eq!(8, words_for_buckets(256, 32));
        assert_eq!(8, words_for_window(0x1000, 0x1400, 4, 32).unwrap());

        // A single trailing byte still needs its own bucket, and that bucket its own word.
        assert_eq!(9, words_for_window(0x1000, 0x1401, 4, 32).unwrap());

        assert_eq!(0, words_for_window(0x1000, 0x1000, 4, 32).unwrap());
        assert!(words_for_window(0x1001, 0x1000, 4, 32).is_err());
    }
}
