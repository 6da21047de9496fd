//! Atomic words backing a reached-addresses bitset.

use core::{
    fmt::Debug,
    sync::atomic::{AtomicU16, AtomicU32, AtomicU8, AtomicUsize, Ordering},
};
#[cfg(target_has_atomic = "64")]
use core::sync::atomic::AtomicU64;

use num_traits::{One, PrimInt};

/// A fixed-width atomic word holding [`BitWord::BITS`] independent bucket bits.
///
/// All accesses are [`Ordering::Relaxed`]: a bitset only needs every bit to become visible
/// eventually, never any ordering with respect to other memory.
pub trait BitWord: Default + Debug + Send + Sync {
    /// The plain integer loaded from and or-ed into this word
    type Value: PrimInt + Debug;

    /// The number of bits in this word
    const BITS: usize;

    /// Loads the current value
    fn load_relaxed(&self) -> Self::Value;

    /// Sets every bit of `mask` in this word
    fn fetch_or_relaxed(&self, mask: Self::Value);

    /// The mask with only bit `index` set
    #[inline]
    #[must_use]
    fn bit(index: usize) -> Self::Value {
        debug_assert!(index < Self::BITS);
        <Self::Value as One>::one() << index
    }
}

macro_rules! impl_bit_word {
    ($atomic:ty, $value:ty) => {
        static_assertions::assert_eq_size!($atomic, $value);

        impl BitWord for $atomic {
            type Value = $value;

            const BITS: usize = <$value>::BITS as usize;

            #[inline]
            fn load_relaxed(&self) -> $value {
                self.load(Ordering::Relaxed)
            }

            #[inline]
            fn fetch_or_relaxed(&self, mask: $value) {
                self.fetch_or(mask, Ordering::Relaxed);
            }
        }
    };
}

impl_bit_word!(AtomicU8, u8);
impl_bit_word!(AtomicU16, u16);
impl_bit_word!(AtomicU32, u32);
#[cfg(target_has_atomic = "64")]
impl_bit_word!(AtomicU64, u64);
impl_bit_word!(AtomicUsize, usize);
