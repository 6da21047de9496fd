//! The process-wide reached-addresses bitset over the program's text,
//! backed by a static, zero-initialized bitfield of [`TEXT_BITFIELD_SIZE`] words.
//!
//! Whoever knows the bounds of the text (a loader, the linker anchors, a test) installs the
//! bitset once with [`init_text_bitset`]. Samplers and instrumentation then call
//! [`record_text_address`] (or the exported [`__reached_record_text_address`] from C), and
//! whoever writes the report reads the offsets back from [`text_bitset`].
//!
//! The backing words are only reachable through the installed bitset:
//!
//! ```compile_fail
//! let _ = &reached_targets::text::TEXT_BITFIELD;
//! ```

use core::sync::atomic::AtomicU32;
use std::sync::OnceLock;

use reached_bolts::Error;

use crate::{ReachedAddressesBitset, TEXT_BITFIELD_SIZE};

// The bitfield is zero-initialized in `.bss`; an atomic word has to be exactly its integer.
static_assertions::assert_eq_size!(AtomicU32, u32);

#[allow(clippy::declare_interior_mutable_const)]
const UNREACHED: AtomicU32 = AtomicU32::new(0);

/// The storage of the process-wide text bitset.
pub(crate) static TEXT_BITFIELD: [AtomicU32; TEXT_BITFIELD_SIZE] =
    [UNREACHED; TEXT_BITFIELD_SIZE];

static TEXT_BITSET: OnceLock<ReachedAddressesBitset<'static>> = OnceLock::new();

/// Installs the process-wide text bitset over `[start_address, end_address)`.
///
/// Installing the same window again returns the existing bitset.
/// Returns [`Error::IllegalArgument`] if the window is inverted or needs more than
/// [`TEXT_BITFIELD_SIZE`] words, and [`Error::IllegalState`] if a different window was installed before.
pub fn init_text_bitset(
    start_address: usize,
    end_address: usize,
) -> Result<&'static ReachedAddressesBitset<'static>, Error> {
    let bitset = match TEXT_BITSET.get() {
        Some(bitset) => bitset,
        None => {
            let candidate =
                ReachedAddressesBitset::try_new(start_address, end_address, &TEXT_BITFIELD)?;
            let mut installed = false;
            let bitset = TEXT_BITSET.get_or_init(|| {
                installed = true;
                candidate
            });
            if installed {
                log::info!(
                    "Installed text bitset for {start_address:#x}..{end_address:#x} ({} of {TEXT_BITFIELD_SIZE} words)",
                    bitset.word_count()
                );
            }
            bitset
        }
    };

    if bitset.start_address() != start_address || bitset.end_address() != end_address {
        return Err(Error::illegal_state(format!(
            "text bitset already installed for {:#x}..{:#x}, refusing {start_address:#x}..{end_address:#x}",
            bitset.start_address(),
            bitset.end_address()
        )));
    }
    Ok(bitset)
}

/// Installs the process-wide text bitset over the executable's text,
/// as delimited by the linker-provided `__executable_start` and `etext` symbols.
#[cfg(all(feature = "linker_anchors", target_os = "linux"))]
pub fn init_text_bitset_from_linker() -> Result<&'static ReachedAddressesBitset<'static>, Error> {
    extern "C" {
        static __executable_start: u8;
        static etext: u8;
    }

    #[allow(unused_unsafe)]
    let (start_address, end_address) = unsafe {
        (
            core::ptr::addr_of!(__executable_start) as usize,
            core::ptr::addr_of!(etext) as usize,
        )
    };
    init_text_bitset(start_address, end_address)
}

/// The process-wide text bitset, if [`init_text_bitset`] was called.
#[must_use]
pub fn text_bitset() -> Option<&'static ReachedAddressesBitset<'static>> {
    TEXT_BITSET.get()
}

/// Records `address` in the process-wide text bitset.
///
/// Does nothing until the bitset is installed, or if `address` is outside of the text.
#[inline]
pub fn record_text_address(address: usize) {
    if let Some(bitset) = TEXT_BITSET.get() {
        bitset.record_address(address);
    }
}

/// Records `address` in the process-wide text bitset, callable from C.
#[no_mangle]
pub extern "C" fn __reached_record_text_address(address: usize) {
    record_text_address(address);
}
