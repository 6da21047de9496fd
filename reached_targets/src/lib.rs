//! `reached_targets` contains the runtime linked into the observed program:
//! a lock-free bitset recording which parts of an address window have been reached.
//!
//! ```rust
//! # extern crate reached_targets;
//! use core::sync::atomic::AtomicU32;
//!
//! use reached_targets::{ReachedAddressesBitset, BYTES_GRANULARITY};
//!
//! let storage: Vec<AtomicU32> = (0..8).map(|_| AtomicU32::new(0)).collect();
//! let start = 0x1000;
//! let end = start + 256 * BYTES_GRANULARITY;
//! let bitset = ReachedAddressesBitset::new(start, end, &storage);
//!
//! bitset.record_address(start);
//! bitset.record_address(start + 5 * BYTES_GRANULARITY);
//! bitset.record_address(end);
//!
//! assert_eq!(bitset.reached_offsets(), [0, 5 * BYTES_GRANULARITY]);
//! ```
#![no_std]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(
    clippy::unreadable_literal,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::module_name_repetitions
)]
#![cfg_attr(not(test), warn(
    missing_debug_implementations,
    missing_docs,
    //trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    //unused_results
))]
#![cfg_attr(test, deny(
    missing_debug_implementations,
    //trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_must_use,
    //unused_results
))]
#![cfg_attr(
    test,
    deny(
        bad_style,
        dead_code,
        improper_ctypes,
        non_shorthand_field_patterns,
        no_mangle_generic_items,
        overflowing_literals,
        path_statements,
        patterns_in_fns_without_body,
        unconditional_recursion,
        unused,
        unused_allocation,
        unused_comparisons,
        unused_parens,
        while_true
    )
)]

#[cfg(feature = "std")]
#[macro_use]
extern crate std;

#[allow(unused_imports)]
#[macro_use]
extern crate alloc;

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod word;
pub use word::BitWord;

pub mod bitset;
pub use bitset::{ReachedAddressesBitset, ReachedOffsetsIter};

#[cfg(feature = "text_bitset")]
pub mod text;
#[cfg(feature = "text_bitset")]
pub use text::*;

pub use reached_bolts::Error;
