// build.rs

use std::{env, fs::File, io::Write, path::Path};

fn main() {
    let out_dir = env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo");
    let out_dir = Path::new(&out_dir);

    let bytes_granularity: usize = env::var("REACHED_BYTES_GRANULARITY")
        .map_or(Ok(4), |value| value.parse())
        .expect("Could not parse REACHED_BYTES_GRANULARITY");
    assert!(
        bytes_granularity.is_power_of_two(),
        "REACHED_BYTES_GRANULARITY must be a power of two, got {bytes_granularity}"
    );

    // 1 << 20 words of 32 bits at 4 bytes per bit cover 128MB of code.
    let text_bitfield_size: usize = env::var("REACHED_TEXT_BITFIELD_SIZE")
        .map_or(Ok(1 << 20), |value| value.parse())
        .expect("Could not parse REACHED_TEXT_BITFIELD_SIZE");

    let mut constants_file =
        File::create(out_dir.join("constants.rs")).expect("Could not create file");
    write!(
        constants_file,
        "// These constants are autogenerated by build.rs

        /// The default number of address bytes each bit of a reached-addresses bitset stands for
        pub const BYTES_GRANULARITY: usize = {bytes_granularity};
        /// The number of 32 bit words reserved for the process-wide text bitfield
        pub const TEXT_BITFIELD_SIZE: usize = {text_bitfield_size};
        "
    )
    .expect("Could not write file");

    println!("cargo:rerun-if-env-changed=REACHED_BYTES_GRANULARITY");
    println!("cargo:rerun-if-env-changed=REACHED_TEXT_BITFIELD_SIZE");
    println!("cargo:rerun-if-changed=build.rs");
}
