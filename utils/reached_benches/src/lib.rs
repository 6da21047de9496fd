//! Benchmarks for the `reached` crates live in `benches/`.
