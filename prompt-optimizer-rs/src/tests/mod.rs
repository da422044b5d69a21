// prompt-optimizer-rs/src/tests/mod.rs
// Unit tests driven by a scripted in-memory completion client

mod stub;

mod answer_tests;
mod reflector_tests;
