//! wiring-guard
//!
//! The address wiring guard: the precondition check every module runs before
//! recording its peer addresses. Pure and storage-agnostic; the state engine
//! supplies the code-size lookup and performs the write.

pub mod validation;

pub use validation::check_wiring;
