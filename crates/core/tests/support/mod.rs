//! Shared test helpers for `groupderef-core` integration tests.

pub mod directory;
