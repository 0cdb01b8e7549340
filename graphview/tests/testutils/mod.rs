//! Test utilities for GraphView integration tests
//!
//! `TestFixture` wraps a transaction manager over a fresh store, in memory or
//! Sled-backed in a temporary directory, so every test runs in isolation.

#![allow(dead_code)]

pub mod test_fixture;
