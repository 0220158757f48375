//! Destination-side node identifiers.
//!
//! Generated ids are ephemeral: they live in the source-to-destination
//! mapping table for the duration of one copy run and are never checked
//! against existing tenant data.

use rand::Rng;

/// Produces fresh opaque node ids. Injectable so tests can supply
/// deterministic sequences.
pub trait IdGenerator {
    fn generate(&mut self) -> String;
}

/// 8 random bytes rendered as 16 lowercase hex characters. Collisions within
/// one run are assumed astronomically unlikely and are not defended against.
#[derive(Debug, Default)]
pub struct HexIds;

impl IdGenerator for HexIds {
    fn generate(&mut self) -> String {
        format!("{:016x}", rand::thread_rng().gen::<u64>())
    }
}

/// Deterministic generator for tests: `n1`, `n2`, `n3`, ...
#[derive(Debug, Default)]
pub struct SequenceIds {
    next: u64,
}

impl IdGenerator for SequenceIds {
    fn generate(&mut self) -> String {
        self.next += 1;
        format!("n{}", self.next)
    }
}
