// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Random token values.
//!
//! One `SystemRandom` is created per process and shared through
//! `AppState`; it reads the OS CSPRNG directly, so there is no seeding.

use std::sync::Arc;

use ring::rand::{SecureRandom, SystemRandom};

/// Symbols a token may contain.
pub const TOKEN_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of symbols in a token.
pub const TOKEN_LENGTH: usize = 6;

/// Bytes at or above this value are rejected so every symbol is equally likely
/// (252 is the largest multiple of 36 not exceeding 256).
const REJECTION_THRESHOLD: u8 = (256 - 256 % TOKEN_ALPHABET.len()) as u8;

/// The CSPRNG could not produce bytes.
#[derive(Debug, thiserror::Error)]
#[error("system random number generator unavailable")]
pub struct RandomUnavailable;

/// Source of random bytes for token values.
pub trait RandomSource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), RandomUnavailable>;
}

impl RandomSource for SystemRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), RandomUnavailable> {
        SecureRandom::fill(self, dest).map_err(|_| RandomUnavailable)
    }
}

/// Generates uniformly random `A-Z0-9` tokens.
#[derive(Clone)]
pub struct TokenGenerator {
    rng: Arc<dyn RandomSource>,
}

impl TokenGenerator {
    /// Generator backed by the OS CSPRNG.
    pub fn new() -> Self {
        Self::with_source(Arc::new(SystemRandom::new()))
    }

    pub fn with_source(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }

    /// Draw a fresh token of [`TOKEN_LENGTH`] symbols.
    pub fn generate(&self) -> Result<String, RandomUnavailable> {
        let mut token = String::with_capacity(TOKEN_LENGTH);
        // 16 bytes covers 6 symbols in all but astronomically unlucky draws
        let mut buf = [0u8; 16];
        while token.len() < TOKEN_LENGTH {
            self.rng.fill(&mut buf)?;
            push_unbiased(&buf, &mut token);
        }
        Ok(token)
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Append symbols for accepted bytes until `token` holds [`TOKEN_LENGTH`].
fn push_unbiased(bytes: &[u8], token: &mut String) {
    for &b in bytes {
        if token.len() == TOKEN_LENGTH {
            return;
        }
        if b >= REJECTION_THRESHOLD {
            continue;
        }
        let symbol = TOKEN_ALPHABET[b as usize % TOKEN_ALPHABET.len()];
        token.push(symbol as char);
    }
}

/// Whether `value` has the shape of a generated token.
pub fn is_well_formed(value: &str) -> bool {
    value.len() == TOKEN_LENGTH && value.bytes().all(|b| TOKEN_ALPHABET.contains(&b))
}
