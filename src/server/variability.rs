//! Source of the cosmetic randomness in simulated completions.
//!
//! Token counts and the canned reply are drawn through [`Variability`] so
//! tests can pin them with [`FixedVariability`].

use std::ops::RangeInclusive;

use rand::Rng;

/// Range of simulated prompt token counts.
pub const PROMPT_TOKENS: RangeInclusive<u32> = 1..=5;

/// Range of simulated completion token counts.
pub const COMPLETION_TOKENS: RangeInclusive<u32> = 5..=24;

/// Canned assistant replies.
pub const CANNED_REPLIES: &[&str] = &[
    "Today it is partially cloudy and raining. Testing, testing 1,2,3",
    "The API key was validated successfully. This is a simulated response.",
    "Hello from the key-validating provider simulator!",
    "External model inference is working end-to-end with API key injection.",
];

/// Per-call variability. Implementations must be callable concurrently.
pub trait Variability: Send + Sync {
    /// Simulated prompt token count, within [`PROMPT_TOKENS`].
    fn prompt_tokens(&self) -> u32;

    /// Simulated completion token count, within [`COMPLETION_TOKENS`].
    fn completion_tokens(&self) -> u32;

    /// Index into a set of `len` canned replies. `len` is never zero.
    fn reply_index(&self, len: usize) -> usize;
}

/// Uniform random draws from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomVariability;

impl Variability for RandomVariability {
    fn prompt_tokens(&self) -> u32 {
        rand::thread_rng().gen_range(PROMPT_TOKENS)
    }

    fn completion_tokens(&self) -> u32 {
        rand::thread_rng().gen_range(COMPLETION_TOKENS)
    }

    fn reply_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Fixed values, for deterministic assertions.
#[derive(Debug, Clone, Copy)]
pub struct FixedVariability {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub reply_index: usize,
}

impl Variability for FixedVariability {
    fn prompt_tokens(&self) -> u32 {
        self.prompt_tokens
    }

    fn completion_tokens(&self) -> u32 {
        self.completion_tokens
    }

    fn reply_index(&self, len: usize) -> usize {
        self.reply_index % len
    }
}
