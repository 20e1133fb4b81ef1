// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Encoding strategy selection.
//!
//! `EncodingStrategy` picks between the direct and the symmetry-reduced
//! encoding of one constraint family. `StrategyConfig` holds one choice for
//! each family that has two encodings; the families can be mixed freely.

use std::str::FromStr;

/// How a constraint family is lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncodingStrategy {
    /// Enumerate the forbidden or allowed combinations explicitly.
    Direct,
    /// Introduce auxiliary variables that remove permutation symmetry.
    #[default]
    SymmetryReduced,
}

impl EncodingStrategy {
    /// The name accepted by `FromStr`.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            EncodingStrategy::Direct => "direct",
            EncodingStrategy::SymmetryReduced => "symmetry",
        }
    }
}

impl std::fmt::Display for EncodingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The error returned when a strategy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown encoding strategy `{0}`, expected `direct` or `symmetry`")]
pub struct ParseStrategyError(String);

impl FromStr for EncodingStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "combinatorial" => Ok(EncodingStrategy::Direct),
            "symmetry" | "symmetry-reduced" | "symmetry_reduced" => {
                Ok(EncodingStrategy::SymmetryReduced)
            }
            _ => Err(ParseStrategyError(s.to_owned())),
        }
    }
}

/// The strategy used for each constraint family with two encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StrategyConfig {
    at_most_k: EncodingStrategy,
    one_team: EncodingStrategy,
}

impl StrategyConfig {
    /// Uses `strategy` for every family.
    #[inline]
    pub const fn uniform(strategy: EncodingStrategy) -> Self {
        Self {
            at_most_k: strategy,
            one_team: strategy,
        }
    }

    /// The direct encoding for every family.
    #[inline]
    pub const fn direct() -> Self {
        Self::uniform(EncodingStrategy::Direct)
    }

    /// The symmetry-reduced encoding for every family.
    #[inline]
    pub const fn symmetry_reduced() -> Self {
        Self::uniform(EncodingStrategy::SymmetryReduced)
    }

    #[inline]
    pub const fn with_at_most_k(mut self, strategy: EncodingStrategy) -> Self {
        self.at_most_k = strategy;
        self
    }

    #[inline]
    pub const fn with_one_team(mut self, strategy: EncodingStrategy) -> Self {
        self.one_team = strategy;
        self
    }

    #[inline]
    pub const fn at_most_k(&self) -> EncodingStrategy {
        self.at_most_k
    }

    #[inline]
    pub const fn one_team(&self) -> EncodingStrategy {
        self.one_team
    }
}

impl std::fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "at-most-k: {}, one-team: {}", self.at_most_k, self.one_team)
    }
}
