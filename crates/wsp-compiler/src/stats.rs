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

//! Counters describing a produced encoding.

use wsp_model::constraint::ConstraintKind;

/// What the compiler did with the constraints of an instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodingStats {
    /// Constraints encoded, per kind, indexed like `ConstraintKind::ALL`.
    encoded: [usize; 6],
    /// Constraints skipped because they could never be violated.
    pub skipped_trivial: usize,
    /// Authorisation entries ignored because their user already had one.
    pub ignored_duplicates: usize,
    /// Reified `step == user` and `step == step` indicators created.
    pub indicators: usize,
    /// One-team selector booleans created.
    pub selectors: usize,
    /// At-most-k slot variables created.
    pub slots: usize,
    /// Rows posted in allowed-assignment tables.
    pub table_rows: usize,
    /// Mutual exclusions posted between selectors of disjoint teams.
    pub team_exclusions: usize,
}

impl EncodingStats {
    /// Returns the number of encoded constraints of `kind`.
    #[inline]
    pub fn encoded(&self, kind: ConstraintKind) -> usize {
        self.encoded[kind_slot(kind)]
    }

    #[inline]
    pub(crate) fn record(&mut self, kind: ConstraintKind) {
        self.encoded[kind_slot(kind)] += 1;
    }

    /// Returns the total number of encoded constraints.
    #[inline]
    pub fn total_encoded(&self) -> usize {
        self.encoded.iter().sum()
    }
}

#[inline]
fn kind_slot(kind: ConstraintKind) -> usize {
    kind as usize
}

impl std::fmt::Display for EncodingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Encoding Statistics:")?;
        for kind in ConstraintKind::ALL {
            writeln!(f, "  {:<20} {}", kind.keyword(), self.encoded(kind))?;
        }
        writeln!(f, "  Skipped (trivial):   {}", self.skipped_trivial)?;
        writeln!(f, "  Ignored duplicates:  {}", self.ignored_duplicates)?;
        writeln!(f, "  Indicators:          {}", self.indicators)?;
        writeln!(f, "  Selectors:           {}", self.selectors)?;
        writeln!(f, "  Slots:               {}", self.slots)?;
        writeln!(f, "  Table rows:          {}", self.table_rows)?;
        write!(f, "  Team exclusions:     {}", self.team_exclusions)
    }
}
