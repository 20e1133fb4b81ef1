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

use wsp_model::index::{StepIndex, UserIndex};

/// Fatal compilation failures.
///
/// `constraint` fields are zero-based positions in the constraint list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("constraint {constraint} references step s{} outside of {num_steps} steps", .step.one_based())]
    StepOutOfRange {
        constraint: usize,
        step: StepIndex,
        num_steps: usize,
    },
    #[error("constraint {constraint} references user u{} outside of {num_users} users", .user.one_based())]
    UserOutOfRange {
        constraint: usize,
        user: UserIndex,
        num_users: usize,
    },
    /// The direct one-team table would exceed the configured row ceiling.
    /// `rows` is `None` if the count does not even fit into a `u128`.
    #[error("one-team constraint {constraint} needs {} table rows, the limit is {limit}", .rows.map_or_else(|| "too many".to_owned(), |r| r.to_string()))]
    TableTooLarge {
        constraint: usize,
        rows: Option<u128>,
        limit: usize,
    },
}
