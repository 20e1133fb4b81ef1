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

//! Per-user capacity.

use crate::context::CompileContext;
use wsp_cp::model::Literal;
use wsp_model::{constraint::ConstraintKind, index::UserIndex};

/// Posts `sum_s [x[s] == user] <= capacity`, unless the capacity covers every step.
pub fn encode(ctx: &mut CompileContext<'_>, position: usize, user: UserIndex, capacity: usize) {
    let instance = ctx.instance();
    if capacity >= instance.num_steps() {
        tracing::debug!(
            constraint = position,
            user = user.one_based(),
            capacity,
            "skipping trivially satisfied user-capacity constraint"
        );
        ctx.stats().skipped_trivial += 1;
        return;
    }

    let assigned: Vec<Literal> = instance
        .steps()
        .map(|step| ctx.assigned_indicator(step, user))
        .collect();
    ctx.model().add_at_most(assigned, capacity);
    ctx.stats().record(ConstraintKind::UserCapacity);
}
