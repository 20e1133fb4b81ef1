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

//! At most `k` distinct users on a step set.
//!
//! The direct encoding forbids every oversized subset: among any `k + 1`
//! steps at least two must share a user. It posts one disjunction of
//! same-user indicators per subset, `C(n, k + 1)` in total, with the pair
//! indicators shared between subsets.
//!
//! The symmetry-reduced encoding names the users instead. It creates `k`
//! strictly increasing slot variables and links every step to exactly one
//! slot. The ordering of the slots removes their `k!` permutations.

use crate::{
    context::{CompileContext, distinct_steps},
    strategy::EncodingStrategy,
};
use wsp_core::utils::combinatorics::Combinations;
use wsp_cp::model::{IntVar, Literal};
use wsp_model::{constraint::ConstraintKind, index::StepIndex};

pub fn encode(ctx: &mut CompileContext<'_>, position: usize, k: usize, steps: &[StepIndex]) {
    let steps = distinct_steps(steps);
    if k >= steps.len() {
        skip(ctx, position, k, steps.len());
        return;
    }

    match ctx.config().strategy().at_most_k() {
        EncodingStrategy::Direct => encode_direct(ctx, k, &steps),
        EncodingStrategy::SymmetryReduced => {
            if k >= ctx.instance().num_users() {
                skip(ctx, position, k, steps.len());
                return;
            }
            encode_symmetry_reduced(ctx, k, &steps);
        }
    }
    ctx.stats().record(ConstraintKind::AtMostK);
}

fn skip(ctx: &mut CompileContext<'_>, position: usize, k: usize, n: usize) {
    tracing::debug!(
        constraint = position,
        k,
        steps = n,
        "skipping trivially satisfied at-most-k constraint"
    );
    ctx.stats().skipped_trivial += 1;
}

fn encode_direct(ctx: &mut CompileContext<'_>, k: usize, steps: &[StepIndex]) {
    for subset in Combinations::new(steps.len(), k + 1) {
        let mut clause: Vec<Literal> = Vec::with_capacity(subset.len() * subset.len() / 2);
        for (i, &a) in subset.iter().enumerate() {
            for &b in &subset[i + 1..] {
                clause.push(ctx.same_user_indicator(steps[a], steps[b]));
            }
        }
        ctx.model().add_bool_or(clause);
    }
}

fn encode_symmetry_reduced(ctx: &mut CompileContext<'_>, k: usize, steps: &[StepIndex]) {
    if k == 0 {
        // No slot to link a step to.
        ctx.model().add_bool_or(Vec::<Literal>::new());
        return;
    }

    let num_users = ctx.instance().num_users() as i64;
    let slots: Vec<IntVar> = (0..k)
        .map(|i| ctx.model().new_int_var(1, num_users, format!("slot{}", i + 1)))
        .collect();
    for pair in slots.windows(2) {
        ctx.model().add_less_than(pair[0], pair[1]);
    }
    ctx.stats().slots += k;

    for &step in steps {
        let var = ctx.step_var(step);
        let mut links: Vec<Literal> = Vec::with_capacity(k);
        for (i, &slot) in slots.iter().enumerate() {
            let link = Literal::from(
                ctx.model()
                    .new_bool_var(format!("s{}_in_slot{}", step.one_based(), i + 1)),
            );
            ctx.model().add_equal(var, slot).only_enforce_if(link);
            ctx.model().add_not_equal(var, slot).only_enforce_if(!link);
            links.push(link);
        }
        ctx.model().add_exactly_one(links);
        ctx.stats().indicators += k;
    }
}
