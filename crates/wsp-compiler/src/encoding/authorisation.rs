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

//! Authorisation lists.
//!
//! The effective authorisation of every user is resolved once, first entry
//! wins. A user with an entry is forbidden from every step outside its
//! allowed set; users without an entry are left unrestricted.

use crate::{context::CompileContext, diagnostics::Diagnostic};
use wsp_model::constraint::ConstraintKind;

pub fn encode(ctx: &mut CompileContext<'_>) {
    let instance = ctx.instance();
    let authorisations = instance.authorisations();

    for duplicate in authorisations.duplicates() {
        ctx.diagnostics().push(Diagnostic::warning(format!(
            "User u{} has multiple authorisations defined; only the first will be used.",
            duplicate.user.one_based()
        )));
        ctx.stats().ignored_duplicates += 1;
    }

    for user in instance.users() {
        let Some(allowed) = authorisations.allowed_steps(user) else {
            continue;
        };

        let value = CompileContext::user_value(user);
        for step in instance.steps() {
            if !allowed.contains(step.get()) {
                let var = ctx.step_var(step);
                ctx.model().add_not_equal_value(var, value);
            }
        }
        ctx.stats().record(ConstraintKind::Authorisation);
    }

    let unrestricted = authorisations.unrestricted_users().len();
    if unrestricted > 0 {
        ctx.diagnostics().push(Diagnostic::info(format!(
            "{} of {} users have no authorisations defined and may perform any step.",
            unrestricted,
            instance.num_users()
        )));
    }
}

#[cfg(test)]
mod tests {
    use crate::{compiler::ConstraintCompiler, diagnostics::Severity};
    use wsp_cp::{backend::Backend, sat::SatBackend};
    use wsp_model::{
        index::{StepIndex, UserIndex},
        instance::InstanceBuilder,
    };

    fn si(i: usize) -> StepIndex {
        StepIndex::new(i)
    }

    fn ui(i: usize) -> UserIndex {
        UserIndex::new(i)
    }

    #[test]
    fn test_forbids_steps_outside_the_allowed_set() {
        let mut builder = InstanceBuilder::new(3, 2);
        builder
            .add_authorisation(ui(0), [si(0)])
            .add_authorisation(ui(1), [si(1), si(2)]);
        let instance = builder.build().unwrap();
        let compiled = ConstraintCompiler::default().compile(&instance).unwrap();

        // u1 is forbidden from s2 and s3, u2 from s1.
        assert_eq!(compiled.model().num_constraints(), 3);
        let solutions: Vec<_> = SatBackend::new()
            .enumerate(compiled.model())
            .unwrap()
            .map(|v| v.unwrap())
            .collect();
        assert_eq!(solutions.len(), 1);
        let values: Vec<i64> = compiled
            .step_vars()
            .iter()
            .map(|&var| solutions[0].value(var))
            .collect();
        assert_eq!(values, vec![1, 2, 2]);
        assert!(compiled.diagnostics().is_empty());
    }

    #[test]
    fn test_empty_authorisation_forbids_everything() {
        let mut builder = InstanceBuilder::new(2, 1);
        builder.add_authorisation(ui(0), Vec::<StepIndex>::new());
        let instance = builder.build().unwrap();
        let compiled = ConstraintCompiler::default().compile(&instance).unwrap();

        let response = SatBackend::new().solve(compiled.model()).unwrap();
        assert!(!response.status().has_solution());
    }

    #[test]
    fn test_reports_unrestricted_users() {
        let mut builder = InstanceBuilder::new(1, 3);
        builder.add_authorisation(ui(1), [si(0)]);
        let instance = builder.build().unwrap();
        let compiled = ConstraintCompiler::default().compile(&instance).unwrap();

        let diagnostics = compiled.diagnostics().as_slice();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity(), Severity::Info);
        assert_eq!(
            diagnostics[0].message(),
            "2 of 3 users have no authorisations defined and may perform any step."
        );
    }
}
