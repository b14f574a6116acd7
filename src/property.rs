// Copyright 2025 Cornell University
// released under MIT License

use log::warn;

use crate::csp::{self, STOP};
use crate::diagnostic::{DiagnosticHandler, Level};
use crate::generator::group_name;
use crate::ir::*;
use crate::ticktock::lift;

/// Name of the exported process of an interaction module
const MAIN: &str = "Main";

/// The process a property refers to, qualified with the namespaces it lives in
pub fn process_name(
    spec: &Specification,
    source: &ProcessSource,
    handler: &mut DiagnosticHandler,
) -> String {
    match source {
        ProcessSource::Interaction(id) => {
            let it = &spec[*id];
            let ns = match it.group {
                Some(group) => csp::qualify(&group_name(spec, group), &it.name),
                None => it.name.clone(),
            };
            csp::qualify(&ns, MAIN)
        }
        ProcessSource::Target(group) => {
            let name = group_name(spec, *group);
            if spec[*group].target.is_some() {
                csp::qualify(&name, "Target")
            } else {
                warn!("group {name} has no target, checking against STOP");
                handler.emit_diagnostic(
                    &format!("Warning in group {name}"),
                    "property refers to the target of a group without one, generating STOP",
                    Level::Warning,
                );
                format!("{STOP} {}", csp::comment(&format!("{name} has no target")))
            }
        }
        ProcessSource::Csp(id) => {
            let fragment = &spec[*id];
            csp::qualify(&group_name(spec, fragment.group), &fragment.name)
        }
    }
}

fn negation(negated: bool) -> &'static str {
    if negated {
        "not "
    } else {
        ""
    }
}

fn side(
    spec: &Specification,
    source: &ProcessSource,
    model: SemanticModel,
    handler: &mut DiagnosticHandler,
) -> String {
    lift(spec, source, &process_name(spec, source, handler), model)
}

/// `lhs refines rhs` is written `RHS [T= LHS` in CSP-M, which reads
/// "is refined by". This is the only place the sides are exchanged.
fn refinement_assertion(
    spec: &Specification,
    property: &RefinementProperty,
    handler: &mut DiagnosticHandler,
) -> String {
    let lhs = side(spec, &property.lhs, property.model, handler);
    let rhs = side(spec, &property.rhs, property.model, handler);
    let check = format!("assert {}{rhs} [T= {lhs}", negation(property.negated));
    match property.model {
        SemanticModel::Trace => format!("{check} :[tau priority]: {{tock}}"),
        SemanticModel::Timed => check,
    }
}

/// One assertion per direction: equality is refinement both ways
pub fn refinement_assertions(
    spec: &Specification,
    property: &RefinementProperty,
    handler: &mut DiagnosticHandler,
) -> Vec<String> {
    match property.op {
        RefinementOp::Refines => vec![refinement_assertion(spec, property, handler)],
        RefinementOp::Equals => vec![
            refinement_assertion(spec, property, handler),
            refinement_assertion(spec, &property.swapped(), handler),
        ],
    }
}

pub fn core_assertion(
    spec: &Specification,
    property: &CoreProperty,
    handler: &mut DiagnosticHandler,
) -> String {
    let subject = side(spec, &property.subject, property.model, handler);
    let not = negation(property.negated);
    match property.kind {
        CoreKind::Deterministic => format!("assert {not}{subject} :[deterministic]"),
        CoreKind::DeadlockFree => format!("assert {not}{subject} :[deadlock free]"),
        CoreKind::DivergenceFree => format!("assert {not}{subject} :[divergence free]"),
        CoreKind::TimelockFree => {
            format!("assert {not}RUN({{tock}}) ||| CHAOS(diff(Events, {{tock}})) [F= {subject}")
        }
    }
}

/// A sequence property as the refinement it stands for. Holding means the
/// target refines the interaction, being observed means the converse.
pub fn sequence_refinement(spec: &Specification, property: &SequenceProperty) -> Option<RefinementProperty> {
    let group = spec[property.interaction].group?;
    let interaction = ProcessSource::Interaction(property.interaction);
    let target = ProcessSource::Target(group);
    let (lhs, rhs) = match property.kind {
        SequenceKind::Holds => (target, interaction),
        SequenceKind::Observed => (interaction, target),
    };
    Some(RefinementProperty {
        model: property.model,
        op: RefinementOp::Refines,
        negated: property.negated,
        lhs,
        rhs,
    })
}

/// Every assertion `property` generates
pub fn assertions(
    spec: &Specification,
    property: &Property,
    handler: &mut DiagnosticHandler,
) -> Vec<String> {
    match property {
        Property::Refinement(refinement) => refinement_assertions(spec, refinement, handler),
        Property::Core(core) => vec![core_assertion(spec, core, handler)],
        Property::Sequence(sequence) => match sequence_refinement(spec, sequence) {
            Some(refinement) => refinement_assertions(spec, &refinement, handler),
            None => {
                let name = &spec[sequence.interaction].name;
                warn!("interaction {name} is not part of a group, skipping its sequence property");
                handler.emit_diagnostic(
                    &format!("Warning in interaction {name}"),
                    "sequence property on an interaction outside of any group",
                    Level::Warning,
                );
                vec![]
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::tests::build_pick_interaction;

    fn refinement(fx: &crate::ir::tests::Fixture, op: RefinementOp, model: SemanticModel, negated: bool) -> Property {
        Property::Refinement(RefinementProperty {
            model,
            op,
            negated,
            lhs: ProcessSource::Target(fx.group),
            rhs: ProcessSource::Interaction(fx.interaction),
        })
    }

    #[test]
    fn process_names() {
        let mut fx = build_pick_interaction();
        let csp = fx.spec.add_csp(
            fx.group,
            CspFragment::new("Spec".to_string(), "STOP".to_string(), None),
        );
        let mut handler = DiagnosticHandler::default();
        let name = |source: ProcessSource, handler: &mut DiagnosticHandler| process_name(&fx.spec, &source, handler);
        assert_eq!(name(ProcessSource::Interaction(fx.interaction), &mut handler), "Seqs::Pick::Main");
        assert_eq!(name(ProcessSource::Target(fx.group), &mut handler), "Seqs::Target");
        assert_eq!(name(ProcessSource::Csp(csp), &mut handler), "Seqs::Spec");
        assert_eq!(handler.warnings(), 0);
    }

    #[test]
    fn missing_target_is_a_placeholder() {
        let mut spec = Specification::new("Pkg".to_string());
        let group = spec.add_group(Group::new(Some("Bare".to_string())));
        let mut handler = DiagnosticHandler::default();
        assert_eq!(
            process_name(&spec, &ProcessSource::Target(group), &mut handler),
            "STOP {- Bare has no target -}"
        );
        assert_eq!(handler.warnings(), 1);
    }

    #[test]
    fn refines_in_trace_model() {
        let fx = build_pick_interaction();
        let mut handler = DiagnosticHandler::default();
        let property = refinement(&fx, RefinementOp::Refines, SemanticModel::Trace, false);
        assert_eq!(
            assertions(&fx.spec, &property, &mut handler),
            vec!["assert Seqs::Pick::Main [T= Seqs::Target :[tau priority]: {tock}"]
        );
    }

    #[test]
    fn equality_expands_to_both_directions() {
        let fx = build_pick_interaction();
        let mut handler = DiagnosticHandler::default();
        let property = refinement(&fx, RefinementOp::Equals, SemanticModel::Timed, true);
        assert_eq!(
            assertions(&fx.spec, &property, &mut handler),
            vec![
                "assert not Seqs::TT(Seqs::Pick::Main) [T= Seqs::TT(Seqs::Target)",
                "assert not Seqs::TT(Seqs::Target) [T= Seqs::TT(Seqs::Pick::Main)",
            ]
        );
    }

    #[test]
    fn core_properties() {
        let fx = build_pick_interaction();
        let mut handler = DiagnosticHandler::default();
        let core = |kind, model, negated| CoreProperty {
            kind,
            model,
            negated,
            subject: ProcessSource::Interaction(fx.interaction),
        };
        assert_eq!(
            core_assertion(&fx.spec, &core(CoreKind::Deterministic, SemanticModel::Trace, false), &mut handler),
            "assert Seqs::Pick::Main :[deterministic]"
        );
        assert_eq!(
            core_assertion(&fx.spec, &core(CoreKind::DeadlockFree, SemanticModel::Timed, true), &mut handler),
            "assert not Seqs::TT(Seqs::Pick::Main) :[deadlock free]"
        );
        assert_eq!(
            core_assertion(&fx.spec, &core(CoreKind::DivergenceFree, SemanticModel::Trace, false), &mut handler),
            "assert Seqs::Pick::Main :[divergence free]"
        );
        assert_eq!(
            core_assertion(&fx.spec, &core(CoreKind::TimelockFree, SemanticModel::Timed, false), &mut handler),
            "assert RUN({tock}) ||| CHAOS(diff(Events, {tock})) [F= Seqs::TT(Seqs::Pick::Main)"
        );
    }

    #[test]
    fn sequence_properties() {
        let fx = build_pick_interaction();
        let mut handler = DiagnosticHandler::default();
        let sequence = |kind| {
            Property::Sequence(SequenceProperty {
                kind,
                model: SemanticModel::Trace,
                negated: false,
                interaction: fx.interaction,
            })
        };
        assert_eq!(
            assertions(&fx.spec, &sequence(SequenceKind::Holds), &mut handler),
            vec!["assert Seqs::Pick::Main [T= Seqs::Target :[tau priority]: {tock}"]
        );
        assert_eq!(
            assertions(&fx.spec, &sequence(SequenceKind::Observed), &mut handler),
            vec!["assert Seqs::Target [T= Seqs::Pick::Main :[tau priority]: {tock}"]
        );
    }
}
