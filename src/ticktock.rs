// Copyright 2025 Cornell University
// released under MIT License

//! The tick-tock model shift. A timed refinement is checked in the trace
//! model by lifting both sides with `TTLift` over the events that form their
//! context. Each group with a target exports that context as `<Group>::TT`.

use log::debug;

use crate::csp;
use crate::generator::group_name;
use crate::ir::*;

/// Module of the lift used when a process has no resolvable context
pub const EMPTY_CONTEXT: &str = "EmptyContext";

/// The group whose target provides the tick-tock context of `source`.
/// A CSP fragment only has a context through its declared event set.
pub fn context_group(spec: &Specification, source: &ProcessSource) -> Option<GroupId> {
    let group = match source {
        ProcessSource::Interaction(id) => spec[*id].group,
        ProcessSource::Target(group) => Some(*group),
        ProcessSource::Csp(id) => match spec[*id].events {
            Some(EventSet::Interaction(interaction)) => spec[interaction].group,
            Some(EventSet::Target(group)) => Some(group),
            None => None,
        },
    };
    group.filter(|g| spec[*g].target.is_some())
}

/// Namespace of the `TT` lift for `source`
pub fn context_namespace(spec: &Specification, source: &ProcessSource) -> String {
    match context_group(spec, source) {
        Some(group) => group_name(spec, group),
        None => {
            debug!("no tick-tock context for {source:?}, lifting with {EMPTY_CONTEXT}");
            EMPTY_CONTEXT.to_string()
        }
    }
}

/// `<Ctx>::TT(process)` in the timed model, `process` otherwise
pub fn lift(
    spec: &Specification,
    source: &ProcessSource,
    process: &str,
    model: SemanticModel,
) -> String {
    match model {
        SemanticModel::Trace => process.to_string(),
        SemanticModel::Timed => {
            let tt = csp::qualify(&context_namespace(spec, source), "TT");
            csp::apply(&tt, &[process])
        }
    }
}

/// The definitions a group module exports for its target's context
pub fn context_definitions(target: &Target) -> Vec<String> {
    vec![
        csp::definition("Context", &csp::event_set(&target.channels)),
        csp::definition("TT(P)", "TTLift(Context, P)"),
    ]
}
