// Copyright 2025 Cornell University
// released under MIT License

//! Storage for the local variables of an interaction.
//!
//! Every interaction with variables gets a `Memory_<name>` module holding a
//! process that answers `get_x!x` and accepts `set_x?x'` for each variable.
//! Lifelines thread values in and out through `loads` / `stores` prefixes.

use itertools::Itertools;
use log::warn;

use crate::csp::{self, Module};
use crate::ir::*;

/// Namespace used for variables that are not scoped to any interaction.
/// The front-end never produces those; we keep generating regardless.
pub const ORPHAN_MEMORY: &str = "Memory_Orphan";

pub fn memory_namespace(interaction_name: &str) -> String {
    format!("Memory_{interaction_name}")
}

/// The memory namespace `var` lives in
pub fn var_namespace(spec: &Specification, var: VarId) -> String {
    let variable = &spec.symbols[var];
    match variable.owner() {
        Some(owner) => memory_namespace(&spec[owner].name),
        None => {
            warn!(
                "variable `{}` is not scoped to an interaction, using {ORPHAN_MEMORY}",
                variable.name()
            );
            ORPHAN_MEMORY.to_string()
        }
    }
}

fn get_channel(name: &str) -> String {
    format!("get_{name}")
}

fn set_channel(name: &str) -> String {
    format!("set_{name}")
}

/// Reads every distinct variable in `refs` out of memory, in order of first
/// occurrence: `Memory_I::get_x?x -> `. No references yield the empty string.
pub fn loads(spec: &Specification, refs: &[VarId]) -> String {
    refs.iter()
        .unique()
        .map(|var| {
            let name = spec.symbols[var].name();
            let channel = csp::qualify(&var_namespace(spec, *var), &get_channel(name));
            format!("{channel}?{name} -> ")
        })
        .collect()
}

/// Writes every distinct variable in `refs` back to memory, in order of first
/// occurrence: `Memory_I::set_x!x -> `. No references yield the empty string.
pub fn stores(spec: &Specification, refs: &[VarId]) -> String {
    refs.iter()
        .unique()
        .map(|var| {
            let name = spec.symbols[var].name();
            let channel = csp::qualify(&var_namespace(spec, *var), &set_channel(name));
            format!("{channel}!{name} -> ")
        })
        .collect()
}

/// All memory channels of an interaction, qualified
pub fn memory_channels(spec: &Specification, interaction: InteractionId) -> Vec<String> {
    let it = &spec[interaction];
    let namespace = memory_namespace(&it.name);
    it.variables
        .iter()
        .flat_map(|var| {
            let name = spec.symbols[var].name();
            [
                csp::qualify(&namespace, &get_channel(name)),
                csp::qualify(&namespace, &set_channel(name)),
            ]
        })
        .collect()
}

/// The memory module of `interaction`, or `None` if it has no variables
pub fn memory_module(spec: &Specification, interaction: InteractionId) -> Option<Module> {
    let it = &spec[interaction];
    if it.variables.is_empty() {
        return None;
    }

    let vars: Vec<&Variable> = it.variables.iter().map(|v| &spec.symbols[v]).collect();
    let mut module = Module::new(memory_namespace(&it.name));
    for var in &vars {
        module.add_public(csp::channel(
            &[get_channel(var.name()), set_channel(var.name())],
            Some(var.tpe().to_string().as_str()),
        ));
    }

    let params: Vec<&str> = vars.iter().map(|var| var.name()).collect();
    let state = csp::apply("Memory", &params);
    let mut branches = vec![];
    for (ii, var) in vars.iter().enumerate() {
        let name = var.name();
        branches.push(format!("{}!{name} -> {state}", get_channel(name)));
        let mut updated = params.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        updated[ii] = format!("{name}'");
        branches.push(format!(
            "{}?{name}' -> {}",
            set_channel(name),
            csp::apply("Memory", &updated)
        ));
    }
    let memory = format!(
        "{state} =\n{}",
        csp::indent(&branches.join("\n[] "), 1)
    );

    let init = csp::let_within(&[memory], &initial_state(&vars));
    module.add_public(format!("Init =\n{}", csp::indent(&init, 1)));
    Some(module)
}

/// Numbers start at zero and booleans false; variables of user-declared
/// types start with any value of their type.
fn initial_state(vars: &[&Variable]) -> String {
    let mut binders = String::new();
    let mut args = vec![];
    for var in vars {
        match var.tpe() {
            Type::Nat | Type::Int => args.push("0".to_string()),
            Type::Bool => args.push("false".to_string()),
            Type::Named(tpe) => {
                binders.push_str(&format!("|~| {} : {tpe} @ ", var.name()));
                args.push(var.name().to_string());
            }
        }
    }
    format!("{binders}{}", csp::apply("Memory", &args))
}
