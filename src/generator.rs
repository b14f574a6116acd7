// Copyright 2025 Cornell University
// released under MIT License

use cranelift_entity::EntityRef;
use log::info;

use crate::csp::{self, Module, Renaming};
use crate::diagnostic::DiagnosticHandler;
use crate::errors::Result;
use crate::ir::*;
use crate::library::library;
use crate::lifeline::interaction_module;
use crate::memory::memory_module;
use crate::property::assertions;
use crate::ticktock::context_definitions;

/// Prefix of the names given to groups the user left untitled
pub const UNTITLED_PREFIX: &str = "Untitled_Group__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Name of the generated library, included by every group file
    pub library_file: String,
    /// The tick-tock semantics the library builds on
    pub tick_tock_file: String,
    /// Largest value of the `Nat` type in the generated models
    pub nat_max: u64,
    /// Whether to start files with a comment naming their origin
    pub header: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            library_file: "seqlib.csp".to_string(),
            tick_tock_file: "tick_tock.csp".to_string(),
            nat_max: 4,
            header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub contents: String,
}

/// The namespace of a group. Untitled groups are named after their position
/// and the specification; a user name that could clash with those is marked.
pub fn group_name(spec: &Specification, group: GroupId) -> String {
    match &spec[group].name {
        Some(name) if name.starts_with(UNTITLED_PREFIX) => format!("A_{name}"),
        Some(name) => name.clone(),
        None => format!("{UNTITLED_PREFIX}{}_{}", group.index(), spec.name),
    }
}

/// The module holding everything defined for a group
pub fn group_module(spec: &Specification, group: GroupId, handler: &mut DiagnosticHandler) -> Module {
    let g = &spec[group];
    let mut module = Module::new(group_name(spec, group));
    if let Some(target) = &g.target {
        for definition in context_definitions(target) {
            module.add_public(definition);
        }
        let renaming = Renaming::from_pairs(target.renaming.iter().cloned());
        module.add_public(csp::definition("Target", &renaming.apply_to(&target.process)));
    }
    for &fragment in &g.csp {
        let fragment = &spec[fragment];
        module.add_public(csp::definition(&fragment.name, &fragment.body));
    }
    for &interaction in &g.interactions {
        if let Some(memory) = memory_module(spec, interaction) {
            module.add_public(memory.to_string());
        }
    }
    for &interaction in &g.interactions {
        module.add_public(interaction_module(spec, interaction, handler).to_string());
    }
    module
}

/// The file of a group: its module followed by its assertions
pub fn group_file(
    spec: &Specification,
    group: GroupId,
    config: &GeneratorConfig,
    handler: &mut DiagnosticHandler,
) -> GeneratedFile {
    let name = group_name(spec, group);
    info!("generating group {name}");
    let mut sections = vec![];
    if config.header {
        sections.push(csp::comment(&format!("generated from {}, group {name}", spec.name)));
    }
    sections.push(format!("include \"{}\"", config.library_file));
    sections.push(group_module(spec, group, handler).to_string());
    let asserts: Vec<String> = spec[group]
        .properties
        .iter()
        .flat_map(|property| assertions(spec, property, handler))
        .collect();
    if !asserts.is_empty() {
        sections.push(asserts.join("\n"));
    }
    let mut contents = sections.join("\n\n");
    contents.push('\n');
    GeneratedFile {
        name: format!("{name}.csp"),
        contents,
    }
}

/// The file of the group the user named `name`
pub fn group_file_by_name(
    spec: &Specification,
    name: &str,
    config: &GeneratorConfig,
    handler: &mut DiagnosticHandler,
) -> Result<GeneratedFile> {
    let group = spec.group_by_name(name)?;
    Ok(group_file(spec, group, config, handler))
}

/// Generates the library followed by one file per group, in group order.
/// Constructs without semantics are reported to `handler` and replaced by
/// placeholders, so generation always produces every file.
pub fn generate(
    spec: &Specification,
    config: &GeneratorConfig,
    handler: &mut DiagnosticHandler,
) -> Vec<GeneratedFile> {
    let mut files = vec![GeneratedFile {
        name: config.library_file.clone(),
        contents: library(config),
    }];
    for group in spec.group_ids() {
        files.push(group_file(spec, group, config, handler));
    }
    info!("generated {} files for {}", files.len(), spec.name);
    files
}
