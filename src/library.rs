// Copyright 2025 Cornell University
// released under MIT License

//! The CSP-M library every generated group file includes. It defines the
//! processes headers refer to (`Loop`, `BoundedLoop*`, `Duration*`,
//! `Deadline`, `AnyUntil`, `WAIT`) and the channels shared by all
//! interactions.
//!
//! Time passes on `tock`, which every lifeline synchronises on. A process
//! waiting for its next event lets time pass through `Idle`, and a finished
//! process idles in `Finish` until all of its peers agree on `finish`.

use crate::csp::{self, Module};
use crate::generator::GeneratorConfig;
use crate::ticktock::EMPTY_CONTEXT;

const LOOPS: &[(&str, &str)] = &[
    ("Loop(P)", "P; Loop(P)"),
    ("LoopStar(P)", "SKIP [] (P; LoopStar(P))"),
    (
        "BoundedLoop(n)(P)",
        "if n > 0 then P; BoundedLoop(n - 1)(P) else SKIP",
    ),
    (
        "BoundedLoopUpper(n)(P)",
        "if n > 0 then SKIP [] (P; BoundedLoopUpper(n - 1)(P)) else SKIP",
    ),
    ("BoundedLoopLower(n)(P)", "BoundedLoop(n)(P); LoopStar(P)"),
    (
        "BoundedLoopRange(l, u)(P)",
        "BoundedLoop(l)(P); BoundedLoopUpper(u - l)(P)",
    ),
];

/// Library process letting time pass until its argument moves
pub const IDLE: &str = "Idle";
/// Library process a finished lifeline idles in
pub const FINISH: &str = "Finish";
/// Channel finished processes agree on before terminating together
pub const FINISH_CHANNEL: &str = "finish";

/// `Idle(process)`
pub fn idle(process: &str) -> String {
    csp::apply(IDLE, &[process])
}

/// Timers count the `tock`s of the process they constrain and agree with it
/// on `finish`
const TIMERS: &[(&str, &str)] = &[
    ("Idle(P)", "P [] tock -> Idle(P)"),
    ("Finish", "Idle(finish -> SKIP)"),
    ("WAIT(n)", "if n > 0 then tock -> WAIT(n - 1) else SKIP"),
    ("AtLeast(n)", "if n > 0 then tock -> AtLeast(n - 1) else Finish"),
    ("AtMost(n)", "finish -> SKIP [] (n > 0 & tock -> AtMost(n - 1))"),
    (
        "Between(l, u)",
        "if l > 0 then tock -> Between(l - 1, u - 1) else AtMost(u)",
    ),
];

const WRAPPERS: &[(&str, &str)] = &[
    ("Timed(T)(P)", "((P; Finish) [| {tock, finish} |] T) \\ {finish}"),
    ("DurationLower(l)(P)", "Timed(AtLeast(l))(P)"),
    ("DurationUpper(u)(P)", "Timed(AtMost(u))(P)"),
    ("DurationRange(l, u)(P)", "Timed(Between(l, u))(P)"),
    ("Deadline(n)(P)", "Timed(AtMost(n))(P)"),
    ("AnyUntil(E)(P)", "RUN(E) /\\ P"),
];

fn definitions(defs: &[(&str, &str)]) -> String {
    defs.iter()
        .map(|(name, body)| csp::definition(name, body))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The text of the library file
pub fn library(config: &GeneratorConfig) -> String {
    let mut sections = vec![];
    if config.header {
        sections.push(csp::comment(&format!(
            "{}: processes shared by generated interactions",
            config.library_file
        )));
    }
    sections.push(format!("include \"{}\"", config.tick_tock_file));
    sections.push(
        [
            csp::channel(&["tock"], None),
            csp::channel(&[FINISH_CHANNEL], None),
            csp::channel(&["terminate"], None),
            "datatype SyncDir = enter | leave".to_string(),
            csp::definition("NatMax", &config.nat_max.to_string()),
            "nametype Nat = {0..NatMax}".to_string(),
        ]
        .join("\n"),
    );
    sections.push(definitions(TIMERS));
    sections.push(definitions(LOOPS));
    sections.push(definitions(WRAPPERS));

    let mut empty = Module::new(EMPTY_CONTEXT);
    empty.add_public(csp::definition("TT(P)", "TTLift({}, P)"));
    sections.push(empty.to_string());

    let mut text = sections.join("\n\n");
    text.push('\n');
    text
}
