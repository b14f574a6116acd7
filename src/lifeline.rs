// Copyright 2025 Cornell University
// released under MIT License

//! Projection of an interaction onto its lifelines.
//!
//! Each lifeline only sees the occurrences it takes part in. The projections
//! are composed in generalized parallel, synchronising on the message events
//! the lifelines exchange, on `tock` and `finish`, and on the handshakes that
//! keep until and par fragments in step. Every message waits in `Idle` so
//! that one lifeline never stops the clock of another.

use itertools::Itertools;
use log::{debug, warn};

use crate::context::{InteractionContext, LifelineContext};
use crate::csp::{self, Module, SKIP, STOP};
use crate::diagnostic::{DiagnosticHandler, Level};
use crate::headers::{
    deadline_header, duration_header, loop_header, topic_channel, until_header, Header,
};
use crate::ir::*;
use crate::library::{idle, FINISH, FINISH_CHANNEL};
use crate::memory;
use crate::serialize::{referenced_vars, serialize_expr};
use crate::until;

/// Renders the fragments of one interaction for any `LifelineContext`.
pub struct Projection<'a> {
    spec: &'a Specification,
    ctx: &'a InteractionContext,
    handler: &'a mut DiagnosticHandler,
}

impl<'a> Projection<'a> {
    pub fn new(
        spec: &'a Specification,
        ctx: &'a InteractionContext,
        handler: &'a mut DiagnosticHandler,
    ) -> Self {
        Self { spec, ctx, handler }
    }

    fn it(&self) -> &'a Interaction {
        &self.spec[self.ctx.interaction]
    }

    fn st(&self) -> &'a SymbolTable {
        &self.spec.symbols
    }

    pub fn context(&self) -> &'a InteractionContext {
        self.ctx
    }

    pub fn interaction(&self) -> &'a Interaction {
        self.it()
    }

    fn expr(&self, e: ExprId) -> String {
        serialize_expr(self.it(), self.st(), e)
    }

    fn loads_of(&self, exprs: impl IntoIterator<Item = ExprId>) -> String {
        let refs: Vec<VarId> = exprs
            .into_iter()
            .flat_map(|e| referenced_vars(self.it(), e))
            .collect();
        memory::loads(self.spec, &refs)
    }

    /// Channels an until fragment over every message must leave alone: the
    /// clock, the handshakes and the memory of the interaction
    pub fn internal_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = ["tock", FINISH_CHANNEL, "terminate"]
            .into_iter()
            .chain(self.ctx.sync_channels())
            .map(str::to_string)
            .collect();
        channels.extend(memory::memory_channels(self.spec, self.ctx.interaction));
        channels
    }

    /// The whole interaction as seen from `lctx`
    pub fn process(&mut self, lctx: &LifelineContext) -> String {
        let body = &self.it().body;
        self.fragments(lctx, body)
            .unwrap_or_else(|| SKIP.to_string())
    }

    /// `fragments` in sequence, `None` if none of them is relevant to `lctx`
    pub fn fragments(&mut self, lctx: &LifelineContext, fragments: &[FragmentId]) -> Option<String> {
        let parts: Vec<String> = fragments
            .iter()
            .filter_map(|id| self.fragment(lctx, *id))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(lctx.handle_sequential(parts))
        }
    }

    /// A single fragment, `None` if it is irrelevant to `lctx`
    pub fn fragment(&mut self, lctx: &LifelineContext, id: FragmentId) -> Option<String> {
        let it = self.it();
        match &it[id] {
            Fragment::Occurrence(occurrence) => self.occurrence(lctx, id, occurrence),
            Fragment::Block(block) => self.block(lctx, id, block),
            Fragment::Operand(operand) => {
                let body = self.fragments(lctx, &operand.fragments)?;
                Some(match operand.guard {
                    Some(guard) => format!(
                        "{}{}",
                        self.loads_of([guard]),
                        csp::guard(&self.expr(guard), &enclose(&body))
                    ),
                    None => body,
                })
            }
        }
    }

    fn occurrence(
        &mut self,
        lctx: &LifelineContext,
        id: FragmentId,
        occurrence: &Occurrence,
    ) -> Option<String> {
        match occurrence {
            Occurrence::Message(message) => {
                if lctx.is_for(message.from) || lctx.is_for(message.to) {
                    Some(self.message(lctx, message))
                } else {
                    None
                }
            }
            Occurrence::Wait { actor, units } => lctx.is_for(*actor).then(|| {
                format!(
                    "{}{}",
                    self.loads_of([*units]),
                    csp::apply("WAIT", &[self.expr(*units)])
                )
            }),
            Occurrence::Deadlock { actor } => lctx.is_for(*actor).then(|| STOP.to_string()),
            Occurrence::Create { actor, created } => {
                if lctx.is_for(*actor) || lctx.is_for(*created) {
                    Some(self.unsupported(id, "lifeline creation"))
                } else {
                    None
                }
            }
        }
    }

    /// `loads -> Idle(channel.dir.args -> stores SKIP)`
    fn message(&self, lctx: &LifelineContext, message: &Message) -> String {
        let it = self.it();
        let st = self.st();
        let mut args = String::new();
        let mut binds = vec![];
        let mut exprs = vec![];
        for arg in &message.args {
            match arg {
                MessageArg::Expr(e) => {
                    exprs.push(*e);
                    match it[e] {
                        Expr::Unary(..) | Expr::Binary(..) => {
                            args.push_str(&format!(".({})", self.expr(*e)))
                        }
                        _ => args.push_str(&format!(".{}", self.expr(*e))),
                    }
                }
                MessageArg::Bind(var) => {
                    binds.push(*var);
                    args.push_str(&format!("?{}", st[var].name()));
                }
                MessageArg::Wildcard => args.push_str("?_"),
            }
        }
        let event = format!("{}{args}", message_event(st, message));
        let stores = if lctx.stores_for(st, message) {
            memory::stores(self.spec, &binds)
        } else {
            String::new()
        };
        format!(
            "{}{}",
            self.loads_of(exprs),
            idle(&format!("{event} -> {stores}{SKIP}"))
        )
    }

    fn block(&mut self, lctx: &LifelineContext, id: FragmentId, block: &Block) -> Option<String> {
        let it = self.it();
        let st = self.st();
        match block {
            Block::Loop { bound, body } => {
                let body = self.fragment(lctx, *body)?;
                let loads = self.loads_of(bound.iter().flat_map(|b| b.lower.into_iter().chain(b.upper)));
                Some(format!("{loads}{}", loop_header(it, st, bound.as_ref()).wrap(&body)))
            }
            Block::Branch { kind, operands } => self.branch(lctx, *kind, operands),
            Block::Par { operands } => {
                let arms: Vec<Option<String>> = operands
                    .iter()
                    .map(|operand| self.fragment(lctx, *operand))
                    .collect();
                let par = self.ctx.par();
                let synchronised = lctx.synchronises() && par.is_required();
                if !synchronised && arms.iter().all(Option::is_none) {
                    return None;
                }
                let arms: Vec<String> = arms
                    .into_iter()
                    .map(|arm| arm.unwrap_or_else(|| SKIP.to_string()))
                    .collect();
                let body = csp::interleave(&arms);
                if synchronised {
                    let body = if arms.len() > 1 { body } else { format!("({body})") };
                    Some(csp::seq(&[
                        idle(&csp::prefix(&par.enter(id), &body)),
                        idle(&csp::prefix(&par.leave(id), SKIP)),
                    ]))
                } else {
                    Some(body)
                }
            }
            Block::Duration { actor, bound, body } => {
                let body = self.owned_body(lctx, *actor, *body)?;
                if lctx.is_for(*actor) {
                    let loads = self.loads_of(bound.lower.into_iter().chain(bound.upper));
                    Some(format!("{loads}{}", duration_header(it, st, bound).wrap(&body)))
                } else {
                    Some(body)
                }
            }
            Block::Deadline { actor, units, body } => {
                let body = self.owned_body(lctx, *actor, *body)?;
                let header = deadline_header(it, st, lctx, *actor, *units);
                let loads = match header {
                    Header::Call { .. } => self.loads_of([*units]),
                    Header::Inert(_) => String::new(),
                };
                Some(format!("{loads}{}", header.wrap(&body)))
            }
            Block::Until { intra, body } => {
                let sync = self.ctx.until();
                if lctx.synchronises() && sync.is_required() {
                    Some(until::handshake(sync, id))
                } else {
                    let body = self
                        .fragment(&LifelineContext::Until, *body)
                        .unwrap_or_else(|| SKIP.to_string());
                    Some(until_header(intra, &self.internal_channels()).wrap(&body))
                }
            }
            Block::Critical { body } => {
                self.fragment(lctx, *body)?;
                Some(self.unsupported(id, "critical region"))
            }
        }
    }

    /// The body of a duration or deadline. Its owner keeps the timer even
    /// when it takes no part in the body, timing an empty one.
    fn owned_body(&mut self, lctx: &LifelineContext, owner: ActorId, body: FragmentId) -> Option<String> {
        match self.fragment(lctx, body) {
            Some(body) => Some(body),
            None if lctx.is_for(owner) => {
                debug!("{} times a fragment it takes no part in", self.st()[owner].name());
                Some(SKIP.to_string())
            }
            None => None,
        }
    }

    fn branch(
        &mut self,
        lctx: &LifelineContext,
        kind: BranchKind,
        operands: &[FragmentId],
    ) -> Option<String> {
        let it = self.it();
        let mut guards = vec![];
        let mut arms = vec![];
        let mut relevant = false;
        for &operand in operands {
            let (guard, fragments) = match &it[operand] {
                Fragment::Operand(op) => (op.guard, op.fragments.clone()),
                _ => (None, vec![operand]),
            };
            let body = self.fragments(lctx, &fragments);
            relevant |= body.is_some();
            let body = body.unwrap_or_else(|| SKIP.to_string());
            match guard {
                Some(guard) => {
                    guards.push(guard);
                    arms.push(csp::guard(&self.expr(guard), &enclose(&body)));
                }
                None => arms.push(body),
            }
        }
        if !relevant {
            return None;
        }
        let choice = match kind {
            BranchKind::Alt => csp::external_choice(&arms),
            BranchKind::XAlt => csp::internal_choice(&arms),
            BranchKind::Opt => {
                arms.push(SKIP.to_string());
                csp::external_choice(&arms)
            }
        };
        Some(format!("{}{choice}", self.loads_of(guards)))
    }

    fn unsupported(&mut self, id: FragmentId, what: &str) -> String {
        let it = self.it();
        warn!("{what} in interaction {} is not supported, generating STOP", it.name);
        self.handler.emit_diagnostic_fragment(
            self.ctx.interaction,
            it,
            id,
            &format!("{what} is not supported, generating STOP"),
            Level::Warning,
        );
        format!("{STOP} {}", csp::comment(&format!("unsupported: {what}")))
    }

    /// The composition of all lifeline processes and the until process, if
    /// there is one
    pub fn composition(&self) -> String {
        let mut items: Vec<Participant> = self
            .ctx
            .lifelines()
            .iter()
            .map(|l| Participant::Lifeline(*l))
            .collect();
        if self.ctx.until().is_required() {
            items.push(Participant::UntilSync);
        }
        let links = message_links(self.it(), self.st());
        csp::generalized_parallel(
            &items,
            |item| match item {
                Participant::Lifeline(actor) => lifeline_name(self.st(), *actor),
                Participant::UntilSync => until::UNTIL_PROCESS.to_string(),
            },
            |item, rest| match (item, &rest[0]) {
                (_, Participant::UntilSync) => {
                    csp::event_set(&[self.ctx.until().channel(), FINISH_CHANNEL])
                }
                (Participant::Lifeline(current), Participant::Lifeline(next)) => {
                    let lifelines = self.ctx.lifelines();
                    let k = lifelines
                        .iter()
                        .position(|l| l == current)
                        .unwrap_or(lifelines.len() - 1);
                    self.lifeline_label(&links, &lifelines[..=k], *next)
                }
                (Participant::UntilSync, _) => {
                    unreachable!("the until process is always composed last")
                }
            },
        )
    }

    /// What the lifelines in `left` synchronise on with `right`: the events
    /// of the messages exchanged between them, time, termination and the
    /// handshakes. Messages with the world are performed alone.
    fn lifeline_label(&self, links: &[Link], left: &[ActorId], right: ActorId) -> String {
        let mut events: Vec<String> = links
            .iter()
            .filter(|link| {
                (left.contains(&link.from) && link.to == right)
                    || (left.contains(&link.to) && link.from == right)
            })
            .map(|link| link.event.clone())
            .unique()
            .collect();
        events.push("tock".to_string());
        events.push(FINISH_CHANNEL.to_string());
        events.extend(self.ctx.sync_channels().into_iter().map(str::to_string));
        csp::event_set(&events)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Participant {
    Lifeline(ActorId),
    UntilSync,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Link {
    from: ActorId,
    to: ActorId,
    /// `channel.dir`, without arguments
    event: String,
}

/// `channel.in` for messages sent by the world, `channel.out` otherwise
fn message_event(st: &SymbolTable, message: &Message) -> String {
    let dir = if st[message.from].is_world() { "in" } else { "out" };
    format!("{}.{dir}", topic_channel(&message.topic))
}

/// Messages performed by the lifelines themselves. Messages inside until
/// fragments are left out, the until process performs those.
fn message_links(it: &Interaction, st: &SymbolTable) -> Vec<Link> {
    let mut out = vec![];
    collect_links(it, st, &it.body, &mut out);
    out
}

fn collect_links(it: &Interaction, st: &SymbolTable, fragments: &[FragmentId], out: &mut Vec<Link>) {
    for id in fragments {
        match &it[id] {
            Fragment::Occurrence(Occurrence::Message(message)) => out.push(Link {
                from: message.from,
                to: message.to,
                event: message_event(st, message),
            }),
            Fragment::Occurrence(_) => {}
            Fragment::Operand(operand) => collect_links(it, st, &operand.fragments, out),
            Fragment::Block(Block::Until { .. }) => {}
            Fragment::Block(Block::Branch { operands, .. })
            | Fragment::Block(Block::Par { operands }) => collect_links(it, st, operands, out),
            Fragment::Block(Block::Loop { body, .. })
            | Fragment::Block(Block::Duration { body, .. })
            | Fragment::Block(Block::Deadline { body, .. })
            | Fragment::Block(Block::Critical { body }) => collect_links(it, st, &[*body], out),
        }
    }
}

/// Parenthesizes sequential compositions so that they can be guarded
fn enclose(process: &str) -> String {
    if process.contains("; ") {
        format!("({process})")
    } else {
        process.to_string()
    }
}

pub fn lifeline_name(st: &SymbolTable, actor: ActorId) -> String {
    format!("Lifeline_{}", st[actor].name())
}

/// `Main`: the lifelines run against the memory of the interaction, with
/// every internal channel hidden.
fn main_process(spec: &Specification, ctx: &InteractionContext) -> String {
    let it = &spec[ctx.interaction];
    let mut sync: Vec<String> = ctx.sync_channels().into_iter().map(str::to_string).collect();
    if !ctx.is_sequential() {
        sync.push(FINISH_CHANNEL.to_string());
    }
    let mem = memory::memory_channels(spec, ctx.interaction);
    if mem.is_empty() {
        return if sync.is_empty() {
            "Lifelines".to_string()
        } else {
            csp::hide("Lifelines", &csp::event_set(&sync))
        };
    }
    let mut shared = mem.clone();
    shared.push("terminate".to_string());
    let hidden: Vec<String> = sync.into_iter().chain(shared.iter().cloned()).collect();
    let init = csp::qualify(&memory::memory_namespace(&it.name), "Init");
    let composed = format!(
        "((Lifelines; terminate -> {SKIP}) [| {} |] ({init} /\\ terminate -> {SKIP}))",
        csp::event_set(&shared)
    );
    csp::hide(&composed, &csp::event_set(&hidden))
}

/// The module of an interaction. It exports `Main` and the channels the
/// lifelines synchronise on.
pub fn interaction_module(
    spec: &Specification,
    interaction: InteractionId,
    handler: &mut DiagnosticHandler,
) -> Module {
    let ctx = InteractionContext::new(spec, interaction);
    let it = &spec[interaction];
    let mut module = Module::new(it.name.clone());
    let mut projection = Projection::new(spec, &ctx, handler);

    if ctx.is_sequential() {
        debug!("{} has a single lifeline, generating it sequentially", it.name);
        let lctx = LifelineContext::Sequential(ctx.lifelines().first().copied());
        module.add_private(csp::definition("Lifelines", &projection.process(&lctx)));
    } else {
        for &lifeline in ctx.lifelines() {
            let body = match projection.fragments(&LifelineContext::Actor(lifeline), &it.body) {
                Some(body) => csp::seq(&[body.as_str(), FINISH]),
                None => FINISH.to_string(),
            };
            module.add_private(csp::definition(&lifeline_name(&spec.symbols, lifeline), &body));
        }
        if let Some(process) = until::until_process(&mut projection) {
            module.add_private(process);
        }
        module.add_private(csp::definition("Lifelines", &projection.composition()));
    }

    for declaration in [ctx.until().declaration(), ctx.par().declaration()]
        .into_iter()
        .flatten()
    {
        module.add_public(declaration);
    }
    module.add_public(csp::definition("Main", &main_process(spec, &ctx)));
    module
}
