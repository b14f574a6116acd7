// Copyright 2025 Cornell University
// released under MIT License

use rustc_hash::FxHashMap;

use crate::csp;
use crate::ir::*;

/// Kinds of fragments that need every lifeline to agree on when they start
/// and end
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum SyncKind {
    Until,
    Par,
}

impl SyncKind {
    /// base channel the handshakes of this kind happen on
    pub fn channel(&self) -> &'static str {
        match self {
            SyncKind::Until => "until",
            SyncKind::Par => "par",
        }
    }
}

/// The fragments of one `SyncKind` in an interaction, each with the index
/// that names it on the synchronisation channel (`<channel>.<index>.enter`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synchronisation {
    kind: SyncKind,
    fragments: Vec<FragmentId>,
    index: FxHashMap<FragmentId, usize>,
    required: bool,
}

impl Synchronisation {
    fn new(kind: SyncKind, fragments: Vec<FragmentId>, lifeline_count: usize) -> Self {
        let index = fragments
            .iter()
            .enumerate()
            .map(|(ii, id)| (*id, ii))
            .collect();
        let required = lifeline_count >= 2 && !fragments.is_empty();
        Self {
            kind,
            fragments,
            index,
            required,
        }
    }

    pub fn kind(&self) -> SyncKind {
        self.kind
    }

    /// Fragments in the order their indices were assigned
    pub fn fragments(&self) -> &[FragmentId] {
        &self.fragments
    }

    pub fn channel(&self) -> &'static str {
        self.kind.channel()
    }

    /// Whether the lifelines have to synchronise on these fragments.
    /// With fewer than two lifelines there is nobody to synchronise with.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The index assigned to `fragment`. Panics for fragments that were not
    /// recorded when the context was built.
    pub fn index_of(&self, fragment: FragmentId) -> usize {
        match self.index.get(&fragment) {
            Some(ii) => *ii,
            None => panic!(
                "{fragment} was not recorded as a {:?} fragment when the context was built",
                self.kind
            ),
        }
    }

    pub fn enter(&self, fragment: FragmentId) -> String {
        format!("{}.{}.enter", self.channel(), self.index_of(fragment))
    }

    pub fn leave(&self, fragment: FragmentId) -> String {
        format!("{}.{}.leave", self.channel(), self.index_of(fragment))
    }

    /// `channel until : {0..n-1}.SyncDir`, if the channel is needed at all
    pub fn declaration(&self) -> Option<String> {
        if !self.required {
            return None;
        }
        let tpe = format!("{{0..{}}}.SyncDir", self.fragments.len() - 1);
        Some(csp::channel(&[self.channel()], Some(tpe.as_str())))
    }
}

/// Facts about an interaction that every part of its generation must agree
/// on. Built exactly once per interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionContext {
    pub interaction: InteractionId,
    lifelines: Vec<ActorId>,
    until: Synchronisation,
    par: Synchronisation,
}

impl InteractionContext {
    pub fn new(spec: &Specification, interaction: InteractionId) -> Self {
        let it = &spec[interaction];
        let mut untils = vec![];
        let mut pars = vec![];
        collect_sync_fragments(it, &it.body, &mut untils, &mut pars);
        let lifelines = it.lifelines.clone();
        Self {
            interaction,
            until: Synchronisation::new(SyncKind::Until, untils, lifelines.len()),
            par: Synchronisation::new(SyncKind::Par, pars, lifelines.len()),
            lifelines,
        }
    }

    pub fn lifelines(&self) -> &[ActorId] {
        &self.lifelines
    }

    pub fn until(&self) -> &Synchronisation {
        &self.until
    }

    pub fn par(&self) -> &Synchronisation {
        &self.par
    }

    /// The synchronisation channels in use, in declaration order
    pub fn sync_channels(&self) -> Vec<&'static str> {
        [&self.until, &self.par]
            .into_iter()
            .filter(|sync| sync.is_required())
            .map(|sync| sync.channel())
            .collect()
    }

    /// Interactions with at most one lifeline are generated as a single
    /// sequential process instead of a composition of lifelines.
    pub fn is_sequential(&self) -> bool {
        self.lifelines.len() <= 1
    }
}

/// Records until and par fragments in pre-order. The bodies of until
/// fragments are not entered: they are always generated inline.
fn collect_sync_fragments(
    it: &Interaction,
    fragments: &[FragmentId],
    untils: &mut Vec<FragmentId>,
    pars: &mut Vec<FragmentId>,
) {
    for &id in fragments {
        match &it[id] {
            Fragment::Occurrence(_) => {}
            Fragment::Operand(operand) => collect_sync_fragments(it, &operand.fragments, untils, pars),
            Fragment::Block(block) => match block {
                Block::Until { .. } => untils.push(id),
                Block::Par { operands } => {
                    pars.push(id);
                    collect_sync_fragments(it, operands, untils, pars);
                }
                Block::Branch { operands, .. } => {
                    collect_sync_fragments(it, operands, untils, pars)
                }
                Block::Loop { body, .. }
                | Block::Duration { body, .. }
                | Block::Deadline { body, .. }
                | Block::Critical { body } => collect_sync_fragments(it, &[*body], untils, pars),
            },
        }
    }
}

/// Who a fragment is being generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifelineContext {
    /// The projection of one lifeline in an interaction with several
    Actor(ActorId),
    /// The whole interaction as one sequential process, used when there is
    /// at most one lifeline
    Sequential(Option<ActorId>),
    /// The body of an until fragment: every actor is relevant and nested
    /// until fragments are inlined
    Until,
}

impl LifelineContext {
    /// Whether occurrences at `actor` belong to this context
    pub fn is_for(&self, actor: ActorId) -> bool {
        match self {
            LifelineContext::Actor(lifeline) => *lifeline == actor,
            LifelineContext::Sequential(Some(lifeline)) => *lifeline == actor,
            LifelineContext::Sequential(None) => true,
            LifelineContext::Until => true,
        }
    }

    /// Puts the processes of consecutive fragments in sequence
    pub fn handle_sequential(&self, parts: Vec<String>) -> String {
        match self {
            LifelineContext::Actor(_) => csp::seq(&parts),
            LifelineContext::Sequential(_) => csp::seq(&parts),
            LifelineContext::Until => csp::seq(&parts),
        }
    }

    /// Whether this context writes the values received by `message` to
    /// memory. Only one lifeline may do so: the receiver, or the sender when
    /// the message goes to the world.
    pub fn stores_for(&self, st: &SymbolTable, message: &Message) -> bool {
        match self {
            LifelineContext::Actor(lifeline) => {
                if st[message.to].is_world() {
                    *lifeline == message.from
                } else {
                    *lifeline == message.to
                }
            }
            LifelineContext::Sequential(_) | LifelineContext::Until => true,
        }
    }

    /// Whether this context takes part in until/par handshakes rather than
    /// running those fragments itself
    pub fn synchronises(&self) -> bool {
        match self {
            LifelineContext::Actor(_) => true,
            LifelineContext::Sequential(_) | LifelineContext::Until => false,
        }
    }
}
