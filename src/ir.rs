// Copyright 2025 Cornell University
// released under MIT License

use cranelift_entity::{entity_impl, PrimaryMap, SecondaryMap};
use rustc_hash::FxHashMap;
use std::ops::Index;

use crate::errors::{GenerationError, Result};

/// A validated specification: every group, interaction and raw CSP fragment
/// that the generator turns into CSP-M, plus the symbols they refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    /// Name of the enclosing package, used to name untitled groups
    pub name: String,

    /// Actors, variables and constants referenced by the interactions
    pub symbols: SymbolTable,

    groups: PrimaryMap<GroupId, Group>,
    interactions: PrimaryMap<InteractionId, Interaction>,
    csp: PrimaryMap<CspId, CspFragment>,
}

impl Specification {
    pub fn new(name: String) -> Self {
        Self {
            name,
            symbols: SymbolTable::default(),
            groups: PrimaryMap::new(),
            interactions: PrimaryMap::new(),
            csp: PrimaryMap::new(),
        }
    }

    pub fn add_group(&mut self, group: Group) -> GroupId {
        self.groups.push(group)
    }

    /// Adds an interaction to `group`. The interaction's variables become
    /// owned by it, so that their memory channels live in its namespace.
    pub fn add_interaction(&mut self, group: GroupId, mut interaction: Interaction) -> InteractionId {
        interaction.group = Some(group);
        let variables = interaction.variables.clone();
        let id = self.interactions.push(interaction);
        for var in variables {
            self.symbols.set_owner(var, id);
        }
        self.groups[group].interactions.push(id);
        id
    }

    pub fn add_csp(&mut self, group: GroupId, mut fragment: CspFragment) -> CspId {
        fragment.group = group;
        let id = self.csp.push(fragment);
        self.groups[group].csp.push(id);
        id
    }

    pub fn add_property(&mut self, group: GroupId, property: Property) {
        self.groups[group].properties.push(property);
    }

    pub fn group_ids(&self) -> Vec<GroupId> {
        self.groups.keys().collect()
    }

    /// Looks up an interaction by its (unqualified) name
    pub fn interaction_by_name(&self, name: &str) -> Result<InteractionId> {
        self.interactions
            .iter()
            .find(|(_, interaction)| interaction.name == name)
            .map(|(id, _)| id)
            .ok_or_else(|| GenerationError::UnknownInteraction(name.to_string()))
    }

    /// Looks up a group by the name it was given by the user
    pub fn group_by_name(&self, name: &str) -> Result<GroupId> {
        self.groups
            .iter()
            .find(|(_, group)| group.name.as_deref() == Some(name))
            .map(|(id, _)| id)
            .ok_or_else(|| GenerationError::UnknownGroup(name.to_string()))
    }
}

impl Index<GroupId> for Specification {
    type Output = Group;

    fn index(&self, index: GroupId) -> &Self::Output {
        &self.groups[index]
    }
}

impl Index<InteractionId> for Specification {
    type Output = Interaction;

    fn index(&self, index: InteractionId) -> &Self::Output {
        &self.interactions[index]
    }
}

impl Index<&InteractionId> for Specification {
    type Output = Interaction;

    fn index(&self, index: &InteractionId) -> &Self::Output {
        &self.interactions[*index]
    }
}

impl Index<CspId> for Specification {
    type Output = CspFragment;

    fn index(&self, index: CspId) -> &Self::Output {
        &self.csp[index]
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct GroupId(u32);
entity_impl!(GroupId, "group");

/// A specification group: interactions, raw CSP processes and properties
/// checked against one target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    /// `None` for groups the user left untitled
    pub name: Option<String>,
    pub target: Option<Target>,
    pub interactions: Vec<InteractionId>,
    pub csp: Vec<CspId>,
    pub properties: Vec<Property>,
}

impl Group {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }
}

/// The system under verification, as provided by the name-qualification
/// service: a process expression, its channels and an optional renaming.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Target {
    pub process: String,
    /// Fully-qualified channels that make up the tick-tock context
    pub channels: Vec<String>,
    pub renaming: Vec<(String, String)>,
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct InteractionId(u32);
entity_impl!(InteractionId, "interaction");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    /// The name of the `Interaction`, also used as its module name
    pub name: String,

    /// The group the interaction was added to
    pub group: Option<GroupId>,

    /// Top-level fragments, in order
    pub body: Vec<FragmentId>,

    /// Visible actors other than the world, in declaration order
    pub lifelines: Vec<ActorId>,

    /// Local variables scoped to this interaction
    pub variables: Vec<VarId>,

    fragments: PrimaryMap<FragmentId, Fragment>,
    exprs: PrimaryMap<ExprId, Expr>,
    fragment_loc: SecondaryMap<FragmentId, Option<(usize, usize, usize)>>,
}

impl Interaction {
    pub fn new(name: String) -> Self {
        Self {
            name,
            group: None,
            body: Vec::default(),
            lifelines: Vec::default(),
            variables: Vec::default(),
            fragments: PrimaryMap::new(),
            exprs: PrimaryMap::new(),
            fragment_loc: SecondaryMap::new(),
        }
    }

    /// add a new fragment to the interaction
    pub fn f(&mut self, fragment: Fragment) -> FragmentId {
        self.fragments.push(fragment)
    }

    /// add a new expression to the interaction
    pub fn e(&mut self, expr: Expr) -> ExprId {
        self.exprs.push(expr)
    }

    /// add an unguarded operand holding `fragments`
    pub fn operand(&mut self, fragments: Vec<FragmentId>) -> FragmentId {
        self.f(Fragment::Operand(Operand {
            guard: None,
            fragments,
        }))
    }

    pub fn add_fragment_loc(&mut self, id: FragmentId, start: usize, end: usize, fileid: usize) {
        self.fragment_loc[id] = Some((start, end, fileid));
    }

    pub fn get_fragment_loc(&self, id: FragmentId) -> Option<(usize, usize, usize)> {
        self.fragment_loc.get(id).copied().flatten()
    }
}

impl Index<FragmentId> for Interaction {
    type Output = Fragment;

    fn index(&self, index: FragmentId) -> &Self::Output {
        &self.fragments[index]
    }
}

impl Index<&FragmentId> for Interaction {
    type Output = Fragment;

    fn index(&self, index: &FragmentId) -> &Self::Output {
        &self.fragments[*index]
    }
}

impl Index<ExprId> for Interaction {
    type Output = Expr;

    fn index(&self, index: ExprId) -> &Self::Output {
        &self.exprs[index]
    }
}

impl Index<&ExprId> for Interaction {
    type Output = Expr;

    fn index(&self, index: &ExprId) -> &Self::Output {
        &self.exprs[*index]
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct FragmentId(u32);
entity_impl!(FragmentId, "fragment");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Occurrence(Occurrence),
    Block(Block),
    Operand(Operand),
}

/// Something that happens at one point of a lifeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occurrence {
    Message(Message),
    Wait { actor: ActorId, units: ExprId },
    Deadlock { actor: ActorId },
    /// Lifeline creation. Accepted by the front-end but has no semantics yet.
    Create { actor: ActorId, created: ActorId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Loop {
        bound: Option<Bound>,
        body: FragmentId,
    },
    Branch {
        kind: BranchKind,
        operands: Vec<FragmentId>,
    },
    Par {
        operands: Vec<FragmentId>,
    },
    Duration {
        actor: ActorId,
        bound: Bound,
        body: FragmentId,
    },
    Deadline {
        actor: ActorId,
        units: ExprId,
        body: FragmentId,
    },
    Until {
        intra: MessageSet,
        body: FragmentId,
    },
    /// Critical region. Accepted by the front-end but has no semantics yet.
    Critical {
        body: FragmentId,
    },
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum BranchKind {
    /// external choice between the operands
    Alt,
    /// internal choice between the operands
    XAlt,
    /// single operand that may be skipped
    Opt,
}

/// One arm of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub guard: Option<ExprId>,
    pub fragments: Vec<FragmentId>,
}

/// Optional lower and upper bound of a loop or duration.
/// The front-end guarantees at least one side is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub lower: Option<ExprId>,
    pub upper: Option<ExprId>,
}

impl Bound {
    pub fn new(lower: Option<ExprId>, upper: Option<ExprId>) -> Self {
        Self { lower, upper }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: ActorId,
    pub to: ActorId,
    pub topic: Topic,
    pub args: Vec<MessageArg>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Topic {
    /// a (fully-qualified) event channel
    Event(String),
    /// a (fully-qualified) operation, called through `<name>Call`
    Operation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageArg {
    Expr(ExprId),
    /// receives the value into a variable
    Bind(VarId),
    Wildcard,
}

/// The events an `until` fragment lets happen before its body takes over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSet {
    Empty,
    Universe,
    Topics(Vec<Topic>),
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct ExprId(u32);
entity_impl!(ExprId, "expr");

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Expr {
    // nullary
    Nat(u64),
    Bool(bool),
    Var(VarId),
    Const(ConstId),
    // unary
    Unary(UnaryOp, ExprId),
    // binary
    Binary(BinOp, ExprId, ExprId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Nat,
    Int,
    Bool,
    /// A user-declared (finite) type, referred to by its qualified name
    Named(String),
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct ActorId(u32);
entity_impl!(ActorId, "actor");

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ActorKind {
    World,
    Target,
    Component,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    name: String,
    kind: ActorKind,
}

impl Actor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    pub fn is_world(&self) -> bool {
        self.kind == ActorKind::World
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct VarId(u32);
entity_impl!(VarId, "var");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    tpe: Type,
    owner: Option<InteractionId>,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tpe(&self) -> &Type {
        &self.tpe
    }

    /// The interaction the variable is scoped to
    pub fn owner(&self) -> Option<InteractionId> {
        self.owner
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct ConstId(u32);
entity_impl!(ConstId, "const");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    name: String,
    qualified_name: String,
}

impl Constant {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct SymbolTable {
    actors: PrimaryMap<ActorId, Actor>,
    actors_by_name: FxHashMap<String, ActorId>,
    vars: PrimaryMap<VarId, Variable>,
    consts: PrimaryMap<ConstId, Constant>,
}

impl SymbolTable {
    pub fn add_actor(&mut self, name: String, kind: ActorKind) -> ActorId {
        assert!(
            !self.actors_by_name.contains_key(&name),
            "we already have an actor named {name}!",
        );
        let id = self.actors.push(Actor {
            name: name.clone(),
            kind,
        });
        self.actors_by_name.insert(name, id);
        id
    }

    pub fn add_variable(&mut self, name: String, tpe: Type) -> VarId {
        self.vars.push(Variable {
            name,
            tpe,
            owner: None,
        })
    }

    pub fn add_constant(&mut self, name: String, qualified_name: String) -> ConstId {
        self.consts.push(Constant {
            name,
            qualified_name,
        })
    }

    pub(crate) fn set_owner(&mut self, var: VarId, owner: InteractionId) {
        self.vars[var].owner = Some(owner);
    }
}

impl Index<&str> for SymbolTable {
    type Output = Actor;

    fn index(&self, index: &str) -> &Self::Output {
        &self.actors[self.actors_by_name[index]]
    }
}

impl Index<ActorId> for SymbolTable {
    type Output = Actor;

    fn index(&self, index: ActorId) -> &Self::Output {
        &self.actors[index]
    }
}

impl Index<&ActorId> for SymbolTable {
    type Output = Actor;

    fn index(&self, index: &ActorId) -> &Self::Output {
        &self.actors[*index]
    }
}

impl Index<VarId> for SymbolTable {
    type Output = Variable;

    fn index(&self, index: VarId) -> &Self::Output {
        &self.vars[index]
    }
}

impl Index<&VarId> for SymbolTable {
    type Output = Variable;

    fn index(&self, index: &VarId) -> &Self::Output {
        &self.vars[*index]
    }
}

impl Index<ConstId> for SymbolTable {
    type Output = Constant;

    fn index(&self, index: ConstId) -> &Self::Output {
        &self.consts[index]
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct CspId(u32);
entity_impl!(CspId, "csp");

/// A process written directly in CSP-M by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspFragment {
    pub name: String,
    pub body: String,
    /// the group the fragment was added to
    pub group: GroupId,
    /// the events the process is declared over, if any
    pub events: Option<EventSet>,
}

impl CspFragment {
    pub fn new(name: String, body: String, events: Option<EventSet>) -> Self {
        Self {
            name,
            body,
            group: GroupId::default(),
            events,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSet {
    Interaction(InteractionId),
    Target(GroupId),
}

/// Anything that denotes a process in a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSource {
    Interaction(InteractionId),
    Target(GroupId),
    Csp(CspId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticModel {
    /// untimed traces
    Trace,
    /// tick-tock, checked through the model shift
    Timed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementOp {
    Refines,
    Equals,
}

/// `lhs refines rhs` (or `lhs equals rhs`) in the given model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefinementProperty {
    pub model: SemanticModel,
    pub op: RefinementOp,
    pub negated: bool,
    pub lhs: ProcessSource,
    pub rhs: ProcessSource,
}

impl RefinementProperty {
    /// A copy of this property with its sides exchanged
    pub fn swapped(&self) -> Self {
        Self {
            lhs: self.rhs,
            rhs: self.lhs,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreKind {
    Deterministic,
    DeadlockFree,
    DivergenceFree,
    TimelockFree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreProperty {
    pub kind: CoreKind,
    pub model: SemanticModel,
    pub negated: bool,
    pub subject: ProcessSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    /// every behaviour of the target is allowed by the interaction
    Holds,
    /// every behaviour of the interaction can be exhibited by the target
    Observed,
}

/// A property relating an interaction to the target of its group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceProperty {
    pub kind: SequenceKind,
    pub model: SemanticModel,
    pub negated: bool,
    pub interaction: InteractionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Refinement(RefinementProperty),
    Core(CoreProperty),
    Sequence(SequenceProperty),
}
