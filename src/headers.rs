// Copyright 2025 Cornell University
// released under MIT License

//! Headers turn the bounds of a combined fragment into the library process
//! that wraps its body.

use crate::context::LifelineContext;
use crate::csp;
use crate::ir::*;
use crate::serialize::{is_literal_zero, serialize_expr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// A curried library call: `f(args)(body)`
    Call {
        function: &'static str,
        args: Vec<String>,
    },
    /// No wrapper, only a comment in front of the body
    Inert(String),
}

impl Header {
    fn call(function: &'static str, args: Vec<String>) -> Self {
        Header::Call { function, args }
    }

    pub fn wrap(&self, body: &str) -> String {
        match self {
            Header::Call { .. } => format!("{self}({body})"),
            Header::Inert(_) => format!("{self} {body}"),
        }
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Header::Call { function, args } => write!(f, "{}", csp::apply(function, args)),
            Header::Inert(text) => write!(f, "{}", csp::comment(text)),
        }
    }
}

/// Header of a loop fragment.
///
/// Panics if a bound is given with neither side, which the front-end rejects.
pub fn loop_header(it: &Interaction, st: &SymbolTable, bound: Option<&Bound>) -> Header {
    let Some(bound) = bound else {
        return Header::call("Loop", vec![]);
    };
    let expr = |e: ExprId| serialize_expr(it, st, e);
    match (bound.lower, bound.upper) {
        (None, None) => panic!("loop bound without a lower or an upper side"),
        (Some(lower), None) => Header::call("BoundedLoopLower", vec![expr(lower)]),
        (None, Some(upper)) => Header::call("BoundedLoop", vec![expr(upper)]),
        (Some(lower), Some(upper)) if is_literal_zero(it, lower) => {
            Header::call("BoundedLoopUpper", vec![expr(upper)])
        }
        (Some(lower), Some(upper)) => {
            Header::call("BoundedLoopRange", vec![expr(lower), expr(upper)])
        }
    }
}

pub fn duration_header(it: &Interaction, st: &SymbolTable, bound: &Bound) -> Header {
    let expr = |e: ExprId| serialize_expr(it, st, e);
    match (bound.lower, bound.upper) {
        (None, None) => Header::Inert("no bounds".to_string()),
        (Some(lower), None) => Header::call("DurationLower", vec![expr(lower)]),
        (None, Some(upper)) => Header::call("DurationUpper", vec![expr(upper)]),
        (Some(lower), Some(upper)) => {
            Header::call("DurationRange", vec![expr(lower), expr(upper)])
        }
    }
}

/// The deadline is enforced by its owner's lifeline. Other lifelines only
/// note it, unless there is a single lifeline that then has to own it.
pub fn deadline_header(
    it: &Interaction,
    st: &SymbolTable,
    lctx: &LifelineContext,
    owner: ActorId,
    units: ExprId,
) -> Header {
    if lctx.is_for(owner) || it.lifelines.len() <= 1 {
        Header::call("Deadline", vec![serialize_expr(it, st, units)])
    } else {
        Header::Inert(format!("deadline on {}", st[owner].name()))
    }
}

/// `internal` are the channels an until fragment may never run on its own,
/// see `message_set`.
pub fn until_header<S: AsRef<str>>(intra: &MessageSet, internal: &[S]) -> Header {
    Header::call("AnyUntil", vec![message_set(intra, internal)])
}

/// The events of a message set: `{}`, `{| c1, c2 |}`, or for the universe
/// every event outside of the `internal` channels, which carry time,
/// handshakes and memory accesses rather than messages.
pub fn message_set<S: AsRef<str>>(set: &MessageSet, internal: &[S]) -> String {
    match set {
        MessageSet::Empty => "{}".to_string(),
        MessageSet::Universe if internal.is_empty() => "Events".to_string(),
        MessageSet::Universe => format!("diff(Events, {})", csp::event_set(internal)),
        MessageSet::Topics(topics) => {
            let channels: Vec<String> = topics.iter().map(topic_channel).collect();
            csp::event_set(&channels)
        }
    }
}

/// The channel a topic is communicated on
pub fn topic_channel(topic: &Topic) -> String {
    match topic {
        Topic::Event(channel) => channel.clone(),
        Topic::Operation(operation) => format!("{operation}Call"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::tests::build_pick_interaction;

    fn nat(it: &mut Interaction, n: u64) -> ExprId {
        it.e(Expr::Nat(n))
    }

    fn loop_of(lower: Option<u64>, upper: Option<u64>) -> String {
        let st = SymbolTable::default();
        let mut it = Interaction::new("it".to_string());
        let lower = lower.map(|n| nat(&mut it, n));
        let upper = upper.map(|n| nat(&mut it, n));
        loop_header(&it, &st, Some(&Bound::new(lower, upper))).to_string()
    }

    #[test]
    fn loop_headers() {
        let st = SymbolTable::default();
        let it = Interaction::new("it".to_string());
        assert_eq!(loop_header(&it, &st, None).to_string(), "Loop");
        assert_eq!(loop_of(Some(2), None), "BoundedLoopLower(2)");
        assert_eq!(loop_of(Some(0), Some(5)), "BoundedLoopUpper(5)");
        assert_eq!(loop_of(None, Some(5)), "BoundedLoop(5)");
        assert_eq!(loop_of(Some(4), Some(6)), "BoundedLoopRange(4, 6)");
        assert_eq!(loop_of(Some(0), None), "BoundedLoopLower(0)");
    }

    #[test]
    #[should_panic(expected = "loop bound without")]
    fn loop_header_rejects_empty_bound() {
        loop_of(None, None);
    }

    #[test]
    fn loop_header_with_expressions() {
        let mut st = SymbolTable::default();
        let n = st.add_variable("n".to_string(), Type::Nat);
        let mut it = Interaction::new("it".to_string());
        let one = nat(&mut it, 1);
        let n_expr = it.e(Expr::Var(n));
        let upper = it.e(Expr::Binary(BinOp::Mul, n_expr, one));
        let header = loop_header(&it, &st, Some(&Bound::new(Some(one), Some(upper))));
        assert_eq!(header.wrap("a -> SKIP"), "BoundedLoopRange(1, n * 1)(a -> SKIP)");
    }

    #[test]
    fn duration_headers() {
        let st = SymbolTable::default();
        let mut it = Interaction::new("it".to_string());
        let one = nat(&mut it, 1);
        let three = nat(&mut it, 3);
        let header = |lower, upper| duration_header(&it, &st, &Bound::new(lower, upper));
        assert_eq!(header(None, None), Header::Inert("no bounds".to_string()));
        assert_eq!(header(None, None).wrap("P"), "{- no bounds -} P");
        assert_eq!(header(Some(one), None).to_string(), "DurationLower(1)");
        assert_eq!(header(None, Some(three)).to_string(), "DurationUpper(3)");
        assert_eq!(
            header(Some(one), Some(three)).wrap("P"),
            "DurationRange(1, 3)(P)"
        );
    }

    #[test]
    fn deadline_is_scoped_to_its_owner() {
        let fx = build_pick_interaction();
        let st = &fx.spec.symbols;
        let mut it = Interaction::new("Timed".to_string());
        it.lifelines = vec![fx.ctrl, fx.arm];
        let units = nat(&mut it, 5);
        let owner = LifelineContext::Actor(fx.arm);
        let other = LifelineContext::Actor(fx.ctrl);
        assert_eq!(
            deadline_header(&it, st, &owner, fx.arm, units).to_string(),
            "Deadline(5)"
        );
        assert_eq!(
            deadline_header(&it, st, &other, fx.arm, units).wrap("P"),
            "{- deadline on Arm -} P"
        );
        assert_eq!(
            deadline_header(&it, st, &LifelineContext::Until, fx.arm, units).to_string(),
            "Deadline(5)"
        );
    }

    #[test]
    fn deadline_with_single_lifeline() {
        let mut st = SymbolTable::default();
        let ctrl = st.add_actor("Ctrl".to_string(), ActorKind::Component);
        let arm = st.add_actor("Arm".to_string(), ActorKind::Component);
        let mut it = Interaction::new("it".to_string());
        it.lifelines = vec![ctrl];
        let units = nat(&mut it, 2);
        let lctx = LifelineContext::Sequential(Some(ctrl));
        assert_eq!(
            deadline_header(&it, &st, &lctx, arm, units).to_string(),
            "Deadline(2)"
        );
    }

    #[test]
    fn until_headers() {
        let internal = ["tock", "finish", "until"];
        assert_eq!(until_header(&MessageSet::Empty, &internal).to_string(), "AnyUntil({})");
        assert_eq!(
            until_header(&MessageSet::Universe, &internal).wrap("STOP"),
            "AnyUntil(diff(Events, {| tock, finish, until |}))(STOP)"
        );
        assert_eq!(
            until_header(&MessageSet::Universe, &[] as &[&str]).to_string(),
            "AnyUntil(Events)"
        );
        let topics = MessageSet::Topics(vec![
            Topic::Event("Robot::move".to_string()),
            Topic::Operation("Robot::grip".to_string()),
        ]);
        assert_eq!(
            until_header(&topics, &internal).to_string(),
            "AnyUntil({| Robot::move, Robot::gripCall |})"
        );
    }
}
