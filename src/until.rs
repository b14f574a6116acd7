// Copyright 2025 Cornell University
// released under MIT License

//! Until fragments of interactions with several lifelines.
//!
//! The lifelines cannot each run the body of an until fragment on their own,
//! they would disagree on when it is escaped. Instead every lifeline hands
//! over to a dedicated process through `until.<i>.enter` and waits for
//! `until.<i>.leave`, and that process runs the body in between. It stops
//! together with the lifelines, on `finish`.

use crate::context::{LifelineContext, Synchronisation};
use crate::csp::{self, SKIP};
use crate::headers::until_header;
use crate::ir::*;
use crate::library::{idle, FINISH_CHANNEL};
use crate::lifeline::Projection;

/// Name of the process that runs the bodies of until fragments
pub const UNTIL_PROCESS: &str = "UntilSync";

/// What a lifeline does when it reaches until fragment `fragment`. It may
/// wait for the other lifelines to get there too.
pub fn handshake(sync: &Synchronisation, fragment: FragmentId) -> String {
    idle(&format!("{} -> {} -> {SKIP}", sync.enter(fragment), sync.leave(fragment)))
}

/// `UntilSync = finish -> SKIP [] (until.0.enter -> AnyUntil(E)(B); until.0.leave -> UntilSync) [] ...`
///
/// `None` unless the lifelines have to synchronise on until fragments.
pub fn until_process(projection: &mut Projection) -> Option<String> {
    let ctx = projection.context();
    let sync = ctx.until();
    if !sync.is_required() {
        return None;
    }
    let it = projection.interaction();
    let internal = projection.internal_channels();
    let mut branches = vec![csp::prefix(FINISH_CHANNEL, SKIP)];
    for &fragment in sync.fragments() {
        let Fragment::Block(Block::Until { intra, body }) = &it[fragment] else {
            panic!("{fragment} was recorded as an until fragment but is not one");
        };
        let body = projection
            .fragment(&LifelineContext::Until, *body)
            .unwrap_or_else(|| SKIP.to_string());
        branches.push(format!(
            "({} -> {}; {} -> {UNTIL_PROCESS})",
            sync.enter(fragment),
            until_header(intra, &internal).wrap(&body),
            sync.leave(fragment)
        ));
    }
    Some(csp::definition(UNTIL_PROCESS, &branches.join(" [] ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InteractionContext;
    use crate::diagnostic::DiagnosticHandler;
    use crate::ir::tests::{build_pick_interaction, build_solo_interaction};

    #[test]
    fn pick_until_process() {
        let fx = build_pick_interaction();
        let ctx = InteractionContext::new(&fx.spec, fx.interaction);
        let mut handler = DiagnosticHandler::default();
        let mut projection = Projection::new(&fx.spec, &ctx, &mut handler);
        assert_eq!(
            until_process(&mut projection).unwrap(),
            "UntilSync = finish -> SKIP [] (until.0.enter -> AnyUntil({| Robot::move |})(STOP); \
             until.0.leave -> UntilSync)"
        );
        let until = fx.spec[fx.interaction].body[2];
        assert_eq!(
            handshake(ctx.until(), until),
            "Idle(until.0.enter -> until.0.leave -> SKIP)"
        );
    }

    #[test]
    fn several_untils_in_index_order() {
        let mut spec = Specification::new("Pkg".to_string());
        let a = spec.symbols.add_actor("A".to_string(), ActorKind::Component);
        let b = spec.symbols.add_actor("B".to_string(), ActorKind::Component);
        let group = spec.add_group(Group::new(None));
        let mut it = Interaction::new("Twice".to_string());
        it.lifelines = vec![a, b];
        let units = it.e(Expr::Nat(1));
        let wait = it.f(Fragment::Occurrence(Occurrence::Wait { actor: b, units }));
        let first_body = it.operand(vec![wait]);
        let first = it.f(Fragment::Block(Block::Until {
            intra: MessageSet::Universe,
            body: first_body,
        }));
        let second_body = it.operand(vec![]);
        let second = it.f(Fragment::Block(Block::Until {
            intra: MessageSet::Empty,
            body: second_body,
        }));
        it.body = vec![first, second];
        let id = spec.add_interaction(group, it);

        let ctx = InteractionContext::new(&spec, id);
        let mut handler = DiagnosticHandler::default();
        let mut projection = Projection::new(&spec, &ctx, &mut handler);
        assert_eq!(
            until_process(&mut projection).unwrap(),
            "UntilSync = finish -> SKIP [] (until.0.enter -> \
             AnyUntil(diff(Events, {| tock, finish, terminate, until |}))(WAIT(1)); \
             until.0.leave -> UntilSync) [] (until.1.enter -> AnyUntil({})(SKIP); \
             until.1.leave -> UntilSync)"
        );
        assert_eq!(
            ctx.until().declaration().unwrap(),
            "channel until : {0..1}.SyncDir"
        );
    }

    #[test]
    fn universal_until_leaves_internal_channels_alone() {
        let mut spec = Specification::new("Pkg".to_string());
        let a = spec.symbols.add_actor("A".to_string(), ActorKind::Component);
        let b = spec.symbols.add_actor("B".to_string(), ActorKind::Component);
        let x = spec.symbols.add_variable("x".to_string(), Type::Nat);
        let group = spec.add_group(Group::new(None));
        let mut it = Interaction::new("U".to_string());
        it.lifelines = vec![a, b];
        it.variables = vec![x];
        let go = it.f(Fragment::Occurrence(Occurrence::Message(Message {
            from: a,
            to: b,
            topic: Topic::Event("go".to_string()),
            args: vec![MessageArg::Bind(x)],
        })));
        let body = it.operand(vec![go]);
        let escape = it.f(Fragment::Block(Block::Until {
            intra: MessageSet::Universe,
            body,
        }));
        it.body = vec![escape];
        let id = spec.add_interaction(group, it);

        let ctx = InteractionContext::new(&spec, id);
        let mut handler = DiagnosticHandler::default();
        let mut projection = Projection::new(&spec, &ctx, &mut handler);
        let process = until_process(&mut projection).unwrap();
        assert_eq!(
            process,
            "UntilSync = finish -> SKIP [] (until.0.enter -> \
             AnyUntil(diff(Events, {| tock, finish, terminate, until, Memory_U::get_x, Memory_U::set_x |}))\
             (Idle(go.out?x -> Memory_U::set_x!x -> SKIP)); until.0.leave -> UntilSync)"
        );
        assert!(!process.contains("AnyUntil(Events)"));
    }

    #[test]
    fn no_until_process_for_single_lifeline() {
        let fx = build_solo_interaction();
        let ctx = InteractionContext::new(&fx.spec, fx.interaction);
        let mut handler = DiagnosticHandler::default();
        let mut projection = Projection::new(&fx.spec, &ctx, &mut handler);
        assert!(until_process(&mut projection).is_none());
    }
}
