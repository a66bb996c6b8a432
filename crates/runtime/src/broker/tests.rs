use std::sync::Arc;

use waystone_core::{ActorId, CoordConfig, EffectError, Position, RequestKind, Tick, WorldId};

use super::*;
use crate::session::testing::RecordingNotifier;
use crate::session::{
    AllowAll, InMemoryDirectory, Notice, PolicyDenial, SessionEnv, ToggleablePolicy,
};

struct Fixture {
    broker: RequestBroker,
    directory: InMemoryDirectory,
    notifier: RecordingNotifier,
}

impl Fixture {
    /// Broker using the default config: 10s cooldown, 30s timeout, 20 tps.
    fn new() -> Self {
        Self::with_policy(Arc::new(AllowAll))
    }

    fn with_policy(policy: Arc<dyn InteractionPolicy>) -> Self {
        let settings = BrokerSettings::from_config(&CoordConfig::default());
        Self {
            broker: RequestBroker::new(settings, policy),
            directory: InMemoryDirectory::new(),
            notifier: RecordingNotifier::default(),
        }
    }

    fn join(&self, name: &str) -> ActorId {
        let actor = ActorId::random();
        let spawn = Position::new(WorldId::new("overworld"), 0.0, 64.0, 0.0);
        self.directory.join(actor, name, spawn);
        actor
    }

    fn send(&mut self, sender: ActorId, target: ActorId, now: u64) -> SendOutcome {
        let env = SessionEnv::new(&self.directory, &self.notifier);
        self.broker
            .send(sender, target, RequestKind::Pull, Tick(now), env)
    }

    fn expire(&mut self, now: u64) -> Vec<Request> {
        let env = SessionEnv::new(&self.directory, &self.notifier);
        self.broker.expire_due(Tick(now), env)
    }
}

const SECOND: u64 = 20;

#[test]
fn self_request_is_rejected() {
    let mut fx = Fixture::new();
    let alice = fx.join("alice");
    assert_eq!(fx.send(alice, alice, 0), SendOutcome::SelfRequest);
    assert_eq!(fx.broker.request_count(), 0);
}

#[test]
fn offline_target_is_rejected() {
    let mut fx = Fixture::new();
    let alice = fx.join("alice");
    assert_eq!(
        fx.send(alice, ActorId::random(), 0),
        SendOutcome::TargetOffline
    );
}

#[test]
fn disabled_broker_rejects_everything() {
    let mut config = CoordConfig::default();
    config.requests.enabled = false;
    let mut fx = Fixture::new();
    fx.broker = RequestBroker::new(BrokerSettings::from_config(&config), Arc::new(AllowAll));
    let (alice, bob) = (fx.join("alice"), fx.join("bob"));

    let outcome = fx.send(alice, bob, 0);
    assert_eq!(outcome, SendOutcome::Disabled);
    assert_eq!(outcome.code(), "DISABLED");
}

#[test]
fn policy_denial_is_an_ordinary_outcome() {
    let policy = Arc::new(ToggleablePolicy::new());
    let mut fx = Fixture::with_policy(policy.clone());
    let (alice, bob) = (fx.join("alice"), fx.join("bob"));
    policy.toggle(bob);

    assert_eq!(
        fx.send(alice, bob, 0),
        SendOutcome::Rejected(PolicyDenial::TargetNotAccepting)
    );
    assert_eq!(fx.broker.request_count(), 0);
    // A rejected send does not start the cooldown.
    assert_eq!(fx.broker.cooldown_remaining(alice, Tick(0)), None);
}

#[test]
fn send_notifies_target_and_arms_one_timer() {
    let mut fx = Fixture::new();
    let (alice, bob) = (fx.join("alice"), fx.join("bob"));

    assert_eq!(fx.send(alice, bob, 5), SendOutcome::Sent);
    let request = fx.broker.pending_for(bob).cloned().expect("request stored");
    assert_eq!(request.sender, alice);
    assert_eq!(request.created_at, Tick(5));
    assert_eq!(request.expires_at, Tick(5 + 30 * SECOND));
    assert_eq!(fx.broker.timer_count(), 1);
    assert_eq!(
        fx.notifier.for_actor(bob),
        vec![Notice::RequestReceived {
            from: alice,
            kind: RequestKind::Pull,
            expires_in_ticks: 30 * SECOND,
        }]
    );
}

#[test]
fn send_within_cooldown_never_touches_the_table() {
    let mut fx = Fixture::new();
    let (alice, bob, carol) = (fx.join("alice"), fx.join("bob"), fx.join("carol"));

    assert_eq!(fx.send(alice, bob, 0), SendOutcome::Sent);
    assert_eq!(
        fx.send(alice, carol, 3 * SECOND),
        SendOutcome::OnCooldown {
            remaining_ticks: 7 * SECOND
        }
    );
    assert!(fx.broker.pending_for(carol).is_none());
    assert_eq!(fx.broker.request_count(), 1);

    // Cooldown elapsed: a second outbound request coexists with the first.
    assert_eq!(fx.send(alice, carol, 10 * SECOND), SendOutcome::Sent);
    assert_eq!(fx.broker.outbound_from(alice).len(), 2);
}

#[test]
fn second_sender_sees_target_busy_and_accept_resolves_the_first() {
    let mut fx = Fixture::new();
    let (a, b, c) = (fx.join("a"), fx.join("b"), fx.join("c"));

    assert_eq!(fx.send(a, b, 0), SendOutcome::Sent);
    assert_eq!(fx.send(c, b, 1), SendOutcome::TargetBusy);

    let mut seen = None;
    let outcome = fx.broker.accept(
        b,
        |request| {
            seen = Some(request.sender);
            Ok(())
        },
        SessionEnv::new(&fx.directory, &fx.notifier),
    );
    assert!(matches!(&outcome, AcceptOutcome::Accepted(r) if r.sender == a));
    assert_eq!(outcome.code(), "ACCEPTED");
    assert_eq!(seen, Some(a));
    assert_eq!(fx.notifier.for_actor(a), vec![Notice::RequestAccepted { by: b }]);
    assert!(fx.notifier.for_actor(c).is_empty());
    assert_eq!(fx.broker.request_count(), 0);
    assert_eq!(fx.broker.timer_count(), 0);
}

#[test]
fn accept_without_request() {
    let mut fx = Fixture::new();
    let bob = fx.join("bob");
    let env = SessionEnv::new(&fx.directory, &fx.notifier);
    let outcome = fx.broker.accept(bob, |_| Ok(()), env);
    assert_eq!(outcome, AcceptOutcome::NoRequest);
}

#[test]
fn accept_with_offline_sender_discards_request_without_effect() {
    let mut fx = Fixture::new();
    let (alice, bob) = (fx.join("alice"), fx.join("bob"));
    fx.send(alice, bob, 0);
    fx.directory.leave(alice);

    let mut ran = false;
    let env = SessionEnv::new(&fx.directory, &fx.notifier);
    let outcome = fx.broker.accept(
        bob,
        |_| {
            ran = true;
            Ok(())
        },
        env,
    );
    assert!(matches!(outcome, AcceptOutcome::SenderOffline(_)));
    assert!(!ran);
    assert!(fx.broker.pending_for(bob).is_none());
    assert_eq!(fx.broker.timer_count(), 0);
}

#[test]
fn failing_accept_effect_still_consumes_the_request() {
    let mut fx = Fixture::new();
    let (alice, bob) = (fx.join("alice"), fx.join("bob"));
    fx.send(alice, bob, 0);

    let env = SessionEnv::new(&fx.directory, &fx.notifier);
    let outcome = fx
        .broker
        .accept(bob, |_| Err(EffectError::Rejected("unsafe".into())), env);
    assert!(matches!(outcome, AcceptOutcome::Accepted(_)));
    assert_eq!(fx.broker.request_count(), 0);
}

#[test]
fn panicking_accept_effect_is_contained() {
    let mut fx = Fixture::new();
    let (alice, bob, carol) = (fx.join("alice"), fx.join("bob"), fx.join("carol"));
    fx.send(alice, bob, 0);

    let env = SessionEnv::new(&fx.directory, &fx.notifier);
    let outcome = fx
        .broker
        .accept(bob, |_| panic!("teleport target vanished"), env);
    assert!(matches!(outcome, AcceptOutcome::Accepted(_)));
    assert_eq!(fx.broker.request_count(), 0);
    assert_eq!(fx.broker.timer_count(), 0);
    assert!(
        fx.notifier
            .for_actor(alice)
            .contains(&Notice::RequestAccepted { by: bob })
    );

    // The broker is still usable for everyone else.
    assert_eq!(fx.send(carol, bob, 1), SendOutcome::Sent);
}

#[test]
fn deny_notifies_sender() {
    let mut fx = Fixture::new();
    let (alice, bob) = (fx.join("alice"), fx.join("bob"));
    fx.send(alice, bob, 0);

    let outcome = fx.broker.deny(bob, SessionEnv::new(&fx.directory, &fx.notifier));
    assert!(matches!(outcome, DenyOutcome::Denied(_)));
    assert_eq!(fx.notifier.for_actor(alice), vec![Notice::RequestDenied { by: bob }]);
    assert_eq!(fx.broker.deny(bob, SessionEnv::new(&fx.directory, &fx.notifier)), DenyOutcome::NoRequest);
    assert_eq!(fx.broker.timer_count(), 0);
}

#[test]
fn cancel_is_idempotent() {
    let mut fx = Fixture::new();
    let (alice, bob) = (fx.join("alice"), fx.join("bob"));
    fx.send(alice, bob, 0);

    assert_eq!(fx.broker.cancel(bob), CancelOutcome::Cancelled);
    assert_eq!(fx.broker.cancel(bob), CancelOutcome::NothingToCancel);
    assert_eq!(fx.broker.cancel(ActorId::random()), CancelOutcome::NothingToCancel);
    assert!(fx.expire(60 * SECOND).is_empty());
}

#[test]
fn unanswered_request_expires_and_frees_the_slot() {
    let mut fx = Fixture::new();
    let (a, b) = (fx.join("a"), fx.join("b"));
    assert_eq!(fx.send(a, b, 0), SendOutcome::Sent);
    fx.notifier.take();

    assert!(fx.expire(30 * SECOND - 1).is_empty());
    let expired = fx.expire(30 * SECOND);
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].sender, a);

    let notices = fx.notifier.take();
    assert!(notices.contains(&(
        a,
        Notice::RequestExpired {
            other: b,
            outgoing: true
        }
    )));
    assert!(notices.contains(&(
        b,
        Notice::RequestExpired {
            other: a,
            outgoing: false
        }
    )));
    assert!(fx.broker.pending_for(b).is_none());
    assert_eq!(fx.broker.timer_count(), 0);

    // Cooldown (10s) long past, slot empty: the same pair can go again.
    assert_eq!(fx.send(a, b, 30 * SECOND), SendOutcome::Sent);
}

#[test]
fn expiry_tolerates_an_offline_party() {
    let mut fx = Fixture::new();
    let (a, b) = (fx.join("a"), fx.join("b"));
    fx.send(a, b, 0);
    fx.notifier.take();
    fx.directory.leave(a);

    assert_eq!(fx.expire(30 * SECOND).len(), 1);
    let notices = fx.notifier.take();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, b);
}

#[test]
fn timeout_of_a_replaced_request_is_ignored() {
    let mut fx = Fixture::new();
    let (a, b, c) = (fx.join("a"), fx.join("b"), fx.join("c"));
    fx.send(a, b, 0);
    fx.broker.cancel(b);
    // New request into the same slot later; the old timeout must not touch it.
    fx.send(c, b, 10 * SECOND);

    assert!(fx.expire(30 * SECOND).is_empty());
    assert_eq!(fx.broker.pending_for(b).map(|r| r.sender), Some(c));
    assert_eq!(fx.expire(40 * SECOND).len(), 1);
}

#[test]
fn disconnecting_sender_removes_request_keyed_by_target() {
    let mut fx = Fixture::new();
    let (a, b, c) = (fx.join("a"), fx.join("b"), fx.join("c"));
    fx.send(a, b, 0);
    fx.send(a, c, 10 * SECOND);
    assert_eq!(fx.broker.request_count(), 2);

    let removed = fx.broker.disconnect(a);
    assert_eq!(removed.len(), 2);
    assert!(fx.broker.pending_for(b).is_none());
    assert!(fx.broker.pending_for(c).is_none());
    assert_eq!(fx.broker.timer_count(), 0);
}

#[test]
fn disconnecting_target_removes_its_inbound_request() {
    let mut fx = Fixture::new();
    let (a, b) = (fx.join("a"), fx.join("b"));
    fx.send(a, b, 0);

    assert_eq!(fx.broker.disconnect(b).len(), 1);
    assert_eq!(fx.broker.request_count(), 0);
    assert!(fx.broker.disconnect(b).is_empty());
}

#[test]
fn cancel_outbound_notifies_each_target() {
    let mut fx = Fixture::new();
    let (a, b, c) = (fx.join("a"), fx.join("b"), fx.join("c"));
    fx.send(a, b, 0);
    fx.send(a, c, 10 * SECOND);
    fx.notifier.take();

    let withdrawn = fx.broker.cancel_outbound(a, SessionEnv::new(&fx.directory, &fx.notifier));
    assert_eq!(withdrawn.len(), 2);
    assert_eq!(fx.notifier.for_actor(b), vec![Notice::RequestCancelled { by: a }]);
    assert_eq!(fx.notifier.for_actor(c), vec![Notice::RequestCancelled { by: a }]);
    assert_eq!(fx.broker.timer_count(), 0);
}
