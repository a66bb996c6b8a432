use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use waystone_core::{ActorId, EffectError, Position, Tick, WorldId};

use super::*;
use crate::session::testing::RecordingNotifier;
use crate::session::{ActorDirectory, InMemoryDirectory, Notice, SessionEnv};

fn at(x: f64, z: f64) -> Position {
    Position::new(WorldId::new("overworld"), x, 64.0, z)
}

struct Fixture {
    scheduler: ActionScheduler,
    directory: InMemoryDirectory,
    notifier: RecordingNotifier,
    actor: ActorId,
}

impl Fixture {
    /// Scheduler with a one-tick countdown period and one connected actor.
    fn new() -> Self {
        let directory = InMemoryDirectory::new();
        let actor = ActorId::random();
        directory.join(actor, "alice", at(0.0, 0.0));
        Self {
            scheduler: ActionScheduler::new(1, 0.5),
            directory,
            notifier: RecordingNotifier::default(),
            actor,
        }
    }

    fn tick(&mut self, now: u64) -> Vec<WarmupReport> {
        let env = SessionEnv::new(&self.directory, &self.notifier);
        self.scheduler.tick(Tick(now), env)
    }
}

/// Warmup from the origin to a distant target.
fn warmup(actor: ActorId, ticks: u64) -> WarmupRequest {
    WarmupRequest::new(actor, at(100.0, 100.0), ticks, at(0.0, 0.0))
}

fn counting_effect(
    counter: &Arc<AtomicUsize>,
) -> impl FnOnce(ActorId, &Position) -> Result<(), EffectError> + Send + 'static {
    let counter = Arc::clone(counter);
    move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn zero_warmup_runs_effect_immediately_without_timer() {
    let mut fx = Fixture::new();
    let runs = Arc::new(AtomicUsize::new(0));

    let outcome = fx
        .scheduler
        .schedule(warmup(fx.actor, 0), counting_effect(&runs), Tick(0));

    assert!(matches!(outcome, ScheduleOutcome::Success));
    assert_eq!(outcome.code(), "SUCCESS");
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!fx.scheduler.is_pending(fx.actor));
    assert_eq!(fx.scheduler.timer_count(), 0);
}

#[test]
fn second_schedule_is_rejected_and_its_effect_never_runs() {
    let mut fx = Fixture::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let outcome = fx
        .scheduler
        .schedule(warmup(fx.actor, 3), counting_effect(&first), Tick(0));
    assert!(matches!(outcome, ScheduleOutcome::WarmupStarted(_)));

    let rejected = fx
        .scheduler
        .schedule(warmup(fx.actor, 0), counting_effect(&second), Tick(0));
    assert!(matches!(rejected, ScheduleOutcome::AlreadyPending));
    assert_eq!(fx.scheduler.pending_count(), 1);
    assert_eq!(fx.scheduler.timer_count(), 1);

    for now in 1..=4 {
        fx.tick(now);
    }
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[test]
fn countdown_then_completion_relocates_actor() {
    let mut fx = Fixture::new();
    let directory = Arc::new(InMemoryDirectory::new());
    directory.join(fx.actor, "alice", at(0.0, 0.0));
    let relocate = {
        let directory = Arc::clone(&directory);
        move |actor: ActorId, target: &Position| directory.teleport(actor, target)
    };

    let mut ticket = fx
        .scheduler
        .schedule(warmup(fx.actor, 3), relocate, Tick(0))
        .into_ticket()
        .expect("warmup should start");
    assert_eq!(fx.scheduler.remaining(fx.actor), Some(3));

    assert!(fx.tick(1).is_empty());
    assert!(fx.tick(2).is_empty());
    assert!(fx.tick(3).is_empty());
    assert_eq!(ticket.status(), TicketStatus::Pending);

    let reports = fx.tick(4);
    assert_eq!(
        reports,
        vec![WarmupReport {
            actor: fx.actor,
            end: WarmupEnd::Completed
        }]
    );
    assert_eq!(
        fx.notifier.for_actor(fx.actor),
        vec![
            Notice::WarmupCountdown { remaining: 3 },
            Notice::WarmupCountdown { remaining: 2 },
            Notice::WarmupCountdown { remaining: 1 },
            Notice::WarmupCompleted,
        ]
    );
    assert_eq!(ticket.status(), TicketStatus::Resolved(Resolution::Completed));
    assert_eq!(directory.current_position(fx.actor), Some(at(100.0, 100.0)));
    assert!(!fx.scheduler.is_pending(fx.actor));
    assert_eq!(fx.scheduler.timer_count(), 0);
}

#[test]
fn movement_after_first_step_interrupts_exactly_once() {
    let mut fx = Fixture::new();
    let runs = Arc::new(AtomicUsize::new(0));

    let mut ticket = fx
        .scheduler
        .schedule(warmup(fx.actor, 3), counting_effect(&runs), Tick(0))
        .into_ticket()
        .expect("warmup should start");

    fx.tick(1);
    fx.directory.move_to(fx.actor, at(3.0, 0.0));

    let reports = fx.tick(2);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].end, WarmupEnd::Interrupted);
    assert_eq!(
        ticket.status(),
        TicketStatus::Resolved(Resolution::Interrupted)
    );

    for now in 3..10 {
        assert!(fx.tick(now).is_empty());
    }
    let interrupts = fx
        .notifier
        .for_actor(fx.actor)
        .into_iter()
        .filter(|n| *n == Notice::WarmupInterrupted)
        .count();
    assert_eq!(interrupts, 1);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert!(!fx.scheduler.is_pending(fx.actor));
    assert_eq!(fx.scheduler.timer_count(), 0);
}

#[test]
fn small_drift_and_rotation_do_not_interrupt() {
    let mut fx = Fixture::new();
    let runs = Arc::new(AtomicUsize::new(0));
    fx.scheduler
        .schedule(warmup(fx.actor, 2), counting_effect(&runs), Tick(0));

    fx.tick(1);
    fx.directory
        .move_to(fx.actor, at(0.3, 0.2).with_rotation(180.0, -30.0));
    fx.tick(2);
    let reports = fx.tick(3);

    assert_eq!(reports[0].end, WarmupEnd::Completed);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn world_change_interrupts() {
    let mut fx = Fixture::new();
    fx.scheduler
        .schedule(warmup(fx.actor, 5), |_, _| Ok(()), Tick(0));
    fx.tick(1);
    fx.directory.move_to(
        fx.actor,
        Position::new(WorldId::new("nether"), 0.0, 64.0, 0.0),
    );
    assert_eq!(fx.tick(2)[0].end, WarmupEnd::Interrupted);
}

#[test]
fn movement_is_ignored_when_not_interruptible() {
    let mut fx = Fixture::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let request = warmup(fx.actor, 2).interrupt_on_move(false);
    fx.scheduler
        .schedule(request, counting_effect(&runs), Tick(0));

    fx.tick(1);
    fx.directory.move_to(fx.actor, at(40.0, 40.0));
    fx.tick(2);
    assert_eq!(fx.tick(3)[0].end, WarmupEnd::Completed);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn unreachable_actor_is_dropped_before_movement_or_completion() {
    let mut fx = Fixture::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let mut ticket = fx
        .scheduler
        .schedule(warmup(fx.actor, 1), counting_effect(&runs), Tick(0))
        .into_ticket()
        .expect("warmup should start");

    fx.tick(1);
    fx.notifier.take();
    // Moved and due at the same time, but gone: neither side effect fires.
    fx.directory.move_to(fx.actor, at(50.0, 0.0));
    fx.directory.leave(fx.actor);

    let reports = fx.tick(2);
    assert_eq!(reports[0].end, WarmupEnd::Disconnected);
    assert!(fx.notifier.take().is_empty());
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(ticket.status(), TicketStatus::Dropped);
    assert_eq!(fx.scheduler.timer_count(), 0);
}

#[test]
fn explicit_cancel_is_idempotent_and_silent() {
    let mut fx = Fixture::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let mut ticket = fx
        .scheduler
        .schedule(warmup(fx.actor, 3), counting_effect(&runs), Tick(0))
        .into_ticket()
        .expect("warmup should start");

    assert_eq!(fx.scheduler.cancel(fx.actor), CancelOutcome::Cancelled);
    assert_eq!(fx.scheduler.cancel(fx.actor), CancelOutcome::NothingToCancel);
    assert_eq!(fx.scheduler.timer_count(), 0);
    assert_eq!(ticket.status(), TicketStatus::Dropped);

    for now in 1..6 {
        assert!(fx.tick(now).is_empty());
    }
    assert!(fx.notifier.take().is_empty());
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn cancel_without_pending_action_is_a_no_op() {
    let mut fx = Fixture::new();
    assert_eq!(
        fx.scheduler.cancel(ActorId::random()),
        CancelOutcome::NothingToCancel
    );
}

#[test]
fn failing_effect_resolves_as_failed_and_frees_the_slot() {
    let mut fx = Fixture::new();
    let actor = fx.actor;
    let mut ticket = fx
        .scheduler
        .schedule(
            warmup(fx.actor, 1),
            move |_, _| Err(EffectError::Rejected("destination obstructed".into())),
            Tick(0),
        )
        .into_ticket()
        .expect("warmup should start");

    fx.tick(1);
    assert_eq!(fx.tick(2)[0].end, WarmupEnd::Failed);
    assert!(matches!(
        ticket.status(),
        TicketStatus::Resolved(Resolution::Failed(EffectError::Rejected(_)))
    ));
    assert!(!fx.scheduler.is_pending(actor));

    let again = fx.scheduler.schedule(warmup(fx.actor, 1), |_, _| Ok(()), Tick(2));
    assert!(matches!(again, ScheduleOutcome::WarmupStarted(_)));
}

#[test]
fn panicking_effect_resolves_as_failed_and_spares_other_actors() {
    let mut fx = Fixture::new();
    let bob = ActorId::random();
    fx.directory.join(bob, "bob", at(0.0, 0.0));

    let mut alice_ticket = fx
        .scheduler
        .schedule(
            warmup(fx.actor, 1),
            |_, _| panic!("relocation blew up"),
            Tick(0),
        )
        .into_ticket()
        .expect("warmup should start");
    let bob_runs = Arc::new(AtomicUsize::new(0));
    let mut bob_ticket = fx
        .scheduler
        .schedule(warmup(bob, 3), counting_effect(&bob_runs), Tick(0))
        .into_ticket()
        .expect("warmup should start");

    fx.tick(1);
    let reports = fx.tick(2);
    assert_eq!(
        reports,
        vec![WarmupReport {
            actor: fx.actor,
            end: WarmupEnd::Failed,
        }]
    );
    assert_eq!(
        alice_ticket.status(),
        TicketStatus::Resolved(Resolution::Failed(EffectError::Panicked(
            "relocation blew up".into()
        )))
    );
    assert!(!fx.scheduler.is_pending(fx.actor));
    assert_eq!(fx.scheduler.timer_count(), 1);

    fx.tick(3);
    fx.tick(4);
    assert_eq!(bob_ticket.status(), TicketStatus::Resolved(Resolution::Completed));
    assert_eq!(bob_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_immediate_effect_is_contained() {
    let mut fx = Fixture::new();
    let outcome = fx
        .scheduler
        .schedule(warmup(fx.actor, 0), |_, _| panic!("no landing spot"), Tick(0));
    assert!(matches!(outcome, ScheduleOutcome::Success));
    assert!(!fx.scheduler.is_pending(fx.actor));
    assert_eq!(fx.scheduler.timer_count(), 0);
}

#[test]
fn very_long_warmups_keep_every_countdown_step() {
    let mut fx = Fixture::new();
    let ticks = u64::from(u32::MAX) + 10;
    fx.scheduler
        .schedule(warmup(fx.actor, ticks), |_, _| Ok(()), Tick(0));
    assert_eq!(fx.scheduler.remaining(fx.actor), Some(ticks));
}

#[test]
fn warmup_is_rounded_up_to_whole_countdown_periods() {
    let mut scheduler = ActionScheduler::new(20, 0.5);
    let actor = ActorId::random();
    let request = WarmupRequest::new(actor, at(1.0, 1.0), 50, at(0.0, 0.0));
    scheduler.schedule(request, |_, _| Ok(()), Tick(0));
    assert_eq!(scheduler.remaining(actor), Some(3));
}

#[test]
fn countdown_steps_follow_the_period() {
    let directory = InMemoryDirectory::new();
    let notifier = RecordingNotifier::default();
    let actor = ActorId::random();
    directory.join(actor, "bob", at(0.0, 0.0));

    let mut scheduler = ActionScheduler::new(10, 0.5);
    let request = WarmupRequest::new(actor, at(5.0, 5.0), 20, at(0.0, 0.0));
    scheduler.schedule(request, |_, _| Ok(()), Tick(0));

    let env = SessionEnv::new(&directory, &notifier);
    let mut completed_at = None;
    for now in 1..=40 {
        if !scheduler.tick(Tick(now), env).is_empty() {
            completed_at = Some(now);
            break;
        }
    }
    // Fires at 1 (2 left), 11 (1 left), 21 (complete).
    assert_eq!(completed_at, Some(21));
    assert_eq!(
        notifier.for_actor(actor),
        vec![
            Notice::WarmupCountdown { remaining: 2 },
            Notice::WarmupCountdown { remaining: 1 },
            Notice::WarmupCompleted,
        ]
    );
}

#[test]
fn clear_drops_everything() {
    let mut fx = Fixture::new();
    let other = ActorId::random();
    fx.scheduler.schedule(warmup(fx.actor, 5), |_, _| Ok(()), Tick(0));
    fx.scheduler.schedule(
        WarmupRequest::new(other, at(0.0, 0.0), 5, at(0.0, 0.0)),
        |_, _| Ok(()),
        Tick(0),
    );
    assert_eq!(fx.scheduler.clear(), 2);
    assert_eq!(fx.scheduler.pending_count(), 0);
    assert_eq!(fx.scheduler.timer_count(), 0);
}
