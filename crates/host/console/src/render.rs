//! Text for notices and outcomes. The engines only pick variants; wording
//! lives here.
use waystone_runtime::{
    AcceptOutcome, ActorId, DenyOutcome, Notice, RequestKind, ScheduleOutcome, SendOutcome,
};

/// Renders `notice` for the actor receiving it. `name` resolves other actors.
pub fn notice(notice: &Notice, tick_rate: u32, name: impl Fn(ActorId) -> String) -> String {
    match notice {
        Notice::WarmupCountdown { remaining } => {
            format!("Teleporting in {remaining}s. Don't move.")
        }
        Notice::WarmupInterrupted => "You moved! Teleport cancelled.".to_string(),
        Notice::WarmupCompleted => "Teleported.".to_string(),
        Notice::RequestReceived {
            from,
            kind,
            expires_in_ticks,
        } => {
            let secs = expires_in_ticks / u64::from(tick_rate.max(1));
            match kind {
                RequestKind::Pull => format!(
                    "{} wants to teleport to you. 'accept' or 'deny' within {secs}s.",
                    name(*from)
                ),
                RequestKind::Push => format!(
                    "{} wants you to teleport to them. 'accept' or 'deny' within {secs}s.",
                    name(*from)
                ),
            }
        }
        Notice::RequestAccepted { by } => format!("{} accepted your request.", name(*by)),
        Notice::RequestDenied { by } => format!("{} denied your request.", name(*by)),
        Notice::RequestExpired {
            other,
            outgoing: true,
        } => format!("Your request to {} expired.", name(*other)),
        Notice::RequestExpired {
            other,
            outgoing: false,
        } => format!("The request from {} expired.", name(*other)),
        Notice::RequestCancelled { by } => format!("{} withdrew their request.", name(*by)),
    }
}

pub fn schedule(outcome: &ScheduleOutcome) -> &'static str {
    match outcome {
        ScheduleOutcome::Success => "Teleported.",
        ScheduleOutcome::WarmupStarted(_) => "Warmup started.",
        ScheduleOutcome::AlreadyPending => "A teleport is already pending.",
    }
}

pub fn send(outcome: &SendOutcome, tick_rate: u32) -> String {
    match outcome {
        SendOutcome::Sent => "Request sent.".to_string(),
        SendOutcome::Disabled => "Teleport requests are disabled.".to_string(),
        SendOutcome::SelfRequest => "You cannot send a request to yourself.".to_string(),
        SendOutcome::TargetOffline => "That player is offline.".to_string(),
        SendOutcome::Rejected(denial) => format!("Request refused: {denial}."),
        SendOutcome::OnCooldown { remaining_ticks } => {
            let secs = remaining_ticks.div_ceil(u64::from(tick_rate.max(1)));
            format!("Wait {secs}s before sending another request.")
        }
        SendOutcome::TargetBusy => "That player already has a pending request.".to_string(),
    }
}

pub fn accept(outcome: &AcceptOutcome, name: impl Fn(ActorId) -> String) -> String {
    match outcome {
        AcceptOutcome::Accepted(request) => format!("Accepted {}.", name(request.sender)),
        AcceptOutcome::NoRequest => "You have no pending request.".to_string(),
        AcceptOutcome::SenderOffline(request) => {
            format!("{} is no longer online.", name(request.sender))
        }
    }
}

pub fn deny(outcome: &DenyOutcome, name: impl Fn(ActorId) -> String) -> String {
    match outcome {
        DenyOutcome::Denied(request) => format!("Denied {}.", name(request.sender)),
        DenyOutcome::NoRequest => "You have no pending request.".to_string(),
    }
}
