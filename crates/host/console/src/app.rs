//! Console session: turns parsed commands into runtime calls.
//!
//! This is the feature layer. Homes live here, requests are composed into
//! warmups here, and every outcome is worded here.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::debug;
use waystone_bootstrap::HostSetup;
use waystone_runtime::{
    AcceptOutcome, ActorDirectory, ActorId, CoordConfig, InMemoryDirectory, Position, Request,
    RequestKind, RuntimeHandle, ToggleablePolicy, WarmupRequest, WorldId,
};

use crate::command::{ConsoleCommand, HELP};
use crate::render;

pub enum Flow {
    Continue,
    Quit,
}

pub struct ConsoleApp {
    handle: RuntimeHandle,
    directory: Arc<InMemoryDirectory>,
    policy: Arc<ToggleablePolicy>,
    config: CoordConfig,
    homes: HashMap<ActorId, Position>,
}

impl ConsoleApp {
    pub fn new(setup: &HostSetup) -> Self {
        Self {
            handle: setup.runtime.handle(),
            directory: Arc::clone(&setup.directory),
            policy: Arc::clone(&setup.policy),
            config: setup.config.coord.clone(),
            homes: HashMap::new(),
        }
    }

    pub async fn execute(&mut self, command: ConsoleCommand) -> Result<Flow> {
        match command {
            ConsoleCommand::Join { name, spawn } => {
                if self.directory.find_by_name(&name).is_some() {
                    println!("{name} is already online.");
                } else {
                    let spawn = spawn.unwrap_or_else(default_spawn);
                    println!("{name} joined at {spawn}.");
                    self.directory.join(ActorId::random(), name, spawn);
                }
            }
            ConsoleCommand::Leave(name) => {
                let actor = self.actor(&name)?;
                let report = self.handle.disconnect(actor).await?;
                self.directory.leave(actor);
                self.homes.remove(&actor);
                debug!(%actor, ?report, "console actor left");
                println!("{name} left.");
            }
            ConsoleCommand::Move { name, to } => {
                let actor = self.actor(&name)?;
                self.directory.move_to(actor, to.clone());
                println!("{name} is now at {to}.");
            }
            ConsoleCommand::SetHome(name) => {
                let actor = self.actor(&name)?;
                let here = self.position(actor)?;
                println!("Home set for {name} at {here}.");
                self.homes.insert(actor, here);
            }
            ConsoleCommand::Home(name) => {
                let actor = self.actor(&name)?;
                let home = self
                    .homes
                    .get(&actor)
                    .cloned()
                    .ok_or_else(|| anyhow!("{name} has no home set"))?;
                self.teleport_with_warmup(actor, home).await?;
            }
            ConsoleCommand::Tpa { from, to } => self.send(&from, &to, RequestKind::Pull).await?,
            ConsoleCommand::TpaHere { from, to } => {
                self.send(&from, &to, RequestKind::Push).await?
            }
            ConsoleCommand::Accept(name) => {
                let target = self.actor(&name)?;
                let outcome = self.handle.accept(target, |_| Ok(())).await?;
                println!("{}", render::accept(&outcome, |id| self.name(id)));
                if let AcceptOutcome::Accepted(request) = outcome {
                    self.travel(&request).await?;
                }
            }
            ConsoleCommand::Deny(name) => {
                let target = self.actor(&name)?;
                let outcome = self.handle.deny(target).await?;
                println!("{}", render::deny(&outcome, |id| self.name(id)));
            }
            ConsoleCommand::Cancel(name) => {
                let actor = self.actor(&name)?;
                let outcome = self.handle.cancel_action(actor).await?;
                if outcome.was_cancelled() {
                    println!("Teleport cancelled.");
                } else {
                    println!("{name} has no pending teleport.");
                }
            }
            ConsoleCommand::TpaCancel(name) => {
                let sender = self.actor(&name)?;
                let withdrawn = self.handle.cancel_outbound(sender).await?;
                if withdrawn.is_empty() {
                    println!("{name} has no outgoing requests.");
                } else {
                    println!("Withdrew {} request(s).", withdrawn.len());
                }
            }
            ConsoleCommand::Toggle(name) => {
                let actor = self.actor(&name)?;
                if self.policy.toggle(actor) {
                    println!("{name} now accepts teleport requests.");
                } else {
                    println!("{name} now refuses teleport requests.");
                }
            }
            ConsoleCommand::Status => {
                let snapshot = self.handle.metrics();
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                println!(
                    "{} actor(s) online, tick {}",
                    self.directory.len(),
                    self.handle.now().await?
                );
            }
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn send(&mut self, from: &str, to: &str, kind: RequestKind) -> Result<()> {
        let sender = self.actor(from)?;
        let target = self.actor(to)?;
        let outcome = self.handle.send_request(sender, target, kind).await?;
        println!("{}", render::send(&outcome, self.config.tick_rate));
        Ok(())
    }

    /// Moves whoever travels for an accepted request, with the usual warmup.
    async fn travel(&mut self, request: &Request) -> Result<()> {
        let (traveller, destination) = match request.kind {
            RequestKind::Pull => (request.sender, request.target),
            RequestKind::Push => (request.target, request.sender),
        };
        let Some(to) = self.directory.current_position(destination) else {
            println!("{} is no longer online.", self.name(destination));
            return Ok(());
        };
        self.teleport_with_warmup(traveller, to).await
    }

    async fn teleport_with_warmup(&mut self, actor: ActorId, to: Position) -> Result<()> {
        let origin = self.position(actor)?;
        let request = WarmupRequest::new(actor, to, self.config.warmup_ticks(), origin);
        let directory = Arc::clone(&self.directory);
        let outcome = self
            .handle
            .schedule(request, move |actor, target| {
                directory.teleport(actor, target)
            })
            .await?;
        println!("{}", render::schedule(&outcome));
        Ok(())
    }

    fn actor(&self, name: &str) -> Result<ActorId> {
        self.directory
            .find_by_name(name)
            .ok_or_else(|| anyhow!("{name} is not online"))
    }

    fn position(&self, actor: ActorId) -> Result<Position> {
        self.directory
            .current_position(actor)
            .ok_or_else(|| anyhow!("{} is not online", self.name(actor)))
    }

    pub fn name(&self, actor: ActorId) -> String {
        self.directory
            .name_of(actor)
            .unwrap_or_else(|| actor.to_string())
    }
}

fn default_spawn() -> Position {
    Position::new(WorldId::new("overworld"), 0.0, 64.0, 0.0)
}
