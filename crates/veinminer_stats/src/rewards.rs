//! # Milestone Rewards
//!
//! Granting happens on whatever thread recorded the vein; rewards touch the
//! host (chat, console commands) and must run on the host's main thread.
//! Grants are therefore queued and delivered later by the host.
//!
//! ```text
//!   record_vein_mine ──> [grant channel] ──> deliver_pending(sink) ──> message
//!   (any thread)                              (host main thread)      commands
//! ```
//!
//! Because delivery is decoupled in time from the break that earned it, the
//! player's presence is re-checked immediately before every action.

use std::collections::BTreeMap;

use crossbeam_channel::{Receiver, Sender};

use crate::milestones::MilestoneGrant;
use crate::player::PlayerId;

/// What a milestone grant does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardSettings {
    /// Chat message template; `{threshold}` and `{player}` are substituted.
    /// Empty disables the message.
    pub message: String,
    /// Console command templates per threshold.
    pub commands: BTreeMap<u64, Vec<String>>,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            message: "&6Milestone reached: {threshold} blocks vein mined!".to_string(),
            commands: BTreeMap::new(),
        }
    }
}

/// The host side of reward delivery.
pub trait RewardSink {
    /// Returns true if the player is currently connected.
    fn is_online(&self, player: PlayerId) -> bool;

    /// Sends a chat message to the player.
    fn send_message(&mut self, player: PlayerId, message: &str);

    /// Runs a console command.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure; it is logged and the remaining
    /// commands still run.
    fn dispatch_command(&mut self, command: &str) -> Result<(), String>;
}

/// Outcome of one delivery pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Grants taken off the queue.
    pub grants: usize,
    /// Messages sent.
    pub messages: usize,
    /// Commands that ran successfully.
    pub commands: usize,
    /// Commands that reported a failure.
    pub failed_commands: usize,
    /// Actions skipped because the player had left.
    pub skipped_offline: usize,
}

/// Substitutes `{player}` and `{threshold}` in a template.
#[must_use]
pub fn render(template: &str, player_name: &str, threshold: u64) -> String {
    template
        .replace("{player}", player_name)
        .replace("{threshold}", &threshold.to_string())
}

/// Unbounded queue of grants awaiting delivery.
///
/// Only [`RewardQueue::deliver_pending`] and [`RewardQueue::discard_for`]
/// shrink it; a host must drain it regularly from its main loop.
#[derive(Debug)]
pub struct RewardQueue {
    /// Producer side, cloned into recorders.
    tx: Sender<MilestoneGrant>,
    /// Consumer side, drained by the host.
    rx: Receiver<MilestoneGrant>,
}

impl RewardQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// Queues a grant.
    pub fn push(&self, grant: MilestoneGrant) {
        // Both ends live in `self`, so the channel cannot be disconnected
        let _ = self.tx.send(grant);
    }

    /// Number of grants waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Removes and returns every waiting grant.
    pub fn drain(&self) -> Vec<MilestoneGrant> {
        self.rx.try_iter().collect()
    }

    /// Drops every waiting grant of `player`, e.g. once the player left.
    /// Other grants keep their order. Returns how many were dropped.
    pub fn discard_for(&self, player: PlayerId) -> usize {
        let mut dropped = 0;
        for grant in self.drain() {
            if grant.player == player {
                dropped += 1;
            } else {
                self.push(grant);
            }
        }
        dropped
    }

    /// Delivers every waiting grant through `sink`.
    pub fn deliver_pending(&self, settings: &RewardSettings, sink: &mut dyn RewardSink) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for grant in self.drain() {
            report.grants += 1;
            deliver(&grant, settings, sink, &mut report);
        }

        report
    }
}

impl Default for RewardQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn deliver(grant: &MilestoneGrant, settings: &RewardSettings, sink: &mut dyn RewardSink, report: &mut DeliveryReport) {
    if !settings.message.is_empty() {
        if sink.is_online(grant.player) {
            let message = render(&settings.message, &grant.player_name, grant.threshold);
            sink.send_message(grant.player, &message);
            report.messages += 1;
        } else {
            report.skipped_offline += 1;
        }
    }

    let Some(commands) = settings.commands.get(&grant.threshold) else {
        return;
    };

    for template in commands {
        if !sink.is_online(grant.player) {
            report.skipped_offline += 1;
            continue;
        }
        let command = render(template, &grant.player_name, grant.threshold);
        match sink.dispatch_command(&command) {
            Ok(()) => report.commands += 1,
            Err(e) => {
                report.failed_commands += 1;
                tracing::warn!(
                    player = %grant.player_name,
                    threshold = grant.threshold,
                    command = %command,
                    error = %e,
                    "milestone reward command failed"
                );
            }
        }
    }
}
