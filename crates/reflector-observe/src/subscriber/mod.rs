#![cfg(feature = "subscriber")]

//! Taskvisor event subscriber that writes supervisor activity to `tracing`.
//!
//! The reflector runs few supervised tasks (the background rescan), so every
//! event is logged with all fields the event carries.

use async_trait::async_trait;
use taskvisor::{Event, EventKind, Subscribe};
use tracing::Level;

/// Logs every taskvisor event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventLogger;

/// Bounded queue for the subscriber worker; overflow drops events and emits `SubscriberOverflow`.
const EVENT_QUEUE_CAPACITY: usize = 1024;

#[async_trait]
impl Subscribe for EventLogger {
    async fn on_event(&self, event: &Event) {
        log_event(event);
    }

    fn name(&self) -> &'static str {
        "reflector-event-logger"
    }

    fn queue_capacity(&self) -> usize {
        EVENT_QUEUE_CAPACITY
    }
}

macro_rules! emit {
    ($level:expr, $event:expr, $msg:expr) => {{
        let e = $event;
        match $level {
            Level::ERROR => tracing::error!(task = e.task.as_deref(), attempt = e.attempt, reason = e.reason.as_deref(), delay_ms = e.delay_ms, timeout_ms = e.timeout_ms, "{}", $msg),
            Level::WARN => tracing::warn!(task = e.task.as_deref(), attempt = e.attempt, reason = e.reason.as_deref(), delay_ms = e.delay_ms, timeout_ms = e.timeout_ms, "{}", $msg),
            Level::INFO => tracing::info!(task = e.task.as_deref(), attempt = e.attempt, reason = e.reason.as_deref(), delay_ms = e.delay_ms, timeout_ms = e.timeout_ms, "{}", $msg),
            Level::DEBUG => tracing::debug!(task = e.task.as_deref(), attempt = e.attempt, reason = e.reason.as_deref(), delay_ms = e.delay_ms, timeout_ms = e.timeout_ms, "{}", $msg),
            _ => tracing::trace!(task = e.task.as_deref(), attempt = e.attempt, reason = e.reason.as_deref(), delay_ms = e.delay_ms, timeout_ms = e.timeout_ms, "{}", $msg),
        }
    }};
}

fn log_event(event: &Event) {
    emit!(level_for(event), event, message_for(event));
}

/// Severity of an event.
///
/// A failed rescan pass is a warning since it is retried; a dead actor means
/// the rescan stopped for good (malformed global selector).
pub fn level_for(event: &Event) -> Level {
    match event.kind {
        EventKind::ActorDead | EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
            Level::ERROR
        }
        EventKind::TaskFailed
        | EventKind::TimeoutHit
        | EventKind::GraceExceeded
        | EventKind::ControllerRejected => Level::WARN,
        EventKind::ShutdownRequested | EventKind::AllStoppedWithinGrace => Level::INFO,
        EventKind::TaskStarting
        | EventKind::TaskAdded
        | EventKind::BackoffScheduled
        | EventKind::ActorExhausted
        | EventKind::ControllerSlotTransition => Level::DEBUG,
        EventKind::TaskStopped
        | EventKind::TaskAddRequested
        | EventKind::TaskRemoveRequested
        | EventKind::TaskRemoved
        | EventKind::ControllerSubmitted => Level::TRACE,
    }
}

/// Log message for an event.
pub fn message_for(event: &Event) -> &'static str {
    match event.kind {
        EventKind::TaskAddRequested => "task add requested",
        EventKind::TaskAdded => "task added",
        EventKind::TaskRemoveRequested => "task remove requested",
        EventKind::TaskRemoved => "task removed",

        EventKind::ShutdownRequested => "shutdown requested",
        EventKind::AllStoppedWithinGrace => "all tasks stopped within grace period",
        EventKind::GraceExceeded => "grace period exceeded, some tasks did not stop",

        EventKind::SubscriberPanicked => "event subscriber panicked",
        EventKind::SubscriberOverflow => "event subscriber queue overflowed, event dropped",

        EventKind::ActorExhausted => "task will not be restarted",
        EventKind::ActorDead => "task stopped permanently after a fatal error",

        EventKind::TaskStarting => "task starting",
        EventKind::TaskStopped => "task run finished",
        EventKind::TaskFailed => "task run failed, will retry",
        EventKind::TimeoutHit => "task run timed out",
        EventKind::BackoffScheduled if event.reason.is_some() => "retry scheduled after failure",
        EventKind::BackoffScheduled => "next run scheduled",

        EventKind::ControllerRejected => "controller rejected submission",
        EventKind::ControllerSubmitted => "controller accepted submission",
        EventKind::ControllerSlotTransition => "controller slot changed state",
    }
}
