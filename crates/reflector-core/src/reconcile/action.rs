use std::time::Duration;

/// What the caller's work queue should do with a parent after a reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Do nothing until the parent changes again.
    AwaitChange,
    /// Reconcile again immediately.
    RequeueNow,
    /// Reconcile again after the given delay.
    RequeueAfter(Duration),
}

impl ReconcileAction {
    /// Success action for an optional periodic re-check interval.
    pub fn after(interval: Option<Duration>) -> Self {
        interval.map_or(ReconcileAction::AwaitChange, ReconcileAction::RequeueAfter)
    }

    /// Delay before the next attempt, if any. `RequeueNow` yields zero.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            ReconcileAction::AwaitChange => None,
            ReconcileAction::RequeueNow => Some(Duration::ZERO),
            ReconcileAction::RequeueAfter(d) => Some(*d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn after_maps_optional_interval() {
        assert_eq!(ReconcileAction::after(None), ReconcileAction::AwaitChange);
        assert_eq!(
            ReconcileAction::after(Some(Duration::from_secs(60))),
            ReconcileAction::RequeueAfter(Duration::from_secs(60))
        );
    }

    #[test]
    fn delay_reports_requeue_timing() {
        assert_eq!(ReconcileAction::AwaitChange.delay(), None);
        assert_eq!(ReconcileAction::RequeueNow.delay(), Some(Duration::ZERO));
        assert_eq!(
            ReconcileAction::RequeueAfter(Duration::from_secs(30)).delay(),
            Some(Duration::from_secs(30))
        );
    }
}
