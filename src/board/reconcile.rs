/// What a panel shows versus what the store last confirmed.
///
/// Remote updates that arrive while an edit is in progress are parked in
/// `pending` (latest wins) and applied once the panel settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciler<T> {
    shown: T,
    confirmed: T,
    pending: Option<T>,
}

impl<T: Clone> Reconciler<T> {
    pub fn new(initial: T) -> Self {
        Self {
            shown: initial.clone(),
            confirmed: initial,
            pending: None,
        }
    }

    pub fn shown(&self) -> &T {
        &self.shown
    }

    pub fn confirmed(&self) -> &T {
        &self.confirmed
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take a remote value. Returns whether it was rendered right away.
    pub fn receive(&mut self, value: T, idle: bool) -> bool {
        if idle {
            self.shown = value.clone();
            self.confirmed = value;
            self.pending = None;
            true
        } else {
            self.pending = Some(value);
            false
        }
    }

    /// Render a value the store has not acknowledged yet.
    pub fn show_provisional(&mut self, value: T) {
        self.shown = value;
    }

    /// Back to idle: apply the parked update if any, else the last confirmed
    /// value. Returns whether a parked update was applied.
    pub fn settle(&mut self) -> bool {
        match self.pending.take() {
            Some(value) => {
                self.shown = value.clone();
                self.confirmed = value;
                true
            }
            None => {
                self.shown = self.confirmed.clone();
                false
            }
        }
    }

    /// Back to idle after an acknowledged write.
    pub fn settle_committed(&mut self, committed: T) -> bool {
        self.confirmed = committed;
        self.settle()
    }

    /// Apply a local change to everything known about the document.
    pub fn update_all(&mut self, mut apply: impl FnMut(&mut T)) {
        apply(&mut self.shown);
        apply(&mut self.confirmed);
        if let Some(pending) = self.pending.as_mut() {
            apply(pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_updates_render_immediately() {
        let mut r = Reconciler::new(0);
        assert!(r.receive(1, true));
        assert_eq!(*r.shown(), 1);
        assert_eq!(*r.confirmed(), 1);
    }

    #[test]
    fn test_busy_updates_are_buffered_latest_wins() {
        let mut r = Reconciler::new(0);
        assert!(!r.receive(1, false));
        assert!(!r.receive(2, false));
        assert_eq!(*r.shown(), 0);
        assert!(r.has_pending());

        assert!(r.settle());
        assert_eq!(*r.shown(), 2);
        assert_eq!(*r.confirmed(), 2);
        assert!(!r.has_pending());
    }

    #[test]
    fn test_settle_without_pending_reverts_provisional() {
        let mut r = Reconciler::new(5);
        r.show_provisional(9);
        assert_eq!(*r.shown(), 9);

        assert!(!r.settle());
        assert_eq!(*r.shown(), 5);
    }

    #[test]
    fn test_settle_committed_keeps_written_value() {
        let mut r = Reconciler::new(5);
        r.show_provisional(9);
        r.settle_committed(9);
        assert_eq!(*r.shown(), 9);
        assert_eq!(*r.confirmed(), 9);
    }

    #[test]
    fn test_update_all_touches_pending() {
        let mut r = Reconciler::new(1);
        r.receive(2, false);
        r.update_all(|v| *v *= 10);
        assert_eq!(*r.shown(), 10);
        r.settle();
        assert_eq!(*r.shown(), 20);
    }
}
