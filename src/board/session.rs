//! Edit-session state machine.
//!
//! `Idle -> Fetching -> Editing -> Committing -> Idle`, with `cancel` leading
//! back to `Idle` from any busy state. Every transition that starts store
//! work hands out a generation number; continuations must present it back
//! and are ignored when it no longer matches the current state.

use crate::error::{NoteError, NoteResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState<D> {
    Idle,
    Fetching { generation: u64 },
    Editing { generation: u64, draft: D },
    Committing { generation: u64, committed: D },
}

impl<D> SessionState<D> {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Fetching { .. } => "fetching",
            SessionState::Editing { .. } => "editing",
            SessionState::Committing { .. } => "committing",
        }
    }
}

/// Result of feeding an asynchronous result back into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation<T> {
    Applied(T),
    /// The session moved on since the request was issued.
    Stale,
}

impl<T> Continuation<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Continuation::Stale)
    }
}

#[derive(Debug, Clone)]
pub struct EditSession<D> {
    state: SessionState<D>,
    generation: u64,
}

impl<D> Default for EditSession<D> {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
        }
    }
}

impl<D: Clone> EditSession<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState<D> {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SessionState::Idle)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, SessionState::Editing { .. })
    }

    /// Start an edit. Returns the generation to stamp on the fetch.
    pub fn begin_fetch(&mut self) -> NoteResult<u64> {
        if !self.is_idle() {
            return Err(NoteError::conflict(format!(
                "cannot open an edit while {}",
                self.state.name()
            )));
        }
        self.generation += 1;
        self.state = SessionState::Fetching {
            generation: self.generation,
        };
        Ok(self.generation)
    }

    /// Apply a fetch result. `Applied(Ok)` means the session is now editing;
    /// `Applied(Err)` means the fetch failed and the session is idle again.
    pub fn on_fetched(
        &mut self,
        generation: u64,
        result: NoteResult<D>,
    ) -> Continuation<NoteResult<()>> {
        match self.state {
            SessionState::Fetching { generation: current } if current == generation => {}
            _ => return Continuation::Stale,
        }

        match result {
            Ok(draft) => {
                self.state = SessionState::Editing { generation, draft };
                Continuation::Applied(Ok(()))
            }
            Err(err) => {
                self.state = SessionState::Idle;
                Continuation::Applied(Err(err))
            }
        }
    }

    pub fn draft(&self) -> Option<&D> {
        match &self.state {
            SessionState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut D> {
        match &mut self.state {
            SessionState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Move the draft into `Committing`. The caller writes it.
    pub fn begin_commit(&mut self) -> NoteResult<(u64, D)> {
        let SessionState::Editing { generation, draft } = &self.state else {
            return Err(NoteError::conflict(format!(
                "no draft to save while {}",
                self.state.name()
            )));
        };

        let (generation, committed) = (*generation, draft.clone());
        self.state = SessionState::Committing {
            generation,
            committed: committed.clone(),
        };
        Ok((generation, committed))
    }

    /// Apply a write acknowledgement. On `Applied` the session is idle and
    /// carries back the committed value together with the write outcome.
    pub fn on_committed(
        &mut self,
        generation: u64,
        result: NoteResult<()>,
    ) -> Continuation<(D, NoteResult<()>)> {
        let committed = match &self.state {
            SessionState::Committing {
                generation: current,
                committed,
            } if *current == generation => committed.clone(),
            _ => return Continuation::Stale,
        };

        self.state = SessionState::Idle;
        Continuation::Applied((committed, result))
    }

    /// Drop whatever is in progress. Outstanding continuations become stale.
    /// Returns whether anything was cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        self.generation += 1;
        self.state = SessionState::Idle;
        true
    }
}
