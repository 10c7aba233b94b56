//! Inline edit buffer
//!
//! Holds the single row currently being edited in the user table. Every
//! change bumps a revision; a commit ships the snapshot at that revision and
//! the row counts as touched until a commit at or beyond the latest revision
//! has completed. Keystrokes that land while a commit is in flight therefore
//! stay touched, and a second commit of the same revision is never sent.

use super::types::{User, UserField};

#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    session: Option<EditSession>,
    generation: u64,
}

#[derive(Debug, Clone)]
struct EditSession {
    generation: u64,
    /// Row as displayed, with local changes merged in
    snapshot: User,
    /// Last value believed to be stored on the server
    baseline: User,
    /// Latest local value per changed field, replayed over refreshed rows
    pending: Vec<UserField>,
    revision: u64,
    settled: u64,
    in_flight: Option<u64>,
}

/// A commit handed to the network layer, returned to [`EditBuffer::finish`]
/// once the request completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTicket {
    payload: User,
    baseline: User,
    revision: u64,
    generation: u64,
}

impl CommitTicket {
    /// Full user record to send with `PATCH /user`
    pub fn payload(&self) -> &User {
        &self.payload
    }

    pub fn user_name(&self) -> &str {
        &self.payload.user_name
    }

    pub fn into_payload(self) -> User {
        self.payload
    }
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing `user`. Re-opening the row already being edited keeps
    /// its pending state.
    pub fn open(&mut self, user: &User) {
        if self.user_name() == Some(user.user_name.as_str()) {
            return;
        }

        self.generation += 1;
        self.session = Some(EditSession {
            generation: self.generation,
            snapshot: user.clone(),
            baseline: user.clone(),
            pending: Vec::new(),
            revision: 0,
            settled: 0,
            in_flight: None,
        });
    }

    pub fn user_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.snapshot.user_name.as_str())
    }

    pub fn snapshot(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.snapshot)
    }

    /// Whether the row changed since its last completed commit
    pub fn is_touched(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.revision > s.settled)
            .unwrap_or(false)
    }

    pub fn is_in_flight(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.in_flight.is_some())
            .unwrap_or(false)
    }

    /// Merge a field change into the snapshot and return the updated row
    pub fn change(&mut self, field: UserField) -> Option<&User> {
        let session = self.session.as_mut()?;

        session.revision += 1;
        session.snapshot.apply(field);
        session.pending.retain(|f| f.id() != field.id());
        session.pending.push(field);

        Some(&session.snapshot)
    }

    /// Hand out the current snapshot for sending, if it has unsent changes
    pub fn commit(&mut self) -> Option<CommitTicket> {
        let session = self.session.as_mut()?;

        if session.revision <= session.settled || session.in_flight == Some(session.revision) {
            return None;
        }

        session.in_flight = Some(session.revision);
        Some(CommitTicket {
            payload: session.snapshot.clone(),
            baseline: session.baseline.clone(),
            revision: session.revision,
            generation: session.generation,
        })
    }

    /// Record the outcome of a commit. Returns the row to display instead
    /// when a failed commit has to be rolled back.
    pub fn finish(&mut self, ticket: &CommitTicket, succeeded: bool) -> Option<User> {
        let session = match self.session.as_mut() {
            Some(session) if session.generation == ticket.generation => session,
            other => {
                if succeeded {
                    return None;
                }
                // The row is no longer the active edit. A re-opened session
                // on the same row keeps what the user typed since.
                if let Some(session) = other {
                    if session.snapshot.user_name == ticket.payload.user_name {
                        session.baseline = ticket.baseline.clone();
                        if session.revision > session.settled {
                            return None;
                        }
                        session.snapshot = ticket.baseline.clone();
                    }
                }
                return Some(ticket.baseline.clone());
            }
        };

        if session.in_flight == Some(ticket.revision) {
            session.in_flight = None;
        }
        let newest = ticket.revision >= session.settled;
        session.settled = session.settled.max(ticket.revision);
        let superseded = session.revision > ticket.revision;

        if succeeded {
            if newest {
                session.baseline = ticket.payload.clone();
            }
            if !superseded {
                session.pending.clear();
            }
            None
        } else if superseded {
            None
        } else {
            session.pending.clear();
            session.snapshot = session.baseline.clone();
            Some(session.baseline.clone())
        }
    }

    /// Re-base the open edit onto a freshly fetched row. Returns the row to
    /// display when local changes are still pending on top of it.
    pub fn rebase(&mut self, fresh: Option<&User>) -> Option<User> {
        let Some(fresh) = fresh else {
            self.session = None;
            return None;
        };
        let session = self.session.as_mut()?;

        session.baseline = fresh.clone();
        session.snapshot = fresh.clone();
        if session.revision > session.settled || session.in_flight.is_some() {
            for field in &session.pending {
                session.snapshot.apply(*field);
            }
            Some(session.snapshot.clone())
        } else {
            session.pending.clear();
            None
        }
    }

    pub fn close(&mut self) {
        self.session = None;
    }
}
