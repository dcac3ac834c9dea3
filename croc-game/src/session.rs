//! Per-chat session storage with sliding expiration.
//!
//! Every chat gets at most one [`Session`], shared through a [`SessionHandle`].
//! The handle wraps a mutex, so one engine call can read, decide and write
//! without another call on the same chat slipping in between. Chats live in
//! different map slots and different mutexes, so they never wait on each other
//! for longer than a map shard lookup.
//!
//! # Expiration
//!
//! Each entry remembers when it was last touched. Entries idle for longer than
//! the TTL are treated as absent on lookup and removed by [`SessionStore::sweep_expired`]
//! (run periodically by [`SessionStore::spawn_janitor`]). An entry whose handle is
//! still held somewhere is never removed.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use croc_common::util::format_duration;

use crate::catalog::WordPack;
use crate::{ChatId, ParticipantId};

/// Idle TTLs below this are raised to it.
pub const MIN_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Shortest period the janitor will sweep at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// Session
// ============================================================================

/// The secret word of a running round and its cached definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRound {
    pub word: String,
    /// `None` when the dictionary had nothing for the word.
    pub definition: Option<String>,
}

/// Game state for one chat.
///
/// A definition can only exist inside an [`ActiveRound`], so "definition
/// implies word" holds by construction.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pack: Option<Arc<WordPack>>,
    round: Option<ActiveRound>,
    /// Kept after the round ends so the last host is still known.
    host: Option<ParticipantId>,
}

impl Session {
    /// A fresh, inactive session using `pack`.
    pub fn new(pack: Option<Arc<WordPack>>) -> Self {
        Self {
            pack,
            round: None,
            host: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.round.is_some()
    }

    pub fn pack(&self) -> Option<&Arc<WordPack>> {
        self.pack.as_ref()
    }

    pub fn round(&self) -> Option<&ActiveRound> {
        self.round.as_ref()
    }

    /// The secret word, or `None` when no round is running.
    pub fn current_word(&self) -> Option<&str> {
        self.round.as_ref().map(|r| r.word.as_str())
    }

    pub fn current_definition(&self) -> Option<&str> {
        self.round.as_ref().and_then(|r| r.definition.as_deref())
    }

    /// Current host, or the last one if the round is over.
    pub fn host(&self) -> Option<ParticipantId> {
        self.host
    }

    pub fn is_host(&self, participant_id: ParticipantId) -> bool {
        self.host == Some(participant_id)
    }

    pub(crate) fn set_pack(&mut self, pack: Arc<WordPack>) {
        self.pack = Some(pack);
    }

    pub(crate) fn start_round(&mut self, host: ParticipantId, round: ActiveRound) {
        self.host = Some(host);
        self.round = Some(round);
    }

    /// Swap the word, keeping the host.
    pub(crate) fn replace_round(&mut self, round: ActiveRound) {
        self.round = Some(round);
    }

    /// End the round. The host is remembered.
    pub(crate) fn end_round(&mut self) -> Option<ActiveRound> {
        self.round.take()
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Shared access to one chat's session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    chat_id: ChatId,
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Lock the session for a read-modify-write step.
    ///
    /// A poisoned lock is recovered: sessions are only changed through the
    /// small setters above, none of which can leave them half-written.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct Slot {
    session: Arc<Mutex<Session>>,
    last_access: Instant,
}

impl Slot {
    fn new(session: Session, now: Instant) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            last_access: now,
        }
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_access) >= ttl
    }

    fn in_flight(&self) -> bool {
        Arc::strong_count(&self.session) > 1
    }
}

// ============================================================================
// Store
// ============================================================================

/// All chat sessions, keyed by chat id.
pub struct SessionStore {
    sessions: DashMap<ChatId, Slot>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store; `ttl` is raised to [`MIN_SESSION_TTL`] if lower.
    pub fn new(ttl: Duration) -> Self {
        let ttl = if ttl < MIN_SESSION_TTL {
            tracing::warn!(
                configured = %format_duration(ttl),
                applied = %format_duration(MIN_SESSION_TTL),
                "Session TTL below minimum, clamping"
            );
            MIN_SESSION_TTL
        } else {
            ttl
        };

        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Effective idle TTL after clamping.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the chat's session, creating it with `init` if missing or expired.
    ///
    /// Refreshes the idle clock. `init` runs outside the map lock and may be
    /// discarded if another caller creates the session first.
    pub fn get_or_create<F>(&self, chat_id: ChatId, init: F) -> SessionHandle
    where
        F: FnOnce() -> Session,
    {
        let now = Instant::now();
        if let Some(handle) = self.touch_live(chat_id, now) {
            return handle;
        }

        let fresh = init();
        let session = match self.sessions.entry(chat_id) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                if slot.is_expired(now, self.ttl) && !slot.in_flight() {
                    tracing::debug!(chat_id, "Session expired, starting fresh");
                    *slot = Slot::new(fresh, now);
                } else {
                    slot.last_access = now;
                }
                Arc::clone(&slot.session)
            }
            Entry::Vacant(vacant) => {
                tracing::debug!(chat_id, "Session created");
                Arc::clone(&vacant.insert(Slot::new(fresh, now)).session)
            }
        };

        SessionHandle {
            chat_id,
            inner: session,
        }
    }

    /// Get the chat's session without creating it or refreshing its clock.
    ///
    /// Expired entries count as absent even before the sweep removes them.
    pub fn try_get(&self, chat_id: ChatId) -> Option<SessionHandle> {
        let now = Instant::now();
        let slot = self.sessions.get(&chat_id)?;
        if slot.is_expired(now, self.ttl) {
            return None;
        }
        Some(SessionHandle {
            chat_id,
            inner: Arc::clone(&slot.session),
        })
    }

    /// Refresh the idle clock of a live session. Returns whether it existed.
    ///
    /// Must not be called while holding that session's lock guard.
    pub fn touch(&self, chat_id: ChatId) -> bool {
        self.touch_live(chat_id, Instant::now()).is_some()
    }

    fn touch_live(&self, chat_id: ChatId, now: Instant) -> Option<SessionHandle> {
        let mut slot = self.sessions.get_mut(&chat_id)?;
        if slot.is_expired(now, self.ttl) {
            return None;
        }
        slot.last_access = now;
        Some(SessionHandle {
            chat_id,
            inner: Arc::clone(&slot.session),
        })
    }

    /// Snapshot of chats with a running round.
    ///
    /// Best effort: rounds starting or ending during the call may or may not
    /// be included.
    pub fn list_active(&self) -> Vec<ChatId> {
        let now = Instant::now();
        let handles: Vec<SessionHandle> = self
            .sessions
            .iter()
            .filter(|slot| !slot.is_expired(now, self.ttl))
            .map(|slot| SessionHandle {
                chat_id: *slot.key(),
                inner: Arc::clone(&slot.session),
            })
            .collect();

        // Session locks are taken only after the map iteration has released its shards.
        let mut active: Vec<ChatId> = handles
            .into_iter()
            .filter(|handle| handle.lock().is_active())
            .map(|handle| handle.chat_id)
            .collect();
        active.sort_unstable();
        active
    }

    /// Remove idle entries nobody is using. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let before = self.sessions.len();

        self.sessions
            .retain(|_, slot| !slot.is_expired(now, ttl) || slot.in_flight());

        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.sessions.len(), "Swept idle sessions");
        }
        removed
    }

    /// Run [`sweep_expired`](Self::sweep_expired) every `every` until the store is dropped.
    ///
    /// Periods shorter than [`MIN_SWEEP_INTERVAL`] are raised to it.
    pub fn spawn_janitor(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let every = if every < MIN_SWEEP_INTERVAL {
            tracing::warn!(
                requested = ?every,
                every = %format_duration(MIN_SWEEP_INTERVAL),
                "Sweep interval too short, using the minimum"
            );
            MIN_SWEEP_INTERVAL
        } else {
            every
        };
        let store = Arc::downgrade(self);
        tracing::debug!(every = %format_duration(every), "Starting session janitor");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick fires immediately; nothing can be idle yet.
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(store) = store.upgrade() else {
                    tracing::debug!("Session store dropped, janitor exiting");
                    break;
                };
                store.sweep_expired();
            }
        })
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
