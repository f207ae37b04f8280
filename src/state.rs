use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use teloxide::types::ChatId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::quiz::QUESTION_COUNT;

/// Quiz progress of one conversation.
///
/// The cursor is the number of recorded answers, so it can never disagree
/// with them.
#[derive(Debug, Clone)]
pub struct Session {
    chat_id: ChatId,
    answers: Vec<bool>,
    display_name: Option<String>,
    last_activity: Instant,
}

impl Session {
    fn new(chat_id: ChatId, display_name: Option<String>) -> Self {
        Self {
            chat_id,
            answers: Vec::with_capacity(QUESTION_COUNT),
            display_name,
            last_activity: Instant::now(),
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn cursor(&self) -> usize {
        self.answers.len()
    }

    pub fn answers(&self) -> &[bool] {
        &self.answers
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor() >= QUESTION_COUNT
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// In-memory sessions keyed by chat.
///
/// Every table operation is atomic. Callers that read and then write a
/// session across awaits take the per-chat gate with [`SessionStore::lock`].
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, Session>>,
    gates: Mutex<HashMap<ChatId, Arc<AsyncMutex<()>>>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh session, discarding any previous progress for the chat.
    pub fn create(&self, chat_id: ChatId, display_name: Option<String>) -> Session {
        let session = Session::new(chat_id, display_name);
        guard(&self.sessions).insert(chat_id, session.clone());
        session
    }

    pub fn get(&self, chat_id: ChatId) -> Option<Session> {
        guard(&self.sessions).get(&chat_id).cloned()
    }

    /// Appends an answer. Returns `None` when there is no session or it is
    /// already complete.
    pub fn record_answer(&self, chat_id: ChatId, answer: bool) -> Option<Session> {
        let mut sessions = guard(&self.sessions);
        let session = sessions.get_mut(&chat_id)?;
        if session.is_complete() {
            return None;
        }
        session.answers.push(answer);
        session.last_activity = Instant::now();
        Some(session.clone())
    }

    pub fn delete(&self, chat_id: ChatId) {
        guard(&self.sessions).remove(&chat_id);
    }

    pub fn len(&self) -> usize {
        guard(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes engine operations on one chat.
    pub async fn lock(&self, chat_id: ChatId) -> ChatGate<'_> {
        let gate = guard(&self.gates)
            .entry(chat_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        ChatGate {
            store: self,
            chat_id,
            held: Some(gate.lock_owned().await),
        }
    }

    /// Forgets the gate of a chat without a session once nobody holds or
    /// waits on it.
    fn release_gate(&self, chat_id: ChatId) {
        let sessions = guard(&self.sessions);
        if sessions.contains_key(&chat_id) {
            return;
        }
        let mut gates = guard(&self.gates);
        if gates
            .get(&chat_id)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            gates.remove(&chat_id);
        }
    }

    #[cfg(test)]
    pub(crate) fn gate_count(&self) -> usize {
        guard(&self.gates).len()
    }

    /// Drops sessions idle for at least `max_idle` and returns how many went.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = guard(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, session| session.idle_for() < max_idle);
        let evicted = before - sessions.len();

        // A gate still referenced elsewhere belongs to a running operation.
        guard(&self.gates).retain(|chat_id, gate| {
            sessions.contains_key(chat_id) || Arc::strong_count(gate) > 1
        });

        evicted
    }
}

/// Exclusive access to one chat, released on drop.
pub struct ChatGate<'a> {
    store: &'a SessionStore,
    chat_id: ChatId,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for ChatGate<'_> {
    fn drop(&mut self) {
        // Unlock first so the table only holds the gate's last reference.
        drop(self.held.take());
        self.store.release_gate(self.chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ChatId = ChatId(42);

    #[test]
    fn test_create_starts_empty() {
        let store = SessionStore::new();
        let session = store.create(CHAT, Some("alice".into()));
        assert_eq!(session.cursor(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.display_name(), Some("alice"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_overwrites_progress() {
        let store = SessionStore::new();
        store.create(CHAT, None);
        store.record_answer(CHAT, true);
        store.record_answer(CHAT, false);

        let session = store.create(CHAT, Some("bob".into()));
        assert_eq!(session.cursor(), 0);
        assert_eq!(store.get(CHAT).unwrap().cursor(), 0);
        assert_eq!(store.get(CHAT).unwrap().display_name(), Some("bob"));
    }

    #[test]
    fn test_record_answer_without_session_is_noop() {
        let store = SessionStore::new();
        assert!(store.record_answer(CHAT, true).is_none());
        assert!(store.get(CHAT).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_record_answer_stops_at_completion() {
        let store = SessionStore::new();
        store.create(CHAT, None);
        for idx in 0..QUESTION_COUNT {
            let session = store.record_answer(CHAT, idx % 2 == 0).unwrap();
            assert_eq!(session.cursor(), idx + 1);
            assert_eq!(session.answers().len(), session.cursor());
        }

        assert!(store.get(CHAT).unwrap().is_complete());
        assert!(store.record_answer(CHAT, true).is_none());
        assert_eq!(store.get(CHAT).unwrap().cursor(), QUESTION_COUNT);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = SessionStore::new();
        store.create(CHAT, None);
        store.delete(CHAT);
        store.delete(CHAT);
        assert!(store.get(CHAT).is_none());
    }

    #[test]
    fn test_sessions_are_independent_per_chat() {
        let store = SessionStore::new();
        store.create(ChatId(1), None);
        store.create(ChatId(2), None);
        store.record_answer(ChatId(1), true);

        assert_eq!(store.get(ChatId(1)).unwrap().answers(), &[true]);
        assert!(store.get(ChatId(2)).unwrap().answers().is_empty());
    }

    #[test]
    fn test_evict_idle() {
        let store = SessionStore::new();
        store.create(CHAT, None);

        assert_eq!(store.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(store.len(), 1);

        assert_eq!(store.evict_idle(Duration::ZERO), 1);
        assert!(store.get(CHAT).is_none());
    }

    #[tokio::test]
    async fn test_lock_serializes_same_chat() {
        let store = Arc::new(SessionStore::new());
        let held = store.lock(CHAT).await;

        let other = store.clone();
        let waiter = tokio::spawn(async move {
            let _gate = other.lock(CHAT).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // A different chat does not wait on the held gate.
        let _unrelated = store.lock(ChatId(7)).await;

        drop(held);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_gate_is_dropped_with_its_session() {
        let store = SessionStore::new();

        {
            let _gate = store.lock(CHAT).await;
            store.create(CHAT, None);
        }
        assert_eq!(store.gate_count(), 1);

        {
            let _gate = store.lock(CHAT).await;
            store.delete(CHAT);
        }
        assert_eq!(store.gate_count(), 0);

        for id in 0..1000 {
            let _gate = store.lock(ChatId(id)).await;
            store.create(ChatId(id), None);
            store.delete(ChatId(id));
        }
        assert!(store.is_empty());
        assert_eq!(store.gate_count(), 0);
    }

    #[tokio::test]
    async fn test_gate_survives_while_someone_waits() {
        let store = Arc::new(SessionStore::new());
        let held = store.lock(CHAT).await;

        let other = store.clone();
        let waiter = tokio::spawn(async move {
            let _gate = other.lock(CHAT).await;
            other.create(CHAT, None);
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(held);
        assert_eq!(store.gate_count(), 1);

        waiter.await.unwrap();
        assert!(store.get(CHAT).is_some());
        assert_eq!(store.gate_count(), 1);
    }
}
