//! Remote sync backends.
//!
//! A backend holds one task collection per identity and pushes whole
//! snapshots to subscribers. Writes are reported back only as success or
//! failure; the new state always arrives as a snapshot.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::mpsc::Sender;

use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::task::{Task, TaskId, TaskPatch};

/// Authenticated user. `uid` keys the remote collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// First word of the display name, or `User`.
    pub fn first_name(&self) -> &str {
        self.display_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or("User")
    }
}

/// Message pushed by a backend to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    /// Full collection, newest `createdAt` first.
    Snapshot(Vec<Task>),
    Error(RemoteError),
}

/// Live subscription. Released on [`Subscription::unsubscribe`] or drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Stop receiving events. Calling it again does nothing.
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub const fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Operations the task store needs from a remote backend.
pub trait SyncAdapter {
    /// Start streaming snapshots of `identity`'s collection into `sink`.
    fn subscribe(
        &self,
        identity: &Identity,
        sink: Sender<RemoteEvent>,
    ) -> Result<Subscription, RemoteError>;

    /// Create or overwrite a task.
    fn put(&self, identity: &Identity, task: &Task) -> Result<(), RemoteError>;

    /// Update fields of an existing task.
    fn patch(&self, identity: &Identity, id: &TaskId, patch: &TaskPatch) -> Result<(), RemoteError>;

    fn delete(&self, identity: &Identity, id: &TaskId) -> Result<(), RemoteError>;
}

type Collections = BTreeMap<String, BTreeMap<TaskId, Task>>;

struct Listener {
    id: u64,
    uid: String,
    sink: Sender<RemoteEvent>,
}

#[derive(Default)]
struct RemoteState {
    collections: Collections,
    listeners: Vec<Listener>,
    next_listener: u64,
    fail_writes: bool,
    mirror: Option<PathBuf>,
}

impl RemoteState {
    fn snapshot(&self, uid: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .collections
            .get(uid)
            .map(|tasks| tasks.values().cloned().collect())
            .unwrap_or_default();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    fn broadcast(&mut self, uid: &str, event: &RemoteEvent) {
        self.listeners
            .retain(|listener| listener.uid != uid || listener.sink.send(event.clone()).is_ok());
    }

    fn notify(&mut self, uid: &str) {
        let event = RemoteEvent::Snapshot(self.snapshot(uid));
        self.broadcast(uid, &event);
    }

    fn check_writable(&self) -> Result<(), RemoteError> {
        if self.fail_writes {
            return Err(RemoteError::Write("backend rejected the write".into()));
        }
        Ok(())
    }

    /// Mirror `next` to disk, then make it current. On error nothing changes.
    fn commit(&mut self, next: Collections) -> Result<(), RemoteError> {
        self.persist(&next)?;
        self.collections = next;
        Ok(())
    }

    fn persist(&self, collections: &Collections) -> Result<(), RemoteError> {
        let Some(path) = &self.mirror else {
            return Ok(());
        };
        let data = serde_json::to_string_pretty(collections)
            .map_err(|err| RemoteError::Write(err.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| RemoteError::Write(err.to_string()))?;
        }
        fs::write(path, data).map_err(|err| RemoteError::Write(err.to_string()))?;
        debug!(path = %path.display(), "Mirrored remote collections");
        Ok(())
    }
}

/// In-process backend, optionally mirrored to a JSON file.
///
/// Clones share the same collections. Single-threaded by construction.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    state: Rc<RefCell<RemoteState>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose collections live in `path`. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RemoteError> {
        let path = path.as_ref().to_path_buf();
        let collections: Collections = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).map_err(|err| {
                RemoteError::Unavailable(format!("{}: {err}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Collections::new(),
            Err(err) => {
                return Err(RemoteError::Unavailable(format!("{}: {err}", path.display())));
            }
        };
        let remote = Self::new();
        {
            let mut state = remote.state.borrow_mut();
            state.collections = collections;
            state.mirror = Some(path);
        }
        Ok(remote)
    }

    /// Make every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    /// Push a subscription error to everyone listening on `uid`.
    pub fn emit_error(&self, uid: &str, error: RemoteError) {
        self.state
            .borrow_mut()
            .broadcast(uid, &RemoteEvent::Error(error));
    }

    pub fn listener_count(&self, uid: &str) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|listener| listener.uid == uid)
            .count()
    }

    /// Current collection for `uid`, newest first.
    pub fn collection(&self, uid: &str) -> Vec<Task> {
        self.state.borrow().snapshot(uid)
    }
}

impl SyncAdapter for MemoryRemote {
    fn subscribe(
        &self,
        identity: &Identity,
        sink: Sender<RemoteEvent>,
    ) -> Result<Subscription, RemoteError> {
        let mut state = self.state.borrow_mut();
        let id = state.next_listener;
        state.next_listener += 1;
        sink.send(RemoteEvent::Snapshot(state.snapshot(&identity.uid)))
            .map_err(|_| RemoteError::Unavailable("subscriber hung up".into()))?;
        state.listeners.push(Listener {
            id,
            uid: identity.uid.clone(),
            sink,
        });
        debug!(uid = %identity.uid, listener = id, "Subscribed");

        let weak: Weak<RefCell<RemoteState>> = Rc::downgrade(&self.state);
        Ok(Subscription::new(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            match state.try_borrow_mut() {
                Ok(mut state) => state.listeners.retain(|listener| listener.id != id),
                Err(_) => warn!(listener = id, "Remote busy, listener not released"),
            };
        }))
    }

    fn put(&self, identity: &Identity, task: &Task) -> Result<(), RemoteError> {
        let mut state = self.state.borrow_mut();
        state.check_writable()?;
        let mut next = state.collections.clone();
        next.entry(identity.uid.clone())
            .or_default()
            .insert(task.id.clone(), task.clone());
        state.commit(next)?;
        state.notify(&identity.uid);
        Ok(())
    }

    fn patch(&self, identity: &Identity, id: &TaskId, patch: &TaskPatch) -> Result<(), RemoteError> {
        let mut state = self.state.borrow_mut();
        state.check_writable()?;
        let mut next = state.collections.clone();
        next.get_mut(&identity.uid)
            .and_then(|tasks| tasks.get_mut(id))
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?
            .apply(patch);
        state.commit(next)?;
        state.notify(&identity.uid);
        Ok(())
    }

    fn delete(&self, identity: &Identity, id: &TaskId) -> Result<(), RemoteError> {
        let mut state = self.state.borrow_mut();
        state.check_writable()?;
        let mut next = state.collections.clone();
        if let Some(tasks) = next.get_mut(&identity.uid) {
            tasks.remove(id);
        }
        state.commit(next)?;
        state.notify(&identity.uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::task::{TaskInput, TaskStatus};

    fn task(title: &str, created_secs: i64) -> Task {
        let fields = TaskInput::new(title, "2024-03-15").validate().unwrap();
        Task::new(fields, Utc.timestamp_opt(created_secs, 0).unwrap())
    }

    fn latest(rx: &mpsc::Receiver<RemoteEvent>) -> Option<RemoteEvent> {
        rx.try_iter().last()
    }

    #[test]
    fn subscribe_delivers_initial_and_later_snapshots() {
        let remote = MemoryRemote::new();
        let alice = Identity::new("alice");
        let (tx, rx) = mpsc::channel();
        let _sub = remote.subscribe(&alice, tx).unwrap();
        assert_eq!(latest(&rx), Some(RemoteEvent::Snapshot(vec![])));

        let older = task("older", 10);
        let newer = task("newer", 20);
        remote.put(&alice, &older).unwrap();
        remote.put(&alice, &newer).unwrap();

        let Some(RemoteEvent::Snapshot(tasks)) = latest(&rx) else {
            panic!("expected snapshot");
        };
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["newer", "older"]);
    }

    #[test]
    fn collections_are_per_identity() {
        let remote = MemoryRemote::new();
        remote.put(&Identity::new("a"), &task("mine", 1)).unwrap();
        assert_eq!(remote.collection("a").len(), 1);
        assert!(remote.collection("b").is_empty());
    }

    #[test]
    fn unsubscribe_is_idempotent_and_drop_releases() {
        let remote = MemoryRemote::new();
        let bob = Identity::new("bob");
        let (tx, _rx) = mpsc::channel();
        let mut sub = remote.subscribe(&bob, tx.clone()).unwrap();
        assert_eq!(remote.listener_count("bob"), 1);
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(remote.listener_count("bob"), 0);

        {
            let _sub = remote.subscribe(&bob, tx).unwrap();
            assert_eq!(remote.listener_count("bob"), 1);
        }
        assert_eq!(remote.listener_count("bob"), 0);
    }

    #[test]
    fn patch_unknown_id_is_not_found() {
        let remote = MemoryRemote::new();
        let err = remote
            .patch(
                &Identity::new("a"),
                &TaskId::from("missing"),
                &TaskPatch::status(TaskStatus::Done, Utc::now()),
            )
            .unwrap_err();
        assert_eq!(err, RemoteError::NotFound("missing".into()));
    }

    #[test]
    fn failing_writes_leave_collection_untouched() {
        let remote = MemoryRemote::new();
        remote.set_fail_writes(true);
        assert!(remote.put(&Identity::new("a"), &task("x", 1)).is_err());
        assert!(remote.collection("a").is_empty());
    }

    #[test]
    fn mirror_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");
        let carol = Identity::new("carol");
        {
            let remote = MemoryRemote::open(&path).unwrap();
            remote.put(&carol, &task("kept", 5)).unwrap();
        }
        let remote = MemoryRemote::open(&path).unwrap();
        assert_eq!(remote.collection("carol")[0].title, "kept");
    }

    #[test]
    fn failed_mirror_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");
        let dave = Identity::new("dave");
        let remote = MemoryRemote::open(&path).unwrap();
        let kept = task("kept", 5);
        remote.put(&dave, &kept).unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(remote.put(&dave, &task("lost", 6)).is_err());
        assert!(remote
            .patch(&dave, &kept.id, &TaskPatch::status(TaskStatus::Done, Utc::now()))
            .is_err());
        assert!(remote.delete(&dave, &kept.id).is_err());

        let tasks = remote.collection("dave");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "kept");
        assert_eq!(tasks[0].status, TaskStatus::Todo);
    }

    #[test]
    fn first_name_falls_back_to_user() {
        assert_eq!(Identity::new("u").first_name(), "User");
        assert_eq!(
            Identity::new("u").with_display_name("Ada Lovelace").first_name(),
            "Ada"
        );
    }
}
