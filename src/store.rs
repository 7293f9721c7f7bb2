//! Ordered task collection and its persistence backend.
//!
//! In local mode the collection lives under [`LOCAL_KEY`] and every change
//! is written before the call returns. In remote mode the collection is a
//! mirror of the identity's subscription: writes are forwarded to the
//! backend and the result comes back as a snapshot on the next
//! [`TaskStore::poll_remote`]. Remote data is never written locally.

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{RemoteError, TrackerError};
use crate::storage::LocalStorage;
use crate::sync::{Identity, RemoteEvent, Subscription, SyncAdapter};
use crate::task::{Task, TaskId, TaskInput, TaskPatch, TaskStatus};

/// Key holding the guest collection.
pub const LOCAL_KEY: &str = "yolo_guest_tasks";
/// Key used by earlier releases; cleared on open.
pub const LEGACY_KEY: &str = "yolo_tasks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Local,
    Remote,
}

struct RemoteSession {
    identity: Identity,
    subscription: Subscription,
    events: Receiver<RemoteEvent>,
}

enum Backend {
    Local,
    Remote(RemoteSession),
}

pub struct TaskStore {
    tasks: Vec<Task>,
    local: LocalStorage,
    adapter: Option<Rc<dyn SyncAdapter>>,
    backend: Backend,
    syncing: bool,
}

impl TaskStore {
    /// Open the store in local mode, dropping the legacy key first.
    pub fn open(local: LocalStorage, adapter: Option<Rc<dyn SyncAdapter>>) -> Self {
        if let Err(err) = local.remove(LEGACY_KEY) {
            warn!(%err, "Failed to clear legacy task key");
        }
        let mut store = Self {
            tasks: Vec::new(),
            local,
            adapter,
            backend: Backend::Local,
            syncing: false,
        };
        store.tasks = store.load_local();
        store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub const fn mode(&self) -> Mode {
        match self.backend {
            Backend::Local => Mode::Local,
            Backend::Remote(_) => Mode::Remote,
        }
    }

    pub const fn identity(&self) -> Option<&Identity> {
        match &self.backend {
            Backend::Local => None,
            Backend::Remote(session) => Some(&session.identity),
        }
    }

    /// True while a remote write has not been answered by a snapshot.
    pub const fn is_syncing(&self) -> bool {
        self.syncing
    }

    pub const fn has_remote(&self) -> bool {
        self.adapter.is_some()
    }

    /// Collection persisted in local storage. Absent or unreadable data is empty.
    pub fn load_local(&self) -> Vec<Task> {
        match self.local.get(LOCAL_KEY) {
            Ok(Some(data)) => serde_json::from_str(&data).unwrap_or_else(|err| {
                warn!(%err, "Ignoring malformed local task data");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(%err, "Failed to read local tasks");
                Vec::new()
            }
        }
    }

    fn save_local(&self, tasks: &[Task]) -> Result<(), TrackerError> {
        let data = serde_json::to_string(tasks).map_err(crate::error::StorageError::from)?;
        self.local.set(LOCAL_KEY, &data)?;
        debug!(count = tasks.len(), "Saved local tasks");
        Ok(())
    }

    /// Replace the whole in-memory collection.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Switch to `identity`'s remote collection.
    ///
    /// Any previous subscription is released first. The in-memory collection
    /// is emptied until the first snapshot arrives, so guest tasks never show
    /// under a signed-in identity.
    pub fn use_remote(&mut self, identity: Identity) -> Result<(), RemoteError> {
        let Some(adapter) = self.adapter.clone() else {
            return Err(RemoteError::Unavailable(
                "sync backend is not configured".into(),
            ));
        };
        self.release();

        let (tx, rx) = mpsc::channel();
        let subscription = match adapter.subscribe(&identity, tx) {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!(%err, uid = %identity.uid, "Subscription failed, staying local");
                self.use_local();
                return Err(err);
            }
        };
        info!(uid = %identity.uid, "Switched to remote tasks");
        self.tasks.clear();
        self.syncing = true;
        self.backend = Backend::Remote(RemoteSession {
            identity,
            subscription,
            events: rx,
        });
        self.poll_remote();
        Ok(())
    }

    /// Return to guest mode with whatever was last saved locally.
    pub fn use_local(&mut self) {
        self.release();
        self.syncing = false;
        self.tasks = self.load_local();
        info!(count = self.tasks.len(), "Using local tasks");
    }

    fn release(&mut self) {
        if let Backend::Remote(mut session) = std::mem::replace(&mut self.backend, Backend::Local) {
            session.subscription.unsubscribe();
            debug!(uid = %session.identity.uid, "Released subscription");
        }
    }

    /// Apply pending subscription events. Returns how many were handled.
    pub fn poll_remote(&mut self) -> usize {
        let Backend::Remote(session) = &self.backend else {
            return 0;
        };
        let mut events = Vec::new();
        loop {
            match session.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Remote event channel closed");
                    break;
                }
            }
        }

        let handled = events.len();
        for event in events {
            match event {
                RemoteEvent::Snapshot(tasks) => {
                    debug!(count = tasks.len(), "Applied remote snapshot");
                    self.syncing = false;
                    self.replace_all(tasks);
                }
                RemoteEvent::Error(err) => {
                    warn!(%err, "Remote subscription error, showing local tasks");
                    self.syncing = false;
                    self.tasks = self.load_local();
                }
            }
        }
        handled
    }

    fn remote(&self) -> Option<(Rc<dyn SyncAdapter>, Identity)> {
        match (&self.backend, &self.adapter) {
            (Backend::Remote(session), Some(adapter)) => {
                Some((Rc::clone(adapter), session.identity.clone()))
            }
            _ => None,
        }
    }

    /// Validate `input`, assign an id and store the new task.
    pub fn add(&mut self, input: &TaskInput, now: DateTime<Utc>) -> Result<Task, TrackerError> {
        let task = Task::new(input.validate()?, now);

        if let Some((adapter, identity)) = self.remote() {
            self.syncing = true;
            match adapter.put(&identity, &task) {
                Ok(()) => return Ok(task),
                Err(err) => {
                    warn!(%err, id = %task.id, "Remote add failed, keeping task locally");
                    self.syncing = false;
                }
            }
            let mut local = self.load_local();
            local.push(task.clone());
            self.save_local(&local)?;
            self.tasks.push(task.clone());
            return Ok(task);
        }

        self.tasks.push(task.clone());
        self.save_local(&self.tasks)?;
        Ok(task)
    }

    /// Replace every mutable field of task `id`. Unknown ids are ignored locally.
    pub fn update(
        &mut self,
        id: &TaskId,
        input: &TaskInput,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        let patch = TaskPatch::replace(input.validate()?, now);

        if let Some((adapter, identity)) = self.remote() {
            self.syncing = true;
            match adapter.patch(&identity, id, &patch) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(%err, %id, "Remote update failed, applying locally");
                    self.syncing = false;
                }
            }
            let mut local = self.load_local();
            if let Some(task) = local.iter_mut().find(|t| &t.id == id) {
                task.apply(&patch);
                self.save_local(&local)?;
            }
            if let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) {
                task.apply(&patch);
            }
            return Ok(());
        }

        self.apply_local(id, &patch)
    }

    /// Change only the status of task `id`.
    pub fn set_status(
        &mut self,
        id: &TaskId,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        let patch = TaskPatch::status(status, now);

        if let Some((adapter, identity)) = self.remote() {
            self.syncing = true;
            if let Err(err) = adapter.patch(&identity, id, &patch) {
                warn!(%err, %id, "Remote status change failed");
                self.syncing = false;
            }
            return Ok(());
        }

        self.apply_local(id, &patch)
    }

    pub fn remove(&mut self, id: &TaskId) -> Result<(), TrackerError> {
        if let Some((adapter, identity)) = self.remote() {
            self.syncing = true;
            if let Err(err) = adapter.delete(&identity, id) {
                warn!(%err, %id, "Remote delete failed");
                self.syncing = false;
            }
            return Ok(());
        }

        let before = self.tasks.len();
        self.tasks.retain(|t| &t.id != id);
        if self.tasks.len() != before {
            self.save_local(&self.tasks)?;
        }
        Ok(())
    }

    fn apply_local(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<(), TrackerError> {
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) else {
            debug!(%id, "No task to update");
            return Ok(());
        };
        task.apply(patch);
        self.save_local(&self.tasks)
    }
}
