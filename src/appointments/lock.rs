use std::sync::{Mutex, MutexGuard};

use crate::models::AppointmentId;

/// Single-slot cooperative lock naming the appointment currently being
/// mutated. While it is held, no other transition may start on any
/// appointment. It is advisory and local to one UI session.
#[derive(Debug, Default)]
pub struct ProcessingLock {
    slot: Mutex<Option<AppointmentId>>,
}

impl ProcessingLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for `id` if it is empty.
    pub fn try_acquire(&self, id: AppointmentId) -> bool {
        let mut slot = self.slot();
        if slot.is_some() {
            return false;
        }
        *slot = Some(id);
        true
    }

    /// Frees the slot if `id` holds it.
    pub fn release(&self, id: AppointmentId) -> bool {
        let mut slot = self.slot();
        if *slot == Some(id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<AppointmentId> {
        *self.slot()
    }

    pub fn is_locked(&self) -> bool {
        self.current().is_some()
    }

    /// Like [`try_acquire`](Self::try_acquire), releasing on drop so an
    /// error or a dropped future never leaves the slot taken.
    pub fn acquire(&self, id: AppointmentId) -> Option<ProcessingGuard<'_>> {
        self.try_acquire(id).then(|| ProcessingGuard { lock: self, id })
    }

    fn slot(&self) -> MutexGuard<'_, Option<AppointmentId>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct ProcessingGuard<'a> {
    lock: &'a ProcessingLock,
    id: AppointmentId,
}

impl ProcessingGuard<'_> {
    pub fn id(&self) -> AppointmentId {
        self.id
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(self.id);
    }
}
