use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;

use crate::storage::{Storage, SESSION_KEY};

/// `sess_<unix millis>`
pub fn new_session_id() -> String {
    format!("sess_{}", Utc::now().timestamp_millis())
}

/// Holds the active session identifier and keeps it in step with storage.
///
/// Shared by the session manager and the send path; readers always go
/// through [`SessionContext::active_id`] so a switch is seen immediately.
pub struct SessionContext {
    storage: Rc<dyn Storage>,
    active: RefCell<String>,
}

impl SessionContext {
    /// Restore the stored identifier, or generate and persist a fresh one.
    pub fn restore(storage: Rc<dyn Storage>) -> Self {
        let active = match storage.get(SESSION_KEY) {
            Some(id) if !id.trim().is_empty() => {
                log::info!("Restored session {id}");
                id
            }
            _ => {
                let id = new_session_id();
                log::info!("No stored session, starting {id}");
                if let Err(e) = storage.set(SESSION_KEY, &id) {
                    log::warn!("Failed to persist session id: {e}");
                }
                id
            }
        };
        Self {
            storage,
            active: RefCell::new(active),
        }
    }

    pub fn active_id(&self) -> String {
        self.active.borrow().clone()
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        *self.active.borrow() == session_id
    }

    /// Make `session_id` active and persist it.
    pub fn activate(&self, session_id: &str) {
        *self.active.borrow_mut() = session_id.to_string();
        if let Err(e) = self.storage.set(SESSION_KEY, session_id) {
            log::warn!("Failed to persist session id: {e}");
        }
    }
}
