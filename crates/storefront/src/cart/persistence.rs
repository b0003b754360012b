//! Local persistence of the cart identifier.
//!
//! Only the remote cart ID is stored, never its contents. Storage is
//! best-effort: a failed write costs the shopper a fresh cart next session,
//! so errors are logged and swallowed rather than returned.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use reuse_core::CartId;

/// Default storage key, used as the file stem for [`FilePersistence`].
pub const STORAGE_KEY: &str = "reuse-cart";

/// A single slot holding the remote cart ID across sessions.
pub trait CartPersistence: Send + Sync {
    /// Remember `cart_id`, replacing any previous value.
    fn save(&self, cart_id: &CartId);

    /// The remembered cart ID, if any.
    fn load(&self) -> Option<CartId>;

    /// Forget the remembered cart ID.
    fn clear(&self);
}

impl<T: CartPersistence + ?Sized> CartPersistence for Arc<T> {
    fn save(&self, cart_id: &CartId) {
        (**self).save(cart_id);
    }

    fn load(&self) -> Option<CartId> {
        (**self).load()
    }

    fn clear(&self) {
        (**self).clear();
    }
}

// =============================================================================
// MemoryPersistence
// =============================================================================

/// In-process slot; lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    slot: Mutex<Option<CartId>>,
}

impl MemoryPersistence {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot that already remembers `cart_id`.
    #[must_use]
    pub fn with_cart_id(cart_id: CartId) -> Self {
        Self {
            slot: Mutex::new(Some(cart_id)),
        }
    }
}

impl CartPersistence for MemoryPersistence {
    fn save(&self, cart_id: &CartId) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(cart_id.clone());
    }

    fn load(&self) -> Option<CartId> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

// =============================================================================
// FilePersistence
// =============================================================================

/// On-disk document format.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCart {
    cart_id: CartId,
}

/// Slot backed by a small JSON file.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    /// Store the cart ID at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the cart ID as `reuse-cart.json` inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{STORAGE_KEY}.json")))
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, cart_id: &CartId) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let document = PersistedCart {
            cart_id: cart_id.clone(),
        };
        let json = serde_json::to_vec_pretty(&document)?;
        fs::write(&self.path, json)
    }
}

impl CartPersistence for FilePersistence {
    fn save(&self, cart_id: &CartId) {
        match self.write(cart_id) {
            Ok(()) => debug!(path = %self.path.display(), "Saved cart ID"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to save cart ID"),
        }
    }

    fn load(&self) -> Option<CartId> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read saved cart ID");
                return None;
            }
        };

        match serde_json::from_slice::<PersistedCart>(&bytes) {
            Ok(document) if !document.cart_id.as_str().is_empty() => Some(document.cart_id),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable cart ID file");
                None
            }
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Cleared saved cart ID"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to clear cart ID"),
        }
    }
}
