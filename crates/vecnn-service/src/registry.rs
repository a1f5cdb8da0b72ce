//! Generation-checked handle arena.
//!
//! Hosts hold an [`IndexToken`]: a slot number plus the slot's generation at
//! the time the handle was created. Freeing a handle bumps its slot's
//! generation, so a stale token can never reach whatever later reuses the
//! slot.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Result, ServiceError};
use crate::handle::IndexHandle;

/// Opaque host-side reference to a live index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexToken(u64);

impl IndexToken {
    fn new(slot: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | slot as u64)
    }

    /// Rebuild a token from its integer form, e.g. after a round trip
    /// through host glue.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn into_raw(self) -> u64 {
        self.0
    }

    fn slot(self) -> usize {
        (self.0 & u32::MAX as u64) as usize
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Display for IndexToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.slot(), self.generation())
    }
}

pub type SharedHandle = Arc<RwLock<IndexHandle>>;

struct Slot {
    generation: u32,
    entry: Option<SharedHandle>,
}

#[derive(Default)]
struct Slots {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

/// Arena of live index handles.
#[derive(Default)]
pub struct HandleRegistry {
    inner: Mutex<Slots>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` and return its token.
    pub fn insert(&self, handle: IndexHandle) -> IndexToken {
        let entry = Arc::new(RwLock::new(handle));
        let mut inner = self.inner.lock();
        match inner.free.pop() {
            Some(slot) => {
                let s = &mut inner.slots[slot as usize];
                s.entry = Some(entry);
                IndexToken::new(slot, s.generation)
            }
            None => {
                let slot = inner.slots.len() as u32;
                // Generation 0 is never issued, so the zero token is always invalid.
                inner.slots.push(Slot {
                    generation: 1,
                    entry: Some(entry),
                });
                IndexToken::new(slot, 1)
            }
        }
    }

    /// The live handle behind `token`.
    pub fn get(&self, token: IndexToken) -> Result<SharedHandle> {
        let inner = self.inner.lock();
        inner
            .slots
            .get(token.slot())
            .filter(|s| s.generation == token.generation())
            .and_then(|s| s.entry.clone())
            .ok_or(ServiceError::InvalidHandle(token))
    }

    /// Invalidate `token` and hand back its handle.
    ///
    /// In-flight operations that already hold the handle finish normally;
    /// the handle is dropped when the last of them releases it.
    pub fn remove(&self, token: IndexToken) -> Result<SharedHandle> {
        let mut inner = self.inner.lock();
        let slot = token.slot();
        let entry = match inner.slots.get_mut(slot) {
            Some(s) if s.generation == token.generation() && s.entry.is_some() => {
                s.generation = s.generation.wrapping_add(1).max(1);
                s.entry.take()
            }
            _ => None,
        };
        let entry = entry.ok_or(ServiceError::InvalidHandle(token))?;
        inner.free.push(slot as u32);
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.slots.len() - inner.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tokens of every live handle, in slot order.
    pub fn tokens(&self) -> Vec<IndexToken> {
        let inner = self.inner.lock();
        inner
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.entry.is_some())
            .map(|(i, s)| IndexToken::new(i as u32, s.generation))
            .collect()
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("live", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecnn_space::L2Space;
    use vecnn_types::{DataType, DistType};

    fn handle() -> IndexHandle {
        IndexHandle::new(
            Arc::new(L2Space),
            "brute_force",
            DataType::Vector,
            DistType::Float,
        )
    }

    #[test]
    fn test_insert_get_remove() {
        let registry = HandleRegistry::new();
        let token = registry.insert(handle());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(token).is_ok());

        registry.remove(token).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get(token),
            Err(ServiceError::InvalidHandle(_))
        ));
        assert!(registry.remove(token).is_err());
    }

    #[test]
    fn test_stale_token_after_slot_reuse() {
        let registry = HandleRegistry::new();
        let first = registry.insert(handle());
        registry.remove(first).unwrap();

        let second = registry.insert(handle());
        assert_ne!(first, second);
        assert!(registry.get(second).is_ok());
        assert!(registry.get(first).is_err());
        assert_eq!(registry.tokens(), vec![second]);
    }

    #[test]
    fn test_zero_token_is_invalid() {
        let registry = HandleRegistry::new();
        registry.insert(handle());
        assert!(registry.get(IndexToken::from_raw(0)).is_err());
        assert!(registry.get(IndexToken::from_raw(u64::MAX)).is_err());
    }
}
