// Instance shared between concurrent emitters
use crate::emitter::{EmitMode, Emitter};
use crate::model::Instance;
use crate::{prefix, Result};
use parking_lot::RwLock;
use std::sync::Arc;

/// Serializes prefix repair across threads: canonicalization takes the write
/// lock, rendering only a read lock.
#[derive(Clone, Default)]
pub struct SharedInstance {
    inner: Arc<RwLock<Instance>>,
}

impl SharedInstance {
    pub fn new(instance: Instance) -> Self {
        Self {
            inner: Arc::new(RwLock::new(instance)),
        }
    }

    pub fn emit(&self, emitter: &Emitter, mode: EmitMode) -> Result<String> {
        if mode.canonicalizes() {
            prefix::canonicalize(&mut self.inner.write());
        }
        emitter.render(&self.inner.read(), mode)
    }

    /// Returns the instance if this is the last handle.
    pub fn try_unwrap(self) -> std::result::Result<Instance, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}
