use crossbeam::atomic::AtomicCell;
use log::debug;
use std::collections::HashMap;

use super::{ParamKind, ParamValue, ParameterError, ParameterHandle};

#[derive(Debug)]
struct Slot {
    key: String,
    kind: ParamKind,
    default: f32,
    value: AtomicCell<f32>,
}

/// Registry of declared parameters with one lock-free value slot each.
///
/// Declaration needs `&mut self`, so once the store is shared behind an
/// `Arc` the parameter set is frozen. Reads and writes go through `&self`
/// and never block.
#[derive(Debug, Default)]
pub struct ParameterStore {
    slots: Vec<Slot>,
    index: HashMap<String, ParameterHandle>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter. The default is constrained into the declared range.
    pub fn declare(
        &mut self,
        key: impl Into<String>,
        kind: ParamKind,
        default: impl Into<ParamValue>,
    ) -> Result<ParameterHandle, ParameterError> {
        let key = key.into();
        if self.index.contains_key(&key) {
            return Err(ParameterError::DuplicateKey(key));
        }

        let default = kind.constrain(default.into().as_f32());
        let handle = ParameterHandle::new(self.slots.len());

        debug!("Declared parameter '{key}' ({kind:?}, default {default})");

        self.index.insert(key.clone(), handle);
        self.slots.push(Slot {
            key,
            kind,
            default,
            value: AtomicCell::new(default),
        });

        Ok(handle)
    }

    pub fn handle(&self, key: &str) -> Result<ParameterHandle, ParameterError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| ParameterError::UnknownKey(key.to_string()))
    }

    pub fn get(&self, key: &str) -> Result<ParamValue, ParameterError> {
        let slot = self.slot(key)?;
        Ok(slot.kind.to_value(slot.value.load()))
    }

    /// Store a value, silently clamping it into the declared range.
    ///
    /// Only an undeclared key is an error.
    pub fn set(&self, key: &str, value: impl Into<ParamValue>) -> Result<(), ParameterError> {
        let slot = self.slot(key)?;
        slot.value.store(slot.kind.constrain(value.into().as_f32()));
        Ok(())
    }

    /// Raw slot value for a handle. Hash-free and allocation-free.
    ///
    /// A handle from a different store that is out of bounds reads as 0.
    #[inline]
    pub fn value_by_handle(&self, handle: ParameterHandle) -> f32 {
        self.slots
            .get(handle.index())
            .map_or(0.0, |slot| slot.value.load())
    }

    pub fn set_by_handle(&self, handle: ParameterHandle, value: impl Into<ParamValue>) {
        if let Some(slot) = self.slots.get(handle.index()) {
            slot.value.store(slot.kind.constrain(value.into().as_f32()));
        }
    }

    pub fn kind(&self, key: &str) -> Result<ParamKind, ParameterError> {
        self.slot(key).map(|slot| slot.kind)
    }

    pub fn default_value(&self, key: &str) -> Result<ParamValue, ParameterError> {
        let slot = self.slot(key)?;
        Ok(slot.kind.to_value(slot.default))
    }

    pub fn display(&self, key: &str) -> Result<String, ParameterError> {
        let slot = self.slot(key)?;
        Ok(slot.kind.format(slot.value.load()))
    }

    /// Current values in declaration order.
    pub fn export_all(&self) -> Vec<(String, ParamValue)> {
        self.slots
            .iter()
            .map(|slot| (slot.key.clone(), slot.kind.to_value(slot.value.load())))
            .collect()
    }

    /// Best-effort restore.
    ///
    /// Unknown keys are skipped, keys absent from `pairs` keep their current
    /// value. Returns how many values were applied.
    pub fn import_all<I, K>(&self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (K, ParamValue)>,
        K: AsRef<str>,
    {
        let mut applied = 0;
        for (key, value) in pairs {
            let key = key.as_ref();
            if self.set(key, value).is_ok() {
                applied += 1;
            } else {
                debug!("Ignoring unknown parameter '{key}' during import");
            }
        }
        applied
    }

    pub fn reset_to_defaults(&self) {
        for slot in &self.slots {
            slot.value.store(slot.default);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.key.as_str())
    }

    fn slot(&self, key: &str) -> Result<&Slot, ParameterError> {
        let handle = self.handle(key)?;
        Ok(&self.slots[handle.index()])
    }
}
