// src/store/field_store.rs

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::trace;

use crate::errors::FieldFault;
use crate::task::Capability;
use crate::types::FieldId;

/// Business error recorded by a loader in place of a value.
///
/// Cloneable so that every consumer of the field gets its own copy.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct LoadError(Arc<anyhow::Error>);

impl LoadError {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self(Arc::new(err.into()))
    }
}

impl From<anyhow::Error> for LoadError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err)
    }
}

/// What a consumer gets back for a field: the loaded value or the loader's
/// own error.
pub type Loaded<T> = std::result::Result<Arc<T>, LoadError>;

type AnyValue = Arc<dyn Any + Send + Sync>;

/// One written field.
struct Slot {
    value: std::result::Result<AnyValue, LoadError>,
    /// Type the producer wrote, kept for mismatch reports.
    type_name: &'static str,
}

/// Write-once store shared by all tasks of one invocation.
///
/// Reads never wait on writes: the executor guarantees a field's producer has
/// finished before any consumer of that field starts, so the lock is only held
/// for the map lookup itself.
#[derive(Default)]
pub struct FieldStore {
    slots: RwLock<HashMap<FieldId, Slot>>,
}

impl fmt::Debug for FieldStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut fields: Vec<&str> = slots.keys().map(|k| k.as_str()).collect();
        fields.sort_unstable();
        f.debug_struct("FieldStore")
            .field("fields", &fields)
            .finish()
    }
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `field` on behalf of `producer`.
    ///
    /// Fails if `producer` did not declare `field` in its produced set, or if
    /// the field was already written during this invocation.
    pub fn write<T>(
        &self,
        producer: &dyn Capability,
        field: &str,
        value: anyhow::Result<T>,
    ) -> Result<(), FieldFault>
    where
        T: Any + Send + Sync,
    {
        if !producer.produces().contains(field) {
            return Err(FieldFault::NotProduced {
                task: producer.id().to_string(),
                field: field.to_string(),
            });
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if slots.contains_key(field) {
            return Err(FieldFault::Duplicate {
                task: producer.id().to_string(),
                field: field.to_string(),
            });
        }

        let is_err = value.is_err();
        let slot = Slot {
            value: value
                .map(|v| Arc::new(v) as AnyValue)
                .map_err(LoadError::new),
            type_name: type_name::<T>(),
        };
        slots.insert(field.to_string(), slot);

        trace!(
            task = producer.id(),
            field,
            business_error = is_err,
            "field written"
        );
        Ok(())
    }

    /// Fetch `field` on behalf of `consumer`.
    ///
    /// The outer `Result` is a store fault (undeclared read, missing field,
    /// wrong type). The inner [`Loaded`] is whatever the producer recorded,
    /// including its error; deciding what that error means is up to the
    /// consumer.
    pub fn read<T>(&self, consumer: &dyn Capability, field: &str) -> Result<Loaded<T>, FieldFault>
    where
        T: Any + Send + Sync,
    {
        if !consumer.consumes().contains(field) {
            return Err(FieldFault::NotConsumed {
                task: consumer.id().to_string(),
                field: field.to_string(),
            });
        }

        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.get(field).ok_or_else(|| FieldFault::Missing {
            task: consumer.id().to_string(),
            field: field.to_string(),
        })?;

        let mismatch = || FieldFault::TypeMismatch {
            task: consumer.id().to_string(),
            field: field.to_string(),
            stored: slot.type_name,
            requested: type_name::<T>(),
        };

        match &slot.value {
            Ok(value) => Arc::clone(value)
                .downcast::<T>()
                .map(Ok)
                .map_err(|_| mismatch()),
            Err(err) if slot.type_name == type_name::<T>() => Ok(Err(err.clone())),
            Err(_) => Err(mismatch()),
        }
    }

    /// Whether `field` has been written. Not capability-checked; meant for
    /// the executor and for diagnostics.
    pub fn contains(&self, field: &str) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(field)
    }

    /// Number of fields written so far.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
