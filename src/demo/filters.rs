// src/demo/filters.rs

use tracing::{debug, warn};

use crate::demo::{
    UserBase, UserRequest, FIELD_USER_BASE, FIELD_USER_RELATION, FILTER_AGE, FILTER_NAME,
    FILTER_RELATION,
};
use crate::errors::FieldFault;
use crate::store::FieldStore;
use crate::task::{Capability, Filter, TaskContext};
use crate::types::FieldSet;

/// Minimum age accepted by [`AgeFilter`].
pub const MIN_AGE: u8 = 18;

/// Name used for blocked accounts.
const BLOCKED_NAME: &str = "xx";

/// Rejects blocked account names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameFilter;

impl Capability for NameFilter {
    fn id(&self) -> &str {
        FILTER_NAME
    }

    fn consumes(&self) -> FieldSet {
        FieldSet::from([FIELD_USER_BASE])
    }
}

impl Filter<UserRequest> for NameFilter {
    fn filter(
        &self,
        ctx: &TaskContext,
        _request: &UserRequest,
        store: &FieldStore,
    ) -> Result<bool, FieldFault> {
        debug!(filter = FILTER_NAME, trace_id = %ctx.trace_id(), "filtering");
        match store.read::<UserBase>(self, FIELD_USER_BASE)? {
            Ok(user) => Ok(user.name != BLOCKED_NAME),
            Err(err) => {
                warn!(filter = FILTER_NAME, error = %err, "user base unavailable; rejecting");
                Ok(false)
            }
        }
    }
}

/// Rejects users younger than [`MIN_AGE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AgeFilter;

impl Capability for AgeFilter {
    fn id(&self) -> &str {
        FILTER_AGE
    }

    fn consumes(&self) -> FieldSet {
        FieldSet::from([FIELD_USER_BASE])
    }
}

impl Filter<UserRequest> for AgeFilter {
    fn filter(
        &self,
        ctx: &TaskContext,
        _request: &UserRequest,
        store: &FieldStore,
    ) -> Result<bool, FieldFault> {
        debug!(filter = FILTER_AGE, trace_id = %ctx.trace_id(), "filtering");
        match store.read::<UserBase>(self, FIELD_USER_BASE)? {
            Ok(user) => Ok(user.age >= MIN_AGE),
            Err(err) => {
                warn!(filter = FILTER_AGE, error = %err, "user base unavailable; rejecting");
                Ok(false)
            }
        }
    }
}

/// Rejects users that already have a relation with the anchor.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationFilter;

impl Capability for RelationFilter {
    fn id(&self) -> &str {
        FILTER_RELATION
    }

    fn consumes(&self) -> FieldSet {
        FieldSet::from([FIELD_USER_RELATION])
    }
}

impl Filter<UserRequest> for RelationFilter {
    fn filter(
        &self,
        ctx: &TaskContext,
        _request: &UserRequest,
        store: &FieldStore,
    ) -> Result<bool, FieldFault> {
        debug!(filter = FILTER_RELATION, trace_id = %ctx.trace_id(), "filtering");
        match store.read::<u8>(self, FIELD_USER_RELATION)? {
            Ok(relation) => Ok(*relation == 0),
            Err(err) => {
                warn!(filter = FILTER_RELATION, error = %err, "relation unavailable; rejecting");
                Ok(false)
            }
        }
    }
}
