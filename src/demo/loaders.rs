// src/demo/loaders.rs

use std::time::Duration;

use anyhow::anyhow;
use tracing::info;

use crate::demo::{
    UserBase, UserRequest, FIELD_USER_BASE, FIELD_USER_RELATION, LOADER_USER_BASE,
    LOADER_USER_RELATION,
};
use crate::store::FieldStore;
use crate::task::{Capability, LoadFuture, Loader, TaskContext};
use crate::types::FieldSet;

/// Fetches the user's base profile.
#[derive(Debug, Clone)]
pub struct UserBaseLoader {
    name: String,
    age: u8,
    delay: Duration,
}

impl UserBaseLoader {
    pub fn new(name: impl Into<String>, age: u8, delay: Duration) -> Self {
        Self {
            name: name.into(),
            age,
            delay,
        }
    }
}

impl Capability for UserBaseLoader {
    fn id(&self) -> &str {
        LOADER_USER_BASE
    }

    fn consumes(&self) -> FieldSet {
        FieldSet::new()
    }

    fn produces(&self) -> FieldSet {
        FieldSet::from([FIELD_USER_BASE])
    }
}

impl Loader<UserRequest> for UserBaseLoader {
    fn load<'a>(
        &'a self,
        ctx: &'a TaskContext,
        request: &'a UserRequest,
        store: &'a FieldStore,
    ) -> LoadFuture<'a> {
        Box::pin(async move {
            info!(loader = LOADER_USER_BASE, trace_id = %ctx.trace_id(), user_id = request.user_id, "loading");
            // Stand-in for the profile lookup.
            tokio::time::sleep(self.delay).await;

            let user = UserBase {
                id: request.user_id,
                name: self.name.clone(),
                age: self.age,
                city: "shenzhen".to_string(),
            };
            store.write(self, FIELD_USER_BASE, Ok(user))
        })
    }
}

/// Fetches the relation between the user and the anchor.
#[derive(Debug, Clone)]
pub struct UserRelationLoader {
    relation: u8,
    delay: Duration,
}

impl UserRelationLoader {
    pub fn new(relation: u8, delay: Duration) -> Self {
        Self { relation, delay }
    }
}

impl Capability for UserRelationLoader {
    fn id(&self) -> &str {
        LOADER_USER_RELATION
    }

    fn consumes(&self) -> FieldSet {
        FieldSet::from([FIELD_USER_BASE])
    }

    fn produces(&self) -> FieldSet {
        FieldSet::from([FIELD_USER_RELATION])
    }
}

impl Loader<UserRequest> for UserRelationLoader {
    fn load<'a>(
        &'a self,
        ctx: &'a TaskContext,
        request: &'a UserRequest,
        store: &'a FieldStore,
    ) -> LoadFuture<'a> {
        Box::pin(async move {
            info!(loader = LOADER_USER_RELATION, trace_id = %ctx.trace_id(), anchor_id = request.anchor_id, "loading");

            let relation = match store.read::<UserBase>(self, FIELD_USER_BASE)? {
                Ok(_user) => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.delay) => Ok(self.relation),
                        _ = ctx.cancelled() => Err(anyhow!("relation lookup abandoned")),
                    }
                }
                Err(err) => Err(anyhow!("user base unavailable: {err}")),
            };

            store.write(self, FIELD_USER_RELATION, relation)
        })
    }
}
