//! Entity view-model.
//!
//! An in-memory, ordered mirror of one table. The list is replaced wholesale on
//! refresh and patched locally only after the store confirms a write; a failed
//! call never changes `items`.

use validator::Validate;

use crate::errors::AppError;
use crate::gateway::{Gateway, OrderBy, SelectQuery};
use crate::models::{from_record, to_record, Entity};

/// Ordered local copy of one table's rows.
#[derive(Debug, Clone)]
pub struct EntityList<E: Entity> {
    items: Vec<E>,
    loading: bool,
    /// Section-level message left by the last failed refresh.
    error: Option<String>,
    /// Blocking message left by the last failed write.
    alert: Option<String>,
}

impl<E: Entity> Default for EntityList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityList<E> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            alert: None,
        }
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Query used for every refresh: newest rows first.
    pub fn display_query() -> SelectQuery {
        SelectQuery::new()
            .with_relations(E::RELATIONS)
            .order_by(OrderBy::desc("created_at"))
    }

    /// Replace the list with the current contents of the table.
    pub async fn refresh<G: Gateway>(&mut self, gateway: &G) -> Result<(), AppError> {
        self.loading = true;
        let result = self.fetch(gateway).await;
        self.loading = false;

        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error fetching {}: {}", E::TABLE, e);
                self.items.clear();
                self.error = Some(format!("Error fetching {}", E::TABLE));
                Err(e)
            }
        }
    }

    async fn fetch<G: Gateway>(&self, gateway: &G) -> Result<Vec<E>, AppError> {
        let rows = gateway.select(E::TABLE, &Self::display_query()).await?;
        rows.into_iter().map(from_record::<E>).collect()
    }

    /// Validate and insert a draft; on success the new row goes to the front.
    pub async fn create<G: Gateway>(
        &mut self,
        gateway: &G,
        draft: &E::Draft,
    ) -> Result<E, AppError> {
        let result: Result<E, AppError> = async {
            draft.validate()?;
            let record = gateway
                .insert(E::TABLE, to_record(draft)?, E::RELATIONS)
                .await?;
            from_record::<E>(record)
        }
        .await;

        match result {
            Ok(created) => {
                self.items.retain(|item| item.id() != created.id());
                self.items.insert(0, created.clone());
                self.alert = None;
                Ok(created)
            }
            Err(e) => Err(self.raise("adding", e)),
        }
    }

    /// Validate and apply a partial update; on success the matching row is replaced.
    pub async fn patch<G: Gateway>(
        &mut self,
        gateway: &G,
        id: i64,
        changes: &E::Patch,
    ) -> Result<E, AppError> {
        let result: Result<E, AppError> = async {
            changes.validate()?;
            let record = gateway
                .update(E::TABLE, id, to_record(changes)?, E::RELATIONS)
                .await?;
            from_record::<E>(record)
        }
        .await;

        match result {
            Ok(updated) => {
                if let Some(slot) = self.items.iter_mut().find(|item| item.id() == id) {
                    *slot = updated.clone();
                }
                self.alert = None;
                Ok(updated)
            }
            Err(e) => Err(self.raise("updating", e)),
        }
    }

    /// Delete a row; the local element goes only once the store confirms the delete.
    pub async fn remove<G: Gateway>(&mut self, gateway: &G, id: i64) -> Result<(), AppError> {
        let result = match gateway.delete(E::TABLE, id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::NotFound(format!(
                "{} {} not found",
                E::TABLE.label(),
                id
            ))),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.items.retain(|item| item.id() != id);
                self.alert = None;
                Ok(())
            }
            Err(e) => Err(self.raise("deleting", e)),
        }
    }

    fn raise(&mut self, action: &str, err: AppError) -> AppError {
        tracing::error!("Error {} {}: {}", action, E::TABLE.label(), err);
        self.alert = Some(format!("Error {} {}", action, E::TABLE.label().to_lowercase()));
        err
    }
}
