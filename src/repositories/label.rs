use std::sync::Arc;

use color_eyre::eyre::Context;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use super::Repository;
use crate::catalog::LabelKey;
use crate::database::Database;
use crate::entities;

#[derive(Debug, Clone, Serialize)]
pub struct LabelDetail {
    pub label: entities::label::Model,
    /// Ordered by name
    pub albums: Vec<entities::album::Model>,
}

pub struct LabelRepository {
    db: Arc<Database>,
}

impl Repository for LabelRepository {
    type Key = LabelKey;

    fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

impl LabelRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: i64) -> color_eyre::Result<Option<entities::label::Model>> {
        entities::label::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .wrap_err_with(|| format!("Failed to fetch label {id}"))
    }

    pub async fn find_by_name(
        &self,
        name: &str,
    ) -> color_eyre::Result<Option<entities::label::Model>> {
        entities::label::Entity::find()
            .filter(entities::label::Column::Name.eq(name))
            .one(&self.db.conn)
            .await
            .wrap_err_with(|| format!("Failed to fetch label {name}"))
    }

    /// Every label, in insertion order.
    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self) -> color_eyre::Result<Vec<entities::label::Model>> {
        entities::label::Entity::find()
            .order_by_asc(entities::label::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch labels")
    }

    #[tracing::instrument(skip(self))]
    pub async fn detail(&self, id: i64) -> color_eyre::Result<Option<LabelDetail>> {
        let Some(label) = self.find(id).await? else {
            return Ok(None);
        };

        let albums = entities::album::Entity::find()
            .filter(entities::album::Column::LabelId.eq(id))
            .order_by_asc(entities::album::Column::Name)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch label albums")?;

        Ok(Some(LabelDetail { label, albums }))
    }
}
