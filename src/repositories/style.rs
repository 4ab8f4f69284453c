use std::sync::Arc;

use color_eyre::eyre::Context;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::Repository;
use crate::catalog::StyleKey;
use crate::database::Database;
use crate::entities;

pub struct StyleRepository {
    db: Arc<Database>,
}

impl Repository for StyleRepository {
    type Key = StyleKey;

    fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

impl StyleRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn find_by_name(
        &self,
        name: &str,
    ) -> color_eyre::Result<Option<entities::style::Model>> {
        entities::style::Entity::find()
            .filter(entities::style::Column::Name.eq(name))
            .one(&self.db.conn)
            .await
            .wrap_err_with(|| format!("Failed to fetch style {name}"))
    }
}
