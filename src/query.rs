use std::marker::PhantomData;

use sea_orm::sea_query::IntoCondition;
use sea_orm::{
    Condition, EntityTrait, JoinType, Order, QueryFilter, QueryOrder, QuerySelect, RelationDef,
    Related, Select,
};

use crate::entities;

/// Joins a listing can request. Each one is an inner join from the entity the
/// spec selects.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CatalogJoin {
    /// albums → album_styles → styles
    AlbumStyles,
    /// albums → artists
    AlbumArtist,
    /// artists → albums
    ArtistAlbums,
}

impl CatalogJoin {
    fn defs(self) -> Vec<RelationDef> {
        match self {
            CatalogJoin::AlbumStyles => vec![
                <entities::album_style::Entity as Related<entities::album::Entity>>::to().rev(),
                <entities::album_style::Entity as Related<entities::style::Entity>>::to(),
            ],
            CatalogJoin::AlbumArtist => {
                vec![<entities::album::Entity as Related<entities::artist::Entity>>::to()]
            }
            CatalogJoin::ArtistAlbums => {
                vec![<entities::artist::Entity as Related<entities::album::Entity>>::to()]
            }
        }
    }
}

/// Columns a listing can be ordered by.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortKey {
    AlbumName,
    ArtistName,
}

impl SortKey {
    fn apply<E: EntityTrait>(self, select: Select<E>, order: Order) -> Select<E> {
        match self {
            SortKey::AlbumName => select.order_by(entities::album::Column::Name, order),
            SortKey::ArtistName => select.order_by(entities::artist::Column::Name, order),
        }
    }
}

/// An unexecuted listing query: joins, predicate and ordering over `E`.
///
/// Nothing touches the store until [`QuerySpec::select`] is built and run,
/// which lets [`crate::pagination::paginate`] derive both the count and the
/// page slice from the same spec.
#[derive(Clone, Debug)]
pub struct QuerySpec<E: EntityTrait> {
    joins: Vec<CatalogJoin>,
    filter: Option<Condition>,
    order: Vec<(SortKey, Order)>,
    distinct: bool,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Default for QuerySpec<E> {
    fn default() -> Self {
        Self {
            joins: Vec::new(),
            filter: None,
            order: Vec::new(),
            distinct: false,
            _entity: PhantomData,
        }
    }
}

impl<E: EntityTrait> QuerySpec<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(mut self, join: CatalogJoin) -> Self {
        if !self.joins.contains(&join) {
            self.joins.push(join);
        }
        self
    }

    // No listing narrows its rows yet
    #[allow(dead_code)]
    pub fn filter(mut self, condition: impl IntoCondition) -> Self {
        let condition = condition.into_condition();
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.add(condition),
            None => Condition::all().add(condition),
        });
        self
    }

    pub fn order_by(mut self, key: SortKey, order: Order) -> Self {
        self.order.push((key, order));
        self
    }

    /// Collapses rows multiplied by one-to-many joins.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Builds the select without ordering, for counting.
    pub fn select_unordered(&self) -> Select<E> {
        let mut select = E::find();
        for join in &self.joins {
            for def in join.defs() {
                select = select.join(JoinType::InnerJoin, def);
            }
        }
        if let Some(filter) = &self.filter {
            select = select.filter(filter.clone());
        }
        if self.distinct {
            select = select.distinct();
        }
        select
    }

    pub fn select(&self) -> Select<E> {
        self.order
            .iter()
            .fold(self.select_unordered(), |select, (key, order)| {
                key.apply(select, order.clone())
            })
    }
}
