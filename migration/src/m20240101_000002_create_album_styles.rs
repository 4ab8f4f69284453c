use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_catalog_tables::{Albums, Styles};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlbumStyles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AlbumStyles::AlbumId).integer().not_null())
                    .col(ColumnDef::new(AlbumStyles::StyleId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(AlbumStyles::AlbumId)
                            .col(AlbumStyles::StyleId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_album_styles_album_id")
                            .from(AlbumStyles::Table, AlbumStyles::AlbumId)
                            .to(Albums::Table, Albums::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_album_styles_style_id")
                            .from(AlbumStyles::Table, AlbumStyles::StyleId)
                            .to(Styles::Table, Styles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_album_styles_style_id")
                    .table(AlbumStyles::Table)
                    .col(AlbumStyles::StyleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AlbumStyles::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AlbumStyles {
    Table,
    AlbumId,
    StyleId,
}
