use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Artists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Artists::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Artists::Name).string().not_null())
                    .col(ColumnDef::new(Artists::Description).text().not_null())
                    .col(ColumnDef::new(Artists::Website).string())
                    .col(ColumnDef::new(Artists::Image).string())
                    .col(ColumnDef::new(Artists::Kind).string().not_null())
                    .col(ColumnDef::new(Artists::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Artists::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Labels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Labels::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Labels::Name).string().not_null())
                    .col(ColumnDef::new(Labels::Description).text())
                    .col(ColumnDef::new(Labels::FoundedYear).integer())
                    .col(ColumnDef::new(Labels::Kind).string())
                    .col(ColumnDef::new(Labels::Logo).string())
                    .col(ColumnDef::new(Labels::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Labels::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Styles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Styles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Styles::Name).string().not_null())
                    .col(ColumnDef::new(Styles::Color).string())
                    .col(ColumnDef::new(Styles::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Styles::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Albums never cascade: an artist or label with albums cannot be deleted
        manager
            .create_table(
                Table::create()
                    .table(Albums::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Albums::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Albums::ArtistId).integer().not_null())
                    .col(ColumnDef::new(Albums::LabelId).integer())
                    .col(ColumnDef::new(Albums::Name).string().not_null())
                    .col(ColumnDef::new(Albums::ReleaseYear).integer().not_null())
                    .col(ColumnDef::new(Albums::CoverImage).string().not_null())
                    .col(ColumnDef::new(Albums::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Albums::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_albums_artist_id")
                            .from(Albums::Table, Albums::ArtistId)
                            .to(Artists::Table, Artists::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_albums_label_id")
                            .from(Albums::Table, Albums::LabelId)
                            .to(Labels::Table, Labels::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tracks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tracks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tracks::AlbumId).integer().not_null())
                    .col(ColumnDef::new(Tracks::Title).string().not_null())
                    .col(ColumnDef::new(Tracks::Duration).string().not_null())
                    .col(ColumnDef::new(Tracks::TrackNumber).integer().not_null())
                    .col(ColumnDef::new(Tracks::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Tracks::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracks_album_id")
                            .from(Tracks::Table, Tracks::AlbumId)
                            .to(Albums::Table, Albums::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_albums_artist_id")
                    .table(Albums::Table)
                    .col(Albums::ArtistId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_albums_label_id")
                    .table(Albums::Table)
                    .col(Albums::LabelId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_albums_name")
                    .table(Albums::Table)
                    .col(Albums::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_artists_name")
                    .table(Artists::Table)
                    .col(Artists::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tracks_album_id")
                    .table(Tracks::Table)
                    .col(Tracks::AlbumId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tracks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Albums::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Styles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Labels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Artists::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Artists {
    Table,
    Id,
    Name,
    Description,
    Website,
    Image,
    Kind,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Labels {
    Table,
    Id,
    Name,
    Description,
    FoundedYear,
    Kind,
    Logo,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Styles {
    Table,
    Id,
    Name,
    Color,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Albums {
    Table,
    Id,
    ArtistId,
    LabelId,
    Name,
    ReleaseYear,
    CoverImage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tracks {
    Table,
    Id,
    AlbumId,
    Title,
    Duration,
    TrackNumber,
    CreatedAt,
    UpdatedAt,
}
