use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Resources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Resources::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Resources::Title).string().not_null())
                    .col(ColumnDef::new(Resources::ShortName).string().not_null())
                    .col(ColumnDef::new(Resources::ResourceName).string().not_null())
                    .col(ColumnDef::new(Resources::ResourceType).string().not_null())
                    .col(
                        ColumnDef::new(Resources::ResourceMd5)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Resources::ResourceSizeB).big_integer())
                    .col(ColumnDef::new(Resources::LastUpdateTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Resources::IsVector)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Resources::IsBitmap)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Resources::ResolutionWidth).integer())
                    .col(ColumnDef::new(Resources::ResolutionHeight).integer())
                    .col(
                        ColumnDef::new(Resources::UsedForEdge)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Resources::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Resources::BackgroundColor)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookups always filter by name and format
        manager
            .create_index(
                Index::create()
                    .name("idx_resources_short_name_type")
                    .table(Resources::Table)
                    .col(Resources::ShortName)
                    .col(Resources::ResourceType)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_resources_title_type")
                    .table(Resources::Table)
                    .col(Resources::Title)
                    .col(Resources::ResourceType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Resources::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Resources {
    Table,
    Id,
    Title,
    ShortName,
    ResourceName,
    ResourceType,
    ResourceMd5,
    ResourceSizeB,
    LastUpdateTime,
    IsVector,
    IsBitmap,
    ResolutionWidth,
    ResolutionHeight,
    UsedForEdge,
    IsDeleted,
    BackgroundColor,
}
