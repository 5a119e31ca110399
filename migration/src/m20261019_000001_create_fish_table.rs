use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Fish::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Fish::Id)
                            .integer()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Fish::Name).string().not_null())
                    .col(ColumnDef::new(Fish::Price).double().not_null())
                    .col(
                        ColumnDef::new(Fish::CatchDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Fish::ImageFileNames).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_fish_catch_date")
                    .table(Fish::Table)
                    .col(Fish::CatchDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Fish::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Fish {
    Table,
    Id,
    Name,
    Price,
    CatchDate,
    ImageFileNames,
}
