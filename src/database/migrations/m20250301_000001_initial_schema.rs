use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_shows_table(manager).await?;
        self.create_episodes_table(manager).await?;
        self.create_crawl_tasks_table(manager).await?;
        self.create_indexes(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrawlTasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Episodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shows::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_shows_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shows::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Shows::ExternalId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Shows::Name).string().not_null())
                    .col(ColumnDef::new(Shows::Status).string().not_null())
                    .col(ColumnDef::new(Shows::RefreshThresholdOverride).integer())
                    .col(ColumnDef::new(Shows::StaleDetectedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Shows::LastCorrectionResult)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Shows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Shows::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_episodes_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Episodes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Episodes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Episodes::ShowId).uuid().not_null())
                    .col(ColumnDef::new(Episodes::SeasonNumber).integer().not_null())
                    .col(ColumnDef::new(Episodes::EpisodeNumber).integer().not_null())
                    .col(ColumnDef::new(Episodes::Name).string().not_null())
                    .col(ColumnDef::new(Episodes::AirDate).date())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_episodes_show_id")
                            .from(Episodes::Table, Episodes::ShowId)
                            .to(Shows::Table, Shows::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_crawl_tasks_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CrawlTasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CrawlTasks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CrawlTasks::Kind).string().not_null())
                    .col(ColumnDef::new(CrawlTasks::Status).string().not_null())
                    .col(
                        ColumnDef::new(CrawlTasks::Parameters)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(CrawlTasks::Error).text())
                    .col(ColumnDef::new(CrawlTasks::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(CrawlTasks::FinishedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(CrawlTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_episodes_show_id")
                    .table(Episodes::Table)
                    .col(Episodes::ShowId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crawl_tasks_status")
                    .table(CrawlTasks::Table)
                    .col(CrawlTasks::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Shows {
    Table,
    Id,
    ExternalId,
    Name,
    Status,
    RefreshThresholdOverride,
    StaleDetectedAt,
    LastCorrectionResult,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Episodes {
    Table,
    Id,
    ShowId,
    SeasonNumber,
    EpisodeNumber,
    Name,
    AirDate,
}

#[derive(DeriveIden)]
enum CrawlTasks {
    Table,
    Id,
    Kind,
    Status,
    Parameters,
    Error,
    StartedAt,
    FinishedAt,
    CreatedAt,
}
