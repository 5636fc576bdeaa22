use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OpportunityApplicants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OpportunityApplicants::OpportunityId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OpportunityApplicants::UserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OpportunityApplicants::AppliedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(OpportunityApplicants::OpportunityId)
                            .col(OpportunityApplicants::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Applications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Applications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Applications::UserId).uuid().not_null())
                    .col(ColumnDef::new(Applications::OpportunityId).uuid().not_null())
                    .col(
                        ColumnDef::new(Applications::Status)
                            .string()
                            .not_null()
                            .default("applied"),
                    )
                    .col(ColumnDef::new(Applications::Snapshot).json().not_null())
                    .col(
                        ColumnDef::new(Applications::CoverLetter)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Applications::Resume)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Applications::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Applications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // one application per student per posting
        manager
            .create_index(
                Index::create()
                    .name("ux_applications_user_opportunity")
                    .table(Applications::Table)
                    .col(Applications::UserId)
                    .col(Applications::OpportunityId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_applications_opportunity")
                    .table(Applications::Table)
                    .col(Applications::OpportunityId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Applications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OpportunityApplicants::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OpportunityApplicants {
    Table,
    OpportunityId,
    UserId,
    AppliedAt,
}

#[derive(DeriveIden)]
enum Applications {
    Table,
    Id,
    UserId,
    OpportunityId,
    Status,
    Snapshot,
    CoverLetter,
    Resume,
    Notes,
    CreatedAt,
    UpdatedAt,
}
