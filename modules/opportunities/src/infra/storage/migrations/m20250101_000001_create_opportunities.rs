use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Opportunities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Opportunities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Opportunities::Kind).string().not_null())
                    .col(ColumnDef::new(Opportunities::Title).string().not_null())
                    .col(ColumnDef::new(Opportunities::Description).text().not_null())
                    .col(ColumnDef::new(Opportunities::Company).string().null())
                    .col(
                        ColumnDef::new(Opportunities::Location)
                            .string()
                            .not_null()
                            .default("Remote"),
                    )
                    .col(ColumnDef::new(Opportunities::Stipend).string().null())
                    .col(ColumnDef::new(Opportunities::Duration).string().null())
                    .col(
                        ColumnDef::new(Opportunities::LastDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Opportunities::StartDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Opportunities::Tags).json().not_null())
                    .col(ColumnDef::new(Opportunities::Skills).json().not_null())
                    .col(ColumnDef::new(Opportunities::Requirements).json().not_null())
                    .col(
                        ColumnDef::new(Opportunities::Responsibilities)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Opportunities::Poster).string().null())
                    .col(ColumnDef::new(Opportunities::OrganizerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Opportunities::OrganizerName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Opportunities::Status)
                            .string()
                            .not_null()
                            .default("Active"),
                    )
                    .col(
                        ColumnDef::new(Opportunities::Views)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Opportunities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Opportunities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_opportunities_organizer")
                    .table(Opportunities::Table)
                    .col(Opportunities::OrganizerId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_opportunities_status_created")
                    .table(Opportunities::Table)
                    .col(Opportunities::Status)
                    .col(Opportunities::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Opportunities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Opportunities {
    Table,
    Id,
    Kind,
    Title,
    Description,
    Company,
    Location,
    Stipend,
    Duration,
    LastDate,
    StartDate,
    Tags,
    Skills,
    Requirements,
    Responsibilities,
    Poster,
    OrganizerId,
    OrganizerName,
    Status,
    Views,
    CreatedAt,
    UpdatedAt,
}
