use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Events::Title).string().not_null())
                    .col(ColumnDef::new(Events::Description).text().not_null())
                    .col(ColumnDef::new(Events::Kind).string().not_null())
                    .col(ColumnDef::new(Events::Date).string().not_null())
                    .col(ColumnDef::new(Events::Time).string().not_null())
                    .col(ColumnDef::new(Events::Deadline).string().not_null())
                    .col(ColumnDef::new(Events::Location).string().not_null())
                    .col(
                        ColumnDef::new(Events::MaxParticipants)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Events::CurrentParticipants)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Events::RegistrationFee)
                            .string()
                            .not_null()
                            .default("Free"),
                    )
                    .col(ColumnDef::new(Events::Requirements).json().not_null())
                    .col(ColumnDef::new(Events::Poster).string().null())
                    .col(ColumnDef::new(Events::OrganizerId).uuid().not_null())
                    .col(ColumnDef::new(Events::OrganizerName).string().not_null())
                    .col(
                        ColumnDef::new(Events::Status)
                            .string()
                            .not_null()
                            .default("Live"),
                    )
                    .col(
                        ColumnDef::new(Events::Views)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Events::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_events_kind_status_date")
                    .table(Events::Table)
                    .col(Events::Kind)
                    .col(Events::Status)
                    .col(Events::Date)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_events_organizer")
                    .table(Events::Table)
                    .col(Events::OrganizerId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // one seat per user per event
        manager
            .create_table(
                Table::create()
                    .table(EventRegistrations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventRegistrations::EventId).uuid().not_null())
                    .col(ColumnDef::new(EventRegistrations::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(EventRegistrations::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(EventRegistrations::EventId)
                            .col(EventRegistrations::UserId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventRegistrations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    Title,
    Description,
    Kind,
    Date,
    Time,
    Deadline,
    Location,
    MaxParticipants,
    CurrentParticipants,
    RegistrationFee,
    Requirements,
    Poster,
    OrganizerId,
    OrganizerName,
    Status,
    Views,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EventRegistrations {
    Table,
    EventId,
    UserId,
    RegisteredAt,
}
