use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_items_table::Migration),
            Box::new(m20240101_000002_create_booking_requests_table::Migration),
            Box::new(m20240101_000003_create_reservations_table::Migration),
        ]
    }
}

mod m20240101_000001_create_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::Category).string().not_null())
                        // Nullable on purpose: legacy rows carry no quantity
                        // and are treated as a single unit.
                        .col(ColumnDef::new(Items::TotalQuantity).integer().null())
                        .col(ColumnDef::new(Items::Description).text().null())
                        .col(ColumnDef::new(Items::ImageUrl).string().null())
                        .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Items::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Items {
        Table,
        Id,
        Name,
        Category,
        TotalQuantity,
        Description,
        ImageUrl,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_booking_requests_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_booking_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BookingRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BookingRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BookingRequests::UserId).uuid().not_null())
                        .col(ColumnDef::new(BookingRequests::Note).text().null())
                        .col(ColumnDef::new(BookingRequests::Status).string().not_null())
                        .col(
                            ColumnDef::new(BookingRequests::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_booking_requests_user_id")
                        .table(BookingRequests::Table)
                        .col(BookingRequests::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BookingRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BookingRequests {
        Table,
        Id,
        UserId,
        Note,
        Status,
        CreatedAt,
    }
}

mod m20240101_000003_create_reservations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_reservations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Reservations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Reservations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Reservations::RequestId).uuid().not_null())
                        .col(ColumnDef::new(Reservations::UserId).uuid().not_null())
                        .col(ColumnDef::new(Reservations::ItemId).uuid().not_null())
                        .col(ColumnDef::new(Reservations::Quantity).integer().not_null())
                        .col(ColumnDef::new(Reservations::StartDate).date().not_null())
                        .col(ColumnDef::new(Reservations::StartTime).time().null())
                        .col(ColumnDef::new(Reservations::EndDate).date().not_null())
                        .col(ColumnDef::new(Reservations::EndTime).time().null())
                        .col(ColumnDef::new(Reservations::Status).string().not_null())
                        .col(
                            ColumnDef::new(Reservations::RejectionReason)
                                .text()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Reservations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Reservations::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_reservations_item_id")
                        .table(Reservations::Table)
                        .col(Reservations::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_reservations_request_id")
                        .table(Reservations::Table)
                        .col(Reservations::RequestId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_reservations_status")
                        .table(Reservations::Table)
                        .col(Reservations::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reservations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Reservations {
        Table,
        Id,
        RequestId,
        UserId,
        ItemId,
        Quantity,
        StartDate,
        StartTime,
        EndDate,
        EndTime,
        Status,
        RejectionReason,
        CreatedAt,
        UpdatedAt,
    }
}
