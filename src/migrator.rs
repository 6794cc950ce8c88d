use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_users_table::Migration),
            Box::new(m20240301_000002_create_aisles_table::Migration),
            Box::new(m20240301_000003_create_medicines_table::Migration),
            Box::new(m20240301_000004_create_history_table::Migration),
        ]
    }
}

mod m20240301_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).string().primary_key().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::DisplayName).string().null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::LastSeenAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Email,
        DisplayName,
        CreatedAt,
        LastSeenAt,
    }
}

mod m20240301_000002_create_aisles_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_aisles_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Aisles::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Aisles::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Aisles::UserId).string().not_null())
                        .col(ColumnDef::new(Aisles::Name).string().not_null())
                        .col(ColumnDef::new(Aisles::Description).text().null())
                        .col(ColumnDef::new(Aisles::ColorHex).string_len(7).not_null())
                        .col(ColumnDef::new(Aisles::Icon).string().not_null())
                        .col(
                            ColumnDef::new(Aisles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Aisles::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_aisles_user_id")
                        .table(Aisles::Table)
                        .col(Aisles::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Aisles::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Aisles {
        Table,
        Id,
        UserId,
        Name,
        Description,
        ColorHex,
        Icon,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_medicines_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_medicines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Medicines::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Medicines::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Medicines::UserId).string().not_null())
                        .col(ColumnDef::new(Medicines::Name).string().not_null())
                        .col(ColumnDef::new(Medicines::Description).text().null())
                        .col(ColumnDef::new(Medicines::Dosage).string().null())
                        .col(ColumnDef::new(Medicines::Form).string().null())
                        .col(ColumnDef::new(Medicines::Reference).string().null())
                        .col(ColumnDef::new(Medicines::Unit).string().not_null())
                        .col(
                            ColumnDef::new(Medicines::CurrentQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Medicines::MaxQuantity).integer().not_null())
                        .col(
                            ColumnDef::new(Medicines::WarningThreshold)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Medicines::CriticalThreshold)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Medicines::ExpiryDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Medicines::AisleId).uuid().not_null())
                        .col(
                            ColumnDef::new(Medicines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Medicines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_medicines_user_id")
                        .table(Medicines::Table)
                        .col(Medicines::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_medicines_aisle_id")
                        .table(Medicines::Table)
                        .col(Medicines::AisleId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Medicines::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Medicines {
        Table,
        Id,
        UserId,
        Name,
        Description,
        Dosage,
        Form,
        Reference,
        Unit,
        CurrentQuantity,
        MaxQuantity,
        WarningThreshold,
        CriticalThreshold,
        ExpiryDate,
        AisleId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000004_create_history_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_history_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // No foreign key to medicines: entries outlive the medicine they describe.
            manager
                .create_table(
                    Table::create()
                        .table(History::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(History::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(History::MedicineId).uuid().null())
                        .col(ColumnDef::new(History::AisleId).uuid().null())
                        .col(ColumnDef::new(History::UserId).string().not_null())
                        .col(ColumnDef::new(History::Action).string().not_null())
                        .col(ColumnDef::new(History::Details).text().not_null())
                        .col(
                            ColumnDef::new(History::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_history_medicine_id")
                        .table(History::Table)
                        .col(History::MedicineId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_history_user_timestamp")
                        .table(History::Table)
                        .col(History::UserId)
                        .col(History::Timestamp)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(History::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum History {
        Table,
        Id,
        MedicineId,
        AisleId,
        UserId,
        Action,
        Details,
        Timestamp,
    }
}
