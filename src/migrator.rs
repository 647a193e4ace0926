use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_requests_table::Migration),
            Box::new(m20240101_000002_create_request_items_table::Migration),
            Box::new(m20240101_000003_create_audit_entries_table::Migration),
            Box::new(m20240101_000004_create_cost_centers_table::Migration),
        ]
    }
}

mod m20240101_000001_create_requests_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Requests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Requests::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Requests::Requester).string().not_null())
                        .col(ColumnDef::new(Requests::RequesterEmail).string())
                        .col(ColumnDef::new(Requests::CustomerId).string().not_null())
                        .col(ColumnDef::new(Requests::CustomerName).string().not_null())
                        .col(ColumnDef::new(Requests::SaleOrder).string().not_null())
                        .col(ColumnDef::new(Requests::EquipmentId).string().not_null())
                        .col(ColumnDef::new(Requests::EquipmentName).string().not_null())
                        .col(
                            ColumnDef::new(Requests::CostCenterCode)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Requests::CostCenterSector).string())
                        .col(
                            ColumnDef::new(Requests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Requests::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Requests::StatusChangedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Requests::Approver).string())
                        .col(ColumnDef::new(Requests::ApprovedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Requests::RejectionReason).string())
                        .col(ColumnDef::new(Requests::ReleasedBy).string())
                        .col(ColumnDef::new(Requests::ReleasedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Requests::CannotFulfillReason).string())
                        .col(ColumnDef::new(Requests::PickedUpBy).string())
                        .col(ColumnDef::new(Requests::PickedUpAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Requests::ReturnRequestedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(Requests::ReturnConfirmedBy).string())
                        .col(
                            ColumnDef::new(Requests::ReturnConfirmedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(Requests::FinalizedAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Requests::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Requests::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Requests {
        Table,
        Id,
        Requester,
        RequesterEmail,
        CustomerId,
        CustomerName,
        SaleOrder,
        EquipmentId,
        EquipmentName,
        CostCenterCode,
        CostCenterSector,
        CreatedAt,
        Status,
        StatusChangedAt,
        Approver,
        ApprovedAt,
        RejectionReason,
        ReleasedBy,
        ReleasedAt,
        CannotFulfillReason,
        PickedUpBy,
        PickedUpAt,
        ReturnRequestedAt,
        ReturnConfirmedBy,
        ReturnConfirmedAt,
        FinalizedAt,
        Version,
    }
}

mod m20240101_000002_create_request_items_table {
    use super::m20240101_000001_create_requests_table::Requests;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_request_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RequestItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RequestItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(RequestItems::RequestId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequestItems::ComponentId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequestItems::ComponentDescription)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequestItems::QuantityRequested)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequestItems::QuantityReleased)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RequestItems::QuantityPickedUp)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RequestItems::QuantityReturned)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(RequestItems::StockNote).string())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_request_items_request")
                                .from(RequestItems::Table, RequestItems::RequestId)
                                .to(Requests::Table, Requests::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RequestItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum RequestItems {
        Table,
        Id,
        RequestId,
        ComponentId,
        ComponentDescription,
        QuantityRequested,
        QuantityReleased,
        QuantityPickedUp,
        QuantityReturned,
        StockNote,
    }
}

mod m20240101_000003_create_audit_entries_table {
    use super::m20240101_000001_create_requests_table::Requests;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_audit_entries_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AuditEntries::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(AuditEntries::RequestId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AuditEntries::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AuditEntries::Actor).string().not_null())
                        .col(ColumnDef::new(AuditEntries::Action).string().not_null())
                        .col(ColumnDef::new(AuditEntries::Detail).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_audit_entries_request")
                                .from(AuditEntries::Table, AuditEntries::RequestId)
                                .to(Requests::Table, Requests::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditEntries::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum AuditEntries {
        Table,
        Id,
        RequestId,
        RecordedAt,
        Actor,
        Action,
        Detail,
    }
}

mod m20240101_000004_create_cost_centers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_cost_centers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CostCenters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CostCenters::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CostCenters::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(CostCenters::Sector).string().not_null())
                        .col(ColumnDef::new(CostCenters::Manager).string().not_null())
                        .col(ColumnDef::new(CostCenters::ManagerEmail).string())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CostCenters::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum CostCenters {
        Table,
        Id,
        Code,
        Sector,
        Manager,
        ManagerEmail,
    }
}
