use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_practice_tables::Migration),
            Box::new(m20240301_000002_create_inventory_tables::Migration),
            Box::new(m20240301_000003_create_order_tables::Migration),
            Box::new(m20240301_000004_create_goods_receipt_tables::Migration),
            Box::new(m20240301_000005_create_audit_and_notification_tables::Migration),
        ]
    }
}

mod m20240301_000001_create_practice_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_practice_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Practices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Practices::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Practices::Name).string().not_null())
                        .col(
                            ColumnDef::new(Practices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PracticeSuppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PracticeSuppliers::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PracticeSuppliers::PracticeId).uuid().not_null())
                        .col(ColumnDef::new(PracticeSuppliers::Name).string().not_null())
                        .col(
                            ColumnDef::new(PracticeSuppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Items::PracticeId).uuid().not_null())
                        .col(ColumnDef::new(Items::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::Sku).string().null())
                        .col(ColumnDef::new(Items::DefaultPracticeSupplierId).uuid().null())
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Locations::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Locations::PracticeId).uuid().not_null())
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .col(ColumnDef::new(Locations::Code).string().null())
                        .col(ColumnDef::new(Locations::ParentId).uuid().null())
                        .col(
                            ColumnDef::new(Locations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Locations::UpdatedAt)
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
                        .name("idx_practice_suppliers_practice_id")
                        .table(PracticeSuppliers::Table)
                        .col(PracticeSuppliers::PracticeId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_practice_id")
                        .table(Items::Table)
                        .col(Items::PracticeId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_locations_practice_id")
                        .table(Locations::Table)
                        .col(Locations::PracticeId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_locations_parent_id")
                        .table(Locations::Table)
                        .col(Locations::ParentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PracticeSuppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Practices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Practices {
        Table,
        Id,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PracticeSuppliers {
        Table,
        Id,
        PracticeId,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Items {
        Table,
        Id,
        PracticeId,
        ProductId,
        Name,
        Sku,
        DefaultPracticeSupplierId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
        PracticeId,
        Name,
        Code,
        ParentId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_inventory_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Quantity can never go negative, whatever the application does.
            manager
                .create_table(
                    Table::create()
                        .table(LocationInventory::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(LocationInventory::LocationId).uuid().not_null())
                        .col(ColumnDef::new(LocationInventory::ItemId).uuid().not_null())
                        .col(ColumnDef::new(LocationInventory::PracticeId).uuid().not_null())
                        .col(
                            ColumnDef::new(LocationInventory::Quantity)
                                .integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(LocationInventory::Quantity).gte(0)),
                        )
                        .col(
                            ColumnDef::new(LocationInventory::ReorderPoint)
                                .integer()
                                .null()
                                .check(Expr::col(LocationInventory::ReorderPoint).gte(0)),
                        )
                        .col(
                            ColumnDef::new(LocationInventory::ReorderQuantity)
                                .integer()
                                .null()
                                .check(Expr::col(LocationInventory::ReorderQuantity).gt(0)),
                        )
                        .col(
                            ColumnDef::new(LocationInventory::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .name("pk_location_inventory")
                                .col(LocationInventory::LocationId)
                                .col(LocationInventory::ItemId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustments::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockAdjustments::PracticeId).uuid().not_null())
                        .col(ColumnDef::new(StockAdjustments::LocationId).uuid().not_null())
                        .col(ColumnDef::new(StockAdjustments::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(StockAdjustments::Quantity).ne(0)),
                        )
                        .col(ColumnDef::new(StockAdjustments::Reason).string().not_null())
                        .col(ColumnDef::new(StockAdjustments::Note).text().null())
                        .col(ColumnDef::new(StockAdjustments::CreatedById).uuid().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockTransfers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(StockTransfers::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(StockTransfers::PracticeId).uuid().not_null())
                        .col(ColumnDef::new(StockTransfers::FromLocationId).uuid().not_null())
                        .col(ColumnDef::new(StockTransfers::ToLocationId).uuid().not_null())
                        .col(ColumnDef::new(StockTransfers::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockTransfers::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(StockTransfers::Quantity).gt(0)),
                        )
                        .col(ColumnDef::new(StockTransfers::Note).text().null())
                        .col(ColumnDef::new(StockTransfers::CreatedById).uuid().not_null())
                        .col(
                            ColumnDef::new(StockTransfers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CountSessions::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(CountSessions::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(CountSessions::PracticeId).uuid().not_null())
                        .col(ColumnDef::new(CountSessions::LocationId).uuid().not_null())
                        .col(ColumnDef::new(CountSessions::Status).string().not_null())
                        .col(ColumnDef::new(CountSessions::CreatedById).uuid().not_null())
                        .col(
                            ColumnDef::new(CountSessions::CreatedAt)
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
                        .name("idx_location_inventory_practice_item")
                        .table(LocationInventory::Table)
                        .col(LocationInventory::PracticeId)
                        .col(LocationInventory::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_adjustments_location_item")
                        .table(StockAdjustments::Table)
                        .col(StockAdjustments::LocationId)
                        .col(StockAdjustments::ItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CountSessions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockTransfers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockAdjustments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(LocationInventory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum LocationInventory {
        Table,
        LocationId,
        ItemId,
        PracticeId,
        Quantity,
        ReorderPoint,
        ReorderQuantity,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StockAdjustments {
        Table,
        Id,
        PracticeId,
        LocationId,
        ItemId,
        Quantity,
        Reason,
        Note,
        CreatedById,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum StockTransfers {
        Table,
        Id,
        PracticeId,
        FromLocationId,
        ToLocationId,
        ItemId,
        Quantity,
        Note,
        CreatedById,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum CountSessions {
        Table,
        Id,
        PracticeId,
        LocationId,
        Status,
        CreatedById,
        CreatedAt,
    }
}

mod m20240301_000003_create_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Orders::PracticeId).uuid().not_null())
                        .col(ColumnDef::new(Orders::PracticeSupplierId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string_len(32).not_null())
                        .col(ColumnDef::new(Orders::Reference).string().null())
                        .col(ColumnDef::new(Orders::Notes).text().null())
                        .col(ColumnDef::new(Orders::CreatedById).uuid().not_null())
                        .col(ColumnDef::new(Orders::SentAt).timestamp_with_time_zone().null())
                        .col(
                            ColumnDef::new(Orders::ReceivedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(OrderItems::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(OrderItems::Quantity).gt(0)),
                        )
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(OrderItems::Notes).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_practice_status")
                        .table(Orders::Table)
                        .col(Orders::PracticeId)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("uq_order_items_order_item")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .col(OrderItems::ItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        PracticeId,
        PracticeSupplierId,
        Status,
        Reference,
        Notes,
        CreatedById,
        SentAt,
        ReceivedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ItemId,
        Quantity,
        UnitPrice,
        Notes,
    }
}

mod m20240301_000004_create_goods_receipt_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_goods_receipt_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceipts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(GoodsReceipts::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(GoodsReceipts::PracticeId).uuid().not_null())
                        .col(ColumnDef::new(GoodsReceipts::LocationId).uuid().not_null())
                        .col(ColumnDef::new(GoodsReceipts::OrderId).uuid().null())
                        .col(ColumnDef::new(GoodsReceipts::SupplierId).uuid().null())
                        .col(ColumnDef::new(GoodsReceipts::Status).string_len(16).not_null())
                        .col(ColumnDef::new(GoodsReceipts::Notes).text().null())
                        .col(
                            ColumnDef::new(GoodsReceipts::ReceivedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(GoodsReceipts::CreatedById).uuid().not_null())
                        .col(
                            ColumnDef::new(GoodsReceipts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceipts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceiptLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsReceiptLines::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(GoodsReceiptLines::ReceiptId).uuid().not_null())
                        .col(ColumnDef::new(GoodsReceiptLines::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(GoodsReceiptLines::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(GoodsReceiptLines::Quantity).gt(0)),
                        )
                        .col(ColumnDef::new(GoodsReceiptLines::BatchNumber).string().null())
                        .col(ColumnDef::new(GoodsReceiptLines::ExpiryDate).date().null())
                        .col(ColumnDef::new(GoodsReceiptLines::ScannedGtin).string().null())
                        .col(ColumnDef::new(GoodsReceiptLines::Notes).text().null())
                        .col(
                            ColumnDef::new(GoodsReceiptLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_goods_receipt_lines_receipt_id")
                                .from(GoodsReceiptLines::Table, GoodsReceiptLines::ReceiptId)
                                .to(GoodsReceipts::Table, GoodsReceipts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_goods_receipts_order_id")
                        .table(GoodsReceipts::Table)
                        .col(GoodsReceipts::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_goods_receipts_practice_status")
                        .table(GoodsReceipts::Table)
                        .col(GoodsReceipts::PracticeId)
                        .col(GoodsReceipts::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_goods_receipt_lines_receipt_id")
                        .table(GoodsReceiptLines::Table)
                        .col(GoodsReceiptLines::ReceiptId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GoodsReceiptLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GoodsReceipts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum GoodsReceipts {
        Table,
        Id,
        PracticeId,
        LocationId,
        OrderId,
        SupplierId,
        Status,
        Notes,
        ReceivedAt,
        CreatedById,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum GoodsReceiptLines {
        Table,
        Id,
        ReceiptId,
        ItemId,
        Quantity,
        BatchNumber,
        ExpiryDate,
        ScannedGtin,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000005_create_audit_and_notification_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_audit_and_notification_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AuditLogs::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(AuditLogs::PracticeId).uuid().not_null())
                        .col(ColumnDef::new(AuditLogs::ActorId).uuid().not_null())
                        .col(ColumnDef::new(AuditLogs::EntityType).string().not_null())
                        .col(ColumnDef::new(AuditLogs::EntityId).uuid().not_null())
                        .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                        .col(ColumnDef::new(AuditLogs::Changes).json().not_null())
                        .col(ColumnDef::new(AuditLogs::Metadata).json().null())
                        .col(
                            ColumnDef::new(AuditLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Notifications::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Notifications::PracticeId).uuid().not_null())
                        .col(ColumnDef::new(Notifications::Kind).string_len(32).not_null())
                        .col(ColumnDef::new(Notifications::Title).string().not_null())
                        .col(ColumnDef::new(Notifications::Message).text().not_null())
                        .col(ColumnDef::new(Notifications::ItemId).uuid().null())
                        .col(ColumnDef::new(Notifications::LocationId).uuid().null())
                        .col(
                            ColumnDef::new(Notifications::Read)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Notifications::CreatedAt)
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
                        .name("idx_audit_logs_entity")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::EntityType)
                        .col(AuditLogs::EntityId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_notifications_practice_item_location")
                        .table(Notifications::Table)
                        .col(Notifications::PracticeId)
                        .col(Notifications::ItemId)
                        .col(Notifications::LocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AuditLogs {
        Table,
        Id,
        PracticeId,
        ActorId,
        EntityType,
        EntityId,
        Action,
        Changes,
        Metadata,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Notifications {
        Table,
        Id,
        PracticeId,
        Kind,
        Title,
        Message,
        ItemId,
        LocationId,
        Read,
        CreatedAt,
    }
}
