//! Embedded schema migrations, applied by `db::run_migrations` and the
//! seed binary's `--migrate` flag.

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250110_000001_create_meter_readings_table::Migration),
            Box::new(m20250110_000002_create_device_profiles_table::Migration),
            Box::new(m20250110_000003_create_devices_table::Migration),
            Box::new(m20250110_000004_create_alerts_table::Migration),
            Box::new(m20250110_000005_create_threshold_configs_table::Migration),
        ]
    }
}

mod m20250110_000001_create_meter_readings_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250110_000001_create_meter_readings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Composite key (time, point_id) makes a duplicate tick a no-op
            // insert instead of a second row.
            manager
                .create_table(
                    Table::create()
                        .table(MeterReadings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MeterReadings::Time)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MeterReadings::PointId).string().not_null())
                        .col(
                            ColumnDef::new(MeterReadings::DeviceId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MeterReadings::Value).double().not_null())
                        .col(ColumnDef::new(MeterReadings::Incr).double().not_null())
                        .primary_key(
                            Index::create()
                                .col(MeterReadings::Time)
                                .col(MeterReadings::PointId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_meter_readings_point_time")
                        .table(MeterReadings::Table)
                        .col(MeterReadings::PointId)
                        .col(MeterReadings::Time)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MeterReadings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MeterReadings {
        Table,
        Time,
        PointId,
        DeviceId,
        Value,
        Incr,
    }
}

mod m20250110_000002_create_device_profiles_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250110_000002_create_device_profiles_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DeviceProfiles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeviceProfiles::PointId)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeviceProfiles::MeanValue)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeviceProfiles::StdValue)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(DeviceProfiles::MinValue).double().null())
                        .col(ColumnDef::new(DeviceProfiles::MaxValue).double().null())
                        .col(
                            ColumnDef::new(DeviceProfiles::LastValue)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DeviceProfiles::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum DeviceProfiles {
        Table,
        PointId,
        MeanValue,
        StdValue,
        MinValue,
        MaxValue,
        LastValue,
    }
}

mod m20250110_000003_create_devices_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250110_000003_create_devices_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Device ids are derived from point ids, never generated here.
            manager
                .create_table(
                    Table::create()
                        .table(Devices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Devices::DeviceId)
                                .big_integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Devices::DeviceNo).string().null())
                        .col(ColumnDef::new(Devices::DeviceName).string().null())
                        .col(
                            ColumnDef::new(Devices::Status)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(Devices::Remark).string().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Devices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Devices {
        Table,
        DeviceId,
        DeviceNo,
        DeviceName,
        Status,
        Remark,
    }
}

mod m20250110_000004_create_alerts_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250110_000004_create_alerts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Alerts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Alerts::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Alerts::PointId).string().null())
                        .col(ColumnDef::new(Alerts::DeviceId).big_integer().null())
                        .col(ColumnDef::new(Alerts::AlertType).string().not_null())
                        .col(ColumnDef::new(Alerts::Severity).string().not_null())
                        .col(ColumnDef::new(Alerts::Message).string().not_null())
                        .col(ColumnDef::new(Alerts::Value).double().null())
                        .col(ColumnDef::new(Alerts::Threshold).double().null())
                        .col(
                            ColumnDef::new(Alerts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Alerts::ResolvedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Open-alert lookups filter on point, type and resolved_at.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_alerts_point_type_resolved")
                        .table(Alerts::Table)
                        .col(Alerts::PointId)
                        .col(Alerts::AlertType)
                        .col(Alerts::ResolvedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_alerts_created_at")
                        .table(Alerts::Table)
                        .col(Alerts::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Alerts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Alerts {
        Table,
        Id,
        PointId,
        DeviceId,
        AlertType,
        Severity,
        Message,
        Value,
        Threshold,
        CreatedAt,
        ResolvedAt,
    }
}

mod m20250110_000005_create_threshold_configs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250110_000005_create_threshold_configs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ThresholdConfigs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ThresholdConfigs::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ThresholdConfigs::PointId).string().null())
                        .col(
                            ColumnDef::new(ThresholdConfigs::DeviceId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ThresholdConfigs::Metric)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ThresholdConfigs::MinValue).double().null())
                        .col(ColumnDef::new(ThresholdConfigs::MaxValue).double().null())
                        .col(
                            ColumnDef::new(ThresholdConfigs::Severity)
                                .string()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_threshold_configs_point_id")
                        .table(ThresholdConfigs::Table)
                        .col(ThresholdConfigs::PointId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ThresholdConfigs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ThresholdConfigs {
        Table,
        Id,
        PointId,
        DeviceId,
        Metric,
        MinValue,
        MaxValue,
        Severity,
    }
}
