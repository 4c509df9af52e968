use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_middlewares_table(manager).await?;
        self.create_services_table(manager).await?;
        self.create_resources_table(manager).await?;
        self.create_resource_middlewares_table(manager).await?;
        self.create_resource_services_table(manager).await?;
        self.create_indexes(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ResourceServices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ResourceMiddlewares::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Resources::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Services::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Middlewares::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    fn uuid_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.uuid(),
            _ => col.string(),
        };
        col.not_null().to_owned()
    }

    async fn create_middlewares_table(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Middlewares::Table)
                    .if_not_exists()
                    .col(
                        self.uuid_column(manager, Middlewares::Id)
                            .primary_key()
                            .to_owned(),
                    )
                    .col(ColumnDef::new(Middlewares::Name).string().not_null())
                    .col(ColumnDef::new(Middlewares::Type).string().not_null())
                    .col(ColumnDef::new(Middlewares::Config).text().not_null())
                    .col(
                        ColumnDef::new(Middlewares::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Middlewares::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_services_table(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Services::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Services::Name).string().not_null())
                    .col(ColumnDef::new(Services::Type).string().not_null())
                    .col(ColumnDef::new(Services::Config).text().not_null())
                    .col(ColumnDef::new(Services::ProtocolHint).string().null())
                    .col(
                        ColumnDef::new(Services::Origin)
                            .string()
                            .not_null()
                            .default("operator"),
                    )
                    .col(
                        ColumnDef::new(Services::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Services::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_resources_table(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Resources::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Resources::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Resources::Host).string().not_null())
                    .col(ColumnDef::new(Resources::ServiceId).string().not_null())
                    .col(ColumnDef::new(Resources::OrgId).string().null())
                    .col(ColumnDef::new(Resources::SiteId).string().null())
                    .col(ColumnDef::new(Resources::Status).string().not_null())
                    .col(ColumnDef::new(Resources::SourceType).string().not_null())
                    .col(
                        ColumnDef::new(Resources::Entrypoints)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Resources::TlsDomains)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Resources::TcpEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Resources::TcpEntrypoints)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Resources::TcpSniRule)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Resources::CustomHeaders)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(Resources::RouterPriority)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(Resources::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Resources::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_resource_middlewares_table(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ResourceMiddlewares::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceMiddlewares::ResourceId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        self.uuid_column(manager, ResourceMiddlewares::MiddlewareId)
                            .to_owned(),
                    )
                    .col(
                        ColumnDef::new(ResourceMiddlewares::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(ResourceMiddlewares::ResourceId)
                            .col(ResourceMiddlewares::MiddlewareId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_middlewares_resource")
                            .from(ResourceMiddlewares::Table, ResourceMiddlewares::ResourceId)
                            .to(Resources::Table, Resources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_middlewares_middleware")
                            .from(ResourceMiddlewares::Table, ResourceMiddlewares::MiddlewareId)
                            .to(Middlewares::Table, Middlewares::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_resource_services_table(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ResourceServices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceServices::ResourceId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ResourceServices::ServiceId)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_services_resource")
                            .from(ResourceServices::Table, ResourceServices::ResourceId)
                            .to(Resources::Table, Resources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_services_service")
                            .from(ResourceServices::Table, ResourceServices::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_resources_host")
                    .table(Resources::Table)
                    .col(Resources::Host)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_resources_status")
                    .table(Resources::Table)
                    .col(Resources::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_resource_middlewares_resource")
                    .table(ResourceMiddlewares::Table)
                    .col(ResourceMiddlewares::ResourceId)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Middlewares {
    Table,
    Id,
    Name,
    Type,
    Config,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
    Name,
    Type,
    Config,
    ProtocolHint,
    Origin,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Resources {
    Table,
    Id,
    Host,
    ServiceId,
    OrgId,
    SiteId,
    Status,
    SourceType,
    Entrypoints,
    TlsDomains,
    TcpEnabled,
    TcpEntrypoints,
    TcpSniRule,
    CustomHeaders,
    RouterPriority,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ResourceMiddlewares {
    Table,
    ResourceId,
    MiddlewareId,
    Priority,
}

#[derive(DeriveIden)]
enum ResourceServices {
    Table,
    ResourceId,
    ServiceId,
}
