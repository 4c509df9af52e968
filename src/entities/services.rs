use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "services")]
pub struct Model {
    /// Upstream-style id: may carry a `@provider` suffix when discovered
    /// (never a generated UUID) so the duplicate sweep (spec §4.6) can key
    /// on it the same way it keys on `resources.id`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub r#type: String,
    /// Raw JSON text; see the note on `middlewares::Model::config`.
    #[sea_orm(column_type = "Text")]
    pub config: String,
    /// Explicit protocol classification for `loadBalancer` services with
    /// `address`-shaped servers. `NULL` means TCP (spec §9 Open Question
    /// resolution — never inferred from server shape).
    pub protocol_hint: Option<String>,
    /// `"operator"` for Admin-API-created services, the data source's
    /// `source_type` string for Watcher-discovered ones. Drives whether the
    /// Generator re-emits this row into the artifact (spec §4.4 step 5
    /// emits only operator-defined services; discovered ones already exist
    /// in the upstream the proxy talks to directly).
    pub origin: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::resource_services::Entity")]
    ResourceServices,
}

impl Related<super::resource_services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceServices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
