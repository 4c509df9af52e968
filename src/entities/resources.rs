use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "resources")]
pub struct Model {
    /// Normalized upstream id (spec §4.6 — never the raw, provider-suffixed
    /// id). Stable across polls for a logical resource.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub host: String,
    pub service_id: String,
    pub org_id: Option<String>,
    pub site_id: Option<String>,
    pub status: String,
    pub source_type: String,

    // Operator-owned override columns.
    pub entrypoints: String,
    pub tls_domains: String,
    pub tcp_enabled: bool,
    pub tcp_entrypoints: String,
    pub tcp_sni_rule: String,
    /// Raw JSON text; see the note on `middlewares::Model::config`.
    #[sea_orm(column_type = "Text")]
    pub custom_headers: String,
    pub router_priority: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::resource_middlewares::Entity")]
    ResourceMiddlewares,
    #[sea_orm(has_one = "super::resource_services::Entity")]
    ResourceService,
}

impl Related<super::resource_middlewares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceMiddlewares.def()
    }
}

impl Related<super::resource_services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceService.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
