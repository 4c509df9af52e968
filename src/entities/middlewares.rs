use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "middlewares")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub r#type: String,
    /// Raw JSON text, not a native JSON column: the Store contract (spec
    /// §4.1) requires `GetMiddlewares()` to fall back to the raw string if
    /// JSON parsing fails, which only makes sense against text storage.
    #[sea_orm(column_type = "Text")]
    pub config: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::resource_middlewares::Entity")]
    ResourceMiddlewares,
}

impl Related<super::resource_middlewares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceMiddlewares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
