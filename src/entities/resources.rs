use sea_orm::entity::prelude::*;

/// Logo artifact rows: canonical vector sources and pre-rendered bitmaps
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "resources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub short_name: String,
    pub resource_name: String,
    pub resource_type: String,
    pub resource_md5: String,
    pub resource_size_b: Option<i64>,
    pub last_update_time: Option<ChronoDateTimeUtc>,
    pub is_vector: bool,
    pub is_bitmap: bool,
    pub resolution_width: Option<i32>,
    pub resolution_height: Option<i32>,
    pub used_for_edge: bool,
    pub is_deleted: bool,
    pub background_color: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
