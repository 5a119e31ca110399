use crate::persistence::fish::file_names::split_file_names;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fish")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub catch_date: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Text")]
    pub image_file_names: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Stored image filenames in upload order.
    pub fn image_file_names_list(&self) -> Vec<String> {
        split_file_names(&self.image_file_names)
    }
}
