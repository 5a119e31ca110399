mod entity;
pub(crate) mod file_names;

pub(crate) use entity::{
    ActiveModel as FishActiveModel, Column as FishColumn, Entity as FishEntity,
    Model as FishModel,
};
