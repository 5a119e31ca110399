mod fish;

pub(crate) use crate::persistence::fish::file_names::join_file_names;
pub(crate) use crate::persistence::fish::{FishActiveModel, FishColumn, FishEntity, FishModel};
