mod image_storage;

pub(crate) use image_storage::ImageStorage;
