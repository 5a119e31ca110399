pub(crate) mod error;
pub(crate) mod fish_service;
