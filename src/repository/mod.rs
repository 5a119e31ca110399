pub(crate) mod fish_repository;
