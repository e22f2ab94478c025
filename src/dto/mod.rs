pub mod auth_dto;
pub mod webapp_dto;
