pub mod catalog;
pub mod certification;
pub mod i18n;
pub mod missions;
pub mod users;
