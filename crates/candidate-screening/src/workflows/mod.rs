pub mod screening;
pub mod sheets;
