pub mod alloc;
pub mod lots;
pub mod returns;
pub mod summary;
pub mod transfer;
pub mod ui;
