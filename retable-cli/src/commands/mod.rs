pub mod list_ids;
pub mod update;
