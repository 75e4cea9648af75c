pub mod format;
pub mod import;
pub mod record;
