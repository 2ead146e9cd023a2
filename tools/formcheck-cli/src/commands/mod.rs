pub mod analyze;
pub mod skills;
pub mod validate;
