pub mod prepare;
pub mod queries;
