pub mod calendar;
pub mod table_reader;
pub mod types;
