pub mod csv_data;
pub mod file;
pub mod stdin;
