pub mod json_table;
