pub mod park_data;
pub mod park_units;
pub mod park_visits;
