pub mod batch;
pub mod errors;
pub mod ports;
pub mod report;
pub mod sources;
pub mod use_cases;
