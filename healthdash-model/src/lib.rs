pub mod dashboard;
pub mod measurement;
pub mod trend;
