pub mod daily;
pub mod sources;
pub mod summary;
pub mod trend;
