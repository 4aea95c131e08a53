pub mod classify;
pub mod knowledge;
pub mod lifecycle;
pub mod processor;
pub mod report;
pub mod retrieval;
pub mod routing;
pub mod vision;
