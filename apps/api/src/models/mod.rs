pub mod confidence;
pub mod request;
pub mod resume;
