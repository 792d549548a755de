pub mod certificate;
pub mod identifier;
pub mod service_metadata;
