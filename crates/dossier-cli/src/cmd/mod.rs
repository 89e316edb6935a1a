pub mod build;
pub mod gates;
