pub mod demo;
pub mod registry;
