pub mod config;
pub mod corpus;
pub mod document;
pub mod paths;
