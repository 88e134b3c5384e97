//! BDD step definitions for the DAU monitor service

pub mod fetch_steps;
