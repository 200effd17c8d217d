//! Domain aggregates exchanged with the admin API.

pub mod city;
pub mod country;
pub mod types;
pub mod validation;
