//! Client core of the cities and countries admin.
//!
//! The `data` feature builds the plain data layer: domain types, query
//! building and form validation. The default `client` feature adds the HTTP
//! repository, the list and validation gates, and the edit services.

pub mod domain;
pub mod forms;
pub mod pagination;

#[cfg(feature = "client")]
pub mod dto;
#[cfg(feature = "client")]
pub mod gate;
#[cfg(feature = "client")]
pub mod models;
#[cfg(feature = "client")]
pub mod repository;
#[cfg(feature = "client")]
pub mod services;
