//! Page data handed from services to the view layer.

pub mod cities;
pub mod countries;
