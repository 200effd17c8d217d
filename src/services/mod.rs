//! Load and save workflows behind the edit screens.

use thiserror::Error;

use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::pagination::QueryError;
use crate::repository::ApiError;

pub mod cities;
pub mod countries;

/// Route the view navigates to after a successful city save.
pub const CITIES_ROUTE: &str = "/cities";
/// Route the view navigates to after a successful country save.
pub const COUNTRIES_ROUTE: &str = "/countries";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Api(ApiError),

    #[error(transparent)]
    TypeConstraint(#[from] TypeConstraintError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound => ServiceError::NotFound,
            other => ServiceError::Api(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result of a successful save: the stored entity and where to go next.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome<T> {
    pub entity: T,
    pub redirect_to: &'static str,
}
