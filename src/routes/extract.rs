//! Extractors running `validator` rules through `axum-valid` and reporting
//! rejections in the JSON error envelope.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
};
use axum_valid::{Valid, ValidRejection};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body deserialized and validated.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

/// Query string deserialized and validated.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

fn json_rejection(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge;
    }
    AppError::bad_request("INVALID_JSON", rejection.body_text())
}

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Valid::<Json<T>>::from_request(req, state).await {
            Ok(Valid(Json(value))) => Ok(Self(value)),
            Err(ValidRejection::Valid(errors)) => Err(errors.into()),
            Err(ValidRejection::Inner(rejection)) => Err(json_rejection(rejection)),
        }
    }
}

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Valid::<Query<T>>::from_request_parts(parts, state).await {
            Ok(Valid(Query(value))) => Ok(Self(value)),
            Err(ValidRejection::Valid(errors)) => Err(errors.into()),
            Err(ValidRejection::Inner(rejection)) => Err(query_rejection(rejection)),
        }
    }
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    AppError::bad_request("INVALID_QUERY", rejection.body_text())
}
