//! Success envelope for API handlers.
//!
//! Every successful body is `{ "data": ... }`; failures use the
//! `{ "error", "code" }` shape produced by [`AppError`](crate::error::AppError).

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
