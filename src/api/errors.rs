use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::hydration::HydrationError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Hydration(#[from] HydrationError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn reason(&self) -> &'static str {
        match self {
            ApiError::Hydration(err) => err.reason(),
            ApiError::BadRequest(_) => "bad_request",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Hydration(HydrationError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Hydration(HydrationError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Hydration(HydrationError::StoreUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Hydration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.reason(),
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MemberId, OrderId};
    use crate::store::{EntityKey, StoreError};

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest("strategy".into()), StatusCode::BAD_REQUEST),
            (
                HydrationError::InvalidArgument("status".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                HydrationError::NotFound(EntityKey::Member(MemberId(1))).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                HydrationError::StoreUnavailable(StoreError::Timeout("pool".into())).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                HydrationError::PartialCollection {
                    order_id: OrderId(1),
                    expected: 3,
                    loaded: 1,
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }
}
