use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use booking_engine::BookingError;
use log::error;
use thiserror::Error;

use crate::gateway::GatewayClientError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error. {0}")]
    CouldNotDeserializePayload(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("A valid X-Admin-Key header is required for this request.")]
    AdminKeyRequired,
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
    #[error("The request is not allowed in the current state. {0}")]
    InvalidState(String),
    #[error("{0}")]
    AlreadyDecided(String),
    #[error("The payment gateway could not complete the request. {0}")]
    GatewayError(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("The request timed out. {0}")]
    Timeout(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AdminKeyRequired => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::AlreadyDecided(_) => StatusCode::CONFLICT,
            Self::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<BookingError> for ServerError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::OrderNotFound(_)
            | BookingError::OrderIdNotFound(_)
            | BookingError::RefundRequestNotFound(_) => Self::NoRecordFound(e.to_string()),
            BookingError::Conflict(_) | BookingError::OrderAlreadyExists(_) => Self::Conflict(e.to_string()),
            BookingError::AlreadyDecided(_) => Self::AlreadyDecided(e.to_string()),
            BookingError::InvalidState(_) => Self::InvalidState(e.to_string()),
            BookingError::GatewayReversal(_) => Self::GatewayError(e.to_string()),
            BookingError::UnknownTransactionStatus(_)
            | BookingError::InvalidAmount(_)
            | BookingError::InvalidBookingDetails(_) => Self::ValidationError(e.to_string()),
            BookingError::DatabaseError(_) => {
                error!("💻️ Database error while handling a request. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<GatewayClientError> for ServerError {
    fn from(e: GatewayClientError) -> Self {
        match e {
            GatewayClientError::Initialization(s) => Self::InitializeError(s),
            e => Self::GatewayError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use booking_engine::{db_types::OrderNumber, GatewayReversalError};

    use super::*;

    #[test]
    fn engine_errors_map_to_status_codes() {
        let status = |e: BookingError| ServerError::from(e).status_code();
        assert_eq!(status(BookingError::OrderNotFound(OrderNumber::from("ORD-1"))), StatusCode::NOT_FOUND);
        assert_eq!(status(BookingError::RefundRequestNotFound(4)), StatusCode::NOT_FOUND);
        assert_eq!(status(BookingError::Conflict("booked".into())), StatusCode::CONFLICT);
        assert_eq!(status(BookingError::AlreadyDecided(4)), StatusCode::CONFLICT);
        assert_eq!(status(BookingError::InvalidState("unpaid".into())), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status(BookingError::GatewayReversal(GatewayReversalError::Timeout)), StatusCode::BAD_GATEWAY);
        assert_eq!(status(BookingError::InvalidAmount("0".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(BookingError::DatabaseError("locked".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
