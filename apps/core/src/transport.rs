use serde::{Deserialize, Serialize};

use crate::contract::{CoreRequest, CoreResponse};
use crate::core_service::{CoreService, ServiceError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    Config,
    Store,
    Launch,
    GroupNotFound,
    TargetNotFound,
    Icon,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportResponse {
    Ok { response: CoreResponse },
    Err { error: ErrorResponse },
}

pub fn handle_request(service: &CoreService, request: CoreRequest) -> TransportResponse {
    match service.handle_command(request) {
        Ok(response) => TransportResponse::Ok { response },
        Err(error) => TransportResponse::Err {
            error: map_service_error(error),
        },
    }
}

pub fn handle_json(service: &CoreService, payload: &str) -> String {
    let response = match serde_json::from_str::<CoreRequest>(payload) {
        Ok(request) => handle_request(service, request),
        Err(error) => TransportResponse::Err {
            error: ErrorResponse {
                code: ErrorCode::InvalidJson,
                message: error.to_string(),
            },
        },
    };

    serde_json::to_string(&response).unwrap_or_else(|error| {
        format!(
            "{{\"status\":\"err\",\"error\":{{\"code\":\"invalid_json\",\"message\":\"{error}\"}}}}"
        )
    })
}

fn map_service_error(error: ServiceError) -> ErrorResponse {
    match error {
        ServiceError::Config(message) => ErrorResponse {
            code: ErrorCode::Config,
            message,
        },
        ServiceError::Store(error) => ErrorResponse {
            code: ErrorCode::Store,
            message: error.to_string(),
        },
        ServiceError::Launch(error) => ErrorResponse {
            code: ErrorCode::Launch,
            message: error.to_string(),
        },
        ServiceError::GroupNotFound(name) => ErrorResponse {
            code: ErrorCode::GroupNotFound,
            message: name,
        },
        ServiceError::TargetNotFound(id) => ErrorResponse {
            code: ErrorCode::TargetNotFound,
            message: id.to_string(),
        },
        ServiceError::Icon(message) => ErrorResponse {
            code: ErrorCode::Icon,
            message,
        },
    }
}
