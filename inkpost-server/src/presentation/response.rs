use crate::domain::DomainError;
use actix_web::HttpResponse;
use serde::Serialize;

/// Standard response envelope: `status` always mirrors the HTTP status line.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        status: 200,
        message: message.to_string(),
        data: Some(data),
    })
}

pub fn ok_message(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::<()> {
        status: 200,
        message: message.to_string(),
        data: None,
    })
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse {
        status: 201,
        message: message.to_string(),
        data: Some(data),
    })
}

pub fn error_to_response(err: DomainError) -> HttpResponse {
    let status_code = err.to_status_code();
    let message = err.to_string();

    match status_code {
        400 => HttpResponse::BadRequest()
            .json(serde_json::json!({ "status": 400, "message": message })),
        401 => HttpResponse::Unauthorized()
            .json(serde_json::json!({ "status": 401, "message": message })),
        403 => HttpResponse::Forbidden()
            .json(serde_json::json!({ "status": 403, "message": message })),
        404 => HttpResponse::NotFound()
            .json(serde_json::json!({ "status": 404, "message": message })),
        409 => HttpResponse::Conflict()
            .json(serde_json::json!({ "status": 409, "message": message })),
        _ => {
            // Internals stay in the logs, not in the body.
            tracing::error!("Request failed: {}", message);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "status": 500, "message": "Server Error" }))
        }
    }
}
