use actix_web::{HttpResponse, error::InternalError, web};
use serde::Serialize;

/// The JSON envelope every endpoint responds with.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request succeeded
    pub success: bool,
    /// Number of items in `data`, for list responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data: Some(data),
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// A successful list response with its item count.
    pub fn list(items: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(items.len()),
            data: Some(items),
        }
    }
}

/// A successful response with an empty object as data, used by deletions.
pub fn empty_success() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::data(serde_json::Map::new()))
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "message": message
    }))
}

/// JSON body extractor config reporting malformed bodies in the envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        InternalError::from_response(err, bad_request(message)).into()
    })
}

/// Path extractor config; ids that are not UUIDs are a bad request.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        InternalError::from_response(err, bad_request("Invalid id".to_string())).into()
    })
}

/// Query string extractor config reporting bad parameters in the envelope.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        InternalError::from_response(err, bad_request(message)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_envelope_has_count() {
        let body = serde_json::to_value(ApiResponse::list(vec![1, 2, 3])).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "success": true, "count": 3, "data": [1, 2, 3] })
        );
    }

    #[test]
    fn test_data_envelope_omits_count() {
        let body = serde_json::to_value(ApiResponse::data("ok")).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "data": "ok" }));
    }
}
