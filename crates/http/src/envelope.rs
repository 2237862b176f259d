//! Success envelope shared by every handler

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{ success: true, message, count?, data }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            count: None,
            data,
        }
    }
}

impl<T> Envelope<Vec<T>> {
    /// Envelope for collections; carries the item count alongside the data.
    pub fn list(message: impl Into<String>, data: Vec<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            count: Some(data.len()),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_item_has_no_count() {
        let value = serde_json::to_value(Envelope::new("ok", 7)).unwrap();
        assert_eq!(value, serde_json::json!({"success": true, "message": "ok", "data": 7}));
    }

    #[test]
    fn list_carries_count() {
        let value = serde_json::to_value(Envelope::list("found", vec!["a", "b"])).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["data"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn empty_list_is_still_success() {
        let value = serde_json::to_value(Envelope::list("found", Vec::<u8>::new())).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["count"], 0);
    }
}
