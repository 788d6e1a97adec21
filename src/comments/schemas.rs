//! Request schemas for the comment routes, as JSON-Schema documents.

use serde_json::json;

use crate::schema::Schema;

/// Path of `GET` and `POST /comments/{docid}`.
pub fn get_comments() -> Schema {
    Schema::from_json_schema(&json!({
        "type": "object",
        "properties": {
            "docid": { "type": "string", "minLength": 1 },
        },
        "required": ["docid"],
    }))
}

/// Body of `POST /comments/{docid}`. Fields beyond `text` are kept.
pub fn create_comment() -> Schema {
    Schema::from_json_schema(&json!({
        "type": "object",
        "properties": {
            "text": { "type": "string", "minLength": 1 },
        },
        "required": ["text"],
    }))
}

/// Path of `DELETE /comments/{docid}/{commentid}`.
pub fn delete_comment() -> Schema {
    Schema::from_json_schema(&json!({
        "type": "object",
        "properties": {
            "docid": { "type": "string", "minLength": 1 },
            "commentid": { "type": "string", "minLength": 1 },
        },
        "required": ["docid", "commentid"],
    }))
}
