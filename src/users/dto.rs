use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::{Serialize, Serializer};

use super::repo_types::{UserDocument, UserFields};
use crate::error::ApiError;

// 2^53, the largest integer a JSON number holds exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// JSON request body for create and update. A missing or blank body reads
/// as no fields at all, whatever the content type.
#[derive(Debug)]
pub struct UserBody(pub UserFields);

#[async_trait]
impl<S> FromRequest<S> for UserBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(UserFields::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

/// User as returned to the client.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "serialize_number")]
    pub age: f64,
    pub email: String,
    #[serde(
        rename = "phoneNumber",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_number"
    )]
    pub phone_number: Option<f64>,
}

impl From<UserDocument> for UserResponse {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            name: doc.name,
            age: doc.age,
            email: doc.email,
            phone_number: doc.phone_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedCount {
    #[serde(rename = "deletedCount")]
    pub deleted_count: u64,
}

/// Whole numbers go out as integers (`30`, not `30.0`).
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn serialize_optional_number<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serialize_number(v, serializer),
        None => serializer.serialize_none(),
    }
}
