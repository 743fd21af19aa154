use mongodb::bson::{oid::ObjectId, Document};
use serde::{de, Deserialize, Deserializer, Serialize};

/// User document as stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub age: f64,
    pub email: String,
    #[serde(
        rename = "phoneNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub phone_number: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("User validation failed: {0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// The four user fields, each optional. Serves as an exact-match filter,
/// a partial update and the raw create payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFields {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub age: Option<f64>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub phone_number: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accepts `36` as well as `"36"`; an empty string counts as absent.
fn deserialize_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            match text.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(de::Error::custom(format!(
                    "Cast to Number failed for value \"{text}\""
                ))),
            }
        }
    }
}

impl UserFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
    }

    /// BSON map holding only the fields that are present.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if let Some(name) = &self.name {
            doc.insert("name", name.as_str());
        }
        if let Some(age) = self.age {
            doc.insert("age", age);
        }
        if let Some(email) = &self.email {
            doc.insert("email", email.as_str());
        }
        if let Some(phone_number) = self.phone_number {
            doc.insert("phoneNumber", phone_number);
        }
        doc
    }
}

/// Create payload with the required fields checked.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub age: f64,
    pub email: String,
    pub phone_number: Option<f64>,
}

impl NewUser {
    /// Assigns a fresh id.
    pub fn into_document(self) -> UserDocument {
        UserDocument {
            id: ObjectId::new(),
            name: self.name,
            age: self.age,
            email: self.email,
            phone_number: self.phone_number,
        }
    }
}

impl TryFrom<UserFields> for NewUser {
    type Error = StoreError;

    fn try_from(fields: UserFields) -> Result<Self, Self::Error> {
        // an empty string does not satisfy a required path
        let name = fields.name.filter(|v| !v.is_empty());
        let email = fields.email.filter(|v| !v.is_empty());
        match (name, fields.age, email) {
            (Some(name), Some(age), Some(email)) => Ok(Self {
                name,
                age,
                email,
                phone_number: fields.phone_number,
            }),
            (name, age, email) => {
                let missing: Vec<String> = [
                    ("name", name.is_none()),
                    ("age", age.is_none()),
                    ("email", email.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(path, _)| format!("{path}: Path `{path}` is required."))
                .collect();
                Err(StoreError::Validation(missing.join(", ")))
            }
        }
    }
}

pub fn parse_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}
