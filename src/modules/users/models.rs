use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Honorific a user registers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Title {
    Mr,
    Mrs,
    Miss,
}

impl FromStr for Title {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mr" => Ok(Self::Mr),
            "Mrs" => Ok(Self::Mrs),
            "Miss" => Ok(Self::Miss),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self {
            Self::Mr => "Mr",
            Self::Mrs => "Mrs",
            Self::Miss => "Miss",
        };
        f.write_str(title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub pincode: String,
}

/// A registered account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub title: Title,
    pub name: String,
    pub phone: String,
    pub email: String,
    /// Argon2 PHC string; never leaves the service.
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// `POST /register` body.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterUser {
    pub title: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<AddressInput>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl RegisterUser {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.address.is_none()
            && self.other.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AddressInput {
    pub street: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
}

/// `POST /login` body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl LoginRequest {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.other.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginToken {
    pub token: String,
}
