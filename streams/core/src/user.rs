//! User Projection
//!
//! Stream membership is reported as native user descriptors. The accessor
//! converts each one through a [`UserProjection`]; [`project_user`] is the
//! default.

use serde::{Deserialize, Serialize};

use crate::model::{NativeUser, UserId};

/// Conversion from a native user descriptor to a canonical user record
pub type UserProjection = fn(&NativeUser) -> CanonicalUser;

/// Flat user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CanonicalUser {
    /// User identifier
    pub user_id: UserId,
    /// Primary email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Name shown in clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Login name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Company
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Default user projection
#[must_use]
pub fn project_user(user: &NativeUser) -> CanonicalUser {
    CanonicalUser {
        user_id: user.id.clone(),
        email_address: user.email_address.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        display_name: user.display_name.clone(),
        username: user.username.clone(),
        company: user.company.clone(),
    }
}
