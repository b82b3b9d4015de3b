//! User model for storage and API.

use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// User profile stored in Firestore (document ID is the openid).
///
/// Also returned as-is by the profile endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Internal user ID (UUID)
    pub id: String,
    /// WeChat openid; unique and immutable
    pub openid: String,
    /// WeChat unionid, when the app is bound to an open platform account
    pub unionid: Option<String>,
    pub nick_name: Option<String>,
    pub avatar_url: Option<String>,
    /// 0 unknown, 1 male, 2 female
    pub gender: Option<i32>,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub language: Option<String>,
    /// When the user first logged in (RFC3339)
    pub created_at: String,
    /// Last profile change (RFC3339)
    pub updated_at: Option<String>,
}

impl User {
    /// Build a new user for a first login.
    pub fn new(
        openid: String,
        unionid: Option<String>,
        profile: Option<&ProfileUpdate>,
        now: &str,
    ) -> Self {
        let mut user = Self {
            id: uuid::Uuid::new_v4().to_string(),
            openid,
            unionid,
            nick_name: None,
            avatar_url: None,
            gender: None,
            country: None,
            province: None,
            city: None,
            language: None,
            created_at: now.to_string(),
            updated_at: None,
        };
        if let Some(profile) = profile {
            profile.apply_to(&mut user);
        }
        user
    }
}

/// Partial profile update.
///
/// Each field is `None` when absent from the request, `Some(None)` when the
/// request explicitly sent `null`, and `Some(Some(v))` when it sent a value.
/// Only present fields are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 100))]
    pub nick_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 500))]
    pub avatar_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(range(min = 0, max = 2))]
    pub gender: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 50))]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 50))]
    pub province: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 50))]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 20))]
    pub language: Option<Option<String>>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ProfileUpdate {
    /// Apply the present fields to `user`. Returns `true` if any field was present.
    pub fn apply_to(&self, user: &mut User) -> bool {
        let mut touched = false;
        let mut set = |slot: &mut Option<String>, value: &Option<Option<String>>| {
            if let Some(v) = value {
                *slot = v.clone();
                touched = true;
            }
        };
        set(&mut user.nick_name, &self.nick_name);
        set(&mut user.avatar_url, &self.avatar_url);
        set(&mut user.country, &self.country);
        set(&mut user.province, &self.province);
        set(&mut user.city, &self.city);
        set(&mut user.language, &self.language);

        if let Some(gender) = self.gender {
            user.gender = gender;
            touched = true;
        }
        touched
    }

    /// Stored field names this update writes, for partial (field-masked) writes.
    pub fn present_fields(&self) -> Vec<&'static str> {
        [
            ("nick_name", self.nick_name.is_some()),
            ("avatar_url", self.avatar_url.is_some()),
            ("gender", self.gender.is_some()),
            ("country", self.country.is_some()),
            ("province", self.province.is_some()),
            ("city", self.city.is_some()),
            ("language", self.language.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nick_name.is_none()
            && self.avatar_url.is_none()
            && self.gender.is_none()
            && self.country.is_none()
            && self.province.is_none()
            && self.city.is_none()
            && self.language.is_none()
    }
}
