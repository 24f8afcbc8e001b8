//! Member, user profile and locker models.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AdminError, Result},
    subscriptions::models::SubscriptionRecord,
};

const MEMBER_ID_PREFIX: &str = "MEM-";
const MEMBER_ID_DIGITS: usize = 6;
const MAX_TEXT_LEN: usize = 255;

/// Minimum age, in days, accepted for a member's date of birth.
pub const MIN_AGE_DAYS: u64 = 356 * 3;

/// Public member identifier, `MEM-` followed by six digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

impl MemberId {
    /// Parses a member identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Validation`] if `id` is not `MEM-` followed by six digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use gym_admin::membership::MemberId;
    ///
    /// assert!(MemberId::new("MEM-004211").is_ok());
    /// assert!(MemberId::new("MEM-42").is_err());
    /// ```
    pub fn new<S: Into<String>>(id: S) -> Result<Self> {
        let id = id.into();
        let valid = id.strip_prefix(MEMBER_ID_PREFIX).is_some_and(|digits| {
            digits.len() == MEMBER_ID_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
        });
        if !valid {
            return Err(AdminError::validation(format!("Invalid member id '{id}'")));
        }
        Ok(Self(id))
    }

    /// Draws a random identifier. Uniqueness is checked by the store.
    #[must_use]
    pub fn generate() -> Self {
        let number: u32 = rand::thread_rng().gen_range(0..1_000_000);
        Self(format!("{MEMBER_ID_PREFIX}{number:06}"))
    }

    /// Returns the inner string reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MemberId {
    type Error = AdminError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MemberId> for String {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

/// Whether a member may use the gym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Member is active.
    Active,
    /// Member is suspended by an operator.
    Inactive,
}

impl MemberStatus {
    /// Returns the opposite status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }

    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Parses the storage representation.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Personal profile owned by a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Row identifier.
    pub id: i64,
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Artifact path of the profile picture.
    pub image: Option<String>,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
}

/// A registered gym member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Row identifier.
    pub id: i64,
    /// Public member identifier.
    pub member_id: MemberId,
    /// Linked profile.
    pub user: User,
    /// Active or inactive.
    pub status: MemberStatus,
    /// Number of the assigned locker.
    pub locker_no: Option<u32>,
    /// Subscription the member currently points at.
    pub current_subscription: Option<SubscriptionRecord>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// True if the current subscription is active and has not ended before `today`.
    #[must_use]
    pub fn has_active_subscription(&self, today: NaiveDate) -> bool {
        self.current_subscription.as_ref().is_some_and(|record| record.covers(today))
    }
}

/// A physical locker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locker {
    /// Locker number.
    pub number: u32,
    /// True when nobody holds the locker.
    pub available: bool,
    /// Member holding the locker.
    pub member_id: Option<MemberId>,
}

impl Locker {
    /// True if `member` may take this locker.
    #[must_use]
    pub fn can_be_taken_by(&self, member: &MemberId) -> bool {
        self.available || self.member_id.as_ref() == Some(member)
    }
}

/// Registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    /// Pre-generated member id shown on the create form.
    #[serde(default)]
    pub member_id: Option<String>,
    /// Full name.
    pub name: String,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Already-stored profile picture path.
    #[serde(default)]
    pub image: Option<String>,
    /// Date of birth.
    #[serde(default, rename = "dob")]
    pub date_of_birth: Option<NaiveDate>,
    /// Locker to assign right away.
    #[serde(default)]
    pub locker_no: Option<u32>,
}

impl NewMember {
    /// Validates the form against `today`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Validation`] with an operator-facing message.
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        validate_name(&self.name)?;
        validate_contact(self.email.as_deref(), self.phone.as_deref(), self.address.as_deref())?;
        validate_birth_date(self.date_of_birth, today)?;
        if let Some(raw) = &self.member_id {
            MemberId::new(raw.as_str())?;
        }
        Ok(())
    }
}

/// Partial update form; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUpdate {
    /// Full name.
    #[serde(default)]
    pub name: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Replacement profile picture path.
    #[serde(default)]
    pub image: Option<String>,
    /// Date of birth.
    #[serde(default, rename = "dob")]
    pub date_of_birth: Option<NaiveDate>,
}

impl MemberUpdate {
    /// Validates the form against `today`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Validation`] with an operator-facing message.
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        validate_contact(self.email.as_deref(), self.phone.as_deref(), self.address.as_deref())?;
        validate_birth_date(self.date_of_birth, today)
    }

    /// Applies the present fields to `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name.clone_from(name);
        }
        if self.email.is_some() {
            user.email.clone_from(&self.email);
        }
        if self.phone.is_some() {
            user.phone.clone_from(&self.phone);
        }
        if self.address.is_some() {
            user.address.clone_from(&self.address);
        }
        if self.image.is_some() {
            user.image.clone_from(&self.image);
        }
        if self.date_of_birth.is_some() {
            user.date_of_birth = self.date_of_birth;
        }
    }
}

/// Latest date of birth accepted on `today`.
#[must_use]
pub fn latest_birth_date(today: NaiveDate) -> NaiveDate {
    today.checked_sub_days(Days::new(MIN_AGE_DAYS)).unwrap_or(NaiveDate::MIN)
}

fn validate_birth_date(date_of_birth: Option<NaiveDate>, today: NaiveDate) -> Result<()> {
    let limit = latest_birth_date(today);
    match date_of_birth {
        Some(dob) if dob > limit => Err(AdminError::validation(format!(
            "The date must be a date before or equal to {}",
            limit.format("%Y-%m-%d")
        ))),
        _ => Ok(()),
    }
}

fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AdminError::validation("The name field is required."));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(AdminError::validation("The name may not be greater than 255 characters."));
    }
    Ok(())
}

fn validate_contact(email: Option<&str>, phone: Option<&str>, address: Option<&str>) -> Result<()> {
    if let Some(email) = email {
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(AdminError::validation("The email must be a valid email address."));
        }
    }
    if let Some(phone) = phone {
        let valid = !phone.is_empty()
            && phone.len() <= 32
            && phone.chars().all(|c| c.is_ascii_digit() || "+-() ".contains(c));
        if !valid {
            return Err(AdminError::validation("The phone must be a valid phone number."));
        }
    }
    if address.is_some_and(|a| a.chars().count() > MAX_TEXT_LEN) {
        return Err(AdminError::validation("The address may not be greater than 255 characters."));
    }
    Ok(())
}
