//! User management types
//!
//! Wire records exchanged with the admin API and the in-memory user list.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::{FieldError, ValidationError};

/// A back-office user row as served by `GET /user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique login name, also the row key
    pub user_name: String,
    pub is_admin: bool,
    /// Read-only in the back office
    #[serde(default)]
    pub total_bookings: u32,
    /// Remaining bookable appointments
    #[serde(default)]
    pub coupons: u32,
}

impl User {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            is_admin: false,
            total_bookings: 0,
            coupons: 0,
        }
    }

    pub fn admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn bookings(mut self, total_bookings: u32) -> Self {
        self.total_bookings = total_bookings;
        self
    }

    pub fn coupons(mut self, coupons: u32) -> Self {
        self.coupons = coupons;
        self
    }

    /// Copy of this user with the admin flag flipped and nothing else changed
    pub fn with_admin_toggled(&self) -> Self {
        Self {
            is_admin: !self.is_admin,
            ..self.clone()
        }
    }

    /// Merge a single field update into this record
    pub fn apply(&mut self, field: UserField) {
        match field {
            UserField::Coupons(coupons) => self.coupons = coupons,
            UserField::IsAdmin(is_admin) => self.is_admin = is_admin,
        }
    }
}

/// Name-keyed user list, rebuilt wholesale on every successful fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserList {
    users: BTreeMap<String, User>,
}

impl UserList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the list from fetched records. Duplicate names collapse to the
    /// last record.
    pub fn from_records(records: impl IntoIterator<Item = User>) -> Self {
        let users = records
            .into_iter()
            .map(|user| (user.user_name.clone(), user))
            .collect();
        Self { users }
    }

    pub fn get(&self, user_name: &str) -> Option<&User> {
        self.users.get(user_name)
    }

    pub fn contains(&self, user_name: &str) -> bool {
        self.users.contains_key(user_name)
    }

    /// Overwrite the row stored under `key`. Rows that no longer exist are
    /// left absent.
    pub fn replace(&mut self, key: &str, user: User) -> bool {
        match self.users.get_mut(key) {
            Some(slot) => {
                *slot = user;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Rows in name order
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn to_vec(&self) -> Vec<User> {
        self.users.values().cloned().collect()
    }
}

/// A typed edit to one editable cell of a user row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Coupons(u32),
    IsAdmin(bool),
}

impl UserField {
    pub const COUPONS: &'static str = "coupons";
    pub const IS_ADMIN: &'static str = "is_admin";

    /// Parse an input element's `(id, value)` pair
    pub fn parse(field_id: &str, value: &str) -> Result<Self, FieldError> {
        match field_id {
            Self::COUPONS => value
                .trim()
                .parse::<u32>()
                .map(UserField::Coupons)
                .map_err(|_| FieldError::InvalidValue {
                    field: Self::COUPONS,
                    value: value.to_string(),
                }),
            Self::IS_ADMIN => match value.trim() {
                "true" | "on" | "1" => Ok(UserField::IsAdmin(true)),
                "false" | "off" | "0" => Ok(UserField::IsAdmin(false)),
                _ => Err(FieldError::InvalidValue {
                    field: Self::IS_ADMIN,
                    value: value.to_string(),
                }),
            },
            "user_name" | "total_bookings" => Err(FieldError::ReadOnly(field_id.to_string())),
            other => Err(FieldError::UnknownField(other.to_string())),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            UserField::Coupons(_) => Self::COUPONS,
            UserField::IsAdmin(_) => Self::IS_ADMIN,
        }
    }
}

/// Body of `PUT /user`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub new_user_name: String,
    pub new_user_password: String,
    pub new_user_password_confirm: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        Self {
            new_user_name: name.into(),
            new_user_password_confirm: password.clone(),
            new_user_password: password,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.new_user_name.trim().is_empty() {
            return Err(ValidationError::EmptyUserName);
        }
        if self.new_user_password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        if self.new_user_password != self.new_user_password_confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

const MINUTES_PER_DAY: u64 = 24 * 60;

/// Body of `PUT /appointments`: one day of evenly spaced time slots, each
/// holding the same number of bookable appointments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentBatch {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub start_hour: u32,
    pub start_min: u32,
    pub num_slots: u32,
    pub num_appointment_per_slot: u32,
    pub slot_duration_min: u32,
}

impl AppointmentBatch {
    pub const DEFAULT_START_HOUR: u32 = 8;
    pub const DEFAULT_START_MIN: u32 = 30;
    pub const DEFAULT_NUM_SLOTS: u32 = 13;
    pub const DEFAULT_APPOINTMENTS_PER_SLOT: u32 = 8;
    pub const DEFAULT_SLOT_DURATION_MIN: u32 = 30;

    /// Batch with the standard day layout for `date`
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
            year: date.year(),
            start_hour: Self::DEFAULT_START_HOUR,
            start_min: Self::DEFAULT_START_MIN,
            num_slots: Self::DEFAULT_NUM_SLOTS,
            num_appointment_per_slot: Self::DEFAULT_APPOINTMENTS_PER_SLOT,
            slot_duration_min: Self::DEFAULT_SLOT_DURATION_MIN,
        }
    }

    pub fn date(&self) -> Result<NaiveDate, ValidationError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or(
            ValidationError::InvalidDate {
                year: self.year,
                month: self.month,
                day: self.day,
            },
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.first_slot()?;
        if self.num_slots == 0 {
            return Err(ValidationError::ZeroCount("num_slots"));
        }
        if self.num_appointment_per_slot == 0 {
            return Err(ValidationError::ZeroCount("num_appointment_per_slot"));
        }
        if self.slot_duration_min == 0 {
            return Err(ValidationError::ZeroCount("slot_duration_min"));
        }
        self.last_slot_minute()?;
        Ok(())
    }

    /// Start time of every slot the server will create
    pub fn slot_starts(&self) -> Result<Vec<NaiveDateTime>, ValidationError> {
        self.validate()?;
        let first = self.first_slot()?;
        (0..self.num_slots)
            .map(|i| {
                let offset = chrono::Duration::minutes(
                    i64::from(i) * i64::from(self.slot_duration_min),
                );
                first
                    .checked_add_signed(offset)
                    .ok_or_else(|| self.exceeds_day())
            })
            .collect()
    }

    pub fn total_appointments(&self) -> u32 {
        self.num_slots.saturating_mul(self.num_appointment_per_slot)
    }

    /// Minute of the day the last slot starts at; every slot must start
    /// before midnight of the batch date
    fn last_slot_minute(&self) -> Result<u64, ValidationError> {
        let start = u64::from(self.start_hour) * 60 + u64::from(self.start_min);
        u64::from(self.num_slots.saturating_sub(1))
            .checked_mul(u64::from(self.slot_duration_min))
            .and_then(|span| span.checked_add(start))
            .filter(|minute| *minute < MINUTES_PER_DAY)
            .ok_or_else(|| self.exceeds_day())
    }

    fn exceeds_day(&self) -> ValidationError {
        ValidationError::SlotsExceedDay {
            num_slots: self.num_slots,
            slot_duration_min: self.slot_duration_min,
        }
    }

    fn first_slot(&self) -> Result<NaiveDateTime, ValidationError> {
        let date = self.date()?;
        let time = NaiveTime::from_hms_opt(self.start_hour, self.start_min, 0).ok_or(
            ValidationError::InvalidStartTime {
                hour: self.start_hour,
                minute: self.start_min,
            },
        )?;
        Ok(NaiveDateTime::new(date, time))
    }
}

impl Default for AppointmentBatch {
    fn default() -> Self {
        Self::for_date(chrono::Local::now().date_naive())
    }
}
