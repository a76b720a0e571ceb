//! # Domain Types
//!
//! People, branches and the small value types shared by tickets, guarantees
//! and the daily report.
//!
//! ## Type Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Branch ◄──── branchId ──── PersonRecord (staff / manager)             │
//! │    ▲                              │                                     │
//! │    │                              │ salaryPercentage (staff only)       │
//! │    │                              ▼                                     │
//! │    └──── meta.branchId ──── Ticket ──── meta.staffId                   │
//! │                                                                         │
//! │  PersonRecord (admin) has no branch.                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Passwords are never part of these types. They are split off a
//! submission by [`PersonRecord::from_submission`] and stored separately.

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::branch::BranchRef;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation;

// =============================================================================
// Percentage
// =============================================================================

/// A percentage in basis points (1% = 100 bps).
///
/// ## Why Basis Points?
/// Commission rates like 12.5% are common. Storing 1250 keeps the salary
/// split in integer arithmetic, see [`Money::percentage_to_whole_major`].
///
/// ## Wire Format
/// A plain percent number (`12.5`). Numeric strings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TS)]
#[ts(export)]
pub struct Percentage(#[ts(type = "number")] u32);

impl Percentage {
    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a percentage from a whole percent value.
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        Percentage(percent * 100)
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    /// Returns basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the percent value as a float, for display only.
    pub fn as_percent_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    fn from_percent_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let bps = (value * 100.0).round();
        if bps > u32::MAX as f64 {
            return None;
        }
        Some(Percentage(bps as u32))
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}%", self.as_percent_f64())
        }
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_u32(self.0 / 100)
        } else {
            serializer.serialize_f64(self.as_percent_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PercentageVisitor)
    }
}

struct PercentageVisitor;

impl<'de> Visitor<'de> for PercentageVisitor {
    type Value = Percentage;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative percent as a number or numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Percentage, E> {
        u32::try_from(v)
            .ok()
            .and_then(|p| p.checked_mul(100))
            .map(Percentage)
            .ok_or_else(|| E::custom("percentage out of range"))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Percentage, E> {
        let v = u64::try_from(v).map_err(|_| E::custom("percentage cannot be negative"))?;
        self.visit_u64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Percentage, E> {
        Percentage::from_percent_f64(v).ok_or_else(|| E::custom("invalid percentage"))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Percentage, E> {
        Ok(Percentage::zero())
    }

    fn visit_none<E: de::Error>(self) -> Result<Percentage, E> {
        Ok(Percentage::zero())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Percentage, E> {
        v.trim()
            .parse::<f64>()
            .ok()
            .and_then(Percentage::from_percent_f64)
            .ok_or_else(|| E::custom(format!("invalid percentage: {v:?}")))
    }
}

// =============================================================================
// Role
// =============================================================================

/// Who a person record belongs to. Each role lives in its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Manager,
    Staff,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Staff];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }

    /// Capitalized name used in response messages ("Staff not found").
    pub fn title(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Staff => "Staff",
        }
    }

    /// Staff and managers are tied to a branch; admins are not.
    pub fn requires_branch(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "staff" => Ok(Role::Staff),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

// =============================================================================
// Branch
// =============================================================================

/// A physical shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Branch {
    #[serde(rename = "_id")]
    pub id: String,
    pub branch_name: String,
    pub branch_location: String,
}

/// Payload for creating a branch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBranch {
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub branch_location: String,
}

impl NewBranch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require("branchName", &self.branch_name)?;
        validation::require("branchLocation", &self.branch_location)?;
        Ok(())
    }

    pub fn into_branch(self, id: String) -> Branch {
        Branch {
            id,
            branch_name: self.branch_name.trim().to_string(),
            branch_location: self.branch_location.trim().to_string(),
        }
    }
}

// =============================================================================
// Customer / Device
// =============================================================================

/// Walk-in customer details carried by tickets and guarantees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// The handset or device brought in for repair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Device {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model_no: String,
}

impl Customer {
    pub(crate) fn trimmed(self) -> Self {
        Customer {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}

impl Device {
    pub(crate) fn trimmed(self) -> Self {
        Device {
            brand: self.brand.trim().to_string(),
            model_no: self.model_no.trim().to_string(),
        }
    }
}

// =============================================================================
// People
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmergencyContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// An admin, manager or staff member.
///
/// ## Role-specific Fields
/// ```text
/// ┌──────────┬─────────────┬──────────┬──────────────────┬────────────────────┐
/// │ Role     │ branchName  │ branchId │ salaryPercentage │ managerDailySalary │
/// ├──────────┼─────────────┼──────────┼──────────────────┼────────────────────┤
/// │ staff    │ required    │ required │ required (0-100) │ -                  │
/// │ manager  │ required    │ required │ -                │ required           │
/// │ admin    │ -           │ -        │ -                │ -                  │
/// └──────────┴─────────────┴──────────┴──────────────────┴────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PersonRecord {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<BranchRef>,
    /// Commission share of daily earnings (staff).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_percentage: Option<Percentage>,
    /// Fixed daily pay (managers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_daily_salary: Option<Money>,
    #[serde(default)]
    pub safety_advance: Money,
    #[serde(default)]
    pub investment_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nid_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub join_date: Option<DateTime<Utc>>,
}

impl PersonRecord {
    /// Splits a submitted person document into the record and its password.
    ///
    /// The role is read from the submission; an unknown role is
    /// [`CoreError::InvalidRole`]. The email is lower-cased.
    pub fn from_submission(mut body: Map<String, Value>) -> CoreResult<(PersonRecord, String)> {
        let role = match body.get("role").and_then(Value::as_str) {
            Some(raw) => raw.parse::<Role>()?,
            None => return Err(CoreError::InvalidRole(String::new())),
        };

        let password = match body.remove("password") {
            Some(Value::String(p)) => p,
            _ => String::new(),
        };
        body.remove("_id");

        let mut record: PersonRecord = serde_json::from_value(Value::Object(body))
            .map_err(|e| CoreError::InvalidUpdate(e.to_string()))?;
        record.role = role;
        record.email = validation::normalize_email(&record.email);

        validation::require("password", &password)?;
        record.validate()?;
        Ok((record, password))
    }

    /// Checks the fields every record needs plus the role-specific ones.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require("name", &self.name)?;
        validation::require("phone", &self.phone)?;
        validation::validate_email(&self.email)?;

        if self.role.requires_branch() {
            validation::require("branchName", self.branch_name.as_deref().unwrap_or(""))?;
            match &self.branch_id {
                Some(b) if !b.is_blank() => {}
                _ => return Err(ValidationError::required("branchId")),
            }
        }

        match self.role {
            Role::Staff => match self.salary_percentage {
                Some(p) => validation::validate_percentage("salaryPercentage", p)?,
                None => return Err(ValidationError::required("salaryPercentage")),
            },
            Role::Manager => {
                if self.manager_daily_salary.is_none() {
                    return Err(ValidationError::required("managerDailySalary"));
                }
            }
            Role::Admin => {}
        }
        Ok(())
    }

    /// Commission share used by the daily report; 0 when unset.
    pub fn commission(&self) -> Percentage {
        self.salary_percentage.unwrap_or_default()
    }
}

/// The subset of a person returned by a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub role: Role,
    pub branch_name: Option<String>,
    pub branch_id: Option<BranchRef>,
}

impl From<PersonRecord> for LoginUser {
    fn from(p: PersonRecord) -> Self {
        LoginUser {
            id: p.id,
            name: p.name,
            phone: p.phone,
            email: p.email,
            role: p.role,
            branch_name: p.branch_name,
            branch_id: p.branch_id,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
