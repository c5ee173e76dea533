use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::validation;

/// Database row. Converted to [`EmployeeResponse`] before leaving the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub salary: f64,
    pub date_of_joining: NaiveDate,
    pub department: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The shape employees take on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeResponse {
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub salary: f64,
    pub date_of_joining: NaiveDate,
    pub department: String,
    /// Empty when no photo has been uploaded.
    #[serde(default)]
    pub photo_url: String,
}

impl From<Employee> for EmployeeResponse {
    fn from(emp: Employee) -> Self {
        Self {
            employee_id: emp.id,
            first_name: emp.first_name,
            last_name: emp.last_name,
            email: emp.email,
            position: emp.position,
            salary: emp.salary,
            date_of_joining: emp.date_of_joining,
            department: emp.department,
            photo_url: emp.photo_url.unwrap_or_default(),
        }
    }
}

impl EmployeeResponse {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive substring match over name, email, position and
    /// department. A blank query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.position,
            &self.department,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&q))
    }
}

/// Fields accepted when creating an employee. All are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    #[serde(deserialize_with = "de_salary")]
    pub salary: f64,
    #[serde(deserialize_with = "de_date")]
    pub date_of_joining: NaiveDate,
    pub department: String,
}

impl EmployeeInput {
    /// Trim text fields and enforce the per-field rules.
    pub fn normalized(self) -> Result<Self, AppError> {
        Ok(Self {
            first_name: validation::required("first_name", &self.first_name)?,
            last_name: validation::required("last_name", &self.last_name)?,
            email: validation::email("email", &self.email)?,
            position: validation::required("position", &self.position)?,
            salary: validation::salary(self.salary)?,
            date_of_joining: self.date_of_joining,
            department: validation::required("department", &self.department)?,
        })
    }

    /// Build from HTML form fields, where every value arrives as text.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, AppError> {
        let salary = validation::required("salary", form_text(fields, "salary"))?;
        let salary = parse_salary(&salary).map_err(AppError::validation)?;
        let joined = validation::required("date_of_joining", form_text(fields, "date_of_joining"))?;
        let date_of_joining = parse_date(&joined).map_err(AppError::validation)?;

        Self {
            first_name: form_text(fields, "first_name").to_string(),
            last_name: form_text(fields, "last_name").to_string(),
            email: form_text(fields, "email").to_string(),
            position: form_text(fields, "position").to_string(),
            salary,
            date_of_joining,
            department: form_text(fields, "department").to_string(),
        }
        .normalized()
    }
}

/// Fields accepted on update. Anything left out keeps its stored value;
/// `photo_url` is not part of the set and only changes through the upload
/// endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_salary",
        skip_serializing_if = "Option::is_none"
    )]
    pub salary: Option<f64>,
    #[serde(
        default,
        deserialize_with = "de_opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_joining: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl EmployeePatch {
    pub fn normalized(self) -> Result<Self, AppError> {
        Ok(Self {
            first_name: self
                .first_name
                .map(|v| validation::required("first_name", &v))
                .transpose()?,
            last_name: self
                .last_name
                .map(|v| validation::required("last_name", &v))
                .transpose()?,
            email: self
                .email
                .map(|v| validation::email("email", &v))
                .transpose()?,
            position: self
                .position
                .map(|v| validation::required("position", &v))
                .transpose()?,
            salary: self.salary.map(validation::salary).transpose()?,
            date_of_joining: self.date_of_joining,
            department: self
                .department
                .map(|v| validation::required("department", &v))
                .transpose()?,
        })
    }
}

impl From<EmployeeInput> for EmployeePatch {
    fn from(input: EmployeeInput) -> Self {
        Self {
            first_name: Some(input.first_name),
            last_name: Some(input.last_name),
            email: Some(input.email),
            position: Some(input.position),
            salary: Some(input.salary),
            date_of_joining: Some(input.date_of_joining),
            department: Some(input.department),
        }
    }
}

fn form_text<'a>(fields: &'a HashMap<String, String>, name: &str) -> &'a str {
    fields.get(name).map(String::as_str).unwrap_or_default()
}

pub fn parse_salary(raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("salary must be a number, got '{raw}'"))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp, keeping the date part.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| format!("date_of_joining must be a date like 2024-01-31, got '{raw}'"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_salary<E: de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(s) => parse_salary(&s).map_err(E::custom),
        }
    }
}

fn de_salary<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    NumberOrText::deserialize(deserializer)?.into_salary()
}

fn de_opt_salary<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(NumberOrText::into_salary)
        .transpose()
}

fn de_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(de::Error::custom)
}

fn de_opt_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_date(&raw).map_err(de::Error::custom))
        .transpose()
}
