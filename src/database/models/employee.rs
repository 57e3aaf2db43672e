use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Attendance, LeaveRequest, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub position: String,
    pub department: String,
    pub salary: Option<f64>,
    pub hire_date: NaiveDate,
    pub birth_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// New active profile for `user_id`; hire date defaults to today.
    pub fn new(user_id: Uuid, profile: EmployeeProfileInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            first_name: profile.first_name.trim().to_string(),
            last_name: profile.last_name.trim().to_string(),
            phone: profile.phone,
            address: profile.address,
            position: profile.position,
            department: profile.department,
            salary: profile.salary,
            hire_date: profile.hire_date.unwrap_or_else(|| now.date_naive()),
            birth_date: profile.birth_date,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Employee joined with the identity fields of its user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub employee: Employee,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetail {
    #[serde(flatten)]
    pub employee: EmployeeWithUser,
    pub recent_attendances: Vec<Attendance>,
    pub recent_leave_requests: Vec<LeaveRequest>,
}

/// Profile fields used when an employee is created together with its user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfileInput {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub position: String,
    pub department: String,
    pub salary: Option<f64>,
    pub hire_date: Option<NaiveDate>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeInput {
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
    #[serde(flatten)]
    pub profile: EmployeeProfileInput,
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeInput {
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub salary: Option<f64>,
    pub birth_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl UpdateEmployeeInput {
    pub fn apply_to(self, employee: &mut Employee) {
        if let Some(first_name) = self.first_name {
            employee.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            employee.last_name = last_name;
        }
        if self.phone.is_some() {
            employee.phone = self.phone;
        }
        if self.address.is_some() {
            employee.address = self.address;
        }
        if let Some(position) = self.position {
            employee.position = position;
        }
        if let Some(department) = self.department {
            employee.department = department;
        }
        if self.salary.is_some() {
            employee.salary = self.salary;
        }
        if self.birth_date.is_some() {
            employee.birth_date = self.birth_date;
        }
        if let Some(is_active) = self.is_active {
            employee.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFilter {
    pub search: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}
