use std::marker::PhantomData;
use std::ops::Deref;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use crate::database::models::{Employee, User, UserRole};
use crate::database::repositories::{EmployeeRepository, UserRepository};
use crate::error::AppError;
use crate::services::auth::Claims;

/// The authenticated principal, loaded fresh from storage on every request.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user: User,
    pub employee: Option<Employee>,
}

impl UserContext {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    pub fn is_staff(&self) -> bool {
        self.user.role.is_staff()
    }

    pub fn employee_id(&self) -> Option<Uuid> {
        self.employee.as_ref().map(|e| e.id)
    }

    /// The employee profile linked to this user.
    pub fn require_employee(&self) -> Result<&Employee, AppError> {
        self.employee
            .as_ref()
            .ok_or_else(|| AppError::Forbidden("No employee profile linked to this account".to_string()))
    }

    /// Owners may read their own records; ADMIN and HR may read anyone's.
    pub fn can_access_employee(&self, employee_id: Uuid) -> bool {
        self.is_staff() || self.employee_id() == Some(employee_id)
    }

    pub fn require_access_to(&self, employee_id: Uuid) -> Result<(), AppError> {
        if self.can_access_employee(employee_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have access to this employee's records".to_string(),
            ))
        }
    }
}

impl FromRequest for UserContext {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let claims = Claims::from_request(req, payload).into_inner();
        let user_repository = req.app_data::<Data<UserRepository>>().cloned();
        let employee_repository = req.app_data::<Data<EmployeeRepository>>().cloned();

        Box::pin(async move {
            let claims = claims?;
            let (Some(user_repository), Some(employee_repository)) =
                (user_repository, employee_repository)
            else {
                log::error!("User or employee repository missing from app data");
                return Err(AppError::internal_server_error_message(
                    "Required repositories not found in app data",
                ));
            };

            let user = user_repository
                .find_by_id(claims.sub)
                .await?
                .ok_or(AppError::Unauthorized)?;

            let employee = employee_repository.find_by_user_id(user.id).await?;
            if employee.as_ref().is_some_and(|e| !e.is_active) {
                return Err(AppError::Forbidden("Account is deactivated".to_string()));
            }

            Ok(UserContext { user, employee })
        })
    }
}

/// A set of roles a handler accepts.
pub trait RoleSet {
    const ROLES: &'static [UserRole];

    fn allows(role: UserRole) -> bool {
        Self::ROLES.contains(&role)
    }
}

/// ADMIN and HR.
pub struct Staff;

impl RoleSet for Staff {
    const ROLES: &'static [UserRole] = &[UserRole::Admin, UserRole::Hr];
}

/// Any authenticated role.
pub struct AnyRole;

impl RoleSet for AnyRole {
    const ROLES: &'static [UserRole] = &[UserRole::Admin, UserRole::Hr, UserRole::Employee];
}

/// A `UserContext` whose role has already been checked against `R`.
pub struct Authorized<R: RoleSet> {
    context: UserContext,
    _roles: PhantomData<R>,
}

impl<R: RoleSet> Authorized<R> {
    pub fn into_inner(self) -> UserContext {
        self.context
    }
}

impl<R: RoleSet> Deref for Authorized<R> {
    type Target = UserContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl<R: RoleSet + 'static> FromRequest for Authorized<R> {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let context = UserContext::from_request(req, payload);

        Box::pin(async move {
            let context = context.await?;
            if !R::allows(context.role()) {
                return Err(AppError::Forbidden(format!(
                    "Role {} is not allowed to perform this action",
                    context.role()
                )));
            }

            Ok(Authorized {
                context,
                _roles: PhantomData,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn context(role: UserRole, employee_id: Option<Uuid>) -> UserContext {
        let user = User::new("someone@example.com".into(), "hash".into(), role);
        let employee = employee_id.map(|id| {
            let now = Utc::now();
            Employee {
                id,
                user_id: user.id,
                first_name: "Some".into(),
                last_name: "One".into(),
                phone: None,
                address: None,
                position: "Clerk".into(),
                department: "General".into(),
                salary: None,
                hire_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                birth_date: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            }
        });
        UserContext { user, employee }
    }

    #[test]
    fn role_sets() {
        assert!(Staff::allows(UserRole::Admin));
        assert!(Staff::allows(UserRole::Hr));
        assert!(!Staff::allows(UserRole::Employee));
        assert!(AnyRole::allows(UserRole::Employee));
    }

    #[test]
    fn owner_or_staff_access() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();

        let employee = context(UserRole::Employee, Some(own));
        assert!(employee.can_access_employee(own));
        assert!(!employee.can_access_employee(other));
        assert!(matches!(employee.require_access_to(other), Err(AppError::Forbidden(_))));

        let hr = context(UserRole::Hr, None);
        assert!(hr.can_access_employee(other));
        assert!(hr.require_employee().is_err());
    }
}
