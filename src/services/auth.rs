use std::future::{Ready, ready};
use std::sync::LazyLock;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{
    AuthResponse, ChangePasswordInput, Employee, EmployeeProfileInput, EmployeeWithUser,
    LoginInput, RegisterInput, User, UserProfile, UserRole, normalize_email,
};
use crate::database::repositories::{EmployeeRepository, UserRepository};
use crate::error::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub email: String,
    pub role: UserRole,
    pub employee_id: Option<Uuid>,
    pub exp: usize, // expiration time
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        let (Some(token), Some(config)) = (token, req.app_data::<Data<Config>>()) else {
            return ready(Err(AppError::Unauthorized));
        };

        ready(decode_token(token, &config.jwt_secret))
    }
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        log::debug!("Rejected bearer token: {}", e);
        AppError::Unauthorized
    })
}

pub fn validate_email(email: &str) -> Result<String, AppError> {
    let email = normalize_email(email);
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::validation("email", "Invalid email address"));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::validation(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AuthService {
    user_repository: UserRepository,
    employee_repository: EmployeeRepository,
    config: Config,
}

impl AuthService {
    pub fn new(
        config: Config,
        user_repository: UserRepository,
        employee_repository: EmployeeRepository,
    ) -> Self {
        Self {
            user_repository,
            employee_repository,
            config,
        }
    }

    /// Self-registration creates EMPLOYEE accounts; other roles need an admin caller.
    pub async fn register(
        &self,
        request: RegisterInput,
        caller_is_admin: bool,
    ) -> Result<AuthResponse, AppError> {
        let role = request.role.unwrap_or_default();
        if role != UserRole::Employee && !caller_is_admin {
            return Err(AppError::Forbidden(
                "Only administrators can create HR or ADMIN accounts".to_string(),
            ));
        }

        let profile = EmployeeProfileInput {
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            address: None,
            position: request.position.unwrap_or_else(|| "Employee".to_string()),
            department: request.department.unwrap_or_else(|| "General".to_string()),
            salary: None,
            hire_date: None,
            birth_date: None,
        };

        let created = self
            .create_account(&request.email, &request.password, role, profile)
            .await?;

        let user = self
            .user_repository
            .find_by_id(created.employee.user_id)
            .await?
            .ok_or_else(|| AppError::internal_server_error_message("Registered user missing"))?;

        let token = self.generate_token(&user, Some(created.employee.id))?;

        Ok(AuthResponse {
            token,
            user: UserProfile::new(user, Some(created.employee)),
        })
    }

    /// Creates a user and its employee profile after validating credentials.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
        profile: EmployeeProfileInput,
    ) -> Result<EmployeeWithUser, AppError> {
        let email = validate_email(email)?;
        validate_password(password)?;
        if profile.first_name.trim().is_empty() {
            return Err(AppError::validation("firstName", "First name is required"));
        }
        if profile.last_name.trim().is_empty() {
            return Err(AppError::validation("lastName", "Last name is required"));
        }

        if self.user_repository.email_exists(&email).await? {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                email
            )));
        }

        let password_hash = self.hash_password(password)?;
        let user = User::new(email, password_hash, role);
        let employee = Employee::new(user.id, profile);

        self.employee_repository
            .create_with_user(user, employee)
            .await
    }

    pub async fn login(&self, request: LoginInput) -> Result<AuthResponse, AppError> {
        let email = validate_email(&request.email)?;

        let user = self
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let matches = verify(&request.password, &user.password_hash).map_err(|e| {
            log::error!("Failed to verify password hash for {}: {}", user.id, e);
            AppError::internal_server_error_message("Password verification failed")
        })?;
        if !matches {
            log::warn!("Failed login attempt for {}", email);
            return Err(AppError::Unauthorized);
        }

        let employee = self.employee_repository.find_by_user_id(user.id).await?;
        if employee.as_ref().is_some_and(|e| !e.is_active) {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        let token = self.generate_token(&user, employee.as_ref().map(|e| e.id))?;
        log::info!("User {} logged in", user.id);

        Ok(AuthResponse {
            token,
            user: UserProfile::new(user, employee),
        })
    }

    pub async fn change_password(
        &self,
        user: &User,
        request: ChangePasswordInput,
    ) -> Result<(), AppError> {
        validate_password(&request.new_password)?;

        let matches = verify(&request.current_password, &user.password_hash).map_err(|e| {
            log::error!("Failed to verify password hash for {}: {}", user.id, e);
            AppError::internal_server_error_message("Password verification failed")
        })?;
        if !matches {
            return Err(AppError::Unauthorized);
        }

        let password_hash = self.hash_password(&request.new_password)?;
        self.user_repository
            .update_password(user.id, &password_hash)
            .await?;

        log::info!("User {} changed password", user.id);
        Ok(())
    }

    /// Creates the configured bootstrap administrator when it does not exist yet.
    pub async fn ensure_bootstrap_admin(&self) -> Result<Option<EmployeeWithUser>, AppError> {
        let (Some(email), Some(password)) = (
            self.config.bootstrap_admin_email.as_deref(),
            self.config.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(None);
        };

        if self.user_repository.email_exists(email).await? {
            return Ok(None);
        }

        let profile = EmployeeProfileInput {
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            phone: None,
            address: None,
            position: "Administrator".to_string(),
            department: "Administration".to_string(),
            salary: None,
            hire_date: None,
            birth_date: None,
        };

        let created = self
            .create_account(email, password, UserRole::Admin, profile)
            .await?;
        log::info!("Bootstrap administrator {} created", created.email);

        Ok(Some(created))
    }

    pub fn generate_token(&self, user: &User, employee_id: Option<Uuid>) -> Result<String, AppError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::days(self.config.jwt_expiration_days))
            .ok_or_else(|| AppError::internal_server_error_message("Invalid token expiry"))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            employee_id,
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )
        .map_err(|e| {
            log::error!("Failed to sign token for {}: {}", user.id, e);
            AppError::internal_server_error_message("Failed to sign token")
        })
    }

    fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.config.bcrypt_cost).map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AppError::internal_server_error_message("Failed to hash password")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert_eq!(validate_email(" Jane@Example.com ").unwrap(), "jane@example.com");
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn token_round_trip() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@b.co".into(),
            role: UserRole::Hr,
            employee_id: None,
            exp: (now + Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let decoded = decode_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.role, UserRole::Hr);
        assert!(matches!(decode_token(&token, "other"), Err(AppError::Unauthorized)));
    }
}
