#![allow(dead_code)]

use anyhow::Result;
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use hrdesk::config::Config;
use hrdesk::database::init_database;
use hrdesk::database::models::{EmployeeProfileInput, EmployeeWithUser, UserRole};
use hrdesk::AppState;

pub const TEST_PASSWORD: &str = "password123";

/// Isolated database plus the fully wired application state.
pub struct TestContext {
    pub pool: SqlitePool,
    pub config: Config,
    pub state: AppState,
    _temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());
        let config = Config::test_config(&database_url);

        let pool = init_database(&database_url).await?;
        let state = AppState::new(pool.clone(), config.clone());

        Ok(TestContext {
            pool,
            config,
            state,
            _temp_dir: temp_dir,
        })
    }

    /// Creates a user and its employee profile with generated names.
    pub async fn create_employee(&self, role: UserRole, department: &str) -> EmployeeWithUser {
        let email = format!("{}-{}@example.com", role.as_str().to_lowercase(), Uuid::new_v4());
        let profile = EmployeeProfileInput {
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            phone: None,
            address: None,
            position: "Engineer".to_string(),
            department: department.to_string(),
            salary: None,
            hire_date: None,
            birth_date: None,
        };

        self.state
            .auth_service
            .create_account(&email, TEST_PASSWORD, role, profile)
            .await
            .expect("Failed to create test employee")
    }

    pub async fn token_for(&self, account: &EmployeeWithUser) -> String {
        let user = self
            .state
            .user_repository
            .find_by_id(account.employee.user_id)
            .await
            .expect("Failed to load user")
            .expect("User should exist");

        self.state
            .auth_service
            .generate_token(&user, Some(account.employee.id))
            .expect("Failed to generate token")
    }

    pub async fn record_count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count records")
    }
}

/// Initialises the full API, wired the same way as the binary.
macro_rules! test_app {
    ($ctx:expr) => {{
        let state = $ctx.state.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(move |cfg| state.configure(cfg))
                .wrap(hrdesk::middleware::RequestIdMiddleware)
                .configure(hrdesk::routes::configure),
        )
        .await
    }};
}
#[allow(unused_imports)]
pub(crate) use test_app;

pub fn auth_header(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn setup_test_env() {
    let _ = env_logger::builder().is_test(true).try_init();
}
