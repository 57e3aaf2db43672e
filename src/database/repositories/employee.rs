use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::database::{
    models::{
        Employee, EmployeeFilter, EmployeeWithUser, Page, Paginated, UpdateEmployeeInput, User,
        normalize_email,
    },
    repositories::user::insert_user,
    transaction::DatabaseTransaction,
};
use crate::error::AppError;

const EMPLOYEE_COLUMNS: &str = r#"
    e.id,
    e.user_id,
    e.first_name,
    e.last_name,
    e.phone,
    e.address,
    e.position,
    e.department,
    e.salary,
    e.hire_date,
    e.birth_date,
    e.is_active,
    e.created_at,
    e.updated_at
"#;

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the user and its employee profile atomically.
    pub async fn create_with_user(
        &self,
        user: User,
        employee: Employee,
    ) -> Result<EmployeeWithUser, AppError> {
        let created = DatabaseTransaction::run(&self.pool, move |conn| {
            Box::pin(async move {
                insert_user(&mut *conn, &user).await?;
                let employee = insert_employee(&mut *conn, &employee).await?;

                Ok(EmployeeWithUser {
                    employee,
                    email: user.email,
                    role: user.role,
                })
            })
        })
        .await?;

        log::info!(
            "Created employee {} ({}) for {}",
            created.employee.id,
            created.employee.full_name(),
            created.email
        );

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE e.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE e.user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn find_with_user(&self, id: Uuid) -> Result<Option<EmployeeWithUser>, AppError> {
        let employee = sqlx::query_as::<_, EmployeeWithUser>(&format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS}, u.email, u.role
            FROM employees e
            JOIN users u ON u.id = e.user_id
            WHERE e.id = ?
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Filtered listing, most recently created first.
    pub async fn list(
        &self,
        filter: &EmployeeFilter,
        page: Page,
    ) -> Result<Paginated<EmployeeWithUser>, AppError> {
        let mut count_query = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM employees e JOIN users u ON u.id = e.user_id",
        );
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select_query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {EMPLOYEE_COLUMNS}, u.email, u.role FROM employees e JOIN users u ON u.id = e.user_id"
        ));
        push_filters(&mut select_query, filter);
        select_query
            .push(" ORDER BY e.created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select_query
            .build_query_as::<EmployeeWithUser>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated::new(items, total, page))
    }

    /// Partial update of the profile and of the linked user's email and role.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateEmployeeInput,
    ) -> Result<EmployeeWithUser, AppError> {
        DatabaseTransaction::run(&self.pool, move |conn| {
            Box::pin(async move {
                let mut employee = sqlx::query_as::<_, Employee>(&format!(
                    "SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE e.id = ?"
                ))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

                let now = Utc::now();

                if let Some(email) = input.email.as_deref() {
                    let email = normalize_email(email);
                    let taken: i64 =
                        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
                            .bind(&email)
                            .bind(employee.user_id)
                            .fetch_one(&mut *conn)
                            .await?;
                    if taken > 0 {
                        return Err(AppError::Conflict(format!(
                            "Email {} is already registered",
                            email
                        )));
                    }

                    sqlx::query("UPDATE users SET email = ?, updated_at = ? WHERE id = ?")
                        .bind(&email)
                        .bind(now)
                        .bind(employee.user_id)
                        .execute(&mut *conn)
                        .await?;
                }

                if let Some(role) = input.role {
                    sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
                        .bind(role)
                        .bind(now)
                        .bind(employee.user_id)
                        .execute(&mut *conn)
                        .await?;
                }

                input.apply_to(&mut employee);
                employee.updated_at = now;

                sqlx::query(
                    r#"
                    UPDATE employees
                    SET
                        first_name = ?,
                        last_name = ?,
                        phone = ?,
                        address = ?,
                        position = ?,
                        department = ?,
                        salary = ?,
                        birth_date = ?,
                        is_active = ?,
                        updated_at = ?
                    WHERE
                        id = ?
                    "#,
                )
                .bind(&employee.first_name)
                .bind(&employee.last_name)
                .bind(&employee.phone)
                .bind(&employee.address)
                .bind(&employee.position)
                .bind(&employee.department)
                .bind(employee.salary)
                .bind(employee.birth_date)
                .bind(employee.is_active)
                .bind(employee.updated_at)
                .bind(employee.id)
                .execute(&mut *conn)
                .await?;

                let updated = sqlx::query_as::<_, EmployeeWithUser>(&format!(
                    r#"
                    SELECT {EMPLOYEE_COLUMNS}, u.email, u.role
                    FROM employees e
                    JOIN users u ON u.id = e.user_id
                    WHERE e.id = ?
                    "#
                ))
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;

                Ok(updated)
            })
        })
        .await
    }

    /// Removes the employee by deleting its user; dependent rows cascade.
    pub async fn delete(&self, id: Uuid) -> Result<Employee, AppError> {
        let employee = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(employee.user_id)
            .execute(&self.pool)
            .await?;

        log::info!("Deleted employee {} and user {}", employee.id, employee.user_id);

        Ok(employee)
    }
}

async fn insert_employee(
    conn: &mut SqliteConnection,
    employee: &Employee,
) -> Result<Employee, AppError> {
    let employee = sqlx::query_as::<_, Employee>(
        r#"
        INSERT INTO
            employees (
                id,
                user_id,
                first_name,
                last_name,
                phone,
                address,
                position,
                department,
                salary,
                hire_date,
                birth_date,
                is_active,
                created_at,
                updated_at
            )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING
            id,
            user_id,
            first_name,
            last_name,
            phone,
            address,
            position,
            department,
            salary,
            hire_date,
            birth_date,
            is_active,
            created_at,
            updated_at
        "#,
    )
    .bind(employee.id)
    .bind(employee.user_id)
    .bind(&employee.first_name)
    .bind(&employee.last_name)
    .bind(&employee.phone)
    .bind(&employee.address)
    .bind(&employee.position)
    .bind(&employee.department)
    .bind(employee.salary)
    .bind(employee.hire_date)
    .bind(employee.birth_date)
    .bind(employee.is_active)
    .bind(employee.created_at)
    .bind(employee.updated_at)
    .fetch_one(conn)
    .await?;

    Ok(employee)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &EmployeeFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        builder
            .push(" AND (LOWER(e.first_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(e.last_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(e.position) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(department) = filter.department.as_deref().filter(|d| !d.is_empty()) {
        builder.push(" AND e.department = ").push_bind(department.to_string());
    }
    if let Some(is_active) = filter.is_active {
        builder.push(" AND e.is_active = ").push_bind(is_active);
    }
}
