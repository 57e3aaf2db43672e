use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use hrdesk::database::models::{
    AttendanceFilter, AttendanceStatus, DayInput, ManualAttendanceInput, PaginationQuery, UserRole,
    WorkHoursPolicy,
};
use hrdesk::database::repositories::AttendanceRepository;
use hrdesk::error::AppError;

mod common;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn manual(employee_id: Uuid, date: NaiveDate) -> ManualAttendanceInput {
    ManualAttendanceInput {
        employee_id,
        date: DayInput::Date(date),
        check_in: None,
        check_out: None,
        status: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_check_in_then_check_out_computes_whole_hours() {
    common::setup_test_env();
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let repo = &ctx.state.attendance_repository;

    let opened = repo
        .check_in(employee.employee.id, at(2024, 3, 4, 8, 15))
        .await
        .unwrap();
    assert_eq!(opened.date, day(2024, 3, 4));
    assert_eq!(opened.status, AttendanceStatus::Present);
    assert_eq!(opened.check_out, None);
    assert_eq!(opened.work_hours, None);

    let closed = repo
        .check_out(employee.employee.id, at(2024, 3, 4, 17, 15))
        .await
        .unwrap();
    assert_eq!(closed.id, opened.id);
    assert_eq!(closed.work_hours, Some(9.0));
    assert_eq!(closed.status, AttendanceStatus::Present);
    assert_eq!(closed.check_out, Some(at(2024, 3, 4, 17, 15)));
}

#[tokio::test]
async fn test_check_out_truncates_partial_hours() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let repo = &ctx.state.attendance_repository;

    repo.check_in(employee.employee.id, at(2024, 3, 5, 8, 15))
        .await
        .unwrap();
    let closed = repo
        .check_out(employee.employee.id, at(2024, 3, 5, 17, 14))
        .await
        .unwrap();

    assert_eq!(closed.work_hours, Some(8.0));
}

#[tokio::test]
async fn test_exact_policy_keeps_fractional_hours() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let repo = AttendanceRepository::new(ctx.pool.clone(), WorkHoursPolicy::Exact);

    repo.check_in(employee.employee.id, at(2024, 3, 5, 8, 0))
        .await
        .unwrap();
    let closed = repo
        .check_out(employee.employee.id, at(2024, 3, 5, 16, 30))
        .await
        .unwrap();

    assert_eq!(closed.work_hours, Some(8.5));
}

#[tokio::test]
async fn test_second_check_in_returns_existing_record() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let repo = &ctx.state.attendance_repository;

    let first = repo
        .check_in(employee.employee.id, at(2024, 3, 4, 8, 0))
        .await
        .unwrap();
    let second = repo
        .check_in(employee.employee.id, at(2024, 3, 4, 9, 30))
        .await;

    match second {
        Err(AppError::AlreadyCheckedIn(existing)) => assert_eq!(*existing, first),
        other => panic!("Expected AlreadyCheckedIn, got {:?}", other),
    }
    assert_eq!(ctx.record_count("attendances").await, 1);
}

#[tokio::test]
async fn test_concurrent_check_ins_store_a_single_row() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let repo = &ctx.state.attendance_repository;
    let now = at(2024, 3, 4, 8, 0);

    let (a, b) = tokio::join!(
        repo.check_in(employee.employee.id, now),
        repo.check_in(employee.employee.id, now)
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(
        [&a, &b]
            .iter()
            .any(|r| matches!(r, Err(AppError::AlreadyCheckedIn(_))))
    );
    assert_eq!(ctx.record_count("attendances").await, 1);
}

#[tokio::test]
async fn test_check_in_on_a_new_day_opens_a_new_record() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let repo = &ctx.state.attendance_repository;

    repo.check_in(employee.employee.id, at(2024, 3, 4, 23, 59))
        .await
        .unwrap();
    repo.check_in(employee.employee.id, at(2024, 3, 5, 0, 1))
        .await
        .unwrap();

    assert_eq!(ctx.record_count("attendances").await, 2);
}

#[tokio::test]
async fn test_check_out_without_check_in_fails() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;

    let result = ctx
        .state
        .attendance_repository
        .check_out(employee.employee.id, at(2024, 3, 4, 17, 0))
        .await;

    assert!(matches!(result, Err(AppError::NoCheckInYet)));
}

#[tokio::test]
async fn test_check_out_on_manual_row_without_check_in_fails() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let repo = &ctx.state.attendance_repository;

    let mut input = manual(employee.employee.id, day(2024, 3, 4));
    input.status = Some(AttendanceStatus::Absent);
    repo.manual_upsert(input).await.unwrap();

    let result = repo
        .check_out(employee.employee.id, at(2024, 3, 4, 17, 0))
        .await;

    assert!(matches!(result, Err(AppError::NoCheckInYet)));
}

#[tokio::test]
async fn test_double_check_out_fails() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let repo = &ctx.state.attendance_repository;

    repo.check_in(employee.employee.id, at(2024, 3, 4, 8, 0))
        .await
        .unwrap();
    let closed = repo
        .check_out(employee.employee.id, at(2024, 3, 4, 16, 0))
        .await
        .unwrap();
    let again = repo
        .check_out(employee.employee.id, at(2024, 3, 4, 18, 0))
        .await;

    match again {
        Err(AppError::AlreadyCheckedOut(existing)) => {
            assert_eq!(existing.check_out, closed.check_out);
            assert_eq!(existing.work_hours, Some(8.0));
        }
        other => panic!("Expected AlreadyCheckedOut, got {:?}", other),
    }
}

#[tokio::test]
async fn test_manual_entry_merges_into_existing_record() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let repo = &ctx.state.attendance_repository;

    let opened = repo
        .check_in(employee.employee.id, at(2024, 3, 4, 9, 40))
        .await
        .unwrap();

    let mut input = manual(employee.employee.id, day(2024, 3, 4));
    input.check_out = Some(at(2024, 3, 4, 18, 0));
    input.status = Some(AttendanceStatus::Late);
    input.notes = Some("Forgot to check out".to_string());
    let merged = repo.manual_upsert(input).await.unwrap();

    assert_eq!(merged.id, opened.id);
    assert_eq!(merged.check_in, opened.check_in);
    assert_eq!(merged.check_out, Some(at(2024, 3, 4, 18, 0)));
    assert_eq!(merged.work_hours, Some(8.0));
    assert_eq!(merged.status, AttendanceStatus::Late);
    assert_eq!(merged.notes.as_deref(), Some("Forgot to check out"));

    // A later edit without notes keeps the stored ones
    let mut input = manual(employee.employee.id, day(2024, 3, 4));
    input.status = Some(AttendanceStatus::Present);
    let edited = repo.manual_upsert(input).await.unwrap();
    assert_eq!(edited.notes.as_deref(), Some("Forgot to check out"));
    assert_eq!(edited.status, AttendanceStatus::Present);
    assert_eq!(ctx.record_count("attendances").await, 1);
}

#[tokio::test]
async fn test_manual_entry_truncates_timestamp_to_day() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;

    let mut input = manual(employee.employee.id, day(2024, 1, 1));
    input.date = DayInput::Timestamp(at(2024, 3, 6, 13, 45));
    let created = ctx
        .state
        .attendance_repository
        .manual_upsert(input)
        .await
        .unwrap();

    assert_eq!(created.date, day(2024, 3, 6));
    assert_eq!(created.status, AttendanceStatus::Present);
    assert_eq!(created.work_hours, None);
}

#[tokio::test]
async fn test_manual_entry_rejects_check_out_without_check_in() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;

    let mut input = manual(employee.employee.id, day(2024, 3, 4));
    input.check_out = Some(at(2024, 3, 4, 17, 0));
    let result = ctx.state.attendance_repository.manual_upsert(input).await;

    assert!(matches!(
        result,
        Err(AppError::Validation { ref field, .. }) if field == "checkOut"
    ));
    assert_eq!(ctx.record_count("attendances").await, 0);
}

#[tokio::test]
async fn test_manual_entry_for_unknown_employee_is_not_found() {
    let ctx = common::TestContext::new().await.unwrap();

    let result = ctx
        .state
        .attendance_repository
        .manual_upsert(manual(Uuid::new_v4(), day(2024, 3, 4)))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_query_filters_and_paginates_newest_first() {
    let ctx = common::TestContext::new().await.unwrap();
    let alice = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let bob = ctx.create_employee(UserRole::Employee, "Sales").await;
    let repo = &ctx.state.attendance_repository;

    for d in 1..=5 {
        repo.check_in(alice.employee.id, at(2024, 3, d, 8, 0))
            .await
            .unwrap();
    }
    repo.check_in(bob.employee.id, at(2024, 3, 3, 8, 0))
        .await
        .unwrap();

    let filter = AttendanceFilter {
        employee_id: Some(alice.employee.id),
        start_date: Some(day(2024, 3, 2)),
        end_date: Some(day(2024, 3, 5)),
        status: None,
    };
    let page = PaginationQuery::new(1, 3).resolve(20);
    let result = repo.query(&filter, page).await.unwrap();

    assert_eq!(result.pagination.total, 4);
    assert_eq!(result.pagination.pages, 2);
    let dates: Vec<NaiveDate> = result.items.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![day(2024, 3, 5), day(2024, 3, 4), day(2024, 3, 3)]);

    let everyone_on_third = AttendanceFilter {
        start_date: Some(day(2024, 3, 3)),
        end_date: Some(day(2024, 3, 3)),
        ..Default::default()
    };
    let result = repo
        .query(&everyone_on_third, PaginationQuery::default().resolve(20))
        .await
        .unwrap();
    assert_eq!(result.pagination.total, 2);
}

#[tokio::test]
async fn test_delete_removes_record_and_rejects_unknown_id() {
    let ctx = common::TestContext::new().await.unwrap();
    let employee = ctx.create_employee(UserRole::Employee, "Engineering").await;
    let repo = &ctx.state.attendance_repository;

    let record = repo
        .check_in(employee.employee.id, at(2024, 3, 4, 8, 0))
        .await
        .unwrap();

    let deleted = repo.delete(record.id).await.unwrap();
    assert_eq!(deleted.id, record.id);
    assert_eq!(ctx.record_count("attendances").await, 0);

    let missing = repo.delete(record.id).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}
