use chrono::{Duration, TimeZone, Utc};
use otos_core::db::open_db_in_memory;
use otos_core::repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
use otos_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use otos_core::{ExternalId, Priority, RepoError, Task, TaskId, TaskStatus, UserId};

fn pending_task(owner: UserId, title: &str, minute: i64) -> Task {
    Task {
        id: TaskId::new(),
        owner,
        title: title.to_string(),
        category: "errands".to_string(),
        priority: Priority::Important,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(minute),
        status: TaskStatus::Pending,
    }
}

#[test]
fn duplicate_external_id_is_reported_semantically() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);

    let user = users.create_user(ExternalId(10), "Ali", Utc::now()).unwrap();
    assert_eq!(user.score, 0);

    let err = users.create_user(ExternalId(10), "Other", Utc::now()).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateUser(ExternalId(10))));
}

#[test]
fn add_score_returns_new_value_and_allows_negative() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);
    let user = users.create_user(ExternalId(1), "A", Utc::now()).unwrap();

    assert_eq!(users.add_score(user.id, -2).unwrap(), -2);
    assert_eq!(users.add_score(user.id, 5).unwrap(), 3);
    assert!(matches!(
        users.add_score(UserId(404), 1),
        Err(RepoError::UserNotFound(UserId(404)))
    ));
}

#[test]
fn list_tasks_keeps_creation_order_and_filters_done() {
    let conn = open_db_in_memory().unwrap();
    let user = SqliteUserRepository::new(&conn)
        .create_user(ExternalId(1), "A", Utc::now())
        .unwrap();
    let tasks = SqliteTaskRepository::new(&conn);

    let first = pending_task(user.id, "first", 0);
    let second = pending_task(user.id, "second", 5);
    let third = pending_task(user.id, "third", 5);
    for task in [&second, &first, &third] {
        tasks.insert_task(task).unwrap();
    }
    tasks.mark_done(second.id, Utc::now()).unwrap();

    let all = tasks.list_tasks(user.id, TaskListQuery::default()).unwrap();
    let titles: Vec<_> = all.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["first", "second", "third"]);

    let pending = tasks
        .list_tasks(user.id, TaskListQuery { pending_only: true })
        .unwrap();
    let titles: Vec<_> = pending.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["first", "third"]);
}

#[test]
fn mark_done_is_compare_and_set() {
    let conn = open_db_in_memory().unwrap();
    let user = SqliteUserRepository::new(&conn)
        .create_user(ExternalId(1), "A", Utc::now())
        .unwrap();
    let tasks = SqliteTaskRepository::new(&conn);
    let task = pending_task(user.id, "once", 0);
    tasks.insert_task(&task).unwrap();

    let done_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    assert!(tasks.mark_done(task.id, done_at).unwrap());
    assert!(!tasks.mark_done(task.id, done_at + Duration::hours(1)).unwrap());

    let stored = tasks.get_task(task.id).unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Done { done_at });

    let missing = TaskId::new();
    assert!(matches!(
        tasks.mark_done(missing, done_at),
        Err(RepoError::TaskNotFound(id)) if id == missing
    ));
}

#[test]
fn delete_is_physical() {
    let conn = open_db_in_memory().unwrap();
    let user = SqliteUserRepository::new(&conn)
        .create_user(ExternalId(1), "A", Utc::now())
        .unwrap();
    let tasks = SqliteTaskRepository::new(&conn);
    let task = pending_task(user.id, "gone", 0);
    tasks.insert_task(&task).unwrap();

    tasks.delete_task(task.id).unwrap();
    assert!(tasks.get_task(task.id).unwrap().is_none());
    assert!(matches!(
        tasks.delete_task(task.id),
        Err(RepoError::TaskNotFound(_))
    ));
}

#[test]
fn inconsistent_done_state_is_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    let user = SqliteUserRepository::new(&conn)
        .create_user(ExternalId(1), "A", Utc::now())
        .unwrap();
    let tasks = SqliteTaskRepository::new(&conn);
    let task = pending_task(user.id, "broken", 0);
    tasks.insert_task(&task).unwrap();

    conn.execute_batch("PRAGMA ignore_check_constraints = ON;").unwrap();
    conn.execute(
        "UPDATE tasks SET done = 1 WHERE uuid = ?1;",
        [task.id.to_string()],
    )
    .unwrap();

    assert!(matches!(
        tasks.get_task(task.id),
        Err(RepoError::InvalidData(_))
    ));
}
