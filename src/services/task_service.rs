//! Task persistence and query logic.
//!
//! Listing applies the optional filters (AND-combined) to both the count and the page query,
//! so `total` always covers every matching row. Rows are ordered by `created_at` in the
//! requested direction with `id` ascending as a tiebreak, which keeps pages stable when
//! timestamps collide.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::task::{MAX_PRIORITY, MIN_PRIORITY};
use crate::models::{Task, TaskFilter, TaskInput, TaskUpdate, User};
use crate::pagination::{Page, PaginationParams};

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, created_at, created_by, assigned_to";

fn check_priority(priority: i64) -> Result<(), AppError> {
    if (MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        Ok(())
    } else {
        Err(AppError::validation(
            "priority",
            format!(
                "Priority must be between {} and {}",
                MIN_PRIORITY, MAX_PRIORITY
            ),
        ))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &TaskFilter) {
    let mut keyword = " WHERE ";
    if let Some(status) = filter.status {
        builder.push(keyword).push("status = ").push_bind(status);
        keyword = " AND ";
    }
    if let Some(assigned_to) = filter.assigned_to {
        builder.push(keyword).push("assigned_to = ").push_bind(assigned_to);
    }
}

pub async fn get_task_by_id(pool: &SqlitePool, id: Uuid) -> Result<Task, AppError> {
    sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Task", id))
}

/// Creates a task owned by `creator` and returns the stored row.
pub async fn create_task(
    pool: &SqlitePool,
    input: TaskInput,
    creator: &User,
) -> Result<Task, AppError> {
    check_priority(input.priority)?;
    input.validate()?;

    let task = Task::new(input, creator.id);
    sqlx::query(
        "INSERT INTO tasks (id, title, description, status, priority, due_date, created_at, created_by, assigned_to)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.due_date)
    .bind(task.created_at)
    .bind(task.created_by)
    .bind(task.assigned_to)
    .execute(pool)
    .await?;

    log::info!("user {} created task {}", creator.username, task.id);
    get_task_by_id(pool, task.id).await
}

/// Applies the fields present in `update` and returns the refreshed row.
///
/// Only the supplied columns are written, so concurrent updates touching different fields
/// do not overwrite each other. There is no version check: for the same field the last
/// write wins.
pub async fn update_task(
    pool: &SqlitePool,
    id: Uuid,
    update: TaskUpdate,
) -> Result<Task, AppError> {
    let existing = get_task_by_id(pool, id).await?;

    if let Some(priority) = update.priority {
        check_priority(priority)?;
    }
    update.validate()?;

    if update.is_empty() {
        return Ok(existing);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET ");
    {
        let mut columns = builder.separated(", ");
        if let Some(title) = update.title {
            columns.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = update.description {
            columns
                .push("description = ")
                .push_bind_unseparated(description);
        }
        if let Some(status) = update.status {
            columns.push("status = ").push_bind_unseparated(status);
        }
        if let Some(priority) = update.priority {
            columns.push("priority = ").push_bind_unseparated(priority);
        }
        if let Some(due_date) = update.due_date {
            columns.push("due_date = ").push_bind_unseparated(due_date);
        }
        if let Some(assigned_to) = update.assigned_to {
            columns
                .push("assigned_to = ")
                .push_bind_unseparated(assigned_to);
        }
    }
    builder.push(" WHERE id = ").push_bind(id);

    let result = builder.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        // Deleted between the load and the write.
        return Err(AppError::not_found("Task", id));
    }

    log::info!("updated task {}", id);
    get_task_by_id(pool, id).await
}

/// Permanently removes a task.
pub async fn delete_task(pool: &SqlitePool, id: Uuid) -> Result<(), AppError> {
    let task = get_task_by_id(pool, id).await?;

    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task.id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Task", id));
    }

    log::info!("deleted task {}", id);
    Ok(())
}

pub async fn count_tasks(pool: &SqlitePool, filter: &TaskFilter) -> Result<i64, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
    push_filters(&mut builder, filter);

    let total: i64 = builder.build_query_scalar().fetch_one(pool).await?;
    Ok(total)
}

/// Returns one page of tasks matching `filter` together with the total match count.
///
/// An offset past the end yields an empty page, not an error.
pub async fn list_tasks(
    pool: &SqlitePool,
    filter: &TaskFilter,
    pagination: &PaginationParams,
) -> Result<Page<Task>, AppError> {
    pagination.validate()?;

    let total = count_tasks(pool, filter).await?;

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM tasks", TASK_COLUMNS));
    push_filters(&mut builder, filter);
    builder
        .push(" ORDER BY created_at ")
        .push(pagination.sort_order.as_sql())
        .push(", id ASC LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset);

    let tasks = builder.build_query_as::<Task>().fetch_all(pool).await?;
    Ok(Page::new(tasks, total, pagination))
}
