use crate::{
    auth::{AdminUser, CurrentUser},
    error::AppError,
    models::{Task, TaskFilter, TaskInput, TaskStatus, TaskUpdate},
    pagination::{Page, PaginationParams, SortOrder, DEFAULT_LIMIT},
    services::task_service,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Query string accepted by `GET /tasks`.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub sort_order: Option<SortOrder>,
}

impl TaskListQuery {
    pub fn filter(&self) -> TaskFilter {
        TaskFilter {
            status: self.status,
            assigned_to: self.assigned_to,
        }
    }

    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(
            self.limit.unwrap_or(DEFAULT_LIMIT),
            self.offset.unwrap_or(0),
            self.sort_order.unwrap_or_default(),
        )
    }
}

/// Lists tasks with optional `status` and `assigned_to` filters.
///
/// ## Query Parameters:
/// - `status` (optional): `todo`, `in_progress` or `done`.
/// - `assigned_to` (optional): UUID of the assignee.
/// - `limit` (1-100, default 10), `offset` (default 0), `sort_order` (`asc` or `desc`,
///   default `asc`) on creation time.
///
/// ## Responses:
/// - `200 OK`: `{"total", "offset", "limit", "results"}` where `total` counts every match.
/// - `401 Unauthorized`: missing or invalid token.
/// - `422 Unprocessable Entity`: pagination parameters out of range.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<SqlitePool>,
    query: web::Query<TaskListQuery>,
    _caller: CurrentUser,
) -> Result<impl Responder, AppError> {
    let page: Page<Task> =
        task_service::list_tasks(&pool, &query.filter(), &query.pagination()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Creates a new task owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the stored `Task`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `422 Unprocessable Entity`: title length or priority out of range.
#[post("")]
pub async fn create_task(
    pool: web::Data<SqlitePool>,
    task_data: web::Json<TaskInput>,
    CurrentUser(caller): CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = task_service::create_task(&pool, task_data.into_inner(), &caller).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `404 Not Found`: no task with that ID.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<SqlitePool>,
    task_id: web::Path<Uuid>,
    _caller: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = task_service::get_task_by_id(&pool, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task. Fields missing from the body are left as they are.
///
/// ## Responses:
/// - `200 OK`: the refreshed `Task`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `404 Not Found`: no task with that ID.
/// - `422 Unprocessable Entity`: a supplied field is out of range.
#[patch("/{id}")]
pub async fn update_task(
    pool: web::Data<SqlitePool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    _caller: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task =
        task_service::update_task(&pool, task_id.into_inner(), task_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task. Admin only.
///
/// ## Responses:
/// - `204 No Content`: on successful deletion.
/// - `401 Unauthorized`: missing or invalid token.
/// - `403 Forbidden`: the caller is not an admin.
/// - `404 Not Found`: no task with that ID.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<SqlitePool>,
    task_id: web::Path<Uuid>,
    AdminUser(admin): AdminUser,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();
    task_service::delete_task(&pool, id).await?;
    log::info!("admin {} deleted task {}", admin.username, id);
    Ok(HttpResponse::NoContent().finish())
}
