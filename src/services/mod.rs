//! Service layer: the operations the HTTP routes call. Each takes the pool explicitly and
//! returns `Result<_, AppError>`.

pub mod auth_service;
pub mod task_service;
pub mod user_service;
