pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::error::AppError;

pub fn config(cfg: &mut web::ServiceConfig) {
    // Extractor failures render through AppError like every other error.
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| AppError::from(err).into()))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| AppError::from(err).into()))
        .app_data(web::FormConfig::default().error_handler(|err, _req| AppError::from(err).into()))
        .app_data(web::PathConfig::default().error_handler(|err, _req| AppError::from(err).into()));

    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    )
    .service(web::scope("/users").service(users::list_users));
}
