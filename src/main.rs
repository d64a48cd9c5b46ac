use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use std::io;

use taskledger::auth::{AuthMiddleware, TokenService};
use taskledger::config::Config;
use taskledger::routes::{self, health};
use taskledger::services::user_service;
use taskledger::{cors, db};

fn startup_error<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> io::Error + '_ {
    move |e| io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error("Invalid configuration"))?;

    let pool = db::connect(&config.database_url, config.database_max_connections)
        .await
        .map_err(startup_error("Failed to connect to database"))?;
    db::init_schema(&pool)
        .await
        .map_err(startup_error("Failed to initialize schema"))?;

    if let Some(admin) = &config.bootstrap_admin {
        let user = user_service::ensure_admin(&pool, admin, config.auth.bcrypt_cost)
            .await
            .map_err(startup_error("Failed to create bootstrap admin"))?;
        log::info!("bootstrap admin ready: {}", user.username);
    }

    let tokens = TokenService::from_config(&config.auth);
    let bind_addr = (config.server_host.clone(), config.server_port);
    let debug = config.debug;

    log::info!("Starting Task Manager API at {}", config.server_url());

    let pool_data = web::Data::new(pool);
    let token_data = web::Data::new(tokens);
    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(token_data.clone())
            .app_data(config_data.clone())
            .wrap(cors(debug))
            .wrap(Logger::default())
            .service(health::root)
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
