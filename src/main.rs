use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;

use taskhub::auth::AuthMiddleware;
use taskhub::config::Config;
use taskhub::error::AppError;
use taskhub::notify::Mailer;
use taskhub::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let mailer = Mailer::from_config(&config);
    let bind_addr = (config.server_host.clone(), config.server_port);
    log::info!("listening on {}", config.server_url());

    let config = web::Data::new(config);
    let pool = web::Data::new(pool);
    let mailer = web::Data::new(mailer);

    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(config.clone())
            .app_data(mailer.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                // Malformed bodies answer with the same JSON error shape as
                // everything else.
                AppError::BadRequest(err.to_string()).into()
            }))
            .wrap(AuthMiddleware)
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .configure(routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
