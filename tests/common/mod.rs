//! Shared setup for the integration suites.
//!
//! The suites exercise the full HTTP surface against a real database. They
//! are skipped (with a note on stderr) when `DATABASE_URL` is unset, so
//! `cargo test` stays green on machines without Postgres.

use std::io::Cursor;

use actix_web::web;
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgba};
use sqlx::PgPool;
use uuid::Uuid;

use taskhub::config::Config;
use taskhub::notify::Mailer;

pub struct TestContext {
    pub pool: web::Data<PgPool>,
    pub config: web::Data<Config>,
    pub mailer: web::Data<Mailer>,
}

/// Connects to the database named by `DATABASE_URL` and applies migrations.
/// Returns `None` when the variable is unset so the caller can skip.
pub async fn setup() -> Option<TestContext> {
    dotenv::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping integration test: DATABASE_URL is not set");
            return None;
        }
    };

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let config = Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url,
        jwt_secret: "integration-test-secret".to_string(),
        sendgrid_api_key: None,
        email_from: "noreply@taskhub.example".to_string(),
    };
    let mailer = Mailer::from_config(&config);

    Some(TestContext {
        pool: web::Data::new(pool),
        config: web::Data::new(config),
        mailer: web::Data::new(mailer),
    })
}

/// A unique address per call, so suites never collide with leftover rows.
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4())
}

/// A small deterministic test image: the PNG bytes and the decoded form for
/// pixel comparisons.
pub fn sample_png() -> (Vec<u8>, DynamicImage) {
    let buffer = ImageBuffer::from_fn(4, 4, |x, y| {
        Rgba([(x * 60) as u8, (y * 60) as u8, 200, 255])
    });
    let img = DynamicImage::ImageRgba8(buffer);
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageOutputFormat::Png)
        .expect("encoding the sample image cannot fail");
    (bytes.into_inner(), img)
}
