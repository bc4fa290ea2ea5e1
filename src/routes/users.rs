use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, CurrentUser, LoginRequest,
        RegisterRequest,
    },
    config::Config,
    error::AppError,
    images,
    models::{UpdateUserRequest, User},
    notify::Mailer,
};

/// Optional source file name accompanying a raw-bytes upload.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

async fn store_token(pool: &PgPool, user_id: i32, token: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET tokens = array_append(tokens, $1) WHERE id = $2")
        .bind(token)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Register a new account.
///
/// Validates the payload, hashes the password, persists the user, stores a
/// fresh session token, and sends the welcome email in the background.
#[post("")]
pub async fn register(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    mailer: web::Data<Mailer>,
    body: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let name = body.name.trim().to_string();
    let email = body.email.trim().to_lowercase();

    let existing = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&**pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let password_hash = hash_password(&body.password)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password_hash, age) VALUES ($1, $2, $3, $4) \
         RETURNING id, name, email, password_hash, age, created_at, updated_at",
    )
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(body.age.unwrap_or(0))
    .fetch_one(&**pool)
    .await?;

    let token = generate_token(user.id, &config.jwt_secret)?;
    store_token(pool.get_ref(), user.id, &token).await?;

    mailer.send_welcome(user.email.clone(), user.name.clone());

    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

/// Login with email and password.
///
/// Issues a new session token without invalidating existing ones; each
/// device holds its own token.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let email = body.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, age, created_at, updated_at \
         FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = generate_token(user.id, &config.jwt_secret)?;
    store_token(pool.get_ref(), user.id, &token).await?;

    Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
}

/// Invalidate the session token presented on this request.
#[post("/logout")]
pub async fn logout(
    pool: web::Data<PgPool>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    sqlx::query("UPDATE users SET tokens = array_remove(tokens, $1) WHERE id = $2")
        .bind(&current.token)
        .bind(current.user.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().finish())
}

/// Invalidate every session token of the caller.
#[post("/logoutAll")]
pub async fn logout_all(
    pool: web::Data<PgPool>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    sqlx::query("UPDATE users SET tokens = '{}' WHERE id = $1")
        .bind(current.user.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().finish())
}

/// The caller's own profile.
#[get("/me")]
pub async fn me(current: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(current.user))
}

/// Update the caller's profile.
///
/// Accepts name, email, password, and age; the password is re-hashed, a
/// changed email is re-checked for uniqueness, and only the provided columns
/// are written.
#[patch("/me")]
pub async fn update_me(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    body: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let name = body.name.as_deref().map(|n| n.trim().to_string());
    let email = body.email.as_deref().map(|e| e.trim().to_lowercase());
    let password_hash = match body.password.as_deref() {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    if let Some(email) = &email {
        if *email != current.user.email {
            let taken = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&**pool)
                .await?;
            if taken.is_some() {
                return Err(AppError::BadRequest("Email already registered".into()));
            }
        }
    }

    let mut sets: Vec<String> = Vec::new();
    let mut param = 1;
    if name.is_some() {
        sets.push(format!("name = ${}", param));
        param += 1;
    }
    if email.is_some() {
        sets.push(format!("email = ${}", param));
        param += 1;
    }
    if password_hash.is_some() {
        sets.push(format!("password_hash = ${}", param));
        param += 1;
    }
    if body.age.is_some() {
        sets.push(format!("age = ${}", param));
        param += 1;
    }
    sets.push("updated_at = now()".to_string());

    let sql = format!(
        "UPDATE users SET {} WHERE id = ${} \
         RETURNING id, name, email, password_hash, age, created_at, updated_at",
        sets.join(", "),
        param
    );

    let mut query = sqlx::query_as::<_, User>(&sql);
    if let Some(name) = name {
        query = query.bind(name);
    }
    if let Some(email) = email {
        query = query.bind(email);
    }
    if let Some(password_hash) = password_hash {
        query = query.bind(password_hash);
    }
    if let Some(age) = body.age {
        query = query.bind(age);
    }
    let user = query.bind(current.user.id).fetch_one(&**pool).await?;

    Ok(HttpResponse::Ok().json(user))
}

/// Delete the caller's account.
///
/// Owned tasks are removed before the user row; the two statements are not
/// atomic, so a failure in between leaves the account without its tasks.
#[delete("/me")]
pub async fn delete_me(
    pool: web::Data<PgPool>,
    mailer: web::Data<Mailer>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    sqlx::query("DELETE FROM tasks WHERE owner = $1")
        .bind(current.user.id)
        .execute(&**pool)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(current.user.id)
        .execute(&**pool)
        .await?;

    mailer.send_cancellation(current.user.email.clone(), current.user.name.clone());

    Ok(HttpResponse::Ok().json(current.user))
}

/// Upload the caller's avatar as raw image bytes.
///
/// The image is cover-cropped to a square and stored as PNG.
#[post("/me/avatar")]
pub async fn set_avatar(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    if let Some(filename) = query.filename.as_deref() {
        images::check_extension(filename)?;
    }

    let avatar = images::normalize_avatar(&body, images::AVATAR_SIZE)?;

    sqlx::query("UPDATE users SET avatar = $1, updated_at = now() WHERE id = $2")
        .bind(avatar)
        .bind(current.user.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().finish())
}

/// Serve a user's avatar. Public: avatars are fetched by id, e.g. from an
/// <img> tag.
#[get("/{id}/avatar")]
pub async fn get_avatar(
    pool: web::Data<PgPool>,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let avatar = sqlx::query_scalar::<_, Option<Vec<u8>>>("SELECT avatar FROM users WHERE id = $1")
        .bind(user_id.into_inner())
        .fetch_optional(&**pool)
        .await?
        .flatten()
        .ok_or_else(|| AppError::NotFound("Avatar not found".into()))?;

    Ok(HttpResponse::Ok().content_type("image/png").body(avatar))
}

/// Remove the caller's avatar.
#[delete("/me/avatar")]
pub async fn delete_avatar(
    pool: web::Data<PgPool>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    sqlx::query("UPDATE users SET avatar = NULL, updated_at = now() WHERE id = $1")
        .bind(current.user.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().finish())
}
