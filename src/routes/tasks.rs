use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::CurrentUser,
    error::AppError,
    images,
    models::{Task, TaskInput, TaskQuery, TaskUpdate},
    routes::users::UploadQuery,
};

/// Create a task owned by the caller.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    body: web::Json<TaskInput>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let task = Task::new(body.into_inner(), current.user.id);

    let result = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (id, description, completed, owner) VALUES ($1, $2, $3, $4) \
         RETURNING id, description, completed, owner, created_at, updated_at",
    )
    .bind(task.id)
    .bind(&task.description)
    .bind(task.completed)
    .bind(task.owner)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(result))
}

/// List the caller's tasks.
///
/// Supports `completed` filtering, `sortBy=field:asc|desc` ordering, and
/// `limit`/`skip` pagination. Values that do not parse are ignored rather
/// than rejected.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    let mut sql = String::from(
        "SELECT id, description, completed, owner, created_at, updated_at \
         FROM tasks WHERE owner = $1",
    );
    let mut param = 2;

    let completed = query_params.completed_filter();
    if completed.is_some() {
        sql.push_str(&format!(" AND completed = ${}", param));
        param += 1;
    }

    sql.push_str(&format!(" ORDER BY {}", query_params.order_by()));

    let limit = query_params.limit();
    if limit.is_some() {
        sql.push_str(&format!(" LIMIT ${}", param));
        param += 1;
    }
    let skip = query_params.skip();
    if skip.is_some() {
        sql.push_str(&format!(" OFFSET ${}", param));
    }

    let mut query = sqlx::query_as::<_, Task>(&sql).bind(current.user.id);
    if let Some(completed) = completed {
        query = query.bind(completed);
    }
    if let Some(limit) = limit {
        query = query.bind(limit);
    }
    if let Some(skip) = skip {
        query = query.bind(skip);
    }

    let tasks = query.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Fetch one task. Tasks of other users answer 404.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>(
        "SELECT id, description, completed, owner, created_at, updated_at \
         FROM tasks WHERE id = $1 AND owner = $2",
    )
    .bind(task_id.into_inner())
    .bind(current.user.id)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Update a task's description and/or completed flag.
///
/// Any other field in the payload rejects the request with 400 before the
/// task is touched.
#[patch("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    body: web::Json<TaskUpdate>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let description = body.description.as_deref().map(|d| d.trim().to_string());

    let mut sets: Vec<String> = Vec::new();
    let mut param = 1;
    if description.is_some() {
        sets.push(format!("description = ${}", param));
        param += 1;
    }
    if body.completed.is_some() {
        sets.push(format!("completed = ${}", param));
        param += 1;
    }
    sets.push("updated_at = now()".to_string());

    let sql = format!(
        "UPDATE tasks SET {} WHERE id = ${} AND owner = ${} \
         RETURNING id, description, completed, owner, created_at, updated_at",
        sets.join(", "),
        param,
        param + 1
    );

    let mut query = sqlx::query_as::<_, Task>(&sql);
    if let Some(description) = description {
        query = query.bind(description);
    }
    if let Some(completed) = body.completed {
        query = query.bind(completed);
    }
    let task = query
        .bind(task_id.into_inner())
        .bind(current.user.id)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Delete a task, answering with the removed record.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>(
        "DELETE FROM tasks WHERE id = $1 AND owner = $2 \
         RETURNING id, description, completed, owner, created_at, updated_at",
    )
    .bind(task_id.into_inner())
    .bind(current.user.id)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Attach an image to a task as raw bytes; stored normalized to PNG.
#[post("/{id}/image")]
pub async fn set_image(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();

    let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM tasks WHERE id = $1 AND owner = $2")
        .bind(task_id)
        .bind(current.user.id)
        .fetch_optional(&**pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Task not found".into()));
    }

    if let Some(filename) = query.filename.as_deref() {
        images::check_extension(filename)?;
    }
    let image = images::normalize_to_png(&body)?;

    sqlx::query("UPDATE tasks SET image = $1, updated_at = now() WHERE id = $2 AND owner = $3")
        .bind(image)
        .bind(task_id)
        .bind(current.user.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().finish())
}

/// Serve a task's image. Public: images are fetched by id, e.g. from an
/// <img> tag.
#[get("/{id}/image")]
pub async fn get_image(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let image = sqlx::query_scalar::<_, Option<Vec<u8>>>("SELECT image FROM tasks WHERE id = $1")
        .bind(task_id.into_inner())
        .fetch_optional(&**pool)
        .await?
        .flatten()
        .ok_or_else(|| AppError::NotFound("Image not found".into()))?;

    Ok(HttpResponse::Ok().content_type("image/png").body(image))
}

/// Remove a task's image. 404 when the task has none.
#[delete("/{id}/image")]
pub async fn delete_image(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();

    let has_image = sqlx::query_scalar::<_, bool>(
        "SELECT image IS NOT NULL FROM tasks WHERE id = $1 AND owner = $2",
    )
    .bind(task_id)
    .bind(current.user.id)
    .fetch_optional(&**pool)
    .await?;

    match has_image {
        Some(true) => {}
        _ => return Err(AppError::NotFound("Image not found".into())),
    }

    sqlx::query("UPDATE tasks SET image = NULL, updated_at = now() WHERE id = $1 AND owner = $2")
        .bind(task_id)
        .bind(current.user.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().finish())
}
