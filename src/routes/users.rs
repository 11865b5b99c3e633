use axum::{
    Router,
    routing::{get, post, put, delete},
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::Json as RespJson,
};
use serde_json;
use sqlx::PgPool;

use crate::model::user::{CreateUserRequest, UpdateUserRequest, User};
use crate::validation::validate_user;

// Create users router
pub fn users_router() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users", post(create_user))
        .route("/users/:id", put(update_user))
        .route("/users/:id", delete(delete_user))
}

// Postgres raises 23505 when an insert or update hits the email UNIQUE
// constraint; the pre-insert lookup cannot catch a concurrent writer.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn db_error(e: sqlx::Error) -> (StatusCode, RespJson<serde_json::Value>) {
    println!("🚨 Database error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        RespJson(serde_json::json!({
            "error": "Database error"
        })),
    )
}

fn duplicate_email() -> (StatusCode, RespJson<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        RespJson(serde_json::json!({
            "error": "User with this email already exists"
        })),
    )
}

// Create new user
async fn create_user(
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, RespJson<User>), (StatusCode, RespJson<serde_json::Value>)> {
    println!("🔧 Creating user with email: {}", payload.email);

    let errors = validate_user(
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        &payload.phone,
        &payload.pan,
    );
    if !errors.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            RespJson(serde_json::json!({ "errors": errors })),
        ));
    }

    // Reject duplicate email before inserting
    let existing = sqlx::query("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await
        .map_err(db_error)?;

    if existing.is_some() {
        println!("❌ Email already taken: {}", payload.email);
        return Err(duplicate_email());
    }

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (first_name, last_name, email, phone, pan)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, first_name, last_name, email, phone, pan",
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.pan)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            duplicate_email()
        } else {
            db_error(e)
        }
    })?;

    println!("✅ User created with ID: {}", user.id);
    Ok((StatusCode::CREATED, RespJson(user)))
}

// List all users in insertion order
async fn list_users(
    Extension(pool): Extension<PgPool>,
) -> Result<RespJson<Vec<User>>, (StatusCode, RespJson<serde_json::Value>)> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, first_name, last_name, email, phone, pan FROM users ORDER BY id ASC",
    )
    .fetch_all(&pool)
    .await
    .map_err(db_error)?;

    Ok(RespJson(users))
}

// Update user (full five-field replace)
async fn update_user(
    Extension(pool): Extension<PgPool>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<RespJson<User>, (StatusCode, RespJson<serde_json::Value>)> {
    println!("🔄 Updating user with ID: {}", user_id);

    let errors = validate_user(
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        &payload.phone,
        &payload.pan,
    );
    if !errors.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            RespJson(serde_json::json!({ "errors": errors })),
        ));
    }

    let row = sqlx::query_as::<_, User>(
        "UPDATE users SET first_name = $1, last_name = $2, email = $3, phone = $4, pan = $5
         WHERE id = $6
         RETURNING id, first_name, last_name, email, phone, pan",
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.pan)
    .bind(user_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            duplicate_email()
        } else {
            db_error(e)
        }
    })?;

    match row {
        Some(user) => Ok(RespJson(user)),
        None => Err((
            StatusCode::NOT_FOUND,
            RespJson(serde_json::json!({
                "error": "User not found"
            })),
        )),
    }
}

// Delete user
async fn delete_user(
    Extension(pool): Extension<PgPool>,
    Path(user_id): Path<i32>,
) -> Result<StatusCode, (StatusCode, RespJson<serde_json::Value>)> {
    println!("🗑️ Deleting user with ID: {}", user_id);

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .map_err(db_error)?;

    if result.rows_affected() == 0 {
        Err((
            StatusCode::NOT_FOUND,
            RespJson(serde_json::json!({
                "error": "User not found"
            })),
        ))
    } else {
        Ok(StatusCode::NO_CONTENT)
    }
}
