//! User rows: registration insert, credential lookup, profile mutation,
//! and the admin listing / role toggle.

use shopd_schemas::{Role, User, UserProfile};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "user_id, email, password_hash, name, gender, age, \
                            phone_number, address, profile_picture, role, created_at";

const PROFILE_COLUMNS: &str = "user_id, email, name, gender, age, phone_number, \
                               address, profile_picture, role, created_at";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

/// Profile fields a user may change about themselves. `None` clears the
/// column, mirroring a full-document replace.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
}

/// Insert a registration row. A duplicate email surfaces as a database
/// unique violation; callers map that onto the duplicate-email response.
pub async fn insert_user(pool: &PgPool, new: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        insert into users (user_id, email, password_hash, name, gender, age, phone_number, address)
        values ($1, $2, $3, $4, $5, $6, $7, $8)
        returning {USER_COLUMNS}
        "#,
    ))
    .bind(Uuid::new_v4())
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.name)
    .bind(&new.gender)
    .bind(new.age)
    .bind(&new.phone_number)
    .bind(&new.address)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("select {USER_COLUMNS} from users where email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "select {USER_COLUMNS} from users where user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    update: &ProfileUpdate,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(&format!(
        r#"
        update users
        set name = $2, gender = $3, age = $4, phone_number = $5,
            address = $6, profile_picture = $7
        where user_id = $1
        returning {PROFILE_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(&update.name)
    .bind(&update.gender)
    .bind(update.age)
    .bind(&update.phone_number)
    .bind(&update.address)
    .bind(&update.profile_picture)
    .fetch_optional(pool)
    .await
}

/// Overwrite the stored password hash. Returns false when the user is gone.
pub async fn set_password_hash(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("update users set password_hash = $2 where user_id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(&format!(
        "select {PROFILE_COLUMNS} from users order by created_at"
    ))
    .fetch_all(pool)
    .await
}

/// Admin role toggle. The only admin-side user mutation in the system;
/// users are never hard-deleted.
pub async fn set_role(
    pool: &PgPool,
    user_id: Uuid,
    role: Role,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(&format!(
        r#"
        update users set role = $2 where user_id = $1
        returning {PROFILE_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(role)
    .fetch_optional(pool)
    .await
}
