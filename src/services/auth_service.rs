use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::log_activity,
    dto::auth::{ChangePasswordRequest, LoginRequest, LoginResponse, UpdateProfileRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, Claims, RequestMeta},
    response::Ack,
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn issue_token(user: &UserModel) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn login(
    state: &AppState,
    meta: &RequestMeta,
    payload: LoginRequest,
) -> AppResult<LoginResponse> {
    let user = Users::find()
        .filter(UserCol::Email.eq(&payload.email))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) if verify_password(&payload.password, &u.password_hash) => u,
        _ => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    let token = issue_token(&user)?;

    let mut active: UserActive = user.clone().into();
    active.last_login = Set(Some(Utc::now().into()));
    active.update(&state.orm).await?;

    let caller = CallerIdentity {
        user_id: user.id,
        email: user.email.clone(),
    };
    log_activity(
        &state.pool,
        Some(&caller),
        meta,
        "login",
        "User",
        Some(user.id),
        Some(&format!("User {} logged in", user.email)),
        None,
    )
    .await;

    Ok(LoginResponse { token })
}

pub async fn update_profile(
    state: &AppState,
    caller: &CallerIdentity,
    meta: &RequestMeta,
    payload: UpdateProfileRequest,
) -> AppResult<UserModel> {
    let user = Users::find_by_id(caller.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if let Some(email) = payload.email.as_deref() {
        if email != user.email && email_taken(&state.orm, email, Some(user.id)).await? {
            return Err(AppError::validation(
                "Email is already taken",
                "email",
                "must be unique",
            ));
        }
    }

    let mut active: UserActive = user.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(avatar) = payload.avatar {
        active.avatar = Set(Some(avatar));
    }
    active.updated_at = Set(Utc::now().into());

    let user = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(caller),
        meta,
        "update",
        "User",
        Some(user.id),
        Some("Updated own profile"),
        None,
    )
    .await;

    Ok(user)
}

pub async fn change_password(
    state: &AppState,
    caller: &CallerIdentity,
    meta: &RequestMeta,
    payload: ChangePasswordRequest,
) -> AppResult<Ack> {
    let user = Users::find_by_id(caller.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if !verify_password(&payload.current_password, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid current password".into()));
    }

    let user_id = user.id;
    let mut active: UserActive = user.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(caller),
        meta,
        "update",
        "User",
        Some(user_id),
        Some("Changed password"),
        None,
    )
    .await;

    Ok(Ack::new("Password changed successfully"))
}

pub async fn email_taken<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    exclude: Option<Uuid>,
) -> AppResult<bool> {
    let mut finder = Users::find().filter(UserCol::Email.eq(email));
    if let Some(id) = exclude {
        finder = finder.filter(UserCol::Id.ne(id));
    }
    Ok(finder.one(conn).await?.is_some())
}
