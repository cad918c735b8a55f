//! Authentication and user administration handlers.

use actix_web::{HttpResponse, web};

use storefront_core::domain::{Role, User};
use storefront_core::services::{ACCOUNT_ADMINS, NewAccount, TokenPair};
use storefront_shared::ApiResponse;
use storefront_shared::dto::{
    AddRoleRequest, EmailRequest, LoginRequest, RegisterRequest, TokenResponse,
    UpdateRolesRequest, UserResponse,
};

use crate::middleware::auth::BearerUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        roles: user.roles.iter().map(|r| r.as_str().to_string()).collect(),
        is_active: user.is_active,
        is_disabled: user.is_disabled,
        created_at: user.created_at,
    }
}

fn token_response(pair: TokenPair) -> TokenResponse {
    TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: pair.token_type.to_string(),
        expires_in: pair.expires_in,
    }
}

fn parse_role(name: &str) -> AppResult<Role> {
    name.parse::<Role>()
        .map_err(|e| AppError::BadInput(e.to_string()))
}

fn parse_roles(names: &[String]) -> AppResult<Vec<Role>> {
    names.iter().map(|n| parse_role(n)).collect()
}

fn new_account(req: RegisterRequest) -> AppResult<NewAccount> {
    Ok(NewAccount {
        roles: parse_roles(&req.roles)?,
        email: req.email,
        password: req.password,
        full_name: req.full_name,
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let user = state.accounts.register(new_account(body.into_inner())?).await?;
    Ok(HttpResponse::Created().json(user_response(&user)))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let pair = state.accounts.login(req.email.trim(), &req.password).await?;
    Ok(HttpResponse::Ok().json(token_response(pair)))
}

/// POST /api/auth/logout
pub async fn logout(state: web::Data<AppState>, user: BearerUser) -> AppResult<HttpResponse> {
    state.accounts.logout(&user.email).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Logged out")))
}

/// POST /api/auth/refresh_token
pub async fn refresh_token(
    state: web::Data<AppState>,
    user: BearerUser,
) -> AppResult<HttpResponse> {
    let pair = state.accounts.refresh(&user.email).await?;
    Ok(HttpResponse::Ok().json(token_response(pair)))
}

/// GET /api/auth/users/me
pub async fn me(user: BearerUser) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(user_response(&user)))
}

/// GET /api/auth/users/{email}
///
/// Served from the user cache. Anyone may look themselves up; looking up
/// others takes an admin or moderator.
pub async fn get_user(
    state: web::Data<AppState>,
    caller: BearerUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let email = path.into_inner();
    let authorizer = state.accounts.authorizer();
    if email != caller.email {
        authorizer.require_one_of(&ACCOUNT_ADMINS, &caller.email).await?;
    }

    let user = authorizer
        .get_user_cached(&email)
        .await?
        .ok_or_else(|| storefront_core::DomainError::not_found("User", &email))?;
    Ok(HttpResponse::Ok().json(user_response(&user)))
}

/// POST /api/auth/create_user
pub async fn create_user(
    state: web::Data<AppState>,
    caller: BearerUser,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let account = new_account(body.into_inner())?;
    let user = state.accounts.create_user(&caller.email, account).await?;
    Ok(HttpResponse::Created().json(user_response(&user)))
}

/// POST /api/auth/delete_user
pub async fn delete_user(
    state: web::Data<AppState>,
    caller: BearerUser,
    body: web::Json<EmailRequest>,
) -> AppResult<HttpResponse> {
    state.accounts.delete_user(&caller.email, &body.email).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("User deleted")))
}

/// POST /api/auth/update_user_roles
pub async fn update_user_roles(
    state: web::Data<AppState>,
    caller: BearerUser,
    body: web::Json<UpdateRolesRequest>,
) -> AppResult<HttpResponse> {
    let roles = parse_roles(&body.roles)?;
    let user = state
        .accounts
        .update_user_roles(&caller.email, &body.email, roles)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        user_response(&user),
        "Roles updated",
    )))
}

/// POST /api/auth/add_user_role
pub async fn add_user_role(
    state: web::Data<AppState>,
    caller: BearerUser,
    body: web::Json<AddRoleRequest>,
) -> AppResult<HttpResponse> {
    let role = parse_role(&body.role)?;
    let user = state
        .accounts
        .add_user_role(&caller.email, &body.email, role)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        user_response(&user),
        "Role added",
    )))
}
