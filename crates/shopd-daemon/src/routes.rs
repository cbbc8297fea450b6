//! Axum router and all HTTP handlers for shopd-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use shopd_db::{orders, products, users};
use shopd_schemas::UserProfile;

use crate::{
    api_types::{
        ChangePasswordRequest, HealthResponse, LoginRequest, MessageResponse, OrderRequest,
        ProductRequest, RegisterRequest, ReviewRequest, TokenResponse, UpdateOrderStatusRequest,
        UpdateProfileRequest, UpdateRoleRequest,
    },
    error::{map_unique_email, ApiError},
    extract::{AdminUser, AuthUser},
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let auth = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me).put(update_me))
        .route("/change-password", put(change_password));

    let catalog = Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
        .route("/:id/reviews", post(add_review));

    let order_routes = Router::new()
        .route("/", post(create_order).get(my_orders))
        .route("/cancel/:id", put(cancel_order));

    let admin = Router::new()
        .route("/products", get(admin_list_products).post(admin_create_product))
        .route(
            "/products/:id",
            put(admin_update_product).delete(admin_delete_product),
        )
        .route("/users", get(admin_list_users))
        .route("/users/:id", put(admin_set_role))
        .route("/orders", get(admin_list_orders))
        .route("/orders/:id", put(admin_set_order_status));

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/auth", auth)
        .nest("/api/products", catalog)
        .nest("/api/orders", order_routes)
        .nest("/api/admin", admin)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /api/auth/register
// ---------------------------------------------------------------------------

pub(crate) async fn register(
    State(st): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let password_hash = shopd_auth::hash_password(&body.password)?;

    let new = users::NewUser {
        email: body.email,
        password_hash,
        name: body.name,
        gender: body.gender,
        age: body.age,
        phone_number: body.phone_number,
        address: body.address,
    };

    let user = users::insert_user(&st.pool, &new)
        .await
        .map_err(map_unique_email)?;

    info!(user_id = %user.user_id, "user registered");

    let token = st.keys.mint(user.user_id, user.role, st.token_ttl_secs)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

// ---------------------------------------------------------------------------
// POST /api/auth/login
// ---------------------------------------------------------------------------

pub(crate) async fn login(
    State(st): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = users::find_by_email(&st.pool, &body.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !shopd_auth::verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = st.keys.mint(user.user_id, user.role, st.token_ttl_secs)?;
    Ok(Json(TokenResponse { token }))
}

// ---------------------------------------------------------------------------
// GET /api/auth/me
// ---------------------------------------------------------------------------

pub(crate) async fn me(
    State(st): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    let user = users::find_by_id(&st.pool, principal.user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user.into()))
}

// ---------------------------------------------------------------------------
// PUT /api/auth/me
// ---------------------------------------------------------------------------

pub(crate) async fn update_me(
    State(st): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let update = users::ProfileUpdate {
        name: body.name,
        gender: body.gender,
        age: body.age,
        phone_number: body.phone_number,
        address: body.address,
        profile_picture: body.profile_picture,
    };

    let profile = users::update_profile(&st.pool, principal.user_id, &update)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(profile))
}

// ---------------------------------------------------------------------------
// PUT /api/auth/change-password
// ---------------------------------------------------------------------------

pub(crate) async fn change_password(
    State(st): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = users::find_by_id(&st.pool, principal.user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    if !shopd_auth::verify_password(&body.old_password, &user.password_hash) {
        return Err(ApiError::Validation("Incorrect old password".to_string()));
    }

    let new_hash = shopd_auth::hash_password(&body.new_password)?;
    if !users::set_password_hash(&st.pool, principal.user_id, &new_hash).await? {
        return Err(ApiError::NotFound("User"));
    }

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/products
// ---------------------------------------------------------------------------

pub(crate) async fn list_products(
    State(st): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let products = products::list_products_with_reviews(&st.pool).await?;
    Ok(Json(products))
}

// ---------------------------------------------------------------------------
// GET /api/products/:id
// ---------------------------------------------------------------------------

pub(crate) async fn get_product(
    State(st): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = products::get_product_with_reviews(&st.pool, product_id)
        .await?
        .ok_or(ApiError::NotFound("Product"))?;
    Ok(Json(product))
}

// ---------------------------------------------------------------------------
// POST /api/products/:id/reviews
// ---------------------------------------------------------------------------

pub(crate) async fn add_review(
    State(st): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(product_id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Boundary validation first: 0 and 6 must be refused before any query.
    if !(1..=5).contains(&body.rating) {
        return Err(ApiError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    if body.comment.trim().is_empty() {
        return Err(ApiError::Validation("Comment is required".to_string()));
    }

    if products::get_product(&st.pool, product_id).await?.is_none() {
        return Err(ApiError::NotFound("Product"));
    }

    let review = products::insert_review(
        &st.pool,
        product_id,
        principal.user_id,
        body.rating,
        body.comment.trim(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

// ---------------------------------------------------------------------------
// POST /api/orders
// ---------------------------------------------------------------------------

pub(crate) async fn create_order(
    State(st): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<OrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.items.is_empty() {
        return Err(ApiError::Validation(
            "Order must contain at least one item".to_string(),
        ));
    }
    if body.items.iter().any(|item| item.quantity < 1) {
        return Err(ApiError::Validation(
            "Item quantity must be at least 1".to_string(),
        ));
    }

    let new = orders::NewOrder {
        items: body
            .items
            .into_iter()
            .map(|item| orders::NewOrderItem {
                product_id: item.product_id,
                name: item.name,
                price: item.price,
                quantity: item.quantity,
            })
            .collect(),
        total: body.total,
        shipping_address: body.shipping_address,
        payment_method: body.payment_method,
    };

    let order = orders::create_order(&st.pool, principal.user_id, &new).await?;

    info!(order_id = %order.order.order_id, user_id = %principal.user_id, "order created");
    Ok((StatusCode::CREATED, Json(order)))
}

// ---------------------------------------------------------------------------
// GET /api/orders
// ---------------------------------------------------------------------------

pub(crate) async fn my_orders(
    State(st): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let orders = orders::list_for_user(&st.pool, principal.user_id).await?;
    Ok(Json(orders))
}

// ---------------------------------------------------------------------------
// PUT /api/orders/cancel/:id
// ---------------------------------------------------------------------------

pub(crate) async fn cancel_order(
    State(st): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    match orders::cancel_for_user(&st.pool, order_id, principal.user_id).await? {
        orders::CancelOutcome::Cancelled(order) => {
            info!(order_id = %order_id, user_id = %principal.user_id, "order cancelled");
            Ok(Json(order))
        }
        orders::CancelOutcome::NotPending => Err(ApiError::InvalidTransition),
        orders::CancelOutcome::NotFound => Err(ApiError::NotFound("Order")),
    }
}

// ---------------------------------------------------------------------------
// GET /api/admin/products
// ---------------------------------------------------------------------------

pub(crate) async fn admin_list_products(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let products = products::list_products(&st.pool).await?;
    Ok(Json(products))
}

// ---------------------------------------------------------------------------
// POST /api/admin/products
// ---------------------------------------------------------------------------

pub(crate) async fn admin_create_product(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(body): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("Product name is required".to_string()));
    }

    let product = products::insert_product(&st.pool, &product_input(body)).await?;

    info!(product_id = %product.product_id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

// ---------------------------------------------------------------------------
// PUT /api/admin/products/:id
// ---------------------------------------------------------------------------

pub(crate) async fn admin_update_product(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(product_id): Path<Uuid>,
    Json(body): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = products::update_product(&st.pool, product_id, &product_input(body))
        .await?
        .ok_or(ApiError::NotFound("Product"))?;
    Ok(Json(product))
}

// ---------------------------------------------------------------------------
// DELETE /api/admin/products/:id
// ---------------------------------------------------------------------------

pub(crate) async fn admin_delete_product(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !products::delete_product(&st.pool, product_id).await? {
        return Err(ApiError::NotFound("Product"));
    }

    info!(product_id = %product_id, "product deleted");
    Ok(Json(MessageResponse {
        message: "Product deleted".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/admin/users
// ---------------------------------------------------------------------------

pub(crate) async fn admin_list_users(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let users = users::list_users(&st.pool).await?;
    Ok(Json(users))
}

// ---------------------------------------------------------------------------
// PUT /api/admin/users/:id
// ---------------------------------------------------------------------------

pub(crate) async fn admin_set_role(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = users::set_role(&st.pool, user_id, body.role)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    info!(user_id = %user_id, role = body.role.as_str(), "user role updated");
    Ok(Json(profile))
}

// ---------------------------------------------------------------------------
// GET /api/admin/orders
// ---------------------------------------------------------------------------

pub(crate) async fn admin_list_orders(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let orders = orders::list_all(&st.pool).await?;
    Ok(Json(orders))
}

// ---------------------------------------------------------------------------
// PUT /api/admin/orders/:id
// ---------------------------------------------------------------------------

/// Admin status overwrite. Accepts any state from the enum with no
/// transition-graph check — the user-side cancel restriction does not
/// apply to the admin actor (preserved asymmetry of the original system).
pub(crate) async fn admin_set_order_status(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(order_id): Path<Uuid>,
    Json(body): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = orders::set_status(&st.pool, order_id, body.status)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;

    info!(order_id = %order_id, status = body.status.as_str(), "order status updated");
    Ok(Json(order))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn product_input(body: ProductRequest) -> shopd_db::products::ProductInput {
    shopd_db::products::ProductInput {
        name: body.name,
        price: body.price,
        description: body.description,
        image: body.image,
        stock: body.stock,
        category: body.category,
    }
}
