//! API route definitions
//!
//! Routes are registered with their full path so the matched route template
//! equals the operation key in the [`RoleRegistry`].

use crate::auth::middleware::{authenticate, authorize_roles};
use crate::auth::{Operation, RoleRegistry};
use crate::handlers::auth;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use evently_core::Role;
use std::sync::Arc;

pub const REGISTER: &str = "/auth/register";
pub const LOGIN: &str = "/auth/login";
pub const RESET_PASSWORD: &str = "/auth/reset-password";
pub const PROFILE: &str = "/auth/profile";
pub const ADMIN_TEST: &str = "/auth/admin-test";
pub const ORGANIZER_TEST: &str = "/auth/Organizer-test";
pub const CUSTOMER_TEST: &str = "/auth/Customer-test";

/// Lowercase aliases of the role test routes
pub const ORGANIZER_TEST_ALIAS: &str = "/auth/organizer-test";
pub const CUSTOMER_TEST_ALIAS: &str = "/auth/customer-test";

/// Declare which roles may call each protected operation
pub fn register_role_requirements(roles: &RoleRegistry) {
    let staff = [Role::Admin, Role::Organizer];

    roles.require_roles(Operation::get(ADMIN_TEST), [Role::Admin]);
    roles.require_roles(Operation::get(ORGANIZER_TEST), staff);
    roles.require_roles(Operation::get(ORGANIZER_TEST_ALIAS), staff);
    roles.require_roles(Operation::get(CUSTOMER_TEST), [Role::Customer]);
    roles.require_roles(Operation::get(CUSTOMER_TEST_ALIAS), [Role::Customer]);
}

/// Create the `/auth` routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route(REGISTER, post(auth::register_handler))
        .route(LOGIN, post(auth::login_handler))
        .route(RESET_PASSWORD, post(auth::reset_password_handler));

    // Protected routes: route layers run bottom-up, so authentication
    // precedes authorization
    let protected_routes = Router::new()
        .route(PROFILE, get(auth::profile_handler))
        .route(ADMIN_TEST, get(auth::admin_test_handler))
        .route(ORGANIZER_TEST, get(auth::organizer_test_handler))
        .route(ORGANIZER_TEST_ALIAS, get(auth::organizer_test_handler))
        .route(CUSTOMER_TEST, get(auth::customer_test_handler))
        .route(CUSTOMER_TEST_ALIAS, get(auth::customer_test_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), authorize_roles))
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    Router::new().merge(public_routes).merge(protected_routes)
}
