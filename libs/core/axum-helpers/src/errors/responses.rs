//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Bad Request - arguments failed validation",
    content_type = "application/json",
    example = json!({
        "code": 1001,
        "error": "VALIDATION_ERROR",
        "reason": "validation-error",
        "message": "productId is invalid: expected String",
        "details": { "field": "productId", "expected": "String" }
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Unauthorized - a logged-in caller is required",
    content_type = "application/json",
    example = json!({
        "code": 1006,
        "error": "UNAUTHORIZED",
        "reason": "api.products.makePrivate.notLoggedIn",
        "message": "Must be logged in to make private products."
    })
)]
pub struct UnauthorizedResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Forbidden - the caller cannot edit this resource",
    content_type = "application/json",
    example = json!({
        "code": 1007,
        "error": "FORBIDDEN",
        "reason": "api.products.updateName.accessDenied",
        "message": "You don't have permission to edit this product."
    })
)]
pub struct ForbiddenResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "code": 1004,
        "error": "NOT_FOUND",
        "reason": "api.products.remove.notFound",
        "message": "Product not found"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Conflict - the request would break an invariant or lost a race",
    content_type = "application/json",
    example = json!({
        "code": 1008,
        "error": "CONFLICT",
        "reason": "api.products.remove.lastPublicProduct",
        "message": "Cannot delete the last public product."
    })
)]
pub struct ConflictResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Too Many Requests - per-connection rate limit exceeded",
    content_type = "application/json",
    example = json!({
        "code": 1012,
        "error": "TOO_MANY_REQUESTS",
        "reason": "too-many-requests",
        "message": "Too many requests, slow down"
    })
)]
pub struct TooManyRequestsResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "code": 1005,
        "error": "INTERNAL_ERROR",
        "message": "An internal server error occurred"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);
