//! HTTP handlers for Products API

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, TooManyRequestsResponse,
        UnauthorizedResponse,
    },
    rate_limit_middleware, Caller, ConnectionRateLimiter,
};
use futures_util::{stream::BoxStream, Stream, StreamExt};
use utoipa::OpenApi;

use crate::args::{Args, InsertArgs, ProductIdArgs, UpdateNameArgs};
use crate::error::{ProductError, ProductResult};
use crate::live::ViewEvent;
use crate::models::{InsertedProduct, ProductView};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        insert,
        make_private,
        make_public,
        update_name,
        remove,
        public_products,
        private_products,
        watch_public,
        watch_private,
    ),
    components(
        schemas(ProductView, InsertedProduct, InsertArgs, ProductIdArgs, UpdateNameArgs),
        responses(
            BadRequestValidationResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            ConflictResponse,
            TooManyRequestsResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product list commands and visibility queries")
    )
)]
pub struct ApiDoc;

/// Create the products router.
///
/// Commands are throttled per connection by `limiter`; queries and live
/// views are not.
pub fn router<R: ProductRepository + 'static>(
    service: ProductService<R>,
    limiter: ConnectionRateLimiter,
) -> Router {
    let shared_service = Arc::new(service);

    let commands = Router::new()
        .route("/insert", post(insert))
        .route("/make-private", post(make_private))
        .route("/make-public", post(make_public))
        .route("/update-name", post(update_name))
        .route("/remove", post(remove))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

    Router::new()
        .merge(commands)
        .route("/public", get(public_products))
        .route("/private", get(private_products))
        .route("/public/live", get(watch_public))
        .route("/private/live", get(watch_private))
        .with_state(shared_service)
}

/// Create a public product with a default name
#[utoipa::path(
    post,
    path = "/insert",
    tag = "Products",
    request_body = InsertArgs,
    responses(
        (status = 201, description = "Product created", body = InsertedProduct),
        (status = 400, response = BadRequestValidationResponse),
        (status = 429, response = TooManyRequestsResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn insert<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Args(args): Args<InsertArgs>,
) -> ProductResult<impl IntoResponse> {
    let product_id = service.insert(&args.locale).await?;
    Ok((StatusCode::CREATED, Json(InsertedProduct { product_id })))
}

/// Make a product private to the caller
#[utoipa::path(
    post,
    path = "/make-private",
    tag = "Products",
    request_body = ProductIdArgs,
    responses(
        (status = 204, description = "Product is private"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 429, response = TooManyRequestsResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn make_private<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    caller: Caller,
    Args(args): Args<ProductIdArgs>,
) -> ProductResult<StatusCode> {
    service.make_private(caller.user_id(), &args.product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Make a product public
#[utoipa::path(
    post,
    path = "/make-public",
    tag = "Products",
    request_body = ProductIdArgs,
    responses(
        (status = 204, description = "Product is public"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 429, response = TooManyRequestsResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn make_public<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    caller: Caller,
    Args(args): Args<ProductIdArgs>,
) -> ProductResult<StatusCode> {
    service.make_public(caller.user_id(), &args.product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rename a product
#[utoipa::path(
    post,
    path = "/update-name",
    tag = "Products",
    request_body = UpdateNameArgs,
    responses(
        (status = 204, description = "Product renamed"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 429, response = TooManyRequestsResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_name<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    caller: Caller,
    Args(args): Args<UpdateNameArgs>,
) -> ProductResult<StatusCode> {
    service
        .update_name(caller.user_id(), &args.product_id, &args.new_name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a product
#[utoipa::path(
    post,
    path = "/remove",
    tag = "Products",
    request_body = ProductIdArgs,
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 429, response = TooManyRequestsResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn remove<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    caller: Caller,
    Args(args): Args<ProductIdArgs>,
) -> ProductResult<StatusCode> {
    service.remove(caller.user_id(), &args.product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List public products
#[utoipa::path(
    get,
    path = "/public",
    tag = "Products",
    responses(
        (status = 200, description = "Public products", body = Vec<ProductView>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn public_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> ProductResult<Json<Vec<ProductView>>> {
    Ok(Json(service.public_products().await?))
}

/// List the caller's private products
#[utoipa::path(
    get,
    path = "/private",
    tag = "Products",
    responses(
        (
            status = 200,
            description = "The caller's private products; empty when anonymous",
            body = Vec<ProductView>
        ),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn private_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    caller: Caller,
) -> ProductResult<Json<Vec<ProductView>>> {
    Ok(Json(service.private_products(caller.user_id()).await?))
}

/// Live public products (server-sent events)
///
/// Events: `ready` and `reset` carry the full list, `added` and `changed`
/// one product, `removed` its `{ "id" }`.
#[utoipa::path(
    get,
    path = "/public/live",
    tag = "Products",
    responses(
        (
            status = 200,
            description = "SSE stream of ready/added/changed/removed/reset events",
            content_type = "text/event-stream"
        )
    )
)]
async fn watch_public<R: ProductRepository + 'static>(
    State(service): State<Arc<ProductService<R>>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse_response(service.watch_public())
}

/// Live private products of the caller (server-sent events)
#[utoipa::path(
    get,
    path = "/private/live",
    tag = "Products",
    responses(
        (
            status = 200,
            description = "SSE stream of ready/added/changed/removed/reset events",
            content_type = "text/event-stream"
        )
    )
)]
async fn watch_private<R: ProductRepository + 'static>(
    State(service): State<Arc<ProductService<R>>>,
    caller: Caller,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse_response(service.watch_private(caller.user_id()))
}

fn sse_response(
    mut events: BoxStream<'static, ProductResult<ViewEvent>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    yield Ok(Event::default()
                        .event(event.name())
                        .data(event.payload().to_string()));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Live view failed");
                    yield Ok(error_event(&e));
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn error_event(error: &ProductError) -> Event {
    let payload = serde_json::json!({
        "reason": error.reason(),
        "message": error.client_message(),
    });
    Event::default().event("error").data(payload.to_string())
}
