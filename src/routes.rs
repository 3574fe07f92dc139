use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderName, Method},
    middleware::from_fn_with_state,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::SharedSecret;
use crate::database::ClassStore;
use crate::handlers::health::{health, HealthState};
use crate::handlers::{protected, public};
use crate::middleware::{require_shared_secret, PASSWORD_HEADER};

/// Path of the password check
pub const VERIFY_PATH: &str = "/verify-password";
/// Path of the gated data handler
pub const DATA_PATH: &str = "/api";

/// How long browsers may cache a preflight answer
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86400);

/// Which handlers a process serves. The data handler cannot be mounted without a store.
#[derive(Clone)]
pub enum Deployment {
    Auth,
    Data(Arc<dyn ClassStore>),
    All(Arc<dyn ClassStore>),
}

impl Deployment {
    fn serves_auth(&self) -> bool {
        matches!(self, Deployment::Auth | Deployment::All(_))
    }

    fn store(&self) -> Option<Arc<dyn ClassStore>> {
        match self {
            Deployment::Auth => None,
            Deployment::Data(store) | Deployment::All(store) => Some(Arc::clone(store)),
        }
    }
}

/// Build the service. `max_body_bytes` caps data handler bodies, which carry
/// uploaded files as data URLs.
pub fn app(secret: SharedSecret, deployment: Deployment, max_body_bytes: usize) -> Router {
    let store = deployment.store();

    let mut router = Router::new()
        .route("/", get(root))
        .merge(health_routes(store.clone()));

    if deployment.serves_auth() {
        router = router.nest(VERIFY_PATH, auth_routes(secret.clone()));
    }
    if let Some(store) = store {
        router = router.nest(DATA_PATH, data_routes(secret, store, max_body_bytes));
    }

    router.layer(TraceLayer::new_for_http())
}

/// Password check: POST verifies, anything but POST and OPTIONS is 405
pub fn auth_routes(secret: SharedSecret) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(PREFLIGHT_MAX_AGE);

    Router::new()
        .route(
            "/",
            post(public::verify_post).fallback(public::method_not_allowed),
        )
        .with_state(secret)
        .layer(cors)
}

/// Gated CRUD surface. Unmatched methods fall through to 400 after the gate.
///
/// The CORS layer is outermost: it answers preflights before the gate and
/// stamps the origin header on every other response, 401s included.
pub fn data_routes(
    secret: SharedSecret,
    store: Arc<dyn ClassStore>,
    max_body_bytes: usize,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(PASSWORD_HEADER)])
        .max_age(PREFLIGHT_MAX_AGE);

    Router::new()
        .route(
            "/",
            get(protected::snapshot_get)
                .post(protected::create_post)
                .put(protected::update_put)
                .delete(protected::delete_record)
                .fallback(protected::bad_request),
        )
        .with_state(protected::DataState { store })
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(from_fn_with_state(secret, require_shared_secret))
        .layer(cors)
}

fn health_routes(store: Option<Arc<dyn ClassStore>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(HealthState { store })
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "verify": format!("{} (POST)", VERIFY_PATH),
            "data": format!("{} (GET, POST, PUT, DELETE; X-Password required)", DATA_PATH),
            "health": "/health",
        }
    }))
}
