use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_TOKEN: &str = "test-token";
pub const TOKEN_HEADER: &str = "x-api-token";
/// Subscribing to this list id fails with a plain-text 500.
pub const OUTAGE_LIST: &str = "outage";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub list_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type Db = Arc<RwLock<HashMap<String, Vec<Subscriber>>>>;

#[derive(Clone)]
pub struct AppState {
    token: Arc<str>,
    lists: Arc<Vec<List>>,
    db: Db,
}

pub fn seed_lists() -> Vec<List> {
    vec![
        List {
            id: "newsletter".to_string(),
            name: "Weekly newsletter".to_string(),
        },
        List {
            id: "product".to_string(),
            name: "Product updates".to_string(),
        },
    ]
}

/// Router accepting `DEFAULT_TOKEN`.
pub fn app() -> Router {
    app_with_token(DEFAULT_TOKEN)
}

pub fn app_with_token(token: &str) -> Router {
    let lists = seed_lists();
    let db: Db = Arc::new(RwLock::new(
        lists.iter().map(|l| (l.id.clone(), Vec::new())).collect(),
    ));
    let state = AppState {
        token: Arc::from(token),
        lists: Arc::new(lists),
        db,
    };
    let api = Router::new()
        .route("/lists", get(list_lists))
        .route("/lists/{id}/subscribers", post(subscribe))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_token(listener, DEFAULT_TOKEN).await
}

pub async fn run_with_token(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    info!("mock Bulletin API listening on {:?}", listener.local_addr());
    axum::serve(listener, app_with_token(token)).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// 401 when the token header is absent, 403 when it does not match.
async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(TOKEN_HEADER)
        .map(|v| v.to_str().unwrap_or_default().to_string());
    match presented {
        None => error(StatusCode::UNAUTHORIZED, "Unauthenticated."),
        Some(token) if token != *state.token => {
            debug!("rejecting request with unknown token");
            error(StatusCode::FORBIDDEN, "Forbidden.")
        }
        Some(_) => next.run(request).await,
    }
}

async fn list_lists(State(state): State<AppState>) -> Json<Vec<List>> {
    Json(state.lists.as_ref().clone())
}

async fn subscribe(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    if list_id == OUTAGE_LIST {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }

    let mut db = state.db.write().await;
    let Some(subscribers) = db.get_mut(&list_id) else {
        return error(StatusCode::NOT_FOUND, "List not found");
    };

    let field = |key: &str| {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_empty())
    };
    let Some(email) = field("email") else {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The email field is required.",
        );
    };
    if subscribers.iter().any(|s| s.email == email) {
        return error(StatusCode::CONFLICT, "Subscriber already exists");
    }

    let subscriber = Subscriber {
        id: Uuid::new_v4(),
        list_id,
        email,
        name: field("name"),
        tags: fields
            .iter()
            .filter(|(k, _)| k == "tags[]")
            .map(|(_, v)| v.clone())
            .collect(),
    };
    subscribers.push(subscriber.clone());
    Json(subscriber).into_response()
}
