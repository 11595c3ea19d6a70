use crate::envelope::Envelope;
use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use querygate::{GatewayError, TranslateError};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Query parameters shared by the search routes
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Document field to search
    #[serde(default)]
    pub key: Option<String>,

    /// Number, pattern or free-form query, depending on the route
    #[serde(default)]
    pub value: Option<String>,
}

fn required<'a>(param: &'a Option<String>, name: &'static str) -> Result<&'a str, GatewayError> {
    param
        .as_deref()
        .ok_or_else(|| TranslateError::MissingParameter(name).into())
}

type Documents = ServerResult<Envelope<Vec<Value>>>;

/// Connectivity check
pub async fn test() -> Envelope<&'static str> {
    Envelope::success("youve hit /test")
}

/// Echo the JSON body back
pub async fn post_test(body: Result<Json<Value>, JsonRejection>) -> ServerResult<Envelope<Value>> {
    let Json(body) = body?;
    Ok(Envelope::success(body))
}

/// Exact numeric match: `GET /get?key=start_price&value=100`
pub async fn get(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Documents {
    let Query(params) = params?;
    let key = required(&params.key, "key")?;
    let value = required(&params.value, "value")?;
    let documents = state.gateway.exact(key, value).await?;
    Ok(Envelope::success(documents))
}

/// Case-insensitive regex match: `GET /getRegex?key=title&value=red`
pub async fn get_regex(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Documents {
    let Query(params) = params?;
    let key = required(&params.key, "key")?;
    let value = required(&params.value, "value")?;
    let documents = state.gateway.regex(key, value).await?;
    Ok(Envelope::success(documents))
}

/// AI-derived regex on one field
pub async fn get_ai_assist(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Documents {
    let Query(params) = params?;
    let key = required(&params.key, "key")?;
    let value = required(&params.value, "value")?;
    let documents = state.gateway.ai_assisted(Some(key), value).await?;
    Ok(Envelope::success(documents))
}

/// AI-derived regex over title and description; `key` is ignored
pub async fn get_ai_assist_title_and_description(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Documents {
    let Query(params) = params?;
    let value = required(&params.value, "value")?;
    let documents = state.gateway.ai_assisted(None, value).await?;
    Ok(Envelope::success(documents))
}

/// The request body is the filter
pub async fn post_get(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Documents {
    let Json(body) = body?;
    let documents = state.gateway.passthrough(body).await?;
    Ok(Envelope::success(documents))
}

/// Every document in the collection
pub async fn get_all(State(state): State<Arc<ServerState>>) -> Documents {
    let documents = state.gateway.all().await?;
    Ok(Envelope::success(documents))
}
