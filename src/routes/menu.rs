use axum::{extract::State, Json};
use serde_json::Value;

use super::{response::records_into_json, AppState};
use crate::database::store::find_all;
use crate::database::structures::MenuItem;
use crate::error::AppError;

pub async fn list_menu(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let items: Vec<MenuItem> = find_all(state.store.as_ref(), None).await?;

    Ok(Json(records_into_json(items)?))
}
