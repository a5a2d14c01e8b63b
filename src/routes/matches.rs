use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use mongodb::bson::{doc, Document};
use serde_json::Value;

use super::{
    response::{records_into_json, Mutation},
    AppState,
};
use crate::database::identifier::{resolve_filter, PRIMARY_KEY};
use crate::database::store::{find_all, DeleteOutcome, InsertOutcome, UpdateOutcome};
use crate::database::structures::{CollectionName, Match};
use crate::error::AppError;

const NOT_FOUND: &str = "Match not found";

/// Newest first. Store assigned ObjectIds start with their creation time,
/// so descending `_id` is insertion order reversed.
pub async fn list_matches(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let matches: Vec<Match> = find_all(state.store.as_ref(), Some(doc! { PRIMARY_KEY: -1 })).await?;

    Ok(Json(records_into_json(matches)?))
}

pub async fn create_match(
    State(state): State<AppState>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<InsertOutcome>, AppError> {
    let Json(body) = payload?;

    let outcome = state
        .store
        .insert_one(Match::collection_name(), Match::from(body).into())
        .await?;

    tracing::info!("Match {:?} created", outcome.inserted_id);
    Ok(Json(outcome))
}

pub async fn update_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<Mutation<UpdateOutcome>>, AppError> {
    let Json(body) = payload?;
    let update = Match::from(body).into_set_document();

    let result = state
        .store
        .update_one(Match::collection_name(), resolve_filter(&id, PRIMARY_KEY), update)
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }

    Ok(Json(Mutation {
        message: "Match updated successfully",
        result,
    }))
}

pub async fn delete_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Mutation<DeleteOutcome>>, AppError> {
    let result = state
        .store
        .delete_one(Match::collection_name(), resolve_filter(&id, PRIMARY_KEY))
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }

    tracing::info!("Match {} deleted", id);
    Ok(Json(Mutation {
        message: "Match deleted successfully",
        result,
    }))
}
