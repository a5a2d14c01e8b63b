use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use mongodb::bson::{self, doc, Bson, Document};
use serde::Serialize;
use serde_json::Value;

use super::{
    response::{bson_as_json, records_into_json, Mutation},
    AppState,
};
use crate::database::identifier::{resolve_filter, PRIMARY_KEY};
use crate::database::store::{find_all, DeleteOutcome, UpdateOutcome};
use crate::database::structures::{CollectionName, NewPlayer, Player, PlayerProfile};
use crate::database::StoreError;
use crate::error::AppError;

const NOT_FOUND: &str = "Player not found";
const DUPLICATE_EMAIL: &str = "A player with this email already exists";
const REQUIRED_FIELDS: &str = "Name and email are required";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCreated {
    message: &'static str,
    #[serde(serialize_with = "bson_as_json")]
    inserted_id: Bson,
}

fn email_conflict(error: StoreError) -> AppError {
    match error {
        StoreError::DuplicateKey(_) => AppError::Conflict(DUPLICATE_EMAIL.to_string()),
        other => other.into(),
    }
}

pub async fn create_player(
    State(state): State<AppState>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<(StatusCode, Json<PlayerCreated>), AppError> {
    let Json(body) = payload?;
    let player = NewPlayer::new(body, Utc::now())
        .ok_or_else(|| AppError::Validation(REQUIRED_FIELDS.to_string()))?;

    // Fast path only, the unique index on email is what actually holds
    // under concurrent signups
    let existing = state
        .store
        .find_one(Player::collection_name(), doc! { "email": player.email() })
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
    }

    let outcome = state
        .store
        .insert_one(Player::collection_name(), player.into_document())
        .await
        .map_err(email_conflict)?;

    tracing::info!("Player {:?} registered", outcome.inserted_id);
    Ok((
        StatusCode::CREATED,
        Json(PlayerCreated {
            message: "Player added successfully",
            inserted_id: outcome.inserted_id,
        }),
    ))
}

pub async fn list_players(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let players: Vec<Player> = find_all(state.store.as_ref(), Some(doc! { "name": 1 })).await?;

    Ok(Json(records_into_json(players)?))
}

/// Overwrites every profile field; fields missing from the body become `null`
pub async fn update_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<Mutation<UpdateOutcome>>, AppError> {
    let Json(body) = payload?;
    let profile: PlayerProfile = bson::from_document(body).map_err(|e| {
        tracing::warn!("Payload does not fit the player profile: {e}");
        AppError::MalformedPayload
    })?;

    let result = state
        .store
        .update_one(
            Player::collection_name(),
            resolve_filter(&id, PRIMARY_KEY),
            profile.into_set_document()?,
        )
        .await
        .map_err(email_conflict)?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }

    Ok(Json(Mutation {
        message: "Player updated successfully",
        result,
    }))
}

/// `id` is either the player's ObjectId or their email
pub async fn delete_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Mutation<DeleteOutcome>>, AppError> {
    let result = state
        .store
        .delete_one(Player::collection_name(), resolve_filter(&id, "email"))
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }

    tracing::info!("Player {} deleted", id);
    Ok(Json(Mutation {
        message: "Player deleted successfully",
        result,
    }))
}
