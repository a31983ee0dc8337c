use crate::data_store::models;
use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::util::AvailabilityQuery;
use crate::web::AppState;
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};

#[get("/rooms")]
async fn list_rooms(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let rooms: Vec<boardroom_api_types::Room> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_rooms()?)
    })
    .await??
    .into_iter()
    .map(|r| r.into())
    .collect();
    Ok(web::Json(rooms))
}

#[get("/rooms/available")]
async fn list_available_rooms(
    query: web::Query<AvailabilityQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let query = query.into_inner();
    if query.end_time <= query.start_time {
        return Err(APIError::InvalidData(
            "end_time must be later than start_time".to_string(),
        ));
    }
    let rooms: Vec<boardroom_api_types::Room> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_available_rooms(query.date, query.start_time, query.end_time)?)
    })
    .await??
    .into_iter()
    .map(|r| r.into())
    .collect();
    Ok(web::Json(rooms))
}

#[get("/rooms/{room_id}")]
async fn get_room(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let room: boardroom_api_types::Room = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_room(room_id)?)
    })
    .await??
    .into();
    Ok(web::Json(room))
}

#[post("/rooms")]
async fn create_room(
    data: web::Json<boardroom_api_types::NewRoom>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let new_room = data.into_inner();
    let room: boardroom_api_types::Room = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        let feature_ids = new_room.features.clone();
        let room_id = store.create_room(&actor, new_room.into(), feature_ids)?;
        Ok(store.get_room(room_id)?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(room))
}

#[patch("/rooms/{room_id}")]
async fn change_room(
    path: web::Path<i32>,
    data: web::Json<boardroom_api_types::RoomPatch>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let patch = data.into_inner();
    let room: boardroom_api_types::Room = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        let feature_ids = patch.features.clone();
        store.update_room(&actor, room_id, models::RoomPatch::from(patch), feature_ids)?;
        Ok(store.get_room(room_id)?)
    })
    .await??
    .into();
    Ok(web::Json(room))
}

#[delete("/rooms/{room_id}")]
async fn delete_room(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.delete_room(&actor, room_id)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}
