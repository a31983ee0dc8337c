use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::util::ActionItemFilterAsQuery;
use crate::web::AppState;
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use boardroom_api_types::{ActionItemAssignment, ActionItemStatusUpdate};
use serde_json::json;

#[get("/action-items")]
async fn list_action_items(
    query: web::Query<ActionItemFilterAsQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let items: Vec<boardroom_api_types::ActionItem> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_action_items(query.into_inner().into())?)
    })
    .await??
    .into_iter()
    .map(|i| i.into())
    .collect();
    Ok(web::Json(items))
}

#[post("/action-items")]
async fn create_action_item(
    data: web::Json<boardroom_api_types::NewActionItem>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let item = data.into_inner();
    let item_id = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        Ok(store.create_action_item(&actor, item.into())?)
    })
    .await??;
    Ok(HttpResponse::Created().json(json!({ "id": item_id })))
}

#[patch("/action-items/{item_id}")]
async fn change_action_item(
    path: web::Path<i32>,
    data: web::Json<boardroom_api_types::ActionItemPatch>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let item_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let patch = data.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.update_action_item(&actor, item_id, patch.into())?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[delete("/action-items/{item_id}")]
async fn delete_action_item(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let item_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.delete_action_item(&actor, item_id)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[put("/action-items/{item_id}/status")]
async fn change_action_item_status(
    path: web::Path<i32>,
    data: web::Json<ActionItemStatusUpdate>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let item_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let status = data.into_inner().status;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.update_action_item_status(&actor, item_id, status.into())?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[put("/action-items/{item_id}/assignee")]
async fn assign_action_item(
    path: web::Path<i32>,
    data: web::Json<ActionItemAssignment>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let item_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let assigned_to = data.into_inner().assigned_to;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.assign_action_item(&actor, item_id, assigned_to)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}
