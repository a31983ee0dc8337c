use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde_json::json;

#[get("/meetings/{meeting_id}/comments")]
async fn list_comments(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let comments: Vec<boardroom_api_types::Comment> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_comments(meeting_id)?)
    })
    .await??
    .into_iter()
    .map(|c| c.into())
    .collect();
    Ok(web::Json(comments))
}

#[post("/meetings/{meeting_id}/comments")]
async fn create_comment(
    path: web::Path<i32>,
    data: web::Json<boardroom_api_types::NewComment>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let text = data.into_inner().text;
    if text.trim().is_empty() {
        return Err(APIError::InvalidData("text must not be empty".to_string()));
    }
    let comment_id = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        Ok(store.create_comment(&actor, meeting_id, text)?)
    })
    .await??;
    Ok(HttpResponse::Created().json(json!({ "id": comment_id })))
}

#[delete("/comments/{comment_id}")]
async fn delete_comment(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let comment_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.delete_comment(&actor, comment_id)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}
