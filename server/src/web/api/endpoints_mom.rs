use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{get, patch, web, HttpResponse, Responder};

#[get("/meetings/{meeting_id}/mom-entries")]
async fn list_mom_entries(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let entries: Vec<boardroom_api_types::MomEntry> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_mom_entries(meeting_id)?)
    })
    .await??
    .into_iter()
    .map(|e| e.into())
    .collect();
    Ok(web::Json(entries))
}

#[patch("/mom-entries/{mom_entry_id}")]
async fn change_mom_entry(
    path: web::Path<i32>,
    data: web::Json<boardroom_api_types::MomEntryPatch>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let mom_entry_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let patch = data.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.update_mom_entry(&actor, mom_entry_id, patch.into())?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}
