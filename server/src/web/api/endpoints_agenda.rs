use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use boardroom_api_types::AgendaUpsert;

#[get("/meetings/{meeting_id}/agenda")]
async fn get_agenda(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let agenda: boardroom_api_types::Agenda = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_agenda_for_meeting(meeting_id)?)
    })
    .await??
    .into();
    Ok(web::Json(agenda))
}

#[post("/meetings/{meeting_id}/agenda")]
async fn create_agenda(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let agenda: boardroom_api_types::Agenda = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.create_agenda(&actor, meeting_id)?;
        Ok(store.get_agenda_for_meeting(meeting_id)?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(agenda))
}

#[put("/meetings/{meeting_id}/agenda")]
async fn create_or_update_agenda(
    path: web::Path<i32>,
    data: web::Json<AgendaUpsert>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let upsert = data.into_inner();
    let created = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        Ok(store.create_or_update_agenda(&actor, meeting_id, upsert.title, upsert.description)?)
    })
    .await??;

    if created {
        Ok(HttpResponse::Created())
    } else {
        Ok(HttpResponse::NoContent())
    }
}

#[delete("/agendas/{agenda_id}")]
async fn delete_agenda(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let agenda_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.delete_agenda(&actor, agenda_id)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}
