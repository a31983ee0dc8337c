use crate::data_store::models;
use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::util::MeetingFilterAsQuery;
use crate::web::AppState;
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use boardroom_api_types::{AttendeeList, MeetingStatusUpdate};

#[get("/meetings")]
async fn list_meetings(
    query: web::Query<MeetingFilterAsQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let meetings: Vec<boardroom_api_types::Meeting> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_meetings(query.into_inner().into())?)
    })
    .await??
    .into_iter()
    .map(|m| m.into())
    .collect();
    Ok(web::Json(meetings))
}

#[get("/meetings/{meeting_id}")]
async fn get_meeting(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let meeting: boardroom_api_types::Meeting = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_meeting(meeting_id)?)
    })
    .await??
    .into();
    Ok(web::Json(meeting))
}

#[post("/meetings")]
async fn create_meeting(
    data: web::Json<boardroom_api_types::NewMeeting>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let new_meeting = data.into_inner();
    if new_meeting.end_time <= new_meeting.start_time {
        return Err(APIError::InvalidData(
            "end_time must be later than start_time".to_string(),
        ));
    }
    if new_meeting.date < chrono::Local::now().date_naive() {
        return Err(APIError::InvalidData(
            "date must not lie in the past".to_string(),
        ));
    }
    let meeting: boardroom_api_types::Meeting = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        let attendee_ids = new_meeting.attendees.clone();
        let meeting_id = store.create_meeting(
            &actor,
            models::NewMeeting::from_api(new_meeting, actor.user_id()),
            attendee_ids,
        )?;
        Ok(store.get_meeting(meeting_id)?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(meeting))
}

#[patch("/meetings/{meeting_id}")]
async fn change_meeting(
    path: web::Path<i32>,
    data: web::Json<boardroom_api_types::MeetingPatch>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let patch = data.into_inner();
    // The effective time window (patch combined with stored values) is validated by the store
    if let (Some(start_time), Some(end_time)) = (patch.start_time, patch.end_time) {
        if end_time <= start_time {
            return Err(APIError::InvalidData(
                "end_time must be later than start_time".to_string(),
            ));
        }
    }
    let meeting: boardroom_api_types::Meeting = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.update_meeting(&actor, meeting_id, patch.into())?;
        Ok(store.get_meeting(meeting_id)?)
    })
    .await??
    .into();
    Ok(web::Json(meeting))
}

#[delete("/meetings/{meeting_id}")]
async fn delete_meeting(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.delete_meeting(&actor, meeting_id)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[put("/meetings/{meeting_id}/status")]
async fn change_meeting_status(
    path: web::Path<i32>,
    data: web::Json<MeetingStatusUpdate>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let status = data.into_inner().status;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.update_meeting_status(&actor, meeting_id, status.into())?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[post("/meetings/{meeting_id}/attendees")]
async fn add_attendees(
    path: web::Path<i32>,
    data: web::Json<AttendeeList>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let attendee_ids = data.into_inner().attendees;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.add_attendees(&actor, meeting_id, attendee_ids)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[delete("/meetings/{meeting_id}/attendees")]
async fn remove_attendees(
    path: web::Path<i32>,
    data: web::Json<AttendeeList>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let attendee_ids = data.into_inner().attendees;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.remove_attendees(&actor, meeting_id, attendee_ids)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[post("/meetings/{meeting_id}/join")]
async fn join_meeting(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.set_own_attendance(&actor, meeting_id, models::AttendanceStatus::Accepted)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[post("/meetings/{meeting_id}/leave")]
async fn leave_meeting(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let meeting_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        // Leaving reverts the attendee record to "invited" instead of removing it, so the
        // invitation itself stays visible
        store.set_own_attendance(&actor, meeting_id, models::AttendanceStatus::Invited)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[get("/my/meetings")]
async fn list_my_meetings(
    query: web::Query<MeetingFilterAsQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let meetings: Vec<boardroom_api_types::Meeting> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        Ok(store.get_meetings_for_user(actor.user_id(), query.into_inner().into())?)
    })
    .await??
    .into_iter()
    .map(|m| m.into())
    .collect();
    Ok(web::Json(meetings))
}

#[get("/my/meetings/upcoming")]
async fn list_upcoming_meetings(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let meetings: Vec<boardroom_api_types::Meeting> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        Ok(store.get_upcoming_meetings(actor.user_id(), chrono::Local::now().naive_local())?)
    })
    .await??
    .into_iter()
    .map(|m| m.into())
    .collect();
    Ok(web::Json(meetings))
}

#[get("/my/meetings/past")]
async fn list_past_meetings(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let meetings: Vec<boardroom_api_types::Meeting> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        Ok(store.get_past_meetings(actor.user_id(), chrono::Local::now().naive_local())?)
    })
    .await??
    .into_iter()
    .map(|m| m.into())
    .collect();
    Ok(web::Json(meetings))
}
