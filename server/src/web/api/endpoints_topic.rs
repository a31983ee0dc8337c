use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use boardroom_api_types::{NewAgendaTopic, TopicOwnerAssignment, TopicReorder};
use serde_json::json;

#[get("/agendas/{agenda_id}/topics")]
async fn list_topics(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let agenda_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let topics: Vec<boardroom_api_types::AgendaTopic> =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            store.get_actor_for_session(&session_token)?;
            Ok(store.get_topics(agenda_id)?)
        })
        .await??
        .into_iter()
        .map(|t| t.into())
        .collect();
    Ok(web::Json(topics))
}

#[post("/agendas/{agenda_id}/topics")]
async fn create_topic(
    path: web::Path<i32>,
    data: web::Json<NewAgendaTopic>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let agenda_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let topic = data.into_inner();
    let topic_id = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        Ok(store.create_topic(
            &actor,
            agenda_id,
            topic.title,
            topic.description,
            topic.estimated_duration,
            topic.order,
        )?)
    })
    .await??;
    Ok(HttpResponse::Created().json(json!({ "id": topic_id })))
}

#[patch("/topics/{topic_id}")]
async fn change_topic(
    path: web::Path<i32>,
    data: web::Json<boardroom_api_types::AgendaTopicPatch>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let topic_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let patch = data.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.update_topic(&actor, topic_id, patch.into())?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[delete("/topics/{topic_id}")]
async fn delete_topic(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let topic_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.delete_topic(&actor, topic_id)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[put("/agendas/{agenda_id}/topics/order")]
async fn reorder_topics(
    path: web::Path<i32>,
    data: web::Json<TopicReorder>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let agenda_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let orders: Vec<(i32, i32)> = data
        .into_inner()
        .topics
        .into_iter()
        .map(|t| (t.id, t.order))
        .collect();
    let topics: Vec<boardroom_api_types::AgendaTopic> =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            let actor = store.get_actor_for_session(&session_token)?;
            Ok(store.reorder_topics(&actor, agenda_id, orders)?)
        })
        .await??
        .into_iter()
        .map(|t| t.into())
        .collect();
    Ok(web::Json(topics))
}

#[put("/topics/{topic_id}/owner")]
async fn assign_topic_owner(
    path: web::Path<i32>,
    data: web::Json<TopicOwnerAssignment>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let topic_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let owner_id = data.into_inner().owner_id;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.assign_topic_owner(&actor, topic_id, owner_id)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}

#[get("/my/topics")]
async fn list_my_topics(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let topics: Vec<boardroom_api_types::AgendaTopic> =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            let actor = store.get_actor_for_session(&session_token)?;
            Ok(store.get_topics_for_owner(actor.user_id())?)
        })
        .await??
        .into_iter()
        .map(|t| t.into())
        .collect();
    Ok(web::Json(topics))
}
