use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde_json::json;

#[get("/features")]
async fn list_features(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let features: Vec<boardroom_api_types::Feature> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_features()?)
    })
    .await??
    .into_iter()
    .map(|f| f.into())
    .collect();
    Ok(web::Json(features))
}

#[post("/features")]
async fn create_feature(
    data: web::Json<boardroom_api_types::NewFeature>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let feature = data.into_inner();
    let feature_id = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        Ok(store.create_feature(&actor, feature.into())?)
    })
    .await??;
    Ok(HttpResponse::Created().json(json!({ "id": feature_id })))
}

#[delete("/features/{feature_id}")]
async fn delete_feature(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let feature_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        store.delete_feature(&actor, feature_id)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::NoContent())
}
