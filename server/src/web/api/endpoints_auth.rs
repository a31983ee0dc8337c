use crate::auth_session::SessionToken;
use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{get, post, web, Responder};
use boardroom_api_types::{LoginRequest, LoginResponse};

#[post("/auth/login")]
async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let secret = state.secret.clone();
    let user = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.authenticate_user(&body.email, &body.password)?)
    })
    .await??;

    let session_token = SessionToken::new(user.id).to_string(&secret);
    Ok(web::Json(LoginResponse {
        session_token,
        user: user.into(),
    }))
}

#[get("/auth/me")]
async fn get_current_user(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let user: boardroom_api_types::User = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let actor = store.get_actor_for_session(&session_token)?;
        Ok(store.get_user(actor.user_id())?)
    })
    .await??
    .into();
    Ok(web::Json(user))
}

#[get("/users/{user_id}")]
async fn get_user(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let user_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let user: boardroom_api_types::User = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.get_actor_for_session(&session_token)?;
        Ok(store.get_user(user_id)?)
    })
    .await??
    .into();
    Ok(web::Json(user))
}
