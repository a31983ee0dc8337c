use std::fmt::Display;

mod endpoints_action_item;
mod endpoints_agenda;
mod endpoints_auth;
mod endpoints_comment;
mod endpoints_feature;
mod endpoints_meeting;
mod endpoints_mom;
mod endpoints_room;
mod endpoints_topic;
#[cfg(test)]
mod tests;

use crate::auth_session::SessionToken;
use crate::data_store::StoreError;
use actix_web::error::JsonPayloadError;
use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    web, HttpResponse,
};
use serde_json::json;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(get_api_service());
}

fn get_api_service() -> actix_web::Scope {
    let json_config =
        web::JsonConfig::default().error_handler(|err, _req| APIError::InvalidJson(err).into());
    web::scope("/api/v1")
        .app_data(json_config)
        .service(endpoints_auth::login)
        .service(endpoints_auth::get_current_user)
        .service(endpoints_auth::get_user)
        .service(endpoints_room::list_rooms)
        .service(endpoints_room::list_available_rooms)
        .service(endpoints_room::get_room)
        .service(endpoints_room::create_room)
        .service(endpoints_room::change_room)
        .service(endpoints_room::delete_room)
        .service(endpoints_feature::list_features)
        .service(endpoints_feature::create_feature)
        .service(endpoints_feature::delete_feature)
        .service(endpoints_meeting::list_meetings)
        .service(endpoints_meeting::get_meeting)
        .service(endpoints_meeting::create_meeting)
        .service(endpoints_meeting::change_meeting)
        .service(endpoints_meeting::delete_meeting)
        .service(endpoints_meeting::change_meeting_status)
        .service(endpoints_meeting::add_attendees)
        .service(endpoints_meeting::remove_attendees)
        .service(endpoints_meeting::join_meeting)
        .service(endpoints_meeting::leave_meeting)
        .service(endpoints_meeting::list_my_meetings)
        .service(endpoints_meeting::list_upcoming_meetings)
        .service(endpoints_meeting::list_past_meetings)
        .service(endpoints_agenda::get_agenda)
        .service(endpoints_agenda::create_agenda)
        .service(endpoints_agenda::create_or_update_agenda)
        .service(endpoints_agenda::delete_agenda)
        .service(endpoints_topic::list_topics)
        .service(endpoints_topic::create_topic)
        .service(endpoints_topic::change_topic)
        .service(endpoints_topic::delete_topic)
        .service(endpoints_topic::reorder_topics)
        .service(endpoints_topic::assign_topic_owner)
        .service(endpoints_topic::list_my_topics)
        .service(endpoints_mom::list_mom_entries)
        .service(endpoints_mom::change_mom_entry)
        .service(endpoints_action_item::list_action_items)
        .service(endpoints_action_item::create_action_item)
        .service(endpoints_action_item::change_action_item)
        .service(endpoints_action_item::delete_action_item)
        .service(endpoints_action_item::change_action_item_status)
        .service(endpoints_action_item::assign_action_item)
        .service(endpoints_comment::list_comments)
        .service(endpoints_comment::create_comment)
        .service(endpoints_comment::delete_comment)
}

#[derive(Debug)]
pub enum APIError {
    NotExisting,
    AlreadyExisting,
    RoomUnavailable,
    PermissionDenied { action: &'static str },
    NoSessionToken,
    InvalidSessionToken,
    AuthenticationFailed,
    InvalidJson(actix_web::error::JsonPayloadError),
    InvalidData(String),
    TransactionConflict,
    InternalError(String),
}

impl Display for APIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotExisting => f.write_str("Element does not exist")?,
            Self::AlreadyExisting => {
                f.write_str("Element already exists")?;
            }
            Self::RoomUnavailable => {
                f.write_str("The room is already booked for an overlapping meeting in the requested time window.")?;
            }
            Self::PermissionDenied { action } => {
                write!(f, "Client is not authorized to {}.", action)?;
            }
            Self::NoSessionToken => {
                f.write_str("This action requires authentication, but client did not send authentication session token.")?
            }
            Self::InvalidSessionToken => {
                f.write_str("This action requires authentication, but client authentication session given by the client is not valid.")?
            }
            Self::AuthenticationFailed => {
                f.write_str("Authentication with the given credentials failed.")?;
            }
            Self::InternalError(s) => {
                f.write_str("Internal error: ")?;
                f.write_str(s)?;
            }
            Self::InvalidJson(e) => {
                write!(f, "Invalid JSON request data: {}", e)?;
            }
            Self::InvalidData(e) => {
                write!(f, "Invalid request data: {}", e)?;
            }
            Self::TransactionConflict => {
                f.write_str("Concurrent database transaction conflict. Please retry request.")?;
            }
        };
        Ok(())
    }
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse {
        let message = format!("{}", self);

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({
                "httpCode": self.status_code().as_u16(),
                "message": message
            }))
    }
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotExisting => StatusCode::NOT_FOUND,
            Self::AlreadyExisting => StatusCode::CONFLICT,
            Self::RoomUnavailable => StatusCode::CONFLICT,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::NoSessionToken => StatusCode::FORBIDDEN,
            Self::InvalidSessionToken => StatusCode::FORBIDDEN,
            Self::AuthenticationFailed => StatusCode::FORBIDDEN,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidJson(e) => match e {
                JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                JsonPayloadError::Deserialize(json_error) if json_error.is_data() => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::BAD_REQUEST,
            },
            Self::InvalidData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TransactionConflict => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(error) => {
                Self::InternalError(format!("Could not connect to database: {}", error))
            }
            StoreError::QueryError(diesel_error) => Self::InternalError(format!(
                "Error while executing database query: {}",
                diesel_error
            )),
            StoreError::TransactionConflict => Self::TransactionConflict,
            StoreError::NotExisting => Self::NotExisting,
            StoreError::ConflictEntityExists => Self::AlreadyExisting,
            StoreError::RoomUnavailable => Self::RoomUnavailable,
            StoreError::PermissionDenied { action } => Self::PermissionDenied { action },
            StoreError::AuthenticationFailed => Self::AuthenticationFailed,
            StoreError::InvalidInputData(e) => Self::InvalidData(e),
            StoreError::InvalidDataInDatabase(e) => Self::InternalError(format!(
                "Data queried from database could not be deserialized: {}",
                e
            )),
        }
    }
}

impl From<actix_web::error::BlockingError> for APIError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        APIError::InternalError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    }
}

impl From<crate::auth_session::SessionError> for APIError {
    fn from(_e: crate::auth_session::SessionError) -> Self {
        APIError::InvalidSessionToken
    }
}

struct SessionTokenHeader(String);
const SESSION_TOKEN_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(30 * 86400);

impl SessionTokenHeader {
    fn session_token(
        &self,
        secret: &str,
    ) -> Result<crate::auth_session::SessionToken, crate::auth_session::SessionError> {
        SessionToken::from_string(&self.0, secret, SESSION_TOKEN_MAX_AGE)
    }
}

impl actix_web::http::header::TryIntoHeaderValue for SessionTokenHeader {
    type Error = actix_web::http::header::InvalidHeaderValue;

    fn try_into_value(self) -> Result<actix_web::http::header::HeaderValue, Self::Error> {
        self.0.parse()
    }
}

impl actix_web::http::header::Header for SessionTokenHeader {
    fn name() -> actix_web::http::header::HeaderName {
        "X-SESSION-TOKEN"
            .try_into()
            .expect("Session Token Header name should be a valid header name")
    }

    fn parse<M: actix_web::HttpMessage>(msg: &M) -> Result<Self, actix_web::error::ParseError> {
        Ok(Self(
            msg.headers()
                .get(Self::name())
                .ok_or(actix_web::error::ParseError::Header)?
                .to_str()
                .unwrap_or("")
                .to_owned(),
        ))
    }
}
