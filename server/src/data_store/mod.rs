//! The backend part of the backend: the database interface
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [BoardroomStore] trait. This object can be shared between threads in a
//! global application state and be used to create [BoardroomStoreFacade] instances for interaction
//! with the database. These provide a CRUD-like interface, using the data models from the [models]
//! module.
//!
//! The primary implementation of [BoardroomStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool and its corresponding [BoardroomStoreFacade] objects
//! ([postgres::PgDataStoreFacade]) hold a reference to one pooled connection each, using the Diesel
//! query DSL for implementing the database interaction.
//!
//! There is also a mock implementation for unittests.

use crate::auth_session::SessionToken;
use crate::cli_error::CliError;
use crate::cli_error::CliError::UnexpectedStoreError;
use crate::setup;
use actor::Actor;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::Debug;

pub mod actor;
pub mod credentials;
pub mod models;
mod postgres;
pub mod scheduling;
mod schema;
#[cfg(test)]
pub mod store_mock;

/// Get a [BoardroomStore] instance, according to the "DATABASE_URL" environment variable.
///
/// The DATABASE_URL must be a PostgreSQL connection url, following the schema
/// "postgres://{user}:{password}@{host}/{database}".
pub fn get_store_from_env() -> Result<impl BoardroomStore, CliError> {
    postgres::PgDataStore::new(&setup::get_database_url_from_env()?)
        .map_err(|err| UnexpectedStoreError(err.to_string()))
}

pub type UserId = i32;
pub type RoomId = i32;
pub type FeatureId = i32;
pub type MeetingId = i32;
pub type AgendaId = i32;
pub type TopicId = i32;
pub type MomEntryId = i32;
pub type ActionItemId = i32;
pub type CommentId = i32;

pub trait BoardroomStoreFacade {
    /// Check the given login credentials and return the matching user.
    ///
    /// Fails with [StoreError::AuthenticationFailed] for an unknown email, a
    /// wrong password or a deactivated user, without distinguishing the three.
    fn authenticate_user(&mut self, email: &str, password: &str)
        -> Result<models::User, StoreError>;

    /// Get an [Actor] instance for a client, representing the authenticated user's identity and
    /// admin capability. Fails if the session's user no longer exists or has been deactivated.
    fn get_actor_for_session(&mut self, session_token: &SessionToken)
        -> Result<Actor, StoreError>;

    fn get_user(&mut self, user_id: UserId) -> Result<models::User, StoreError>;
    /// List all user accounts, including deactivated ones. Requires admin capability.
    fn get_users(&mut self, actor: &Actor) -> Result<Vec<models::User>, StoreError>;
    /// Create a new user account. Used by the CLI bootstrap command and admin tooling.
    fn create_user(&mut self, actor: &Actor, user: models::NewUser) -> Result<UserId, StoreError>;

    fn get_rooms(&mut self) -> Result<Vec<models::FullRoom>, StoreError>;
    fn get_room(&mut self, room_id: RoomId) -> Result<models::FullRoom, StoreError>;
    fn create_room(
        &mut self,
        actor: &Actor,
        room: models::NewRoom,
        feature_ids: Vec<FeatureId>,
    ) -> Result<RoomId, StoreError>;
    fn update_room(
        &mut self,
        actor: &Actor,
        room_id: RoomId,
        room: models::RoomPatch,
        feature_ids: Option<Vec<FeatureId>>,
    ) -> Result<(), StoreError>;
    /// Delete a room. Rejected with [StoreError::ConflictEntityExists] while any meeting still
    /// references the room.
    fn delete_room(&mut self, actor: &Actor, room_id: RoomId) -> Result<(), StoreError>;
    /// Get all rooms without a conflicting (non-cancelled, overlapping) meeting in the given
    /// date/time window.
    fn get_available_rooms(
        &mut self,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Vec<models::FullRoom>, StoreError>;

    fn get_features(&mut self) -> Result<Vec<models::Feature>, StoreError>;
    fn create_feature(
        &mut self,
        actor: &Actor,
        feature: models::NewFeature,
    ) -> Result<FeatureId, StoreError>;
    fn delete_feature(&mut self, actor: &Actor, feature_id: FeatureId) -> Result<(), StoreError>;

    /// Get a filtered list of meetings, in chronological order (date, start_time, id).
    fn get_meetings(
        &mut self,
        filter: MeetingFilter,
    ) -> Result<Vec<models::FullMeeting>, StoreError>;
    fn get_meeting(&mut self, meeting_id: MeetingId) -> Result<models::FullMeeting, StoreError>;
    /// Create a meeting with its initial agenda, its initial "Meeting Minutes" MoM entry and the
    /// given attendee set (each starting as "invited"), atomically: either all records are
    /// created or none.
    ///
    /// Fails with [StoreError::RoomUnavailable] if a non-cancelled meeting in the same room
    /// overlaps the requested window.
    fn create_meeting(
        &mut self,
        actor: &Actor,
        meeting: models::NewMeeting,
        attendee_ids: Vec<UserId>,
    ) -> Result<MeetingId, StoreError>;
    /// Partially update a meeting. If date, time window or room change, the room availability is
    /// re-checked, excluding the meeting's own reservation.
    fn update_meeting(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        patch: models::MeetingPatch,
    ) -> Result<(), StoreError>;
    fn delete_meeting(&mut self, actor: &Actor, meeting_id: MeetingId) -> Result<(), StoreError>;
    fn update_meeting_status(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        status: models::MeetingStatus,
    ) -> Result<(), StoreError>;
    /// Add users to the attendee set (set union by user id). Existing attendee records are left
    /// untouched, newly added ones start as "invited".
    fn add_attendees(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        user_ids: Vec<UserId>,
    ) -> Result<(), StoreError>;
    fn remove_attendees(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        user_ids: Vec<UserId>,
    ) -> Result<(), StoreError>;
    /// Upsert the acting user's own participation status for the meeting. Used by the "join"
    /// (accepted) and "leave" (back to invited) operations; idempotent under retries.
    fn set_own_attendance(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        status: models::AttendanceStatus,
    ) -> Result<(), StoreError>;
    /// Get the meetings the given user schedules or attends, chronological order.
    fn get_meetings_for_user(
        &mut self,
        user_id: UserId,
        filter: MeetingFilter,
    ) -> Result<Vec<models::FullMeeting>, StoreError>;
    /// Get the user's scheduled meetings that start strictly after `now`. See
    /// [scheduling::is_upcoming] for the exact partition rule.
    fn get_upcoming_meetings(
        &mut self,
        user_id: UserId,
        now: NaiveDateTime,
    ) -> Result<Vec<models::FullMeeting>, StoreError>;
    /// Get the user's completed/cancelled meetings and those that already ended before `now`,
    /// most recent first. See [scheduling::is_past] for the exact partition rule.
    fn get_past_meetings(
        &mut self,
        user_id: UserId,
        now: NaiveDateTime,
    ) -> Result<Vec<models::FullMeeting>, StoreError>;

    fn get_agenda_for_meeting(
        &mut self,
        meeting_id: MeetingId,
    ) -> Result<models::FullAgenda, StoreError>;
    /// Create an agenda for a meeting that does not have one yet. Fails with
    /// [StoreError::ConflictEntityExists] if the meeting already has an agenda;
    /// [BoardroomStoreFacade::create_or_update_agenda] is the preferred mutation path after
    /// meeting creation.
    fn create_agenda(&mut self, actor: &Actor, meeting_id: MeetingId)
        -> Result<AgendaId, StoreError>;
    /// Create the meeting's agenda or update the existing one (upsert by meeting id).
    ///
    /// # return value
    /// - `Ok(true)` if the agenda has been created
    /// - `Ok(false)` if the existing agenda has been updated
    fn create_or_update_agenda(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        title: String,
        description: Option<String>,
    ) -> Result<bool, StoreError>;
    fn delete_agenda(&mut self, actor: &Actor, agenda_id: AgendaId) -> Result<(), StoreError>;

    /// Get the topics of an agenda, sorted ascending by sort key with ties broken by id.
    fn get_topics(&mut self, agenda_id: AgendaId) -> Result<Vec<models::AgendaTopic>, StoreError>;
    /// Create a topic on the agenda, owned by the acting user. Without an explicit sort key the
    /// topic is appended after the current maximum (an empty agenda starts at 0).
    fn create_topic(
        &mut self,
        actor: &Actor,
        agenda_id: AgendaId,
        title: String,
        description: Option<String>,
        estimated_duration: Option<i32>,
        sort_key: Option<i32>,
    ) -> Result<TopicId, StoreError>;
    fn update_topic(
        &mut self,
        actor: &Actor,
        topic_id: TopicId,
        patch: models::AgendaTopicPatch,
    ) -> Result<(), StoreError>;
    fn delete_topic(&mut self, actor: &Actor, topic_id: TopicId) -> Result<(), StoreError>;
    /// Apply new sort keys to the given topics. Each (id, sort_key) pair is applied as an update
    /// scoped to the agenda; ids not belonging to the agenda are silently skipped. Returns the
    /// agenda's topics in their new order.
    fn reorder_topics(
        &mut self,
        actor: &Actor,
        agenda_id: AgendaId,
        orders: Vec<(TopicId, i32)>,
    ) -> Result<Vec<models::AgendaTopic>, StoreError>;
    fn assign_topic_owner(
        &mut self,
        actor: &Actor,
        topic_id: TopicId,
        owner_id: UserId,
    ) -> Result<(), StoreError>;
    fn get_topics_for_owner(
        &mut self,
        owner_id: UserId,
    ) -> Result<Vec<models::AgendaTopic>, StoreError>;

    fn get_mom_entries(
        &mut self,
        meeting_id: MeetingId,
    ) -> Result<Vec<models::MomEntry>, StoreError>;
    fn update_mom_entry(
        &mut self,
        actor: &Actor,
        mom_entry_id: MomEntryId,
        patch: models::MomEntryPatch,
    ) -> Result<(), StoreError>;

    /// Get a filtered list of action items, newest first.
    fn get_action_items(
        &mut self,
        filter: ActionItemFilter,
    ) -> Result<Vec<models::ActionItem>, StoreError>;
    /// Create an action item under a MoM entry. The entry's meeting is derived through the
    /// relation and its scheduler (or an admin) must be the creator.
    fn create_action_item(
        &mut self,
        actor: &Actor,
        item: models::NewActionItem,
    ) -> Result<ActionItemId, StoreError>;
    fn update_action_item(
        &mut self,
        actor: &Actor,
        item_id: ActionItemId,
        patch: models::ActionItemPatch,
    ) -> Result<(), StoreError>;
    fn delete_action_item(&mut self, actor: &Actor, item_id: ActionItemId)
        -> Result<(), StoreError>;
    fn update_action_item_status(
        &mut self,
        actor: &Actor,
        item_id: ActionItemId,
        status: models::ActionItemStatus,
    ) -> Result<(), StoreError>;
    /// Assign the item to a single user, or revert it to "for everyone" with `None`.
    fn assign_action_item(
        &mut self,
        actor: &Actor,
        item_id: ActionItemId,
        assigned_to: Option<UserId>,
    ) -> Result<(), StoreError>;

    /// Get a meeting's comments, oldest first.
    fn get_comments(&mut self, meeting_id: MeetingId) -> Result<Vec<models::Comment>, StoreError>;
    fn create_comment(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        text: String,
    ) -> Result<CommentId, StoreError>;
    /// Delete a comment. Comments are immutable, deletion by the author or an admin is the only
    /// mutation.
    fn delete_comment(&mut self, actor: &Actor, comment_id: CommentId) -> Result<(), StoreError>;
}

/// Filter options for retrieving meetings via [BoardroomStoreFacade::get_meetings] and
/// [BoardroomStoreFacade::get_meetings_for_user]
#[derive(Default, Clone)]
pub struct MeetingFilter {
    /// Filter for meetings on this exact date
    pub date: Option<NaiveDate>,
    /// Filter for meetings with this status
    pub status: Option<models::MeetingStatus>,
    /// Filter for meetings in this room
    pub room_id: Option<RoomId>,
    /// Filter for meetings with date >= from_date
    pub from_date: Option<NaiveDate>,
    /// Filter for meetings with date <= to_date
    pub to_date: Option<NaiveDate>,
}

impl MeetingFilter {
    /// Checks if a given meeting matches the filter
    ///
    /// Usually, filtering should be done by the database. This function can be used for separate
    /// checks of individual meetings in software (e.g. by the mock store).
    pub fn matches(&self, meeting: &models::Meeting) -> bool {
        if let Some(date) = self.date {
            if meeting.date != date {
                return false;
            }
        }
        if let Some(status) = self.status {
            if meeting.status != status {
                return false;
            }
        }
        if let Some(room_id) = self.room_id {
            if meeting.room_id != room_id {
                return false;
            }
        }
        if let Some(from_date) = self.from_date {
            if meeting.date < from_date {
                return false;
            }
        }
        if let Some(to_date) = self.to_date {
            if meeting.date > to_date {
                return false;
            }
        }
        true
    }
}

/// Filter options for retrieving action items via [BoardroomStoreFacade::get_action_items]
#[derive(Default, Clone)]
pub struct ActionItemFilter {
    /// Filter for items whose MoM entry belongs to this meeting
    pub meeting_id: Option<MeetingId>,
    /// Filter for items of this MoM entry
    pub mom_entry_id: Option<MomEntryId>,
    /// Filter for items with this status
    pub status: Option<models::ActionItemStatus>,
    /// Filter for items assigned to this user (items assigned to everyone don't match)
    pub assigned_to: Option<UserId>,
}

impl ActionItemFilter {
    /// Checks the filter fields that don't need the MoM-entry/meeting relation. The meeting_id
    /// filter has to be resolved by the caller.
    pub fn matches_local(&self, item: &models::ActionItem) -> bool {
        if let Some(mom_entry_id) = self.mom_entry_id {
            if item.mom_entry_id != mom_entry_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if item.status != status {
                return false;
            }
        }
        if let Some(assigned_to) = self.assigned_to {
            if item.assigned_to != Some(assigned_to) {
                return false;
            }
        }
        true
    }
}

pub trait BoardroomStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn BoardroomStoreFacade + 'a>, StoreError>;
}

pub struct EnumMemberNotExistingError {
    pub member_value: i32,
    pub enum_name: &'static str,
}

impl std::fmt::Display for EnumMemberNotExistingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} is not a valid value for the {} enum",
            self.member_value, self.enum_name
        )
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// Connecting to the database failed. See string description for details.
    ConnectionError(String),
    /// The query could not be executed because of some error not covered by the other members (see
    /// string description)
    QueryError(diesel::result::Error),
    /// Database transaction could not be committed due to a conflicting concurrent transaction
    TransactionConflict,
    /// The requested entity does not exist
    NotExisting,
    /// The entity could not be created or deleted because a conflicting entity exists (duplicate
    /// unique field, second agenda for a meeting, meetings still referencing a room).
    ConflictEntityExists,
    /// The requested room is already occupied by an overlapping non-cancelled meeting in the
    /// requested time window.
    RoomUnavailable,
    /// The acting user lacks the required relationship to the resource (scheduler, owner, author
    /// or admin). `action` is a short user-safe description of the denied operation.
    PermissionDenied { action: &'static str },
    /// The provided login credentials are not valid (unknown email, wrong password or
    /// deactivated account).
    AuthenticationFailed,
    /// The provided data is invalid, i.e. it does not match the expected ranges or violates a
    /// SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::ConflictEntityExists,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                _,
            ) => Self::TransactionConflict,
            diesel::result::Error::DatabaseError(
                e @ diesel::result::DatabaseErrorKind::ForeignKeyViolation
                | e @ diesel::result::DatabaseErrorKind::CheckViolation,
                _,
            ) => Self::InvalidInputData(format!("{:?}", e)),
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::TransactionConflict => f.write_str(
                "Database transaction could not be committed due to a conflicting concurrent transaction",
            ),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::ConflictEntityExists => f.write_str("Conflicting database record exists already."),
            Self::RoomUnavailable => {
                f.write_str("Room is not available at the specified time.")
            }
            Self::PermissionDenied { action } => {
                write!(f, "Client is not authorized to {}.", action)
            }
            Self::AuthenticationFailed => {
                f.write_str("Authentication with the given credentials failed.")
            }
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            StoreError::InvalidDataInDatabase(e) => {
                write!(f, "Data queried from database could not be deserialized: {}", e)
            }
        }
    }
}

impl std::error::Error for StoreError {}
