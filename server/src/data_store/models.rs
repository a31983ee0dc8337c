use crate::data_store::{EnumMemberNotExistingError, MeetingId, UserId};
use chrono::{naive::NaiveDate, DateTime, NaiveTime, Utc};
use diesel::deserialize::FromSql;
use diesel::prelude::*;
use diesel::query_builder::bind_collector::RawBytesBindCollector;
use diesel::serialize::ToSql;
use diesel::{AsExpression, FromSqlRow};

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::users)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
}

impl From<User> for boardroom_api_types::User {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            is_admin: value.is_admin,
            is_active: value.is_active,
        }
    }
}

#[derive(Clone, Insertable)]
#[diesel(table_name=super::schema::users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::rooms)]
pub struct Room {
    pub id: i32,
    pub name: String,
    pub location: String,
    pub capacity: i32,
}

/// A room together with its feature set, the shape the API works with.
#[derive(Clone, Debug)]
pub struct FullRoom {
    pub room: Room,
    pub features: Vec<Feature>,
}

impl From<FullRoom> for boardroom_api_types::Room {
    fn from(value: FullRoom) -> Self {
        Self {
            id: value.room.id,
            name: value.room.name,
            location: value.room.location,
            capacity: value.room.capacity,
            features: value.features.into_iter().map(|f| f.into()).collect(),
        }
    }
}

#[derive(Clone, Insertable)]
#[diesel(table_name=super::schema::rooms)]
pub struct NewRoom {
    pub name: String,
    pub location: String,
    pub capacity: i32,
}

impl From<boardroom_api_types::NewRoom> for NewRoom {
    fn from(value: boardroom_api_types::NewRoom) -> Self {
        Self {
            name: value.name,
            location: value.location,
            capacity: value.capacity,
        }
    }
}

#[derive(Clone, Default, AsChangeset)]
#[diesel(table_name=super::schema::rooms)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
}

impl From<boardroom_api_types::RoomPatch> for RoomPatch {
    fn from(value: boardroom_api_types::RoomPatch) -> Self {
        Self {
            name: value.name,
            location: value.location,
            capacity: value.capacity,
        }
    }
}

impl RoomPatch {
    /// An all-None patch must not be passed to Diesel's .set()
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.capacity.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::features)]
pub struct Feature {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl From<Feature> for boardroom_api_types::Feature {
    fn from(value: Feature) -> Self {
        Self {
            id: value.id,
            name: value.name,
            slug: value.slug,
        }
    }
}

#[derive(Clone, Insertable)]
#[diesel(table_name=super::schema::features)]
pub struct NewFeature {
    pub name: String,
    pub slug: String,
}

impl From<boardroom_api_types::NewFeature> for NewFeature {
    fn from(value: boardroom_api_types::NewFeature) -> Self {
        Self {
            name: value.name,
            slug: value.slug,
        }
    }
}

// Association type for the room/feature many-to-many mapping, to simplify
// grouped retrieval of a room's features using Diesel's .grouped_by() method.
#[derive(Queryable, Associations, Identifiable, Selectable)]
#[diesel(table_name=super::schema::feature_room)]
#[diesel(primary_key(room_id, feature_id))]
#[diesel(belongs_to(Room))]
pub struct RoomFeatureMapping {
    pub room_id: i32,
    pub feature_id: i32,
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::meetings)]
pub struct Meeting {
    pub id: i32,
    pub title: String,
    pub objective: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: MeetingStatus,
    pub scheduled_by: i32,
    pub room_id: i32,
}

/// A meeting together with its attendee set (user id and participation
/// status per attendee).
#[derive(Clone, Debug)]
pub struct FullMeeting {
    pub meeting: Meeting,
    pub attendees: Vec<(UserId, AttendanceStatus)>,
}

impl From<FullMeeting> for boardroom_api_types::Meeting {
    fn from(value: FullMeeting) -> Self {
        Self {
            id: value.meeting.id,
            title: value.meeting.title,
            objective: value.meeting.objective,
            date: value.meeting.date,
            start_time: value.meeting.start_time,
            end_time: value.meeting.end_time,
            status: value.meeting.status.into(),
            scheduled_by: value.meeting.scheduled_by,
            room_id: value.meeting.room_id,
            attendees: value
                .attendees
                .into_iter()
                .map(|(user_id, status)| boardroom_api_types::Attendee {
                    user_id,
                    status: status.into(),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Insertable)]
#[diesel(table_name=super::schema::meetings)]
pub struct NewMeeting {
    pub title: String,
    pub objective: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: MeetingStatus,
    pub scheduled_by: i32,
    pub room_id: i32,
}

impl NewMeeting {
    /// Build the insertable meeting from the API request. The scheduler is
    /// always the acting user, never taken from the request body.
    pub fn from_api(meeting: boardroom_api_types::NewMeeting, scheduled_by: UserId) -> Self {
        Self {
            title: meeting.title,
            objective: meeting.objective,
            date: meeting.date,
            start_time: meeting.start_time,
            end_time: meeting.end_time,
            status: MeetingStatus::Scheduled,
            scheduled_by,
            room_id: meeting.room_id,
        }
    }
}

#[derive(Clone, Default, AsChangeset)]
#[diesel(table_name=super::schema::meetings)]
pub struct MeetingPatch {
    pub title: Option<String>,
    pub objective: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub room_id: Option<i32>,
    pub status: Option<MeetingStatus>,
}

impl From<boardroom_api_types::MeetingPatch> for MeetingPatch {
    fn from(value: boardroom_api_types::MeetingPatch) -> Self {
        Self {
            title: value.title,
            objective: value.objective,
            date: value.date,
            start_time: value.start_time,
            end_time: value.end_time,
            room_id: value.room_id,
            status: value.status.map(|s| s.into()),
        }
    }
}

impl MeetingPatch {
    /// An all-None patch must not be passed to Diesel's .set()
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.objective.is_none()
            && self.date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.room_id.is_none()
            && self.status.is_none()
    }
}

// Association type for the meeting/attendee pivot, to simplify grouped
// retrieval of a meeting's attendees using Diesel's .grouped_by() method.
#[derive(Clone, Queryable, Associations, Identifiable, Selectable)]
#[diesel(table_name=super::schema::meeting_attendees)]
#[diesel(primary_key(meeting_id, user_id))]
#[diesel(belongs_to(Meeting))]
pub struct MeetingAttendee {
    pub meeting_id: i32,
    pub user_id: i32,
    pub status: AttendanceStatus,
}

#[derive(Clone, Insertable)]
#[diesel(table_name=super::schema::meeting_attendees)]
pub struct NewMeetingAttendee {
    pub meeting_id: MeetingId,
    pub user_id: UserId,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::agendas)]
pub struct Agenda {
    pub id: i32,
    pub meeting_id: i32,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// An agenda together with its topics, sorted by (sort key, id).
#[derive(Clone, Debug)]
pub struct FullAgenda {
    pub agenda: Agenda,
    pub topics: Vec<AgendaTopic>,
}

impl From<FullAgenda> for boardroom_api_types::Agenda {
    fn from(value: FullAgenda) -> Self {
        Self {
            id: value.agenda.id,
            meeting_id: value.agenda.meeting_id,
            title: value.agenda.title,
            description: value.agenda.description,
            topics: value.topics.into_iter().map(|t| t.into()).collect(),
        }
    }
}

#[derive(Clone, Insertable)]
#[diesel(table_name=super::schema::agendas)]
pub struct NewAgenda {
    pub meeting_id: MeetingId,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::agenda_topics)]
pub struct AgendaTopic {
    pub id: i32,
    pub agenda_id: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub estimated_duration: Option<i32>,
    pub sort_key: i32,
}

impl From<AgendaTopic> for boardroom_api_types::AgendaTopic {
    fn from(value: AgendaTopic) -> Self {
        Self {
            id: value.id,
            agenda_id: value.agenda_id,
            owner_id: value.owner_id,
            title: value.title,
            description: value.description,
            estimated_duration: value.estimated_duration,
            order: value.sort_key,
        }
    }
}

#[derive(Clone, Insertable)]
#[diesel(table_name=super::schema::agenda_topics)]
pub struct NewAgendaTopic {
    pub agenda_id: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub estimated_duration: Option<i32>,
    pub sort_key: i32,
}

#[derive(Clone, Default, AsChangeset)]
#[diesel(table_name=super::schema::agenda_topics)]
pub struct AgendaTopicPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub estimated_duration: Option<Option<i32>>,
    pub sort_key: Option<i32>,
}

impl From<boardroom_api_types::AgendaTopicPatch> for AgendaTopicPatch {
    fn from(value: boardroom_api_types::AgendaTopicPatch) -> Self {
        Self {
            title: value.title,
            description: value.description,
            estimated_duration: value.estimated_duration,
            sort_key: value.order,
        }
    }
}

impl AgendaTopicPatch {
    /// An all-None patch must not be passed to Diesel's .set()
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.estimated_duration.is_none()
            && self.sort_key.is_none()
    }
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::mom_entries)]
pub struct MomEntry {
    pub id: i32,
    pub meeting_id: i32,
    pub title: String,
    pub notes: String,
    pub summary: Option<String>,
    pub file_path: Option<String>,
}

impl From<MomEntry> for boardroom_api_types::MomEntry {
    fn from(value: MomEntry) -> Self {
        Self {
            id: value.id,
            meeting_id: value.meeting_id,
            title: value.title,
            notes: value.notes,
            summary: value.summary,
            file_path: value.file_path,
        }
    }
}

#[derive(Clone, Insertable)]
#[diesel(table_name=super::schema::mom_entries)]
pub struct NewMomEntry {
    pub meeting_id: MeetingId,
    pub title: String,
    pub notes: String,
    pub summary: Option<String>,
    pub file_path: Option<String>,
}

impl NewMomEntry {
    /// The empty minutes record created alongside every new meeting.
    pub fn initial_for_meeting(meeting_id: MeetingId) -> Self {
        Self {
            meeting_id,
            title: "Meeting Minutes".to_string(),
            notes: "".to_string(),
            summary: None,
            file_path: None,
        }
    }
}

#[derive(Clone, Default, AsChangeset)]
#[diesel(table_name=super::schema::mom_entries)]
pub struct MomEntryPatch {
    pub notes: Option<String>,
    pub summary: Option<Option<String>>,
    pub file_path: Option<Option<String>>,
}

impl From<boardroom_api_types::MomEntryPatch> for MomEntryPatch {
    fn from(value: boardroom_api_types::MomEntryPatch) -> Self {
        Self {
            notes: value.notes,
            summary: value.summary,
            file_path: value.file_path,
        }
    }
}

impl MomEntryPatch {
    /// An all-None patch must not be passed to Diesel's .set()
    pub fn is_empty(&self) -> bool {
        self.notes.is_none() && self.summary.is_none() && self.file_path.is_none()
    }
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::action_items)]
pub struct ActionItem {
    pub id: i32,
    pub mom_entry_id: i32,
    pub assigned_to: Option<i32>,
    pub item_type: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub status: ActionItemStatus,
    pub file_path: Option<String>,
}

impl From<ActionItem> for boardroom_api_types::ActionItem {
    fn from(value: ActionItem) -> Self {
        Self {
            id: value.id,
            mom_entry_id: value.mom_entry_id,
            assigned_to: value.assigned_to,
            item_type: value.item_type,
            description: value.description,
            due_date: value.due_date,
            status: value.status.into(),
            file_path: value.file_path,
        }
    }
}

#[derive(Clone, Insertable)]
#[diesel(table_name=super::schema::action_items)]
pub struct NewActionItem {
    pub mom_entry_id: i32,
    pub assigned_to: Option<i32>,
    pub item_type: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub status: ActionItemStatus,
    pub file_path: Option<String>,
}

impl From<boardroom_api_types::NewActionItem> for NewActionItem {
    fn from(value: boardroom_api_types::NewActionItem) -> Self {
        Self {
            mom_entry_id: value.mom_entry_id,
            assigned_to: value.assigned_to,
            item_type: value.item_type,
            description: value.description,
            due_date: value.due_date,
            status: value.status.map(|s| s.into()).unwrap_or(ActionItemStatus::Open),
            file_path: value.file_path,
        }
    }
}

#[derive(Clone, Default, AsChangeset)]
#[diesel(table_name=super::schema::action_items)]
pub struct ActionItemPatch {
    pub item_type: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub assigned_to: Option<Option<i32>>,
    pub status: Option<ActionItemStatus>,
    pub file_path: Option<Option<String>>,
}

impl From<boardroom_api_types::ActionItemPatch> for ActionItemPatch {
    fn from(value: boardroom_api_types::ActionItemPatch) -> Self {
        Self {
            item_type: value.item_type,
            description: value.description,
            due_date: value.due_date,
            assigned_to: value.assigned_to,
            status: value.status.map(|s| s.into()),
            file_path: value.file_path,
        }
    }
}

impl ActionItemPatch {
    /// An all-None patch must not be passed to Diesel's .set()
    pub fn is_empty(&self) -> bool {
        self.item_type.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.assigned_to.is_none()
            && self.status.is_none()
            && self.file_path.is_none()
    }
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::comments)]
pub struct Comment {
    pub id: i32,
    pub meeting_id: i32,
    pub user_id: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for boardroom_api_types::Comment {
    fn from(value: Comment) -> Self {
        Self {
            id: value.id,
            meeting_id: value.meeting_id,
            user_id: value.user_id,
            text: value.text,
            created_at: value.created_at,
        }
    }
}

#[derive(Clone, Insertable)]
#[diesel(table_name=super::schema::comments)]
pub struct NewComment {
    pub meeting_id: MeetingId,
    pub user_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, FromSqlRow, AsExpression, Eq, Clone, Copy)]
#[diesel(sql_type = diesel::sql_types::Integer)]
#[repr(i32)]
pub enum MeetingStatus {
    Scheduled = 0,
    InProgress = 1,
    Completed = 2,
    Cancelled = 3,
}

impl TryFrom<i32> for MeetingStatus {
    type Error = EnumMemberNotExistingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MeetingStatus::Scheduled),
            1 => Ok(MeetingStatus::InProgress),
            2 => Ok(MeetingStatus::Completed),
            3 => Ok(MeetingStatus::Cancelled),
            _ => Err(EnumMemberNotExistingError {
                member_value: value,
                enum_name: "MeetingStatus",
            }),
        }
    }
}

impl From<MeetingStatus> for i32 {
    fn from(value: MeetingStatus) -> Self {
        value as i32
    }
}

impl From<MeetingStatus> for boardroom_api_types::MeetingStatus {
    fn from(value: MeetingStatus) -> Self {
        match value {
            MeetingStatus::Scheduled => Self::Scheduled,
            MeetingStatus::InProgress => Self::InProgress,
            MeetingStatus::Completed => Self::Completed,
            MeetingStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<boardroom_api_types::MeetingStatus> for MeetingStatus {
    fn from(value: boardroom_api_types::MeetingStatus) -> Self {
        match value {
            boardroom_api_types::MeetingStatus::Scheduled => Self::Scheduled,
            boardroom_api_types::MeetingStatus::InProgress => Self::InProgress,
            boardroom_api_types::MeetingStatus::Completed => Self::Completed,
            boardroom_api_types::MeetingStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl<DB> ToSql<diesel::sql_types::Integer, DB> for MeetingStatus
where
    DB: diesel::backend::Backend,
    for<'c> DB: diesel::backend::Backend<BindCollector<'c> = RawBytesBindCollector<DB>>,
    i32: ToSql<diesel::sql_types::Integer, DB>,
{
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, DB>,
    ) -> diesel::serialize::Result {
        let value: i32 = (*self).into();
        value.to_sql(&mut out.reborrow())
    }
}

impl<DB> FromSql<diesel::sql_types::Integer, DB> for MeetingStatus
where
    DB: diesel::backend::Backend,
    i32: FromSql<diesel::sql_types::Integer, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let x = i32::from_sql(bytes)?;
        x.try_into()
            .map_err(|e: EnumMemberNotExistingError| e.to_string().into())
    }
}

#[derive(Debug, PartialEq, FromSqlRow, AsExpression, Eq, Clone, Copy)]
#[diesel(sql_type = diesel::sql_types::Integer)]
#[repr(i32)]
pub enum AttendanceStatus {
    Invited = 0,
    Accepted = 1,
}

impl TryFrom<i32> for AttendanceStatus {
    type Error = EnumMemberNotExistingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AttendanceStatus::Invited),
            1 => Ok(AttendanceStatus::Accepted),
            _ => Err(EnumMemberNotExistingError {
                member_value: value,
                enum_name: "AttendanceStatus",
            }),
        }
    }
}

impl From<AttendanceStatus> for i32 {
    fn from(value: AttendanceStatus) -> Self {
        value as i32
    }
}

impl From<AttendanceStatus> for boardroom_api_types::AttendanceStatus {
    fn from(value: AttendanceStatus) -> Self {
        match value {
            AttendanceStatus::Invited => Self::Invited,
            AttendanceStatus::Accepted => Self::Accepted,
        }
    }
}

impl From<boardroom_api_types::AttendanceStatus> for AttendanceStatus {
    fn from(value: boardroom_api_types::AttendanceStatus) -> Self {
        match value {
            boardroom_api_types::AttendanceStatus::Invited => Self::Invited,
            boardroom_api_types::AttendanceStatus::Accepted => Self::Accepted,
        }
    }
}

impl<DB> ToSql<diesel::sql_types::Integer, DB> for AttendanceStatus
where
    DB: diesel::backend::Backend,
    for<'c> DB: diesel::backend::Backend<BindCollector<'c> = RawBytesBindCollector<DB>>,
    i32: ToSql<diesel::sql_types::Integer, DB>,
{
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, DB>,
    ) -> diesel::serialize::Result {
        let value: i32 = (*self).into();
        value.to_sql(&mut out.reborrow())
    }
}

impl<DB> FromSql<diesel::sql_types::Integer, DB> for AttendanceStatus
where
    DB: diesel::backend::Backend,
    i32: FromSql<diesel::sql_types::Integer, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let x = i32::from_sql(bytes)?;
        x.try_into()
            .map_err(|e: EnumMemberNotExistingError| e.to_string().into())
    }
}

#[derive(Debug, PartialEq, FromSqlRow, AsExpression, Eq, Clone, Copy)]
#[diesel(sql_type = diesel::sql_types::Integer)]
#[repr(i32)]
pub enum ActionItemStatus {
    Open = 0,
    InProgress = 1,
    Completed = 2,
    Cancelled = 3,
}

impl TryFrom<i32> for ActionItemStatus {
    type Error = EnumMemberNotExistingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ActionItemStatus::Open),
            1 => Ok(ActionItemStatus::InProgress),
            2 => Ok(ActionItemStatus::Completed),
            3 => Ok(ActionItemStatus::Cancelled),
            _ => Err(EnumMemberNotExistingError {
                member_value: value,
                enum_name: "ActionItemStatus",
            }),
        }
    }
}

impl From<ActionItemStatus> for i32 {
    fn from(value: ActionItemStatus) -> Self {
        value as i32
    }
}

impl From<ActionItemStatus> for boardroom_api_types::ActionItemStatus {
    fn from(value: ActionItemStatus) -> Self {
        match value {
            ActionItemStatus::Open => Self::Open,
            ActionItemStatus::InProgress => Self::InProgress,
            ActionItemStatus::Completed => Self::Completed,
            ActionItemStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<boardroom_api_types::ActionItemStatus> for ActionItemStatus {
    fn from(value: boardroom_api_types::ActionItemStatus) -> Self {
        match value {
            boardroom_api_types::ActionItemStatus::Open => Self::Open,
            boardroom_api_types::ActionItemStatus::InProgress => Self::InProgress,
            boardroom_api_types::ActionItemStatus::Completed => Self::Completed,
            boardroom_api_types::ActionItemStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl<DB> ToSql<diesel::sql_types::Integer, DB> for ActionItemStatus
where
    DB: diesel::backend::Backend,
    for<'c> DB: diesel::backend::Backend<BindCollector<'c> = RawBytesBindCollector<DB>>,
    i32: ToSql<diesel::sql_types::Integer, DB>,
{
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, DB>,
    ) -> diesel::serialize::Result {
        let value: i32 = (*self).into();
        value.to_sql(&mut out.reborrow())
    }
}

impl<DB> FromSql<diesel::sql_types::Integer, DB> for ActionItemStatus
where
    DB: diesel::backend::Backend,
    i32: FromSql<diesel::sql_types::Integer, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let x = i32::from_sql(bytes)?;
        x.try_into()
            .map_err(|e: EnumMemberNotExistingError| e.to_string().into())
    }
}
