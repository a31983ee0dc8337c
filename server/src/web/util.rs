use crate::data_store::{ActionItemFilter, MeetingFilter};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

/// Query string representation of [MeetingFilter] for the meeting list endpoints
#[derive(Deserialize)]
pub struct MeetingFilterAsQuery {
    pub date: Option<NaiveDate>,
    pub status: Option<boardroom_api_types::MeetingStatus>,
    pub room_id: Option<i32>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl From<MeetingFilterAsQuery> for MeetingFilter {
    fn from(value: MeetingFilterAsQuery) -> Self {
        Self {
            date: value.date,
            status: value.status.map(|s| s.into()),
            room_id: value.room_id,
            from_date: value.from_date,
            to_date: value.to_date,
        }
    }
}

/// Query string representation of [ActionItemFilter] for the action item list endpoint
#[derive(Deserialize)]
pub struct ActionItemFilterAsQuery {
    pub meeting_id: Option<i32>,
    pub mom_entry_id: Option<i32>,
    pub status: Option<boardroom_api_types::ActionItemStatus>,
    pub assigned_to: Option<i32>,
}

impl From<ActionItemFilterAsQuery> for ActionItemFilter {
    fn from(value: ActionItemFilterAsQuery) -> Self {
        Self {
            meeting_id: value.meeting_id,
            mom_entry_id: value.mom_entry_id,
            status: value.status.map(|s| s.into()),
            assigned_to: value.assigned_to,
        }
    }
}

/// Query parameters of the room availability endpoint
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
