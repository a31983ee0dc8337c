use crate::auth_session::SessionToken;
use crate::data_store::actor::Actor;
use crate::data_store::models;
use crate::data_store::{
    credentials, scheduling, ActionItemFilter, ActionItemId, AgendaId, BoardroomStore,
    BoardroomStoreFacade, CommentId, FeatureId, MeetingFilter, MeetingId, MomEntryId, RoomId,
    StoreError, TopicId, UserId,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Mutex;

/**
 * A mock [BoardroomStore] implementation for testing.
 *
 * The simulated database consists of the [StoreMockData] structure with vectors of entities. These
 * can be directly modified by the tests.
 *
 * Unlike a pure data mock, the facade methods run the real [Actor] authorization predicates and
 * the [scheduling] conflict/partition logic, so API tests exercise the same rules as the Postgres
 * implementation. The [StoreMockData::next_error] attribute can be set to simulate a database
 * error on the next facade call.
 */
#[derive(Default)]
pub struct StoreMock {
    pub data: Mutex<StoreMockData>,
}

impl BoardroomStore for StoreMock {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn BoardroomStoreFacade + 'a>, StoreError> {
        Ok(Box::new(StoreMockFacade { store: self }))
    }
}

#[derive(Default)]
pub struct StoreMockData {
    pub users: Vec<models::User>,
    pub rooms: Vec<models::FullRoom>,
    pub features: Vec<models::Feature>,
    pub meetings: Vec<models::Meeting>,
    pub attendees: Vec<models::MeetingAttendee>,
    pub agendas: Vec<models::Agenda>,
    pub topics: Vec<models::AgendaTopic>,
    pub mom_entries: Vec<models::MomEntry>,
    pub action_items: Vec<models::ActionItem>,
    pub comments: Vec<models::Comment>,
    /// If not none, the next call to a store facade method will return this error.
    pub next_error: Option<StoreError>,
    next_id: i32,
}

impl StoreMockData {
    /// Simulated serial column. Starts above the ids used by the test sample data.
    pub fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id + 1000
    }

    fn meeting(&self, meeting_id: MeetingId) -> Result<&models::Meeting, StoreError> {
        self.meetings
            .iter()
            .find(|m| m.id == meeting_id)
            .ok_or(StoreError::NotExisting)
    }

    fn meeting_scheduler(&self, meeting_id: MeetingId) -> Result<UserId, StoreError> {
        Ok(self.meeting(meeting_id)?.scheduled_by)
    }

    fn mom_entry_meeting_id(&self, mom_entry_id: MomEntryId) -> Result<MeetingId, StoreError> {
        self.mom_entries
            .iter()
            .find(|e| e.id == mom_entry_id)
            .map(|e| e.meeting_id)
            .ok_or(StoreError::NotExisting)
    }

    fn action_item_scheduler(&self, item_id: ActionItemId) -> Result<UserId, StoreError> {
        let mom_entry_id = self
            .action_items
            .iter()
            .find(|i| i.id == item_id)
            .map(|i| i.mom_entry_id)
            .ok_or(StoreError::NotExisting)?;
        self.meeting_scheduler(self.mom_entry_meeting_id(mom_entry_id)?)
    }

    fn agenda_meeting_id(&self, agenda_id: AgendaId) -> Result<MeetingId, StoreError> {
        self.agendas
            .iter()
            .find(|a| a.id == agenda_id)
            .map(|a| a.meeting_id)
            .ok_or(StoreError::NotExisting)
    }

    /// A topic's owner and the scheduler of its meeting
    fn topic_authorization_data(&self, topic_id: TopicId) -> Result<(UserId, UserId), StoreError> {
        let topic = self
            .topics
            .iter()
            .find(|t| t.id == topic_id)
            .ok_or(StoreError::NotExisting)?;
        let scheduler = self.meeting_scheduler(self.agenda_meeting_id(topic.agenda_id)?)?;
        Ok((topic.owner_id, scheduler))
    }

    fn room_is_occupied(
        &self,
        room_id: RoomId,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_meeting: Option<MeetingId>,
    ) -> bool {
        self.meetings.iter().any(|m| {
            scheduling::conflicts_with(m, room_id, date, start_time, end_time, exclude_meeting)
        })
    }

    fn sorted_topics(&self, agenda_id: AgendaId) -> Vec<models::AgendaTopic> {
        let mut topics: Vec<models::AgendaTopic> = self
            .topics
            .iter()
            .filter(|t| t.agenda_id == agenda_id)
            .cloned()
            .collect();
        topics.sort_by_key(|t| (t.sort_key, t.id));
        topics
    }

    fn full_meeting(&self, meeting: &models::Meeting) -> models::FullMeeting {
        models::FullMeeting {
            meeting: meeting.clone(),
            attendees: self
                .attendees
                .iter()
                .filter(|a| a.meeting_id == meeting.id)
                .map(|a| (a.user_id, a.status))
                .collect(),
        }
    }

    fn full_meetings_sorted(&self, mut meetings: Vec<models::Meeting>) -> Vec<models::FullMeeting> {
        meetings.sort_by_key(|m| (m.date, m.start_time, m.id));
        meetings.iter().map(|m| self.full_meeting(m)).collect()
    }
}

struct StoreMockFacade<'a> {
    store: &'a StoreMock,
}

impl<'a> BoardroomStoreFacade for StoreMockFacade<'a> {
    fn authenticate_user(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<models::User, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        match data.users.iter().find(|u| u.email == email) {
            Some(user)
                if credentials::verify_password(password, &user.password_hash)
                    && user.is_active =>
            {
                Ok(user.clone())
            }
            _ => Err(StoreError::AuthenticationFailed),
        }
    }

    fn get_actor_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<Actor, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        match data.users.iter().find(|u| u.id == session_token.user_id()) {
            Some(user) if user.is_active => Ok(Actor::create_for_session(user.id, user.is_admin)),
            _ => Err(StoreError::AuthenticationFailed),
        }
    }

    fn get_user(&mut self, user_id: UserId) -> Result<models::User, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        data.users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn get_users(&mut self, actor: &Actor) -> Result<Vec<models::User>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        actor.check_admin("list user accounts")?;
        Ok(data.users.clone())
    }

    fn create_user(&mut self, actor: &Actor, user: models::NewUser) -> Result<UserId, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        actor.check_admin("create user accounts")?;
        if data.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::ConflictEntityExists);
        }
        let user_id = data.allocate_id();
        data.users.push(models::User {
            id: user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            is_active: user.is_active,
        });
        Ok(user_id)
    }

    fn get_rooms(&mut self) -> Result<Vec<models::FullRoom>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let mut rooms = data.rooms.clone();
        rooms.sort_by(|a, b| a.room.name.cmp(&b.room.name));
        Ok(rooms)
    }

    fn get_room(&mut self, room_id: RoomId) -> Result<models::FullRoom, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        data.rooms
            .iter()
            .find(|r| r.room.id == room_id)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn create_room(
        &mut self,
        actor: &Actor,
        room: models::NewRoom,
        feature_ids: Vec<FeatureId>,
    ) -> Result<RoomId, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        actor.check_admin("create rooms")?;
        let features = resolve_features(&data, &feature_ids)?;
        let room_id = data.allocate_id();
        data.rooms.push(models::FullRoom {
            room: models::Room {
                id: room_id,
                name: room.name,
                location: room.location,
                capacity: room.capacity,
            },
            features,
        });
        Ok(room_id)
    }

    fn update_room(
        &mut self,
        actor: &Actor,
        room_id: RoomId,
        room: models::RoomPatch,
        feature_ids: Option<Vec<FeatureId>>,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        actor.check_admin("update rooms")?;
        let features = match feature_ids {
            Some(feature_ids) => Some(resolve_features(&data, &feature_ids)?),
            None => None,
        };
        let existing = data
            .rooms
            .iter_mut()
            .find(|r| r.room.id == room_id)
            .ok_or(StoreError::NotExisting)?;
        if let Some(name) = room.name {
            existing.room.name = name;
        }
        if let Some(location) = room.location {
            existing.room.location = location;
        }
        if let Some(capacity) = room.capacity {
            existing.room.capacity = capacity;
        }
        if let Some(features) = features {
            existing.features = features;
        }
        Ok(())
    }

    fn delete_room(&mut self, actor: &Actor, room_id: RoomId) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        actor.check_admin("delete rooms")?;
        if !data.rooms.iter().any(|r| r.room.id == room_id) {
            return Err(StoreError::NotExisting);
        }
        if data.meetings.iter().any(|m| m.room_id == room_id) {
            return Err(StoreError::ConflictEntityExists);
        }
        data.rooms.retain(|r| r.room.id != room_id);
        Ok(())
    }

    fn get_available_rooms(
        &mut self,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Vec<models::FullRoom>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let mut rooms: Vec<models::FullRoom> = data
            .rooms
            .iter()
            .filter(|r| !data.room_is_occupied(r.room.id, date, start_time, end_time, None))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.room.name.cmp(&b.room.name));
        Ok(rooms)
    }

    fn get_features(&mut self) -> Result<Vec<models::Feature>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let mut features = data.features.clone();
        features.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(features)
    }

    fn create_feature(
        &mut self,
        actor: &Actor,
        feature: models::NewFeature,
    ) -> Result<FeatureId, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        actor.check_admin("create room features")?;
        if data.features.iter().any(|f| f.slug == feature.slug) {
            return Err(StoreError::ConflictEntityExists);
        }
        let feature_id = data.allocate_id();
        data.features.push(models::Feature {
            id: feature_id,
            name: feature.name,
            slug: feature.slug,
        });
        Ok(feature_id)
    }

    fn delete_feature(&mut self, actor: &Actor, feature_id: FeatureId) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        actor.check_admin("delete room features")?;
        if !data.features.iter().any(|f| f.id == feature_id) {
            return Err(StoreError::NotExisting);
        }
        data.features.retain(|f| f.id != feature_id);
        for room in data.rooms.iter_mut() {
            room.features.retain(|f| f.id != feature_id);
        }
        Ok(())
    }

    fn get_meetings(
        &mut self,
        filter: MeetingFilter,
    ) -> Result<Vec<models::FullMeeting>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let meetings: Vec<models::Meeting> = data
            .meetings
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        Ok(data.full_meetings_sorted(meetings))
    }

    fn get_meeting(&mut self, meeting_id: MeetingId) -> Result<models::FullMeeting, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let meeting = data.meeting(meeting_id)?.clone();
        Ok(data.full_meeting(&meeting))
    }

    fn create_meeting(
        &mut self,
        actor: &Actor,
        meeting: models::NewMeeting,
        attendee_ids: Vec<UserId>,
    ) -> Result<MeetingId, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        if !data.rooms.iter().any(|r| r.room.id == meeting.room_id) {
            return Err(StoreError::InvalidInputData(
                "room_id does not reference an existing room".to_owned(),
            ));
        }
        if data.room_is_occupied(
            meeting.room_id,
            meeting.date,
            meeting.start_time,
            meeting.end_time,
            None,
        ) {
            return Err(StoreError::RoomUnavailable);
        }

        let meeting_id = data.allocate_id();
        data.meetings.push(models::Meeting {
            id: meeting_id,
            title: meeting.title,
            objective: meeting.objective,
            date: meeting.date,
            start_time: meeting.start_time,
            end_time: meeting.end_time,
            status: meeting.status,
            scheduled_by: actor.user_id(),
            room_id: meeting.room_id,
        });

        let agenda_id = data.allocate_id();
        data.agendas.push(models::Agenda {
            id: agenda_id,
            meeting_id,
            title: None,
            description: None,
        });
        let initial_mom = models::NewMomEntry::initial_for_meeting(meeting_id);
        let mom_entry_id = data.allocate_id();
        data.mom_entries.push(models::MomEntry {
            id: mom_entry_id,
            meeting_id,
            title: initial_mom.title,
            notes: initial_mom.notes,
            summary: initial_mom.summary,
            file_path: initial_mom.file_path,
        });

        insert_attendees(&mut data, meeting_id, &attendee_ids);
        Ok(meeting_id)
    }

    fn update_meeting(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        patch: models::MeetingPatch,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let meeting = data.meeting(meeting_id)?;
        actor.check_meeting_mutation(meeting.scheduled_by, "update this meeting")?;

        let new_date = patch.date.unwrap_or(meeting.date);
        let new_start_time = patch.start_time.unwrap_or(meeting.start_time);
        let new_end_time = patch.end_time.unwrap_or(meeting.end_time);
        let new_room_id = patch.room_id.unwrap_or(meeting.room_id);
        if new_end_time <= new_start_time {
            return Err(StoreError::InvalidInputData(
                "end_time must be later than start_time".to_owned(),
            ));
        }
        let schedule_changed = patch.date.is_some()
            || patch.start_time.is_some()
            || patch.end_time.is_some()
            || patch.room_id.is_some();
        if schedule_changed
            && data.room_is_occupied(
                new_room_id,
                new_date,
                new_start_time,
                new_end_time,
                Some(meeting_id),
            )
        {
            return Err(StoreError::RoomUnavailable);
        }

        let meeting = data
            .meetings
            .iter_mut()
            .find(|m| m.id == meeting_id)
            .ok_or(StoreError::NotExisting)?;
        if let Some(title) = patch.title {
            meeting.title = title;
        }
        if let Some(objective) = patch.objective {
            meeting.objective = objective;
        }
        if let Some(status) = patch.status {
            meeting.status = status;
        }
        meeting.date = new_date;
        meeting.start_time = new_start_time;
        meeting.end_time = new_end_time;
        meeting.room_id = new_room_id;
        Ok(())
    }

    fn delete_meeting(&mut self, actor: &Actor, meeting_id: MeetingId) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(meeting_id)?;
        actor.check_meeting_mutation(scheduler, "delete this meeting")?;

        // simulate the cascading deletes of the database schema
        let agenda_ids: Vec<AgendaId> = data
            .agendas
            .iter()
            .filter(|a| a.meeting_id == meeting_id)
            .map(|a| a.id)
            .collect();
        data.topics.retain(|t| !agenda_ids.contains(&t.agenda_id));
        data.agendas.retain(|a| a.meeting_id != meeting_id);
        let mom_entry_ids: Vec<MomEntryId> = data
            .mom_entries
            .iter()
            .filter(|e| e.meeting_id == meeting_id)
            .map(|e| e.id)
            .collect();
        data.action_items
            .retain(|i| !mom_entry_ids.contains(&i.mom_entry_id));
        data.mom_entries.retain(|e| e.meeting_id != meeting_id);
        data.comments.retain(|c| c.meeting_id != meeting_id);
        data.attendees.retain(|a| a.meeting_id != meeting_id);
        data.meetings.retain(|m| m.id != meeting_id);
        Ok(())
    }

    fn update_meeting_status(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        status: models::MeetingStatus,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(meeting_id)?;
        actor.check_meeting_mutation(scheduler, "update this meeting's status")?;

        let meeting = data
            .meetings
            .iter_mut()
            .find(|m| m.id == meeting_id)
            .ok_or(StoreError::NotExisting)?;
        meeting.status = status;
        Ok(())
    }

    fn add_attendees(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        user_ids: Vec<UserId>,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(meeting_id)?;
        actor.check_meeting_mutation(scheduler, "manage this meeting's attendees")?;

        insert_attendees(&mut data, meeting_id, &user_ids);
        Ok(())
    }

    fn remove_attendees(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        user_ids: Vec<UserId>,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(meeting_id)?;
        actor.check_meeting_mutation(scheduler, "manage this meeting's attendees")?;

        data.attendees
            .retain(|a| a.meeting_id != meeting_id || !user_ids.contains(&a.user_id));
        Ok(())
    }

    fn set_own_attendance(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        status: models::AttendanceStatus,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        data.meeting(meeting_id)?;

        let existing = data
            .attendees
            .iter_mut()
            .find(|a| a.meeting_id == meeting_id && a.user_id == actor.user_id());
        match existing {
            Some(attendee) => attendee.status = status,
            None => data.attendees.push(models::MeetingAttendee {
                meeting_id,
                user_id: actor.user_id(),
                status,
            }),
        }
        Ok(())
    }

    fn get_meetings_for_user(
        &mut self,
        user_id: UserId,
        filter: MeetingFilter,
    ) -> Result<Vec<models::FullMeeting>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let meetings: Vec<models::Meeting> = data
            .meetings
            .iter()
            .filter(|m| filter.matches(m) && meeting_involves_user(&data, m, user_id))
            .cloned()
            .collect();
        Ok(data.full_meetings_sorted(meetings))
    }

    fn get_upcoming_meetings(
        &mut self,
        user_id: UserId,
        now: NaiveDateTime,
    ) -> Result<Vec<models::FullMeeting>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let meetings: Vec<models::Meeting> = data
            .meetings
            .iter()
            .filter(|m| meeting_involves_user(&data, m, user_id) && scheduling::is_upcoming(m, now))
            .cloned()
            .collect();
        Ok(data.full_meetings_sorted(meetings))
    }

    fn get_past_meetings(
        &mut self,
        user_id: UserId,
        now: NaiveDateTime,
    ) -> Result<Vec<models::FullMeeting>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let mut meetings: Vec<models::Meeting> = data
            .meetings
            .iter()
            .filter(|m| meeting_involves_user(&data, m, user_id) && scheduling::is_past(m, now))
            .cloned()
            .collect();
        meetings.sort_by_key(|m| (m.date, m.start_time, m.id));
        meetings.reverse();
        Ok(meetings.iter().map(|m| data.full_meeting(m)).collect())
    }

    fn get_agenda_for_meeting(
        &mut self,
        meeting_id: MeetingId,
    ) -> Result<models::FullAgenda, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let agenda = data
            .agendas
            .iter()
            .find(|a| a.meeting_id == meeting_id)
            .cloned()
            .ok_or(StoreError::NotExisting)?;
        let topics = data.sorted_topics(agenda.id);
        Ok(models::FullAgenda { agenda, topics })
    }

    fn create_agenda(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
    ) -> Result<AgendaId, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(meeting_id)?;
        actor.check_meeting_mutation(scheduler, "create an agenda for this meeting")?;
        if data.agendas.iter().any(|a| a.meeting_id == meeting_id) {
            return Err(StoreError::ConflictEntityExists);
        }
        let agenda_id = data.allocate_id();
        data.agendas.push(models::Agenda {
            id: agenda_id,
            meeting_id,
            title: None,
            description: None,
        });
        Ok(agenda_id)
    }

    fn create_or_update_agenda(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        title: String,
        description: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(meeting_id)?;
        actor.check_meeting_mutation(scheduler, "update this meeting's agenda")?;

        let existing = data.agendas.iter_mut().find(|a| a.meeting_id == meeting_id);
        if let Some(agenda) = existing {
            agenda.title = Some(title);
            agenda.description = description;
            Ok(false)
        } else {
            let agenda_id = data.allocate_id();
            data.agendas.push(models::Agenda {
                id: agenda_id,
                meeting_id,
                title: Some(title),
                description,
            });
            Ok(true)
        }
    }

    fn delete_agenda(&mut self, actor: &Actor, agenda_id: AgendaId) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(data.agenda_meeting_id(agenda_id)?)?;
        actor.check_meeting_mutation(scheduler, "delete this agenda")?;

        data.topics.retain(|t| t.agenda_id != agenda_id);
        data.agendas.retain(|a| a.id != agenda_id);
        Ok(())
    }

    fn get_topics(&mut self, agenda_id: AgendaId) -> Result<Vec<models::AgendaTopic>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        data.agenda_meeting_id(agenda_id)?;
        Ok(data.sorted_topics(agenda_id))
    }

    fn create_topic(
        &mut self,
        actor: &Actor,
        agenda_id: AgendaId,
        title: String,
        description: Option<String>,
        estimated_duration: Option<i32>,
        sort_key: Option<i32>,
    ) -> Result<TopicId, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(data.agenda_meeting_id(agenda_id)?)?;
        actor.check_meeting_mutation(scheduler, "add topics to this agenda")?;

        let sort_key = sort_key.unwrap_or_else(|| {
            data.topics
                .iter()
                .filter(|t| t.agenda_id == agenda_id)
                .map(|t| t.sort_key)
                .max()
                .unwrap_or(-1)
                + 1
        });
        let topic_id = data.allocate_id();
        data.topics.push(models::AgendaTopic {
            id: topic_id,
            agenda_id,
            owner_id: actor.user_id(),
            title,
            description,
            estimated_duration,
            sort_key,
        });
        Ok(topic_id)
    }

    fn update_topic(
        &mut self,
        actor: &Actor,
        topic_id: TopicId,
        patch: models::AgendaTopicPatch,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let (owner_id, scheduler) = data.topic_authorization_data(topic_id)?;
        actor.check_topic_mutation(owner_id, scheduler, "update this topic")?;

        let topic = data
            .topics
            .iter_mut()
            .find(|t| t.id == topic_id)
            .ok_or(StoreError::NotExisting)?;
        if let Some(title) = patch.title {
            topic.title = title;
        }
        if let Some(description) = patch.description {
            topic.description = description;
        }
        if let Some(estimated_duration) = patch.estimated_duration {
            topic.estimated_duration = estimated_duration;
        }
        if let Some(sort_key) = patch.sort_key {
            topic.sort_key = sort_key;
        }
        Ok(())
    }

    fn delete_topic(&mut self, actor: &Actor, topic_id: TopicId) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let (owner_id, scheduler) = data.topic_authorization_data(topic_id)?;
        actor.check_topic_mutation(owner_id, scheduler, "delete this topic")?;

        data.topics.retain(|t| t.id != topic_id);
        Ok(())
    }

    fn reorder_topics(
        &mut self,
        actor: &Actor,
        agenda_id: AgendaId,
        orders: Vec<(TopicId, i32)>,
    ) -> Result<Vec<models::AgendaTopic>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(data.agenda_meeting_id(agenda_id)?)?;
        actor.check_meeting_mutation(scheduler, "reorder this agenda's topics")?;

        // ids of other agendas are silently skipped
        for (topic_id, sort_key) in orders {
            if let Some(topic) = data
                .topics
                .iter_mut()
                .find(|t| t.id == topic_id && t.agenda_id == agenda_id)
            {
                topic.sort_key = sort_key;
            }
        }
        Ok(data.sorted_topics(agenda_id))
    }

    fn assign_topic_owner(
        &mut self,
        actor: &Actor,
        topic_id: TopicId,
        owner_id: UserId,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let (_, scheduler) = data.topic_authorization_data(topic_id)?;
        actor.check_meeting_mutation(scheduler, "assign a topic owner")?;
        if !data.users.iter().any(|u| u.id == owner_id) {
            return Err(StoreError::InvalidInputData(
                "owner_id does not reference an existing user".to_owned(),
            ));
        }

        let topic = data
            .topics
            .iter_mut()
            .find(|t| t.id == topic_id)
            .ok_or(StoreError::NotExisting)?;
        topic.owner_id = owner_id;
        Ok(())
    }

    fn get_topics_for_owner(
        &mut self,
        owner_id: UserId,
    ) -> Result<Vec<models::AgendaTopic>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let mut topics: Vec<models::AgendaTopic> = data
            .topics
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        topics.sort_by_key(|t| std::cmp::Reverse(t.id));
        Ok(topics)
    }

    fn get_mom_entries(
        &mut self,
        meeting_id: MeetingId,
    ) -> Result<Vec<models::MomEntry>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        data.meeting(meeting_id)?;
        let mut entries: Vec<models::MomEntry> = data
            .mom_entries
            .iter()
            .filter(|e| e.meeting_id == meeting_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    fn update_mom_entry(
        &mut self,
        actor: &Actor,
        mom_entry_id: MomEntryId,
        patch: models::MomEntryPatch,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(data.mom_entry_meeting_id(mom_entry_id)?)?;
        actor.check_meeting_mutation(scheduler, "update these meeting minutes")?;

        let entry = data
            .mom_entries
            .iter_mut()
            .find(|e| e.id == mom_entry_id)
            .ok_or(StoreError::NotExisting)?;
        if let Some(notes) = patch.notes {
            entry.notes = notes;
        }
        if let Some(summary) = patch.summary {
            entry.summary = summary;
        }
        if let Some(file_path) = patch.file_path {
            entry.file_path = file_path;
        }
        Ok(())
    }

    fn get_action_items(
        &mut self,
        filter: ActionItemFilter,
    ) -> Result<Vec<models::ActionItem>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let mut items: Vec<models::ActionItem> = data
            .action_items
            .iter()
            .filter(|i| {
                if !filter.matches_local(i) {
                    return false;
                }
                match filter.meeting_id {
                    Some(meeting_id) => data
                        .mom_entries
                        .iter()
                        .any(|e| e.id == i.mom_entry_id && e.meeting_id == meeting_id),
                    None => true,
                }
            })
            .cloned()
            .collect();
        items.sort_by_key(|i| std::cmp::Reverse(i.id));
        Ok(items)
    }

    fn create_action_item(
        &mut self,
        actor: &Actor,
        item: models::NewActionItem,
    ) -> Result<ActionItemId, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.meeting_scheduler(data.mom_entry_meeting_id(item.mom_entry_id)?)?;
        actor.check_meeting_mutation(scheduler, "create action items for this meeting")?;
        if let Some(assigned_to) = item.assigned_to {
            if !data.users.iter().any(|u| u.id == assigned_to) {
                return Err(StoreError::InvalidInputData(
                    "assigned_to does not reference an existing user".to_owned(),
                ));
            }
        }

        let item_id = data.allocate_id();
        data.action_items.push(models::ActionItem {
            id: item_id,
            mom_entry_id: item.mom_entry_id,
            assigned_to: item.assigned_to,
            item_type: item.item_type,
            description: item.description,
            due_date: item.due_date,
            status: item.status,
            file_path: item.file_path,
        });
        Ok(item_id)
    }

    fn update_action_item(
        &mut self,
        actor: &Actor,
        item_id: ActionItemId,
        patch: models::ActionItemPatch,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.action_item_scheduler(item_id)?;
        actor.check_meeting_mutation(scheduler, "update this action item")?;

        let item = data
            .action_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(StoreError::NotExisting)?;
        if let Some(item_type) = patch.item_type {
            item.item_type = item_type;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(due_date) = patch.due_date {
            item.due_date = due_date;
        }
        if let Some(assigned_to) = patch.assigned_to {
            item.assigned_to = assigned_to;
        }
        if let Some(status) = patch.status {
            item.status = status;
        }
        if let Some(file_path) = patch.file_path {
            item.file_path = file_path;
        }
        Ok(())
    }

    fn delete_action_item(
        &mut self,
        actor: &Actor,
        item_id: ActionItemId,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.action_item_scheduler(item_id)?;
        actor.check_meeting_mutation(scheduler, "delete this action item")?;

        data.action_items.retain(|i| i.id != item_id);
        Ok(())
    }

    fn update_action_item_status(
        &mut self,
        actor: &Actor,
        item_id: ActionItemId,
        status: models::ActionItemStatus,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.action_item_scheduler(item_id)?;
        actor.check_meeting_mutation(scheduler, "update this action item's status")?;

        let item = data
            .action_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(StoreError::NotExisting)?;
        item.status = status;
        Ok(())
    }

    fn assign_action_item(
        &mut self,
        actor: &Actor,
        item_id: ActionItemId,
        assigned_to: Option<UserId>,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let scheduler = data.action_item_scheduler(item_id)?;
        actor.check_meeting_mutation(scheduler, "assign this action item")?;
        if let Some(user_id) = assigned_to {
            if !data.users.iter().any(|u| u.id == user_id) {
                return Err(StoreError::InvalidInputData(
                    "assigned_to does not reference an existing user".to_owned(),
                ));
            }
        }

        let item = data
            .action_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(StoreError::NotExisting)?;
        item.assigned_to = assigned_to;
        Ok(())
    }

    fn get_comments(&mut self, meeting_id: MeetingId) -> Result<Vec<models::Comment>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        data.meeting(meeting_id)?;
        let mut comments: Vec<models::Comment> = data
            .comments
            .iter()
            .filter(|c| c.meeting_id == meeting_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    fn create_comment(
        &mut self,
        actor: &Actor,
        meeting_id: MeetingId,
        text: String,
    ) -> Result<CommentId, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        data.meeting(meeting_id)?;

        let comment_id = data.allocate_id();
        data.comments.push(models::Comment {
            id: comment_id,
            meeting_id,
            user_id: actor.user_id(),
            text,
            created_at: chrono::Utc::now(),
        });
        Ok(comment_id)
    }

    fn delete_comment(&mut self, actor: &Actor, comment_id: CommentId) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let author_id = data
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .map(|c| c.user_id)
            .ok_or(StoreError::NotExisting)?;
        actor.check_comment_deletion(author_id)?;

        data.comments.retain(|c| c.id != comment_id);
        Ok(())
    }
}

fn resolve_features(
    data: &StoreMockData,
    feature_ids: &[FeatureId],
) -> Result<Vec<models::Feature>, StoreError> {
    feature_ids
        .iter()
        .map(|feature_id| {
            data.features
                .iter()
                .find(|f| f.id == *feature_id)
                .cloned()
                .ok_or_else(|| {
                    StoreError::InvalidInputData(
                        "features must reference existing features".to_owned(),
                    )
                })
        })
        .collect()
}

fn insert_attendees(data: &mut StoreMockData, meeting_id: MeetingId, user_ids: &[UserId]) {
    for user_id in user_ids {
        if !data
            .attendees
            .iter()
            .any(|a| a.meeting_id == meeting_id && a.user_id == *user_id)
        {
            data.attendees.push(models::MeetingAttendee {
                meeting_id,
                user_id: *user_id,
                status: models::AttendanceStatus::Invited,
            });
        }
    }
}

fn meeting_involves_user(data: &StoreMockData, meeting: &models::Meeting, user_id: UserId) -> bool {
    meeting.scheduled_by == user_id
        || data
            .attendees
            .iter()
            .any(|a| a.meeting_id == meeting.id && a.user_id == user_id)
}
