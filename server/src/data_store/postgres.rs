use super::{
    credentials, models, schema, ActionItemFilter, ActionItemId, AgendaId, BoardroomStore,
    BoardroomStoreFacade, CommentId, FeatureId, MeetingFilter, MeetingId, MomEntryId, RoomId,
    StoreError, TopicId, UserId,
};
use crate::auth_session::SessionToken;
use crate::data_store::actor::Actor;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::dsl::{exists, not};
use diesel::expression::AsExpression;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use std::collections::HashMap;

#[derive(Clone)]
pub struct PgDataStore {
    pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let connection_manager = diesel::r2d2::ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .build(connection_manager)?,
        })
    }
}

impl BoardroomStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn BoardroomStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

pub struct PgDataStoreFacade {
    connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(
        connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    ) -> Self {
        Self { connection }
    }
}

/// Create an Sql expression to check if a row has been created or updated by a Postgres "upsert"
/// statement
fn sql_upsert_is_updated() -> diesel::expression::SqlLiteral<diesel::sql_types::Bool> {
    // See https://stackoverflow.com/q/34762732 and https://stackoverflow.com/q/49597793
    diesel::dsl::sql("xmax::text <> '0'")
}

impl BoardroomStoreFacade for PgDataStoreFacade {
    fn authenticate_user(
        &mut self,
        the_email: &str,
        password: &str,
    ) -> Result<models::User, StoreError> {
        use schema::users::dsl::*;

        let user = users
            .filter(email.eq(the_email))
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)
            .optional()?;
        // A single error for unknown email, wrong password and deactivated account, so login
        // responses don't leak which accounts exist
        match user {
            Some(user)
                if credentials::verify_password(password, &user.password_hash)
                    && user.is_active =>
            {
                Ok(user)
            }
            _ => Err(StoreError::AuthenticationFailed),
        }
    }

    fn get_actor_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<Actor, StoreError> {
        use schema::users::dsl::*;

        let user = users
            .filter(id.eq(session_token.user_id()))
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)
            .optional()?;
        match user {
            Some(user) if user.is_active => Ok(Actor::create_for_session(user.id, user.is_admin)),
            _ => Err(StoreError::AuthenticationFailed),
        }
    }

    fn get_user(&mut self, user_id: UserId) -> Result<models::User, StoreError> {
        use schema::users::dsl::*;

        Ok(users
            .filter(id.eq(user_id))
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)?)
    }

    fn get_users(&mut self, actor: &Actor) -> Result<Vec<models::User>, StoreError> {
        use schema::users::dsl::*;

        actor.check_admin("list user accounts")?;
        Ok(users
            .order(id.asc())
            .select(models::User::as_select())
            .load(&mut self.connection)?)
    }

    fn create_user(&mut self, actor: &Actor, user: models::NewUser) -> Result<UserId, StoreError> {
        use schema::users::dsl::*;
        actor.check_admin("create user accounts")?;

        Ok(diesel::insert_into(users)
            .values(&user)
            .returning(id)
            .get_result::<UserId>(&mut self.connection)?)
    }

    fn get_rooms(&mut self) -> Result<Vec<models::FullRoom>, StoreError> {
        use schema::rooms::dsl::*;

        self.connection.transaction(|connection| {
            let the_rooms = rooms
                .order_by(name)
                .select(models::Room::as_select())
                .load::<models::Room>(connection)?;
            Ok(load_full_rooms(the_rooms, connection)?)
        })
    }

    fn get_room(&mut self, the_room_id: RoomId) -> Result<models::FullRoom, StoreError> {
        use schema::rooms::dsl::*;

        self.connection.transaction(|connection| {
            let room = rooms
                .filter(id.eq(the_room_id))
                .select(models::Room::as_select())
                .first::<models::Room>(connection)?;
            let mut full_rooms = load_full_rooms(vec![room], connection)?;
            Ok(full_rooms.remove(0))
        })
    }

    fn create_room(
        &mut self,
        actor: &Actor,
        room: models::NewRoom,
        feature_ids: Vec<FeatureId>,
    ) -> Result<RoomId, StoreError> {
        use schema::rooms::dsl::*;
        actor.check_admin("create rooms")?;

        self.connection.transaction(|connection| {
            let the_room_id = diesel::insert_into(rooms)
                .values(&room)
                .returning(id)
                .get_result::<RoomId>(connection)?;
            update_room_features(the_room_id, &feature_ids, connection)?;
            Ok(the_room_id)
        })
    }

    fn update_room(
        &mut self,
        actor: &Actor,
        the_room_id: RoomId,
        room: models::RoomPatch,
        feature_ids: Option<Vec<FeatureId>>,
    ) -> Result<(), StoreError> {
        use schema::rooms::dsl::*;
        actor.check_admin("update rooms")?;

        self.connection.transaction(|connection| {
            rooms
                .filter(id.eq(the_room_id))
                .select(id)
                .first::<RoomId>(connection)?;
            if !room.is_empty() {
                diesel::update(rooms)
                    .filter(id.eq(the_room_id))
                    .set(room)
                    .execute(connection)?;
            }
            if let Some(feature_ids) = feature_ids {
                update_room_features(the_room_id, &feature_ids, connection)?;
            }
            Ok(())
        })
    }

    fn delete_room(&mut self, actor: &Actor, the_room_id: RoomId) -> Result<(), StoreError> {
        use schema::rooms::dsl::*;
        actor.check_admin("delete rooms")?;

        self.connection.transaction(|connection| {
            let has_meetings: bool = diesel::select(exists(
                schema::meetings::table.filter(schema::meetings::room_id.eq(the_room_id)),
            ))
            .get_result(connection)?;
            if has_meetings {
                return Err(StoreError::ConflictEntityExists);
            }

            diesel::delete(
                schema::feature_room::table.filter(schema::feature_room::room_id.eq(the_room_id)),
            )
            .execute(connection)?;
            let count = diesel::delete(rooms.filter(id.eq(the_room_id))).execute(connection)?;
            if count == 0 {
                return Err(StoreError::NotExisting);
            }
            Ok(())
        })
    }

    fn get_available_rooms(
        &mut self,
        the_date: NaiveDate,
        the_start_time: NaiveTime,
        the_end_time: NaiveTime,
    ) -> Result<Vec<models::FullRoom>, StoreError> {
        use schema::rooms::dsl::*;

        self.connection.transaction(|connection| {
            // SQL form of [super::scheduling::conflicts_with], inverted: keep the rooms without
            // any overlapping non-cancelled meeting in the requested window
            let the_rooms = rooms
                .filter(not(exists(
                    schema::meetings::table
                        .select(0.as_sql::<diesel::sql_types::Integer>())
                        .filter(schema::meetings::room_id.eq(id))
                        .filter(schema::meetings::date.eq(the_date))
                        .filter(schema::meetings::status.ne(models::MeetingStatus::Cancelled))
                        .filter(schema::meetings::start_time.lt(the_end_time))
                        .filter(schema::meetings::end_time.gt(the_start_time)),
                )))
                .order_by(name)
                .select(models::Room::as_select())
                .load::<models::Room>(connection)?;
            Ok(load_full_rooms(the_rooms, connection)?)
        })
    }

    fn get_features(&mut self) -> Result<Vec<models::Feature>, StoreError> {
        use schema::features::dsl::*;

        Ok(features
            .order_by(name)
            .select(models::Feature::as_select())
            .load::<models::Feature>(&mut self.connection)?)
    }

    fn create_feature(
        &mut self,
        actor: &Actor,
        feature: models::NewFeature,
    ) -> Result<FeatureId, StoreError> {
        use schema::features::dsl::*;
        actor.check_admin("create room features")?;

        Ok(diesel::insert_into(features)
            .values(&feature)
            .returning(id)
            .get_result::<FeatureId>(&mut self.connection)?)
    }

    fn delete_feature(
        &mut self,
        actor: &Actor,
        the_feature_id: FeatureId,
    ) -> Result<(), StoreError> {
        use schema::features::dsl::*;
        actor.check_admin("delete room features")?;

        self.connection.transaction(|connection| {
            diesel::delete(
                schema::feature_room::table
                    .filter(schema::feature_room::feature_id.eq(the_feature_id)),
            )
            .execute(connection)?;
            let count =
                diesel::delete(features.filter(id.eq(the_feature_id))).execute(connection)?;
            if count == 0 {
                return Err(StoreError::NotExisting);
            }
            Ok(())
        })
    }

    fn get_meetings(
        &mut self,
        filter: MeetingFilter,
    ) -> Result<Vec<models::FullMeeting>, StoreError> {
        use schema::meetings::dsl::*;

        self.connection.transaction(|connection| {
            let the_meetings = meetings
                .filter(meeting_filter_to_sql(filter))
                .order_by((date.asc(), start_time.asc(), id.asc()))
                .select(models::Meeting::as_select())
                .load::<models::Meeting>(connection)?;
            Ok(load_full_meetings(the_meetings, connection)?)
        })
    }

    fn get_meeting(&mut self, the_meeting_id: MeetingId) -> Result<models::FullMeeting, StoreError> {
        use schema::meetings::dsl::*;

        self.connection.transaction(|connection| {
            let meeting = meetings
                .filter(id.eq(the_meeting_id))
                .select(models::Meeting::as_select())
                .first::<models::Meeting>(connection)?;
            let mut full_meetings = load_full_meetings(vec![meeting], connection)?;
            Ok(full_meetings.remove(0))
        })
    }

    fn create_meeting(
        &mut self,
        actor: &Actor,
        meeting: models::NewMeeting,
        attendee_ids: Vec<UserId>,
    ) -> Result<MeetingId, StoreError> {
        // The scheduler is always the acting user, whatever the caller put into the model
        let meeting = models::NewMeeting {
            scheduled_by: actor.user_id(),
            ..meeting
        };

        // Serializable isolation, so two concurrent bookings of the same room cannot both pass
        // the availability check. One of them fails with TransactionConflict instead.
        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                schema::rooms::table
                    .filter(schema::rooms::id.eq(meeting.room_id))
                    .select(schema::rooms::id)
                    .first::<RoomId>(connection)
                    .optional()?
                    .ok_or_else(|| {
                        StoreError::InvalidInputData(
                            "room_id does not reference an existing room".to_owned(),
                        )
                    })?;

                if room_is_occupied(
                    meeting.room_id,
                    meeting.date,
                    meeting.start_time,
                    meeting.end_time,
                    None,
                    connection,
                )? {
                    return Err(StoreError::RoomUnavailable);
                }

                let the_meeting_id = diesel::insert_into(schema::meetings::table)
                    .values(&meeting)
                    .returning(schema::meetings::id)
                    .get_result::<MeetingId>(connection)?;

                // Every meeting starts out with an empty agenda and an empty minutes record
                diesel::insert_into(schema::agendas::table)
                    .values(&models::NewAgenda {
                        meeting_id: the_meeting_id,
                        title: None,
                        description: None,
                    })
                    .execute(connection)?;
                diesel::insert_into(schema::mom_entries::table)
                    .values(&models::NewMomEntry::initial_for_meeting(the_meeting_id))
                    .execute(connection)?;

                insert_attendees(the_meeting_id, &attendee_ids, connection)?;

                Ok(the_meeting_id)
            })
    }

    fn update_meeting(
        &mut self,
        actor: &Actor,
        the_meeting_id: MeetingId,
        patch: models::MeetingPatch,
    ) -> Result<(), StoreError> {
        use schema::meetings::dsl::*;
        let actor = *actor;

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let meeting = meetings
                    .filter(id.eq(the_meeting_id))
                    .select(models::Meeting::as_select())
                    .first::<models::Meeting>(connection)?;
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
                    && room_is_occupied(
                        new_room_id,
                        new_date,
                        new_start_time,
                        new_end_time,
                        Some(the_meeting_id),
                        connection,
                    )?
                {
                    return Err(StoreError::RoomUnavailable);
                }

                if !patch.is_empty() {
                    diesel::update(meetings)
                        .filter(id.eq(the_meeting_id))
                        .set(patch)
                        .execute(connection)?;
                }
                Ok(())
            })
    }

    fn delete_meeting(
        &mut self,
        actor: &Actor,
        the_meeting_id: MeetingId,
    ) -> Result<(), StoreError> {
        use schema::meetings::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_meeting_scheduler(the_meeting_id, connection)?;
            actor.check_meeting_mutation(scheduler, "delete this meeting")?;

            // agenda, topics, minutes, action items, comments and attendee records are removed
            // by the ON DELETE CASCADE constraints
            diesel::delete(meetings.filter(id.eq(the_meeting_id))).execute(connection)?;
            Ok(())
        })
    }

    fn update_meeting_status(
        &mut self,
        actor: &Actor,
        the_meeting_id: MeetingId,
        the_status: models::MeetingStatus,
    ) -> Result<(), StoreError> {
        use schema::meetings::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_meeting_scheduler(the_meeting_id, connection)?;
            actor.check_meeting_mutation(scheduler, "update this meeting's status")?;

            diesel::update(meetings)
                .filter(id.eq(the_meeting_id))
                .set(status.eq(the_status))
                .execute(connection)?;
            Ok(())
        })
    }

    fn add_attendees(
        &mut self,
        actor: &Actor,
        the_meeting_id: MeetingId,
        user_ids: Vec<UserId>,
    ) -> Result<(), StoreError> {
        self.connection.transaction(|connection| {
            let scheduler = get_meeting_scheduler(the_meeting_id, connection)?;
            actor.check_meeting_mutation(scheduler, "manage this meeting's attendees")?;

            insert_attendees(the_meeting_id, &user_ids, connection)?;
            Ok(())
        })
    }

    fn remove_attendees(
        &mut self,
        actor: &Actor,
        the_meeting_id: MeetingId,
        user_ids: Vec<UserId>,
    ) -> Result<(), StoreError> {
        use schema::meeting_attendees::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_meeting_scheduler(the_meeting_id, connection)?;
            actor.check_meeting_mutation(scheduler, "manage this meeting's attendees")?;

            diesel::delete(
                meeting_attendees
                    .filter(meeting_id.eq(the_meeting_id))
                    .filter(user_id.eq_any(user_ids)),
            )
            .execute(connection)?;
            Ok(())
        })
    }

    fn set_own_attendance(
        &mut self,
        actor: &Actor,
        the_meeting_id: MeetingId,
        the_status: models::AttendanceStatus,
    ) -> Result<(), StoreError> {
        use schema::meeting_attendees::dsl::*;

        self.connection.transaction(|connection| {
            schema::meetings::table
                .filter(schema::meetings::id.eq(the_meeting_id))
                .select(schema::meetings::id)
                .first::<MeetingId>(connection)?;

            let now = chrono::Utc::now();
            diesel::insert_into(meeting_attendees)
                .values(&models::NewMeetingAttendee {
                    meeting_id: the_meeting_id,
                    user_id: actor.user_id(),
                    status: the_status,
                    created_at: now,
                    updated_at: now,
                })
                .on_conflict((meeting_id, user_id))
                .do_update()
                .set((status.eq(the_status), updated_at.eq(now)))
                .execute(connection)?;
            Ok(())
        })
    }

    fn get_meetings_for_user(
        &mut self,
        the_user_id: UserId,
        filter: MeetingFilter,
    ) -> Result<Vec<models::FullMeeting>, StoreError> {
        use schema::meetings::dsl::*;

        self.connection.transaction(|connection| {
            let the_meetings = meetings
                .filter(meeting_filter_to_sql(filter))
                .filter(meeting_involves_user(the_user_id))
                .order_by((date.asc(), start_time.asc(), id.asc()))
                .select(models::Meeting::as_select())
                .load::<models::Meeting>(connection)?;
            Ok(load_full_meetings(the_meetings, connection)?)
        })
    }

    fn get_upcoming_meetings(
        &mut self,
        the_user_id: UserId,
        now: NaiveDateTime,
    ) -> Result<Vec<models::FullMeeting>, StoreError> {
        use schema::meetings::dsl::*;

        self.connection.transaction(|connection| {
            // SQL form of [super::scheduling::is_upcoming]
            let the_meetings = meetings
                .filter(meeting_involves_user(the_user_id))
                .filter(status.eq(models::MeetingStatus::Scheduled))
                .filter(
                    date.gt(now.date())
                        .or(date.eq(now.date()).and(start_time.gt(now.time()))),
                )
                .order_by((date.asc(), start_time.asc(), id.asc()))
                .select(models::Meeting::as_select())
                .load::<models::Meeting>(connection)?;
            Ok(load_full_meetings(the_meetings, connection)?)
        })
    }

    fn get_past_meetings(
        &mut self,
        the_user_id: UserId,
        now: NaiveDateTime,
    ) -> Result<Vec<models::FullMeeting>, StoreError> {
        use schema::meetings::dsl::*;

        self.connection.transaction(|connection| {
            // SQL form of [super::scheduling::is_past]
            let the_meetings = meetings
                .filter(meeting_involves_user(the_user_id))
                .filter(
                    status
                        .eq_any(vec![
                            models::MeetingStatus::Completed,
                            models::MeetingStatus::Cancelled,
                        ])
                        .or(date.lt(now.date()))
                        .or(date.eq(now.date()).and(end_time.lt(now.time()))),
                )
                .order_by((date.desc(), start_time.desc(), id.desc()))
                .select(models::Meeting::as_select())
                .load::<models::Meeting>(connection)?;
            Ok(load_full_meetings(the_meetings, connection)?)
        })
    }

    fn get_agenda_for_meeting(
        &mut self,
        the_meeting_id: MeetingId,
    ) -> Result<models::FullAgenda, StoreError> {
        use schema::agendas::dsl::*;

        self.connection.transaction(|connection| {
            let agenda = agendas
                .filter(meeting_id.eq(the_meeting_id))
                .select(models::Agenda::as_select())
                .first::<models::Agenda>(connection)?;
            let topics = load_sorted_topics(agenda.id, connection)?;
            Ok(models::FullAgenda { agenda, topics })
        })
    }

    fn create_agenda(
        &mut self,
        actor: &Actor,
        the_meeting_id: MeetingId,
    ) -> Result<AgendaId, StoreError> {
        use schema::agendas::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_meeting_scheduler(the_meeting_id, connection)?;
            actor.check_meeting_mutation(scheduler, "create an agenda for this meeting")?;

            let existing = agendas
                .filter(meeting_id.eq(the_meeting_id))
                .select(id)
                .first::<AgendaId>(connection)
                .optional()?;
            if existing.is_some() {
                return Err(StoreError::ConflictEntityExists);
            }

            Ok(diesel::insert_into(agendas)
                .values(&models::NewAgenda {
                    meeting_id: the_meeting_id,
                    title: None,
                    description: None,
                })
                .returning(id)
                .get_result::<AgendaId>(connection)?)
        })
    }

    fn create_or_update_agenda(
        &mut self,
        actor: &Actor,
        the_meeting_id: MeetingId,
        the_title: String,
        the_description: Option<String>,
    ) -> Result<bool, StoreError> {
        use schema::agendas::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_meeting_scheduler(the_meeting_id, connection)?;
            actor.check_meeting_mutation(scheduler, "update this meeting's agenda")?;

            let new_agenda = models::NewAgenda {
                meeting_id: the_meeting_id,
                title: Some(the_title),
                description: the_description,
            };
            let upsert_result = diesel::insert_into(agendas)
                .values(&new_agenda)
                .on_conflict(meeting_id)
                .do_update()
                .set((
                    title.eq(new_agenda.title.clone()),
                    description.eq(new_agenda.description.clone()),
                ))
                .returning(sql_upsert_is_updated())
                .load::<bool>(connection)?;
            if upsert_result.is_empty() {
                return Err(StoreError::ConflictEntityExists);
            }
            let is_updated = upsert_result[0];
            Ok(!is_updated)
        })
    }

    fn delete_agenda(&mut self, actor: &Actor, the_agenda_id: AgendaId) -> Result<(), StoreError> {
        use schema::agendas::dsl::*;

        self.connection.transaction(|connection| {
            let the_meeting_id = agendas
                .filter(id.eq(the_agenda_id))
                .select(meeting_id)
                .first::<MeetingId>(connection)?;
            let scheduler = get_meeting_scheduler(the_meeting_id, connection)?;
            actor.check_meeting_mutation(scheduler, "delete this agenda")?;

            // topics go with the agenda via ON DELETE CASCADE
            diesel::delete(agendas.filter(id.eq(the_agenda_id))).execute(connection)?;
            Ok(())
        })
    }

    fn get_topics(
        &mut self,
        the_agenda_id: AgendaId,
    ) -> Result<Vec<models::AgendaTopic>, StoreError> {
        self.connection.transaction(|connection| {
            schema::agendas::table
                .filter(schema::agendas::id.eq(the_agenda_id))
                .select(schema::agendas::id)
                .first::<AgendaId>(connection)?;
            load_sorted_topics(the_agenda_id, connection).map_err(|e| e.into())
        })
    }

    fn create_topic(
        &mut self,
        actor: &Actor,
        the_agenda_id: AgendaId,
        the_title: String,
        the_description: Option<String>,
        the_estimated_duration: Option<i32>,
        the_sort_key: Option<i32>,
    ) -> Result<TopicId, StoreError> {
        use schema::agenda_topics::dsl::*;
        let actor = *actor;

        self.connection.transaction(|connection| {
            let the_meeting_id = schema::agendas::table
                .filter(schema::agendas::id.eq(the_agenda_id))
                .select(schema::agendas::meeting_id)
                .first::<MeetingId>(connection)?;
            let scheduler = get_meeting_scheduler(the_meeting_id, connection)?;
            actor.check_meeting_mutation(scheduler, "add topics to this agenda")?;

            // Without an explicit sort key, append after the current maximum. An empty agenda
            // starts at 0.
            let the_sort_key = match the_sort_key {
                Some(key) => key,
                None => {
                    agenda_topics
                        .filter(agenda_id.eq(the_agenda_id))
                        .select(diesel::dsl::max(sort_key))
                        .first::<Option<i32>>(connection)?
                        .unwrap_or(-1)
                        + 1
                }
            };

            Ok(diesel::insert_into(agenda_topics)
                .values(&models::NewAgendaTopic {
                    agenda_id: the_agenda_id,
                    owner_id: actor.user_id(),
                    title: the_title,
                    description: the_description,
                    estimated_duration: the_estimated_duration,
                    sort_key: the_sort_key,
                })
                .returning(id)
                .get_result::<TopicId>(connection)?)
        })
    }

    fn update_topic(
        &mut self,
        actor: &Actor,
        the_topic_id: TopicId,
        patch: models::AgendaTopicPatch,
    ) -> Result<(), StoreError> {
        use schema::agenda_topics::dsl::*;

        self.connection.transaction(|connection| {
            let (the_owner_id, scheduler) = get_topic_authorization_data(the_topic_id, connection)?;
            actor.check_topic_mutation(the_owner_id, scheduler, "update this topic")?;

            if !patch.is_empty() {
                diesel::update(agenda_topics)
                    .filter(id.eq(the_topic_id))
                    .set(patch)
                    .execute(connection)?;
            }
            Ok(())
        })
    }

    fn delete_topic(&mut self, actor: &Actor, the_topic_id: TopicId) -> Result<(), StoreError> {
        use schema::agenda_topics::dsl::*;

        self.connection.transaction(|connection| {
            let (the_owner_id, scheduler) = get_topic_authorization_data(the_topic_id, connection)?;
            actor.check_topic_mutation(the_owner_id, scheduler, "delete this topic")?;

            diesel::delete(agenda_topics.filter(id.eq(the_topic_id))).execute(connection)?;
            Ok(())
        })
    }

    fn reorder_topics(
        &mut self,
        actor: &Actor,
        the_agenda_id: AgendaId,
        orders: Vec<(TopicId, i32)>,
    ) -> Result<Vec<models::AgendaTopic>, StoreError> {
        use schema::agenda_topics::dsl::*;

        self.connection.transaction(|connection| {
            let the_meeting_id = schema::agendas::table
                .filter(schema::agendas::id.eq(the_agenda_id))
                .select(schema::agendas::meeting_id)
                .first::<MeetingId>(connection)?;
            let scheduler = get_meeting_scheduler(the_meeting_id, connection)?;
            actor.check_meeting_mutation(scheduler, "reorder this agenda's topics")?;

            // Scoping every update to the agenda makes topic ids of other agendas a silent no-op
            // instead of a cross-agenda write
            for (the_topic_id, the_sort_key) in orders {
                diesel::update(agenda_topics)
                    .filter(id.eq(the_topic_id))
                    .filter(agenda_id.eq(the_agenda_id))
                    .set(sort_key.eq(the_sort_key))
                    .execute(connection)?;
            }

            Ok(load_sorted_topics(the_agenda_id, connection)?)
        })
    }

    fn assign_topic_owner(
        &mut self,
        actor: &Actor,
        the_topic_id: TopicId,
        the_owner_id: UserId,
    ) -> Result<(), StoreError> {
        use schema::agenda_topics::dsl::*;

        self.connection.transaction(|connection| {
            let (_, scheduler) = get_topic_authorization_data(the_topic_id, connection)?;
            actor.check_meeting_mutation(scheduler, "assign a topic owner")?;

            diesel::update(agenda_topics)
                .filter(id.eq(the_topic_id))
                .set(owner_id.eq(the_owner_id))
                .execute(connection)?;
            Ok(())
        })
    }

    fn get_topics_for_owner(
        &mut self,
        the_owner_id: UserId,
    ) -> Result<Vec<models::AgendaTopic>, StoreError> {
        use schema::agenda_topics::dsl::*;

        Ok(agenda_topics
            .filter(owner_id.eq(the_owner_id))
            .order_by(id.desc())
            .select(models::AgendaTopic::as_select())
            .load::<models::AgendaTopic>(&mut self.connection)?)
    }

    fn get_mom_entries(
        &mut self,
        the_meeting_id: MeetingId,
    ) -> Result<Vec<models::MomEntry>, StoreError> {
        use schema::mom_entries::dsl::*;

        self.connection.transaction(|connection| {
            schema::meetings::table
                .filter(schema::meetings::id.eq(the_meeting_id))
                .select(schema::meetings::id)
                .first::<MeetingId>(connection)?;

            Ok(mom_entries
                .filter(meeting_id.eq(the_meeting_id))
                .order_by(id.asc())
                .select(models::MomEntry::as_select())
                .load::<models::MomEntry>(connection)?)
        })
    }

    fn update_mom_entry(
        &mut self,
        actor: &Actor,
        the_mom_entry_id: MomEntryId,
        patch: models::MomEntryPatch,
    ) -> Result<(), StoreError> {
        use schema::mom_entries::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_mom_entry_scheduler(the_mom_entry_id, connection)?;
            actor.check_meeting_mutation(scheduler, "update these meeting minutes")?;

            if !patch.is_empty() {
                diesel::update(mom_entries)
                    .filter(id.eq(the_mom_entry_id))
                    .set(patch)
                    .execute(connection)?;
            }
            Ok(())
        })
    }

    fn get_action_items(
        &mut self,
        filter: ActionItemFilter,
    ) -> Result<Vec<models::ActionItem>, StoreError> {
        use schema::action_items::dsl::*;

        Ok(action_items
            .filter(action_item_filter_to_sql(filter))
            .order_by(id.desc())
            .select(models::ActionItem::as_select())
            .load::<models::ActionItem>(&mut self.connection)?)
    }

    fn create_action_item(
        &mut self,
        actor: &Actor,
        item: models::NewActionItem,
    ) -> Result<ActionItemId, StoreError> {
        use schema::action_items::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_mom_entry_scheduler(item.mom_entry_id, connection)?;
            actor.check_meeting_mutation(scheduler, "create action items for this meeting")?;

            Ok(diesel::insert_into(action_items)
                .values(&item)
                .returning(id)
                .get_result::<ActionItemId>(connection)?)
        })
    }

    fn update_action_item(
        &mut self,
        actor: &Actor,
        the_item_id: ActionItemId,
        patch: models::ActionItemPatch,
    ) -> Result<(), StoreError> {
        use schema::action_items::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_action_item_scheduler(the_item_id, connection)?;
            actor.check_meeting_mutation(scheduler, "update this action item")?;

            if !patch.is_empty() {
                diesel::update(action_items)
                    .filter(id.eq(the_item_id))
                    .set(patch)
                    .execute(connection)?;
            }
            Ok(())
        })
    }

    fn delete_action_item(
        &mut self,
        actor: &Actor,
        the_item_id: ActionItemId,
    ) -> Result<(), StoreError> {
        use schema::action_items::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_action_item_scheduler(the_item_id, connection)?;
            actor.check_meeting_mutation(scheduler, "delete this action item")?;

            diesel::delete(action_items.filter(id.eq(the_item_id))).execute(connection)?;
            Ok(())
        })
    }

    fn update_action_item_status(
        &mut self,
        actor: &Actor,
        the_item_id: ActionItemId,
        the_status: models::ActionItemStatus,
    ) -> Result<(), StoreError> {
        use schema::action_items::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_action_item_scheduler(the_item_id, connection)?;
            actor.check_meeting_mutation(scheduler, "update this action item's status")?;

            diesel::update(action_items)
                .filter(id.eq(the_item_id))
                .set(status.eq(the_status))
                .execute(connection)?;
            Ok(())
        })
    }

    fn assign_action_item(
        &mut self,
        actor: &Actor,
        the_item_id: ActionItemId,
        the_assigned_to: Option<UserId>,
    ) -> Result<(), StoreError> {
        use schema::action_items::dsl::*;

        self.connection.transaction(|connection| {
            let scheduler = get_action_item_scheduler(the_item_id, connection)?;
            actor.check_meeting_mutation(scheduler, "assign this action item")?;

            diesel::update(action_items)
                .filter(id.eq(the_item_id))
                .set(assigned_to.eq(the_assigned_to))
                .execute(connection)?;
            Ok(())
        })
    }

    fn get_comments(
        &mut self,
        the_meeting_id: MeetingId,
    ) -> Result<Vec<models::Comment>, StoreError> {
        use schema::comments::dsl::*;

        self.connection.transaction(|connection| {
            schema::meetings::table
                .filter(schema::meetings::id.eq(the_meeting_id))
                .select(schema::meetings::id)
                .first::<MeetingId>(connection)?;

            Ok(comments
                .filter(meeting_id.eq(the_meeting_id))
                .order_by((created_at.asc(), id.asc()))
                .select(models::Comment::as_select())
                .load::<models::Comment>(connection)?)
        })
    }

    fn create_comment(
        &mut self,
        actor: &Actor,
        the_meeting_id: MeetingId,
        the_text: String,
    ) -> Result<CommentId, StoreError> {
        use schema::comments::dsl::*;

        self.connection.transaction(|connection| {
            schema::meetings::table
                .filter(schema::meetings::id.eq(the_meeting_id))
                .select(schema::meetings::id)
                .first::<MeetingId>(connection)?;

            Ok(diesel::insert_into(comments)
                .values(&models::NewComment {
                    meeting_id: the_meeting_id,
                    user_id: actor.user_id(),
                    text: the_text,
                    created_at: chrono::Utc::now(),
                })
                .returning(id)
                .get_result::<CommentId>(connection)?)
        })
    }

    fn delete_comment(
        &mut self,
        actor: &Actor,
        the_comment_id: CommentId,
    ) -> Result<(), StoreError> {
        use schema::comments::dsl::*;

        self.connection.transaction(|connection| {
            let author_id = comments
                .filter(id.eq(the_comment_id))
                .select(user_id)
                .first::<UserId>(connection)?;
            actor.check_comment_deletion(author_id)?;

            diesel::delete(comments.filter(id.eq(the_comment_id))).execute(connection)?;
            Ok(())
        })
    }
}

/// Load the feature set of each given room, preserving the rooms' order.
fn load_full_rooms(
    the_rooms: Vec<models::Room>,
    connection: &mut PgConnection,
) -> Result<Vec<models::FullRoom>, diesel::result::Error> {
    let all_features: HashMap<FeatureId, models::Feature> = schema::features::table
        .select(models::Feature::as_select())
        .load::<models::Feature>(connection)?
        .into_iter()
        .map(|feature| (feature.id, feature))
        .collect();

    let the_room_features = models::RoomFeatureMapping::belonging_to(&the_rooms)
        .select(models::RoomFeatureMapping::as_select())
        .load::<models::RoomFeatureMapping>(connection)?
        .grouped_by(&the_rooms);

    Ok(the_rooms
        .into_iter()
        .zip(the_room_features)
        .map(|(room, mappings)| models::FullRoom {
            features: mappings
                .into_iter()
                .filter_map(|mapping| all_features.get(&mapping.feature_id).cloned())
                .collect(),
            room,
        })
        .collect())
}

/// Load the attendee set of each given meeting, preserving the meetings' order.
fn load_full_meetings(
    the_meetings: Vec<models::Meeting>,
    connection: &mut PgConnection,
) -> Result<Vec<models::FullMeeting>, diesel::result::Error> {
    let the_attendees = models::MeetingAttendee::belonging_to(&the_meetings)
        .select(models::MeetingAttendee::as_select())
        .load::<models::MeetingAttendee>(connection)?
        .grouped_by(&the_meetings);

    Ok(the_meetings
        .into_iter()
        .zip(the_attendees)
        .map(|(meeting, attendees)| models::FullMeeting {
            meeting,
            attendees: attendees
                .into_iter()
                .map(|attendee| (attendee.user_id, attendee.status))
                .collect(),
        })
        .collect())
}

fn load_sorted_topics(
    the_agenda_id: AgendaId,
    connection: &mut PgConnection,
) -> Result<Vec<models::AgendaTopic>, diesel::result::Error> {
    use schema::agenda_topics::dsl::*;

    agenda_topics
        .filter(agenda_id.eq(the_agenda_id))
        .order_by((sort_key.asc(), id.asc()))
        .select(models::AgendaTopic::as_select())
        .load::<models::AgendaTopic>(connection)
}

/// SQL form of [super::scheduling::conflicts_with]: check for a non-cancelled meeting overlapping
/// the given room/date/time window, optionally ignoring one meeting's own reservation.
fn room_is_occupied(
    the_room_id: RoomId,
    the_date: NaiveDate,
    the_start_time: NaiveTime,
    the_end_time: NaiveTime,
    exclude_meeting: Option<MeetingId>,
    connection: &mut PgConnection,
) -> Result<bool, diesel::result::Error> {
    use schema::meetings::dsl::*;

    let mut query = meetings
        .filter(room_id.eq(the_room_id))
        .filter(date.eq(the_date))
        .filter(status.ne(models::MeetingStatus::Cancelled))
        .filter(start_time.lt(the_end_time))
        .filter(end_time.gt(the_start_time))
        .into_boxed();
    if let Some(excluded_id) = exclude_meeting {
        query = query.filter(id.ne(excluded_id));
    }
    query
        .select(id)
        .first::<MeetingId>(connection)
        .optional()
        .map(|row| row.is_some())
}

/// Insert attendee records for the given users, all starting as "invited". Users that are already
/// attendees keep their existing record and status.
fn insert_attendees(
    the_meeting_id: MeetingId,
    user_ids: &[UserId],
    connection: &mut PgConnection,
) -> Result<(), diesel::result::Error> {
    use schema::meeting_attendees::dsl::*;

    let now = chrono::Utc::now();
    diesel::insert_into(meeting_attendees)
        .values(
            user_ids
                .iter()
                .map(|the_user_id| models::NewMeetingAttendee {
                    meeting_id: the_meeting_id,
                    user_id: *the_user_id,
                    status: models::AttendanceStatus::Invited,
                    created_at: now,
                    updated_at: now,
                })
                .collect::<Vec<_>>(),
        )
        .on_conflict((meeting_id, user_id))
        .do_nothing()
        .execute(connection)
        .map(|_| ())
}

/// Get a meeting's scheduler for an authorization check. Fails with [StoreError::NotExisting] if
/// the meeting does not exist.
fn get_meeting_scheduler(
    the_meeting_id: MeetingId,
    connection: &mut PgConnection,
) -> Result<UserId, StoreError> {
    Ok(schema::meetings::table
        .filter(schema::meetings::id.eq(the_meeting_id))
        .select(schema::meetings::scheduled_by)
        .first::<UserId>(connection)?)
}

/// Get the scheduler of a MoM entry's meeting, resolving the entry → meeting relation.
fn get_mom_entry_scheduler(
    the_mom_entry_id: MomEntryId,
    connection: &mut PgConnection,
) -> Result<UserId, StoreError> {
    let the_meeting_id = schema::mom_entries::table
        .filter(schema::mom_entries::id.eq(the_mom_entry_id))
        .select(schema::mom_entries::meeting_id)
        .first::<MeetingId>(connection)?;
    get_meeting_scheduler(the_meeting_id, connection)
}

/// Get the scheduler of an action item's meeting, resolving the item → MoM entry → meeting chain.
fn get_action_item_scheduler(
    the_item_id: ActionItemId,
    connection: &mut PgConnection,
) -> Result<UserId, StoreError> {
    let the_mom_entry_id = schema::action_items::table
        .filter(schema::action_items::id.eq(the_item_id))
        .select(schema::action_items::mom_entry_id)
        .first::<MomEntryId>(connection)?;
    get_mom_entry_scheduler(the_mom_entry_id, connection)
}

/// Get a topic's owner and the scheduler of its meeting, for the topic mutation checks.
fn get_topic_authorization_data(
    the_topic_id: TopicId,
    connection: &mut PgConnection,
) -> Result<(UserId, UserId), StoreError> {
    let (the_owner_id, the_agenda_id) = schema::agenda_topics::table
        .filter(schema::agenda_topics::id.eq(the_topic_id))
        .select((schema::agenda_topics::owner_id, schema::agenda_topics::agenda_id))
        .first::<(UserId, AgendaId)>(connection)?;
    let the_meeting_id = schema::agendas::table
        .filter(schema::agendas::id.eq(the_agenda_id))
        .select(schema::agendas::meeting_id)
        .first::<MeetingId>(connection)?;
    let scheduler = get_meeting_scheduler(the_meeting_id, connection)?;
    Ok((the_owner_id, scheduler))
}

/// Replace a room's feature set with the given one.
fn update_room_features(
    the_room_id: RoomId,
    feature_ids: &[FeatureId],
    connection: &mut PgConnection,
) -> Result<(), diesel::result::Error> {
    use schema::feature_room::dsl::*;

    diesel::delete(feature_room.filter(room_id.eq(the_room_id))).execute(connection)?;

    diesel::insert_into(feature_room)
        .values(
            feature_ids
                .iter()
                .map(|the_feature_id| (room_id.eq(the_room_id), feature_id.eq(the_feature_id)))
                .collect::<Vec<_>>(),
        )
        .on_conflict((room_id, feature_id))
        .do_nothing()
        .execute(connection)
        .map(|_| ())
}

type BoxedBoolExpression<'a, Table> =
    Box<dyn BoxableExpression<Table, diesel::pg::Pg, SqlType = diesel::sql_types::Bool> + 'a>;

fn meeting_filter_to_sql<'a>(
    filter: MeetingFilter,
) -> BoxedBoolExpression<'a, schema::meetings::table> {
    use schema::meetings::dsl::*;

    let mut expression: BoxedBoolExpression<'a, schema::meetings::table> =
        Box::new(diesel::dsl::sql::<diesel::sql_types::Bool>("TRUE"));
    if let Some(the_date) = filter.date {
        expression = Box::new(expression.as_expression().and(date.eq(the_date)));
    }
    if let Some(the_status) = filter.status {
        expression = Box::new(expression.as_expression().and(status.eq(the_status)));
    }
    if let Some(the_room_id) = filter.room_id {
        expression = Box::new(expression.as_expression().and(room_id.eq(the_room_id)));
    }
    if let Some(from_date) = filter.from_date {
        expression = Box::new(expression.as_expression().and(date.ge(from_date)));
    }
    if let Some(to_date) = filter.to_date {
        expression = Box::new(expression.as_expression().and(date.le(to_date)));
    }
    expression
}

/// Sql condition for meetings the given user schedules or attends
fn meeting_involves_user<'a>(
    the_user_id: UserId,
) -> BoxedBoolExpression<'a, schema::meetings::table> {
    use schema::meetings::dsl::*;

    Box::new(scheduled_by.eq(the_user_id).or(exists(
        schema::meeting_attendees::table
            .select(0.as_sql::<diesel::sql_types::Integer>())
            .filter(schema::meeting_attendees::meeting_id.eq(id))
            .filter(schema::meeting_attendees::user_id.eq(the_user_id)),
    )))
}

fn action_item_filter_to_sql<'a>(
    filter: ActionItemFilter,
) -> BoxedBoolExpression<'a, schema::action_items::table> {
    use schema::action_items::dsl::*;

    let mut expression: BoxedBoolExpression<'a, schema::action_items::table> =
        Box::new(diesel::dsl::sql::<diesel::sql_types::Bool>("TRUE"));
    if let Some(the_meeting_id) = filter.meeting_id {
        expression = Box::new(expression.as_expression().and(exists(
            schema::mom_entries::table
                .select(0.as_sql::<diesel::sql_types::Integer>())
                .filter(schema::mom_entries::id.eq(mom_entry_id))
                .filter(schema::mom_entries::meeting_id.eq(the_meeting_id)),
        )));
    }
    if let Some(the_mom_entry_id) = filter.mom_entry_id {
        expression = Box::new(
            expression
                .as_expression()
                .and(mom_entry_id.eq(the_mom_entry_id)),
        );
    }
    if let Some(the_status) = filter.status {
        expression = Box::new(expression.as_expression().and(status.eq(the_status)));
    }
    if let Some(the_assigned_to) = filter.assigned_to {
        expression = Box::new(
            expression
                .as_expression()
                .and(assigned_to.eq(the_assigned_to).assume_not_null()),
        );
    }
    expression
}
