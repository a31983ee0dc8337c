use crate::auth_session::SessionToken;
use crate::data_store::store_mock::StoreMock;
use crate::web::AppState;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use boardroom_api_types as api;
use serde_json::json;
use std::sync::Arc;

use sample_data::*;


const SECRET: &str = "unittest-secret";

fn session_header(user_id: i32) -> (&'static str, String) {
    ("X-SESSION-TOKEN", SessionToken::new(user_id).to_string(SECRET))
}

fn sample_store() -> Arc<StoreMock> {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    store
}

macro_rules! init_test_app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .configure(super::configure_app)
                .app_data(web::Data::new(AppState {
                    store: $store.clone(),
                    secret: SECRET.to_string(),
                })),
        )
        .await
    };
}

#[actix_web::test]
async fn test_login_and_get_current_user() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "erika@example.com", "password": SAMPLE_PASSWORD}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: api::LoginResponse = test::read_body_json(resp).await;
    assert_eq!(login.user.id, USER_SCHEDULER);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(("X-SESSION-TOKEN", login.session_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let user: api::User = test::read_body_json(resp).await;
    assert_eq!(user.email, "erika@example.com");
}

#[actix_web::test]
async fn test_login_with_wrong_password() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "erika@example.com", "password": "not the password"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_missing_session_token() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::get().uri("/api/v1/meetings").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_create_meeting_with_overlap_rejected() {
    let store = sample_store();
    let app = init_test_app!(store);

    // Overlaps meeting 100 (09:00-10:00) in the same room
    let req = test::TestRequest::post()
        .uri("/api/v1/meetings")
        .insert_header(session_header(USER_ATTENDEE))
        .set_json(json!({
            "title": "Conflicting",
            "date": "2030-05-20",
            "start_time": "09:30:00",
            "end_time": "10:30:00",
            "room_id": ROOM_BOARD,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_create_meeting_touching_window_accepted() {
    let store = sample_store();
    let app = init_test_app!(store);

    // Starts exactly when meeting 100 ends, which is no overlap
    let req = test::TestRequest::post()
        .uri("/api/v1/meetings")
        .insert_header(session_header(USER_ATTENDEE))
        .set_json(json!({
            "title": "Back to back",
            "date": "2030-05-20",
            "start_time": "10:00:00",
            "end_time": "11:00:00",
            "room_id": ROOM_BOARD,
            "attendees": [USER_SCHEDULER],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let meeting: api::Meeting = test::read_body_json(resp).await;
    assert_eq!(meeting.scheduled_by, USER_ATTENDEE);
    assert_eq!(meeting.status, api::MeetingStatus::Scheduled);

    // Creation also sets up an empty agenda and the initial minutes record
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/meetings/{}/agenda", meeting.id))
        .insert_header(session_header(USER_ATTENDEE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/meetings/{}/mom-entries", meeting.id))
        .insert_header(session_header(USER_ATTENDEE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let entries: Vec<api::MomEntry> = test::read_body_json(resp).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Meeting Minutes");
    assert_eq!(entries[0].notes, "");
}

#[actix_web::test]
async fn test_create_meeting_with_invalid_time_window() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/meetings")
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(json!({
            "title": "Backwards",
            "date": "2030-05-21",
            "start_time": "10:00:00",
            "end_time": "10:00:00",
            "room_id": ROOM_BOARD,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_create_meeting_in_the_past() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/meetings")
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(json!({
            "title": "Retroactive",
            "date": "2020-05-21",
            "start_time": "10:00:00",
            "end_time": "11:00:00",
            "room_id": ROOM_BOARD,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_meeting_update_authorization() {
    let store = sample_store();
    let app = init_test_app!(store);

    // User 7 is an attendee but not the scheduler
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/meetings/{}", MEETING_MAIN))
        .insert_header(session_header(USER_ATTENDEE))
        .set_json(json!({"title": "Hijacked"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Admins may update meetings they did not schedule
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/meetings/{}", MEETING_MAIN))
        .insert_header(session_header(USER_ADMIN))
        .set_json(json!({"title": "Quarterly Planning (rev. 2)"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let meeting: api::Meeting = test::read_body_json(resp).await;
    assert_eq!(meeting.title, "Quarterly Planning (rev. 2)");
}

#[actix_web::test]
async fn test_reschedule_into_occupied_room_rejected() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/meetings/{}", MEETING_OTHER))
        .insert_header(session_header(USER_ATTENDEE))
        .set_json(json!({
            "room_id": ROOM_BOARD,
            "start_time": "09:30:00",
            "end_time": "10:30:00",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_meeting_status_update() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/meetings/{}/status", MEETING_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(json!({"status": "in_progress"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/meetings/{}", MEETING_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let meeting: api::Meeting = test::call_and_read_body_json(&app, req).await;
    assert_eq!(meeting.status, api::MeetingStatus::InProgress);
}

#[actix_web::test]
async fn test_join_and_leave_meeting() {
    let store = sample_store();
    let app = init_test_app!(store);

    // Joining twice is idempotent
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/meetings/{}/join", MEETING_MAIN))
            .insert_header(session_header(USER_ATTENDEE))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/meetings/{}", MEETING_MAIN))
        .insert_header(session_header(USER_ATTENDEE))
        .to_request();
    let meeting: api::Meeting = test::call_and_read_body_json(&app, req).await;
    let records: Vec<&api::Attendee> = meeting
        .attendees
        .iter()
        .filter(|a| a.user_id == USER_ATTENDEE)
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, api::AttendanceStatus::Accepted);

    // Leaving reverts to "invited" but keeps the attendee record
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/meetings/{}/leave", MEETING_MAIN))
        .insert_header(session_header(USER_ATTENDEE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/meetings/{}", MEETING_MAIN))
        .insert_header(session_header(USER_ATTENDEE))
        .to_request();
    let meeting: api::Meeting = test::call_and_read_body_json(&app, req).await;
    let record = meeting
        .attendees
        .iter()
        .find(|a| a.user_id == USER_ATTENDEE)
        .unwrap();
    assert_eq!(record.status, api::AttendanceStatus::Invited);
}

#[actix_web::test]
async fn test_duplicate_agenda_rejected() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/meetings/{}/agenda", MEETING_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_agenda_upsert() {
    let store = sample_store();
    let app = init_test_app!(store);

    // Meeting 100 already has an agenda, so the upsert updates it
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/meetings/{}/agenda", MEETING_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(json!({"title": "Revised Agenda"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/agendas/{}", AGENDA_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/meetings/{}/agenda", MEETING_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(json!({"title": "Fresh Agenda", "description": "Take two"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn test_reorder_skips_foreign_topics() {
    let store = sample_store();
    let app = init_test_app!(store);

    // Topic 310 belongs to another agenda and must not be touched
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/agendas/{}/topics/order", AGENDA_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(json!({"topics": [
            {"id": TOPIC_ROADMAP, "order": 0},
            {"id": TOPIC_BUDGET, "order": 1},
            {"id": TOPIC_FOREIGN, "order": 2},
        ]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let topics: Vec<api::AgendaTopic> = test::read_body_json(resp).await;
    let ids: Vec<i32> = topics.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![TOPIC_ROADMAP, TOPIC_BUDGET]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/agendas/{}/topics", AGENDA_OTHER))
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let topics: Vec<api::AgendaTopic> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(topics[0].id, TOPIC_FOREIGN);
    assert_eq!(topics[0].order, 0);
}

#[actix_web::test]
async fn test_topic_update_by_owner_and_scheduler_only() {
    let store = sample_store();
    let app = init_test_app!(store);

    // Admin 9 is neither owner nor scheduler but may still edit
    for (user_id, expected) in [
        (USER_ATTENDEE, StatusCode::NO_CONTENT),
        (USER_SCHEDULER, StatusCode::NO_CONTENT),
        (USER_ADMIN, StatusCode::NO_CONTENT),
    ] {
        let req = test::TestRequest::patch()
            .uri(&format!("/api/v1/topics/{}", TOPIC_BUDGET))
            .insert_header(session_header(user_id))
            .set_json(json!({"estimated_duration": 30}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }

    // Topic 310 is owned by user 7 on user 7's meeting, so user 5 has no relationship to it
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/topics/{}", TOPIC_FOREIGN))
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(json!({"title": "Renamed"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_action_item_assignment_round_trip() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/action-items/{}/assignee", ACTION_ITEM_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(json!({"assigned_to": USER_ATTENDEE}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/action-items?mom_entry_id={}", MOM_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let items: Vec<api::ActionItem> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(items[0].assigned_to, Some(USER_ATTENDEE));

    // Explicit null reverts the item to "for everyone"
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/action-items/{}/assignee", ACTION_ITEM_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(json!({"assigned_to": null}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/action-items?mom_entry_id={}", MOM_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let items: Vec<api::ActionItem> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(items[0].assigned_to, None);
}

#[actix_web::test]
async fn test_action_item_update_requires_scheduler() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/action-items/{}", ACTION_ITEM_MAIN))
        .insert_header(session_header(USER_ATTENDEE))
        .set_json(json!({"description": "Changed"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/action-items/{}", ACTION_ITEM_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(json!({"description": "Changed"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn test_comment_deletion_authorization() {
    let store = sample_store();
    let app = init_test_app!(store);

    // User 5 is the meeting's scheduler, but not the comment's author
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/comments/{}", COMMENT_MAIN))
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/comments/{}", COMMENT_MAIN))
        .insert_header(session_header(USER_ATTENDEE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/meetings/{}/comments", MEETING_MAIN))
        .insert_header(session_header(USER_ATTENDEE))
        .to_request();
    let comments: Vec<api::Comment> = test::call_and_read_body_json(&app, req).await;
    assert!(comments.is_empty());
}

#[actix_web::test]
async fn test_room_management_requires_admin() {
    let store = sample_store();
    let app = init_test_app!(store);

    let new_room = json!({
        "name": "Workshop Space",
        "location": "1st floor",
        "capacity": 20,
        "features": [1],
    });
    let req = test::TestRequest::post()
        .uri("/api/v1/rooms")
        .insert_header(session_header(USER_SCHEDULER))
        .set_json(&new_room)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/rooms")
        .insert_header(session_header(USER_ADMIN))
        .set_json(&new_room)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let room: api::Room = test::read_body_json(resp).await;
    assert_eq!(room.name, "Workshop Space");
    assert_eq!(room.features.len(), 1);
    assert_eq!(room.features[0].slug, "projector");
}

#[actix_web::test]
async fn test_delete_booked_room_rejected() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/rooms/{}", ROOM_BOARD))
        .insert_header(session_header(USER_ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_available_rooms() {
    let store = sample_store();
    let app = init_test_app!(store);

    // The board room is booked 09:00-10:00; the huddle space's overlapping
    // reservation is cancelled and does not count
    let req = test::TestRequest::get()
        .uri("/api/v1/rooms/available?date=2030-05-20&start_time=09:30:00&end_time=10:30:00")
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let rooms: Vec<api::Room> = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = rooms.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Huddle Space"]);

    // Touching windows on both sides leave both rooms free
    let req = test::TestRequest::get()
        .uri("/api/v1/rooms/available?date=2030-05-20&start_time=10:00:00&end_time=11:00:00")
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let rooms: Vec<api::Room> = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = rooms.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Board Room", "Huddle Space"]);
}

#[actix_web::test]
async fn test_my_meetings_and_partition() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::get()
        .uri("/api/v1/my/meetings")
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let meetings: Vec<api::Meeting> = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i32> = meetings.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![MEETING_OLD, MEETING_MAIN]);

    let req = test::TestRequest::get()
        .uri("/api/v1/my/meetings/upcoming")
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let meetings: Vec<api::Meeting> = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i32> = meetings.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![MEETING_MAIN]);

    let req = test::TestRequest::get()
        .uri("/api/v1/my/meetings/past")
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let meetings: Vec<api::Meeting> = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i32> = meetings.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![MEETING_OLD]);
}

#[actix_web::test]
async fn test_meeting_list_filters() {
    let store = sample_store();
    let app = init_test_app!(store);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/meetings?room_id={}", ROOM_HUDDLE))
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let meetings: Vec<api::Meeting> = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i32> = meetings.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![MEETING_CANCELLED, MEETING_OTHER]);

    let req = test::TestRequest::get()
        .uri("/api/v1/meetings?status=completed")
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let meetings: Vec<api::Meeting> = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i32> = meetings.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![MEETING_OLD]);

    let req = test::TestRequest::get()
        .uri("/api/v1/meetings?from_date=2030-01-01&date=2030-05-20")
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let meetings: Vec<api::Meeting> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(meetings.len(), 3);
}

#[actix_web::test]
async fn test_store_error_maps_to_internal_error() {
    let store = sample_store();
    store.data.lock().unwrap().next_error = Some(
        crate::data_store::StoreError::ConnectionError("connection refused".to_string()),
    );
    let app = init_test_app!(store);

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms")
        .insert_header(session_header(USER_SCHEDULER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
