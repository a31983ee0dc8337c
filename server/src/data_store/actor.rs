use crate::cli::CliAuthTokenKey;
use crate::data_store::{StoreError, UserId};

/// Identity and capability of the acting user for data_store operations
///
/// The Actor is our main protection against accidental unauthorized-access bugs: every mutating
/// data_store function requires an Actor and checks the actor's relationship to the affected
/// resource through one of the predicates below. An Actor can only be created by
/// [crate::data_store::BoardroomStoreFacade::get_actor_for_session], based on a client's verified
/// session token, and by cli functions via [Actor::create_for_cli].
///
/// There is deliberately no ambient "current user": the actor is threaded explicitly into every
/// operation call.
#[derive(Clone, Copy, Debug)]
pub struct Actor {
    user_id: UserId,
    is_admin: bool,
}

impl Actor {
    /// Create a new Actor for a client session.
    ///
    /// This function must only be used by implementations of
    /// [crate::data_store::BoardroomStoreFacade::get_actor_for_session] after checking that the
    /// session's user exists and is active!
    pub(super) fn create_for_session(user_id: UserId, is_admin: bool) -> Self {
        Actor { user_id, is_admin }
    }

    /// Create a new Actor for a command line interface functionality.
    ///
    /// The Actor is created with admin capability and a user id that matches no real user.
    ///
    /// This function must only be used by command line interface functions, not in the context of
    /// the web server!
    pub fn create_for_cli(_key: &CliAuthTokenKey) -> Self {
        Actor {
            user_id: 0,
            is_admin: true,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// The recurring authorization predicate for meeting-scoped mutations: the actor must be the
    /// meeting's scheduler or an admin.
    ///
    /// This predicate gates meeting, agenda, MoM-entry and action-item mutation paths. It is
    /// checked after the resource's existence, so a denied client learns no more than a matching
    /// read would tell it.
    pub fn check_meeting_mutation(
        &self,
        scheduled_by: UserId,
        action: &'static str,
    ) -> Result<(), StoreError> {
        if self.user_id == scheduled_by || self.is_admin {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied { action })
        }
    }

    /// Authorization predicate for topic update/delete: additionally to the meeting's scheduler
    /// and admins, the topic's owner may mutate it.
    pub fn check_topic_mutation(
        &self,
        owner_id: UserId,
        scheduled_by: UserId,
        action: &'static str,
    ) -> Result<(), StoreError> {
        if self.user_id == owner_id || self.user_id == scheduled_by || self.is_admin {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied { action })
        }
    }

    /// Authorization predicate for comment deletion: author or admin.
    pub fn check_comment_deletion(&self, author_id: UserId) -> Result<(), StoreError> {
        if self.user_id == author_id || self.is_admin {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                action: "delete this comment",
            })
        }
    }

    /// Authorization predicate for administration operations (room/feature/user management).
    pub fn check_admin(&self, action: &'static str) -> Result<(), StoreError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied { action })
        }
    }
}
