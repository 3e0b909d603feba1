//! Karma notification model

use crate::models::transaction::AffectedUser;

/// Outcome of a karma pipeline run, rendered into channel messages by the
/// notification sink (see `SlackClient::send_karma_notifications`).
#[derive(Debug, Clone)]
pub struct KarmaNotification {
    pub channel: String,
    pub from_user: String,
    pub can_give_karma: bool,
    pub can_take_karma: bool,
    pub given_karmas_to_himself: bool,
    pub taken_karmas_from_himself: bool,
    pub affected_users: Vec<AffectedUser>,
}
