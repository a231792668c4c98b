//! Bridge from lead score changes to notifications.

use serde_json::json;

use super::dispatcher::{DispatchSummary, NotificationDispatcher};
use crate::models::{EventType, Lead, NotificationPriority, NotificationRequest, ScoreChange};

/// Fire `lead_hot` when a real lead crosses into Hot.
///
/// Returns `None` when the change does not warrant a notification.
pub async fn notify_lead_scored(
    dispatcher: &NotificationDispatcher,
    lead: &Lead,
    change: ScoreChange,
) -> Option<DispatchSummary> {
    if lead.is_simulated || !change.became_hot() {
        return None;
    }

    let subject = match &lead.company {
        Some(company) => format!("{} ({})", lead.name, company),
        None => lead.name.clone(),
    };

    let request = NotificationRequest::new(
        "Lead is now hot",
        format!("{} scored {} and is ready for follow-up.", subject, change.current.score),
    )
    .with_priority(NotificationPriority::High)
    .with_metadata(json!({
        "leadId": lead.id,
        "score": change.current.score,
        "temperature": change.current.temperature,
        "previousTemperature": change.previous.temperature,
    }));

    Some(dispatcher.trigger(EventType::LeadHot, request).await)
}
