//! Lead domain model.
//!
//! A lead carries engagement signals; its score and temperature are derived
//! from those signals by the scoring engine and are never edited directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::services::lead_scoring::calculate_lead_score;

/// Lead qualification temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadTemperature {
    Hot,
    Warm,
    #[default]
    Cold,
}

impl fmt::Display for LeadTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadTemperature::Hot => write!(f, "hot"),
            LeadTemperature::Warm => write!(f, "warm"),
            LeadTemperature::Cold => write!(f, "cold"),
        }
    }
}

/// Output of the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeadScore {
    pub score: u32,
    pub temperature: LeadTemperature,
}

impl LeadScore {
    pub const COLD_ZERO: LeadScore = LeadScore {
        score: 0,
        temperature: LeadTemperature::Cold,
    };
}

/// Behavioural and profile-fit signals feeding the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EngagementSignals {
    pub demo_requested: bool,
    pub contact_form_submitted: bool,
    pub booked_meeting: bool,
    pub contacted_sales: bool,
    pub industry_match: bool,
    pub company_size_match: bool,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub unsubscribed: bool,
    pub pricing_page_visits: u32,
    pub website_visits: u32,
    pub email_opens: u32,
    pub link_clicks: u32,
}

impl EngagementSignals {
    /// Signals that force a lead to Hot regardless of the computed score.
    pub fn has_hard_intent(&self) -> bool {
        self.demo_requested || self.booked_meeting || self.contacted_sales
    }
}

/// A single observed engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementSignal {
    DemoRequested,
    ContactFormSubmitted,
    MeetingBooked,
    ContactedSales,
    PricingPageVisit,
    WebsiteVisit,
    EmailOpened,
    LinkClicked,
    EmailVerified,
    PhoneVerified,
    Unsubscribed,
}

impl EngagementSignal {
    /// Whether observing this signal refreshes `last_engagement_at`.
    pub fn counts_as_engagement(&self) -> bool {
        !matches!(self, EngagementSignal::Unsubscribed)
    }
}

/// Score before and after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChange {
    pub previous: LeadScore,
    pub current: LeadScore,
}

impl ScoreChange {
    pub fn temperature_changed(&self) -> bool {
        self.previous.temperature != self.current.temperature
    }

    pub fn became_hot(&self) -> bool {
        self.current.temperature == LeadTemperature::Hot
            && self.previous.temperature != LeadTemperature::Hot
    }
}

/// Represents a sales lead.
///
/// Score and temperature are derived state: they are serialized for readers
/// but never read back, and a deserialized lead is rescored as of its
/// `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LeadRecord")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
    #[serde(flatten)]
    pub signals: EngagementSignals,
    pub last_engagement_at: Option<DateTime<Utc>>,
    pub is_simulated: bool,
    score: u32,
    temperature: LeadTemperature,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored form of a [`Lead`] without the derived score.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeadRecord {
    id: Uuid,
    name: String,
    company: Option<String>,
    #[serde(flatten)]
    signals: EngagementSignals,
    last_engagement_at: Option<DateTime<Utc>>,
    #[serde(default)]
    is_simulated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LeadRecord> for Lead {
    fn from(record: LeadRecord) -> Self {
        let mut lead = Self {
            id: record.id,
            name: record.name,
            company: record.company,
            signals: record.signals,
            last_engagement_at: record.last_engagement_at,
            is_simulated: record.is_simulated,
            score: 0,
            temperature: LeadTemperature::Cold,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        let current = calculate_lead_score(&lead, lead.updated_at);
        lead.score = current.score;
        lead.temperature = current.temperature;
        lead
    }
}

impl Lead {
    /// Create a lead with no signals, scored as of `now`.
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut lead = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            company: None,
            signals: EngagementSignals::default(),
            last_engagement_at: None,
            is_simulated: false,
            score: 0,
            temperature: LeadTemperature::Cold,
            created_at: now,
            updated_at: now,
        };
        lead.rescore(now);
        lead
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn temperature(&self) -> LeadTemperature {
        self.temperature
    }

    pub fn current_score(&self) -> LeadScore {
        LeadScore {
            score: self.score,
            temperature: self.temperature,
        }
    }

    /// Recompute score and temperature as of `now`.
    pub fn rescore(&mut self, now: DateTime<Utc>) -> ScoreChange {
        let previous = self.current_score();
        let current = calculate_lead_score(self, now);
        self.score = current.score;
        self.temperature = current.temperature;
        self.updated_at = now;
        ScoreChange { previous, current }
    }

    /// Apply an observed engagement and rescore.
    pub fn record_engagement(&mut self, signal: EngagementSignal, now: DateTime<Utc>) -> ScoreChange {
        let s = &mut self.signals;
        match signal {
            EngagementSignal::DemoRequested => s.demo_requested = true,
            EngagementSignal::ContactFormSubmitted => s.contact_form_submitted = true,
            EngagementSignal::MeetingBooked => s.booked_meeting = true,
            EngagementSignal::ContactedSales => s.contacted_sales = true,
            EngagementSignal::PricingPageVisit => {
                s.pricing_page_visits = s.pricing_page_visits.saturating_add(1)
            }
            EngagementSignal::WebsiteVisit => s.website_visits = s.website_visits.saturating_add(1),
            EngagementSignal::EmailOpened => s.email_opens = s.email_opens.saturating_add(1),
            EngagementSignal::LinkClicked => s.link_clicks = s.link_clicks.saturating_add(1),
            EngagementSignal::EmailVerified => s.email_verified = true,
            EngagementSignal::PhoneVerified => s.phone_verified = true,
            EngagementSignal::Unsubscribed => s.unsubscribed = true,
        }

        if signal.counts_as_engagement() {
            self.last_engagement_at = Some(now);
        }

        self.rescore(now)
    }

    /// Update profile-fit signals and rescore.
    pub fn set_profile_fit(
        &mut self,
        industry_match: bool,
        company_size_match: bool,
        now: DateTime<Utc>,
    ) -> ScoreChange {
        self.signals.industry_match = industry_match;
        self.signals.company_size_match = company_size_match;
        self.rescore(now)
    }

    /// Flag the lead as simulated (demo/training data) and rescore.
    pub fn mark_simulated(&mut self, now: DateTime<Utc>) -> ScoreChange {
        self.is_simulated = true;
        self.rescore(now)
    }
}
