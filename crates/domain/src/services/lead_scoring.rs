//! Lead scoring engine.
//!
//! Pure function of a lead and the current time. Sums weighted engagement
//! signals, decays the total by staleness, clamps at zero and classifies the
//! result into a temperature. Hard intent signals (demo requested, meeting
//! booked, contacted sales) always classify as Hot and lift the score to the
//! Hot threshold so score and temperature never disagree.

use chrono::{DateTime, Utc};

use crate::models::{EngagementSignals, Lead, LeadScore, LeadTemperature};

/// Minimum score for a Hot lead.
pub const HOT_THRESHOLD: u32 = 70;

/// Minimum score for a Warm lead.
pub const WARM_THRESHOLD: u32 = 40;

/// Staleness (in days) at which a lead is expired outright.
pub const EXPIRY_DAYS: i64 = 90;

/// Signal weights.
pub mod weights {
    pub const DEMO_REQUESTED: i64 = 30;
    pub const BOOKED_MEETING: i64 = 25;
    pub const CONTACTED_SALES: i64 = 20;
    pub const CONTACT_FORM_SUBMITTED: i64 = 15;
    pub const INDUSTRY_MATCH: i64 = 10;
    pub const COMPANY_SIZE_MATCH: i64 = 10;
    pub const EMAIL_VERIFIED: i64 = 5;
    pub const PHONE_VERIFIED: i64 = 5;

    /// Per pricing page visit.
    pub const PRICING_PAGE_VISIT: i64 = 5;
    /// Per tracked link click.
    pub const LINK_CLICK: i64 = 3;
    /// Per email open.
    pub const EMAIL_OPEN: i64 = 2;
    /// Per website visit.
    pub const WEBSITE_VISIT: i64 = 1;

    pub const UNSUBSCRIBED_PENALTY: i64 = 20;
}

/// Decay band applied to the raw score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayBand {
    /// Under 30 days.
    Fresh,
    /// 30 to 59 days: x0.75.
    Cooling,
    /// 60 to 89 days: x0.5.
    Stale,
    /// 90 days or more: score is zero.
    Expired,
}

impl DecayBand {
    pub fn for_days(days: i64) -> Self {
        match days {
            d if d >= EXPIRY_DAYS => DecayBand::Expired,
            d if d >= 60 => DecayBand::Stale,
            d if d >= 30 => DecayBand::Cooling,
            _ => DecayBand::Fresh,
        }
    }

    /// Apply the band's multiplier, flooring the result.
    fn apply(&self, score: i64) -> i64 {
        match self {
            DecayBand::Fresh => score,
            DecayBand::Cooling => (score * 3).div_euclid(4),
            DecayBand::Stale => score.div_euclid(2),
            DecayBand::Expired => 0,
        }
    }
}

/// Score a lead as of `now`.
pub fn calculate_lead_score(lead: &Lead, now: DateTime<Utc>) -> LeadScore {
    if lead.is_simulated {
        return LeadScore::COLD_ZERO;
    }

    let band = DecayBand::for_days(days_since_engagement(lead.last_engagement_at, now));
    if band == DecayBand::Expired {
        return LeadScore::COLD_ZERO;
    }

    let decayed = band.apply(raw_score(&lead.signals)).max(0);
    let mut score = u32::try_from(decayed).unwrap_or(u32::MAX);

    let temperature = if lead.signals.has_hard_intent() {
        score = score.max(HOT_THRESHOLD);
        LeadTemperature::Hot
    } else {
        classify(score)
    };

    LeadScore { score, temperature }
}

/// Weighted sum of all signals before decay. May be negative.
pub fn raw_score(signals: &EngagementSignals) -> i64 {
    let flag = |set: bool, weight: i64| if set { weight } else { 0 };

    let mut total = flag(signals.demo_requested, weights::DEMO_REQUESTED)
        + flag(signals.booked_meeting, weights::BOOKED_MEETING)
        + flag(signals.contacted_sales, weights::CONTACTED_SALES)
        + flag(signals.contact_form_submitted, weights::CONTACT_FORM_SUBMITTED)
        + flag(signals.industry_match, weights::INDUSTRY_MATCH)
        + flag(signals.company_size_match, weights::COMPANY_SIZE_MATCH)
        + flag(signals.email_verified, weights::EMAIL_VERIFIED)
        + flag(signals.phone_verified, weights::PHONE_VERIFIED);

    total += i64::from(signals.pricing_page_visits) * weights::PRICING_PAGE_VISIT;
    total += i64::from(signals.link_clicks) * weights::LINK_CLICK;
    total += i64::from(signals.email_opens) * weights::EMAIL_OPEN;
    total += i64::from(signals.website_visits) * weights::WEBSITE_VISIT;

    if signals.unsubscribed {
        total -= weights::UNSUBSCRIBED_PENALTY;
    }

    total
}

/// Threshold classification without the hard-intent override.
pub fn classify(score: u32) -> LeadTemperature {
    if score >= HOT_THRESHOLD {
        LeadTemperature::Hot
    } else if score >= WARM_THRESHOLD {
        LeadTemperature::Warm
    } else {
        LeadTemperature::Cold
    }
}

/// Whole days since last engagement. Missing or future timestamps count as 0.
fn days_since_engagement(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    last.map(|at| (now - at).num_days().max(0)).unwrap_or(0)
}
