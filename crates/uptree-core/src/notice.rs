//! Outbound notices
//!
//! The engine emits one notice per channel per tier transition and forgets
//! about it. Rendering and delivery belong to the notification service; the
//! payloads here carry everything its templates need.

use crate::tier::Tier;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Delivery channel for a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeChannel {
    /// Email, only emitted when the agent has an address on file
    Email,
    /// In-app inbox
    InApp,
}

/// A fire-and-forget notification event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// Agent moved up a rank today.
    TierUpgraded {
        /// Delivery channel
        channel: NoticeChannel,
        /// Agent login name
        username: String,
        /// Email address, present for the email channel
        email: Option<String>,
        /// Agent display name
        full_name: String,
        /// Rank reached
        tier: Tier,
    },
    /// Agent failed retention and moved down a rank today.
    TierDowngraded {
        /// Delivery channel
        channel: NoticeChannel,
        /// Agent login name
        username: String,
        /// Email address, present for the email channel
        email: Option<String>,
        /// Agent display name
        full_name: String,
        /// Rank the agent held during probation
        lost_tier: Tier,
        /// Rank the agent holds now
        current_tier: Tier,
        /// Revenue bar that was missed, pre-formatted for templates
        retention_bar: String,
        /// First day of the probation window
        from_date: NaiveDate,
        /// Last day of the probation window
        to_date: NaiveDate,
    },
}

/// Format a minor-unit amount with dot thousands separators.
///
/// Templates show bars like `500.000.000`; the separator is part of the
/// established template contract, not a locale decision made here.
#[must_use]
pub fn format_amount(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    let first = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - first) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_group_by_thousands() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(1_000), "1.000");
        assert_eq!(format_amount(21_000_000), "21.000.000");
        assert_eq!(format_amount(1_200_000_000), "1.200.000.000");
        assert_eq!(format_amount(-500_000), "-500.000");
    }
}
