//! Payment status badge.

use serde::Serialize;

/// Colour family of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTone {
    /// Payment went through.
    Success,
    /// Payment awaits confirmation.
    Pending,
    /// Anything else.
    Failed,
}

impl BadgeTone {
    /// Background colour as RGB bytes.
    #[must_use]
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Success => (0x43, 0xb9, 0x6e),
            Self::Pending => (0xff, 0x98, 0x00),
            Self::Failed => (0xe7, 0x4c, 0x3c),
        }
    }
}

/// Label and tone shown for a payment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    /// Text on the badge.
    pub label: String,
    /// Colour family.
    pub tone: BadgeTone,
}

impl StatusBadge {
    /// Maps a free-form payment status to a badge.
    ///
    /// Matching is case-insensitive. `success` and `paid` give a green
    /// "Success", `pending` an amber "Pending"; any other value is shown
    /// capitalized in red, and an empty status reads "Failed".
    ///
    /// # Examples
    ///
    /// ```
    /// use gym_admin::invoice::{BadgeTone, StatusBadge};
    ///
    /// assert_eq!(StatusBadge::for_status("PAID").label, "Success");
    /// assert_eq!(StatusBadge::for_status("refunded").label, "Refunded");
    /// assert_eq!(StatusBadge::for_status("").tone, BadgeTone::Failed);
    /// ```
    #[must_use]
    pub fn for_status(status: &str) -> Self {
        let status = status.to_lowercase();
        match status.as_str() {
            "success" | "paid" => Self { label: "Success".to_owned(), tone: BadgeTone::Success },
            "pending" => Self { label: "Pending".to_owned(), tone: BadgeTone::Pending },
            "" => Self { label: "Failed".to_owned(), tone: BadgeTone::Failed },
            other => Self { label: capitalize(other), tone: BadgeTone::Failed },
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_known_statuses() {
        for status in ["success", "Success", "PAID", "paid"] {
            let badge = StatusBadge::for_status(status);
            assert_eq!(badge.label, "Success");
            assert_eq!(badge.tone, BadgeTone::Success);
        }
        let pending = StatusBadge::for_status("Pending");
        assert_eq!(pending.label, "Pending");
        assert_eq!(pending.tone, BadgeTone::Pending);
    }

    #[test]
    fn test_other_statuses_are_red() {
        let declined = StatusBadge::for_status("DECLINED");
        assert_eq!(declined.label, "Declined");
        assert_eq!(declined.tone, BadgeTone::Failed);

        let empty = StatusBadge::for_status("");
        assert_eq!(empty.label, "Failed");
        assert_eq!(empty.tone, BadgeTone::Failed);
    }

    #[test]
    fn test_tone_colours() {
        assert_eq!(BadgeTone::Success.rgb(), (67, 185, 110));
        assert_eq!(BadgeTone::Pending.rgb(), (255, 152, 0));
        assert_eq!(BadgeTone::Failed.rgb(), (231, 76, 60));
    }

    proptest! {
        #[test]
        fn prop_every_status_maps_to_a_labelled_badge(status in ".{0,24}") {
            let badge = StatusBadge::for_status(&status);
            let lowered = status.to_lowercase();
            prop_assert!(!badge.label.is_empty());
            let expected = match lowered.as_str() {
                "success" | "paid" => BadgeTone::Success,
                "pending" => BadgeTone::Pending,
                _ => BadgeTone::Failed,
            };
            prop_assert_eq!(badge.tone, expected);
        }
    }
}
