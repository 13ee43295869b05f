//! Small user-facing string helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Renders a boolean setting as `"on"` / `"off"`.
pub fn toggle_friendly_str(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// Renders a boolean as `"yes"` / `"no"`.
pub fn yesno_friendly_str(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Renders a timestamp in the platform's localized long date-time markup.
pub fn format_timestamp(at: SystemTime) -> String {
    let secs = at.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    format!("<t:{secs}:f>")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn friendly_strings() {
        assert_eq!(toggle_friendly_str(true), "on");
        assert_eq!(toggle_friendly_str(false), "off");
        assert_eq!(yesno_friendly_str(true), "yes");
        assert_eq!(yesno_friendly_str(false), "no");
    }

    #[test]
    fn timestamp_markup() {
        let at = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(format_timestamp(at), "<t:1700000000:f>");
    }
}
