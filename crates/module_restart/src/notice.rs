//! Human readable countdown text.

/// Placeholder replaced by the remaining time in a notice template.
pub const TIME_PLACEHOLDER: &str = "{0}";

/// Formats a second count as "N minutes and M seconds".
///
/// Zero parts are left out and singular units are used for one, so 60 is
/// "1 minute" and 61 is "1 minute and 1 second". Zero itself reads
/// "0 seconds".
pub fn format_countdown(seconds: u64) -> String {
    if seconds == 0 {
        return "0 seconds".to_string();
    }

    let minutes = seconds / 60;
    let remainder = seconds % 60;
    let mut text = String::new();

    if minutes > 0 {
        if minutes == 1 {
            text.push_str("1 minute");
        } else {
            text.push_str(&format!("{minutes} minutes"));
        }
        if remainder != 0 {
            text.push_str(" and ");
        }
    }

    if remainder != 0 {
        if remainder == 1 {
            text.push_str("1 second");
        } else {
            text.push_str(&format!("{remainder} seconds"));
        }
    }

    text
}

/// Renders a notice template for the given remaining time.
pub fn render_notice(template: &str, seconds: u64) -> String {
    template.replace(TIME_PLACEHOLDER, &format_countdown(seconds))
}
