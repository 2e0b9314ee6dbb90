//! Natural-time parsing: clock times and durations.
//!
//! All matching is done on lowercased text. Clock times come back in
//! 24-hour form; durations in whole minutes.

use std::sync::LazyLock;

use regex::Regex;

/// A time of day in 24-hour form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
    /// Whether the text actually named the minute ("7:30", "noon").
    /// When false, `minute` is the default 0.
    pub minute_explicit: bool,
}

impl ClockTime {
    fn new(hour: u32, minute: u32, minute_explicit: bool) -> Self {
        Self {
            hour,
            minute,
            minute_explicit,
        }
    }
}

static ISO_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{4}-\d{2}-\d{2}[t ]([01]\d|2[0-3]):([0-5]\d)").unwrap()
});

static MERIDIEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})(?::([0-5]\d))?\s*([ap])\.?m\b\.?").unwrap()
});

static NAMED_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(noon|midday|midnight)\b").unwrap());

static CLOCK_24H: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").unwrap());

static OCLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s*o['’]?\s?clock\b").unwrap()
});

// "at 7", "for 6"; the trailing word is checked against duration units.
static BARE_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:at|for)\s+(\d{1,2})\b(?:[\s-]*([a-z]+))?").unwrap());

fn is_duration_unit(word: &str) -> bool {
    matches!(
        word,
        "h" | "hr" | "hrs" | "hour" | "hours" | "m" | "min" | "mins" | "minute" | "minutes" | "s" | "sec"
            | "secs" | "second" | "seconds"
    )
}

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d+(?:\.\d+)?|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|fifteen|twenty|thirty|forty|forty-five|fifty|sixty|ninety)[\s-]*(hours?|hrs?|h|minutes?|mins?|m|seconds?|secs?|s)\b",
    )
    .unwrap()
});

static HALF_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bhalf\s+(?:an\s+)?hour\b").unwrap());

static QUARTER_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bquarter\s+(?:of\s+)?(?:an\s+)?hour\b").unwrap());

/// Value of a spelled-out number, including "a"/"an" as one.
pub fn number_word(word: &str) -> Option<u32> {
    let n = match word {
        "a" | "an" | "one" => 1,
        "zero" => 0,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "fifteen" => 15,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "forty-five" => 45,
        "fifty" => 50,
        "sixty" => 60,
        "ninety" => 90,
        _ => return None,
    };
    Some(n)
}

fn to_24h(hour: u32, pm: bool) -> Option<u32> {
    match hour {
        12 => Some(if pm { 12 } else { 0 }),
        1..=11 => Some(if pm { hour + 12 } else { hour }),
        _ => None,
    }
}

/// Find the first clock time in `text`.
///
/// Recognizes "10am", "3:45 PM", "noon", "midnight", "19:30",
/// "seven o'clock", ISO timestamps and a bare "at 7" or "for 6".
pub fn find_clock(text: &str) -> Option<ClockTime> {
    let lower = text.to_lowercase();

    if let Some(caps) = ISO_TIMESTAMP.captures(&lower) {
        let hour = caps[1].parse().ok()?;
        let minute = caps[2].parse().ok()?;
        return Some(ClockTime::new(hour, minute, true));
    }

    for caps in MERIDIEM.captures_iter(&lower) {
        let Ok(hour) = caps[1].parse::<u32>() else {
            continue;
        };
        let minute = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        if let Some(hour) = to_24h(hour, &caps[3] == "p") {
            return Some(ClockTime::new(hour, minute.unwrap_or(0), minute.is_some()));
        }
    }

    if let Some(caps) = NAMED_TIME.captures(&lower) {
        let hour = if &caps[1] == "midnight" { 0 } else { 12 };
        return Some(ClockTime::new(hour, 0, true));
    }

    if let Some(caps) = CLOCK_24H.captures(&lower) {
        let hour = caps[1].parse().ok()?;
        let minute = caps[2].parse().ok()?;
        return Some(ClockTime::new(hour, minute, true));
    }

    if let Some(caps) = OCLOCK.captures(&lower) {
        let word = &caps[1];
        let hour = word.parse::<u32>().ok().or_else(|| number_word(word))?;
        if hour <= 23 {
            return Some(ClockTime::new(hour, 0, false));
        }
    }

    for caps in BARE_HOUR.captures_iter(&lower) {
        if caps.get(2).is_some_and(|unit| is_duration_unit(unit.as_str())) {
            continue;
        }
        let Ok(hour) = caps[1].parse::<u32>() else {
            continue;
        };
        if hour <= 23 {
            return Some(ClockTime::new(hour, 0, false));
        }
    }

    None
}

/// Sum every duration expression in `text`, in whole minutes.
///
/// "1 hour 30 minutes" → 90, "half an hour" → 30, "90 seconds" → 2.
/// Seconds round up to the next minute.
pub fn find_duration_minutes(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    let mut seconds = 0.0_f64;

    // Fractions first, then blank them so "an hour" inside is not counted again.
    seconds += 30.0 * 60.0 * HALF_HOUR.find_iter(&lower).count() as f64;
    let rest = HALF_HOUR.replace_all(&lower, " ");
    seconds += 15.0 * 60.0 * QUARTER_HOUR.find_iter(&rest).count() as f64;
    let rest = QUARTER_HOUR.replace_all(&rest, " ");

    for caps in DURATION.captures_iter(&rest) {
        let qty = &caps[1];
        let Some(amount) = qty
            .parse::<f64>()
            .ok()
            .or_else(|| number_word(qty).map(f64::from))
        else {
            continue;
        };
        let unit = &caps[2];
        let scale = if unit.starts_with('h') {
            3600.0
        } else if unit.starts_with('m') {
            60.0
        } else {
            1.0
        };
        seconds += amount * scale;
    }

    if seconds <= 0.0 {
        return None;
    }
    Some((seconds / 60.0).ceil() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(text: &str) -> (u32, u32) {
        let t = find_clock(text).unwrap();
        (t.hour, t.minute)
    }

    // ── Clock times ─────────────────────────────────────────────

    #[test]
    fn meridiem_hour_only_defaults_minute() {
        let t = find_clock("set an alarm for 10 AM").unwrap();
        assert_eq!((t.hour, t.minute), (10, 0));
        assert!(!t.minute_explicit);
    }

    #[test]
    fn meridiem_pm_converts() {
        assert_eq!(clock("remind me at 3pm"), (15, 0));
        assert_eq!(clock("at 3:45 p.m."), (15, 45));
    }

    #[test]
    fn twelve_oclock_edges() {
        assert_eq!(clock("wake me at 12 am"), (0, 0));
        assert_eq!(clock("lunch at 12pm"), (12, 0));
    }

    #[test]
    fn named_times() {
        assert_eq!(clock("Set an alarm for noon"), (12, 0));
        assert_eq!(clock("alarm at midnight"), (0, 0));
    }

    #[test]
    fn twenty_four_hour() {
        let t = find_clock("meeting at 19:30").unwrap();
        assert_eq!((t.hour, t.minute), (19, 30));
        assert!(t.minute_explicit);
    }

    #[test]
    fn oclock_words_and_digits() {
        assert_eq!(clock("wake me up at seven o'clock"), (7, 0));
        assert_eq!(clock("at 9 oclock"), (9, 0));
    }

    #[test]
    fn iso_timestamp() {
        assert_eq!(clock("2024-06-01T08:15:00"), (8, 15));
    }

    #[test]
    fn bare_at_hour() {
        assert_eq!(clock("wake me up at 6"), (6, 0));
    }

    #[test]
    fn bare_for_hour() {
        assert_eq!(clock("set an alarm for 6"), (6, 0));
        assert_eq!(clock("alarm for 7 please"), (7, 0));
    }

    #[test]
    fn duration_after_for_is_not_a_clock() {
        assert!(find_clock("set a timer for 5 minutes").is_none());
        assert!(find_clock("remind me in a bit, for 2-hour blocks").is_none());
    }

    #[test]
    fn am_inside_word_is_not_meridiem() {
        assert!(find_clock("10 amazing songs").is_none());
    }

    #[test]
    fn no_clock() {
        assert!(find_clock("play some jazz").is_none());
    }

    // ── Durations ───────────────────────────────────────────────

    #[test]
    fn minutes() {
        assert_eq!(find_duration_minutes("Set a 20 minute timer"), Some(20));
        assert_eq!(find_duration_minutes("timer for 5 mins"), Some(5));
        assert_eq!(find_duration_minutes("a 15-minute countdown"), Some(15));
    }

    #[test]
    fn hours_and_compound() {
        assert_eq!(find_duration_minutes("set a timer for an hour"), Some(60));
        assert_eq!(find_duration_minutes("1 hour 30 minutes"), Some(90));
        assert_eq!(find_duration_minutes("two hours"), Some(120));
    }

    #[test]
    fn half_and_quarter() {
        assert_eq!(find_duration_minutes("half an hour"), Some(30));
        assert_eq!(find_duration_minutes("a quarter of an hour"), Some(15));
    }

    #[test]
    fn seconds_round_up() {
        assert_eq!(find_duration_minutes("90 seconds"), Some(2));
    }

    #[test]
    fn no_duration() {
        assert_eq!(find_duration_minutes("set a timer"), None);
    }

    #[test]
    fn number_words() {
        assert_eq!(number_word("five"), Some(5));
        assert_eq!(number_word("an"), Some(1));
        assert_eq!(number_word("many"), None);
    }
}
