//! Fixed-format HTTP dates: `EEE, dd MMM yyyy HH:mm:ss zzz`, always written in GMT.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc, Weekday};

const FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format `time` as e.g. `Sun, 14 Mar 2021 15:09:26 GMT`.
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(FORMAT).to_string()
}

/// Parse a date in the fixed format.
///
/// Day and month names are matched case-insensitively in short or long form.
/// The day name must be a real one but is not checked against the date.
/// The zone may be `GMT`, `UTC`, `UT`, `Z`, a US zone abbreviation such as
/// `PST`, or a numeric offset such as `+0100`, `-05:00` or `GMT+8`.
/// Whatever follows the zone is ignored, so legacy values like
/// `... GMT; length=1234` still parse. Anything else yields `None`.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let (weekday, rest) = value.trim().split_once(',')?;
    weekday.trim().parse::<Weekday>().ok()?;

    let mut fields = rest.split_whitespace();
    let (day, month, year, time, zone) = (
        fields.next()?,
        fields.next()?,
        fields.next()?,
        fields.next()?,
        fields.next()?,
    );

    let naive = NaiveDateTime::parse_from_str(
        &format!("{day} {month} {year} {time}"),
        "%d %b %Y %H:%M:%S",
    )
    .ok()?;
    let offset = parse_zone(zone)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|time| time.with_timezone(&Utc))
}

/// Zone at the start of `token`; trailing text after it is ignored.
fn parse_zone(token: &str) -> Option<FixedOffset> {
    let token = token.to_ascii_uppercase();
    let name_len = token
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(token.len());
    let (name, rest) = token.split_at(name_len);

    let hours = match name {
        "" => return parse_offset(rest),
        "GMT" | "UTC" | "UT" | "Z" if rest.starts_with(['+', '-']) => return parse_offset(rest),
        "GMT" | "UTC" | "UT" | "Z" => 0,
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => return None,
    };

    FixedOffset::east_opt(hours * 3600)
}

/// `+hh`, `+hhmm` or `+hh:mm` (or `-`), followed by anything
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let sign = match text.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let body = &text[1..];
    let digits = &body[..body
        .find(|c: char| !(c.is_ascii_digit() || c == ':'))
        .unwrap_or(body.len())];

    let (hours, minutes) = match digits.split_once(':') {
        Some(parts) => parts,
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };
    let hours: i32 = hours.parse().ok().filter(|h| (0..24).contains(h))?;
    let minutes: i32 = minutes.parse().ok().filter(|m| (0..60).contains(m))?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[rstest]
    fn test_format_uses_gmt_suffix() {
        assert_eq!(
            format_http_date(utc(2021, 3, 14, 15, 9, 26)),
            "Sun, 14 Mar 2021 15:09:26 GMT"
        );
    }

    #[rstest]
    #[case("Sun, 14 Mar 2021 15:09:26 GMT", utc(2021, 3, 14, 15, 9, 26))]
    #[case("sunday, 14 march 2021 15:09:26 gmt", utc(2021, 3, 14, 15, 9, 26))]
    #[case("  Sun, 14 Mar 2021 15:09:26 UTC  ", utc(2021, 3, 14, 15, 9, 26))]
    // the day name is not cross-checked
    #[case("Mon, 14 Mar 2021 15:09:26 GMT", utc(2021, 3, 14, 15, 9, 26))]
    #[case("Sun, 14 Mar 2021 16:09:26 +0100", utc(2021, 3, 14, 15, 9, 26))]
    #[case("Sun, 14 Mar 2021 10:09:26 GMT-05:00", utc(2021, 3, 14, 15, 9, 26))]
    #[case("Sun, 14 Mar 2021 23:09:26 GMT+8", utc(2021, 3, 14, 15, 9, 26))]
    #[case("Sun, 14 Mar 2021 15:09:26 GMT; length=1234", utc(2021, 3, 14, 15, 9, 26))]
    #[case("Sun, 14 Mar 2021 15:09:26 GMT;length=1234", utc(2021, 3, 14, 15, 9, 26))]
    #[case("Sun, 14 Mar 2021 16:09:26 +0100 (CET)", utc(2021, 3, 14, 15, 9, 26))]
    #[case("Sun, 14 Mar 2021 07:09:26 PST", utc(2021, 3, 14, 15, 9, 26))]
    #[case("Sun, 14 Mar 2021 08:09:26 PDT", utc(2021, 3, 14, 15, 9, 26))]
    #[case("Sun, 14 Mar 2021 10:09:26 EST", utc(2021, 3, 14, 15, 9, 26))]
    #[case("Sun, 14 Mar 2021 09:09:26 CST", utc(2021, 3, 14, 15, 9, 26))]
    fn test_parse_accepts(#[case] raw: &str, #[case] expected: DateTime<Utc>) {
        assert_eq!(parse_http_date(raw), Some(expected));
    }

    #[rstest]
    #[case("not-a-date")]
    #[case("")]
    #[case("Sun, 14 Mar 2021 15:09:26")]
    #[case("Sun 14 Mar 2021 15:09:26 GMT")]
    #[case("Xyz, 14 Mar 2021 15:09:26 GMT")]
    #[case("Sun, 30 Feb 2021 15:09:26 GMT")]
    #[case("Sun, 14 Mar 2021 15:09:26 CET")]
    #[case("Sun, 14 Mar 2021 15:09:26 ; GMT")]
    #[case("Sun, 14 Mar 2021 15:09:26 GMT+25")]
    #[case("Sunday, 14-Mar-21 15:09:26 GMT")]
    fn test_parse_rejects(#[case] raw: &str) {
        assert_eq!(parse_http_date(raw), None);
    }

    #[rstest]
    fn test_formatted_dates_parse_back() {
        let time = utc(1999, 12, 31, 23, 59, 58);

        assert_eq!(parse_http_date(&format_http_date(time)), Some(time));
    }
}
