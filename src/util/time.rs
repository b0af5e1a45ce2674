use std::time::Duration;

// Units accepted by `parse_duration_str`, longest suffix first so "ms" wins over "m".
const UNITS: [(&str, f64); 8] = [
    ("ns", 1e-9),
    ("us", 1e-6),
    ("µs", 1e-6),
    ("μs", 1e-6),
    ("ms", 1e-3),
    ("h", 3600.0),
    ("m", 60.0),
    ("s", 1.0),
];

// Parse a duration string like "90s", "2m", "1h30m", "1.5m" or "500ms".
// Every number needs a unit; "0" alone is zero. Returns None if unparseable or negative.
pub fn parse_duration_str(s: &str) -> Option<Duration> {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" { return Some(Duration::ZERO); }
    if s.is_empty() || s.starts_with('-') { return None; }

    let mut rest = s;
    let mut total = 0f64;
    while !rest.is_empty() {
        let num_len = rest.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(rest.len());
        if num_len == 0 { return None; }
        let value: f64 = rest[..num_len].parse().ok()?;
        rest = &rest[num_len..];

        let (unit, scale) = UNITS.iter().find(|(u, _)| rest.starts_with(u))?;
        rest = &rest[unit.len()..];
        total += value * scale;
    }
    Duration::try_from_secs_f64(total).ok()
}
