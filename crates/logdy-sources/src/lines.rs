//! A `cut`-like helper for replaying a slice of a historical log file.

use chrono::NaiveDateTime;

/// How to decide where the replayed window starts and ends.
pub enum CutRange<'a> {
    /// Keep lines from the first containing `start` through the first
    /// (at-or-after it) containing `end`, inclusive.
    Substring { start: &'a str, end: &'a str, case_insensitive: bool },
    /// Keep lines whose leading `date_format`-shaped prefix falls in
    /// `[start, end]`, inclusive. Lines whose prefix fails to parse are
    /// skipped rather than ending the scan.
    DateRange {
        date_format: &'a str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        prefix_len: usize,
    },
}

/// Select the lines of `blob` within `range`, preserving original order.
pub fn cut_lines<'a>(blob: &'a str, range: &CutRange<'_>) -> Vec<&'a str> {
    match range {
        CutRange::Substring { start, end, case_insensitive } => {
            cut_by_substring(blob, start, end, *case_insensitive)
        }
        CutRange::DateRange { date_format, start, end, prefix_len } => {
            cut_by_date(blob, date_format, *start, *end, *prefix_len)
        }
    }
}

fn cut_by_substring<'a>(blob: &'a str, start: &str, end: &str, case_insensitive: bool) -> Vec<&'a str> {
    let (needle_start, needle_end) = if case_insensitive {
        (start.to_lowercase(), end.to_lowercase())
    } else {
        (start.to_owned(), end.to_owned())
    };

    let mut started = false;
    let mut out = Vec::new();
    for line in blob.lines() {
        let probe = if case_insensitive { line.to_lowercase() } else { line.to_owned() };
        if !started && probe.contains(&needle_start) {
            started = true;
        }
        if !started {
            continue;
        }
        out.push(line);
        if probe.contains(&needle_end) {
            break;
        }
    }
    out
}

fn cut_by_date<'a>(
    blob: &'a str,
    date_format: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    prefix_len: usize,
) -> Vec<&'a str> {
    let mut started = false;
    let mut out = Vec::new();
    for line in blob.lines() {
        let Some(prefix) = line.get(..prefix_len) else {
            continue;
        };
        let Ok(ts) = NaiveDateTime::parse_from_str(prefix, date_format) else {
            continue;
        };
        if !started && ts >= start {
            started = true;
        }
        if !started {
            continue;
        }
        out.push(line);
        if ts >= end {
            break;
        }
    }
    out
}

/// Keep `count` lines starting at 1-based `offset`.
pub fn cut_lines_by_number(blob: &str, count: usize, offset: usize) -> Vec<&str> {
    blob.lines().skip(offset.saturating_sub(1)).take(count).collect()
}
