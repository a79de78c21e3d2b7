//! Line tokenizer for exported chat transcripts.
//!
//! Two header layouts are recognised:
//!
//! ```text
//! [21/09/25, 3:32:10 PM] Mom: Baby fed 150ml formula
//! 21/09/2025, 15:32 - Mom: Baby fed 150ml formula
//! ```
//!
//! A line without a header continues the message above it; under a skipped
//! header it is skipped as unrecognized. The tokenizer is a lazy, cloneable
//! iterator: cloning it before consumption restarts the sequence.

use std::collections::VecDeque;
use std::iter::Enumerate;
use std::str::Lines;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use nestlog_core::{DateOrder, RawMessage, Warning, WarningReason};
use regex::{Captures, Regex};
use tracing::trace;

const EDITED_MARKER: &str = "<This message was edited>";

/// Substrings (lowercase) that mark a line as transcript noise wherever they
/// appear.
const SYSTEM_MARKERS: &[&str] = &[
    "messages and calls are end-to-end encrypted",
    "end-to-end encrypted",
    "<media omitted>",
    "image omitted",
    "video omitted",
    "audio omitted",
    "sticker omitted",
    "gif omitted",
    "document omitted",
    "contact card omitted",
    "<attached:",
    "this message was deleted",
    "you deleted this message",
    "missed voice call",
    "missed video call",
    "security code changed",
];

/// Group-management notices: a name with no colon, then the action. Only
/// matched against the whole header remainder, never against message text.
static GROUP_NOTICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[^:]+?\s(?:created group|changed the subject|changed the group|changed this group's icon|deleted this group's icon|added|removed|left|was removed|joined using this group's invite link|changed their phone number)\b",
    )
    .expect("valid group notice pattern")
});

const TIME: &str = r"(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([AaPp])\.?\s?[Mm]\.?)?";

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\[(\d{{1,2}})[/.-](\d{{1,2}})[/.-](\d{{2,4}}),?\s*{TIME}\]\s*(.*)$"
    ))
    .expect("valid bracketed header pattern")
});

static DASHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(\d{{1,2}})[/.-](\d{{1,2}})[/.-](\d{{2,4}}),?\s*{TIME}\s+-\s+(.*)$"
    ))
    .expect("valid dashed header pattern")
});

/// One event from the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Message(RawMessage),
    /// A line that produced no message.
    Skipped(Warning),
}

/// A parsed header line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Header<'a> {
    pub occurred_at: NaiveDateTime,
    /// Everything after the timestamp: `Sender: text`, or a system notice.
    pub rest: &'a str,
}

/// Lazy transcript tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    lines: Enumerate<Lines<'a>>,
    order: DateOrder,
    pending: Option<RawMessage>,
    queue: VecDeque<Token>,
    lines_read: usize,
    continuation_lines: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str, order: DateOrder) -> Self {
        Self {
            lines: text.strip_prefix('\u{feff}').unwrap_or(text).lines().enumerate(),
            order,
            pending: None,
            queue: VecDeque::new(),
            lines_read: 0,
            continuation_lines: 0,
        }
    }

    /// Physical lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Lines folded into a preceding message so far.
    pub fn continuation_lines(&self) -> usize {
        self.continuation_lines
    }

    fn skip(&mut self, line: usize, reason: WarningReason) {
        trace!(line, %reason, "skipping line");
        self.queue.push_back(Token::Skipped(Warning { line, reason }));
    }

    /// Consume one physical line. Every header closes the pending message,
    /// which is returned ahead of anything this line queues.
    fn feed(&mut self, line_no: usize, raw: &str) -> Option<RawMessage> {
        let line = clean_line(raw);

        let Some(header) = parse_header(&line, self.order) else {
            match self.pending.as_mut() {
                Some(msg) => {
                    msg.text.push('\n');
                    msg.text.push_str(line.trim_end());
                    self.continuation_lines += 1;
                }
                None => self.skip(line_no, WarningReason::UnrecognizedLine),
            }
            return None;
        };

        let done = self.pending.take().map(finish);
        if is_system_text(header.rest) {
            self.skip(line_no, WarningReason::SystemMessage);
            return done;
        }
        let Some((sender, text)) = split_sender(header.rest) else {
            self.skip(line_no, WarningReason::MissingSender);
            return done;
        };

        self.pending = Some(RawMessage {
            line: line_no,
            occurred_at: header.occurred_at,
            sender: sender.trim().to_string(),
            text: text.to_string(),
        });
        done
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.queue.pop_front() {
                return Some(token);
            }
            let Some((index, raw)) = self.lines.next() else {
                return self.pending.take().map(|m| Token::Message(finish(m)));
            };
            self.lines_read += 1;
            if let Some(done) = self.feed(index + 1, raw) {
                return Some(Token::Message(done));
            }
        }
    }
}

/// Messages only, skipping every non-message event.
pub fn tokenize(text: &str, order: DateOrder) -> impl Iterator<Item = RawMessage> + Clone + '_ {
    Tokenizer::new(text, order).filter_map(|token| match token {
        Token::Message(msg) => Some(msg),
        Token::Skipped(_) => None,
    })
}

fn finish(mut msg: RawMessage) -> RawMessage {
    if msg.text.contains(EDITED_MARKER) {
        msg.text = msg.text.replace(EDITED_MARKER, "");
    }
    msg.text = msg.text.trim().to_string();
    msg
}

/// Drop direction marks and BOMs; turn narrow and non-breaking spaces into
/// plain spaces.
fn clean_line(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\u{200e}' | '\u{200f}' | '\u{feff}'))
        .map(|c| match c {
            '\u{202f}' | '\u{a0}' => ' ',
            c => c,
        })
        .collect()
}

/// `rest` is everything after the timestamp, sender included.
fn is_system_text(rest: &str) -> bool {
    let lower = rest.to_lowercase();
    SYSTEM_MARKERS.iter().any(|m| lower.contains(m)) || GROUP_NOTICE.is_match(rest)
}

/// Split `Sender: text`. A trailing `Sender:` with no text is allowed.
fn split_sender(rest: &str) -> Option<(&str, &str)> {
    if let Some((sender, text)) = rest.split_once(": ") {
        return Some((sender, text));
    }
    rest.strip_suffix(':').map(|sender| (sender, ""))
}

/// Parse a header line in either layout.
pub(crate) fn parse_header(line: &str, order: DateOrder) -> Option<Header<'_>> {
    let caps = BRACKETED.captures(line).or_else(|| DASHED.captures(line))?;
    let occurred_at = timestamp(&caps, order)?;
    let rest = caps.get(8)?.as_str();
    Some(Header { occurred_at, rest })
}

fn timestamp(caps: &Captures<'_>, order: DateOrder) -> Option<NaiveDateTime> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let (a, b) = (num(1)?, num(2)?);
    let year_text = caps.get(3)?.as_str();
    let year: i32 = match year_text.len() {
        2 => 2000 + year_text.parse::<i32>().ok()?,
        4 => year_text.parse().ok()?,
        _ => return None,
    };
    let (day, month) = resolve_day_month(a, b, order);
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let mut hour = num(4)?;
    let minute = num(5)?;
    let second = num(6).unwrap_or(0);
    if let Some(meridiem) = caps.get(7) {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("p");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(date.and_time(time))
}

/// A number above 12 can only be a day; otherwise the preferred order decides.
fn resolve_day_month(a: u32, b: u32, order: DateOrder) -> (u32, u32) {
    match (a > 12, b > 12) {
        (true, false) => (a, b),
        (false, true) => (b, a),
        _ => match order {
            DateOrder::DayFirst => (a, b),
            DateOrder::MonthFirst => (b, a),
        },
    }
}
