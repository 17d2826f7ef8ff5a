//! Parser for the textual output of `ping`
//!
//! The grammar is pinned to the iputils output format. Each line is tried
//! against three fixed shapes (reply, summary, rtt statistics); anything
//! else is noise and skipped. A line that almost matches is still skipped
//! rather than partially interpreted.

use crate::probe::record::{ProbeReport, ProbeResponse, ProbeSummary, RttSummary};
use std::str::FromStr;
use tracing::{debug, trace};

const RESPONSE_ANCHOR: &str = "icmp_seq=";
const RTT_PREFIX: &str = "rtt min/avg/max/mdev = ";

/// A line that matched one of the three grammars
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedLine {
    Response(ProbeResponse),
    Summary(ProbeSummary),
    Rtt(RttSummary),
}

/// Minimal forward-only scanner over a line
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn tag(&mut self, tag: &str) -> Option<()> {
        self.rest = self.rest.strip_prefix(tag)?;
        Some(())
    }

    fn digits(&mut self) -> Option<&'a str> {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let (digits, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(digits)
    }

    fn integer<T: FromStr>(&mut self) -> Option<T> {
        self.digits()?.parse().ok()
    }

    /// Digits with an optional fractional part. A bare trailing dot is rejected.
    fn decimal(&mut self) -> Option<f64> {
        let start = self.rest;
        let mut len = self.digits()?.len();
        if let Some(after_dot) = self.rest.strip_prefix('.') {
            let mut fraction = Scanner::new(after_dot);
            len += 1 + fraction.digits()?.len();
            self.rest = fraction.rest;
        }
        start[..len].parse().ok()
    }

    /// Runs `f`, rewinding the scanner if it does not match
    fn optional<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let saved = self.rest;
        let value = f(self);
        if value.is_none() {
            self.rest = saved;
        }
        value
    }

    fn finish(&self) -> Option<()> {
        self.rest.is_empty().then_some(())
    }
}

/// `64 bytes from 10.0.0.1: icmp_seq=3 ttl=64 time=0.045 ms`
fn parse_response(line: &str) -> Option<ProbeResponse> {
    let start = line.find(RESPONSE_ANCHOR)?;
    let mut s = Scanner::new(&line[start..]);
    s.tag(RESPONSE_ANCHOR)?;
    let sequence: u32 = s.integer()?;
    s.tag(" ttl=")?;
    let ttl = s.integer()?;
    s.tag(" time=")?;
    let rtt_ms = s.decimal()?;
    s.tag(" ms")?;
    s.finish()?;

    if sequence == 0 {
        return None;
    }
    Some(ProbeResponse {
        sequence,
        ttl,
        rtt_ms,
    })
}

/// `5 packets transmitted, 4 received, +1 errors, 20% packet loss, time 4005ms`
fn parse_summary(line: &str) -> Option<ProbeSummary> {
    let mut s = Scanner::new(line);
    let transmitted: u32 = s.integer()?;
    s.tag(" packets transmitted, ")?;
    let received: u32 = s.integer()?;
    s.tag(" received, ")?;
    let errors = s.optional(|s| {
        s.tag("+")?;
        let errors = s.integer()?;
        s.tag(" errors, ")?;
        Some(errors)
    });
    let packet_loss = s.decimal()?;
    s.tag("% packet loss, time ")?;
    let elapsed_ms = s.decimal()?;
    s.tag("ms")?;
    s.finish()?;

    if received > transmitted {
        return None;
    }
    Some(ProbeSummary {
        transmitted,
        received,
        errors,
        packet_loss,
        elapsed_ms,
    })
}

/// `rtt min/avg/max/mdev = 0.040/0.045/0.051/0.004 ms[, pipe 2][, ipg/ewma 0.054/0.027 ms]`
fn parse_rtt(line: &str) -> Option<RttSummary> {
    let mut s = Scanner::new(line);
    s.tag(RTT_PREFIX)?;
    let min_ms = s.decimal()?;
    s.tag("/")?;
    let avg_ms = s.decimal()?;
    s.tag("/")?;
    let max_ms = s.decimal()?;
    s.tag("/")?;
    let mdev_ms = s.decimal()?;
    s.tag(" ms")?;
    // Flood and adaptive modes append the pipe size and inter-packet gap
    s.optional(|s| {
        s.tag(", pipe ")?;
        s.digits()
    });
    s.optional(|s| {
        s.tag(", ipg/ewma ")?;
        s.decimal()?;
        s.tag("/")?;
        s.decimal()?;
        s.tag(" ms")
    });
    s.finish()?;

    Some(RttSummary {
        min_ms,
        avg_ms,
        max_ms,
        mdev_ms,
    })
}

/// Classify a single line. Returns `None` for noise and for lines that
/// drift from the expected grammar.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let line = line.trim_end();
    parse_response(line)
        .map(ParsedLine::Response)
        .or_else(|| parse_summary(line).map(ParsedLine::Summary))
        .or_else(|| parse_rtt(line).map(ParsedLine::Rtt))
}

/// Parse the complete standard output of one probe.
///
/// Replies are kept in the order they were printed. When the summary or
/// rtt line appears more than once the last one wins; when it never
/// appears the field stays `None`.
pub fn parse_output(output: &str) -> ProbeReport {
    let mut report = ProbeReport::default();
    let mut skipped = 0usize;

    for line in output.lines() {
        match parse_line(line) {
            Some(ParsedLine::Response(response)) => report.responses.push(response),
            Some(ParsedLine::Summary(summary)) => report.summary = Some(summary),
            Some(ParsedLine::Rtt(rtt)) => report.rtt = Some(rtt),
            None => {
                trace!(line = line, "Skipping unrecognized probe output line");
                skipped += 1;
            }
        }
    }

    debug!(
        responses = report.responses.len(),
        has_summary = report.summary.is_some(),
        has_rtt = report.rtt.is_some(),
        skipped_lines = skipped,
        "Probe output parsed"
    );
    report
}
