//! Incremental parser for `ffmpeg -progress` output.
//!
//! ffmpeg writes blocks of `key=value` lines, each closed by a
//! `progress=continue` or `progress=end` line. Anything else on the stream is
//! treated as a log line. Lines terminated by a bare carriage return are the
//! interim status lines ffmpeg redraws in place, and are dropped.

use std::collections::VecDeque;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tokio::sync::mpsc;

use ffweave_core::ProgressConfig;

use crate::value::{ProgressRecord, ProgressValue};

static FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)=(.*)$").expect("field pattern is valid"));

/// Key whose line closes a record.
pub const PROGRESS_KEY: &str = "progress";

/// One completed progress record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    state: String,
    record: ProgressRecord,
}

impl ProgressUpdate {
    /// The value of the closing `progress=` line (`continue` or `end`).
    pub fn progress_state(&self) -> &str {
        &self.state
    }

    /// True once ffmpeg reports the final record.
    pub fn is_end(&self) -> bool {
        self.state == "end"
    }

    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    pub fn get(&self, key: &str) -> Option<&ProgressValue> {
        self.record.get(key)
    }

    pub fn frame(&self) -> Option<u64> {
        self.record.frame()
    }

    pub fn fps(&self) -> Option<f64> {
        self.record.fps()
    }

    pub fn out_time_us(&self) -> Option<i64> {
        self.record.out_time_us()
    }

    pub fn out_time(&self) -> Option<String> {
        self.record.out_time()
    }
}

impl Serialize for ProgressUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.record.len() + 1))?;
        for (k, v) in self.record.iter() {
            map.serialize_entry(k, v)?;
        }
        map.serialize_entry(PROGRESS_KEY, &self.state)?;
        map.end()
    }
}

/// A buffered log line and the media time it was attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub text: String,
    pub time: String,
}

type Listener = Box<dyn FnMut(&ProgressUpdate) + Send>;

/// Stateful consumer of a progress stream.
///
/// Listeners run synchronously: by the time [`feed`](Self::feed) or
/// [`push_line`](Self::push_line) returns, every update that call produced
/// has been delivered.
///
/// # Example
///
/// ```
/// use ffweave_progress::ProgressParser;
///
/// let mut parser = ProgressParser::new();
/// parser.feed("frame=24\nfps=23.97\nout_time=00:00:01.000000\nprogress=continue\n");
///
/// assert_eq!(parser.committed().frame(), Some(24));
/// assert_eq!(parser.last_media_time(), "00:00:01.000000");
/// ```
pub struct ProgressParser {
    committed: ProgressRecord,
    pending: ProgressRecord,
    log: VecDeque<LogEntry>,
    log_capacity: Option<usize>,
    default_time: String,
    partial: String,
    listeners: Vec<Listener>,
    subscribers: Vec<mpsc::UnboundedSender<ProgressUpdate>>,
    updates: u64,
}

impl Default for ProgressParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProgressParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressParser")
            .field("committed", &self.committed)
            .field("pending", &self.pending)
            .field("log_len", &self.log.len())
            .field("updates", &self.updates)
            .finish_non_exhaustive()
    }
}

impl ProgressParser {
    /// A parser with an unbounded log and a default media time of `"0"`.
    pub fn new() -> Self {
        Self::from_config(&ProgressConfig::default())
    }

    pub fn from_config(config: &ProgressConfig) -> Self {
        Self {
            committed: ProgressRecord::new(),
            pending: ProgressRecord::new(),
            log: VecDeque::new(),
            log_capacity: config.log_capacity,
            default_time: config.default_time.clone(),
            partial: String::new(),
            listeners: Vec::new(),
            subscribers: Vec::new(),
            updates: 0,
        }
    }

    /// Register a callback invoked once per completed record.
    pub fn on_update<F>(&mut self, listener: F) -> &mut Self
    where
        F: FnMut(&ProgressUpdate) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Receive completed records on a channel. Dropping the receiver
    /// unsubscribes it.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ProgressUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Feed an arbitrary chunk of the stream.
    ///
    /// Chunks may split lines anywhere; incomplete trailing text is held
    /// until the next chunk or [`finish`](Self::finish). Within a chunk
    /// `\r\n` ends a line normally and text followed by a bare `\r` is
    /// discarded. A chunk that ends in `\r` is a status redraw: its
    /// unterminated text is dropped at once, so a `\n` arriving in the next
    /// chunk only ends an empty line.
    pub fn feed(&mut self, chunk: &str) {
        let mut data = std::mem::take(&mut self.partial);
        data.push_str(chunk);

        let mut rest = data.as_str();
        while let Some(newline) = rest.find('\n') {
            let line = &rest[..newline];
            let line = line.strip_suffix('\r').unwrap_or(line);
            self.process_line(after_last_cr(line));
            rest = &rest[newline + 1..];
        }

        if rest.ends_with('\r') {
            tracing::trace!("Dropping carriage-return chunk tail");
            return;
        }
        let keep_from = rest.rfind('\r').map_or(0, |cr| cr + 1);
        self.partial = rest[keep_from..].to_string();
    }

    /// Process one complete line.
    ///
    /// A trailing `\n` (or `\r\n`) is stripped. A line ending in a bare `\r`
    /// is dropped without touching any state.
    pub fn push_line(&mut self, line: &str) {
        if line.ends_with('\r') {
            tracing::trace!("Dropping carriage-return line");
            return;
        }
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        self.process_line(line);
    }

    /// Flush a final unterminated line, e.g. when the stream closes.
    pub fn finish(&mut self) {
        let partial = std::mem::take(&mut self.partial);
        if !partial.is_empty() {
            self.process_line(&partial);
        }
    }

    fn process_line(&mut self, line: &str) {
        // Blank lines never reach the log.
        if line.trim().is_empty() {
            return;
        }

        match FIELD.captures(line) {
            Some(caps) => {
                let key = &caps[1];
                let value = &caps[2];
                if key == PROGRESS_KEY {
                    self.complete(value.trim());
                } else {
                    tracing::trace!("Progress field {}={}", key, value);
                    self.pending.insert(key, ProgressValue::parse(value));
                }
            }
            None => self.push_log(line),
        }
    }

    fn complete(&mut self, state: &str) {
        // ffmpeg has shipped builds that write microseconds into
        // out_time_ms as well; the real value is us / 1000.
        let duplicated_us = match (self.pending.get("out_time_ms"), self.pending.get("out_time_us")) {
            (Some(ProgressValue::Number(ms)), Some(ProgressValue::Number(us))) if ms == us => Some(*us),
            _ => None,
        };
        if let Some(us) = duplicated_us {
            let fixed = us / 1000.0;
            tracing::warn!("out_time_ms equals out_time_us ({}); using {}", us, fixed);
            self.pending.insert("out_time_ms", ProgressValue::Number(fixed));
        }

        self.committed = std::mem::take(&mut self.pending);
        self.updates += 1;

        let update = ProgressUpdate {
            state: state.to_string(),
            record: self.committed.clone(),
        };
        tracing::debug!(
            "Progress update #{} ({}): {} fields",
            self.updates,
            update.state,
            update.record.len()
        );

        for listener in &mut self.listeners {
            listener(&update);
        }
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }

    fn push_log(&mut self, line: &str) {
        let entry = LogEntry {
            text: line.to_string(),
            time: self.last_media_time(),
        };
        self.log.push_back(entry);
        if let Some(capacity) = self.log_capacity {
            while self.log.len() > capacity {
                self.log.pop_front();
            }
        }
    }

    /// The last fully received record.
    pub fn committed(&self) -> &ProgressRecord {
        &self.committed
    }

    /// Fields of the record currently being received.
    pub fn pending(&self) -> &ProgressRecord {
        &self.pending
    }

    /// Number of records completed so far.
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    /// Media time of the last committed record, or the configured default.
    pub fn last_media_time(&self) -> String {
        self.committed
            .out_time()
            .unwrap_or_else(|| self.default_time.clone())
    }

    /// The most recent log line.
    pub fn last(&self) -> Option<&str> {
        self.log.back().map(|e| e.text.as_str())
    }

    /// The `n` most recent log lines, oldest first. Returns every line if
    /// fewer than `n` are buffered.
    pub fn last_n(&self, n: usize) -> Vec<&str> {
        let skip = self.log.len().saturating_sub(n);
        self.log.iter().skip(skip).map(|e| e.text.as_str()).collect()
    }

    pub fn log(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter()
    }

    /// Every buffered log line prefixed with its media time, one per line.
    pub fn formatted_log(&self) -> String {
        self.log
            .iter()
            .map(|e| format!("[{}] {}\n", e.time, e.text))
            .collect()
    }
}

fn after_last_cr(line: &str) -> &str {
    line.rsplit('\r').next().unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collect(parser: &mut ProgressParser) -> Arc<Mutex<Vec<ProgressUpdate>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        parser.on_update(move |u| sink.lock().unwrap().push(u.clone()));
        seen
    }

    #[test]
    fn out_time_ms_fixup() {
        let mut parser = ProgressParser::new();
        let seen = collect(&mut parser);

        parser.push_line("out_time_ms=5000\n");
        parser.push_line("out_time_us=5000\n");
        parser.push_line("progress=continue\n");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            parser.committed().get("out_time_ms"),
            Some(&ProgressValue::Number(5.0))
        );
        assert_eq!(seen[0].out_time_us(), Some(5000));
    }

    #[test]
    fn distinct_out_times_untouched() {
        let mut parser = ProgressParser::new();
        parser.feed("out_time_ms=5000000\nout_time_us=5000000\nprogress=continue\n");
        assert_eq!(
            parser.committed().get("out_time_ms"),
            Some(&ProgressValue::Number(5000.0))
        );

        parser.feed("out_time_ms=5000\nout_time_us=5000000\nprogress=continue\n");
        assert_eq!(
            parser.committed().get("out_time_ms"),
            Some(&ProgressValue::Number(5000.0))
        );
    }

    #[test]
    fn carriage_return_line_is_ignored() {
        let mut parser = ProgressParser::new();
        parser.push_line("frame=10\n");
        parser.push_line("frame=  120 fps= 30 q=28.0 size=    512kB\r");

        assert!(parser.last().is_none());
        assert_eq!(parser.pending().frame(), Some(10));
        assert_eq!(parser.update_count(), 0);
    }

    #[test]
    fn one_event_per_progress_line() {
        let mut parser = ProgressParser::new();
        let seen = collect(&mut parser);

        parser.feed("frame=1\nfps=0.0\nprogress=continue\n");
        parser.feed("frame=2\nprogress=continue\nframe=3\nprogress=end\n");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].frame(), Some(1));
        assert_eq!(seen[2].frame(), Some(3));
        assert!(seen[2].is_end());
        assert!(!seen[0].is_end());
    }

    #[test]
    fn committed_is_replaced_not_merged() {
        let mut parser = ProgressParser::new();
        parser.feed("frame=1\nfps=25\nprogress=continue\n");
        parser.feed("frame=2\nprogress=continue\n");

        assert_eq!(parser.committed().frame(), Some(2));
        assert!(parser.committed().get("fps").is_none());
        assert!(parser.pending().is_empty());
    }

    #[test]
    fn later_values_overwrite_pending() {
        let mut parser = ProgressParser::new();
        parser.feed("speed=N/A\nspeed=1.02x\n");
        assert_eq!(
            parser.pending().get("speed"),
            Some(&ProgressValue::Text("1.02x".into()))
        );
    }

    #[test]
    fn chunks_split_mid_line() {
        let mut parser = ProgressParser::new();
        parser.feed("fra");
        parser.feed("me=4");
        parser.feed("2\nprog");
        assert_eq!(parser.pending().frame(), Some(42));
        assert_eq!(parser.update_count(), 0);

        parser.feed("ress=continue\n");
        assert_eq!(parser.committed().frame(), Some(42));
        assert_eq!(parser.update_count(), 1);
    }

    #[test]
    fn chunk_ending_in_carriage_return_is_dropped() {
        let mut parser = ProgressParser::new();
        parser.feed("frame=7\r");
        parser.feed("\n");
        assert!(parser.pending().is_empty());
        assert!(parser.last().is_none());

        parser.feed("transient stats\r");
        parser.feed("\n");
        assert!(parser.last().is_none());
        assert_eq!(parser.log().count(), 0);

        parser.feed("progress=continue\n");
        assert_eq!(parser.committed().frame(), None);
        assert_eq!(parser.update_count(), 1);
    }

    #[test]
    fn crlf_within_a_chunk_ends_the_line() {
        let mut parser = ProgressParser::new();
        parser.feed("frame=7\r\nprogress=continue\r\n");
        assert_eq!(parser.committed().frame(), Some(7));
    }

    #[test]
    fn blank_lines_are_not_logged() {
        let mut parser = ProgressParser::new();
        parser.feed("\n\n  \r\nx\n\t\n");
        parser.finish();
        assert_eq!(parser.last_n(10), vec!["x"]);
        assert!(parser.pending().is_empty());
    }

    #[test]
    fn transient_segments_are_discarded() {
        let mut parser = ProgressParser::new();
        parser.feed("size=1kB\rsize=2kB\rStream mapping:\n");
        assert_eq!(parser.last_n(10), vec!["Stream mapping:"]);
        assert!(parser.pending().is_empty());

        parser.feed("frame=  1\rframe=  2\r");
        parser.finish();
        assert_eq!(parser.last_n(10), vec!["Stream mapping:"]);
    }

    #[test]
    fn log_lines_carry_last_media_time() {
        let mut parser = ProgressParser::new();
        parser.feed("Input #0, matroska,webm, from 'in.mkv':\n");
        parser.feed("out_time=00:00:02.000000\nprogress=continue\n");
        parser.feed("[libx264 @ 0x1] frame I:1\n");

        let entries: Vec<_> = parser.log().cloned().collect();
        assert_eq!(entries[0].time, "0");
        assert_eq!(entries[1].time, "00:00:02.000000");
        assert_eq!(
            parser.formatted_log(),
            "[0] Input #0, matroska,webm, from 'in.mkv':\n\
             [00:00:02.000000] [libx264 @ 0x1] frame I:1\n"
        );
    }

    #[test]
    fn last_and_last_n() {
        let mut parser = ProgressParser::new();
        assert!(parser.last().is_none());
        parser.feed("one\ntwo\nthree\n");

        assert_eq!(parser.last(), Some("three"));
        assert_eq!(parser.last_n(2), vec!["two", "three"]);
        assert_eq!(parser.last_n(10), vec!["one", "two", "three"]);
    }

    #[test]
    fn bounded_log_drops_oldest() {
        let config = ProgressConfig {
            log_capacity: Some(2),
            default_time: "N/A".into(),
        };
        let mut parser = ProgressParser::from_config(&config);
        parser.feed("a\nb\nc\n");

        assert_eq!(parser.last_n(5), vec!["b", "c"]);
        assert_eq!(parser.last_media_time(), "N/A");
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut parser = ProgressParser::new();
        parser.feed("frame=9\nprogress=end");
        assert_eq!(parser.update_count(), 0);
        parser.finish();
        assert_eq!(parser.update_count(), 1);
    }

    #[test]
    fn subscribers_receive_updates() {
        let mut parser = ProgressParser::new();
        let mut rx = parser.subscribe();
        parser.feed("frame=5\nprogress=continue\n");

        let update = rx.try_recv().unwrap();
        assert_eq!(update.frame(), Some(5));
        assert_eq!(update.progress_state(), "continue");
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let mut parser = ProgressParser::new();
        drop(parser.subscribe());
        parser.feed("progress=continue\n");
        assert!(parser.subscribers.is_empty());
    }

    #[test]
    fn update_serializes_with_state_last() {
        let mut parser = ProgressParser::new();
        let mut rx = parser.subscribe();
        parser.feed("frame=3\nspeed=2x\nprogress=end\n");

        let json = serde_json::to_string(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(json, r#"{"frame":3.0,"speed":"2x","progress":"end"}"#);
    }
}
