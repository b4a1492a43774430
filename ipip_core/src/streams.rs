// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named stream registry.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use hashbrown::hash_map::EntryRef;

use crate::window::{ExtremaPolicy, FeedOutcome, TimeWindowBuffer};

/// Window buffers keyed by stream name, kept in first-seen order.
///
/// Buffers are created on first use and live until the set is dropped.
#[derive(Clone, Debug)]
pub struct StreamSet {
    index: HashMap<String, usize>,
    streams: Vec<(String, TimeWindowBuffer)>,
    span: f64,
    extrema_policy: ExtremaPolicy,
}

impl StreamSet {
    /// Creates an empty set whose buffers use `span`.
    pub fn new(span: f64) -> Self {
        Self {
            index: HashMap::new(),
            streams: Vec::new(),
            span,
            extrema_policy: ExtremaPolicy::default(),
        }
    }

    /// Sets the extrema policy of buffers created from now on.
    pub fn with_extrema_policy(mut self, policy: ExtremaPolicy) -> Self {
        self.extrema_policy = policy;
        self
    }

    /// Returns the buffer for `name`, creating it if needed.
    pub fn entry(&mut self, name: &str) -> &mut TimeWindowBuffer {
        let i = match self.index.entry_ref(name) {
            EntryRef::Occupied(e) => *e.get(),
            EntryRef::Vacant(e) => {
                let i = self.streams.len();
                log::debug!("new stream {name:?}");
                let buf = TimeWindowBuffer::new(self.span).with_extrema_policy(self.extrema_policy);
                self.streams.push((String::from(name), buf));
                e.insert(i);
                i
            }
        };
        &mut self.streams[i].1
    }

    /// Feeds one sample to the named stream.
    pub fn feed(&mut self, name: &str, timestamp: f64, values: &[f64]) -> FeedOutcome {
        self.entry(name).feed(timestamp, values)
    }

    /// Looks up a stream.
    pub fn get(&self, name: &str) -> Option<&TimeWindowBuffer> {
        self.index.get(name).map(|&i| &self.streams[i].1)
    }

    /// Looks up a stream mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TimeWindowBuffer> {
        let i = *self.index.get(name)?;
        Some(&mut self.streams[i].1)
    }

    /// Streams in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TimeWindowBuffer)> {
        self.streams.iter().map(|(n, b)| (n.as_str(), b))
    }

    /// Streams in first-seen order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut TimeWindowBuffer)> {
        self.streams.iter_mut().map(|(n, b)| (n.as_str(), b))
    }

    /// Number of streams.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether no stream has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Changes the span of every stream, and of streams created later.
    pub fn set_span(&mut self, span: f64) {
        self.span = span;
        for (_, buf) in &mut self.streams {
            buf.set_span(span);
        }
    }

    /// Clears every buffer; the streams stay registered.
    pub fn clear_all(&mut self) {
        for (_, buf) in &mut self.streams {
            buf.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    #[test]
    fn streams_are_created_lazily_in_order() {
        let mut set = StreamSet::new(5.0);
        set.feed("cos", 0.0, &[1.0]);
        set.feed("sin", 0.0, &[0.0]);
        set.feed("cos", 0.5, &[0.9]);
        let names: Vec<_> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["cos", "sin"]);
        assert_eq!(set.get("cos").map(TimeWindowBuffer::len), Some(2));
        assert!(set.get("tan").is_none());
    }

    #[test]
    fn span_changes_reach_existing_and_new_streams() {
        let mut set = StreamSet::new(5.0);
        set.entry("a");
        set.set_span(20.0);
        set.entry("b");
        for (_, buf) in set.iter() {
            assert_eq!(buf.span(), 20.0);
        }
    }

    #[test]
    fn get_mut_reaches_one_stream() {
        let mut set = StreamSet::new(5.0);
        set.feed("a", 1.0, &[1.0]);
        set.feed("b", 1.0, &[2.0]);
        set.get_mut("a").unwrap().clear();
        assert!(set.get("a").is_some_and(TimeWindowBuffer::is_empty));
        assert_eq!(set.get("b").map(TimeWindowBuffer::len), Some(1));
        assert!(set.get_mut("c").is_none());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn clear_all_keeps_registrations() {
        let mut set = StreamSet::new(5.0);
        set.feed("a", 1.0, &[1.0]);
        set.clear_all();
        assert_eq!(set.len(), 1);
        assert!(set.get("a").is_some_and(TimeWindowBuffer::is_empty));
    }
}
