//! Bounded per-shape batch accumulation.
//!
//! One buffer per record shape, each independently bounded. A buffer is
//! ready to flush when it reaches capacity, or at end of stream when it is
//! non-empty. Taking a ready buffer replaces it with an empty one, so an
//! in-flight submission never shares state with the next accumulation cycle.

use std::collections::HashMap;
use std::mem;

use crate::record::{Record, Shape};

/// Records per batch submitted to the oracle.
pub const BATCH_SIZE: usize = 100;

/// The five per-shape accumulator buffers, keyed by record id.
pub struct BatchSet {
    buffers: [HashMap<String, Record>; 5],
    capacity: usize,
}

impl BatchSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            capacity,
        }
    }

    /// Appends a record to the buffer for its shape and returns that
    /// buffer's new size.
    pub fn push(&mut self, record: Record) -> usize {
        let buffer = &mut self.buffers[record.shape().index()];
        buffer.insert(record.id().to_string(), record);
        buffer.len()
    }

    pub fn len(&self, shape: Shape) -> usize {
        self.buffers[shape.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.iter().all(HashMap::is_empty)
    }

    /// Drains every buffer that is due: at or over capacity, or non-empty
    /// when `at_end` is set. Buffers are returned in shape order.
    pub fn take_ready(&mut self, at_end: bool) -> Vec<(Shape, HashMap<String, Record>)> {
        let mut ready = Vec::new();
        for shape in Shape::ALL {
            let len = self.buffers[shape.index()].len();
            if len >= self.capacity || (at_end && len > 0) {
                ready.push((shape, mem::take(&mut self.buffers[shape.index()])));
            }
        }
        ready
    }
}
