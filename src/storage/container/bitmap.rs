// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Growable bitmap used for null flags and boolean column values

/// Bits per backing word
const WORD_BITS: usize = 64;

/// A fixed-length bitmap over `u64` words
///
/// Bits past the logical length read as the bitmap's fill value, so a slot
/// that was never written reads the same as one freshly grown into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    words: Vec<u64>,
    len: usize,
    fill: bool,
}

impl Bitmap {
    /// Create an empty bitmap whose unset bits read as `fill`
    pub fn new(fill: bool) -> Self {
        Self {
            words: Vec::new(),
            len: 0,
            fill,
        }
    }

    /// Number of addressable bits
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no bits are addressable
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read a bit; positions past the length read as the fill value
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        if index >= self.len {
            return self.fill;
        }
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    /// Write a bit, growing the bitmap if needed
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        if index >= self.len {
            self.resize(index + 1);
        }
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Grow to `len` bits; new bits take the fill value. Never shrinks.
    pub fn resize(&mut self, len: usize) {
        if len <= self.len {
            return;
        }
        let old_len = self.len;
        let words_needed = len.div_ceil(WORD_BITS);
        let fill_word = if self.fill { u64::MAX } else { 0 };
        self.words.resize(words_needed, fill_word);

        // The tail of the previously last word may hold stale bits
        if self.fill && old_len % WORD_BITS != 0 {
            let last = old_len / WORD_BITS;
            self.words[last] |= u64::MAX << (old_len % WORD_BITS);
        } else if !self.fill && old_len % WORD_BITS != 0 {
            let last = old_len / WORD_BITS;
            self.words[last] &= !(u64::MAX << (old_len % WORD_BITS));
        }
        self.len = len;
    }

    /// Count of set bits within the length
    pub fn count_ones(&self) -> usize {
        (0..self.len).filter(|&i| self.get(i)).count()
    }
}
