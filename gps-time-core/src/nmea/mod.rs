//! byte at a time NMEA 0183 decoding.
//!
//! there are no blocking reads in here. the caller hands us whatever bytes the uart had and
//! we keep our place between calls.
pub mod fields;
pub mod sentence;

pub use sentence::{Gga, Rmc, Sentence};

use crate::logging::trace;

/// longest body (between `$` and `*`) we will hold. the standard says 82 for the whole line
pub const MAX_BODY_LEN: usize = 82;

/// xor of every byte between `$` and `*`
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, b| acc ^ b)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidReason {
    /// hit the line terminator without ever seeing `*`
    MissingChecksum,
    /// something other than two hex digits (and then the terminator) after `*`
    BadChecksumDigit,
    ChecksumMismatch { computed: u8, received: u8 },
    /// longer than [`MAX_BODY_LEN`]
    Overflow,
    /// checksum was fine but a field we care about didn't parse
    BadField,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SentenceResult {
    /// keep feeding
    Incomplete,
    Invalid(InvalidReason),
    Complete(Sentence),
}

impl SentenceResult {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// waiting for `$`. everything else is line noise
    Idle,
    Accumulating { computed: u8 },
    Checksum { computed: u8, received: u8, digits: u8 },
}

pub struct NmeaDecoder {
    state: State,
    body: heapless::Vec<u8, MAX_BODY_LEN>,
}

impl Default for NmeaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NmeaDecoder {
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            body: heapless::Vec::new(),
        }
    }

    /// true while part way through a sentence
    pub fn in_sentence(&self) -> bool {
        self.state != State::Idle
    }

    pub fn feed(&mut self, byte: u8) -> SentenceResult {
        // `$` always starts over. whatever we had is dropped without a result
        if byte == b'$' {
            if self.in_sentence() {
                trace!("nmea: resync after {} bytes", self.body.len());
            }
            self.body.clear();
            self.state = State::Accumulating { computed: 0 };
            return SentenceResult::Incomplete;
        }

        match self.state {
            State::Idle => SentenceResult::Incomplete,
            State::Accumulating { computed } => match byte {
                b'*' => {
                    self.state = State::Checksum {
                        computed,
                        received: 0,
                        digits: 0,
                    };
                    SentenceResult::Incomplete
                }
                b'\r' | b'\n' => self.fail(InvalidReason::MissingChecksum),
                _ => {
                    if self.body.push(byte).is_err() {
                        return self.fail(InvalidReason::Overflow);
                    }
                    self.state = State::Accumulating {
                        computed: computed ^ byte,
                    };
                    SentenceResult::Incomplete
                }
            },
            State::Checksum {
                computed,
                received,
                digits,
            } => {
                if digits < 2 {
                    let Some(nibble) = hex_value(byte) else {
                        return self.fail(InvalidReason::BadChecksumDigit);
                    };
                    self.state = State::Checksum {
                        computed,
                        received: (received << 4) | nibble,
                        digits: digits + 1,
                    };
                    SentenceResult::Incomplete
                } else if byte == b'\r' || byte == b'\n' {
                    self.state = State::Idle;
                    self.finish(computed, received)
                } else {
                    self.fail(InvalidReason::BadChecksumDigit)
                }
            }
        }
    }

    /// feed a whole buffer, yielding only the finished results. chunking doesn't change the output
    pub fn feed_all<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = SentenceResult> + 'a {
        bytes
            .iter()
            .map(move |&b| self.feed(b))
            .filter(|x| !x.is_incomplete())
    }

    fn fail(&mut self, reason: InvalidReason) -> SentenceResult {
        self.state = State::Idle;
        self.body.clear();
        SentenceResult::Invalid(reason)
    }

    fn finish(&mut self, computed: u8, received: u8) -> SentenceResult {
        if computed != received {
            return self.fail(InvalidReason::ChecksumMismatch { computed, received });
        }

        let result = match Sentence::parse(&self.body) {
            Ok(sentence) => SentenceResult::Complete(sentence),
            Err(_) => SentenceResult::Invalid(InvalidReason::BadField),
        };

        self.body.clear();

        result
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}
