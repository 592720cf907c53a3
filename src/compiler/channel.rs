//! Per-channel compilation state

use super::pitch::Pitch;

/// Number of available channels
pub const CHANNELS: usize = 16;

/// Process defaults a channel is (re)initialized with
pub const DEFAULT_KEY: i32 = 0;
pub const DEFAULT_LENGTH: u32 = 4;
pub const DEFAULT_OCTAVE: i32 = 4;
pub const DEFAULT_TEMPO: u32 = 120;

/// Mutable state of one channel during compilation.
///
/// The tie-tracking triple remembers the previous non-rest note of this
/// channel: the index of the measure holding its notations, its resolved
/// pitch, and its raw lyric fragment. A rest clears all three.
#[derive(Debug, Clone)]
pub struct ChannelState {
    /// Key transposition in semitones
    pub key: i32,
    /// Default note length (denominator of a whole note)
    pub length: u32,
    /// Current octave
    pub octave: i32,
    /// Current tempo (BPM)
    pub tempo: u32,
    /// Measure index of the previous note's notations
    pub last_measure: Option<usize>,
    /// Resolved pitch of the previous note
    pub last_pitch: Option<Pitch>,
    /// Raw lyric fragment of the previous note
    pub last_text: Option<String>,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY,
            length: DEFAULT_LENGTH,
            octave: DEFAULT_OCTAVE,
            tempo: DEFAULT_TEMPO,
            last_measure: None,
            last_pitch: None,
            last_text: None,
        }
    }
}

impl ChannelState {
    /// Forget the previous note, ending any tie chain.
    pub fn clear_tie_tracking(&mut self) {
        self.last_measure = None;
        self.last_pitch = None;
        self.last_text = None;
    }
}
