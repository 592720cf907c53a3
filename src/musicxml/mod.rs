//! MusicXML document model
//!
//! One `Score` per channel, holding one part whose measures each wrap a
//! single note or rest plus a repeated snapshot of presentation
//! attributes. The model is append-only while compiling and immutable
//! afterwards; rendering lives in [`writer`].

pub mod writer;

use crate::compiler::pitch::Step;
use serde::Serialize;

/// A complete single-part score (`score-partwise` root element)
#[derive(Debug, Clone, Default, Serialize)]
pub struct Score {
    pub part: Part,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Part {
    pub measures: Vec<Measure>,
}

/// One measure: exactly one note-or-rest event with its attributes
#[derive(Debug, Clone, Serialize)]
pub struct Measure {
    pub attributes: Attributes,
    pub note: Note,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Attributes {
    pub divisions: u32,
    /// Key signature display, in fifths
    pub fifths: i32,
    pub time: TimeSignature,
    pub clef: Clef,
    /// Tempo carried on the measure's sound directive
    pub tempo: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_type: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Clef {
    pub sign: char,
    pub line: u32,
}

impl Clef {
    /// The fixed treble clef every measure carries
    pub fn treble() -> Clef {
        Clef { sign: 'G', line: 2 }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Note {
    pub duration: u32,
    pub kind: NoteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notations: Option<Notations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyric: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteKind {
    Rest,
    Pitch {
        step: Step,
        alter: i32,
        octave: i32,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Notations {
    pub articulations: Articulations,
    /// Tie elements in the order they were attached: a stop recorded when
    /// the note was emitted, a start appended later if the next note ties
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ties: Vec<Tie>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Articulations {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub breath_mark: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tie {
    Start,
    Stop,
}

impl Score {
    pub fn new() -> Score {
        Score::default()
    }
}

impl Note {
    pub fn rest(duration: u32) -> Note {
        Note {
            duration,
            kind: NoteKind::Rest,
            notations: None,
            lyric: None,
        }
    }

    /// Append a tie element to this note's notations.
    pub fn push_tie(&mut self, tie: Tie) {
        self.notations.get_or_insert_with(Notations::default).ties.push(tie);
    }
}
