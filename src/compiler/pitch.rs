//! Pitch model - conversion between note numbers and step/alter/octave

use crate::error::{Error, Result};

/// Diatonic step letters
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

/// Semitone offset of each step relative to the octave origin
const STEP_OFFSET: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Nearest natural step for each chromatic value
const VALUE_STEP: [Step; 12] = [
    Step::C,
    Step::C,
    Step::D,
    Step::D,
    Step::E,
    Step::F,
    Step::F,
    Step::G,
    Step::G,
    Step::A,
    Step::A,
    Step::B,
];

/// Alteration paired with VALUE_STEP for each chromatic value
const VALUE_ALTER: [i32; 12] = [0, 1, 0, 1, 0, 0, 1, 0, 1, 0, 1, 0];

impl Step {
    /// Parse a step letter (either case).
    ///
    /// An illegal letter here means the parser let something through it
    /// should not have, so this is an internal error rather than a parse
    /// error.
    pub fn from_char(c: char) -> Result<Step> {
        match c.to_ascii_uppercase() {
            'C' => Ok(Step::C),
            'D' => Ok(Step::D),
            'E' => Ok(Step::E),
            'F' => Ok(Step::F),
            'G' => Ok(Step::G),
            'A' => Ok(Step::A),
            'B' => Ok(Step::B),
            _ => Err(Error::Internal(format!("illegal step letter '{}'", c))),
        }
    }

    pub fn letter(self) -> char {
        match self {
            Step::C => 'C',
            Step::D => 'D',
            Step::E => 'E',
            Step::F => 'F',
            Step::G => 'G',
            Step::A => 'A',
            Step::B => 'B',
        }
    }

    fn index(self) -> usize {
        match self {
            Step::C => 0,
            Step::D => 1,
            Step::E => 2,
            Step::F => 3,
            Step::G => 4,
            Step::A => 5,
            Step::B => 6,
        }
    }
}

/// A pitch held in its canonical numeric form, always in [0, 127].
///
/// The structured (step, alteration, octave) view is derived on demand so
/// the two representations can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pitch {
    value: u8,
}

impl Pitch {
    /// Build a pitch from a note number, clamping into [0, 127].
    pub fn from_value(value: i32) -> Pitch {
        Pitch {
            value: value.clamp(0, 127) as u8,
        }
    }

    /// Build a pitch from its structured form.
    ///
    /// The alteration is normalized with the same asymmetric rule the
    /// original system uses: reduce mod 12, then subtract 12 if the
    /// incoming value was negative. -1 maps to -1, but -12 maps to -12
    /// rather than 0. Kept verbatim.
    pub fn from_parts(step: Step, alteration: i32, octave: i32) -> Pitch {
        let alteration = normalize_alteration(alteration);
        let octave = octave.clamp(-1, 9);
        let value = STEP_OFFSET[step.index()] + alteration + (octave + 1) * 12;
        Pitch::from_value(value)
    }

    /// Shift by a number of semitones, clamping the result.
    pub fn transpose(self, semitones: i32) -> Pitch {
        Pitch::from_value(self.value as i32 + semitones)
    }

    pub fn value(self) -> u8 {
        self.value
    }

    pub fn step(self) -> Step {
        VALUE_STEP[self.value as usize % 12]
    }

    pub fn alteration(self) -> i32 {
        VALUE_ALTER[self.value as usize % 12]
    }

    pub fn octave(self) -> i32 {
        self.value as i32 / 12 - 1
    }
}

fn normalize_alteration(alteration: i32) -> i32 {
    let mut normalized = alteration.rem_euclid(12);
    if alteration < 0 {
        normalized -= 12;
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_round_trip() {
        for value in 0..=127u8 {
            let pitch = Pitch::from_value(value as i32);
            let back = Pitch::from_parts(pitch.step(), pitch.alteration(), pitch.octave());
            assert_eq!(back.value(), value);
        }
    }

    #[test]
    fn test_value_clamped() {
        assert_eq!(Pitch::from_value(-5).value(), 0);
        assert_eq!(Pitch::from_value(128).value(), 127);
        assert_eq!(Pitch::from_value(4000).value(), 127);
    }

    #[test]
    fn test_middle_c() {
        let pitch = Pitch::from_parts(Step::C, 0, 4);
        assert_eq!(pitch.value(), 60);
        assert_eq!(pitch.step(), Step::C);
        assert_eq!(pitch.alteration(), 0);
        assert_eq!(pitch.octave(), 4);
    }

    #[test]
    fn test_sharps_map_to_raised_naturals() {
        let pitch = Pitch::from_value(61);
        assert_eq!(pitch.step(), Step::C);
        assert_eq!(pitch.alteration(), 1);
        assert_eq!(pitch.octave(), 4);
    }

    #[test]
    fn test_flat_wraps_down() {
        // C flat in octave 4 is numeric 59, which reads back as B natural
        let pitch = Pitch::from_parts(Step::C, -1, 4);
        assert_eq!(pitch.value(), 59);
        assert_eq!(pitch.step(), Step::B);
        assert_eq!(pitch.octave(), 3);
    }

    #[test]
    fn test_alteration_normalization_quirk() {
        assert_eq!(normalize_alteration(1), 1);
        assert_eq!(normalize_alteration(-1), -1);
        assert_eq!(normalize_alteration(13), 1);
        // the asymmetric branch: -12 stays -12 instead of folding to 0
        assert_eq!(normalize_alteration(-12), -12);
        assert_eq!(normalize_alteration(-13), -1);
    }

    #[test]
    fn test_octave_clamped() {
        assert_eq!(Pitch::from_parts(Step::C, 0, 12).octave(), 9);
        assert_eq!(Pitch::from_parts(Step::C, 0, -4).octave(), -1);
    }

    #[test]
    fn test_transpose() {
        assert_eq!(Pitch::from_value(60).transpose(7).value(), 67);
        assert_eq!(Pitch::from_value(60).transpose(-60).value(), 0);
        assert_eq!(Pitch::from_value(120).transpose(20).value(), 127);
    }

    #[test]
    fn test_step_rejects_garbage() {
        assert!(Step::from_char('H').is_err());
        assert!(Step::from_char('3').is_err());
        assert!(Step::from_char('b').is_ok());
    }
}
