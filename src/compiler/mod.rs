//! MML compiler - walks the command tree and builds per-channel scores

pub mod channel;
pub mod pitch;

use crate::error::{Error, Result};
use crate::lyric;
use crate::musicxml::{
    Articulations, Attributes, Clef, Measure, Notations, Note, NoteKind, Score, Tie, TimeSignature,
};
use crate::parser::ast::{Command, NoteCommand, NotePitch};
use channel::{ChannelState, CHANNELS};
use pitch::{Pitch, Step};
use std::collections::HashMap;

/// Compiler state for one compilation pass.
///
/// One instance compiles one command tree; `compile` consumes the
/// instance, so state can never leak between compilations.
pub struct Compiler {
    /// Per-channel documents, None for channels never selected
    scores: [Option<Score>; CHANNELS],
    /// Per-channel state, indexed alongside `scores`
    states: [ChannelState; CHANNELS],
    /// Active channel
    channel: usize,
    /// True once any channel-select command has run
    local: bool,
    /// Key recorded from a K command before the first channel select
    global_key: i32,
    /// Tempo recorded from a T command before the first channel select
    global_tempo: u32,
    /// Macro bodies by upper-cased name, shared by all channels
    macros: HashMap<String, Vec<Command>>,
    /// Compilation-wide `!` flag: swaps the octave up/down commands
    octave_reverse: bool,
}

impl Compiler {
    pub fn new() -> Self {
        let mut compiler = Self {
            scores: std::array::from_fn(|_| None),
            states: std::array::from_fn(|_| ChannelState::default()),
            channel: 0,
            local: false,
            global_key: channel::DEFAULT_KEY,
            global_tempo: channel::DEFAULT_TEMPO,
            macros: HashMap::new(),
            octave_reverse: false,
        };
        compiler.init_channel(0, false);
        compiler
    }

    /// Reset a channel to the process defaults and attach a fresh
    /// document, then make it the active channel.
    fn init_channel(&mut self, channel: usize, local: bool) {
        self.channel = channel;
        self.local = local;
        self.states[channel] = ChannelState::default();
        self.scores[channel] = Some(Score::new());
    }

    /// Walk the command tree and return the per-channel scores.
    pub fn compile(mut self, commands: &[Command]) -> Result<Vec<Option<Score>>> {
        self.run_sequence(commands)?;
        Ok(self.scores.into_iter().collect())
    }

    /// Key and tempo recorded before the first channel select. These are
    /// never propagated to later channels; they are only observable here.
    pub fn global_defaults(&self) -> (i32, u32) {
        (self.global_key, self.global_tempo)
    }

    fn state(&self) -> &ChannelState {
        &self.states[self.channel]
    }

    fn state_mut(&mut self) -> &mut ChannelState {
        &mut self.states[self.channel]
    }

    fn run_sequence(&mut self, commands: &[Command]) -> Result<()> {
        for command in commands {
            self.run_command(command)?;
        }
        Ok(())
    }

    fn run_command(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Channel(n) => {
                // Re-selecting the current channel also resets it.
                self.init_channel(*n as usize, true);
            }
            Command::Call { name } => self.run_call(name)?,
            Command::Define { name, body } => {
                let normalized = name.to_ascii_uppercase();
                if self.macros.contains_key(&normalized) {
                    return Err(Error::DuplicateMacro(name.clone()));
                }
                self.macros.insert(normalized, body.clone());
            }
            Command::Note(note) => self.run_note(note)?,
            Command::Key(key) => {
                self.state_mut().key = *key;
                if !self.local {
                    self.global_key = *key;
                }
            }
            Command::Length(length) => {
                self.state_mut().length = *length;
            }
            Command::Loop { body, count } => {
                for _ in 0..*count {
                    let octave = self.state().octave;
                    self.run_sequence(body)?;
                    self.state_mut().octave = octave;
                }
            }
            Command::Octave(octave) => {
                self.state_mut().octave = *octave;
            }
            Command::OctaveUp => {
                let delta = if self.octave_reverse { -1 } else { 1 };
                self.state_mut().octave += delta;
            }
            Command::OctaveDown => {
                let delta = if self.octave_reverse { 1 } else { -1 };
                self.state_mut().octave += delta;
            }
            Command::OctaveReverse => {
                self.octave_reverse = true;
            }
            Command::Tempo(tempo) => {
                self.state_mut().tempo = *tempo;
                if !self.local {
                    self.global_tempo = *tempo;
                }
            }
            Command::Unsupported => {}
        }
        Ok(())
    }

    /// Expand a macro body against the current channel state. The default
    /// length and octave are restored afterwards; key, tempo and tie
    /// tracking keep whatever the body left behind.
    ///
    /// A macro calling itself recurses without bound; the language has no
    /// cycle detection.
    fn run_call(&mut self, name: &str) -> Result<()> {
        let normalized = name.to_ascii_uppercase();
        let body = match self.macros.get(&normalized) {
            Some(body) => body.clone(),
            None => return Err(Error::UndefinedMacro(name.to_string())),
        };

        let length = self.state().length;
        let octave = self.state().octave;

        self.run_sequence(&body)?;

        let state = self.state_mut();
        state.length = length;
        state.octave = octave;
        Ok(())
    }

    /// Compile one note or rest into a measure of the active channel.
    fn run_note(&mut self, command: &NoteCommand) -> Result<()> {
        let state = self.state();
        let length = command.length.unwrap_or(state.length);
        // each dot doubles the subdivision; saturate on absurd dot counts
        let factor = 1u64 << command.dots.min(31);
        let beats = (2 * factor - 1).min(u32::MAX as u64) as u32;
        let beat_type = (length as u64 * factor).min(u32::MAX as u64) as u32;

        let resolved = match command.pitch {
            NotePitch::Rest => None,
            NotePitch::Step { letter, alteration } => {
                let step = Step::from_char(letter)?;
                Some(Pitch::from_parts(step, alteration, state.octave).transpose(state.key))
            }
            NotePitch::Absolute(value) => {
                Some(Pitch::from_value(value as i32).transpose(state.key))
            }
        };

        // Tie when this note continues the previous note's syllable: the
        // previous fragment must be a suffix of the current one.
        let text = command.text.as_deref().unwrap_or("");
        let tie_from = match (&state.last_measure, &state.last_pitch, &state.last_text) {
            (Some(measure), Some(_), Some(previous))
                if resolved.is_some() && !previous.is_empty() && text.ends_with(previous.as_str()) =>
            {
                Some(*measure)
            }
            _ => None,
        };

        let tempo = state.tempo;
        let note = match resolved {
            None => Note::rest(beats),
            Some(pitch) => Note {
                duration: beats,
                kind: NoteKind::Pitch {
                    step: pitch.step(),
                    alter: pitch.alteration(),
                    octave: pitch.octave(),
                },
                notations: Some(Notations {
                    articulations: Articulations {
                        breath_mark: command.breath,
                    },
                    ties: if tie_from.is_some() {
                        vec![Tie::Stop]
                    } else {
                        Vec::new()
                    },
                }),
                lyric: command.text.as_deref().map(lyric::convert),
            },
        };

        let measure = Measure {
            attributes: Attributes {
                divisions: 1,
                fifths: 0,
                time: TimeSignature { beats, beat_type },
                clef: Clef::treble(),
                tempo,
            },
            note,
        };

        let score = self.scores[self.channel].get_or_insert_with(Score::new);
        let index = score.part.measures.len();
        score.part.measures.push(measure);

        if let Some(previous) = tie_from {
            if let Some(tied) = score.part.measures.get_mut(previous) {
                tied.note.push_tie(Tie::Start);
            }
        }

        let state = self.state_mut();
        match resolved {
            Some(pitch) => {
                state.last_measure = Some(index);
                state.last_pitch = Some(pitch);
                state.last_text = Some(text.to_string());
            }
            None => state.clear_tie_tracking(),
        }

        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn compile(source: &str) -> Vec<Option<Score>> {
        let tree = parser::parse(source).unwrap();
        Compiler::new().compile(&tree).unwrap()
    }

    fn measures(scores: &[Option<Score>], channel: usize) -> &[Measure] {
        &scores[channel].as_ref().unwrap().part.measures
    }

    fn pitch_value(measure: &Measure) -> i32 {
        match measure.note.kind {
            NoteKind::Pitch {
                step,
                alter,
                octave,
            } => Pitch::from_parts(step, alter, octave).value() as i32,
            NoteKind::Rest => panic!("expected a pitched note"),
        }
    }

    #[test]
    fn test_empty_input_keeps_channel_zero_open() {
        let scores = compile("");
        assert!(scores[0].is_some());
        assert!(measures(&scores, 0).is_empty());
        assert!(scores[1..].iter().all(|s| s.is_none()));
    }

    #[test]
    fn test_scale_end_to_end() {
        let scores = compile("CDEFG");
        let measures = measures(&scores, 0);
        assert_eq!(measures.len(), 5);
        let values: Vec<i32> = measures.iter().map(pitch_value).collect();
        assert_eq!(values, vec![60, 62, 64, 65, 67]);
        for measure in measures {
            assert_eq!(measure.attributes.time.beats, 1);
            assert_eq!(measure.attributes.time.beat_type, 4);
            assert!(measure.note.lyric.is_none());
            assert!(measure.note.notations.as_ref().unwrap().ties.is_empty());
        }
    }

    #[test]
    fn test_dotted_durations() {
        let scores = compile("C4 C4. C4..");
        let measures = measures(&scores, 0);
        let encoded: Vec<(u32, u32)> = measures
            .iter()
            .map(|m| (m.attributes.time.beats, m.attributes.time.beat_type))
            .collect();
        assert_eq!(encoded, vec![(1, 4), (3, 8), (7, 16)]);
        assert_eq!(measures[2].note.duration, 7);
    }

    #[test]
    fn test_default_length_and_explicit_length() {
        let scores = compile("L8 C C2");
        let measures = measures(&scores, 0);
        assert_eq!(measures[0].attributes.time.beat_type, 8);
        assert_eq!(measures[1].attributes.time.beat_type, 2);
    }

    #[test]
    fn test_key_transposition() {
        let scores = compile("K2 C N60");
        let measures = measures(&scores, 0);
        assert_eq!(pitch_value(&measures[0]), 62);
        // absolute pitches are transposed too
        assert_eq!(pitch_value(&measures[1]), 62);
    }

    #[test]
    fn test_accidentals() {
        let scores = compile("C# C- C+");
        let measures = measures(&scores, 0);
        assert_eq!(pitch_value(&measures[0]), 61);
        assert_eq!(pitch_value(&measures[1]), 59);
        assert_eq!(pitch_value(&measures[2]), 61);
    }

    #[test]
    fn test_octave_commands() {
        let scores = compile("O5 C < C > > C");
        let measures = measures(&scores, 0);
        assert_eq!(pitch_value(&measures[0]), 72);
        assert_eq!(pitch_value(&measures[1]), 84);
        assert_eq!(pitch_value(&measures[2]), 60);
    }

    #[test]
    fn test_octave_reverse() {
        let scores = compile("! < C");
        assert_eq!(pitch_value(&measures(&scores, 0)[0]), 48);
    }

    #[test]
    fn test_absolute_pitch_clamped_by_model() {
        let scores = compile("K15 N120");
        assert_eq!(pitch_value(&measures(&scores, 0)[0]), 127);
    }

    #[test]
    fn test_tempo_attached_to_measures() {
        let scores = compile("C T200 C");
        let measures = measures(&scores, 0);
        assert_eq!(measures[0].attributes.tempo, 120);
        assert_eq!(measures[1].attributes.tempo, 200);
    }

    #[test]
    fn test_macro_expansion_is_case_insensitive() {
        let lower = compile("{Riff=CDE}{riff}");
        let upper = compile("{Riff=CDE}{RIFF}");
        assert_eq!(measures(&lower, 0).len(), 3);
        assert_eq!(measures(&upper, 0).len(), 3);
    }

    #[test]
    fn test_macro_restores_length_and_octave_only() {
        let scores = compile("{x=L8 O6 K3 T90}C {x} C");
        let measures = measures(&scores, 0);
        // length and octave restored after the call
        assert_eq!(measures[1].attributes.time.beat_type, 4);
        assert_eq!(pitch_value(&measures[1]), 60 + 3);
        // tempo persists from the body
        assert_eq!(measures[1].attributes.tempo, 90);
    }

    #[test]
    fn test_macro_errors() {
        let tree = parser::parse("{a=C}{a=D}").unwrap();
        match Compiler::new().compile(&tree) {
            Err(Error::DuplicateMacro(name)) => assert_eq!(name, "a"),
            other => panic!("expected duplicate macro error, got {:?}", other),
        }

        let tree = parser::parse("{missing}").unwrap();
        match Compiler::new().compile(&tree) {
            Err(Error::UndefinedMacro(name)) => assert_eq!(name, "missing"),
            other => panic!("expected undefined macro error, got {:?}", other),
        }
    }

    #[test]
    fn test_loop_unrolls_and_restores_octave() {
        let scores = compile("[O6 C <]2 C");
        let measures = measures(&scores, 0);
        assert_eq!(measures.len(), 3);
        // both iterations start from octave 6 again
        assert_eq!(pitch_value(&measures[0]), 84);
        assert_eq!(pitch_value(&measures[1]), 84);
        // after the loop the octave is back to its pre-loop value
        assert_eq!(pitch_value(&measures[2]), 60);
    }

    #[test]
    fn test_loop_length_changes_persist() {
        let scores = compile("[L8 C]2 C");
        let measures = measures(&scores, 0);
        assert_eq!(measures[1].attributes.time.beat_type, 8);
        assert_eq!(measures[2].attributes.time.beat_type, 8);
    }

    #[test]
    fn test_loop_count_zero() {
        let scores = compile("[C]0 D");
        assert_eq!(measures(&scores, 0).len(), 1);
    }

    #[test]
    fn test_tie_on_suffix_continuation() {
        let scores = compile("*a,C *ka,C");
        let measures = measures(&scores, 0);
        let first = measures[0].note.notations.as_ref().unwrap();
        let second = measures[1].note.notations.as_ref().unwrap();
        assert_eq!(first.ties, vec![Tie::Start]);
        assert_eq!(second.ties, vec![Tie::Stop]);
        assert_eq!(measures[0].note.lyric.as_deref(), Some("あ"));
        assert_eq!(measures[1].note.lyric.as_deref(), Some("か"));
    }

    #[test]
    fn test_tie_suffix_check_is_directional() {
        let scores = compile("*ka,C *a,C");
        let measures = measures(&scores, 0);
        assert!(measures[0].note.notations.as_ref().unwrap().ties.is_empty());
        assert!(measures[1].note.notations.as_ref().unwrap().ties.is_empty());
    }

    #[test]
    fn test_tie_chain_orders_stop_before_start() {
        let scores = compile("*a,C *a,C *a,C");
        let measures = measures(&scores, 0);
        let middle = measures[1].note.notations.as_ref().unwrap();
        assert_eq!(middle.ties, vec![Tie::Stop, Tie::Start]);
    }

    #[test]
    fn test_rest_breaks_tie_tracking() {
        let scores = compile("*a,C R *a,C");
        let measures = measures(&scores, 0);
        assert_eq!(measures.len(), 3);
        assert!(measures[0].note.notations.as_ref().unwrap().ties.is_empty());
        assert!(measures[2].note.notations.as_ref().unwrap().ties.is_empty());
    }

    #[test]
    fn test_notes_without_lyrics_never_tie() {
        let scores = compile("C C *a,C");
        let measures = measures(&scores, 0);
        for measure in measures {
            assert!(measure.note.notations.as_ref().unwrap().ties.is_empty());
        }
    }

    #[test]
    fn test_breath_mark() {
        let scores = compile("C// R//");
        let measures = measures(&scores, 0);
        assert!(
            measures[0]
                .note
                .notations
                .as_ref()
                .unwrap()
                .articulations
                .breath_mark
        );
        // rests carry no notations at all
        assert!(measures[1].note.notations.is_none());
    }

    #[test]
    fn test_channel_isolation() {
        let scores = compile("CD :3 EF");
        assert_eq!(measures(&scores, 0).len(), 2);
        assert_eq!(measures(&scores, 3).len(), 2);
        assert!(scores[1].is_none());
        assert_eq!(pitch_value(&measures(&scores, 3)[0]), 64);
    }

    #[test]
    fn test_channel_reselect_resets_state_and_document() {
        let scores = compile(":3 L8 O6 CD :3 C");
        let measures = measures(&scores, 3);
        assert_eq!(measures.len(), 1);
        assert_eq!(measures[0].attributes.time.beat_type, 4);
        assert_eq!(pitch_value(&measures[0]), 60);
    }

    #[test]
    fn test_global_defaults_recorded_but_inert() {
        let tree = parser::parse("K3 T90").unwrap();
        let mut compiler = Compiler::new();
        compiler.run_sequence(&tree).unwrap();
        assert_eq!(compiler.global_defaults(), (3, 90));

        // after a channel select the recordings stop changing
        let tree = parser::parse(":1 K7 T60").unwrap();
        compiler.run_sequence(&tree).unwrap();
        assert_eq!(compiler.global_defaults(), (3, 90));
        // and the freshly selected channel still starts from the defaults
        assert_eq!(compiler.states[1].tempo, 60);
    }

    #[test]
    fn test_unsupported_commands_have_no_effect() {
        let scores = compile("V10 C @D2 |abc| D $3=7");
        assert_eq!(measures(&scores, 0).len(), 2);
    }
}
