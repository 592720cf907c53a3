//! Command tree produced by the parser

/// One MML command.
///
/// The compiler matches exhaustively over this set; directives that are
/// recognized but have no musical effect parse into `Unsupported` instead
/// of being matched by a catch-all arm.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `{name}` - expand a previously defined macro
    Call { name: String },
    /// `{name=...}` - define a macro
    Define { name: String, body: Vec<Command> },
    /// Note or rest
    Note(NoteCommand),
    /// `Kn` - key transposition in semitones
    Key(i32),
    /// `Ln` - default note length
    Length(u32),
    /// `[...]n` - repeat the body n times
    Loop { body: Vec<Command>, count: u32 },
    /// `On` - set the octave
    Octave(i32),
    /// `<` - octave up (down when reversed)
    OctaveUp,
    /// `>` - octave down (up when reversed)
    OctaveDown,
    /// `!` - reverse the octave up/down commands
    OctaveReverse,
    /// `Tn` - set the tempo
    Tempo(u32),
    /// `:n` - select a channel (root level only)
    Channel(u8),
    /// Recognized directive with no document effect
    Unsupported,
}

/// Pitch part of a note command
#[derive(Debug, Clone, PartialEq)]
pub enum NotePitch {
    /// `R` - rest
    Rest,
    /// Step letter with accidental offset (-1, 0 or +1)
    Step { letter: char, alteration: i32 },
    /// `Nn` - absolute note number
    Absolute(u8),
}

/// A parsed note or rest
#[derive(Debug, Clone, PartialEq)]
pub struct NoteCommand {
    pub pitch: NotePitch,
    /// Lyric fragment from the `*text,` prefix
    pub text: Option<String>,
    /// Explicit length, or None to use the channel default
    pub length: Option<u32>,
    /// Number of duration dots
    pub dots: u32,
    /// `//` breath marker
    pub breath: bool,
}

impl NoteCommand {
    pub fn is_rest(&self) -> bool {
        matches!(self.pitch, NotePitch::Rest)
    }
}
