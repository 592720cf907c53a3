//! Recursive-descent parser for the MML input language
//!
//! Any parser producing the same command tree is interchangeable; the
//! compiler only consumes the AST and never looks at source text.

pub mod ast;

use crate::error::{Error, Result};
use ast::{Command, NoteCommand, NotePitch};

/// Valid note length denominators
pub const LENGTHS: [u32; 14] = [1, 2, 3, 4, 6, 8, 12, 16, 24, 32, 48, 64, 96, 192];

/// Parse an MML program into its command tree.
pub fn parse(source: &str) -> Result<Vec<Command>> {
    Parser::new(source).parse_root()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn error_at(&self, line: usize, column: usize, message: impl Into<String>) -> Error {
        Error::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    /// Skip whitespace and `/.../` comments between tokens.
    ///
    /// A lone `/` opens a comment closed by the next `/` on the same line;
    /// `//` is never a comment, it is the breath token.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) != Some('/') => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    loop {
                        match self.peek() {
                            Some('/') => {
                                self.bump();
                                break;
                            }
                            Some('\n') | None => {
                                return Err(self.error_at(line, column, "unterminated comment"));
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_root(&mut self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Ok(commands),
                Some(_) => commands.push(self.parse_command(true)?),
            }
        }
    }

    /// Parse commands up to (not including) the closing delimiter.
    fn parse_content(&mut self, closer: char) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => {
                    return Err(
                        self.error_here(format!("unexpected end of input, expected '{}'", closer))
                    )
                }
                Some(c) if c == closer => return Ok(commands),
                Some(_) => commands.push(self.parse_command(false)?),
            }
        }
    }

    fn parse_command(&mut self, top_level: bool) -> Result<Command> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Err(self.error_here("unexpected end of input")),
        };

        match c {
            ':' if top_level => {
                self.bump();
                let value = self.parse_ranged_uint(0, 15, "channel")?;
                Ok(Command::Channel(value as u8))
            }
            '{' => self.parse_brace(),
            '[' => {
                self.bump();
                let body = self.parse_content(']')?;
                self.bump();
                let count = self.parse_ranged_uint(0, 255, "loop count")?;
                Ok(Command::Loop { body, count })
            }
            'K' | 'k' => {
                self.bump();
                let value = self.parse_ranged_int(-15, 15, "key")?;
                Ok(Command::Key(value))
            }
            'L' | 'l' => {
                self.bump();
                let value = self.parse_length_value()?;
                Ok(Command::Length(value))
            }
            'O' | 'o' => {
                self.bump();
                let value = self.parse_ranged_int(-1, 9, "octave")?;
                Ok(Command::Octave(value))
            }
            'T' | 't' => {
                self.bump();
                let value = self.parse_ranged_uint(1, 1023, "tempo")?;
                Ok(Command::Tempo(value))
            }
            '<' => {
                self.bump();
                Ok(Command::OctaveUp)
            }
            '>' => {
                self.bump();
                Ok(Command::OctaveDown)
            }
            '!' => {
                self.bump();
                Ok(Command::OctaveReverse)
            }
            'N' | 'n' => {
                self.bump();
                let value = self.parse_ranged_uint(0, 127, "pitch")?;
                let mut length = None;
                let mut dots = 0;
                self.skip_trivia()?;
                if self.peek() == Some(',') {
                    self.bump();
                    length = Some(self.parse_length_value()?);
                    dots = self.parse_dots()?;
                }
                let breath = self.parse_breath()?;
                Ok(Command::Note(NoteCommand {
                    pitch: NotePitch::Absolute(value as u8),
                    text: None,
                    length,
                    dots,
                    breath,
                }))
            }
            'R' | 'r' => {
                self.bump();
                self.parse_note_tail(NotePitch::Rest, None)
            }
            'A'..='G' | 'a'..='g' => {
                self.bump();
                let alteration = self.parse_accidental()?;
                self.parse_note_tail(
                    NotePitch::Step {
                        letter: c,
                        alteration,
                    },
                    None,
                )
            }
            '*' => {
                self.bump();
                self.skip_trivia()?;
                let text = self.parse_text()?;
                self.skip_trivia()?;
                if self.peek() != Some(',') {
                    return Err(self.error_here("expected ',' after lyric text"));
                }
                self.bump();
                self.skip_trivia()?;
                let letter = match self.peek() {
                    Some(l @ ('A'..='G' | 'a'..='g')) => l,
                    _ => return Err(self.error_here("expected step letter after lyric text")),
                };
                self.bump();
                let alteration = self.parse_accidental()?;
                self.parse_note_tail(
                    NotePitch::Step { letter, alteration },
                    Some(text),
                )
            }
            'P' | 'p' | 'Q' | 'q' | 'V' | 'v' | '(' | ')' | '&' | '_' => {
                self.bump();
                self.parse_optional_number()?;
                Ok(Command::Unsupported)
            }
            '|' => {
                let (line, column) = (self.line, self.column);
                self.bump();
                let mut body = 0usize;
                loop {
                    match self.peek() {
                        Some('|') if body > 0 => {
                            self.bump();
                            break;
                        }
                        Some('\n') | None | Some('|') => {
                            return Err(self.error_at(line, column, "unterminated '|' directive"));
                        }
                        Some(_) => {
                            self.bump();
                            body += 1;
                        }
                    }
                }
                Ok(Command::Unsupported)
            }
            '$' => {
                self.bump();
                self.skip_trivia()?;
                match self.peek() {
                    Some('0'..='7') => {
                        self.bump();
                    }
                    _ => return Err(self.error_here("expected register index 0-7")),
                }
                self.skip_trivia()?;
                if self.peek() == Some('=') {
                    self.bump();
                    self.skip_trivia()?;
                    self.parse_number()?;
                }
                Ok(Command::Unsupported)
            }
            '@' => self.parse_at_directive(),
            _ => Err(self.error_here(format!("unexpected character '{}'", c))),
        }
    }

    /// `{name}` call or `{name=...}` definition.
    fn parse_brace(&mut self) -> Result<Command> {
        self.bump();
        self.skip_trivia()?;
        let name = self.parse_name()?;
        self.skip_trivia()?;
        match self.peek() {
            Some('}') => {
                self.bump();
                Ok(Command::Call { name })
            }
            Some('=') => {
                self.bump();
                let body = self.parse_content('}')?;
                self.bump();
                Ok(Command::Define { name, body })
            }
            _ => Err(self.error_here("expected '=' or '}' in macro")),
        }
    }

    /// Recognized-but-ignored `@` directives.
    fn parse_at_directive(&mut self) -> Result<Command> {
        let (line, column) = (self.line, self.column);
        self.bump();

        // Upcoming letters, without consuming them yet
        let mut word = String::new();
        for offset in 0..4 {
            match self.peek_at(offset) {
                Some(c) if c.is_ascii_alphabetic() => word.push(c.to_ascii_uppercase()),
                _ => break,
            }
        }

        if word.starts_with("MAOF") || word.starts_with("MLOF") || word.starts_with("MPOF") {
            for _ in 0..4 {
                self.bump();
            }
            Ok(Command::Unsupported)
        } else if word.starts_with("MOF") {
            for _ in 0..3 {
                self.bump();
            }
            Ok(Command::Unsupported)
        } else if word.starts_with("ER") {
            self.bump();
            self.bump();
            Ok(Command::Unsupported)
        } else if word.starts_with("MA") || word.starts_with("ML") || word.starts_with("MP") {
            self.bump();
            self.bump();
            self.parse_number_list(4)?;
            Ok(Command::Unsupported)
        } else if word.starts_with('E') {
            self.bump();
            self.parse_number_list(4)?;
            Ok(Command::Unsupported)
        } else if word.starts_with('D') || word.starts_with('V') {
            self.bump();
            self.parse_optional_number()?;
            Ok(Command::Unsupported)
        } else {
            Err(self.error_at(line, column, "unknown '@' directive"))
        }
    }

    /// length? dot* breath? shared by step, rest and lyric notes.
    fn parse_note_tail(&mut self, pitch: NotePitch, text: Option<String>) -> Result<Command> {
        self.skip_trivia()?;
        let length = match self.peek() {
            Some('0'..='9') => Some(self.parse_length_value()?),
            _ => None,
        };
        let dots = self.parse_dots()?;
        let breath = self.parse_breath()?;
        Ok(Command::Note(NoteCommand {
            pitch,
            text,
            length,
            dots,
            breath,
        }))
    }

    fn parse_accidental(&mut self) -> Result<i32> {
        self.skip_trivia()?;
        match self.peek() {
            Some('#') | Some('+') => {
                self.bump();
                Ok(1)
            }
            Some('-') => {
                self.bump();
                Ok(-1)
            }
            _ => Ok(0),
        }
    }

    fn parse_dots(&mut self) -> Result<u32> {
        let mut dots = 0;
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('.') {
                self.bump();
                dots += 1;
            } else {
                return Ok(dots);
            }
        }
    }

    fn parse_breath(&mut self) -> Result<bool> {
        self.skip_trivia()?;
        if self.peek() == Some('/') && self.peek_at(1) == Some('/') {
            self.bump();
            self.bump();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error_here("expected macro name"));
        }
        Ok(name)
    }

    fn parse_text(&mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if text.is_empty() {
            return Err(self.error_here("expected lyric text"));
        }
        Ok(text)
    }

    /// Contiguous digit run as an unsigned number.
    fn parse_digits(&mut self) -> Result<u32> {
        let (line, column) = (self.line, self.column);
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return Err(self.error_at(line, column, "expected number"));
        }
        digits
            .parse::<u32>()
            .map_err(|_| self.error_at(line, column, "number out of range"))
    }

    /// Signed number token, used where the grammar allows any integer.
    fn parse_number(&mut self) -> Result<i32> {
        let (line, column) = (self.line, self.column);
        let negative = if self.peek() == Some('-') {
            self.bump();
            true
        } else {
            false
        };
        let magnitude = self.parse_digits()? as i64;
        let value = if negative { -magnitude } else { magnitude };
        i32::try_from(value).map_err(|_| self.error_at(line, column, "number out of range"))
    }

    /// A number that is simply absent when the next token is not numeric.
    fn parse_optional_number(&mut self) -> Result<Option<i32>> {
        self.skip_trivia()?;
        let numeric = match self.peek() {
            Some('0'..='9') => true,
            Some('-') => matches!(self.peek_at(1), Some('0'..='9')),
            _ => false,
        };
        if numeric {
            Ok(Some(self.parse_number()?))
        } else {
            Ok(None)
        }
    }

    /// Comma-separated list of exactly `count` numbers.
    fn parse_number_list(&mut self, count: usize) -> Result<()> {
        for i in 0..count {
            self.skip_trivia()?;
            if i > 0 {
                if self.peek() != Some(',') {
                    return Err(self.error_here("expected ','"));
                }
                self.bump();
                self.skip_trivia()?;
            }
            self.parse_number()?;
        }
        Ok(())
    }

    fn parse_ranged_uint(&mut self, min: u32, max: u32, what: &str) -> Result<u32> {
        self.skip_trivia()?;
        let (line, column) = (self.line, self.column);
        let value = self.parse_digits()?;
        if value < min || value > max {
            return Err(self.error_at(
                line,
                column,
                format!("{} must be in {}..{}", what, min, max),
            ));
        }
        Ok(value)
    }

    fn parse_ranged_int(&mut self, min: i32, max: i32, what: &str) -> Result<i32> {
        self.skip_trivia()?;
        let (line, column) = (self.line, self.column);
        let value = self.parse_number()?;
        if value < min || value > max {
            return Err(self.error_at(
                line,
                column,
                format!("{} must be in {}..{}", what, min, max),
            ));
        }
        Ok(value)
    }

    fn parse_length_value(&mut self) -> Result<u32> {
        self.skip_trivia()?;
        let (line, column) = (self.line, self.column);
        let value = self.parse_digits()?;
        if !LENGTHS.contains(&value) {
            return Err(self.error_at(line, column, format!("invalid note length {}", value)));
        }
        Ok(value)
    }
}
