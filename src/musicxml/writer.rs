//! Serialization of the document model
//!
//! Renders a [`Score`] to MusicXML text (indented or minified) or to its
//! JSON view, and writes per-channel output files.

use super::{Measure, NoteKind, Score, Tie};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Output settings shared by the renderers
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Emit compact output without indentation
    pub minified: bool,
    /// Emit the JSON view instead of MusicXML
    pub json: bool,
}

/// Render a score to MusicXML text.
pub fn render(score: &Score, minified: bool) -> String {
    let mut w = XmlWriter::new(minified);
    w.declaration();
    w.open("score-partwise");
    w.open("part");
    for measure in &score.part.measures {
        write_measure(&mut w, measure);
    }
    w.close("part");
    w.close("score-partwise");
    w.finish()
}

/// Render a score to its JSON view.
pub fn render_json(score: &Score, minified: bool) -> Result<String> {
    let text = if minified {
        serde_json::to_string(score)?
    } else {
        serde_json::to_string_pretty(score)?
    };
    Ok(text)
}

/// Write one file per present channel into `dir`, named
/// `<stem>-NN.musicxml` (or `.json`). Returns the written paths.
pub fn write_scores(
    scores: &[Option<Score>],
    dir: &Path,
    stem: &str,
    options: OutputOptions,
) -> Result<Vec<(usize, PathBuf)>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (channel, score) in scores.iter().enumerate() {
        let score = match score {
            Some(s) => s,
            None => continue,
        };
        let (extension, contents) = if options.json {
            ("json", render_json(score, options.minified)?)
        } else {
            ("musicxml", render(score, options.minified))
        };
        let path = dir.join(format!("{}-{:02}.{}", stem, channel, extension));
        fs::write(&path, contents)?;
        written.push((channel, path));
    }
    Ok(written)
}

fn write_measure(w: &mut XmlWriter, measure: &Measure) {
    w.open("measure");

    w.open("attributes");
    w.leaf("divisions", measure.attributes.divisions);
    w.open("key");
    w.leaf("fifths", measure.attributes.fifths);
    w.close("key");
    w.open("time");
    w.leaf("beats", measure.attributes.time.beats);
    w.leaf("beat-type", measure.attributes.time.beat_type);
    w.close("time");
    w.open("clef");
    w.leaf("sign", measure.attributes.clef.sign);
    w.leaf("line", measure.attributes.clef.line);
    w.close("clef");
    w.empty_with_attr("sound", "tempo", &measure.attributes.tempo.to_string());
    w.close("attributes");

    w.open("note");
    w.leaf("duration", measure.note.duration);
    match &measure.note.kind {
        NoteKind::Rest => w.empty("rest"),
        NoteKind::Pitch {
            step,
            alter,
            octave,
        } => {
            w.open("pitch");
            w.leaf("step", step.letter());
            w.leaf("alter", alter);
            w.leaf("octave", octave);
            w.close("pitch");
        }
    }
    if let Some(notations) = &measure.note.notations {
        w.open("notations");
        if notations.articulations.breath_mark {
            w.open("articulations");
            w.empty("breath-mark");
            w.close("articulations");
        } else {
            w.empty("articulations");
        }
        for tie in &notations.ties {
            let kind = match tie {
                Tie::Start => "start",
                Tie::Stop => "stop",
            };
            w.empty_with_attr("tie", "type", kind);
        }
        w.close("notations");
    }
    if let Some(lyric) = &measure.note.lyric {
        w.open("lyric");
        w.leaf("text", escape(lyric));
        w.close("lyric");
    }
    w.close("note");

    w.close("measure");
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

struct XmlWriter {
    out: String,
    depth: usize,
    minified: bool,
}

impl XmlWriter {
    fn new(minified: bool) -> Self {
        Self {
            out: String::new(),
            depth: 0,
            minified,
        }
    }

    fn declaration(&mut self) {
        self.out.push_str("<?xml version='1.0' encoding='utf-8'?>\n");
    }

    fn indent(&mut self) {
        if !self.minified {
            for _ in 0..self.depth {
                self.out.push_str("  ");
            }
        }
    }

    fn newline(&mut self) {
        if !self.minified {
            self.out.push('\n');
        }
    }

    fn open(&mut self, tag: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        self.newline();
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.indent();
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
        self.newline();
    }

    fn leaf(&mut self, tag: &str, text: impl ToString) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        self.out.push_str(&text.to_string());
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
        self.newline();
    }

    fn empty(&mut self, tag: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push_str("/>");
        self.newline();
    }

    fn empty_with_attr(&mut self, tag: &str, key: &str, value: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push(' ');
        self.out.push_str(key);
        self.out.push_str("=\"");
        self.out.push_str(value);
        self.out.push_str("\"/>");
        self.newline();
    }

    fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::musicxml::{Attributes, Clef, Note, Part, TimeSignature};

    fn rest_score() -> Score {
        Score {
            part: Part {
                measures: vec![Measure {
                    attributes: Attributes {
                        divisions: 1,
                        fifths: 0,
                        time: TimeSignature {
                            beats: 1,
                            beat_type: 4,
                        },
                        clef: Clef::treble(),
                        tempo: 120,
                    },
                    note: Note::rest(1),
                }],
            },
        }
    }

    #[test]
    fn test_render_pretty() {
        let expected = "\
<?xml version='1.0' encoding='utf-8'?>
<score-partwise>
  <part>
    <measure>
      <attributes>
        <divisions>1</divisions>
        <key>
          <fifths>0</fifths>
        </key>
        <time>
          <beats>1</beats>
          <beat-type>4</beat-type>
        </time>
        <clef>
          <sign>G</sign>
          <line>2</line>
        </clef>
        <sound tempo=\"120\"/>
      </attributes>
      <note>
        <duration>1</duration>
        <rest/>
      </note>
    </measure>
  </part>
</score-partwise>
";
        assert_eq!(render(&rest_score(), false), expected);
    }

    #[test]
    fn test_render_minified() {
        let text = render(&rest_score(), true);
        assert!(text.starts_with("<?xml version='1.0' encoding='utf-8'?>\n<score-partwise>"));
        assert!(text.ends_with("</score-partwise>"));
        assert!(!text.contains("  "));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&rest_score(), true).unwrap();
        assert!(json.contains("\"beat-type\":4"));
        assert!(json.contains("\"rest\""));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b&c>d"), "a&lt;b&amp;c&gt;d");
    }
}
