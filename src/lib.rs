pub mod compiler;
pub mod error;
pub mod lyric;
pub mod musicxml;
pub mod parser;

pub use compiler::Compiler;
pub use error::Error;

use musicxml::Score;

/// Compile an MML program into one optional score per channel.
///
/// The returned vector always has 16 entries; channels never selected are
/// `None`. A fresh compiler is constructed per call, so concurrent calls
/// never share state.
pub fn compile(program: &str) -> error::Result<Vec<Option<Score>>> {
    let tree = parser::parse(program)?;
    Compiler::new().compile(&tree)
}

/// Compile an MML program and render each present channel to MusicXML
/// text.
pub fn run(program: &str, minified: bool) -> error::Result<Vec<Option<String>>> {
    let scores = compile(program)?;
    Ok(scores
        .iter()
        .map(|score| {
            score
                .as_ref()
                .map(|s| musicxml::writer::render(s, minified))
        })
        .collect())
}
