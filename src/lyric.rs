//! Romaji to kana conversion for lyric fragments
//!
//! Lyric text in the input is a short alphabetic syllable fragment; the
//! sung text attached to a note is its hiragana rendering. Conversion is
//! longest-prefix matching over a fixed table and never fails: anything
//! the table does not know passes through unchanged.

/// Syllable table, consulted longest key first.
///
/// Bare consonants render as the devoiced forms the original system maps
/// them to (`k` is plain く, the rest carry a prime mark).
fn lookup(fragment: &str) -> Option<&'static str> {
    let kana = match fragment {
        // contracted syllables
        "kya" => "きゃ", "kyu" => "きゅ", "kyo" => "きょ",
        "gya" => "ぎゃ", "gyu" => "ぎゅ", "gyo" => "ぎょ",
        "sha" => "しゃ", "shi" => "し", "shu" => "しゅ", "sho" => "しょ",
        "cha" => "ちゃ", "chi" => "ち", "chu" => "ちゅ", "cho" => "ちょ",
        "tsu" => "つ",
        "nya" => "にゃ", "nyu" => "にゅ", "nyo" => "にょ",
        "hya" => "ひゃ", "hyu" => "ひゅ", "hyo" => "ひょ",
        "bya" => "びゃ", "byu" => "びゅ", "byo" => "びょ",
        "pya" => "ぴゃ", "pyu" => "ぴゅ", "pyo" => "ぴょ",
        "mya" => "みゃ", "myu" => "みゅ", "myo" => "みょ",
        "rya" => "りゃ", "ryu" => "りゅ", "ryo" => "りょ",
        // plain syllables
        "ka" => "か", "ki" => "き", "ku" => "く", "ke" => "け", "ko" => "こ",
        "ga" => "が", "gi" => "ぎ", "gu" => "ぐ", "ge" => "げ", "go" => "ご",
        "sa" => "さ", "si" => "し", "su" => "す", "se" => "せ", "so" => "そ",
        "za" => "ざ", "zi" => "じ", "zu" => "ず", "ze" => "ぜ", "zo" => "ぞ",
        "ta" => "た", "ti" => "ち", "tu" => "つ", "te" => "て", "to" => "と",
        "da" => "だ", "di" => "ぢ", "du" => "づ", "de" => "で", "do" => "ど",
        "na" => "な", "ni" => "に", "nu" => "ぬ", "ne" => "ね", "no" => "の",
        "ha" => "は", "hi" => "ひ", "hu" => "ふ", "he" => "へ", "ho" => "ほ",
        "fa" => "ふぁ", "fi" => "ふぃ", "fu" => "ふ", "fe" => "ふぇ", "fo" => "ふぉ",
        "ba" => "ば", "bi" => "び", "bu" => "ぶ", "be" => "べ", "bo" => "ぼ",
        "pa" => "ぱ", "pi" => "ぴ", "pu" => "ぷ", "pe" => "ぺ", "po" => "ぽ",
        "ma" => "ま", "mi" => "み", "mu" => "む", "me" => "め", "mo" => "も",
        "ya" => "や", "yu" => "ゆ", "yo" => "よ",
        "ra" => "ら", "ri" => "り", "ru" => "る", "re" => "れ", "ro" => "ろ",
        "wa" => "わ", "wo" => "を",
        "ja" => "じゃ", "ji" => "じ", "ju" => "じゅ", "je" => "じぇ", "jo" => "じょ",
        // bare vowels
        "a" => "あ", "i" => "い", "u" => "う", "e" => "え", "o" => "お",
        // consonant-only fragments
        "cl" => "っ",
        "q" => "ん",
        "k" => "く",
        "sh" => "し’", "s" => "す’",
        "ch" => "ち’", "ts" => "つ’", "t" => "と’",
        "n" => "ぬ’",
        "h" => "ふ’", "f" => "ふ’",
        "m" => "む’",
        "y" => "ゆ’",
        "r" => "る’",
        "g" => "ぐ’", "z" => "ず’",
        "d" => "ど’", "b" => "ぶ’", "p" => "ぷ’",
        _ => return None,
    };
    Some(kana)
}

/// Convert a romaji fragment to kana.
pub fn convert(text: &str) -> String {
    if !text.is_ascii() {
        return text.to_string();
    }

    let lower = text.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut out = String::new();
    let mut pos = 0;

    while pos < bytes.len() {
        // doubled consonant becomes sokuon
        if pos + 1 < bytes.len()
            && bytes[pos] == bytes[pos + 1]
            && bytes[pos].is_ascii_alphabetic()
            && !matches!(bytes[pos], b'a' | b'i' | b'u' | b'e' | b'o' | b'n')
        {
            out.push('っ');
            pos += 1;
            continue;
        }

        let mut matched = false;
        for len in (1..=3.min(bytes.len() - pos)).rev() {
            if let Some(kana) = lookup(&lower[pos..pos + len]) {
                out.push_str(kana);
                pos += len;
                matched = true;
                break;
            }
        }
        if !matched {
            out.push(bytes[pos] as char);
            pos += 1;
        }
    }

    out
}
