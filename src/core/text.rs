//! Arabic text canonicalization.
//!
//! Every comparison in the tracker (fuzzy verse search, word alignment,
//! target window construction) runs on text passed through [`normalize`].
//! The function folds away the orthographic detail that speech recognition
//! never reproduces reliably: vowel marks, Quranic annotation signs,
//! elongation and the hamza/madda carrier variants of a letter.

use once_cell::sync::Lazy;
use regex::Regex;

/// Harakat, tanween, shadda, sukun, superscript alef and the Quranic
/// annotation marks, plus the tatweel.
static MARKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "[\u{0610}-\u{061A}\u{064B}-\u{065F}\u{0670}\u{06D6}-\u{06DC}\u{06DF}-\u{06E4}\u{06E7}\u{06E8}\u{06EA}-\u{06ED}\u{0640}]",
    )
    .expect("valid mark pattern")
});

/// Anything outside the Arabic blocks, ASCII digits and whitespace.
static FOREIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[^\x{0600}-\x{06FF}\x{0750}-\x{077F}\x{08A0}-\x{08FF}\x{FB50}-\x{FDFF}\x{FE70}-\x{FEFF}\s0-9]",
    )
    .expect("valid script pattern")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Map a letter variant to its base letter.
#[inline]
fn fold_letter(c: char) -> char {
    match c {
        // alef with madda, hamza above, hamza below, wasla
        '\u{0622}' | '\u{0623}' | '\u{0625}' | '\u{0671}' => '\u{0627}',
        // waw with hamza
        '\u{0624}' => '\u{0648}',
        // yeh with hamza
        '\u{0626}' => '\u{064A}',
        // teh marbuta
        '\u{0629}' => '\u{0647}',
        // alef maksura
        '\u{0649}' => '\u{064A}',
        // heh with yeh above, heh goal with hamza, yeh barree with hamza
        '\u{06C0}' => '\u{06D5}',
        '\u{06C2}' => '\u{06C1}',
        '\u{06D3}' => '\u{06D2}',
        other => other,
    }
}

/// Canonicalize text for comparison.
///
/// Deterministic and idempotent: `normalize(&normalize(x)) == normalize(x)`.
/// Empty or whitespace-only input yields an empty string.
///
/// # Example
/// ```
/// use tilawa_gateway::core::text::normalize;
///
/// assert_eq!(normalize("وَرَحْمَةِ"), normalize("ورحمة"));
/// assert_eq!(normalize("   "), "");
/// ```
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let stripped = MARKS.replace_all(text, "");
    let folded: String = stripped.chars().map(fold_letter).collect();
    let filtered = FOREIGN.replace_all(&folded, "");
    let collapsed = WHITESPACE.replace_all(&filtered, " ");

    collapsed.trim().to_string()
}

/// Split normalized text into words.
#[inline]
pub fn words(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}
