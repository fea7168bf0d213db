use serde::Serialize;

use super::Verse;
use crate::core::text::words;

/// A normalized word of the target window, tagged with its verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetWord {
    pub text: String,
    pub surah_no: u16,
    pub ayah_no: u16,
    /// Position of the word within its verse
    pub local_index: usize,
}

/// Contiguous run of verses expected to follow the anchor, plus their words.
#[derive(Debug, Clone, Default)]
pub struct TargetWindow {
    pub verses: Vec<Verse>,
    pub words: Vec<TargetWord>,
}

impl TargetWindow {
    pub fn from_verses(verses: &[Verse]) -> Self {
        let words = verses
            .iter()
            .flat_map(|verse| {
                words(&verse.normalized)
                    .enumerate()
                    .map(move |(local_index, word)| TargetWord {
                        text: word.to_string(),
                        surah_no: verse.surah_no,
                        ayah_no: verse.ayah_no,
                        local_index,
                    })
            })
            .collect();

        Self {
            verses: verses.to_vec(),
            words,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// Anchor verse of the window, if any.
    pub fn first(&self) -> Option<&Verse> {
        self.verses.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_are_tagged_in_order() {
        let verses = vec![
            Verse::new(1, 1, "بِسْمِ ٱللَّهِ"),
            Verse::new(1, 2, "ٱلْحَمْدُ لِلَّهِ رَبِّ"),
        ];
        let window = TargetWindow::from_verses(&verses);

        assert_eq!(window.verses.len(), 2);
        let tags: Vec<_> = window
            .words
            .iter()
            .map(|w| (w.text.as_str(), w.ayah_no, w.local_index))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("بسم", 1, 0),
                ("الله", 1, 1),
                ("الحمد", 2, 0),
                ("لله", 2, 1),
                ("رب", 2, 2),
            ]
        );
    }

    #[test]
    fn test_verse_without_words() {
        let verses = vec![Verse::new(1, 1, "..."), Verse::new(1, 2, "رب")];
        let window = TargetWindow::from_verses(&verses);
        assert_eq!(window.verses.len(), 2);
        assert_eq!(window.words.len(), 1);
        assert_eq!(window.words[0].ayah_no, 2);
    }

    #[test]
    fn test_empty_window() {
        let window = TargetWindow::from_verses(&[]);
        assert!(window.is_empty());
        assert!(window.first().is_none());
    }
}
