//! Prediction model seam
//!
//! The service treats the model as a black box mapping text to a label.
//! [`LexiconPredictor`] is the bundled implementation: a keyword scorer over
//! the four emotion labels.

/// Labels in model output order
pub const LABELS: [&str; 4] = ["joy", "sadness", "fear", "anger"];

pub trait Predictor: Send + Sync {
    fn predict(&self, text: &str) -> anyhow::Result<String>;
}

const JOY_WORDS: &[&str] = &[
    "happy", "glad", "joy", "love", "great", "wonderful", "excited", "delighted", "cheerful",
    "amazing", "good", "fun", "smile", "pleased", "grateful",
];
const SADNESS_WORDS: &[&str] = &[
    "sad", "unhappy", "depressed", "lonely", "miserable", "cry", "crying", "grief", "tears",
    "hopeless", "down", "sorrow", "lost", "hurt", "empty",
];
const FEAR_WORDS: &[&str] = &[
    "afraid", "scared", "fear", "terrified", "anxious", "nervous", "worried", "panic", "frightened",
    "dread", "horror", "uneasy", "threat",
];
const ANGER_WORDS: &[&str] = &[
    "angry", "mad", "furious", "hate", "annoyed", "rage", "irritated", "outraged", "resent",
    "disgusted", "frustrated", "hostile",
];

/// Keyword-count classifier. Ties resolve to the earliest label in [`LABELS`].
#[derive(Debug, Default, Clone)]
pub struct LexiconPredictor;

impl LexiconPredictor {
    pub fn new() -> Self {
        Self
    }

    /// Lowercased words, apostrophe contractions expanded, non-letters dropped
    fn tokenize(text: &str) -> Vec<String> {
        let normalized = text.replace('`', "'").to_lowercase();
        let expanded = normalized
            .replace("n't", " not")
            .replace("'m", " am")
            .replace("'re", " are")
            .replace("'ve", " have")
            .replace("'ll", " will");

        expanded
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn scores(words: &[String]) -> [usize; 4] {
        let lexicons = [JOY_WORDS, SADNESS_WORDS, FEAR_WORDS, ANGER_WORDS];
        let mut scores = [0usize; 4];
        for word in words {
            for (label, lexicon) in lexicons.iter().enumerate() {
                if lexicon.contains(&word.as_str()) {
                    scores[label] += 1;
                }
            }
        }
        scores
    }
}

impl Predictor for LexiconPredictor {
    fn predict(&self, text: &str) -> anyhow::Result<String> {
        let words = Self::tokenize(text);
        let scores = Self::scores(&words);

        let mut best = 0;
        for (index, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = index;
            }
        }
        Ok(LABELS[best].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicts_each_label() {
        let predictor = LexiconPredictor::new();
        assert_eq!(predictor.predict("I am happy today").unwrap(), "joy");
        assert_eq!(predictor.predict("I feel so lonely and sad").unwrap(), "sadness");
        assert_eq!(predictor.predict("I'm terrified of the dark").unwrap(), "fear");
        assert_eq!(predictor.predict("This makes me furious").unwrap(), "anger");
    }

    #[test]
    fn test_no_signal_falls_back_to_first_label() {
        let predictor = LexiconPredictor::new();
        assert_eq!(predictor.predict("the table is brown").unwrap(), "joy");
    }

    #[test]
    fn test_tokenize_expands_contractions() {
        assert_eq!(
            LexiconPredictor::tokenize("I`m NOT sad, don't worry!"),
            vec!["i", "am", "not", "sad", "do", "not", "worry"]
        );
    }
}
