//! Keyword-based classifier that needs no model files.

use anyhow::Result;

use super::{EmotionClassifier, LabelScore};

const LEXICON: &[(&str, &[&str])] = &[
    (
        "joy",
        &[
            "happy", "happier", "happiest", "glad", "joy", "joyful", "great", "wonderful",
            "amazing", "awesome", "delighted", "cheerful", "smile", "smiled", "laugh", "laughed",
            "fun", "excited", "thrilled", "grateful", "proud", "celebrate", "celebrated",
        ],
    ),
    (
        "sadness",
        &[
            "sad", "sadder", "unhappy", "cry", "cried", "crying", "tears", "lonely", "alone",
            "miss", "missed", "grief", "grieving", "depressed", "heartbroken", "hurt", "lost",
            "down", "miserable", "gloomy",
        ],
    ),
    (
        "anger",
        &[
            "angry", "mad", "furious", "annoyed", "irritated", "hate", "hated", "rage", "frustrated",
            "frustrating", "outraged", "resent",
        ],
    ),
    (
        "fear",
        &[
            "afraid", "scared", "fear", "terrified", "frightened", "panic", "dread", "horror",
        ],
    ),
    (
        "surprise",
        &[
            "surprised", "surprise", "shocked", "unexpected", "astonished", "wow", "suddenly",
        ],
    ),
    (
        "disgust",
        &["disgusted", "disgusting", "gross", "revolting", "sick", "nasty", "awful"],
    ),
    (
        "anxiety",
        &[
            "anxious", "anxiety", "nervous", "worried", "worry", "worrying", "uneasy", "restless",
            "overwhelmed", "tense",
        ],
    ),
    (
        "love",
        &[
            "love", "loved", "loving", "adore", "affection", "cherish", "darling", "sweetheart",
            "romantic",
        ],
    ),
];

const NEGATORS: &[&str] = &[
    "not", "never", "no", "don't", "isn't", "wasn't", "aren't", "didn't", "hardly",
];

/// Counts lexicon hits per emotion. A word directly preceded by a negator is skipped.
#[derive(Debug, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase().replace('\u{2019}', "'"))
        .collect()
}

impl EmotionClassifier for LexiconClassifier {
    fn classify(&self, text: &str) -> Result<Vec<LabelScore>> {
        let tokens = tokenize(text);

        // (label, hits) in order of first appearance in the text
        let mut hits: Vec<(&'static str, usize)> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 && NEGATORS.contains(&tokens[i - 1].as_str()) {
                continue;
            }
            let Some((label, _)) = LEXICON
                .iter()
                .find(|(_, words)| words.contains(&token.as_str()))
            else {
                continue;
            };
            match hits.iter_mut().find(|(l, _)| l == label) {
                Some((_, n)) => *n += 1,
                None => hits.push((label, 1)),
            }
        }

        if hits.is_empty() {
            return Ok(vec![LabelScore::new("neutral", 1.0)]);
        }

        let total: usize = hits.iter().map(|(_, n)| n).sum();
        Ok(hits
            .into_iter()
            .map(|(label, n)| LabelScore::new(label, n as f64 / total as f64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(text: &str) -> Vec<String> {
        LexiconClassifier::new()
            .classify(text)
            .unwrap()
            .into_iter()
            .map(|l| l.label)
            .collect()
    }

    #[test]
    fn plain_text_is_neutral() {
        let result = LexiconClassifier::new().classify("The meeting is at 3pm.").unwrap();
        assert_eq!(result, vec![LabelScore::new("neutral", 1.0)]);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(labels("I'm SO Worried about tomorrow"), vec!["anxiety"]);
    }

    #[test]
    fn negated_words_are_skipped() {
        assert_eq!(labels("I am not happy"), vec!["neutral"]);
        assert_eq!(labels("I'm not sad, just tired and angry"), vec!["anger"]);
    }

    #[test]
    fn typographic_apostrophe_negates_too() {
        assert_eq!(labels("They don\u{2019}t love me"), vec!["neutral"]);
        assert_eq!(labels("They don't love me"), vec!["neutral"]);
        assert_eq!(labels("I\u{2019}m so worried"), vec!["anxiety"]);
    }

    #[test]
    fn curly_contraction_stays_one_token() {
        assert_eq!(tokenize("Don\u{2019}t go"), vec!["don't", "go"]);
    }

    #[test]
    fn labels_follow_text_order_and_share_scores() {
        let result = LexiconClassifier::new()
            .classify("I love her, I miss her, I love this song")
            .unwrap();
        assert_eq!(result[0].label, "love");
        assert_eq!(result[1].label, "sadness");
        assert!((result[0].score - 2.0 / 3.0).abs() < 1e-9);
        assert!((result[1].score - 1.0 / 3.0).abs() < 1e-9);
    }
}
