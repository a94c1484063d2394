//! Tone selection — maps the user's chosen voice to persona instructions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Creative,
    Bold,
    /// Also used for any unrecognised tone.
    #[default]
    #[serde(other)]
    Professional,
}

impl Tone {
    /// Instruction text spliced into the system prompt.
    pub fn instructions(&self) -> &'static str {
        match self {
            Tone::Professional => {
                "Use a formal, traditional, and highly professional tone. \
                Employ proper business language and maintain a conservative structure."
            }
            Tone::Creative => {
                "Use an engaging, unique, and creative tone. \
                Show personality and originality while remaining professional. \
                Use compelling and memorable language."
            }
            Tone::Bold => {
                "Use a confident, assertive, and impactful tone. \
                Be direct and show strong conviction. \
                Emphasize achievements and capabilities with confidence."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_tone_has_distinct_instructions() {
        let all = [Tone::Professional, Tone::Creative, Tone::Bold];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.instructions(), b.instructions());
            }
        }
    }

    #[test]
    fn test_tone_parses_lowercase() {
        let tone: Tone = serde_json::from_str("\"bold\"").unwrap();
        assert_eq!(tone, Tone::Bold);
        let tone: Tone = serde_json::from_str("\"creative\"").unwrap();
        assert_eq!(tone, Tone::Creative);
    }

    #[test]
    fn test_unknown_tone_falls_back_to_professional() {
        for raw in ["\"sarcastic\"", "\"formal\"", "\"Bold\""] {
            let tone: Tone = serde_json::from_str(raw).unwrap();
            assert_eq!(tone, Tone::Professional);
        }
    }

    #[test]
    fn test_professional_is_formal() {
        assert!(Tone::Professional.instructions().contains("formal"));
    }
}
