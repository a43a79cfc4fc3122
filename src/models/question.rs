use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: [String; 4],
    pub correct_option: AnswerKey,
    pub explanation: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    pub difficulty_level: u8,
    pub source: QuestionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerKey {
    A,
    B,
    C,
    D,
}

impl AnswerKey {
    // Normalizes arbitrary provider output ("b", " C.", "(d)", "2") to a key.
    // Unusable values degrade to A rather than discarding the record.
    pub fn from_raw(raw: &str) -> Self {
        let first = raw.trim().chars().find(|c| c.is_ascii_alphanumeric());
        match first.map(|c| c.to_ascii_uppercase()) {
            Some('A') | Some('1') => AnswerKey::A,
            Some('B') | Some('2') => AnswerKey::B,
            Some('C') | Some('3') => AnswerKey::C,
            Some('D') | Some('4') => AnswerKey::D,
            _ => AnswerKey::A,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(AnswerKey::A),
            1 => Some(AnswerKey::B),
            2 => Some(AnswerKey::C),
            3 => Some(AnswerKey::D),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            AnswerKey::A => 'A',
            AnswerKey::B => 'B',
            AnswerKey::C => 'C',
            AnswerKey::D => 'D',
        }
    }

    pub fn index(self) -> usize {
        match self {
            AnswerKey::A => 0,
            AnswerKey::B => 1,
            AnswerKey::C => 2,
            AnswerKey::D => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn level(self) -> u8 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 3,
            Difficulty::Hard => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionSource {
    Generated,
    LocalBank,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_key_normalizes_casing_and_punctuation() {
        assert_eq!(AnswerKey::from_raw("b"), AnswerKey::B);
        assert_eq!(AnswerKey::from_raw(" C."), AnswerKey::C);
        assert_eq!(AnswerKey::from_raw("(d)"), AnswerKey::D);
        assert_eq!(AnswerKey::from_raw("A) because..."), AnswerKey::A);
    }

    #[test]
    fn answer_key_tolerates_one_based_digits() {
        assert_eq!(AnswerKey::from_raw("2"), AnswerKey::B);
        assert_eq!(AnswerKey::from_raw("4."), AnswerKey::D);
    }

    #[test]
    fn answer_key_defaults_to_a_when_unusable() {
        assert_eq!(AnswerKey::from_raw(""), AnswerKey::A);
        assert_eq!(AnswerKey::from_raw("???"), AnswerKey::A);
        assert_eq!(AnswerKey::from_raw("zebra"), AnswerKey::A);
    }

    #[test]
    fn difficulty_maps_to_ordinal_levels() {
        assert_eq!(Difficulty::Easy.level(), 2);
        assert_eq!(Difficulty::Medium.level(), 3);
        assert_eq!(Difficulty::Hard.level(), 4);
    }

    #[test]
    fn source_serializes_kebab_case() {
        let v = serde_json::to_value(QuestionSource::LocalBank).unwrap();
        assert_eq!(v, serde_json::json!("local-bank"));
    }
}
