use crate::models::SummaryMode;

/// Longest source text sent to the provider, in characters.
pub const MAX_TEXT_CHARS: usize = 12_000;

pub const TRUNCATION_NOTICE: &str = "Note: the transcript was shortened because of its length.";

pub fn instruction(mode: SummaryMode) -> &'static str {
    match mode {
        SummaryMode::All => {
            "Explain all key points of the video based on the transcript below, using bullet points where helpful."
        }
        SummaryMode::ThreeKeys => "Explain 3 key points of the video based on the transcript below.",
        SummaryMode::Short => "Summarise the video in a few sentences based on the transcript below.",
        SummaryMode::Pareto => {
            "Apply the Pareto Principle to this video: based on the transcript below, what is the 20% of information I need to learn to understand 80% of it?"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub truncated: bool,
}

pub fn build_prompt(source: &str, mode: SummaryMode) -> Prompt {
    let (body, truncated) = match source.char_indices().nth(MAX_TEXT_CHARS) {
        Some((cut, _)) => (&source[..cut], true),
        None => (source, false),
    };

    let mut text = format!("{}\n\n---\n\n{}", instruction(mode), body);
    if truncated {
        text = format!("{TRUNCATION_NOTICE}\n\n{text}");
    }

    Prompt { text, truncated }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_sent_verbatim() {
        let prompt = build_prompt("Hello world", SummaryMode::Short);
        assert!(!prompt.truncated);
        assert_eq!(
            prompt.text,
            format!("{}\n\n---\n\nHello world", instruction(SummaryMode::Short))
        );
        assert!(!prompt.text.contains(TRUNCATION_NOTICE));
    }

    #[test]
    fn long_text_is_cut_to_the_ceiling_with_notice() {
        let source: String = "ab".repeat(MAX_TEXT_CHARS);
        let prompt = build_prompt(&source, SummaryMode::All);

        assert!(prompt.truncated);
        assert!(prompt.text.starts_with(TRUNCATION_NOTICE));
        let expected_tail: String = source.chars().take(MAX_TEXT_CHARS).collect();
        assert!(prompt.text.ends_with(&format!("---\n\n{expected_tail}")));
    }

    #[test]
    fn ceiling_counts_characters_not_bytes() {
        let source: String = "č".repeat(MAX_TEXT_CHARS + 5);
        let prompt = build_prompt(&source, SummaryMode::Pareto);
        let tail = prompt.text.rsplit("---\n\n").next().unwrap();
        assert_eq!(tail.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn exactly_at_ceiling_is_not_truncated() {
        let source = "x".repeat(MAX_TEXT_CHARS);
        assert!(!build_prompt(&source, SummaryMode::All).truncated);
    }

    #[test]
    fn every_mode_uses_its_own_instruction() {
        for mode in SummaryMode::ALL_MODES {
            let prompt = build_prompt("text", mode);
            assert!(prompt.text.starts_with(instruction(mode)));
        }
        assert_ne!(instruction(SummaryMode::All), instruction(SummaryMode::Short));
    }
}
