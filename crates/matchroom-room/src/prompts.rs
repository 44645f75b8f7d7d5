//! The set of prompts rooms draw their questions from.

/// Questions used when the configuration doesn't provide any.
const DEFAULT_PROMPTS: &[&str] = &[
    "What does a perfect weekend look like for you?",
    "What is something you changed your mind about recently?",
    "Which skill would you like to master in the next year?",
    "What is the best piece of advice you have been given?",
    "Describe a small thing that reliably makes your day better.",
    "What kind of work makes you lose track of time?",
    "Where would you go on a trip with no budget limits?",
    "What do people usually get wrong about you?",
    "Which book, film, or song shaped how you see the world?",
    "How do you handle a disagreement with someone close to you?",
    "What are you most proud of from the last five years?",
    "What does a good conversation need?",
];

/// An ordered, de-duplicated list of prompt texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBook {
    prompts: Vec<String>,
}

impl PromptBook {
    /// Builds a book from arbitrary texts. Blank entries and duplicates
    /// are dropped; surrounding whitespace is trimmed.
    pub fn new<I, S>(prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for prompt in prompts {
            let text = prompt.as_ref().trim();
            if !text.is_empty() && !unique.iter().any(|p| p == text) {
                unique.push(text.to_string());
            }
        }
        Self { prompts: unique }
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.prompts
    }
}

impl Default for PromptBook {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_and_dedups() {
        let book = PromptBook::new(["  one ", "two", "one", "", "   "]);
        assert_eq!(book.as_slice(), &["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_default_has_more_prompts_than_the_default_limit() {
        assert!(PromptBook::default().len() >= 8);
    }
}
