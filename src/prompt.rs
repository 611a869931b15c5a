//! Prompt builder for the mentor persona.
//!
//! The system instruction is a fixed template with `{{module}}` and
//! `{{experience}}` placeholders. Substitution is plain text replacement
//! applied once at [`build()`](PromptBuilder::build) time; there are no
//! error conditions. Only the latest learner message accompanies it.

use std::collections::BTreeMap;

use crate::llm::ChatRequest;
use crate::session::{Experience, Module};

/// Persona instruction used when `[mentor] system_template` is not set.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "You are a mentor in {{module}} with {{experience}} years exp. \
Provide industry-standard advice. Only answer topic-relevant questions.";

const SEPARATOR: &str = "\n\n";

/// Fluent builder: text fragments joined by blank lines, then `{{key}}`
/// substitution.
///
/// ```
/// use mentor_chat::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new()
///     .append("You are a mentor in {{module}}.")
///     .var("module", "SQL")
///     .build();
/// assert_eq!(prompt, "You are a mentor in SQL.");
/// ```
#[derive(Debug, Default)]
pub struct PromptBuilder {
    parts: Vec<String>,
    vars: BTreeMap<String, String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text fragment; blank fragments are dropped.
    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
        }
        self
    }

    /// Register a single `{{key}}` → `value` substitution.
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Register several substitutions at once.
    pub fn with_vars<'a, I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (k, v) in vars {
            self.vars.insert(k.to_string(), v.to_string());
        }
        self
    }

    pub fn build(self) -> String {
        let mut prompt = self.parts.join(SEPARATOR);
        for (k, v) in &self.vars {
            prompt = prompt.replace(&format!("{{{{{k}}}}}"), v);
        }
        prompt
    }
}

/// Render the persona instruction for the chosen settings.
pub fn system_instruction(template: &str, module: Module, experience: Experience) -> String {
    PromptBuilder::new()
        .append(template)
        .with_vars([("module", module.label()), ("experience", experience.label())])
        .build()
}

/// The full request for one turn: persona plus the learner's message verbatim.
pub fn mentor_request(
    template: &str,
    module: Module,
    experience: Experience,
    message: &str,
) -> ChatRequest {
    ChatRequest {
        system: system_instruction(template, module, experience),
        user: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_substitutes_both_settings() {
        let system = system_instruction(DEFAULT_SYSTEM_TEMPLATE, Module::Sql, Experience::Three);
        assert_eq!(
            system,
            "You are a mentor in SQL with 3 years exp. Provide industry-standard advice. \
             Only answer topic-relevant questions."
        );
    }

    #[test]
    fn labels_with_punctuation_are_verbatim() {
        let system = system_instruction(
            DEFAULT_SYSTEM_TEMPLATE,
            Module::GenerativeAi,
            Experience::Fifteen,
        );
        assert!(system.contains("Generative AI (Gen AI)"));
        assert!(system.contains("15 years"));
    }

    #[test]
    fn custom_template_is_honoured() {
        let system = system_instruction("{{experience}}y of {{module}}", Module::Eda, Experience::One);
        assert_eq!(system, "1y of EDA");
    }

    #[test]
    fn request_carries_message_untouched() {
        let req = mentor_request(DEFAULT_SYSTEM_TEMPLATE, Module::Python, Experience::Two, "  What is a list?  ");
        assert_eq!(req.user, "  What is a list?  ");
        assert!(req.system.contains("Python"));
    }

    #[test]
    fn builder_joins_fragments_and_skips_blanks() {
        let prompt = PromptBuilder::new()
            .append("first {{a}}")
            .append("   ")
            .append("second {{b}}")
            .var("a", "A")
            .var("b", "B")
            .build();
        assert_eq!(prompt, "first A\n\nsecond B");
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let prompt = PromptBuilder::new().append("{{missing}}").build();
        assert_eq!(prompt, "{{missing}}");
    }
}
