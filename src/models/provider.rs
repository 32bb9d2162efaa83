use strum::{Display, EnumString};

/// Upstream generative-AI service a request is routed to.
///
/// Parsing is case-insensitive (`"openai"`, `"OpenAI"` and `"OPENAI"` are the
/// same provider); display always yields the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum Provider {
    #[strum(serialize = "OpenAI")]
    OpenAi,
    Google,
}
