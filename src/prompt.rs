//! Line-based prompt abstraction.
//!
//! The only consumer-facing interaction in the pipeline is "show a message,
//! read one line". Keeping it behind a trait lets the aggregator and the
//! scraping adapter be driven by scripted fakes in tests.

/// `None` means end-of-input or an aborted prompt, which callers treat as
/// "operator declined", never as an error.
pub trait Prompt: Send + Sync {
    fn read_line(&self, message: &str) -> Option<String>;
}

/// Terminal prompt.
pub struct TermPrompt;

impl Prompt for TermPrompt {
    fn read_line(&self, message: &str) -> Option<String> {
        dialoguer::Input::<String>::new()
            .with_prompt(message)
            .allow_empty(true)
            .interact_text()
            .ok()
    }
}
