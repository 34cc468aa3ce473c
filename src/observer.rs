//! Where echoed prompts and replies go

use log::info;

/// Receives the prompt/reply echoes requested through the
/// `show_prompt` and `show_model_response` flags
pub trait Observer: Send + Sync
{   fn show_prompt(&self, prompt: &str);
    fn show_response(&self, response: &str);
}

/// Writes echoes to the `log` facade at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observer for LogObserver
{   fn show_prompt(&self, prompt: &str)
    {   info!("Prompt:\n{}", prompt);
    }

    fn show_response(&self, response: &str)
    {   info!("Model response:\n{}", response);
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver
{   fn show_prompt(&self, _prompt: &str) {}
    fn show_response(&self, _response: &str) {}
}
