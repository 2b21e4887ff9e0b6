use clap::Parser;

use crate::agent::DEFAULT_MODEL;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "bespoken")]
#[command(
    version,
    about = "A terminal chat experience that you can configure yourself",
    long_about = "A terminal chat experience that you can configure yourself\n\nAPI keys are read from the environment or a .env file:\n  ANTHROPIC_API_KEY for anthropic/... and claude-* models\n  OPENAI_API_KEY for openai/..., gpt-* and o1/o3/o4 models"
)]
pub struct CliArgs {
    /// Enable debug mode to see LLM interactions
    #[arg(short, long)]
    pub debug: bool,

    /// LLM model to use
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// System prompt for the assistant
    #[arg(short, long)]
    pub system: Option<String>,

    /// Banner style (default, minimal, hacker, professional, fun)
    #[arg(long, default_value = "default")]
    pub style: String,

    /// Skip the ASCII-art banner
    #[arg(long)]
    pub no_banner: bool,

    /// Offer the browser tool (needs the `browser` feature)
    #[arg(long)]
    pub browser: bool,

    /// Let a tool run without asking (repeatable)
    #[arg(long = "trust", value_name = "TOOL")]
    pub trust: Vec<String>,
}
