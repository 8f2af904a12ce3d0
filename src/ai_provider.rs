use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Claude,
    Codex,
    Gemini,
}

impl AiProvider {
    pub fn command_name(&self) -> &'static str {
        match self {
            AiProvider::Claude => "claude",
            AiProvider::Codex => "codex",
            AiProvider::Gemini => "gemini",
        }
    }

    /// プロンプトを渡すCLI引数
    pub fn prompt_args(&self, prompt: &str) -> Vec<String> {
        match self {
            AiProvider::Claude => vec![
                "-p".into(),
                prompt.into(),
                "--output-format".into(),
                "text".into(),
            ],
            AiProvider::Codex => vec!["exec".into(), prompt.into()],
            AiProvider::Gemini => vec!["-p".into(), prompt.into()],
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_args() {
        let args = AiProvider::Claude.prompt_args("hello");
        assert_eq!(args, vec!["-p", "hello", "--output-format", "text"]);
        assert_eq!(AiProvider::Codex.prompt_args("x")[0], "exec");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&AiProvider::Gemini).unwrap();
        assert_eq!(json, "\"gemini\"");
    }
}
