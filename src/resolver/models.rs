//! Model identifiers chosen by the heuristic resolver.
//!
//! Each provider expects its own identifier syntax and these must be kept
//! verbatim: LMStudio uses hyphen-joined names, Ollama uses colon-delimited
//! tags, OpenRouter uses slash-namespaced routes and OpenAI uses bare names.

pub(crate) const LMSTUDIO_CODER: &str = "qwen2.5-coder-7b-instruct";
pub(crate) const LMSTUDIO_GENERAL: &str = "llama-3.1-8b-instruct";

pub(crate) const OLLAMA_CODER: &str = "qwen2.5-coder:7b";
pub(crate) const OLLAMA_GENERAL: &str = "llama3.1:8b";

pub(crate) const OPENROUTER_CODER: &str = "qwen/qwen-2.5-coder-32b-instruct";
pub(crate) const OPENROUTER_VISION: &str = "meta-llama/llama-3.2-11b-vision-instruct";
pub(crate) const OPENROUTER_GENERAL: &str = "meta-llama/llama-3.1-8b-instruct";

// Both OpenAI branches currently pick the same model.
pub(crate) const OPENAI_LONG_OR_VISION: &str = "gpt-4o-mini";
pub(crate) const OPENAI_GENERAL: &str = "gpt-4o-mini";
