//! Configuration file format (`council.toml`)
//!
//! Serde representation of the on-disk configuration, with conversions
//! into the application-layer config types. Every section defaults so an
//! empty file (or no file at all) yields a working setup.
//!
//! Example configuration:
//!
//! ```toml
//! [provider]
//! base_url = "https://api.openai.com/v1"
//! api_key_env = "OPENAI_API_KEY"
//! embedding_model = "text-embedding-3-small"
//! request_timeout_secs = 60
//!
//! [council]
//! synthesizer = "claude-opus-4.5"
//! review_concurrency = 4
//!
//! [[council.members]]
//! id = "analyst"
//! name = "The Analyst"
//! role = "methodical decomposition"
//! system_prompt = "You are a rigorous analyst."
//! model = "claude-sonnet-4.5"
//! temperature = 0.3
//!
//! [retrieval]
//! mode = "fixed-window"
//! window = 500
//! overlap = 100
//! embed_delay_ms = 100
//! top_k = 5
//! ```

use council_application::{DeliberationConfig, RetrievalConfig};
use council_domain::{ChunkingPolicy, CouncilRoster, Member, Model};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub provider: ProviderFileConfig,
    pub council: CouncilFileConfig,
    pub retrieval: RetrievalFileConfig,
    pub storage: StorageFileConfig,
}

impl FileConfig {
    /// Build the roster; an empty member list falls back to the reference
    /// four-member panel.
    pub fn roster(&self) -> CouncilRoster {
        if self.council.members.is_empty() {
            CouncilRoster::default_roster()
        } else {
            CouncilRoster::new(
                self.council
                    .members
                    .iter()
                    .map(MemberFileConfig::to_member)
                    .collect(),
            )
        }
    }

    pub fn deliberation_config(&self) -> DeliberationConfig {
        DeliberationConfig {
            request_timeout: Duration::from_secs(self.provider.request_timeout_secs),
            review_concurrency: self.council.review_concurrency,
            max_tokens: self.provider.max_tokens,
            // Model parsing is infallible; unknown names become Custom
            synthesizer: self.council.synthesizer.as_ref().map(|s| s.parse().unwrap()),
        }
    }

    pub fn retrieval_config(&self) -> RetrievalConfig {
        RetrievalConfig {
            chunking: self.retrieval.chunking_policy(),
            embed_delay: Duration::from_millis(self.retrieval.embed_delay_ms),
            top_k: self.retrieval.top_k,
        }
    }
}

/// `[provider]` section: the OpenAI-compatible endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderFileConfig {
    /// Base URL of the chat/embeddings API
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Embedding model id (its dimension is provider-fixed)
    pub embedding_model: String,
    /// Bounded wait for every external call
    pub request_timeout_secs: u64,
    /// Token budget per generation call
    pub max_tokens: u32,
}

impl Default for ProviderFileConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            request_timeout_secs: 60,
            max_tokens: 1024,
        }
    }
}

impl ProviderFileConfig {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `[council]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouncilFileConfig {
    /// Roster members; empty means the built-in reference panel
    pub members: Vec<MemberFileConfig>,
    /// Model binding for the synthesis call; defaults to the first
    /// member's binding
    pub synthesizer: Option<String>,
    /// Maximum concurrent peer-review calls
    pub review_concurrency: usize,
}

impl Default for CouncilFileConfig {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            synthesizer: None,
            review_concurrency: 4,
        }
    }
}

/// One `[[council.members]]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberFileConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub system_prompt: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

impl MemberFileConfig {
    pub fn to_member(&self) -> Member {
        // Model parsing is infallible; unknown names become Custom
        let model: Model = self.model.parse().unwrap();
        Member::new(
            &self.id,
            &self.name,
            &self.role,
            &self.system_prompt,
            model,
            self.temperature,
        )
    }
}

/// `[retrieval]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalFileConfig {
    /// "fixed-window" or "paragraph"
    pub mode: String,
    /// Window size in characters (fixed-window mode)
    pub window: usize,
    /// Overlap in characters (fixed-window mode)
    pub overlap: usize,
    /// Maximum chunk size in characters (paragraph mode)
    pub max_chunk: usize,
    /// Pacing delay between embedding calls during ingestion
    pub embed_delay_ms: u64,
    /// Default number of search results
    pub top_k: usize,
}

impl Default for RetrievalFileConfig {
    fn default() -> Self {
        Self {
            mode: "fixed-window".to_string(),
            window: 500,
            overlap: 100,
            max_chunk: 1200,
            embed_delay_ms: 100,
            top_k: 5,
        }
    }
}

impl RetrievalFileConfig {
    pub fn chunking_policy(&self) -> ChunkingPolicy {
        match self.mode.as_str() {
            "paragraph" | "paragraph-greedy" => ChunkingPolicy::ParagraphGreedy {
                max_chunk: self.max_chunk,
            },
            _ => ChunkingPolicy::FixedWindow {
                window: self.window,
                overlap: self.overlap,
            },
        }
    }
}

/// `[storage]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageFileConfig {
    /// Directory for the JSONL stores and transcripts; defaults to the
    /// platform data dir
    pub data_dir: Option<PathBuf>,
}

impl StorageFileConfig {
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("llm-council"))
            .unwrap_or_else(|| PathBuf::from("./council-data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_when_no_members() {
        let config = FileConfig::default();
        let roster = config.roster();
        assert_eq!(roster.len(), 4);
        assert!(roster.validate().is_ok());
    }

    #[test]
    fn test_configured_members_win() {
        let mut config = FileConfig::default();
        config.council.members.push(MemberFileConfig {
            id: "solo".to_string(),
            name: "Solo".to_string(),
            role: "everything".to_string(),
            system_prompt: "Answer alone.".to_string(),
            model: "claude-sonnet-4.5".to_string(),
            temperature: 0.5,
        });

        let roster = config.roster();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.members()[0].model, Model::ClaudeSonnet45);
    }

    #[test]
    fn test_deliberation_config_conversion() {
        let mut config = FileConfig::default();
        config.council.synthesizer = Some("claude-opus-4.5".to_string());
        config.provider.request_timeout_secs = 30;

        let deliberation = config.deliberation_config();
        assert_eq!(deliberation.request_timeout, Duration::from_secs(30));
        assert_eq!(deliberation.synthesizer, Some(Model::ClaudeOpus45));
    }

    #[test]
    fn test_chunking_mode_parse() {
        let mut retrieval = RetrievalFileConfig::default();
        assert_eq!(
            retrieval.chunking_policy(),
            ChunkingPolicy::FixedWindow {
                window: 500,
                overlap: 100
            }
        );

        retrieval.mode = "paragraph".to_string();
        assert_eq!(
            retrieval.chunking_policy(),
            ChunkingPolicy::ParagraphGreedy { max_chunk: 1200 }
        );
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let storage = StorageFileConfig {
            data_dir: Some(PathBuf::from("/tmp/council")),
        };
        assert_eq!(storage.resolve_data_dir(), PathBuf::from("/tmp/council"));
    }
}
