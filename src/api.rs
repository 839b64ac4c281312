//! Language model access for vocabulary generation.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait for sending text to a model
//! - [`AwfulAskClient`]: [`AskAsync`] over the `awful_aj` OpenAI-compatible client
//! - [`VocabularyGenerator`]: builds the prompt, makes one request per article
//!   and hands the reply to [`crate::parser`]
//!
//! There is no retry layer. A failed request drops the article from the run.

use crate::models::{ArticleContent, VocabularyResult};
use crate::parser::split_sections;
use crate::utils::truncate_for_log;
use awful_aj::api::ask;
use awful_aj::{config, config::AwfulJadeConfig, config_dir, template, template::ChatTemplate};
use std::error::Error;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Chat template used when no named template is requested.
const EMBEDDED_TEMPLATE: &str = r#"
system_prompt: "You are an English language tutor. You read newspaper editorials and list the vocabulary and idioms a learner should study. You answer in plain text only."
messages: []
"#;

/// Trait for async LLM interaction.
///
/// Implementors send text to a model and return its reply. Tests substitute
/// scripted implementations.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// `awful_aj` client with its loaded configuration and chat template.
#[derive(Debug)]
pub struct AwfulAskClient {
    pub config: AwfulJadeConfig,
    pub template: ChatTemplate,
}

impl AwfulAskClient {
    /// Load `config.yaml` and a chat template.
    ///
    /// `config_path` defaults to `config.yaml` in the `awful_aj` config
    /// directory. `template_name` selects a template from the `awful_aj`
    /// template directory; without it the embedded template is used.
    #[instrument(level = "info")]
    pub async fn load(
        config_path: Option<&str>,
        template_name: Option<&str>,
    ) -> Result<Self, Box<dyn Error>> {
        let config_path = match config_path {
            Some(path) => path.to_string(),
            None => config_dir()?.join("config.yaml").to_string_lossy().into_owned(),
        };
        let config = config::load_config(&config_path)?;
        info!(%config_path, "Loaded model configuration");

        let template = match template_name {
            Some(name) => {
                let template = template::load_template(name).await?;
                info!(template = name, "Loaded template");
                template
            }
            None => serde_yaml::from_str::<ChatTemplate>(EMBEDDED_TEMPLATE)?,
        };

        Ok(Self { config, template })
    }
}

impl AskAsync for AwfulAskClient {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(&self.config, text.to_string(), &self.template, None, None).await;
        let dt = t0.elapsed();

        match &res {
            Ok(_) => debug!(elapsed_ms = dt.as_millis() as u128, "API call succeeded"),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "API call failed"),
        }
        res
    }
}

/// Model for runs that never generate, such as re-rendering a snapshot.
///
/// Every request fails, so nothing reaches a real endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct Offline;

impl AskAsync for Offline {
    type Response = String;

    async fn ask(&self, _text: &str) -> Result<Self::Response, Box<dyn Error>> {
        Err("no model is configured for this run".into())
    }
}

/// Build the fixed prompt for one article.
pub fn build_prompt(article: &ArticleContent) -> String {
    format!(
        r#"Read this article and provide two distinct lists based on its content, strictly following the format below:

1.  **Words:** List all good vocabulary words from the article, along with a concise meaning for each. Format each entry as "word: meaning", and place each complete entry on a new line. Do not use any bullet points, dashes, or other special formatting.
2.  **Phrases and Idioms:** List different phrases and idioms found in the article, along with a concise meaning for each. Format each entry as "phrase: meaning", and place each complete entry on a new line. Do not use any bullet points, dashes, or other special formatting.

Title: {}
Content: {}
"#,
        article.title, article.body
    )
}

/// Turns articles into [`VocabularyResult`]s with one model call each.
#[derive(Debug)]
pub struct VocabularyGenerator<A> {
    model: A,
}

impl<A> VocabularyGenerator<A>
where
    A: AskAsync<Response = String>,
{
    pub fn new(model: A) -> Self {
        Self { model }
    }

    /// Ask the model about `article` and split its reply.
    ///
    /// Returns `None` if the request fails.
    #[instrument(level = "info", skip_all, fields(title = %article.title))]
    pub async fn generate(&self, article: &ArticleContent) -> Option<VocabularyResult> {
        let prompt = build_prompt(article);
        let reply = match self.model.ask(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(url = %article.url, error = %e, "Model call failed; dropping article");
                return None;
            }
        };
        debug!(response_preview = %truncate_for_log(&reply, 300), "Model reply");

        let sections = split_sections(&reply);
        if sections.phrases.is_empty() {
            warn!(url = %article.url, "Reply had no phrases heading");
        }
        Some(VocabularyResult {
            title: article.title.clone(),
            words: sections.words,
            phrases: sections.phrases,
        })
    }
}
