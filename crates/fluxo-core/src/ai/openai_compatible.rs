//! OpenAI-compatible classification backend
//!
//! HTTP client for any service exposing the chat-completions API
//! (Groq, vLLM, LocalAI, llama-server, ...). One request per chunk; the
//! system message carries the closed vocabulary and classification policy,
//! the user message carries the chunk as a JSON array.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Category;

use super::parsing::parse_batch_response;
use super::{AiBackend, AiConfig, ClassifiedBatch, ClassifyRequestItem};

#[derive(Clone)]
pub struct OpenAiCompatibleBackend {
    http_client: Client,
    config: AiConfig,
}

impl OpenAiCompatibleBackend {
    pub fn new(config: AiConfig) -> Self {
        Self {
            http_client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }
}

/// Request to the chat-completions API
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Response from the chat-completions API
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// System instruction carrying the closed vocabulary and classification policy
pub fn build_system_prompt() -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| format!("- {}", c.as_str()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a financial classifier for Brazilian bank statements (pt-BR).\n\
         \n\
         TASK\n\
         For each transaction received, return exactly one object per item in\n\
         {{\"items\":[...]}} with the fields:\n\
         - id: string (the item's original id)\n\
         - category: string (one category from the allowed list)\n\
         - type: \"income\" | \"expense\"\n\
         - confidence: number from 0 to 1\n\
         \n\
         ALLOWED CATEGORIES\n\
         {categories}\n\
         \n\
         RULES\n\
         1) Sign of the amount: amount > 0 means type \"income\", amount < 0 means \"expense\".\n\
         2) Frequent patterns:\n\
            - \"pagamento de fatura\", \"fatura\", \"cartão\": Fatura (usually expense).\n\
            - PIX received / incoming transfer: Entradas, income.\n\
            - PIX sent / outgoing transfer with no other context: Serviços, expense.\n\
            - Fuel / posto / Uber / 99 / IPVA / parking: Transporte.\n\
            - Drogaria / farmácia / consulta / exame / health plan: Saúde.\n\
            - Restaurants / lanche / pizzaria / boteco: Alimentação.\n\
            - Supermarket / atacado / mercearia: Mercado.\n\
            - Netflix / Spotify / Prime / Disney / HBO: Streaming.\n\
            - Software subscriptions (Notion, Figma, Adobe, ...): Assinaturas.\n\
            - Household bills (aluguel, condomínio, luz, internet, IPTU): Moradia.\n\
            - Courses / faculdade / mensalidade: Educação.\n\
            - Tickets / shows / travel / hotel / bar: Lazer.\n\
            - Salary / provento / depósito: Entradas.\n\
            - No clear match: Outros.\n\
         3) Ignore decorative bank phrases (\"compra no débito/crédito\", \"pelo PIX\",\n\
            \"pagamento\", \"transferência\") and CNPJ/CPF, account numbers, long\n\
            numeric tokens and UUIDs. Focus on the merchant name and keywords.\n\
         4) Confidence ladder: 1.0 explicit brand and direct rule; 0.7 strong\n\
            category hint; 0.4 weak or ambiguous hint; 0.2 almost no clue.\n\
         5) Answer strictly with valid JSON in the format {{\"items\":[{{...}}]}}.\n\
            No comments, no explanations, no text outside the JSON, no extra fields.\n\
         \n\
         If a category is not in the allowed list, use \"Outros\". Always return one\n\
         category and one type per item."
    )
}

#[async_trait]
impl AiBackend for OpenAiCompatibleBackend {
    async fn classify_chunk(&self, items: &[ClassifyRequestItem]) -> Result<ClassifiedBatch> {
        let user = format!(
            "Transactions (JSON):\n{}\n\n\
             Return in the format:\n\
             {{\"items\":[{{\"id\":\"<id>\",\"category\":\"<category>\",\"confidence\":0.0,\"type\":\"income|expense\"}}]}}",
            serde_json::to_string_pretty(items)?
        );

        let request = ChatRequest {
            model: self.config.model.clone(),
            temperature: 0.2,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: build_system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.config.endpoint))
            .timeout(self.config.request_timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Http(response.error_for_status().unwrap_err()));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| {
                Error::InvalidData("Empty response from classification service".into())
            })?;
        debug!("Classification response: {}", content);

        parse_batch_response(content)
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(format!("{}/v1/models", self.config.endpoint))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}
