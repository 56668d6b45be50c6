// src/assistente/gemini.rs

//! Cliente mínimo do endpoint `generateContent` da API Gemini.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const URL_BASE_GEMINI: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum ErroGemini {
    #[error("falha de comunicação com a API Gemini: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API Gemini respondeu {status}: {corpo}")]
    Resposta { status: u16, corpo: String },

    #[error("resposta da API Gemini sem texto")]
    SemTexto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parte {
    pub text: String,
}

/// Mensagem no formato da API (`role` é `user` ou `model`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conteudo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Parte>,
}

impl Conteudo {
    pub fn texto(role: Option<&str>, texto: impl Into<String>) -> Self {
        Conteudo {
            role: role.map(str::to_string),
            parts: vec![Parte { text: texto.into() }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequisicaoGerar<'a> {
    contents: &'a [Conteudo],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Conteudo>,
}

#[derive(Debug, Deserialize)]
struct RespostaGerar {
    #[serde(default)]
    candidates: Vec<Candidato>,
}

#[derive(Debug, Deserialize)]
struct Candidato {
    content: Option<Conteudo>,
}

impl RespostaGerar {
    fn texto(self) -> Option<String> {
        let conteudo = self.candidates.into_iter().next()?.content?;
        let texto: String = conteudo.parts.into_iter().map(|p| p.text).collect();
        if texto.trim().is_empty() {
            None
        } else {
            Some(texto)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClienteGemini {
    http: reqwest::Client,
    api_key: String,
    modelo: String,
    url_base: String,
}

impl ClienteGemini {
    pub fn new(api_key: String, modelo: String) -> Self {
        Self::com_url_base(api_key, modelo, URL_BASE_GEMINI.to_string())
    }

    pub fn com_url_base(api_key: String, modelo: String, url_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            modelo,
            url_base,
        }
    }

    pub fn modelo(&self) -> &str {
        &self.modelo
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.url_base.trim_end_matches('/'),
            self.modelo
        )
    }

    /// Envia a conversa e devolve o texto da primeira resposta.
    pub async fn gerar(&self, instrucao_sistema: Option<&str>, conteudos: &[Conteudo]) -> Result<String, ErroGemini> {
        let corpo = RequisicaoGerar {
            contents: conteudos,
            system_instruction: instrucao_sistema.map(|t| Conteudo::texto(None, t)),
        };

        let resposta = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&corpo)
            .send()
            .await?;

        if !resposta.status().is_success() {
            let status = resposta.status().as_u16();
            let corpo = resposta.text().await.unwrap_or_default();
            return Err(ErroGemini::Resposta { status, corpo });
        }

        let parsed: RespostaGerar = resposta.json().await?;
        parsed.texto().ok_or(ErroGemini::SemTexto)
    }
}
