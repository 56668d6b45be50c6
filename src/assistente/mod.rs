// src/assistente/mod.rs

// Cliente HTTP da API Gemini
pub mod gemini;
pub mod prompts;
pub mod assistente_router;
