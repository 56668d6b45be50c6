// src/config.rs

use std::collections::HashMap;

use thiserror::Error;

pub const BIND_PADRAO: &str = "127.0.0.1:8080";
pub const MODELO_GEMINI_PADRAO: &str = "gemini-2.5-flash";
const EXPIRACAO_JWT_PADRAO: i64 = 12;
const LIMITE_ESTOQUE_BAIXO_PADRAO: i32 = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ErroConfig {
    #[error("variável de ambiente obrigatória ausente: {0}")]
    Ausente(&'static str),

    #[error("valor inválido para {nome}: {valor}")]
    Invalido { nome: &'static str, valor: String },
}

/// Configuração da aplicação, lida das variáveis de ambiente.
///
/// Um arquivo `.env` no diretório atual é carregado antes da leitura
/// (veja [`Config::from_env`]).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub jwt_expiracao_horas: i64,
    pub limite_estoque_baixo: i32,
    pub gemini_api_key: Option<String>,
    pub gemini_modelo: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ErroConfig> {
        // O .env é opcional; em produção as variáveis vêm do ambiente
        let _ = dotenvy::dotenv();
        Self::from_map(&std::env::vars().collect())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ErroConfig> {
        let obrigatoria = |nome: &'static str| -> Result<String, ErroConfig> {
            vars.get(nome)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or(ErroConfig::Ausente(nome))
        };

        Ok(Config {
            database_url: obrigatoria("DATABASE_URL")?,
            jwt_secret: obrigatoria("JWT_SECRET")?,
            bind_addr: vars
                .get("PDV_BIND_ADDR")
                .cloned()
                .unwrap_or_else(|| BIND_PADRAO.to_string()),
            jwt_expiracao_horas: numero(vars, "JWT_EXPIRATION_HOURS", EXPIRACAO_JWT_PADRAO)?,
            limite_estoque_baixo: numero(vars, "PDV_LOW_STOCK_THRESHOLD", LIMITE_ESTOQUE_BAIXO_PADRAO)?,
            gemini_api_key: vars
                .get("GEMINI_API_KEY")
                .filter(|v| !v.trim().is_empty())
                .cloned(),
            gemini_modelo: vars
                .get("GEMINI_MODEL")
                .cloned()
                .unwrap_or_else(|| MODELO_GEMINI_PADRAO.to_string()),
        })
    }
}

fn numero<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    nome: &'static str,
    padrao: T,
) -> Result<T, ErroConfig> {
    match vars.get(nome) {
        None => Ok(padrao),
        Some(valor) => valor.trim().parse().map_err(|_| ErroConfig::Invalido {
            nome,
            valor: valor.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pares: &[(&str, &str)]) -> HashMap<String, String> {
        pares
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn usa_padroes_quando_opcionais_ausentes() {
        let config = Config::from_map(&vars(&[
            ("DATABASE_URL", "postgres://localhost/pdv"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, BIND_PADRAO);
        assert_eq!(config.jwt_expiracao_horas, 12);
        assert_eq!(config.limite_estoque_baixo, 10);
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.gemini_modelo, MODELO_GEMINI_PADRAO);
    }

    #[test]
    fn exige_database_url_e_segredo() {
        let erro = Config::from_map(&vars(&[("JWT_SECRET", "segredo")])).unwrap_err();
        assert_eq!(erro, ErroConfig::Ausente("DATABASE_URL"));

        let erro = Config::from_map(&vars(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", " ")]))
            .unwrap_err();
        assert_eq!(erro, ErroConfig::Ausente("JWT_SECRET"));
    }

    #[test]
    fn rejeita_numero_invalido() {
        let erro = Config::from_map(&vars(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("PDV_LOW_STOCK_THRESHOLD", "dez"),
        ]))
        .unwrap_err();
        assert!(matches!(erro, ErroConfig::Invalido { nome: "PDV_LOW_STOCK_THRESHOLD", .. }));
    }

    #[test]
    fn chave_gemini_vazia_desativa_assistente() {
        let config = Config::from_map(&vars(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("GEMINI_API_KEY", ""),
        ]))
        .unwrap();
        assert!(config.gemini_api_key.is_none());
    }
}
