// src/shared/erro.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use super::shared_structs::GenericResponse;

/// Erro retornado pelas rotas da API.
///
/// Cada variante define o código HTTP da resposta. O corpo segue o mesmo
/// envelope `GenericResponse` usado nas respostas de sucesso.
#[derive(Debug, Error)]
pub enum ErroApi {
    #[error("{0}")]
    NaoEncontrado(String),

    #[error("{0}")]
    Requisicao(String),

    #[error("{0}")]
    NaoAutorizado(String),

    #[error("{0}")]
    Proibido(String),

    #[error("{0}")]
    Conflito(String),

    #[error("{0}")]
    Indisponivel(String),

    #[error("Erro interno ao acessar o banco de dados")]
    Banco(sqlx::Error),

    #[error("{0}")]
    Interno(String),
}

impl ErroApi {
    pub fn nao_encontrado(msg: impl Into<String>) -> Self {
        ErroApi::NaoEncontrado(msg.into())
    }

    pub fn requisicao(msg: impl Into<String>) -> Self {
        ErroApi::Requisicao(msg.into())
    }

    pub fn conflito(msg: impl Into<String>) -> Self {
        ErroApi::Conflito(msg.into())
    }
}

/// SQLSTATE de violação de chave única no PostgreSQL.
const VIOLACAO_UNICA: &str = "23505";

/// Mensagem de conflito para cada restrição única do esquema.
fn mensagem_conflito(restricao: Option<&str>) -> &'static str {
    match restricao {
        Some("usuarios_email_key") => "E-mail já cadastrado.",
        Some("sessoes_caixa_uma_aberta_idx") => "Já existe um caixa aberto para este operador.",
        Some("vendas_market_id_order_number_key") => "Número de pedido em uso. Tente novamente.",
        _ => "Registro duplicado.",
    }
}

// Violações de unicidade viram 409; as checagens prévias não cobrem
// duas requisições concorrentes.
impl From<sqlx::Error> for ErroApi {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.code().as_deref() == Some(VIOLACAO_UNICA) {
                tracing::warn!(restricao = ?db.constraint(), "Violação de chave única");
                return ErroApi::Conflito(mensagem_conflito(db.constraint()).to_string());
            }
        }
        ErroApi::Banco(e)
    }
}

impl ResponseError for ErroApi {
    fn status_code(&self) -> StatusCode {
        match self {
            ErroApi::NaoEncontrado(_) => StatusCode::NOT_FOUND,
            ErroApi::Requisicao(_) => StatusCode::BAD_REQUEST,
            ErroApi::NaoAutorizado(_) => StatusCode::UNAUTHORIZED,
            ErroApi::Proibido(_) => StatusCode::FORBIDDEN,
            ErroApi::Conflito(_) => StatusCode::CONFLICT,
            ErroApi::Indisponivel(_) => StatusCode::SERVICE_UNAVAILABLE,
            ErroApi::Banco(_) | ErroApi::Interno(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ErroApi::Banco(e) = self {
            tracing::error!(erro = ?e, "Erro de banco de dados");
        }
        HttpResponse::build(self.status_code()).json(GenericResponse::erro(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct ErroPostgres {
        codigo: &'static str,
        restricao: Option<&'static str>,
    }

    impl fmt::Display for ErroPostgres {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "erro {}", self.codigo)
        }
    }

    impl StdError for ErroPostgres {}

    impl sqlx::error::DatabaseError for ErroPostgres {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.codigo))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.restricao
        }
    }

    fn erro_banco(codigo: &'static str, restricao: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ErroPostgres { codigo, restricao }))
    }

    #[test]
    fn violacao_unica_vira_conflito() {
        let erro = ErroApi::from(erro_banco("23505", Some("sessoes_caixa_uma_aberta_idx")));
        assert_eq!(erro.status_code(), StatusCode::CONFLICT);
        assert_eq!(erro.to_string(), "Já existe um caixa aberto para este operador.");

        let erro = ErroApi::from(erro_banco("23505", Some("usuarios_email_key")));
        assert_eq!(erro.to_string(), "E-mail já cadastrado.");

        let erro = ErroApi::from(erro_banco("23505", None));
        assert_eq!(erro.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn outros_erros_de_banco_continuam_500() {
        // 40P01: deadlock detectado
        let erro = ErroApi::from(erro_banco("40P01", None));
        assert_eq!(erro.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErroApi::from(sqlx::Error::RowNotFound).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn codigos_http_por_variante() {
        assert_eq!(ErroApi::nao_encontrado("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErroApi::requisicao("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErroApi::conflito("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ErroApi::Indisponivel("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErroApi::Banco(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn erro_de_banco_nao_vaza_detalhes() {
        let erro = ErroApi::Banco(sqlx::Error::Protocol("detalhe interno".into()));
        assert_eq!(erro.to_string(), "Erro interno ao acessar o banco de dados");
    }
}
