// src/clientes/clientes_structs.rs

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};

use super::fidelidade::{credito_disponivel, ErroFidelidade};
use crate::shared::erro::ErroApi;

/// Cliente do mercado, com saldo de pontos e conta-crédito.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Cliente {
    pub id: i32,
    pub market_id: i32,
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub cpf: String,
    pub pontos: i32,
    pub limite_credito: BigDecimal,
    pub saldo_devedor: BigDecimal,
}

impl Cliente {
    pub fn credito_disponivel(&self) -> BigDecimal {
        credito_disponivel(&self.limite_credito, &self.saldo_devedor)
    }

    /// Busca por nome, CPF, telefone ou e-mail.
    pub fn corresponde(&self, termo: &str) -> bool {
        let termo = termo.to_lowercase();
        self.nome.to_lowercase().contains(&termo)
            || self.cpf.contains(&termo)
            || self.telefone.contains(&termo)
            || self.email.to_lowercase().contains(&termo)
    }
}

/// Dados do formulário de cliente. Pontos e saldo não são editáveis aqui.
#[derive(Debug, Deserialize)]
pub struct NovoCliente {
    pub nome: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub limite_credito: BigDecimal,
}

impl NovoCliente {
    pub fn validar(&self) -> Result<(), String> {
        if self.nome.trim().is_empty() {
            return Err("O nome do cliente é obrigatório.".to_string());
        }
        if self.limite_credito < BigDecimal::from(0) {
            return Err("O limite de crédito não pode ser negativo.".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct BuscaClientes {
    pub busca: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AjustePontos {
    pub delta: i32,
}

#[derive(Debug, Deserialize)]
pub struct NovoPagamento {
    pub valor: BigDecimal,
    pub observacao: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoTransacaoCliente {
    /// Pagamento que abate o saldo devedor.
    Payment,
    /// Compra lançada na conta-crédito.
    Purchase,
}

impl TipoTransacaoCliente {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoTransacaoCliente::Payment => "payment",
            TipoTransacaoCliente::Purchase => "purchase",
        }
    }
}

impl FromStr for TipoTransacaoCliente {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment" => Ok(TipoTransacaoCliente::Payment),
            "purchase" => Ok(TipoTransacaoCliente::Purchase),
            outro => Err(format!("tipo de transação desconhecido: {}", outro)),
        }
    }
}

/// Lançamento do extrato do cliente.
#[derive(Debug, Serialize)]
pub struct TransacaoCliente {
    pub id: i32,
    pub cliente_id: i32,
    pub tipo: TipoTransacaoCliente,
    pub valor: BigDecimal,
    pub venda_id: Option<i32>,
    pub observacao: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for TransacaoCliente {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let tipo: String = row.try_get("tipo")?;
        Ok(Self {
            id: row.try_get("id")?,
            cliente_id: row.try_get("cliente_id")?,
            tipo: tipo.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))?,
            valor: row.try_get("valor")?,
            venda_id: row.try_get("venda_id")?,
            observacao: row.try_get("observacao")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ErroFidelidade> for ErroApi {
    fn from(e: ErroFidelidade) -> Self {
        ErroApi::Requisicao(e.to_string())
    }
}
