// src/despesas/despesas_structs.rs

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const CATEGORIA_PADRAO: &str = "Variável";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Despesa {
    pub id: i32,
    pub market_id: i32,
    pub descricao: String,
    pub valor: BigDecimal,
    pub categoria: String,
    pub data: NaiveDate,
}

/// Dados de uma despesa recebidos no POST/PUT.
#[derive(Debug, Deserialize)]
pub struct NovaDespesa {
    pub descricao: String,
    pub valor: BigDecimal,
    pub categoria: Option<String>,
    /// Quando ausente, usa a data de hoje.
    pub data: Option<NaiveDate>,
}

impl NovaDespesa {
    pub fn validar(&self) -> Result<(), String> {
        if self.descricao.trim().is_empty() {
            return Err("A descrição da despesa é obrigatória.".to_string());
        }
        if self.valor <= BigDecimal::zero() {
            return Err("O valor da despesa deve ser maior que zero.".to_string());
        }
        Ok(())
    }

    pub fn categoria(&self) -> &str {
        self.categoria
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(CATEGORIA_PADRAO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn despesa(descricao: &str, valor: &str, categoria: Option<&str>) -> NovaDespesa {
        NovaDespesa {
            descricao: descricao.to_string(),
            valor: valor.parse().unwrap(),
            categoria: categoria.map(str::to_string),
            data: None,
        }
    }

    #[test]
    fn valor_precisa_ser_positivo() {
        assert!(despesa("Aluguel", "1500", None).validar().is_ok());
        assert!(despesa("Aluguel", "0", None).validar().is_err());
        assert!(despesa("  ", "10", None).validar().is_err());
    }

    #[test]
    fn categoria_vazia_usa_padrao() {
        assert_eq!(despesa("Gás", "80", None).categoria(), "Variável");
        assert_eq!(despesa("Gás", "80", Some(" ")).categoria(), "Variável");
        assert_eq!(despesa("Aluguel", "1500", Some("Fixa")).categoria(), "Fixa");
    }
}
