// src/vendas/vendas_structs.rs

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, types::Json, FromRow, Row};

/// Forma de pagamento da venda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormaPagamento {
    Money,
    Credit,
    Debit,
    Pix,
    /// Conta-crédito (fiado) do cliente.
    CreditAccount,
}

impl FormaPagamento {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormaPagamento::Money => "money",
            FormaPagamento::Credit => "credit",
            FormaPagamento::Debit => "debit",
            FormaPagamento::Pix => "pix",
            FormaPagamento::CreditAccount => "credit_account",
        }
    }

    /// Nome exibido no recibo e na exportação ("CREDIT ACCOUNT").
    pub fn rotulo(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }
}

impl FromStr for FormaPagamento {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "money" => Ok(FormaPagamento::Money),
            "credit" => Ok(FormaPagamento::Credit),
            "debit" => Ok(FormaPagamento::Debit),
            "pix" => Ok(FormaPagamento::Pix),
            "credit_account" => Ok(FormaPagamento::CreditAccount),
            outro => Err(format!("forma de pagamento desconhecida: {}", outro)),
        }
    }
}

impl fmt::Display for FormaPagamento {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Situação da venda.
///
/// `Open` é uma comanda ainda não paga. Vendas enviadas à cozinha seguem a
/// sequência `Pending -> Preparing -> Ready -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusVenda {
    Open,
    Pending,
    Preparing,
    Ready,
    Completed,
}

impl StatusVenda {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusVenda::Open => "open",
            StatusVenda::Pending => "pending",
            StatusVenda::Preparing => "preparing",
            StatusVenda::Ready => "ready",
            StatusVenda::Completed => "completed",
        }
    }

    /// Próxima etapa no quadro da cozinha.
    pub fn proximo(&self) -> Option<StatusVenda> {
        match self {
            StatusVenda::Pending => Some(StatusVenda::Preparing),
            StatusVenda::Preparing => Some(StatusVenda::Ready),
            StatusVenda::Ready => Some(StatusVenda::Completed),
            StatusVenda::Open | StatusVenda::Completed => None,
        }
    }

    /// Texto da ação que leva à próxima etapa.
    pub fn acao(&self) -> Option<&'static str> {
        match self {
            StatusVenda::Pending => Some("Iniciar Preparo"),
            StatusVenda::Preparing => Some("Marcar como Pronto"),
            StatusVenda::Ready => Some("Entregar Pedido"),
            StatusVenda::Open | StatusVenda::Completed => None,
        }
    }
}

impl FromStr for StatusVenda {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(StatusVenda::Open),
            "pending" => Ok(StatusVenda::Pending),
            "preparing" => Ok(StatusVenda::Preparing),
            "ready" => Ok(StatusVenda::Ready),
            "completed" => Ok(StatusVenda::Completed),
            outro => Err(format!("status de venda desconhecido: {}", outro)),
        }
    }
}

/// Estrutura para representar um item individual que entra na sacola.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ItemVenda {
    pub produto_id: i32,
    pub quantidade: i32,
}

/// Nova quantidade de um item da sacola (zero remove o item).
#[derive(Debug, Deserialize)]
pub struct AtualizarItem {
    pub quantidade: i32,
}

/// Cópia do item no momento da venda, gravada junto com a venda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemVendido {
    pub id: i32,
    pub nome: String,
    pub preco: BigDecimal,
    pub qtd: i32,
}

impl ItemVendido {
    pub fn subtotal(&self) -> BigDecimal {
        &self.preco * BigDecimal::from(self.qtd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoDesconto {
    Points,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Desconto {
    pub tipo: TipoDesconto,
    pub valor: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    /// Pontos consumidos, quando o desconto veio de resgate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pontos: Option<i32>,
}

/// Venda registrada (também usada para comandas e pedidos da cozinha).
#[derive(Debug, Clone, Serialize)]
pub struct Venda {
    pub id: i32,
    pub market_id: i32,
    pub order_number: i32,
    pub itens: Vec<ItemVendido>,
    pub total: BigDecimal,
    pub forma_pagamento: FormaPagamento,
    pub recebido: BigDecimal,
    pub troco: BigDecimal,
    pub status: StatusVenda,
    pub operador_id: Option<i32>,
    pub operador_nome: String,
    pub cliente_id: Option<i32>,
    pub cliente_nome: Option<String>,
    pub desconto: Option<Desconto>,
    pub created_at: DateTime<Utc>,
}

impl Venda {
    pub fn quantidade_itens(&self) -> i32 {
        self.itens.iter().map(|i| i.qtd).sum()
    }
}

impl<'r> FromRow<'r, PgRow> for Venda {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let forma: String = row.try_get("forma_pagamento")?;
        let status: String = row.try_get("status")?;
        let itens: Json<Vec<ItemVendido>> = row.try_get("itens")?;
        let desconto: Option<Json<Desconto>> = row.try_get("desconto")?;
        Ok(Self {
            id: row.try_get("id")?,
            market_id: row.try_get("market_id")?,
            order_number: row.try_get("order_number")?,
            itens: itens.0,
            total: row.try_get("total")?,
            forma_pagamento: forma.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))?,
            recebido: row.try_get("recebido")?,
            troco: row.try_get("troco")?,
            status: status.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))?,
            operador_id: row.try_get("operador_id")?,
            operador_nome: row.try_get("operador_nome")?,
            cliente_id: row.try_get("cliente_id")?,
            cliente_nome: row.try_get("cliente_nome")?,
            desconto: desconto.map(|d| d.0),
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Dados para finalizar a venda da sacola.
#[derive(Debug, Deserialize)]
pub struct FinalizarVenda {
    pub forma_pagamento: FormaPagamento,
    /// Valor entregue pelo cliente (obrigatório em dinheiro).
    pub recebido: Option<BigDecimal>,
    pub cliente_id: Option<i32>,
    /// Desconto manual em reais.
    pub desconto: Option<BigDecimal>,
    pub descricao_desconto: Option<String>,
    /// Pontos de fidelidade a trocar por desconto.
    pub pontos_resgatados: Option<i32>,
    /// Envia o pedido para o quadro da cozinha (status `pending`).
    #[serde(default)]
    pub enviar_cozinha: bool,
    /// Comanda aberta que está sendo fechada com esta venda.
    pub comanda_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct NovaComanda {
    pub nome: String,
}

/// Período da listagem de vendas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodo {
    #[default]
    All,
    Today,
    Week,
    Month,
}

/// Filtros aceitos na listagem e na exportação de vendas.
#[derive(Debug, Default, Deserialize)]
pub struct FiltrosVendas {
    #[serde(default)]
    pub periodo: Periodo,
    pub forma: Option<FormaPagamento>,
    pub busca: Option<String>,
}

/// Lista de vendas com o total das vendas filtradas.
#[derive(Debug, Serialize)]
pub struct ListaVendas {
    pub vendas: Vec<Venda>,
    pub total: BigDecimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_avanca_em_sequencia() {
        let mut status = StatusVenda::Pending;
        let mut etapas = vec![status];
        while let Some(proximo) = status.proximo() {
            status = proximo;
            etapas.push(status);
        }
        assert_eq!(
            etapas,
            vec![
                StatusVenda::Pending,
                StatusVenda::Preparing,
                StatusVenda::Ready,
                StatusVenda::Completed
            ]
        );
    }

    #[test]
    fn comanda_aberta_nao_avanca() {
        assert_eq!(StatusVenda::Open.proximo(), None);
        assert_eq!(StatusVenda::Open.acao(), None);
        assert_eq!(StatusVenda::Ready.acao(), Some("Entregar Pedido"));
    }

    #[test]
    fn forma_de_pagamento_em_json_e_texto() {
        let forma: FormaPagamento = serde_json::from_str("\"credit_account\"").unwrap();
        assert_eq!(forma, FormaPagamento::CreditAccount);
        assert_eq!(forma.rotulo(), "CREDIT ACCOUNT");
        assert_eq!("pix".parse::<FormaPagamento>(), Ok(FormaPagamento::Pix));
        assert!("cheque".parse::<FormaPagamento>().is_err());
    }

    #[test]
    fn subtotal_do_item() {
        let item = ItemVendido {
            id: 1,
            nome: "Pão".to_string(),
            preco: "0.75".parse().unwrap(),
            qtd: 4,
        };
        assert_eq!(item.subtotal(), BigDecimal::from(3));
    }
}
