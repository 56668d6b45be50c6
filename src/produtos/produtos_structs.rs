// src/produtos/produtos_structs.rs

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Janela (em dias) para considerar um produto próximo do vencimento.
pub const DIAS_ALERTA_VALIDADE: i64 = 30;

/// Estrutura para receber dados do produto na requisição POST/PUT
#[derive(Debug, Deserialize)]
pub struct NovoProduto {
    pub nome: String,
    pub codigo: String,
    pub preco: BigDecimal,
    #[serde(default)]
    pub custo: BigDecimal,
    pub estoque: i32,
    pub validade: Option<NaiveDate>,
}

impl NovoProduto {
    pub fn validar(&self) -> Result<(), String> {
        if self.nome.trim().is_empty() || self.codigo.trim().is_empty() {
            return Err("Nome e código do produto são obrigatórios.".to_string());
        }
        if self.preco < BigDecimal::from(0) || self.custo < BigDecimal::from(0) {
            return Err("Preço e custo não podem ser negativos.".to_string());
        }
        if self.estoque < 0 {
            return Err("O estoque não pode ser negativo.".to_string());
        }
        Ok(())
    }
}

/// Estrutura que representa um produto no banco de dados
/// Deriva FromRow para mapeamento direto de resultados de query SQL
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Produto {
    pub id: i32,
    pub market_id: i32,
    pub nome: String,
    pub codigo: String,
    pub preco: BigDecimal,
    pub custo: BigDecimal,
    pub estoque: i32,
    pub validade: Option<NaiveDate>,
}

impl Produto {
    /// Verifica se o nome ou o código contém o termo (sem diferenciar maiúsculas).
    pub fn corresponde(&self, termo: &str) -> bool {
        let termo = termo.to_lowercase();
        self.nome.to_lowercase().contains(&termo) || self.codigo.to_lowercase().contains(&termo)
    }

    pub fn estoque_baixo(&self, limite: i32) -> bool {
        self.estoque <= limite
    }

    pub fn situacao_validade(&self, hoje: NaiveDate) -> SituacaoValidade {
        match self.validade {
            None => SituacaoValidade::SemValidade,
            Some(v) if v < hoje => SituacaoValidade::Vencido,
            Some(v) if v <= hoje + Duration::days(DIAS_ALERTA_VALIDADE) => SituacaoValidade::Proximo,
            Some(_) => SituacaoValidade::Ok,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SituacaoValidade {
    SemValidade,
    Ok,
    Proximo,
    Vencido,
}

/// Produto com a situação da validade, usado no relatório de vencimentos.
#[derive(Debug, Serialize)]
pub struct ProdutoVencendo {
    #[serde(flatten)]
    pub produto: Produto,
    pub situacao: SituacaoValidade,
}

/// Produtos vencidos ou que vencem nos próximos 30 dias, do mais próximo ao mais distante.
pub fn produtos_vencendo(produtos: Vec<Produto>, hoje: NaiveDate) -> Vec<ProdutoVencendo> {
    let mut lista: Vec<ProdutoVencendo> = produtos
        .into_iter()
        .filter_map(|produto| match produto.situacao_validade(hoje) {
            situacao @ (SituacaoValidade::Proximo | SituacaoValidade::Vencido) => {
                Some(ProdutoVencendo { produto, situacao })
            }
            _ => None,
        })
        .collect();
    lista.sort_by_key(|p| p.produto.validade);
    lista
}

/// Parâmetros de busca da listagem de produtos.
#[derive(Debug, Deserialize)]
pub struct BuscaProdutos {
    pub busca: Option<String>,
}
