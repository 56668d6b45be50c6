// src/caixa/sessao.rs

//! Sessão de caixa (turno do operador) e a conferência de fechamento.
//!
//! O caixa abre com um saldo inicial em dinheiro. Durante o turno recebe
//! vendas, suprimentos (entrada de troco) e sangrias (retiradas). No
//! fechamento o operador informa o dinheiro contado e o sistema registra
//! o valor esperado e a diferença. Depois de fechada a sessão não muda mais.

use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vendas::vendas_structs::FormaPagamento;

#[derive(Debug, Error, PartialEq)]
pub enum ErroCaixa {
    #[error("O valor de abertura deve ser maior ou igual a zero.")]
    AberturaInvalida,

    #[error("O valor da transação deve ser maior que zero.")]
    ValorInvalido,

    #[error("O valor de fechamento deve ser maior ou igual a zero.")]
    FechamentoInvalido,

    #[error("Este caixa já foi fechado.")]
    SessaoFechada,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSessao {
    Open,
    Closed,
}

impl StatusSessao {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusSessao::Open => "open",
            StatusSessao::Closed => "closed",
        }
    }
}

impl FromStr for StatusSessao {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(StatusSessao::Open),
            "closed" => Ok(StatusSessao::Closed),
            outro => Err(format!("status de caixa desconhecido: {}", outro)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoTransacaoCaixa {
    Sale,
    Suprimento,
    Sangria,
}

impl TipoTransacaoCaixa {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoTransacaoCaixa::Sale => "sale",
            TipoTransacaoCaixa::Suprimento => "suprimento",
            TipoTransacaoCaixa::Sangria => "sangria",
        }
    }
}

impl FromStr for TipoTransacaoCaixa {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(TipoTransacaoCaixa::Sale),
            "suprimento" => Ok(TipoTransacaoCaixa::Suprimento),
            "sangria" => Ok(TipoTransacaoCaixa::Sangria),
            outro => Err(format!("tipo de transação de caixa desconhecido: {}", outro)),
        }
    }
}

/// Movimento registrado no caixa.
#[derive(Debug, Clone, Serialize)]
pub struct TransacaoCaixa {
    pub id: i32,
    pub tipo: TipoTransacaoCaixa,
    pub valor: BigDecimal,
    pub forma_pagamento: Option<FormaPagamento>,
    pub observacao: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessaoCaixa {
    pub id: i32,
    pub market_id: i32,
    pub operador_id: Option<i32>,
    pub operador_nome: String,
    pub abertura: DateTime<Utc>,
    pub fechamento: Option<DateTime<Utc>>,
    pub saldo_inicial: BigDecimal,
    pub saldo_final: Option<BigDecimal>,
    pub total_vendas: BigDecimal,
    pub saldo_calculado: Option<BigDecimal>,
    pub diferenca: Option<BigDecimal>,
    pub status: StatusSessao,
    pub transacoes: Vec<TransacaoCaixa>,
}

/// Totais do turno, recalculados a partir das transações.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumoCaixa {
    pub vendas_por_forma: BTreeMap<FormaPagamento, BigDecimal>,
    pub suprimentos: BigDecimal,
    pub sangrias: BigDecimal,
    pub total_vendas: BigDecimal,
    pub dinheiro_esperado: BigDecimal,
}

pub fn validar_abertura(saldo_inicial: &BigDecimal) -> Result<(), ErroCaixa> {
    if *saldo_inicial < BigDecimal::zero() {
        return Err(ErroCaixa::AberturaInvalida);
    }
    Ok(())
}

impl SessaoCaixa {
    pub fn resumo(&self) -> ResumoCaixa {
        let mut vendas_por_forma: BTreeMap<FormaPagamento, BigDecimal> = BTreeMap::new();
        let mut suprimentos = BigDecimal::zero();
        let mut sangrias = BigDecimal::zero();

        for t in &self.transacoes {
            match t.tipo {
                TipoTransacaoCaixa::Sale => {
                    // Venda sem forma registrada conta como dinheiro
                    let forma = t.forma_pagamento.unwrap_or(FormaPagamento::Money);
                    *vendas_por_forma.entry(forma).or_insert_with(BigDecimal::zero) += &t.valor;
                }
                TipoTransacaoCaixa::Suprimento => suprimentos += &t.valor,
                TipoTransacaoCaixa::Sangria => sangrias += &t.valor,
            }
        }

        let total_vendas = vendas_por_forma
            .values()
            .fold(BigDecimal::zero(), |acc, v| acc + v);
        let vendas_dinheiro = vendas_por_forma
            .get(&FormaPagamento::Money)
            .cloned()
            .unwrap_or_else(BigDecimal::zero);
        let dinheiro_esperado = &self.saldo_inicial + vendas_dinheiro + &suprimentos - &sangrias;

        ResumoCaixa {
            vendas_por_forma,
            suprimentos,
            sangrias,
            total_vendas,
            dinheiro_esperado,
        }
    }

    /// Valida um novo movimento antes de gravá-lo.
    pub fn validar_transacao(&self, valor: &BigDecimal) -> Result<(), ErroCaixa> {
        if self.status == StatusSessao::Closed {
            return Err(ErroCaixa::SessaoFechada);
        }
        if *valor <= BigDecimal::zero() {
            return Err(ErroCaixa::ValorInvalido);
        }
        Ok(())
    }

    /// Fecha a sessão com o dinheiro contado pelo operador.
    ///
    /// Grava o saldo esperado e a diferença (contado - esperado). A diferença
    /// positiva indica sobra; negativa, falta.
    pub fn fechar(&mut self, saldo_contado: BigDecimal, agora: DateTime<Utc>) -> Result<ResumoCaixa, ErroCaixa> {
        if self.status == StatusSessao::Closed {
            return Err(ErroCaixa::SessaoFechada);
        }
        if saldo_contado < BigDecimal::zero() {
            return Err(ErroCaixa::FechamentoInvalido);
        }

        let resumo = self.resumo();
        self.diferenca = Some(&saldo_contado - &resumo.dinheiro_esperado);
        self.saldo_final = Some(saldo_contado);
        self.saldo_calculado = Some(resumo.dinheiro_esperado.clone());
        self.total_vendas = resumo.total_vendas.clone();
        self.fechamento = Some(agora);
        self.status = StatusSessao::Closed;
        Ok(resumo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reais(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn transacao(tipo: TipoTransacaoCaixa, valor: &str, forma: Option<FormaPagamento>) -> TransacaoCaixa {
        TransacaoCaixa {
            id: 0,
            tipo,
            valor: reais(valor),
            forma_pagamento: forma,
            observacao: None,
            created_at: Utc::now(),
        }
    }

    fn sessao(saldo_inicial: &str, transacoes: Vec<TransacaoCaixa>) -> SessaoCaixa {
        SessaoCaixa {
            id: 1,
            market_id: 1,
            operador_id: Some(2),
            operador_nome: "Caixa 1".to_string(),
            abertura: Utc::now(),
            fechamento: None,
            saldo_inicial: reais(saldo_inicial),
            saldo_final: None,
            total_vendas: BigDecimal::zero(),
            saldo_calculado: None,
            diferenca: None,
            status: StatusSessao::Open,
            transacoes,
        }
    }

    fn turno() -> SessaoCaixa {
        use FormaPagamento::*;
        use TipoTransacaoCaixa::*;
        sessao(
            "100.00",
            vec![
                transacao(Sale, "30.00", Some(Money)),
                transacao(Sale, "45.50", Some(Pix)),
                transacao(Sale, "12.00", None),
                transacao(Suprimento, "50.00", None),
                transacao(Sangria, "80.00", None),
                transacao(Sale, "20.00", Some(Debit)),
            ],
        )
    }

    #[test]
    fn resumo_agrupa_vendas_por_forma() {
        let resumo = turno().resumo();

        assert_eq!(resumo.vendas_por_forma[&FormaPagamento::Money], reais("42.00"));
        assert_eq!(resumo.vendas_por_forma[&FormaPagamento::Pix], reais("45.50"));
        assert_eq!(resumo.vendas_por_forma[&FormaPagamento::Debit], reais("20.00"));
        assert!(!resumo.vendas_por_forma.contains_key(&FormaPagamento::Credit));
        assert_eq!(resumo.total_vendas, reais("107.50"));
        assert_eq!(resumo.suprimentos, reais("50"));
        assert_eq!(resumo.sangrias, reais("80"));
    }

    #[test]
    fn dinheiro_esperado_considera_apenas_dinheiro() {
        // 100 + 42 + 50 - 80
        assert_eq!(turno().resumo().dinheiro_esperado, reais("112.00"));
    }

    #[test]
    fn sessao_sem_movimentos_espera_o_saldo_inicial() {
        let resumo = sessao("75.00", vec![]).resumo();
        assert_eq!(resumo.dinheiro_esperado, reais("75"));
        assert_eq!(resumo.total_vendas, BigDecimal::zero());
    }

    #[test]
    fn fechamento_registra_diferenca() {
        let mut s = turno();
        let resumo = s.fechar(reais("110.00"), Utc::now()).unwrap();

        assert_eq!(resumo.dinheiro_esperado, reais("112"));
        assert_eq!(s.status, StatusSessao::Closed);
        assert_eq!(s.saldo_final, Some(reais("110")));
        assert_eq!(s.saldo_calculado, Some(reais("112")));
        assert_eq!(s.diferenca, Some(reais("-2")));
        assert_eq!(s.total_vendas, reais("107.50"));
        assert!(s.fechamento.is_some());
    }

    #[test]
    fn sessao_fechada_nao_muda() {
        let mut s = turno();
        s.fechar(reais("112"), Utc::now()).unwrap();
        let diferenca = s.diferenca.clone();

        assert_eq!(s.fechar(reais("500"), Utc::now()), Err(ErroCaixa::SessaoFechada));
        assert_eq!(s.validar_transacao(&reais("10")), Err(ErroCaixa::SessaoFechada));
        assert_eq!(s.diferenca, diferenca);
    }

    #[test]
    fn valores_invalidos() {
        let mut s = sessao("0", vec![]);
        assert_eq!(s.validar_transacao(&reais("0")), Err(ErroCaixa::ValorInvalido));
        assert_eq!(s.fechar(reais("-1"), Utc::now()), Err(ErroCaixa::FechamentoInvalido));
        assert_eq!(s.status, StatusSessao::Open);
        assert_eq!(validar_abertura(&reais("-0.01")), Err(ErroCaixa::AberturaInvalida));
        assert!(validar_abertura(&reais("0")).is_ok());
    }
}
