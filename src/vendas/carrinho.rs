// src/vendas/carrinho.rs

//! Sacola de compras do operador e o cálculo do pagamento.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde::Serialize;
use thiserror::Error;

use super::vendas_structs::{FormaPagamento, ItemVendido};
use crate::produtos::produtos_structs::Produto;
use crate::shared::dinheiro::nao_negativo;
use crate::shared::erro::ErroApi;

#[derive(Debug, Error, PartialEq)]
pub enum ErroCarrinho {
    #[error("A quantidade deve ser maior que zero.")]
    QuantidadeInvalida,

    #[error("Produto {0} sem estoque.")]
    SemEstoque(String),

    #[error("Estoque máximo de {nome} atingido ({estoque} unidades).")]
    EstoqueMaximo { nome: String, estoque: i32 },

    #[error("Produto com ID {0} não está na sacola.")]
    ItemAusente(i32),

    #[error("A sacola está vazia. Adicione itens antes de realizar a venda.")]
    SacolaVazia,

    #[error("Valor recebido insuficiente. Total: R$ {total}")]
    RecebidoInsuficiente { total: BigDecimal },

    #[error("Selecione um cliente para vender na conta-crédito.")]
    ClienteObrigatorio,

    #[error("Não há valor a lançar na conta-crédito.")]
    NadaALancar,

    #[error("Limite de crédito insuficiente. Disponível: R$ {disponivel}")]
    CreditoInsuficiente { disponivel: BigDecimal },
}

impl From<ErroCarrinho> for ErroApi {
    fn from(e: ErroCarrinho) -> Self {
        ErroApi::Requisicao(e.to_string())
    }
}

/// Item da sacola, com os dados do produto no momento em que foi adicionado.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCarrinho {
    pub produto_id: i32,
    pub nome: String,
    pub preco: BigDecimal,
    pub quantidade: i32,
    pub estoque: i32,
}

impl ItemCarrinho {
    pub fn subtotal(&self) -> BigDecimal {
        &self.preco * BigDecimal::from(self.quantidade)
    }
}

/// Sacola de compras de um operador.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Carrinho {
    pub itens: Vec<ItemCarrinho>,
}

impl Carrinho {
    /// Adiciona o produto somando à quantidade já existente na sacola.
    pub fn adicionar(&mut self, produto: &Produto, quantidade: i32) -> Result<(), ErroCarrinho> {
        if quantidade <= 0 {
            return Err(ErroCarrinho::QuantidadeInvalida);
        }
        if produto.estoque <= 0 {
            return Err(ErroCarrinho::SemEstoque(produto.nome.clone()));
        }

        let atual = self
            .itens
            .iter()
            .find(|i| i.produto_id == produto.id)
            .map_or(0, |i| i.quantidade);
        let nova_quantidade = match atual.checked_add(quantidade) {
            Some(n) if n <= produto.estoque => n,
            _ => {
                return Err(ErroCarrinho::EstoqueMaximo {
                    nome: produto.nome.clone(),
                    estoque: produto.estoque,
                })
            }
        };

        match self.itens.iter_mut().find(|i| i.produto_id == produto.id) {
            Some(item) => {
                item.quantidade = nova_quantidade;
                // Mantém preço e estoque mais recentes do cadastro
                item.preco = produto.preco.clone();
                item.estoque = produto.estoque;
            }
            None => self.itens.push(ItemCarrinho {
                produto_id: produto.id,
                nome: produto.nome.clone(),
                preco: produto.preco.clone(),
                quantidade,
                estoque: produto.estoque,
            }),
        }
        Ok(())
    }

    /// Define a quantidade de um item. Zero remove o item.
    pub fn atualizar(&mut self, produto_id: i32, quantidade: i32) -> Result<(), ErroCarrinho> {
        if quantidade < 0 {
            return Err(ErroCarrinho::QuantidadeInvalida);
        }
        let posicao = self
            .itens
            .iter()
            .position(|i| i.produto_id == produto_id)
            .ok_or(ErroCarrinho::ItemAusente(produto_id))?;

        if quantidade == 0 {
            self.itens.remove(posicao);
            return Ok(());
        }

        let item = &mut self.itens[posicao];
        if quantidade > item.estoque {
            return Err(ErroCarrinho::EstoqueMaximo {
                nome: item.nome.clone(),
                estoque: item.estoque,
            });
        }
        item.quantidade = quantidade;
        Ok(())
    }

    pub fn total(&self) -> BigDecimal {
        self.itens.iter().fold(BigDecimal::zero(), |acc, i| acc + i.subtotal())
    }

    pub fn is_empty(&self) -> bool {
        self.itens.is_empty()
    }

    /// Substitui o conteúdo pelos itens de uma comanda.
    ///
    /// O limite de cada item vem do estoque atual em `produtos`. Itens de
    /// produtos que não estão mais no cadastro ficam limitados à quantidade
    /// salva; a baixa real é conferida na finalização da venda.
    pub fn carregar(&mut self, itens: &[ItemVendido], produtos: &[Produto]) {
        self.itens = itens
            .iter()
            .map(|i| {
                let estoque = produtos
                    .iter()
                    .find(|p| p.id == i.id)
                    .map_or(i.qtd, |p| p.estoque.max(i.qtd));
                ItemCarrinho {
                    produto_id: i.id,
                    nome: i.nome.clone(),
                    preco: i.preco.clone(),
                    quantidade: i.qtd,
                    estoque,
                }
            })
            .collect();
    }

    /// Ids dos produtos da sacola em ordem crescente, sem repetição.
    pub fn ids_produtos(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.itens.iter().map(|i| i.produto_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Converte a sacola nos itens gravados numa comanda.
    pub fn como_itens_vendidos(&self) -> Vec<ItemVendido> {
        self.itens
            .iter()
            .map(|i| ItemVendido {
                id: i.produto_id,
                nome: i.nome.clone(),
                preco: i.preco.clone(),
                qtd: i.quantidade,
            })
            .collect()
    }
}

/// Conteúdo da sacola com o total, como é devolvido pela API.
#[derive(Debug, Serialize)]
pub struct ResumoSacola {
    pub itens: Vec<ItemCarrinho>,
    pub total: BigDecimal,
}

impl From<Carrinho> for ResumoSacola {
    fn from(carrinho: Carrinho) -> Self {
        ResumoSacola {
            total: carrinho.total(),
            itens: carrinho.itens,
        }
    }
}

/// Sacolas abertas, uma por operador.
#[derive(Debug, Default)]
pub struct Sacolas {
    por_operador: HashMap<i32, Carrinho>,
}

impl Sacolas {
    pub fn do_operador(&self, operador_id: i32) -> Carrinho {
        self.por_operador.get(&operador_id).cloned().unwrap_or_default()
    }

    pub fn do_operador_mut(&mut self, operador_id: i32) -> &mut Carrinho {
        self.por_operador.entry(operador_id).or_default()
    }

    pub fn limpar(&mut self, operador_id: i32) {
        self.por_operador.remove(&operador_id);
    }
}

/// Valores de pagamento de uma venda já com desconto.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagamento {
    pub total: BigDecimal,
    pub recebido: BigDecimal,
    pub troco: BigDecimal,
}

/// Total final depois do desconto, nunca negativo.
pub fn total_com_desconto(total: &BigDecimal, desconto: &BigDecimal) -> BigDecimal {
    nao_negativo(total - desconto)
}

/// Calcula recebido e troco de acordo com a forma de pagamento.
///
/// `credito_disponivel` é o crédito do cliente selecionado, se houver.
pub fn calcular_pagamento(
    total_final: &BigDecimal,
    forma: FormaPagamento,
    recebido: Option<&BigDecimal>,
    credito_disponivel: Option<&BigDecimal>,
) -> Result<Pagamento, ErroCarrinho> {
    match forma {
        FormaPagamento::Money => {
            let recebido = recebido.cloned().unwrap_or_else(BigDecimal::zero);
            if recebido < *total_final {
                return Err(ErroCarrinho::RecebidoInsuficiente {
                    total: total_final.clone(),
                });
            }
            Ok(Pagamento {
                troco: &recebido - total_final,
                recebido,
                total: total_final.clone(),
            })
        }
        FormaPagamento::CreditAccount => {
            let disponivel = credito_disponivel.ok_or(ErroCarrinho::ClienteObrigatorio)?;
            if *total_final <= BigDecimal::zero() {
                return Err(ErroCarrinho::NadaALancar);
            }
            if total_final > disponivel {
                return Err(ErroCarrinho::CreditoInsuficiente {
                    disponivel: disponivel.clone(),
                });
            }
            Ok(sem_troco(total_final))
        }
        FormaPagamento::Credit | FormaPagamento::Debit | FormaPagamento::Pix => Ok(sem_troco(total_final)),
    }
}

fn sem_troco(total_final: &BigDecimal) -> Pagamento {
    Pagamento {
        total: total_final.clone(),
        recebido: total_final.clone(),
        troco: BigDecimal::zero(),
    }
}
