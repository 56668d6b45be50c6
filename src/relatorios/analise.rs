// src/relatorios/analise.rs

//! Indicadores do painel do dono: receita, custo, lucro, séries de vendas,
//! produtos mais vendidos e desempenho dos operadores.
//!
//! As funções recebem as vendas já filtradas pelo período; o custo de cada
//! item vem do cadastro atual do produto (produto removido conta custo zero).

use std::collections::{BTreeMap, HashMap};

use bigdecimal::BigDecimal;
use chrono::{FixedOffset, NaiveDate};
use num_traits::Zero;
use serde::Serialize;

use crate::despesas::despesas_structs::Despesa;
use crate::produtos::produtos_structs::Produto;
use crate::shared::dinheiro::centavos;
use crate::vendas::vendas_structs::Venda;

/// Quantidade de produtos no ranking do painel.
pub const TOP_PRODUTOS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendasDia {
    pub data: NaiveDate,
    pub total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendasHora {
    pub hora: String,
    pub vendas: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProdutoMaisVendido {
    pub id: i32,
    pub nome: String,
    pub quantidade: i32,
    pub receita: BigDecimal,
    pub lucro: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct Painel {
    pub receita_total: BigDecimal,
    pub custo_total: BigDecimal,
    pub despesas_total: BigDecimal,
    pub lucro: BigDecimal,
    pub numero_vendas: usize,
    pub vendas_por_dia: Vec<VendasDia>,
    pub vendas_por_hora: Vec<VendasHora>,
    pub top_produtos: Vec<ProdutoMaisVendido>,
    pub produtos_estoque_baixo: Vec<Produto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesempenhoOperador {
    pub operador_id: Option<i32>,
    pub operador_nome: String,
    pub receita: BigDecimal,
    pub numero_vendas: usize,
    pub ticket_medio: BigDecimal,
    pub itens_vendidos: i32,
    pub lucro: BigDecimal,
}

fn indexar(produtos: &[Produto]) -> HashMap<i32, &Produto> {
    produtos.iter().map(|p| (p.id, p)).collect()
}

fn custo_unitario(catalogo: &HashMap<i32, &Produto>, produto_id: i32) -> BigDecimal {
    catalogo
        .get(&produto_id)
        .map(|p| p.custo.clone())
        .unwrap_or_else(BigDecimal::zero)
}

/// Custo das mercadorias vendidas.
pub fn custo_das_vendas(vendas: &[Venda], produtos: &[Produto]) -> BigDecimal {
    let catalogo = indexar(produtos);
    vendas
        .iter()
        .flat_map(|v| v.itens.iter())
        .fold(BigDecimal::zero(), |acc, item| {
            acc + custo_unitario(&catalogo, item.id) * BigDecimal::from(item.qtd)
        })
}

pub fn vendas_por_dia(vendas: &[Venda], fuso: FixedOffset) -> Vec<VendasDia> {
    let mut por_dia: BTreeMap<NaiveDate, BigDecimal> = BTreeMap::new();
    for venda in vendas {
        let dia = venda.created_at.with_timezone(&fuso).date_naive();
        *por_dia.entry(dia).or_insert_with(BigDecimal::zero) += &venda.total;
    }
    por_dia
        .into_iter()
        .map(|(data, total)| VendasDia { data, total })
        .collect()
}

pub fn vendas_por_hora(vendas: &[Venda], fuso: FixedOffset) -> Vec<VendasHora> {
    let mut por_hora: BTreeMap<String, usize> = BTreeMap::new();
    for venda in vendas {
        let hora = venda.created_at.with_timezone(&fuso).format("%H:00").to_string();
        *por_hora.entry(hora).or_insert(0) += 1;
    }
    por_hora
        .into_iter()
        .map(|(hora, vendas)| VendasHora { hora, vendas })
        .collect()
}

/// Produtos com maior receita.
///
/// O lucro estimado aplica a margem atual do produto sobre a receita:
/// `(preco - custo) * receita / preco`.
pub fn top_produtos(vendas: &[Venda], produtos: &[Produto], limite: usize) -> Vec<ProdutoMaisVendido> {
    let catalogo = indexar(produtos);
    let mut acumulado: HashMap<i32, ProdutoMaisVendido> = HashMap::new();

    for item in vendas.iter().flat_map(|v| v.itens.iter()) {
        let entrada = acumulado.entry(item.id).or_insert_with(|| ProdutoMaisVendido {
            id: item.id,
            nome: item.nome.clone(),
            quantidade: 0,
            receita: BigDecimal::zero(),
            lucro: BigDecimal::zero(),
        });
        entrada.quantidade += item.qtd;
        entrada.receita += item.subtotal();
    }

    let mut ranking: Vec<ProdutoMaisVendido> = acumulado
        .into_values()
        .map(|mut p| {
            p.lucro = match catalogo.get(&p.id) {
                Some(produto) if produto.preco > BigDecimal::zero() => {
                    centavos(&((&produto.preco - &produto.custo) * &p.receita / &produto.preco))
                }
                Some(_) => BigDecimal::zero(),
                None => p.receita.clone(),
            };
            p
        })
        .collect();

    ranking.sort_by(|a, b| b.receita.cmp(&a.receita).then_with(|| a.nome.cmp(&b.nome)));
    ranking.truncate(limite);
    ranking
}

pub fn montar_painel(
    vendas: &[Venda],
    produtos: &[Produto],
    despesas: &[Despesa],
    limite_estoque: i32,
    fuso: FixedOffset,
) -> Painel {
    let receita_total = vendas.iter().fold(BigDecimal::zero(), |acc, v| acc + &v.total);
    let custo_total = custo_das_vendas(vendas, produtos);
    let despesas_total = despesas.iter().fold(BigDecimal::zero(), |acc, d| acc + &d.valor);
    let lucro = &receita_total - &custo_total - &despesas_total;

    Painel {
        lucro,
        numero_vendas: vendas.len(),
        vendas_por_dia: vendas_por_dia(vendas, fuso),
        vendas_por_hora: vendas_por_hora(vendas, fuso),
        top_produtos: top_produtos(vendas, produtos, TOP_PRODUTOS),
        produtos_estoque_baixo: produtos
            .iter()
            .filter(|p| p.estoque_baixo(limite_estoque))
            .cloned()
            .collect(),
        receita_total,
        custo_total,
        despesas_total,
    }
}

/// Receita, vendas, ticket médio, itens e lucro por operador, da maior receita para a menor.
pub fn desempenho_operadores(vendas: &[Venda], produtos: &[Produto]) -> Vec<DesempenhoOperador> {
    let catalogo = indexar(produtos);
    let mut por_operador: HashMap<String, DesempenhoOperador> = HashMap::new();

    for venda in vendas {
        let entrada = por_operador
            .entry(venda.operador_nome.clone())
            .or_insert_with(|| DesempenhoOperador {
                operador_id: venda.operador_id,
                operador_nome: venda.operador_nome.clone(),
                receita: BigDecimal::zero(),
                numero_vendas: 0,
                ticket_medio: BigDecimal::zero(),
                itens_vendidos: 0,
                lucro: BigDecimal::zero(),
            });
        if entrada.operador_id.is_none() {
            entrada.operador_id = venda.operador_id;
        }
        entrada.receita += &venda.total;
        entrada.numero_vendas += 1;
        for item in &venda.itens {
            entrada.itens_vendidos += item.qtd;
            entrada.lucro += (&item.preco - custo_unitario(&catalogo, item.id)) * BigDecimal::from(item.qtd);
        }
    }

    let mut lista: Vec<DesempenhoOperador> = por_operador
        .into_values()
        .map(|mut d| {
            if d.numero_vendas > 0 {
                d.ticket_medio = centavos(&(&d.receita / BigDecimal::from(d.numero_vendas as u64)));
            }
            d
        })
        .collect();
    lista.sort_by(|a, b| {
        b.receita
            .cmp(&a.receita)
            .then_with(|| a.operador_nome.cmp(&b.operador_nome))
    });
    lista
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::vendas::vendas_structs::{FormaPagamento, ItemVendido, StatusVenda};

    fn reais(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn produto(id: i32, nome: &str, preco: &str, custo: &str, estoque: i32) -> Produto {
        Produto {
            id,
            market_id: 1,
            nome: nome.to_string(),
            codigo: format!("P{}", id),
            preco: reais(preco),
            custo: reais(custo),
            estoque,
            validade: None,
        }
    }

    fn item(id: i32, nome: &str, preco: &str, qtd: i32) -> ItemVendido {
        ItemVendido {
            id,
            nome: nome.to_string(),
            preco: reais(preco),
            qtd,
        }
    }

    fn venda(operador: &str, dia: u32, hora: u32, itens: Vec<ItemVendido>) -> Venda {
        let total = itens.iter().fold(BigDecimal::zero(), |acc, i| acc + i.subtotal());
        Venda {
            id: 0,
            market_id: 1,
            order_number: 0,
            itens,
            recebido: total.clone(),
            total,
            forma_pagamento: FormaPagamento::Money,
            troco: BigDecimal::zero(),
            status: StatusVenda::Completed,
            operador_id: None,
            operador_nome: operador.to_string(),
            cliente_id: None,
            cliente_nome: None,
            desconto: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, dia, hora, 15, 0).unwrap(),
        }
    }

    fn catalogo() -> Vec<Produto> {
        vec![
            produto(1, "Café", "10.00", "6.00", 40),
            produto(2, "Pão", "1.00", "0.40", 5),
            produto(3, "Bolo", "20.00", "12.00", 2),
        ]
    }

    fn vendas() -> Vec<Venda> {
        vec![
            venda("Ana", 1, 9, vec![item(1, "Café", "10.00", 2), item(2, "Pão", "1.00", 10)]),
            venda("Bruno", 1, 9, vec![item(3, "Bolo", "20.00", 1)]),
            venda("Ana", 2, 14, vec![item(1, "Café", "10.00", 1), item(99, "Removido", "5.00", 2)]),
        ]
    }

    fn despesa(valor: &str) -> Despesa {
        Despesa {
            id: 1,
            market_id: 1,
            descricao: "Luz".to_string(),
            valor: reais(valor),
            categoria: "Fixa".to_string(),
            data: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
    }

    #[test]
    fn painel_calcula_receita_custo_e_lucro() {
        let painel = montar_painel(&vendas(), &catalogo(), &[despesa("15.00")], 5, utc());

        // 30 + 20 + 20
        assert_eq!(painel.receita_total, reais("70"));
        // 2*6 + 10*0.4 + 12 + 6 + produto removido a custo zero
        assert_eq!(painel.custo_total, reais("34"));
        assert_eq!(painel.despesas_total, reais("15"));
        assert_eq!(painel.lucro, reais("21"));
        assert_eq!(painel.numero_vendas, 3);
    }

    #[test]
    fn series_por_dia_e_hora_ordenadas() {
        let painel = montar_painel(&vendas(), &catalogo(), &[], 5, utc());

        assert_eq!(
            painel.vendas_por_dia,
            vec![
                VendasDia {
                    data: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                    total: reais("50")
                },
                VendasDia {
                    data: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
                    total: reais("20")
                },
            ]
        );
        assert_eq!(
            painel.vendas_por_hora,
            vec![
                VendasHora {
                    hora: "09:00".to_string(),
                    vendas: 2
                },
                VendasHora {
                    hora: "14:00".to_string(),
                    vendas: 1
                },
            ]
        );
    }

    #[test]
    fn top_produtos_por_receita_com_lucro_estimado() {
        let top = top_produtos(&vendas(), &catalogo(), 3);
        let nomes: Vec<&str> = top.iter().map(|p| p.nome.as_str()).collect();
        assert_eq!(nomes, vec!["Café", "Bolo", "Pão"]);

        assert_eq!(top[0].quantidade, 3);
        assert_eq!(top[0].receita, reais("30"));
        // (10 - 6) * 30 / 10
        assert_eq!(top[0].lucro, reais("12.00"));
        assert_eq!(top[2].lucro, reais("6.00"));
    }

    #[test]
    fn estoque_baixo_no_painel() {
        let painel = montar_painel(&[], &catalogo(), &[], 5, utc());
        let ids: Vec<i32> = painel.produtos_estoque_baixo.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(painel.receita_total, BigDecimal::zero());
        assert!(painel.top_produtos.is_empty());
    }

    #[test]
    fn desempenho_por_operador() {
        let lista = desempenho_operadores(&vendas(), &catalogo());

        assert_eq!(lista.len(), 2);
        assert_eq!(lista[0].operador_nome, "Ana");
        assert_eq!(lista[0].receita, reais("50"));
        assert_eq!(lista[0].numero_vendas, 2);
        assert_eq!(lista[0].ticket_medio, reais("25.00"));
        assert_eq!(lista[0].itens_vendidos, 15);
        // (10-6)*2 + (1-0.4)*10 + (10-6)*1 + 5*2
        assert_eq!(lista[0].lucro, reais("28"));

        assert_eq!(lista[1].operador_nome, "Bruno");
        assert_eq!(lista[1].lucro, reais("8"));
    }

    #[test]
    fn sem_vendas_nao_divide_por_zero() {
        assert!(desempenho_operadores(&[], &catalogo()).is_empty());
    }
}
