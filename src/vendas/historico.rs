// src/vendas/historico.rs

//! Filtros do histórico de vendas, exportação CSV e recibo em texto.

use bigdecimal::BigDecimal;
use chrono::{Datelike, Duration, FixedOffset, NaiveDate};
use num_traits::Zero;

use super::vendas_structs::{FiltrosVendas, FormaPagamento, Periodo, TipoDesconto, Venda};
use crate::shared::dinheiro::{formatar, formatar_virgula};

/// Primeiro dia incluído no período. A semana começa no domingo.
pub fn inicio_periodo(periodo: Periodo, hoje: NaiveDate) -> Option<NaiveDate> {
    match periodo {
        Periodo::All => None,
        Periodo::Today => Some(hoje),
        Periodo::Week => Some(hoje - Duration::days(hoje.weekday().num_days_from_sunday() as i64)),
        Periodo::Month => hoje.with_day(1),
    }
}

/// Aplica período, forma de pagamento e busca (nome do operador ou número do pedido).
pub fn filtrar_vendas(vendas: Vec<Venda>, filtros: &FiltrosVendas, hoje: NaiveDate, fuso: FixedOffset) -> Vec<Venda> {
    let inicio = inicio_periodo(filtros.periodo, hoje);
    let termo = filtros
        .busca
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);

    vendas
        .into_iter()
        .filter(|v| match inicio {
            Some(inicio) => v.created_at.with_timezone(&fuso).date_naive() >= inicio,
            None => true,
        })
        .filter(|v| filtros.forma.map_or(true, |f| v.forma_pagamento == f))
        .filter(|v| match &termo {
            Some(t) => v.operador_nome.to_lowercase().contains(t.as_str()) || v.order_number.to_string().contains(t.as_str()),
            None => true,
        })
        .collect()
}

pub fn somar_totais(vendas: &[Venda]) -> BigDecimal {
    vendas.iter().fold(BigDecimal::zero(), |acc, v| acc + &v.total)
}

fn descrever_itens(venda: &Venda) -> String {
    venda
        .itens
        .iter()
        .map(|i| format!("{}x {}", i.qtd, i.nome))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Gera o CSV do histórico de vendas.
pub fn exportar_csv(vendas: &[Venda], fuso: FixedOffset) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Pedido Nº", "Data", "Operador", "Total (R$)", "Pagamento", "Itens"])?;

    for venda in vendas {
        writer.write_record([
            venda.order_number.to_string(),
            venda
                .created_at
                .with_timezone(&fuso)
                .format("%d/%m/%Y %H:%M:%S")
                .to_string(),
            venda.operador_nome.clone(),
            formatar_virgula(&venda.total),
            venda.forma_pagamento.rotulo(),
            descrever_itens(venda),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Monta o recibo de uma venda em texto simples.
pub fn recibo(venda: &Venda, nome_mercado: &str, fuso: FixedOffset) -> String {
    let mut linhas = vec![
        format!("*{}*", nome_mercado),
        format!("Pedido #{}", venda.order_number),
        format!(
            "Data: {}",
            venda.created_at.with_timezone(&fuso).format("%d/%m/%Y %H:%M")
        ),
    ];
    if let Some(cliente) = &venda.cliente_nome {
        linhas.push(format!("Cliente: {}", cliente));
    }

    linhas.push(String::new());
    linhas.push("*Itens:*".to_string());
    for item in &venda.itens {
        linhas.push(format!("{}x {} - R$ {}", item.qtd, item.nome, formatar(&item.subtotal())));
    }
    linhas.push(String::new());

    if let Some(desconto) = &venda.desconto {
        let subtotal = venda
            .itens
            .iter()
            .fold(BigDecimal::zero(), |acc, i| acc + i.subtotal());
        let rotulo = match (desconto.tipo, desconto.pontos) {
            (TipoDesconto::Points, Some(pontos)) => format!("Desconto ({} pontos)", pontos),
            _ => desconto
                .descricao
                .as_ref()
                .map(|d| format!("Desconto ({})", d))
                .unwrap_or_else(|| "Desconto".to_string()),
        };
        linhas.push(format!("Subtotal: R$ {}", formatar(&subtotal)));
        linhas.push(format!("{}: -R$ {}", rotulo, formatar(&desconto.valor)));
    }

    linhas.push(format!("*Total: R$ {}*", formatar(&venda.total)));
    linhas.push(format!("Pagamento: {}", venda.forma_pagamento.rotulo()));
    if venda.forma_pagamento == FormaPagamento::Money {
        linhas.push(format!("Recebido: R$ {}", formatar(&venda.recebido)));
        linhas.push(format!("Troco: R$ {}", formatar(&venda.troco)));
    }
    linhas.push(String::new());
    linhas.push("Obrigado pela preferência!".to_string());

    linhas.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendas::vendas_structs::{Desconto, ItemVendido, StatusVenda};
    use chrono::{TimeZone, Utc};

    fn reais(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn venda(numero: i32, dia: u32, operador: &str, forma: FormaPagamento, total: &str) -> Venda {
        Venda {
            id: numero,
            market_id: 1,
            order_number: numero,
            itens: vec![
                ItemVendido {
                    id: 1,
                    nome: "Café".to_string(),
                    preco: reais("5.00"),
                    qtd: 2,
                },
                ItemVendido {
                    id: 2,
                    nome: "Pão de queijo".to_string(),
                    preco: reais("2.50"),
                    qtd: 1,
                },
            ],
            total: reais(total),
            forma_pagamento: forma,
            recebido: reais(total),
            troco: BigDecimal::zero(),
            status: StatusVenda::Completed,
            operador_id: Some(1),
            operador_nome: operador.to_string(),
            cliente_id: None,
            cliente_nome: None,
            desconto: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, dia, 12, 30, 0).unwrap(),
        }
    }

    fn dia(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn semana_comeca_no_domingo() {
        // 12/03/2025 é uma quarta-feira
        assert_eq!(inicio_periodo(Periodo::Week, dia(12)), Some(dia(9)));
        assert_eq!(inicio_periodo(Periodo::Week, dia(9)), Some(dia(9)));
        assert_eq!(inicio_periodo(Periodo::Month, dia(12)), Some(dia(1)));
        assert_eq!(inicio_periodo(Periodo::Today, dia(12)), Some(dia(12)));
        assert_eq!(inicio_periodo(Periodo::All, dia(12)), None);
    }

    #[test]
    fn filtra_por_periodo_forma_e_busca() {
        let vendas = || {
            vec![
                venda(1, 2, "Ana", FormaPagamento::Money, "10"),
                venda(2, 10, "Bruno", FormaPagamento::Pix, "20"),
                venda(3, 12, "Ana", FormaPagamento::Pix, "30"),
            ]
        };

        let semana = FiltrosVendas {
            periodo: Periodo::Week,
            ..Default::default()
        };
        let filtradas = filtrar_vendas(vendas(), &semana, dia(12), utc());
        assert_eq!(filtradas.len(), 2);
        assert_eq!(somar_totais(&filtradas), reais("50"));

        let pix_ana = FiltrosVendas {
            forma: Some(FormaPagamento::Pix),
            busca: Some(" ana ".to_string()),
            ..Default::default()
        };
        let filtradas = filtrar_vendas(vendas(), &pix_ana, dia(12), utc());
        assert_eq!(filtradas.iter().map(|v| v.order_number).collect::<Vec<_>>(), vec![3]);

        let por_numero = FiltrosVendas {
            busca: Some("2".to_string()),
            ..Default::default()
        };
        assert_eq!(filtrar_vendas(vendas(), &por_numero, dia(12), utc()).len(), 1);
    }

    #[test]
    fn csv_usa_virgula_decimal_e_lista_itens() {
        let bytes = exportar_csv(&[venda(7, 5, "Ana", FormaPagamento::CreditAccount, "12.5")], utc()).unwrap();
        let texto = String::from_utf8(bytes).unwrap();
        let mut linhas = texto.lines();

        assert_eq!(linhas.next(), Some("Pedido Nº,Data,Operador,Total (R$),Pagamento,Itens"));
        assert_eq!(
            linhas.next(),
            Some("7,05/03/2025 12:30:00,Ana,\"12,50\",CREDIT ACCOUNT,2x Café; 1x Pão de queijo")
        );
        assert_eq!(linhas.next(), None);
    }

    #[test]
    fn recibo_em_dinheiro_mostra_troco() {
        let mut v = venda(15, 5, "Ana", FormaPagamento::Money, "12.50");
        v.recebido = reais("20");
        v.troco = reais("7.50");
        let texto = recibo(&v, "Mercadinho Central", utc());

        assert!(texto.starts_with("*Mercadinho Central*\nPedido #15\nData: 05/03/2025 12:30"));
        assert!(texto.contains("2x Café - R$ 10.00"));
        assert!(texto.contains("*Total: R$ 12.50*"));
        assert!(texto.contains("Pagamento: MONEY"));
        assert!(texto.contains("Troco: R$ 7.50"));
        assert!(!texto.contains("Subtotal"));
    }

    #[test]
    fn recibo_com_desconto_de_pontos() {
        let mut v = venda(16, 5, "Ana", FormaPagamento::Pix, "10.50");
        v.cliente_nome = Some("Carla".to_string());
        v.desconto = Some(Desconto {
            tipo: TipoDesconto::Points,
            valor: reais("2.00"),
            descricao: None,
            pontos: Some(20),
        });
        let texto = recibo(&v, "Mercadinho", utc());

        assert!(texto.contains("Cliente: Carla"));
        assert!(texto.contains("Subtotal: R$ 12.50"));
        assert!(texto.contains("Desconto (20 pontos): -R$ 2.00"));
        assert!(!texto.contains("Troco"));
    }
}
