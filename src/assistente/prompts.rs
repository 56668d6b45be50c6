// src/assistente/prompts.rs

use serde::{Deserialize, Serialize};

use super::gemini::Conteudo;
use crate::produtos::produtos_structs::Produto;
use crate::relatorios::analise::Painel;
use crate::shared::dinheiro::formatar;
use crate::vendas::vendas_structs::Venda;

/// Vendas recentes enviadas como contexto para o chat.
pub const VENDAS_NO_CONTEXTO: usize = 10;

pub const ERRO_INSIGHTS: &str =
    "Erro ao gerar insights. Verifique sua chave de API e a conexão. Tente novamente mais tarde.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Papel {
    User,
    Model,
}

impl Papel {
    fn as_str(&self) -> &'static str {
        match self {
            Papel::User => "user",
            Papel::Model => "model",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MensagemChat {
    pub papel: Papel,
    pub texto: String,
}

#[derive(Debug, Deserialize)]
pub struct RequisicaoChat {
    pub mensagens: Vec<MensagemChat>,
}

#[derive(Debug, Serialize)]
pub struct RespostaChat {
    pub resposta: String,
}

/// Análise usada quando não há chave da API configurada.
pub fn texto_demonstracao(painel: &Painel) -> String {
    format!(
        "### **Análise Financeira (Demonstração)**\n\n\
         **Resumo Geral:**\n\
         Seu faturamento de **R$ {}** é sólido. Após deduzir os custos dos produtos (R$ {}) e outras despesas (R$ {}), \
         seu lucro líquido é de **R$ {}**. Isso indica uma boa saúde financeira para o período.\n\n\
         **Recomendações:**\n\
         1.  **Controle de Despesas:** Fique de olho nas despesas variáveis para maximizar seu lucro.\n\
         2.  **Crie Combos:** Ofereça pacotes com seus produtos mais vendidos para aumentar o ticket médio.\n\n\
         *Nota: Esta é uma análise de demonstração. Configure a variável GEMINI_API_KEY para obter insights em tempo real.*",
        formatar(&painel.receita_total),
        formatar(&painel.custo_total),
        formatar(&painel.despesas_total),
        formatar(&painel.lucro),
    )
}

pub fn prompt_insights(painel: &Painel) -> String {
    let top = painel
        .top_produtos
        .iter()
        .map(|p| {
            format!(
                "{} (Receita: R$ {}, Lucro: R$ {})",
                p.nome,
                formatar(&p.receita),
                formatar(&p.lucro)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    let por_hora = painel
        .vendas_por_hora
        .iter()
        .map(|h| format!("{}: {} vendas", h.hora, h.vendas))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Analise os dados financeiros abaixo de um pequeno mercado e responda em português do Brasil.\n\
         A análise deve ser concisa, fácil de entender para quem não é especialista e prática.\n\
         Use markdown (negrito nos títulos, listas com marcadores).\n\n\
         Dados:\n\
         - Receita total: R$ {}\n\
         - Custo das mercadorias vendidas: R$ {}\n\
         - Outras despesas: R$ {}\n\
         - Lucro líquido: R$ {}\n\
         - 5 produtos com maior receita: {}\n\
         - Vendas por hora: {}\n\n\
         Com base nesses dados, apresente:\n\
         1.  **Resumo Geral:** a saúde financeira, comentando receita, despesas e lucro líquido.\n\
         2.  **Principais Produtos:** os produtos mais vendidos são lucrativos? Alguma sugestão?\n\
         3.  **Horários de Pico:** estratégias de escala de equipe ou marketing conforme as vendas por hora.\n\
         4.  **Recomendações:** duas ou três ações concretas para aumentar o lucro ou reduzir custos.",
        formatar(&painel.receita_total),
        formatar(&painel.custo_total),
        formatar(&painel.despesas_total),
        formatar(&painel.lucro),
        if top.is_empty() { "nenhum".to_string() } else { top },
        if por_hora.is_empty() { "sem vendas".to_string() } else { por_hora },
    )
}

/// Instrução de sistema do chat com o catálogo e as vendas mais recentes.
///
/// `vendas` deve vir da mais recente para a mais antiga.
pub fn instrucao_sistema(produtos: &[Produto], vendas: &[Venda]) -> String {
    let lista_produtos = produtos
        .iter()
        .map(|p| {
            format!(
                "- {} (ID: {}, Preço: R${}, Estoque: {})",
                p.nome,
                p.id,
                formatar(&p.preco),
                p.estoque
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let lista_vendas = vendas
        .iter()
        .take(VENDAS_NO_CONTEXTO)
        .map(|v| {
            let itens = v
                .itens
                .iter()
                .map(|i| format!("{}x {}", i.qtd, i.nome))
                .collect::<Vec<_>>()
                .join(", ");
            format!("- Pedido #{}, Total: R${}, Itens: {}", v.order_number, formatar(&v.total), itens)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Você é o Marky, assistente virtual do PDVMarket, um sistema de frente de caixa.\n\
         Você conversa com o dono ou um operador da loja, com tom amigável, prestativo e profissional.\n\
         Responda com base nos dados da loja abaixo. Se a informação não estiver disponível, diga isso.\n\
         Não invente dados. Você pode fazer cálculos a partir dos dados.\n\
         Seja conciso e responda sempre em português do Brasil.\n\n\
         PRODUTOS:\n{}\n\n\
         VENDAS RECENTES:\n{}",
        lista_produtos, lista_vendas
    )
}

/// Converte o histórico do chat no formato da API.
///
/// A conversa precisa terminar com uma mensagem do usuário.
pub fn montar_conversa(mensagens: &[MensagemChat]) -> Result<Vec<Conteudo>, String> {
    match mensagens.last() {
        Some(ultima) if ultima.papel == Papel::User && !ultima.texto.trim().is_empty() => {}
        _ => return Err("A conversa deve terminar com uma mensagem do usuário.".to_string()),
    }
    Ok(mensagens
        .iter()
        .filter(|m| !m.texto.trim().is_empty())
        .map(|m| Conteudo::texto(Some(m.papel.as_str()), m.texto.trim()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::Utc;

    use crate::relatorios::analise::{ProdutoMaisVendido, VendasHora};
    use crate::vendas::vendas_structs::{FormaPagamento, ItemVendido, StatusVenda};

    fn reais(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn painel() -> Painel {
        Painel {
            receita_total: reais("1500"),
            custo_total: reais("900.5"),
            despesas_total: reais("200"),
            lucro: reais("399.5"),
            numero_vendas: 40,
            vendas_por_dia: vec![],
            vendas_por_hora: vec![VendasHora {
                hora: "18:00".to_string(),
                vendas: 12,
            }],
            top_produtos: vec![ProdutoMaisVendido {
                id: 1,
                nome: "Café".to_string(),
                quantidade: 80,
                receita: reais("400"),
                lucro: reais("160"),
            }],
            produtos_estoque_baixo: vec![],
        }
    }

    fn venda(numero: i32) -> Venda {
        Venda {
            id: numero,
            market_id: 1,
            order_number: numero,
            itens: vec![ItemVendido {
                id: 1,
                nome: "Café".to_string(),
                preco: reais("5"),
                qtd: 2,
            }],
            total: reais("10"),
            forma_pagamento: FormaPagamento::Pix,
            recebido: reais("10"),
            troco: reais("0"),
            status: StatusVenda::Completed,
            operador_id: None,
            operador_nome: "Ana".to_string(),
            cliente_id: None,
            cliente_nome: None,
            desconto: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn demonstracao_usa_os_totais_do_painel() {
        let texto = texto_demonstracao(&painel());
        assert!(texto.contains("**R$ 1500.00**"));
        assert!(texto.contains("(R$ 900.50)"));
        assert!(texto.contains("**R$ 399.50**"));
        assert!(texto.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn prompt_lista_produtos_e_horarios() {
        let prompt = prompt_insights(&painel());
        assert!(prompt.contains("Café (Receita: R$ 400.00, Lucro: R$ 160.00)"));
        assert!(prompt.contains("18:00: 12 vendas"));
        assert!(prompt.contains("Lucro líquido: R$ 399.50"));
    }

    #[test]
    fn instrucao_limita_vendas_recentes() {
        let produto = Produto {
            id: 7,
            market_id: 1,
            nome: "Café".to_string(),
            codigo: "C1".to_string(),
            preco: reais("5"),
            custo: reais("3"),
            estoque: 12,
            validade: None,
        };
        let vendas: Vec<Venda> = (1..=15).rev().map(venda).collect();
        let texto = instrucao_sistema(&[produto], &vendas);

        assert!(texto.contains("- Café (ID: 7, Preço: R$5.00, Estoque: 12)"));
        assert!(texto.contains("- Pedido #15, Total: R$10.00, Itens: 2x Café"));
        assert!(texto.contains("Pedido #6,"));
        assert!(!texto.contains("Pedido #5,"));
    }

    #[test]
    fn conversa_precisa_terminar_com_usuario() {
        let mensagens = vec![
            MensagemChat {
                papel: Papel::User,
                texto: "Quanto vendi hoje?".to_string(),
            },
            MensagemChat {
                papel: Papel::Model,
                texto: "R$ 120,00.".to_string(),
            },
        ];
        assert!(montar_conversa(&mensagens).is_err());
        assert!(montar_conversa(&[]).is_err());

        let mut mensagens = mensagens;
        mensagens.push(MensagemChat {
            papel: Papel::User,
            texto: " E ontem? ".to_string(),
        });
        let conversa = montar_conversa(&mensagens).unwrap();
        assert_eq!(conversa.len(), 3);
        assert_eq!(conversa[1].role.as_deref(), Some("model"));
        assert_eq!(conversa[2], Conteudo::texto(Some("user"), "E ontem?"));
    }
}
