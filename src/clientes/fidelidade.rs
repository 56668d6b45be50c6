// src/clientes/fidelidade.rs

//! Regras de pontos de fidelidade e de conta-crédito (fiado).
//!
//! Um ponto vale R$ 0,10. O cliente ganha um ponto por real inteiro pago
//! e pode trocar pontos por desconto na compra. A conta-crédito tem um
//! limite; o saldo devedor sobe com compras a prazo e desce com pagamentos.

use bigdecimal::BigDecimal;
use num_traits::{ToPrimitive, Zero};
use thiserror::Error;

/// Pontos necessários para R$ 1,00 de desconto (1 ponto = R$ 0,10).
pub const PONTOS_POR_REAL: i64 = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ErroFidelidade {
    #[error("Informe uma quantidade de pontos maior que zero.")]
    PontosInvalidos,

    #[error("O cliente possui apenas {disponiveis} pontos.")]
    PontosInsuficientes { disponiveis: i32 },

    #[error("Valor inválido.")]
    ValorInvalido,

    #[error("Limite de crédito insuficiente. Disponível: R$ {disponivel}")]
    CreditoInsuficiente { disponivel: BigDecimal },
}

/// Valor em reais de uma quantidade de pontos.
pub fn valor_dos_pontos(pontos: i32) -> BigDecimal {
    BigDecimal::from(pontos) / BigDecimal::from(PONTOS_POR_REAL)
}

/// Máximo de pontos que podem ser usados numa compra: o saldo do cliente,
/// limitado aos pontos que zeram o total (arredondado para cima).
pub fn max_pontos_resgataveis(pontos_cliente: i32, total: &BigDecimal) -> i32 {
    if *total <= BigDecimal::zero() || pontos_cliente <= 0 {
        return 0;
    }
    let necessarios = total * BigDecimal::from(PONTOS_POR_REAL);
    let inteiros = necessarios.to_i64().unwrap_or(i64::MAX);
    let teto = if BigDecimal::from(inteiros) < necessarios {
        inteiros.saturating_add(1)
    } else {
        inteiros
    };
    teto.min(pontos_cliente as i64) as i32
}

/// Resgate aplicado a uma compra.
#[derive(Debug, Clone, PartialEq)]
pub struct Resgate {
    pub pontos: i32,
    pub desconto: BigDecimal,
}

/// Calcula o desconto de um resgate de pontos.
///
/// Pedidos acima do máximo resgatável são limitados a ele; pedir mais
/// pontos do que o cliente possui é um erro.
pub fn resgatar_pontos(
    pontos_cliente: i32,
    pontos_pedidos: i32,
    total: &BigDecimal,
) -> Result<Resgate, ErroFidelidade> {
    if pontos_pedidos <= 0 {
        return Err(ErroFidelidade::PontosInvalidos);
    }
    if pontos_pedidos > pontos_cliente {
        return Err(ErroFidelidade::PontosInsuficientes {
            disponiveis: pontos_cliente,
        });
    }
    let pontos = pontos_pedidos.min(max_pontos_resgataveis(pontos_cliente, total));
    if pontos == 0 {
        return Err(ErroFidelidade::PontosInvalidos);
    }
    Ok(Resgate {
        pontos,
        desconto: valor_dos_pontos(pontos),
    })
}

/// Pontos ganhos numa compra: um por real inteiro pago.
pub fn pontos_ganhos(total_pago: &BigDecimal) -> i32 {
    if *total_pago <= BigDecimal::zero() {
        return 0;
    }
    total_pago.to_i64().unwrap_or(0).min(i32::MAX as i64) as i32
}

/// Saldo de pontos depois de uma compra: desconta os pontos resgatados e
/// soma os ganhos sobre o total pago.
pub fn pontos_apos_compra(pontos_cliente: i32, pontos_usados: i32, total_pago: &BigDecimal) -> i32 {
    pontos_cliente
        .saturating_sub(pontos_usados)
        .max(0)
        .saturating_add(pontos_ganhos(total_pago))
}

/// Situação da conta do cliente depois de uma compra.
#[derive(Debug, Clone, PartialEq)]
pub struct ContaAposCompra {
    pub pontos: i32,
    pub saldo_devedor: BigDecimal,
}

/// Pontos e saldo devedor do cliente depois de uma compra de `total_pago`.
///
/// Compras na conta-crédito (`a_prazo`) aumentam o saldo devedor e precisam
/// caber no limite; as demais só mexem nos pontos.
pub fn conta_apos_compra(
    pontos_cliente: i32,
    limite: &BigDecimal,
    saldo_devedor: &BigDecimal,
    pontos_usados: i32,
    total_pago: &BigDecimal,
    a_prazo: bool,
) -> Result<ContaAposCompra, ErroFidelidade> {
    let saldo_devedor = if a_prazo {
        compra_a_prazo(limite, saldo_devedor, total_pago)?
    } else {
        saldo_devedor.clone()
    };
    Ok(ContaAposCompra {
        pontos: pontos_apos_compra(pontos_cliente, pontos_usados, total_pago),
        saldo_devedor,
    })
}

/// Aplica um ajuste manual de pontos sem deixar o saldo negativo.
pub fn ajustar_pontos(pontos_atuais: i32, delta: i32) -> i32 {
    pontos_atuais.saturating_add(delta).max(0)
}

/// Crédito ainda disponível na conta do cliente.
pub fn credito_disponivel(limite: &BigDecimal, saldo_devedor: &BigDecimal) -> BigDecimal {
    limite - saldo_devedor
}

/// Registra uma compra na conta-crédito, devolvendo o novo saldo devedor.
pub fn compra_a_prazo(
    limite: &BigDecimal,
    saldo_devedor: &BigDecimal,
    valor: &BigDecimal,
) -> Result<BigDecimal, ErroFidelidade> {
    if *valor <= BigDecimal::zero() {
        return Err(ErroFidelidade::ValorInvalido);
    }
    let disponivel = credito_disponivel(limite, saldo_devedor);
    if *valor > disponivel {
        return Err(ErroFidelidade::CreditoInsuficiente { disponivel });
    }
    Ok(saldo_devedor + valor)
}

/// Registra um pagamento na conta, devolvendo o novo saldo devedor.
///
/// Pagamentos acima do saldo são aceitos e deixam crédito a favor do cliente
/// (saldo negativo).
pub fn registrar_pagamento(saldo_devedor: &BigDecimal, valor: &BigDecimal) -> Result<BigDecimal, ErroFidelidade> {
    if *valor <= BigDecimal::zero() {
        return Err(ErroFidelidade::ValorInvalido);
    }
    Ok(saldo_devedor - valor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn reais(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn dez_pontos_valem_um_real() {
        assert_eq!(valor_dos_pontos(10), reais("1"));
        assert_eq!(valor_dos_pontos(25), reais("2.5"));
    }

    #[test]
    fn maximo_resgatavel_arredonda_para_cima() {
        // R$ 12,34 exige 123,4 pontos -> 124
        assert_eq!(max_pontos_resgataveis(500, &reais("12.34")), 124);
        assert_eq!(max_pontos_resgataveis(500, &reais("12.30")), 123);
        assert_eq!(max_pontos_resgataveis(50, &reais("12.34")), 50);
        assert_eq!(max_pontos_resgataveis(50, &reais("0")), 0);
    }

    #[test]
    fn resgate_limitado_ao_total_da_compra() {
        let resgate = resgatar_pontos(1000, 900, &reais("20.00")).unwrap();
        assert_eq!(resgate.pontos, 200);
        assert_eq!(resgate.desconto, reais("20"));
    }

    #[test]
    fn resgate_acima_do_saldo_e_rejeitado() {
        assert_eq!(
            resgatar_pontos(30, 31, &reais("100")),
            Err(ErroFidelidade::PontosInsuficientes { disponiveis: 30 })
        );
        assert_eq!(resgatar_pontos(30, 0, &reais("100")), Err(ErroFidelidade::PontosInvalidos));
    }

    #[test]
    fn pontos_ganhos_por_real_inteiro() {
        assert_eq!(pontos_ganhos(&reais("37.99")), 37);
        assert_eq!(pontos_ganhos(&reais("0.99")), 0);
        assert_eq!(pontos_ganhos(&reais("0")), 0);
    }

    #[test]
    fn resgate_e_ganho_na_mesma_compra() {
        // 20 de 50 pontos resgatados em R$ 12,34: paga R$ 10,34 e ganha 10
        let resgate = resgatar_pontos(50, 20, &reais("12.34")).unwrap();
        let pago = reais("12.34") - &resgate.desconto;
        assert_eq!(pago, reais("10.34"));
        assert_eq!(pontos_apos_compra(50, resgate.pontos, &pago), 40);
    }

    #[test]
    fn pontos_apos_compra_satura() {
        assert_eq!(pontos_apos_compra(i32::MAX, 0, &reais("5000000000")), i32::MAX);
        assert_eq!(pontos_apos_compra(10, 30, &reais("3")), 3);
    }

    #[test]
    fn conta_apos_compra_a_vista_mantem_saldo() {
        let conta = conta_apos_compra(50, &reais("100"), &reais("30"), 20, &reais("10.34"), false).unwrap();
        assert_eq!(
            conta,
            ContaAposCompra {
                pontos: 40,
                saldo_devedor: reais("30"),
            }
        );
    }

    #[test]
    fn conta_apos_compra_a_prazo_soma_ao_saldo() {
        let conta = conta_apos_compra(0, &reais("100"), &reais("30"), 0, &reais("45.90"), true).unwrap();
        assert_eq!(conta.saldo_devedor, reais("75.90"));
        assert_eq!(conta.pontos, 45);

        assert_eq!(
            conta_apos_compra(0, &reais("100"), &reais("80"), 0, &reais("20.01"), true),
            Err(ErroFidelidade::CreditoInsuficiente { disponivel: reais("20") })
        );
    }

    #[test]
    fn ajuste_nao_deixa_pontos_negativos() {
        assert_eq!(ajustar_pontos(10, -25), 0);
        assert_eq!(ajustar_pontos(10, 5), 15);
    }

    #[test]
    fn compra_a_prazo_respeita_limite() {
        let limite = reais("100");
        assert_eq!(compra_a_prazo(&limite, &reais("60"), &reais("40")).unwrap(), reais("100"));
        assert_eq!(
            compra_a_prazo(&limite, &reais("60"), &reais("40.01")),
            Err(ErroFidelidade::CreditoInsuficiente { disponivel: reais("40") })
        );
        assert_eq!(compra_a_prazo(&limite, &reais("0"), &reais("0")), Err(ErroFidelidade::ValorInvalido));
    }

    #[test]
    fn pagamento_acima_do_saldo_deixa_credito() {
        assert_eq!(registrar_pagamento(&reais("50"), &reais("20")).unwrap(), reais("30"));
        assert_eq!(registrar_pagamento(&reais("50"), &reais("70")).unwrap(), reais("-20"));
        assert_eq!(registrar_pagamento(&reais("50"), &reais("-1")), Err(ErroFidelidade::ValorInvalido));
    }
}
