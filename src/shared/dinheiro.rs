// src/shared/dinheiro.rs

use bigdecimal::BigDecimal;
use num_traits::Zero;

/// Normaliza um valor para duas casas decimais (centavos).
pub fn centavos(valor: &BigDecimal) -> BigDecimal {
    valor.round(2).with_scale(2)
}

/// Formata um valor no padrão "12.50".
pub fn formatar(valor: &BigDecimal) -> String {
    centavos(valor).to_string()
}

/// Formata um valor com vírgula decimal ("12,50"), usado na exportação CSV.
pub fn formatar_virgula(valor: &BigDecimal) -> String {
    formatar(valor).replace('.', ",")
}

/// Retorna o maior entre o valor e zero.
pub fn nao_negativo(valor: BigDecimal) -> BigDecimal {
    if valor < BigDecimal::zero() {
        BigDecimal::zero()
    } else {
        valor
    }
}
