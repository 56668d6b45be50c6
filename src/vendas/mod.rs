// src/vendas/mod.rs

pub mod vendas_structs;
// Sacola em memória e cálculo do pagamento
pub mod carrinho;
pub mod historico;
pub mod vendas_router;
pub mod comandas_router;
pub mod cozinha_router;
