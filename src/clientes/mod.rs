// src/clientes/mod.rs

pub mod clientes_structs;
pub mod clientes_router;
// Regras de pontos e conta-crédito
pub mod fidelidade;
