// src/mercados/mod.rs

pub mod mercado_structs;
pub mod mercado_router;
