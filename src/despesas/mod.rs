// src/despesas/mod.rs

pub mod despesas_structs;
pub mod despesas_router;
