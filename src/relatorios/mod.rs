// src/relatorios/mod.rs

pub mod analise;
pub mod relatorios_router;
