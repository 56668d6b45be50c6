// src/shared/mod.rs

// Estruturas de resposta compartilhadas por todos os módulos
pub mod shared_structs;
// Erro padrão das rotas da API
pub mod erro;
// Utilitários para valores monetários
pub mod dinheiro;
