// src/caixa/mod.rs

// Sessão de caixa: suprimento, sangria e conferência de fechamento
pub mod sessao;
// Rotas de abertura, movimentos, fechamento e histórico
pub mod caixa_router;
