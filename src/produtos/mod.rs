// src/produtos/mod.rs

// Structs e regras de estoque/validade dos produtos
pub mod produtos_structs;
// Rotas do catálogo de produtos
pub mod produtos_router;
