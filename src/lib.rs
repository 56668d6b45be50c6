// src/lib.rs

use actix_web::{get, web, HttpResponse};
use sqlx::{Pool, Postgres};

pub mod assistente;
pub mod caixa;
pub mod clientes;
pub mod config;
pub mod despesas;
pub mod mercados;
pub mod produtos;
pub mod relatorios;
pub mod shared;
pub mod usuarios;
pub mod vendas;

use assistente::gemini::ClienteGemini;
use shared::erro::ErroApi;
use shared::shared_structs::GenericResponse;

// Estado compartilhado que contém a conexão com o banco de dados e as configurações usadas pelas rotas.
pub struct AppState {
    pub db_pool: Pool<Postgres>,
    pub jwt_secret: String, // Chave secreta para JWT
    pub jwt_expiracao_horas: i64,
    pub limite_estoque_baixo: i32,
    /// Cliente do Gemini; `None` quando não há chave configurada.
    pub assistente: Option<ClienteGemini>,
}

#[get("/saude")]
pub async fn saude() -> HttpResponse {
    HttpResponse::Ok().json(GenericResponse::ok("PDVMarket em funcionamento"))
}

/// Registra todas as rotas da API.
///
/// Rotas fixas como `/produtos/estoque-baixo` vêm antes das rotas com `{id}`
/// do mesmo prefixo.
pub fn configurar_rotas(cfg: &mut web::ServiceConfig) {
    // Corpo JSON ou query string inválidos respondem no mesmo envelope de erro
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| ErroApi::Requisicao(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default().error_handler(|err, _req| ErroApi::Requisicao(err.to_string()).into()),
    )
    .service(saude)
        // Mercados e usuários
        .service(mercados::mercado_router::cadastrar_mercado)
        .service(mercados::mercado_router::buscar_mercado)
        .service(usuarios::usuario_router::login_usuario)
        .service(usuarios::usuario_router::listar_operadores)
        .service(usuarios::usuario_router::cadastrar_operador)
        .service(usuarios::usuario_router::atualizar_operador)
        .service(usuarios::usuario_router::deletar_operador)
        // Produtos
        .service(produtos::produtos_router::buscar_produtos)
        .service(produtos::produtos_router::produtos_estoque_baixo)
        .service(produtos::produtos_router::produtos_a_vencer)
        .service(produtos::produtos_router::buscar_produto_por_id)
        .service(produtos::produtos_router::cadastrar_produto)
        .service(produtos::produtos_router::atualizar_produto)
        .service(produtos::produtos_router::deletar_produto)
        // Sacola e vendas
        .service(vendas::vendas_router::ver_sacola)
        .service(vendas::vendas_router::adicionar_item_sacola)
        .service(vendas::vendas_router::atualizar_item_sacola)
        .service(vendas::vendas_router::limpar_sacola)
        .service(vendas::vendas_router::realizar_venda)
        .service(vendas::vendas_router::listar_vendas)
        .service(vendas::vendas_router::exportar_vendas)
        .service(vendas::vendas_router::buscar_venda_por_id)
        .service(vendas::vendas_router::recibo_venda)
        // Comandas e cozinha
        .service(vendas::comandas_router::criar_comanda)
        .service(vendas::comandas_router::listar_comandas)
        .service(vendas::comandas_router::salvar_itens_comanda)
        .service(vendas::comandas_router::carregar_comanda)
        .service(vendas::comandas_router::excluir_comanda)
        .service(vendas::cozinha_router::pedidos_cozinha)
        .service(vendas::cozinha_router::avancar_pedido)
        // Clientes
        .service(clientes::clientes_router::buscar_clientes)
        .service(clientes::clientes_router::buscar_cliente_por_id)
        .service(clientes::clientes_router::cadastrar_cliente)
        .service(clientes::clientes_router::atualizar_cliente)
        .service(clientes::clientes_router::deletar_cliente)
        .service(clientes::clientes_router::ajustar_pontos)
        .service(clientes::clientes_router::registrar_pagamento)
        .service(clientes::clientes_router::extrato_cliente)
        // Caixa
        .service(caixa::caixa_router::abrir_caixa)
        .service(caixa::caixa_router::caixa_ativo)
        .service(caixa::caixa_router::adicionar_transacao)
        .service(caixa::caixa_router::fechar_caixa)
        .service(caixa::caixa_router::historico_caixa)
        .service(caixa::caixa_router::detalhe_caixa)
        // Despesas, relatórios e assistente
        .service(despesas::despesas_router::listar_despesas)
        .service(despesas::despesas_router::cadastrar_despesa)
        .service(despesas::despesas_router::atualizar_despesa)
        .service(despesas::despesas_router::deletar_despesa)
        .service(relatorios::relatorios_router::painel)
        .service(relatorios::relatorios_router::desempenho)
        .service(assistente::assistente_router::insights)
        .service(assistente::assistente_router::chat);
}
