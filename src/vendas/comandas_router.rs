// src/vendas/comandas_router.rs

//! Comandas: vendas abertas (status `open`) que guardam itens até o pagamento.

use std::sync::RwLock;

use actix_web::{delete, get, post, put, web, HttpResponse};
use sqlx::types::Json;
use sqlx::{query, query_as};

use super::carrinho::{ResumoSacola, Sacolas};
use super::vendas_router::{
    buscar_venda_para_atualizar, escrever_sacolas, ler_sacolas, proximo_numero_pedido, COLUNAS_VENDA, SELECT_VENDA,
};
use super::vendas_structs::{NovaComanda, StatusVenda, Venda};
use crate::produtos::produtos_router::SELECT_PRODUTO;
use crate::produtos::produtos_structs::Produto;
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::AppState;

fn exigir_aberta(venda: &Venda) -> Result<(), ErroApi> {
    if venda.status != StatusVenda::Open {
        return Err(ErroApi::conflito(format!(
            "O pedido #{} não é uma comanda aberta.",
            venda.order_number
        )));
    }
    Ok(())
}

/// Abre uma comanda vazia com o nome informado.
#[post("/comandas")]
pub async fn criar_comanda(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    item: web::Json<NovaComanda>,
) -> Result<HttpResponse, ErroApi> {
    let nome = item.nome.trim();
    if nome.is_empty() {
        return Err(ErroApi::requisicao("Informe o nome da comanda."));
    }

    let mut transaction = data.db_pool.begin().await?;
    let numero = proximo_numero_pedido(&mut *transaction, user.market_id).await?;

    let comanda = query_as::<_, Venda>(&format!(
        "INSERT INTO vendas (market_id, order_number, status, operador_id, operador_nome, cliente_nome) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        COLUNAS_VENDA
    ))
    .bind(user.market_id)
    .bind(numero)
    .bind(StatusVenda::Open.as_str())
    .bind(user.user_id)
    .bind(&user.user_name)
    .bind(nome)
    .fetch_one(&mut *transaction)
    .await?;
    transaction.commit().await?;

    tracing::info!(comanda_id = comanda.id, pedido = numero, market_id = user.market_id, "Comanda aberta");

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Comanda #{} aberta.", comanda.order_number),
        comanda,
    )))
}

#[get("/comandas")]
pub async fn listar_comandas(data: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse, ErroApi> {
    let comandas = query_as::<_, Venda>(&format!(
        "{} WHERE market_id = $1 AND status = 'open' ORDER BY created_at, id",
        SELECT_VENDA
    ))
    .bind(user.market_id)
    .fetch_all(&data.db_pool)
    .await?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("{} comandas abertas", comandas.len()),
        comandas,
    )))
}

/// Grava os itens da sacola do operador na comanda e esvazia a sacola.
#[put("/comandas/{id}/itens")]
pub async fn salvar_itens_comanda(
    data: web::Data<AppState>,
    sacolas: web::Data<RwLock<Sacolas>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();
    let carrinho = ler_sacolas(&sacolas)?.do_operador(user.user_id);

    let mut transaction = data.db_pool.begin().await?;
    let comanda = buscar_venda_para_atualizar(&mut *transaction, id, user.market_id).await?;
    exigir_aberta(&comanda)?;

    let itens = carrinho.como_itens_vendidos();
    let total = carrinho.total();
    let comanda = query_as::<_, Venda>(&format!(
        "UPDATE vendas SET itens = $1, total = $2 WHERE id = $3 RETURNING {}",
        COLUNAS_VENDA
    ))
    .bind(Json(&itens))
    .bind(&total)
    .bind(comanda.id)
    .fetch_one(&mut *transaction)
    .await?;
    transaction.commit().await?;

    escrever_sacolas(&sacolas)?.limpar(user.user_id);

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Comanda #{} salva.", comanda.order_number),
        comanda,
    )))
}

/// Carrega os itens da comanda na sacola do operador.
#[post("/comandas/{id}/carregar")]
pub async fn carregar_comanda(
    data: web::Data<AppState>,
    sacolas: web::Data<RwLock<Sacolas>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();
    let comanda = query_as::<_, Venda>(&format!("{} WHERE id = $1 AND market_id = $2", SELECT_VENDA))
        .bind(id)
        .bind(user.market_id)
        .fetch_optional(&data.db_pool)
        .await?
        .ok_or_else(|| ErroApi::nao_encontrado(format!("Comanda com ID {} não encontrada.", id)))?;
    exigir_aberta(&comanda)?;

    let ids: Vec<i32> = comanda.itens.iter().map(|i| i.id).collect();
    let produtos = query_as::<_, Produto>(&format!("{} WHERE id = ANY($1) AND market_id = $2", SELECT_PRODUTO))
        .bind(&ids)
        .bind(user.market_id)
        .fetch_all(&data.db_pool)
        .await?;

    let resumo = {
        let mut todas = escrever_sacolas(&sacolas)?;
        let carrinho = todas.do_operador_mut(user.user_id);
        carrinho.carregar(&comanda.itens, &produtos);
        ResumoSacola::from(carrinho.clone())
    };

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Comanda #{} carregada na sacola.", comanda.order_number),
        resumo,
    )))
}

/// Exclui uma comanda aberta que ainda não tem itens.
#[delete("/comandas/{id}")]
pub async fn excluir_comanda(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();

    let mut transaction = data.db_pool.begin().await?;
    let comanda = buscar_venda_para_atualizar(&mut *transaction, id, user.market_id).await?;
    exigir_aberta(&comanda)?;
    if !comanda.itens.is_empty() {
        return Err(ErroApi::conflito("Só é possível excluir comandas sem itens."));
    }

    query("DELETE FROM vendas WHERE id = $1")
        .bind(id)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;

    Ok(HttpResponse::Ok().json(GenericResponse::ok(format!(
        "Comanda #{} excluída.",
        comanda.order_number
    ))))
}
