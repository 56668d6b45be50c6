// src/despesas/despesas_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Local;
use sqlx::{query, query_as};

use super::despesas_structs::{Despesa, NovaDespesa};
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::AppState;

const COLUNAS_DESPESA: &str = "id, market_id, descricao, valor, categoria, data";

/// Despesas do mercado, da data mais recente para a mais antiga.
#[get("/despesas")]
pub async fn listar_despesas(data: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;

    let despesas = query_as::<_, Despesa>(&format!(
        "SELECT {} FROM despesas WHERE market_id = $1 ORDER BY data DESC, id DESC",
        COLUNAS_DESPESA
    ))
    .bind(user.market_id)
    .fetch_all(&data.db_pool)
    .await?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("{} despesas encontradas", despesas.len()),
        despesas,
    )))
}

#[post("/despesas")]
pub async fn cadastrar_despesa(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    item: web::Json<NovaDespesa>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    item.validar().map_err(ErroApi::Requisicao)?;

    let despesa = query_as::<_, Despesa>(&format!(
        "INSERT INTO despesas (market_id, descricao, valor, categoria, data) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        COLUNAS_DESPESA
    ))
    .bind(user.market_id)
    .bind(item.descricao.trim())
    .bind(&item.valor)
    .bind(item.categoria())
    .bind(item.data.unwrap_or_else(|| Local::now().date_naive()))
    .fetch_one(&data.db_pool)
    .await?;

    tracing::info!(despesa_id = despesa.id, market_id = user.market_id, valor = %despesa.valor, "Despesa registrada");

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Despesa cadastrada com sucesso! ID: {}", despesa.id),
        despesa,
    )))
}

#[put("/despesas/{id}")]
pub async fn atualizar_despesa(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    item: web::Json<NovaDespesa>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    item.validar().map_err(ErroApi::Requisicao)?;
    let id = path.into_inner();

    let despesa = query_as::<_, Despesa>(&format!(
        "UPDATE despesas SET descricao = $1, valor = $2, categoria = $3, data = COALESCE($4, data) \
         WHERE id = $5 AND market_id = $6 RETURNING {}",
        COLUNAS_DESPESA
    ))
    .bind(item.descricao.trim())
    .bind(&item.valor)
    .bind(item.categoria())
    .bind(item.data)
    .bind(id)
    .bind(user.market_id)
    .fetch_optional(&data.db_pool)
    .await?
    .ok_or_else(|| ErroApi::nao_encontrado(format!("Despesa com ID {} não encontrada para atualização.", id)))?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Despesa com ID {} atualizada com sucesso.", id),
        despesa,
    )))
}

#[delete("/despesas/{id}")]
pub async fn deletar_despesa(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    let id = path.into_inner();

    let res = query("DELETE FROM despesas WHERE id = $1 AND market_id = $2")
        .bind(id)
        .bind(user.market_id)
        .execute(&data.db_pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(ErroApi::nao_encontrado(format!(
            "Despesa com ID {} não encontrada para exclusão.",
            id
        )));
    }

    Ok(HttpResponse::Ok().json(GenericResponse::ok(format!(
        "Despesa com ID {} deletada com sucesso.",
        id
    ))))
}
