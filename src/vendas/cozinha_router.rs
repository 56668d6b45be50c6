// src/vendas/cozinha_router.rs

use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;
use sqlx::{query, query_as};

use super::vendas_router::{buscar_venda_para_atualizar, SELECT_VENDA};
use super::vendas_structs::{StatusVenda, Venda};
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::AppState;

/// Quadro da cozinha, uma coluna por etapa.
#[derive(Debug, Default, Serialize)]
pub struct PedidosCozinha {
    pub pendentes: Vec<Venda>,
    pub em_preparo: Vec<Venda>,
    pub prontos: Vec<Venda>,
}

/// Separa os pedidos pela etapa, mantendo a ordem de chegada.
pub fn agrupar_pedidos(vendas: Vec<Venda>) -> PedidosCozinha {
    let mut quadro = PedidosCozinha::default();
    for venda in vendas {
        match venda.status {
            StatusVenda::Pending => quadro.pendentes.push(venda),
            StatusVenda::Preparing => quadro.em_preparo.push(venda),
            StatusVenda::Ready => quadro.prontos.push(venda),
            StatusVenda::Open | StatusVenda::Completed => {}
        }
    }
    quadro
}

#[get("/cozinha/pedidos")]
pub async fn pedidos_cozinha(data: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse, ErroApi> {
    let vendas = query_as::<_, Venda>(&format!(
        "{} WHERE market_id = $1 AND status IN ('pending', 'preparing', 'ready') ORDER BY created_at, id",
        SELECT_VENDA
    ))
    .bind(user.market_id)
    .fetch_all(&data.db_pool)
    .await?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("{} pedidos na cozinha", vendas.len()),
        agrupar_pedidos(vendas),
    )))
}

/// Move o pedido para a próxima etapa da cozinha.
#[post("/vendas/{id}/avancar")]
pub async fn avancar_pedido(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();

    let mut transaction = data.db_pool.begin().await?;
    let mut venda = buscar_venda_para_atualizar(&mut *transaction, id, user.market_id).await?;
    let proximo = venda.status.proximo().ok_or_else(|| {
        ErroApi::conflito(format!(
            "O pedido #{} não está na cozinha (status {}).",
            venda.order_number,
            venda.status.as_str()
        ))
    })?;

    query("UPDATE vendas SET status = $1 WHERE id = $2")
        .bind(proximo.as_str())
        .bind(id)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;

    tracing::info!(venda_id = id, de = venda.status.as_str(), para = proximo.as_str(), "Pedido avançado");
    venda.status = proximo;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Pedido #{} atualizado.", venda.order_number),
        venda,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::Utc;

    use crate::vendas::vendas_structs::FormaPagamento;

    fn venda(id: i32, status: StatusVenda) -> Venda {
        Venda {
            id,
            market_id: 1,
            order_number: id,
            itens: vec![],
            total: BigDecimal::from(10),
            forma_pagamento: FormaPagamento::Pix,
            recebido: BigDecimal::from(10),
            troco: BigDecimal::from(0),
            status,
            operador_id: Some(1),
            operador_nome: "Ana".to_string(),
            cliente_id: None,
            cliente_nome: None,
            desconto: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn agrupa_por_etapa() {
        let quadro = agrupar_pedidos(vec![
            venda(1, StatusVenda::Pending),
            venda(2, StatusVenda::Ready),
            venda(3, StatusVenda::Pending),
            venda(4, StatusVenda::Preparing),
            venda(5, StatusVenda::Completed),
            venda(6, StatusVenda::Open),
        ]);

        let ids = |v: &[Venda]| v.iter().map(|x| x.id).collect::<Vec<_>>();
        assert_eq!(ids(&quadro.pendentes), vec![1, 3]);
        assert_eq!(ids(&quadro.em_preparo), vec![4]);
        assert_eq!(ids(&quadro.prontos), vec![2]);
    }
}
