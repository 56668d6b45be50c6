// src/clientes/clientes_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use bigdecimal::BigDecimal;
use sqlx::{query, query_as};

use super::clientes_structs::{
    AjustePontos, BuscaClientes, Cliente, NovoCliente, NovoPagamento, TipoTransacaoCliente, TransacaoCliente,
};
use super::fidelidade;
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::AppState;

const SELECT_CLIENTE: &str =
    "SELECT id, market_id, nome, email, telefone, cpf, pontos, limite_credito, saldo_devedor FROM clientes";

/// Busca um cliente do mercado bloqueando a linha para atualização.
pub(crate) async fn buscar_cliente_para_atualizar(
    executor: impl sqlx::postgres::PgExecutor<'_>,
    id: i32,
    market_id: i32,
) -> Result<Cliente, ErroApi> {
    query_as::<_, Cliente>(&format!("{} WHERE id = $1 AND market_id = $2 FOR UPDATE", SELECT_CLIENTE))
        .bind(id)
        .bind(market_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| ErroApi::nao_encontrado(format!("Cliente com ID {} não encontrado.", id)))
}

#[get("/clientes")]
pub async fn buscar_clientes(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    filtros: web::Query<BuscaClientes>,
) -> Result<HttpResponse, ErroApi> {
    let mut clientes = query_as::<_, Cliente>(&format!("{} WHERE market_id = $1 ORDER BY nome", SELECT_CLIENTE))
        .bind(user.market_id)
        .fetch_all(&data.db_pool)
        .await?;

    if let Some(termo) = filtros.busca.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        clientes.retain(|c| c.corresponde(termo));
    }

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso("Clientes listados com sucesso!", clientes)))
}

#[get("/clientes/{id}")]
pub async fn buscar_cliente_por_id(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();
    let cliente = query_as::<_, Cliente>(&format!("{} WHERE id = $1 AND market_id = $2", SELECT_CLIENTE))
        .bind(id)
        .bind(user.market_id)
        .fetch_optional(&data.db_pool)
        .await?
        .ok_or_else(|| ErroApi::nao_encontrado(format!("Cliente com ID {} não encontrado.", id)))?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Cliente com ID {} encontrado.", id),
        cliente,
    )))
}

/// Cadastra um cliente. Pontos e saldo devedor começam em zero.
#[post("/clientes")]
pub async fn cadastrar_cliente(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    item: web::Json<NovoCliente>,
) -> Result<HttpResponse, ErroApi> {
    item.validar().map_err(ErroApi::Requisicao)?;

    let cliente = query_as::<_, Cliente>(
        "INSERT INTO clientes (market_id, nome, email, telefone, cpf, pontos, limite_credito, saldo_devedor) \
         VALUES ($1, $2, $3, $4, $5, 0, $6, 0) \
         RETURNING id, market_id, nome, email, telefone, cpf, pontos, limite_credito, saldo_devedor",
    )
    .bind(user.market_id)
    .bind(item.nome.trim())
    .bind(item.email.trim())
    .bind(item.telefone.trim())
    .bind(item.cpf.trim())
    .bind(&item.limite_credito)
    .fetch_one(&data.db_pool)
    .await?;

    tracing::info!(cliente_id = cliente.id, market_id = user.market_id, "Cliente cadastrado");

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Cliente cadastrado com sucesso! ID: {}", cliente.id),
        cliente,
    )))
}

#[put("/clientes/{id}")]
pub async fn atualizar_cliente(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    item: web::Json<NovoCliente>,
) -> Result<HttpResponse, ErroApi> {
    item.validar().map_err(ErroApi::Requisicao)?;
    let id = path.into_inner();

    let cliente = query_as::<_, Cliente>(
        "UPDATE clientes SET nome = $1, email = $2, telefone = $3, cpf = $4, limite_credito = $5 \
         WHERE id = $6 AND market_id = $7 \
         RETURNING id, market_id, nome, email, telefone, cpf, pontos, limite_credito, saldo_devedor",
    )
    .bind(item.nome.trim())
    .bind(item.email.trim())
    .bind(item.telefone.trim())
    .bind(item.cpf.trim())
    .bind(&item.limite_credito)
    .bind(id)
    .bind(user.market_id)
    .fetch_optional(&data.db_pool)
    .await?
    .ok_or_else(|| ErroApi::nao_encontrado(format!("Cliente com ID {} não encontrado para atualização.", id)))?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Cliente com ID {} atualizado com sucesso.", id),
        cliente,
    )))
}

#[delete("/clientes/{id}")]
pub async fn deletar_cliente(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    let id = path.into_inner();

    let res = query("DELETE FROM clientes WHERE id = $1 AND market_id = $2")
        .bind(id)
        .bind(user.market_id)
        .execute(&data.db_pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(ErroApi::nao_encontrado(format!(
            "Cliente com ID {} não encontrado para exclusão.",
            id
        )));
    }

    Ok(HttpResponse::Ok().json(GenericResponse::ok(format!(
        "Cliente com ID {} deletado com sucesso.",
        id
    ))))
}

/// Ajuste manual do saldo de pontos (somente o dono).
#[post("/clientes/{id}/pontos")]
pub async fn ajustar_pontos(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    ajuste: web::Json<AjustePontos>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    let id = path.into_inner();

    let mut transaction = data.db_pool.begin().await?;
    let cliente = buscar_cliente_para_atualizar(&mut *transaction, id, user.market_id).await?;
    let novos_pontos = fidelidade::ajustar_pontos(cliente.pontos, ajuste.delta);

    query("UPDATE clientes SET pontos = $1 WHERE id = $2")
        .bind(novos_pontos)
        .bind(id)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;

    tracing::info!(cliente_id = id, de = cliente.pontos, para = novos_pontos, "Pontos ajustados");

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        "Pontos atualizados com sucesso.",
        serde_json::json!({ "id": id, "pontos": novos_pontos }),
    )))
}

/// Registra um pagamento na conta-crédito do cliente.
#[post("/clientes/{id}/pagamentos")]
pub async fn registrar_pagamento(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    pagamento: web::Json<NovoPagamento>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();

    let mut transaction = data.db_pool.begin().await?;
    let mut cliente = buscar_cliente_para_atualizar(&mut *transaction, id, user.market_id).await?;
    let novo_saldo = fidelidade::registrar_pagamento(&cliente.saldo_devedor, &pagamento.valor)?;

    if novo_saldo < BigDecimal::from(0) {
        tracing::info!(cliente_id = id, "Pagamento maior que o saldo devedor, cliente fica com crédito");
    }

    query("UPDATE clientes SET saldo_devedor = $1 WHERE id = $2")
        .bind(&novo_saldo)
        .bind(id)
        .execute(&mut *transaction)
        .await?;

    query("INSERT INTO transacoes_cliente (cliente_id, tipo, valor, observacao) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(TipoTransacaoCliente::Payment.as_str())
        .bind(&pagamento.valor)
        .bind(&pagamento.observacao)
        .execute(&mut *transaction)
        .await?;

    transaction.commit().await?;
    cliente.saldo_devedor = novo_saldo;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso("Pagamento registrado com sucesso!", cliente)))
}

/// Extrato da conta do cliente, do lançamento mais recente ao mais antigo.
#[get("/clientes/{id}/extrato")]
pub async fn extrato_cliente(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();

    let pertence = query("SELECT id FROM clientes WHERE id = $1 AND market_id = $2")
        .bind(id)
        .bind(user.market_id)
        .fetch_optional(&data.db_pool)
        .await?;
    if pertence.is_none() {
        return Err(ErroApi::nao_encontrado(format!("Cliente com ID {} não encontrado.", id)));
    }

    let transacoes = query_as::<_, TransacaoCliente>(
        "SELECT id, cliente_id, tipo, valor, venda_id, observacao, created_at \
         FROM transacoes_cliente WHERE cliente_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(id)
    .fetch_all(&data.db_pool)
    .await?;

    let total = transacoes.len();

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("{} lançamentos encontrados", total),
        transacoes,
    )))
}
