// src/produtos/produtos_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use sqlx::{query, query_as, Row};

// Importa as structs definidas no módulo `produtos_structs` dentro da mesma pasta `produtos`
use super::produtos_structs::{produtos_vencendo, BuscaProdutos, NovoProduto, Produto};
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::AppState;

pub(crate) const SELECT_PRODUTO: &str =
    "SELECT id, market_id, nome, codigo, preco, custo, estoque, validade FROM produtos";

/// Carrega todos os produtos do mercado, ordenados por nome.
pub(crate) async fn carregar_produtos(data: &AppState, market_id: i32) -> Result<Vec<Produto>, ErroApi> {
    let produtos = query_as::<_, Produto>(&format!("{} WHERE market_id = $1 ORDER BY nome", SELECT_PRODUTO))
        .bind(market_id)
        .fetch_all(&data.db_pool)
        .await?;
    Ok(produtos)
}

/// Rota para buscar os produtos do mercado.
///
/// Aceita `?busca=` para filtrar por nome ou código.
#[get("/produtos")]
pub async fn buscar_produtos(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    filtros: web::Query<BuscaProdutos>,
) -> Result<HttpResponse, ErroApi> {
    let mut produtos = carregar_produtos(&data, user.market_id).await?;

    if let Some(termo) = filtros.busca.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        produtos.retain(|p| p.corresponde(termo));
    }

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso("Produtos listados com sucesso!", produtos)))
}

/// Produtos com estoque igual ou abaixo do limite configurado.
#[get("/produtos/estoque-baixo")]
pub async fn produtos_estoque_baixo(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ErroApi> {
    let limite = data.limite_estoque_baixo;
    let produtos: Vec<Produto> = carregar_produtos(&data, user.market_id)
        .await?
        .into_iter()
        .filter(|p| p.estoque_baixo(limite))
        .collect();

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Produtos com estoque até {} unidades", limite),
        produtos,
    )))
}

/// Produtos vencidos ou que vencem nos próximos 30 dias.
#[get("/produtos/vencendo")]
pub async fn produtos_a_vencer(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ErroApi> {
    let produtos = carregar_produtos(&data, user.market_id).await?;
    let hoje = Utc::now().date_naive();

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        "Produtos próximos do vencimento",
        produtos_vencendo(produtos, hoje),
    )))
}

#[get("/produtos/{id}")]
pub async fn buscar_produto_por_id(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();
    let produto = query_as::<_, Produto>(&format!("{} WHERE id = $1 AND market_id = $2", SELECT_PRODUTO))
        .bind(id)
        .bind(user.market_id)
        .fetch_optional(&data.db_pool)
        .await?
        .ok_or_else(|| ErroApi::nao_encontrado(format!("Produto com ID {} não encontrado.", id)))?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Produto com ID {} encontrado.", id),
        produto,
    )))
}

/// Rota para inserir um novo produto no banco de dados.
///
/// Recebe os dados do novo produto via JSON no corpo da requisição.
/// Insere o produto na tabela 'produtos' e retorna o ID gerado.
#[post("/produtos")]
pub async fn cadastrar_produto(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    item: web::Json<NovoProduto>, // O corpo da requisição JSON é desserializado para NovoProduto
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    item.validar().map_err(ErroApi::Requisicao)?;

    let row = query(
        "INSERT INTO produtos (market_id, nome, codigo, preco, custo, estoque, validade) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
    )
    .bind(user.market_id)
    .bind(item.nome.trim())
    .bind(item.codigo.trim())
    .bind(&item.preco)
    .bind(&item.custo)
    .bind(item.estoque)
    .bind(item.validade)
    .fetch_one(&data.db_pool)
    .await?;
    let id: i32 = row.try_get("id")?;

    tracing::info!(produto_id = id, market_id = user.market_id, "Produto cadastrado");

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Produto cadastrado com sucesso! ID: {}", id),
        serde_json::json!({ "id": id }),
    )))
}

#[put("/produtos/{id}")]
pub async fn atualizar_produto(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    item: web::Json<NovoProduto>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    item.validar().map_err(ErroApi::Requisicao)?;
    let id = path.into_inner();

    let res = query(
        "UPDATE produtos SET nome = $1, codigo = $2, preco = $3, custo = $4, estoque = $5, validade = $6 \
         WHERE id = $7 AND market_id = $8",
    )
    .bind(item.nome.trim())
    .bind(item.codigo.trim())
    .bind(&item.preco)
    .bind(&item.custo)
    .bind(item.estoque)
    .bind(item.validade)
    .bind(id)
    .bind(user.market_id)
    .execute(&data.db_pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(ErroApi::nao_encontrado(format!(
            "Produto com ID {} não encontrado para atualização.",
            id
        )));
    }

    Ok(HttpResponse::Ok().json(GenericResponse::ok(format!(
        "Produto com ID {} atualizado com sucesso.",
        id
    ))))
}

#[delete("/produtos/{id}")]
pub async fn deletar_produto(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    let id = path.into_inner();

    let res = query("DELETE FROM produtos WHERE id = $1 AND market_id = $2")
        .bind(id)
        .bind(user.market_id)
        .execute(&data.db_pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(ErroApi::nao_encontrado(format!(
            "Produto com ID {} não encontrado para exclusão.",
            id
        )));
    }

    Ok(HttpResponse::Ok().json(GenericResponse::ok(format!(
        "Produto com ID {} deletado com sucesso.",
        id
    ))))
}
