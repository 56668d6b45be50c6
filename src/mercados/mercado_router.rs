// src/mercados/mercado_router.rs

use actix_web::{get, post, web, HttpResponse};
use sqlx::{query, query_as, Row};

use super::mercado_structs::{CadastroMercado, Mercado};
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::usuarios::usuario_router::{email_em_uso, gerar_hash};
use crate::usuarios::usuario_structs::TipoUsuario;
use crate::AppState;

/// Cadastra um novo mercado e a conta do dono em uma única transação.
#[post("/mercados/cadastro")]
pub async fn cadastrar_mercado(
    data: web::Data<AppState>,
    cadastro: web::Json<CadastroMercado>,
) -> Result<HttpResponse, ErroApi> {
    cadastro.validar().map_err(ErroApi::Requisicao)?;
    let senha_hash = gerar_hash(&cadastro.dono.senha)?;

    let mut transaction = data.db_pool.begin().await?;

    if email_em_uso(&mut *transaction, cadastro.dono.email.trim(), None).await? {
        transaction.rollback().await?;
        return Err(ErroApi::conflito("E-mail já cadastrado."));
    }

    let m = &cadastro.mercado;
    let market_id: i32 = query(
        "INSERT INTO mercados (nome, cnpj, ie, endereco, cidade, telefone) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(m.nome.trim())
    .bind(&m.cnpj)
    .bind(&m.ie)
    .bind(&m.endereco)
    .bind(&m.cidade)
    .bind(&m.telefone)
    .fetch_one(&mut *transaction)
    .await?
    .try_get("id")?;

    let user_id: i32 = query(
        "INSERT INTO usuarios (market_id, nome, email, senha_hash, tipo) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(market_id)
    .bind(cadastro.dono.nome.trim())
    .bind(cadastro.dono.email.trim())
    .bind(&senha_hash)
    .bind(TipoUsuario::Owner.as_str())
    .fetch_one(&mut *transaction)
    .await?
    .try_get("id")?;

    transaction.commit().await?;

    tracing::info!(market_id, user_id, "Novo mercado cadastrado");

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        "Mercado cadastrado com sucesso! Faça login para continuar.",
        serde_json::json!({ "market_id": market_id, "user_id": user_id }),
    )))
}

/// Dados do mercado do usuário autenticado.
#[get("/mercado")]
pub async fn buscar_mercado(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ErroApi> {
    let mercado = query_as::<_, Mercado>(
        "SELECT id, nome, cnpj, ie, endereco, cidade, telefone, created_at FROM mercados WHERE id = $1",
    )
    .bind(user.market_id)
    .fetch_optional(&data.db_pool)
    .await?
    .ok_or_else(|| ErroApi::nao_encontrado("Mercado não encontrado."))?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso("Dados do mercado", mercado)))
}
