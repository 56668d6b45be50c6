// src/usuarios/usuario_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::{query, query_as, Row};

// Importa as structs do módulo de usuários
use super::auth_middleware::{emitir_token, AuthenticatedUser};
use super::usuario_structs::{
    validar_nome_email, AtualizarUsuario, AuthResponse, LoginRequest, NovoUsuario, TipoUsuario, Usuario,
    UsuarioResponse,
};
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::AppState;

const SELECT_USUARIO: &str = "SELECT id, market_id, nome, email, senha_hash, tipo FROM usuarios";

/// Gera o hash bcrypt de uma senha.
pub(crate) fn gerar_hash(senha: &str) -> Result<String, ErroApi> {
    if senha.len() < 6 {
        return Err(ErroApi::requisicao("A senha deve ter pelo menos 6 caracteres."));
    }
    hash(senha, DEFAULT_COST).map_err(|e| {
        tracing::error!(erro = ?e, "Erro ao fazer hash da senha");
        ErroApi::Interno("Erro interno ao processar senha.".to_string())
    })
}

/// Verifica se o e-mail já está em uso por outro usuário.
pub(crate) async fn email_em_uso(
    executor: impl sqlx::postgres::PgExecutor<'_>,
    email: &str,
    ignorar_id: Option<i32>,
) -> Result<bool, ErroApi> {
    let existe = query("SELECT id FROM usuarios WHERE lower(email) = lower($1) AND ($2::int IS NULL OR id <> $2)")
        .bind(email)
        .bind(ignorar_id)
        .fetch_optional(executor)
        .await?;
    Ok(existe.is_some())
}

/// Rota para login de usuário.
#[post("/usuarios/login")]
pub async fn login_usuario(
    data: web::Data<AppState>,
    login_request: web::Json<LoginRequest>,
) -> Result<HttpResponse, ErroApi> {
    // 1. Buscar o usuário pelo e-mail
    let user = query_as::<_, Usuario>(&format!("{} WHERE lower(email) = lower($1)", SELECT_USUARIO))
        .bind(login_request.email.trim())
        .fetch_optional(&data.db_pool)
        .await?
        .ok_or_else(|| ErroApi::NaoAutorizado("Credenciais inválidas.".to_string()))?;

    // 2. Verificar a senha
    let password_matches = verify(&login_request.senha, &user.senha_hash).map_err(|e| {
        tracing::error!(erro = ?e, "Erro ao verificar senha");
        ErroApi::Interno("Erro interno ao verificar senha.".to_string())
    })?;

    if !password_matches {
        tracing::info!(email = %user.email, "Tentativa de login com senha incorreta");
        return Err(ErroApi::NaoAutorizado("Credenciais inválidas.".to_string()));
    }

    // 3. Gerar token de autenticação
    let token = emitir_token(&user, &data.jwt_secret, data.jwt_expiracao_horas).map_err(|e| {
        tracing::error!(erro = ?e, "Erro ao gerar JWT");
        ErroApi::Interno("Erro interno ao gerar token.".to_string())
    })?;

    tracing::info!(user_id = user.id, market_id = user.market_id, "Login bem-sucedido");

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        "Login bem-sucedido!",
        AuthResponse {
            token,
            usuario: user.into(),
        },
    )))
}

/// Lista os usuários (dono e operadores) do mercado.
#[get("/operadores")]
pub async fn listar_operadores(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;

    let usuarios = query_as::<_, Usuario>(&format!("{} WHERE market_id = $1 ORDER BY nome", SELECT_USUARIO))
        .bind(user.market_id)
        .fetch_all(&data.db_pool)
        .await?;

    let body: Vec<UsuarioResponse> = usuarios.into_iter().map(UsuarioResponse::from).collect();
    Ok(HttpResponse::Ok().json(GenericResponse::sucesso("Operadores listados com sucesso!", body)))
}

/// Rota para cadastrar um novo operador no mercado do dono autenticado.
#[post("/operadores")]
pub async fn cadastrar_operador(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    novo_usuario: web::Json<NovoUsuario>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;

    validar_nome_email(&novo_usuario.nome, &novo_usuario.email).map_err(ErroApi::Requisicao)?;

    // 1. Verificar se o e-mail já está em uso
    if email_em_uso(&data.db_pool, novo_usuario.email.trim(), None).await? {
        return Err(ErroApi::conflito("E-mail já cadastrado."));
    }

    // 2. Hash da senha
    let hashed_password = gerar_hash(&novo_usuario.senha)?;

    // 3. Inserir o novo usuário no banco de dados
    let row = query(
        "INSERT INTO usuarios (market_id, nome, email, senha_hash, tipo) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(user.market_id)
    .bind(novo_usuario.nome.trim())
    .bind(novo_usuario.email.trim())
    .bind(&hashed_password)
    .bind(TipoUsuario::Operator.as_str())
    .fetch_one(&data.db_pool)
    .await?;
    let id: i32 = row.try_get("id")?;

    tracing::info!(operador_id = id, market_id = user.market_id, "Operador cadastrado");

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Operador cadastrado com sucesso! ID: {}", id),
        serde_json::json!({ "id": id }),
    )))
}

/// Atualiza nome, e-mail e, opcionalmente, a senha de um usuário do mercado.
#[put("/operadores/{id}")]
pub async fn atualizar_operador(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    item: web::Json<AtualizarUsuario>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    let id = path.into_inner();
    validar_nome_email(&item.nome, &item.email).map_err(ErroApi::Requisicao)?;

    if email_em_uso(&data.db_pool, item.email.trim(), Some(id)).await? {
        return Err(ErroApi::conflito("E-mail já cadastrado."));
    }

    let senha_hash = match item.senha.as_deref().filter(|s| !s.is_empty()) {
        Some(senha) => Some(gerar_hash(senha)?),
        None => None,
    };

    let res = query(
        "UPDATE usuarios SET nome = $1, email = $2, senha_hash = COALESCE($3, senha_hash) WHERE id = $4 AND market_id = $5",
    )
    .bind(item.nome.trim())
    .bind(item.email.trim())
    .bind(senha_hash)
    .bind(id)
    .bind(user.market_id)
    .execute(&data.db_pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(ErroApi::nao_encontrado(format!("Operador com ID {} não encontrado para atualização.", id)));
    }

    Ok(HttpResponse::Ok().json(GenericResponse::ok(format!(
        "Operador com ID {} atualizado com sucesso.",
        id
    ))))
}

/// Remove um operador. O dono não pode remover a própria conta.
#[delete("/operadores/{id}")]
pub async fn deletar_operador(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    let id = path.into_inner();

    if id == user.user_id {
        return Err(ErroApi::requisicao("Não é possível excluir o próprio usuário."));
    }

    let res = query("DELETE FROM usuarios WHERE id = $1 AND market_id = $2")
        .bind(id)
        .bind(user.market_id)
        .execute(&data.db_pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(ErroApi::nao_encontrado(format!("Operador com ID {} não encontrado para exclusão.", id)));
    }

    tracing::info!(operador_id = id, market_id = user.market_id, "Operador removido");
    Ok(HttpResponse::Ok().json(GenericResponse::ok(format!(
        "Operador com ID {} deletado com sucesso.",
        id
    ))))
}
