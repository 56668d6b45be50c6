// src/caixa/caixa_router.rs

use actix_web::{get, post, web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, query, FromRow, Row};

use super::sessao::{
    validar_abertura, ErroCaixa, ResumoCaixa, SessaoCaixa, StatusSessao, TipoTransacaoCaixa, TransacaoCaixa,
};
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::vendas::vendas_structs::FormaPagamento;
use crate::AppState;

const SELECT_SESSAO: &str = "SELECT id, market_id, operador_id, operador_nome, abertura, fechamento, \
     saldo_inicial, saldo_final, total_vendas, saldo_calculado, diferenca, status FROM sessoes_caixa";

#[derive(Debug, Deserialize)]
pub struct AberturaCaixa {
    pub saldo_inicial: BigDecimal,
}

/// Suprimento ou sangria informados pelo operador.
#[derive(Debug, Deserialize)]
pub struct NovaTransacaoCaixa {
    pub tipo: TipoTransacaoCaixa,
    pub valor: BigDecimal,
    pub observacao: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FechamentoCaixa {
    pub saldo_final: BigDecimal,
}

/// Sessão acompanhada do resumo recalculado.
#[derive(Debug, Serialize)]
pub struct SessaoComResumo {
    #[serde(flatten)]
    pub sessao: SessaoCaixa,
    pub resumo: ResumoCaixa,
}

impl From<SessaoCaixa> for SessaoComResumo {
    fn from(sessao: SessaoCaixa) -> Self {
        let resumo = sessao.resumo();
        SessaoComResumo { sessao, resumo }
    }
}

impl From<ErroCaixa> for ErroApi {
    fn from(e: ErroCaixa) -> Self {
        match e {
            ErroCaixa::SessaoFechada => ErroApi::Conflito(e.to_string()),
            _ => ErroApi::Requisicao(e.to_string()),
        }
    }
}

impl<'r> FromRow<'r, PgRow> for SessaoCaixa {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            market_id: row.try_get("market_id")?,
            operador_id: row.try_get("operador_id")?,
            operador_nome: row.try_get("operador_nome")?,
            abertura: row.try_get("abertura")?,
            fechamento: row.try_get("fechamento")?,
            saldo_inicial: row.try_get("saldo_inicial")?,
            saldo_final: row.try_get("saldo_final")?,
            total_vendas: row.try_get("total_vendas")?,
            saldo_calculado: row.try_get("saldo_calculado")?,
            diferenca: row.try_get("diferenca")?,
            status: status.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))?,
            transacoes: Vec::new(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for TransacaoCaixa {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let tipo: String = row.try_get("tipo")?;
        let forma: Option<String> = row.try_get("forma_pagamento")?;
        Ok(Self {
            id: row.try_get("id")?,
            tipo: tipo.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))?,
            valor: row.try_get("valor")?,
            forma_pagamento: forma
                .map(|f| f.parse::<FormaPagamento>())
                .transpose()
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            observacao: row.try_get("observacao")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Carrega as transações de uma sessão em ordem cronológica.
async fn carregar_transacoes(
    executor: impl sqlx::postgres::PgExecutor<'_>,
    sessao: &mut SessaoCaixa,
) -> Result<(), ErroApi> {
    sessao.transacoes = sqlx::query_as::<_, TransacaoCaixa>(
        "SELECT id, tipo, valor, forma_pagamento, observacao, created_at \
         FROM transacoes_caixa WHERE sessao_id = $1 ORDER BY created_at, id",
    )
    .bind(sessao.id)
    .fetch_all(executor)
    .await?;
    Ok(())
}

/// Sessão aberta do operador, bloqueada para atualização.
async fn sessao_aberta_para_atualizar(
    executor: impl sqlx::postgres::PgExecutor<'_>,
    operador_id: i32,
) -> Result<Option<SessaoCaixa>, ErroApi> {
    let sessao = sqlx::query_as::<_, SessaoCaixa>(&format!(
        "{} WHERE operador_id = $1 AND status = 'open' FOR UPDATE",
        SELECT_SESSAO
    ))
    .bind(operador_id)
    .fetch_optional(executor)
    .await?;
    Ok(sessao)
}

/// Lança uma venda no caixa aberto do operador, se houver.
///
/// Chamada dentro da transação da venda. Retorna o id da sessão usada.
pub(crate) async fn registrar_venda_no_caixa(
    conn: &mut sqlx::PgConnection,
    operador_id: i32,
    valor: &BigDecimal,
    forma: FormaPagamento,
) -> Result<Option<i32>, ErroApi> {
    let sessao = match sessao_aberta_para_atualizar(&mut *conn, operador_id).await? {
        Some(s) => s,
        None => return Ok(None),
    };

    if sessao.validar_transacao(valor).is_err() {
        // Venda de valor zero (pontos cobriram tudo) não movimenta o caixa
        return Ok(Some(sessao.id));
    }

    query("INSERT INTO transacoes_caixa (sessao_id, tipo, valor, forma_pagamento) VALUES ($1, $2, $3, $4)")
        .bind(sessao.id)
        .bind(TipoTransacaoCaixa::Sale.as_str())
        .bind(valor)
        .bind(forma.as_str())
        .execute(&mut *conn)
        .await?;

    query("UPDATE sessoes_caixa SET total_vendas = total_vendas + $1 WHERE id = $2")
        .bind(valor)
        .bind(sessao.id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(sessao.id))
}

/// Abre o caixa do operador autenticado.
#[post("/caixa/abrir")]
pub async fn abrir_caixa(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    abertura: web::Json<AberturaCaixa>,
) -> Result<HttpResponse, ErroApi> {
    validar_abertura(&abertura.saldo_inicial)?;

    let mut transaction = data.db_pool.begin().await?;

    if sessao_aberta_para_atualizar(&mut *transaction, user.user_id).await?.is_some() {
        transaction.rollback().await?;
        return Err(ErroApi::conflito("Já existe um caixa aberto para este operador."));
    }

    let sessao = sqlx::query_as::<_, SessaoCaixa>(
        "INSERT INTO sessoes_caixa (market_id, operador_id, operador_nome, saldo_inicial, status) \
         VALUES ($1, $2, $3, $4, 'open') \
         RETURNING id, market_id, operador_id, operador_nome, abertura, fechamento, saldo_inicial, \
         saldo_final, total_vendas, saldo_calculado, diferenca, status",
    )
    .bind(user.market_id)
    .bind(user.user_id)
    .bind(&user.user_name)
    .bind(&abertura.saldo_inicial)
    .fetch_one(&mut *transaction)
    .await?;

    transaction.commit().await?;

    tracing::info!(sessao_id = sessao.id, operador_id = user.user_id, "Caixa aberto");

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        "Caixa aberto com sucesso!",
        SessaoComResumo::from(sessao),
    )))
}

/// Caixa aberto do operador autenticado, ou `body` vazio se não houver.
#[get("/caixa/ativo")]
pub async fn caixa_ativo(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ErroApi> {
    let sessao = sqlx::query_as::<_, SessaoCaixa>(&format!(
        "{} WHERE operador_id = $1 AND status = 'open'",
        SELECT_SESSAO
    ))
    .bind(user.user_id)
    .fetch_optional(&data.db_pool)
    .await?;

    match sessao {
        Some(mut sessao) => {
            carregar_transacoes(&data.db_pool, &mut sessao).await?;
            Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
                "Caixa aberto",
                SessaoComResumo::from(sessao),
            )))
        }
        None => Ok(HttpResponse::Ok().json(GenericResponse::ok("Nenhum caixa aberto"))),
    }
}

/// Registra suprimento ou sangria no caixa aberto.
#[post("/caixa/transacoes")]
pub async fn adicionar_transacao(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    item: web::Json<NovaTransacaoCaixa>,
) -> Result<HttpResponse, ErroApi> {
    if item.tipo == TipoTransacaoCaixa::Sale {
        return Err(ErroApi::requisicao(
            "Vendas são lançadas automaticamente. Use 'suprimento' ou 'sangria'.",
        ));
    }

    let mut transaction = data.db_pool.begin().await?;
    let mut sessao = sessao_aberta_para_atualizar(&mut *transaction, user.user_id)
        .await?
        .ok_or_else(|| ErroApi::requisicao("Nenhum caixa aberto para este operador."))?;
    sessao.validar_transacao(&item.valor)?;

    query("INSERT INTO transacoes_caixa (sessao_id, tipo, valor, observacao) VALUES ($1, $2, $3, $4)")
        .bind(sessao.id)
        .bind(item.tipo.as_str())
        .bind(&item.valor)
        .bind(&item.observacao)
        .execute(&mut *transaction)
        .await?;

    carregar_transacoes(&mut *transaction, &mut sessao).await?;
    transaction.commit().await?;

    tracing::info!(sessao_id = sessao.id, tipo = item.tipo.as_str(), valor = %item.valor, "Movimento de caixa");

    let mensagem = match item.tipo {
        TipoTransacaoCaixa::Suprimento => "Suprimento adicionado com sucesso.",
        _ => "Sangria adicionada com sucesso.",
    };
    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(mensagem, SessaoComResumo::from(sessao))))
}

/// Fecha o caixa com o valor contado e devolve a conferência.
#[post("/caixa/fechar")]
pub async fn fechar_caixa(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    fechamento: web::Json<FechamentoCaixa>,
) -> Result<HttpResponse, ErroApi> {
    let mut transaction = data.db_pool.begin().await?;
    let mut sessao = sessao_aberta_para_atualizar(&mut *transaction, user.user_id)
        .await?
        .ok_or_else(|| ErroApi::requisicao("Nenhum caixa aberto para este operador."))?;
    carregar_transacoes(&mut *transaction, &mut sessao).await?;

    let resumo = sessao.fechar(fechamento.saldo_final.clone(), Utc::now())?;

    query(
        "UPDATE sessoes_caixa SET fechamento = $1, saldo_final = $2, total_vendas = $3, \
         saldo_calculado = $4, diferenca = $5, status = $6 WHERE id = $7",
    )
    .bind(sessao.fechamento)
    .bind(&sessao.saldo_final)
    .bind(&sessao.total_vendas)
    .bind(&sessao.saldo_calculado)
    .bind(&sessao.diferenca)
    .bind(StatusSessao::Closed.as_str())
    .bind(sessao.id)
    .execute(&mut *transaction)
    .await?;

    transaction.commit().await?;

    tracing::info!(
        sessao_id = sessao.id,
        esperado = %resumo.dinheiro_esperado,
        contado = %fechamento.saldo_final,
        "Caixa fechado"
    );

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        "Caixa fechado com sucesso!",
        SessaoComResumo { sessao, resumo },
    )))
}

/// Histórico de caixas fechados do mercado (somente o dono).
#[get("/caixa/historico")]
pub async fn historico_caixa(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;

    let sessoes = sqlx::query_as::<_, SessaoCaixa>(&format!(
        "{} WHERE market_id = $1 AND status = 'closed' ORDER BY abertura DESC",
        SELECT_SESSAO
    ))
    .bind(user.market_id)
    .fetch_all(&data.db_pool)
    .await?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso("Histórico de caixas", sessoes)))
}

/// Detalhe de uma sessão com transações e resumo.
#[get("/caixa/{id}")]
pub async fn detalhe_caixa(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();
    let mut sessao = sqlx::query_as::<_, SessaoCaixa>(&format!("{} WHERE id = $1 AND market_id = $2", SELECT_SESSAO))
        .bind(id)
        .bind(user.market_id)
        .fetch_optional(&data.db_pool)
        .await?
        .ok_or_else(|| ErroApi::nao_encontrado(format!("Caixa com ID {} não encontrado.", id)))?;

    // Operadores só consultam os próprios caixas
    if user.exigir_dono().is_err() && sessao.operador_id != Some(user.user_id) {
        return Err(ErroApi::Proibido("Caixa de outro operador.".to_string()));
    }

    carregar_transacoes(&data.db_pool, &mut sessao).await?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Caixa com ID {} encontrado.", id),
        SessaoComResumo::from(sessao),
    )))
}
