// src/relatorios/relatorios_router.rs

use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use sqlx::query_as;

use super::analise::{desempenho_operadores, montar_painel, Painel};
use crate::despesas::despesas_structs::Despesa;
use crate::produtos::produtos_router::carregar_produtos;
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::vendas::vendas_router::{fuso_local, SELECT_VENDA};
use crate::vendas::vendas_structs::Venda;
use crate::AppState;

pub const DIAS_PADRAO: i32 = 30;

/// Janela do relatório em dias.
#[derive(Debug, Deserialize)]
pub struct JanelaRelatorio {
    pub dias: Option<i32>,
}

impl JanelaRelatorio {
    pub fn dias(&self) -> Result<i32, ErroApi> {
        match self.dias {
            Some(d) if d <= 0 => Err(ErroApi::requisicao("O período deve ter pelo menos um dia.")),
            Some(d) => Ok(d),
            None => Ok(DIAS_PADRAO),
        }
    }
}

/// Vendas pagas dos últimos `dias` dias.
async fn vendas_do_periodo(data: &AppState, market_id: i32, dias: i32) -> Result<Vec<Venda>, ErroApi> {
    let vendas = query_as::<_, Venda>(&format!(
        "{} WHERE market_id = $1 AND status <> 'open' AND created_at >= now() - make_interval(days => $2) \
         ORDER BY created_at",
        SELECT_VENDA
    ))
    .bind(market_id)
    .bind(dias)
    .fetch_all(&data.db_pool)
    .await?;
    Ok(vendas)
}

/// Monta o painel do mercado; também alimenta a análise do assistente.
pub(crate) async fn carregar_painel(data: &AppState, market_id: i32, dias: i32) -> Result<Painel, ErroApi> {
    let vendas = vendas_do_periodo(data, market_id, dias).await?;
    let produtos = carregar_produtos(data, market_id).await?;
    let despesas = query_as::<_, Despesa>(
        "SELECT id, market_id, descricao, valor, categoria, data FROM despesas \
         WHERE market_id = $1 AND data >= CURRENT_DATE - $2",
    )
    .bind(market_id)
    .bind(dias)
    .fetch_all(&data.db_pool)
    .await?;

    Ok(montar_painel(
        &vendas,
        &produtos,
        &despesas,
        data.limite_estoque_baixo,
        fuso_local(),
    ))
}

#[get("/relatorios/painel")]
pub async fn painel(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    janela: web::Query<JanelaRelatorio>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    let dias = janela.dias()?;
    let painel = carregar_painel(&data, user.market_id, dias).await?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("Painel dos últimos {} dias", dias),
        painel,
    )))
}

#[get("/relatorios/operadores")]
pub async fn desempenho(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    janela: web::Query<JanelaRelatorio>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    let dias = janela.dias()?;
    let vendas = vendas_do_periodo(&data, user.market_id, dias).await?;
    let produtos = carregar_produtos(&data, user.market_id).await?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        "Desempenho dos operadores",
        desempenho_operadores(&vendas, &produtos),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn janela_padrao_e_validacao() {
        assert_eq!(JanelaRelatorio { dias: None }.dias().unwrap(), 30);
        assert_eq!(JanelaRelatorio { dias: Some(7) }.dias().unwrap(), 7);
        assert!(JanelaRelatorio { dias: Some(0) }.dias().is_err());
    }
}
