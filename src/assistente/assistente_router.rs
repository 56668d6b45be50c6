// src/assistente/assistente_router.rs

use actix_web::{get, post, web, HttpResponse};
use sqlx::query_as;

use super::prompts::{
    instrucao_sistema, montar_conversa, prompt_insights, texto_demonstracao, RequisicaoChat, RespostaChat,
    ERRO_INSIGHTS, VENDAS_NO_CONTEXTO,
};
use super::gemini::Conteudo;
use crate::produtos::produtos_router::carregar_produtos;
use crate::relatorios::relatorios_router::{carregar_painel, JanelaRelatorio};
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::vendas::vendas_router::SELECT_VENDA;
use crate::vendas::vendas_structs::Venda;
use crate::AppState;

/// Análise financeira do período em markdown.
///
/// Sem chave configurada devolve a análise de demonstração; se a API falhar,
/// devolve uma mensagem fixa em vez de erro.
#[get("/assistente/insights")]
pub async fn insights(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    janela: web::Query<JanelaRelatorio>,
) -> Result<HttpResponse, ErroApi> {
    user.exigir_dono()?;
    let painel = carregar_painel(&data, user.market_id, janela.dias()?).await?;

    let analise = match &data.assistente {
        None => texto_demonstracao(&painel),
        Some(cliente) => {
            let prompt = [Conteudo::texto(Some("user"), prompt_insights(&painel))];
            match cliente.gerar(None, &prompt).await {
                Ok(texto) => texto,
                Err(e) => {
                    tracing::error!(erro = %e, modelo = cliente.modelo(), "Falha ao gerar insights");
                    ERRO_INSIGHTS.to_string()
                }
            }
        }
    };

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso("Insights gerados", analise)))
}

/// Conversa com o assistente usando os dados da loja como contexto.
#[post("/assistente/chat")]
pub async fn chat(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    requisicao: web::Json<RequisicaoChat>,
) -> Result<HttpResponse, ErroApi> {
    let cliente = data.assistente.as_ref().ok_or_else(|| {
        ErroApi::Indisponivel(
            "O serviço de chat não está disponível. Verifique se a chave de API do Gemini está configurada."
                .to_string(),
        )
    })?;
    let conversa = montar_conversa(&requisicao.mensagens).map_err(ErroApi::Requisicao)?;

    let produtos = carregar_produtos(&data, user.market_id).await?;
    let vendas = query_as::<_, Venda>(&format!(
        "{} WHERE market_id = $1 AND status <> 'open' ORDER BY created_at DESC, id DESC LIMIT $2",
        SELECT_VENDA
    ))
    .bind(user.market_id)
    .bind(VENDAS_NO_CONTEXTO as i64)
    .fetch_all(&data.db_pool)
    .await?;

    let instrucao = instrucao_sistema(&produtos, &vendas);
    let resposta = cliente.gerar(Some(&instrucao), &conversa).await.map_err(|e| {
        tracing::error!(erro = %e, usuario_id = user.user_id, "Falha no chat do assistente");
        ErroApi::Indisponivel("Não foi possível falar com o assistente agora. Tente novamente.".to_string())
    })?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        "Resposta do assistente",
        RespostaChat { resposta },
    )))
}
